//! Benchmarks de chargement : KML vs GeoJSON (et fixtures éventuelles)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use geo::{Geometry, LineString, Polygon};
use geoformats::{read_file, write_features, Feature};
use std::path::PathBuf;

/// Grille de carrés de 100 m environ autour de Guayaquil
fn synthetic_features(count: usize) -> Vec<Feature> {
    let side = 0.0009;
    (0..count)
        .map(|i| {
            let x0 = -79.95 + (i % 100) as f64 * side * 1.5;
            let y0 = -2.20 + (i / 100) as f64 * side * 1.5;
            let ring = LineString::from(vec![
                (x0, y0),
                (x0 + side, y0),
                (x0 + side, y0 + side),
                (x0, y0 + side),
                (x0, y0),
            ]);
            Feature::new(i.to_string(), Geometry::Polygon(Polygon::new(ring, vec![])))
                .with_property("name", format!("parcel {}", i))
        })
        .collect()
}

fn find_fixtures() -> Vec<PathBuf> {
    let mut fixtures = Vec::new();
    for pattern in ["../fixtures/*.kml", "../fixtures/*.kmz", "../fixtures/*.geojson"] {
        if let Ok(paths) = glob::glob(pattern) {
            fixtures.extend(paths.filter_map(Result::ok));
        }
    }
    fixtures
}

fn bench_formats(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("tempdir");
    let features = synthetic_features(2_000);

    let mut group = c.benchmark_group("load_2000_polygons");
    for name in ["parcels.kml", "parcels.kmz", "parcels.geojson"] {
        let path = dir.path().join(name);
        write_features(&features, &path).expect("write fixture");
        let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

        group.throughput(Throughput::Bytes(size));
        group.bench_with_input(BenchmarkId::from_parameter(name), &path, |b, path| {
            b.iter(|| read_file(black_box(path)).expect("read"))
        });
    }
    group.finish();
}

fn bench_fixtures(c: &mut Criterion) {
    let fixtures = find_fixtures();
    if fixtures.is_empty() {
        eprintln!("No fixtures found, skipping benchmark");
        return;
    }

    let mut group = c.benchmark_group("load_fixture");
    for path in &fixtures {
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        group.bench_with_input(BenchmarkId::from_parameter(label), path, |b, path| {
            b.iter(|| read_file(black_box(path)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_formats, bench_fixtures);
criterion_main!(benches);
