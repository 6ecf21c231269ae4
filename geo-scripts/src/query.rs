//! Requête d'intersection et benchmark de chargement
//!
//! Une feature de référence est retenue si elle intersecte l'union des
//! géométries cibles, c'est-à-dire au moins l'une d'entre elles.

use std::path::Path;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use geo::Intersects;
use geoformats::{Format, Layer};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::report::{BenchmarkReport, ReferenceSource};

/// Indices des features de `reference` qui intersectent `target`
pub fn intersecting(target: &Layer, reference: &Layer) -> Vec<usize> {
    reference
        .features
        .par_iter()
        .enumerate()
        .filter(|(_, feature)| target.geometries().any(|g| g.intersects(&feature.geometry)))
        .map(|(index, _)| index)
        .collect()
}

/// Charge la cible et la référence, mesure le chargement et la requête
///
/// Avec `use_parquet`, la référence doit être un fichier GeoParquet.
pub fn benchmark(target_path: &Path, reference_path: &Path, use_parquet: bool) -> Result<BenchmarkReport> {
    let reference_format = Format::from_path(reference_path)?;
    let source = match (use_parquet, reference_format) {
        (true, Format::Parquet) => ReferenceSource::Parquet,
        (true, other) => bail!(
            "--parquet expects a Parquet reference, got {} ({})",
            other.name(),
            reference_path.display()
        ),
        (false, Format::Parquet) => bail!(
            "Reference {} is a Parquet file: pass --parquet",
            reference_path.display()
        ),
        (false, _) => ReferenceSource::Vector,
    };

    let target = geoformats::read_file(target_path)
        .with_context(|| format!("Failed to read target {}", target_path.display()))?;

    let mut report = BenchmarkReport::new(target_path, reference_path, source);
    report.target_features = target.len();

    let load_started_at = Instant::now();
    let reference = geoformats::read_file(reference_path)
        .with_context(|| format!("Failed to read reference {}", reference_path.display()))?;
    report.set_load_time(load_started_at.elapsed());
    report.reference_features = reference.len();
    debug!(elapsed = ?load_started_at.elapsed(), "Reference loaded");

    let query_started_at = Instant::now();
    let matches = intersecting(&target, &reference);
    report.set_query_time(query_started_at.elapsed());
    report.intersecting = matches.len();

    info!(summary = %report.summary(), "Benchmark finished");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Geometry, LineString, Point, Polygon};
    use geoformats::Feature;

    fn square(x0: f64, y0: f64, side: f64) -> Geometry {
        Geometry::Polygon(Polygon::new(
            LineString::from(vec![
                (x0, y0),
                (x0 + side, y0),
                (x0 + side, y0 + side),
                (x0, y0 + side),
                (x0, y0),
            ]),
            vec![],
        ))
    }

    fn layer(geometries: Vec<Geometry>) -> Layer {
        Layer::new(
            geometries
                .into_iter()
                .enumerate()
                .map(|(i, g)| Feature::new(i.to_string(), g))
                .collect(),
            Format::GeoJson,
        )
    }

    #[test]
    fn test_intersecting_any_target() {
        let target = layer(vec![square(0.0, 0.0, 10.0), square(100.0, 100.0, 10.0)]);
        let reference = layer(vec![
            square(5.0, 5.0, 10.0),
            square(50.0, 50.0, 10.0),
            square(105.0, 99.0, 2.0),
            Geometry::Point(Point::new(10.0, 10.0)),
            square(20.0, 0.0, 1.0),
        ]);

        assert_eq!(intersecting(&target, &reference), vec![0, 2, 3]);
    }

    #[test]
    fn test_empty_target_matches_nothing() {
        let target = layer(vec![]);
        let reference = layer(vec![square(0.0, 0.0, 1.0)]);
        assert!(intersecting(&target, &reference).is_empty());
    }

    #[test]
    fn test_benchmark_parquet_flag_mismatch() {
        let err = benchmark(Path::new("a.geojson"), Path::new("b.geojson"), true)
            .err()
            .unwrap();
        assert!(err.to_string().contains("--parquet"));

        let err = benchmark(Path::new("a.geojson"), Path::new("b.parquet"), false)
            .err()
            .unwrap();
        assert!(err.to_string().contains("pass --parquet"));
    }
}
