//! Définition et implémentation des commandes CLI
//!
//! Chaque commande charge une couche, applique une opération et écrit un
//! résultat (fichier ou console).

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Subcommand, ValueEnum};
use geo::CoordsIter;
use tracing::{info, warn};

use geo_scripts::area::{self, AREA_PROPERTY};
use geo_scripts::classify::validate_coordinates;
use geo_scripts::filter::{filter_layer, Axis, Comparison, ThresholdFilter};
use geo_scripts::report::{AreaEntry, AreaReport};
use geo_scripts::reproject_lite::{latlon_to_web_mercator, ReprojectorLite, SmartReprojector, UtmZone};
use geo_scripts::scale::{PaperSize, ScaleMode};
use geo_scripts::survey;
use geo_scripts::Settings;
use geoformats::{Format, Layer};

#[derive(Subcommand)]
pub enum Commands {
    /// Classify coordinate pairs as decimal degrees, UTM or unknown
    Classify {
        /// Pairs "lat,lon;lat,lon"
        #[arg(long, allow_hyphen_values = true, conflicts_with = "input")]
        coords: Option<String>,

        /// CSV file with one "lat,lon" pair per line
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Extract the first KML document of a KMZ next to it
    KmzToKml {
        /// Path to the KMZ archive
        kmz: PathBuf,
    },

    /// Extract every entry of a zip archive
    Unzip {
        /// Path to the zip archive
        archive: PathBuf,

        /// Destination directory
        dest: PathBuf,
    },

    /// Convert between KML, KMZ, GeoJSON and GeoParquet (`parquet` feature)
    Convert {
        /// Input file (.kml, .kmz, .geojson, .json, .parquet)
        input: PathBuf,

        /// Output file (.kml, .kmz, .geojson, .json, .parquet)
        output: PathBuf,
    },

    /// Compute polygon areas in hectares
    Area {
        /// Input file (KML, KMZ or any readable format)
        input: PathBuf,

        /// UTM zone number (default: settings, 17)
        #[arg(long)]
        zone: Option<u8>,

        /// Northern hemisphere
        #[arg(long, conflicts_with = "south")]
        north: bool,

        /// Southern hemisphere
        #[arg(long)]
        south: bool,

        /// Write the features with an `area_ha` attribute
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Save the area report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Keep polygons with at least one vertex beyond a threshold
    Filter {
        /// Input file
        input: PathBuf,

        /// Output file
        output: PathBuf,

        /// Tested axis: lon or lat
        #[arg(long, default_value = "lon")]
        axis: Axis,

        /// Comparison: lt, le, gt, ge
        #[arg(long, default_value = "lt")]
        op: Comparison,

        /// Threshold in degrees
        #[arg(long, allow_hyphen_values = true)]
        threshold: f64,
    },

    /// Benchmark loading a reference layer and intersecting it with a target
    Benchmark {
        /// Target polygons (KML or GeoJSON)
        target: PathBuf,

        /// Reference polygons (KML, GeoJSON or Parquet)
        reference: PathBuf,

        /// Use Parquet for the reference dataset
        #[arg(long)]
        parquet: bool,

        /// Save the benchmark report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Set an attribute on every feature
    AddAttribute {
        input: PathBuf,
        key: String,
        value: String,
        output: PathBuf,
    },

    /// Similarity ratio between two strings
    Similarity { a: String, b: String },

    /// Print scale for the extent of a layer
    Scale {
        /// Input file
        input: PathBuf,

        /// Paper size (A0..A4)
        #[arg(long)]
        paper: Option<String>,

        /// Scale mode
        #[arg(long, value_enum)]
        mode: Option<ScaleModeArg>,

        /// Fixed scale denominator
        #[arg(long)]
        fixed: Option<u32>,

        /// Coordinates are already UTM (no projection)
        #[arg(long)]
        utm: bool,
    },

    /// Draw an annotated survey plan (SVG) of the first feature
    Survey {
        /// Input polygon or line
        input: PathBuf,

        /// Output SVG
        output: PathBuf,

        /// Fixed scale denominator written in the footer
        #[arg(long)]
        scale: Option<u32>,

        /// Compute the scale from the extent instead
        #[arg(long, conflicts_with = "scale")]
        heuristic: bool,

        /// Coordinates are already UTM (no projection)
        #[arg(long)]
        utm: bool,

        /// Pick the UTM zone from the first vertex
        #[arg(long, conflicts_with = "utm")]
        auto_zone: bool,
    },

    /// Reproject a layer between EPSG codes
    Reproject {
        input: PathBuf,
        output: PathBuf,

        /// Source EPSG
        #[arg(long, default_value_t = 4326)]
        from: u32,

        /// Target EPSG
        #[arg(long)]
        to: u32,
    },

    /// Convert a WGS84 (lat, lon) pair to Web Mercator
    ToMercator {
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lon: f64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ScaleModeArg {
    Fixed,
    Heuristic,
}

/// Parse "lat,lon;lat,lon" ou un contenu CSV (une paire par ligne)
fn parse_pairs(text: &str, separator: char) -> Result<Vec<(f64, f64)>> {
    let mut pairs = Vec::new();
    for (n, chunk) in text.split(separator).enumerate() {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            continue;
        }

        let mut parts = chunk.split(',').map(str::trim);
        let parsed = match (parts.next(), parts.next()) {
            (Some(lat), Some(lon)) => lat.parse::<f64>().ok().zip(lon.parse::<f64>().ok()),
            _ => None,
        };

        match parsed {
            Some(pair) => pairs.push(pair),
            // En-tête CSV
            None if n == 0 && separator == '\n' => continue,
            None => bail!("Invalid coordinate pair '{}' (expected lat,lon)", chunk),
        }
    }
    Ok(pairs)
}

pub fn cmd_classify(coords: Option<&str>, input: Option<&Path>) -> Result<()> {
    let pairs = match (coords, input) {
        (Some(coords), _) => parse_pairs(coords, ';')?,
        (None, Some(path)) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            parse_pairs(&text, '\n')?
        }
        (None, None) => bail!("Provide --coords or --input"),
    };

    for (lat, lon, kind) in validate_coordinates(&pairs) {
        println!("{}, {} -> {}", lat, lon, kind);
    }
    Ok(())
}

pub fn cmd_kmz_to_kml(kmz: &Path) -> Result<()> {
    let kml = geoformats::archive::convert_kmz_to_kml(kmz)?;
    println!("KML file saved: {}", kml.display());
    Ok(())
}

pub fn cmd_unzip(archive: &Path, dest: &Path) -> Result<()> {
    let count = geoformats::archive::unzip(archive, dest)?;
    println!("{} entries extracted to {}", count, dest.display());
    Ok(())
}

pub fn cmd_convert(input: &Path, output: &Path) -> Result<()> {
    let layer = load(input)?;
    geoformats::write_file(&layer, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("{} file saved: {}", Format::from_path(output)?.name(), output.display());
    Ok(())
}

/// Zone UTM : arguments de la commande, sinon réglages
fn resolve_zone(settings: &Settings, zone: Option<u8>, north: bool, south: bool) -> Result<UtmZone> {
    let hemisphere_south = match (north, south) {
        (true, _) => false,
        (_, true) => true,
        _ => settings.utm_south,
    };
    UtmZone::new(zone.unwrap_or(settings.utm_zone), hemisphere_south)
}

pub fn cmd_area(
    settings: &Settings,
    input: &Path,
    zone: Option<u8>,
    north: bool,
    south: bool,
    output: Option<&Path>,
    report_path: Option<&Path>,
) -> Result<()> {
    let zone = resolve_zone(settings, zone, north, south)?;
    let layer = area::calculate_polygon_area(input, zone)?;

    let entries = layer
        .features
        .iter()
        .enumerate()
        .map(|(index, f)| {
            let area_ha = f
                .properties
                .get(AREA_PROPERTY)
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0);
            AreaEntry {
                id: f.id.clone().unwrap_or_else(|| index.to_string()),
                name: f.name().map(str::to_string),
                area_ha,
            }
        })
        .collect();

    let report = AreaReport {
        path: input.display().to_string(),
        zone: zone.to_string(),
        entries,
    };
    report.display();

    if let Some(path) = report_path {
        report.save_to_file(path)?;
        info!(path = %path.display(), "Report saved");
    }

    if let Some(output) = output {
        geoformats::write_file(&layer, output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("Areas saved: {}", output.display());
    }
    Ok(())
}

pub fn cmd_filter(input: &Path, output: &Path, filter: ThresholdFilter) -> Result<()> {
    let layer = load(input)?;
    let filtered = filter_layer(&layer, &filter);

    if filtered.is_empty() {
        warn!(filter = %filter, "No polygon matches the filter");
    }

    geoformats::write_file(&filtered, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "{} of {} features kept ({}): {}",
        filtered.len(),
        layer.len(),
        filter,
        output.display()
    );
    Ok(())
}

pub fn cmd_benchmark(target: &Path, reference: &Path, parquet: bool, report_path: Option<&Path>) -> Result<()> {
    let report = geo_scripts::query::benchmark(target, reference, parquet)?;
    report.display();

    if let Some(path) = report_path {
        report.save_to_file(path)?;
        info!(path = %path.display(), "Report saved");
    }
    Ok(())
}

pub fn cmd_add_attribute(input: &Path, key: &str, value: &str, output: &Path) -> Result<()> {
    let count = geo_scripts::attributes::add_attribute(input, key, value, output)?;
    println!("{}={} set on {} features: {}", key, value, count, output.display());
    Ok(())
}

pub fn cmd_similarity(a: &str, b: &str) -> Result<()> {
    println!("{}", geo_scripts::string_similarity(a, b));
    Ok(())
}

/// Sommets d'une couche en coordonnées planes
fn planar_coords(settings: &Settings, layer: &Layer, utm: bool) -> Result<Vec<(f64, f64)>> {
    let reprojector = if utm {
        None
    } else {
        Some(ReprojectorLite::to_utm(settings.zone()?))
    };

    let mut coords = Vec::new();
    for feature in &layer.features {
        let geometry = match &reprojector {
            Some(r) => r.transform_geometry(&feature.geometry)?,
            None => feature.geometry.clone(),
        };
        coords.extend(geometry.coords_iter().map(|c| (c.x, c.y)));
    }
    Ok(coords)
}

pub fn cmd_scale(
    settings: &Settings,
    input: &Path,
    paper: Option<&str>,
    mode: Option<ScaleModeArg>,
    fixed: Option<u32>,
    utm: bool,
) -> Result<()> {
    let mut calculator = settings.scale_calculator();
    if let Some(paper) = paper {
        calculator.paper = PaperSize::from_name(paper);
    }
    calculator.mode = match (mode, fixed) {
        (Some(ScaleModeArg::Heuristic), _) => ScaleMode::Heuristic,
        (Some(ScaleModeArg::Fixed), value) | (None, value @ Some(_)) => {
            ScaleMode::Fixed(value.unwrap_or(geo_scripts::scale::DEFAULT_FIXED_SCALE))
        }
        (None, None) => calculator.mode,
    };

    let layer = load(input)?;
    let coords = planar_coords(settings, &layer, utm)?;
    let scale = calculator.calculate(&coords);

    println!("Escala 1:{} ({})", scale, calculator.paper);
    Ok(())
}

pub fn cmd_survey(
    settings: &Settings,
    input: &Path,
    output: &Path,
    scale: Option<u32>,
    heuristic: bool,
    utm: bool,
    auto_zone: bool,
) -> Result<()> {
    let layer = load(input)?;
    let zone = match (utm, auto_zone) {
        (true, _) => None,
        (false, true) => survey::auto_zone(&layer),
        (false, false) => Some(settings.zone()?),
    };
    if let Some(zone) = zone {
        info!(zone = %zone, "Projecting to UTM");
    }
    let points = survey::survey_points(&layer, zone)?;

    let mut calculator = settings.scale_calculator();
    if heuristic {
        calculator.mode = ScaleMode::Heuristic;
    } else if let Some(scale) = scale {
        calculator.mode = ScaleMode::Fixed(scale);
    }
    let scale = calculator.calculate(&points);

    survey::write_survey(&points, scale, &settings.survey_style(), output)?;
    println!("Survey plan saved: {} (1:{})", output.display(), scale);
    Ok(())
}

pub fn cmd_reproject(input: &Path, output: &Path, from: u32, to: u32) -> Result<()> {
    let reprojector = SmartReprojector::new(from, to)?;
    info!(from, to, using = reprojector.description(), "Reprojecting");

    let mut layer = load(input)?;
    for feature in &mut layer.features {
        feature.geometry = reprojector
            .transform_geometry(&feature.geometry)
            .with_context(|| format!("Failed to reproject feature {}", feature.label()))?;
    }

    match Format::from_path(output)? {
        Format::GeoJson => geoformats::geojson::write_geojson(&layer.features, Some(to), output)?,
        _ => {
            if to != 4326 {
                warn!(epsg = to, "KML expects WGS84 coordinates");
            }
            geoformats::write_file(&layer, output)?
        }
    }
    println!("EPSG:{} → EPSG:{}: {}", from, to, output.display());
    Ok(())
}

pub fn cmd_to_mercator(lat: f64, lon: f64) -> Result<()> {
    let (x, y) = latlon_to_web_mercator(lat, lon);
    println!("{:.2}, {:.2}", x, y);
    Ok(())
}

fn load(path: &Path) -> Result<Layer> {
    geoformats::read_file(path).with_context(|| format!("Failed to read {}", path.display()))
}
