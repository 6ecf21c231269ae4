//! # geoformats
//!
//! Lecture et écriture de couches vectorielles : KML, KMZ, GeoJSON et
//! GeoParquet (feature `parquet`).
//!
//! ## Features
//!
//! - Lecteur KML événementiel (`quick-xml`), Placemarks → features
//! - Extraction KMZ (premier document `.kml` de l'archive)
//! - Export GeoJSON streaming avec `geozero`
//! - Types `geo` pour l'interopérabilité avec l'écosystème Rust géospatial
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geoformats::{read_file, write_file};
//! use std::path::Path;
//!
//! let layer = read_file(Path::new("centros.kmz"))?;
//! println!("{} features ({})", layer.len(), layer.format.name());
//! write_file(&layer, Path::new("centros.geojson"))?;
//! ```

pub mod archive;
pub mod error;
pub mod geojson;
#[cfg(feature = "parquet")]
pub mod geoparquet;
pub mod kml;
pub mod types;

pub use error::GeoFormatError;
pub use types::{property_text, Feature, Format, Layer};

use std::path::Path;

use tracing::info;

/// Charge un fichier vectoriel, format déduit de l'extension
pub fn read_file(path: &Path) -> Result<Layer, GeoFormatError> {
    let format = Format::from_path(path)?;

    let features = match format {
        Format::Kml => kml::read_kml(path)?,
        Format::Kmz => kml::read_kmz(path)?,
        Format::GeoJson => crate::geojson::read_geojson(path)?,
        Format::Parquet => read_parquet(path)?,
    };

    info!(path = %path.display(), format = format.name(), features = features.len(), "Layer loaded");
    Ok(Layer::new(features, format))
}

/// Écrit une couche, format déduit de l'extension (KML, KMZ ou GeoJSON)
pub fn write_file(layer: &Layer, path: &Path) -> Result<(), GeoFormatError> {
    write_features(&layer.features, path)
}

/// Écrit des features, format déduit de l'extension (KML, KMZ, GeoJSON ou
/// GeoParquet avec le feature `parquet`)
pub fn write_features(features: &[Feature], path: &Path) -> Result<(), GeoFormatError> {
    match Format::from_path(path)? {
        Format::Kml => kml::write_kml(features, path)?,
        Format::Kmz => kml::write_kmz(features, path)?,
        Format::GeoJson => crate::geojson::write_geojson(features, None, path)?,
        Format::Parquet => write_parquet(features, path)?,
    }

    info!(path = %path.display(), features = features.len(), "Layer written");
    Ok(())
}

#[cfg(feature = "parquet")]
fn read_parquet(path: &Path) -> Result<Vec<Feature>, GeoFormatError> {
    geoparquet::read_parquet(path, geoparquet::DEFAULT_GEOMETRY_COLUMN)
}

#[cfg(feature = "parquet")]
fn write_parquet(features: &[Feature], path: &Path) -> Result<(), GeoFormatError> {
    geoparquet::write_parquet(features, geoparquet::DEFAULT_GEOMETRY_COLUMN, path)
}

#[cfg(not(feature = "parquet"))]
fn read_parquet(path: &Path) -> Result<Vec<Feature>, GeoFormatError> {
    Err(parquet_disabled(path))
}

#[cfg(not(feature = "parquet"))]
fn write_parquet(_features: &[Feature], path: &Path) -> Result<(), GeoFormatError> {
    Err(parquet_disabled(path))
}

#[cfg(not(feature = "parquet"))]
fn parquet_disabled(path: &Path) -> GeoFormatError {
    GeoFormatError::UnsupportedFormat(format!(
        "{}: Parquet support requires the `parquet` feature",
        path.display()
    ))
}
