//! Types d'erreurs pour le crate geoformats

use std::path::PathBuf;

use thiserror::Error;

/// Erreurs pouvant survenir lors de la lecture ou de l'écriture d'une couche
#[derive(Debug, Error)]
pub enum GeoFormatError {
    /// Erreur d'I/O
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fichier d'entrée absent
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Archive KMZ sans document KML
    #[error("No KML file found inside the KMZ: {}", .0.display())]
    NoKmlInKmz(PathBuf),

    /// Archive zip illisible
    #[error("Invalid archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// XML mal formé
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Attribut XML mal formé
    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    /// GeoJSON invalide
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// JSON invalide
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Erreur geozero (encodage GeoJSON, décodage WKB)
    #[error("Geometry processing error: {0}")]
    Geozero(#[from] geozero::error::GeozeroError),

    /// Géométrie invalide
    #[error("Invalid geometry for {feature_id}: {reason}")]
    InvalidGeometry { feature_id: String, reason: String },

    /// Tuple de coordonnées illisible
    #[error("Invalid coordinate tuple: '{0}'")]
    InvalidCoordinate(String),

    /// Format non supporté pour cette opération
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Erreur de lecture Parquet
    #[cfg(feature = "parquet")]
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

impl GeoFormatError {
    /// Crée une erreur de géométrie invalide
    pub fn invalid_geometry(feature_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            feature_id: feature_id.into(),
            reason: reason.into(),
        }
    }
}
