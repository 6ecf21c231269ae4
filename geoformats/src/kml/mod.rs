//! Lecture et écriture KML / KMZ

pub mod reader;
pub mod writer;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::types::Feature;
use crate::{archive, GeoFormatError};

pub use reader::{parse, parse_coordinates};
pub use writer::DEFAULT_PLACEMARK_NAME;

/// Lit un fichier KML
pub fn read_kml(path: &Path) -> Result<Vec<Feature>, GeoFormatError> {
    if !path.exists() {
        return Err(GeoFormatError::NotFound(path.to_path_buf()));
    }
    let data = std::fs::read(path)?;
    reader::parse(&data)
}

/// Lit le premier document KML d'un KMZ
pub fn read_kmz(path: &Path) -> Result<Vec<Feature>, GeoFormatError> {
    let (_, data) = archive::extract_kml(path)?;
    reader::parse(&data)
}

/// Écrit un fichier KML
pub fn write_kml(features: &[Feature], path: &Path) -> Result<(), GeoFormatError> {
    let mut out = BufWriter::new(File::create(path)?);
    writer::write(&mut out, features)?;
    out.flush()?;
    Ok(())
}

/// Écrit un fichier KMZ (`doc.kml` compressé)
pub fn write_kmz(features: &[Feature], path: &Path) -> Result<(), GeoFormatError> {
    let kml = writer::to_bytes(features)?;
    archive::write_kmz(&kml, path)
}
