//! Archives KMZ (zip contenant un document KML)

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::GeoFormatError;

/// Nom du document KML écrit dans les KMZ produits
pub const KMZ_DOC_NAME: &str = "doc.kml";

/// Préallocation maximale pour une entrée (la taille déclarée n'est pas fiable)
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

fn capacity_hint(declared: u64) -> usize {
    declared.min(MAX_PREALLOC) as usize
}

/// Extrait le premier document KML d'une archive KMZ
///
/// Retourne le nom de l'entrée et son contenu. Les entrées sont parcourues
/// dans l'ordre de l'archive; la comparaison de l'extension est insensible
/// à la casse.
pub fn extract_kml(kmz_path: &Path) -> Result<(String, Vec<u8>), GeoFormatError> {
    if !kmz_path.exists() {
        return Err(GeoFormatError::NotFound(kmz_path.to_path_buf()));
    }

    let file = File::open(kmz_path)?;
    let mut archive = ZipArchive::new(file)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() || !entry.name().to_ascii_lowercase().ends_with(".kml") {
            continue;
        }

        let name = entry.name().to_string();
        let mut content = Vec::with_capacity(capacity_hint(entry.size()));
        entry.read_to_end(&mut content)?;

        debug!(kmz = %kmz_path.display(), entry = %name, bytes = content.len(), "KML extracted");
        return Ok((name, content));
    }

    Err(GeoFormatError::NoKmlInKmz(kmz_path.to_path_buf()))
}

/// Convertit un KMZ en KML en extrayant son document interne
///
/// Le KML est écrit à côté du KMZ, même nom avec l'extension `.kml`.
pub fn convert_kmz_to_kml(kmz_path: &Path) -> Result<PathBuf, GeoFormatError> {
    let (_, content) = extract_kml(kmz_path)?;

    let kml_path = kmz_path.with_extension("kml");
    std::fs::write(&kml_path, content)?;

    Ok(kml_path)
}

/// Écrit un document KML dans une archive KMZ (entrée `doc.kml`, deflate)
pub fn write_kmz(kml: &[u8], kmz_path: &Path) -> Result<(), GeoFormatError> {
    let file = File::create(kmz_path)?;
    let mut zip = ZipWriter::new(file);

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(KMZ_DOC_NAME, options)?;
    zip.write_all(kml)?;
    zip.finish()?;

    Ok(())
}

/// Extrait toutes les entrées d'un zip dans un répertoire, retourne leur nombre
///
/// Les entrées dont le chemin sortirait du répertoire cible sont refusées
/// par `zip`.
pub fn unzip(zip_path: &Path, dest: &Path) -> Result<usize, GeoFormatError> {
    if !zip_path.exists() {
        return Err(GeoFormatError::NotFound(zip_path.to_path_buf()));
    }

    std::fs::create_dir_all(dest)?;
    let mut archive = ZipArchive::new(File::open(zip_path)?)?;
    let entries = archive.len();
    archive.extract(dest)?;

    debug!(zip = %zip_path.display(), dest = %dest.display(), entries, "Archive extracted");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_hint_is_capped() {
        assert_eq!(capacity_hint(1024), 1024);
        assert_eq!(capacity_hint(u64::MAX), MAX_PREALLOC as usize);
        assert_eq!(capacity_hint(8 * 1024 * 1024 * 1024), MAX_PREALLOC as usize);
    }

    fn build_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, content) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_extract_missing_file() {
        let result = extract_kml(Path::new("nonexistent.kmz"));
        assert!(matches!(result, Err(GeoFormatError::NotFound(_))));
    }

    #[test]
    fn test_extract_first_kml() {
        let dir = tempfile::tempdir().unwrap();
        let kmz = dir.path().join("layers.kmz");
        build_zip(
            &kmz,
            &[
                ("images/icon.png", "png"),
                ("first.KML", "<kml>first</kml>"),
                ("second.kml", "<kml>second</kml>"),
            ],
        );

        let (name, content) = extract_kml(&kmz).unwrap();
        assert_eq!(name, "first.KML");
        assert_eq!(content, b"<kml>first</kml>");
    }

    #[test]
    fn test_extract_without_kml() {
        let dir = tempfile::tempdir().unwrap();
        let kmz = dir.path().join("empty.kmz");
        build_zip(&kmz, &[("readme.txt", "nothing here")]);

        let err = extract_kml(&kmz).unwrap_err();
        assert!(matches!(err, GeoFormatError::NoKmlInKmz(_)));
        assert!(err.to_string().contains("No KML file found"));
    }

    #[test]
    fn test_convert_and_write_kmz() {
        let dir = tempfile::tempdir().unwrap();
        let kmz = dir.path().join("zone.kmz");
        write_kmz(b"<kml/>", &kmz).unwrap();

        let kml = convert_kmz_to_kml(&kmz).unwrap();
        assert_eq!(kml, dir.path().join("zone.kml"));
        assert_eq!(std::fs::read(&kml).unwrap(), b"<kml/>");
    }

    #[test]
    fn test_unzip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("bundle.zip");
        build_zip(&archive, &[("a.kml", "a"), ("sub/b.txt", "b")]);

        let dest = dir.path().join("out");
        assert_eq!(unzip(&archive, &dest).unwrap(), 2);
        assert_eq!(std::fs::read_to_string(dest.join("a.kml")).unwrap(), "a");
        assert_eq!(std::fs::read_to_string(dest.join("sub/b.txt")).unwrap(), "b");
    }
}
