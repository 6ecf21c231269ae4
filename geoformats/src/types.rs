//! Types de données pour le crate geoformats

use std::collections::BTreeMap;
use std::path::Path;

use geo::Geometry;
use serde_json::Value;

use crate::GeoFormatError;

/// Une feature avec sa géométrie et ses attributs
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Identifiant lu dans le fichier (id GeoJSON, attribut `id` du Placemark)
    pub id: Option<String>,

    /// Géométrie
    pub geometry: Geometry,

    /// Attributs typés (texte, nombre, booléen, null)
    pub properties: BTreeMap<String, Value>,
}

impl Feature {
    pub fn new(id: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            id: Some(id.into()),
            geometry,
            properties: BTreeMap::new(),
        }
    }

    /// Feature sans identifiant
    pub fn anonymous(geometry: Geometry) -> Self {
        Self {
            id: None,
            geometry,
            properties: BTreeMap::new(),
        }
    }

    /// Nom de la feature (attribut `name` textuel), s'il existe
    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").and_then(Value::as_str)
    }

    /// Libellé pour les logs : id, sinon nom, sinon `-`
    pub fn label(&self) -> &str {
        self.id.as_deref().or_else(|| self.name()).unwrap_or("-")
    }

    /// Ajoute ou remplace un attribut
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Texte d'un attribut pour les formats non typés (KML) : null → vide
pub fn property_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Formats de fichiers pris en charge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Kml,
    Kmz,
    GeoJson,
    Parquet,
}

impl Format {
    /// Détecte le format depuis l'extension (insensible à la casse)
    pub fn from_path(path: &Path) -> Result<Self, GeoFormatError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match extension.as_str() {
            "kml" => Ok(Self::Kml),
            "kmz" => Ok(Self::Kmz),
            "geojson" | "json" => Ok(Self::GeoJson),
            "parquet" | "geoparquet" => Ok(Self::Parquet),
            _ => Err(GeoFormatError::UnsupportedFormat(format!(
                "'{}' (expected .kml, .kmz, .geojson, .json or .parquet)",
                path.display()
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Kml => "KML",
            Self::Kmz => "KMZ",
            Self::GeoJson => "GeoJSON",
            Self::Parquet => "Parquet",
        }
    }
}

/// Une couche chargée : les features d'un fichier et son format d'origine
#[derive(Debug, Clone)]
pub struct Layer {
    /// Features dans l'ordre du fichier
    pub features: Vec<Feature>,

    /// Format du fichier source
    pub format: Format,
}

impl Layer {
    pub fn new(features: Vec<Feature>, format: Format) -> Self {
        Self { features, format }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Itère sur les géométries
    pub fn geometries(&self) -> impl Iterator<Item = &Geometry> {
        self.features.iter().map(|f| &f.geometry)
    }

    /// Affecte le même attribut à toutes les features
    pub fn set_property(&mut self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        for feature in &mut self.features {
            feature.properties.insert(key.to_string(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path(Path::new("a.KML")).unwrap(), Format::Kml);
        assert_eq!(Format::from_path(Path::new("a.kmz")).unwrap(), Format::Kmz);
        assert_eq!(
            Format::from_path(Path::new("dir/a.geojson")).unwrap(),
            Format::GeoJson
        );
        assert_eq!(Format::from_path(Path::new("a.json")).unwrap(), Format::GeoJson);
        assert_eq!(
            Format::from_path(Path::new("a.parquet")).unwrap(),
            Format::Parquet
        );
        assert!(Format::from_path(Path::new("a.shp")).is_err());
        assert!(Format::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_set_property() {
        let mut layer = Layer::new(
            vec![
                Feature::new("0", Geometry::Point(Point::new(0.0, 0.0))),
                Feature::new("1", Geometry::Point(Point::new(1.0, 1.0))).with_property("k", "old"),
            ],
            Format::GeoJson,
        );
        layer.set_property("k", "v");
        assert!(layer.features.iter().all(|f| f.properties["k"] == "v"));

        layer.set_property("n", 3);
        assert!(layer.features.iter().all(|f| f.properties["n"] == 3));
    }

    #[test]
    fn test_label_and_property_text() {
        let anonymous = Feature::anonymous(Geometry::Point(Point::new(0.0, 0.0)));
        assert_eq!(anonymous.label(), "-");
        assert_eq!(anonymous.clone().with_property("name", "Lote").label(), "Lote");
        assert_eq!(
            Feature::new("7", Geometry::Point(Point::new(0.0, 0.0))).label(),
            "7"
        );

        assert_eq!(property_text(&Value::from(1.5)), "1.5");
        assert_eq!(property_text(&Value::from(true)), "true");
        assert_eq!(property_text(&Value::Null), "");
        assert_eq!(property_text(&Value::from("texto")), "texto");
    }
}
