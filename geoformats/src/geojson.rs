//! Lecture GeoJSON (crate `geojson`) et écriture streaming avec geozero

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use geo::Geometry;
use geojson::feature::Id;
use geojson::GeoJson;
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;
use tracing::{debug, warn};

use crate::types::Feature;
use crate::GeoFormatError;

/// Lit un fichier GeoJSON
pub fn read_geojson(path: &Path) -> Result<Vec<Feature>, GeoFormatError> {
    if !path.exists() {
        return Err(GeoFormatError::NotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    parse(&text)
}

/// Parse un document GeoJSON (FeatureCollection, Feature ou Geometry seule)
pub fn parse(text: &str) -> Result<Vec<Feature>, GeoFormatError> {
    let document: GeoJson = text.parse()?;

    let raw = match document {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(g) => vec![geojson::Feature::from(g)],
    };

    let mut features = Vec::with_capacity(raw.len());
    for (index, f) in raw.into_iter().enumerate() {
        let id = match f.id {
            Some(Id::String(s)) => Some(s),
            Some(Id::Number(n)) => Some(n.to_string()),
            None => None,
        };

        let Some(geometry) = f.geometry else {
            warn!(index, id = ?id, "Feature without geometry, skipped");
            continue;
        };
        let geometry: Geometry = Geometry::try_from(geometry)?;

        features.push(Feature {
            id,
            geometry,
            properties: f.properties.into_iter().flatten().collect(),
        });
    }

    debug!(features = features.len(), "GeoJSON parsed");
    Ok(features)
}

/// Exporte des features en GeoJSON (streaming avec geozero)
///
/// `epsg` ajoute le membre `crs` historique quand les coordonnées ne sont
/// pas en WGS84.
pub fn write_geojson(
    features: &[Feature],
    epsg: Option<u32>,
    output_path: &Path,
) -> Result<(), GeoFormatError> {
    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    write(&mut writer, features, epsg)?;
    writer.flush()?;
    Ok(())
}

/// Écrit une FeatureCollection dans `writer`
pub fn write<W: Write>(
    writer: &mut W,
    features: &[Feature],
    epsg: Option<u32>,
) -> Result<(), GeoFormatError> {
    write!(writer, r#"{{"type":"FeatureCollection","#)?;
    if let Some(epsg) = epsg {
        write!(
            writer,
            r#""crs":{{"type":"name","properties":{{"name":"urn:ogc:def:crs:EPSG::{}"}}}},"#,
            epsg
        )?;
    }
    write!(writer, r#""features":["#)?;

    for (i, feature) in features.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_feature(writer, feature)?;
    }

    write!(writer, "]}}")?;
    Ok(())
}

/// Écrit une feature en GeoJSON
fn write_feature<W: Write>(writer: &mut W, feature: &Feature) -> Result<(), GeoFormatError> {
    write!(writer, r#"{{"type":"Feature","#)?;
    if let Some(id) = &feature.id {
        write!(writer, r#""id":{},"#, serde_json::to_string(id)?)?;
    }

    // Géométrie via geozero
    write!(writer, r#""geometry":"#)?;
    let mut geom_buf = Vec::new();
    let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
    feature.geometry.process_geom(&mut geom_writer)?;
    writer.write_all(&geom_buf)?;

    write!(writer, r#","properties":{{"#)?;
    for (i, (key, value)) in feature.properties.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write!(
            writer,
            "{}:{}",
            serde_json::to_string(key)?,
            serde_json::to_string(value)?
        )?;
    }
    write!(writer, "}}}}")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;
    use serde_json::Value;
    use std::io::Cursor;

    #[test]
    fn test_write_feature() {
        let feature = Feature::new("test_123", Geometry::Point(Point::new(1.0, 2.0)))
            .with_property("name", "say \"hi\"");

        let mut buffer = Cursor::new(Vec::new());
        write_feature(&mut buffer, &feature).unwrap();

        let json = String::from_utf8(buffer.into_inner()).unwrap();
        assert!(json.contains(r#""id":"test_123""#));
        assert!(json.contains(r#""type":"Feature""#));
        assert!(json.contains(r#""name":"say \"hi\"""#));

        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["geometry"]["type"], "Point");
    }

    #[test]
    fn test_parse_collection() {
        let doc = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","id":7,"properties":{"name":"a","DN":12,"flag":true,"none":null},
             "geometry":{"type":"Point","coordinates":[1.0,2.0]}},
            {"type":"Feature","properties":{},"geometry":null},
            {"type":"Feature","properties":null,
             "geometry":{"type":"LineString","coordinates":[[0,0],[1,1]]}}
        ]}"#;
        let features = parse(doc).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].id.as_deref(), Some("7"));
        assert_eq!(features[0].properties["name"], "a");
        assert_eq!(features[0].properties["DN"], 12);
        assert_eq!(features[0].properties["flag"], true);
        assert_eq!(features[0].properties["none"], Value::Null);
        assert_eq!(features[1].id, None);
        assert!(matches!(features[1].geometry, Geometry::LineString(_)));
    }

    #[test]
    fn test_roundtrip_keeps_property_types() {
        let doc = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"DN":3,"ok":true,"pop":1.5,"note":null,"tag":"x"},
             "geometry":{"type":"Point","coordinates":[1.0,2.0]}}
        ]}"#;
        let features = parse(doc).unwrap();

        let mut buffer = Vec::new();
        write(&mut buffer, &features, None).unwrap();
        let value: Value = serde_json::from_slice(&buffer).unwrap();

        let feature = &value["features"][0];
        assert!(feature.get("id").is_none());
        let properties = &feature["properties"];
        assert_eq!(properties["DN"], 3);
        assert_eq!(properties["ok"], true);
        assert_eq!(properties["pop"], 1.5);
        assert_eq!(properties["note"], Value::Null);
        assert_eq!(properties["tag"], "x");
    }

    #[test]
    fn test_parse_bare_geometry() {
        let features = parse(r#"{"type":"Point","coordinates":[3.0,4.0]}"#).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].geometry, Geometry::Point(Point::new(3.0, 4.0)));
    }

    #[test]
    fn test_write_geojson_with_crs() {
        let features = vec![Feature::new("001", Geometry::Point(Point::new(500000.0, 9700000.0)))];

        let dir = tempfile::tempdir().unwrap();
        let output_path = dir.path().join("utm.geojson");
        write_geojson(&features, Some(32717), &output_path).unwrap();

        let content = std::fs::read_to_string(&output_path).unwrap();
        assert!(content.contains(r#""type":"FeatureCollection""#));
        assert!(content.contains("EPSG::32717"));

        let reread = read_geojson(&output_path).unwrap();
        assert_eq!(reread, features);
    }
}
