//! Écriture des documents KML

use std::io::Write;

use geo::{Coord, Geometry, LineString, Polygon};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::types::{property_text, Feature};
use crate::GeoFormatError;

const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

/// Nom utilisé quand la feature n'a pas d'attribut `name`
pub const DEFAULT_PLACEMARK_NAME: &str = "Unnamed";

/// Écrit les features dans un document KML indenté
///
/// Chaque feature devient un `Placemark`; l'attribut `name` sert de nom
/// (`Unnamed` à défaut), `description` est repris tel quel, les autres
/// attributs vont dans `ExtendedData`.
pub fn write<W: Write>(inner: W, features: &[Feature]) -> Result<(), GeoFormatError> {
    let mut writer = Writer::new_with_indent(inner, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("kml").with_attributes([("xmlns", KML_NAMESPACE)]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("Document")))?;

    for feature in features {
        write_placemark(&mut writer, feature)?;
    }

    writer.write_event(Event::End(BytesEnd::new("Document")))?;
    writer.write_event(Event::End(BytesEnd::new("kml")))?;

    Ok(())
}

/// Sérialise les features en KML dans un buffer
pub fn to_bytes(features: &[Feature]) -> Result<Vec<u8>, GeoFormatError> {
    let mut buffer = Vec::new();
    write(&mut buffer, features)?;
    Ok(buffer)
}

fn write_placemark<W: Write>(writer: &mut Writer<W>, feature: &Feature) -> Result<(), GeoFormatError> {
    let mut placemark = BytesStart::new("Placemark");
    if let Some(id) = &feature.id {
        placemark.push_attribute(("id", id.as_str()));
    }
    writer.write_event(Event::Start(placemark))?;

    let name = feature
        .properties
        .get("name")
        .map(property_text)
        .unwrap_or_else(|| DEFAULT_PLACEMARK_NAME.to_string());
    text_element(writer, "name", &name)?;
    if let Some(description) = feature.properties.get("description") {
        text_element(writer, "description", &property_text(description))?;
    }

    let extended: Vec<_> = feature
        .properties
        .iter()
        .filter(|(k, _)| k.as_str() != "name" && k.as_str() != "description")
        .collect();

    if !extended.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("ExtendedData")))?;
        for (key, value) in extended {
            writer.write_event(Event::Start(
                BytesStart::new("Data").with_attributes([("name", key.as_str())]),
            ))?;
            text_element(writer, "value", &property_text(value))?;
            writer.write_event(Event::End(BytesEnd::new("Data")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("ExtendedData")))?;
    }

    write_geometry(writer, &feature.geometry)?;

    writer.write_event(Event::End(BytesEnd::new("Placemark")))?;
    Ok(())
}

fn write_geometry<W: Write>(writer: &mut Writer<W>, geometry: &Geometry) -> Result<(), GeoFormatError> {
    match geometry {
        Geometry::Point(p) => {
            writer.write_event(Event::Start(BytesStart::new("Point")))?;
            coordinates_element(writer, std::iter::once(p.0))?;
            writer.write_event(Event::End(BytesEnd::new("Point")))?;
        }
        Geometry::LineString(ls) => write_line_string(writer, ls)?,
        Geometry::Polygon(poly) => write_polygon(writer, poly)?,
        Geometry::MultiPoint(mp) => {
            writer.write_event(Event::Start(BytesStart::new("MultiGeometry")))?;
            for p in mp.iter() {
                write_geometry(writer, &Geometry::Point(*p))?;
            }
            writer.write_event(Event::End(BytesEnd::new("MultiGeometry")))?;
        }
        Geometry::MultiLineString(mls) => {
            writer.write_event(Event::Start(BytesStart::new("MultiGeometry")))?;
            for ls in mls.iter() {
                write_line_string(writer, ls)?;
            }
            writer.write_event(Event::End(BytesEnd::new("MultiGeometry")))?;
        }
        Geometry::MultiPolygon(mp) => {
            writer.write_event(Event::Start(BytesStart::new("MultiGeometry")))?;
            for poly in mp.iter() {
                write_polygon(writer, poly)?;
            }
            writer.write_event(Event::End(BytesEnd::new("MultiGeometry")))?;
        }
        Geometry::GeometryCollection(gc) => {
            writer.write_event(Event::Start(BytesStart::new("MultiGeometry")))?;
            for g in gc.iter() {
                write_geometry(writer, g)?;
            }
            writer.write_event(Event::End(BytesEnd::new("MultiGeometry")))?;
        }
        Geometry::Line(line) => {
            write_line_string(writer, &LineString::new(vec![line.start, line.end]))?
        }
        Geometry::Rect(rect) => write_polygon(writer, &rect.to_polygon())?,
        Geometry::Triangle(triangle) => write_polygon(writer, &triangle.to_polygon())?,
    }
    Ok(())
}

fn write_line_string<W: Write>(writer: &mut Writer<W>, ls: &LineString) -> Result<(), GeoFormatError> {
    writer.write_event(Event::Start(BytesStart::new("LineString")))?;
    coordinates_element(writer, ls.0.iter().copied())?;
    writer.write_event(Event::End(BytesEnd::new("LineString")))?;
    Ok(())
}

fn write_polygon<W: Write>(writer: &mut Writer<W>, poly: &Polygon) -> Result<(), GeoFormatError> {
    writer.write_event(Event::Start(BytesStart::new("Polygon")))?;

    writer.write_event(Event::Start(BytesStart::new("outerBoundaryIs")))?;
    write_linear_ring(writer, poly.exterior())?;
    writer.write_event(Event::End(BytesEnd::new("outerBoundaryIs")))?;

    for interior in poly.interiors() {
        writer.write_event(Event::Start(BytesStart::new("innerBoundaryIs")))?;
        write_linear_ring(writer, interior)?;
        writer.write_event(Event::End(BytesEnd::new("innerBoundaryIs")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("Polygon")))?;
    Ok(())
}

fn write_linear_ring<W: Write>(writer: &mut Writer<W>, ring: &LineString) -> Result<(), GeoFormatError> {
    writer.write_event(Event::Start(BytesStart::new("LinearRing")))?;
    coordinates_element(writer, ring.0.iter().copied())?;
    writer.write_event(Event::End(BytesEnd::new("LinearRing")))?;
    Ok(())
}

fn coordinates_element<W: Write>(
    writer: &mut Writer<W>,
    coords: impl Iterator<Item = Coord>,
) -> Result<(), GeoFormatError> {
    let text = coords
        .map(|c| format!("{},{}", c.x, c.y))
        .collect::<Vec<_>>()
        .join(" ");
    text_element(writer, "coordinates", &text)
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<(), GeoFormatError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Point};

    #[test]
    fn test_write_unnamed_placemark() {
        let features = vec![Feature::new("a", Geometry::Point(Point::new(1.5, -2.0)))];
        let kml = String::from_utf8(to_bytes(&features).unwrap()).unwrap();

        assert!(kml.starts_with("<?xml"));
        assert!(kml.contains(KML_NAMESPACE));
        assert!(kml.contains("<name>Unnamed</name>"));
        assert!(kml.contains("<coordinates>1.5,-2</coordinates>"));
    }

    #[test]
    fn test_write_escapes_and_extended_data() {
        let poly = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        let features = vec![Feature::new("p", Geometry::Polygon(poly))
            .with_property("name", "A < B & C")
            .with_property("zone", "17S")];
        let kml = String::from_utf8(to_bytes(&features).unwrap()).unwrap();

        assert!(kml.contains("<name>A &lt; B &amp; C</name>"));
        assert!(kml.contains(r#"<Data name="zone">"#));
        assert!(kml.contains("<value>17S</value>"));
        assert!(kml.contains("<outerBoundaryIs>"));
        assert!(!kml.contains(r#"<Data name="name">"#));
    }

    #[test]
    fn test_write_typed_values_and_anonymous() {
        let features = vec![Feature::anonymous(Geometry::Point(Point::new(0.0, 0.0)))
            .with_property("DN", 3)
            .with_property("ok", true)];
        let kml = String::from_utf8(to_bytes(&features).unwrap()).unwrap();

        assert!(kml.contains("<Placemark>"));
        assert!(!kml.contains("id="));
        assert!(kml.contains("<value>3</value>"));
        assert!(kml.contains("<value>true</value>"));
    }
}
