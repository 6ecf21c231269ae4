//! Lecture des documents KML
//!
//! Le document est d'abord réduit en un arbre d'éléments léger (nom local,
//! attributs, texte, enfants), puis chaque `Placemark` est interprété.

use geo::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, warn};

use crate::types::Feature;
use crate::GeoFormatError;

/// Élément XML simplifié
#[derive(Debug, Default)]
struct Node {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn from_start(start: &BytesStart) -> Result<Self, GeoFormatError> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attrs.push((key, value));
        }
        Ok(Self {
            name,
            attrs,
            ..Default::default()
        })
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)
            .map(|c| c.text.trim())
            .filter(|t| !t.is_empty())
    }
}

/// Parse un document KML et retourne ses Placemarks sous forme de features
pub fn parse(data: &[u8]) -> Result<Vec<Feature>, GeoFormatError> {
    let root = build_tree(data)?;

    let mut placemarks = Vec::new();
    collect_placemarks(&root, &mut placemarks);

    let mut features = Vec::with_capacity(placemarks.len());
    for (index, placemark) in placemarks.into_iter().enumerate() {
        let id = placemark.attr("id").map(str::to_string);
        let label = id.clone().unwrap_or_else(|| format!("#{}", index));

        let Some(geometry) = placemark_geometry(placemark, &label)? else {
            warn!(placemark = %label, "Placemark without geometry, skipped");
            continue;
        };

        let mut feature = Feature::anonymous(geometry);
        feature.id = id;
        read_properties(placemark, &mut feature);
        features.push(feature);
    }

    debug!(features = features.len(), "KML parsed");
    Ok(features)
}

/// Construit l'arbre d'éléments à partir du flux d'événements
fn build_tree(data: &[u8]) -> Result<Node, GeoFormatError> {
    let mut reader = Reader::from_reader(data);
    reader.trim_text(true);

    let mut stack: Vec<Node> = vec![Node::default()];
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => stack.push(Node::from_start(&e)?),
            Event::Empty(e) => {
                let node = Node::from_start(&e)?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(node);
                }
            }
            Event::Text(t) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(_) => {
                // La racine synthétique reste toujours au fond de la pile
                if stack.len() > 1 {
                    if let Some(node) = stack.pop() {
                        if let Some(parent) = stack.last_mut() {
                            parent.children.push(node);
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    // Document tronqué : refermer les éléments encore ouverts
    while stack.len() > 1 {
        if let Some(node) = stack.pop() {
            if let Some(parent) = stack.last_mut() {
                parent.children.push(node);
            }
        }
    }

    stack
        .pop()
        .ok_or_else(|| GeoFormatError::UnsupportedFormat("empty KML document".into()))
}

fn collect_placemarks<'a>(node: &'a Node, out: &mut Vec<&'a Node>) {
    for child in &node.children {
        if child.name == "Placemark" {
            out.push(child);
        } else {
            collect_placemarks(child, out);
        }
    }
}

/// Nom, description et ExtendedData deviennent des attributs
fn read_properties(placemark: &Node, feature: &mut Feature) {
    if let Some(name) = placemark.child_text("name") {
        feature.properties.insert("name".into(), name.into());
    }
    if let Some(description) = placemark.child_text("description") {
        feature
            .properties
            .insert("description".into(), description.into());
    }

    let Some(extended) = placemark.child("ExtendedData") else {
        return;
    };

    // <Data name="..."><value>...</value></Data>
    for data in extended.children_named("Data") {
        if let Some(key) = data.attr("name") {
            let value = data.child_text("value").unwrap_or("");
            feature.properties.insert(key.to_string(), value.into());
        }
    }

    // <SchemaData><SimpleData name="...">...</SimpleData></SchemaData>
    for schema_data in extended.children_named("SchemaData") {
        for simple in schema_data.children_named("SimpleData") {
            if let Some(key) = simple.attr("name") {
                feature
                    .properties
                    .insert(key.to_string(), simple.text.trim().into());
            }
        }
    }
}

const GEOMETRY_TAGS: &[&str] = &["Point", "LineString", "LinearRing", "Polygon", "MultiGeometry"];

fn placemark_geometry(placemark: &Node, id: &str) -> Result<Option<Geometry>, GeoFormatError> {
    match placemark
        .children
        .iter()
        .find(|c| GEOMETRY_TAGS.contains(&c.name.as_str()))
    {
        Some(node) => parse_geometry(node, id).map(Some),
        None => Ok(None),
    }
}

fn parse_geometry(node: &Node, id: &str) -> Result<Geometry, GeoFormatError> {
    match node.name.as_str() {
        "Point" => {
            let coords = node_coordinates(node)?;
            let coord = coords
                .first()
                .copied()
                .ok_or_else(|| GeoFormatError::invalid_geometry(id, "Point without coordinates"))?;
            Ok(Geometry::Point(Point::from(coord)))
        }
        "LineString" | "LinearRing" => {
            let coords = node_coordinates(node)?;
            if coords.len() < 2 {
                return Err(GeoFormatError::invalid_geometry(
                    id,
                    format!("{} with {} coordinate(s)", node.name, coords.len()),
                ));
            }
            Ok(Geometry::LineString(LineString::new(coords)))
        }
        "Polygon" => parse_polygon(node, id).map(Geometry::Polygon),
        "MultiGeometry" => {
            let parts = node
                .children
                .iter()
                .filter(|c| GEOMETRY_TAGS.contains(&c.name.as_str()))
                .map(|c| parse_geometry(c, id))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(collapse_multi(parts))
        }
        other => Err(GeoFormatError::invalid_geometry(
            id,
            format!("unsupported geometry element <{}>", other),
        )),
    }
}

fn parse_polygon(node: &Node, id: &str) -> Result<Polygon, GeoFormatError> {
    let outer = node
        .child("outerBoundaryIs")
        .and_then(|b| b.child("LinearRing"))
        .ok_or_else(|| GeoFormatError::invalid_geometry(id, "Polygon without outerBoundaryIs"))?;

    let exterior = ring(outer, id)?;
    let mut interiors = Vec::new();
    for inner in node.children_named("innerBoundaryIs") {
        for linear_ring in inner.children_named("LinearRing") {
            interiors.push(ring(linear_ring, id)?);
        }
    }

    Ok(Polygon::new(exterior, interiors))
}

fn ring(node: &Node, id: &str) -> Result<LineString, GeoFormatError> {
    let coords = node_coordinates(node)?;
    if coords.len() < 3 {
        return Err(GeoFormatError::invalid_geometry(
            id,
            format!("ring with {} coordinate(s)", coords.len()),
        ));
    }
    // Polygon::new ferme l'anneau si nécessaire
    Ok(LineString::new(coords))
}

/// Regroupe les parties d'un MultiGeometry dans le type Multi* adéquat
fn collapse_multi(parts: Vec<Geometry>) -> Geometry {
    if !parts.is_empty() && parts.iter().all(|g| matches!(g, Geometry::Point(_))) {
        let points = parts
            .into_iter()
            .filter_map(|g| match g {
                Geometry::Point(p) => Some(p),
                _ => None,
            })
            .collect::<Vec<_>>();
        return Geometry::MultiPoint(MultiPoint::new(points));
    }

    if !parts.is_empty() && parts.iter().all(|g| matches!(g, Geometry::LineString(_))) {
        let lines = parts
            .into_iter()
            .filter_map(|g| match g {
                Geometry::LineString(l) => Some(l),
                _ => None,
            })
            .collect::<Vec<_>>();
        return Geometry::MultiLineString(MultiLineString::new(lines));
    }

    if !parts.is_empty()
        && parts
            .iter()
            .all(|g| matches!(g, Geometry::Polygon(_) | Geometry::MultiPolygon(_)))
    {
        let mut polygons = Vec::new();
        for part in parts {
            match part {
                Geometry::Polygon(p) => polygons.push(p),
                Geometry::MultiPolygon(mp) => polygons.extend(mp.0),
                _ => {}
            }
        }
        return Geometry::MultiPolygon(MultiPolygon::new(polygons));
    }

    Geometry::GeometryCollection(GeometryCollection::new_from(parts))
}

fn node_coordinates(node: &Node) -> Result<Vec<Coord>, GeoFormatError> {
    match node.child("coordinates") {
        Some(c) => parse_coordinates(&c.text),
        None => Ok(Vec::new()),
    }
}

/// Parse un bloc `lon,lat[,alt] lon,lat[,alt] ...` (l'altitude est ignorée)
pub fn parse_coordinates(text: &str) -> Result<Vec<Coord>, GeoFormatError> {
    text.split_whitespace()
        .map(|tuple| {
            let mut parts = tuple.split(',');
            let x = parts.next().and_then(parse_f64);
            let y = parts.next().and_then(parse_f64);
            match (x, y) {
                (Some(x), Some(y)) => Ok(Coord { x, y }),
                _ => Err(GeoFormatError::InvalidCoordinate(tuple.to_string())),
            }
        })
        .collect()
}

#[inline]
fn parse_f64(s: &str) -> Option<f64> {
    fast_float::parse(s).ok()
}
