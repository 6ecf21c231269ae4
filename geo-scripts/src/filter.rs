//! Filtre de polygones par seuil de longitude ou de latitude

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Error, Result};
use geo::{CoordsIter, Geometry};
use geoformats::{Feature, Layer};
use tracing::info;

/// Axe testé
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Lon,
    Lat,
}

/// Opérateur de comparaison `valeur op seuil`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    fn test(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Lt => value < threshold,
            Self::Le => value <= threshold,
            Self::Gt => value > threshold,
            Self::Ge => value >= threshold,
        }
    }
}

impl FromStr for Axis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "lon" | "x" | "longitude" => Ok(Self::Lon),
            "lat" | "y" | "latitude" => Ok(Self::Lat),
            other => bail!("Unknown axis '{}': use lon or lat", other),
        }
    }
}

impl FromStr for Comparison {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lt" | "<" => Ok(Self::Lt),
            "le" | "<=" => Ok(Self::Le),
            "gt" | ">" => Ok(Self::Gt),
            "ge" | ">=" => Ok(Self::Ge),
            other => bail!("Unknown comparison '{}': use lt, le, gt or ge", other),
        }
    }
}

/// Filtre `axe op seuil`, par ex. `lon < -79.9`
#[derive(Debug, Clone, Copy)]
pub struct ThresholdFilter {
    pub axis: Axis,
    pub op: Comparison,
    pub threshold: f64,
}

impl fmt::Display for ThresholdFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axis = match self.axis {
            Axis::Lon => "lon",
            Axis::Lat => "lat",
        };
        let op = match self.op {
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        };
        write!(f, "{} {} {}", axis, op, self.threshold)
    }
}

impl ThresholdFilter {
    pub fn new(axis: Axis, op: Comparison, threshold: f64) -> Self {
        Self { axis, op, threshold }
    }

    /// Vrai pour un polygone dont au moins un sommet (tous anneaux) satisfait le seuil
    pub fn matches(&self, geometry: &Geometry) -> bool {
        match geometry {
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) => geometry.coords_iter().any(|c| {
                let value = match self.axis {
                    Axis::Lon => c.x,
                    Axis::Lat => c.y,
                };
                self.op.test(value, self.threshold)
            }),
            _ => false,
        }
    }
}

/// Conserve les polygones qui satisfont le filtre, dans l'ordre d'origine
pub fn filter_layer(layer: &Layer, filter: &ThresholdFilter) -> Layer {
    let features: Vec<Feature> = layer
        .features
        .iter()
        .filter(|f| filter.matches(&f.geometry))
        .cloned()
        .collect();

    info!(
        filter = %filter,
        kept = features.len(),
        dropped = layer.len() - features.len(),
        "Layer filtered"
    );
    Layer::new(features, layer.format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, MultiPolygon, Point, Polygon};
    use geoformats::Format;

    fn square(x0: f64, y0: f64) -> Polygon {
        Polygon::new(
            LineString::from(vec![
                (x0, y0),
                (x0 + 0.1, y0),
                (x0 + 0.1, y0 + 0.1),
                (x0, y0 + 0.1),
                (x0, y0),
            ]),
            vec![],
        )
    }

    fn sample_layer() -> Layer {
        Layer::new(
            vec![
                Feature::new("west", Geometry::Polygon(square(-80.2, -2.0))),
                Feature::new("east", Geometry::Polygon(square(-79.5, -2.0))),
                Feature::new("straddle", Geometry::Polygon(square(-79.95, -2.0))),
                Feature::new("point", Geometry::Point(Point::new(-81.0, -2.0))),
                Feature::new(
                    "multi",
                    Geometry::MultiPolygon(MultiPolygon::new(vec![
                        square(-79.0, -2.0),
                        square(-80.5, -2.0),
                    ])),
                ),
            ],
            Format::GeoJson,
        )
    }

    fn ids(layer: &Layer) -> Vec<&str> {
        layer.features.iter().map(|f| f.label()).collect()
    }

    #[test]
    fn test_keeps_polygons_with_one_matching_vertex() {
        let filter = ThresholdFilter::new(Axis::Lon, Comparison::Lt, -79.9);
        let result = filter_layer(&sample_layer(), &filter);

        assert_eq!(ids(&result), vec!["west", "straddle", "multi"]);
        assert_eq!(result.format, Format::GeoJson);
    }

    #[test]
    fn test_strict_and_inclusive_bounds() {
        let layer = sample_layer();
        // Sommet le plus à l'ouest de "east" : -79.5
        let strict = ThresholdFilter::new(Axis::Lon, Comparison::Lt, -79.5);
        assert!(!ids(&filter_layer(&layer, &strict)).contains(&"east"));

        let inclusive = ThresholdFilter::new(Axis::Lon, Comparison::Le, -79.5);
        assert!(ids(&filter_layer(&layer, &inclusive)).contains(&"east"));
    }

    #[test]
    fn test_latitude_axis() {
        let filter = ThresholdFilter::new(Axis::Lat, Comparison::Ge, 0.0);
        assert!(filter_layer(&sample_layer(), &filter).is_empty());

        let filter = ThresholdFilter::new(Axis::Lat, Comparison::Le, -2.0);
        assert_eq!(filter_layer(&sample_layer(), &filter).len(), 4);
    }

    #[test]
    fn test_parse() {
        assert_eq!("LON".parse::<Axis>().unwrap(), Axis::Lon);
        assert_eq!(">=".parse::<Comparison>().unwrap(), Comparison::Ge);
        assert!("z".parse::<Axis>().is_err());
        assert!("eq".parse::<Comparison>().is_err());
        assert_eq!(
            ThresholdFilter::new(Axis::Lon, Comparison::Lt, -79.9).to_string(),
            "lon < -79.9"
        );
    }
}
