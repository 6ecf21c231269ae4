//! Surface des polygones en hectares
//!
//! Chaque sommet est projeté dans une zone UTM (17 Sud par défaut), puis la
//! surface plane de l'anneau extérieur est calculée. Les trous ne sont pas
//! déduits.

use std::path::Path;

use anyhow::{Context, Result};
use geo::{Area, Geometry, Polygon};
use geoformats::Layer;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::reproject_lite::{ReprojectorLite, UtmZone};

/// Attribut ajouté par [`calculate_polygon_area`]
pub const AREA_PROPERTY: &str = "area_ha";

/// Zone UTM par défaut (17 Sud, EPSG:32717)
pub const DEFAULT_ZONE: UtmZone = UtmZone {
    zone: 17,
    south: true,
};

const SQUARE_METERS_PER_HECTARE: f64 = 1e4;

/// Surface d'une géométrie WGS84 en hectares
///
/// Seul l'anneau extérieur compte; un multipolygone somme ses parties. Les
/// géométries sans surface (points, lignes) valent 0.
pub fn area_hectares(geometry: &Geometry, zone: UtmZone) -> Result<f64> {
    let projected = ReprojectorLite::to_utm(zone).transform_geometry(geometry)?;
    Ok(exterior_area(&projected) / SQUARE_METERS_PER_HECTARE)
}

fn exterior_area(geometry: &Geometry) -> f64 {
    fn shell(polygon: &Polygon) -> f64 {
        Polygon::new(polygon.exterior().clone(), vec![]).unsigned_area()
    }

    match geometry {
        Geometry::Polygon(p) => shell(p),
        Geometry::MultiPolygon(mp) => mp.iter().map(shell).sum(),
        Geometry::GeometryCollection(gc) => gc.iter().map(exterior_area).sum(),
        other => other.unsigned_area(),
    }
}

/// Charge un fichier (KML, KMZ ou autre format lisible) et ajoute `area_ha`
/// à chaque feature
pub fn calculate_polygon_area(path: &Path, zone: UtmZone) -> Result<Layer> {
    let mut layer = geoformats::read_file(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let areas: Vec<f64> = layer
        .features
        .par_iter()
        .map(|f| {
            area_hectares(&f.geometry, zone)
                .with_context(|| format!("Failed to compute area of feature {}", f.label()))
        })
        .collect::<Result<_>>()?;

    for (feature, area) in layer.features.iter_mut().zip(&areas) {
        debug!(feature = feature.label(), area_ha = area, "Area computed");
        feature
            .properties
            .insert(AREA_PROPERTY.to_string(), (*area).into());
    }

    info!(
        features = layer.len(),
        zone = %zone,
        total_ha = areas.iter().sum::<f64>(),
        "Areas computed"
    );
    Ok(layer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reproject_lite::utm_to_geographic;
    use approx::assert_relative_eq;
    use geo::{LineString, MultiPolygon, Point, Polygon};

    /// Carré défini en UTM, exprimé en WGS84
    fn square_wgs84(x0: f64, y0: f64, side: f64, zone: UtmZone) -> LineString {
        let corners = [
            (x0, y0),
            (x0 + side, y0),
            (x0 + side, y0 + side),
            (x0, y0 + side),
            (x0, y0),
        ];
        LineString::from(
            corners
                .iter()
                .map(|&(x, y)| utm_to_geographic(x, y, zone).unwrap().to_degrees())
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_hundred_meter_square_is_one_hectare() {
        let ring = square_wgs84(621_000.0, 9_763_000.0, 100.0, DEFAULT_ZONE);
        let poly = Geometry::Polygon(Polygon::new(ring, vec![]));

        let area = area_hectares(&poly, DEFAULT_ZONE).unwrap();
        assert_relative_eq!(area, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_holes_are_ignored() {
        let outer = square_wgs84(621_000.0, 9_763_000.0, 100.0, DEFAULT_ZONE);
        let hole = square_wgs84(621_025.0, 9_763_025.0, 50.0, DEFAULT_ZONE);
        let poly = Geometry::Polygon(Polygon::new(outer, vec![hole]));

        let area = area_hectares(&poly, DEFAULT_ZONE).unwrap();
        assert_relative_eq!(area, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_area_property_is_numeric() {
        let ring = square_wgs84(621_000.0, 9_763_000.0, 100.0, DEFAULT_ZONE);
        let feature = geoformats::Feature::anonymous(Geometry::Polygon(Polygon::new(ring, vec![])));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lote.geojson");
        geoformats::write_features(&[feature], &path).unwrap();

        let layer = calculate_polygon_area(&path, DEFAULT_ZONE).unwrap();
        let area = layer.features[0].properties[AREA_PROPERTY].as_f64().unwrap();
        assert_relative_eq!(area, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_multipolygon_sums_parts() {
        let a = Polygon::new(square_wgs84(621_000.0, 9_763_000.0, 100.0, DEFAULT_ZONE), vec![]);
        let b = Polygon::new(square_wgs84(622_000.0, 9_763_000.0, 200.0, DEFAULT_ZONE), vec![]);
        let multi = Geometry::MultiPolygon(MultiPolygon::new(vec![a, b]));

        let area = area_hectares(&multi, DEFAULT_ZONE).unwrap();
        assert_relative_eq!(area, 5.0, epsilon = 1e-2);
    }

    #[test]
    fn test_point_has_no_area() {
        let point = Geometry::Point(Point::new(-79.9, -2.1));
        assert_eq!(area_hectares(&point, DEFAULT_ZONE).unwrap(), 0.0);
    }
}
