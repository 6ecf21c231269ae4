//! Reprojection légère en Rust pur (sans dépendances externes)
//!
//! Systèmes supportés, en source comme en cible :
//! - WGS84 géographique (EPSG:4326)
//! - Web Mercator (EPSG:3857)
//! - WGS84 / UTM, zones 1 à 60 nord (EPSG:326zz) et sud (EPSG:327zz)

mod ellipsoid;
mod mercator;
mod smart;
mod utm;

pub use mercator::{geographic_to_web_mercator, latlon_to_web_mercator, web_mercator_to_geographic};
pub use smart::SmartReprojector;
pub use utm::{geographic_to_utm, utm_to_geographic, UtmZone};

use anyhow::{bail, Result};
use geo::{Coord, Geometry, MapCoords};

/// EPSG de WGS84 géographique
pub const EPSG_WGS84: u32 = 4326;
/// EPSG de Web Mercator
pub const EPSG_WEB_MERCATOR: u32 = 3857;

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Système de coordonnées pris en charge par la reprojection légère
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crs {
    Wgs84,
    WebMercator,
    Utm(UtmZone),
}

impl Crs {
    pub fn from_epsg(epsg: u32) -> Option<Self> {
        match epsg {
            EPSG_WGS84 => Some(Self::Wgs84),
            EPSG_WEB_MERCATOR => Some(Self::WebMercator),
            _ => UtmZone::from_epsg(epsg).map(Self::Utm),
        }
    }

    pub fn epsg(self) -> u32 {
        match self {
            Self::Wgs84 => EPSG_WGS84,
            Self::WebMercator => EPSG_WEB_MERCATOR,
            Self::Utm(zone) => zone.epsg(),
        }
    }
}

/// Reprojection légère entre WGS84, Web Mercator et UTM
#[derive(Debug, Clone, Copy)]
pub struct ReprojectorLite {
    source: Crs,
    target: Crs,
}

impl ReprojectorLite {
    /// Crée un nouveau reprojector
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self> {
        let Some(source) = Crs::from_epsg(source_epsg) else {
            bail!(
                "EPSG:{} not supported. Supported: 4326, 3857, 32601-32660, 32701-32760",
                source_epsg
            );
        };
        let Some(target) = Crs::from_epsg(target_epsg) else {
            bail!(
                "EPSG:{} not supported. Supported: 4326, 3857, 32601-32660, 32701-32760",
                target_epsg
            );
        };

        Ok(Self { source, target })
    }

    /// Reprojector WGS84 → zone UTM
    pub fn to_utm(zone: UtmZone) -> Self {
        Self {
            source: Crs::Wgs84,
            target: Crs::Utm(zone),
        }
    }

    /// Vérifie si la reprojection est supportée
    pub fn is_supported(source: u32, target: u32) -> bool {
        Crs::from_epsg(source).is_some() && Crs::from_epsg(target).is_some()
    }

    pub fn source_epsg(&self) -> u32 {
        self.source.epsg()
    }

    pub fn target_epsg(&self) -> u32 {
        self.target.epsg()
    }

    /// Transforme un point (x, y) de la source vers la cible
    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        if self.source == self.target {
            return Ok((x, y));
        }

        // Étape 1: Source → Géographique (WGS84)
        let geo = self.source_to_geographic(x, y)?;

        // Étape 2: Géographique → Cible
        self.geographic_to_target(geo)
    }

    fn source_to_geographic(&self, x: f64, y: f64) -> Result<Geographic> {
        match self.source {
            Crs::Wgs84 => Ok(Geographic::from_degrees(x, y)),
            Crs::WebMercator => mercator::web_mercator_to_geographic(x, y),
            Crs::Utm(zone) => utm::utm_to_geographic(x, y, zone),
        }
    }

    fn geographic_to_target(&self, geo: Geographic) -> Result<(f64, f64)> {
        match self.target {
            Crs::Wgs84 => Ok(geo.to_degrees()),
            Crs::WebMercator => mercator::geographic_to_web_mercator(geo),
            Crs::Utm(zone) => utm::geographic_to_utm(geo, zone),
        }
    }

    /// Transforme une géométrie (tous les types `geo`)
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry> {
        geom.try_map_coords(|c: Coord| {
            let (x, y) = self.transform_point(c.x, c.y)?;
            Ok(Coord { x, y })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Point, Polygon};

    #[test]
    fn test_wgs84_to_utm_and_back() {
        let forward = ReprojectorLite::new(4326, 32717).unwrap();
        let back = ReprojectorLite::new(32717, 4326).unwrap();

        let (x, y) = forward.transform_point(-79.9095, -2.1409).unwrap();
        assert!(x > 600_000.0 && x < 640_000.0, "x={}", x);
        assert!(y > 9_700_000.0 && y < 9_800_000.0, "y={}", y);

        let (lon, lat) = back.transform_point(x, y).unwrap();
        assert!((lon - (-79.9095)).abs() < 1e-6, "lon={}", lon);
        assert!((lat - (-2.1409)).abs() < 1e-6, "lat={}", lat);
    }

    #[test]
    fn test_utm_to_web_mercator() {
        // Fort-de-France, Martinique
        let reproj = ReprojectorLite::new(32620, 3857).unwrap();
        let (x, y) = reproj.transform_point(708000.0, 1615000.0).unwrap();
        let (lon, lat) = web_mercator_to_geographic(x, y).unwrap().to_degrees();

        assert!((lon - (-61.07)).abs() < 0.2, "lon={}", lon);
        assert!((lat - 14.60).abs() < 0.2, "lat={}", lat);
    }

    #[test]
    fn test_transform_polygon_keeps_structure() {
        let reproj = ReprojectorLite::to_utm(UtmZone::new(17, true).unwrap());
        let poly = Geometry::Polygon(Polygon::new(
            LineString::from(vec![(-80.0, -2.0), (-79.99, -2.0), (-79.99, -1.99), (-80.0, -2.0)]),
            vec![],
        ));

        match reproj.transform_geometry(&poly).unwrap() {
            Geometry::Polygon(p) => {
                assert_eq!(p.exterior().0.len(), 4);
                assert!(p.exterior().0.iter().all(|c| c.x > 100_000.0));
            }
            other => panic!("expected polygon, got {:?}", other),
        }

        let point = Geometry::Point(Point::new(-80.0, -2.0));
        assert!(matches!(reproj.transform_geometry(&point).unwrap(), Geometry::Point(_)));
    }

    #[test]
    fn test_unsupported_epsg() {
        assert!(ReprojectorLite::new(2154, 4326).is_err());
        assert!(ReprojectorLite::new(4326, 32600).is_err());
        assert!(ReprojectorLite::is_supported(3857, 32760));
    }
}
