//! Projection UTM (Universal Transverse Mercator) sur WGS84
//!
//! Séries de Snyder (USGS PP 1395), précises au millimètre dans la zone.
//! Zones 1 à 60, hémisphères nord (EPSG:326zz) et sud (EPSG:327zz).

use std::fmt;

use anyhow::{bail, Result};

use super::ellipsoid::WGS84;
use super::Geographic;

/// Facteur d'échelle sur le méridien central
const K0: f64 = 0.9996;
/// False easting
const FALSE_EASTING: f64 = 500000.0;
/// False northing de l'hémisphère sud
const FALSE_NORTHING_SOUTH: f64 = 10000000.0;

/// Zone UTM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtmZone {
    /// Numéro de zone (1..=60)
    pub zone: u8,
    /// Hémisphère sud
    pub south: bool,
}

impl UtmZone {
    pub fn new(zone: u8, south: bool) -> Result<Self> {
        if !(1..=60).contains(&zone) {
            bail!("Invalid UTM zone {}: expected 1..=60", zone);
        }
        Ok(Self { zone, south })
    }

    /// Zone depuis un code EPSG WGS84/UTM (326zz nord, 327zz sud)
    pub fn from_epsg(epsg: u32) -> Option<Self> {
        let (south, zone) = match epsg {
            32601..=32660 => (false, epsg - 32600),
            32701..=32760 => (true, epsg - 32700),
            _ => return None,
        };
        Some(Self {
            zone: zone as u8,
            south,
        })
    }

    /// Code EPSG de la zone
    pub fn epsg(self) -> u32 {
        let base = if self.south { 32700 } else { 32600 };
        base + self.zone as u32
    }

    /// Zone contenant un point (degrés), sans les exceptions norvégiennes
    pub fn for_lon_lat(lon: f64, lat: f64) -> Self {
        let zone = (((lon + 180.0) / 6.0).floor() as i64).rem_euclid(60) + 1;
        Self {
            zone: zone as u8,
            south: lat < 0.0,
        }
    }

    /// Longitude du méridien central (degrés)
    pub fn central_meridian(self) -> f64 {
        (self.zone as f64 - 1.0) * 6.0 - 180.0 + 3.0
    }
}

impl fmt::Display for UtmZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.zone, if self.south { 'S' } else { 'N' })
    }
}

/// Convertit des coordonnées géographiques WGS84 vers UTM
pub fn geographic_to_utm(geo: Geographic, zone: UtmZone) -> Result<(f64, f64)> {
    let a = WGS84::A;
    let e2 = WGS84::E2;
    let ep2 = WGS84::EP2;

    if !geo.lat.is_finite() || !geo.lon.is_finite() {
        bail!("Non-finite coordinate cannot be projected to UTM");
    }

    let phi = geo.lat;
    let lon0 = zone.central_meridian().to_radians();

    let sin_phi = phi.sin();
    let cos_phi = phi.cos();
    let tan_phi = phi.tan();

    let n = a / (1.0 - e2 * sin_phi.powi(2)).sqrt();
    let t = tan_phi.powi(2);
    let c = ep2 * cos_phi.powi(2);
    let aa = (geo.lon - lon0) * cos_phi;

    // Arc de méridien
    let m = a
        * ((1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e2.powi(2) / 32.0 + 45.0 * e2.powi(3) / 1024.0)
                * (2.0 * phi).sin()
            + (15.0 * e2.powi(2) / 256.0 + 45.0 * e2.powi(3) / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e2.powi(3) / 3072.0) * (6.0 * phi).sin());

    let x = K0
        * n
        * (aa
            + (1.0 - t + c) * aa.powi(3) / 6.0
            + (5.0 - 18.0 * t + t.powi(2) + 72.0 * c - 58.0 * ep2) * aa.powi(5) / 120.0)
        + FALSE_EASTING;

    let y = K0
        * (m + n
            * tan_phi
            * (aa.powi(2) / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c.powi(2)) * aa.powi(4) / 24.0
                + (61.0 - 58.0 * t + t.powi(2) + 600.0 * c - 330.0 * ep2) * aa.powi(6) / 720.0));

    let y = if zone.south {
        y + FALSE_NORTHING_SOUTH
    } else {
        y
    };

    Ok((x, y))
}

/// Convertit UTM vers coordonnées géographiques WGS84
pub fn utm_to_geographic(x: f64, y: f64, zone: UtmZone) -> Result<Geographic> {
    let a = WGS84::A;
    let e2 = WGS84::E2;
    let ep2 = WGS84::EP2;

    let y0 = if zone.south { FALSE_NORTHING_SOUTH } else { 0.0 };
    let lon0 = zone.central_meridian().to_radians();

    // Coordonnées réduites
    let x = x - FALSE_EASTING;
    let y = y - y0;

    // Latitude du pied de la verticale
    let m = y / K0;
    let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));

    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();

    let n1 = a / (1.0 - e2 * sin_phi1.powi(2)).sqrt();
    let t1 = tan_phi1.powi(2);
    let c1 = ep2 * cos_phi1.powi(2);
    let r1 = a * (1.0 - e2) / (1.0 - e2 * sin_phi1.powi(2)).powf(1.5);
    let d = x / (n1 * K0);

    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d.powi(2) / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2) - 252.0 * ep2 - 3.0 * c1.powi(2))
                    * d.powi(6)
                    / 720.0);

    let lon = lon0
        + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * ep2 + 24.0 * t1.powi(2))
                * d.powi(5)
                / 120.0)
            / cos_phi1;

    Ok(Geographic::new(lon, lat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_from_epsg() {
        assert_eq!(
            UtmZone::from_epsg(32717),
            Some(UtmZone {
                zone: 17,
                south: true
            })
        );
        assert_eq!(UtmZone::from_epsg(32620).map(|z| z.epsg()), Some(32620));
        assert_eq!(UtmZone::from_epsg(4326), None);
        assert_eq!(UtmZone::from_epsg(32600), None);
        assert!(UtmZone::new(0, false).is_err());
        assert!(UtmZone::new(61, true).is_err());
    }

    #[test]
    fn test_zone_for_lon_lat() {
        // Guayaquil
        let zone = UtmZone::for_lon_lat(-79.9, -2.14);
        assert_eq!(zone.to_string(), "17S");
        assert_eq!(zone.central_meridian(), -81.0);

        assert_eq!(UtmZone::for_lon_lat(180.0, 10.0).zone, 1);
        assert_eq!(UtmZone::for_lon_lat(-180.0, 10.0).zone, 1);
        assert_eq!(UtmZone::for_lon_lat(179.9, 10.0).zone, 60);
    }

    #[test]
    fn test_central_meridian_origin() {
        // Équateur sur le méridien central : (500000, 0) au nord, (500000, 10000000) au sud
        let zone = UtmZone::new(17, false).unwrap();
        let (x, y) = geographic_to_utm(Geographic::from_degrees(-81.0, 0.0), zone).unwrap();
        assert!((x - 500000.0).abs() < 1e-6, "x={}", x);
        assert!(y.abs() < 1e-6, "y={}", y);

        let zone = UtmZone::new(17, true).unwrap();
        let (_, y) = geographic_to_utm(Geographic::from_degrees(-81.0, 0.0), zone).unwrap();
        assert!((y - 10000000.0).abs() < 1e-6, "y={}", y);
    }

    #[test]
    fn test_round_trip() {
        let zone = UtmZone::new(17, true).unwrap();
        for &(lon, lat) in &[(-79.9095, -2.1409), (-81.5, -0.2), (-78.3, -4.9)] {
            let (x, y) = geographic_to_utm(Geographic::from_degrees(lon, lat), zone).unwrap();
            let (lon2, lat2) = utm_to_geographic(x, y, zone).unwrap().to_degrees();
            assert!((lon - lon2).abs() < 1e-6, "lon={} lon2={}", lon, lon2);
            assert!((lat - lat2).abs() < 1e-6, "lat={} lat2={}", lat, lat2);
        }
    }

    #[test]
    fn test_martinique() {
        // Fort-de-France, UTM Zone 20N: 708000, 1615000
        let zone = UtmZone::new(20, false).unwrap();
        let (lon, lat) = utm_to_geographic(708000.0, 1615000.0, zone)
            .unwrap()
            .to_degrees();

        assert!((lon - (-61.07)).abs() < 0.2, "lon={}", lon);
        assert!((lat - 14.60).abs() < 0.2, "lat={}", lat);
    }

    #[test]
    fn test_guayaquil_forward() {
        // Guayaquil ≈ 621 300 E, 9 763 300 N (17S)
        let zone = UtmZone::new(17, true).unwrap();
        let (x, y) =
            geographic_to_utm(Geographic::from_degrees(-79.9095, -2.1409), zone).unwrap();
        assert!((x - 621_300.0).abs() < 500.0, "x={}", x);
        assert!((y - 9_763_300.0).abs() < 500.0, "y={}", y);
    }
}
