//! Projection Web Mercator (EPSG:3857)
//!
//! Aussi connu sous le nom de Pseudo-Mercator ou Spherical Mercator.
//! Utilisé par les fonds de carte tuilés (OpenStreetMap, CARTO, etc.).

use super::ellipsoid::WGS84;
use super::Geographic;
use anyhow::Result;

/// Latitude maximale représentable (degrés)
const MAX_LAT: f64 = 85.0;

/// Convertit coordonnées géographiques vers Web Mercator (EPSG:3857)
pub fn geographic_to_web_mercator(geo: Geographic) -> Result<(f64, f64)> {
    // Web Mercator utilise un modèle sphérique avec le rayon équatorial
    let r = WGS84::A;

    // Limiter la latitude pour éviter l'infini
    let lat = geo
        .lat
        .clamp(-MAX_LAT.to_radians(), MAX_LAT.to_radians());

    let x = r * geo.lon;
    let y = r * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln();

    Ok((x, y))
}

/// Convertit Web Mercator vers coordonnées géographiques
pub fn web_mercator_to_geographic(x: f64, y: f64) -> Result<Geographic> {
    let r = WGS84::A;

    let lon = x / r;
    let lat = 2.0 * (y / r).exp().atan() - std::f64::consts::FRAC_PI_2;

    Ok(Geographic::new(lon, lat))
}

/// Conversion directe (lat, lon) en degrés vers Web Mercator (x, y)
///
/// Sans bornage de latitude : ±90° donne ±∞.
pub fn latlon_to_web_mercator(lat: f64, lon: f64) -> (f64, f64) {
    let k = WGS84::A;
    let x = lon * (k * std::f64::consts::PI / 180.0);
    let y = ((90.0 + lat) * std::f64::consts::PI / 360.0).tan().ln() * k;
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guayaquil_to_web_mercator() {
        let (x, y) = latlon_to_web_mercator(-2.1409155511014633, -79.90951320936493);

        assert!((x - (-8895486.32)).abs() < 0.01, "x={}", x);
        assert!((y - (-238381.11)).abs() < 0.01, "y={}", y);
    }

    #[test]
    fn test_both_forms_agree() {
        let geo = Geographic::from_degrees(2.35, 48.85);
        let (x1, y1) = geographic_to_web_mercator(geo).unwrap();
        let (x2, y2) = latlon_to_web_mercator(48.85, 2.35);
        assert!((x1 - x2).abs() < 1e-6);
        assert!((y1 - y2).abs() < 1e-6);
    }

    #[test]
    fn test_roundtrip() {
        let geo = Geographic::from_degrees(2.35, 48.85);
        let (x, y) = geographic_to_web_mercator(geo).unwrap();
        let geo2 = web_mercator_to_geographic(x, y).unwrap();
        let (lon, lat) = geo2.to_degrees();

        assert!((lon - 2.35).abs() < 0.001, "lon={}", lon);
        assert!((lat - 48.85).abs() < 0.001, "lat={}", lat);
    }
}
