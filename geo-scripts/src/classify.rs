//! Classification de coordonnées : degrés décimaux, UTM ou inconnu
//!
//! Les bornes sont inclusives, la première règle satisfaite l'emporte.

use std::fmt;

use serde::Serialize;

/// Easting UTM admissible (mètres)
const EASTING_RANGE: std::ops::RangeInclusive<f64> = 0.0..=834_000.0;
/// Northing UTM admissible (mètres)
const NORTHING_RANGE: std::ops::RangeInclusive<f64> = 100_000.0..=10_000_000.0;

/// Nature d'un couple de coordonnées
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CoordKind {
    /// Degrés décimaux
    #[serde(rename = "DD")]
    Dd,
    /// Mètres UTM
    #[serde(rename = "UTM")]
    Utm,
    Unknown,
}

impl fmt::Display for CoordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dd => "DD",
            Self::Utm => "UTM",
            Self::Unknown => "Unknown",
        })
    }
}

/// Classe un couple (lat, lon)
///
/// Pour l'UTM, l'ordre des composantes est libre : `(northing, easting)`
/// comme `(easting, northing)`.
pub fn classify(lat: f64, lon: f64) -> CoordKind {
    if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
        CoordKind::Dd
    } else if (NORTHING_RANGE.contains(&lat) && EASTING_RANGE.contains(&lon))
        || (EASTING_RANGE.contains(&lat) && NORTHING_RANGE.contains(&lon))
    {
        CoordKind::Utm
    } else {
        CoordKind::Unknown
    }
}

/// Classe une liste de couples en conservant l'ordre et les valeurs
pub fn validate_coordinates(coords: &[(f64, f64)]) -> Vec<(f64, f64, CoordKind)> {
    coords
        .iter()
        .map(|&(lat, lon)| (lat, lon, classify(lat, lon)))
        .collect()
}
