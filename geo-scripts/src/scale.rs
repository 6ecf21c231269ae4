//! Échelle cartographique pour l'impression
//!
//! Par défaut l'échelle est fixe (1:900). Le mode heuristique ajuste
//! l'emprise des données au format papier puis arrondit à l'échelle
//! standard la plus proche.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Échelles standard, par ordre de préférence en cas d'égalité
pub const STANDARD_SCALES: [u32; 7] = [500, 750, 900, 1000, 1500, 2000, 2500];

/// Échelle fixe par défaut
pub const DEFAULT_FIXED_SCALE: u32 = 900;

/// Rapport largeur / hauteur de la figure (25 × 22 pouces)
pub const DEFAULT_ASPECT_RATIO: f64 = 25.0 / 22.0;

/// Formats papier ISO 216
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaperSize {
    A0,
    #[default]
    A1,
    A2,
    A3,
    A4,
}

impl PaperSize {
    /// Dimensions (largeur, hauteur) en mètres
    pub fn dimensions(self) -> (f64, f64) {
        match self {
            Self::A0 => (0.841, 1.189),
            Self::A1 => (0.594, 0.841),
            Self::A2 => (0.420, 0.594),
            Self::A3 => (0.297, 0.420),
            Self::A4 => (0.210, 0.297),
        }
    }

    /// Format depuis son nom, A1 si le nom est inconnu
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            warn!(paper = name, "Unknown paper size, falling back to A1");
            Self::A1
        })
    }
}

impl FromStr for PaperSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "A0" => Ok(Self::A0),
            "A1" => Ok(Self::A1),
            "A2" => Ok(Self::A2),
            "A3" => Ok(Self::A3),
            "A4" => Ok(Self::A4),
            other => bail!("Unknown paper size '{}': use A0..A4", other),
        }
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Mode de calcul de l'échelle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    /// Échelle imposée
    Fixed(u32),
    /// Ajustement au format papier puis arrondi
    Heuristic,
}

impl Default for ScaleMode {
    fn default() -> Self {
        Self::Fixed(DEFAULT_FIXED_SCALE)
    }
}

/// Calculateur d'échelle
#[derive(Debug, Clone, Copy)]
pub struct ScaleCalculator {
    pub mode: ScaleMode,
    pub paper: PaperSize,
    pub aspect_ratio: f64,
}

impl Default for ScaleCalculator {
    fn default() -> Self {
        Self {
            mode: ScaleMode::default(),
            paper: PaperSize::default(),
            aspect_ratio: DEFAULT_ASPECT_RATIO,
        }
    }
}

impl ScaleCalculator {
    pub fn heuristic(paper: PaperSize) -> Self {
        Self {
            mode: ScaleMode::Heuristic,
            paper,
            ..Default::default()
        }
    }

    /// Dénominateur d'échelle pour des coordonnées planes (mètres)
    pub fn calculate(&self, coords: &[(f64, f64)]) -> u32 {
        match self.mode {
            ScaleMode::Fixed(scale) => scale,
            ScaleMode::Heuristic => self.heuristic_scale(coords),
        }
    }

    fn heuristic_scale(&self, coords: &[(f64, f64)]) -> u32 {
        let (Some(x_range), Some(y_range)) = (
            range(coords.iter().map(|c| c.0)),
            range(coords.iter().map(|c| c.1)),
        ) else {
            return 1;
        };

        // Évite la division par zéro en aval
        if x_range == 0.0 || y_range == 0.0 {
            return 1;
        }

        let (_, paper_height) = self.paper.dimensions();
        let paper_width = paper_height * self.aspect_ratio;

        let raw = (x_range / paper_width).max(y_range / paper_height);
        nearest_standard_scale(raw)
    }
}

/// Échelle standard la plus proche, la première en cas d'égalité
pub fn nearest_standard_scale(raw: f64) -> u32 {
    let mut best = STANDARD_SCALES[0];
    for &candidate in &STANDARD_SCALES[1..] {
        if (candidate as f64 - raw).abs() < (best as f64 - raw).abs() {
            best = candidate;
        }
    }
    best
}

fn range(values: impl Iterator<Item = f64>) -> Option<f64> {
    values
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((min, max)) => Some((min.min(v), max.max(v))),
        })
        .map(|(min, max)| max - min)
}
