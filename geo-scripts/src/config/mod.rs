//! Configuration des commandes
//!
//! Ordre de priorité : valeurs par défaut, preset ou fichier JSON,
//! puis variables d'environnement (`.env` chargé au démarrage).

use serde::{Deserialize, Serialize};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

use crate::reproject_lite::UtmZone;
use crate::scale::{PaperSize, ScaleCalculator, ScaleMode, DEFAULT_ASPECT_RATIO};
use crate::survey::SurveyStyle;

/// Réglages partagés par les commandes
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Zone UTM pour les surfaces et les plans
    pub utm_zone: u8,

    /// Hémisphère sud
    pub utm_south: bool,

    /// Format papier pour le calcul d'échelle
    pub paper: PaperSize,

    /// Échelle fixe ou heuristique
    pub scale: ScaleMode,

    /// Rapport largeur / hauteur de la figure
    pub aspect_ratio: f64,

    /// Marge du plan en fraction de l'emprise
    pub margin_factor: f64,

    /// Nombre de graduations du quadrillage
    pub grid_lines: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            utm_zone: 17,
            utm_south: true,
            paper: PaperSize::A1,
            scale: ScaleMode::default(),
            aspect_ratio: DEFAULT_ASPECT_RATIO,
            margin_factor: 0.25,
            grid_lines: 6,
        }
    }
}

impl Settings {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "a1" => Self::load_embedded(include_str!("presets/a1.json")),
            "a3" => Self::load_embedded(include_str!("presets/a3.json")),
            _ => anyhow::bail!("Unknown preset: {}. Use: a1, a3", preset),
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse embedded config")
    }

    /// Preset (a1/a3), chemin d'un fichier JSON, ou valeurs par défaut
    pub fn resolve(selector: Option<&str>) -> Result<Self> {
        match selector {
            None => Ok(Self::default()),
            Some(name @ ("a1" | "a3")) => Self::from_preset(name),
            Some(path) => Self::load(Path::new(path)),
        }
    }

    /// Applique les variables `GEO_SCRIPTS_*` de l'environnement
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applique des surcharges fournies par `lookup` (clé → valeur)
    ///
    /// Une valeur illisible est ignorée avec un warning.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup("GEO_SCRIPTS_UTM_ZONE") {
            match value.parse() {
                Ok(zone) => self.utm_zone = zone,
                Err(_) => warn!(value = %value, "Ignoring invalid GEO_SCRIPTS_UTM_ZONE"),
            }
        }

        if let Some(value) = lookup("GEO_SCRIPTS_UTM_SOUTH") {
            match value.to_lowercase().as_str() {
                "1" | "true" | "yes" | "s" | "south" => self.utm_south = true,
                "0" | "false" | "no" | "n" | "north" => self.utm_south = false,
                _ => warn!(value = %value, "Ignoring invalid GEO_SCRIPTS_UTM_SOUTH"),
            }
        }

        if let Some(value) = lookup("GEO_SCRIPTS_SCALE") {
            if value.eq_ignore_ascii_case("heuristic") {
                self.scale = ScaleMode::Heuristic;
            } else {
                match value.parse() {
                    Ok(scale) => self.scale = ScaleMode::Fixed(scale),
                    Err(_) => warn!(value = %value, "Ignoring invalid GEO_SCRIPTS_SCALE"),
                }
            }
        }

        if let Some(value) = lookup("GEO_SCRIPTS_PAPER") {
            self.paper = PaperSize::from_name(&value);
        }

        self
    }

    /// Zone UTM configurée
    pub fn zone(&self) -> Result<UtmZone> {
        UtmZone::new(self.utm_zone, self.utm_south)
    }

    pub fn scale_calculator(&self) -> ScaleCalculator {
        ScaleCalculator {
            mode: self.scale,
            paper: self.paper,
            aspect_ratio: self.aspect_ratio,
        }
    }

    pub fn survey_style(&self) -> SurveyStyle {
        SurveyStyle {
            margin_factor: self.margin_factor,
            grid_lines: self.grid_lines,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.zone().unwrap().epsg(), 32717);
        assert_eq!(settings.scale, ScaleMode::Fixed(900));
        assert_eq!(settings.grid_lines, 6);
    }

    #[test]
    fn test_presets() {
        assert_eq!(Settings::from_preset("a1").unwrap(), Settings::default());

        let a3 = Settings::from_preset("a3").unwrap();
        assert_eq!(a3.paper, PaperSize::A3);
        assert_eq!(a3.scale, ScaleMode::Heuristic);
        assert!((a3.aspect_ratio - DEFAULT_ASPECT_RATIO).abs() < 1e-12);
        assert!(Settings::from_preset("b2").is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"utm_zone": 20, "utm_south": false}"#).unwrap();

        let settings = Settings::resolve(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(settings.zone().unwrap().to_string(), "20N");
        assert_eq!(settings.paper, PaperSize::A1);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("GEO_SCRIPTS_UTM_ZONE", "18"),
            ("GEO_SCRIPTS_UTM_SOUTH", "no"),
            ("GEO_SCRIPTS_SCALE", "heuristic"),
            ("GEO_SCRIPTS_PAPER", "a2"),
        ]
        .into_iter()
        .collect();

        let settings = Settings::default().with_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(settings.zone().unwrap().epsg(), 32618);
        assert_eq!(settings.scale, ScaleMode::Heuristic);
        assert_eq!(settings.paper, PaperSize::A2);

        let settings = Settings::default().with_overrides(|k| match k {
            "GEO_SCRIPTS_SCALE" => Some("1500".to_string()),
            "GEO_SCRIPTS_UTM_ZONE" => Some("abc".to_string()),
            _ => None,
        });
        assert_eq!(settings.scale, ScaleMode::Fixed(1500));
        assert_eq!(settings.utm_zone, 17);
    }
}
