//! Rapports de commandes : benchmark de requête spatiale et surfaces
//!
//! Affichage console et sauvegarde JSON.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

/// Nature du jeu de référence chargé par le benchmark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReferenceSource {
    /// KML, KMZ ou GeoJSON
    Vector,
    /// GeoParquet
    Parquet,
}

impl ReferenceSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Vector => "KML/GeoJSON",
            Self::Parquet => "Parquet",
        }
    }
}

/// Résultat du benchmark d'intersection
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    /// Fichier des polygones cibles
    pub target: String,
    /// Fichier du jeu de référence
    pub reference: String,
    pub source: ReferenceSource,
    pub target_features: usize,
    pub reference_features: usize,
    /// Durée de chargement de la référence
    pub load_secs: f64,
    /// Durée de la requête d'intersection
    pub query_secs: f64,
    /// Nombre de features de référence qui intersectent la cible
    pub intersecting: usize,
}

impl BenchmarkReport {
    pub fn new(target: &Path, reference: &Path, source: ReferenceSource) -> Self {
        Self {
            target: target.display().to_string(),
            reference: reference.display().to_string(),
            source,
            target_features: 0,
            reference_features: 0,
            load_secs: 0.0,
            query_secs: 0.0,
            intersecting: 0,
        }
    }

    pub fn set_load_time(&mut self, duration: Duration) {
        self.load_secs = duration.as_secs_f64();
    }

    pub fn set_query_time(&mut self, duration: Duration) {
        self.query_secs = duration.as_secs_f64();
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        let label = self.source.label();
        println!("Load Time ({}): {:.4} seconds", label, self.load_secs);
        println!("Query Time ({}): {:.4} seconds", label, self.query_secs);
        println!("Intersecting Polygons: {}", self.intersecting);
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{}: {}/{} intersecting, load {:.4}s, query {:.4}s",
            self.source.label(),
            self.intersecting,
            self.reference_features,
            self.load_secs,
            self.query_secs
        )
    }
}

/// Surface d'une feature
#[derive(Debug, Clone, Serialize)]
pub struct AreaEntry {
    pub id: String,
    pub name: Option<String>,
    pub area_ha: f64,
}

/// Surfaces calculées pour un fichier
#[derive(Debug, Clone, Serialize)]
pub struct AreaReport {
    pub path: String,
    /// Zone UTM utilisée, ex. `17S`
    pub zone: String,
    pub entries: Vec<AreaEntry>,
}

impl AreaReport {
    pub fn total_ha(&self) -> f64 {
        self.entries.iter().map(|e| e.area_ha).sum()
    }

    /// Affiche le tableau des surfaces
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("AREAS - {} (UTM {})", self.path, self.zone);
        println!("{}", "=".repeat(60));

        for entry in self.entries.iter().take(50) {
            println!(
                "  {:<20} {:<24} {:>12.4} ha",
                entry.id,
                entry.name.as_deref().unwrap_or("-"),
                entry.area_ha
            );
        }
        if self.entries.len() > 50 {
            println!("  ... and {} more", self.entries.len() - 50);
        }

        println!("\nTotal: {:.4} ha ({} features)", self.total_ha(), self.entries.len());
        println!("{}", "=".repeat(60));
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
