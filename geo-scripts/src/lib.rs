//! # geo-scripts
//!
//! Boîte à outils géospatiale autour des couches KML, KMZ, GeoJSON et
//! GeoParquet.
//!
//! ## Features
//!
//! - Classification de coordonnées (degrés décimaux / UTM / inconnu)
//! - Surfaces en hectares après projection UTM
//! - Filtre de polygones par seuil de longitude ou latitude
//! - Requête d'intersection et benchmark de chargement
//! - Échelle d'impression et plan de levé annoté (SVG)
//! - Reprojection légère en Rust pur, PROJ en option (feature `proj`)
//!
//! ## Usage CLI
//!
//! ```bash
//! # Surfaces des polygones d'un KMZ (UTM 17 Sud par défaut)
//! geo-scripts area lotes.kmz --output lotes_area.geojson
//!
//! # Benchmark d'intersection, référence en GeoParquet
//! geo-scripts benchmark zona.geojson predios.parquet --parquet
//! ```

pub mod area;
pub mod attributes;
pub mod classify;
pub mod config;
pub mod filter;
pub mod query;
pub mod report;
#[cfg(feature = "proj")]
pub mod reproject;
pub mod reproject_lite;
pub mod scale;
pub mod similarity;
pub mod survey;

pub use area::{area_hectares, calculate_polygon_area};
pub use classify::{classify, validate_coordinates, CoordKind};
pub use config::Settings;
pub use filter::{filter_layer, Axis, Comparison, ThresholdFilter};
pub use query::{benchmark, intersecting};
pub use report::{AreaReport, BenchmarkReport};
pub use scale::{PaperSize, ScaleCalculator, ScaleMode};
pub use similarity::string_similarity;
