//! Ajout d'un attribut constant à toutes les features d'un fichier

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

/// Lit `input`, affecte `key = value` à chaque feature et écrit `output`
///
/// Retourne le nombre de features écrites.
pub fn add_attribute(input: &Path, key: &str, value: &str, output: &Path) -> Result<usize> {
    if key.is_empty() {
        bail!("Attribute key must not be empty");
    }

    let mut layer = geoformats::read_file(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    layer.set_property(key, value);

    geoformats::write_file(&layer, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(key, value, features = layer.len(), output = %output.display(), "Attribute added");
    Ok(layer.len())
}
