//! Effect catalog loader.
//!
//! Catalog files hold a single `effects` list. RON and TOML carry the same
//! shape:
//!
//! ```ron
//! (
//!     effects: [
//!         (id: "crit_boost", category: Damage(Crit), magnitude: 0.05,
//!          stackable: true, max_stacks: Some(5)),
//!     ],
//! )
//! ```
//!
//! ```toml
//! [[effects]]
//! id = "crit_boost"
//! category = { Damage = "Crit" }
//! magnitude = 0.05
//! stackable = true
//! max_stacks = 5
//! ```

use std::path::Path;

use effect_core::{EffectCatalog, EffectDefinition};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Catalog structure for RON/TOML files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub effects: Vec<EffectDefinition>,
}

/// Loader for effect catalogs.
pub struct EffectCatalogLoader;

impl EffectCatalogLoader {
    /// Load a catalog file, picking the format from its extension
    /// (`.ron` or `.toml`).
    ///
    /// Every definition is validated; one malformed entry fails the load.
    pub fn load(path: &Path) -> LoadResult<EffectCatalog> {
        let content = read_file(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let catalog = match extension.as_deref() {
            Some("ron") => Self::from_ron_str(&content),
            Some("toml") => Self::from_toml_str(&content),
            _ => Err(anyhow::anyhow!(
                "Unsupported catalog format for {} (expected .ron or .toml)",
                path.display()
            )),
        }?;

        tracing::debug!(path = %path.display(), effects = catalog.len(), "effect catalog loaded");
        Ok(catalog)
    }

    pub fn from_ron_str(content: &str) -> LoadResult<EffectCatalog> {
        let file: CatalogFile = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse effect catalog RON: {}", e))?;
        Self::build(file)
    }

    pub fn from_toml_str(content: &str) -> LoadResult<EffectCatalog> {
        let file: CatalogFile = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse effect catalog TOML: {}", e))?;
        Self::build(file)
    }

    /// The catalog compiled into this crate from `data/effects.ron`.
    pub fn embedded() -> LoadResult<EffectCatalog> {
        let content = include_str!("../../data/effects.ron");
        Self::from_ron_str(content)
    }

    fn build(file: CatalogFile) -> LoadResult<EffectCatalog> {
        EffectCatalog::from_definitions(file.effects)
            .map_err(|e| anyhow::anyhow!("Invalid effect catalog: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use effect_core::{DamageKind, EffectCategory, EffectId, Trigger};

    use super::*;

    #[test]
    fn parses_ron_with_optional_fields_omitted() {
        let catalog = EffectCatalogLoader::from_ron_str(
            r#"(
                effects: [
                    (id: "crit_boost", category: Damage(Crit), magnitude: 0.05,
                     stackable: true, max_stacks: Some(5)),
                    (id: "thorns", category: Direct, magnitude: 0.1,
                     trigger: OnHit, cooldown_seconds: Some(2.0)),
                ],
            )"#,
        )
        .expect("valid catalog");

        let crit = catalog.get(&EffectId::new("crit_boost")).expect("present");
        assert_eq!(crit.category, EffectCategory::Damage(DamageKind::Crit));
        assert_eq!(crit.trigger, Trigger::Always);
        assert_eq!(crit.stack_cap(), 5);

        let thorns = catalog.get(&EffectId::new("thorns")).expect("present");
        assert_eq!(thorns.trigger, Trigger::OnHit);
        assert_eq!(thorns.duration_seconds, None);
    }

    #[test]
    fn parses_toml() {
        let catalog = EffectCatalogLoader::from_toml_str(
            r#"
            [[effects]]
            id = "pulse"
            category = "Utility"
            magnitude = 1.0
            trigger = { Timed = 2.0 }

            [[effects]]
            id = "haste"
            category = { Movement = "Accelerate" }
            magnitude = 0.15
            duration_seconds = 8.0
            "#,
        )
        .expect("valid catalog");

        assert_eq!(catalog.len(), 2);
        let pulse = catalog.get(&EffectId::new("pulse")).expect("present");
        assert_eq!(pulse.trigger, Trigger::Timed(2.0));
    }

    #[test]
    fn invalid_definition_fails_the_whole_load() {
        let error = EffectCatalogLoader::from_ron_str(
            r#"(effects: [
                (id: "ok", category: Direct, magnitude: 0.1),
                (id: "broken", category: Damage(Crit), magnitude: 0.1, max_stacks: Some(3)),
            ])"#,
        )
        .expect_err("cap without stacking");

        assert!(error.to_string().contains("broken"));
    }

    #[test]
    fn embedded_catalog_is_valid() {
        let catalog = EffectCatalogLoader::embedded().expect("embedded catalog");

        assert!(!catalog.is_empty());
        assert!(catalog.contains(&EffectId::new("crit_boost")));
    }
}
