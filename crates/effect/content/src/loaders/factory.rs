//! Content factory for building engine inputs from data files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use effect_core::{EffectCatalog, EffectEngine, EngineConfig};

use crate::loaders::{ConfigLoader, EffectCatalogLoader, LoadResult};

/// Content factory that loads all effect content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── engine.toml
/// └── effects.ron      (or effects.toml)
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load engine configuration from `engine.toml`.
    pub fn load_config(&self) -> LoadResult<EngineConfig> {
        let path = self.data_dir.join("engine.toml");
        ConfigLoader::load(&path)
    }

    /// Load the effect catalog from `effects.ron`, falling back to
    /// `effects.toml` when no RON file exists.
    pub fn load_catalog(&self) -> LoadResult<EffectCatalog> {
        let ron = self.data_dir.join("effects.ron");
        if ron.is_file() {
            return EffectCatalogLoader::load(&ron);
        }
        EffectCatalogLoader::load(&self.data_dir.join("effects.toml"))
    }

    /// Load catalog and configuration and build a ready engine.
    pub fn build_engine(&self) -> LoadResult<EffectEngine> {
        let catalog = self.load_catalog()?;
        let config = self.load_config()?;
        Ok(EffectEngine::with_config(Arc::new(catalog), config))
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
