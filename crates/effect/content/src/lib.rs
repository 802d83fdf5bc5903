//! Data-driven effect content and loaders.
//!
//! This crate turns RON/TOML data files into the immutable inputs of
//! `effect-core`:
//! - Effect catalogs (RON or TOML, validated on load)
//! - Engine configuration (TOML)
//!
//! A default catalog ships embedded in the binary for tools and tests that
//! have no data directory at hand.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{CatalogFile, ConfigLoader, ContentFactory, EffectCatalogLoader, LoadResult};
