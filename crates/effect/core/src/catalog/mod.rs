//! Immutable registry of effect definitions.
//!
//! The catalog is built once from configuration data and shared read-only
//! with every engine that needs it. Construction validates every definition
//! and rejects the whole set on the first malformed entry.

mod definition;
mod error;

pub use definition::{
    DamageKind, DefenseKind, EffectCategory, EffectDefinition, EffectId, Element, MovementKind,
    Rarity, Trigger, TriggerKind,
};
pub use error::CatalogError;

use std::collections::BTreeMap;

/// Validated set of effect definitions keyed by [`EffectId`].
///
/// Iteration order is the id order, which keeps anything derived from the
/// catalog deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectCatalog {
    definitions: BTreeMap<EffectId, EffectDefinition>,
}

impl EffectCatalog {
    /// Creates a catalog with no definitions.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a catalog, validating every definition.
    ///
    /// # Errors
    ///
    /// Returns the first [`CatalogError`] found. Nothing is partially loaded.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = EffectDefinition>,
    ) -> Result<Self, CatalogError> {
        let mut map = BTreeMap::new();

        for definition in definitions {
            definition.validate()?;
            if map.contains_key(&definition.id) {
                return Err(CatalogError::DuplicateDefinition { id: definition.id });
            }
            map.insert(definition.id.clone(), definition);
        }

        tracing::debug!(definitions = map.len(), "effect catalog loaded");
        Ok(Self { definitions: map })
    }

    pub fn get(&self, id: &EffectId) -> Option<&EffectDefinition> {
        self.definitions.get(id)
    }

    pub fn contains(&self, id: &EffectId) -> bool {
        self.definitions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Iterates definitions in id order.
    pub fn iter(&self) -> impl Iterator<Item = &EffectDefinition> {
        self.definitions.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EffectId> {
        self.definitions.keys()
    }
}
