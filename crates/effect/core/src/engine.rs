//! Effect engine facade.
//!
//! [`EffectEngine`] is the single entry point the combat simulator talks to.
//! It owns the per-entity states of one combat session and composes the
//! stacking resolver, trigger evaluator, lifetime clock and aggregation cache
//! over a shared, immutable catalog.
//!
//! # Call order
//!
//! Within one simulation step the host calls [`tick`](EffectEngine::tick)
//! first, then any number of [`trigger`](EffectEngine::trigger) calls, then
//! reads aggregates with [`query`](EffectEngine::query). Activations and
//! deactivations may happen at any point. Every call is synchronous.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use effect_core::{
//!     ActivationRequest, DamageKind, EffectCatalog, EffectCategory, EffectDefinition,
//!     EffectEngine, EntityId, SourceId, SourceKind,
//! };
//!
//! let catalog = EffectCatalog::from_definitions([EffectDefinition::new(
//!     "crit_boost",
//!     EffectCategory::Damage(DamageKind::Crit),
//!     0.05,
//! )
//! .stackable(Some(5))])
//! .unwrap();
//!
//! let mut engine = EffectEngine::new(Arc::new(catalog));
//! let hero = EntityId(1);
//! for weapon in 1..=3 {
//!     engine
//!         .activate(hero, ActivationRequest::new("crit_boost", SourceId(weapon), SourceKind::Weapon))
//!         .unwrap();
//! }
//!
//! let damage = engine.damage(hero);
//! assert!((damage.crit_bonus - 0.15).abs() < 1e-6);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::aggregate::{
    Aggregate, AggregateCategory, AggregateSnapshot, AggregationCache, DamageAggregate,
    DefenseAggregate, MovementAggregate,
};
use crate::catalog::{EffectCatalog, EffectCategory, EffectId};
use crate::config::EngineConfig;
use crate::error::EffectError;
use crate::lifetime::LifetimeClock;
use crate::stacking::{ActivationRequest, StackOutcome, StackingResolver};
use crate::state::{
    EffectInstance, EntityEffectState, EntityId, InstanceKey, SourceId, SourceKind,
};
use crate::trigger::{EffectOutput, TriggerEvaluator, TriggerEvent};

/// Everything one [`EffectEngine::tick`] changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Instances removed because their duration ran out.
    pub expired: Vec<(EntityId, InstanceKey)>,
    /// Outputs of `Timed` effects that fired during this tick.
    pub timed_outputs: Vec<(EntityId, EffectOutput)>,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.expired.is_empty() && self.timed_outputs.is_empty()
    }
}

/// Read-only view of a live instance, for presentation layers.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveEffect {
    pub definition_id: EffectId,
    pub source_id: SourceId,
    pub source_kind: SourceKind,
    pub category: EffectCategory,
    pub stack_count: u32,
    /// `None` for permanent effects.
    pub remaining_seconds: Option<f64>,
    pub cooldown_remaining: f64,
}

/// Effect state of every entity in one combat session.
#[derive(Clone, Debug)]
pub struct EffectEngine {
    catalog: Arc<EffectCatalog>,
    config: EngineConfig,
    entities: BTreeMap<EntityId, EntityEffectState>,
}

impl EffectEngine {
    /// Creates an engine with the default configuration.
    pub fn new(catalog: Arc<EffectCatalog>) -> Self {
        Self::with_config(catalog, EngineConfig::default())
    }

    pub fn with_config(catalog: Arc<EffectCatalog>, config: EngineConfig) -> Self {
        Self {
            catalog,
            config,
            entities: BTreeMap::new(),
        }
    }

    pub fn catalog(&self) -> &EffectCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========================================================================
    // Activation
    // ========================================================================

    /// Activates an effect on `entity`, creating its state on first use.
    ///
    /// # Errors
    ///
    /// [`EffectError::UnknownDefinition`] if the id is not in the catalog.
    /// Nothing is created in that case.
    pub fn activate(
        &mut self,
        entity: EntityId,
        request: ActivationRequest,
    ) -> Result<StackOutcome, EffectError> {
        if !self.catalog.contains(&request.definition) {
            warn!(
                %entity,
                effect = %request.definition,
                "activation of unknown effect ignored"
            );
            return Err(EffectError::UnknownDefinition {
                definition: request.definition,
            });
        }

        let resolver = StackingResolver::new(&self.catalog, &self.config);
        let known = self.entities.contains_key(&entity);
        let state = self.entities.entry(entity).or_default();
        let outcome = resolver.resolve(state, &request)?;

        if let StackOutcome::Rejected { limit } = outcome {
            if !known {
                self.entities.remove(&entity);
            }
            warn!(
                %entity,
                effect = %request.definition,
                limit,
                "activation rejected: instance limit reached"
            );
        }
        Ok(outcome)
    }

    /// Removes the instance keyed by `(definition, source)`.
    ///
    /// # Errors
    ///
    /// - [`EffectError::UnknownDefinition`] if the id is not in the catalog
    /// - [`EffectError::UnknownEntity`] if the entity has no effect state
    /// - [`EffectError::NotActive`] if no such instance exists
    pub fn deactivate(
        &mut self,
        entity: EntityId,
        definition: &EffectId,
        source: SourceId,
    ) -> Result<EffectInstance, EffectError> {
        if !self.catalog.contains(definition) {
            warn!(%entity, effect = %definition, "deactivation of unknown effect ignored");
            return Err(EffectError::UnknownDefinition {
                definition: definition.clone(),
            });
        }

        let state = self
            .entities
            .get_mut(&entity)
            .ok_or(EffectError::UnknownEntity { entity })?;
        let removed = state
            .remove(definition, source)
            .ok_or_else(|| EffectError::NotActive {
                entity,
                definition: definition.clone(),
                source_id: source,
            })?;

        debug!(%entity, effect = %removed.key(), "effect deactivated");
        Ok(removed)
    }

    /// Removes every instance `source` granted to `entity` (e.g. on unequip).
    ///
    /// Returns how many instances were removed.
    pub fn deactivate_source(&mut self, entity: EntityId, source: SourceId) -> usize {
        let Some(state) = self.entities.get_mut(&entity) else {
            return 0;
        };
        let removed = state.remove_source(source).len();
        if removed > 0 {
            debug!(%entity, %source, removed, "source effects deactivated");
        }
        removed
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    /// Advances every entity's timers by `dt` seconds.
    ///
    /// Per entity, in id order: the previous trigger pass is closed, cooldowns
    /// and durations decay, expired instances are removed, and `Timed`
    /// effects whose interval elapsed fire into the new pass.
    ///
    /// `dt = 0` is a no-op. Negative or non-finite `dt` is ignored.
    pub fn tick(&mut self, dt: f32) -> TickReport {
        let mut report = TickReport::default();

        if !dt.is_finite() || dt < 0.0 {
            warn!(dt, "tick with invalid dt ignored");
            return report;
        }
        if dt == 0.0 {
            return report;
        }

        let evaluator = TriggerEvaluator::new(&self.catalog);
        for (&entity, state) in self.entities.iter_mut() {
            state.clear_pass();

            for key in LifetimeClock::advance(state, dt) {
                report.expired.push((entity, key));
            }
            for output in evaluator.fire_timed(state) {
                report.timed_outputs.push((entity, output));
            }
        }

        report
    }

    /// Fires `event` on `entity` and returns the outputs, in instance
    /// insertion order.
    ///
    /// Resets the cooldown of every instance that fired; see
    /// [`TriggerEvaluator::fire`]. An entity without effect state yields no
    /// outputs.
    pub fn trigger(&mut self, entity: EntityId, event: impl Into<TriggerEvent>) -> Vec<EffectOutput> {
        let event = event.into();
        let Some(state) = self.entities.get_mut(&entity) else {
            return Vec::new();
        };

        let outputs = TriggerEvaluator::new(&self.catalog).fire(state, event);
        if !outputs.is_empty() {
            debug!(%entity, kind = %event.kind, fired = outputs.len(), "trigger fired");
        }
        outputs
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Aggregate for `category`. Entities without state get neutral values.
    pub fn query(&mut self, entity: EntityId, category: AggregateCategory) -> Aggregate {
        self.snapshot(entity).get(category)
    }

    /// All aggregates of `entity`, served from cache when valid.
    pub fn snapshot(&mut self, entity: EntityId) -> AggregateSnapshot {
        let cache = AggregationCache::new(&self.catalog, &self.config);
        match self.entities.get_mut(&entity) {
            Some(state) => cache.snapshot(state),
            None => AggregateSnapshot::default(),
        }
    }

    pub fn movement(&mut self, entity: EntityId) -> MovementAggregate {
        self.snapshot(entity).movement
    }

    pub fn damage(&mut self, entity: EntityId) -> DamageAggregate {
        self.snapshot(entity).damage
    }

    pub fn defense(&mut self, entity: EntityId) -> DefenseAggregate {
        self.snapshot(entity).defense
    }

    /// Live effects of `entity` in insertion order.
    pub fn active_effects(&self, entity: EntityId) -> Vec<ActiveEffect> {
        let Some(state) = self.entities.get(&entity) else {
            return Vec::new();
        };

        state
            .live_instances()
            .filter_map(|instance| {
                let definition = self.catalog.get(&instance.definition_id)?;
                Some(ActiveEffect {
                    definition_id: instance.definition_id.clone(),
                    source_id: instance.source_id,
                    source_kind: instance.source_kind,
                    category: definition.category,
                    stack_count: instance.stack_count,
                    remaining_seconds: instance.lifetime.remaining(),
                    cooldown_remaining: instance.cooldown_remaining,
                })
            })
            .collect()
    }

    pub fn state(&self, entity: EntityId) -> Option<&EntityEffectState> {
        self.entities.get(&entity)
    }

    /// Entities with effect state, in id order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    // ========================================================================
    // Entity lifecycle
    // ========================================================================

    /// Clears every effect of `entity`. Returns false if it had no state.
    pub fn reset(&mut self, entity: EntityId) -> bool {
        match self.entities.get_mut(&entity) {
            Some(state) => {
                state.clear();
                debug!(%entity, "effect state reset");
                true
            }
            None => false,
        }
    }

    /// Drops `entity` from the session entirely.
    pub fn remove_entity(&mut self, entity: EntityId) -> Option<EntityEffectState> {
        self.entities.remove(&entity)
    }

    /// SHA-256 over every entity's digest, in entity id order.
    ///
    /// Two sessions that replayed the same activation / tick / trigger
    /// sequence against the same catalog have equal roots.
    #[cfg(feature = "serde")]
    pub fn state_root(&self) -> [u8; 32] {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        for (entity, state) in &self.entities {
            hasher.update(entity.0.to_le_bytes());
            hasher.update(state.digest());
        }
        hasher.finalize().into()
    }
}
