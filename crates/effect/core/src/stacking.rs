//! Activation resolution.
//!
//! [`StackingResolver`] decides what an activation does to an entity's state:
//!
//! | Existing instance (same definition + source) | Definition   | Result                     |
//! |----------------------------------------------|--------------|----------------------------|
//! | none                                         | any          | `Created` with one stack   |
//! | present                                      | stackable    | `Stacked`, capped silently |
//! | present                                      | not stackable| `Refreshed`, one stack     |
//!
//! The requested duration always replaces the in-flight timer (last write
//! wins), including when stacking.

use tracing::{debug, warn};

use crate::catalog::{EffectCatalog, EffectDefinition, EffectId};
use crate::config::EngineConfig;
use crate::error::EffectError;
use crate::state::{EffectInstance, EntityEffectState, Lifetime, SourceId, SourceKind};

/// One `(definition, source, kind, duration)` activation.
#[derive(Clone, Debug, PartialEq)]
pub struct ActivationRequest {
    pub definition: EffectId,
    pub source: SourceId,
    pub source_kind: SourceKind,
    /// Overrides the definition's duration. `None` uses the definition's.
    pub duration: Option<Lifetime>,
}

impl ActivationRequest {
    pub fn new(definition: impl Into<EffectId>, source: SourceId, source_kind: SourceKind) -> Self {
        Self {
            definition: definition.into(),
            source,
            source_kind,
            duration: None,
        }
    }

    #[must_use]
    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.duration = Some(Lifetime::Remaining(f64::from(seconds)));
        self
    }

    #[must_use]
    pub fn permanent(mut self) -> Self {
        self.duration = Some(Lifetime::Permanent);
        self
    }
}

/// What an activation did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackOutcome {
    /// New instance with one stack.
    Created,
    /// Existing instance gained a stack. `clamped` is set when it was already
    /// at its cap and the count did not change.
    Stacked { stacks: u32, clamped: bool },
    /// Non-stackable instance had its duration reset.
    Refreshed,
    /// The entity already holds `limit` distinct instances. Nothing changed.
    Rejected { limit: usize },
}

impl StackOutcome {
    /// Returns true if the activation changed the entity's state.
    pub const fn is_applied(&self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }
}

/// Applies activations against a catalog.
#[derive(Clone, Copy, Debug)]
pub struct StackingResolver<'a> {
    catalog: &'a EffectCatalog,
    config: &'a EngineConfig,
}

impl<'a> StackingResolver<'a> {
    pub fn new(catalog: &'a EffectCatalog, config: &'a EngineConfig) -> Self {
        Self { catalog, config }
    }

    /// Creates, stacks onto or refreshes the instance keyed by the request's
    /// `(definition, source)`.
    ///
    /// Every branch that mutates the state invalidates its aggregate cache.
    ///
    /// # Errors
    ///
    /// [`EffectError::UnknownDefinition`] if the catalog has no such id. The
    /// state is left untouched.
    pub fn resolve(
        &self,
        state: &mut EntityEffectState,
        request: &ActivationRequest,
    ) -> Result<StackOutcome, EffectError> {
        let definition = self.catalog.get(&request.definition).ok_or_else(|| {
            EffectError::UnknownDefinition {
                definition: request.definition.clone(),
            }
        })?;
        let lifetime = self.requested_lifetime(definition, request.duration);

        let outcome = match state.get_mut(&request.definition, request.source) {
            None => {
                let limit = self.config.max_instances_per_entity;
                if state.len() >= limit {
                    return Ok(StackOutcome::Rejected { limit });
                }

                let mut instance = EffectInstance::new(
                    request.definition.clone(),
                    request.source,
                    request.source_kind,
                    lifetime,
                );
                // Timed effects first fire one interval after activation.
                if let Some(interval) = definition.trigger.interval() {
                    instance.cooldown_remaining = f64::from(interval);
                }
                state.insert(instance);
                StackOutcome::Created
            }
            Some(instance) if definition.stackable => {
                let cap = definition.stack_cap();
                let clamped = instance.stack_count >= cap;
                instance.stack_count = instance.stack_count.saturating_add(1).min(cap);
                instance.lifetime = lifetime;
                instance.is_active = true;
                let stacks = instance.stack_count;
                state.invalidate();
                StackOutcome::Stacked { stacks, clamped }
            }
            Some(instance) => {
                instance.stack_count = 1;
                instance.lifetime = lifetime;
                instance.is_active = true;
                state.invalidate();
                StackOutcome::Refreshed
            }
        };

        debug!(
            effect = %request.definition,
            source = %request.source,
            ?outcome,
            "activation resolved"
        );
        Ok(outcome)
    }

    /// Lifetime for this activation. Negative or NaN requests are clamped to
    /// the configured fallback.
    fn requested_lifetime(
        &self,
        definition: &EffectDefinition,
        requested: Option<Lifetime>,
    ) -> Lifetime {
        match requested {
            None => definition.default_lifetime(),
            Some(Lifetime::Permanent) => Lifetime::Permanent,
            Some(Lifetime::Remaining(seconds)) if seconds >= 0.0 => Lifetime::Remaining(seconds),
            Some(Lifetime::Remaining(seconds)) => {
                let fallback = f64::from(self.config.fallback_duration.max(0.0));
                warn!(
                    effect = %definition.id,
                    requested = seconds,
                    fallback,
                    "negative activation duration clamped"
                );
                Lifetime::Remaining(fallback)
            }
        }
    }
}
