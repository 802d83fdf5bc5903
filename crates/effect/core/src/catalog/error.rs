//! Catalog load errors.
//!
//! Every variant is fatal: a malformed catalog is rejected as a whole before
//! any entity interacts with the engine.

use super::{EffectCategory, EffectId};
use crate::error::{EngineError, ErrorSeverity};

/// Errors raised while validating effect definitions.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CatalogError {
    /// `max_stacks` is set on a definition that does not stack.
    #[error("effect '{id}' sets max_stacks but is not stackable")]
    StackCapWithoutStacking { id: EffectId },

    /// A stack cap of zero would make the effect impossible to activate.
    #[error("effect '{id}' sets max_stacks to 0")]
    ZeroMaxStacks { id: EffectId },

    #[error("effect '{id}' has a non-finite magnitude")]
    NonFiniteMagnitude { id: EffectId },

    /// Negative magnitude on a category that only accepts non-negative values.
    #[error("effect '{id}' has negative magnitude {magnitude} but {category} disallows it")]
    NegativeMagnitude {
        id: EffectId,
        category: EffectCategory,
        magnitude: f32,
    },

    #[error("effect '{id}' has a NaN duration")]
    InvalidDuration { id: EffectId },

    #[error("effect '{id}' has invalid cooldown {cooldown}")]
    InvalidCooldown { id: EffectId, cooldown: f32 },

    #[error("effect '{id}' has invalid timed interval {interval}")]
    InvalidTimedInterval { id: EffectId, interval: f32 },

    /// Low-health thresholds are HP percentages in `0..=100`.
    #[error("effect '{id}' has low-health threshold {threshold} outside 0..=100")]
    InvalidHealthThreshold { id: EffectId, threshold: f32 },

    #[error("effect '{id}' is defined more than once")]
    DuplicateDefinition { id: EffectId },
}

impl CatalogError {
    /// Identifier of the offending definition.
    pub fn id(&self) -> &EffectId {
        use CatalogError::*;
        match self {
            StackCapWithoutStacking { id }
            | ZeroMaxStacks { id }
            | NonFiniteMagnitude { id }
            | NegativeMagnitude { id, .. }
            | InvalidDuration { id }
            | InvalidCooldown { id, .. }
            | InvalidTimedInterval { id, .. }
            | InvalidHealthThreshold { id, .. }
            | DuplicateDefinition { id } => id,
        }
    }
}

impl EngineError for CatalogError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        use CatalogError::*;
        match self {
            StackCapWithoutStacking { .. } => "CATALOG_STACK_CAP_WITHOUT_STACKING",
            ZeroMaxStacks { .. } => "CATALOG_ZERO_MAX_STACKS",
            NonFiniteMagnitude { .. } => "CATALOG_NON_FINITE_MAGNITUDE",
            NegativeMagnitude { .. } => "CATALOG_NEGATIVE_MAGNITUDE",
            InvalidDuration { .. } => "CATALOG_INVALID_DURATION",
            InvalidCooldown { .. } => "CATALOG_INVALID_COOLDOWN",
            InvalidTimedInterval { .. } => "CATALOG_INVALID_TIMED_INTERVAL",
            InvalidHealthThreshold { .. } => "CATALOG_INVALID_HEALTH_THRESHOLD",
            DuplicateDefinition { .. } => "CATALOG_DUPLICATE_DEFINITION",
        }
    }
}
