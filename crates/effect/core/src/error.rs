//! Error infrastructure for effect-core.
//!
//! Load-time errors live next to the catalog ([`CatalogError`](crate::CatalogError)).
//! Steady-state operations report recoverable failures through [`EffectError`];
//! nothing in the tick / trigger / query path panics.
//!
//! # Design Principles
//!
//! - **Fatal only at load**: a malformed catalog is the only fatal condition
//! - **Results, not panics**: stale save data referencing removed content is
//!   expected and reported as a value
//! - **Severity Classification**: errors are categorized for recovery strategies

use crate::catalog::EffectId;
use crate::state::{EntityId, SourceId};

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// The call was a no-op; the host may continue without changes.
    ///
    /// Examples: activating an effect that is no longer in the catalog
    Recoverable,

    /// The request referred to something that does not exist.
    ///
    /// Examples: deactivating an effect that is not active
    Validation,

    /// Unexpected state inconsistency that indicates a bug.
    Internal,

    /// Cannot continue. Only raised while loading the catalog.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable | Self::Validation)
    }

    /// Returns true if this error indicates an internal bug or a broken setup.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all effect-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait EngineError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Default implementation uses the error type name.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Recoverable failures of engine operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectError {
    /// The definition id is not in the catalog (e.g. stale save data).
    #[error("unknown effect definition '{definition}'")]
    UnknownDefinition { definition: EffectId },

    /// The entity never had an effect activated, or was removed.
    #[error("entity {entity} has no effect state")]
    UnknownEntity { entity: EntityId },

    /// No instance with this (definition, source) key is active.
    #[error("effect '{definition}' from source {source_id} is not active on entity {entity}")]
    NotActive {
        entity: EntityId,
        definition: EffectId,
        source_id: SourceId,
    },
}

impl EngineError for EffectError {
    fn severity(&self) -> ErrorSeverity {
        use EffectError::*;
        match self {
            UnknownDefinition { .. } => ErrorSeverity::Recoverable,
            UnknownEntity { .. } | NotActive { .. } => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        use EffectError::*;
        match self {
            UnknownDefinition { .. } => "EFFECT_UNKNOWN_DEFINITION",
            UnknownEntity { .. } => "EFFECT_UNKNOWN_ENTITY",
            NotActive { .. } => "EFFECT_NOT_ACTIVE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steady_state_errors_are_recoverable() {
        let errors = [
            EffectError::UnknownDefinition {
                definition: EffectId::new("removed_in_patch"),
            },
            EffectError::UnknownEntity {
                entity: EntityId(7),
            },
            EffectError::NotActive {
                entity: EntityId(7),
                definition: EffectId::new("shield"),
                source_id: SourceId(3),
            },
        ];

        for error in &errors {
            assert!(error.severity().is_recoverable(), "{error}");
            assert!(!error.severity().is_internal());
        }
    }

    #[test]
    fn messages_name_the_effect() {
        let error = EffectError::UnknownDefinition {
            definition: EffectId::new("removed_in_patch"),
        };
        assert_eq!(
            error.to_string(),
            "unknown effect definition 'removed_in_patch'"
        );
        assert_eq!(error.error_code(), "EFFECT_UNKNOWN_DEFINITION");
    }
}
