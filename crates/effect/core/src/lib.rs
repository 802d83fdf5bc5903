//! Runtime effect aggregation for an action-combat simulation.
//!
//! `effect-core` turns the passive and triggered effects granted by
//! characters, weapons, accessories and skills into per-entity aggregates
//! (speed multiplier, damage multiplier, crit bonus, shield, ...) that the
//! combat formulas read every frame. All mutation flows through
//! [`engine::EffectEngine`]; the building blocks are exposed for hosts that
//! drive a single entity state directly.
//!
//! The crate is pure and deterministic: no I/O, no randomness, no clocks.
//! Loading catalogs from data files lives in `effect-content`.
pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod lifetime;
pub mod stacking;
pub mod state;
pub mod trigger;
pub use aggregate::{
    Aggregate, AggregateCategory, AggregateSnapshot, AggregationCache, DamageAggregate,
    DefenseAggregate, MovementAggregate,
};
pub use catalog::{
    CatalogError, DamageKind, DefenseKind, EffectCatalog, EffectCategory, EffectDefinition,
    EffectId, Element, MovementKind, Rarity, Trigger, TriggerKind,
};
pub use config::EngineConfig;
pub use engine::{ActiveEffect, EffectEngine, TickReport};
pub use error::{EffectError, EngineError, ErrorSeverity};
pub use lifetime::LifetimeClock;
pub use stacking::{ActivationRequest, StackOutcome, StackingResolver};
pub use state::{
    EffectInstance, EntityEffectState, EntityId, InstanceKey, Lifetime, SourceId, SourceKind,
};
pub use trigger::{CategoryTotal, EffectOutput, TriggerEvaluator, TriggerEvent, merge_outputs};
