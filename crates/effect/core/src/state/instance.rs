//! Effect instances and the identifiers that key them.

use core::fmt;

use crate::catalog::EffectId;

/// Combat entity that owns effect state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whatever granted an effect: a character, a weapon, an accessory, ...
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceId(pub u32);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "src:{}", self.0)
    }
}

/// Kind of thing behind a [`SourceId`]. Informational only; it does not take
/// part in the stacking identity.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SourceKind {
    Character,
    Weapon,
    Accessory,
    Passive,
    Skill,
}

/// Stacking identity of an instance.
///
/// The same definition from the same source stacks or refreshes; the same
/// definition from a different source is an independent instance.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceKey {
    pub definition: EffectId,
    pub source: SourceId,
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.definition, self.source)
    }
}

/// Remaining lifetime of an instance.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Lifetime {
    /// Lives until explicitly deactivated.
    Permanent,
    /// Seconds left before automatic removal. `f64` so that `f32` ticks
    /// accumulate without drift.
    Remaining(f64),
}

impl Lifetime {
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent)
    }

    /// Seconds left, or `None` for permanent instances.
    pub const fn remaining(&self) -> Option<f64> {
        match *self {
            Self::Permanent => None,
            Self::Remaining(seconds) => Some(seconds),
        }
    }

    /// A finite lifetime that reached zero.
    pub fn is_expired(&self) -> bool {
        matches!(*self, Self::Remaining(seconds) if seconds <= 0.0)
    }
}

/// One active effect on one entity.
///
/// Owned exclusively by an [`EntityEffectState`](super::EntityEffectState).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectInstance {
    pub definition_id: EffectId,
    pub source_id: SourceId,
    pub source_kind: SourceKind,
    /// Always at least 1 and never above the definition's stack cap.
    pub stack_count: u32,
    pub lifetime: Lifetime,
    /// Seconds until the instance may fire again.
    pub cooldown_remaining: f64,
    pub is_active: bool,
}

impl EffectInstance {
    /// Creates a single-stack, active instance with no cooldown.
    pub fn new(
        definition_id: EffectId,
        source_id: SourceId,
        source_kind: SourceKind,
        lifetime: Lifetime,
    ) -> Self {
        Self {
            definition_id,
            source_id,
            source_kind,
            stack_count: 1,
            lifetime,
            cooldown_remaining: 0.0,
            is_active: true,
        }
    }

    pub fn key(&self) -> InstanceKey {
        InstanceKey {
            definition: self.definition_id.clone(),
            source: self.source_id,
        }
    }

    #[inline]
    pub fn matches(&self, definition: &EffectId, source: SourceId) -> bool {
        self.source_id == source && &self.definition_id == definition
    }

    /// Active and not past its lifetime. Only live instances are triggered
    /// or aggregated.
    pub fn is_live(&self) -> bool {
        self.is_active && !self.lifetime.is_expired()
    }

    pub fn is_on_cooldown(&self) -> bool {
        self.cooldown_remaining > 0.0
    }
}
