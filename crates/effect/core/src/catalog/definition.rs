//! Effect definitions.
//!
//! A definition is the immutable, data-driven description of a modifier:
//! what it touches ([`EffectCategory`]), when it fires ([`Trigger`]), how much
//! it contributes per stack, and how long it lives. Definitions are loaded
//! once into an [`EffectCatalog`](super::EffectCatalog) and never mutated.

use core::fmt;

use super::error::CatalogError;
use crate::state::Lifetime;

/// Stable identifier of an effect definition (e.g. `crit_boost`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct EffectId(String);

impl EffectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EffectId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EffectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ============================================================================
// Categories
// ============================================================================

/// Movement modifiers consumed by the motion simulation.
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
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum MovementKind {
    /// Passes through targets instead of stopping.
    Penetrate,
    /// Ignores gravity.
    Float,
    /// Additive speed bonus.
    Accelerate,
    /// Steering strength towards the nearest target.
    Homing,
    /// Extra wall bounces.
    BounceCount,
}

/// Damage modifiers consumed by the damage formula.
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
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DamageKind {
    /// Critical hit rate bonus. Crit damage is derived from it.
    Crit,
    /// Damage boost gated on a combo count.
    ComboGated,
    /// Damage boost gated on an element match.
    ElementGated,
    /// Damage boost gated on a skill cast.
    SkillGated,
    /// Armor pierce percentage.
    Pierce,
    /// Share of dealt damage returned as health.
    LifeSteal,
}

/// Defensive modifiers consumed by the damage-taken formula.
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
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DefenseKind {
    DamageReduction,
    Shield,
    Regen,
    DebuffResist,
}

/// What an effect modifies.
///
/// The category decides which aggregate an instance feeds and whether a
/// negative magnitude is meaningful for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectCategory {
    Movement(MovementKind),
    Damage(DamageKind),
    Defense(DefenseKind),
    /// Flat boost folded straight into the damage multiplier.
    Direct,
    /// Carries no numeric aggregate. Surfaced through outputs and
    /// `active_effects` only.
    Utility,
}

impl EffectCategory {
    /// Returns true if a negative magnitude is a valid configuration.
    ///
    /// Slows and damage penalties are expressed as negative magnitudes; every
    /// other category is a count or a percentage and must stay non-negative.
    pub const fn allows_negative(&self) -> bool {
        matches!(
            self,
            Self::Movement(MovementKind::Accelerate) | Self::Direct | Self::Utility
        )
    }
}

impl fmt::Display for EffectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movement(kind) => write!(f, "movement/{kind}"),
            Self::Damage(kind) => write!(f, "damage/{kind}"),
            Self::Defense(kind) => write!(f, "defense/{kind}"),
            Self::Direct => f.write_str("direct"),
            Self::Utility => f.write_str("utility"),
        }
    }
}

// ============================================================================
// Triggers
// ============================================================================

/// Gameplay condition under which an effect contributes.
///
/// Each variant carries exactly the parameters it needs, so a threshold can
/// never be attached to a trigger that has no use for one.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Trigger {
    /// Contributes to aggregates for as long as the instance is alive.
    #[default]
    Always,
    OnHit,
    OnBounce,
    /// Fires when the combo count is at least `n`.
    OnComboThreshold(u32),
    OnPowerFlip,
    OnSkillCast,
    OnFeverActive,
    /// Fires when the HP percentage (0..=100) is at or below the threshold.
    OnLowHealth(f32),
    OnFullHealth,
    OnCritical,
    OnKill,
    /// Fires on its own every `interval` seconds while the instance lives.
    Timed(f32),
}

impl Trigger {
    /// Event kind that fires this trigger.
    ///
    /// `Always` has no event: it feeds aggregates passively and can never be
    /// fired, which keeps it from being counted twice.
    pub const fn kind(&self) -> Option<TriggerKind> {
        Some(match self {
            Self::Always => return None,
            Self::OnHit => TriggerKind::Hit,
            Self::OnBounce => TriggerKind::Bounce,
            Self::OnComboThreshold(_) => TriggerKind::Combo,
            Self::OnPowerFlip => TriggerKind::PowerFlip,
            Self::OnSkillCast => TriggerKind::SkillCast,
            Self::OnFeverActive => TriggerKind::FeverActive,
            Self::OnLowHealth(_) => TriggerKind::LowHealth,
            Self::OnFullHealth => TriggerKind::FullHealth,
            Self::OnCritical => TriggerKind::Critical,
            Self::OnKill => TriggerKind::Kill,
            Self::Timed(_) => TriggerKind::Timed,
        })
    }

    /// Checks the event payload against the trigger's threshold, if any.
    ///
    /// Combo thresholds are minimums. Low-health thresholds are maximums
    /// (HP at or below). A threshold trigger without a payload never passes.
    pub fn accepts(&self, value: Option<f32>) -> bool {
        match *self {
            Self::OnComboThreshold(n) => value.is_some_and(|v| v >= n as f32),
            Self::OnLowHealth(threshold) => value.is_some_and(|v| v <= threshold),
            _ => true,
        }
    }

    /// Firing interval for `Timed` triggers.
    pub const fn interval(&self) -> Option<f32> {
        match *self {
            Self::Timed(interval) => Some(interval),
            _ => None,
        }
    }

    pub const fn is_always(&self) -> bool {
        matches!(self, Self::Always)
    }
}

/// Discrete gameplay event reported by the combat simulator.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TriggerKind {
    Hit,
    Bounce,
    Combo,
    PowerFlip,
    SkillCast,
    FeverActive,
    LowHealth,
    FullHealth,
    Critical,
    Kill,
    Timed,
}

// ============================================================================
// Eligibility
// ============================================================================

/// Elemental affinity of a character or weapon.
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
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Element {
    Fire,
    Water,
    Wind,
    Earth,
    Light,
    Dark,
}

/// Rarity tier. Ordered from lowest to highest.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

// ============================================================================
// Definition
// ============================================================================

/// Immutable description of one effect.
///
/// Optional fields default to "absent" when deserialized, so data files only
/// spell out what differs from a permanent, non-stacking, always-on effect.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectDefinition {
    pub id: EffectId,
    pub category: EffectCategory,
    #[cfg_attr(feature = "serde", serde(default))]
    pub trigger: Trigger,
    /// Value contributed per stack.
    pub magnitude: f32,
    /// Lifetime in seconds. Absent or negative means permanent.
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration_seconds: Option<f32>,
    /// Re-trigger gate, in seconds.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cooldown_seconds: Option<f32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub stackable: bool,
    /// Stack cap. Absent means unbounded while stackable.
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_stacks: Option<u32>,
    /// Checked by the caller before activation, never by the engine.
    #[cfg_attr(feature = "serde", serde(default))]
    pub required_element: Option<Element>,
    /// Minimum rarity. Checked by the caller before activation.
    #[cfg_attr(feature = "serde", serde(default))]
    pub required_rarity: Option<Rarity>,
}

impl EffectDefinition {
    /// Creates a permanent, non-stacking, always-on definition.
    pub fn new(id: impl Into<EffectId>, category: EffectCategory, magnitude: f32) -> Self {
        Self {
            id: id.into(),
            category,
            trigger: Trigger::Always,
            magnitude,
            duration_seconds: None,
            cooldown_seconds: None,
            stackable: false,
            max_stacks: None,
            required_element: None,
            required_rarity: None,
        }
    }

    #[must_use]
    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = trigger;
        self
    }

    #[must_use]
    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    #[must_use]
    pub fn with_cooldown(mut self, seconds: f32) -> Self {
        self.cooldown_seconds = Some(seconds);
        self
    }

    /// Marks the definition stackable, optionally capped.
    #[must_use]
    pub fn stackable(mut self, max_stacks: Option<u32>) -> Self {
        self.stackable = true;
        self.max_stacks = max_stacks;
        self
    }

    #[must_use]
    pub fn requires_element(mut self, element: Element) -> Self {
        self.required_element = Some(element);
        self
    }

    #[must_use]
    pub fn requires_rarity(mut self, rarity: Rarity) -> Self {
        self.required_rarity = Some(rarity);
        self
    }

    /// Lifetime a fresh activation gets when the caller does not override it.
    pub fn default_lifetime(&self) -> Lifetime {
        match self.duration_seconds {
            Some(seconds) if seconds >= 0.0 => Lifetime::Remaining(f64::from(seconds)),
            _ => Lifetime::Permanent,
        }
    }

    /// Highest stack count an instance of this definition may reach.
    ///
    /// Non-stackable definitions are capped at one.
    pub fn stack_cap(&self) -> u32 {
        if !self.stackable {
            return 1;
        }
        self.max_stacks.unwrap_or(u32::MAX)
    }

    /// Cooldown applied after the effect fires.
    ///
    /// Timed triggers wait at least their interval between firings.
    pub fn cooldown_after_fire(&self) -> f32 {
        let cooldown = self.cooldown_seconds.unwrap_or(0.0);
        match self.trigger.interval() {
            Some(interval) => cooldown.max(interval),
            None => cooldown,
        }
    }

    /// Caller-side eligibility filter (element must match, rarity is a minimum).
    pub fn is_eligible(&self, element: Option<Element>, rarity: Option<Rarity>) -> bool {
        let element_ok = self
            .required_element
            .is_none_or(|required| element == Some(required));
        let rarity_ok = self
            .required_rarity
            .is_none_or(|required| rarity.is_some_and(|r| r >= required));
        element_ok && rarity_ok
    }

    /// Checks the definition for malformed configuration.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let id = || self.id.clone();

        if self.max_stacks.is_some() && !self.stackable {
            return Err(CatalogError::StackCapWithoutStacking { id: id() });
        }
        if self.max_stacks == Some(0) {
            return Err(CatalogError::ZeroMaxStacks { id: id() });
        }
        if !self.magnitude.is_finite() {
            return Err(CatalogError::NonFiniteMagnitude { id: id() });
        }
        if self.magnitude < 0.0 && !self.category.allows_negative() {
            return Err(CatalogError::NegativeMagnitude {
                id: id(),
                category: self.category,
                magnitude: self.magnitude,
            });
        }
        if self.duration_seconds.is_some_and(f32::is_nan) {
            return Err(CatalogError::InvalidDuration { id: id() });
        }
        if let Some(cooldown) = self
            .cooldown_seconds
            .filter(|c| !(c.is_finite() && *c >= 0.0))
        {
            return Err(CatalogError::InvalidCooldown {
                id: id(),
                cooldown,
            });
        }
        match self.trigger {
            Trigger::Timed(interval) if !(interval.is_finite() && interval > 0.0) => {
                Err(CatalogError::InvalidTimedInterval {
                    id: id(),
                    interval,
                })
            }
            Trigger::OnLowHealth(threshold) if !(0.0..=100.0).contains(&threshold) => {
                Err(CatalogError::InvalidHealthThreshold {
                    id: id(),
                    threshold,
                })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_duration_is_permanent() {
        let def = EffectDefinition::new(
            "haste",
            EffectCategory::Movement(MovementKind::Accelerate),
            0.2,
        )
        .with_duration(-1.0);
        assert_eq!(def.default_lifetime(), Lifetime::Permanent);

        let def = def.with_duration(4.0);
        assert_eq!(def.default_lifetime(), Lifetime::Remaining(4.0));
    }

    #[test]
    fn stack_cap_for_non_stackable_is_one() {
        let def =
            EffectDefinition::new("shield", EffectCategory::Defense(DefenseKind::Shield), 0.3);
        assert_eq!(def.stack_cap(), 1);
        assert_eq!(def.clone().stackable(None).stack_cap(), u32::MAX);
        assert_eq!(def.stackable(Some(5)).stack_cap(), 5);
    }

    #[test]
    fn combo_threshold_is_a_minimum() {
        let trigger = Trigger::OnComboThreshold(10);
        assert!(!trigger.accepts(Some(9.0)));
        assert!(trigger.accepts(Some(10.0)));
        assert!(trigger.accepts(Some(25.0)));
        assert!(!trigger.accepts(None));
    }

    #[test]
    fn low_health_threshold_is_a_maximum() {
        let trigger = Trigger::OnLowHealth(30.0);
        assert!(trigger.accepts(Some(30.0)));
        assert!(trigger.accepts(Some(12.5)));
        assert!(!trigger.accepts(Some(31.0)));
    }

    #[test]
    fn always_has_no_event_kind() {
        assert_eq!(Trigger::Always.kind(), None);
        assert_eq!(Trigger::OnComboThreshold(3).kind(), Some(TriggerKind::Combo));
        assert_eq!(Trigger::Timed(2.0).kind(), Some(TriggerKind::Timed));
    }

    #[test]
    fn timed_cooldown_is_at_least_the_interval() {
        let def = EffectDefinition::new("pulse", EffectCategory::Direct, 0.1)
            .with_trigger(Trigger::Timed(2.0));
        assert_eq!(def.cooldown_after_fire(), 2.0);
        assert_eq!(def.with_cooldown(5.0).cooldown_after_fire(), 5.0);
    }

    #[test]
    fn eligibility_filters() {
        let def = EffectDefinition::new(
            "ember",
            EffectCategory::Damage(DamageKind::ElementGated),
            0.2,
        )
        .requires_element(Element::Fire)
        .requires_rarity(Rarity::Rare);

        assert!(def.is_eligible(Some(Element::Fire), Some(Rarity::Epic)));
        assert!(!def.is_eligible(Some(Element::Water), Some(Rarity::Epic)));
        assert!(!def.is_eligible(Some(Element::Fire), Some(Rarity::Common)));
        assert!(!def.is_eligible(None, Some(Rarity::Legendary)));
    }

    #[test]
    fn validate_rejects_cap_without_stacking() {
        let mut def =
            EffectDefinition::new("crit_boost", EffectCategory::Damage(DamageKind::Crit), 0.05);
        def.max_stacks = Some(5);
        assert!(matches!(
            def.validate(),
            Err(CatalogError::StackCapWithoutStacking { .. })
        ));
    }

    #[test]
    fn validate_magnitude_sign_by_category() {
        let slow = EffectDefinition::new(
            "slow",
            EffectCategory::Movement(MovementKind::Accelerate),
            -0.3,
        );
        assert!(slow.validate().is_ok());

        let bad =
            EffectDefinition::new("bad_crit", EffectCategory::Damage(DamageKind::Crit), -0.1);
        assert!(matches!(
            bad.validate(),
            Err(CatalogError::NegativeMagnitude { .. })
        ));
    }

    #[test]
    fn category_names() {
        assert_eq!(
            EffectCategory::Damage(DamageKind::LifeSteal).to_string(),
            "damage/life_steal"
        );
        assert_eq!("combo_gated".parse::<DamageKind>(), Ok(DamageKind::ComboGated));
    }
}
