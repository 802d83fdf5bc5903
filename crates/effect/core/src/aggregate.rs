//! Category-grouped aggregates with a compute-all-on-miss cache.
//!
//! The combat simulator reads one aggregate per category per frame. All three
//! are recomputed together in a single pass over the entity's live instances
//! whenever the cache is stale, then served from memory until the next
//! mutation.
//!
//! # What contributes
//!
//! - Live instances whose trigger is [`Trigger::Always`]
//! - Outputs fired during the current trigger pass (since the last tick)
//!
//! Every sum is additive across instances, stacks and sources; nothing
//! compounds multiplicatively.
//!
//! [`Trigger::Always`]: crate::catalog::Trigger::Always

use crate::catalog::{DamageKind, DefenseKind, EffectCatalog, EffectCategory, MovementKind};
use crate::config::EngineConfig;
use crate::state::EntityEffectState;

/// Aggregate group read by the simulator.
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
pub enum AggregateCategory {
    Movement,
    Damage,
    Defense,
}

impl AggregateCategory {
    /// Aggregate an effect category feeds, if any.
    pub const fn of(category: EffectCategory) -> Option<Self> {
        match category {
            EffectCategory::Movement(_) => Some(Self::Movement),
            EffectCategory::Damage(_) | EffectCategory::Direct => Some(Self::Damage),
            EffectCategory::Defense(_) => Some(Self::Defense),
            EffectCategory::Utility => None,
        }
    }
}

/// Inputs to the movement formula.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MovementAggregate {
    /// `1 + Σ accelerate`.
    pub speed_multiplier: f32,
    /// Any penetrate instance is active.
    pub penetrate: bool,
    /// Any float instance is active.
    pub float: bool,
    pub homing: f32,
    /// Summed bounce-count magnitudes, floored.
    pub extra_bounces: u32,
}

impl Default for MovementAggregate {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            penetrate: false,
            float: false,
            homing: 0.0,
            extra_bounces: 0,
        }
    }
}

/// Inputs to the damage formula.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageAggregate {
    /// `1 + Σ` direct, combo-, element- and skill-gated boosts.
    pub damage_multiplier: f32,
    pub crit_bonus: f32,
    /// `crit_bonus × crit_damage_ratio`.
    pub crit_damage_bonus: f32,
    pub pierce_percent: f32,
    pub life_steal_percent: f32,
}

impl Default for DamageAggregate {
    fn default() -> Self {
        Self {
            damage_multiplier: 1.0,
            crit_bonus: 0.0,
            crit_damage_bonus: 0.0,
            pierce_percent: 0.0,
            life_steal_percent: 0.0,
        }
    }
}

/// Inputs to the damage-taken formula.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DefenseAggregate {
    pub damage_reduction: f32,
    pub shield_percent: f32,
    pub regen_percent: f32,
    pub debuff_resist: f32,
}

/// One aggregate, as returned by [`AggregationCache::query`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Aggregate {
    Movement(MovementAggregate),
    Damage(DamageAggregate),
    Defense(DefenseAggregate),
}

impl Aggregate {
    pub const fn category(&self) -> AggregateCategory {
        match self {
            Self::Movement(_) => AggregateCategory::Movement,
            Self::Damage(_) => AggregateCategory::Damage,
            Self::Defense(_) => AggregateCategory::Defense,
        }
    }

    pub const fn as_movement(&self) -> Option<&MovementAggregate> {
        match self {
            Self::Movement(movement) => Some(movement),
            _ => None,
        }
    }

    pub const fn as_damage(&self) -> Option<&DamageAggregate> {
        match self {
            Self::Damage(damage) => Some(damage),
            _ => None,
        }
    }

    pub const fn as_defense(&self) -> Option<&DefenseAggregate> {
        match self {
            Self::Defense(defense) => Some(defense),
            _ => None,
        }
    }
}

/// All aggregates of one entity, computed together.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AggregateSnapshot {
    pub movement: MovementAggregate,
    pub damage: DamageAggregate,
    pub defense: DefenseAggregate,
}

impl AggregateSnapshot {
    pub const fn get(&self, category: AggregateCategory) -> Aggregate {
        match category {
            AggregateCategory::Movement => Aggregate::Movement(self.movement),
            AggregateCategory::Damage => Aggregate::Damage(self.damage),
            AggregateCategory::Defense => Aggregate::Defense(self.defense),
        }
    }
}

/// Running sums for one recomputation pass.
#[derive(Default)]
struct Accumulator {
    accelerate: f32,
    penetrate: bool,
    float: bool,
    homing: f32,
    bounces: f32,
    damage_boost: f32,
    crit: f32,
    pierce: f32,
    life_steal: f32,
    damage_reduction: f32,
    shield: f32,
    regen: f32,
    debuff_resist: f32,
}

impl Accumulator {
    fn add(&mut self, category: EffectCategory, value: f32) {
        match category {
            EffectCategory::Movement(kind) => match kind {
                MovementKind::Accelerate => self.accelerate += value,
                MovementKind::Penetrate => self.penetrate = true,
                MovementKind::Float => self.float = true,
                MovementKind::Homing => self.homing += value,
                MovementKind::BounceCount => self.bounces += value,
            },
            EffectCategory::Damage(kind) => match kind {
                DamageKind::Crit => self.crit += value,
                DamageKind::ComboGated | DamageKind::ElementGated | DamageKind::SkillGated => {
                    self.damage_boost += value
                }
                DamageKind::Pierce => self.pierce += value,
                DamageKind::LifeSteal => self.life_steal += value,
            },
            EffectCategory::Direct => self.damage_boost += value,
            EffectCategory::Defense(kind) => match kind {
                DefenseKind::DamageReduction => self.damage_reduction += value,
                DefenseKind::Shield => self.shield += value,
                DefenseKind::Regen => self.regen += value,
                DefenseKind::DebuffResist => self.debuff_resist += value,
            },
            EffectCategory::Utility => {}
        }
    }

    fn finish(self, config: &EngineConfig) -> AggregateSnapshot {
        AggregateSnapshot {
            movement: MovementAggregate {
                speed_multiplier: 1.0 + self.accelerate,
                penetrate: self.penetrate,
                float: self.float,
                homing: self.homing,
                extra_bounces: self.bounces.max(0.0).floor() as u32,
            },
            damage: DamageAggregate {
                damage_multiplier: 1.0 + self.damage_boost,
                crit_bonus: self.crit,
                crit_damage_bonus: self.crit * config.crit_damage_ratio,
                pierce_percent: self.pierce,
                life_steal_percent: self.life_steal,
            },
            defense: DefenseAggregate {
                damage_reduction: self.damage_reduction,
                shield_percent: self.shield,
                regen_percent: self.regen,
                debuff_resist: self.debuff_resist,
            },
        }
    }
}

/// Serves aggregates from an entity's cache, recomputing on a miss.
#[derive(Clone, Copy, Debug)]
pub struct AggregationCache<'a> {
    catalog: &'a EffectCatalog,
    config: &'a EngineConfig,
}

impl<'a> AggregationCache<'a> {
    pub fn new(catalog: &'a EffectCatalog, config: &'a EngineConfig) -> Self {
        Self { catalog, config }
    }

    /// Returns the aggregate for `category`.
    pub fn query(&self, state: &mut EntityEffectState, category: AggregateCategory) -> Aggregate {
        self.snapshot(state).get(category)
    }

    pub fn movement(&self, state: &mut EntityEffectState) -> MovementAggregate {
        self.snapshot(state).movement
    }

    pub fn damage(&self, state: &mut EntityEffectState) -> DamageAggregate {
        self.snapshot(state).damage
    }

    pub fn defense(&self, state: &mut EntityEffectState) -> DefenseAggregate {
        self.snapshot(state).defense
    }

    /// Returns every aggregate, recomputing all of them if the cache is stale.
    pub fn snapshot(&self, state: &mut EntityEffectState) -> AggregateSnapshot {
        if let Some(cached) = state.cached() {
            return *cached;
        }
        let snapshot = self.compute(state);
        *state.store_cache(snapshot)
    }

    /// Single pass over live always-on instances plus the current pass.
    fn compute(&self, state: &EntityEffectState) -> AggregateSnapshot {
        let mut acc = Accumulator::default();

        for instance in state.live_instances() {
            let Some(definition) = self.catalog.get(&instance.definition_id) else {
                continue;
            };
            if definition.trigger.is_always() {
                acc.add(
                    definition.category,
                    definition.magnitude * instance.stack_count as f32,
                );
            }
        }

        for output in state.pass() {
            acc.add(output.category, output.total_value);
        }

        acc.finish(self.config)
    }
}
