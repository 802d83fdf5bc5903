//! Trigger evaluation.
//!
//! [`TriggerEvaluator::fire`] scans an entity's live instances for ones whose
//! trigger matches an event and emits an [`EffectOutput`] per instance.
//!
//! # Side effects
//!
//! Firing is not a pure read. Each instance that fires has its cooldown reset
//! to the definition's cooldown, and every output is recorded into the
//! entity's current trigger pass (which feeds the aggregates until the next
//! tick). Calling `fire` twice inside one cooldown window yields no output
//! for that instance the second time.

use tracing::{trace, warn};

use crate::catalog::{EffectCatalog, EffectCategory, EffectId, Trigger, TriggerKind};
use crate::state::{EntityEffectState, SourceId};

/// Gameplay event with its optional numeric payload (combo count, HP %, ...).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerEvent {
    pub kind: TriggerKind,
    pub value: Option<f32>,
}

impl TriggerEvent {
    pub const fn new(kind: TriggerKind) -> Self {
        Self { kind, value: None }
    }

    pub const fn with_value(kind: TriggerKind, value: f32) -> Self {
        Self {
            kind,
            value: Some(value),
        }
    }

    pub fn combo(count: u32) -> Self {
        Self::with_value(TriggerKind::Combo, count as f32)
    }

    /// HP percentage in `0..=100`.
    pub const fn low_health(percent: f32) -> Self {
        Self::with_value(TriggerKind::LowHealth, percent)
    }
}

impl From<TriggerKind> for TriggerEvent {
    fn from(kind: TriggerKind) -> Self {
        Self::new(kind)
    }
}

/// Value emitted by one instance when its trigger fires.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectOutput {
    pub definition_id: EffectId,
    pub category: EffectCategory,
    /// `magnitude × stack_count`.
    pub total_value: f32,
    pub stack_count: u32,
    pub sources: Vec<SourceId>,
}

impl EffectOutput {
    /// True if the instance keyed by `(definition, source)` produced this.
    pub fn fired_by(&self, definition: &EffectId, source: SourceId) -> bool {
        &self.definition_id == definition && self.sources.contains(&source)
    }
}

/// Outputs summed per category.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryTotal {
    pub category: EffectCategory,
    pub total_value: f32,
    pub stack_count: u32,
    /// Contributing sources, deduplicated, in first-seen order.
    pub sources: Vec<SourceId>,
}

/// Sums outputs by category, keeping the order categories first appear in.
pub fn merge_outputs(outputs: &[EffectOutput]) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::new();

    for output in outputs {
        let total = match totals.iter_mut().find(|t| t.category == output.category) {
            Some(total) => total,
            None => {
                totals.push(CategoryTotal {
                    category: output.category,
                    total_value: 0.0,
                    stack_count: 0,
                    sources: Vec::new(),
                });
                let last = totals.len() - 1;
                &mut totals[last]
            }
        };

        total.total_value += output.total_value;
        total.stack_count += output.stack_count;
        for source in &output.sources {
            if !total.sources.contains(source) {
                total.sources.push(*source);
            }
        }
    }

    totals
}

/// Fires matching instances against a catalog.
#[derive(Clone, Copy, Debug)]
pub struct TriggerEvaluator<'a> {
    catalog: &'a EffectCatalog,
}

impl<'a> TriggerEvaluator<'a> {
    pub fn new(catalog: &'a EffectCatalog) -> Self {
        Self { catalog }
    }

    /// Fires every live instance whose trigger matches `event`.
    ///
    /// Instances on cooldown and threshold triggers whose threshold the
    /// payload does not meet are skipped. Outputs come back in instance
    /// insertion order.
    pub fn fire(&self, state: &mut EntityEffectState, event: TriggerEvent) -> Vec<EffectOutput> {
        self.fire_where(state, event.value, |trigger| {
            trigger.kind() == Some(event.kind)
        })
    }

    /// Fires every `Timed` instance whose interval has elapsed.
    pub fn fire_timed(&self, state: &mut EntityEffectState) -> Vec<EffectOutput> {
        self.fire_where(state, None, |trigger| trigger.interval().is_some())
    }

    fn fire_where(
        &self,
        state: &mut EntityEffectState,
        value: Option<f32>,
        matches: impl Fn(&Trigger) -> bool,
    ) -> Vec<EffectOutput> {
        let mut outputs = Vec::new();

        for instance in state.instances_mut() {
            if !instance.is_live() || instance.is_on_cooldown() {
                continue;
            }
            let Some(definition) = self.catalog.get(&instance.definition_id) else {
                warn!(effect = %instance.definition_id, "instance has no catalog definition");
                continue;
            };
            if !matches(&definition.trigger) || !definition.trigger.accepts(value) {
                continue;
            }

            let output = EffectOutput {
                definition_id: instance.definition_id.clone(),
                category: definition.category,
                total_value: definition.magnitude * instance.stack_count as f32,
                stack_count: instance.stack_count,
                sources: vec![instance.source_id],
            };
            instance.cooldown_remaining = f64::from(definition.cooldown_after_fire());

            trace!(
                effect = %output.definition_id,
                value = output.total_value,
                cooldown = instance.cooldown_remaining,
                "effect fired"
            );
            outputs.push(output);
        }

        state.record_pass(&outputs);
        outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DamageKind, EffectDefinition};
    use crate::config::EngineConfig;
    use crate::stacking::{ActivationRequest, StackingResolver};
    use crate::state::SourceKind;

    fn catalog() -> EffectCatalog {
        EffectCatalog::from_definitions([
            EffectDefinition::new("on_hit_boost", EffectCategory::Direct, 0.1)
                .with_trigger(Trigger::OnHit)
                .with_cooldown(2.0)
                .stackable(Some(5)),
            EffectDefinition::new(
                "combo_boost",
                EffectCategory::Damage(DamageKind::ComboGated),
                0.2,
            )
            .with_trigger(Trigger::OnComboThreshold(10)),
            EffectDefinition::new("crit_boost", EffectCategory::Damage(DamageKind::Crit), 0.05),
        ])
        .expect("valid catalog")
    }

    fn activate(catalog: &EffectCatalog, state: &mut EntityEffectState, id: &str, source: u32) {
        let config = EngineConfig::default();
        StackingResolver::new(catalog, &config)
            .resolve(
                state,
                &ActivationRequest::new(id, SourceId(source), SourceKind::Passive),
            )
            .expect("known effect");
    }

    #[test]
    fn fires_magnitude_times_stacks() {
        let catalog = catalog();
        let mut state = EntityEffectState::new();
        activate(&catalog, &mut state, "on_hit_boost", 1);
        activate(&catalog, &mut state, "on_hit_boost", 1);

        let outputs = TriggerEvaluator::new(&catalog).fire(&mut state, TriggerKind::Hit.into());

        assert_eq!(outputs.len(), 1);
        assert!((outputs[0].total_value - 0.2).abs() < 1e-6);
        assert_eq!(outputs[0].stack_count, 2);
        assert_eq!(outputs[0].sources, vec![SourceId(1)]);
    }

    #[test]
    fn second_fire_inside_cooldown_is_silent() {
        let catalog = catalog();
        let mut state = EntityEffectState::new();
        activate(&catalog, &mut state, "on_hit_boost", 1);
        let evaluator = TriggerEvaluator::new(&catalog);

        let first = evaluator.fire(&mut state, TriggerKind::Hit.into());
        let second = evaluator.fire(&mut state, TriggerKind::Hit.into());

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(state.instances()[0].cooldown_remaining, 2.0);
    }

    #[test]
    fn combo_threshold_is_a_minimum() {
        let catalog = catalog();
        let mut state = EntityEffectState::new();
        activate(&catalog, &mut state, "combo_boost", 1);
        let evaluator = TriggerEvaluator::new(&catalog);

        assert!(evaluator.fire(&mut state, TriggerEvent::combo(9)).is_empty());
        assert_eq!(evaluator.fire(&mut state, TriggerEvent::combo(10)).len(), 1);
        assert_eq!(evaluator.fire(&mut state, TriggerEvent::combo(40)).len(), 1);
    }

    #[test]
    fn always_on_instances_never_fire() {
        let catalog = catalog();
        let mut state = EntityEffectState::new();
        activate(&catalog, &mut state, "crit_boost", 1);
        let evaluator = TriggerEvaluator::new(&catalog);

        for kind in [TriggerKind::Hit, TriggerKind::Critical, TriggerKind::Timed] {
            assert!(evaluator.fire(&mut state, kind.into()).is_empty());
        }
        assert!(state.pass().is_empty());
    }

    #[test]
    fn outputs_follow_insertion_order_and_are_recorded() {
        let catalog = catalog();
        let mut state = EntityEffectState::new();
        activate(&catalog, &mut state, "on_hit_boost", 2);
        activate(&catalog, &mut state, "on_hit_boost", 1);

        let outputs = TriggerEvaluator::new(&catalog).fire(&mut state, TriggerKind::Hit.into());

        let sources: Vec<_> = outputs.iter().map(|o| o.sources[0]).collect();
        assert_eq!(sources, [SourceId(2), SourceId(1)]);
        assert_eq!(state.pass(), outputs.as_slice());
        assert!(!state.is_cache_valid());
    }

    #[test]
    fn merge_sums_by_category() {
        let output = |value: f32, source: u32| EffectOutput {
            definition_id: EffectId::new("on_hit_boost"),
            category: EffectCategory::Direct,
            total_value: value,
            stack_count: 1,
            sources: vec![SourceId(source)],
        };
        let combo = EffectOutput {
            definition_id: EffectId::new("combo_boost"),
            category: EffectCategory::Damage(DamageKind::ComboGated),
            total_value: 0.2,
            stack_count: 1,
            sources: vec![SourceId(1)],
        };

        let totals = merge_outputs(&[output(0.1, 1), combo, output(0.3, 2), output(0.1, 1)]);

        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].category, EffectCategory::Direct);
        assert!((totals[0].total_value - 0.5).abs() < 1e-6);
        assert_eq!(totals[0].stack_count, 3);
        assert_eq!(totals[0].sources, vec![SourceId(1), SourceId(2)]);
    }
}
