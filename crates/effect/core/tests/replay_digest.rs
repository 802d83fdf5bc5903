//! Replaying the same input sequence must reproduce the same state root.

use std::sync::Arc;

use effect_core::{
    ActivationRequest, DamageKind, EffectCatalog, EffectCategory, EffectDefinition, EffectEngine,
    EngineConfig, EntityId, SourceId, SourceKind, Trigger, TriggerKind,
};

fn catalog() -> Arc<EffectCatalog> {
    Arc::new(
        EffectCatalog::from_definitions([
            EffectDefinition::new("crit_boost", EffectCategory::Damage(DamageKind::Crit), 0.05)
                .stackable(Some(5)),
            EffectDefinition::new("burst", EffectCategory::Direct, 0.3)
                .with_trigger(Trigger::OnSkillCast)
                .with_cooldown(4.0),
            EffectDefinition::new("pulse", EffectCategory::Utility, 1.0)
                .with_trigger(Trigger::Timed(1.5))
                .with_duration(6.0),
        ])
        .expect("valid catalog"),
    )
}

fn replay(catalog: Arc<EffectCatalog>) -> EffectEngine {
    let mut engine = EffectEngine::new(catalog);
    for (entity, source) in [(1, 10), (1, 11), (2, 20)] {
        let entity = EntityId(entity);
        let weapon = SourceId(source);
        engine
            .activate(entity, ActivationRequest::new("crit_boost", weapon, SourceKind::Weapon))
            .expect("known effect");
        engine
            .activate(entity, ActivationRequest::new("burst", weapon, SourceKind::Skill))
            .expect("known effect");
        engine
            .activate(entity, ActivationRequest::new("pulse", weapon, SourceKind::Passive))
            .expect("known effect");
    }

    for step in 0..8 {
        engine.tick(0.75);
        if step % 3 == 0 {
            engine.trigger(EntityId(1), TriggerKind::SkillCast);
        }
    }
    engine
}

#[test]
fn identical_replays_share_a_state_root() {
    let catalog = catalog();

    let first = replay(Arc::clone(&catalog));
    let second = replay(catalog);

    assert_eq!(
        hex::encode(first.state_root()),
        hex::encode(second.state_root())
    );
}

#[test]
fn diverging_replays_differ() {
    let catalog = catalog();

    let baseline = replay(Arc::clone(&catalog));
    let mut diverged = replay(catalog);
    diverged.trigger(EntityId(2), TriggerKind::SkillCast);

    assert_ne!(baseline.state_root(), diverged.state_root());
}

#[test]
fn cache_state_does_not_affect_digest() {
    let catalog = catalog();

    let cold = replay(Arc::clone(&catalog));
    let mut warm = replay(catalog);
    warm.snapshot(EntityId(1));
    warm.snapshot(EntityId(2));

    assert_eq!(cold.state_root(), warm.state_root());
}

#[test]
fn rejected_activation_leaves_root_unchanged() {
    let catalog = catalog();
    let empty = EffectEngine::new(Arc::clone(&catalog));
    let mut full = EffectEngine::with_config(catalog, EngineConfig::new().with_max_instances(0));

    full.activate(
        EntityId(3),
        ActivationRequest::new("crit_boost", SourceId(1), SourceKind::Weapon),
    )
    .expect("known effect");

    assert_eq!(empty.state_root(), full.state_root());
}
