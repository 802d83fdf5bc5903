//! Per-entity effect state.
//!
//! [`EntityEffectState`] owns the ordered instance list of one entity, the
//! outputs fired during the current trigger pass, and the memoized aggregate
//! snapshot with its validity flag. Every mutation that can change an
//! aggregate goes through a method here that invalidates the cache.

mod instance;

pub use instance::{EffectInstance, EntityId, InstanceKey, Lifetime, SourceId, SourceKind};

use crate::aggregate::AggregateSnapshot;
use crate::catalog::EffectId;
use crate::trigger::EffectOutput;

/// Active effect instances of one entity plus its cached aggregates.
#[derive(Clone, Debug, Default)]
pub struct EntityEffectState {
    /// Insertion-ordered; keys are unique.
    instances: Vec<EffectInstance>,
    /// Outputs fired since the last tick. Folded into aggregates.
    pass: Vec<EffectOutput>,
    cache: AggregateSnapshot,
    cache_valid: bool,
}

impl EntityEffectState {
    pub fn new() -> Self {
        Self::default()
    }

    /// All instances in insertion order, including ones awaiting removal.
    pub fn instances(&self) -> &[EffectInstance] {
        &self.instances
    }

    /// Instances that can still trigger or contribute to aggregates.
    pub fn live_instances(&self) -> impl Iterator<Item = &EffectInstance> {
        self.instances.iter().filter(|instance| instance.is_live())
    }

    pub fn get(&self, definition: &EffectId, source: SourceId) -> Option<&EffectInstance> {
        self.instances
            .iter()
            .find(|instance| instance.matches(definition, source))
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Outputs fired since the last lifetime pass.
    pub fn pass(&self) -> &[EffectOutput] {
        &self.pass
    }

    pub fn is_cache_valid(&self) -> bool {
        self.cache_valid
    }

    /// Marks the aggregate cache stale.
    pub fn invalidate(&mut self) {
        self.cache_valid = false;
    }

    /// Drops every instance and the current pass.
    pub fn clear(&mut self) {
        self.instances.clear();
        self.pass.clear();
        self.invalidate();
    }

    pub(crate) fn get_mut(
        &mut self,
        definition: &EffectId,
        source: SourceId,
    ) -> Option<&mut EffectInstance> {
        self.instances
            .iter_mut()
            .find(|instance| instance.matches(definition, source))
    }

    pub(crate) fn instances_mut(&mut self) -> &mut [EffectInstance] {
        &mut self.instances
    }

    pub(crate) fn insert(&mut self, instance: EffectInstance) {
        debug_assert!(
            self.get(&instance.definition_id, instance.source_id).is_none(),
            "duplicate instance key {}",
            instance.key()
        );
        self.instances.push(instance);
        self.invalidate();
    }

    /// Removes one instance, preserving the order of the rest.
    ///
    /// Outputs it fired during the current pass are withdrawn as well.
    pub(crate) fn remove(
        &mut self,
        definition: &EffectId,
        source: SourceId,
    ) -> Option<EffectInstance> {
        let index = self
            .instances
            .iter()
            .position(|instance| instance.matches(definition, source))?;
        self.pass.retain(|output| !output.fired_by(definition, source));
        self.invalidate();
        Some(self.instances.remove(index))
    }

    /// Removes every instance granted by `source`, and their pass outputs.
    pub(crate) fn remove_source(&mut self, source: SourceId) -> Vec<EffectInstance> {
        let (removed, kept): (Vec<_>, Vec<_>) = self
            .instances
            .drain(..)
            .partition(|instance| instance.source_id == source);
        self.instances = kept;
        if !removed.is_empty() {
            self.pass.retain(|output| {
                !removed
                    .iter()
                    .any(|instance| output.fired_by(&instance.definition_id, source))
            });
            self.invalidate();
        }
        removed
    }

    /// Removes instances that are inactive with a finite lifetime.
    ///
    /// Returns the keys of the removed instances in their former order.
    pub(crate) fn sweep_inactive(&mut self) -> Vec<InstanceKey> {
        let mut removed = Vec::new();
        self.instances.retain(|instance| {
            let dead = !instance.is_active && !instance.lifetime.is_permanent();
            if dead {
                removed.push(instance.key());
            }
            !dead
        });
        if !removed.is_empty() {
            self.invalidate();
        }
        removed
    }

    pub(crate) fn record_pass(&mut self, outputs: &[EffectOutput]) {
        if outputs.is_empty() {
            return;
        }
        self.pass.extend_from_slice(outputs);
        self.invalidate();
    }

    pub(crate) fn clear_pass(&mut self) {
        if self.pass.is_empty() {
            return;
        }
        self.pass.clear();
        self.invalidate();
    }

    pub(crate) fn cached(&self) -> Option<&AggregateSnapshot> {
        self.cache_valid.then_some(&self.cache)
    }

    pub(crate) fn store_cache(&mut self, snapshot: AggregateSnapshot) -> &AggregateSnapshot {
        self.cache = snapshot;
        self.cache_valid = true;
        &self.cache
    }

    /// SHA-256 over the instance list and the current pass.
    ///
    /// Two replays of the same activation / tick / trigger sequence produce
    /// the same digest. The aggregate cache is derived data and is not hashed.
    #[cfg(feature = "serde")]
    pub fn digest(&self) -> [u8; 32] {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();

        hasher.update((self.instances.len() as u64).to_le_bytes());
        for instance in &self.instances {
            digest::hash_into(&mut hasher, instance);
        }

        hasher.update((self.pass.len() as u64).to_le_bytes());
        for output in &self.pass {
            digest::hash_into(&mut hasher, output);
        }

        hasher.finalize().into()
    }
}

#[cfg(feature = "serde")]
mod digest {
    use std::io;

    use sha2::{Digest, Sha256};

    /// Feeds bincode output straight into the hasher.
    struct HashWriter<'a>(&'a mut Sha256);

    impl io::Write for HashWriter<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.update(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Instances and outputs hold only plain data, so encoding cannot fail;
    /// a failure would mean a new field broke that and is logged loudly.
    pub(super) fn hash_into<T: serde::Serialize>(hasher: &mut Sha256, value: &T) {
        if let Err(error) = bincode::serialize_into(HashWriter(hasher), value) {
            tracing::error!(%error, "state digest skipped a value that failed to encode");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(definition: &str, source: u32) -> EffectInstance {
        EffectInstance::new(
            EffectId::new(definition),
            SourceId(source),
            SourceKind::Weapon,
            Lifetime::Remaining(5.0),
        )
    }

    #[test]
    fn insert_and_remove_invalidate_the_cache() {
        let mut state = EntityEffectState::new();
        state.store_cache(AggregateSnapshot::default());
        assert!(state.is_cache_valid());

        state.insert(instance("haste", 1));
        assert!(!state.is_cache_valid());

        state.store_cache(AggregateSnapshot::default());
        assert!(state.remove(&EffectId::new("haste"), SourceId(1)).is_some());
        assert!(!state.is_cache_valid());
        assert!(state.is_empty());
    }

    #[test]
    fn removing_a_missing_instance_keeps_the_cache() {
        let mut state = EntityEffectState::new();
        state.insert(instance("haste", 1));
        state.store_cache(AggregateSnapshot::default());

        assert!(state.remove(&EffectId::new("haste"), SourceId(2)).is_none());
        assert!(state.is_cache_valid());
    }

    #[test]
    fn remove_preserves_insertion_order() {
        let mut state = EntityEffectState::new();
        state.insert(instance("a", 1));
        state.insert(instance("b", 1));
        state.insert(instance("c", 1));

        state.remove(&EffectId::new("b"), SourceId(1));

        let order: Vec<_> = state
            .instances()
            .iter()
            .map(|i| i.definition_id.as_str())
            .collect();
        assert_eq!(order, ["a", "c"]);
    }

    #[test]
    fn remove_source_takes_every_instance_of_that_source() {
        let mut state = EntityEffectState::new();
        state.insert(instance("a", 1));
        state.insert(instance("b", 2));
        state.insert(instance("c", 1));

        let removed = state.remove_source(SourceId(1));

        assert_eq!(removed.len(), 2);
        assert_eq!(state.len(), 1);
        assert!(state.get(&EffectId::new("b"), SourceId(2)).is_some());
    }

    fn output(definition: &str, source: u32) -> EffectOutput {
        EffectOutput {
            definition_id: EffectId::new(definition),
            category: crate::catalog::EffectCategory::Direct,
            total_value: 0.2,
            stack_count: 1,
            sources: vec![SourceId(source)],
        }
    }

    #[test]
    fn removal_withdraws_outputs_from_the_pass() {
        let mut state = EntityEffectState::new();
        state.insert(instance("frenzy", 1));
        state.insert(instance("frenzy", 2));
        state.insert(instance("thorns", 1));
        state.record_pass(&[output("frenzy", 1), output("frenzy", 2), output("thorns", 1)]);

        state.remove(&EffectId::new("frenzy"), SourceId(1));
        assert_eq!(state.pass(), [output("frenzy", 2), output("thorns", 1)]);

        state.remove_source(SourceId(1));
        assert_eq!(state.pass(), [output("frenzy", 2)]);
    }

    #[test]
    fn sweep_keeps_permanent_instances() {
        let mut state = EntityEffectState::new();
        let mut timed = instance("timed", 1);
        timed.is_active = false;
        let mut permanent = instance("permanent", 1);
        permanent.lifetime = Lifetime::Permanent;
        permanent.is_active = false;
        state.insert(timed);
        state.insert(permanent);

        let removed = state.sweep_inactive();

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].definition.as_str(), "timed");
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn expired_instances_are_not_live() {
        let mut expired = instance("x", 1);
        expired.lifetime = Lifetime::Remaining(0.0);
        assert!(!expired.is_live());

        let permanent = EffectInstance::new(
            EffectId::new("y"),
            SourceId(1),
            SourceKind::Passive,
            Lifetime::Permanent,
        );
        assert!(permanent.is_live());
    }
}
