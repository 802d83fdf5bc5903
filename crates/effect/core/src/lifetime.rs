//! Lifetime clock: duration and cooldown decay.

use tracing::debug;

use crate::state::{EntityEffectState, InstanceKey, Lifetime};

/// Advances per-instance timers once per simulation tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct LifetimeClock;

impl LifetimeClock {
    /// Remainders at or below this many seconds count as elapsed.
    pub const SNAP_SECONDS: f64 = 1e-9;

    /// Decrements cooldowns and finite durations by `dt` seconds, then removes
    /// instances that expired.
    ///
    /// - Cooldowns floor at zero.
    /// - A finite duration reaching zero marks the instance inactive.
    /// - Permanent instances are never removed by time.
    ///
    /// `dt` of zero (or anything not a positive finite number) is a no-op.
    /// Returns the keys of removed instances; any removal invalidates the
    /// entity's aggregate cache.
    pub fn advance(state: &mut EntityEffectState, dt: f32) -> Vec<InstanceKey> {
        if !(dt.is_finite() && dt > 0.0) {
            return Vec::new();
        }
        let dt = f64::from(dt);

        for instance in state.instances_mut() {
            if !instance.is_active {
                continue;
            }
            if instance.cooldown_remaining > 0.0 {
                instance.cooldown_remaining = Self::countdown(instance.cooldown_remaining, dt);
            }
            if let Lifetime::Remaining(seconds) = instance.lifetime {
                let left = Self::countdown(seconds, dt);
                instance.lifetime = Lifetime::Remaining(left);
                if left <= 0.0 {
                    instance.is_active = false;
                }
            }
        }

        let removed = state.sweep_inactive();
        for key in &removed {
            debug!(effect = %key, "effect expired");
        }
        removed
    }

    fn countdown(seconds: f64, dt: f64) -> f64 {
        let left = seconds - dt;
        if left <= Self::SNAP_SECONDS { 0.0 } else { left }
    }
}
