/// Engine tunables.
///
/// Loaded from TOML by `effect-content`; every field falls back to its
/// default when omitted.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct EngineConfig {
    /// Distinct (definition, source) instances one entity may hold.
    /// Activations past this limit are rejected.
    pub max_instances_per_entity: usize,
    /// Crit damage bonus per point of crit rate bonus.
    pub crit_damage_ratio: f32,
    /// Duration an activation falls back to when it requests a negative one.
    pub fallback_duration: f32,
}

impl EngineConfig {
    pub const DEFAULT_MAX_INSTANCES: usize = 64;
    pub const DEFAULT_CRIT_DAMAGE_RATIO: f32 = 3.0;
    pub const DEFAULT_FALLBACK_DURATION: f32 = 0.0;

    pub fn new() -> Self {
        Self {
            max_instances_per_entity: Self::DEFAULT_MAX_INSTANCES,
            crit_damage_ratio: Self::DEFAULT_CRIT_DAMAGE_RATIO,
            fallback_duration: Self::DEFAULT_FALLBACK_DURATION,
        }
    }

    #[must_use]
    pub fn with_max_instances(mut self, max_instances_per_entity: usize) -> Self {
        self.max_instances_per_entity = max_instances_per_entity;
        self
    }

    #[must_use]
    pub fn with_crit_damage_ratio(mut self, crit_damage_ratio: f32) -> Self {
        self.crit_damage_ratio = crit_damage_ratio;
        self
    }

    #[must_use]
    pub fn with_fallback_duration(mut self, seconds: f32) -> Self {
        self.fallback_duration = seconds;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
