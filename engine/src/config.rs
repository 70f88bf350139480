//! Engine configuration

use common::constants::DEFAULT_DEBOUNCE_MS;
use serde::{Deserialize, Serialize};

/// How bound violations are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundsPolicy {
    /// Silently clamp the edited amount into the allowed range
    Clamp,
    /// Keep the edited amount and emit a non-blocking advisory
    Advise,
}

/// Debounce and bounds behavior of the sync engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Delay between an edit and the dependent-field recompute
    pub debounce_ms: u64,
    pub bounds_policy: BoundsPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            bounds_policy: BoundsPolicy::Clamp,
        }
    }
}
