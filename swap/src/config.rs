//! Swap orchestration configuration

use common::constants::DEFAULT_SWAP_TIMEOUT_MS;
use serde::{Deserialize, Serialize};

/// Timeout wrapping all three swap phases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapConfig {
    pub timeout_ms: u64,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_SWAP_TIMEOUT_MS,
        }
    }
}
