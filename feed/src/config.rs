//! Feed client configuration

use common::constants::{
    DEFAULT_MAX_RECONNECTS, DEFAULT_RECONNECT_DELAY_MS, DEFAULT_TICK_CHANNEL_CAPACITY,
};
use serde::{Deserialize, Serialize};

/// Reconnect policy and channel sizing for the feed client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Fixed delay between reconnect attempts
    pub reconnect_delay_ms: u64,
    /// Reconnect attempts after an unexpected disconnect before giving up
    pub max_reconnects: u32,
    /// Capacity of the broadcast tick channel
    pub tick_channel_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            max_reconnects: DEFAULT_MAX_RECONNECTS,
            tick_channel_capacity: DEFAULT_TICK_CHANNEL_CAPACITY,
        }
    }
}
