//! Workspace-wide constants
//!
//! Single source of truth for magic numbers shared across crates.

/// Default decimal precision for assets without an explicit override
pub const DEFAULT_ASSET_PRECISION: u8 = 8;

/// Ticker of the settlement asset carried over payment channels
pub const SETTLEMENT_TICKER: &str = "BTC";

/// Millisatoshis per satoshi (channel payments are denominated in msat)
pub const MSATS_PER_SAT: u64 = 1000;

// Feed reconnect policy
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5000;
pub const DEFAULT_MAX_RECONNECTS: u32 = 10;

// Amount synchronization
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

// Swap execution
pub const DEFAULT_SWAP_TIMEOUT_MS: u64 = 60_000;

// Channel capacities
pub const DEFAULT_TICK_CHANNEL_CAPACITY: usize = 256;
