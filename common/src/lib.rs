//! Shared types and conversion helpers for the channelswap workspace

pub mod assets;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pairs;
pub mod precision;
pub mod rate;
pub mod ticks;

pub use assets::*;
pub use config::*;
pub use constants::*;
pub use errors::*;
pub use pairs::*;
pub use precision::*;
pub use rate::*;
pub use ticks::*;
