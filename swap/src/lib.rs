//! Atomic swap orchestration against the maker
//!
//! Three sequential phases (init, whitelist, execute) with descriptor
//! integrity validation in between, a single-session guard and one coarse
//! timeout around the whole sequence.

pub mod api;
pub mod config;
pub mod descriptor;
pub mod orchestrator;

pub use api::*;
pub use config::*;
pub use descriptor::*;
pub use orchestrator::*;
