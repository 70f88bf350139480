//! Maker price feed client
//!
//! One persistent WebSocket connection per client, with topic pub/sub,
//! a broadcast tick sink and a supervised reconnect loop.

pub mod client;
pub mod config;
pub mod messages;
pub mod registry;
pub mod store;

pub use client::*;
pub use config::*;
pub use messages::*;
pub use registry::*;
pub use store::*;
