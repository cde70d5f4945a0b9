//! # Core Type Definitions
//!
//! Identifiers, orders, results, events and configuration shared by the pool,
//! the engine and off-chain hosts.

pub mod config;
pub mod direction;
pub mod events;
pub mod order;

// Re-export all types
pub use config::*;
pub use direction::*;
pub use events::*;
pub use order::*;
