//! # TWAMM Core - Time-Weighted Average Market Maker
//!
//! A constant product pool that also executes long-term orders: large trades
//! split into a constant per-block sale rate over many blocks. It provides:
//!
//! - A reserve pool with liquidity shares and immediate swaps
//! - An order book aggregating long-term orders per direction
//! - A virtual order engine settling all order flow lazily, one closed-form
//!   step per expiry-aligned segment
//! - Creation, withdrawal and cancellation of long-term orders
//!
//! Token movements and the block height come from the host through the
//! [`TokenLedger`] and [`BlockSource`] traits.
//!
//! ## Feature Flags
//!
//! - `client`: Enables serde serialization of state, results and events

pub mod clock;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod ledger;
pub mod lifecycle;
pub mod math;
pub mod pool;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use clock::{BlockSource, ManualClock};
pub use constants::*;
pub use errors::{TwammError, TwammResult};
pub use ledger::{InMemoryLedger, LedgerError, Settlement, TokenLedger, Transfer};
pub use pool::TwammPool;
pub use state::{TwammSnapshot, TwammState};
pub use types::*;
