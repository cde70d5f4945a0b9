//! # Pool State
//!
//! Plain data structures mutated by the engine and the lifecycle manager.

pub mod order_book;
pub mod order_pool;
pub mod reserve_pool;
pub mod twamm_state;

pub use order_book::*;
pub use order_pool::*;
pub use reserve_pool::*;
pub use twamm_state::*;
