//! # Mathematical Functions
//!
//! Pure integer math for swaps, liquidity shares and virtual order settlement.

pub mod amm_math;
pub mod big_int;
pub mod fixed_point;
pub mod safe_math;
pub mod twamm_math;

// Re-export commonly used functions
pub use amm_math::*;
pub use big_int::*;
pub use fixed_point::*;
pub use safe_math::*;
pub use twamm_math::*;
