//! # Safe Math Operations
//!
//! Overflow-checked arithmetic. Every failure surfaces as
//! [`TwammError::ArithmeticOverflow`] so that a call either completes with
//! exact integer results or has no effect.

use crate::constants::BPS_DENOMINATOR;
use crate::errors::{TwammError, TwammResult};

/// Macro to generate safe arithmetic functions
macro_rules! safe_arith {
    // Division operations with zero check. Tagged arms must precede the
    // generic arm.
    (@div, $fn_name:ident, $type:ty) => {
        /// Safe division with zero check
        pub fn $fn_name(a: $type, b: $type) -> TwammResult<$type> {
            if b == 0 {
                return Err(TwammError::ArithmeticOverflow);
            }
            Ok(a / b)
        }
    };

    // Ceiling division with zero check
    (@div_ceil, $fn_name:ident, $type:ty) => {
        /// Safe division rounding toward positive infinity
        pub fn $fn_name(a: $type, b: $type) -> TwammResult<$type> {
            if b == 0 {
                return Err(TwammError::ArithmeticOverflow);
            }
            let quotient = a / b;
            if a % b == 0 {
                Ok(quotient)
            } else {
                Ok(quotient + 1)
            }
        }
    };

    // Binary operations with checked methods
    ($fn_name:ident, $type:ty, $checked_method:ident) => {
        /// Checked operation, overflow and underflow map to `ArithmeticOverflow`
        pub fn $fn_name(a: $type, b: $type) -> TwammResult<$type> {
            a.$checked_method(b).ok_or(TwammError::ArithmeticOverflow)
        }
    };
}

// Generate basic arithmetic functions
safe_arith!(safe_add_u64, u64, checked_add);
safe_arith!(safe_sub_u64, u64, checked_sub);
safe_arith!(safe_mul_u64, u64, checked_mul);
safe_arith!(@div, safe_div_u64, u64);
safe_arith!(@div_ceil, safe_div_ceil_u64, u64);

safe_arith!(safe_add_u128, u128, checked_add);
safe_arith!(safe_sub_u128, u128, checked_sub);
safe_arith!(safe_mul_u128, u128, checked_mul);
safe_arith!(@div, safe_div_u128, u128);
safe_arith!(@div_ceil, safe_div_ceil_u128, u128);

/// Amount remaining after deducting a fee in basis points (rounded down)
pub fn amount_after_fee(amount: u128, fee_bps: u16) -> TwammResult<u128> {
    let kept = BPS_DENOMINATOR - fee_bps as u128;
    crate::math::big_int::mul_div_u128(amount, kept, BPS_DENOMINATOR, crate::math::big_int::Rounding::Down)
}

/// Round a block up to the next multiple of `interval`
pub fn round_up_to_interval(block: u64, interval: u64) -> TwammResult<u64> {
    let intervals = safe_div_ceil_u64(block, interval)?;
    safe_mul_u64(intervals, interval)
}
