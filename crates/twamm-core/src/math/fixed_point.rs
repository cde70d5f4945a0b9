//! # Fixed-Point Arithmetic
//!
//! Q64.64 operations used by the closed-form virtual order solver:
//! exponentials, square roots of ratios and rounding-aware products.
//! Every routine is integer-only so results are bit-exact across hosts.

use ethnum::U256;

use crate::constants::{LN2_Q64, MAX_EXP_INPUT_Q64, Q64, Q64_RESOLUTION};
use crate::errors::{TwammError, TwammResult};
use crate::math::big_int::{div_u256, mul_div, mul_u256, sqrt_u256, widen, Rounding};

/// Multiply two Q64.64 numbers held in 256 bits
pub fn mul_q64(a: U256, b: U256, rounding: Rounding) -> TwammResult<U256> {
    mul_div(a, b, widen(Q64), rounding)
}

/// Divide two values, returning the quotient in Q64.64
pub fn div_q64(a: U256, b: U256, rounding: Rounding) -> TwammResult<U256> {
    let scaled = mul_u256(a, widen(Q64))?;
    div_u256(scaled, b, rounding)
}

/// Square root of `num / den` in Q64.64 (rounded down).
///
/// The numerator is pre-shifted by the largest even amount that fits in
/// 256 bits so small ratios keep their precision.
pub fn sqrt_ratio_q64(num: U256, den: U256) -> TwammResult<U256> {
    if den == U256::ZERO {
        return Err(TwammError::ArithmeticOverflow);
    }
    if num == U256::ZERO {
        return Ok(U256::ZERO);
    }

    let shift = num.leading_zeros() & !1;
    let scaled = (num << shift) / den;
    let root = sqrt_u256(scaled);

    // root = sqrt(num / den) * 2^(shift / 2)
    let half = shift / 2;
    if half >= Q64_RESOLUTION {
        Ok(root >> (half - Q64_RESOLUTION))
    } else {
        mul_u256(root, U256::ONE << (Q64_RESOLUTION - half))
    }
}

/// e^x for a non-negative Q64.64 input, result in Q64.64 (rounded down).
///
/// Range reduction x = n·ln2 + r with r in [0, ln2), then a Taylor series
/// for e^r that runs until the next term vanishes.
pub fn exp_q64(x: u128) -> TwammResult<u128> {
    if x > MAX_EXP_INPUT_Q64 {
        return Err(TwammError::ArithmeticOverflow);
    }
    if x == 0 {
        return Ok(Q64);
    }

    let n = x / LN2_Q64;
    let r = x - n * LN2_Q64;

    // term <= 2^64 and r < 2^64, so every product fits in u128
    let mut sum = Q64;
    let mut term = Q64;
    let mut i = 1u128;
    loop {
        term = ((term * r) >> Q64_RESOLUTION) / i;
        if term == 0 {
            break;
        }
        sum += term;
        i += 1;
    }

    // sum < 2^65 and n <= 57
    Ok(sum << n)
}
