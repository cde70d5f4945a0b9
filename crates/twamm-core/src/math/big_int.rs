//! Big integer operations for high-precision math
//!
//! 256-bit helpers on top of [`ethnum::U256`]: widening, checked narrowing,
//! mul-div with explicit rounding and integer square roots.

use ethnum::U256;

use crate::errors::{TwammError, TwammResult};

/// Rounding mode for division operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum Rounding {
    /// Round down (towards zero)
    Down,
    /// Round up (away from zero)
    Up,
}

/// Widen a u128 to 256 bits
pub const fn widen(value: u128) -> U256 {
    U256::new(value)
}

/// Narrow a 256-bit value back to u128, failing on overflow
pub fn narrow(value: U256) -> TwammResult<u128> {
    if value > U256::new(u128::MAX) {
        return Err(TwammError::ArithmeticOverflow);
    }
    Ok(value.as_u128())
}

/// Checked 256-bit addition
pub fn add_u256(a: U256, b: U256) -> TwammResult<U256> {
    a.checked_add(b).ok_or(TwammError::ArithmeticOverflow)
}

/// Checked 256-bit subtraction
pub fn sub_u256(a: U256, b: U256) -> TwammResult<U256> {
    a.checked_sub(b).ok_or(TwammError::ArithmeticOverflow)
}

/// Checked 256-bit multiplication
pub fn mul_u256(a: U256, b: U256) -> TwammResult<U256> {
    a.checked_mul(b).ok_or(TwammError::ArithmeticOverflow)
}

/// Divide with the requested rounding
pub fn div_u256(a: U256, b: U256, rounding: Rounding) -> TwammResult<U256> {
    if b == U256::ZERO {
        return Err(TwammError::ArithmeticOverflow);
    }
    let quotient = a / b;
    if rounding == Rounding::Up && a % b != U256::ZERO {
        return add_u256(quotient, U256::ONE);
    }
    Ok(quotient)
}

/// Multiply two values and divide by a third with specified rounding
/// result = (a * b) / denominator
pub fn mul_div(a: U256, b: U256, denominator: U256, rounding: Rounding) -> TwammResult<U256> {
    let product = mul_u256(a, b)?;
    div_u256(product, denominator, rounding)
}

/// Multiply two u128 values and divide by a third with specified rounding
pub fn mul_div_u128(a: u128, b: u128, denominator: u128, rounding: Rounding) -> TwammResult<u128> {
    // a * b always fits in 256 bits
    let result = mul_div(widen(a), widen(b), widen(denominator), rounding)?;
    narrow(result)
}

/// Integer square root (floor) of a 256-bit value using Newton's method
pub fn sqrt_u256(n: U256) -> U256 {
    if n < U256::new(2) {
        return n;
    }

    // Start from a power of two that is at least sqrt(n)
    let bits = 256 - n.leading_zeros();
    let mut x = U256::ONE << ((bits + 1) / 2);
    loop {
        let y = (x + n / x) >> 1u32;
        if y >= x {
            return x;
        }
        x = y;
    }
}

/// Integer square root (floor) of the product of two u128 values
pub fn sqrt_product(a: u128, b: u128) -> U256 {
    sqrt_u256(widen(a) * widen(b))
}
