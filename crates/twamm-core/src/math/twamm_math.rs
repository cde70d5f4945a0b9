//! # Virtual Order Math
//!
//! Settles one segment of long-term order flow against the reserves.
//!
//! Within a segment both sale rates are constant, so the pool sees a
//! continuous stream of `a` units of A and `b` units of B. When both
//! streams are nonzero the end state has a closed form:
//!
//! ```text
//! c    = (√(x·b) − √(y·a)) / (√(x·b) + √(y·a))
//! E    = 2·√(a·b / k)
//! xEnd = √(k·a / b) · (e^E + c) / (e^E − c)
//! yEnd = ⌈k / xEnd⌉
//! ```
//!
//! With a single nonzero stream the segment is an ordinary constant product
//! swap of the whole amount.

use ethnum::U256;

use crate::constants::{MAX_EXP_INPUT_Q64, Q64, Q64_RESOLUTION};
use crate::errors::{TwammError, TwammResult};
use crate::math::amm_math::{constant_product, get_amount_out};
use crate::math::big_int::{div_u256, mul_div, mul_u256, narrow, widen, Rounding};
use crate::math::fixed_point::{exp_q64, sqrt_ratio_q64};
use crate::math::safe_math::{amount_after_fee, safe_add_u128, safe_sub_u128};

/// Result of settling one segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentOutcome {
    /// Reserve of token A after the segment
    pub reserve_a: u128,
    /// Reserve of token B after the segment
    pub reserve_b: u128,
    /// Token A paid out to the sellers of B
    pub a_out: u128,
    /// Token B paid out to the sellers of A
    pub b_out: u128,
}

/// Trade `a_in` units of A and `b_in` units of B against the reserves.
///
/// The fee is deducted from each stream before trading and stays in the
/// pool, so `reserve_a · reserve_b` never decreases. A stream that is
/// entirely consumed by the fee is donated to the reserves.
pub fn compute_virtual_balances(
    reserve_a: u128,
    reserve_b: u128,
    a_in: u128,
    b_in: u128,
    fee_bps: u16,
) -> TwammResult<SegmentOutcome> {
    if a_in == 0 && b_in == 0 {
        return Ok(SegmentOutcome {
            reserve_a,
            reserve_b,
            a_out: 0,
            b_out: 0,
        });
    }
    if reserve_a == 0 || reserve_b == 0 {
        return Err(TwammError::InsufficientLiquidity);
    }

    let a = amount_after_fee(a_in, fee_bps)?;
    let b = amount_after_fee(b_in, fee_bps)?;

    let (a_out, b_out) = if a == 0 || b == 0 {
        // One-sided: the other stream (if any) is too small to trade
        let b_out = if a > 0 {
            get_amount_out(a_in, reserve_a, reserve_b, fee_bps)?
        } else {
            0
        };
        let a_out = if b > 0 {
            get_amount_out(b_in, reserve_b, reserve_a, fee_bps)?
        } else {
            0
        };
        (a_out, b_out)
    } else {
        closed_form(reserve_a, reserve_b, a, b)?
    };

    let outcome = SegmentOutcome {
        reserve_a: safe_sub_u128(safe_add_u128(reserve_a, a_in)?, a_out)?,
        reserve_b: safe_sub_u128(safe_add_u128(reserve_b, b_in)?, b_out)?,
        a_out,
        b_out,
    };
    debug_assert!(
        constant_product(outcome.reserve_a, outcome.reserve_b)
            >= constant_product(reserve_a, reserve_b)
    );
    Ok(outcome)
}

/// Two-sided settlement on fee-adjusted inflows. Returns `(a_out, b_out)`.
fn closed_form(x: u128, y: u128, a: u128, b: u128) -> TwammResult<(u128, u128)> {
    // Solved with c >= 0; when x·b < y·a the tokens swap roles
    if widen(x) * widen(b) < widen(y) * widen(a) {
        let (b_out, a_out) = closed_form_ordered(y, x, b, a)?;
        return Ok((a_out, b_out));
    }
    closed_form_ordered(x, y, a, b)
}

/// Closed form for `x·b >= y·a`, where `c` lies in `[0, 1)`
fn closed_form_ordered(x: u128, y: u128, a: u128, b: u128) -> TwammResult<(u128, u128)> {
    let k = constant_product(x, y);
    let q64 = widen(Q64);

    // c = (r − 1) / (r + 1) with r = √(x·b / y·a) >= 1
    let r = sqrt_ratio_q64(widen(x) * widen(b), widen(y) * widen(a))?;
    let c_q = mul_div(r.saturating_sub(q64), q64, r + q64, Rounding::Down)?;

    let e = sqrt_ratio_q64(widen(a) * widen(b), k)? * U256::new(2);
    let ratio = if e >= widen(MAX_EXP_INPUT_Q64) {
        q64
    } else {
        let exp_e = widen(exp_q64(narrow(e)?)?);
        // e^E >= 1 > c, so the denominator is positive
        div_u256((exp_e + c_q) << Q64_RESOLUTION, exp_e - c_q, Rounding::Up)?
    };

    // √(k·a / b) in Q64.64. k is shifted down by an even amount when k·a
    // would not fit in 256 bits.
    let product_bits = (256 - k.leading_zeros()) + (128 - a.leading_zeros());
    let half_shift = (product_bits.saturating_sub(255) + 1) / 2;
    let root = sqrt_ratio_q64((k >> (2 * half_shift)) * widen(a), widen(b))? << half_shift;

    // xEnd = √(k·a / b) · ratio, never below one unit
    let x_end = div_u256(mul_u256(root, ratio)?, q64 * q64, Rounding::Up)?.max(U256::ONE);

    log::trace!(
        "closed form: x={} y={} a={} b={} c={} e={} ratio={} x_end={}",
        x,
        y,
        a,
        b,
        c_q,
        e,
        ratio,
        x_end
    );

    let x_total = widen(x) + widen(a);
    let y_total = widen(y) + widen(b);
    let mut a_out = if x_end < x_total { x_total - x_end } else { U256::ZERO };

    let y_end = div_u256(k, x_total - a_out, Rounding::Up)?;
    let b_out = if y_end <= y_total {
        y_total - y_end
    } else {
        // Rounding left too little B in the pool: settle A against y + b
        let x_floor = div_u256(k, y_total, Rounding::Up)?;
        a_out = if x_floor < x_total { x_total - x_floor } else { U256::ZERO };
        U256::ZERO
    };

    Ok((narrow(a_out)?, narrow(b_out)?))
}
