//! # Constant Product Math
//!
//! x·y=k formulas shared by immediate swaps, single-sided virtual execution
//! and liquidity provisioning.

use crate::constants::{BPS_DENOMINATOR, MINIMUM_LIQUIDITY};
use crate::errors::{TwammError, TwammResult};
use crate::math::big_int::{add_u256, div_u256, mul_div_u128, mul_u256, narrow, sqrt_product, widen, Rounding};

/// Output of a constant product swap with the fee taken from the input:
///
/// `out = in·(10000−fee)·rOut / (rIn·10000 + in·(10000−fee))`, rounded down.
pub fn get_amount_out(
    amount_in: u128,
    reserve_in: u128,
    reserve_out: u128,
    fee_bps: u16,
) -> TwammResult<u128> {
    if amount_in == 0 {
        return Ok(0);
    }
    if reserve_in == 0 || reserve_out == 0 {
        return Err(TwammError::InsufficientLiquidity);
    }

    let amount_in_with_fee = mul_u256(widen(amount_in), widen(BPS_DENOMINATOR - fee_bps as u128))?;
    let numerator = mul_u256(amount_in_with_fee, widen(reserve_out))?;
    let denominator = add_u256(mul_u256(widen(reserve_in), widen(BPS_DENOMINATOR))?, amount_in_with_fee)?;

    narrow(div_u256(numerator, denominator, Rounding::Down)?)
}

/// Shares minted for the first deposit: floor(sqrt(a·b)).
/// The first `MINIMUM_LIQUIDITY` of them are locked forever.
pub fn initial_shares(amount_a: u128, amount_b: u128) -> TwammResult<u128> {
    let shares = narrow(sqrt_product(amount_a, amount_b))?;
    if shares <= MINIMUM_LIQUIDITY {
        return Err(TwammError::InvalidAmount);
    }
    Ok(shares)
}

/// Shares a deposit of `amount` against `reserve` is worth (rounded down)
pub fn shares_for_deposit(amount: u128, reserve: u128, total_shares: u128) -> TwammResult<u128> {
    if reserve == 0 {
        return Err(TwammError::InsufficientLiquidity);
    }
    mul_div_u128(amount, total_shares, reserve, Rounding::Down)
}

/// Tokens needed to back `shares` newly minted shares (rounded up)
pub fn deposit_for_shares(shares: u128, reserve: u128, total_shares: u128) -> TwammResult<u128> {
    if total_shares == 0 {
        return Err(TwammError::PoolNotInitialized);
    }
    mul_div_u128(shares, reserve, total_shares, Rounding::Up)
}

/// Tokens returned for burning `shares` (rounded down)
pub fn withdrawal_for_shares(shares: u128, reserve: u128, total_shares: u128) -> TwammResult<u128> {
    if total_shares == 0 {
        return Err(TwammError::PoolNotInitialized);
    }
    mul_div_u128(shares, reserve, total_shares, Rounding::Down)
}

/// reserve_a · reserve_b without overflow
pub fn constant_product(reserve_a: u128, reserve_b: u128) -> ethnum::U256 {
    widen(reserve_a) * widen(reserve_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_amount_out_matches_reference() {
        // 10_000 in against a 1_000_000 / 1_000_000 pool at 0.3%
        let out = get_amount_out(10_000, 1_000_000, 1_000_000, 30).unwrap();
        // 10000*9970*1e6 / (1e6*10000 + 10000*9970) = 9871.58...
        assert_eq!(out, 9_871);
    }

    #[test]
    fn test_get_amount_out_preserves_product() {
        let (r_in, r_out) = (3_333_333u128, 7_777_777u128);
        for amount in [1u128, 17, 1_000, 250_000, 10_000_000] {
            let out = get_amount_out(amount, r_in, r_out, 30).unwrap();
            assert!(constant_product(r_in + amount, r_out - out) >= constant_product(r_in, r_out));
        }
    }

    #[test]
    fn test_get_amount_out_empty_pool() {
        assert_eq!(get_amount_out(10, 0, 100, 30), Err(TwammError::InsufficientLiquidity));
        assert_eq!(get_amount_out(0, 0, 100, 30).unwrap(), 0);
    }

    #[test]
    fn test_share_math() {
        assert_eq!(initial_shares(1_000_000, 1_000_000).unwrap(), 1_000_000);
        assert_eq!(initial_shares(1_000, 1_000), Err(TwammError::InvalidAmount));

        assert_eq!(shares_for_deposit(500, 1_000, 2_000).unwrap(), 1_000);
        assert_eq!(deposit_for_shares(1, 1_000, 3).unwrap(), 334);
        assert_eq!(withdrawal_for_shares(1, 1_000, 3).unwrap(), 333);
    }
}
