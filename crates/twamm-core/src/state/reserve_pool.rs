//! # Reserve Pool
//!
//! Constant product reserves of the pair and the liquidity shares that claim
//! them. All operations here are pure state transitions; token movement is
//! settled by the caller.

use std::collections::BTreeMap;

use crate::constants::{BPS_DENOMINATOR, MINIMUM_LIQUIDITY};
use crate::errors::{TwammError, TwammResult};
use crate::math::amm_math::{
    deposit_for_shares, get_amount_out, initial_shares, shares_for_deposit, withdrawal_for_shares,
};
use crate::math::big_int::{mul_div_u128, Rounding};
use crate::math::safe_math::{safe_add_u128, safe_sub_u128};
use crate::math::twamm_math::SegmentOutcome;
use crate::types::{AccountId, Direction, LiquidityResult, SwapResult, Token};

/// AMM reserves and liquidity share balances
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservePool {
    pub reserve_a: u128,
    pub reserve_b: u128,
    /// Shares outstanding, including the locked minimum
    pub total_shares: u128,
    shares: BTreeMap<AccountId, u128>,
}

impl ReservePool {
    pub fn is_initialized(&self) -> bool {
        self.total_shares > 0
    }

    pub fn reserve(&self, token: Token) -> u128 {
        match token {
            Token::A => self.reserve_a,
            Token::B => self.reserve_b,
        }
    }

    /// Reserves ordered as (sold, bought) for a direction
    pub fn reserves_for(&self, direction: Direction) -> (u128, u128) {
        (
            self.reserve(direction.sell_token()),
            self.reserve(direction.buy_token()),
        )
    }

    /// Shares held by `account`
    pub fn shares_of(&self, account: &AccountId) -> u128 {
        self.shares.get(account).copied().unwrap_or(0)
    }

    // ========================================================================
    // Liquidity
    // ========================================================================

    /// Seed the reserves and mint `floor(sqrt(a * b))` shares, of which
    /// `MINIMUM_LIQUIDITY` are locked
    pub fn initialize(
        &mut self,
        provider: &AccountId,
        amount_a: u128,
        amount_b: u128,
    ) -> TwammResult<LiquidityResult> {
        if self.is_initialized() {
            return Err(TwammError::AlreadyInitialized);
        }
        if amount_a == 0 || amount_b == 0 {
            return Err(TwammError::InvalidAmount);
        }

        let total = initial_shares(amount_a, amount_b)?;
        let minted = total - MINIMUM_LIQUIDITY;

        self.reserve_a = amount_a;
        self.reserve_b = amount_b;
        self.total_shares = total;
        self.shares.insert(provider.clone(), minted);

        Ok(LiquidityResult {
            shares: minted,
            amount_a,
            amount_b,
        })
    }

    /// Mint shares for a proportional deposit.
    ///
    /// Only the amounts the minted shares require are taken. The unused
    /// remainder on each side must stay within `tolerance_bps` of what was
    /// offered (at least one unit is always tolerated).
    pub fn add_liquidity(
        &mut self,
        provider: &AccountId,
        amount_a: u128,
        amount_b: u128,
        tolerance_bps: u16,
    ) -> TwammResult<LiquidityResult> {
        if !self.is_initialized() {
            return Err(TwammError::PoolNotInitialized);
        }

        let shares = shares_for_deposit(amount_a, self.reserve_a, self.total_shares)?
            .min(shares_for_deposit(amount_b, self.reserve_b, self.total_shares)?);
        if shares == 0 {
            return Err(TwammError::InvalidAmount);
        }

        let taken_a = deposit_for_shares(shares, self.reserve_a, self.total_shares)?;
        let taken_b = deposit_for_shares(shares, self.reserve_b, self.total_shares)?;
        for (offered, taken) in [(amount_a, taken_a), (amount_b, taken_b)] {
            let excess = safe_sub_u128(offered, taken)?;
            let allowed = mul_div_u128(offered, tolerance_bps as u128, BPS_DENOMINATOR, Rounding::Down)?.max(1);
            if excess > allowed {
                log::debug!(
                    "add_liquidity rejected: {} unused of {} offered (tolerance {})",
                    excess,
                    offered,
                    allowed
                );
                return Err(TwammError::InvalidAmount);
            }
        }

        self.reserve_a = safe_add_u128(self.reserve_a, taken_a)?;
        self.reserve_b = safe_add_u128(self.reserve_b, taken_b)?;
        self.total_shares = safe_add_u128(self.total_shares, shares)?;
        let balance = self.shares.entry(provider.clone()).or_default();
        *balance = safe_add_u128(*balance, shares)?;

        Ok(LiquidityResult {
            shares,
            amount_a: taken_a,
            amount_b: taken_b,
        })
    }

    /// Burn shares and return the floor-proportional part of each reserve
    pub fn remove_liquidity(&mut self, provider: &AccountId, shares: u128) -> TwammResult<LiquidityResult> {
        if !self.is_initialized() {
            return Err(TwammError::PoolNotInitialized);
        }
        if shares == 0 {
            return Err(TwammError::InvalidAmount);
        }
        let balance = self.shares_of(provider);
        if shares > balance {
            return Err(TwammError::InsufficientLiquidity);
        }

        let amount_a = withdrawal_for_shares(shares, self.reserve_a, self.total_shares)?;
        let amount_b = withdrawal_for_shares(shares, self.reserve_b, self.total_shares)?;

        self.reserve_a = safe_sub_u128(self.reserve_a, amount_a)?;
        self.reserve_b = safe_sub_u128(self.reserve_b, amount_b)?;
        self.total_shares = safe_sub_u128(self.total_shares, shares)?;
        if balance == shares {
            self.shares.remove(provider);
        } else {
            self.shares.insert(provider.clone(), balance - shares);
        }

        Ok(LiquidityResult {
            shares,
            amount_a,
            amount_b,
        })
    }

    // ========================================================================
    // Trading
    // ========================================================================

    /// Immediate constant product swap with the fee taken from the input
    pub fn swap(
        &mut self,
        direction: Direction,
        amount_in: u128,
        min_amount_out: u128,
        fee_bps: u16,
    ) -> TwammResult<SwapResult> {
        if amount_in == 0 {
            return Err(TwammError::InvalidAmount);
        }
        let (reserve_in, reserve_out) = self.reserves_for(direction);
        if reserve_in == 0 || reserve_out == 0 {
            return Err(TwammError::InsufficientLiquidity);
        }

        let amount_out = get_amount_out(amount_in, reserve_in, reserve_out, fee_bps)?;
        if amount_out == 0 {
            return Err(TwammError::InsufficientLiquidity);
        }
        if amount_out < min_amount_out {
            return Err(TwammError::SlippageExceeded {
                actual: amount_out,
                minimum: min_amount_out,
            });
        }

        let new_in = safe_add_u128(reserve_in, amount_in)?;
        let new_out = safe_sub_u128(reserve_out, amount_out)?;
        match direction {
            Direction::AToB => {
                self.reserve_a = new_in;
                self.reserve_b = new_out;
            }
            Direction::BToA => {
                self.reserve_b = new_in;
                self.reserve_a = new_out;
            }
        }

        let fee_amount = mul_div_u128(amount_in, fee_bps as u128, BPS_DENOMINATOR, Rounding::Up)?;
        Ok(SwapResult {
            direction,
            amount_in,
            amount_out,
            fee_amount,
        })
    }

    /// Adopt the reserves produced by a virtual order segment
    pub fn apply_segment(&mut self, outcome: &SegmentOutcome) {
        self.reserve_a = outcome.reserve_a;
        self.reserve_b = outcome.reserve_b;
    }
}
