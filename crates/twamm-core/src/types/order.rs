//! # Order Types
//!
//! Long-term orders and the results returned by pool entry points.

use ethnum::U256;

use crate::errors::{TwammError, TwammResult};
use crate::math::big_int::{narrow, sub_u256, widen};
use crate::math::safe_math::{safe_mul_u128, safe_sub_u128};
use crate::constants::Q64_RESOLUTION;
use crate::types::{AccountId, Direction, Token};

/// Lifecycle state of a long-term order
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    /// Selling, or waiting for the engine to reach its expiry
    Active,
    /// Expiry reached, proceeds not yet claimed
    Expired,
    /// Expired and fully paid out
    Withdrawn,
    /// Cancelled before expiry
    Cancelled,
}

impl OrderStatus {
    /// Withdrawn and Cancelled orders never change again
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Withdrawn | OrderStatus::Cancelled)
    }
}

/// A commitment to sell at a constant per-block rate until `expiry_block`
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongTermOrder {
    pub id: u64,
    pub owner: AccountId,
    pub direction: Direction,
    /// Units of the sell token per block
    pub sale_rate: u128,
    pub start_block: u64,
    pub expiry_block: u64,
    /// Reward factor of the order's pool when the order was placed
    pub reward_factor_at_start: U256,
    /// Proceeds already paid out
    pub proceeds_withdrawn: u128,
    /// Stored state; `Expired` is derived by [`LongTermOrder::status_at`]
    pub status: OrderStatus,
}

impl LongTermOrder {
    /// Status as seen once the engine has executed up to `last_virtual_order_block`
    pub fn status_at(&self, last_virtual_order_block: u64) -> OrderStatus {
        if self.status == OrderStatus::Active && self.expiry_block <= last_virtual_order_block {
            OrderStatus::Expired
        } else {
            self.status
        }
    }

    pub fn is_owner(&self, account: &AccountId) -> bool {
        &self.owner == account
    }

    /// Principal committed when the order was placed
    pub fn principal(&self) -> TwammResult<u128> {
        safe_mul_u128(self.sale_rate, (self.expiry_block - self.start_block) as u128)
    }

    /// Principal not yet sold at `block`
    pub fn remaining_principal(&self, block: u64) -> TwammResult<u128> {
        if self.status != OrderStatus::Active || block >= self.expiry_block {
            return Ok(0);
        }
        safe_mul_u128(self.sale_rate, (self.expiry_block - block) as u128)
    }

    /// Total proceeds earned for a reward factor reading, floor((Δrf · rate) / 2^64)
    pub fn earned_proceeds(&self, reward_factor: U256) -> TwammResult<u128> {
        let delta = sub_u256(reward_factor, self.reward_factor_at_start)?;
        let scaled = delta
            .checked_mul(widen(self.sale_rate))
            .ok_or(TwammError::ArithmeticOverflow)?;
        narrow(scaled >> Q64_RESOLUTION)
    }

    /// Earned proceeds not yet paid out
    pub fn unclaimed_proceeds(&self, reward_factor: U256) -> TwammResult<u128> {
        safe_sub_u128(self.earned_proceeds(reward_factor)?, self.proceeds_withdrawn)
    }

    pub fn sell_token(&self) -> Token {
        self.direction.sell_token()
    }

    pub fn buy_token(&self) -> Token {
        self.direction.buy_token()
    }
}

// ============================================================================
// Entry Point Results
// ============================================================================

/// Outcome of an immediate swap
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapResult {
    pub direction: Direction,
    pub amount_in: u128,
    pub amount_out: u128,
    /// Portion of `amount_in` kept by the pool as fee
    pub fee_amount: u128,
}

/// Shares minted or burned with the matching token amounts
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LiquidityResult {
    pub shares: u128,
    pub amount_a: u128,
    pub amount_b: u128,
}

/// Result of placing a long-term order
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderPlacement {
    pub order_id: u64,
    pub sale_rate: u128,
    pub expiry_block: u64,
    /// Amount pulled from the owner: `sale_rate * (expiry_block - current_block)`
    pub amount_deposited: u128,
    /// Principal that did not divide evenly into the rate, left with the owner
    pub remainder: u128,
}

/// Result of a proceeds withdrawal
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProceedsWithdrawal {
    pub order_id: u64,
    pub token: Token,
    pub amount: u128,
    /// `Withdrawn` once the order had expired, `Active` otherwise
    pub status: OrderStatus,
}

/// Result of cancelling a long-term order
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderCancellation {
    pub order_id: u64,
    /// Unsold principal returned in the sell token
    pub refund: u128,
    /// Unwithdrawn proceeds returned in the buy token
    pub proceeds: u128,
}

/// Realized and projected proceeds of an order
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderProceeds {
    /// Earned up to the last executed block, not yet withdrawn
    pub realized: u128,
    /// Earned if the engine were run up to the current block
    pub unrealized: u128,
}
