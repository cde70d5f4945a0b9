//! # Pool Events
//!
//! Every mutating entry point records what it did. Hosts drain the queue
//! after each call for indexing and reporting.

use crate::types::{AccountId, Direction};

/// Event emitted by the pool, tagged with the block it happened at
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "client", serde(tag = "type"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEvent {
    // ========================================================================
    // Liquidity Events
    // ========================================================================
    LiquidityInitialized {
        block: u64,
        provider: AccountId,
        amount_a: u128,
        amount_b: u128,
        shares: u128,
    },
    LiquidityAdded {
        block: u64,
        provider: AccountId,
        amount_a: u128,
        amount_b: u128,
        shares: u128,
    },
    LiquidityRemoved {
        block: u64,
        provider: AccountId,
        amount_a: u128,
        amount_b: u128,
        shares: u128,
    },

    // ========================================================================
    // Trading Events
    // ========================================================================
    Swap {
        block: u64,
        trader: AccountId,
        direction: Direction,
        amount_in: u128,
        amount_out: u128,
    },
    VirtualOrdersExecuted {
        block: u64,
        reserve_a: u128,
        reserve_b: u128,
        twamm_reserve_a: u128,
        twamm_reserve_b: u128,
    },

    // ========================================================================
    // Long-Term Order Events
    // ========================================================================
    LongTermOrderPlaced {
        block: u64,
        order_id: u64,
        owner: AccountId,
        direction: Direction,
        sale_rate: u128,
        expiry_block: u64,
    },
    ProceedsWithdrawn {
        block: u64,
        order_id: u64,
        owner: AccountId,
        amount: u128,
        expired: bool,
    },
    LongTermOrderCancelled {
        block: u64,
        order_id: u64,
        owner: AccountId,
        refund: u128,
        proceeds: u128,
    },

    // ========================================================================
    // Administration Events
    // ========================================================================
    FeeUpdated {
        block: u64,
        old_fee_bps: u16,
        new_fee_bps: u16,
    },
    PauseToggled {
        block: u64,
        paused: bool,
    },
}

impl PoolEvent {
    /// Block the event was emitted at
    pub fn block(&self) -> u64 {
        match self {
            PoolEvent::LiquidityInitialized { block, .. }
            | PoolEvent::LiquidityAdded { block, .. }
            | PoolEvent::LiquidityRemoved { block, .. }
            | PoolEvent::Swap { block, .. }
            | PoolEvent::VirtualOrdersExecuted { block, .. }
            | PoolEvent::LongTermOrderPlaced { block, .. }
            | PoolEvent::ProceedsWithdrawn { block, .. }
            | PoolEvent::LongTermOrderCancelled { block, .. }
            | PoolEvent::FeeUpdated { block, .. }
            | PoolEvent::PauseToggled { block, .. } => *block,
        }
    }

    /// Account that triggered the event, if any
    pub fn actor(&self) -> Option<&AccountId> {
        match self {
            PoolEvent::LiquidityInitialized { provider, .. }
            | PoolEvent::LiquidityAdded { provider, .. }
            | PoolEvent::LiquidityRemoved { provider, .. } => Some(provider),
            PoolEvent::Swap { trader, .. } => Some(trader),
            PoolEvent::LongTermOrderPlaced { owner, .. }
            | PoolEvent::ProceedsWithdrawn { owner, .. }
            | PoolEvent::LongTermOrderCancelled { owner, .. } => Some(owner),
            PoolEvent::VirtualOrdersExecuted { .. }
            | PoolEvent::FeeUpdated { .. }
            | PoolEvent::PauseToggled { .. } => None,
        }
    }
}
