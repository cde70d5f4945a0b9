//! # TWAMM State
//!
//! Everything a pool mutates lives in one owned [`TwammState`]: reserves,
//! the order book, escrowed order balances, the virtual order clock and
//! pending events. Entry points work on a copy and commit it only when the
//! whole call succeeds.

use ethnum::U256;

use crate::constants::MAX_RESERVE;
use crate::errors::{TwammError, TwammResult};
use crate::math::safe_math::{safe_add_u128, safe_sub_u128};
use crate::state::{OrderBook, ReservePool};
use crate::types::{PoolConfig, PoolEvent, Token};

/// Mutable state of a TWAMM pool
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwammState {
    pub config: PoolConfig,
    pub reserves: ReservePool,
    pub order_book: OrderBook,
    /// Tokens held for long-term orders: unsold principal plus proceeds owed
    pub twamm_reserve_a: u128,
    pub twamm_reserve_b: u128,
    /// Block up to which virtual orders have been executed
    pub last_virtual_order_block: u64,
    pub new_orders_paused: bool,
    events: Vec<PoolEvent>,
}

/// Read-only summary of the long-term order side of a pool
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwammSnapshot {
    pub sale_rate_a_to_b: u128,
    pub sale_rate_b_to_a: u128,
    pub reward_factor_a_to_b: U256,
    pub reward_factor_b_to_a: U256,
    pub last_virtual_order_block: u64,
    pub block_interval: u64,
}

impl TwammState {
    /// Fresh state whose virtual order clock starts at `block`
    pub fn new(config: PoolConfig, block: u64) -> TwammResult<Self> {
        config.validate()?;
        Ok(Self {
            order_book: OrderBook::new(config.block_interval),
            config,
            reserves: ReservePool::default(),
            twamm_reserve_a: 0,
            twamm_reserve_b: 0,
            last_virtual_order_block: block,
            new_orders_paused: false,
            events: Vec::new(),
        })
    }

    pub fn fee_bps(&self) -> u16 {
        self.config.fee_bps
    }

    pub fn block_interval(&self) -> u64 {
        self.config.block_interval
    }

    // ========================================================================
    // Order Escrow
    // ========================================================================

    pub fn twamm_reserve(&self, token: Token) -> u128 {
        match token {
            Token::A => self.twamm_reserve_a,
            Token::B => self.twamm_reserve_b,
        }
    }

    fn twamm_reserve_mut(&mut self, token: Token) -> &mut u128 {
        match token {
            Token::A => &mut self.twamm_reserve_a,
            Token::B => &mut self.twamm_reserve_b,
        }
    }

    /// Move tokens into escrow
    pub fn escrow(&mut self, token: Token, amount: u128) -> TwammResult<()> {
        let reserve = self.twamm_reserve_mut(token);
        *reserve = safe_add_u128(*reserve, amount)?;
        Ok(())
    }

    /// Move tokens out of escrow
    pub fn release(&mut self, token: Token, amount: u128) -> TwammResult<()> {
        let reserve = self.twamm_reserve_mut(token);
        *reserve = safe_sub_u128(*reserve, amount)?;
        Ok(())
    }

    /// The pool's holdings of each token must stay within 112 bits
    pub fn check_reserve_limits(&self) -> TwammResult<()> {
        for token in [Token::A, Token::B] {
            let held = safe_add_u128(self.reserves.reserve(token), self.twamm_reserve(token))
                .map_err(|_| TwammError::ReserveLimitExceeded)?;
            if held > MAX_RESERVE {
                return Err(TwammError::ReserveLimitExceeded);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn snapshot(&self) -> TwammSnapshot {
        TwammSnapshot {
            sale_rate_a_to_b: self.order_book.a_to_b.current_sale_rate,
            sale_rate_b_to_a: self.order_book.b_to_a.current_sale_rate,
            reward_factor_a_to_b: self.order_book.a_to_b.reward_factor,
            reward_factor_b_to_a: self.order_book.b_to_a.reward_factor,
            last_virtual_order_block: self.last_virtual_order_block,
            block_interval: self.block_interval(),
        }
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub fn emit(&mut self, event: PoolEvent) {
        self.events.push(event);
    }

    pub fn pending_events(&self) -> &[PoolEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<PoolEvent> {
        std::mem::take(&mut self.events)
    }
}
