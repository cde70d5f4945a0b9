//! # TWAMM Pool
//!
//! Public entry points of a pool. Every mutating call:
//!
//! 1. reads the current block and rejects a clock that went backwards,
//! 2. executes virtual orders up to that block,
//! 3. applies its own change to a copy of the state,
//! 4. settles the token movements against the ledger,
//! 5. commits the copy.
//!
//! A failure at any step leaves both the state and the ledger untouched.

use crate::clock::BlockSource;
use crate::engine::execute_virtual_orders as run_engine;
use crate::errors::{TwammError, TwammResult};
use crate::ledger::{Settlement, TokenLedger};
use crate::lifecycle;
use crate::state::{TwammSnapshot, TwammState};
use crate::types::{
    validate_fee, AccountId, Direction, LiquidityResult, LongTermOrder, OrderCancellation,
    OrderPlacement, OrderProceeds, OrderStatus, PoolConfig, PoolEvent, ProceedsWithdrawal,
    SwapResult, Token,
};

/// A TWAMM pool bound to a token ledger and a block source
#[derive(Debug)]
pub struct TwammPool<L, C> {
    state: TwammState,
    ledger: L,
    clock: C,
}

impl<L: TokenLedger, C: BlockSource> TwammPool<L, C> {
    /// Create an empty pool; its virtual order clock starts at the current block
    pub fn new(config: PoolConfig, ledger: L, clock: C) -> TwammResult<Self> {
        let state = TwammState::new(config, clock.current_block())?;
        log::info!(
            "created TWAMM pool: interval {} blocks, fee {} bps, owner {}",
            state.config.block_interval,
            state.config.fee_bps,
            state.config.owner
        );
        Ok(Self { state, ledger, clock })
    }

    // ========================================================================
    // Transaction Plumbing
    // ========================================================================

    fn current_block(&self) -> TwammResult<u64> {
        let current = self.clock.current_block();
        if current < self.state.last_virtual_order_block {
            return Err(TwammError::InvalidBlock {
                requested: current,
                current: self.state.last_virtual_order_block,
            });
        }
        Ok(current)
    }

    /// Run `op` on a synchronized copy of the state and commit it with its
    /// settlement
    fn transact<T>(
        &mut self,
        op: impl FnOnce(&mut TwammState, u64) -> TwammResult<(T, Settlement)>,
    ) -> TwammResult<T> {
        let current = self.current_block()?;
        self.commit(|draft| {
            run_engine(draft, current)?;
            op(draft, current)
        })
    }

    fn commit<T>(
        &mut self,
        op: impl FnOnce(&mut TwammState) -> TwammResult<(T, Settlement)>,
    ) -> TwammResult<T> {
        let mut draft = self.state.clone();
        let (output, settlement) = op(&mut draft)?;
        draft.check_reserve_limits()?;
        settlement.execute(&mut self.ledger)?;
        self.state = draft;
        Ok(output)
    }

    // ========================================================================
    // Liquidity
    // ========================================================================

    /// Provide the first liquidity of the pool
    pub fn initialize(&mut self, provider: &AccountId, amount_a: u128, amount_b: u128) -> TwammResult<LiquidityResult> {
        self.transact(|state, block| {
            let result = state.reserves.initialize(provider, amount_a, amount_b)?;
            log::info!("pool initialized by {} with {} A / {} B", provider, amount_a, amount_b);
            state.emit(PoolEvent::LiquidityInitialized {
                block,
                provider: provider.clone(),
                amount_a,
                amount_b,
                shares: result.shares,
            });
            let settlement = Settlement::new()
                .deposit(provider, Token::A, amount_a)
                .deposit(provider, Token::B, amount_b);
            Ok((result, settlement))
        })
    }

    /// Deposit both tokens in proportion to the reserves for new shares
    pub fn add_liquidity(&mut self, provider: &AccountId, amount_a: u128, amount_b: u128) -> TwammResult<LiquidityResult> {
        self.transact(|state, block| {
            let tolerance = state.config.liquidity_tolerance_bps;
            let result = state.reserves.add_liquidity(provider, amount_a, amount_b, tolerance)?;
            log::debug!("{} added liquidity for {} shares", provider, result.shares);
            state.emit(PoolEvent::LiquidityAdded {
                block,
                provider: provider.clone(),
                amount_a: result.amount_a,
                amount_b: result.amount_b,
                shares: result.shares,
            });
            let settlement = Settlement::new()
                .deposit(provider, Token::A, result.amount_a)
                .deposit(provider, Token::B, result.amount_b);
            Ok((result, settlement))
        })
    }

    /// Burn shares for a proportional part of the reserves
    pub fn remove_liquidity(&mut self, provider: &AccountId, shares: u128) -> TwammResult<LiquidityResult> {
        self.transact(|state, block| {
            let result = state.reserves.remove_liquidity(provider, shares)?;
            log::debug!("{} removed {} shares", provider, shares);
            state.emit(PoolEvent::LiquidityRemoved {
                block,
                provider: provider.clone(),
                amount_a: result.amount_a,
                amount_b: result.amount_b,
                shares,
            });
            let settlement = Settlement::new()
                .payout(provider, Token::A, result.amount_a)
                .payout(provider, Token::B, result.amount_b);
            Ok((result, settlement))
        })
    }

    // ========================================================================
    // Trading
    // ========================================================================

    /// Immediate swap against the reserves, after virtual orders are settled
    pub fn swap(
        &mut self,
        trader: &AccountId,
        direction: Direction,
        amount_in: u128,
        min_amount_out: u128,
    ) -> TwammResult<SwapResult> {
        self.transact(|state, block| {
            let result = state.reserves.swap(direction, amount_in, min_amount_out, state.config.fee_bps)?;
            log::debug!("{} swapped {} {} for {}", trader, amount_in, direction, result.amount_out);
            state.emit(PoolEvent::Swap {
                block,
                trader: trader.clone(),
                direction,
                amount_in,
                amount_out: result.amount_out,
            });
            let settlement = Settlement::new()
                .deposit(trader, direction.sell_token(), amount_in)
                .payout(trader, direction.buy_token(), result.amount_out);
            Ok((result, settlement))
        })
    }

    // ========================================================================
    // Long-Term Orders
    // ========================================================================

    /// Sell `principal` at a constant rate over `num_intervals` intervals
    pub fn create_order(
        &mut self,
        owner: &AccountId,
        direction: Direction,
        principal: u128,
        num_intervals: u64,
    ) -> TwammResult<OrderPlacement> {
        self.transact(|state, block| {
            lifecycle::create_order(state, owner, direction, principal, num_intervals, block)
        })
    }

    /// Claim the proceeds an order has earned so far
    pub fn withdraw_proceeds(&mut self, caller: &AccountId, order_id: u64) -> TwammResult<ProceedsWithdrawal> {
        self.transact(|state, _| lifecycle::withdraw_proceeds(state, caller, order_id))
    }

    /// Cancel an active order, refunding unsold principal and unclaimed proceeds
    pub fn cancel_order(&mut self, caller: &AccountId, order_id: u64) -> TwammResult<OrderCancellation> {
        self.transact(|state, block| lifecycle::cancel_order(state, caller, order_id, block))
    }

    /// Execute virtual orders up to `block`, which may lie before the current
    /// block. Blocks already executed are a no-op.
    pub fn execute_virtual_orders(&mut self, block: u64) -> TwammResult<()> {
        let current = self.current_block()?;
        if block > current {
            return Err(TwammError::InvalidBlock {
                requested: block,
                current,
            });
        }
        if block <= self.state.last_virtual_order_block {
            return Ok(());
        }
        self.commit(|draft| {
            run_engine(draft, block)?;
            Ok(((), Settlement::new()))
        })
    }

    // ========================================================================
    // Administration
    // ========================================================================

    /// Change the trading fee. Flow up to the current block is settled at the
    /// old fee first.
    pub fn set_fee(&mut self, caller: &AccountId, fee_bps: u16) -> TwammResult<()> {
        self.transact(|state, block| {
            if caller != &state.config.owner {
                return Err(TwammError::Unauthorized);
            }
            validate_fee(fee_bps)?;
            let old_fee_bps = state.config.fee_bps;
            state.config.fee_bps = fee_bps;
            log::info!("fee changed from {} to {} bps", old_fee_bps, fee_bps);
            state.emit(PoolEvent::FeeUpdated {
                block,
                old_fee_bps,
                new_fee_bps: fee_bps,
            });
            Ok(((), Settlement::new()))
        })
    }

    /// Pause or resume the creation of long-term orders. Returns the new state.
    pub fn toggle_pause_new_orders(&mut self, caller: &AccountId) -> TwammResult<bool> {
        self.transact(|state, block| {
            if caller != &state.config.owner {
                return Err(TwammError::Unauthorized);
            }
            state.new_orders_paused = !state.new_orders_paused;
            let paused = state.new_orders_paused;
            log::info!("new long-term orders {}", if paused { "paused" } else { "resumed" });
            state.emit(PoolEvent::PauseToggled { block, paused });
            Ok((paused, Settlement::new()))
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// AMM reserves as of the last executed block
    pub fn reserves(&self) -> (u128, u128) {
        (self.state.reserves.reserve_a, self.state.reserves.reserve_b)
    }

    /// Tokens held for long-term orders
    pub fn twamm_reserves(&self) -> (u128, u128) {
        (self.state.twamm_reserve_a, self.state.twamm_reserve_b)
    }

    pub fn twamm_state(&self) -> TwammSnapshot {
        self.state.snapshot()
    }

    /// Sale rates scheduled to end at `block`, as (A→B, B→A)
    pub fn sales_rate_ending_at(&self, block: u64) -> (u128, u128) {
        self.state.order_book.sales_rate_ending_at(block)
    }

    pub fn order(&self, order_id: u64) -> TwammResult<&LongTermOrder> {
        self.state.order_book.order(order_id)
    }

    /// Status of an order as of the last executed block
    pub fn order_status(&self, order_id: u64) -> TwammResult<OrderStatus> {
        Ok(self.order(order_id)?.status_at(self.state.last_virtual_order_block))
    }

    pub fn next_order_id(&self) -> u64 {
        self.state.order_book.next_order_id
    }

    pub fn last_virtual_order_block(&self) -> u64 {
        self.state.last_virtual_order_block
    }

    pub fn new_orders_paused(&self) -> bool {
        self.state.new_orders_paused
    }

    pub fn fee_bps(&self) -> u16 {
        self.state.config.fee_bps
    }

    pub fn total_shares(&self) -> u128 {
        self.state.reserves.total_shares
    }

    pub fn shares_of(&self, account: &AccountId) -> u128 {
        self.state.reserves.shares_of(account)
    }

    /// Reserves the pool would hold after executing virtual orders up to
    /// `block`. Nothing is committed.
    pub fn reserves_after_twamm(&self, block: u64) -> TwammResult<(u128, u128)> {
        let projected = self.project(block)?;
        Ok((projected.reserves.reserve_a, projected.reserves.reserve_b))
    }

    /// Proceeds an order can claim: `realized` up to the last executed block
    /// and `unrealized` earned between then and the current block
    pub fn order_proceeds(&self, order_id: u64) -> TwammResult<OrderProceeds> {
        let order = self.order(order_id)?;
        let realized = lifecycle::claimable_proceeds(&self.state, order)?;

        let projected = self.project(self.clock.current_block())?;
        let projected_order = projected.order_book.order(order_id)?;
        let total = lifecycle::claimable_proceeds(&projected, projected_order)?;

        Ok(OrderProceeds {
            realized,
            unrealized: total.saturating_sub(realized),
        })
    }

    /// Unsold principal of an order at the current block
    pub fn remaining_principal(&self, order_id: u64) -> TwammResult<u128> {
        lifecycle::remaining_principal(self.order(order_id)?, self.clock.current_block())
    }

    /// Copy of the state with virtual orders executed up to `block`
    fn project(&self, block: u64) -> TwammResult<TwammState> {
        if block < self.state.last_virtual_order_block {
            return Err(TwammError::InvalidBlock {
                requested: block,
                current: self.state.last_virtual_order_block,
            });
        }
        let mut projected = self.state.clone();
        run_engine(&mut projected, block)?;
        Ok(projected)
    }

    // ========================================================================
    // Host Access
    // ========================================================================

    /// Take the events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<PoolEvent> {
        self.state.drain_events()
    }

    pub fn state(&self) -> &TwammState {
        &self.state
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
