//! # Virtual Order Execution Engine
//!
//! Brings a pool up to date by settling all long-term order flow between the
//! last executed block and a target block.
//!
//! The interval is split at every expiry block so that sale rates are
//! constant within each segment. Each segment is settled in one step with
//! [`compute_virtual_balances`], never block by block, and the result only
//! depends on the state and the target block. Running the engine twice to
//! the same block is a no-op.

use crate::errors::TwammResult;
use crate::math::safe_math::safe_mul_u128;
use crate::math::twamm_math::compute_virtual_balances;
use crate::state::TwammState;
use crate::types::{PoolEvent, Token};

/// Execute virtual orders up to and including `block`.
///
/// Returns the number of segments settled. Blocks at or before the last
/// executed block are ignored.
pub fn execute_virtual_orders(state: &mut TwammState, block: u64) -> TwammResult<u32> {
    let start = state.last_virtual_order_block;
    if block <= start {
        return Ok(0);
    }

    let mut segments = 0;
    while state.last_virtual_order_block < block {
        let boundary = state
            .order_book
            .next_expiry_after(state.last_virtual_order_block)
            .map_or(block, |expiry| expiry.min(block));

        execute_segment(state, boundary)?;
        state.order_book.consume_expiries(boundary)?;
        state.last_virtual_order_block = boundary;
        segments += 1;
    }

    log::debug!(
        "executed virtual orders {} -> {} in {} segment(s), reserves ({}, {})",
        start,
        block,
        segments,
        state.reserves.reserve_a,
        state.reserves.reserve_b
    );
    state.emit(PoolEvent::VirtualOrdersExecuted {
        block,
        reserve_a: state.reserves.reserve_a,
        reserve_b: state.reserves.reserve_b,
        twamm_reserve_a: state.twamm_reserve_a,
        twamm_reserve_b: state.twamm_reserve_b,
    });
    Ok(segments)
}

/// Settle the flow between the last executed block and `boundary`, during
/// which both sale rates are constant
fn execute_segment(state: &mut TwammState, boundary: u64) -> TwammResult<()> {
    let elapsed = (boundary - state.last_virtual_order_block) as u128;
    let rate_a = state.order_book.a_to_b.current_sale_rate;
    let rate_b = state.order_book.b_to_a.current_sale_rate;
    if rate_a == 0 && rate_b == 0 {
        return Ok(());
    }

    let sell_a = safe_mul_u128(rate_a, elapsed)?;
    let sell_b = safe_mul_u128(rate_b, elapsed)?;
    let outcome = compute_virtual_balances(
        state.reserves.reserve_a,
        state.reserves.reserve_b,
        sell_a,
        sell_b,
        state.fee_bps(),
    )?;

    state.reserves.apply_segment(&outcome);
    state.release(Token::A, sell_a)?;
    state.release(Token::B, sell_b)?;
    state.escrow(Token::A, outcome.a_out)?;
    state.escrow(Token::B, outcome.b_out)?;
    state.order_book.a_to_b.distribute_proceeds(outcome.b_out)?;
    state.order_book.b_to_a.distribute_proceeds(outcome.a_out)?;

    log::debug!(
        "segment {}..{}: sold {} A / {} B, paid {} B / {} A",
        state.last_virtual_order_block,
        boundary,
        sell_a,
        sell_b,
        outcome.b_out,
        outcome.a_out
    );
    Ok(())
}
