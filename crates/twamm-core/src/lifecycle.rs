//! # Order Lifecycle Manager
//!
//! Creation, proceeds withdrawal and cancellation of long-term orders.
//!
//! Each operation expects the state to be synchronized to `current_block`
//! and returns the token movements it needs alongside its result. Nothing
//! here touches a ledger.

use ethnum::U256;

use crate::constants::MAX_ORDER_INTERVALS;
use crate::errors::{TwammError, TwammResult};
use crate::ledger::Settlement;
use crate::math::safe_math::{
    round_up_to_interval, safe_add_u128, safe_add_u64, safe_div_u128, safe_mul_u128, safe_mul_u64,
    safe_sub_u128,
};
use crate::state::TwammState;
use crate::types::{
    AccountId, Direction, LongTermOrder, OrderCancellation, OrderPlacement, OrderStatus, PoolEvent,
    ProceedsWithdrawal,
};

/// Place a long-term order selling `principal` over `num_intervals` intervals.
///
/// The order expires `num_intervals` intervals after the current block
/// rounded up to the interval. The part of `principal` that does not divide
/// evenly into a per-block rate is never pulled from the owner. Segments in
/// which the order flow rounds to zero after the fee earn no proceeds.
pub fn create_order(
    state: &mut TwammState,
    owner: &AccountId,
    direction: Direction,
    principal: u128,
    num_intervals: u64,
    current_block: u64,
) -> TwammResult<(OrderPlacement, Settlement)> {
    if state.new_orders_paused {
        log::warn!("rejected long-term order from {}: new orders are paused", owner);
        return Err(TwammError::NewOrdersPaused);
    }
    if !state.reserves.is_initialized() {
        return Err(TwammError::PoolNotInitialized);
    }
    if num_intervals == 0 || num_intervals > MAX_ORDER_INTERVALS {
        return Err(TwammError::InvalidAmount);
    }

    let interval = state.block_interval();
    let expiry_block = safe_add_u64(
        round_up_to_interval(current_block, interval)?,
        safe_mul_u64(num_intervals, interval)?,
    )?;
    let duration = (expiry_block - current_block) as u128;
    let sale_rate = safe_div_u128(principal, duration)?;
    if sale_rate == 0 {
        return Err(TwammError::InvalidAmount);
    }
    let amount_deposited = safe_mul_u128(sale_rate, duration)?;
    let remainder = safe_sub_u128(principal, amount_deposited)?;

    let order_id = state
        .order_book
        .place_order(owner, direction, sale_rate, expiry_block, current_block)?;
    state.escrow(direction.sell_token(), amount_deposited)?;

    log::debug!(
        "order {} placed by {}: {} at {}/block until {}",
        order_id,
        owner,
        direction,
        sale_rate,
        expiry_block
    );
    state.emit(PoolEvent::LongTermOrderPlaced {
        block: current_block,
        order_id,
        owner: owner.clone(),
        direction,
        sale_rate,
        expiry_block,
    });

    let settlement = Settlement::new().deposit(owner, direction.sell_token(), amount_deposited);
    Ok((
        OrderPlacement {
            order_id,
            sale_rate,
            expiry_block,
            amount_deposited,
            remainder,
        },
        settlement,
    ))
}

/// Pay out the proceeds an order has earned so far.
///
/// Before expiry this can be repeated. Once the order has expired the claim
/// settles against the reward factor at expiry and the order is closed.
pub fn withdraw_proceeds(
    state: &mut TwammState,
    caller: &AccountId,
    order_id: u64,
) -> TwammResult<(ProceedsWithdrawal, Settlement)> {
    let last_block = state.last_virtual_order_block;
    let order = state.order_book.order(order_id)?;
    if !order.is_owner(caller) {
        return Err(TwammError::Unauthorized);
    }
    let status = order.status_at(last_block);
    if status.is_terminal() {
        return Err(TwammError::OrderNotActive(order_id));
    }

    let amount = order.unclaimed_proceeds(settlement_reward_factor(state, order)?)?;
    let token = order.buy_token();
    let expired = status == OrderStatus::Expired;

    let order = state.order_book.order_mut(order_id)?;
    order.proceeds_withdrawn = safe_add_u128(order.proceeds_withdrawn, amount)?;
    if expired {
        order.status = OrderStatus::Withdrawn;
    }
    let new_status = order.status;
    state.release(token, amount)?;

    log::debug!("order {} withdrew {} {} (expired: {})", order_id, amount, token, expired);
    state.emit(PoolEvent::ProceedsWithdrawn {
        block: last_block,
        order_id,
        owner: caller.clone(),
        amount,
        expired,
    });

    Ok((
        ProceedsWithdrawal {
            order_id,
            token,
            amount,
            status: new_status,
        },
        Settlement::new().payout(caller, token, amount),
    ))
}

/// Stop an active order, refunding the unsold principal and any
/// unwithdrawn proceeds. The order's rate stops selling immediately.
pub fn cancel_order(
    state: &mut TwammState,
    caller: &AccountId,
    order_id: u64,
    current_block: u64,
) -> TwammResult<(OrderCancellation, Settlement)> {
    let order = state.order_book.order(order_id)?;
    if !order.is_owner(caller) {
        return Err(TwammError::Unauthorized);
    }
    if order.status != OrderStatus::Active || order.expiry_block <= current_block {
        return Err(TwammError::OrderNotActive(order_id));
    }

    let refund = order.remaining_principal(current_block)?;
    let proceeds = order.unclaimed_proceeds(state.order_book.pool(order.direction).reward_factor)?;
    let (direction, sale_rate, expiry_block) = (order.direction, order.sale_rate, order.expiry_block);

    state.order_book.remove_rate(direction, sale_rate, expiry_block)?;
    let order = state.order_book.order_mut(order_id)?;
    order.proceeds_withdrawn = safe_add_u128(order.proceeds_withdrawn, proceeds)?;
    order.status = OrderStatus::Cancelled;
    state.release(direction.sell_token(), refund)?;
    state.release(direction.buy_token(), proceeds)?;

    log::debug!(
        "order {} cancelled at block {}: refund {} {}, proceeds {} {}",
        order_id,
        current_block,
        refund,
        direction.sell_token(),
        proceeds,
        direction.buy_token()
    );
    state.emit(PoolEvent::LongTermOrderCancelled {
        block: current_block,
        order_id,
        owner: caller.clone(),
        refund,
        proceeds,
    });

    let settlement = Settlement::new()
        .payout(caller, direction.sell_token(), refund)
        .payout(caller, direction.buy_token(), proceeds);
    Ok((
        OrderCancellation {
            order_id,
            refund,
            proceeds,
        },
        settlement,
    ))
}

/// Proceeds an order could withdraw right now given the executed state
pub fn claimable_proceeds(state: &TwammState, order: &LongTermOrder) -> TwammResult<u128> {
    if order.status_at(state.last_virtual_order_block).is_terminal() {
        return Ok(0);
    }
    order.unclaimed_proceeds(settlement_reward_factor(state, order)?)
}

/// Reward factor an order is settled against: the live value while it is
/// selling, the expiry snapshot afterwards
fn settlement_reward_factor(state: &TwammState, order: &LongTermOrder) -> TwammResult<U256> {
    let pool = state.order_book.pool(order.direction);
    if order.expiry_block <= state.last_virtual_order_block {
        pool.reward_factor_at(order.expiry_block)
            .ok_or(TwammError::InvalidExpiry(order.expiry_block))
    } else {
        Ok(pool.reward_factor)
    }
}

/// Unsold principal of an order at `block`, zero once it stopped selling
pub fn remaining_principal(order: &LongTermOrder, block: u64) -> TwammResult<u128> {
    let remaining = order.remaining_principal(block)?;
    // Blocks before the start count as the full principal
    let principal = order.principal()?;
    Ok(remaining.min(principal))
}

/// Proceeds owed across every order of `owner`
pub fn total_claimable(state: &TwammState, owner: &AccountId) -> TwammResult<u128> {
    state
        .order_book
        .orders_of(owner)
        .try_fold(0u128, |total, order| {
            safe_add_u128(total, claimable_proceeds(state, order)?)
        })
}

/// Principal still to be sold across every order of `owner`
pub fn total_remaining_principal(state: &TwammState, owner: &AccountId, block: u64) -> TwammResult<u128> {
    state
        .order_book
        .orders_of(owner)
        .try_fold(0u128, |total, order| {
            safe_add_u128(total, remaining_principal(order, block)?)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::execute_virtual_orders;
    use crate::types::{PoolConfig, Token};

    fn seeded_state() -> TwammState {
        let mut state = TwammState::new(PoolConfig::default(), 0).unwrap();
        state
            .reserves
            .initialize(&AccountId::from("lp"), 1_000_000, 1_000_000)
            .unwrap();
        state
    }

    #[test]
    fn test_create_order_rate_and_expiry() {
        let mut state = seeded_state();
        let alice = AccountId::from("alice");

        let (placement, settlement) =
            create_order(&mut state, &alice, Direction::AToB, 10_000, 10, 0).unwrap();
        assert_eq!(placement.sale_rate, 100);
        assert_eq!(placement.expiry_block, 100);
        assert_eq!(placement.remainder, 0);
        assert_eq!(settlement.deposits[0].amount, 10_000);
        assert_eq!(state.twamm_reserve(Token::A), 10_000);

        // Block 3 rounds up to 10; 10_000 over 97 blocks leaves a remainder
        execute_virtual_orders(&mut state, 3).unwrap();
        let (placement, settlement) =
            create_order(&mut state, &alice, Direction::BToA, 10_000, 2, 3).unwrap();
        assert_eq!(placement.expiry_block, 30);
        assert_eq!(placement.sale_rate, 370);
        assert_eq!(placement.amount_deposited, 9_990);
        assert_eq!(placement.remainder, 10);
        assert_eq!(settlement.deposits[0].token, Token::B);
    }

    #[test]
    fn test_create_order_rejections() {
        let mut state = seeded_state();
        let alice = AccountId::from("alice");

        assert_eq!(
            create_order(&mut state, &alice, Direction::AToB, 10_000, 0, 0).unwrap_err(),
            TwammError::InvalidAmount
        );
        assert_eq!(
            create_order(&mut state, &alice, Direction::AToB, 99, 10, 0).unwrap_err(),
            TwammError::InvalidAmount
        );

        state.new_orders_paused = true;
        assert_eq!(
            create_order(&mut state, &alice, Direction::AToB, 10_000, 10, 0).unwrap_err(),
            TwammError::NewOrdersPaused
        );

        let mut empty = TwammState::new(PoolConfig::default(), 0).unwrap();
        assert_eq!(
            create_order(&mut empty, &alice, Direction::AToB, 10_000, 10, 0).unwrap_err(),
            TwammError::PoolNotInitialized
        );
    }

    #[test]
    fn test_withdraw_before_and_after_expiry() {
        let mut state = seeded_state();
        let alice = AccountId::from("alice");
        let (placement, _) = create_order(&mut state, &alice, Direction::AToB, 10_000, 10, 0).unwrap();
        let id = placement.order_id;

        assert_eq!(
            withdraw_proceeds(&mut state, &AccountId::from("mallory"), id).unwrap_err(),
            TwammError::Unauthorized
        );

        execute_virtual_orders(&mut state, 50).unwrap();
        let (first, _) = withdraw_proceeds(&mut state, &alice, id).unwrap();
        assert!(first.amount > 0);
        assert_eq!(first.status, OrderStatus::Active);
        assert_eq!(first.token, Token::B);

        execute_virtual_orders(&mut state, 120).unwrap();
        let (second, _) = withdraw_proceeds(&mut state, &alice, id).unwrap();
        assert_eq!(second.status, OrderStatus::Withdrawn);

        // Never more than a single 10_000 swap into 1M/1M would return
        let total = first.amount + second.amount;
        assert!(total > 9_800 && total <= 9_871, "total {}", total);

        assert_eq!(
            withdraw_proceeds(&mut state, &alice, id).unwrap_err(),
            TwammError::OrderNotActive(id)
        );
    }

    #[test]
    fn test_cancel_refunds_unsold_principal() {
        let mut state = seeded_state();
        let alice = AccountId::from("alice");
        let (placement, _) = create_order(&mut state, &alice, Direction::AToB, 10_000, 10, 0).unwrap();
        let id = placement.order_id;

        execute_virtual_orders(&mut state, 40).unwrap();
        let expected_proceeds = claimable_proceeds(&state, state.order_book.order(id).unwrap()).unwrap();
        let (cancellation, settlement) = cancel_order(&mut state, &alice, id, 40).unwrap();

        assert_eq!(cancellation.refund, 100 * 60);
        assert_eq!(cancellation.proceeds, expected_proceeds);
        assert_eq!(settlement.payouts.len(), 2);
        assert_eq!(state.order_book.a_to_b.current_sale_rate, 0);
        assert!(state.order_book.a_to_b.expiry_rate_decrease.is_empty());
        assert_eq!(state.twamm_reserve(Token::A), 0);

        assert_eq!(
            cancel_order(&mut state, &alice, id, 40).unwrap_err(),
            TwammError::OrderNotActive(id)
        );
        assert_eq!(
            withdraw_proceeds(&mut state, &alice, id).unwrap_err(),
            TwammError::OrderNotActive(id)
        );
    }

    #[test]
    fn test_cancel_after_expiry_is_rejected() {
        let mut state = seeded_state();
        let alice = AccountId::from("alice");
        let (placement, _) = create_order(&mut state, &alice, Direction::BToA, 5_000, 1, 0).unwrap();

        execute_virtual_orders(&mut state, 10).unwrap();
        assert_eq!(
            cancel_order(&mut state, &alice, placement.order_id, 10).unwrap_err(),
            TwammError::OrderNotActive(placement.order_id)
        );
        assert_eq!(remaining_principal(state.order_book.order(0).unwrap(), 10).unwrap(), 0);
        assert!(total_claimable(&state, &alice).unwrap() > 0);
        assert_eq!(total_remaining_principal(&state, &alice, 10).unwrap(), 0);
    }
}
