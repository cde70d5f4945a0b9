//! # Pool Scenario Tests
//!
//! End-to-end runs of a pool against the in-memory ledger and a manual
//! clock: opposing long-term orders, single-sided flow against discrete
//! swaps, cancellation, withdrawal timing and administration.

use twamm_core::math::{constant_product, get_amount_out};
use twamm_core::*;

const FUNDING: u128 = 1_000_000_000_000_000;

type Pool = TwammPool<InMemoryLedger, ManualClock>;

fn account(name: &str) -> AccountId {
    AccountId::from(name)
}

/// Pool seeded with `reserve` of each token at block 0
fn setup(reserve: u128, fee_bps: u16) -> (Pool, ManualClock) {
    let clock = ManualClock::new(0);
    let mut ledger = InMemoryLedger::new("pool");
    for name in ["lp", "alice", "bob", "carol"] {
        ledger.mint(&account(name), Token::A, FUNDING).unwrap();
        ledger.mint(&account(name), Token::B, FUNDING).unwrap();
    }
    let config = PoolConfig::new("owner").with_fee_bps(fee_bps).with_block_interval(10);
    let mut pool = TwammPool::new(config, ledger, clock.clone()).unwrap();
    pool.initialize(&account("lp"), reserve, reserve).unwrap();
    (pool, clock)
}

/// Every token the pool holds is either a reserve or escrowed for orders
fn assert_balances_reconcile(pool: &Pool) {
    let (reserve_a, reserve_b) = pool.reserves();
    let (twamm_a, twamm_b) = pool.twamm_reserves();
    assert_eq!(pool.ledger().pool_balance(Token::A), reserve_a + twamm_a);
    assert_eq!(pool.ledger().pool_balance(Token::B), reserve_b + twamm_b);
}

#[test]
fn test_opposing_orders_are_symmetric() {
    let (mut pool, clock) = setup(1_000_000, 30);
    let (alice, bob) = (account("alice"), account("bob"));

    let a = pool.create_order(&alice, Direction::AToB, 10_000, 10).unwrap();
    let b = pool.create_order(&bob, Direction::BToA, 10_000, 10).unwrap();
    assert_eq!((a.sale_rate, a.expiry_block), (100, 100));
    assert_eq!((b.sale_rate, b.expiry_block), (100, 100));

    clock.set(100);
    let alice_out = pool.withdraw_proceeds(&alice, a.order_id).unwrap();
    let bob_out = pool.withdraw_proceeds(&bob, b.order_id).unwrap();

    // Both sides net out; each receives its input less the 0.3% fee
    assert_eq!(alice_out.amount, bob_out.amount);
    assert!(alice_out.amount >= 9_960 && alice_out.amount <= 9_970, "{}", alice_out.amount);
    assert_eq!(alice_out.token, Token::B);
    assert_eq!(alice_out.status, OrderStatus::Withdrawn);
    assert_eq!(pool.reserves(), (1_000_030, 1_000_030));
    assert_balances_reconcile(&pool);
}

#[test]
fn test_single_sided_order_tracks_discrete_swaps() {
    let reserve = 1_000_000_000;
    let (mut twamm, twamm_clock) = setup(reserve, 30);
    let (mut discrete, discrete_clock) = setup(reserve, 30);
    let (alice, bob) = (account("alice"), account("bob"));

    let order = twamm.create_order(&alice, Direction::AToB, 10_000_000, 10).unwrap();
    assert_eq!(order.sale_rate, 100_000);

    let mut swapped = 0;
    for _ in 0..100 {
        swapped += discrete.swap(&bob, Direction::AToB, 100_000, 0).unwrap().amount_out;
        discrete_clock.advance(1);
    }

    twamm_clock.set(100);
    let proceeds = twamm.withdraw_proceeds(&alice, order.order_id).unwrap().amount;

    let single_swap = get_amount_out(10_000_000, reserve, reserve, 30).unwrap();
    assert!(proceeds <= single_swap);
    let diff = proceeds.abs_diff(swapped);
    assert!(diff * 1_000 < swapped, "twamm {} vs discrete {}", proceeds, swapped);
    assert_balances_reconcile(&twamm);
}

#[test]
fn test_cancellation_refunds_unsold_principal() {
    let (mut pool, clock) = setup(1_000_000, 30);
    let alice = account("alice");
    let order = pool.create_order(&alice, Direction::AToB, 10_000, 10).unwrap();

    clock.set(40);
    let partial = pool.withdraw_proceeds(&alice, order.order_id).unwrap();
    assert_eq!(partial.status, OrderStatus::Active);

    clock.set(60);
    let expected = pool.order_proceeds(order.order_id).unwrap();
    let cancellation = pool.cancel_order(&alice, order.order_id).unwrap();
    assert_eq!(cancellation.refund, 100 * 40);
    assert_eq!(cancellation.proceeds, expected.realized + expected.unrealized);

    // The rate stops selling immediately
    assert_eq!(pool.twamm_state().sale_rate_a_to_b, 0);
    assert_eq!(pool.sales_rate_ending_at(100), (0, 0));
    let reserves = pool.reserves();
    clock.set(100);
    pool.execute_virtual_orders(100).unwrap();
    assert_eq!(pool.reserves(), reserves);

    let ledger = pool.ledger();
    assert_eq!(ledger.balance_of(&alice, Token::A), FUNDING - 6_000);
    assert_eq!(
        ledger.balance_of(&alice, Token::B),
        FUNDING + partial.amount + cancellation.proceeds
    );
    assert_eq!(pool.order_status(order.order_id).unwrap(), OrderStatus::Cancelled);
    assert_balances_reconcile(&pool);
}

#[test]
fn test_proceeds_shared_by_sale_rate() {
    let (mut pool, clock) = setup(10_000_000, 30);
    let (alice, carol) = (account("alice"), account("carol"));

    let small = pool.create_order(&alice, Direction::AToB, 10_000, 10).unwrap();
    let large = pool.create_order(&carol, Direction::AToB, 30_000, 10).unwrap();
    assert_eq!(large.sale_rate, 3 * small.sale_rate);

    clock.set(150);
    let small_out = pool.withdraw_proceeds(&alice, small.order_id).unwrap().amount;
    let large_out = pool.withdraw_proceeds(&carol, large.order_id).unwrap().amount;
    assert!(large_out.abs_diff(3 * small_out) <= 3, "{} vs {}", large_out, small_out);
}

#[test]
fn test_late_withdrawal_uses_expiry_snapshot() {
    let run = |withdraw_at: u64| {
        let (mut pool, clock) = setup(1_000_000, 30);
        let (alice, bob) = (account("alice"), account("bob"));
        let short = pool.create_order(&alice, Direction::AToB, 10_000, 10).unwrap();
        pool.create_order(&bob, Direction::BToA, 40_000, 20).unwrap();
        clock.set(withdraw_at);
        pool.withdraw_proceeds(&alice, short.order_id).unwrap().amount
    };

    // The opposing order keeps trading after block 100 without changing the claim
    assert_eq!(run(100), run(170));
}

#[test]
fn test_orders_across_intervals_keep_invariants() {
    let (mut pool, clock) = setup(5_000_000, 30);
    let (alice, bob, carol) = (account("alice"), account("bob"), account("carol"));

    let mut k = constant_product(pool.reserves().0, pool.reserves().1);
    let first = pool.create_order(&alice, Direction::AToB, 50_000, 5).unwrap();

    clock.set(13);
    let second = pool.create_order(&bob, Direction::BToA, 123_457, 7).unwrap();
    assert_eq!(second.expiry_block, 90);
    assert_eq!(second.sale_rate, 123_457 / 77);
    assert_eq!(second.remainder, 123_457 % 77);

    clock.set(27);
    pool.swap(&carol, Direction::AToB, 20_000, 0).unwrap();
    let next = constant_product(pool.reserves().0, pool.reserves().1);
    assert!(next >= k);
    k = next;

    for block in [41, 50, 64, 90, 95] {
        clock.set(block);
        pool.execute_virtual_orders(block).unwrap();
        let next = constant_product(pool.reserves().0, pool.reserves().1);
        assert!(next >= k);
        k = next;
        assert_balances_reconcile(&pool);
    }

    pool.withdraw_proceeds(&alice, first.order_id).unwrap();
    pool.withdraw_proceeds(&bob, second.order_id).unwrap();
    assert_eq!(pool.twamm_state().sale_rate_a_to_b, 0);
    assert_eq!(pool.twamm_state().sale_rate_b_to_a, 0);
    assert_balances_reconcile(&pool);
}

#[test]
fn test_synchronization_is_idempotent() {
    let (mut pool, clock) = setup(1_000_000, 30);
    pool.create_order(&account("alice"), Direction::AToB, 10_000, 10).unwrap();

    clock.set(35);
    pool.execute_virtual_orders(35).unwrap();
    pool.drain_events();
    let synced = pool.state().clone();

    pool.execute_virtual_orders(35).unwrap();
    pool.execute_virtual_orders(20).unwrap();
    assert_eq!(pool.state(), &synced);
    assert!(pool.drain_events().is_empty());
}

#[test]
fn test_fee_change_applies_from_current_block() {
    let reference = {
        let (mut pool, clock) = setup(1_000_000, 30);
        pool.create_order(&account("alice"), Direction::AToB, 10_000, 10).unwrap();
        clock.set(50);
        pool.execute_virtual_orders(50).unwrap();
        pool.reserves()
    };

    let (mut pool, clock) = setup(1_000_000, 30);
    pool.create_order(&account("alice"), Direction::AToB, 10_000, 10).unwrap();
    clock.set(50);
    pool.set_fee(&account("owner"), 0).unwrap();
    assert_eq!(pool.reserves(), reference);

    let events = pool.drain_events();
    assert!(events.iter().any(|event| matches!(
        event,
        PoolEvent::FeeUpdated { block: 50, old_fee_bps: 30, new_fee_bps: 0 }
    )));
}

#[test]
fn test_pause_only_blocks_new_orders() {
    let (mut pool, clock) = setup(1_000_000, 30);
    let (owner, alice) = (account("owner"), account("alice"));
    let order = pool.create_order(&alice, Direction::AToB, 10_000, 10).unwrap();

    assert!(pool.toggle_pause_new_orders(&owner).unwrap());
    assert_eq!(
        pool.create_order(&alice, Direction::BToA, 10_000, 10),
        Err(TwammError::NewOrdersPaused)
    );

    clock.set(30);
    pool.swap(&alice, Direction::BToA, 1_000, 1).unwrap();
    pool.withdraw_proceeds(&alice, order.order_id).unwrap();
    pool.cancel_order(&alice, order.order_id).unwrap();
    assert!(pool.new_orders_paused());
}

#[test]
fn test_liquidity_round_trip_with_orders_running() {
    let (mut pool, clock) = setup(1_000_000, 30);
    let bob = account("bob");
    pool.create_order(&account("alice"), Direction::AToB, 10_000, 10).unwrap();

    clock.set(20);
    let added = pool.add_liquidity(&bob, 1_000_000, 1_100_000).unwrap_err();
    assert_eq!(added, TwammError::InvalidAmount);

    let (reserve_a, reserve_b) = pool.reserves_after_twamm(20).unwrap();
    let share = pool.total_shares() / 10;
    let offer_a = reserve_a / 10 + 1;
    let offer_b = reserve_b / 10 + 1;
    let added = pool.add_liquidity(&bob, offer_a, offer_b).unwrap();
    assert!(added.shares > 0 && added.shares <= share);
    assert_eq!(pool.shares_of(&bob), added.shares);

    clock.set(200);
    let removed = pool.remove_liquidity(&bob, added.shares).unwrap();
    assert_eq!(pool.shares_of(&bob), 0);
    assert!(removed.amount_a + removed.amount_b > 0);
    assert_eq!(
        pool.remove_liquidity(&bob, 1),
        Err(TwammError::InsufficientLiquidity)
    );
    assert_balances_reconcile(&pool);
}

#[test]
fn test_events_record_order_lifecycle() {
    let (mut pool, clock) = setup(1_000_000, 30);
    let alice = account("alice");
    pool.drain_events();

    let order = pool.create_order(&alice, Direction::AToB, 10_000, 10).unwrap();
    clock.set(100);
    pool.withdraw_proceeds(&alice, order.order_id).unwrap();

    let events = pool.drain_events();
    assert!(matches!(events[0], PoolEvent::LongTermOrderPlaced { order_id: 0, sale_rate: 100, .. }));
    assert!(matches!(events[1], PoolEvent::VirtualOrdersExecuted { block: 100, .. }));
    assert!(matches!(events[2], PoolEvent::ProceedsWithdrawn { expired: true, .. }));
    assert_eq!(events.len(), 3);
}

#[test]
fn test_proceeds_conserved_across_overlapping_orders() {
    let reserve = 1_000_000_000;
    let (mut pool, clock) = setup(reserve, 30);
    let (alice, bob, carol, lp) = (account("alice"), account("bob"), account("carol"), account("lp"));

    let mut orders = vec![
        (alice.clone(), pool.create_order(&alice, Direction::AToB, 3_000_000, 5).unwrap()),
        (bob.clone(), pool.create_order(&bob, Direction::BToA, 5_000_000, 8).unwrap()),
    ];
    clock.set(15);
    orders.push((carol.clone(), pool.create_order(&carol, Direction::AToB, 1_000_000, 3).unwrap()));
    orders.push((lp.clone(), pool.create_order(&lp, Direction::BToA, 2_000_000, 4).unwrap()));
    assert_eq!(orders[2].1.expiry_block, 50);
    assert_eq!(orders[3].1.expiry_block, 60);

    clock.set(200);
    let (mut deposited, mut paid) = ([0u128; 2], [0u128; 2]);
    for (owner, placement) in &orders {
        let direction = pool.order(placement.order_id).unwrap().direction;
        let withdrawal = pool.withdraw_proceeds(owner, placement.order_id).unwrap();
        assert_eq!(withdrawal.status, OrderStatus::Withdrawn);
        let (sold, bought) = match direction {
            Direction::AToB => (0, 1),
            Direction::BToA => (1, 0),
        };
        deposited[sold] += placement.amount_deposited;
        paid[bought] += withdrawal.amount;
    }

    // Everything sold went into the reserves, so the reserve deltas give the
    // total paid out by all segments
    let (reserve_a, reserve_b) = pool.reserves();
    let a_out = reserve + deposited[0] - reserve_a;
    let b_out = reserve + deposited[1] - reserve_b;
    assert!(paid[0] > 0 && paid[1] > 0);

    // Each order loses less than one unit to rounding
    let (twamm_a, twamm_b) = pool.twamm_reserves();
    assert_eq!(paid[0] + twamm_a, a_out);
    assert_eq!(paid[1] + twamm_b, b_out);
    assert!(twamm_a <= 2, "undistributed A {}", twamm_a);
    assert!(twamm_b <= 2, "undistributed B {}", twamm_b);
    assert_balances_reconcile(&pool);
}

#[test]
fn test_skewed_pool_keeps_working() {
    let clock = ManualClock::new(0);
    let mut ledger = InMemoryLedger::new("pool");
    for name in ["lp", "alice", "bob", "carol"] {
        ledger.mint(&account(name), Token::A, 1 << 101).unwrap();
        ledger.mint(&account(name), Token::B, 1 << 60).unwrap();
    }
    let mut pool = TwammPool::new(PoolConfig::new("owner"), ledger, clock.clone()).unwrap();
    let (lp, alice, bob, carol) = (account("lp"), account("alice"), account("bob"), account("carol"));
    pool.initialize(&lp, 1 << 100, 1 << 20).unwrap();

    let sell_a = pool.create_order(&alice, Direction::AToB, 100, 1).unwrap();
    let sell_b = pool.create_order(&bob, Direction::BToA, 10 << 54, 1).unwrap();
    clock.advance(5);

    let swap = pool.swap(&carol, Direction::BToA, 1_000_000, 0).unwrap();
    assert!(swap.amount_out > 0);

    let cancelled = pool.cancel_order(&bob, sell_b.order_id).unwrap();
    assert_eq!(cancelled.refund, 5 << 54);
    assert!(cancelled.proceeds > 0);

    clock.set(20);
    let withdrawal = pool.withdraw_proceeds(&alice, sell_a.order_id).unwrap();
    assert_eq!(withdrawal.status, OrderStatus::Withdrawn);

    pool.remove_liquidity(&lp, 1 << 59).unwrap();
    assert_balances_reconcile(&pool);
}
