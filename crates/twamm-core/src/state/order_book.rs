//! # Order Book
//!
//! Owns both order pools and every long-term order ever placed.

use std::collections::BTreeMap;

use crate::errors::{TwammError, TwammResult};
use crate::state::OrderPool;
use crate::types::{AccountId, Direction, LongTermOrder, OrderStatus};

/// Long-term orders and the per-direction pools aggregating them
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBook {
    /// Expiries fall on multiples of this many blocks
    pub block_interval: u64,
    pub a_to_b: OrderPool,
    pub b_to_a: OrderPool,
    pub orders: BTreeMap<u64, LongTermOrder>,
    pub next_order_id: u64,
}

impl OrderBook {
    pub fn new(block_interval: u64) -> Self {
        Self {
            block_interval,
            a_to_b: OrderPool::default(),
            b_to_a: OrderPool::default(),
            orders: BTreeMap::new(),
            next_order_id: 0,
        }
    }

    pub fn pool(&self, direction: Direction) -> &OrderPool {
        match direction {
            Direction::AToB => &self.a_to_b,
            Direction::BToA => &self.b_to_a,
        }
    }

    pub fn pool_mut(&mut self, direction: Direction) -> &mut OrderPool {
        match direction {
            Direction::AToB => &mut self.a_to_b,
            Direction::BToA => &mut self.b_to_a,
        }
    }

    /// Record a new order selling `sale_rate` per block until `expiry_block`.
    ///
    /// `expiry_block` must be a multiple of the block interval strictly after
    /// `current_block`.
    pub fn place_order(
        &mut self,
        owner: &AccountId,
        direction: Direction,
        sale_rate: u128,
        expiry_block: u64,
        current_block: u64,
    ) -> TwammResult<u64> {
        if expiry_block <= current_block || expiry_block % self.block_interval != 0 {
            return Err(TwammError::InvalidExpiry(expiry_block));
        }
        if sale_rate == 0 {
            return Err(TwammError::InvalidAmount);
        }

        let pool = self.pool_mut(direction);
        pool.place(sale_rate, expiry_block)?;
        let reward_factor_at_start = pool.reward_factor;

        let id = self.next_order_id;
        self.next_order_id = id.checked_add(1).ok_or(TwammError::ArithmeticOverflow)?;
        self.orders.insert(
            id,
            LongTermOrder {
                id,
                owner: owner.clone(),
                direction,
                sale_rate,
                start_block: current_block,
                expiry_block,
                reward_factor_at_start,
                proceeds_withdrawn: 0,
                status: OrderStatus::Active,
            },
        );
        Ok(id)
    }

    /// Apply scheduled rate decreases up to `block` in both directions
    pub fn consume_expiries(&mut self, block: u64) -> TwammResult<()> {
        self.a_to_b.consume_expiries(block)?;
        self.b_to_a.consume_expiries(block)
    }

    /// Remove a still-scheduled rate, used when an order is cancelled
    pub fn remove_rate(&mut self, direction: Direction, sale_rate: u128, expiry_block: u64) -> TwammResult<()> {
        self.pool_mut(direction).remove_rate(sale_rate, expiry_block)
    }

    /// Earliest expiry after `block` across both directions
    pub fn next_expiry_after(&self, block: u64) -> Option<u64> {
        match (self.a_to_b.next_expiry_after(block), self.b_to_a.next_expiry_after(block)) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn order(&self, id: u64) -> TwammResult<&LongTermOrder> {
        self.orders.get(&id).ok_or(TwammError::OrderNotFound(id))
    }

    pub fn order_mut(&mut self, id: u64) -> TwammResult<&mut LongTermOrder> {
        self.orders.get_mut(&id).ok_or(TwammError::OrderNotFound(id))
    }

    /// Sale rates ending at `block` as (A→B, B→A)
    pub fn sales_rate_ending_at(&self, block: u64) -> (u128, u128) {
        (
            self.a_to_b.sales_rate_ending_at(block),
            self.b_to_a.sales_rate_ending_at(block),
        )
    }

    /// Orders placed by `owner`
    pub fn orders_of<'a>(&'a self, owner: &'a AccountId) -> impl Iterator<Item = &'a LongTermOrder> + 'a {
        self.orders.values().filter(move |order| &order.owner == owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_order_validation() {
        let mut book = OrderBook::new(10);
        let alice = AccountId::from("alice");

        assert_eq!(
            book.place_order(&alice, Direction::AToB, 5, 15, 0),
            Err(TwammError::InvalidExpiry(15))
        );
        assert_eq!(
            book.place_order(&alice, Direction::AToB, 5, 10, 10),
            Err(TwammError::InvalidExpiry(10))
        );
        assert_eq!(
            book.place_order(&alice, Direction::AToB, 0, 20, 10),
            Err(TwammError::InvalidAmount)
        );

        let id = book.place_order(&alice, Direction::AToB, 5, 20, 10).unwrap();
        assert_eq!(id, 0);
        assert_eq!(book.next_order_id, 1);
        assert_eq!(book.pool(Direction::AToB).current_sale_rate, 5);
        assert_eq!(book.order(id).unwrap().status, OrderStatus::Active);
        assert_eq!(book.order(7), Err(TwammError::OrderNotFound(7)));
    }

    #[test]
    fn test_next_expiry_across_directions() {
        let mut book = OrderBook::new(10);
        let alice = AccountId::from("alice");
        book.place_order(&alice, Direction::AToB, 1, 50, 0).unwrap();
        book.place_order(&alice, Direction::BToA, 1, 30, 0).unwrap();

        assert_eq!(book.next_expiry_after(0), Some(30));
        assert_eq!(book.next_expiry_after(30), Some(50));
        assert_eq!(book.sales_rate_ending_at(30), (0, 1));

        book.consume_expiries(30).unwrap();
        assert_eq!(book.pool(Direction::BToA).current_sale_rate, 0);
        assert_eq!(book.orders_of(&alice).count(), 2);
    }
}
