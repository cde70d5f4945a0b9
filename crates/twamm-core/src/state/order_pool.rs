//! # Order Pool
//!
//! Aggregate of all long-term orders selling in one direction. Individual
//! orders are never touched during execution: the pool tracks the summed
//! sale rate, when each part of it ends, and a cumulative reward factor from
//! which any order's share of the proceeds can be derived.

use std::collections::BTreeMap;
use std::ops::Bound;

use ethnum::U256;

use crate::constants::Q64_RESOLUTION;
use crate::errors::{TwammError, TwammResult};
use crate::math::big_int::{add_u256, div_u256, widen, Rounding};
use crate::math::safe_math::{safe_add_u128, safe_sub_u128};

/// Sale rate bookkeeping and proceeds accumulator for one direction
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderPool {
    /// Sum of the sale rates of active orders, units per block
    pub current_sale_rate: u128,
    /// Cumulative proceeds per unit of sale rate, Q64.64
    pub reward_factor: U256,
    /// Rate to subtract at each expiry block; entries are removed once consumed
    pub expiry_rate_decrease: BTreeMap<u64, u128>,
    /// Reward factor as of each consumed expiry block
    pub reward_factor_at_expiry: BTreeMap<u64, U256>,
}

impl OrderPool {
    /// Add a new order's rate and schedule its removal at `expiry_block`
    pub fn place(&mut self, sale_rate: u128, expiry_block: u64) -> TwammResult<()> {
        self.current_sale_rate = safe_add_u128(self.current_sale_rate, sale_rate)?;
        let scheduled = self.expiry_rate_decrease.entry(expiry_block).or_default();
        *scheduled = safe_add_u128(*scheduled, sale_rate)?;
        Ok(())
    }

    /// Withdraw a still-scheduled rate immediately
    pub fn remove_rate(&mut self, sale_rate: u128, expiry_block: u64) -> TwammResult<()> {
        let scheduled = self
            .expiry_rate_decrease
            .get_mut(&expiry_block)
            .ok_or(TwammError::InvalidExpiry(expiry_block))?;
        *scheduled = safe_sub_u128(*scheduled, sale_rate)?;
        if *scheduled == 0 {
            self.expiry_rate_decrease.remove(&expiry_block);
        }
        self.current_sale_rate = safe_sub_u128(self.current_sale_rate, sale_rate)?;
        Ok(())
    }

    /// Credit `proceeds` to the orders currently selling.
    /// Nothing is credited when no order is selling. A segment whose whole
    /// flow is consumed by the fee is donated to the reserves and credits nothing.
    pub fn distribute_proceeds(&mut self, proceeds: u128) -> TwammResult<()> {
        if self.current_sale_rate == 0 || proceeds == 0 {
            return Ok(());
        }
        let increment = div_u256(
            widen(proceeds) << Q64_RESOLUTION,
            widen(self.current_sale_rate),
            Rounding::Down,
        )?;
        self.reward_factor = add_u256(self.reward_factor, increment)?;
        Ok(())
    }

    /// Apply every scheduled decrease with an expiry at or before `block`,
    /// snapshotting the reward factor for each
    pub fn consume_expiries(&mut self, block: u64) -> TwammResult<()> {
        while let Some((&expiry, &decrease)) = self.expiry_rate_decrease.first_key_value() {
            if expiry > block {
                break;
            }
            self.current_sale_rate = safe_sub_u128(self.current_sale_rate, decrease)?;
            self.reward_factor_at_expiry.insert(expiry, self.reward_factor);
            self.expiry_rate_decrease.remove(&expiry);
        }
        Ok(())
    }

    /// First scheduled expiry strictly after `block`
    pub fn next_expiry_after(&self, block: u64) -> Option<u64> {
        self.expiry_rate_decrease
            .range((Bound::Excluded(block), Bound::Unbounded))
            .next()
            .map(|(&expiry, _)| expiry)
    }

    /// Reward factor snapshotted when `expiry_block` was consumed
    pub fn reward_factor_at(&self, expiry_block: u64) -> Option<U256> {
        self.reward_factor_at_expiry.get(&expiry_block).copied()
    }

    /// Rate scheduled to end at `block`
    pub fn sales_rate_ending_at(&self, block: u64) -> u128 {
        self.expiry_rate_decrease.get(&block).copied().unwrap_or(0)
    }
}
