//! # Pool Configuration
//!
//! Construction-time parameters of a pool. `block_interval` is fixed for the
//! lifetime of the pool; the fee can later be changed by the owner.

use crate::constants::{
    DEFAULT_BLOCK_INTERVAL, DEFAULT_FEE_BPS, DEFAULT_LIQUIDITY_TOLERANCE_BPS, MAX_FEE_BPS,
};
use crate::errors::{TwammError, TwammResult};
use crate::types::AccountId;

/// Parameters a pool is created with
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "client", serde(default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Expiry blocks are multiples of this interval
    pub block_interval: u64,
    /// Trading fee in basis points, charged on swaps and long-term flow
    pub fee_bps: u16,
    /// Unused deposit allowed on either side of `add_liquidity`, in basis points
    pub liquidity_tolerance_bps: u16,
    /// Account allowed to change the fee and pause new orders
    pub owner: AccountId,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            block_interval: DEFAULT_BLOCK_INTERVAL,
            fee_bps: DEFAULT_FEE_BPS,
            liquidity_tolerance_bps: DEFAULT_LIQUIDITY_TOLERANCE_BPS,
            owner: AccountId::from("owner"),
        }
    }
}

impl PoolConfig {
    /// Default parameters owned by `owner`
    pub fn new(owner: impl Into<AccountId>) -> Self {
        Self {
            owner: owner.into(),
            ..Self::default()
        }
    }

    pub fn with_block_interval(mut self, block_interval: u64) -> Self {
        self.block_interval = block_interval;
        self
    }

    pub fn with_fee_bps(mut self, fee_bps: u16) -> Self {
        self.fee_bps = fee_bps;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> TwammResult<()> {
        if self.block_interval == 0 {
            return Err(TwammError::invalid_parameter("block_interval must be greater than 0"));
        }
        validate_fee(self.fee_bps)?;
        if self.liquidity_tolerance_bps > MAX_FEE_BPS {
            return Err(TwammError::invalid_parameter(format!(
                "liquidity_tolerance_bps {} must be below 10000",
                self.liquidity_tolerance_bps
            )));
        }
        if self.owner.as_str().is_empty() {
            return Err(TwammError::invalid_parameter("owner must not be empty"));
        }
        Ok(())
    }
}

/// Fees must stay below 100%
pub fn validate_fee(fee_bps: u16) -> TwammResult<()> {
    if fee_bps > MAX_FEE_BPS {
        return Err(TwammError::invalid_parameter(format!(
            "fee_bps {} must be below 10000",
            fee_bps
        )));
    }
    Ok(())
}
