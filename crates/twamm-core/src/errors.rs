//! # Core Error Types
//!
//! Every entry point of the pool reports failures through [`TwammError`].
//! Errors are detected synchronously and the failing call leaves no trace
//! in pool state.

use thiserror::Error;

use crate::ledger::LedgerError;

/// Errors raised by the reserve pool, order book, engine and lifecycle manager
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum TwammError {
    // ========================================================================
    // Math Errors
    // ========================================================================

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    // ========================================================================
    // Validation Errors
    // ========================================================================

    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Invalid expiry block: {0}")]
    InvalidExpiry(u64),

    #[error("Invalid block {requested}: current block is {current}")]
    InvalidBlock { requested: u64, current: u64 },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Reserve limit exceeded")]
    ReserveLimitExceeded,

    // ========================================================================
    // Trading and Liquidity Errors
    // ========================================================================

    #[error("Slippage exceeded: output {actual} below minimum {minimum}")]
    SlippageExceeded { actual: u128, minimum: u128 },

    #[error("Insufficient liquidity")]
    InsufficientLiquidity,

    #[error("Pool not initialized")]
    PoolNotInitialized,

    #[error("Liquidity has already been provided")]
    AlreadyInitialized,

    // ========================================================================
    // Order Errors
    // ========================================================================

    #[error("Order {0} not found")]
    OrderNotFound(u64),

    #[error("Order {0} is not active")]
    OrderNotActive(u64),

    #[error("New long-term orders are paused")]
    NewOrdersPaused,

    // ========================================================================
    // Account and Authorization Errors
    // ========================================================================

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Token transfer failed: {0}")]
    Ledger(#[from] LedgerError),
}

/// Result type using core errors
pub type TwammResult<T> = Result<T, TwammError>;

impl TwammError {
    /// Create an invalid parameter error with reason
    pub fn invalid_parameter(reason: impl Into<String>) -> Self {
        Self::InvalidParameter(reason.into())
    }
}
