//! # Protocol Constants
//!
//! Fundamental constants for the TWAMM pool including:
//! - Fixed-point scale factors
//! - Fee parameters
//! - Reserve and liquidity bounds
//! - Closed-form solver limits

// ============================================================================
// Mathematical Constants
// ============================================================================

/// Q64 fixed-point scale factor: 2^64
pub const Q64: u128 = 1u128 << 64;

/// Fractional bits of the Q64.64 format
pub const Q64_RESOLUTION: u32 = 64;

/// ln(2) in Q64.64
pub const LN2_Q64: u128 = 12_786_308_645_202_655_659;

/// Largest exponent (Q64.64) evaluated by the closed-form solver.
/// Beyond e^40 the hyperbolic ratio equals 1 to within 2^-57.
pub const MAX_EXP_INPUT_Q64: u128 = 40 * Q64;

// ============================================================================
// Fee Structure Constants
// ============================================================================

/// Basis points denominator (10,000 = 100%)
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Default trading fee (0.3%)
pub const DEFAULT_FEE_BPS: u16 = 30;

/// Fees must leave a nonzero effective input
pub const MAX_FEE_BPS: u16 = 9_999;

/// Default tolerance for unused liquidity deposits (0.1%)
pub const DEFAULT_LIQUIDITY_TOLERANCE_BPS: u16 = 10;

// ============================================================================
// Reserve and Liquidity Constants
// ============================================================================

/// Token balances held by the pool are bounded to 112 bits
pub const MAX_RESERVE: u128 = (1u128 << 112) - 1;

/// Shares permanently locked at initialization so reserves never drain to zero
pub const MINIMUM_LIQUIDITY: u128 = 1_000;

// ============================================================================
// Order Book Constants
// ============================================================================

/// Default number of blocks per order interval
pub const DEFAULT_BLOCK_INTERVAL: u64 = 10;

/// Upper bound on intervals for a single long-term order
pub const MAX_ORDER_INTERVALS: u64 = 1_000_000;
