//! Global constants for the collateral engine
//!
//! Central location for the fixed-point scalars and protocol parameters.

/// Fixed-point scale for USD values and health factors (18 decimals)
pub const PRECISION: u128 = 1_000_000_000_000_000_000;

/// Price feeds report 8 decimals; this lifts them to 18
pub const FEED_PRECISION_ADJUSTMENT: u128 = 10_000_000_000;

/// Share of collateral value that counts toward solvency (50%)
pub const LIQUIDATION_THRESHOLD: u128 = 50;

/// Denominator for the liquidation threshold and bonus
pub const LIQUIDATION_PRECISION: u128 = 100;

/// Extra collateral paid to a liquidator, as a share of the covered debt (10%)
pub const LIQUIDATION_BONUS: u128 = 10;

/// A position at or above this health factor is safe (1.0 at 18 decimals)
pub const MIN_HEALTH_FACTOR: u128 = PRECISION;

/// Maximum age of a price round before it is unusable (3 hours)
pub const MAX_PRICE_AGE: i64 = 3 * 60 * 60;

/// Seed for the engine authority PDA that signs token CPIs
pub const ENGINE_AUTHORITY_SEED: &[u8] = b"engine_authority";

/// Allocation for the engine state account
pub const ENGINE_STATE_SPACE: usize = 10_240;
