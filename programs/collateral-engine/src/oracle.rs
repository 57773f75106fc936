//! Price oracle adapter
//!
//! Wraps per-asset price feeds reporting 8-decimal USD prices in
//! round-data form. A read older than the freshness window makes the
//! asset unusable rather than letting the engine act on untrusted data.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{program_error::ProgramError, pubkey::Pubkey};

use crate::{
    constants::{FEED_PRECISION_ADJUSTMENT, MAX_PRICE_AGE, PRECISION},
    error::EngineError,
    math::mul_div_floor,
};

/// One round of price data as published by a feed
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRound {
    /// Round sequence number
    pub round_id: u64,

    /// USD price with 8 fractional decimals
    pub price: i64,

    /// When the round was opened
    pub started_at: i64,

    /// When the answer was last updated
    pub updated_at: i64,

    /// Round the answer was computed in
    pub answered_in_round: u64,
}

impl PriceRound {
    /// Reject stale or unusable price data
    ///
    /// Freshness is judged on `updated_at` only; `started_at` and
    /// `answered_in_round` are carried for wire fidelity.
    pub fn validate(&self, now: i64) -> Result<(), ProgramError> {
        if now.saturating_sub(self.updated_at) > MAX_PRICE_AGE {
            return Err(EngineError::StalePriceData.into());
        }
        if self.price <= 0 {
            return Err(EngineError::InvalidPrice.into());
        }
        Ok(())
    }

    /// Price lifted from 8 to 18 decimals
    fn scaled_price(&self) -> u128 {
        self.price as u128 * FEED_PRECISION_ADJUSTMENT
    }

    /// USD value (18 decimals) of an asset amount (18 decimals)
    pub fn usd_value(&self, amount: u128) -> Result<u128, ProgramError> {
        mul_div_floor(self.scaled_price(), amount, PRECISION)
    }

    /// Asset amount (18 decimals) worth a USD value (18 decimals)
    ///
    /// Inverse of `usd_value` up to integer truncation; both round toward
    /// zero, in the collateral-favoring direction.
    pub fn amount_from_usd(&self, usd_value: u128) -> Result<u128, ProgramError> {
        mul_div_floor(usd_value, PRECISION, self.scaled_price())
    }
}

/// Read seam for per-asset price feeds
pub trait PriceSource {
    /// Latest round published on the given feed
    fn latest_round(&self, feed: &Pubkey) -> Result<PriceRound, ProgramError>;
}

/// Fetch and validate the latest round for a feed
pub fn checked_round<O: PriceSource>(
    oracle: &O,
    feed: &Pubkey,
    now: i64,
) -> Result<PriceRound, ProgramError> {
    let round = oracle.latest_round(feed)?;
    round.validate(now)?;
    Ok(round)
}
