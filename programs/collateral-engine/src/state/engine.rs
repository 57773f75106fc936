//! Engine account state
//!
//! The engine state account exclusively owns all position bookkeeping.
//! The stable unit's supply and holder balances live with the token
//! program and are only reached through the gateway capability.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{program_error::ProgramError, pubkey::Pubkey};

use crate::{
    error::EngineError,
    health::health_factor,
    oracle::{checked_round, PriceSource},
    state::{CollateralRegistry, Position},
};

/// Engine state discriminator, "COLLENGN"
pub const ENGINE_STATE_DISCRIMINATOR: [u8; 8] = [67, 79, 76, 76, 69, 78, 71, 78];

/// Running operation counters
///
/// Kept inside the ledger so the transaction boundary rolls them back with
/// the balances; failed operations never count.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub total_deposits: u64,
    pub total_redemptions: u64,
    pub total_mints: u64,
    pub total_burns: u64,
    pub total_liquidations: u64,
}

/// Balance state mutated by the public operations
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    /// Per-user positions, created lazily on first touch
    pub positions: BTreeMap<Pubkey, Position>,

    /// Operation counters
    pub stats: EngineStats,
}

/// Main engine account
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct EngineState {
    /// Discriminator
    pub discriminator: [u8; 8],

    /// PDA authorized to move engine vaults and mint/burn the stable unit.
    /// Granted at initialization and never reassigned.
    pub authority: Pubkey,

    /// Bump seed of the authority PDA
    pub authority_bump: u8,

    /// Mint of the USD-pegged stable unit
    pub stable_mint: Pubkey,

    /// Approved collateral assets and their feeds, immutable
    pub registry: CollateralRegistry,

    /// All balance state
    pub ledger: Ledger,

    /// Reentrancy guard: set while a public operation is in flight
    pub entered: bool,
}

impl EngineState {
    /// Create the engine state from its initialization parameters
    pub fn new(
        authority: Pubkey,
        authority_bump: u8,
        stable_mint: Pubkey,
        collateral_mints: Vec<Pubkey>,
        price_feeds: Vec<Pubkey>,
    ) -> Result<Self, ProgramError> {
        Ok(Self {
            discriminator: ENGINE_STATE_DISCRIMINATOR,
            authority,
            authority_bump,
            stable_mint,
            registry: CollateralRegistry::from_parallel_lists(collateral_mints, price_feeds)?,
            ledger: Ledger::default(),
            entered: false,
        })
    }

    /// Validate the account discriminator
    pub fn validate(&self) -> Result<(), ProgramError> {
        if self.discriminator != ENGINE_STATE_DISCRIMINATOR {
            return Err(EngineError::AccountNotInitialized.into());
        }
        Ok(())
    }

    /// Position of a user, or the zero position if they have none
    pub fn position_of(&self, user: &Pubkey) -> Position {
        self.ledger.positions.get(user).cloned().unwrap_or_default()
    }

    pub(crate) fn position_mut(&mut self, user: &Pubkey) -> &mut Position {
        self.ledger.positions.entry(*user).or_default()
    }

    /// Deposited amount of one asset for a user
    pub fn deposited(&self, user: &Pubkey, asset: &Pubkey) -> u128 {
        self.ledger
            .positions
            .get(user)
            .map(|p| p.deposited(asset))
            .unwrap_or(0)
    }

    /// Minted debt of a user
    pub fn debt_of(&self, user: &Pubkey) -> u128 {
        self.ledger.positions.get(user).map(|p| p.debt).unwrap_or(0)
    }

    /// USD value (18 decimals) of everything a user has deposited
    ///
    /// Reads every feed backing the user's collateral; one stale feed
    /// makes the whole valuation, and so the caller's operation, fail.
    pub fn collateral_usd_value<O: PriceSource>(
        &self,
        user: &Pubkey,
        oracle: &O,
        now: i64,
    ) -> Result<u128, ProgramError> {
        let mut total: u128 = 0;
        if let Some(position) = self.ledger.positions.get(user) {
            for (asset, amount) in &position.collateral {
                let round = checked_round(oracle, &self.registry.feed_of(asset)?, now)?;
                let value = round.usd_value(*amount)?;
                total = total
                    .checked_add(value)
                    .ok_or(EngineError::ArithmeticOverflow)?;
            }
        }
        Ok(total)
    }

    /// (debt, collateral USD value) pair for a user
    pub fn account_information<O: PriceSource>(
        &self,
        user: &Pubkey,
        oracle: &O,
        now: i64,
    ) -> Result<(u128, u128), ProgramError> {
        Ok((
            self.debt_of(user),
            self.collateral_usd_value(user, oracle, now)?,
        ))
    }

    /// Health factor of a user's position
    pub fn health_factor_of<O: PriceSource>(
        &self,
        user: &Pubkey,
        oracle: &O,
        now: i64,
    ) -> Result<u128, ProgramError> {
        let (debt, collateral_usd) = self.account_information(user, oracle, now)?;
        Ok(health_factor(debt, collateral_usd))
    }

    /// USD value of an amount of one collateral asset
    pub fn usd_value_of<O: PriceSource>(
        &self,
        asset: &Pubkey,
        amount: u128,
        oracle: &O,
        now: i64,
    ) -> Result<u128, ProgramError> {
        let round = checked_round(oracle, &self.registry.feed_of(asset)?, now)?;
        round.usd_value(amount)
    }

    /// Collateral amount of one asset worth a USD value
    pub fn collateral_amount_from_usd<O: PriceSource>(
        &self,
        asset: &Pubkey,
        usd_value: u128,
        oracle: &O,
        now: i64,
    ) -> Result<u128, ProgramError> {
        let round = checked_round(oracle, &self.registry.feed_of(asset)?, now)?;
        round.amount_from_usd(usd_value)
    }

    /// Operation counters
    pub fn stats(&self) -> &EngineStats {
        &self.ledger.stats
    }
}
