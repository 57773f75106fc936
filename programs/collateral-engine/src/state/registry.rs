//! Collateral registry
//!
//! The configuration-time table of allowed collateral assets and their
//! price feeds. Built once at initialization and never mutated afterwards;
//! a lookup miss is an explicit error, never a default.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{program_error::ProgramError, pubkey::Pubkey};

use crate::error::EngineError;

/// One approved collateral asset and its oracle binding
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct CollateralAssetConfig {
    /// Collateral token mint
    pub mint: Pubkey,

    /// Price feed publishing the asset's USD price
    pub price_feed: Pubkey,
}

/// Immutable table of approved collateral assets
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct CollateralRegistry {
    assets: Vec<CollateralAssetConfig>,
}

impl CollateralRegistry {
    /// Build the registry from parallel mint / feed lists
    ///
    /// The lists must be equal length and free of duplicate mints, so that
    /// every configured asset has exactly one oracle.
    pub fn from_parallel_lists(
        mints: Vec<Pubkey>,
        price_feeds: Vec<Pubkey>,
    ) -> Result<Self, ProgramError> {
        if mints.len() != price_feeds.len() {
            return Err(EngineError::FeedConfigMismatch.into());
        }
        let assets: Vec<CollateralAssetConfig> = mints
            .into_iter()
            .zip(price_feeds)
            .map(|(mint, price_feed)| CollateralAssetConfig { mint, price_feed })
            .collect();
        for (i, config) in assets.iter().enumerate() {
            if assets[..i].iter().any(|c| c.mint == config.mint) {
                return Err(EngineError::FeedConfigMismatch.into());
            }
        }
        Ok(Self { assets })
    }

    /// Configuration for a collateral mint
    pub fn config_of(&self, mint: &Pubkey) -> Result<&CollateralAssetConfig, ProgramError> {
        self.assets
            .iter()
            .find(|c| c.mint == *mint)
            .ok_or_else(|| EngineError::UnsupportedCollateral.into())
    }

    /// Price feed bound to a collateral mint
    pub fn feed_of(&self, mint: &Pubkey) -> Result<Pubkey, ProgramError> {
        Ok(self.config_of(mint)?.price_feed)
    }

    /// Whether a mint is an approved collateral
    pub fn contains(&self, mint: &Pubkey) -> bool {
        self.assets.iter().any(|c| c.mint == *mint)
    }

    /// All configured assets
    pub fn assets(&self) -> &[CollateralAssetConfig] {
        &self.assets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallel_lists() {
        let mints = vec![Pubkey::new_unique(), Pubkey::new_unique()];
        let feeds = vec![Pubkey::new_unique(), Pubkey::new_unique()];
        let registry =
            CollateralRegistry::from_parallel_lists(mints.clone(), feeds.clone()).unwrap();

        assert_eq!(registry.assets().len(), 2);
        assert_eq!(registry.feed_of(&mints[0]).unwrap(), feeds[0]);
        assert_eq!(registry.feed_of(&mints[1]).unwrap(), feeds[1]);
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let result = CollateralRegistry::from_parallel_lists(
            vec![Pubkey::new_unique()],
            vec![Pubkey::new_unique(), Pubkey::new_unique()],
        );
        assert_eq!(result.unwrap_err(), EngineError::FeedConfigMismatch.into());
    }

    #[test]
    fn test_duplicate_mint_rejected() {
        let mint = Pubkey::new_unique();
        let result = CollateralRegistry::from_parallel_lists(
            vec![mint, mint],
            vec![Pubkey::new_unique(), Pubkey::new_unique()],
        );
        assert_eq!(result.unwrap_err(), EngineError::FeedConfigMismatch.into());
    }

    #[test]
    fn test_lookup_miss_is_explicit() {
        let registry = CollateralRegistry::from_parallel_lists(
            vec![Pubkey::new_unique()],
            vec![Pubkey::new_unique()],
        )
        .unwrap();
        assert_eq!(
            registry.config_of(&Pubkey::new_unique()).unwrap_err(),
            EngineError::UnsupportedCollateral.into()
        );
        assert!(!registry.contains(&Pubkey::new_unique()));
    }
}
