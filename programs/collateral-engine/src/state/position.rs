//! Per-user position records
//!
//! A position is the pair of per-asset deposited collateral and minted
//! debt. Records are created lazily as all-zero on first touch; a record
//! whose fields are all zero is indistinguishable from an absent one.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{program_error::ProgramError, pubkey::Pubkey};

use crate::error::EngineError;

/// Deposited collateral and minted debt of one user
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Position {
    /// Deposited amount per collateral mint
    pub collateral: BTreeMap<Pubkey, u128>,

    /// Minted stable units owed by this user
    pub debt: u128,
}

impl Position {
    /// Deposited amount for one collateral mint
    pub fn deposited(&self, asset: &Pubkey) -> u128 {
        self.collateral.get(asset).copied().unwrap_or(0)
    }

    /// Increase the deposited amount for an asset
    pub fn credit_collateral(&mut self, asset: &Pubkey, amount: u128) -> Result<(), ProgramError> {
        let balance = self.collateral.entry(*asset).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(EngineError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Decrease the deposited amount for an asset
    ///
    /// Zeroed entries are pruned so a drained position reads as vacant.
    pub fn debit_collateral(&mut self, asset: &Pubkey, amount: u128) -> Result<(), ProgramError> {
        let balance = self.deposited(asset);
        let remaining = balance
            .checked_sub(amount)
            .ok_or(EngineError::RedeemExceedsDeposited)?;
        if remaining == 0 {
            self.collateral.remove(asset);
        } else {
            self.collateral.insert(*asset, remaining);
        }
        Ok(())
    }

    /// Increase minted debt
    pub fn add_debt(&mut self, amount: u128) -> Result<(), ProgramError> {
        self.debt = self
            .debt
            .checked_add(amount)
            .ok_or(EngineError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Decrease minted debt; exceeding it is a hard underflow abort
    pub fn sub_debt(&mut self, amount: u128) -> Result<(), ProgramError> {
        self.debt = self
            .debt
            .checked_sub(amount)
            .ok_or(EngineError::ArithmeticUnderflow)?;
        Ok(())
    }

    /// Whether the record holds no balances at all
    pub fn is_vacant(&self) -> bool {
        self.debt == 0 && self.collateral.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_zero_default() {
        let position = Position::default();
        assert_eq!(position.deposited(&Pubkey::new_unique()), 0);
        assert_eq!(position.debt, 0);
        assert!(position.is_vacant());
    }

    #[test]
    fn test_credit_debit_collateral() {
        let asset = Pubkey::new_unique();
        let mut position = Position::default();

        position.credit_collateral(&asset, 100).unwrap();
        position.credit_collateral(&asset, 50).unwrap();
        assert_eq!(position.deposited(&asset), 150);

        position.debit_collateral(&asset, 120).unwrap();
        assert_eq!(position.deposited(&asset), 30);

        assert_eq!(
            position.debit_collateral(&asset, 31).unwrap_err(),
            EngineError::RedeemExceedsDeposited.into()
        );
    }

    #[test]
    fn test_drained_position_is_vacant() {
        let asset = Pubkey::new_unique();
        let mut position = Position::default();
        position.credit_collateral(&asset, 5).unwrap();
        position.debit_collateral(&asset, 5).unwrap();
        assert!(position.is_vacant());
        assert_eq!(position, Position::default());
    }

    #[test]
    fn test_debt_underflow_is_hard_abort() {
        let mut position = Position::default();
        position.add_debt(10).unwrap();
        assert_eq!(
            position.sub_debt(11).unwrap_err(),
            EngineError::ArithmeticUnderflow.into()
        );
        position.sub_debt(10).unwrap();
        assert!(position.is_vacant());
    }

    #[test]
    fn test_collateral_overflow() {
        let asset = Pubkey::new_unique();
        let mut position = Position::default();
        position.credit_collateral(&asset, u128::MAX).unwrap();
        assert_eq!(
            position.credit_collateral(&asset, 1).unwrap_err(),
            EngineError::ArithmeticOverflow.into()
        );
    }
}
