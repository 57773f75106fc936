//! Event logging
//!
//! Structured events for off-chain indexing, logged as bs58-encoded borsh
//! payloads.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{msg, pubkey::Pubkey};

/// Event type discriminator
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq)]
pub enum EventType {
    CollateralDeposited = 1,
    CollateralRedeemed = 2,
}

/// Base event trait
pub trait Event: BorshSerialize {
    fn event_type() -> EventType;

    fn emit(&self) {
        msg!("COLLATERAL_ENGINE_EVENT");
        msg!("TYPE:{:?}", Self::event_type());

        if let Ok(data) = self.try_to_vec() {
            msg!("DATA:{}", bs58::encode(&data).into_string());
        }
    }
}

/// Collateral entered a position
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct CollateralDeposited {
    pub user: Pubkey,
    pub asset: Pubkey,
    pub amount: u128,
}

impl Event for CollateralDeposited {
    fn event_type() -> EventType {
        EventType::CollateralDeposited
    }
}

/// Collateral left a position
///
/// Fires identically for user redemption (`redeemed_from == redeemed_to`)
/// and liquidation seizure (`redeemed_from` is the target, `redeemed_to`
/// the liquidator).
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct CollateralRedeemed {
    pub redeemed_from: Pubkey,
    pub redeemed_to: Pubkey,
    pub asset: Pubkey,
    pub amount: u128,
}

impl Event for CollateralRedeemed {
    fn event_type() -> EventType {
        EventType::CollateralRedeemed
    }
}
