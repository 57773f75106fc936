//! Error types for the collateral engine

use num_derive::FromPrimitive;
use solana_program::{
    decode_error::DecodeError,
    msg,
    program_error::{PrintProgramError, ProgramError},
};
use thiserror::Error;

/// Custom error type for the collateral engine
#[derive(Clone, Debug, Eq, Error, FromPrimitive, PartialEq)]
pub enum EngineError {
    #[error("Invalid instruction")]
    InvalidInstruction = 7000,

    #[error("Account already initialized")]
    AccountAlreadyInitialized = 7001,

    #[error("Account not initialized")]
    AccountNotInitialized = 7002,

    #[error("Invalid authority")]
    InvalidAuthority = 7003,

    // Validation errors (7010-7019)
    #[error("Amount must be greater than zero")]
    AmountMustBePositive = 7010,

    #[error("Asset is not a configured collateral")]
    UnsupportedCollateral = 7011,

    #[error("Collateral and price feed lists must match")]
    FeedConfigMismatch = 7012,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow = 7013,

    #[error("Arithmetic underflow")]
    ArithmeticUnderflow = 7014,

    #[error("Division by zero")]
    DivisionByZero = 7015,

    // State and invariant errors (7020-7029)
    #[error("Redeem amount exceeds deposited balance")]
    RedeemExceedsDeposited = 7020,

    #[error("Health factor below minimum")]
    HealthFactorBroken = 7021,

    #[error("Health factor above liquidation threshold")]
    HealthFactorAboveThreshold = 7022,

    #[error("Liquidation did not restore solvency")]
    HealthFactorNotImproved = 7023,

    // Interaction errors (7030-7039)
    #[error("Collateral transfer failed")]
    CollateralTransferFailed = 7030,

    #[error("Stable unit mint failed")]
    MintFailed = 7031,

    #[error("Stable unit transfer failed")]
    StableTransferFailed = 7032,

    // Data freshness errors (7040-7049)
    #[error("Stale price data")]
    StalePriceData = 7040,

    #[error("Invalid price reading")]
    InvalidPrice = 7041,

    #[error("Price feed account not provided")]
    UnknownPriceFeed = 7042,

    // Concurrency and plumbing errors (7050-7059)
    #[error("Reentrant call rejected")]
    ReentrantCall = 7050,

    #[error("Invalid token account")]
    InvalidTokenAccount = 7051,

    #[error("Amount exceeds token precision")]
    AmountTooLarge = 7052,
}

impl PrintProgramError for EngineError {
    fn print<E>(&self)
    where
        E: 'static + std::error::Error + DecodeError<E> + PrintProgramError + num_traits::FromPrimitive,
    {
        msg!("Collateral Engine Error: {}", self);
    }
}

impl From<EngineError> for ProgramError {
    fn from(e: EngineError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for EngineError {
    fn type_of() -> &'static str {
        "EngineError"
    }
}
