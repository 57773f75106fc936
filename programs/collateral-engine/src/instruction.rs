//! Instruction definitions for the collateral engine

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program, sysvar,
};

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub enum EngineInstruction {
    /// Initialize the engine state
    /// Accounts:
    /// 0. `[signer]` Payer / deployer
    /// 1. `[writable, signer]` Engine state account (created here)
    /// 2. `[]` System program
    /// 3. `[]` Rent sysvar
    Initialize {
        collateral_mints: Vec<Pubkey>,
        price_feeds: Vec<Pubkey>,
        stable_mint: Pubkey,
    },

    /// Deposit collateral into the caller's position
    /// Accounts:
    /// 0. `[signer]` User
    /// 1. `[writable]` Engine state account
    /// 2. `[writable]` User collateral token account
    /// 3. `[writable]` Engine collateral vault token account
    /// 4. `[]` Engine authority PDA
    /// 5. `[]` Token program
    DepositCollateral { asset: Pubkey, amount: u128 },

    /// Deposit collateral and mint debt atomically
    /// Accounts:
    /// 0. `[signer]` User
    /// 1. `[writable]` Engine state account
    /// 2. `[writable]` User collateral token account
    /// 3. `[writable]` Engine collateral vault token account
    /// 4. `[writable]` Stable mint
    /// 5. `[writable]` User stable token account
    /// 6. `[]` Engine authority PDA
    /// 7. `[]` Token program
    /// 8.. `[]` Price feed accounts for the user's collateral assets
    DepositAndMint {
        asset: Pubkey,
        collateral_amount: u128,
        debt_amount: u128,
    },

    /// Withdraw collateral from the caller's position
    /// Accounts:
    /// 0. `[signer]` User
    /// 1. `[writable]` Engine state account
    /// 2. `[writable]` Engine collateral vault token account
    /// 3. `[writable]` User collateral token account
    /// 4. `[]` Engine authority PDA
    /// 5. `[]` Token program
    /// 6.. `[]` Price feed accounts for the user's collateral assets
    RedeemCollateral { asset: Pubkey, amount: u128 },

    /// Burn debt and withdraw collateral atomically
    /// Accounts:
    /// 0. `[signer]` User
    /// 1. `[writable]` Engine state account
    /// 2. `[writable]` Stable mint
    /// 3. `[writable]` User stable token account
    /// 4. `[writable]` Engine stable token account
    /// 5. `[writable]` Engine collateral vault token account
    /// 6. `[writable]` User collateral token account
    /// 7. `[]` Engine authority PDA
    /// 8. `[]` Token program
    /// 9.. `[]` Price feed accounts for the user's collateral assets
    RedeemForBurn {
        asset: Pubkey,
        collateral_amount: u128,
        debt_amount: u128,
    },

    /// Mint stable units against deposited collateral
    /// Accounts:
    /// 0. `[signer]` User
    /// 1. `[writable]` Engine state account
    /// 2. `[writable]` Stable mint
    /// 3. `[writable]` User stable token account
    /// 4. `[]` Engine authority PDA
    /// 5. `[]` Token program
    /// 6.. `[]` Price feed accounts for the user's collateral assets
    MintDebt { amount: u128 },

    /// Repay minted debt
    /// Accounts:
    /// 0. `[signer]` User
    /// 1. `[writable]` Engine state account
    /// 2. `[writable]` Stable mint
    /// 3. `[writable]` User stable token account
    /// 4. `[writable]` Engine stable token account
    /// 5. `[]` Engine authority PDA
    /// 6. `[]` Token program
    /// 7.. `[]` Price feed accounts for the user's collateral assets
    BurnDebt { amount: u128 },

    /// Liquidate an under-collateralized position
    /// Accounts:
    /// 0. `[signer]` Liquidator
    /// 1. `[writable]` Engine state account
    /// 2. `[writable]` Engine collateral vault token account
    /// 3. `[writable]` Liquidator collateral token account
    /// 4. `[writable]` Stable mint
    /// 5. `[writable]` Liquidator stable token account
    /// 6. `[writable]` Engine stable token account
    /// 7. `[]` Engine authority PDA
    /// 8. `[]` Token program
    /// 9.. `[]` Price feed accounts for both parties' collateral assets
    Liquidate {
        asset: Pubkey,
        user: Pubkey,
        debt_to_cover: u128,
    },
}

impl EngineInstruction {
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (&variant, rest) = input
            .split_first()
            .ok_or(ProgramError::InvalidInstructionData)?;

        Ok(match variant {
            0 => {
                let payload = InitializePayload::try_from_slice(rest)?;
                Self::Initialize {
                    collateral_mints: payload.collateral_mints,
                    price_feeds: payload.price_feeds,
                    stable_mint: payload.stable_mint,
                }
            }
            1 => {
                let payload = AssetAmountPayload::try_from_slice(rest)?;
                Self::DepositCollateral {
                    asset: payload.asset,
                    amount: payload.amount,
                }
            }
            2 => {
                let payload = AssetPairPayload::try_from_slice(rest)?;
                Self::DepositAndMint {
                    asset: payload.asset,
                    collateral_amount: payload.collateral_amount,
                    debt_amount: payload.debt_amount,
                }
            }
            3 => {
                let payload = AssetAmountPayload::try_from_slice(rest)?;
                Self::RedeemCollateral {
                    asset: payload.asset,
                    amount: payload.amount,
                }
            }
            4 => {
                let payload = AssetPairPayload::try_from_slice(rest)?;
                Self::RedeemForBurn {
                    asset: payload.asset,
                    collateral_amount: payload.collateral_amount,
                    debt_amount: payload.debt_amount,
                }
            }
            5 => {
                let payload = AmountPayload::try_from_slice(rest)?;
                Self::MintDebt {
                    amount: payload.amount,
                }
            }
            6 => {
                let payload = AmountPayload::try_from_slice(rest)?;
                Self::BurnDebt {
                    amount: payload.amount,
                }
            }
            7 => {
                let payload = LiquidatePayload::try_from_slice(rest)?;
                Self::Liquidate {
                    asset: payload.asset,
                    user: payload.user,
                    debt_to_cover: payload.debt_to_cover,
                }
            }
            _ => return Err(ProgramError::InvalidInstructionData),
        })
    }

    pub fn pack(&self) -> Result<Vec<u8>, ProgramError> {
        match self {
            Self::Initialize {
                collateral_mints,
                price_feeds,
                stable_mint,
            } => pack_payload(
                0,
                &InitializePayload {
                    collateral_mints: collateral_mints.clone(),
                    price_feeds: price_feeds.clone(),
                    stable_mint: *stable_mint,
                },
            ),
            Self::DepositCollateral { asset, amount } => pack_payload(
                1,
                &AssetAmountPayload {
                    asset: *asset,
                    amount: *amount,
                },
            ),
            Self::DepositAndMint {
                asset,
                collateral_amount,
                debt_amount,
            } => pack_payload(
                2,
                &AssetPairPayload {
                    asset: *asset,
                    collateral_amount: *collateral_amount,
                    debt_amount: *debt_amount,
                },
            ),
            Self::RedeemCollateral { asset, amount } => pack_payload(
                3,
                &AssetAmountPayload {
                    asset: *asset,
                    amount: *amount,
                },
            ),
            Self::RedeemForBurn {
                asset,
                collateral_amount,
                debt_amount,
            } => pack_payload(
                4,
                &AssetPairPayload {
                    asset: *asset,
                    collateral_amount: *collateral_amount,
                    debt_amount: *debt_amount,
                },
            ),
            Self::MintDebt { amount } => pack_payload(5, &AmountPayload { amount: *amount }),
            Self::BurnDebt { amount } => pack_payload(6, &AmountPayload { amount: *amount }),
            Self::Liquidate {
                asset,
                user,
                debt_to_cover,
            } => pack_payload(
                7,
                &LiquidatePayload {
                    asset: *asset,
                    user: *user,
                    debt_to_cover: *debt_to_cover,
                },
            ),
        }
    }
}

fn pack_payload<T: BorshSerialize>(tag: u8, payload: &T) -> Result<Vec<u8>, ProgramError> {
    let mut data = vec![tag];
    payload
        .serialize(&mut data)
        .map_err(|_| ProgramError::InvalidInstructionData)?;
    Ok(data)
}

// Payload structs

#[derive(BorshSerialize, BorshDeserialize)]
struct InitializePayload {
    collateral_mints: Vec<Pubkey>,
    price_feeds: Vec<Pubkey>,
    stable_mint: Pubkey,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct AssetAmountPayload {
    asset: Pubkey,
    amount: u128,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct AssetPairPayload {
    asset: Pubkey,
    collateral_amount: u128,
    debt_amount: u128,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct AmountPayload {
    amount: u128,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct LiquidatePayload {
    asset: Pubkey,
    user: Pubkey,
    debt_to_cover: u128,
}

// Helper functions to create instructions

pub fn initialize(
    program_id: &Pubkey,
    payer: &Pubkey,
    state_account: &Pubkey,
    collateral_mints: Vec<Pubkey>,
    price_feeds: Vec<Pubkey>,
    stable_mint: Pubkey,
) -> Result<Instruction, ProgramError> {
    let accounts = vec![
        AccountMeta::new(*payer, true),
        AccountMeta::new(*state_account, true),
        AccountMeta::new_readonly(system_program::id(), false),
        AccountMeta::new_readonly(sysvar::rent::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: EngineInstruction::Initialize {
            collateral_mints,
            price_feeds,
            stable_mint,
        }
        .pack()?,
    })
}

pub fn deposit_collateral(
    program_id: &Pubkey,
    user: &Pubkey,
    state_account: &Pubkey,
    user_collateral: &Pubkey,
    engine_collateral: &Pubkey,
    engine_authority: &Pubkey,
    asset: Pubkey,
    amount: u128,
) -> Result<Instruction, ProgramError> {
    let accounts = vec![
        AccountMeta::new(*user, true),
        AccountMeta::new(*state_account, false),
        AccountMeta::new(*user_collateral, false),
        AccountMeta::new(*engine_collateral, false),
        AccountMeta::new_readonly(*engine_authority, false),
        AccountMeta::new_readonly(spl_token::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: EngineInstruction::DepositCollateral { asset, amount }.pack()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack_round_trip() {
        let instructions = vec![
            EngineInstruction::Initialize {
                collateral_mints: vec![Pubkey::new_unique()],
                price_feeds: vec![Pubkey::new_unique()],
                stable_mint: Pubkey::new_unique(),
            },
            EngineInstruction::DepositCollateral {
                asset: Pubkey::new_unique(),
                amount: 17,
            },
            EngineInstruction::Liquidate {
                asset: Pubkey::new_unique(),
                user: Pubkey::new_unique(),
                debt_to_cover: u128::MAX,
            },
        ];
        for ix in instructions {
            let packed = ix.pack().unwrap();
            let unpacked = EngineInstruction::unpack(&packed).unwrap();
            assert_eq!(format!("{:?}", ix), format!("{:?}", unpacked));
        }
    }

    #[test]
    fn test_unpack_rejects_garbage() {
        assert!(EngineInstruction::unpack(&[]).is_err());
        assert!(EngineInstruction::unpack(&[99]).is_err());
    }
}
