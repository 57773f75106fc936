//! Instruction processor
//!
//! Thin account-plumbing layer: verifies signers and account bindings,
//! loads the engine state, wires the token gateway and price source, and
//! dispatches into the engine operations. Any error aborts the whole
//! transaction, which is what makes every operation all-or-nothing
//! on-chain.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    clock::Clock,
    entrypoint::ProgramResult,
    msg,
    program::invoke,
    program_error::ProgramError,
    pubkey::Pubkey,
    system_instruction,
    sysvar::{rent::Rent, Sysvar},
};

use crate::{
    constants::{ENGINE_AUTHORITY_SEED, ENGINE_STATE_SPACE},
    error::EngineError,
    instruction::EngineInstruction,
    oracle::{PriceRound, PriceSource},
    state::EngineState,
    token::SplTokenGateway,
};

/// Price source backed by the feed accounts passed with the instruction
pub struct FeedPriceSource<'a, 'info> {
    accounts: &'a [AccountInfo<'info>],
}

impl PriceSource for FeedPriceSource<'_, '_> {
    fn latest_round(&self, feed: &Pubkey) -> Result<PriceRound, ProgramError> {
        let account = self
            .accounts
            .iter()
            .find(|a| a.key == feed)
            .ok_or(EngineError::UnknownPriceFeed)?;
        let data = account.data.borrow();
        PriceRound::deserialize(&mut &data[..]).map_err(|_| EngineError::InvalidPrice.into())
    }
}

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    let instruction = EngineInstruction::unpack(instruction_data)?;

    match instruction {
        EngineInstruction::Initialize {
            collateral_mints,
            price_feeds,
            stable_mint,
        } => {
            msg!("Instruction: Initialize");
            process_initialize(program_id, accounts, collateral_mints, price_feeds, stable_mint)
        }

        EngineInstruction::DepositCollateral { asset, amount } => {
            msg!("Instruction: DepositCollateral");
            process_deposit_collateral(program_id, accounts, asset, amount)
        }

        EngineInstruction::DepositAndMint {
            asset,
            collateral_amount,
            debt_amount,
        } => {
            msg!("Instruction: DepositAndMint");
            process_deposit_and_mint(program_id, accounts, asset, collateral_amount, debt_amount)
        }

        EngineInstruction::RedeemCollateral { asset, amount } => {
            msg!("Instruction: RedeemCollateral");
            process_redeem_collateral(program_id, accounts, asset, amount)
        }

        EngineInstruction::RedeemForBurn {
            asset,
            collateral_amount,
            debt_amount,
        } => {
            msg!("Instruction: RedeemForBurn");
            process_redeem_for_burn(program_id, accounts, asset, collateral_amount, debt_amount)
        }

        EngineInstruction::MintDebt { amount } => {
            msg!("Instruction: MintDebt");
            process_mint_debt(program_id, accounts, amount)
        }

        EngineInstruction::BurnDebt { amount } => {
            msg!("Instruction: BurnDebt");
            process_burn_debt(program_id, accounts, amount)
        }

        EngineInstruction::Liquidate {
            asset,
            user,
            debt_to_cover,
        } => {
            msg!("Instruction: Liquidate");
            process_liquidate(program_id, accounts, asset, user, debt_to_cover)
        }
    }
}

fn process_initialize(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    collateral_mints: Vec<Pubkey>,
    price_feeds: Vec<Pubkey>,
    stable_mint: Pubkey,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let payer_info = next_account_info(account_info_iter)?;
    let state_info = next_account_info(account_info_iter)?;
    let system_program = next_account_info(account_info_iter)?;
    let rent_sysvar = next_account_info(account_info_iter)?;

    if !payer_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }
    if !state_info.data_is_empty() {
        return Err(EngineError::AccountAlreadyInitialized.into());
    }

    let rent = &Rent::from_account_info(rent_sysvar)?;
    let required_lamports = rent.minimum_balance(ENGINE_STATE_SPACE);

    invoke(
        &system_instruction::create_account(
            payer_info.key,
            state_info.key,
            required_lamports,
            ENGINE_STATE_SPACE as u64,
            program_id,
        ),
        &[
            payer_info.clone(),
            state_info.clone(),
            system_program.clone(),
        ],
    )?;

    let (authority, authority_bump) = Pubkey::find_program_address(
        &[ENGINE_AUTHORITY_SEED, state_info.key.as_ref()],
        program_id,
    );

    let state = EngineState::new(
        authority,
        authority_bump,
        stable_mint,
        collateral_mints,
        price_feeds,
    )?;
    save_state(&state, state_info)?;

    msg!(
        "Engine initialized with {} collateral assets",
        state.registry.assets().len()
    );

    Ok(())
}

fn process_deposit_collateral(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    asset: Pubkey,
    amount: u128,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let user_info = next_account_info(account_info_iter)?;
    let state_info = next_account_info(account_info_iter)?;
    let user_collateral = next_account_info(account_info_iter)?;
    let engine_collateral = next_account_info(account_info_iter)?;
    let authority_info = next_account_info(account_info_iter)?;
    let token_program = next_account_info(account_info_iter)?;

    if !user_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let mut state = load_state(program_id, state_info)?;
    check_authority(&state, authority_info)?;

    let bump = [state.authority_bump];
    let mut gateway = SplTokenGateway {
        token_program,
        authority: authority_info,
        authority_seeds: [ENGINE_AUTHORITY_SEED, state_info.key.as_ref(), &bump],
        user: Some(user_info),
        user_collateral: Some(user_collateral),
        engine_collateral: Some(engine_collateral),
        stable_mint: None,
        user_stable: None,
        engine_stable: None,
    };

    state.deposit_collateral(&mut gateway, user_info.key, &asset, amount)?;
    save_state(&state, state_info)
}

fn process_deposit_and_mint(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    asset: Pubkey,
    collateral_amount: u128,
    debt_amount: u128,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let user_info = next_account_info(account_info_iter)?;
    let state_info = next_account_info(account_info_iter)?;
    let user_collateral = next_account_info(account_info_iter)?;
    let engine_collateral = next_account_info(account_info_iter)?;
    let stable_mint = next_account_info(account_info_iter)?;
    let user_stable = next_account_info(account_info_iter)?;
    let authority_info = next_account_info(account_info_iter)?;
    let token_program = next_account_info(account_info_iter)?;
    let feeds = account_info_iter.as_slice();

    if !user_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let mut state = load_state(program_id, state_info)?;
    check_authority(&state, authority_info)?;

    let bump = [state.authority_bump];
    let mut gateway = SplTokenGateway {
        token_program,
        authority: authority_info,
        authority_seeds: [ENGINE_AUTHORITY_SEED, state_info.key.as_ref(), &bump],
        user: Some(user_info),
        user_collateral: Some(user_collateral),
        engine_collateral: Some(engine_collateral),
        stable_mint: Some(stable_mint),
        user_stable: Some(user_stable),
        engine_stable: None,
    };
    let oracle = FeedPriceSource { accounts: feeds };
    let now = Clock::get()?.unix_timestamp;

    state.deposit_and_mint(
        &mut gateway,
        &oracle,
        now,
        user_info.key,
        &asset,
        collateral_amount,
        debt_amount,
    )?;
    save_state(&state, state_info)
}

fn process_redeem_collateral(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    asset: Pubkey,
    amount: u128,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let user_info = next_account_info(account_info_iter)?;
    let state_info = next_account_info(account_info_iter)?;
    let engine_collateral = next_account_info(account_info_iter)?;
    let user_collateral = next_account_info(account_info_iter)?;
    let authority_info = next_account_info(account_info_iter)?;
    let token_program = next_account_info(account_info_iter)?;
    let feeds = account_info_iter.as_slice();

    if !user_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let mut state = load_state(program_id, state_info)?;
    check_authority(&state, authority_info)?;

    let bump = [state.authority_bump];
    let mut gateway = SplTokenGateway {
        token_program,
        authority: authority_info,
        authority_seeds: [ENGINE_AUTHORITY_SEED, state_info.key.as_ref(), &bump],
        user: Some(user_info),
        user_collateral: Some(user_collateral),
        engine_collateral: Some(engine_collateral),
        stable_mint: None,
        user_stable: None,
        engine_stable: None,
    };
    let oracle = FeedPriceSource { accounts: feeds };
    let now = Clock::get()?.unix_timestamp;

    state.redeem_collateral(&mut gateway, &oracle, now, user_info.key, &asset, amount)?;
    save_state(&state, state_info)
}

fn process_redeem_for_burn(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    asset: Pubkey,
    collateral_amount: u128,
    debt_amount: u128,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let user_info = next_account_info(account_info_iter)?;
    let state_info = next_account_info(account_info_iter)?;
    let stable_mint = next_account_info(account_info_iter)?;
    let user_stable = next_account_info(account_info_iter)?;
    let engine_stable = next_account_info(account_info_iter)?;
    let engine_collateral = next_account_info(account_info_iter)?;
    let user_collateral = next_account_info(account_info_iter)?;
    let authority_info = next_account_info(account_info_iter)?;
    let token_program = next_account_info(account_info_iter)?;
    let feeds = account_info_iter.as_slice();

    if !user_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let mut state = load_state(program_id, state_info)?;
    check_authority(&state, authority_info)?;

    let bump = [state.authority_bump];
    let mut gateway = SplTokenGateway {
        token_program,
        authority: authority_info,
        authority_seeds: [ENGINE_AUTHORITY_SEED, state_info.key.as_ref(), &bump],
        user: Some(user_info),
        user_collateral: Some(user_collateral),
        engine_collateral: Some(engine_collateral),
        stable_mint: Some(stable_mint),
        user_stable: Some(user_stable),
        engine_stable: Some(engine_stable),
    };
    let oracle = FeedPriceSource { accounts: feeds };
    let now = Clock::get()?.unix_timestamp;

    state.redeem_for_burn(
        &mut gateway,
        &oracle,
        now,
        user_info.key,
        &asset,
        collateral_amount,
        debt_amount,
    )?;
    save_state(&state, state_info)
}

fn process_mint_debt(program_id: &Pubkey, accounts: &[AccountInfo], amount: u128) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let user_info = next_account_info(account_info_iter)?;
    let state_info = next_account_info(account_info_iter)?;
    let stable_mint = next_account_info(account_info_iter)?;
    let user_stable = next_account_info(account_info_iter)?;
    let authority_info = next_account_info(account_info_iter)?;
    let token_program = next_account_info(account_info_iter)?;
    let feeds = account_info_iter.as_slice();

    if !user_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let mut state = load_state(program_id, state_info)?;
    check_authority(&state, authority_info)?;

    let bump = [state.authority_bump];
    let mut gateway = SplTokenGateway {
        token_program,
        authority: authority_info,
        authority_seeds: [ENGINE_AUTHORITY_SEED, state_info.key.as_ref(), &bump],
        user: Some(user_info),
        user_collateral: None,
        engine_collateral: None,
        stable_mint: Some(stable_mint),
        user_stable: Some(user_stable),
        engine_stable: None,
    };
    let oracle = FeedPriceSource { accounts: feeds };
    let now = Clock::get()?.unix_timestamp;

    state.mint_debt(&mut gateway, &oracle, now, user_info.key, amount)?;
    save_state(&state, state_info)
}

fn process_burn_debt(program_id: &Pubkey, accounts: &[AccountInfo], amount: u128) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let user_info = next_account_info(account_info_iter)?;
    let state_info = next_account_info(account_info_iter)?;
    let stable_mint = next_account_info(account_info_iter)?;
    let user_stable = next_account_info(account_info_iter)?;
    let engine_stable = next_account_info(account_info_iter)?;
    let authority_info = next_account_info(account_info_iter)?;
    let token_program = next_account_info(account_info_iter)?;
    let feeds = account_info_iter.as_slice();

    if !user_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let mut state = load_state(program_id, state_info)?;
    check_authority(&state, authority_info)?;

    let bump = [state.authority_bump];
    let mut gateway = SplTokenGateway {
        token_program,
        authority: authority_info,
        authority_seeds: [ENGINE_AUTHORITY_SEED, state_info.key.as_ref(), &bump],
        user: Some(user_info),
        user_collateral: None,
        engine_collateral: None,
        stable_mint: Some(stable_mint),
        user_stable: Some(user_stable),
        engine_stable: Some(engine_stable),
    };
    let oracle = FeedPriceSource { accounts: feeds };
    let now = Clock::get()?.unix_timestamp;

    state.burn_debt(&mut gateway, &oracle, now, user_info.key, amount)?;
    save_state(&state, state_info)
}

fn process_liquidate(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    asset: Pubkey,
    user: Pubkey,
    debt_to_cover: u128,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let liquidator_info = next_account_info(account_info_iter)?;
    let state_info = next_account_info(account_info_iter)?;
    let engine_collateral = next_account_info(account_info_iter)?;
    let liquidator_collateral = next_account_info(account_info_iter)?;
    let stable_mint = next_account_info(account_info_iter)?;
    let liquidator_stable = next_account_info(account_info_iter)?;
    let engine_stable = next_account_info(account_info_iter)?;
    let authority_info = next_account_info(account_info_iter)?;
    let token_program = next_account_info(account_info_iter)?;
    let feeds = account_info_iter.as_slice();

    if !liquidator_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let mut state = load_state(program_id, state_info)?;
    check_authority(&state, authority_info)?;

    let bump = [state.authority_bump];
    let mut gateway = SplTokenGateway {
        token_program,
        authority: authority_info,
        authority_seeds: [ENGINE_AUTHORITY_SEED, state_info.key.as_ref(), &bump],
        user: Some(liquidator_info),
        user_collateral: Some(liquidator_collateral),
        engine_collateral: Some(engine_collateral),
        stable_mint: Some(stable_mint),
        user_stable: Some(liquidator_stable),
        engine_stable: Some(engine_stable),
    };
    let oracle = FeedPriceSource { accounts: feeds };
    let now = Clock::get()?.unix_timestamp;

    state.liquidate(
        &mut gateway,
        &oracle,
        now,
        liquidator_info.key,
        &asset,
        &user,
        debt_to_cover,
    )?;
    save_state(&state, state_info)
}

fn load_state(program_id: &Pubkey, state_info: &AccountInfo) -> Result<EngineState, ProgramError> {
    if state_info.owner != program_id {
        return Err(ProgramError::IncorrectProgramId);
    }
    let data = state_info.data.borrow();
    let state = EngineState::deserialize(&mut &data[..])
        .map_err(|_| EngineError::AccountNotInitialized)?;
    state.validate()?;
    Ok(state)
}

fn save_state(state: &EngineState, state_info: &AccountInfo) -> ProgramResult {
    state
        .serialize(&mut &mut state_info.data.borrow_mut()[..])
        .map_err(|_| ProgramError::AccountDataTooSmall)
}

fn check_authority(state: &EngineState, authority_info: &AccountInfo) -> ProgramResult {
    if state.authority != *authority_info.key {
        return Err(EngineError::InvalidAuthority.into());
    }
    Ok(())
}
