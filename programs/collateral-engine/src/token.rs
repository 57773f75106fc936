//! Token capability surface
//!
//! The engine never bookkeeps token supply or holder balances itself; it
//! consumes a transfer/mint/burn capability. On-chain that capability is
//! the SPL token program reached through CPIs signed by the engine
//! authority PDA; tests substitute an in-memory double. Every call is
//! checked and any refusal aborts the calling operation.

use solana_program::{
    account_info::AccountInfo,
    entrypoint::ProgramResult,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
};

use crate::error::EngineError;

/// Consumed token capability
///
/// `checkpoint`/`commit`/`rollback` let a host implementation reproduce
/// the all-or-nothing operation boundary. The CPI-backed implementation's
/// boundary is the enclosing transaction, so there they are no-ops.
pub trait TokenGateway {
    /// Move collateral from a user into the engine
    fn collateral_in(&mut self, asset: &Pubkey, from: &Pubkey, amount: u128) -> ProgramResult;

    /// Move collateral from the engine out to a user
    fn collateral_out(&mut self, asset: &Pubkey, to: &Pubkey, amount: u128) -> ProgramResult;

    /// Mint stable units to a user
    fn stable_mint(&mut self, to: &Pubkey, amount: u128) -> ProgramResult;

    /// Pull stable units from a user into the engine
    fn stable_collect(&mut self, from: &Pubkey, amount: u128) -> ProgramResult;

    /// Burn stable units held by the engine
    fn stable_burn(&mut self, amount: u128) -> ProgramResult;

    /// Mark the start of an operation's token effects
    fn checkpoint(&mut self);

    /// Keep all token effects since the checkpoint
    fn commit(&mut self);

    /// Discard all token effects since the checkpoint
    fn rollback(&mut self);
}

/// SPL token accounts backing one instruction's gateway calls
///
/// Unused slots stay `None`; a gateway call that needs a missing account
/// fails with a typed error rather than indexing past the account list.
pub struct SplTokenGateway<'a, 'info> {
    pub token_program: &'a AccountInfo<'info>,

    /// Engine authority PDA that signs outbound CPIs
    pub authority: &'a AccountInfo<'info>,
    pub authority_seeds: [&'a [u8]; 3],

    /// Signing user, authority for inbound transfers
    pub user: Option<&'a AccountInfo<'info>>,

    pub user_collateral: Option<&'a AccountInfo<'info>>,
    pub engine_collateral: Option<&'a AccountInfo<'info>>,

    pub stable_mint: Option<&'a AccountInfo<'info>>,
    pub user_stable: Option<&'a AccountInfo<'info>>,
    pub engine_stable: Option<&'a AccountInfo<'info>>,
}

impl<'a, 'info> SplTokenGateway<'a, 'info> {
    fn narrow(amount: u128) -> Result<u64, ProgramError> {
        u64::try_from(amount).map_err(|_| EngineError::AmountTooLarge.into())
    }

    fn expect(
        account: Option<&'a AccountInfo<'info>>,
    ) -> Result<&'a AccountInfo<'info>, ProgramError> {
        account.ok_or_else(|| EngineError::InvalidTokenAccount.into())
    }

    /// Verify a token account is held by the expected owner
    fn check_holder(account: &AccountInfo, holder: &Pubkey) -> ProgramResult {
        let token_account = spl_token::state::Account::unpack(&account.data.borrow())?;
        if token_account.owner != *holder {
            return Err(EngineError::InvalidTokenAccount.into());
        }
        Ok(())
    }
}

impl TokenGateway for SplTokenGateway<'_, '_> {
    fn collateral_in(&mut self, _asset: &Pubkey, from: &Pubkey, amount: u128) -> ProgramResult {
        let user = Self::expect(self.user)?;
        let source = Self::expect(self.user_collateral)?;
        let destination = Self::expect(self.engine_collateral)?;
        Self::check_holder(source, from)?;

        let ix = spl_token::instruction::transfer(
            self.token_program.key,
            source.key,
            destination.key,
            user.key,
            &[],
            Self::narrow(amount)?,
        )?;
        invoke(
            &ix,
            &[
                source.clone(),
                destination.clone(),
                user.clone(),
                self.token_program.clone(),
            ],
        )
    }

    fn collateral_out(&mut self, _asset: &Pubkey, to: &Pubkey, amount: u128) -> ProgramResult {
        let source = Self::expect(self.engine_collateral)?;
        let destination = Self::expect(self.user_collateral)?;
        Self::check_holder(destination, to)?;

        let ix = spl_token::instruction::transfer(
            self.token_program.key,
            source.key,
            destination.key,
            self.authority.key,
            &[],
            Self::narrow(amount)?,
        )?;
        invoke_signed(
            &ix,
            &[
                source.clone(),
                destination.clone(),
                self.authority.clone(),
                self.token_program.clone(),
            ],
            &[&self.authority_seeds],
        )
    }

    fn stable_mint(&mut self, to: &Pubkey, amount: u128) -> ProgramResult {
        let mint = Self::expect(self.stable_mint)?;
        let destination = Self::expect(self.user_stable)?;
        Self::check_holder(destination, to)?;

        let ix = spl_token::instruction::mint_to(
            self.token_program.key,
            mint.key,
            destination.key,
            self.authority.key,
            &[],
            Self::narrow(amount)?,
        )?;
        invoke_signed(
            &ix,
            &[
                mint.clone(),
                destination.clone(),
                self.authority.clone(),
                self.token_program.clone(),
            ],
            &[&self.authority_seeds],
        )
    }

    fn stable_collect(&mut self, from: &Pubkey, amount: u128) -> ProgramResult {
        let user = Self::expect(self.user)?;
        let source = Self::expect(self.user_stable)?;
        let destination = Self::expect(self.engine_stable)?;
        Self::check_holder(source, from)?;

        let ix = spl_token::instruction::transfer(
            self.token_program.key,
            source.key,
            destination.key,
            user.key,
            &[],
            Self::narrow(amount)?,
        )?;
        invoke(
            &ix,
            &[
                source.clone(),
                destination.clone(),
                user.clone(),
                self.token_program.clone(),
            ],
        )
    }

    fn stable_burn(&mut self, amount: u128) -> ProgramResult {
        let mint = Self::expect(self.stable_mint)?;
        let source = Self::expect(self.engine_stable)?;

        let ix = spl_token::instruction::burn(
            self.token_program.key,
            source.key,
            mint.key,
            self.authority.key,
            &[],
            Self::narrow(amount)?,
        )?;
        invoke_signed(
            &ix,
            &[
                source.clone(),
                mint.clone(),
                self.authority.clone(),
                self.token_program.clone(),
            ],
            &[&self.authority_seeds],
        )
    }

    // Token effects revert with the enclosing transaction; nothing to stage.
    fn checkpoint(&mut self) {}

    fn commit(&mut self) {}

    fn rollback(&mut self) {}
}
