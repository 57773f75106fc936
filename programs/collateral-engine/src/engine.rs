//! Public engine operations
//!
//! Every operation validates inputs, applies ledger mutations, and only
//! then reaches external capabilities (checks, effects, interactions).
//! Each entry point is wrapped in the reentrancy guard and a copy-on-write
//! ledger boundary: on any error the ledger is restored and the gateway
//! rolled back, so no operation is ever partially applied.

use solana_program::{entrypoint::ProgramResult, pubkey::Pubkey};

use crate::{
    constants::{LIQUIDATION_BONUS, LIQUIDATION_PRECISION},
    error::EngineError,
    events::{CollateralDeposited, CollateralRedeemed, Event},
    health::is_healthy,
    math::mul_div_floor,
    oracle::{checked_round, PriceSource},
    state::EngineState,
    token::TokenGateway,
};

impl EngineState {
    /// Acquire the reentrancy guard
    ///
    /// A nested invocation arriving while an operation is in flight is
    /// rejected outright rather than queued.
    fn enter(&mut self) -> ProgramResult {
        if self.entered {
            return Err(EngineError::ReentrantCall.into());
        }
        self.entered = true;
        Ok(())
    }

    fn exit(&mut self) {
        self.entered = false;
    }

    /// Run one operation inside the guard and the transaction boundary
    fn guarded<G, F>(&mut self, gateway: &mut G, op: F) -> ProgramResult
    where
        G: TokenGateway,
        F: FnOnce(&mut Self, &mut G) -> ProgramResult,
    {
        self.enter()?;
        gateway.checkpoint();
        let snapshot = self.ledger.clone();
        let result = op(self, gateway);
        match &result {
            Ok(()) => gateway.commit(),
            Err(_) => {
                self.ledger = snapshot;
                gateway.rollback();
            }
        }
        self.exit();
        result
    }

    fn assert_healthy<O: PriceSource>(
        &self,
        user: &Pubkey,
        oracle: &O,
        now: i64,
    ) -> ProgramResult {
        if !is_healthy(self.health_factor_of(user, oracle, now)?) {
            return Err(EngineError::HealthFactorBroken.into());
        }
        Ok(())
    }

    /// Lock collateral in the caller's position
    pub fn deposit_collateral<G: TokenGateway>(
        &mut self,
        gateway: &mut G,
        caller: &Pubkey,
        asset: &Pubkey,
        amount: u128,
    ) -> ProgramResult {
        let (caller, asset) = (*caller, *asset);
        self.guarded(gateway, |state, gw| {
            state.deposit_step(gw, &caller, &asset, amount)
        })
    }

    /// Withdraw collateral from the caller's position
    ///
    /// The caller must remain healthy after the withdrawal.
    pub fn redeem_collateral<G: TokenGateway, O: PriceSource>(
        &mut self,
        gateway: &mut G,
        oracle: &O,
        now: i64,
        caller: &Pubkey,
        asset: &Pubkey,
        amount: u128,
    ) -> ProgramResult {
        let (caller, asset) = (*caller, *asset);
        self.guarded(gateway, |state, gw| {
            state.redeem_step(gw, &caller, &caller, &asset, amount)?;
            state.assert_healthy(&caller, oracle, now)
        })
    }

    /// Mint stable units against the caller's collateral
    pub fn mint_debt<G: TokenGateway, O: PriceSource>(
        &mut self,
        gateway: &mut G,
        oracle: &O,
        now: i64,
        caller: &Pubkey,
        amount: u128,
    ) -> ProgramResult {
        let caller = *caller;
        self.guarded(gateway, |state, gw| {
            state.mint_step(gw, oracle, now, &caller, amount)
        })
    }

    /// Repay minted debt with stable units from the caller
    pub fn burn_debt<G: TokenGateway, O: PriceSource>(
        &mut self,
        gateway: &mut G,
        oracle: &O,
        now: i64,
        caller: &Pubkey,
        amount: u128,
    ) -> ProgramResult {
        let caller = *caller;
        self.guarded(gateway, |state, gw| {
            state.burn_step(gw, &caller, &caller, amount)?;
            state.assert_healthy(&caller, oracle, now)
        })
    }

    /// Deposit collateral and mint debt in one atomic operation
    pub fn deposit_and_mint<G: TokenGateway, O: PriceSource>(
        &mut self,
        gateway: &mut G,
        oracle: &O,
        now: i64,
        caller: &Pubkey,
        asset: &Pubkey,
        collateral_amount: u128,
        debt_amount: u128,
    ) -> ProgramResult {
        let (caller, asset) = (*caller, *asset);
        self.guarded(gateway, |state, gw| {
            state.deposit_step(gw, &caller, &asset, collateral_amount)?;
            state.mint_step(gw, oracle, now, &caller, debt_amount)
        })
    }

    /// Burn debt and withdraw collateral in one atomic operation
    pub fn redeem_for_burn<G: TokenGateway, O: PriceSource>(
        &mut self,
        gateway: &mut G,
        oracle: &O,
        now: i64,
        caller: &Pubkey,
        asset: &Pubkey,
        collateral_amount: u128,
        debt_amount: u128,
    ) -> ProgramResult {
        let (caller, asset) = (*caller, *asset);
        self.guarded(gateway, |state, gw| {
            state.burn_step(gw, &caller, &caller, debt_amount)?;
            state.redeem_step(gw, &caller, &caller, &asset, collateral_amount)?;
            state.assert_healthy(&caller, oracle, now)
        })
    }

    /// Repay a liquidatable user's debt in exchange for discounted collateral
    ///
    /// The liquidator covers `debt_to_cover` from their own stable balance
    /// and receives the equivalent collateral plus the liquidation bonus,
    /// seized from the target's position. The target's ledger debt entry is
    /// decremented; their stable token holdings are untouched.
    pub fn liquidate<G: TokenGateway, O: PriceSource>(
        &mut self,
        gateway: &mut G,
        oracle: &O,
        now: i64,
        liquidator: &Pubkey,
        asset: &Pubkey,
        target: &Pubkey,
        debt_to_cover: u128,
    ) -> ProgramResult {
        let (liquidator, asset, target) = (*liquidator, *asset, *target);
        self.guarded(gateway, |state, gw| {
            state.liquidate_step(gw, oracle, now, &liquidator, &asset, &target, debt_to_cover)
        })
    }

    fn deposit_step<G: TokenGateway>(
        &mut self,
        gateway: &mut G,
        caller: &Pubkey,
        asset: &Pubkey,
        amount: u128,
    ) -> ProgramResult {
        if amount == 0 {
            return Err(EngineError::AmountMustBePositive.into());
        }
        self.registry.config_of(asset)?;

        self.position_mut(caller).credit_collateral(asset, amount)?;
        self.ledger.stats.total_deposits += 1;

        CollateralDeposited {
            user: *caller,
            asset: *asset,
            amount,
        }
        .emit();

        gateway
            .collateral_in(asset, caller, amount)
            .map_err(|_| EngineError::CollateralTransferFailed)?;
        Ok(())
    }

    /// Internal redemption primitive shared by user withdrawal and
    /// liquidation seizure (`from` is the position holder, `to` receives
    /// the tokens).
    fn redeem_step<G: TokenGateway>(
        &mut self,
        gateway: &mut G,
        from: &Pubkey,
        to: &Pubkey,
        asset: &Pubkey,
        amount: u128,
    ) -> ProgramResult {
        if amount == 0 {
            return Err(EngineError::AmountMustBePositive.into());
        }

        self.position_mut(from).debit_collateral(asset, amount)?;
        self.ledger.stats.total_redemptions += 1;

        CollateralRedeemed {
            redeemed_from: *from,
            redeemed_to: *to,
            asset: *asset,
            amount,
        }
        .emit();

        gateway
            .collateral_out(asset, to, amount)
            .map_err(|_| EngineError::CollateralTransferFailed)?;
        Ok(())
    }

    fn mint_step<G: TokenGateway, O: PriceSource>(
        &mut self,
        gateway: &mut G,
        oracle: &O,
        now: i64,
        caller: &Pubkey,
        amount: u128,
    ) -> ProgramResult {
        if amount == 0 {
            return Err(EngineError::AmountMustBePositive.into());
        }

        self.position_mut(caller).add_debt(amount)?;
        self.assert_healthy(caller, oracle, now)?;
        self.ledger.stats.total_mints += 1;

        gateway
            .stable_mint(caller, amount)
            .map_err(|_| EngineError::MintFailed)?;
        Ok(())
    }

    /// Internal burn primitive: the ledger debt decremented belongs to
    /// `on_behalf_of` while the stable units are pulled from `funded_by`.
    fn burn_step<G: TokenGateway>(
        &mut self,
        gateway: &mut G,
        on_behalf_of: &Pubkey,
        funded_by: &Pubkey,
        amount: u128,
    ) -> ProgramResult {
        if amount == 0 {
            return Err(EngineError::AmountMustBePositive.into());
        }

        self.position_mut(on_behalf_of).sub_debt(amount)?;
        self.ledger.stats.total_burns += 1;

        gateway
            .stable_collect(funded_by, amount)
            .map_err(|_| EngineError::StableTransferFailed)?;
        gateway
            .stable_burn(amount)
            .map_err(|_| EngineError::StableTransferFailed)?;
        Ok(())
    }

    fn liquidate_step<G: TokenGateway, O: PriceSource>(
        &mut self,
        gateway: &mut G,
        oracle: &O,
        now: i64,
        liquidator: &Pubkey,
        asset: &Pubkey,
        target: &Pubkey,
        debt_to_cover: u128,
    ) -> ProgramResult {
        if debt_to_cover == 0 {
            return Err(EngineError::AmountMustBePositive.into());
        }

        let starting_health = self.health_factor_of(target, oracle, now)?;
        if is_healthy(starting_health) {
            return Err(EngineError::HealthFactorAboveThreshold.into());
        }

        let round = checked_round(oracle, &self.registry.feed_of(asset)?, now)?;
        let covered = round.amount_from_usd(debt_to_cover)?;
        let bonus = mul_div_floor(covered, LIQUIDATION_BONUS, LIQUIDATION_PRECISION)?;
        let seized = covered
            .checked_add(bonus)
            .ok_or(EngineError::ArithmeticOverflow)?;

        self.redeem_step(gateway, target, liquidator, asset, seized)?;
        self.burn_step(gateway, target, liquidator, debt_to_cover)?;

        if !is_healthy(self.health_factor_of(target, oracle, now)?) {
            return Err(EngineError::HealthFactorNotImproved.into());
        }
        self.assert_healthy(liquidator, oracle, now)?;

        self.ledger.stats.total_liquidations += 1;
        Ok(())
    }
}
