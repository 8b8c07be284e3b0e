//! # Tempus Pool: Principal / Yield Splitting
//!
//! Locks a yield-bearing token until a fixed maturity and splits it into two
//! claims, with a StableSwap AMM for trading one against the other.
//!
//! ## Overview
//!
//! - **Principal** redeems for the backing value deposited, at maturity.
//! - **Yield** redeems for everything the deposit earned on top of that.
//! - A pool halts early if the yield source keeps losing value for longer
//!   than its halt threshold; claims then redeem as if matured.
//!
//! ## How it works
//! - A yield source reports the exchange rate of its yield-bearing token.
//! - The pool mints Principal + Yield for deposits and values them on redeem.
//! - The claim AMM prices both claims by their present value.
//!

use anchor_lang::prelude::*;

pub mod accounting;
pub mod amm;
pub mod constants;
pub mod instructions;
pub mod math;
pub mod state;

pub use instructions::*;
pub use state::{AccrualConvention, CreatePoolParams, FeeSchedule, InitAmmParams};

declare_id!("BkJx7qN3cLjEuhd7KowRg58LVCJmgLvoNcbJ9brSbkTQ");

#[program]
pub mod tempus_pool {
    use super::*;

    // ------------------------------------------------------------------
    // Yield source
    // ------------------------------------------------------------------

    /// Create a rate source with its yield-bearing mint and backing reserve
    pub fn create_yield_source(
        ctx: Context<CreateYieldSource>,
        convention: AccrualConvention,
        initial_rate: u128,
        backing_deposits: bool,
        backing_redemptions: bool,
    ) -> Result<()> {
        ctx.accounts.create_yield_source(
            convention,
            initial_rate,
            backing_deposits,
            backing_redemptions,
            &ctx.bumps,
        )
    }

    /// Report the current exchange rate (rate authority only)
    pub fn report_rate(ctx: Context<ReportRate>, rate: u128) -> Result<()> {
        ctx.accounts.report_rate(rate)
    }

    /// Wrap backing into yield-bearing tokens
    pub fn wrap_backing(ctx: Context<Wrap>, amount: u64) -> Result<u64> {
        ctx.accounts.wrap_backing(amount)
    }

    /// Unwrap yield-bearing tokens into backing
    pub fn unwrap_yield_bearing(ctx: Context<Wrap>, amount: u64) -> Result<u64> {
        ctx.accounts.unwrap_yield_bearing(amount)
    }

    // ------------------------------------------------------------------
    // Tempus pool
    // ------------------------------------------------------------------

    /// Open a pool for one yield source and maturity
    pub fn create_pool(ctx: Context<CreatePool>, params: CreatePoolParams) -> Result<()> {
        ctx.accounts.create_pool(params, &ctx.bumps)
    }

    /// Lock yield-bearing tokens for Principal + Yield (controller co-signs)
    pub fn deposit_yield_bearing(ctx: Context<DepositYieldBearing>, amount: u64) -> Result<u64> {
        ctx.accounts.deposit_yield_bearing(amount)
    }

    /// Lock backing, wrapped through the yield source (controller co-signs)
    pub fn deposit_backing(ctx: Context<DepositBacking>, amount: u64) -> Result<u64> {
        ctx.accounts.deposit_backing(amount)
    }

    /// Burn claims for yield-bearing tokens (controller co-signs)
    pub fn redeem_to_yield_bearing(
        ctx: Context<RedeemToYieldBearing>,
        principal_amount: u64,
        yield_amount: u64,
    ) -> Result<u64> {
        ctx.accounts
            .redeem_to_yield_bearing(principal_amount, yield_amount)
    }

    /// Burn claims for backing (controller co-signs)
    pub fn redeem_to_backing(
        ctx: Context<RedeemToBacking>,
        principal_amount: u64,
        yield_amount: u64,
    ) -> Result<u64> {
        ctx.accounts.redeem_to_backing(principal_amount, yield_amount)
    }

    /// Freeze the maturity rate once maturity time has passed
    pub fn finalize(ctx: Context<RefreshPool>) -> Result<()> {
        ctx.accounts.finalize()
    }

    /// Observe the current rate; may halt or mature the pool
    pub fn refresh_rate(ctx: Context<RefreshPool>) -> Result<()> {
        ctx.accounts.refresh_rate()
    }

    /// Mint or burn pegged vault balances to the reported rate
    pub fn rebase_vault(ctx: Context<RebaseVault>) -> Result<()> {
        ctx.accounts.rebase_vault()
    }

    /// Change fees within the caps fixed at creation (owner only)
    pub fn set_fee_config(ctx: Context<SetFeeConfig>, fees: FeeSchedule) -> Result<()> {
        ctx.accounts.set_fee_config(fees)
    }

    /// Withdraw accumulated fees, `u64::MAX` for all (owner only)
    pub fn transfer_fees(ctx: Context<TransferFees>, amount: u64) -> Result<u64> {
        ctx.accounts.transfer_fees(amount)
    }

    /// Sweep the vault when the yield source reports a zero rate (owner only)
    pub fn recover_locked(ctx: Context<RecoverLocked>) -> Result<u64> {
        ctx.accounts.recover_locked()
    }

    // ------------------------------------------------------------------
    // Claim AMM
    // ------------------------------------------------------------------

    /// Create the AMM for a pool (pool owner only)
    pub fn init_amm(ctx: Context<InitAmm>, params: InitAmmParams) -> Result<()> {
        ctx.accounts.init_amm(params, &ctx.bumps)
    }

    pub fn provide_liquidity(ctx: Context<ProvideLiquidity>, kind: JoinKind) -> Result<u64> {
        ctx.accounts.provide_liquidity(kind)
    }

    pub fn exit_pool(ctx: Context<RemoveLiquidity>, kind: ExitKind) -> Result<[u64; 2]> {
        ctx.accounts.exit_pool(kind)
    }

    pub fn exit_single_token(
        ctx: Context<RemoveLiquidity>,
        token_index: u8,
        lp_in: u64,
        min_amount_out: u64,
    ) -> Result<u64> {
        ctx.accounts
            .exit_single_token(token_index, lp_in, min_amount_out)
    }

    pub fn swap_given_in(
        ctx: Context<Swap>,
        token_in: u8,
        amount_in: u64,
        min_amount_out: u64,
    ) -> Result<u64> {
        ctx.accounts.swap_given_in(token_in, amount_in, min_amount_out)
    }

    pub fn swap_given_out(
        ctx: Context<Swap>,
        token_in: u8,
        amount_out: u64,
        max_amount_in: u64,
    ) -> Result<u64> {
        ctx.accounts.swap_given_out(token_in, amount_out, max_amount_in)
    }

    /// Ramp the amplification towards `target` until `end_time` (AMM owner only)
    pub fn start_amplification_update(
        ctx: Context<UpdateAmplification>,
        target: u64,
        end_time: i64,
    ) -> Result<()> {
        ctx.accounts.start_amplification_update(target, end_time)
    }

    /// Freeze the amplification at its current value (AMM owner only)
    pub fn stop_amplification_update(ctx: Context<UpdateAmplification>) -> Result<()> {
        ctx.accounts.stop_amplification_update()
    }

    /// Invariant value per LP token (WAD)
    pub fn get_rate(ctx: Context<GetRate>) -> Result<u128> {
        ctx.accounts.get_rate()
    }
}
