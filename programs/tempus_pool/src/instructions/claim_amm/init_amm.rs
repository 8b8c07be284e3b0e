//! AMM Creation
//!
//! Creates the AMM account, its LP mint and the two claim vaults for a pool.
//! Liquidity is added afterwards with a `JoinKind::Init` join.

use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token_interface::{Mint, TokenAccount, TokenInterface},
};

use crate::instructions::AuthError;
use crate::state::{InitAmmParams, TempusAmm, TempusPool};

#[event]
pub struct AmmCreated {
    pub amm: Pubkey,
    pub tempus_pool: Pubkey,
    pub lp_mint: Pubkey,
    pub amp_start: u64,
    pub amp_end: u64,
    pub swap_fee: u128,
}

/// Accounts for creating the claim AMM
#[derive(Accounts)]
pub struct InitAmm<'info> {
    /// Pool owner, becomes AMM owner
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        has_one = owner @ AuthError::NotOwner,
        has_one = principal_mint,
        has_one = yield_mint,
    )]
    pub tempus_pool: Box<Account<'info, TempusPool>>,

    pub principal_mint: Box<InterfaceAccount<'info, Mint>>,
    pub yield_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        init,
        payer = owner,
        space = 8 + TempusAmm::INIT_SPACE,
        seeds = [TempusAmm::SEED, tempus_pool.key().as_ref()],
        bump,
    )]
    pub amm: Box<Account<'info, TempusAmm>>,

    #[account(
        init,
        payer = owner,
        mint::decimals = principal_mint.decimals,
        mint::authority = amm,
        mint::token_program = token_program,
        seeds = [TempusAmm::LP_SEED, amm.key().as_ref()],
        bump,
    )]
    pub lp_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        init,
        payer = owner,
        associated_token::mint = principal_mint,
        associated_token::authority = amm,
        associated_token::token_program = token_program,
    )]
    pub principal_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init,
        payer = owner,
        associated_token::mint = yield_mint,
        associated_token::authority = amm,
        associated_token::token_program = token_program,
    )]
    pub yield_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

impl<'info> InitAmm<'info> {
    pub fn init_amm(&mut self, params: InitAmmParams, bumps: &InitAmmBumps) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;

        let amm = TempusAmm::create(
            self.owner.key(),
            self.tempus_pool.key(),
            [
                self.principal_mint.key(),
                self.yield_mint.key(),
                self.lp_mint.key(),
            ],
            [self.principal_vault.key(), self.yield_vault.key()],
            self.principal_mint.decimals,
            &params,
            now,
            self.tempus_pool.maturity_time,
            (bumps.amm, bumps.lp_mint),
        )?;
        self.amm.set_inner(amm);

        msg!("Claim AMM created: {}", self.amm.key());

        emit!(AmmCreated {
            amm: self.amm.key(),
            tempus_pool: self.tempus_pool.key(),
            lp_mint: self.lp_mint.key(),
            amp_start: params.amp_start,
            amp_end: params.amp_end,
            swap_fee: params.swap_fee,
        });

        Ok(())
    }
}
