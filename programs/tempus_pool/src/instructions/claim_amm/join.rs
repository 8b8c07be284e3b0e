//! Providing Liquidity
//!
//! Three join kinds, all rejected once the pool has matured:
//! - `Init` seeds an empty AMM and mints `D` LP tokens
//! - `ExactTokensInForLpOut` deposits any basket (imbalance pays the swap fee)
//! - `ExactLpOutForTokenIn` mints an exact LP amount against a single claim

use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token_interface::{
        mint_to, transfer_checked, Mint, MintTo, TokenAccount, TokenInterface, TransferChecked,
    },
};

use crate::instructions::with_amm_signer;
use crate::state::{TempusAmm, TempusPool, YieldSource, PRINCIPAL, YIELD};

use super::pool_view;

#[event]
pub struct LiquidityProvided {
    pub amm: Pubkey,
    pub provider: Pubkey,
    pub amounts_in: [u64; 2],
    pub lp_out: u64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum JoinKind {
    Init {
        amounts: [u64; 2],
    },
    ExactTokensInForLpOut {
        amounts: [u64; 2],
        min_lp_out: u64,
    },
    ExactLpOutForTokenIn {
        token_index: u8,
        lp_out: u64,
        max_amount_in: u64,
    },
}

/// Accounts for joining the AMM
#[derive(Accounts)]
pub struct ProvideLiquidity<'info> {
    #[account(mut)]
    pub provider: Signer<'info>,

    #[account(
        mut,
        has_one = tempus_pool,
        has_one = principal_mint,
        has_one = yield_mint,
        has_one = lp_mint,
        has_one = principal_vault,
        has_one = yield_vault,
    )]
    pub amm: Box<Account<'info, TempusAmm>>,

    #[account(has_one = yield_source)]
    pub tempus_pool: Box<Account<'info, TempusPool>>,

    pub yield_source: Box<Account<'info, YieldSource>>,

    pub principal_mint: Box<InterfaceAccount<'info, Mint>>,
    pub yield_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut)]
    pub lp_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut)]
    pub principal_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(mut)]
    pub yield_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        token::mint = principal_mint,
        token::authority = provider,
    )]
    pub provider_principal: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        token::mint = yield_mint,
        token::authority = provider,
    )]
    pub provider_yield: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = provider,
        associated_token::mint = lp_mint,
        associated_token::authority = provider,
        associated_token::token_program = token_program,
    )]
    pub provider_lp: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

impl<'info> ProvideLiquidity<'info> {
    pub fn provide_liquidity(&mut self, kind: JoinKind) -> Result<u64> {
        let now = Clock::get()?.unix_timestamp;
        let view = pool_view(&self.tempus_pool, &self.yield_source, now)?;

        let (amounts_in, lp_out) = match kind {
            JoinKind::Init { amounts } => (amounts, self.amm.join_init(amounts, &view)?),
            JoinKind::ExactTokensInForLpOut {
                amounts,
                min_lp_out,
            } => (
                amounts,
                self.amm.join_exact_tokens_in(amounts, min_lp_out, &view)?,
            ),
            JoinKind::ExactLpOutForTokenIn {
                token_index,
                lp_out,
                max_amount_in,
            } => {
                let index = usize::from(token_index);
                let paid = self
                    .amm
                    .join_exact_lp_out(index, lp_out, max_amount_in, &view)?;
                let mut amounts = [0u64; 2];
                amounts[index] = paid;
                (amounts, lp_out)
            }
        };

        self.pay_in(PRINCIPAL, amounts_in[PRINCIPAL])?;
        self.pay_in(YIELD, amounts_in[YIELD])?;

        with_amm_signer(&self.amm, |signer| {
            mint_to(
                CpiContext::new_with_signer(
                    self.token_program.to_account_info(),
                    MintTo {
                        mint: self.lp_mint.to_account_info(),
                        to: self.provider_lp.to_account_info(),
                        authority: self.amm.to_account_info(),
                    },
                    signer,
                ),
                lp_out,
            )
        })?;

        emit!(LiquidityProvided {
            amm: self.amm.key(),
            provider: self.provider.key(),
            amounts_in,
            lp_out,
        });

        Ok(lp_out)
    }

    fn pay_in(&self, index: usize, amount: u64) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let (mint, from, to) = if index == PRINCIPAL {
            (&self.principal_mint, &self.provider_principal, &self.principal_vault)
        } else {
            (&self.yield_mint, &self.provider_yield, &self.yield_vault)
        };

        transfer_checked(
            CpiContext::new(
                self.token_program.to_account_info(),
                TransferChecked {
                    from: from.to_account_info(),
                    mint: mint.to_account_info(),
                    to: to.to_account_info(),
                    authority: self.provider.to_account_info(),
                },
            ),
            amount,
            mint.decimals,
        )
    }
}
