//! Removing Liquidity
//!
//! `exit_pool` pays out both claims, either proportionally for an exact LP
//! amount or as an exact basket. Single-claim exits go through
//! `exit_single_token`. Exits stay open after maturity.

use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token_interface::{
        burn, transfer_checked, Burn, Mint, TokenAccount, TokenInterface, TransferChecked,
    },
};

use crate::instructions::with_amm_signer;
use crate::state::{TempusAmm, TempusPool, YieldSource, PRINCIPAL, YIELD};

use super::pool_view;

#[event]
pub struct LiquidityRemoved {
    pub amm: Pubkey,
    pub provider: Pubkey,
    pub amounts_out: [u64; 2],
    pub lp_in: u64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum ExitKind {
    ExactLpInForTokensOut {
        lp_in: u64,
        min_amounts_out: [u64; 2],
    },
    LpInForExactTokensOut {
        amounts_out: [u64; 2],
        max_lp_in: u64,
    },
}

/// Accounts for exiting the AMM
#[derive(Accounts)]
pub struct RemoveLiquidity<'info> {
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
        init_if_needed,
        payer = provider,
        associated_token::mint = principal_mint,
        associated_token::authority = provider,
        associated_token::token_program = token_program,
    )]
    pub provider_principal: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = provider,
        associated_token::mint = yield_mint,
        associated_token::authority = provider,
        associated_token::token_program = token_program,
    )]
    pub provider_yield: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        token::mint = lp_mint,
        token::authority = provider,
    )]
    pub provider_lp: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

impl<'info> RemoveLiquidity<'info> {
    pub fn exit_pool(&mut self, kind: ExitKind) -> Result<[u64; 2]> {
        let (amounts_out, lp_in) = match kind {
            ExitKind::ExactLpInForTokensOut {
                lp_in,
                min_amounts_out,
            } => (self.amm.exit_exact_lp_in(lp_in, min_amounts_out)?, lp_in),
            ExitKind::LpInForExactTokensOut {
                amounts_out,
                max_lp_in,
            } => {
                let now = Clock::get()?.unix_timestamp;
                let view = pool_view(&self.tempus_pool, &self.yield_source, now)?;
                let lp_in = self
                    .amm
                    .exit_exact_tokens_out(amounts_out, max_lp_in, &view)?;
                (amounts_out, lp_in)
            }
        };

        self.settle(amounts_out, lp_in)?;
        Ok(amounts_out)
    }

    pub fn exit_single_token(
        &mut self,
        token_index: u8,
        lp_in: u64,
        min_amount_out: u64,
    ) -> Result<u64> {
        let now = Clock::get()?.unix_timestamp;
        let view = pool_view(&self.tempus_pool, &self.yield_source, now)?;
        let index = usize::from(token_index);

        let amount_out = self
            .amm
            .exit_single_token(index, lp_in, min_amount_out, &view)?;

        let mut amounts_out = [0u64; 2];
        amounts_out[index] = amount_out;
        self.settle(amounts_out, lp_in)?;
        Ok(amount_out)
    }

    /// Burn the provider's LP, then pay out from the vaults
    fn settle(&self, amounts_out: [u64; 2], lp_in: u64) -> Result<()> {
        burn(
            CpiContext::new(
                self.token_program.to_account_info(),
                Burn {
                    mint: self.lp_mint.to_account_info(),
                    from: self.provider_lp.to_account_info(),
                    authority: self.provider.to_account_info(),
                },
            ),
            lp_in,
        )?;

        with_amm_signer(&self.amm, |signer| {
            for index in [PRINCIPAL, YIELD] {
                if amounts_out[index] == 0 {
                    continue;
                }
                let (mint, from, to) = if index == PRINCIPAL {
                    (&self.principal_mint, &self.principal_vault, &self.provider_principal)
                } else {
                    (&self.yield_mint, &self.yield_vault, &self.provider_yield)
                };
                transfer_checked(
                    CpiContext::new_with_signer(
                        self.token_program.to_account_info(),
                        TransferChecked {
                            from: from.to_account_info(),
                            mint: mint.to_account_info(),
                            to: to.to_account_info(),
                            authority: self.amm.to_account_info(),
                        },
                        signer,
                    ),
                    amounts_out[index],
                    mint.decimals,
                )?;
            }
            Ok(())
        })?;

        emit!(LiquidityRemoved {
            amm: self.amm.key(),
            provider: self.provider.key(),
            amounts_out,
            lp_in,
        });

        Ok(())
    }
}
