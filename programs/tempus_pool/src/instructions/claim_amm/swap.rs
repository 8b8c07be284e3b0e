//! Claim Swaps
//!
//! Trade Principal for Yield or back. The swap fee is taken from the input
//! and stays in the pool.

use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token_interface::{transfer_checked, Mint, TokenAccount, TokenInterface, TransferChecked},
};

use crate::amm::SwapOutcome;
use crate::instructions::with_amm_signer;
use crate::state::{TempusAmm, TempusPool, YieldSource, PRINCIPAL};

use super::pool_view;

#[event]
pub struct Swapped {
    pub amm: Pubkey,
    pub trader: Pubkey,
    /// 0 = principal, 1 = yield
    pub token_in: u8,
    pub amount_in: u64,
    pub amount_out: u64,
    pub fee: u64,
}

/// Accounts for swapping claims
#[derive(Accounts)]
pub struct Swap<'info> {
    #[account(mut)]
    pub trader: Signer<'info>,

    #[account(
        mut,
        has_one = tempus_pool,
        has_one = principal_mint,
        has_one = yield_mint,
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
    pub principal_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(mut)]
    pub yield_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = trader,
        associated_token::mint = principal_mint,
        associated_token::authority = trader,
        associated_token::token_program = token_program,
    )]
    pub trader_principal: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = trader,
        associated_token::mint = yield_mint,
        associated_token::authority = trader,
        associated_token::token_program = token_program,
    )]
    pub trader_yield: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

impl<'info> Swap<'info> {
    pub fn swap_given_in(&mut self, token_in: u8, amount_in: u64, min_amount_out: u64) -> Result<u64> {
        let now = Clock::get()?.unix_timestamp;
        let view = pool_view(&self.tempus_pool, &self.yield_source, now)?;
        let outcome = self
            .amm
            .swap_given_in(usize::from(token_in), amount_in, min_amount_out, &view)?;
        self.settle(token_in, outcome)?;
        Ok(outcome.amount_out)
    }

    pub fn swap_given_out(&mut self, token_in: u8, amount_out: u64, max_amount_in: u64) -> Result<u64> {
        let now = Clock::get()?.unix_timestamp;
        let view = pool_view(&self.tempus_pool, &self.yield_source, now)?;
        let outcome = self
            .amm
            .swap_given_out(usize::from(token_in), amount_out, max_amount_in, &view)?;
        self.settle(token_in, outcome)?;
        Ok(outcome.amount_in)
    }

    fn settle(&self, token_in: u8, outcome: SwapOutcome) -> Result<()> {
        let principal = (&self.principal_mint, &self.trader_principal, &self.principal_vault);
        let yields = (&self.yield_mint, &self.trader_yield, &self.yield_vault);
        let (sold, bought) = if usize::from(token_in) == PRINCIPAL {
            (principal, yields)
        } else {
            (yields, principal)
        };

        transfer_checked(
            CpiContext::new(
                self.token_program.to_account_info(),
                TransferChecked {
                    from: sold.1.to_account_info(),
                    mint: sold.0.to_account_info(),
                    to: sold.2.to_account_info(),
                    authority: self.trader.to_account_info(),
                },
            ),
            outcome.amount_in,
            sold.0.decimals,
        )?;

        with_amm_signer(&self.amm, |signer| {
            transfer_checked(
                CpiContext::new_with_signer(
                    self.token_program.to_account_info(),
                    TransferChecked {
                        from: bought.2.to_account_info(),
                        mint: bought.0.to_account_info(),
                        to: bought.1.to_account_info(),
                        authority: self.amm.to_account_info(),
                    },
                    signer,
                ),
                outcome.amount_out,
                bought.0.decimals,
            )
        })?;

        emit!(Swapped {
            amm: self.amm.key(),
            trader: self.trader.key(),
            token_in,
            amount_in: outcome.amount_in,
            amount_out: outcome.amount_out,
            fee: outcome.fee,
        });

        Ok(())
    }
}
