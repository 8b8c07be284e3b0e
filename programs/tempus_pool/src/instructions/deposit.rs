//! Deposits
//!
//! Lock yield-bearing tokens (or backing, wrapped on the way in) and mint an
//! equal number of Principal and Yield shares to the recipient.
//!
//! ```text
//! fee    = amount * deposit_fee
//! shares = backing_value(amount - fee) * initial_rate / current_rate
//! ```
//!
//! Both the depositor and the registered controller must sign. A deposit
//! that matures or halts the pool records the transition and moves nothing.

use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token_interface::{mint_to, transfer_checked, Mint, MintTo, TokenAccount, TokenInterface, TransferChecked},
};

use crate::accounting::{DepositOutcome, PoolError};
use crate::state::{TempusPool, YieldAdapter, YieldSource};

use super::rebase::apply_rebase;
use super::{announce, with_pool_signer, with_source_signer, AuthError};

#[event]
pub struct Deposited {
    pub pool: Pubkey,
    pub depositor: Pubkey,
    pub recipient: Pubkey,
    /// Zero for yield-bearing deposits
    pub backing_amount: u64,
    pub yield_bearing_amount: u64,
    pub shares: u64,
    pub fee: u64,
    pub rate: u128,
}

/// Mint `shares` of both claims, signed by the pool
fn mint_claims<'info>(
    token_program: &Interface<'info, TokenInterface>,
    pool: &Account<'info, TempusPool>,
    principal_mint: &InterfaceAccount<'info, Mint>,
    yield_mint: &InterfaceAccount<'info, Mint>,
    recipient_principal: &InterfaceAccount<'info, TokenAccount>,
    recipient_yield: &InterfaceAccount<'info, TokenAccount>,
    shares: u64,
) -> Result<()> {
    with_pool_signer(pool, |signer| {
        for (mint, to) in [
            (principal_mint, recipient_principal),
            (yield_mint, recipient_yield),
        ] {
            mint_to(
                CpiContext::new_with_signer(
                    token_program.to_account_info(),
                    MintTo {
                        mint: mint.to_account_info(),
                        to: to.to_account_info(),
                        authority: pool.to_account_info(),
                    },
                    signer,
                ),
                shares,
            )?;
        }
        Ok(())
    })
}

/// Accounts for depositing yield-bearing tokens
#[derive(Accounts)]
pub struct DepositYieldBearing<'info> {
    #[account(mut)]
    pub depositor: Signer<'info>,

    #[account(constraint = controller.key() == pool.controller @ AuthError::NotController)]
    pub controller: Signer<'info>,

    #[account(
        mut,
        has_one = yield_source,
        has_one = yield_bearing_mint,
        has_one = principal_mint,
        has_one = yield_mint,
        has_one = vault,
    )]
    pub pool: Box<Account<'info, TempusPool>>,

    pub yield_source: Box<Account<'info, YieldSource>>,

    #[account(mut)]
    pub yield_bearing_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut)]
    pub principal_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut)]
    pub yield_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut)]
    pub vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        token::mint = yield_bearing_mint,
        token::authority = depositor,
    )]
    pub depositor_yield_bearing: Box<InterfaceAccount<'info, TokenAccount>>,

    /// CHECK: only receives the minted claims
    #[account(constraint = recipient.key() != Pubkey::default() @ PoolError::ZeroRecipient)]
    pub recipient: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = depositor,
        associated_token::mint = principal_mint,
        associated_token::authority = recipient,
        associated_token::token_program = token_program,
    )]
    pub recipient_principal: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = depositor,
        associated_token::mint = yield_mint,
        associated_token::authority = recipient,
        associated_token::token_program = token_program,
    )]
    pub recipient_yield: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

impl<'info> DepositYieldBearing<'info> {
    pub fn deposit_yield_bearing(&mut self, amount: u64) -> Result<u64> {
        let now = Clock::get()?.unix_timestamp;
        let rate = self.yield_source.current_rate();

        let rebase = self.pool.rebase_vault(rate, self.vault.amount)?;
        let DepositOutcome {
            shares,
            fee,
            transition,
        } = self.pool.deposit(amount, rate, now)?;
        announce(self.pool.key(), &self.pool, transition, now);

        apply_rebase(
            &self.token_program,
            &self.pool,
            &self.yield_source,
            &self.yield_bearing_mint,
            &self.vault,
            rebase,
        )?;
        if self.pool.matured {
            msg!("Pool matured on deposit, nothing locked");
            return Ok(0);
        }

        transfer_checked(
            CpiContext::new(
                self.token_program.to_account_info(),
                TransferChecked {
                    from: self.depositor_yield_bearing.to_account_info(),
                    mint: self.yield_bearing_mint.to_account_info(),
                    to: self.vault.to_account_info(),
                    authority: self.depositor.to_account_info(),
                },
            ),
            amount,
            self.yield_bearing_mint.decimals,
        )?;

        mint_claims(
            &self.token_program,
            &self.pool,
            &self.principal_mint,
            &self.yield_mint,
            &self.recipient_principal,
            &self.recipient_yield,
            shares,
        )?;

        emit!(Deposited {
            pool: self.pool.key(),
            depositor: self.depositor.key(),
            recipient: self.recipient.key(),
            backing_amount: 0,
            yield_bearing_amount: amount,
            shares,
            fee,
            rate,
        });

        Ok(shares)
    }
}

/// Accounts for depositing backing, wrapped through the yield source
#[derive(Accounts)]
pub struct DepositBacking<'info> {
    #[account(mut)]
    pub depositor: Signer<'info>,

    #[account(constraint = controller.key() == pool.controller @ AuthError::NotController)]
    pub controller: Signer<'info>,

    #[account(
        mut,
        has_one = yield_source,
        has_one = yield_bearing_mint,
        has_one = backing_mint,
        has_one = principal_mint,
        has_one = yield_mint,
        has_one = vault,
    )]
    pub pool: Box<Account<'info, TempusPool>>,

    #[account(has_one = backing_reserve)]
    pub yield_source: Box<Account<'info, YieldSource>>,

    pub backing_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut)]
    pub yield_bearing_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut)]
    pub principal_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut)]
    pub yield_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut)]
    pub vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(mut)]
    pub backing_reserve: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        token::mint = backing_mint,
        token::authority = depositor,
    )]
    pub depositor_backing: Box<InterfaceAccount<'info, TokenAccount>>,

    /// CHECK: only receives the minted claims
    #[account(constraint = recipient.key() != Pubkey::default() @ PoolError::ZeroRecipient)]
    pub recipient: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = depositor,
        associated_token::mint = principal_mint,
        associated_token::authority = recipient,
        associated_token::token_program = token_program,
    )]
    pub recipient_principal: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = depositor,
        associated_token::mint = yield_mint,
        associated_token::authority = recipient,
        associated_token::token_program = token_program,
    )]
    pub recipient_yield: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

impl<'info> DepositBacking<'info> {
    pub fn deposit_backing(&mut self, amount: u64) -> Result<u64> {
        require!(amount > 0, PoolError::ZeroBackingTokenAmount);
        let now = Clock::get()?.unix_timestamp;
        let rate = self.yield_source.current_rate();

        let wrapped = self.yield_source.deposit_backing(amount)?;
        let rebase = self.pool.rebase_vault(rate, self.vault.amount)?;
        let DepositOutcome {
            shares,
            fee,
            transition,
        } = self.pool.deposit(wrapped, rate, now)?;
        announce(self.pool.key(), &self.pool, transition, now);

        apply_rebase(
            &self.token_program,
            &self.pool,
            &self.yield_source,
            &self.yield_bearing_mint,
            &self.vault,
            rebase,
        )?;
        if self.pool.matured {
            msg!("Pool matured on deposit, nothing locked");
            return Ok(0);
        }

        transfer_checked(
            CpiContext::new(
                self.token_program.to_account_info(),
                TransferChecked {
                    from: self.depositor_backing.to_account_info(),
                    mint: self.backing_mint.to_account_info(),
                    to: self.backing_reserve.to_account_info(),
                    authority: self.depositor.to_account_info(),
                },
            ),
            amount,
            self.backing_mint.decimals,
        )?;

        with_source_signer(&self.yield_source, |signer| {
            mint_to(
                CpiContext::new_with_signer(
                    self.token_program.to_account_info(),
                    MintTo {
                        mint: self.yield_bearing_mint.to_account_info(),
                        to: self.vault.to_account_info(),
                        authority: self.yield_source.to_account_info(),
                    },
                    signer,
                ),
                wrapped,
            )
        })?;

        mint_claims(
            &self.token_program,
            &self.pool,
            &self.principal_mint,
            &self.yield_mint,
            &self.recipient_principal,
            &self.recipient_yield,
            shares,
        )?;

        emit!(Deposited {
            pool: self.pool.key(),
            depositor: self.depositor.key(),
            recipient: self.recipient.key(),
            backing_amount: amount,
            yield_bearing_amount: wrapped,
            shares,
            fee,
            rate,
        });

        Ok(shares)
    }
}
