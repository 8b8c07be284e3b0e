//! Locked Yield Recovery (owner only)
//!
//! If the yield source reports a zero rate, claims can no longer be valued
//! and the vault would stay locked forever. The owner may then sweep the
//! entire vault to a recipient of their choice.

use anchor_lang::prelude::*;
use anchor_spl::token_interface::{
    transfer_checked, Mint, TokenAccount, TokenInterface, TransferChecked,
};

use crate::accounting::PoolError;
use crate::state::{TempusPool, YieldAdapter, YieldSource};

use super::{announce, with_pool_signer, AuthError};

#[event]
pub struct LockedYieldRecovered {
    pub pool: Pubkey,
    pub recipient: Pubkey,
    pub amount: u64,
}

/// Accounts for sweeping the vault
#[derive(Accounts)]
pub struct RecoverLocked<'info> {
    pub owner: Signer<'info>,

    #[account(
        mut,
        has_one = owner @ AuthError::NotOwner,
        has_one = yield_source,
        has_one = yield_bearing_mint,
        has_one = vault,
    )]
    pub pool: Box<Account<'info, TempusPool>>,

    pub yield_source: Box<Account<'info, YieldSource>>,

    pub yield_bearing_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut)]
    pub vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        token::mint = yield_bearing_mint,
        constraint = recipient.owner != Pubkey::default() @ PoolError::ZeroRecipient,
    )]
    pub recipient: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
}

impl<'info> RecoverLocked<'info> {
    pub fn recover_locked(&mut self) -> Result<u64> {
        let now = Clock::get()?.unix_timestamp;
        let rate = self.yield_source.current_rate();
        let transition = self.pool.observe_rate(rate, now);
        let amount = self.pool.recover_locked(rate, self.vault.amount)?;
        announce(self.pool.key(), &self.pool, transition, now);

        with_pool_signer(&self.pool, |signer| {
            transfer_checked(
                CpiContext::new_with_signer(
                    self.token_program.to_account_info(),
                    TransferChecked {
                        from: self.vault.to_account_info(),
                        mint: self.yield_bearing_mint.to_account_info(),
                        to: self.recipient.to_account_info(),
                        authority: self.pool.to_account_info(),
                    },
                    signer,
                ),
                amount,
                self.yield_bearing_mint.decimals,
            )
        })?;

        msg!("Recovered {} locked yield-bearing tokens", amount);

        emit!(LockedYieldRecovered {
            pool: self.pool.key(),
            recipient: self.recipient.key(),
            amount,
        });

        Ok(amount)
    }
}
