//! Pool Fees (owner only)
//!
//! Fees accrue in yield-bearing tokens inside the vault. The owner can lower
//! or raise them up to the caps fixed at creation, and withdraw what has
//! accrued (`u64::MAX` withdraws everything).

use anchor_lang::prelude::*;
use anchor_spl::token_interface::{
    transfer_checked, Mint, TokenAccount, TokenInterface, TransferChecked,
};

use crate::accounting::PoolError;
use crate::state::{FeeSchedule, TempusPool};

use super::{with_pool_signer, AuthError};

#[event]
pub struct FeeConfigUpdated {
    pub pool: Pubkey,
    pub fees: FeeSchedule,
}

#[event]
pub struct FeesTransferred {
    pub pool: Pubkey,
    pub recipient: Pubkey,
    pub amount: u64,
}

/// Accounts for changing the fee schedule
#[derive(Accounts)]
pub struct SetFeeConfig<'info> {
    pub owner: Signer<'info>,

    #[account(mut, has_one = owner @ AuthError::NotOwner)]
    pub pool: Box<Account<'info, TempusPool>>,
}

impl<'info> SetFeeConfig<'info> {
    pub fn set_fee_config(&mut self, fees: FeeSchedule) -> Result<()> {
        fees.check_within(&self.pool.max_fees)?;
        self.pool.fees = fees;

        emit!(FeeConfigUpdated {
            pool: self.pool.key(),
            fees,
        });

        Ok(())
    }
}

/// Accounts for withdrawing accumulated fees
#[derive(Accounts)]
pub struct TransferFees<'info> {
    pub owner: Signer<'info>,

    #[account(
        mut,
        has_one = owner @ AuthError::NotOwner,
        has_one = yield_bearing_mint,
        has_one = vault,
    )]
    pub pool: Box<Account<'info, TempusPool>>,

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

impl<'info> TransferFees<'info> {
    pub fn transfer_fees(&mut self, amount: u64) -> Result<u64> {
        let amount = self.pool.take_fees(amount)?;

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

        msg!("Fees transferred: {}", amount);

        emit!(FeesTransferred {
            pool: self.pool.key(),
            recipient: self.recipient.key(),
            amount,
        });

        Ok(amount)
    }
}
