//! Yield Source Adapter
//!
//! Minimal rate source: an authority reports the exchange rate, and the
//! source wraps backing into its yield-bearing token (and back) at that rate.
//! Yield is funded by the authority topping up the backing reserve. For
//! pegged sources the rate is a rebase index; pool vaults follow it through
//! `rebase_vault`.

use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token_interface::{
        burn, mint_to, transfer_checked, Burn, Mint, MintTo, TokenAccount, TokenInterface,
        TransferChecked,
    },
};

use crate::state::{AccrualConvention, AdapterError, YieldAdapter, YieldSource};

use super::with_source_signer;

#[event]
pub struct YieldSourceCreated {
    pub yield_source: Pubkey,
    pub authority: Pubkey,
    pub backing_mint: Pubkey,
    pub yield_bearing_mint: Pubkey,
    pub convention: AccrualConvention,
    pub rate: u128,
}

#[event]
pub struct RateReported {
    pub yield_source: Pubkey,
    pub rate: u128,
    pub timestamp: i64,
}

#[event]
pub struct BackingWrapped {
    pub yield_source: Pubkey,
    pub user: Pubkey,
    pub backing_amount: u64,
    pub yield_bearing_amount: u64,
}

#[event]
pub struct BackingUnwrapped {
    pub yield_source: Pubkey,
    pub user: Pubkey,
    pub yield_bearing_amount: u64,
    pub backing_amount: u64,
}

/// Accounts for creating a yield source
#[derive(Accounts)]
pub struct CreateYieldSource<'info> {
    /// Rate authority (pays for accounts)
    #[account(mut)]
    pub authority: Signer<'info>,

    pub backing_mint: InterfaceAccount<'info, Mint>,

    #[account(
        init,
        payer = authority,
        space = 8 + YieldSource::INIT_SPACE,
        seeds = [YieldSource::SEED, backing_mint.key().as_ref(), authority.key().as_ref()],
        bump,
    )]
    pub yield_source: Account<'info, YieldSource>,

    /// Yield-bearing token, same decimals as backing
    #[account(
        init,
        payer = authority,
        mint::decimals = backing_mint.decimals,
        mint::authority = yield_source,
        mint::token_program = token_program,
        seeds = [YieldSource::MINT_SEED, yield_source.key().as_ref()],
        bump,
    )]
    pub yield_bearing_mint: InterfaceAccount<'info, Mint>,

    #[account(
        init,
        payer = authority,
        associated_token::mint = backing_mint,
        associated_token::authority = yield_source,
        associated_token::token_program = token_program,
    )]
    pub backing_reserve: InterfaceAccount<'info, TokenAccount>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

impl<'info> CreateYieldSource<'info> {
    pub fn create_yield_source(
        &mut self,
        convention: AccrualConvention,
        initial_rate: u128,
        backing_deposits: bool,
        backing_redemptions: bool,
        bumps: &CreateYieldSourceBumps,
    ) -> Result<()> {
        require!(initial_rate > 0, AdapterError::ZeroRate);
        let now = Clock::get()?.unix_timestamp;

        self.yield_source.set_inner(YieldSource {
            authority: self.authority.key(),
            backing_mint: self.backing_mint.key(),
            yield_bearing_mint: self.yield_bearing_mint.key(),
            backing_reserve: self.backing_reserve.key(),
            convention,
            rate: initial_rate,
            updated_at: now,
            backing_deposits,
            backing_redemptions,
            bump: bumps.yield_source,
            mint_bump: bumps.yield_bearing_mint,
        });

        msg!("Yield source created: {}", self.yield_source.key());

        emit!(YieldSourceCreated {
            yield_source: self.yield_source.key(),
            authority: self.authority.key(),
            backing_mint: self.backing_mint.key(),
            yield_bearing_mint: self.yield_bearing_mint.key(),
            convention,
            rate: initial_rate,
        });

        Ok(())
    }
}

/// Accounts for reporting a new rate
#[derive(Accounts)]
pub struct ReportRate<'info> {
    pub authority: Signer<'info>,

    #[account(
        mut,
        has_one = authority @ AdapterError::Unauthorized,
    )]
    pub yield_source: Account<'info, YieldSource>,
}

impl<'info> ReportRate<'info> {
    /// Zero is accepted; it is what the pool recovery path reacts to
    pub fn report_rate(&mut self, rate: u128) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        self.yield_source.report(rate, now);

        emit!(RateReported {
            yield_source: self.yield_source.key(),
            rate,
            timestamp: now,
        });

        Ok(())
    }
}

/// Accounts for wrapping backing into yield-bearing tokens and back
#[derive(Accounts)]
pub struct Wrap<'info> {
    #[account(mut)]
    pub user: Signer<'info>,

    #[account(
        has_one = backing_mint,
        has_one = yield_bearing_mint,
        has_one = backing_reserve,
    )]
    pub yield_source: Account<'info, YieldSource>,

    pub backing_mint: InterfaceAccount<'info, Mint>,

    #[account(mut)]
    pub yield_bearing_mint: InterfaceAccount<'info, Mint>,

    #[account(mut)]
    pub backing_reserve: InterfaceAccount<'info, TokenAccount>,

    #[account(
        mut,
        associated_token::mint = backing_mint,
        associated_token::authority = user,
        associated_token::token_program = token_program,
    )]
    pub user_backing: InterfaceAccount<'info, TokenAccount>,

    #[account(
        init_if_needed,
        payer = user,
        associated_token::mint = yield_bearing_mint,
        associated_token::authority = user,
        associated_token::token_program = token_program,
    )]
    pub user_yield_bearing: InterfaceAccount<'info, TokenAccount>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

impl<'info> Wrap<'info> {
    pub fn wrap_backing(&mut self, amount: u64) -> Result<u64> {
        require!(amount > 0, AdapterError::ZeroAmount);
        let minted = self.yield_source.deposit_backing(amount)?;

        transfer_checked(
            CpiContext::new(
                self.token_program.to_account_info(),
                TransferChecked {
                    from: self.user_backing.to_account_info(),
                    mint: self.backing_mint.to_account_info(),
                    to: self.backing_reserve.to_account_info(),
                    authority: self.user.to_account_info(),
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
                        to: self.user_yield_bearing.to_account_info(),
                        authority: self.yield_source.to_account_info(),
                    },
                    signer,
                ),
                minted,
            )
        })?;

        emit!(BackingWrapped {
            yield_source: self.yield_source.key(),
            user: self.user.key(),
            backing_amount: amount,
            yield_bearing_amount: minted,
        });

        Ok(minted)
    }

    pub fn unwrap_yield_bearing(&mut self, amount: u64) -> Result<u64> {
        require!(amount > 0, AdapterError::ZeroAmount);
        let released = self.yield_source.redeem_to_backing(amount)?;

        burn(
            CpiContext::new(
                self.token_program.to_account_info(),
                Burn {
                    mint: self.yield_bearing_mint.to_account_info(),
                    from: self.user_yield_bearing.to_account_info(),
                    authority: self.user.to_account_info(),
                },
            ),
            amount,
        )?;

        with_source_signer(&self.yield_source, |signer| {
            transfer_checked(
                CpiContext::new_with_signer(
                    self.token_program.to_account_info(),
                    TransferChecked {
                        from: self.backing_reserve.to_account_info(),
                        mint: self.backing_mint.to_account_info(),
                        to: self.user_backing.to_account_info(),
                        authority: self.yield_source.to_account_info(),
                    },
                    signer,
                ),
                released,
                self.backing_mint.decimals,
            )
        })?;

        emit!(BackingUnwrapped {
            yield_source: self.yield_source.key(),
            user: self.user.key(),
            yield_bearing_amount: amount,
            backing_amount: released,
        });

        Ok(released)
    }
}
