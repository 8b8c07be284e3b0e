//! Redemptions
//!
//! Burn Principal and/or Yield and pay out their value in yield-bearing
//! tokens, or in backing through the yield source. Before maturity both
//! amounts must be equal; afterwards either claim can be redeemed alone.

use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token_interface::{
        burn, transfer_checked, Burn, Mint, TokenAccount, TokenInterface, TransferChecked,
    },
};

use crate::accounting::{PoolError, RedeemOutcome};
use crate::state::{TempusPool, YieldAdapter, YieldSource};

use super::rebase::apply_rebase;
use super::{announce, with_pool_signer, with_source_signer, AuthError};

#[event]
pub struct Redeemed {
    pub pool: Pubkey,
    pub redeemer: Pubkey,
    pub recipient: Pubkey,
    pub principal_amount: u64,
    pub yield_amount: u64,
    pub yield_bearing_amount: u64,
    /// Zero when paid out in yield-bearing tokens
    pub backing_amount: u64,
    pub fee: u64,
    pub rate: u128,
    pub matured: bool,
}

/// Burn both claims from the redeemer, skipping zero amounts
fn burn_claims<'info>(
    token_program: &Interface<'info, TokenInterface>,
    redeemer: &Signer<'info>,
    burns: [(AccountInfo<'info>, AccountInfo<'info>, u64); 2],
) -> Result<()> {
    for (mint, from, amount) in burns {
        if amount == 0 {
            continue;
        }
        burn(
            CpiContext::new(
                token_program.to_account_info(),
                Burn {
                    mint,
                    from,
                    authority: redeemer.to_account_info(),
                },
            ),
            amount,
        )?;
    }
    Ok(())
}

/// Accounts for redeeming into yield-bearing tokens
#[derive(Accounts)]
pub struct RedeemToYieldBearing<'info> {
    #[account(mut)]
    pub redeemer: Signer<'info>,

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
        token::mint = principal_mint,
        token::authority = redeemer,
    )]
    pub redeemer_principal: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        token::mint = yield_mint,
        token::authority = redeemer,
    )]
    pub redeemer_yield: Box<InterfaceAccount<'info, TokenAccount>>,

    /// CHECK: only receives the payout
    #[account(constraint = recipient.key() != Pubkey::default() @ PoolError::ZeroRecipient)]
    pub recipient: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = redeemer,
        associated_token::mint = yield_bearing_mint,
        associated_token::authority = recipient,
        associated_token::token_program = token_program,
    )]
    pub recipient_yield_bearing: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

impl<'info> RedeemToYieldBearing<'info> {
    pub fn redeem_to_yield_bearing(&mut self, principal_amount: u64, yield_amount: u64) -> Result<u64> {
        let now = Clock::get()?.unix_timestamp;
        let rate = self.yield_source.current_rate();

        let rebase = self.pool.rebase_vault(rate, self.vault.amount)?;
        let RedeemOutcome {
            yield_bearing_out,
            fee,
            transition,
        } = self.pool.redeem(
            principal_amount,
            yield_amount,
            self.redeemer_principal.amount,
            self.redeemer_yield.amount,
            rate,
            now,
        )?;
        announce(self.pool.key(), &self.pool, transition, now);

        apply_rebase(
            &self.token_program,
            &self.pool,
            &self.yield_source,
            &self.yield_bearing_mint,
            &self.vault,
            rebase,
        )?;

        burn_claims(
            &self.token_program,
            &self.redeemer,
            [
                (
                    self.principal_mint.to_account_info(),
                    self.redeemer_principal.to_account_info(),
                    principal_amount,
                ),
                (
                    self.yield_mint.to_account_info(),
                    self.redeemer_yield.to_account_info(),
                    yield_amount,
                ),
            ],
        )?;

        with_pool_signer(&self.pool, |signer| {
            transfer_checked(
                CpiContext::new_with_signer(
                    self.token_program.to_account_info(),
                    TransferChecked {
                        from: self.vault.to_account_info(),
                        mint: self.yield_bearing_mint.to_account_info(),
                        to: self.recipient_yield_bearing.to_account_info(),
                        authority: self.pool.to_account_info(),
                    },
                    signer,
                ),
                yield_bearing_out,
                self.yield_bearing_mint.decimals,
            )
        })?;

        emit!(Redeemed {
            pool: self.pool.key(),
            redeemer: self.redeemer.key(),
            recipient: self.recipient.key(),
            principal_amount,
            yield_amount,
            yield_bearing_amount: yield_bearing_out,
            backing_amount: 0,
            fee,
            rate,
            matured: self.pool.matured,
        });

        Ok(yield_bearing_out)
    }
}

/// Accounts for redeeming into backing through the yield source
#[derive(Accounts)]
pub struct RedeemToBacking<'info> {
    #[account(mut)]
    pub redeemer: Signer<'info>,

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
        token::mint = principal_mint,
        token::authority = redeemer,
    )]
    pub redeemer_principal: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        token::mint = yield_mint,
        token::authority = redeemer,
    )]
    pub redeemer_yield: Box<InterfaceAccount<'info, TokenAccount>>,

    /// CHECK: only receives the payout
    #[account(constraint = recipient.key() != Pubkey::default() @ PoolError::ZeroRecipient)]
    pub recipient: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = redeemer,
        associated_token::mint = backing_mint,
        associated_token::authority = recipient,
        associated_token::token_program = token_program,
    )]
    pub recipient_backing: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

impl<'info> RedeemToBacking<'info> {
    pub fn redeem_to_backing(&mut self, principal_amount: u64, yield_amount: u64) -> Result<u64> {
        let now = Clock::get()?.unix_timestamp;
        let rate = self.yield_source.current_rate();

        let rebase = self.pool.rebase_vault(rate, self.vault.amount)?;
        let RedeemOutcome {
            yield_bearing_out,
            fee,
            transition,
        } = self.pool.redeem(
            principal_amount,
            yield_amount,
            self.redeemer_principal.amount,
            self.redeemer_yield.amount,
            rate,
            now,
        )?;
        let backing_out = self.yield_source.redeem_to_backing(yield_bearing_out)?;
        announce(self.pool.key(), &self.pool, transition, now);

        apply_rebase(
            &self.token_program,
            &self.pool,
            &self.yield_source,
            &self.yield_bearing_mint,
            &self.vault,
            rebase,
        )?;

        burn_claims(
            &self.token_program,
            &self.redeemer,
            [
                (
                    self.principal_mint.to_account_info(),
                    self.redeemer_principal.to_account_info(),
                    principal_amount,
                ),
                (
                    self.yield_mint.to_account_info(),
                    self.redeemer_yield.to_account_info(),
                    yield_amount,
                ),
            ],
        )?;

        // Unwrap: yield-bearing tokens leave the vault, backing leaves the reserve
        with_pool_signer(&self.pool, |signer| {
            burn(
                CpiContext::new_with_signer(
                    self.token_program.to_account_info(),
                    Burn {
                        mint: self.yield_bearing_mint.to_account_info(),
                        from: self.vault.to_account_info(),
                        authority: self.pool.to_account_info(),
                    },
                    signer,
                ),
                yield_bearing_out,
            )
        })?;

        with_source_signer(&self.yield_source, |signer| {
            transfer_checked(
                CpiContext::new_with_signer(
                    self.token_program.to_account_info(),
                    TransferChecked {
                        from: self.backing_reserve.to_account_info(),
                        mint: self.backing_mint.to_account_info(),
                        to: self.recipient_backing.to_account_info(),
                        authority: self.yield_source.to_account_info(),
                    },
                    signer,
                ),
                backing_out,
                self.backing_mint.decimals,
            )
        })?;

        emit!(Redeemed {
            pool: self.pool.key(),
            redeemer: self.redeemer.key(),
            recipient: self.recipient.key(),
            principal_amount,
            yield_amount,
            yield_bearing_amount: yield_bearing_out,
            backing_amount: backing_out,
            fee,
            rate,
            matured: self.pool.matured,
        });

        Ok(backing_out)
    }
}
