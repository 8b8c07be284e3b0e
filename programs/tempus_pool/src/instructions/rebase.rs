//! Pegged Vault Rebasing
//!
//! Pegged yield-bearing tokens pay yield as balance growth. The yield source
//! mints that growth into pool vaults (or burns it back on a loss) whenever
//! a pool touches its vault, and anyone can trigger it with `rebase_vault`.
//! Wallet balances are not rebased.

use anchor_lang::prelude::*;
use anchor_spl::token_interface::{burn, mint_to, Burn, Mint, MintTo, TokenAccount, TokenInterface};

use crate::accounting::Rebase;
use crate::state::{TempusPool, YieldAdapter, YieldSource};

use super::{with_pool_signer, with_source_signer};

#[event]
pub struct VaultRebased {
    pub pool: Pubkey,
    pub rate: u128,
    pub minted: u64,
    pub burned: u64,
}

/// Move tokens for a rebase already applied to the pool state
pub(crate) fn apply_rebase<'info>(
    token_program: &Interface<'info, TokenInterface>,
    pool: &Account<'info, TempusPool>,
    yield_source: &Account<'info, YieldSource>,
    yield_bearing_mint: &InterfaceAccount<'info, Mint>,
    vault: &InterfaceAccount<'info, TokenAccount>,
    rebase: Rebase,
) -> Result<()> {
    let (minted, burned) = match rebase {
        Rebase::Unchanged => return Ok(()),
        Rebase::Mint(amount) => {
            with_source_signer(yield_source, |signer| {
                mint_to(
                    CpiContext::new_with_signer(
                        token_program.to_account_info(),
                        MintTo {
                            mint: yield_bearing_mint.to_account_info(),
                            to: vault.to_account_info(),
                            authority: yield_source.to_account_info(),
                        },
                        signer,
                    ),
                    amount,
                )
            })?;
            (amount, 0)
        }
        Rebase::Burn(amount) => {
            with_pool_signer(pool, |signer| {
                burn(
                    CpiContext::new_with_signer(
                        token_program.to_account_info(),
                        Burn {
                            mint: yield_bearing_mint.to_account_info(),
                            from: vault.to_account_info(),
                            authority: pool.to_account_info(),
                        },
                        signer,
                    ),
                    amount,
                )
            })?;
            (0, amount)
        }
    };

    emit!(VaultRebased {
        pool: pool.key(),
        rate: pool.vault_rate,
        minted,
        burned,
    });

    Ok(())
}

/// Accounts for rebasing a pool vault (permissionless)
#[derive(Accounts)]
pub struct RebaseVault<'info> {
    #[account(
        mut,
        has_one = yield_source,
        has_one = yield_bearing_mint,
        has_one = vault,
    )]
    pub pool: Box<Account<'info, TempusPool>>,

    pub yield_source: Box<Account<'info, YieldSource>>,

    #[account(mut)]
    pub yield_bearing_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut)]
    pub vault: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
}

impl<'info> RebaseVault<'info> {
    pub fn rebase_vault(&mut self) -> Result<()> {
        let rate = self.yield_source.current_rate();
        let rebase = self.pool.rebase_vault(rate, self.vault.amount)?;
        if rebase == Rebase::Unchanged {
            msg!("Vault already at rate {}", rate);
        }

        apply_rebase(
            &self.token_program,
            &self.pool,
            &self.yield_source,
            &self.yield_bearing_mint,
            &self.vault,
            rebase,
        )
    }
}
