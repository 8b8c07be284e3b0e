//! Pool Creation
//!
//! Opens a pool for one yield source and one maturity. The pool PDA owns the
//! yield-bearing vault and is the mint authority of its two claim tokens.

use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token_interface::{Mint, TokenAccount, TokenInterface},
};

use crate::accounting::PoolKeys;
use crate::state::{CreatePoolParams, TempusPool, YieldAdapter, YieldSource};

#[event]
pub struct PoolCreated {
    pub pool: Pubkey,
    pub yield_source: Pubkey,
    pub owner: Pubkey,
    pub controller: Pubkey,
    pub initial_rate: u128,
    pub maturity_time: i64,
}

/// Accounts for creating a Tempus pool
#[derive(Accounts)]
#[instruction(params: CreatePoolParams)]
pub struct CreatePool<'info> {
    /// Pool owner (pays for accounts)
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(has_one = yield_bearing_mint, has_one = backing_mint)]
    pub yield_source: Box<Account<'info, YieldSource>>,

    pub yield_bearing_mint: Box<InterfaceAccount<'info, Mint>>,
    pub backing_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        init,
        payer = owner,
        space = 8 + TempusPool::INIT_SPACE,
        seeds = [
            TempusPool::SEED,
            yield_source.key().as_ref(),
            params.maturity_time.to_le_bytes().as_ref(),
        ],
        bump,
    )]
    pub pool: Box<Account<'info, TempusPool>>,

    #[account(
        init,
        payer = owner,
        mint::decimals = yield_bearing_mint.decimals,
        mint::authority = pool,
        mint::token_program = token_program,
        seeds = [TempusPool::PRINCIPAL_SEED, pool.key().as_ref()],
        bump,
    )]
    pub principal_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        init,
        payer = owner,
        mint::decimals = yield_bearing_mint.decimals,
        mint::authority = pool,
        mint::token_program = token_program,
        seeds = [TempusPool::YIELD_SEED, pool.key().as_ref()],
        bump,
    )]
    pub yield_mint: Box<InterfaceAccount<'info, Mint>>,

    /// Yield-bearing tokens locked by the pool
    #[account(
        init,
        payer = owner,
        associated_token::mint = yield_bearing_mint,
        associated_token::authority = pool,
        associated_token::token_program = token_program,
    )]
    pub vault: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

impl<'info> CreatePool<'info> {
    pub fn create_pool(&mut self, params: CreatePoolParams, bumps: &CreatePoolBumps) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let initial_rate = self.yield_source.current_rate();

        let keys = PoolKeys {
            owner: self.owner.key(),
            yield_source: self.yield_source.key(),
            yield_bearing_mint: self.yield_bearing_mint.key(),
            backing_mint: self.backing_mint.key(),
            principal_mint: self.principal_mint.key(),
            yield_mint: self.yield_mint.key(),
            vault: self.vault.key(),
        };
        let pool = TempusPool::create(
            keys,
            self.yield_source.convention(),
            initial_rate,
            now,
            &params,
            bumps.pool,
        )?;
        self.pool.set_inner(pool);

        msg!("Tempus pool created: {}", self.pool.key());
        msg!("Initial rate: {}", initial_rate);
        msg!("Maturity: {}", params.maturity_time);

        emit!(PoolCreated {
            pool: self.pool.key(),
            yield_source: self.yield_source.key(),
            owner: self.owner.key(),
            controller: params.controller,
            initial_rate,
            maturity_time: params.maturity_time,
        });

        Ok(())
    }
}
