//! Instruction handlers
//!
//! - `yield_source` - create a rate source and report its exchange rate
//! - `create_pool` - open a Tempus pool for one yield source and maturity
//! - `deposit` - lock yield-bearing tokens (or backing) for Principal + Yield
//! - `redeem` - burn claims for yield-bearing tokens (or backing)
//! - `finalize` - freeze the maturity rate, refresh the rate permissionlessly
//! - `fees` - fee schedule and fee collection (owner only)
//! - `rebase` - keep pegged vault balances in step with the rate
//! - `recovery` - sweep the vault when the rate source collapsed (owner only)
//! - `claim_amm` - claim AMM: liquidity, swaps, amplification, LP rate
//!
//! Every handler reads the clock and the rate, applies the engine's state
//! transition, then moves tokens.

pub mod claim_amm;
pub mod create_pool;
pub mod deposit;
pub mod fees;
pub mod finalize;
pub mod rebase;
pub mod recovery;
pub mod redeem;
pub mod yield_source;

pub use claim_amm::*;
pub use create_pool::*;
pub use deposit::*;
pub use fees::*;
pub use finalize::*;
pub use rebase::*;
pub use recovery::*;
pub use redeem::*;
pub use yield_source::*;

use anchor_lang::prelude::*;

use crate::state::{TempusAmm, TempusPool, YieldSource};

#[error_code(offset = 6400)]
pub enum AuthError {
    #[msg("Only callable by TempusController")]
    NotController,
    #[msg("Only callable by owner")]
    NotOwner,
}

/// Run `f` with the pool PDA signer seeds
pub(crate) fn with_pool_signer<T>(
    pool: &TempusPool,
    f: impl FnOnce(&[&[&[u8]]]) -> Result<T>,
) -> Result<T> {
    let maturity = pool.maturity_time.to_le_bytes();
    let bump = [pool.bump];
    let seeds: &[&[u8]] = &[TempusPool::SEED, pool.yield_source.as_ref(), &maturity, &bump];
    f(&[seeds])
}

/// Run `f` with the yield source PDA signer seeds
pub(crate) fn with_source_signer<T>(
    source: &YieldSource,
    f: impl FnOnce(&[&[&[u8]]]) -> Result<T>,
) -> Result<T> {
    let bump = [source.bump];
    let seeds: &[&[u8]] = &[
        YieldSource::SEED,
        source.backing_mint.as_ref(),
        source.authority.as_ref(),
        &bump,
    ];
    f(&[seeds])
}

/// Run `f` with the AMM PDA signer seeds
pub(crate) fn with_amm_signer<T>(
    amm: &TempusAmm,
    f: impl FnOnce(&[&[&[u8]]]) -> Result<T>,
) -> Result<T> {
    let bump = [amm.bump];
    let seeds: &[&[u8]] = &[TempusAmm::SEED, amm.tempus_pool.as_ref(), &bump];
    f(&[seeds])
}
