//! Finalization and Rate Refresh
//!
//! Both are permissionless. `finalize` freezes the maturity rate once maturity
//! time has passed; `refresh_rate` only observes the current rate, which is
//! enough to open, close or trip the negative-yield halt.

use anchor_lang::prelude::*;

use crate::accounting::Transition;
use crate::state::{TempusPool, YieldAdapter, YieldSource};

#[event]
pub struct PoolFinalized {
    pub pool: Pubkey,
    pub maturity_rate: u128,
    pub timestamp: i64,
}

#[event]
pub struct PoolHalted {
    pub pool: Pubkey,
    pub maturity_rate: u128,
    pub halt_time: i64,
}

/// Log and emit a lifecycle change reported by the accounting engine
pub fn announce(pool_key: Pubkey, pool: &TempusPool, transition: Option<Transition>, now: i64) {
    match transition {
        Some(Transition::Matured) => {
            msg!("Pool matured at rate {}", pool.maturity_rate);
            emit!(PoolFinalized {
                pool: pool_key,
                maturity_rate: pool.maturity_rate,
                timestamp: now,
            });
        }
        Some(Transition::Halted) => {
            msg!("Pool halted after sustained negative yield");
            emit!(PoolHalted {
                pool: pool_key,
                maturity_rate: pool.maturity_rate,
                halt_time: now,
            });
        }
        None => {}
    }
}

/// Accounts for finalize / refresh_rate
#[derive(Accounts)]
pub struct RefreshPool<'info> {
    pub caller: Signer<'info>,

    #[account(mut, has_one = yield_source)]
    pub pool: Box<Account<'info, TempusPool>>,

    pub yield_source: Account<'info, YieldSource>,
}

impl<'info> RefreshPool<'info> {
    pub fn finalize(&mut self) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let rate = self.yield_source.current_rate();
        let transition = self.pool.finalize(rate, now)?;
        announce(self.pool.key(), &self.pool, transition, now);
        Ok(())
    }

    pub fn refresh_rate(&mut self) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let rate = self.yield_source.current_rate();
        let transition = self.pool.observe_rate(rate, now);
        announce(self.pool.key(), &self.pool, transition, now);
        Ok(())
    }
}
