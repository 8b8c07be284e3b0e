//! Claim AMM instructions
//!
//! The AMM never writes to its Tempus pool. It reads the pool's share prices
//! after applying the live rate to a copy of the pool state.

pub mod amp_update;
pub mod exit;
pub mod init_amm;
pub mod join;
pub mod lp_rate;
pub mod swap;

pub use amp_update::*;
pub use exit::*;
pub use init_amm::*;
pub use join::*;
pub use lp_rate::*;
pub use swap::*;

use anchor_lang::prelude::*;

use crate::amm::PoolView;
use crate::state::{TempusPool, YieldAdapter, YieldSource};

/// Pool state as of `now` with the live rate applied
pub fn pool_view(pool: &TempusPool, source: &YieldSource, now: i64) -> Result<PoolView> {
    let mut pool = pool.clone();
    pool.observe_rate(source.current_rate(), now);
    Ok(PoolView {
        share_prices: pool.share_prices()?,
        matured: pool.has_matured(now),
        now,
    })
}
