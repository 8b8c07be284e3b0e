//! LP Rate (read only)

use anchor_lang::prelude::*;

use crate::state::{TempusAmm, TempusPool, YieldSource};

use super::pool_view;

#[derive(Accounts)]
pub struct GetRate<'info> {
    #[account(has_one = tempus_pool)]
    pub amm: Box<Account<'info, TempusAmm>>,

    #[account(has_one = yield_source)]
    pub tempus_pool: Box<Account<'info, TempusPool>>,

    pub yield_source: Box<Account<'info, YieldSource>>,
}

impl<'info> GetRate<'info> {
    /// Invariant value of one LP token (WAD), returned as return data
    pub fn get_rate(&self) -> Result<u128> {
        let now = Clock::get()?.unix_timestamp;
        let view = pool_view(&self.tempus_pool, &self.yield_source, now)?;
        self.amm.get_rate(&view)
    }
}
