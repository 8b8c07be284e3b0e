//! Amplification Ramps (AMM owner only)

use anchor_lang::prelude::*;

use crate::instructions::AuthError;
use crate::state::TempusAmm;

#[event]
pub struct AmpUpdateStarted {
    pub amm: Pubkey,
    pub start_value: u128,
    pub end_value: u128,
    pub start_time: i64,
    pub end_time: i64,
}

#[event]
pub struct AmpUpdateStopped {
    pub amm: Pubkey,
    pub current_value: u128,
}

/// Accounts for starting or stopping an amplification ramp
#[derive(Accounts)]
pub struct UpdateAmplification<'info> {
    pub owner: Signer<'info>,

    #[account(mut, has_one = owner @ AuthError::NotOwner)]
    pub amm: Box<Account<'info, TempusAmm>>,
}

impl<'info> UpdateAmplification<'info> {
    pub fn start_amplification_update(&mut self, target: u64, end_time: i64) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        self.amm.amplification.start_update(target, end_time, now)?;

        let schedule = self.amm.amplification;
        emit!(AmpUpdateStarted {
            amm: self.amm.key(),
            start_value: schedule.start_value,
            end_value: schedule.end_value,
            start_time: schedule.start_time,
            end_time: schedule.end_time,
        });

        Ok(())
    }

    pub fn stop_amplification_update(&mut self) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let current_value = self.amm.amplification.stop_update(now)?;

        emit!(AmpUpdateStopped {
            amm: self.amm.key(),
            current_value,
        });

        Ok(())
    }
}
