//! Amplification schedule
//!
//! `A` moves linearly from `start_value` at `start_time` to `end_value` at
//! `end_time` and stays there afterwards. Values carry [`AMP_PRECISION`].

use anchor_lang::prelude::*;

use crate::constants::{AMP_PRECISION, MAX_AMP, MIN_AMP, MIN_UPDATE_TIME};
use crate::math::{AmmError, MathError};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, InitSpace, Debug)]
pub struct AmplificationSchedule {
    pub start_value: u128,
    pub end_value: u128,
    pub start_time: i64,
    pub end_time: i64,
}

fn checked_precise(raw: u64) -> Result<u128> {
    let raw = raw as u128;
    require!(raw >= MIN_AMP, AmmError::MinAmp);
    require!(raw <= MAX_AMP, AmmError::MaxAmp);
    Ok(raw * AMP_PRECISION)
}

impl AmplificationSchedule {
    /// Ramp from `start` to `end` (unscaled) over `[start_time, end_time]`
    ///
    /// Equal values give a constant schedule.
    pub fn new(start: u64, end: u64, start_time: i64, end_time: i64) -> Result<Self> {
        let start_value = checked_precise(start)?;
        let end_value = checked_precise(end)?;
        if start_value != end_value {
            let duration = end_time.checked_sub(start_time).ok_or(MathError::Overflow)?;
            require!(duration >= MIN_UPDATE_TIME, AmmError::AmpEndTimeTooClose);
        }
        Ok(Self {
            start_value,
            end_value,
            start_time,
            end_time,
        })
    }

    pub fn value(&self, now: i64) -> u128 {
        if now >= self.end_time || self.start_value == self.end_value {
            return self.end_value;
        }
        if now <= self.start_time {
            return self.start_value;
        }

        let elapsed = (now - self.start_time) as u128;
        let duration = (self.end_time - self.start_time) as u128;
        if self.end_value > self.start_value {
            self.start_value + (self.end_value - self.start_value) * elapsed / duration
        } else {
            self.start_value - (self.start_value - self.end_value) * elapsed / duration
        }
    }

    pub fn is_updating(&self, now: i64) -> bool {
        self.start_value != self.end_value && now < self.end_time
    }

    /// Begin ramping from the current value towards `target` (unscaled)
    pub fn start_update(&mut self, target: u64, end_time: i64, now: i64) -> Result<()> {
        require!(!self.is_updating(now), AmmError::AmpOngoingUpdate);
        let end_value = checked_precise(target)?;
        let duration = end_time.checked_sub(now).ok_or(MathError::Overflow)?;
        require!(duration >= MIN_UPDATE_TIME, AmmError::AmpEndTimeTooClose);

        *self = Self {
            start_value: self.value(now),
            end_value,
            start_time: now,
            end_time,
        };
        Ok(())
    }

    /// Freeze the schedule at its current value
    pub fn stop_update(&mut self, now: i64) -> Result<u128> {
        require!(self.is_updating(now), AmmError::AmpNoOngoingUpdate);
        let current = self.value(now);
        *self = Self {
            start_value: current,
            end_value: current,
            start_time: now,
            end_time: now,
        };
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 24 * 60 * 60;

    #[test]
    fn test_linear_interpolation() {
        let schedule = AmplificationSchedule::new(10, 20, 0, 10 * DAY).unwrap();
        assert_eq!(schedule.value(0), 10_000);
        assert_eq!(schedule.value(5 * DAY), 15_000);
        assert_eq!(schedule.value(10 * DAY), 20_000);
        assert_eq!(schedule.value(30 * DAY), 20_000);

        let falling = AmplificationSchedule::new(20, 10, 0, 10 * DAY).unwrap();
        assert_eq!(falling.value(DAY), 19_000);
    }

    #[test]
    fn test_bounds() {
        let err = AmplificationSchedule::new(0, 5, 0, DAY).unwrap_err();
        assert_eq!(err, error!(AmmError::MinAmp));
        let err = AmplificationSchedule::new(5, 5_001, 0, DAY).unwrap_err();
        assert_eq!(err, error!(AmmError::MaxAmp));

        let err = AmplificationSchedule::new(10, 20, 0, DAY - 1).unwrap_err();
        assert_eq!(err, error!(AmmError::AmpEndTimeTooClose));
        assert!(AmplificationSchedule::new(10, 20, 0, DAY).is_ok());
        assert!(AmplificationSchedule::new(10, 10, 0, 0).is_ok());

        let mut fixed = AmplificationSchedule::new(5, 5, 0, 0).unwrap();
        let err = fixed.start_update(6, DAY - 1, 0).unwrap_err();
        assert_eq!(err, error!(AmmError::AmpEndTimeTooClose));
    }

    #[test]
    fn test_overlapping_updates_rejected() {
        let mut schedule = AmplificationSchedule::new(5, 5, 0, 0).unwrap();
        assert!(!schedule.is_updating(0));

        let err = schedule.stop_update(10).unwrap_err();
        assert_eq!(err, error!(AmmError::AmpNoOngoingUpdate));

        schedule.start_update(105, 10 + 2 * DAY, 10).unwrap();
        assert!(schedule.is_updating(10 + DAY));
        let err = schedule.start_update(50, 10 + 5 * DAY, 10 + DAY).unwrap_err();
        assert_eq!(err, error!(AmmError::AmpOngoingUpdate));

        // Halfway: 5 -> 105
        let frozen = schedule.stop_update(10 + DAY).unwrap();
        assert_eq!(frozen, 55_000);
        assert_eq!(schedule.value(10 + 10 * DAY), 55_000);
        assert!(!schedule.is_updating(10 + DAY));
    }
}
