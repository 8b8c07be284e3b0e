//! Yield Source (rate source adapter)
//!
//! The pool never talks to a lending market or staking contract directly. It
//! reads an exchange rate and, for backing-asset flows, asks the source to
//! convert between backing and yield-bearing tokens. Sources differ in how
//! they pay yield; that difference is captured by [`AccrualConvention`] and
//! nothing else.

use anchor_lang::prelude::*;

use crate::math::{div_down, mul_down, to_token_amount};

#[error_code(offset = 6200)]
pub enum AdapterError {
    #[msg("depositBacking not supported")]
    BackingDepositNotSupported,
    #[msg("redeemToBacking not supported")]
    BackingRedemptionNotSupported,
    #[msg("Yield source rate is zero")]
    ZeroRate,
    #[msg("Only the rate authority can report rates")]
    Unauthorized,
    #[msg("Amount must be greater than zero")]
    ZeroAmount,
}

/// How a yield-bearing token expresses accrued yield
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, InitSpace, Debug, Default)]
pub enum AccrualConvention {
    /// Balance is constant, one token is worth `rate` backing (cToken style)
    #[default]
    PriceAppreciation,
    /// One token is worth one backing, yield shows up as balance growth
    /// (rebasing aToken / stETH style)
    Pegged,
}

impl AccrualConvention {
    /// Backing value of `amount` yield-bearing tokens at `rate`
    pub fn backing_per_yield_bearing(self, amount: u128, rate: u128) -> Result<u128> {
        match self {
            AccrualConvention::PriceAppreciation => mul_down(amount, rate),
            AccrualConvention::Pegged => Ok(amount),
        }
    }

    /// Yield-bearing tokens worth `amount` backing at `rate`
    pub fn yield_bearing_per_backing(self, amount: u128, rate: u128) -> Result<u128> {
        match self {
            AccrualConvention::PriceAppreciation => {
                require!(rate > 0, AdapterError::ZeroRate);
                div_down(amount, rate)
            }
            AccrualConvention::Pegged => Ok(amount),
        }
    }
}

/// Capabilities the accounting engine needs from a yield source
pub trait YieldAdapter {
    /// Backing per yield-bearing unit for price-appreciating tokens, or the
    /// rebase index for pegged ones (WAD)
    fn current_rate(&self) -> u128;

    fn convention(&self) -> AccrualConvention;

    /// Yield-bearing tokens issued for `amount` of backing
    fn deposit_backing(&self, amount: u64) -> Result<u64>;

    /// Backing released for `amount` of yield-bearing tokens
    fn redeem_to_backing(&self, amount: u64) -> Result<u64>;
}

/// Rate source account
///
/// Seeds: ["yield_source", backing_mint, authority]
#[account]
#[derive(InitSpace)]
pub struct YieldSource {
    /// Reports the exchange rate
    pub authority: Pubkey,

    /// Backing asset mint (e.g., USDC)
    pub backing_mint: Pubkey,

    /// Yield-bearing token mint, minted by this account's PDA
    pub yield_bearing_mint: Pubkey,

    /// Backing tokens held against outstanding yield-bearing tokens
    pub backing_reserve: Pubkey,

    pub convention: AccrualConvention,

    /// Last reported rate (WAD)
    pub rate: u128,

    /// Unix timestamp of the last report
    pub updated_at: i64,

    /// Whether backing can be wrapped through this source
    pub backing_deposits: bool,

    /// Whether yield-bearing tokens can be unwrapped to backing
    pub backing_redemptions: bool,

    pub bump: u8,
    pub mint_bump: u8,
}

impl YieldSource {
    pub const SEED: &'static [u8] = b"yield_source";
    pub const MINT_SEED: &'static [u8] = b"ybt_mint";

    pub fn report(&mut self, rate: u128, now: i64) {
        self.rate = rate;
        self.updated_at = now;
    }
}

impl YieldAdapter for YieldSource {
    fn current_rate(&self) -> u128 {
        self.rate
    }

    fn convention(&self) -> AccrualConvention {
        self.convention
    }

    fn deposit_backing(&self, amount: u64) -> Result<u64> {
        require!(self.backing_deposits, AdapterError::BackingDepositNotSupported);
        let minted = self
            .convention
            .yield_bearing_per_backing(amount as u128, self.rate)?;
        to_token_amount(minted)
    }

    fn redeem_to_backing(&self, amount: u64) -> Result<u64> {
        require!(self.backing_redemptions, AdapterError::BackingRedemptionNotSupported);
        require!(self.rate > 0, AdapterError::ZeroRate);
        let released = self
            .convention
            .backing_per_yield_bearing(amount as u128, self.rate)?;
        to_token_amount(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::WAD;

    fn source(convention: AccrualConvention, rate: u128) -> YieldSource {
        YieldSource {
            authority: Pubkey::default(),
            backing_mint: Pubkey::default(),
            yield_bearing_mint: Pubkey::default(),
            backing_reserve: Pubkey::default(),
            convention,
            rate,
            updated_at: 0,
            backing_deposits: true,
            backing_redemptions: true,
            bump: 255,
            mint_bump: 255,
        }
    }

    #[test]
    fn test_price_appreciation_conversions() {
        let src = source(AccrualConvention::PriceAppreciation, 2 * WAD);
        assert_eq!(src.deposit_backing(100).unwrap(), 50);
        assert_eq!(src.redeem_to_backing(50).unwrap(), 100);
    }

    #[test]
    fn test_pegged_conversions_ignore_rate() {
        let src = source(AccrualConvention::Pegged, 3 * WAD);
        assert_eq!(src.deposit_backing(100).unwrap(), 100);
        assert_eq!(src.redeem_to_backing(100).unwrap(), 100);
    }

    #[test]
    fn test_unsupported_redemption_rejects() {
        let mut src = source(AccrualConvention::Pegged, WAD);
        src.backing_redemptions = false;
        let err = src.redeem_to_backing(10).unwrap_err();
        assert_eq!(
            err,
            error!(AdapterError::BackingRedemptionNotSupported)
        );
        assert!(src.deposit_backing(10).is_ok());
    }

    #[test]
    fn test_zero_rate_cannot_wrap() {
        let src = source(AccrualConvention::PriceAppreciation, 0);
        assert!(src.deposit_backing(10).is_err());
        assert!(src.redeem_to_backing(10).is_err());
    }
}
