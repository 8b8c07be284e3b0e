//! # Fixed Point Arithmetic
//!
//! Rates, fee percentages and upscaled balances are `u128` values scaled by
//! [`WAD`] (1e18). Products are taken in 256-bit space so that two WAD values
//! can be multiplied before the division brings the result back down.
//!
//! ```text
//! mul_down(a, b) = floor(a * b / 1e18)
//! div_down(a, b) = floor(a * 1e18 / b)
//! ```
//!
//! Every helper has an `_up` twin. Amounts paid *to* the pool round up,
//! amounts paid *by* the pool round down.

use anchor_lang::prelude::*;

mod wide {
    use uint::construct_uint;

    construct_uint! {
        /// 256-bit unsigned integer for intermediate products.
        pub struct U256(4);
    }
}

pub use wide::U256;

/// 1.0 in fixed point
pub const WAD: u128 = 1_000_000_000_000_000_000;

#[error_code]
pub enum MathError {
    #[msg("Arithmetic overflow")]
    Overflow,
    #[msg("Division by zero")]
    DivisionByZero,
}

/// Back to `u128`, failing on overflow
pub(crate) fn narrow(x: U256) -> Result<u128> {
    require!(x <= U256::from(u128::MAX), MathError::Overflow);
    Ok(x.as_u128())
}

/// floor(a * b / c)
pub fn mul_div_down(a: u128, b: u128, c: u128) -> Result<u128> {
    require!(c != 0, MathError::DivisionByZero);
    let product = U256::from(a)
        .checked_mul(U256::from(b))
        .ok_or(MathError::Overflow)?;
    narrow(product / U256::from(c))
}

/// ceil(a * b / c)
pub fn mul_div_up(a: u128, b: u128, c: u128) -> Result<u128> {
    require!(c != 0, MathError::DivisionByZero);
    let product = U256::from(a)
        .checked_mul(U256::from(b))
        .ok_or(MathError::Overflow)?;
    if product.is_zero() {
        return Ok(0);
    }
    narrow((product - U256::one()) / U256::from(c) + U256::one())
}

pub fn mul_down(a: u128, b: u128) -> Result<u128> {
    mul_div_down(a, b, WAD)
}

pub fn mul_up(a: u128, b: u128) -> Result<u128> {
    mul_div_up(a, b, WAD)
}

pub fn div_down(a: u128, b: u128) -> Result<u128> {
    mul_div_down(a, WAD, b)
}

pub fn div_up(a: u128, b: u128) -> Result<u128> {
    mul_div_up(a, WAD, b)
}

/// `1 - x`, clamped at zero
pub fn complement(x: u128) -> u128 {
    WAD.saturating_sub(x)
}

/// Narrow a token quantity back to SPL's `u64`
pub fn to_token_amount(x: u128) -> Result<u64> {
    u64::try_from(x).map_err(|_| error!(MathError::Overflow))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_direction() {
        // 1 / 3 in WAD
        let third = div_down(1, 3).unwrap();
        assert_eq!(third, 333_333_333_333_333_333);
        assert_eq!(div_up(1, 3).unwrap(), third + 1);

        assert_eq!(mul_down(third, 3).unwrap(), 0);
        assert_eq!(mul_up(third, 3).unwrap(), 1);
        assert_eq!(mul_up(0, 3).unwrap(), 0);
    }

    #[test]
    fn test_wide_products_do_not_overflow() {
        // (1e30 * 1e30) / 1e30 needs 200 bits in the middle
        let big = 1_000_000_000_000_000_000_000_000_000_000u128;
        assert_eq!(mul_div_down(big, big, big).unwrap(), big);
        assert!(mul_down(u128::MAX, u128::MAX).is_err());
    }

    #[test]
    fn test_division_by_zero_is_an_error() {
        assert!(div_down(WAD, 0).is_err());
        assert!(mul_div_up(1, 1, 0).is_err());
    }

    #[test]
    fn test_complement_and_narrowing() {
        assert_eq!(complement(WAD / 4), 3 * WAD / 4);
        assert_eq!(complement(2 * WAD), 0);
        assert_eq!(to_token_amount(u64::MAX as u128).unwrap(), u64::MAX);
        assert!(to_token_amount(u64::MAX as u128 + 1).is_err());
    }
}
