//! Protocol tunables
//!
//! Fixed point values are WAD scaled (1e18 = 1.0).

use crate::math::WAD;

/// Negative yield must persist longer than this before the pool halts
pub const DEFAULT_HALT_THRESHOLD: i64 = 7 * 24 * 60 * 60;

/// Upper bound for every pool fee percentage (deposit, early and mature redeem)
pub const MAX_POOL_FEE: u128 = WAD / 2;

/// Amplification values are stored multiplied by this
pub const AMP_PRECISION: u128 = 1_000;
pub const MIN_AMP: u128 = 1;
pub const MAX_AMP: u128 = 5_000;

/// Shortest allowed amplification ramp
pub const MIN_UPDATE_TIME: i64 = 24 * 60 * 60;

/// 0.0001%
pub const MIN_SWAP_FEE: u128 = 1_000_000_000_000;
/// 10%
pub const MAX_SWAP_FEE: u128 = WAD / 10;

/// Newton iterations before the invariant solver gives up
pub const MAX_SOLVER_ITERATIONS: usize = 255;

/// Every balance inside the AMM math carries 18 decimals
pub const AMM_DECIMALS: u8 = 18;
