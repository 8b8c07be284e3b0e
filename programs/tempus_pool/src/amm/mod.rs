//! # Claim AMM
//!
//! StableSwap pool between a Tempus pool's Principal and Yield claims.
//! Pure state transitions on [`crate::state::TempusAmm`]; token movement is
//! left to the instruction handlers.

pub mod amplification;
pub mod pricing;

pub use amplification::*;
pub use pricing::*;
