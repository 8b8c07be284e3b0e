//! # Math
//!
//! Fixed point helpers shared by both engines, and the two-token StableSwap
//! solver used by the AMM.

pub mod fixed_point;
pub mod stable_math;

pub use fixed_point::*;
pub use stable_math::*;
