//! # Accounting
//!
//! Principal/Yield share issuance, redemption valuation and the pool
//! lifecycle (maturity, negative-yield halting, fees, recovery).

pub mod engine;
pub mod ledger;

pub use engine::*;
pub use ledger::*;
