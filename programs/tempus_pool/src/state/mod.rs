//! Account state for yield sources, Tempus pools and their AMMs

pub mod amm;
pub mod pool;
pub mod yield_source;

pub use amm::*;
pub use pool::*;
pub use yield_source::*;
