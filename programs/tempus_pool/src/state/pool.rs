//! Tempus Pool State
//!
//! One pool per (yield source, maturity). The pool holds the yield-bearing
//! tokens and is the mint authority of both claim tokens.

use anchor_lang::prelude::*;

use crate::accounting::ClaimLedger;
use crate::state::AccrualConvention;

/// Pool account (PDA)
///
/// Seeds: ["tempus_pool", yield_source, maturity_time.to_le_bytes()]
#[account]
#[derive(InitSpace, Debug)]
pub struct TempusPool {
    /// May change fees, collect fees and run the zero-rate recovery
    pub owner: Pubkey,

    /// Only signer allowed to move principal/yield (deposit and redeem)
    pub controller: Pubkey,

    /// Rate source this pool reads
    pub yield_source: Pubkey,

    pub yield_bearing_mint: Pubkey,
    pub backing_mint: Pubkey,
    pub principal_mint: Pubkey,
    pub yield_mint: Pubkey,

    /// Yield-bearing token vault owned by the pool PDA
    pub vault: Pubkey,

    /// Copied from the yield source at creation
    pub convention: AccrualConvention,

    /// Rate at creation (WAD)
    pub initial_rate: u128,

    /// Last observed rate (WAD)
    pub current_rate: u128,

    /// Rate frozen at finalization, 0 before
    pub maturity_rate: u128,

    /// Rate the vault balance was last rebased to (pegged sources)
    pub vault_rate: u128,

    pub start_time: i64,
    pub maturity_time: i64,

    /// Set once when negative yield outlasted `halt_threshold`
    pub halt_time: Option<i64>,

    /// Open negative yield period, if any
    pub negative_yield: Option<NegativeYieldWindow>,

    /// Seconds of negative yield tolerated before halting
    pub halt_threshold: i64,

    /// Expected yield over the pool's life (WAD), seeds AMM prices
    pub estimated_yield: u128,

    pub fees: FeeSchedule,

    /// Caps for `fees`, fixed at creation
    pub max_fees: FeeSchedule,

    /// Collected fees in yield-bearing token units
    pub accumulated_fees: u64,

    pub ledger: ClaimLedger,

    /// Finalized, either at maturity or by halting
    pub matured: bool,

    /// PDA bump seed
    pub bump: u8,
}

impl TempusPool {
    pub const SEED: &'static [u8] = b"tempus_pool";
    pub const PRINCIPAL_SEED: &'static [u8] = b"principal";
    pub const YIELD_SEED: &'static [u8] = b"yield";
}

/// Fee percentages (WAD), each in [0, 1)
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, InitSpace, Debug, Default)]
pub struct FeeSchedule {
    pub deposit: u128,
    pub early_redeem: u128,
    pub mature_redeem: u128,
}

/// A period during which the rate stayed below `reference_rate`
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, InitSpace, Debug)]
pub struct NegativeYieldWindow {
    /// When the drop was first observed
    pub since: i64,
    /// Rate observed right before the drop
    pub reference_rate: u128,
}

/// Creation parameters for a pool
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct CreatePoolParams {
    /// Unix timestamp at which the pool matures
    pub maturity_time: i64,

    /// Expected yield over the pool's life (WAD)
    pub estimated_yield: u128,

    /// Signer authorized to deposit and redeem
    pub controller: Pubkey,

    pub fees: FeeSchedule,
    pub max_fees: FeeSchedule,

    /// Defaults to seven days
    pub halt_threshold: Option<i64>,
}
