//! Claim AMM State
//!
//! One StableSwap pool per Tempus pool, trading its Principal against its
//! Yield. Index 0 is always Principal, index 1 Yield.

use anchor_lang::prelude::*;

use crate::amm::AmplificationSchedule;

pub const PRINCIPAL: usize = 0;
pub const YIELD: usize = 1;

/// AMM account (PDA)
///
/// Seeds: ["tempus_amm", tempus_pool]
#[account]
#[derive(InitSpace, Debug)]
pub struct TempusAmm {
    /// May ramp the amplification
    pub owner: Pubkey,

    /// Pool whose claims are traded and whose share prices scale balances
    pub tempus_pool: Pubkey,

    pub principal_mint: Pubkey,
    pub yield_mint: Pubkey,

    /// LP mint, authority is this account
    pub lp_mint: Pubkey,

    pub principal_vault: Pubkey,
    pub yield_vault: Pubkey,

    /// Raw token balances held in the vaults [principal, yield]
    pub balances: [u64; 2],

    /// Outstanding LP tokens
    pub lp_supply: u64,

    /// Decimals of both claim mints
    pub decimals: u8,

    /// Swap fee (WAD)
    pub swap_fee: u128,

    pub amplification: AmplificationSchedule,

    /// Bounds for scaled principal / scaled yield after a swap (WAD)
    pub min_ratio: u128,
    pub max_ratio: u128,

    pub bump: u8,
    pub lp_mint_bump: u8,
}

impl TempusAmm {
    pub const SEED: &'static [u8] = b"tempus_amm";
    pub const LP_SEED: &'static [u8] = b"lp";

    pub fn is_initialized(&self) -> bool {
        self.lp_supply > 0
    }
}

/// Creation parameters for the AMM
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct InitAmmParams {
    /// Unscaled amplification at creation
    pub amp_start: u64,
    /// Unscaled amplification reached at the pool's maturity
    pub amp_end: u64,
    pub swap_fee: u128,
    pub min_ratio: u128,
    pub max_ratio: u128,
}
