//! # Claim AMM Pricing
//!
//! Balances enter the StableSwap math as 18-decimal values multiplied by the
//! present value of each claim (the "token rate"):
//!
//! ```text
//! scaled_i = balance_i * 10^(18 - decimals) * share_price_i
//! ```
//!
//! so that one unit of invariant is one unit of backing value. LP tokens carry
//! the claim decimals; the initial join mints `D` LP tokens.
//!
//! Rounding always favours the pool: amounts in are rounded up, amounts out
//! and LP minted are rounded down.

use anchor_lang::prelude::*;

use crate::constants::{AMM_DECIMALS, MAX_SWAP_FEE, MIN_SWAP_FEE};
use crate::math::{
    calculate_invariant, complement, div_down, div_up, in_given_out, lp_in_given_exact_tokens_out,
    lp_out_given_exact_tokens_in, mul_down, mul_up, out_given_in, to_token_amount,
    token_in_given_exact_lp_out, token_out_given_exact_lp_in, tokens_out_given_exact_lp_in,
    AmmError, MathError,
};
use crate::state::{InitAmmParams, TempusAmm, PRINCIPAL, YIELD};

use super::AmplificationSchedule;

/// What the AMM needs to know about its Tempus pool at call time
#[derive(Clone, Copy, Debug)]
pub struct PoolView {
    /// Present value of one principal and one yield share (WAD)
    pub share_prices: (u128, u128),
    pub matured: bool,
    pub now: i64,
}

/// Token in/out of a swap, in raw token units
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SwapOutcome {
    pub amount_in: u64,
    pub amount_out: u64,
    /// Part of `amount_in` kept as swap fee
    pub fee: u64,
}

/// Raw <-> scaled conversion factors
pub struct Scaling {
    /// 10^(18 - decimals)
    lp_factor: u128,
    /// 10^(18 - decimals) * share_price, per token (WAD)
    factors: [u128; 2],
}

impl Scaling {
    pub fn new(decimals: u8, share_prices: (u128, u128)) -> Result<Self> {
        let lp_factor = Self::decimal_factor(decimals)?;
        require!(
            share_prices.0 > 0 && share_prices.1 > 0,
            AmmError::ZeroTokenRate
        );
        Ok(Self {
            lp_factor,
            factors: [
                lp_factor
                    .checked_mul(share_prices.0)
                    .ok_or(MathError::Overflow)?,
                lp_factor
                    .checked_mul(share_prices.1)
                    .ok_or(MathError::Overflow)?,
            ],
        })
    }

    fn decimal_factor(decimals: u8) -> Result<u128> {
        let shift = AMM_DECIMALS
            .checked_sub(decimals)
            .ok_or(MathError::Overflow)?;
        10u128
            .checked_pow(shift as u32)
            .ok_or_else(|| error!(MathError::Overflow))
    }

    pub fn up(&self, amount: u64, index: usize) -> Result<u128> {
        mul_down(amount as u128, self.factors[index])
    }

    pub fn up_ceil(&self, amount: u64, index: usize) -> Result<u128> {
        mul_up(amount as u128, self.factors[index])
    }

    pub fn down(&self, scaled: u128, index: usize) -> Result<u64> {
        to_token_amount(div_down(scaled, self.factors[index])?)
    }

    pub fn down_ceil(&self, scaled: u128, index: usize) -> Result<u64> {
        to_token_amount(div_up(scaled, self.factors[index])?)
    }

    pub fn lp_up(&self, lp: u64) -> Result<u128> {
        (lp as u128)
            .checked_mul(self.lp_factor)
            .ok_or_else(|| error!(MathError::Overflow))
    }

    pub fn lp_down(&self, scaled: u128) -> Result<u64> {
        to_token_amount(scaled / self.lp_factor)
    }

    pub fn lp_down_ceil(&self, scaled: u128) -> Result<u64> {
        let floor = scaled / self.lp_factor;
        let rounded = if scaled % self.lp_factor == 0 {
            floor
        } else {
            floor + 1
        };
        to_token_amount(rounded)
    }
}

fn add(balance: u64, amount: u64) -> Result<u64> {
    balance
        .checked_add(amount)
        .ok_or_else(|| error!(MathError::Overflow))
}

fn sub(balance: u64, amount: u64) -> Result<u64> {
    balance
        .checked_sub(amount)
        .ok_or_else(|| error!(AmmError::InsufficientLiquidity))
}

fn check_index(index: usize) -> Result<()> {
    require!(index == PRINCIPAL || index == YIELD, AmmError::InvalidTokenIndex);
    Ok(())
}

impl TempusAmm {
    /// Validate creation parameters and build a fresh, empty AMM
    ///
    /// A differing `amp_end` ramps from `now` until `maturity_time`, which
    /// must be at least `MIN_UPDATE_TIME` away.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        owner: Pubkey,
        tempus_pool: Pubkey,
        mints: [Pubkey; 3],
        vaults: [Pubkey; 2],
        decimals: u8,
        params: &InitAmmParams,
        now: i64,
        maturity_time: i64,
        bumps: (u8, u8),
    ) -> Result<TempusAmm> {
        require!(
            (MIN_SWAP_FEE..=MAX_SWAP_FEE).contains(&params.swap_fee),
            AmmError::SwapFeeOutOfBounds
        );
        require!(
            params.min_ratio > 0 && params.min_ratio <= params.max_ratio,
            AmmError::InvalidRatioBounds
        );
        Scaling::decimal_factor(decimals)?;

        let amplification =
            AmplificationSchedule::new(params.amp_start, params.amp_end, now, maturity_time)?;

        Ok(TempusAmm {
            owner,
            tempus_pool,
            principal_mint: mints[0],
            yield_mint: mints[1],
            lp_mint: mints[2],
            principal_vault: vaults[0],
            yield_vault: vaults[1],
            balances: [0, 0],
            lp_supply: 0,
            decimals,
            swap_fee: params.swap_fee,
            amplification,
            min_ratio: params.min_ratio,
            max_ratio: params.max_ratio,
            bump: bumps.0,
            lp_mint_bump: bumps.1,
        })
    }

    pub fn scaling(&self, view: &PoolView) -> Result<Scaling> {
        Scaling::new(self.decimals, view.share_prices)
    }

    fn scaled_balances(&self, scaling: &Scaling) -> Result<[u128; 2]> {
        Ok([
            scaling.up(self.balances[PRINCIPAL], PRINCIPAL)?,
            scaling.up(self.balances[YIELD], YIELD)?,
        ])
    }

    fn invariant(&self, scaling: &Scaling, now: i64) -> Result<([u128; 2], u128)> {
        let balances = self.scaled_balances(scaling)?;
        let invariant = calculate_invariant(self.amplification.value(now), &balances)?;
        Ok((balances, invariant))
    }

    fn check_joinable(&self, view: &PoolView) -> Result<()> {
        require!(!view.matured, AmmError::PoolMatured);
        require!(self.is_initialized(), AmmError::Uninitialized);
        Ok(())
    }

    fn check_ratio(&self, scaling: &Scaling) -> Result<()> {
        let balances = self.scaled_balances(scaling)?;
        require!(balances[YIELD] > 0, AmmError::RatioOutOfBounds);
        let ratio = div_down(balances[PRINCIPAL], balances[YIELD])?;
        require!(
            ratio >= self.min_ratio && ratio <= self.max_ratio,
            AmmError::RatioOutOfBounds
        );
        Ok(())
    }

    /// First deposit; mints `D` LP tokens
    pub fn join_init(&mut self, amounts: [u64; 2], view: &PoolView) -> Result<u64> {
        require!(!self.is_initialized(), AmmError::AlreadyInitialized);
        require!(!view.matured, AmmError::PoolMatured);
        require!(amounts[0] > 0 && amounts[1] > 0, AmmError::ZeroAmount);

        let scaling = self.scaling(view)?;
        self.balances = amounts;
        let (_, invariant) = self.invariant(&scaling, view.now)?;
        let lp_out = scaling.lp_down(invariant)?;
        require!(lp_out > 0, AmmError::ZeroAmount);

        self.lp_supply = lp_out;
        Ok(lp_out)
    }

    /// Deposit an arbitrary basket; composition changes pay the swap fee
    pub fn join_exact_tokens_in(
        &mut self,
        amounts: [u64; 2],
        min_lp_out: u64,
        view: &PoolView,
    ) -> Result<u64> {
        self.check_joinable(view)?;
        require!(amounts[0] > 0 || amounts[1] > 0, AmmError::ZeroAmount);

        let scaling = self.scaling(view)?;
        let (balances, invariant) = self.invariant(&scaling, view.now)?;
        let scaled_in = [scaling.up(amounts[0], PRINCIPAL)?, scaling.up(amounts[1], YIELD)?];

        let lp_out = scaling.lp_down(lp_out_given_exact_tokens_in(
            self.amplification.value(view.now),
            &balances,
            &scaled_in,
            scaling.lp_up(self.lp_supply)?,
            invariant,
            self.swap_fee,
        )?)?;
        require!(lp_out > 0, AmmError::ZeroAmount);
        require!(lp_out >= min_lp_out, AmmError::SlippageExceeded);

        self.balances = [
            add(self.balances[0], amounts[0])?,
            add(self.balances[1], amounts[1])?,
        ];
        self.lp_supply = add(self.lp_supply, lp_out)?;
        Ok(lp_out)
    }

    /// Mint exactly `lp_out` paying with a single claim
    pub fn join_exact_lp_out(
        &mut self,
        token_index: usize,
        lp_out: u64,
        max_amount_in: u64,
        view: &PoolView,
    ) -> Result<u64> {
        check_index(token_index)?;
        self.check_joinable(view)?;
        require!(lp_out > 0, AmmError::ZeroAmount);

        let scaling = self.scaling(view)?;
        let (balances, invariant) = self.invariant(&scaling, view.now)?;

        let amount_in = scaling.down_ceil(
            token_in_given_exact_lp_out(
                self.amplification.value(view.now),
                &balances,
                token_index,
                scaling.lp_up(lp_out)?,
                scaling.lp_up(self.lp_supply)?,
                invariant,
                self.swap_fee,
            )?,
            token_index,
        )?;
        require!(amount_in <= max_amount_in, AmmError::SlippageExceeded);

        self.balances[token_index] = add(self.balances[token_index], amount_in)?;
        self.lp_supply = add(self.lp_supply, lp_out)?;
        Ok(amount_in)
    }

    /// Burn LP for a proportional share of both balances
    ///
    /// Works after maturity and with zero share prices.
    pub fn exit_exact_lp_in(&mut self, lp_in: u64, min_amounts_out: [u64; 2]) -> Result<[u64; 2]> {
        require!(lp_in > 0, AmmError::ZeroAmount);
        require!(self.is_initialized(), AmmError::Uninitialized);

        let out = tokens_out_given_exact_lp_in(
            &[self.balances[0] as u128, self.balances[1] as u128],
            lp_in as u128,
            self.lp_supply as u128,
        )?;
        let amounts = [to_token_amount(out[0])?, to_token_amount(out[1])?];
        require!(
            amounts[0] >= min_amounts_out[0] && amounts[1] >= min_amounts_out[1],
            AmmError::SlippageExceeded
        );

        self.balances = [
            sub(self.balances[0], amounts[0])?,
            sub(self.balances[1], amounts[1])?,
        ];
        self.lp_supply -= lp_in;
        Ok(amounts)
    }

    /// Withdraw an exact basket of both claims
    pub fn exit_exact_tokens_out(
        &mut self,
        amounts_out: [u64; 2],
        max_lp_in: u64,
        view: &PoolView,
    ) -> Result<u64> {
        require!(self.is_initialized(), AmmError::Uninitialized);
        require!(
            amounts_out[0] > 0 && amounts_out[1] > 0,
            AmmError::SingleTokenExit
        );

        let scaling = self.scaling(view)?;
        let (balances, invariant) = self.invariant(&scaling, view.now)?;
        let scaled_out = [
            scaling.up_ceil(amounts_out[0], PRINCIPAL)?,
            scaling.up_ceil(amounts_out[1], YIELD)?,
        ];

        let lp_in = scaling.lp_down_ceil(lp_in_given_exact_tokens_out(
            self.amplification.value(view.now),
            &balances,
            &scaled_out,
            scaling.lp_up(self.lp_supply)?,
            invariant,
            self.swap_fee,
        )?)?;
        require!(lp_in <= max_lp_in, AmmError::SlippageExceeded);
        require!(lp_in < self.lp_supply, AmmError::InsufficientLp);

        self.balances = [
            sub(self.balances[0], amounts_out[0])?,
            sub(self.balances[1], amounts_out[1])?,
        ];
        self.lp_supply -= lp_in;
        Ok(lp_in)
    }

    /// Burn exactly `lp_in` for a single claim
    pub fn exit_single_token(
        &mut self,
        token_index: usize,
        lp_in: u64,
        min_amount_out: u64,
        view: &PoolView,
    ) -> Result<u64> {
        check_index(token_index)?;
        require!(self.is_initialized(), AmmError::Uninitialized);
        require!(lp_in > 0, AmmError::ZeroAmount);

        let scaling = self.scaling(view)?;
        let (balances, invariant) = self.invariant(&scaling, view.now)?;

        let amount_out = scaling.down(
            token_out_given_exact_lp_in(
                self.amplification.value(view.now),
                &balances,
                token_index,
                scaling.lp_up(lp_in)?,
                scaling.lp_up(self.lp_supply)?,
                invariant,
                self.swap_fee,
            )?,
            token_index,
        )?;
        require!(amount_out > 0, AmmError::ZeroAmount);
        require!(amount_out >= min_amount_out, AmmError::SlippageExceeded);

        self.balances[token_index] = sub(self.balances[token_index], amount_out)?;
        self.lp_supply -= lp_in;
        Ok(amount_out)
    }

    /// Sell exactly `amount_in` of `token_in`
    pub fn swap_given_in(
        &mut self,
        token_in: usize,
        amount_in: u64,
        min_amount_out: u64,
        view: &PoolView,
    ) -> Result<SwapOutcome> {
        check_index(token_in)?;
        require!(self.is_initialized(), AmmError::Uninitialized);
        require!(amount_in > 0, AmmError::ZeroAmount);
        let token_out = 1 - token_in;

        let fee = to_token_amount(mul_up(amount_in as u128, self.swap_fee)?)?;
        let net_in = amount_in.checked_sub(fee).ok_or(MathError::Overflow)?;

        let scaling = self.scaling(view)?;
        let (balances, invariant) = self.invariant(&scaling, view.now)?;
        let amount_out = scaling.down(
            out_given_in(
                self.amplification.value(view.now),
                &balances,
                token_in,
                scaling.up(net_in, token_in)?,
                invariant,
            )?,
            token_out,
        )?;
        require!(amount_out > 0, AmmError::ZeroAmount);
        require!(amount_out >= min_amount_out, AmmError::SlippageExceeded);

        self.balances[token_in] = add(self.balances[token_in], amount_in)?;
        self.balances[token_out] = sub(self.balances[token_out], amount_out)?;
        self.check_ratio(&scaling)?;

        Ok(SwapOutcome {
            amount_in,
            amount_out,
            fee,
        })
    }

    /// Buy exactly `amount_out` of the other claim, paying in `token_in`
    pub fn swap_given_out(
        &mut self,
        token_in: usize,
        amount_out: u64,
        max_amount_in: u64,
        view: &PoolView,
    ) -> Result<SwapOutcome> {
        check_index(token_in)?;
        require!(self.is_initialized(), AmmError::Uninitialized);
        require!(amount_out > 0, AmmError::ZeroAmount);
        let token_out = 1 - token_in;

        let scaling = self.scaling(view)?;
        let (balances, invariant) = self.invariant(&scaling, view.now)?;
        let net_in = scaling.down_ceil(
            in_given_out(
                self.amplification.value(view.now),
                &balances,
                token_in,
                scaling.up_ceil(amount_out, token_out)?,
                invariant,
            )?,
            token_in,
        )?;

        let amount_in = to_token_amount(div_up(net_in as u128, complement(self.swap_fee))?)?;
        require!(amount_in <= max_amount_in, AmmError::SlippageExceeded);

        self.balances[token_in] = add(self.balances[token_in], amount_in)?;
        self.balances[token_out] = sub(self.balances[token_out], amount_out)?;
        self.check_ratio(&scaling)?;

        Ok(SwapOutcome {
            amount_in,
            amount_out,
            fee: amount_in - net_in,
        })
    }

    /// Invariant value per LP token (WAD), informational
    pub fn get_rate(&self, view: &PoolView) -> Result<u128> {
        require!(self.is_initialized(), AmmError::Uninitialized);
        let scaling = self.scaling(view)?;
        let (_, invariant) = self.invariant(&scaling, view.now)?;
        div_down(invariant, scaling.lp_up(self.lp_supply)?)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::WAD;

    const DAY: i64 = 24 * 60 * 60;
    const UNIT: u64 = 1_000_000;

    /// Share prices of a fresh pool expecting 10% yield
    fn view() -> PoolView {
        PoolView {
            share_prices: (WAD * 10 / 11, WAD / 11),
            matured: false,
            now: DAY,
        }
    }

    fn amm(amp: u64) -> TempusAmm {
        let params = InitAmmParams {
            amp_start: amp,
            amp_end: amp,
            swap_fee: WAD / 100,
            min_ratio: WAD / 10,
            max_ratio: WAD * 10,
        };
        TempusAmm::create(
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            [Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique()],
            [Pubkey::new_unique(), Pubkey::new_unique()],
            6,
            &params,
            0,
            100 * DAY,
            (255, 254),
        )
        .unwrap()
    }

    fn seeded(amp: u64) -> TempusAmm {
        let mut amm = amm(amp);
        amm.join_init([100 * UNIT, 1_000 * UNIT], &view()).unwrap();
        amm
    }

    #[test]
    fn test_init_mints_invariant() {
        let mut amm = amm(5);
        let lp = amm.join_init([100 * UNIT, 1_000 * UNIT], &view()).unwrap();
        assert!(lp >= 181 * UNIT && lp <= 182 * UNIT, "lp = {}", lp);
        assert_eq!(amm.lp_supply, lp);

        let rate = amm.get_rate(&view()).unwrap();
        assert!(rate.abs_diff(WAD) < WAD / 1_000_000, "rate = {}", rate);

        let err = amm.join_init([UNIT, UNIT], &view()).unwrap_err();
        assert_eq!(err, error!(AmmError::AlreadyInitialized));
    }

    #[test]
    fn test_create_validation() {
        let mut params = InitAmmParams {
            amp_start: 5,
            amp_end: 5,
            swap_fee: 0,
            min_ratio: WAD / 10,
            max_ratio: WAD * 10,
        };
        let build = |params: &InitAmmParams| {
            TempusAmm::create(
                Pubkey::default(),
                Pubkey::default(),
                [Pubkey::default(); 3],
                [Pubkey::default(); 2],
                6,
                params,
                0,
                DAY,
                (0, 0),
            )
        };
        assert_eq!(build(&params).unwrap_err(), error!(AmmError::SwapFeeOutOfBounds));

        params.swap_fee = WAD / 100;
        params.min_ratio = WAD * 20;
        assert_eq!(build(&params).unwrap_err(), error!(AmmError::InvalidRatioBounds));

        params.min_ratio = WAD / 10;
        params.amp_end = 10;
        let ramping = build(&params).unwrap();
        assert!(ramping.amplification.is_updating(0));
        assert_eq!(ramping.amplification.value(DAY), 10_000);

        // A ramp to maturity is held to the same minimum length as any update
        let err = TempusAmm::create(
            Pubkey::default(),
            Pubkey::default(),
            [Pubkey::default(); 3],
            [Pubkey::default(); 2],
            6,
            &params,
            0,
            DAY - 1,
            (0, 0),
        )
        .unwrap_err();
        assert_eq!(err, error!(AmmError::AmpEndTimeTooClose));
    }

    #[test]
    fn test_swap_given_in_prices_by_share_value() {
        let mut amm = seeded(5);
        let before = amm.balances;

        // One principal is worth ten yields
        let outcome = amm.swap_given_in(PRINCIPAL, UNIT, 0, &view()).unwrap();
        assert_eq!(outcome.fee, UNIT / 100);
        assert!(outcome.amount_out < 10 * UNIT);
        assert!(outcome.amount_out > 9 * UNIT);
        assert_eq!(amm.balances[PRINCIPAL], before[PRINCIPAL] + UNIT);
        assert_eq!(amm.balances[YIELD], before[YIELD] - outcome.amount_out);

        let err = amm.swap_given_in(YIELD, UNIT, 10 * UNIT, &view()).unwrap_err();
        assert_eq!(err, error!(AmmError::SlippageExceeded));
    }

    #[test]
    fn test_swap_given_out_charges_fee_on_input() {
        let mut amm = seeded(5);
        let outcome = amm.swap_given_out(YIELD, UNIT, u64::MAX, &view()).unwrap();
        assert_eq!(outcome.amount_out, UNIT);
        assert!(outcome.fee > 0);
        assert!(outcome.amount_in > 10 * UNIT);
        assert!(outcome.amount_in < 11 * UNIT);
    }

    #[test]
    fn test_swaps_never_decrease_invariant() {
        for amp in [1, 5, 100, 5_000] {
            let mut amm = seeded(amp);
            let scaling = amm.scaling(&view()).unwrap();
            let (_, before) = amm.invariant(&scaling, DAY).unwrap();

            amm.swap_given_in(PRINCIPAL, 3 * UNIT, 0, &view()).unwrap();
            amm.swap_given_out(PRINCIPAL, 20 * UNIT, u64::MAX, &view()).unwrap();
            amm.swap_given_in(YIELD, 7 * UNIT, 0, &view()).unwrap();

            let (_, after) = amm.invariant(&scaling, DAY).unwrap();
            assert!(after >= before, "amp {}: {} < {}", amp, after, before);
        }
    }

    #[test]
    fn test_swap_outside_ratio_window_rejected() {
        let mut amm = seeded(5);
        amm.min_ratio = WAD * 9 / 10;
        amm.max_ratio = WAD * 11 / 10;

        let err = amm.swap_given_in(PRINCIPAL, 20 * UNIT, 0, &view()).unwrap_err();
        assert_eq!(err, error!(AmmError::RatioOutOfBounds));

        let mut fresh = seeded(5);
        fresh.min_ratio = WAD * 9 / 10;
        fresh.max_ratio = WAD * 11 / 10;
        assert!(fresh.swap_given_in(PRINCIPAL, UNIT, 0, &view()).is_ok());
    }

    #[test]
    fn test_joins_rejected_after_maturity() {
        let mut amm = seeded(5);
        let matured = PoolView {
            matured: true,
            ..view()
        };
        let err = amm.join_exact_tokens_in([UNIT, UNIT], 0, &matured).unwrap_err();
        assert_eq!(err, error!(AmmError::PoolMatured));
        let err = amm.join_exact_lp_out(YIELD, UNIT, u64::MAX, &matured).unwrap_err();
        assert_eq!(err, error!(AmmError::PoolMatured));

        // Exits stay open
        let out = amm.exit_exact_lp_in(amm.lp_supply / 2, [0, 0]).unwrap();
        assert!(out[0].abs_diff(50 * UNIT) <= 1);
        assert!(out[1].abs_diff(500 * UNIT) <= 5);
    }

    #[test]
    fn test_proportional_join_mints_proportional_lp() {
        let mut amm = seeded(5);
        let supply = amm.lp_supply;
        let lp = amm
            .join_exact_tokens_in([10 * UNIT, 100 * UNIT], 0, &view())
            .unwrap();
        // Balanced 10% top-up pays no fee
        assert!(lp.abs_diff(supply / 10) <= 2, "lp = {}", lp);
    }

    #[test]
    fn test_single_token_join_and_exit() {
        let mut amm = seeded(5);
        let paid = amm
            .join_exact_lp_out(PRINCIPAL, UNIT, u64::MAX, &view())
            .unwrap();
        // One LP is worth ~one backing, principal ~0.909 backing each
        assert!(paid > UNIT && paid < UNIT * 12 / 10, "paid = {}", paid);

        let received = amm.exit_single_token(PRINCIPAL, UNIT, 0, &view()).unwrap();
        assert!(received < paid);

        let err = amm.exit_single_token(2, UNIT, 0, &view()).unwrap_err();
        assert_eq!(err, error!(AmmError::InvalidTokenIndex));
    }

    #[test]
    fn test_exact_tokens_exit_requires_both_tokens() {
        let mut amm = seeded(5);
        let err = amm
            .exit_exact_tokens_out([UNIT, 0], u64::MAX, &view())
            .unwrap_err();
        assert_eq!(err, error!(AmmError::SingleTokenExit));

        let supply = amm.lp_supply;
        let lp_in = amm
            .exit_exact_tokens_out([10 * UNIT, 100 * UNIT], u64::MAX, &view())
            .unwrap();
        assert!(lp_in.abs_diff(supply / 10) <= 2, "lp_in = {}", lp_in);
        assert_eq!(amm.balances, [90 * UNIT, 900 * UNIT]);
    }

    #[test]
    fn test_zero_share_price_blocks_pricing() {
        let mut amm = seeded(5);
        let worthless_yield = PoolView {
            share_prices: (WAD, 0),
            ..view()
        };
        let err = amm
            .swap_given_in(PRINCIPAL, UNIT, 0, &worthless_yield)
            .unwrap_err();
        assert_eq!(err, error!(AmmError::ZeroTokenRate));
    }
}
