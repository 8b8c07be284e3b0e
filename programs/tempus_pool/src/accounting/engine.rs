//! # Pool Accounting Engine
//!
//! Converts yield-bearing tokens into claim shares and back, and drives the
//! pool lifecycle:
//!
//! ```text
//!   Active ──(now >= maturity_time)──────────────▶ Matured
//!     │                                               ▲
//!     └──(rate below pre-drop rate > halt_threshold)──┘  (halt_time set)
//! ```
//!
//! Shares are denominated in backing units at the initial rate:
//!
//! ```text
//! shares = backing_value(amount - fee, rate) * initial_rate / rate
//! ```
//!
//! A share pair redeems for one backing unit of principal plus the yield
//! accrued on it since creation:
//!
//! ```text
//! principal_value = principal * min(rate, initial) / initial
//! yield_value     = yields * max(rate - initial, 0) / initial
//! ```
//!
//! `rate` is always the live rate, also after maturity. Growth past maturity
//! goes to Yield. A drop below the initial rate reaches Principal: each pair
//! is backed by `rate / initial` and a maturity floor could not be paid.
//!
//! Every operation takes the freshly observed rate and the current time; none
//! of them performs I/O, so handlers can apply effects before any CPI.

use anchor_lang::prelude::*;

use crate::constants::{DEFAULT_HALT_THRESHOLD, MAX_POOL_FEE};
use crate::math::{div_down, mul_div_down, mul_down, to_token_amount, MathError, WAD};
use crate::state::{AccrualConvention, CreatePoolParams, FeeSchedule, NegativeYieldWindow, TempusPool};

use super::ClaimLedger;

#[error_code(offset = 6100)]
pub enum PoolError {
    #[msg("maturityTime is after startTime")]
    MaturityBeforeStart,
    #[msg("initInterestRate can not be zero")]
    ZeroInitialRate,
    #[msg("estimatedFinalYield can not be zero")]
    ZeroEstimatedYield,
    #[msg("recipient can not be 0x0")]
    ZeroRecipient,
    #[msg("controller can not be 0x0")]
    ZeroController,
    #[msg("backingTokenAmount is 0")]
    ZeroBackingTokenAmount,
    #[msg("yieldTokenAmount is 0")]
    ZeroYieldTokenAmount,
    #[msg("Maturity reached.")]
    MaturityReached,
    #[msg("Maturity not been reached yet.")]
    MaturityNotReached,
    #[msg("Negative yield!")]
    NegativeYield,
    #[msg("Interest rate can not be zero")]
    ZeroRate,
    #[msg("Insufficient principals.")]
    InsufficientPrincipals,
    #[msg("Insufficient yields.")]
    InsufficientYields,
    #[msg("Inequal redemption not allowed before maturity.")]
    InequalRedemption,
    #[msg("Redemption amounts are 0")]
    ZeroRedemption,
    #[msg("Pool already finalized")]
    AlreadyFinalized,
    #[msg("Claim supplies diverged")]
    SuppliesDiverged,
    #[msg("Fee percentage too high.")]
    FeeTooHigh,
    #[msg("Invalid halt threshold")]
    InvalidHaltThreshold,
    #[msg("not enough accumulated fees")]
    InsufficientFees,
    #[msg("rate must be 0")]
    RateMustBeZero,
    #[msg("total locked YBT is 0")]
    NothingLocked,
}

/// Lifecycle change observed while refreshing the rate
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Transition {
    /// Maturity time passed
    Matured,
    /// Negative yield outlasted the threshold
    Halted,
}

/// Keys recorded on the pool at creation
pub struct PoolKeys {
    pub owner: Pubkey,
    pub yield_source: Pubkey,
    pub yield_bearing_mint: Pubkey,
    pub backing_mint: Pubkey,
    pub principal_mint: Pubkey,
    pub yield_mint: Pubkey,
    pub vault: Pubkey,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DepositOutcome {
    /// Principal and yield minted, each
    pub shares: u64,
    /// Yield-bearing tokens kept as fee
    pub fee: u64,
    pub transition: Option<Transition>,
}

/// Vault adjustment that keeps a pegged vault in step with the rate
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rebase {
    Unchanged,
    Mint(u64),
    Burn(u64),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RedeemOutcome {
    /// Yield-bearing tokens owed to the redeemer, after fees
    pub yield_bearing_out: u64,
    /// Yield-bearing tokens kept as fee
    pub fee: u64,
    pub transition: Option<Transition>,
}

impl FeeSchedule {
    /// Every fee must be at most the matching cap
    pub fn check_within(&self, caps: &FeeSchedule) -> Result<()> {
        require!(self.deposit <= caps.deposit, PoolError::FeeTooHigh);
        require!(self.early_redeem <= caps.early_redeem, PoolError::FeeTooHigh);
        require!(self.mature_redeem <= caps.mature_redeem, PoolError::FeeTooHigh);
        Ok(())
    }
}

impl TempusPool {
    /// Validate creation parameters and build the initial pool state
    pub fn create(
        keys: PoolKeys,
        convention: AccrualConvention,
        initial_rate: u128,
        now: i64,
        params: &CreatePoolParams,
        bump: u8,
    ) -> Result<TempusPool> {
        require!(params.maturity_time > now, PoolError::MaturityBeforeStart);
        require!(initial_rate > 0, PoolError::ZeroInitialRate);
        require!(params.estimated_yield > 0, PoolError::ZeroEstimatedYield);
        require!(params.controller != Pubkey::default(), PoolError::ZeroController);

        let ceiling = FeeSchedule {
            deposit: MAX_POOL_FEE,
            early_redeem: MAX_POOL_FEE,
            mature_redeem: MAX_POOL_FEE,
        };
        params.max_fees.check_within(&ceiling)?;
        params.fees.check_within(&params.max_fees)?;

        let halt_threshold = params.halt_threshold.unwrap_or(DEFAULT_HALT_THRESHOLD);
        require!(halt_threshold > 0, PoolError::InvalidHaltThreshold);

        Ok(TempusPool {
            owner: keys.owner,
            controller: params.controller,
            yield_source: keys.yield_source,
            yield_bearing_mint: keys.yield_bearing_mint,
            backing_mint: keys.backing_mint,
            principal_mint: keys.principal_mint,
            yield_mint: keys.yield_mint,
            vault: keys.vault,
            convention,
            initial_rate,
            current_rate: initial_rate,
            maturity_rate: 0,
            vault_rate: initial_rate,
            start_time: now,
            maturity_time: params.maturity_time,
            halt_time: None,
            negative_yield: None,
            halt_threshold,
            estimated_yield: params.estimated_yield,
            fees: params.fees,
            max_fees: params.max_fees,
            accumulated_fees: 0,
            ledger: ClaimLedger::default(),
            matured: false,
            bump,
        })
    }

    /// Matured by time, by finalization or by halting
    pub fn has_matured(&self, now: i64) -> bool {
        self.matured || now >= self.maturity_time
    }

    pub fn is_halted(&self) -> bool {
        self.halt_time.is_some()
    }

    /// Record a freshly read rate and advance the lifecycle
    pub fn observe_rate(&mut self, rate: u128, now: i64) -> Option<Transition> {
        let previous = self.current_rate;
        self.current_rate = rate;

        if self.matured {
            return None;
        }

        if self.negative_yield_expired(previous, rate, now) {
            self.halt_time = Some(now);
            self.freeze();
            return Some(Transition::Halted);
        }

        if now >= self.maturity_time {
            self.freeze();
            return Some(Transition::Matured);
        }

        None
    }

    /// Returns true when the open window outlasted the threshold
    fn negative_yield_expired(&mut self, previous: u128, rate: u128, now: i64) -> bool {
        match self.negative_yield {
            Some(window) if rate >= window.reference_rate => {
                self.negative_yield = None;
                false
            }
            Some(window) => now.saturating_sub(window.since) > self.halt_threshold,
            None => {
                if rate < previous {
                    self.negative_yield = Some(NegativeYieldWindow {
                        since: now,
                        reference_rate: previous,
                    });
                }
                false
            }
        }
    }

    fn freeze(&mut self) {
        self.maturity_rate = self.current_rate;
        self.matured = true;
    }

    /// Explicit finalization, once, at or after maturity time
    pub fn finalize(&mut self, rate: u128, now: i64) -> Result<Option<Transition>> {
        require!(!self.matured, PoolError::AlreadyFinalized);
        require!(now >= self.maturity_time, PoolError::MaturityNotReached);
        require!(self.ledger.is_balanced(), PoolError::SuppliesDiverged);
        Ok(self.observe_rate(rate, now))
    }

    /// Mint share pairs for `amount` yield-bearing tokens already sent to the vault
    ///
    /// A deposit that matures or halts the pool keeps the transition and
    /// mints nothing (`shares == 0`); no tokens should move.
    pub fn deposit(&mut self, amount: u64, rate: u128, now: i64) -> Result<DepositOutcome> {
        require!(amount > 0, PoolError::ZeroYieldTokenAmount);

        let transition = self.observe_rate(rate, now);
        if transition.is_some() {
            return Ok(DepositOutcome {
                shares: 0,
                fee: 0,
                transition,
            });
        }
        require!(!self.matured, PoolError::MaturityReached);
        require!(rate > 0, PoolError::ZeroRate);
        require!(rate >= self.initial_rate, PoolError::NegativeYield);

        let fee = to_token_amount(mul_down(amount as u128, self.fees.deposit)?)?;
        let net = amount.checked_sub(fee).ok_or(MathError::Overflow)?;

        let backing = self.convention.backing_per_yield_bearing(net as u128, rate)?;
        let shares = to_token_amount(mul_div_down(backing, self.initial_rate, rate)?)?;

        self.ledger.mint_pair(shares)?;
        self.accumulated_fees = self
            .accumulated_fees
            .checked_add(fee)
            .ok_or(MathError::Overflow)?;

        Ok(DepositOutcome {
            shares,
            fee,
            transition,
        })
    }

    /// Burn claims and compute the yield-bearing tokens owed for them
    ///
    /// `principal_balance` / `yield_balance` are the redeemer's token balances.
    pub fn redeem(
        &mut self,
        principal: u64,
        yields: u64,
        principal_balance: u64,
        yield_balance: u64,
        rate: u128,
        now: i64,
    ) -> Result<RedeemOutcome> {
        require!(principal > 0 || yields > 0, PoolError::ZeroRedemption);

        let transition = self.observe_rate(rate, now);
        if !self.matured {
            require!(principal == yields, PoolError::InequalRedemption);
        }
        require!(principal_balance >= principal, PoolError::InsufficientPrincipals);
        require!(yield_balance >= yields, PoolError::InsufficientYields);
        require!(rate > 0, PoolError::ZeroRate);

        let backing = self.redemption_value(principal, yields)?;
        let gross = self.convention.yield_bearing_per_backing(backing, rate)?;

        let fee_percent = if self.matured {
            self.fees.mature_redeem
        } else {
            self.fees.early_redeem
        };
        let fee = mul_down(gross, fee_percent)?;
        let yield_bearing_out = to_token_amount(gross - fee)?;
        let fee = to_token_amount(fee)?;

        self.ledger.burn(principal, yields)?;
        self.accumulated_fees = self
            .accumulated_fees
            .checked_add(fee)
            .ok_or(MathError::Overflow)?;

        Ok(RedeemOutcome {
            yield_bearing_out,
            fee,
            transition,
        })
    }

    /// Backing value of a claim basket at the last observed rate
    pub fn redemption_value(&self, principal: u64, yields: u64) -> Result<u128> {
        let initial = self.initial_rate;
        let rate = self.current_rate;

        let principal_value = if rate < initial {
            mul_div_down(principal as u128, rate, initial)?
        } else {
            principal as u128
        };
        let yield_value = if rate > initial {
            mul_div_down(yields as u128, rate - initial, initial)?
        } else {
            0
        };

        principal_value
            .checked_add(yield_value)
            .ok_or_else(|| error!(MathError::Overflow))
    }

    /// Release collected fees; `u64::MAX` takes everything
    pub fn take_fees(&mut self, amount: u64) -> Result<u64> {
        let amount = if amount == u64::MAX {
            self.accumulated_fees
        } else {
            amount
        };
        require!(amount <= self.accumulated_fees, PoolError::InsufficientFees);
        self.accumulated_fees -= amount;
        Ok(amount)
    }

    /// Last-resort sweep when the rate source collapsed to zero
    ///
    /// `rate` must already be observed. Returns the amount to move out of
    /// the vault.
    pub fn recover_locked(&mut self, rate: u128, locked: u64) -> Result<u64> {
        require!(rate == 0, PoolError::RateMustBeZero);
        require!(locked > 0, PoolError::NothingLocked);
        self.accumulated_fees = 0;
        Ok(locked)
    }

    /// Bring a pegged vault holding `vault_balance` in line with `rate`
    ///
    /// Pegged tokens pay yield as balance growth, so the vault is minted up
    /// (or burned down) by `rate / vault_rate`. Collected fees scale along.
    /// A zero rate leaves the vault alone for the recovery path.
    pub fn rebase_vault(&mut self, rate: u128, vault_balance: u64) -> Result<Rebase> {
        if self.convention != AccrualConvention::Pegged || rate == 0 || rate == self.vault_rate {
            return Ok(Rebase::Unchanged);
        }

        let target = to_token_amount(mul_div_down(vault_balance as u128, rate, self.vault_rate)?)?;
        let fees = to_token_amount(mul_div_down(
            self.accumulated_fees as u128,
            rate,
            self.vault_rate,
        )?)?;
        self.accumulated_fees = fees.min(target);
        self.vault_rate = rate;

        Ok(match target.cmp(&vault_balance) {
            std::cmp::Ordering::Greater => Rebase::Mint(target - vault_balance),
            std::cmp::Ordering::Less => Rebase::Burn(vault_balance - target),
            std::cmp::Ordering::Equal => Rebase::Unchanged,
        })
    }

    /// Rate the pool is expected to reach at maturity (WAD)
    pub fn estimated_final_rate(&self) -> Result<u128> {
        if self.matured {
            return Ok(self.current_rate);
        }
        let seeded = mul_down(
            self.initial_rate,
            WAD.checked_add(self.estimated_yield)
                .ok_or(MathError::Overflow)?,
        )?;
        Ok(self.current_rate.max(seeded))
    }

    /// Present value of one principal and one yield share, in backing (WAD)
    ///
    /// Values at maturity are discounted by the growth still expected
    /// between now and maturity.
    pub fn share_prices(&self) -> Result<(u128, u128)> {
        let estimated = self.estimated_final_rate()?;
        if estimated == 0 {
            return Ok((0, 0));
        }
        let initial = self.initial_rate;
        let discount = if self.matured {
            WAD
        } else {
            div_down(self.current_rate, estimated)?
        };

        let principal = if estimated < initial {
            mul_down(div_down(estimated, initial)?, discount)?
        } else {
            discount
        };
        let yields = if estimated > initial {
            mul_down(div_down(estimated - initial, initial)?, discount)?
        } else {
            0
        };
        Ok((principal, yields))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 24 * 60 * 60;
    const MATURITY: i64 = 100 * DAY;

    fn pool(convention: AccrualConvention, fees: FeeSchedule) -> TempusPool {
        let keys = PoolKeys {
            owner: Pubkey::new_unique(),
            yield_source: Pubkey::new_unique(),
            yield_bearing_mint: Pubkey::new_unique(),
            backing_mint: Pubkey::new_unique(),
            principal_mint: Pubkey::new_unique(),
            yield_mint: Pubkey::new_unique(),
            vault: Pubkey::new_unique(),
        };
        let params = CreatePoolParams {
            maturity_time: MATURITY,
            estimated_yield: WAD / 10,
            controller: Pubkey::new_unique(),
            fees,
            max_fees: FeeSchedule {
                deposit: WAD / 10,
                early_redeem: WAD / 10,
                mature_redeem: WAD / 10,
            },
            halt_threshold: None,
        };
        TempusPool::create(keys, convention, WAD, 0, &params, 255).unwrap()
    }

    fn rate(percent: u128) -> u128 {
        WAD * percent / 100
    }

    #[test]
    fn test_creation_validation() {
        let base = pool(AccrualConvention::Pegged, FeeSchedule::default());
        let keys = || PoolKeys {
            owner: base.owner,
            yield_source: base.yield_source,
            yield_bearing_mint: base.yield_bearing_mint,
            backing_mint: base.backing_mint,
            principal_mint: base.principal_mint,
            yield_mint: base.yield_mint,
            vault: base.vault,
        };
        let mut params = CreatePoolParams {
            maturity_time: 10,
            estimated_yield: WAD / 10,
            controller: Pubkey::new_unique(),
            fees: FeeSchedule::default(),
            max_fees: FeeSchedule::default(),
            halt_threshold: None,
        };

        let err = TempusPool::create(keys(), AccrualConvention::Pegged, WAD, 10, &params, 0).unwrap_err();
        assert_eq!(err, error!(PoolError::MaturityBeforeStart));

        let err = TempusPool::create(keys(), AccrualConvention::Pegged, 0, 0, &params, 0).unwrap_err();
        assert_eq!(err, error!(PoolError::ZeroInitialRate));

        params.estimated_yield = 0;
        let err = TempusPool::create(keys(), AccrualConvention::Pegged, WAD, 0, &params, 0).unwrap_err();
        assert_eq!(err, error!(PoolError::ZeroEstimatedYield));

        params.estimated_yield = WAD / 10;
        params.fees.deposit = 1;
        let err = TempusPool::create(keys(), AccrualConvention::Pegged, WAD, 0, &params, 0).unwrap_err();
        assert_eq!(err, error!(PoolError::FeeTooHigh));

        params.fees.deposit = 0;
        let created = TempusPool::create(keys(), AccrualConvention::Pegged, WAD, 0, &params, 0).unwrap();
        assert_eq!(created.halt_threshold, DEFAULT_HALT_THRESHOLD);
        assert_eq!(created.current_rate, WAD);
    }

    #[test]
    fn test_pegged_deposits_scale_with_rate() {
        let mut pool = pool(AccrualConvention::Pegged, FeeSchedule::default());

        let first = pool.deposit(100, rate(100), DAY).unwrap();
        assert_eq!(first.shares, 100);
        assert_eq!(first.fee, 0);

        let second = pool.deposit(100, rate(200), 2 * DAY).unwrap();
        assert_eq!(second.shares, 50);

        assert_eq!(pool.ledger.principal_supply, 150);
        assert_eq!(pool.ledger.yield_supply, 150);
    }

    #[test]
    fn test_price_appreciation_deposits_mint_backing_at_initial_rate() {
        let mut pool = pool(AccrualConvention::PriceAppreciation, FeeSchedule::default());
        pool.deposit(1_000, rate(100), DAY).unwrap();
        // 500 tokens worth 625 backing, 500 shares at the initial rate
        let outcome = pool.deposit(500, rate(125), 2 * DAY).unwrap();
        assert_eq!(outcome.shares, 500);
    }

    #[test]
    fn test_deposit_fee_is_retained() {
        let fees = FeeSchedule {
            deposit: WAD / 100,
            ..FeeSchedule::default()
        };
        let mut pool = pool(AccrualConvention::PriceAppreciation, fees);

        let outcome = pool.deposit(100, rate(100), DAY).unwrap();
        assert_eq!(outcome.shares, 99);
        assert_eq!(outcome.fee, 1);
        assert_eq!(pool.accumulated_fees, 1);
        // 99 shares plus 1 fee token account for all 100 in the vault
        assert_eq!(outcome.shares + pool.accumulated_fees, 100);
    }

    #[test]
    fn test_deposit_rejections() {
        let mut pool = pool(AccrualConvention::Pegged, FeeSchedule::default());

        let err = pool.deposit(0, rate(100), DAY).unwrap_err();
        assert_eq!(err, error!(PoolError::ZeroYieldTokenAmount));

        let err = pool.deposit(10, rate(90), DAY).unwrap_err();
        assert_eq!(err, error!(PoolError::NegativeYield));

        let err = pool.deposit(10, rate(0), DAY).unwrap_err();
        assert_eq!(err, error!(PoolError::ZeroRate));
    }

    #[test]
    fn test_deposit_that_crosses_maturity_keeps_the_transition() {
        let mut pool = pool(AccrualConvention::Pegged, FeeSchedule::default());
        pool.deposit(100, rate(100), DAY).unwrap();

        let outcome = pool.deposit(10, rate(110), MATURITY).unwrap();
        assert_eq!(outcome.transition, Some(Transition::Matured));
        assert_eq!(outcome.shares, 0);
        assert!(pool.matured);
        assert_eq!(pool.maturity_rate, rate(110));
        assert_eq!(pool.ledger.principal_supply, 100);

        let err = pool.deposit(10, rate(110), MATURITY + 1).unwrap_err();
        assert_eq!(err, error!(PoolError::MaturityReached));
    }

    #[test]
    fn test_deposit_that_halts_keeps_the_halt() {
        let mut pool = pool(AccrualConvention::PriceAppreciation, FeeSchedule::default());
        pool.observe_rate(rate(95), DAY);

        let outcome = pool.deposit(10, rate(95), 9 * DAY).unwrap();
        assert_eq!(outcome.transition, Some(Transition::Halted));
        assert_eq!(outcome.shares, 0);
        assert_eq!(pool.halt_time, Some(9 * DAY));
        assert_eq!(pool.accumulated_fees, 0);
    }

    #[test]
    fn test_early_redemption_requires_equal_amounts() {
        let mut pool = pool(AccrualConvention::PriceAppreciation, FeeSchedule::default());
        pool.deposit(1_000, rate(100), DAY).unwrap();

        let err = pool
            .redeem(400, 300, 1_000, 1_000, rate(150), 2 * DAY)
            .unwrap_err();
        assert_eq!(err, error!(PoolError::InequalRedemption));

        // 400 principal + 400 * 0.5 yield = 600 backing = 400 tokens at 1.5
        let outcome = pool.redeem(400, 400, 1_000, 1_000, rate(150), 2 * DAY).unwrap();
        assert_eq!(outcome.yield_bearing_out, 400);
        assert_eq!(pool.ledger.principal_supply, 600);
    }

    #[test]
    fn test_insufficient_balances_checked_principal_first() {
        let mut pool = pool(AccrualConvention::PriceAppreciation, FeeSchedule::default());
        pool.deposit(1_000, rate(100), DAY).unwrap();

        let err = pool.redeem(10, 10, 5, 5, rate(100), 2 * DAY).unwrap_err();
        assert_eq!(err, error!(PoolError::InsufficientPrincipals));

        let err = pool.redeem(5, 10, 5, 5, rate(110), MATURITY).unwrap_err();
        assert_eq!(err, error!(PoolError::InsufficientYields));
    }

    #[test]
    fn test_early_and_mature_redeem_fees() {
        let fees = FeeSchedule {
            deposit: 0,
            early_redeem: WAD / 50,
            mature_redeem: WAD / 100,
        };
        let mut pool = pool(AccrualConvention::Pegged, fees);
        pool.deposit(1_000, rate(100), DAY).unwrap();

        let early = pool.redeem(500, 500, 1_000, 1_000, rate(100), 2 * DAY).unwrap();
        assert_eq!(early.fee, 10);
        assert_eq!(early.yield_bearing_out, 490);

        let mature = pool.redeem(500, 500, 500, 500, rate(100), MATURITY).unwrap();
        assert_eq!(mature.transition, Some(Transition::Matured));
        assert_eq!(mature.fee, 5);
        assert_eq!(mature.yield_bearing_out, 495);
        assert_eq!(pool.accumulated_fees, 15);
    }

    #[test]
    fn test_finalize_once() {
        let mut pool = pool(AccrualConvention::PriceAppreciation, FeeSchedule::default());

        let err = pool.finalize(rate(110), MATURITY - 1).unwrap_err();
        assert_eq!(err, error!(PoolError::MaturityNotReached));

        let transition = pool.finalize(rate(120), MATURITY).unwrap();
        assert_eq!(transition, Some(Transition::Matured));
        assert_eq!(pool.maturity_rate, rate(120));

        let err = pool.finalize(rate(150), MATURITY + DAY).unwrap_err();
        assert_eq!(err, error!(PoolError::AlreadyFinalized));
        assert_eq!(pool.maturity_rate, rate(120));
    }

    #[test]
    fn test_maturity_is_implicit_on_first_call_after_maturity_time() {
        let mut pool = pool(AccrualConvention::PriceAppreciation, FeeSchedule::default());
        assert_eq!(pool.observe_rate(rate(110), MATURITY + 5), Some(Transition::Matured));
        assert!(pool.matured);
        assert_eq!(pool.maturity_rate, rate(110));
        assert_eq!(pool.observe_rate(rate(130), MATURITY + 10), None);
        assert_eq!(pool.maturity_rate, rate(110));
    }

    #[test]
    fn test_sustained_negative_yield_halts_pool() {
        let mut pool = pool(AccrualConvention::PriceAppreciation, FeeSchedule::default());
        pool.deposit(1_000, rate(100), 0).unwrap();

        // Drop observed on day 1, threshold is seven days
        assert_eq!(pool.observe_rate(rate(95), DAY), None);
        assert!(pool.negative_yield.is_some());
        assert_eq!(pool.observe_rate(rate(95), 8 * DAY), None);
        assert!(!pool.is_halted());

        // Eight days of negative yield
        let outcome = pool.redeem(1_000, 0, 1_000, 1_000, rate(95), 9 * DAY).unwrap();
        assert_eq!(outcome.transition, Some(Transition::Halted));
        assert_eq!(pool.halt_time, Some(9 * DAY));
        assert!(pool.matured);
        assert_eq!(pool.maturity_rate, rate(95));
        // Principal worth 0.95 backing, 950 backing at 0.95 per token
        assert_eq!(outcome.yield_bearing_out, 1_000);
    }

    #[test]
    fn test_halt_is_permanent() {
        let mut pool = pool(AccrualConvention::PriceAppreciation, FeeSchedule::default());
        pool.observe_rate(rate(90), DAY);
        pool.observe_rate(rate(90), 9 * DAY);
        assert_eq!(pool.halt_time, Some(9 * DAY));

        pool.observe_rate(rate(150), 10 * DAY);
        pool.observe_rate(rate(80), 30 * DAY);
        assert_eq!(pool.halt_time, Some(9 * DAY));
        assert!(pool.matured);

        let err = pool.deposit(10, rate(150), 31 * DAY).unwrap_err();
        assert_eq!(err, error!(PoolError::MaturityReached));
    }

    #[test]
    fn test_recovered_rate_closes_negative_yield_window() {
        let mut pool = pool(AccrualConvention::PriceAppreciation, FeeSchedule::default());
        pool.observe_rate(rate(95), DAY);
        pool.observe_rate(rate(101), 3 * DAY);
        assert!(pool.negative_yield.is_none());

        pool.observe_rate(rate(100), 4 * DAY);
        assert_eq!(pool.observe_rate(rate(100), 11 * DAY + 1), Some(Transition::Halted));

        let mut fresh = self::pool(AccrualConvention::PriceAppreciation, FeeSchedule::default());
        fresh.observe_rate(rate(95), DAY);
        fresh.observe_rate(rate(100), 5 * DAY);
        assert_eq!(fresh.observe_rate(rate(100), 20 * DAY), None);
        assert!(!fresh.is_halted());
    }

    #[test]
    fn test_post_maturity_value_follows_live_rate() {
        let mut pool = pool(AccrualConvention::PriceAppreciation, FeeSchedule::default());
        pool.deposit(1_000, rate(100), DAY).unwrap();
        pool.finalize(rate(120), MATURITY).unwrap();

        // Growth after maturity goes to yield
        pool.observe_rate(rate(150), MATURITY + DAY);
        assert_eq!(pool.redemption_value(100, 100).unwrap(), 150);

        // A drop below the initial rate reaches principal too
        pool.observe_rate(rate(90), MATURITY + 2 * DAY);
        assert_eq!(pool.redemption_value(100, 100).unwrap(), 90);
        assert_eq!(pool.maturity_rate, rate(120));
    }

    #[test]
    fn test_post_maturity_drop_stays_within_vault() {
        let mut pool = pool(AccrualConvention::PriceAppreciation, FeeSchedule::default());
        pool.deposit(1_000, rate(100), DAY).unwrap();
        pool.finalize(rate(120), MATURITY).unwrap();

        let out = pool
            .redeem(1_000, 1_000, 1_000, 1_000, rate(90), MATURITY + DAY)
            .unwrap();
        assert!(out.yield_bearing_out <= 1_000);
        assert_eq!(out.yield_bearing_out, 1_000);

        let mut halted = self::pool(AccrualConvention::PriceAppreciation, FeeSchedule::default());
        halted.deposit(1_000, rate(100), 0).unwrap();
        halted.observe_rate(rate(95), DAY);
        halted.observe_rate(rate(95), 9 * DAY);
        assert!(halted.is_halted());

        // Principal alone, live rate far below the halt rate
        let out = halted
            .redeem(1_000, 0, 1_000, 1_000, rate(50), 10 * DAY)
            .unwrap();
        assert_eq!(out.yield_bearing_out, 1_000);
        let rest = halted
            .redeem(0, 1_000, 0, 1_000, rate(50), 10 * DAY)
            .unwrap();
        assert_eq!(rest.yield_bearing_out, 0);
    }

    #[test]
    fn test_pegged_vault_rebases_with_rate() {
        let mut pool = pool(AccrualConvention::Pegged, FeeSchedule::default());
        assert_eq!(pool.rebase_vault(rate(100), 0).unwrap(), Rebase::Unchanged);
        pool.deposit(100, rate(100), DAY).unwrap();
        let mut vault = 100u64;

        // Rate doubles: the vault balance doubles with it
        match pool.rebase_vault(rate(200), vault).unwrap() {
            Rebase::Mint(minted) => vault += minted,
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(vault, 200);
        assert_eq!(pool.vault_rate, rate(200));

        let out = pool.redeem(100, 100, 100, 100, rate(200), 2 * DAY).unwrap();
        assert_eq!(out.yield_bearing_out, 200);
        assert!(out.yield_bearing_out <= vault);

        // A drop burns, a zero rate leaves the vault alone
        let mut pool = self::pool(AccrualConvention::Pegged, FeeSchedule::default());
        assert_eq!(pool.rebase_vault(rate(80), 100).unwrap(), Rebase::Burn(20));
        assert_eq!(pool.rebase_vault(0, 80).unwrap(), Rebase::Unchanged);
        assert_eq!(pool.vault_rate, rate(80));
    }

    #[test]
    fn test_price_appreciation_vault_never_rebases() {
        let mut pool = pool(AccrualConvention::PriceAppreciation, FeeSchedule::default());
        assert_eq!(pool.rebase_vault(rate(200), 100).unwrap(), Rebase::Unchanged);
        assert_eq!(pool.vault_rate, WAD);
    }

    #[test]
    fn test_rebase_scales_collected_fees() {
        let fees = FeeSchedule {
            deposit: WAD / 100,
            ..FeeSchedule::default()
        };
        let mut pool = pool(AccrualConvention::Pegged, fees);
        pool.deposit(1_000, rate(100), DAY).unwrap();
        assert_eq!(pool.accumulated_fees, 10);

        assert_eq!(pool.rebase_vault(rate(150), 1_000).unwrap(), Rebase::Mint(500));
        assert_eq!(pool.accumulated_fees, 15);
    }

    #[test]
    fn test_total_payout_never_exceeds_locked_value() {
        let mut pool = pool(AccrualConvention::PriceAppreciation, FeeSchedule::default());
        let first = pool.deposit(1_000, rate(100), DAY).unwrap();
        let second = pool.deposit(500, rate(125), 2 * DAY).unwrap();
        let locked = 1_500u64;

        pool.finalize(rate(150), MATURITY).unwrap();

        for live in [rate(150), rate(180), rate(130)] {
            let mut copy = pool.clone();
            copy.observe_rate(live, MATURITY + DAY);
            let a = copy
                .redeem(first.shares, first.shares, first.shares, first.shares, live, MATURITY + DAY)
                .unwrap();
            let b = copy
                .redeem(second.shares, second.shares, second.shares, second.shares, live, MATURITY + DAY)
                .unwrap();
            assert!(a.yield_bearing_out + b.yield_bearing_out <= locked);
            assert_eq!(copy.ledger.principal_supply, 0);
        }
    }

    #[test]
    fn test_unequal_redemption_after_maturity() {
        let mut pool = pool(AccrualConvention::Pegged, FeeSchedule::default());
        pool.deposit(1_000, rate(100), DAY).unwrap();
        pool.finalize(rate(110), MATURITY).unwrap();

        let principal_only = pool.redeem(1_000, 0, 1_000, 1_000, rate(110), MATURITY).unwrap();
        assert_eq!(principal_only.yield_bearing_out, 1_000);
        let yield_only = pool.redeem(0, 1_000, 0, 1_000, rate(110), MATURITY).unwrap();
        assert_eq!(yield_only.yield_bearing_out, 100);
        assert!(pool.ledger.is_balanced());
    }

    #[test]
    fn test_fee_collection() {
        let fees = FeeSchedule {
            deposit: WAD / 100,
            ..FeeSchedule::default()
        };
        let mut pool = pool(AccrualConvention::Pegged, fees);
        pool.deposit(1_000, rate(100), DAY).unwrap();
        assert_eq!(pool.accumulated_fees, 10);

        assert_eq!(pool.take_fees(4).unwrap(), 4);
        let err = pool.take_fees(7).unwrap_err();
        assert_eq!(err, error!(PoolError::InsufficientFees));
        assert_eq!(pool.take_fees(u64::MAX).unwrap(), 6);
        assert_eq!(pool.accumulated_fees, 0);
    }

    #[test]
    fn test_recovery_requires_zero_rate_and_locked_balance() {
        let mut pool = pool(AccrualConvention::Pegged, FeeSchedule::default());

        let err = pool.recover_locked(1, 500).unwrap_err();
        assert_eq!(err, error!(PoolError::RateMustBeZero));

        let err = pool.recover_locked(0, 0).unwrap_err();
        assert_eq!(err, error!(PoolError::NothingLocked));

        assert_eq!(pool.recover_locked(0, 500).unwrap(), 500);
    }

    #[test]
    fn test_share_prices_follow_estimate_then_maturity() {
        let mut pool = pool(AccrualConvention::PriceAppreciation, FeeSchedule::default());

        // Estimated final rate 1.1: principal ~ 1/1.1, yield ~ 0.1/1.1
        let (principal, yields) = pool.share_prices().unwrap();
        assert_eq!(principal, div_down(WAD, rate(110)).unwrap());
        assert!(yields.abs_diff(WAD / 11) <= 1);

        pool.finalize(rate(120), MATURITY).unwrap();
        let (principal, yields) = pool.share_prices().unwrap();
        assert_eq!(principal, WAD);
        assert_eq!(yields, WAD / 5);
    }
}
