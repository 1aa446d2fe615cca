//! Utilization-driven interest rate model and accrual.
//!
//! Rates follow a piecewise-linear curve over utilization (a "kink" model).
//! Accrual is simple interest over the elapsed seconds, applied synchronously
//! before every vault mutation.
//!
//! Rounding policy: utilization, the interpolated rate and the accrued interest
//! are all rounded down. Lenders never earn more than the exact curve value and
//! borrowers are never charged more than it.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::{LyfError, LyfResult};
use crate::math::{self, mul_div, wad};

/// Seconds in a year (365 days)
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// One breakpoint of the rate curve. Both fields are WAD-scaled.
#[odra::odra_type]
pub struct RatePoint {
    /// Utilization at this breakpoint (1e18 = 100%)
    pub utilization: U256,
    /// Annual borrow rate at this breakpoint (1e18 = 100% APR)
    pub rate: U256,
}

impl RatePoint {
    pub fn percent(utilization: u64, rate: u64) -> Self {
        let pct = wad() / U256::from(100u64);
        Self {
            utilization: pct * U256::from(utilization),
            rate: pct * U256::from(rate),
        }
    }
}

/// Piecewise-linear rate curve, ordered by utilization
#[odra::odra_type]
pub struct InterestModelParams {
    pub points: Vec<RatePoint>,
}

impl InterestModelParams {
    /// Rises from 0% to 20% APR at 60% utilization, stays flat until 90%, then a
    /// steep climb to 150% APR at full utilization.
    pub fn default_kink() -> Self {
        Self {
            points: vec![
                RatePoint::percent(0, 0),
                RatePoint::percent(60, 20),
                RatePoint::percent(90, 20),
                RatePoint::percent(100, 150),
            ],
        }
    }

    /// The curve must start at zero utilization, have strictly increasing
    /// breakpoints no greater than 100%, and never decrease in rate.
    pub fn validate(&self) -> LyfResult<()> {
        let first = self.points.first().ok_or(LyfError::InvalidInterestModel)?;
        if !first.utilization.is_zero() {
            return Err(LyfError::InvalidInterestModel);
        }
        for pair in self.points.windows(2) {
            if pair[1].utilization <= pair[0].utilization || pair[1].rate < pair[0].rate {
                return Err(LyfError::InvalidInterestModel);
            }
        }
        match self.points.last() {
            Some(last) if last.utilization <= wad() => Ok(()),
            _ => Err(LyfError::InvalidInterestModel),
        }
    }

    /// Annual borrow rate for the given utilization
    pub fn rate_at(&self, utilization: U256) -> LyfResult<U256> {
        let first = self.points.first().ok_or(LyfError::InvalidInterestModel)?;
        if utilization <= first.utilization {
            return Ok(first.rate);
        }
        for pair in self.points.windows(2) {
            let (lo, hi) = (&pair[0], &pair[1]);
            if utilization <= hi.utilization {
                let slope_num = math::checked_sub(hi.rate, lo.rate)?;
                let span = math::checked_sub(hi.utilization, lo.utilization)?;
                let into = math::checked_sub(utilization, lo.utilization)?;
                return math::checked_add(lo.rate, mul_div(slope_num, into, span)?);
            }
        }
        // Beyond the last breakpoint the curve stays flat
        self.points
            .last()
            .map(|p| p.rate)
            .ok_or(LyfError::InvalidInterestModel)
    }

    /// Annual borrow rate for a vault with `borrowed` lent out and `supplied`
    /// still idle.
    pub fn borrow_rate(&self, borrowed: U256, supplied: U256) -> LyfResult<U256> {
        self.rate_at(utilization(borrowed, supplied)?)
    }
}

impl Default for InterestModelParams {
    fn default() -> Self {
        Self::default_kink()
    }
}

/// `borrowed / (borrowed + supplied)` in WAD, zero for an empty vault
pub fn utilization(borrowed: U256, supplied: U256) -> LyfResult<U256> {
    let total = math::checked_add(borrowed, supplied)?;
    if total.is_zero() {
        return Ok(U256::zero());
    }
    mul_div(borrowed, wad(), total)
}

/// Interest accrual result
#[odra::odra_type]
pub struct AccrualResult {
    /// New debt amount after accrual
    pub new_debt: U256,
    /// Interest amount accrued
    pub interest_accrued: U256,
}

/// Simple interest on `debt` at an annual WAD `rate` over `elapsed_seconds`:
/// `debt * rate * elapsed / (WAD * SECONDS_PER_YEAR)`, rounded down.
pub fn accrue_interest(debt: U256, rate: U256, elapsed_seconds: u64) -> LyfResult<AccrualResult> {
    if elapsed_seconds == 0 || debt.is_zero() || rate.is_zero() {
        return Ok(AccrualResult {
            new_debt: debt,
            interest_accrued: U256::zero(),
        });
    }

    let rate_time = rate
        .checked_mul(U256::from(elapsed_seconds))
        .ok_or(LyfError::ArithmeticOverflow)?;
    let denominator = wad()
        .checked_mul(U256::from(SECONDS_PER_YEAR))
        .ok_or(LyfError::ArithmeticOverflow)?;
    let interest = mul_div(debt, rate_time, denominator)?;

    Ok(AccrualResult {
        new_debt: math::checked_add(debt, interest)?,
        interest_accrued: interest,
    })
}
