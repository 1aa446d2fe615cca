//! Share pool accounting.
//!
//! A pool is a ratio of `total_units` (underlying) to `total_shares`. Vaults
//! keep two: a deposit pool and a debt pool. Interest is applied to the units
//! of both before any share is minted or burned.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::{LyfError, LyfResult};
use crate::math::{self, mul_div_with, wad, Rounding};

#[odra::odra_type]
#[derive(Copy, Default)]
pub struct SharePool {
    pub total_units: U256,
    pub total_shares: U256,
}

impl SharePool {
    /// Shares worth `units`. An empty pool mints 1:1.
    pub fn shares_for(&self, units: U256, rounding: Rounding) -> LyfResult<U256> {
        if self.total_shares.is_zero() || self.total_units.is_zero() {
            return Ok(units);
        }
        mul_div_with(units, self.total_shares, self.total_units, rounding)
    }

    /// Units claimed by `shares`. Burning every share claims every unit.
    pub fn units_for(&self, shares: U256, rounding: Rounding) -> LyfResult<U256> {
        if shares > self.total_shares {
            return Err(LyfError::ArithmeticUnderflow);
        }
        if shares == self.total_shares {
            return Ok(self.total_units);
        }
        mul_div_with(shares, self.total_units, self.total_shares, rounding)
    }

    /// Add `units` and mint the matching shares
    pub fn mint(&mut self, units: U256, rounding: Rounding) -> LyfResult<U256> {
        let shares = self.shares_for(units, rounding)?;
        self.total_units = math::checked_add(self.total_units, units)?;
        self.total_shares = math::checked_add(self.total_shares, shares)?;
        Ok(shares)
    }

    /// Burn `shares` and remove the units they claim
    pub fn burn(&mut self, shares: U256, rounding: Rounding) -> LyfResult<U256> {
        let units = self.units_for(shares, rounding)?;
        self.total_units = math::checked_sub(self.total_units, units)?;
        self.total_shares = math::checked_sub(self.total_shares, shares)?;
        Ok(units)
    }

    /// Grow the units without minting shares
    pub fn accrue(&mut self, units: U256) -> LyfResult<()> {
        self.total_units = math::checked_add(self.total_units, units)?;
        Ok(())
    }

    /// Units per share in WAD, 1.0 for an empty pool
    pub fn rate(&self) -> LyfResult<U256> {
        if self.total_shares.is_zero() {
            return Ok(wad());
        }
        math::mul_div(self.total_units, wad(), self.total_shares)
    }
}
