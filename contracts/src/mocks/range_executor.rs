//! Simulated concentrated-liquidity executor.
//!
//! Prices liquidity with the crate's liquidity math at an admin-set current
//! price instead of a real pool. Tokens the range cannot absorb stay in the
//! slot as idle balance and are paid back on close. Two test hooks exist: a
//! haircut applied to close proceeds, and a callback into the position
//! manager from inside `close`.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::{LyfError, OrRevert};
use crate::interfaces::{Cep18Client, PositionManagerClient};
use crate::liquidity_math;
use crate::types::{OpenResult, Position, PriceRange, TokenAmounts};

const BPS_SCALE: u32 = 10_000;

/// What `close` does before paying out
#[odra::odra_type]
#[derive(Copy)]
pub enum ReentryMode {
    Off,
    /// Call `close_position` on the caller again
    CloseAgain,
    /// Read the position from the caller and keep it
    Observe,
}

/// Liquidity placed for one opener
#[odra::odra_type]
pub struct LiquiditySlot {
    pub opener: Address,
    pub token0: Address,
    pub token1: Address,
    pub range: PriceRange,
    pub liquidity: U256,
    pub idle0: U256,
    pub idle1: U256,
    pub open: bool,
}

#[odra::module]
pub struct RangeExecutor {
    admin: Var<Address>,
    sqrt_price: Var<U256>,
    default_range: Var<PriceRange>,
    loss_bps: Var<u32>,
    reentry: Var<ReentryMode>,
    reentry_position: Var<u64>,
    observed: Var<Option<Position>>,
    next_handle: Var<u64>,
    slots: Mapping<u64, LiquiditySlot>,
}

#[odra::module]
impl RangeExecutor {
    pub fn init(&mut self, sqrt_price: U256, default_range: PriceRange) {
        liquidity_math::validate_range(default_range.sqrt_price_lower, default_range.sqrt_price_upper)
            .or_revert(&self.env());
        self.admin.set(self.env().caller());
        self.sqrt_price.set(sqrt_price);
        self.default_range.set(default_range);
        self.loss_bps.set(0);
        self.reentry.set(ReentryMode::Off);
        self.observed.set(None);
        self.next_handle.set(1);
    }

    /// Place `amount0`/`amount1`, already transferred in by the caller
    pub fn open(
        &mut self,
        token0: Address,
        token1: Address,
        amount0: U256,
        amount1: U256,
        range: Option<PriceRange>,
    ) -> OpenResult {
        let range = match range {
            Some(range) => range,
            None => self.get_default_range(),
        };
        let price = self.get_sqrt_price();
        let liquidity = liquidity_math::liquidity_for_amounts(
            price,
            range.sqrt_price_lower,
            range.sqrt_price_upper,
            amount0,
            amount1,
        )
        .or_revert(&self.env());
        let (need0, need1) = liquidity_math::amounts_for_liquidity_rounding_up(
            price,
            range.sqrt_price_lower,
            range.sqrt_price_upper,
            liquidity,
        )
        .or_revert(&self.env());
        let used0 = need0.min(amount0);
        let used1 = need1.min(amount1);

        let handle = self.next_handle.get().unwrap_or(1);
        self.next_handle.set(handle + 1);
        self.slots.set(
            &handle,
            LiquiditySlot {
                opener: self.env().caller(),
                token0,
                token1,
                range,
                liquidity,
                idle0: amount0 - used0,
                idle1: amount1 - used1,
                open: true,
            },
        );

        OpenResult { handle, liquidity, used0, used1 }
    }

    /// Remove all liquidity and pay it back to the opener
    pub fn close(&mut self, handle: u64) -> TokenAmounts {
        let caller = self.env().caller();
        let mut slot = match self.slots.get(&handle) {
            Some(slot) if slot.open => slot,
            _ => self.env().revert(LyfError::PositionNotFound),
        };
        if caller != slot.opener {
            self.env().revert(LyfError::Unauthorized);
        }

        let live = self.slot_amounts(&slot);
        let this = self.env().self_address();
        let keep = U256::from(BPS_SCALE - self.loss_bps.get().unwrap_or(0));
        let pay = |amount: U256, token: Address| -> U256 {
            let held = Cep18Client::new(self.env(), token).balance_of(this);
            amount.min(held) * keep / U256::from(BPS_SCALE)
        };
        let amounts = TokenAmounts {
            amount0: pay(live.amount0, slot.token0),
            amount1: pay(live.amount1, slot.token1),
        };

        slot.open = false;
        slot.liquidity = U256::zero();
        slot.idle0 = U256::zero();
        slot.idle1 = U256::zero();
        self.slots.set(&handle, slot.clone());

        let target = self.reentry_position.get().unwrap_or(0);
        match self.reentry.get().unwrap_or(ReentryMode::Off) {
            ReentryMode::Off => {}
            ReentryMode::CloseAgain => {
                PositionManagerClient::new(self.env(), caller).close_position(target);
            }
            ReentryMode::Observe => {
                let seen = PositionManagerClient::new(self.env(), caller).get_position(target);
                self.observed.set(seen);
            }
        }

        if !amounts.amount0.is_zero() {
            Cep18Client::new(self.env(), slot.token0).transfer(caller, amounts.amount0);
        }
        if !amounts.amount1.is_zero() {
            Cep18Client::new(self.env(), slot.token1).transfer(caller, amounts.amount1);
        }
        amounts
    }

    /// Live amounts behind a slot at the current price, without withdrawing
    pub fn amounts_for(&self, handle: u64) -> TokenAmounts {
        match self.slots.get(&handle) {
            Some(slot) if slot.open => self.slot_amounts(&slot),
            _ => TokenAmounts::default(),
        }
    }

    // ========== Admin Functions ==========

    pub fn set_sqrt_price(&mut self, sqrt_price: U256) {
        self.require_admin();
        self.sqrt_price.set(sqrt_price);
    }

    /// Haircut applied to close proceeds, in basis points
    pub fn set_loss_bps(&mut self, loss_bps: u32) {
        self.require_admin();
        if loss_bps > BPS_SCALE {
            self.env().revert(LyfError::InvalidConfig);
        }
        self.loss_bps.set(loss_bps);
    }

    pub fn set_reentry(&mut self, mode: ReentryMode, position_id: u64) {
        self.require_admin();
        self.reentry.set(mode);
        self.reentry_position.set(position_id);
    }

    // ========== Views ==========

    pub fn get_sqrt_price(&self) -> U256 {
        self.sqrt_price.get().unwrap_or(liquidity_math::q96())
    }

    pub fn get_default_range(&self) -> PriceRange {
        match self.default_range.get() {
            Some(range) => range,
            None => self.env().revert(LyfError::InvalidRange),
        }
    }

    pub fn get_slot(&self, handle: u64) -> Option<LiquiditySlot> {
        self.slots.get(&handle)
    }

    /// Position seen by the last `Observe` callback
    pub fn get_observed(&self) -> Option<Position> {
        self.observed.get().flatten()
    }

    fn slot_amounts(&self, slot: &LiquiditySlot) -> TokenAmounts {
        let (amount0, amount1) = liquidity_math::amounts_for_liquidity(
            self.get_sqrt_price(),
            slot.range.sqrt_price_lower,
            slot.range.sqrt_price_upper,
            slot.liquidity,
        )
        .or_revert(&self.env());
        TokenAmounts {
            amount0: amount0 + slot.idle0,
            amount1: amount1 + slot.idle1,
        }
    }

    fn require_admin(&self) {
        if self.admin.get() != Some(self.env().caller()) {
            self.env().revert(LyfError::NotAdmin);
        }
    }
}
