//! Position Manager Contract
//!
//! Opens leveraged concentrated-liquidity positions by combining the owner's
//! collateral with funds borrowed from the lending vaults, hands the combined
//! balances to an authorized executor, and tracks the resulting debt shares
//! per position. Closing withdraws the liquidity, repays each vault at its
//! live debt value and returns the remainder to the owner.
//!
//! Positions are kept in an id-indexed table. Ids start at 1, are never
//! reused, and closed positions stay readable with zeroed liquidity and debt.
//!
//! ## Valuation
//!
//! Debt is valued rounding up and position assets rounding down, so a debt
//! ratio computed from the two is never flattered by rounding.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::{LyfError, LyfResult, OrRevert};
use crate::events::{PositionClosed, PositionOpened};
use crate::interfaces::{Cep18Client, ExecutorClient, PriceSourceClient, RegistryClient, VaultClient};
use crate::liquidity_math;
use crate::math::{self, to_usd, wad, Rounding};
use crate::types::{
    DebtValue, Position, PositionStatus, PriceRange, TokenAmounts, VaultSpec,
};

/// One side of a position being opened
struct Leg {
    token: Address,
    collateral: U256,
    vault: Option<Address>,
    debt: U256,
}

/// Position Manager Contract
#[odra::module(events = [PositionOpened, PositionClosed])]
pub struct PositionManager {
    /// Registry contract address
    registry: Var<Address>,
    /// Id -> position record
    positions: Mapping<u64, Position>,
    /// Next id to hand out
    next_position_id: Var<u64>,
    /// Number of positions ever opened by an owner
    owner_position_count: Mapping<Address, u64>,
    /// (owner, index) -> position id
    owner_positions: Mapping<(Address, u64), u64>,
}

#[odra::module]
impl PositionManager {
    /// Initialize the position manager
    pub fn init(&mut self, registry: Address) {
        self.registry.set(registry);
        self.next_position_id.set(1);
    }

    /// Open a position that borrows a single asset.
    ///
    /// Pulls `token_amount` of `token` and `debt_token_amount` of `debt_token`
    /// from the caller, borrows `debt_amount` of `debt_token` from its vault and
    /// lets `executor` place everything. `token` becomes token0 of the position.
    ///
    /// # Returns
    /// * Id of the new position
    pub fn create_position(
        &mut self,
        token: Address,
        debt_token: Address,
        token_amount: U256,
        debt_token_amount: U256,
        debt_amount: U256,
        executor: Address,
    ) -> u64 {
        self.require_executor(executor);
        if token == debt_token {
            self.env().revert(LyfError::SameToken);
        }

        let debt_vault = if debt_amount.is_zero() {
            None
        } else {
            match self.registry().vault_for(debt_token) {
                Some(vault) => Some(vault),
                None => self.env().revert(LyfError::VaultNotRegistered),
            }
        };
        if let Some(vault) = debt_vault {
            self.require_capacity(vault, debt_amount);
        }

        let legs = [
            Leg { token, collateral: token_amount, vault: None, debt: U256::zero() },
            Leg { token: debt_token, collateral: debt_token_amount, vault: debt_vault, debt: debt_amount },
        ];
        self.open(executor, legs, None)
    }

    /// Open a position that may borrow from both assets' vaults.
    ///
    /// Token0 and token1 are the underlying tokens of `vault0` and `vault1`;
    /// each vault must be the one registered for its token.
    ///
    /// # Returns
    /// * Id of the new position
    pub fn create_dual_vault_position(
        &mut self,
        executor: Address,
        amount0: U256,
        amount1: U256,
        vault0: VaultSpec,
        vault1: VaultSpec,
        range: PriceRange,
    ) -> u64 {
        self.require_executor(executor);
        liquidity_math::validate_range(range.sqrt_price_lower, range.sqrt_price_upper)
            .or_revert(&self.env());

        let token0 = self.require_registered_vault(vault0.vault);
        let token1 = self.require_registered_vault(vault1.vault);
        if token0 == token1 {
            self.env().revert(LyfError::SameToken);
        }
        self.require_capacity(vault0.vault, vault0.debt_amount);
        self.require_capacity(vault1.vault, vault1.debt_amount);

        let legs = [
            Leg { token: token0, collateral: amount0, vault: Some(vault0.vault), debt: vault0.debt_amount },
            Leg { token: token1, collateral: amount1, vault: Some(vault1.vault), debt: vault1.debt_amount },
        ];
        self.open(executor, legs, Some(range))
    }

    /// Withdraw a position's liquidity, repay its debt and send the rest to
    /// the owner (owner only)
    pub fn close_position(&mut self, id: u64) {
        let mut position = match self.positions.get(&id) {
            Some(position) if position.is_open() => position,
            _ => self.env().revert(LyfError::PositionNotFound),
        };
        let caller = self.env().caller();
        if caller != position.owner {
            self.env().revert(LyfError::NotOwner);
        }

        // Settle the record before any external call
        let handle = position.handle;
        let shares = [position.debt_shares0, position.debt_shares1];
        position.status = PositionStatus::Closed;
        position.liquidity = U256::zero();
        position.debt_shares0 = U256::zero();
        position.debt_shares1 = U256::zero();
        self.positions.set(&id, position.clone());

        let this = self.env().self_address();
        let tokens = [position.token0, position.token1];
        let vaults = [position.vault0, position.vault1];
        let before = tokens.map(|token| self.token(token).balance_of(this));
        self.executor(position.executor).close(handle);

        let mut repaid = [U256::zero(); 2];
        let mut returned = [U256::zero(); 2];
        for side in 0..2 {
            let after = self.token(tokens[side]).balance_of(this);
            let received = after.saturating_sub(before[side]);
            repaid[side] = self.repay_side(vaults[side], tokens[side], shares[side], received);
            returned[side] = received - repaid[side];
        }

        for side in 0..2 {
            if !returned[side].is_zero() {
                self.token(tokens[side]).transfer(position.owner, returned[side]);
            }
        }

        self.env().emit_event(PositionClosed {
            id,
            owner: position.owner,
            repaid0: repaid[0],
            repaid1: repaid[1],
            returned0: returned[0],
            returned1: returned[1],
        });
    }

    // ========== Views ==========

    /// USD value (18 decimals, rounded up) of the debt a position owes.
    /// `executor` must be the executor holding the position.
    pub fn get_debt_usd_value(&self, executor: Address, id: u64) -> DebtValue {
        let position = self.position_or_revert(id);
        if position.executor != executor {
            self.env().revert(LyfError::Unauthorized);
        }
        self.debt_value(&position).or_revert(&self.env())
    }

    pub fn get_position(&self, id: u64) -> Option<Position> {
        self.positions.get(&id)
    }

    /// Live token amounts behind a position's liquidity
    pub fn get_position_amounts(&self, id: u64) -> TokenAmounts {
        let position = self.position_or_revert(id);
        self.position_amounts(&position)
    }

    /// USD value (18 decimals, rounded down) of a position's liquidity
    pub fn get_position_value_usd(&self, id: u64) -> U256 {
        let position = self.position_or_revert(id);
        self.position_value(&position).or_revert(&self.env())
    }

    /// `debt_usd / value_usd` in WAD, rounded up. Zero without debt, `U256::max_value()`
    /// when debt is backed by nothing.
    pub fn get_debt_ratio(&self, id: u64) -> U256 {
        let position = self.position_or_revert(id);
        let debt = self.debt_value(&position).or_revert(&self.env());
        if debt.debt_usd.is_zero() {
            return U256::zero();
        }
        let value = self.position_value(&position).or_revert(&self.env());
        if value.is_zero() {
            return U256::max_value();
        }
        math::mul_div_rounding_up(debt.debt_usd, wad(), value).or_revert(&self.env())
    }

    pub fn get_owner_position_count(&self, owner: Address) -> u64 {
        self.owner_position_count.get(&owner).unwrap_or(0)
    }

    pub fn get_owner_position_id_at(&self, owner: Address, index: u64) -> Option<u64> {
        self.owner_positions.get(&(owner, index))
    }

    /// Id the next opened position will receive
    pub fn get_next_position_id(&self) -> u64 {
        self.next_position_id.get().unwrap_or(1)
    }
}

impl PositionManager {
    fn open(&mut self, executor: Address, legs: [Leg; 2], range: Option<PriceRange>) -> u64 {
        let totals = [
            math::checked_add(legs[0].collateral, legs[0].debt).or_revert(&self.env()),
            math::checked_add(legs[1].collateral, legs[1].debt).or_revert(&self.env()),
        ];
        if totals[0].is_zero() && totals[1].is_zero() {
            self.env().revert(LyfError::ZeroAmount);
        }

        let owner = self.env().caller();
        let this = self.env().self_address();
        let id = self.next_position_id.get().unwrap_or(1);
        self.next_position_id.set(id + 1);
        let index = self.get_owner_position_count(owner);
        self.owner_positions.set(&(owner, index), id);
        self.owner_position_count.set(&owner, index + 1);

        for leg in legs.iter() {
            if !leg.collateral.is_zero() {
                self.token(leg.token).transfer_from(owner, this, leg.collateral);
            }
        }

        let mut debt_shares = [U256::zero(); 2];
        for (side, leg) in legs.iter().enumerate() {
            match leg.vault {
                Some(vault) if !leg.debt.is_zero() => {
                    debt_shares[side] = VaultClient::new(self.env(), vault).borrow(leg.debt);
                }
                _ => {}
            }
        }

        let mut position = Position {
            id,
            owner,
            executor,
            token0: legs[0].token,
            token1: legs[1].token,
            vault0: legs[0].vault,
            vault1: legs[1].vault,
            range,
            handle: 0,
            liquidity: U256::zero(),
            debt_shares0: debt_shares[0],
            debt_shares1: debt_shares[1],
            status: PositionStatus::Open,
            opened_at: self.env().get_block_time(),
        };
        self.positions.set(&id, position.clone());

        for (leg, total) in legs.iter().zip(totals.iter()) {
            if !total.is_zero() {
                self.token(leg.token).transfer(executor, *total);
            }
        }
        let opened = self
            .executor(executor)
            .open(legs[0].token, legs[1].token, totals[0], totals[1], range);

        position.handle = opened.handle;
        position.liquidity = opened.liquidity;
        self.positions.set(&id, position);

        self.env().emit_event(PositionOpened {
            id,
            owner,
            executor,
            liquidity: opened.liquidity,
            debt_shares0: debt_shares[0],
            debt_shares1: debt_shares[1],
        });
        id
    }

    /// Repay one side's debt out of `received`, returning the amount repaid
    fn repay_side(&self, vault: Option<Address>, token: Address, shares: U256, received: U256) -> U256 {
        let vault = match vault {
            Some(vault) if !shares.is_zero() => VaultClient::new(self.env(), vault),
            _ => return U256::zero(),
        };
        let owed = vault.debt_share_value(shares);
        if received < owed {
            self.env().revert(LyfError::InsufficientReturn);
        }
        self.token(token).approve(vault.address(), owed);
        vault.repay(shares)
    }

    fn debt_value(&self, position: &Position) -> LyfResult<DebtValue> {
        let debt0_usd = self.side_debt_usd(position.vault0, position.token0, position.debt_shares0)?;
        let debt1_usd = self.side_debt_usd(position.vault1, position.token1, position.debt_shares1)?;
        Ok(DebtValue {
            debt0_usd,
            debt1_usd,
            debt_usd: math::checked_add(debt0_usd, debt1_usd)?,
        })
    }

    fn side_debt_usd(&self, vault: Option<Address>, token: Address, shares: U256) -> LyfResult<U256> {
        let vault = match vault {
            Some(vault) if !shares.is_zero() => vault,
            _ => return Ok(U256::zero()),
        };
        let owed = VaultClient::new(self.env(), vault).debt_share_value(shares);
        self.usd_value(token, owed, Rounding::Up)
    }

    fn position_amounts(&self, position: &Position) -> TokenAmounts {
        if !position.is_open() {
            return TokenAmounts::default();
        }
        self.executor(position.executor).amounts_for(position.handle)
    }

    fn position_value(&self, position: &Position) -> LyfResult<U256> {
        let amounts = self.position_amounts(position);
        let value0 = self.usd_value(position.token0, amounts.amount0, Rounding::Down)?;
        let value1 = self.usd_value(position.token1, amounts.amount1, Rounding::Down)?;
        math::checked_add(value0, value1)
    }

    fn usd_value(&self, token: Address, amount: U256, rounding: Rounding) -> LyfResult<U256> {
        if amount.is_zero() {
            return Ok(U256::zero());
        }
        let oracle = self.registry().get_price_oracle().ok_or(LyfError::PriceUnavailable)?;
        let reading = PriceSourceClient::new(self.env(), oracle).price(token);
        let decimals = self.token(token).decimals();
        to_usd(amount, decimals, reading.value, reading.decimals, rounding)
    }

    fn position_or_revert(&self, id: u64) -> Position {
        match self.positions.get(&id) {
            Some(position) => position,
            None => self.env().revert(LyfError::PositionNotFound),
        }
    }

    /// Returns the vault's token after checking the registry maps it back
    fn require_registered_vault(&self, vault: Address) -> Address {
        let token = VaultClient::new(self.env(), vault).get_token();
        if self.registry().vault_for(token) != Some(vault) {
            self.env().revert(LyfError::VaultNotRegistered);
        }
        token
    }

    fn require_capacity(&self, vault: Address, amount: U256) {
        if amount > VaultClient::new(self.env(), vault).free_liquidity() {
            self.env().revert(LyfError::ExceedsCapacity);
        }
    }

    fn require_executor(&self, executor: Address) {
        if !self.registry().is_authorized_executor(executor) {
            self.env().revert(LyfError::Unauthorized);
        }
    }

    fn registry(&self) -> RegistryClient {
        match self.registry.get() {
            Some(registry) => RegistryClient::new(self.env(), registry),
            None => self.env().revert(LyfError::InvalidConfig),
        }
    }

    fn executor(&self, executor: Address) -> ExecutorClient {
        ExecutorClient::new(self.env(), executor)
    }

    fn token(&self, token: Address) -> Cep18Client {
        Cep18Client::new(self.env(), token)
    }
}
