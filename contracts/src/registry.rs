//! Registry contract for vault wiring and protocol authorization.
//!
//! Maps assets to vaults, vaults to interest models, and holds the sets of
//! authorized borrowers (position managers) and executors. Vaults and the
//! position manager read it on every state-changing call.

use odra::prelude::*;
use odra::casper_types::{Key, U256};
use crate::errors::{LyfError, OrRevert};
use crate::events::{
    BorrowerAuthorizationUpdated, ExecutorUpdated, InterestModelSet, VaultRegistered,
};
use crate::interest::InterestModelParams;

/// Registry contract for protocol configuration
#[odra::module(events = [VaultRegistered, InterestModelSet, ExecutorUpdated, BorrowerAuthorizationUpdated])]
pub struct Registry {
    /// Protocol admin address
    admin: Var<Address>,
    /// Asset -> vault lending it
    vaults: Mapping<Address, Address>,
    /// Vault -> rate curve
    interest_models: Mapping<Address, InterestModelParams>,
    /// Contracts allowed to borrow from vaults
    authorized_borrowers: Mapping<Address, bool>,
    /// Liquidity executors positions may be opened with
    executors: Mapping<Address, bool>,
    /// Price source used for USD valuation
    price_oracle: Var<Option<Address>>,
}

#[odra::module]
impl Registry {
    /// Initialize the registry.
    /// Uses Key instead of Address to allow deployment via casper-client.
    pub fn init(&mut self, admin: Key) {
        match Address::try_from(admin) {
            Ok(admin) => self.admin.set(admin),
            Err(_) => self.env().revert(LyfError::InvalidConfig),
        }
        self.price_oracle.set(None);
    }

    /// Register the vault lending `asset` (admin only)
    pub fn set_vault(&mut self, asset: Address, vault: Address) {
        self.require_admin();
        self.vaults.set(&asset, vault);
        self.env().emit_event(VaultRegistered { asset, vault });
    }

    /// Attach a rate curve to a vault (admin only). A vault's curve is fixed
    /// once set.
    pub fn set_vault_interest_model(&mut self, vault: Address, params: InterestModelParams) {
        self.require_admin();
        if self.interest_models.get(&vault).is_some() {
            self.env().revert(LyfError::InterestModelAlreadySet);
        }
        params.validate().or_revert(&self.env());
        let breakpoints = params.points.len() as u32;
        self.interest_models.set(&vault, params);
        self.env().emit_event(InterestModelSet { vault, breakpoints });
    }

    /// Allow or disallow a contract to borrow from vaults (admin only)
    pub fn set_borrower_authorization(&mut self, borrower: Address, authorized: bool) {
        self.require_admin();
        self.authorized_borrowers.set(&borrower, authorized);
        self.env().emit_event(BorrowerAuthorizationUpdated { borrower, authorized });
    }

    /// Allow or disallow a liquidity executor (admin only)
    pub fn set_executor(&mut self, executor: Address, authorized: bool) {
        self.require_admin();
        self.executors.set(&executor, authorized);
        self.env().emit_event(ExecutorUpdated { executor, authorized });
    }

    /// Set the price source contract (admin only)
    pub fn set_price_oracle(&mut self, oracle: Address) {
        self.require_admin();
        self.price_oracle.set(Some(oracle));
    }

    /// Transfer admin to new address (admin only)
    pub fn transfer_admin(&mut self, new_admin: Address) {
        self.require_admin();
        self.admin.set(new_admin);
    }

    pub fn vault_for(&self, asset: Address) -> Option<Address> {
        self.vaults.get(&asset)
    }

    pub fn interest_model_of(&self, vault: Address) -> Option<InterestModelParams> {
        self.interest_models.get(&vault)
    }

    /// Annual borrow rate (WAD) the vault's curve gives for the inputs
    pub fn get_borrow_rate(&self, vault: Address, borrowed: U256, supplied: U256) -> U256 {
        let model = match self.interest_model_of(vault) {
            Some(model) => model,
            None => self.env().revert(LyfError::InterestModelMissing),
        };
        model.borrow_rate(borrowed, supplied).or_revert(&self.env())
    }

    pub fn is_authorized_borrower(&self, borrower: Address) -> bool {
        self.authorized_borrowers.get(&borrower).unwrap_or(false)
    }

    pub fn is_authorized_executor(&self, executor: Address) -> bool {
        self.executors.get(&executor).unwrap_or(false)
    }

    pub fn get_price_oracle(&self) -> Option<Address> {
        self.price_oracle.get().flatten()
    }

    /// Get the admin address
    pub fn get_admin(&self) -> Option<Address> {
        self.admin.get()
    }

    /// Check if caller is admin
    pub fn is_admin(&self, caller: Address) -> bool {
        self.admin.get().map_or(false, |admin| admin == caller)
    }

    fn require_admin(&self) {
        let caller = self.env().caller();
        if !self.is_admin(caller) {
            self.env().revert(LyfError::NotAdmin);
        }
    }
}
