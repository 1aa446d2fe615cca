//! Cross-contract call wrappers.
//!
//! Each client holds the caller's `ContractEnv` and issues `CallDef` calls
//! against one collaborator address. A callee revert aborts the whole call.

use alloc::rc::Rc;
use odra::prelude::*;
use odra::casper_types::{U256, RuntimeArgs, runtime_args};
use odra::{CallDef, ContractEnv};
use crate::errors::LyfError;
use crate::interest::InterestModelParams;
use crate::types::{OpenResult, Position, PriceRange, PriceReading, TokenAmounts};

/// CEP-18 token
pub struct Cep18Client {
    env: Rc<ContractEnv>,
    token: Address,
}

impl Cep18Client {
    pub fn new(env: Rc<ContractEnv>, token: Address) -> Self {
        Self { env, token }
    }

    pub fn transfer(&self, recipient: Address, amount: U256) {
        let args = runtime_args! {
            "recipient" => recipient,
            "amount" => amount,
        };
        let call_def = CallDef::new("transfer", true, args);
        let success: bool = self.env.call_contract(self.token, call_def);
        if !success {
            self.env.revert(LyfError::InsufficientTokenBalance);
        }
    }

    pub fn transfer_from(&self, owner: Address, recipient: Address, amount: U256) {
        let args = runtime_args! {
            "owner" => owner,
            "recipient" => recipient,
            "amount" => amount,
        };
        let call_def = CallDef::new("transfer_from", true, args);
        let success: bool = self.env.call_contract(self.token, call_def);
        if !success {
            self.env.revert(LyfError::InsufficientAllowance);
        }
    }

    pub fn approve(&self, spender: Address, amount: U256) {
        let args = runtime_args! {
            "spender" => spender,
            "amount" => amount,
        };
        let call_def = CallDef::new("approve", true, args);
        self.env.call_contract::<bool>(self.token, call_def);
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        let args = runtime_args! { "account" => account };
        let call_def = CallDef::new("balance_of", false, args);
        self.env.call_contract(self.token, call_def)
    }

    pub fn decimals(&self) -> u8 {
        let call_def = CallDef::new("decimals", false, RuntimeArgs::new());
        self.env.call_contract(self.token, call_def)
    }
}

/// Protocol registry
pub struct RegistryClient {
    env: Rc<ContractEnv>,
    registry: Address,
}

impl RegistryClient {
    pub fn new(env: Rc<ContractEnv>, registry: Address) -> Self {
        Self { env, registry }
    }

    pub fn is_admin(&self, caller: Address) -> bool {
        let args = runtime_args! { "caller" => caller };
        let call_def = CallDef::new("is_admin", false, args);
        self.env.call_contract(self.registry, call_def)
    }

    pub fn vault_for(&self, asset: Address) -> Option<Address> {
        let args = runtime_args! { "asset" => asset };
        let call_def = CallDef::new("vault_for", false, args);
        self.env.call_contract(self.registry, call_def)
    }

    pub fn interest_model_of(&self, vault: Address) -> Option<InterestModelParams> {
        let args = runtime_args! { "vault" => vault };
        let call_def = CallDef::new("interest_model_of", false, args);
        self.env.call_contract(self.registry, call_def)
    }

    pub fn is_authorized_borrower(&self, borrower: Address) -> bool {
        let args = runtime_args! { "borrower" => borrower };
        let call_def = CallDef::new("is_authorized_borrower", false, args);
        self.env.call_contract(self.registry, call_def)
    }

    pub fn is_authorized_executor(&self, executor: Address) -> bool {
        let args = runtime_args! { "executor" => executor };
        let call_def = CallDef::new("is_authorized_executor", false, args);
        self.env.call_contract(self.registry, call_def)
    }

    pub fn get_price_oracle(&self) -> Option<Address> {
        let call_def = CallDef::new("get_price_oracle", false, RuntimeArgs::new());
        self.env.call_contract(self.registry, call_def)
    }
}

/// Lending vault, seen from a whitelisted borrower
pub struct VaultClient {
    env: Rc<ContractEnv>,
    vault: Address,
}

impl VaultClient {
    pub fn new(env: Rc<ContractEnv>, vault: Address) -> Self {
        Self { env, vault }
    }

    pub fn address(&self) -> Address {
        self.vault
    }

    /// Borrow `amount`, returning the debt shares minted
    pub fn borrow(&self, amount: U256) -> U256 {
        let args = runtime_args! { "amount" => amount };
        let call_def = CallDef::new("borrow", true, args);
        self.env.call_contract(self.vault, call_def)
    }

    /// Repay `debt_shares`, returning the amount pulled from the caller
    pub fn repay(&self, debt_shares: U256) -> U256 {
        let args = runtime_args! { "debt_shares" => debt_shares };
        let call_def = CallDef::new("repay", true, args);
        self.env.call_contract(self.vault, call_def)
    }

    pub fn debt_share_value(&self, debt_shares: U256) -> U256 {
        let args = runtime_args! { "debt_shares" => debt_shares };
        let call_def = CallDef::new("debt_share_value", false, args);
        self.env.call_contract(self.vault, call_def)
    }

    pub fn free_liquidity(&self) -> U256 {
        let call_def = CallDef::new("free_liquidity", false, RuntimeArgs::new());
        self.env.call_contract(self.vault, call_def)
    }

    pub fn get_token(&self) -> Address {
        let call_def = CallDef::new("get_token", false, RuntimeArgs::new());
        self.env.call_contract(self.vault, call_def)
    }
}

/// Liquidity executor
pub struct ExecutorClient {
    env: Rc<ContractEnv>,
    executor: Address,
}

impl ExecutorClient {
    pub fn new(env: Rc<ContractEnv>, executor: Address) -> Self {
        Self { env, executor }
    }

    pub fn open(
        &self,
        token0: Address,
        token1: Address,
        amount0: U256,
        amount1: U256,
        range: Option<PriceRange>,
    ) -> OpenResult {
        let args = runtime_args! {
            "token0" => token0,
            "token1" => token1,
            "amount0" => amount0,
            "amount1" => amount1,
            "range" => range,
        };
        let call_def = CallDef::new("open", true, args);
        self.env.call_contract(self.executor, call_def)
    }

    pub fn close(&self, handle: u64) -> TokenAmounts {
        let args = runtime_args! { "handle" => handle };
        let call_def = CallDef::new("close", true, args);
        self.env.call_contract(self.executor, call_def)
    }

    pub fn amounts_for(&self, handle: u64) -> TokenAmounts {
        let args = runtime_args! { "handle" => handle };
        let call_def = CallDef::new("amounts_for", false, args);
        self.env.call_contract(self.executor, call_def)
    }
}

/// USD price source
pub struct PriceSourceClient {
    env: Rc<ContractEnv>,
    oracle: Address,
}

impl PriceSourceClient {
    pub fn new(env: Rc<ContractEnv>, oracle: Address) -> Self {
        Self { env, oracle }
    }

    pub fn price(&self, asset: Address) -> PriceReading {
        let args = runtime_args! { "asset" => asset };
        let call_def = CallDef::new("price", false, args);
        self.env.call_contract(self.oracle, call_def)
    }
}

/// Position manager, as seen by an executor calling back into it
pub struct PositionManagerClient {
    env: Rc<ContractEnv>,
    manager: Address,
}

impl PositionManagerClient {
    pub fn new(env: Rc<ContractEnv>, manager: Address) -> Self {
        Self { env, manager }
    }

    pub fn close_position(&self, id: u64) {
        let args = runtime_args! { "id" => id };
        let call_def = CallDef::new("close_position", true, args);
        self.env.call_contract::<()>(self.manager, call_def);
    }

    pub fn get_position(&self, id: u64) -> Option<Position> {
        let args = runtime_args! { "id" => id };
        let call_def = CallDef::new("get_position", false, args);
        self.env.call_contract(self.manager, call_def)
    }
}
