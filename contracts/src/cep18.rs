//! CEP-18 token ledger shared by the vault share token and the test token.
//!
//! Balances live in Odra storage and are mirrored into the standard CEP-18
//! named keys and dictionaries so wallets and explorers can read them.

use odra::prelude::*;
use odra::casper_types::{U256, Key};
use odra::casper_types::bytesrepr::ToBytes;
use crate::errors::LyfError;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;

const CEP18_NAME_KEY: &str = "name";
const CEP18_SYMBOL_KEY: &str = "symbol";
const CEP18_DECIMALS_KEY: &str = "decimals";
const CEP18_TOTAL_SUPPLY_KEY: &str = "total_supply";
const CEP18_BALANCES_DICT: &str = "balances";
const CEP18_ALLOWANCES_DICT: &str = "allowances";

#[odra::module]
pub struct Cep18Ledger {
    name: Var<String>,
    symbol: Var<String>,
    decimals: Var<u8>,
    total_supply: Var<U256>,
    balances: Mapping<Address, U256>,
    /// (owner, spender) -> amount
    allowances: Mapping<(Address, Address), U256>,
}

#[odra::module]
impl Cep18Ledger {
    pub fn init(&mut self, name: String, symbol: String, decimals: u8) {
        self.name.set(name.clone());
        self.symbol.set(symbol.clone());
        self.decimals.set(decimals);
        self.total_supply.set(U256::zero());
        self.env().init_dictionary(CEP18_BALANCES_DICT);
        self.env().init_dictionary(CEP18_ALLOWANCES_DICT);
        self.env().set_named_value(CEP18_NAME_KEY, name);
        self.env().set_named_value(CEP18_SYMBOL_KEY, symbol);
        self.env().set_named_value(CEP18_DECIMALS_KEY, decimals);
        self.env().set_named_value(CEP18_TOTAL_SUPPLY_KEY, U256::zero());
    }

    pub fn name(&self) -> String {
        self.name.get().unwrap_or_default()
    }

    pub fn symbol(&self) -> String {
        self.symbol.get().unwrap_or_default()
    }

    pub fn decimals(&self) -> u8 {
        self.decimals.get().unwrap_or(18)
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply.get().unwrap_or(U256::zero())
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).unwrap_or(U256::zero())
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances.get(&(owner, spender)).unwrap_or(U256::zero())
    }

    /// Move `amount` from `from` to `to`
    pub fn raw_transfer(&mut self, from: Address, to: Address, amount: U256) {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            self.env().revert(LyfError::InsufficientTokenBalance);
        }
        self.set_balance(from, from_balance - amount);

        let to_balance = self.balance_of(to);
        match to_balance.checked_add(amount) {
            Some(balance) => self.set_balance(to, balance),
            None => self.env().revert(LyfError::ArithmeticOverflow),
        }
    }

    pub fn raw_approve(&mut self, owner: Address, spender: Address, amount: U256) {
        self.allowances.set(&(owner, spender), amount);
        let key = Self::allowance_key(owner, spender);
        self.env().set_dictionary_value(CEP18_ALLOWANCES_DICT, key.as_bytes(), amount);
    }

    /// Consume `amount` of the allowance `owner` granted `spender`
    pub fn spend_allowance(&mut self, owner: Address, spender: Address, amount: U256) {
        let current = self.allowance(owner, spender);
        if current < amount {
            self.env().revert(LyfError::InsufficientAllowance);
        }
        self.raw_approve(owner, spender, current - amount);
    }

    pub fn mint(&mut self, to: Address, amount: U256) {
        let supply = match self.total_supply().checked_add(amount) {
            Some(supply) => supply,
            None => self.env().revert(LyfError::ArithmeticOverflow),
        };
        self.set_total_supply(supply);
        let balance = self.balance_of(to);
        self.set_balance(to, balance + amount);
    }

    pub fn burn(&mut self, from: Address, amount: U256) {
        let balance = self.balance_of(from);
        if balance < amount {
            self.env().revert(LyfError::InsufficientTokenBalance);
        }
        self.set_balance(from, balance - amount);
        let supply = self.total_supply();
        self.set_total_supply(supply - amount);
    }
}

impl Cep18Ledger {
    fn set_balance(&mut self, owner: Address, amount: U256) {
        self.balances.set(&owner, amount);
        let key = Self::balance_key(owner);
        self.env().set_dictionary_value(CEP18_BALANCES_DICT, key.as_bytes(), amount);
    }

    fn set_total_supply(&mut self, amount: U256) {
        self.total_supply.set(amount);
        self.env().set_named_value(CEP18_TOTAL_SUPPLY_KEY, amount);
    }

    fn balance_key(owner: Address) -> String {
        let key = Key::from(owner);
        let bytes = key.to_bytes().unwrap_or_default();
        BASE64_STANDARD.encode(bytes)
    }

    fn allowance_key(owner: Address, spender: Address) -> String {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&Key::from(owner).to_bytes().unwrap_or_default());
        bytes.extend_from_slice(&Key::from(spender).to_bytes().unwrap_or_default());
        BASE64_STANDARD.encode(bytes)
    }
}
