//! Faucet CEP-18 token.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::cep18::Cep18Ledger;

#[odra::module]
pub struct TestToken {
    ledger: SubModule<Cep18Ledger>,
}

#[odra::module]
impl TestToken {
    pub fn init(&mut self, name: String, symbol: String, decimals: u8) {
        self.ledger.init(name, symbol, decimals);
    }

    pub fn name(&self) -> String {
        self.ledger.name()
    }

    pub fn symbol(&self) -> String {
        self.ledger.symbol()
    }

    pub fn decimals(&self) -> u8 {
        self.ledger.decimals()
    }

    pub fn total_supply(&self) -> U256 {
        self.ledger.total_supply()
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.ledger.balance_of(account)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.ledger.allowance(owner, spender)
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) -> bool {
        let sender = self.env().caller();
        self.ledger.raw_transfer(sender, recipient, amount);
        true
    }

    pub fn approve(&mut self, spender: Address, amount: U256) -> bool {
        let owner = self.env().caller();
        self.ledger.raw_approve(owner, spender, amount);
        true
    }

    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) -> bool {
        let spender = self.env().caller();
        self.ledger.spend_allowance(owner, spender, amount);
        self.ledger.raw_transfer(owner, recipient, amount);
        true
    }

    /// Mint to anyone, no access control
    pub fn mint(&mut self, to: Address, amount: U256) {
        self.ledger.mint(to, amount);
    }
}
