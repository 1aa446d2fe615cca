//! Events emitted by protocol contracts.

use odra::prelude::*;
use odra::casper_types::U256;

// ========== Vault ==========

#[odra::event]
pub struct Deposited {
    pub owner: Address,
    pub amount: U256,
    pub shares: U256,
}

#[odra::event]
pub struct Withdrawn {
    pub owner: Address,
    pub shares: U256,
    pub amount: U256,
}

#[odra::event]
pub struct Borrowed {
    pub borrower: Address,
    pub amount: U256,
    pub debt_shares: U256,
}

#[odra::event]
pub struct Repaid {
    pub borrower: Address,
    pub debt_shares: U256,
    pub amount: U256,
}

/// Interest moved from borrowers to depositors
#[odra::event]
pub struct InterestAccrued {
    pub interest: U256,
    pub rate: U256,
    pub elapsed_seconds: u64,
    pub total_debt: U256,
}

#[odra::event]
pub struct BorrowerUpdated {
    pub borrower: Address,
    pub whitelisted: bool,
}

// ========== Registry ==========

#[odra::event]
pub struct VaultRegistered {
    pub asset: Address,
    pub vault: Address,
}

#[odra::event]
pub struct InterestModelSet {
    pub vault: Address,
    pub breakpoints: u32,
}

#[odra::event]
pub struct ExecutorUpdated {
    pub executor: Address,
    pub authorized: bool,
}

#[odra::event]
pub struct BorrowerAuthorizationUpdated {
    pub borrower: Address,
    pub authorized: bool,
}

// ========== Oracle ==========

#[odra::event]
pub struct PriceUpdated {
    pub asset: Address,
    pub value: U256,
    pub decimals: u8,
    pub timestamp: u64,
}

// ========== Position manager ==========

#[odra::event]
pub struct PositionOpened {
    pub id: u64,
    pub owner: Address,
    pub executor: Address,
    pub liquidity: U256,
    pub debt_shares0: U256,
    pub debt_shares1: U256,
}

#[odra::event]
pub struct PositionClosed {
    pub id: u64,
    pub owner: Address,
    pub repaid0: U256,
    pub repaid1: U256,
    pub returned0: U256,
    pub returned1: U256,
}
