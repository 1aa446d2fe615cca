//! Common types used across the leveraged yield farming protocol.

use odra::prelude::*;
use odra::casper_types::U256;

/// Lifecycle state of a position record
#[odra::odra_type]
#[derive(Copy)]
pub enum PositionStatus {
    /// Liquidity placed, debt outstanding
    Open,
    /// Liquidity withdrawn, debt repaid; the record is kept for lookups
    Closed,
}

/// Square-root price bounds of a concentrated-liquidity range (Q64.96)
#[odra::odra_type]
#[derive(Copy)]
pub struct PriceRange {
    pub sqrt_price_lower: U256,
    pub sqrt_price_upper: U256,
}

/// Leveraged liquidity position
#[odra::odra_type]
pub struct Position {
    /// Never reused; the first position has id 1
    pub id: u64,
    pub owner: Address,
    /// Executor that holds the liquidity
    pub executor: Address,
    pub token0: Address,
    pub token1: Address,
    /// Vault that lent token0 (None when nothing was borrowed against it)
    pub vault0: Option<Address>,
    /// Vault that lent token1
    pub vault1: Option<Address>,
    /// Requested range, None when the executor picks its own
    pub range: Option<PriceRange>,
    /// Opaque liquidity handle issued by the executor
    pub handle: u64,
    /// Liquidity reported by the executor at open
    pub liquidity: U256,
    /// Debt shares owed to `vault0`
    pub debt_shares0: U256,
    /// Debt shares owed to `vault1`
    pub debt_shares1: U256,
    pub status: PositionStatus,
    /// Block time (ms) the position was opened
    pub opened_at: u64,
}

impl Position {
    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }
}

/// Borrow request against one asset's vault
#[odra::odra_type]
#[derive(Copy)]
pub struct VaultSpec {
    pub vault: Address,
    pub debt_amount: U256,
}

/// A pair of token amounts, ordered token0 then token1
#[odra::odra_type]
#[derive(Copy, Default)]
pub struct TokenAmounts {
    pub amount0: U256,
    pub amount1: U256,
}

/// What an executor reports after placing liquidity
#[odra::odra_type]
#[derive(Copy)]
pub struct OpenResult {
    pub handle: u64,
    pub liquidity: U256,
    pub used0: U256,
    pub used1: U256,
}

/// USD debt exposure of a position (18 decimals, rounded up)
#[odra::odra_type]
#[derive(Copy, Default)]
pub struct DebtValue {
    pub debt0_usd: U256,
    pub debt1_usd: U256,
    pub debt_usd: U256,
}

/// A price reading: USD per whole token with `decimals` decimals
#[odra::odra_type]
#[derive(Copy)]
pub struct PriceReading {
    pub value: U256,
    pub decimals: u8,
}

/// Snapshot of a vault's aggregate accounting
#[odra::odra_type]
#[derive(Copy, Default)]
pub struct VaultState {
    /// Underlying held plus underlying lent out (includes accrued interest)
    pub total_token: U256,
    /// Outstanding deposit shares
    pub total_supply_shares: U256,
    /// Underlying owed by borrowers
    pub total_debt: U256,
    /// Outstanding debt shares
    pub total_debt_shares: U256,
    /// Seconds
    pub last_accrual_timestamp: u64,
}
