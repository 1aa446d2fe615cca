//! CSPR-LYF Contracts
//!
//! Casper-native leveraged yield farming: share-based lending vaults and a
//! position manager that opens leveraged concentrated-liquidity positions
//! against two of them.
//!
//! ## Architecture
//!
//! - **Registry**: asset -> vault mapping, per-vault interest models, borrower
//!   and executor authorization, admin
//! - **Vault**: one per lending asset; interest-bearing CEP-18 share token,
//!   debt shares for whitelisted borrowers, kink-curve interest accrual
//! - **PositionManager**: opens, values and closes leveraged positions,
//!   tracking each position's debt shares in both vaults
//! - **PriceOracle**: admin-fed USD prices with a freshness bound
//!
//! Pure libraries back the contracts: `math` (512-bit mul-div),
//! `liquidity_math` (sqrtPriceX96 liquidity/amount conversions), `interest`
//! (rate curve and accrual) and `pool` (share pool accounting).
//!
//! ## Accrual discipline
//!
//! Every vault mutation accrues interest first, then updates bookkeeping, and
//! only then calls out to token contracts. The position manager settles its
//! position record before calling the executor.

#![cfg_attr(target_arch = "wasm32", no_std)]

extern crate alloc;

// Re-export odra for downstream usage
pub use odra;

// Core module declarations
pub mod types;
pub mod errors;
pub mod events;
pub mod math;
pub mod liquidity_math;
pub mod interest;
pub mod pool;
pub mod interfaces;
pub mod cep18;

// Contract modules
pub mod registry;
pub mod vault;
pub mod price_oracle;
pub mod position_manager;

// Local network and test collaborators
pub mod mocks;
