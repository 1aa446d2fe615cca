//! Stand-in collaborators for local networks and tests.
//!
//! - **TestToken**: faucet CEP-18 token anyone can mint
//! - **RangeExecutor**: simulated concentrated-liquidity executor at a
//!   settable price

pub mod range_executor;
pub mod test_token;
