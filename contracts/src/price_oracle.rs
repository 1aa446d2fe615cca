//! Price Oracle Contract
//!
//! Admin-fed USD prices per asset. Each reading carries its own decimals and
//! the block time it was written; `price` refuses readings that are missing,
//! zero, or older than the configured maximum age. Nothing is cached on the
//! consumer side, so every valuation re-queries.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::LyfError;
use crate::events::PriceUpdated;
use crate::interfaces::RegistryClient;
use crate::types::PriceReading;

/// Default maximum price age in seconds (1 hour)
const DEFAULT_MAX_PRICE_AGE_SECONDS: u64 = 3600;

/// Largest accepted decimals for a reading
const MAX_PRICE_DECIMALS: u8 = 36;

/// Oracle configuration
#[odra::odra_type]
pub struct OracleConfig {
    /// Maximum price age in seconds before considered stale
    pub max_price_age_seconds: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            max_price_age_seconds: DEFAULT_MAX_PRICE_AGE_SECONDS,
        }
    }
}

/// Stored reading for one asset
#[odra::odra_type]
pub struct PriceFeed {
    pub value: U256,
    pub decimals: u8,
    /// Seconds
    pub updated_at: u64,
}

/// Price Oracle Contract
#[odra::module(events = [PriceUpdated])]
pub struct PriceOracle {
    /// Registry contract address (for access control)
    registry: Var<Address>,
    /// Oracle configuration
    config: Var<OracleConfig>,
    /// Latest reading per asset
    feeds: Mapping<Address, PriceFeed>,
}

#[odra::module]
impl PriceOracle {
    /// Initialize the oracle
    pub fn init(&mut self, registry: Address) {
        self.registry.set(registry);
        self.config.set(OracleConfig::default());
    }

    /// Publish the USD price of one whole `asset` (admin only)
    pub fn set_price(&mut self, asset: Address, value: U256, decimals: u8) {
        self.require_registry_admin();
        if value.is_zero() || decimals > MAX_PRICE_DECIMALS {
            self.env().revert(LyfError::InvalidConfig);
        }
        let timestamp = self.now();
        self.feeds.set(&asset, PriceFeed { value, decimals, updated_at: timestamp });
        self.env().emit_event(PriceUpdated { asset, value, decimals, timestamp });
    }

    /// Update oracle configuration (admin only)
    pub fn set_config(&mut self, config: OracleConfig) {
        self.require_registry_admin();
        if config.max_price_age_seconds == 0 {
            self.env().revert(LyfError::InvalidConfig);
        }
        self.config.set(config);
    }

    /// Current fresh price of `asset`
    pub fn price(&self, asset: Address) -> PriceReading {
        let feed = match self.feeds.get(&asset) {
            Some(feed) if !feed.value.is_zero() => feed,
            _ => self.env().revert(LyfError::PriceUnavailable),
        };

        // Check freshness
        let config = self.get_config();
        let age = self.now().saturating_sub(feed.updated_at);
        if age > config.max_price_age_seconds {
            self.env().revert(LyfError::PriceStale);
        }

        PriceReading {
            value: feed.value,
            decimals: feed.decimals,
        }
    }

    /// Raw stored reading, fresh or not
    pub fn get_feed(&self, asset: Address) -> Option<PriceFeed> {
        self.feeds.get(&asset)
    }

    pub fn get_config(&self) -> OracleConfig {
        self.config.get().unwrap_or_default()
    }

    fn now(&self) -> u64 {
        self.env().get_block_time() / 1000
    }

    fn require_registry_admin(&self) {
        let caller = self.env().caller();
        let registry = match self.registry.get() {
            Some(registry) => registry,
            None => self.env().revert(LyfError::InvalidConfig),
        };
        if !RegistryClient::new(self.env(), registry).is_admin(caller) {
            self.env().revert(LyfError::NotAdmin);
        }
    }
}
