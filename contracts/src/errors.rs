//! Protocol error definitions.

use odra::prelude::*;
use odra::ContractEnv;

/// Result type for the pure math libraries
pub type LyfResult<T> = Result<T, LyfError>;

/// Leveraged yield farming protocol errors
#[repr(u16)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LyfError {
    // Vault errors (1xx)
    ZeroAmount = 100,
    InsufficientLiquidity = 101,
    InsufficientShares = 102,
    InsufficientDebtShares = 103,
    InterestModelMissing = 104,

    // Math errors (2xx)
    ArithmeticOverflow = 200,
    ArithmeticUnderflow = 201,
    DivisionByZero = 202,
    InvalidRange = 203,

    // Access control errors (4xx)
    Unauthorized = 400,
    NotAdmin = 401,
    NotOwner = 402,

    // Token errors (5xx)
    InsufficientTokenBalance = 500,
    InsufficientAllowance = 501,

    // Position errors (6xx)
    PositionNotFound = 600,
    InsufficientReturn = 601,
    ExceedsCapacity = 602,
    SameToken = 603,
    VaultNotRegistered = 604,

    // Oracle errors (7xx)
    PriceUnavailable = 700,
    PriceStale = 701,

    // Configuration errors (9xx)
    InvalidConfig = 900,
    InvalidInterestModel = 901,
    InterestModelAlreadySet = 902,
}

impl LyfError {
    pub const fn message(&self) -> &'static str {
        match self {
            // Vault
            LyfError::ZeroAmount => "Amount must be greater than zero",
            LyfError::InsufficientLiquidity => "Vault: insufficient free liquidity",
            LyfError::InsufficientShares => "Vault: insufficient shares",
            LyfError::InsufficientDebtShares => "Vault: repay exceeds borrower debt shares",
            LyfError::InterestModelMissing => "Vault: no interest model registered",

            // Math
            LyfError::ArithmeticOverflow => "Arithmetic overflow",
            LyfError::ArithmeticUnderflow => "Arithmetic underflow",
            LyfError::DivisionByZero => "Division by zero",
            LyfError::InvalidRange => "Invalid price range",

            // Access control
            LyfError::Unauthorized => "Unauthorized: caller is not whitelisted",
            LyfError::NotAdmin => "Unauthorized: caller is not admin",
            LyfError::NotOwner => "Unauthorized: caller is not position owner",

            // Token
            LyfError::InsufficientTokenBalance => "Insufficient token balance",
            LyfError::InsufficientAllowance => "Insufficient token allowance",

            // Position
            LyfError::PositionNotFound => "Position not found or already closed",
            LyfError::InsufficientReturn => "Executor returned less than the debt owed",
            LyfError::ExceedsCapacity => "Borrow exceeds vault free liquidity",
            LyfError::SameToken => "Position tokens must differ",
            LyfError::VaultNotRegistered => "Vault is not registered for this asset",

            // Oracle
            LyfError::PriceUnavailable => "Price unavailable",
            LyfError::PriceStale => "Price stale",

            // Config
            LyfError::InvalidConfig => "Invalid configuration parameter",
            LyfError::InvalidInterestModel => "Invalid interest model breakpoints",
            LyfError::InterestModelAlreadySet => "Vault already has an interest model",
        }
    }
}

impl core::fmt::Display for LyfError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

impl From<LyfError> for OdraError {
    fn from(error: LyfError) -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            OdraError::user(error as u16)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            OdraError::user(error as u16, error.message())
        }
    }
}

/// Turn a library failure into a contract revert
pub trait OrRevert<T> {
    fn or_revert(self, env: &ContractEnv) -> T;
}

impl<T> OrRevert<T> for LyfResult<T> {
    fn or_revert(self, env: &ContractEnv) -> T {
        match self {
            Ok(value) => value,
            Err(error) => env.revert(error),
        }
    }
}
