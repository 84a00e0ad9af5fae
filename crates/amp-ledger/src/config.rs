//! Ledger configuration from environment variables.

use crate::domain::value_objects::Address;
use std::env;
use thiserror::Error;

/// Default ledger account, used as directory key for the ledger's own
/// interfaces and strategy validators.
pub const DEFAULT_TOKEN_ADDRESS: Address = Address([
    0xff, 0x20, 0x81, 0x77, 0x65, 0x8d, 0x5c, 0x3e, 0x3c, 0x50, 0x7c, 0x9a, 0x8e, 0x8f, 0x40,
    0x5b, 0x41, 0x8c, 0xaa, 0x01,
]);

/// Smallest transferable unit. Every amount is a multiple of it.
pub const GRANULARITY: u64 = 1;

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },

    /// A field failed validation.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Token metadata and identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmpConfig {
    /// Token name
    pub name: String,

    /// Token symbol
    pub symbol: String,

    /// ERC-20 decimals
    pub decimals: u8,

    /// The ledger's own account
    pub token_address: Address,
}

impl Default for AmpConfig {
    fn default() -> Self {
        Self {
            name: "Amp".to_string(),
            symbol: "AMP".to_string(),
            decimals: 18,
            token_address: DEFAULT_TOKEN_ADDRESS,
        }
    }
}

impl AmpConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `AMP_TOKEN_NAME`: Token name (default: Amp)
    /// - `AMP_TOKEN_SYMBOL`: Token symbol (default: AMP)
    /// - `AMP_DECIMALS`: Decimals (default: 18)
    /// - `AMP_TOKEN_ADDRESS`: Hex account of the ledger
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let decimals = match env::var("AMP_DECIMALS") {
            Ok(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                var: "AMP_DECIMALS",
                value,
            })?,
            Err(_) => defaults.decimals,
        };

        let token_address = match env::var("AMP_TOKEN_ADDRESS") {
            Ok(value) => Address::from_hex(&value).ok_or(ConfigError::InvalidValue {
                var: "AMP_TOKEN_ADDRESS",
                value,
            })?,
            Err(_) => defaults.token_address,
        };

        let config = Self {
            name: env::var("AMP_TOKEN_NAME").unwrap_or(defaults.name),
            symbol: env::var("AMP_TOKEN_SYMBOL").unwrap_or(defaults.symbol),
            decimals,
            token_address,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("token name is empty".to_string()));
        }
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("token symbol is empty".to_string()));
        }
        if self.token_address.is_zero() {
            return Err(ConfigError::Invalid(
                "token address must not be the null address".to_string(),
            ));
        }
        Ok(())
    }
}
