//! # Business Rules Module
//!
//! Static policy consulted by parsing and validation: product-name length
//! bound, price bounds, rounding increment and currency symbol. Loaded once
//! at startup and never mutated at runtime.

use crate::amount::Amount;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;

// Defaults for the fixed Portuguese/EUR locale
pub const DEFAULT_MAX_PRODUCT_NAME_LENGTH: usize = 100;
pub const DEFAULT_MIN_PRICE_CENTS: i64 = 1;
pub const DEFAULT_MAX_PRICE_CENTS: i64 = 999_999; // 9.999,99 €
pub const DEFAULT_CURRENCY_SYMBOL: &str = "€";
pub const DEFAULT_ROUNDING_INCREMENT_CENTS: i64 = 1;

/// Read-only pricing and naming policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessRules {
    /// Maximum accepted product name length in characters
    pub max_product_name_length: usize,
    /// Lowest accepted price (inclusive)
    pub min_price: Amount,
    /// Highest accepted price (inclusive)
    pub max_price: Amount,
    /// Currency symbol used for display
    pub currency_symbol: String,
    /// Increment prices are suggested to round to
    pub rounding_increment: Amount,
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            max_product_name_length: DEFAULT_MAX_PRODUCT_NAME_LENGTH,
            min_price: Amount::from_cents(DEFAULT_MIN_PRICE_CENTS),
            max_price: Amount::from_cents(DEFAULT_MAX_PRICE_CENTS),
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            rounding_increment: Amount::from_cents(DEFAULT_ROUNDING_INCREMENT_CENTS),
        }
    }
}

impl BusinessRules {
    /// Load rules from environment variables, falling back to defaults.
    pub fn from_env() -> AppResult<Self> {
        let mut rules = Self::default();

        if let Ok(value) = env::var("MAX_PRODUCT_NAME_LENGTH") {
            rules.max_product_name_length = value.parse().map_err(|_| {
                AppError::Config("MAX_PRODUCT_NAME_LENGTH must be a valid number".to_string())
            })?;
        }
        if let Ok(value) = env::var("MIN_PRICE_CENTS") {
            rules.min_price = Amount::from_cents(value.parse().map_err(|_| {
                AppError::Config("MIN_PRICE_CENTS must be a valid number".to_string())
            })?);
        }
        if let Ok(value) = env::var("MAX_PRICE_CENTS") {
            rules.max_price = Amount::from_cents(value.parse().map_err(|_| {
                AppError::Config("MAX_PRICE_CENTS must be a valid number".to_string())
            })?);
        }
        if let Ok(value) = env::var("ROUNDING_INCREMENT_CENTS") {
            rules.rounding_increment = Amount::from_cents(value.parse().map_err(|_| {
                AppError::Config("ROUNDING_INCREMENT_CENTS must be a valid number".to_string())
            })?);
        }

        rules.validate()?;
        Ok(rules)
    }

    /// Validate rule consistency
    pub fn validate(&self) -> AppResult<()> {
        if self.max_product_name_length == 0 {
            return Err(AppError::Config(
                "max_product_name_length must be greater than 0".to_string(),
            ));
        }
        if self.min_price.cents() <= 0 {
            return Err(AppError::Config(
                "min_price must be greater than 0".to_string(),
            ));
        }
        if self.max_price < self.min_price {
            return Err(AppError::Config(format!(
                "max_price ({}) must be >= min_price ({})",
                self.max_price, self.min_price
            )));
        }
        if self.currency_symbol.trim().is_empty() {
            return Err(AppError::Config(
                "currency_symbol cannot be empty".to_string(),
            ));
        }
        if self.rounding_increment.cents() <= 0 {
            return Err(AppError::Config(
                "rounding_increment must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
