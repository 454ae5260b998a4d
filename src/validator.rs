//! # Product Validator Module
//!
//! Composes the text normalizer and the price parser with the business
//! rules to turn a candidate (name, price, source) into a
//! [`ValidationResult`]. Errors block acceptance; warnings and suggestions
//! are advisory and never affect validity. The validator is pure and
//! stateless — safe to call concurrently from any number of sessions.

use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::amount::Amount;
use crate::business_rules::BusinessRules;
use crate::errors::AppResult;
use crate::localization::{t_args_or, t_or};
use crate::price_parser::{self, NamePriceCandidate};
use crate::product::{CaptureMethod, CapturedProduct};
use crate::text_normalizer::normalized_name;

/// Why a product name was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NameReason {
    Empty,
    TooLong,
}

/// Why a price was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PriceReason {
    Unparseable,
    OutOfBounds,
}

/// A blocking data-quality failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationError {
    InvalidProductName(NameReason),
    InvalidPrice(PriceReason),
}

impl ValidationError {
    /// Localization key for the failure message
    pub fn message_key(&self) -> &'static str {
        match self {
            ValidationError::InvalidProductName(NameReason::Empty) => "name-empty",
            ValidationError::InvalidProductName(NameReason::TooLong) => "name-too-long",
            ValidationError::InvalidPrice(PriceReason::Unparseable) => "price-unparseable",
            ValidationError::InvalidPrice(PriceReason::OutOfBounds) => "price-out-of-bounds",
        }
    }

    fn fallback_message(&self) -> &'static str {
        match self {
            ValidationError::InvalidProductName(NameReason::Empty) => {
                "O nome do produto está vazio."
            }
            ValidationError::InvalidProductName(NameReason::TooLong) => {
                "O nome do produto é demasiado longo."
            }
            ValidationError::InvalidPrice(PriceReason::Unparseable) => {
                "Não foi possível ler o preço."
            }
            ValidationError::InvalidPrice(PriceReason::OutOfBounds) => {
                "O preço está fora dos limites permitidos."
            }
        }
    }

    /// Localized message for display
    pub fn message(&self) -> String {
        t_or(self.message_key(), self.fallback_message())
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fallback_message())
    }
}

/// A non-blocking improvement the caller may offer to the user.
///
/// The core never applies a suggestion on its own; acceptance is always an
/// explicit caller action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Suggestion {
    /// Cleanup changed the name; the normalized form is offered back
    NormalizedName(String),
    /// The price does not sit on the rounding increment
    RoundedPrice(Amount),
}

impl Suggestion {
    /// Localized prompt for display
    pub fn message(&self) -> String {
        match self {
            Suggestion::NormalizedName(name) => t_args_or(
                "suggestion-normalized-name",
                &[("name", name.clone())],
                &format!("Usar o nome \"{}\"?", name),
            ),
            Suggestion::RoundedPrice(price) => t_args_or(
                "suggestion-rounded-price",
                &[("price", price.to_string())],
                &format!("Arredondar para {}?", price),
            ),
        }
    }
}

/// The outcome of validating a candidate product.
///
/// Validity is structural: the result is valid exactly when `errors` is
/// empty. Warnings and suggestions never participate in that decision.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct ValidationResult {
    /// Blocking failures, name errors ordered before price errors
    pub errors: Vec<ValidationError>,
    /// Advisory notices, e.g. the scanner verification hint
    pub warnings: Vec<String>,
    /// Offered improvements, never auto-applied
    pub suggestions: Vec<Suggestion>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn merge(mut self, other: ValidationResult) -> ValidationResult {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.suggestions.extend(other.suggestions);
        self
    }
}

/// Validates candidate products against the business rules.
#[derive(Debug, Clone)]
pub struct ProductValidator {
    rules: BusinessRules,
}

impl Default for ProductValidator {
    fn default() -> Self {
        Self { rules: BusinessRules::default() }
    }
}

impl ProductValidator {
    /// Create a validator over the given rules.
    pub fn new(rules: BusinessRules) -> AppResult<Self> {
        rules.validate()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &BusinessRules {
        &self.rules
    }

    /// Validate a raw product name.
    ///
    /// The name is normalized first; emptiness and length are judged on the
    /// normalized form so that noise characters alone never pass. When
    /// cleanup materially changed the text, the normalized form comes back
    /// as a suggestion for the caller to offer — it is not applied here.
    pub fn validate_name(&self, raw_name: &str) -> ValidationResult {
        let mut result = ValidationResult::default();
        let normalized = normalized_name(raw_name);

        if normalized.is_empty() {
            result.errors.push(ValidationError::InvalidProductName(NameReason::Empty));
            return result;
        }
        if normalized.chars().count() > self.rules.max_product_name_length {
            result.errors.push(ValidationError::InvalidProductName(NameReason::TooLong));
            return result;
        }

        if normalized != raw_name.trim() {
            result.suggestions.push(Suggestion::NormalizedName(normalized));
        }
        result
    }

    /// Validate a price against the rule bounds.
    ///
    /// Bounds are inclusive on both ends. The source method only adds
    /// advisory warning text — it never changes pass/fail.
    pub fn validate_price(&self, price: Option<Amount>, method: CaptureMethod) -> ValidationResult {
        let mut result = ValidationResult::default();

        let price = match price {
            Some(price) => price,
            None => {
                result.errors.push(ValidationError::InvalidPrice(PriceReason::Unparseable));
                return result;
            }
        };

        if price < self.rules.min_price || price > self.rules.max_price {
            result.errors.push(ValidationError::InvalidPrice(PriceReason::OutOfBounds));
            return result;
        }

        let rounded = price.rounded_to_increment(self.rules.rounding_increment);
        if rounded != price {
            result.suggestions.push(Suggestion::RoundedPrice(rounded));
        }

        if method == CaptureMethod::Scanner {
            result.warnings.push(t_or(
                "warning-scanner-price",
                "Preço lido pela câmara — confirme o valor antes de adicionar.",
            ));
        }

        result
    }

    /// Validate a full candidate. Name errors come before price errors;
    /// the result is valid exactly when no errors were produced.
    pub fn validate(
        &self,
        raw_name: &str,
        price: Option<Amount>,
        method: CaptureMethod,
    ) -> ValidationResult {
        let result = self
            .validate_name(raw_name)
            .merge(self.validate_price(price, method));

        debug!(
            valid = result.is_valid(),
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            method = ?method,
            "Validated product candidate"
        );
        crate::observability::record_validation_metrics(result.is_valid(), result.errors.len());
        result
    }

    /// Validate a parsed utterance, surfacing price ambiguity as a warning.
    pub fn validate_candidate(
        &self,
        candidate: &NamePriceCandidate,
        method: CaptureMethod,
    ) -> ValidationResult {
        let mut result = self.validate(&candidate.name, candidate.price, method);
        if candidate.price_ambiguous {
            result.warnings.push(t_or(
                "warning-price-ambiguous",
                "Foram encontrados vários números no texto; confirme o preço escolhido.",
            ));
        }
        result
    }

    /// The only construction path for [`CapturedProduct`]: validate, and on
    /// success hand over the normalized record. On failure the full
    /// [`ValidationResult`] comes back so nothing the user entered is lost.
    pub fn accept(
        &self,
        raw_name: &str,
        price: Option<Amount>,
        method: CaptureMethod,
    ) -> Result<CapturedProduct, ValidationResult> {
        let result = self.validate(raw_name, price, method);
        if !result.is_valid() {
            return Err(result);
        }
        let price = price.expect("valid result implies a present price");
        Ok(CapturedProduct::new(normalized_name(raw_name), price, method))
    }

    /// Round `price` to the configured increment for suggestion material.
    pub fn rounded_to_increment(&self, price: Amount) -> Amount {
        price_parser::rounded_to_increment(price, &self.rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> ProductValidator {
        ProductValidator::default()
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let result = validator().validate("", Some(Amount::from_cents(129)), CaptureMethod::Manual);
        assert!(!result.is_valid());
        assert_eq!(
            result.errors,
            vec![ValidationError::InvalidProductName(NameReason::Empty)]
        );
    }

    #[test]
    fn test_noise_only_name_is_rejected() {
        let result = validator().validate("***", Some(Amount::from_cents(129)), CaptureMethod::Manual);
        assert_eq!(
            result.errors,
            vec![ValidationError::InvalidProductName(NameReason::Empty)]
        );
    }

    #[test]
    fn test_overlong_name_is_rejected() {
        let long_name = "a".repeat(101);
        let result =
            validator().validate(&long_name, Some(Amount::from_cents(129)), CaptureMethod::Manual);
        assert_eq!(
            result.errors,
            vec![ValidationError::InvalidProductName(NameReason::TooLong)]
        );
    }

    #[test]
    fn test_valid_product_passes() {
        let result = validator().validate(
            "Leite Mimosa",
            Some(Amount::from_cents(15_000)),
            CaptureMethod::Manual,
        );
        assert!(result.is_valid());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_negative_price_is_out_of_bounds() {
        let result =
            validator().validate("Leite", Some(Amount::from_cents(-100)), CaptureMethod::Manual);
        assert!(!result.is_valid());
        assert!(result
            .errors
            .contains(&ValidationError::InvalidPrice(PriceReason::OutOfBounds)));
    }

    #[test]
    fn test_missing_price_is_unparseable() {
        let result = validator().validate("Leite", None, CaptureMethod::Manual);
        assert_eq!(
            result.errors,
            vec![ValidationError::InvalidPrice(PriceReason::Unparseable)]
        );
    }

    #[test]
    fn test_name_errors_come_before_price_errors() {
        let result = validator().validate("", None, CaptureMethod::Manual);
        assert_eq!(
            result.errors,
            vec![
                ValidationError::InvalidProductName(NameReason::Empty),
                ValidationError::InvalidPrice(PriceReason::Unparseable),
            ]
        );
    }

    #[test]
    fn test_scanner_price_adds_warning_not_error() {
        let result =
            validator().validate("Leite", Some(Amount::from_cents(129)), CaptureMethod::Scanner);
        assert!(result.is_valid());
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn test_name_cleanup_produces_suggestion() {
        let result =
            validator().validate("LEITE  MIMOSA", Some(Amount::from_cents(129)), CaptureMethod::Manual);
        assert!(result.is_valid());
        assert!(result
            .suggestions
            .iter()
            .any(|s| matches!(s, Suggestion::NormalizedName(name) if name == "Leite Mimosa")));
    }

    #[test]
    fn test_rounding_suggestion_with_coarse_increment() {
        let mut rules = BusinessRules::default();
        rules.rounding_increment = Amount::from_cents(5);
        let validator = ProductValidator::new(rules).expect("rules are valid");

        let result =
            validator.validate("Leite", Some(Amount::from_cents(129)), CaptureMethod::Manual);
        assert!(result.is_valid());
        assert!(result
            .suggestions
            .iter()
            .any(|s| matches!(s, Suggestion::RoundedPrice(p) if p.cents() == 130)));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let rules = BusinessRules::default();
        let min = rules.min_price;
        let max = rules.max_price;
        let validator = ProductValidator::new(rules).expect("rules are valid");

        assert!(validator.validate("Leite", Some(min), CaptureMethod::Manual).is_valid());
        assert!(validator.validate("Leite", Some(max), CaptureMethod::Manual).is_valid());
    }

    #[test]
    fn test_accept_yields_normalized_product() {
        let product = validator()
            .accept("leite mimosa", Some(Amount::from_cents(129)), CaptureMethod::Manual)
            .expect("candidate is valid");
        assert_eq!(product.name(), "Leite Mimosa");
        assert_eq!(product.price(), Amount::from_cents(129));
        assert_eq!(product.source(), CaptureMethod::Manual);
    }

    #[test]
    fn test_accept_returns_result_on_failure() {
        let result = validator()
            .accept("", Some(Amount::from_cents(129)), CaptureMethod::Manual)
            .expect_err("empty name is invalid");
        assert!(!result.is_valid());
    }
}
