//! Input validation for deposit terms
//!
//! Raw inputs arrive as text from the presentation layer. Checks run in a
//! fixed order and stop at the first violation:
//! blank fields, then non-numeric fields, then principal, rate and years ranges.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::engine::compound_factor;

/// Upper bound for the interest rate, in percent
pub const MAX_RATE_PERCENT: f64 = 100.0;

/// Longest accepted term, in years; bounds the growth series length
pub const MAX_TERM_YEARS: f64 = 10_000.0;

/// Input field identifier used in validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    Principal,
    Rate,
    Years,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Principal => "principal",
            Field::Rate => "rate",
            Field::Years => "years",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a set of deposit inputs was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(Field),

    #[error("{0} must be a number")]
    NotANumber(Field),

    #[error("{field} out of range: {hint}", field = .0, hint = range_hint(.0))]
    OutOfRange(Field),

    /// Every field is in range but the maturity amount is not representable
    #[error("resulting amount is too large to calculate")]
    AmountTooLarge,
}

impl ValidationError {
    /// The field that failed validation, if a single field is at fault
    pub fn field(&self) -> Option<Field> {
        match self {
            ValidationError::MissingField(field)
            | ValidationError::NotANumber(field)
            | ValidationError::OutOfRange(field) => Some(*field),
            ValidationError::AmountTooLarge => None,
        }
    }
}

fn range_hint(field: &Field) -> &'static str {
    match field {
        Field::Principal => "must be greater than 0",
        Field::Rate => "must be greater than 0 and at most 100",
        Field::Years => "must be greater than 0 and at most 10000",
    }
}

/// Validated deposit terms
///
/// Holding a `DepositTerms` guarantees `principal > 0`, `0 < rate <= 100`
/// and `0 < years <= MAX_TERM_YEARS`, all finite, and that both interest
/// methods stay finite through the last whole period of the term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DepositTerms {
    principal: f64,
    rate: f64,
    years: f64,
}

impl DepositTerms {
    /// Build terms from numeric input, applying the range checks
    pub fn new(principal: f64, rate: f64, years: f64) -> Result<Self, ValidationError> {
        for (field, value) in [
            (Field::Principal, principal),
            (Field::Rate, rate),
            (Field::Years, years),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::NotANumber(field));
            }
        }

        if principal <= 0.0 {
            return Err(ValidationError::OutOfRange(Field::Principal));
        }
        if rate <= 0.0 || rate > MAX_RATE_PERCENT {
            return Err(ValidationError::OutOfRange(Field::Rate));
        }
        if years <= 0.0 || years > MAX_TERM_YEARS {
            return Err(ValidationError::OutOfRange(Field::Years));
        }

        // The growth series runs to ceil(years), past the nominal term
        let horizon = years.ceil();
        let rate_fraction = rate / 100.0;
        let simple_end = principal + principal * rate_fraction * horizon;
        let compound_end = principal * compound_factor(rate_fraction, horizon);
        if !simple_end.is_finite() || !compound_end.is_finite() {
            return Err(ValidationError::AmountTooLarge);
        }

        Ok(Self { principal, rate, years })
    }

    pub fn principal(&self) -> f64 {
        self.principal
    }

    /// Rate in percent per period
    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn years(&self) -> f64 {
        self.years
    }

    /// Rate as a fraction (5% -> 0.05)
    pub fn rate_fraction(&self) -> f64 {
        self.rate / 100.0
    }
}

/// Check raw text inputs without keeping the parsed values
pub fn validate(principal: &str, rate: &str, years: &str) -> Result<(), ValidationError> {
    parse_terms(principal, rate, years).map(|_| ())
}

/// Parse and validate raw text inputs into `DepositTerms`
pub fn parse_terms(principal: &str, rate: &str, years: &str) -> Result<DepositTerms, ValidationError> {
    let raw = [
        (Field::Principal, principal.trim()),
        (Field::Rate, rate.trim()),
        (Field::Years, years.trim()),
    ];

    if let Some((field, _)) = raw.iter().find(|(_, text)| text.is_empty()) {
        return Err(ValidationError::MissingField(*field));
    }

    let mut values = [0.0_f64; 3];
    for (slot, (field, text)) in values.iter_mut().zip(raw.iter()) {
        *slot = parse_number(text).ok_or(ValidationError::NotANumber(*field))?;
    }

    DepositTerms::new(values[0], values[1], values[2])
}

/// Parse a finite number, accepting thousands separators ("1,000,000")
fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|c| *c != ',' && *c != '_').collect();
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}
