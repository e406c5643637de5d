//! Interest engine for simple and compound deposits

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::validation::DepositTerms;

/// How interest accrues over the term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterestMethod {
    /// Interest on the principal only
    Simple,
    /// Interest on principal plus accumulated interest, once per period
    Compound,
}

impl InterestMethod {
    /// Wire/storage name ("simple" / "compound")
    pub fn as_str(&self) -> &'static str {
        match self {
            InterestMethod::Simple => "simple",
            InterestMethod::Compound => "compound",
        }
    }

    /// Display label used next to history entries
    pub fn label(&self) -> &'static str {
        match self {
            InterestMethod::Simple => "단리",
            InterestMethod::Compound => "복리",
        }
    }
}

impl fmt::Display for InterestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown interest method `{0}` (expected simple or compound)")]
pub struct ParseMethodError(pub String);

impl FromStr for InterestMethod {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(InterestMethod::Simple),
            "compound" => Ok(InterestMethod::Compound),
            other => Err(ParseMethodError(other.to_string())),
        }
    }
}

/// Outcome of a single interest calculation
///
/// `total_amount` is always computed as `principal + interest`, so the
/// identity holds exactly for the stored values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterestResult {
    pub interest: f64,
    pub total_amount: f64,
}

/// Round to whole currency units, ties toward positive infinity.
///
/// 2.5 -> 3, -2.5 -> -2. All engine outputs go through this function so the
/// tie-break stays consistent if signed amounts are ever introduced.
pub fn round_currency(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

/// Growth factor `(1 + r)^t` using a real power so fractional terms work
pub fn compound_factor(rate_fraction: f64, periods: f64) -> f64 {
    (1.0 + rate_fraction).powf(periods)
}

/// Compute interest and maturity amount for validated terms
pub fn compute(terms: &DepositTerms, method: InterestMethod) -> InterestResult {
    let principal = terms.principal();

    let interest = match method {
        InterestMethod::Simple => {
            round_currency(principal * terms.rate_fraction() * terms.years())
        }
        InterestMethod::Compound => {
            let maturity = round_currency(
                principal * compound_factor(terms.rate_fraction(), terms.years()),
            );
            // A fractional principal can round below itself
            (maturity - principal).max(0.0)
        }
    };

    // For a fractional principal the compound total may sit one ulp away
    // from the rounded maturity; total == principal + interest takes priority.
    InterestResult {
        interest,
        total_amount: principal + interest,
    }
}
