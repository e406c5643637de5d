//! Filtered and sorted views over saved calculations
//!
//! Projections borrow from the stored slice and never reorder storage.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::record::CalculationRecord;
use crate::calculation::InterestMethod;

/// Which interest methods to include
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MethodFilter {
    #[default]
    All,
    Only(InterestMethod),
}

impl MethodFilter {
    pub fn matches(&self, record: &CalculationRecord) -> bool {
        match self {
            MethodFilter::All => true,
            MethodFilter::Only(method) => record.method() == *method,
        }
    }
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodFilter::All => f.write_str("all"),
            MethodFilter::Only(method) => write!(f, "{method}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown filter `{0}` (expected all, simple or compound)")]
pub struct ParseFilterError(pub String);

impl FromStr for MethodFilter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        if value == "all" {
            return Ok(MethodFilter::All);
        }
        value
            .parse::<InterestMethod>()
            .map(MethodFilter::Only)
            .map_err(|_| ParseFilterError(value))
    }
}

/// Sort order for the history view; every key sorts largest/newest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    CreatedAt,
    Years,
    Rate,
    TotalAmount,
}

impl SortKey {
    fn compare(&self, a: &CalculationRecord, b: &CalculationRecord) -> Ordering {
        match self {
            SortKey::CreatedAt => b.created_at().cmp(&a.created_at()),
            SortKey::Years => b.years().total_cmp(&a.years()),
            SortKey::Rate => b.rate().total_cmp(&a.rate()),
            SortKey::TotalAmount => b.total_amount().total_cmp(&a.total_amount()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::CreatedAt => "date",
            SortKey::Years => "years",
            SortKey::Rate => "rate",
            SortKey::TotalAmount => "amount",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort key `{0}` (expected date, years, rate or amount)")]
pub struct ParseSortError(pub String);

impl FromStr for SortKey {
    type Err = ParseSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(SortKey::CreatedAt),
            "years" => Ok(SortKey::Years),
            "rate" => Ok(SortKey::Rate),
            "amount" => Ok(SortKey::TotalAmount),
            other => Err(ParseSortError(other.to_string())),
        }
    }
}

/// Filter then stable-sort records for display
///
/// Records with equal keys keep their storage order.
pub fn project<'a>(
    records: &'a [CalculationRecord],
    filter: MethodFilter,
    sort: SortKey,
) -> Vec<&'a CalculationRecord> {
    let mut view: Vec<&CalculationRecord> = records
        .iter()
        .filter(|record| filter.matches(record))
        .collect();
    view.sort_by(|a, b| sort.compare(a, b));
    view
}
