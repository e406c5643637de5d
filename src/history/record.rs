//! Saved calculation records and their persisted layout

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::calculation::{compute, DepositTerms, InterestMethod, InterestResult};

/// Opaque record identifier
///
/// New ids are random UUIDs, independent of the creation time. Any string
/// found in a stored snapshot is accepted as an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A computed calculation that has not been stored yet
#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    name: String,
    terms: DepositTerms,
    method: InterestMethod,
    result: InterestResult,
}

impl Calculation {
    /// Run the engine over validated terms
    pub fn new(terms: DepositTerms, method: InterestMethod) -> Self {
        Self {
            name: String::new(),
            terms,
            method,
            result: compute(&terms, method),
        }
    }

    /// Attach a user label (trimmed)
    pub fn with_name(mut self, name: impl AsRef<str>) -> Self {
        self.name = name.as_ref().trim().to_string();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn terms(&self) -> &DepositTerms {
        &self.terms
    }

    pub fn method(&self) -> InterestMethod {
        self.method
    }

    pub fn result(&self) -> &InterestResult {
        &self.result
    }
}

/// A stored calculation
///
/// Serializes to the snapshot layout:
/// `{ id, name, principal, rate, years, type, interest, totalAmount, createdAt }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRecord {
    id: RecordId,
    #[serde(default)]
    name: String,
    principal: f64,
    rate: f64,
    years: f64,
    #[serde(rename = "type")]
    method: InterestMethod,
    interest: f64,
    total_amount: f64,
    created_at: NaiveDate,
}

impl CalculationRecord {
    /// Create a record from a computed calculation
    pub fn new(id: RecordId, calculation: Calculation, created_at: NaiveDate) -> Self {
        let Calculation { name, terms, method, result } = calculation;
        Self {
            id,
            name,
            principal: terms.principal(),
            rate: terms.rate(),
            years: terms.years(),
            method,
            interest: result.interest,
            total_amount: result.total_amount,
            created_at,
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn principal(&self) -> f64 {
        self.principal
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn years(&self) -> f64 {
        self.years
    }

    pub fn method(&self) -> InterestMethod {
        self.method
    }

    pub fn interest(&self) -> f64 {
        self.interest
    }

    pub fn total_amount(&self) -> f64 {
        self.total_amount
    }

    pub fn created_at(&self) -> NaiveDate {
        self.created_at
    }

    /// Input terms of this record, for re-running the engine or refilling a form
    pub fn terms(&self) -> Result<DepositTerms, crate::calculation::ValidationError> {
        DepositTerms::new(self.principal, self.rate, self.years)
    }

    /// Rebuild the unsaved calculation (name included) this record came from
    pub fn to_calculation(&self) -> Result<Calculation, crate::calculation::ValidationError> {
        Ok(Calculation::new(self.terms()?, self.method).with_name(&self.name))
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// Check the data-model invariants of a record read from storage
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.id.as_str().is_empty() {
            return Err("record has an empty id".to_string());
        }
        self.terms()
            .map_err(|err| format!("record {}: {}", self.id, err))?;
        if !self.interest.is_finite() || self.interest < 0.0 {
            return Err(format!("record {}: interest must be non-negative", self.id));
        }
        if !self.total_amount.is_finite() {
            return Err(format!("record {}: totalAmount must be finite", self.id));
        }
        if self.total_amount != self.principal + self.interest {
            return Err(format!(
                "record {}: totalAmount {} != principal {} + interest {}",
                self.id, self.total_amount, self.principal, self.interest
            ));
        }
        Ok(())
    }
}
