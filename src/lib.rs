//! Deposit Calculator - simple and compound interest with a saved calculation history
//!
//! This library provides:
//! - Input validation for principal, rate and term
//! - Simple/compound interest calculation and year-by-year growth series
//! - A persisted, editable calculation history over pluggable storage
//! - Filtered and sorted history views, CSV export and KRW formatting

pub mod calculation;
pub mod history;
pub mod config;
pub mod export;
pub mod format;

// Re-export commonly used types
pub use calculation::{
    compute, parse_terms, series, validate, DepositTerms, GrowthSeries, InterestMethod,
    InterestResult, SeriesPoint, ValidationError,
};
pub use history::{
    project, Calculation, CalculationRecord, HistoryError, HistoryStore, MethodFilter,
    PersistenceError, RecordId, SortKey, StorageBackend,
};
pub use config::CalculatorConfig;
