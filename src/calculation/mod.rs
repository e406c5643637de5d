//! Deposit calculation: input validation, interest engine and growth series

mod validation;
mod engine;
mod series;

pub use validation::{
    parse_terms, validate, DepositTerms, Field, ValidationError, MAX_RATE_PERCENT, MAX_TERM_YEARS,
};
pub use engine::{
    compound_factor, compute, round_currency, InterestMethod, InterestResult, ParseMethodError,
};
pub use series::{last_period, series, GrowthSeries, SeriesPoint};
