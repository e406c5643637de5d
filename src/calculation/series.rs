//! Year-by-year growth series for charting
//!
//! One point per whole period from 0 through `ceil(years)`. A fractional
//! term such as 2.5 years yields periods 0..=3, the last point being
//! extrapolated past the nominal end so the curve reaches a whole period.

use serde::{Deserialize, Serialize};

use super::engine::{compound_factor, round_currency, InterestMethod};
use super::validation::{DepositTerms, MAX_TERM_YEARS};

/// A single point of the growth curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Whole period index (0 = deposit date)
    pub period: u32,
    /// Balance at the end of the period, rounded to currency units
    pub amount: f64,
    /// Accumulated interest at the end of the period
    pub interest: f64,
}

/// Lazy growth series over a deposit term
///
/// Carries only its inputs and a cursor. A clone continues from the same
/// cursor; calling [`series`] again regenerates the identical sequence.
#[derive(Debug, Clone)]
pub struct GrowthSeries {
    principal: f64,
    rate_fraction: f64,
    method: InterestMethod,
    next_period: u32,
    last_period: u32,
}

/// Build the growth series for validated terms
pub fn series(terms: &DepositTerms, method: InterestMethod) -> GrowthSeries {
    GrowthSeries {
        principal: terms.principal(),
        rate_fraction: terms.rate_fraction(),
        method,
        next_period: 0,
        last_period: last_period(terms.years()),
    }
}

/// Last whole period covered by a term of `years`
///
/// Validated terms never exceed `MAX_TERM_YEARS`, far below `u32::MAX`.
pub fn last_period(years: f64) -> u32 {
    years.ceil().clamp(0.0, MAX_TERM_YEARS) as u32
}

impl GrowthSeries {
    fn point(&self, period: u32) -> SeriesPoint {
        if period == 0 {
            return SeriesPoint {
                period,
                amount: self.principal,
                interest: 0.0,
            };
        }

        let t = period as f64;
        let amount = match self.method {
            InterestMethod::Simple => self.principal + self.principal * self.rate_fraction * t,
            InterestMethod::Compound => self.principal * compound_factor(self.rate_fraction, t),
        };

        SeriesPoint {
            period,
            amount: round_currency(amount),
            interest: round_currency(amount - self.principal),
        }
    }
}

impl Iterator for GrowthSeries {
    type Item = SeriesPoint;

    fn next(&mut self) -> Option<SeriesPoint> {
        if self.next_period > self.last_period {
            return None;
        }
        let point = self.point(self.next_period);
        self.next_period += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.last_period as usize + 1).saturating_sub(self.next_period as usize);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for GrowthSeries {}

impl std::iter::FusedIterator for GrowthSeries {}
