//! CSV export of growth series and history views

use serde::Serialize;
use std::io::Write;

use crate::calculation::SeriesPoint;
use crate::history::CalculationRecord;

/// One history row in export order
#[derive(Debug, Serialize)]
struct HistoryCsvRow<'a> {
    #[serde(rename = "Id")]
    id: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Type")]
    method: &'static str,
    #[serde(rename = "Principal")]
    principal: f64,
    #[serde(rename = "Rate")]
    rate: f64,
    #[serde(rename = "Years")]
    years: f64,
    #[serde(rename = "Interest")]
    interest: f64,
    #[serde(rename = "TotalAmount")]
    total_amount: f64,
    #[serde(rename = "CreatedAt")]
    created_at: String,
}

impl<'a> From<&'a CalculationRecord> for HistoryCsvRow<'a> {
    fn from(record: &'a CalculationRecord) -> Self {
        Self {
            id: record.id().as_str(),
            name: record.name(),
            method: record.method().as_str(),
            principal: record.principal(),
            rate: record.rate(),
            years: record.years(),
            interest: record.interest(),
            total_amount: record.total_amount(),
            created_at: record.created_at().format("%Y-%m-%d").to_string(),
        }
    }
}

/// Write a growth series as `Period,Amount,Interest` rows
pub fn write_series_csv<W, I>(writer: W, points: I) -> Result<(), csv::Error>
where
    W: Write,
    I: IntoIterator<Item = SeriesPoint>,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["Period", "Amount", "Interest"])?;
    for point in points {
        csv_writer.write_record([
            point.period.to_string(),
            point.amount.to_string(),
            point.interest.to_string(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write history records in the given (already projected) order
pub fn write_history_csv<'a, W, I>(writer: W, records: I) -> Result<(), csv::Error>
where
    W: Write,
    I: IntoIterator<Item = &'a CalculationRecord>,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut wrote_any = false;
    for record in records {
        csv_writer.serialize(HistoryCsvRow::from(record))?;
        wrote_any = true;
    }
    if !wrote_any {
        csv_writer.write_record([
            "Id", "Name", "Type", "Principal", "Rate", "Years", "Interest", "TotalAmount", "CreatedAt",
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::{series, DepositTerms, InterestMethod};
    use crate::history::{project, Calculation, HistoryStore, MemoryStorage, MethodFilter, SortKey};
    use chrono::NaiveDate;

    #[test]
    fn test_series_csv() {
        let terms = DepositTerms::new(1_000_000.0, 5.0, 2.0).unwrap();
        let mut out = Vec::new();
        write_series_csv(&mut out, series(&terms, InterestMethod::Simple)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Period,Amount,Interest\n0,1000000,0\n1,1050000,50000\n2,1100000,100000\n"
        );
    }

    #[test]
    fn test_history_csv_follows_view_order() {
        let mut store = HistoryStore::open(MemoryStorage::new());
        let day = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let small = Calculation::new(DepositTerms::new(100.0, 10.0, 1.0).unwrap(), InterestMethod::Simple)
            .with_name("small");
        let large = Calculation::new(DepositTerms::new(900.0, 10.0, 1.0).unwrap(), InterestMethod::Compound)
            .with_name("large, with comma");
        store.add_dated(large, day).unwrap();
        store.add_dated(small, day).unwrap();

        let view = project(store.all(), MethodFilter::All, SortKey::TotalAmount);
        let mut out = Vec::new();
        write_history_csv(&mut out, view).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Id,Name,Type,Principal,Rate,Years,Interest,TotalAmount,CreatedAt");
        assert!(lines[1].contains("\"large, with comma\",compound,900.0,10.0,1.0,90.0,990.0,2024-07-01"));
        assert!(lines[2].contains("small,simple,100.0,10.0,1.0,10.0,110.0,2024-07-01"));
    }

    #[test]
    fn test_empty_history_csv_has_header() {
        let mut out = Vec::new();
        write_history_csv(&mut out, std::iter::empty()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Id,Name,Type,Principal,Rate,Years,Interest,TotalAmount,CreatedAt\n"
        );
    }
}
