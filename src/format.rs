//! Display formatting for amounts, rates and dates (KRW / Korean locale)

use chrono::NaiveDate;

use crate::calculation::round_currency;

const HUNDRED_MILLION: f64 = 100_000_000.0;
const TEN_THOUSAND: f64 = 10_000.0;

/// Full currency form, e.g. `₩1,157,625`
///
/// The won has no minor unit, so amounts are shown rounded to whole won.
pub fn format_currency(amount: f64) -> String {
    let rounded = round_currency(amount);
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}₩{}", group_thousands(rounded.abs()))
}

/// Compact form for chart axes and summaries
///
/// `1.2억원` from 100,000,000 up, `115만원` from 10,000 up, else the full form.
/// Halves round up, as in [`format_currency`].
pub fn format_currency_short(amount: f64) -> String {
    if amount >= HUNDRED_MILLION {
        let tenths = round_currency(amount / (HUNDRED_MILLION / 10.0));
        format!("{:.1}억원", tenths / 10.0)
    } else if amount >= TEN_THOUSAND {
        format!("{:.0}만원", round_currency(amount / TEN_THOUSAND))
    } else {
        format_currency(amount)
    }
}

/// Rate in percent with two decimals, e.g. `5.00%`
pub fn format_rate(rate: f64) -> String {
    format!("{rate:.2}%")
}

/// Term in years, e.g. `3년`, `2.5년`
pub fn format_years(years: f64) -> String {
    format!("{years}년")
}

/// Creation date, e.g. `2024년 3월 15일`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y년 %-m월 %-d일").to_string()
}

fn group_thousands(whole: f64) -> String {
    let digits = format!("{whole:.0}");
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
