//! Calendar arithmetic shared by both reports.

use chrono::{Datelike, NaiveDate};

/// Number of month boundaries crossed going from `start` to `end`.
///
/// Days are ignored: 2023-01-31 to 2023-02-01 is 1, and any two dates in the
/// same calendar month are 0. Negative when `end` precedes `start`.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    (end.year() - start.year()) * 12 + (end.month() as i32 - start.month() as i32)
}

/// Number of year boundaries crossed going from `start` to `end`.
pub fn years_between(start: NaiveDate, end: NaiveDate) -> i32 {
    end.year() - start.year()
}

/// Round half away from zero to `places` decimal places.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}
