//! Recency window for search results.
//!
//! Article age is measured in whole calendar months from the year and month
//! components only, so 2024-01-31 is two months old on 2024-03-01 and on
//! 2024-03-31 alike.

use chrono::{Datelike, NaiveDate};

/// Calendar months between `date` and `today`, ignoring the day of month.
///
/// Negative when `date` lies in a later month than `today`.
pub fn months_between(today: NaiveDate, date: NaiveDate) -> i64 {
    let years = i64::from(today.year()) - i64::from(date.year());
    let months = i64::from(today.month()) - i64::from(date.month());
    years * 12 + months
}

/// Whether an article published on `date` is inside a window of `months` months.
///
/// A window of 0 is treated as 1, i.e. the current month only.
pub fn is_within_window(today: NaiveDate, date: NaiveDate, months: u32) -> bool {
    months_between(today, date) < i64::from(months.max(1))
}
