//! Effective `On_date` resolution.
//!
//! An explicit date is forwarded untouched, blank or not; calendar
//! correctness is the upstream's business unless strict validation is
//! switched on. Only a missing date falls back to today's date in
//! `yyyy-MM-dd`.

use chrono::{Local, NaiveDate};

/// Canonical wire format of the `On_date` parameter.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Source of "today".
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock in the host's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock frozen on one day.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Resolve the date to query.
///
/// Any present value, even an empty one, is forwarded as given.
pub fn resolve(input: Option<&str>, clock: &dyn Clock) -> String {
    match input {
        Some(date) => date.to_string(),
        None => clock.today().format(DATE_FORMAT).to_string(),
    }
}

/// Check that `date` is a real calendar date in `yyyy-MM-dd` form.
///
/// chrono accepts signed years and single-digit fields, so the parsed
/// date must also format back to the same text.
pub fn is_canonical(date: &str) -> bool {
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map(|parsed| parsed.format(DATE_FORMAT).to_string() == date)
        .unwrap_or(false)
}
