//! Calendar dates as they appear on the wire and in the observation store.
//!
//! Both sides use zero-padded `YYYY-MM-DD`. Dates are always carried as
//! [`time::Date`] inside the crate and only turned back into text when they
//! leave it, so text comparison in the store stays chronological.

use time::{macros::format_description, Date};

time::serde::format_description!(pub iso_date, Date, "[year]-[month]-[day]");

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<Date, time::error::Parse> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(value, &format)
}

/// Format a date as zero-padded `YYYY-MM-DD`.
pub fn format_date(date: Date) -> Result<String, time::error::Format> {
    let format = format_description!("[year]-[month]-[day]");
    date.format(&format)
}
