use time::{Date, Duration};

use crate::{Observation, QueryError};

/// Fixed calendar-day length of the trailing window, independent of leap years
pub const TRAILING_WINDOW_DAYS: i64 = 365;

/// Inclusive date range `start..=end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: Date,
    pub end: Date,
}

impl DateWindow {
    /// Window of [`TRAILING_WINDOW_DAYS`] days ending on `end`
    pub fn trailing(end: Date) -> Self {
        Self {
            start: end.saturating_sub(Duration::days(TRAILING_WINDOW_DAYS)),
            end,
        }
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Anchors a trailing window on the latest observation date.
pub fn resolve_trailing_window(observations: &[Observation]) -> Result<DateWindow, QueryError> {
    let end = observations
        .iter()
        .map(|observation| observation.date)
        .max()
        .ok_or(QueryError::EmptyDataset("no observations to anchor a date window"))?;

    Ok(DateWindow::trailing(end))
}
