use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SalesError};

/// Inclusive date range used by reporting filters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(SalesError::invalid("window end must not be before start"));
        }
        Ok(Self { start, end })
    }

    /// Calendar month containing `reference`.
    pub fn month_of(reference: NaiveDate) -> Self {
        let start = reference.with_day(1).unwrap_or(reference);
        let next_month = if start.month() == 12 {
            NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
        };
        let end = next_month
            .and_then(|date| date.pred_opt())
            .unwrap_or(reference);
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rejects_inverted_window() {
        assert!(DateWindow::new(date(2025, 2, 1), date(2025, 1, 31)).is_err());
        assert!(DateWindow::new(date(2025, 2, 1), date(2025, 2, 1)).is_ok());
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let window = DateWindow::new(date(2025, 1, 1), date(2025, 1, 31)).unwrap();
        assert!(window.contains(date(2025, 1, 1)));
        assert!(window.contains(date(2025, 1, 31)));
        assert!(!window.contains(date(2025, 2, 1)));
    }

    #[test]
    fn month_of_handles_leap_february_and_december() {
        assert_eq!(DateWindow::month_of(date(2024, 2, 10)).end, date(2024, 2, 29));
        let december = DateWindow::month_of(date(2024, 12, 25));
        assert_eq!(december.start, date(2024, 12, 1));
        assert_eq!(december.end, date(2024, 12, 31));
    }
}
