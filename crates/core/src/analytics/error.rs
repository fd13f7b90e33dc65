//! Analytics error types.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while building analytics.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalyticsError {
    /// Invalid date range.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },
}
