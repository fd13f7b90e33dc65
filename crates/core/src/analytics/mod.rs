//! Visitor analytics.
//!
//! Pure roll-up logic for the reporting layer:
//! - New vs returning ratios
//! - Branch totals rolled up into clusters and regions
//! - Social-platform breakdowns
//!
//! Counting happens in the database; this module only shapes the numbers.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::AnalyticsError;
pub use service::AnalyticsService;
pub use types::*;
