//! Session register error types.

use thiserror::Error;

/// Errors reported by a [`ClaimStore`](super::ClaimStore).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClaimStoreError {
    /// The store could not be reached (pool closed, connection refused, timeout).
    #[error("Claim store unavailable: {0}")]
    Unavailable(String),

    /// The store answered with an unexpected error.
    #[error("Claim store error: {0}")]
    Backend(String),

    /// A stored row could not be decoded.
    #[error("Corrupt claim row: {0}")]
    Corrupt(String),
}

impl ClaimStoreError {
    /// Returns true for transient connectivity failures.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Errors surfaced by register operations other than `claim`.
///
/// `claim` never fails; it degrades to "returning" instead.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The retention age was negative.
    #[error("Retention age must not be negative, got {0} seconds")]
    NegativeRetentionAge(i64),

    /// The retention age reaches past the earliest representable time.
    #[error("Retention age of {0} days is too large")]
    RetentionAgeTooLarge(i64),

    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] ClaimStoreError),
}
