//! Session register types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use qrpulse_shared::types::{BranchId, QrCodeId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of a session id, matching the `session_id` column width.
pub const MAX_SESSION_ID_LEN: usize = 100;

/// Number of characters of a session id that may appear in logs.
const LOG_PREFIX_LEN: usize = 8;

/// A validated, non-empty visitor session id.
///
/// Callers build one with [`SessionKey::parse`] or [`SessionKey::resolve`],
/// so the register never sees an empty id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    /// Parses a raw session id, trimming whitespace.
    ///
    /// Returns `None` for empty ids and ids longer than [`MAX_SESSION_ID_LEN`].
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.len() > MAX_SESSION_ID_LEN {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    /// Synthesizes a fresh session id (UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Picks the first valid candidate in priority order, or synthesizes a new key.
    #[must_use]
    pub fn resolve<'a, I>(candidates: I) -> ResolvedKey
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        candidates
            .into_iter()
            .flatten()
            .find_map(Self::parse)
            .map_or_else(
                || ResolvedKey {
                    key: Self::generate(),
                    synthesized: true,
                },
                |key| ResolvedKey {
                    key,
                    synthesized: false,
                },
            )
    }

    /// Returns the session id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the short prefix used when logging the session id.
    #[must_use]
    pub fn log_prefix(&self) -> &str {
        match self.0.char_indices().nth(LOG_PREFIX_LEN) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }

    /// Consumes the key, returning the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of [`SessionKey::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    /// The key to use for this request.
    pub key: SessionKey,
    /// True when no candidate was usable and a new id was generated.
    pub synthesized: bool,
}

/// Kind of visitor action that can claim a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// A QR code was scanned.
    QrScan,
    /// A social-media link was clicked.
    SocialClick,
}

impl ActionKind {
    /// Returns the stored representation of the action kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QrScan => "qr_scan",
            Self::SocialClick => "social_click",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown action kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown action kind: {0}")]
pub struct UnknownActionKind(pub String);

impl FromStr for ActionKind {
    type Err = UnknownActionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "qr_scan" => Ok(Self::QrScan),
            "social_click" => Ok(Self::SocialClick),
            other => Err(UnknownActionKind(other.to_string())),
        }
    }
}

/// Where a claim originated. Informational only; never part of uniqueness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimContext {
    /// Branch the action belongs to.
    pub branch_id: Option<BranchId>,
    /// QR code that was scanned.
    pub qr_code_id: Option<QrCodeId>,
}

impl ClaimContext {
    /// Context for a QR scan.
    #[must_use]
    pub const fn scan(qr_code_id: QrCodeId, branch_id: Option<BranchId>) -> Self {
        Self {
            branch_id,
            qr_code_id: Some(qr_code_id),
        }
    }

    /// Context for a social click.
    #[must_use]
    pub const fn click(branch_id: Option<BranchId>) -> Self {
        Self {
            branch_id,
            qr_code_id: None,
        }
    }
}

/// A claim attempt handed to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClaim {
    /// Session being claimed.
    pub session_id: SessionKey,
    /// Action that produced the claim attempt.
    pub action: ActionKind,
    /// Origin of the action.
    pub context: ClaimContext,
    /// When the attempt was made.
    pub attempted_at: DateTime<Utc>,
}

impl NewClaim {
    /// Creates a claim attempt stamped with the current time.
    #[must_use]
    pub fn new(session_id: SessionKey, action: ActionKind, context: ClaimContext) -> Self {
        Self {
            session_id,
            action,
            context,
            attempted_at: Utc::now(),
        }
    }
}

/// A persisted first-seen record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionClaim {
    /// Session id.
    pub session_id: String,
    /// When the session was first seen.
    pub first_seen_at: DateTime<Utc>,
    /// Action that claimed the session.
    pub first_action_kind: ActionKind,
    /// Branch of the first action.
    pub first_branch_id: Option<BranchId>,
    /// QR code of the first action.
    pub first_qr_code_id: Option<QrCodeId>,
    /// Row creation time, used by retention.
    pub created_at: DateTime<Utc>,
}

impl From<&NewClaim> for SessionClaim {
    fn from(claim: &NewClaim) -> Self {
        Self {
            session_id: claim.session_id.as_str().to_string(),
            first_seen_at: claim.attempted_at,
            first_action_kind: claim.action,
            first_branch_id: claim.context.branch_id,
            first_qr_code_id: claim.context.qr_code_id,
            created_at: claim.attempted_at,
        }
    }
}

/// Result of a conditional insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This attempt inserted the row: the session is new.
    Claimed,
    /// A row already existed: the session is returning.
    AlreadyClaimed,
}

impl ClaimOutcome {
    /// Returns true when this attempt won the claim.
    #[must_use]
    pub const fn is_new(self) -> bool {
        matches!(self, Self::Claimed)
    }
}
