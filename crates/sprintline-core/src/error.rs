//! Error taxonomy for the timeline view.
//!
//! Three failure families cross the crate boundary:
//!
//! - [`ConfigurationError`] — the backend or team setup cannot host the
//!   view at all. Fatal, rendered as a blocking message, no retry.
//! - [`FetchError`] — a load attempt failed. Fatal to that attempt; the
//!   message is surfaced verbatim and the user retries by reloading.
//! - [`SaveError`] — an iteration-change commit failed. Recoverable: the
//!   override is reverted and an inline error is attached to the affected
//!   work item.
//!
//! Malformed upstream *data* (dangling links, unknown iteration ids,
//! inverted spans) is deliberately **not** an error anywhere: the remote
//! system may return partial results under paging or locking, so the
//! derivation layer logs and excludes instead of raising.

use std::fmt;

use crate::model::WorkItemId;

// ---------------------------------------------------------------------------
// Error codes
// ---------------------------------------------------------------------------

/// Machine-readable error codes for operator-facing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    UnsupportedBackend,
    NoIterationsConfigured,
    FetchFailed,
    SettingsReadFailed,
    SettingsWriteFailed,
    SaveFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::UnsupportedBackend => "E1001",
            Self::NoIterationsConfigured => "E1002",
            Self::FetchFailed => "E2001",
            Self::SettingsReadFailed => "E2002",
            Self::SettingsWriteFailed => "E2003",
            Self::SaveFailed => "E3001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::UnsupportedBackend => "Backend does not support backlog configuration",
            Self::NoIterationsConfigured => "Team has no iterations configured",
            Self::FetchFailed => "Timeline data fetch failed",
            Self::SettingsReadFailed => "Persisted settings could not be read",
            Self::SettingsWriteFailed => "Persisted settings could not be written",
            Self::SaveFailed => "Iteration change could not be saved",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::UnsupportedBackend => {
                Some("Upgrade the work-tracking server; backlog configuration APIs are required.")
            }
            Self::NoIterationsConfigured => {
                Some("Select team iterations on the team administration page, then reload.")
            }
            Self::FetchFailed => Some("Reload the view to retry the fetch."),
            Self::SettingsReadFailed | Self::SettingsWriteFailed => {
                Some("Check permissions on the settings file; defaults are used meanwhile.")
            }
            Self::SaveFailed => Some("The previous span was kept. Retry the drag."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.message())
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// The view cannot be hosted at all; no retry will help.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("this view requires a backend with backlog configuration support")]
    UnsupportedBackend,
    #[error("the team does not have any iteration selected")]
    NoIterationsConfigured,
}

impl ConfigurationError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedBackend => ErrorCode::UnsupportedBackend,
            Self::NoIterationsConfigured => ErrorCode::NoIterationsConfigured,
        }
    }
}

/// Which initialize stage failed; for logs only — the user sees the
/// message verbatim, stage-free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    BacklogConfiguration,
    TeamIterations,
    LevelQuery,
    LinkQuery,
    Paging,
    Settings,
}

impl FetchStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BacklogConfiguration => "backlog-configuration",
            Self::TeamIterations => "team-iterations",
            Self::LevelQuery => "level-query",
            Self::LinkQuery => "link-query",
            Self::Paging => "paging",
            Self::Settings => "settings",
        }
    }
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A load attempt failed. Display is the upstream message, verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("{message}")]
    Query { stage: FetchStage, message: String },
}

impl FetchError {
    #[must_use]
    pub fn query(stage: FetchStage, message: impl Into<String>) -> Self {
        Self::Query {
            stage,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Configuration(inner) => inner.code(),
            Self::Query { .. } => ErrorCode::FetchFailed,
        }
    }
}

/// An iteration-change commit failed for one or more work items.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SaveError {
    pub work_item_ids: Vec<WorkItemId>,
    pub message: String,
}

impl SaveError {
    #[must_use]
    pub fn new(work_item_ids: Vec<WorkItemId>, message: impl Into<String>) -> Self {
        Self {
            work_item_ids,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ErrorCode::UnsupportedBackend.code(), "E1001");
        assert_eq!(ErrorCode::FetchFailed.code(), "E2001");
        assert_eq!(ErrorCode::SaveFailed.code(), "E3001");
    }

    #[test]
    fn fetch_error_display_is_verbatim_message() {
        let err = FetchError::query(FetchStage::LinkQuery, "VS402337: the query timed out");
        assert_eq!(err.to_string(), "VS402337: the query timed out");
    }

    #[test]
    fn configuration_error_maps_to_code() {
        let err = FetchError::from(ConfigurationError::NoIterationsConfigured);
        assert_eq!(err.code(), ErrorCode::NoIterationsConfigured);
        assert!(err.to_string().contains("iteration"));
    }

    #[test]
    fn save_error_carries_affected_ids() {
        let err = SaveError::new(vec![7, 9], "TF401320: rule violation");
        assert_eq!(err.work_item_ids, vec![7, 9]);
        assert!(err.to_string().contains("TF401320"));
    }

    #[test]
    fn hints_exist_for_fatal_codes() {
        assert!(ErrorCode::UnsupportedBackend.hint().is_some());
        assert!(ErrorCode::NoIterationsConfigured.hint().is_some());
    }
}
