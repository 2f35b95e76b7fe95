//! Error types for harvesting operations
//!
//! Three layers, from the outside in:
//! - [`HarvestError`]: run-level failures. Only raised before leads start
//!   (lead source, output destination, configuration) and abort the run.
//! - [`LeadError`]: why a single lead did not reach `Committed`. Contained
//!   inside that lead's pipeline; never aborts the run.
//! - [`SessionError`]: what a [`PageSession`](crate::session::PageSession)
//!   reports back to the pipeline.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for run-level operations
pub type HarvestResult<T> = Result<T, HarvestError>;

/// Result type alias for per-lead pipeline stages
pub type LeadResult<T> = Result<T, LeadError>;

/// Run-level errors (fatal to the whole run)
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Lead file missing, unreadable or in an unsupported format
    #[error("Failed to read leads from {path}: {message}")]
    LeadSource { path: PathBuf, message: String },

    /// Output destination cannot be created or written
    #[error("Output destination {path} is not writable: {message}")]
    Output { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Workbook serialization failed
    #[error("Workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    /// Spreadsheet lead source could not be parsed
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// CSV lead source could not be parsed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Background task failed to complete
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// How a terminal lead is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadOutcome {
    /// Expected, non-fatal: the address is unknown to the portal
    Skipped,
    /// The pipeline broke down for this lead
    Failed,
}

/// Per-lead errors, contained within one pipeline run
#[derive(Debug, Error)]
pub enum LeadError {
    /// A load-gating element never appeared
    #[error("Required element not found: {0}")]
    NotFound(String),

    /// A click stayed blocked by an overlay after dismissal and one retry
    #[error("Click on {0} intercepted by an overlay")]
    Intercepted(String),

    /// A bounded wait exceeded its deadline
    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    /// The portal reported "no location found" for the address
    #[error("Property not found")]
    NoSuchProperty,

    /// An overlay dialog could not be dismissed; the address likely does not exist
    #[error("Overlay could not be dismissed; property likely does not exist")]
    LikelyMissing,

    /// The run was cancelled while this lead was in flight
    #[error("Cancelled")]
    Cancelled,

    /// Any other fault, including panics caught at the worker boundary
    #[error("Unexpected fault: {0}")]
    Unexpected(String),
}

impl LeadError {
    /// Classify this error for progress reporting
    #[must_use]
    pub fn outcome(&self) -> LeadOutcome {
        match self {
            Self::NoSuchProperty | Self::LikelyMissing => LeadOutcome::Skipped,
            _ => LeadOutcome::Failed,
        }
    }
}

impl From<SessionError> for LeadError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::NotFound(locator) => Self::NotFound(locator),
            SessionError::Timeout { operation, after } => Self::Timeout { operation, after },
            SessionError::Driver(message) => Self::Unexpected(message),
        }
    }
}

/// Errors reported by a page session implementation
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// Locator did not resolve to an element
    #[error("No element matches {0}")]
    NotFound(String),

    /// The session gave up waiting
    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    /// Browser/driver communication failure
    #[error("Driver error: {0}")]
    Driver(String),
}

impl From<anyhow::Error> for SessionError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} keeps the context chain
        Self::Driver(format!("{err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_addresses_are_skipped_not_failed() {
        assert_eq!(LeadError::NoSuchProperty.outcome(), LeadOutcome::Skipped);
        assert_eq!(LeadError::LikelyMissing.outcome(), LeadOutcome::Skipped);
        assert_eq!(
            LeadError::NotFound("//input".into()).outcome(),
            LeadOutcome::Failed
        );
        assert_eq!(LeadError::Cancelled.outcome(), LeadOutcome::Failed);
    }

    #[test]
    fn session_errors_map_onto_lead_taxonomy() {
        let err: LeadError = SessionError::Timeout {
            operation: "page ready".into(),
            after: Duration::from_secs(25),
        }
        .into();
        assert!(matches!(err, LeadError::Timeout { .. }));

        let err: LeadError = SessionError::Driver("socket closed".into()).into();
        assert!(matches!(err, LeadError::Unexpected(msg) if msg == "socket closed"));
    }
}
