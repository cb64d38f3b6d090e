//! Error types for KEYGATE

use crate::document::DocumentKind;
use thiserror::Error;

/// Errors produced while evaluating a key.
///
/// The `Display` text of each request-time variant is exactly what callers
/// receive, so it must not carry infrastructure detail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// The caller supplied no key
    #[error("Key is required.")]
    MissingKey,

    /// A control document could not be fetched
    #[error("Network Error")]
    UpstreamUnavailable {
        /// Which document failed, for logs only
        document: DocumentKind,
    },

    /// The status document held something other than TRIAL or PAID
    #[error("Invalid status from server.")]
    InvalidUpstreamState {
        /// Trimmed document content
        found: String,
    },

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GateError {
    /// Short machine-readable label, used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            GateError::MissingKey => "missing_key",
            GateError::UpstreamUnavailable { .. } => "upstream_unavailable",
            GateError::InvalidUpstreamState { .. } => "invalid_upstream_state",
            GateError::Config(_) => "config",
        }
    }
}

/// Failure to fetch a control document.
///
/// Sub-kinds exist for operator logs; the gate collapses all of them into
/// [`GateError::UpstreamUnavailable`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection could not be established or was reset
    #[error("transport error fetching {url}: {reason}")]
    Transport {
        /// Requested URL
        url: String,
        /// Underlying cause
        reason: String,
    },

    /// The request did not complete within the configured timeout
    #[error("timed out fetching {url}")]
    Timeout {
        /// Requested URL
        url: String,
    },

    /// Upstream answered with a non-success status
    #[error("fetching {url} returned status {status}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Response body could not be read as text
    #[error("unreadable body from {url}: {reason}")]
    Body {
        /// Requested URL
        url: String,
        /// Underlying cause
        reason: String,
    },
}

/// Result type alias for gate operations
pub type Result<T> = std::result::Result<T, GateError>;
