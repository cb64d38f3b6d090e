//! API request and response types

use keygate_core::{Decision, DocumentKind, Evaluation, MetricsSnapshot, Tier, ToolSwitch};
use serde::{Deserialize, Serialize};

/// Query parameters for `GET /api`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GateParams {
    /// Caller key; absent and empty are treated alike
    #[serde(default)]
    pub key: Option<String>,

    /// Attach diagnostics to the response; see [`flag_enabled`]
    #[serde(default)]
    pub debug: Option<String>,
}

impl GateParams {
    /// Whether the caller asked for diagnostics
    pub fn debug_requested(&self) -> bool {
        self.debug.as_deref().is_some_and(flag_enabled)
    }
}

/// Loose boolean used by the `debug` query flag and the `DEBUG` variable.
///
/// `true`, `1`, `yes` and `on` (any case) enable; everything else disables.
pub fn flag_enabled(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Body of a successful gate response.
///
/// Exactly one of `status` or `message` is set: `status` carries
/// `OFF`, `BLOCKED` or `NONE`; `message` carries the activation output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GateResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Diagnostic information (only in debug mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
}

impl GateResponse {
    /// Map an evaluation onto the wire shape
    pub fn from_evaluation(evaluation: &Evaluation) -> Self {
        match status_label(evaluation.decision) {
            Some(label) => GateResponse {
                status: Some(label.to_string()),
                ..Default::default()
            },
            None => GateResponse {
                message: Some(
                    evaluation
                        .message
                        .clone()
                        .unwrap_or_else(|| "ACTIVE".to_string()),
                ),
                ..Default::default()
            },
        }
    }
}

/// Wire label for non-active decisions.
///
/// `NOT_APPROVED` goes out as `NONE`; `ACTIVE` has no status label.
pub fn status_label(decision: Decision) -> Option<&'static str> {
    match decision {
        Decision::Off => Some("OFF"),
        Decision::Blocked => Some("BLOCKED"),
        Decision::NotApproved => Some("NONE"),
        Decision::Active => None,
    }
}

/// Diagnostic information for debugging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    /// Decision before wire mapping
    pub decision: Decision,

    /// Control documents fetched, in order
    pub documents: Vec<DocumentKind>,

    /// Tier read from the status document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,

    /// Time taken to evaluate (milliseconds)
    pub evaluation_time_ms: f64,
}

impl From<&Evaluation> for Diagnostics {
    fn from(evaluation: &Evaluation) -> Self {
        Diagnostics {
            decision: evaluation.decision,
            documents: evaluation.documents.clone(),
            tier: evaluation.tier,
            evaluation_time_ms: evaluation.elapsed_ms,
        }
    }
}

/// Error response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Service status
    pub status: HealthStatus,

    /// Service version
    pub version: String,

    /// Uptime in seconds
    pub uptime_seconds: u64,

    /// Tool control state, when it was probed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_control: Option<ToolSwitch>,

    /// Decisions and errors since start
    pub decisions: MetricsSnapshot,
}

/// Health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Service is healthy
    Healthy,
    /// Control documents are unreachable
    Unhealthy,
}
