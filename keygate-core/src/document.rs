//! Control documents and how their text maps to gate state

use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four control documents consulted by the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Global kill switch
    ToolControl,
    /// Subscription tier flag
    Status,
    /// Keys that are refused outright
    BlockList,
    /// Keys allowed on the paid tier
    ApprovalList,
}

impl DocumentKind {
    /// All kinds in pipeline order
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::ToolControl,
        DocumentKind::Status,
        DocumentKind::BlockList,
        DocumentKind::ApprovalList,
    ];

    /// Stable name used in logs, metrics and diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::ToolControl => "tool_control",
            DocumentKind::Status => "status",
            DocumentKind::BlockList => "block_list",
            DocumentKind::ApprovalList => "approval_list",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of the global kill switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ToolSwitch {
    /// Gated capability enabled
    On,
    /// Gated capability disabled
    Off,
}

impl ToolSwitch {
    /// Anything other than exactly `ON` after trimming turns the tool off.
    pub fn parse(text: &str) -> Self {
        if text.trim() == "ON" {
            ToolSwitch::On
        } else {
            ToolSwitch::Off
        }
    }
}

/// Subscription tier read from the status document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    /// Trial users skip the approval check
    Trial,
    /// Paid users must appear on the approval list
    Paid,
}

impl Tier {
    /// Parse trimmed status text. Case-sensitive; anything else is an
    /// upstream misconfiguration.
    pub fn parse(text: &str) -> Result<Self> {
        match text.trim() {
            "TRIAL" => Ok(Tier::Trial),
            "PAID" => Ok(Tier::Paid),
            other => Err(GateError::InvalidUpstreamState {
                found: other.to_string(),
            }),
        }
    }

    /// Whether the approval list must be consulted
    pub fn requires_approval(&self) -> bool {
        matches!(self, Tier::Paid)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Trial => f.write_str("TRIAL"),
            Tier::Paid => f.write_str("PAID"),
        }
    }
}

/// Raw substring containment, used for both block and approval lists.
///
/// A key that is a substring of a listed key matches too.
pub fn list_contains(document: &str, key: &str) -> bool {
    document.contains(key)
}

/// Number of non-blank lines, for operator reporting only
pub fn entry_count(document: &str) -> usize {
    document.lines().filter(|l| !l.trim().is_empty()).count()
}
