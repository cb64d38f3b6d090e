//! Gate configuration
//!
//! Loaded from a TOML file or from `KEYGATE_*` environment variables:
//!
//! - `KEYGATE_TOOL_CONTROL_URL`, `KEYGATE_STATUS_URL`,
//!   `KEYGATE_BLOCK_LIST_URL`, `KEYGATE_APPROVAL_LIST_URL` (required)
//! - `KEYGATE_FETCH_TIMEOUT_MS` (default: 5000)
//! - `KEYGATE_CONNECT_TIMEOUT_MS` (default: 2000)

use crate::document::DocumentKind;
use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Locations of the four control documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUrls {
    /// Kill switch document
    pub tool_control: String,
    /// Tier document
    pub status: String,
    /// Block list document
    pub block_list: String,
    /// Approval list document
    pub approval_list: String,
}

impl DocumentUrls {
    /// URL for a given document kind
    pub fn url(&self, kind: DocumentKind) -> &str {
        match kind {
            DocumentKind::ToolControl => &self.tool_control,
            DocumentKind::Status => &self.status,
            DocumentKind::BlockList => &self.block_list,
            DocumentKind::ApprovalList => &self.approval_list,
        }
    }
}

/// Timeouts applied to every document fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Whole-request timeout in milliseconds
    pub timeout_ms: u64,
    /// TCP + TLS handshake timeout in milliseconds
    pub connect_timeout_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            timeout_ms: 5_000,
            connect_timeout_ms: 2_000,
        }
    }
}

impl FetchConfig {
    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Connect timeout as a duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Complete gate configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Control document locations
    pub documents: DocumentUrls,
    /// Fetch timeouts
    #[serde(default)]
    pub fetch: FetchConfig,
}

impl GateConfig {
    /// Build a config with default timeouts
    pub fn new(documents: DocumentUrls) -> Self {
        GateConfig {
            documents,
            fetch: FetchConfig::default(),
        }
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: GateConfig = toml::from_str(source)
            .map_err(|e| GateError::Config(format!("invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| GateError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&source)
    }

    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| -> Result<String> {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| GateError::Config(format!("{} is not set", name)))
        };
        let millis = |name: &str, default: u64| -> Result<u64> {
            match lookup(name) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| GateError::Config(format!("{} must be an integer, got '{}'", name, raw))),
                None => Ok(default),
            }
        };

        let defaults = FetchConfig::default();
        let config = GateConfig {
            documents: DocumentUrls {
                tool_control: required("KEYGATE_TOOL_CONTROL_URL")?,
                status: required("KEYGATE_STATUS_URL")?,
                block_list: required("KEYGATE_BLOCK_LIST_URL")?,
                approval_list: required("KEYGATE_APPROVAL_LIST_URL")?,
            },
            fetch: FetchConfig {
                timeout_ms: millis("KEYGATE_FETCH_TIMEOUT_MS", defaults.timeout_ms)?,
                connect_timeout_ms: millis(
                    "KEYGATE_CONNECT_TIMEOUT_MS",
                    defaults.connect_timeout_ms,
                )?,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that every URL is absolute http(s) and timeouts are non-zero
    pub fn validate(&self) -> Result<()> {
        for kind in DocumentKind::ALL {
            let raw = self.documents.url(kind);
            let url = reqwest::Url::parse(raw)
                .map_err(|e| GateError::Config(format!("{} URL '{}': {}", kind, raw, e)))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(GateError::Config(format!(
                    "{} URL '{}' must use http or https",
                    kind, raw
                )));
            }
        }
        if self.fetch.timeout_ms == 0 || self.fetch.connect_timeout_ms == 0 {
            return Err(GateError::Config("fetch timeouts must be > 0".to_string()));
        }
        Ok(())
    }
}
