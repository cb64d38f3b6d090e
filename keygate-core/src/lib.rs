//! KEYGATE Core - key gating against remotely hosted control documents
//!
//! This crate provides the [`Gate`], which decides whether a caller-supplied
//! key may use a gated capability by consulting four plain-text control
//! documents: a kill switch, a subscription tier, a block list and an
//! approval list.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod document;
pub mod error;
pub mod fetcher;
pub mod gate;

pub use config::{DocumentUrls, FetchConfig, GateConfig};
pub use document::{DocumentKind, Tier, ToolSwitch};
pub use error::{FetchError, GateError, Result};
pub use fetcher::{DocumentFetcher, HttpFetcher, StaticFetcher};
pub use gate::{Activation, ActiveMarker, Decision, Evaluation, Gate, GateMetrics, MetricsSnapshot};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shorten a key for log output so keys never land in logs whole.
///
/// Keys longer than four characters keep a four character prefix; shorter
/// keys are masked entirely.
pub fn redact_key(key: &str) -> String {
    let mut chars = key.chars();
    let prefix: String = chars.by_ref().take(4).collect();
    if key.is_empty() {
        String::new()
    } else if chars.next().is_some() {
        format!("{}…", prefix)
    } else {
        "…".to_string()
    }
}
