//! Integration test modules for KEYGATE
//!
//! End-to-end coverage of:
//! - Pipeline ordering and short-circuit behaviour
//! - Properties over arbitrary keys and documents
//! - Real HTTP transport against a mock document host

pub mod http_documents;
pub mod pipeline_scenarios;

use keygate_core::{DocumentUrls, Gate, GateConfig, StaticFetcher};
use std::sync::Arc;

pub const TOOL: &str = "http://docs.test/tool";
pub const STATUS: &str = "http://docs.test/status";
pub const BLOCKED: &str = "http://docs.test/blocked";
pub const APPROVED: &str = "http://docs.test/approved";

/// Config pointing at the fixed in-memory URLs above
pub fn test_config() -> GateConfig {
    GateConfig::new(DocumentUrls {
        tool_control: TOOL.to_string(),
        status: STATUS.to_string(),
        block_list: BLOCKED.to_string(),
        approval_list: APPROVED.to_string(),
    })
}

/// Gate over four fixed documents, plus the fetcher for call assertions
pub fn gate_with(
    tool: &str,
    status: &str,
    blocked: &str,
    approved: &str,
) -> (Gate, Arc<StaticFetcher>) {
    let fetcher = Arc::new(
        StaticFetcher::new()
            .with_document(TOOL, tool)
            .with_document(STATUS, status)
            .with_document(BLOCKED, blocked)
            .with_document(APPROVED, approved),
    );
    (Gate::new(test_config(), fetcher.clone()), fetcher)
}
