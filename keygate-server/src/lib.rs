//! KEYGATE HTTP Server - remote key gating over HTTP
//!
//! This crate exposes the KEYGATE gate as a small HTTP API: one gating
//! endpoint plus health probes and Prometheus metrics.

pub mod api;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod router;
pub mod state;
pub mod tracing;

pub use api::{Diagnostics, ErrorBody, GateParams, GateResponse, HealthResponse};
pub use error::{ApiError, ApiResult};
pub use router::app;
pub use state::AppState;
