//! HTTP request handlers

use crate::api::{Diagnostics, GateParams, GateResponse, HealthResponse, HealthStatus};
use crate::error::{ApiError, ApiResult};
use crate::metrics::LatencyTimer;
use crate::state::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use keygate_core::{redact_key, ToolSwitch};
use tracing::{info, warn, Instrument};

/// Handle a gate request: `GET /api?key=...`
pub async fn gate(
    State(state): State<AppState>,
    params: Result<Query<GateParams>, QueryRejection>,
) -> ApiResult<Json<GateResponse>> {
    let Query(params) = params.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected gate query");
        crate::metrics::record_error("invalid_query");
        ApiError::from(rejection)
    })?;
    let debug = params.debug_requested();
    let key = params.key.unwrap_or_default();
    let span = crate::tracing::create_gate_span(&redact_key(&key));
    let timer = LatencyTimer::start();

    let result = state.gate.evaluate(&key).instrument(span.clone()).await;

    let evaluation = match result {
        Ok(evaluation) => evaluation,
        Err(e) => {
            crate::metrics::record_error(e.kind());
            crate::tracing::record_error(&span, e.kind());
            return Err(ApiError::Gate(e));
        }
    };

    let elapsed = timer.elapsed_seconds();
    crate::metrics::record_decision(evaluation.decision.as_str(), elapsed);
    crate::tracing::record_decision(&span, evaluation.decision.as_str(), elapsed * 1000.0);

    let mut response = GateResponse::from_evaluation(&evaluation);
    if state.debug || debug {
        response.diagnostics = Some(Diagnostics::from(&evaluation));
    }

    Ok(Json(response))
}

fn health(state: &AppState, status: HealthStatus, tool_control: Option<ToolSwitch>) -> HealthResponse {
    HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        tool_control,
        decisions: state.gate.metrics().snapshot(),
    }
}

/// Health check - liveness probe
pub async fn health_live(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health(&state, HealthStatus::Healthy, None))
}

/// Health check - readiness probe, reachable only if the kill switch document is
pub async fn health_ready(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.gate.probe().await {
        Ok(switch) => {
            info!(tool_control = ?switch, "Readiness check passed");
            (
                StatusCode::OK,
                Json(health(&state, HealthStatus::Healthy, Some(switch))),
            )
        }
        Err(e) => {
            warn!(error = ?e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(health(&state, HealthStatus::Unhealthy, None)),
            )
        }
    }
}

/// Prometheus metrics endpoint
pub async fn metrics() -> String {
    crate::metrics::get_prometheus_metrics()
}
