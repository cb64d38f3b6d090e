//! The gate: ordered control-document checks folded into one decision
//!
//! Checks run strictly in order, each able to end the evaluation:
//!
//! 1. tool control: anything but `ON` yields [`Decision::Off`]
//! 2. status: must be `TRIAL` or `PAID`, otherwise an upstream error
//! 3. block list: key found as a substring yields [`Decision::Blocked`]
//! 4. approval list, `PAID` only: key missing yields [`Decision::NotApproved`]
//! 5. activation: [`Decision::Active`], no I/O
//!
//! Any fetch failure aborts with [`GateError::UpstreamUnavailable`].

use crate::config::{FetchConfig, GateConfig};
use crate::document::{list_contains, DocumentKind, Tier, ToolSwitch};
use crate::error::{GateError, Result};
use crate::fetcher::{DocumentFetcher, HttpFetcher};
use crate::redact_key;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Terminal outcome of one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// Tool control switch is not ON
    Off,
    /// Key appears on the block list
    Blocked,
    /// Paid tier and key missing from the approval list
    NotApproved,
    /// All checks passed
    Active,
}

impl Decision {
    /// Whether the gated capability may run
    pub fn is_active(&self) -> bool {
        matches!(self, Decision::Active)
    }

    /// Stable label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Off => "OFF",
            Decision::Blocked => "BLOCKED",
            Decision::NotApproved => "NOT_APPROVED",
            Decision::Active => "ACTIVE",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision plus what it took to reach it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    /// The decision
    pub decision: Decision,
    /// Documents fetched, in order
    pub documents: Vec<DocumentKind>,
    /// Tier, if the status document was read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    /// Activation output, present only for [`Decision::Active`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Wall-clock evaluation time in milliseconds
    pub elapsed_ms: f64,
}

/// The capability unlocked by an `ACTIVE` decision.
///
/// Invoked once per evaluation, only after every check has passed.
pub trait Activation: Send + Sync {
    /// Run the gated capability for `key` and describe the result
    fn activate(&self, key: &str) -> String;
}

/// Activation that only reports `ACTIVE`
#[derive(Debug, Clone, Copy, Default)]
pub struct ActiveMarker;

impl Activation for ActiveMarker {
    fn activate(&self, _key: &str) -> String {
        "ACTIVE".to_string()
    }
}

#[derive(Default)]
struct Trail {
    documents: Vec<DocumentKind>,
    tier: Option<Tier>,
}

/// Key gate over four remote control documents
#[derive(Clone)]
pub struct Gate {
    config: Arc<GateConfig>,
    fetcher: Arc<dyn DocumentFetcher>,
    activation: Arc<dyn Activation>,
    metrics: Arc<GateMetrics>,
}

impl Gate {
    /// Create a gate reading documents through `fetcher`
    pub fn new(config: GateConfig, fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Gate {
            config: Arc::new(config),
            fetcher,
            activation: Arc::new(ActiveMarker),
            metrics: Arc::new(GateMetrics::new()),
        }
    }

    /// Create a gate with an [`HttpFetcher`] built from the config timeouts
    pub fn with_http(config: GateConfig) -> Result<Self> {
        let fetcher = http_fetcher(&config.fetch)?;
        Ok(Self::new(config, Arc::new(fetcher)))
    }

    /// Replace the activation hook
    pub fn with_activation(mut self, activation: Arc<dyn Activation>) -> Self {
        self.activation = activation;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Decision counters
    pub fn metrics(&self) -> Arc<GateMetrics> {
        self.metrics.clone()
    }

    /// Decide access for `key`
    pub async fn decide(&self, key: &str) -> Result<Decision> {
        self.evaluate(key).await.map(|e| e.decision)
    }

    /// Decide access for `key`, keeping diagnostics
    #[instrument(skip_all, fields(key = %redact_key(key)))]
    pub async fn evaluate(&self, key: &str) -> Result<Evaluation> {
        let start = Instant::now();
        let result = self.run(key, start).await;

        match &result {
            Ok(evaluation) => {
                self.metrics.record_decision(evaluation.decision);
                info!(
                    decision = %evaluation.decision,
                    documents = evaluation.documents.len(),
                    elapsed_ms = evaluation.elapsed_ms,
                    "Gate decision"
                );
            }
            Err(e) => {
                self.metrics.record_error(e);
                match e {
                    GateError::InvalidUpstreamState { found } => {
                        error!(found = %found, "Status document holds an unknown tier")
                    }
                    GateError::MissingKey => debug!("Rejected request without key"),
                    other => warn!(error = ?other, "Gate evaluation failed"),
                }
            }
        }

        result
    }

    /// Check that the tool control document is reachable and report its state
    pub async fn probe(&self) -> Result<ToolSwitch> {
        let text = self.document(DocumentKind::ToolControl).await?;
        Ok(ToolSwitch::parse(&text))
    }

    /// Fetch one control document outside of an evaluation
    pub async fn document(&self, kind: DocumentKind) -> Result<String> {
        let mut trail = Trail::default();
        self.read(kind, &mut trail).await
    }

    async fn run(&self, key: &str, start: Instant) -> Result<Evaluation> {
        if key.is_empty() {
            return Err(GateError::MissingKey);
        }

        let mut trail = Trail::default();

        let tool = self.read(DocumentKind::ToolControl, &mut trail).await?;
        if ToolSwitch::parse(&tool) == ToolSwitch::Off {
            return Ok(finish(Decision::Off, trail, None, start));
        }

        let status = self.read(DocumentKind::Status, &mut trail).await?;
        let tier = Tier::parse(&status)?;
        trail.tier = Some(tier);

        let blocked = self.read(DocumentKind::BlockList, &mut trail).await?;
        if list_contains(&blocked, key) {
            return Ok(finish(Decision::Blocked, trail, None, start));
        }

        if tier.requires_approval() {
            let approved = self.read(DocumentKind::ApprovalList, &mut trail).await?;
            if !list_contains(&approved, key) {
                return Ok(finish(Decision::NotApproved, trail, None, start));
            }
        }

        let message = self.activation.activate(key);
        Ok(finish(Decision::Active, trail, Some(message), start))
    }

    async fn read(&self, kind: DocumentKind, trail: &mut Trail) -> Result<String> {
        let url = self.config.documents.url(kind);
        trail.documents.push(kind);
        debug!(document = %kind, "Reading control document");

        self.fetcher.fetch(url).await.map_err(|e| {
            warn!(document = %kind, error = %e, "Control document unavailable");
            GateError::UpstreamUnavailable { document: kind }
        })
    }
}

fn http_fetcher(config: &FetchConfig) -> Result<HttpFetcher> {
    HttpFetcher::new(config).map_err(|e| GateError::Config(e.to_string()))
}

fn finish(decision: Decision, trail: Trail, message: Option<String>, start: Instant) -> Evaluation {
    Evaluation {
        decision,
        documents: trail.documents,
        tier: trail.tier,
        message,
        elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
    }
}

/// Process-lifetime decision counters
#[derive(Debug, Default)]
pub struct GateMetrics {
    off: AtomicU64,
    blocked: AtomicU64,
    not_approved: AtomicU64,
    active: AtomicU64,
    missing_key: AtomicU64,
    upstream_unavailable: AtomicU64,
    invalid_upstream_state: AtomicU64,
}

/// Point-in-time copy of [`GateMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// OFF decisions
    pub off: u64,
    /// BLOCKED decisions
    pub blocked: u64,
    /// NOT_APPROVED decisions
    pub not_approved: u64,
    /// ACTIVE decisions
    pub active: u64,
    /// Requests rejected for a missing key
    pub missing_key: u64,
    /// Evaluations aborted by a failed fetch
    pub upstream_unavailable: u64,
    /// Evaluations aborted by an unknown tier
    pub invalid_upstream_state: u64,
}

impl MetricsSnapshot {
    /// Decisions reached, excluding errors
    pub fn decisions(&self) -> u64 {
        self.off + self.blocked + self.not_approved + self.active
    }

    /// Evaluations that ended in an error
    pub fn errors(&self) -> u64 {
        self.missing_key + self.upstream_unavailable + self.invalid_upstream_state
    }
}

impl GateMetrics {
    /// Zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    fn record_decision(&self, decision: Decision) {
        let counter = match decision {
            Decision::Off => &self.off,
            Decision::Blocked => &self.blocked,
            Decision::NotApproved => &self.not_approved,
            Decision::Active => &self.active,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record_error(&self, error: &GateError) {
        let counter = match error {
            GateError::MissingKey => &self.missing_key,
            GateError::UpstreamUnavailable { .. } => &self.upstream_unavailable,
            GateError::InvalidUpstreamState { .. } => &self.invalid_upstream_state,
            GateError::Config(_) => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            off: self.off.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
            not_approved: self.not_approved.load(Ordering::Relaxed),
            active: self.active.load(Ordering::Relaxed),
            missing_key: self.missing_key.load(Ordering::Relaxed),
            upstream_unavailable: self.upstream_unavailable.load(Ordering::Relaxed),
            invalid_upstream_state: self.invalid_upstream_state.load(Ordering::Relaxed),
        }
    }
}
