//! Control document fetching
//!
//! The gate reads documents through the [`DocumentFetcher`] trait so the
//! transport can be swapped. [`HttpFetcher`] is the production transport;
//! [`StaticFetcher`] serves fixed in-memory documents and counts calls.
//!
//! Fetchers never retry. A timeout is always enforced by the transport.

use crate::config::FetchConfig;
use crate::error::FetchError;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use std::collections::HashMap;
use tracing::{debug, error};

/// Source of control document text
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetch the full body at `url` as text
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// HTTP transport backed by a pooled reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a client with the configured timeouts
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(concat!("keygate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport {
                url: String::new(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(HttpFetcher { client })
    }

    fn classify(url: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        debug!(url, "Fetching control document");

        let response = self.client.get(url).send().await.map_err(|e| {
            let err = Self::classify(url, e);
            error!(url, error = %err, "Control document request failed");
            err
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(url, status = status.as_u16(), "Control document returned non-success status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| {
            let err = if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            };
            error!(url, error = %err, "Control document body unreadable");
            err
        })
    }
}

#[derive(Debug, Clone)]
enum StaticResponse {
    Text(String),
    Fail,
}

/// In-memory fetcher serving fixed documents by URL.
///
/// Unknown URLs answer with a 404 [`FetchError::Status`]. Every call is
/// recorded, so callers can assert exactly which documents were read.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    responses: Mutex<HashMap<String, StaticResponse>>,
    requested: Mutex<Vec<String>>,
}

impl StaticFetcher {
    /// Empty fetcher; every URL fails until configured
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`StaticFetcher::set_document`]
    pub fn with_document(self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.set_document(url, text);
        self
    }

    /// Builder form of [`StaticFetcher::set_failure`]
    pub fn with_failure(self, url: impl Into<String>) -> Self {
        self.set_failure(url);
        self
    }

    /// Serve `text` for `url`
    pub fn set_document(&self, url: impl Into<String>, text: impl Into<String>) {
        self.responses
            .lock()
            .insert(url.into(), StaticResponse::Text(text.into()));
    }

    /// Make `url` fail with a transport error
    pub fn set_failure(&self, url: impl Into<String>) {
        self.responses.lock().insert(url.into(), StaticResponse::Fail);
    }

    /// Total number of fetch calls so far
    pub fn calls(&self) -> usize {
        self.requested.lock().len()
    }

    /// Number of fetch calls for one URL
    pub fn calls_for(&self, url: &str) -> usize {
        self.requested.lock().iter().filter(|u| *u == url).count()
    }

    /// URLs in the order they were requested
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().clone()
    }

    /// Forget recorded calls, keeping the documents
    pub fn reset_calls(&self) {
        self.requested.lock().clear();
    }
}

#[async_trait]
impl DocumentFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requested.lock().push(url.to_string());
        let response = self.responses.lock().get(url).cloned();
        match response {
            Some(StaticResponse::Text(text)) => Ok(text),
            Some(StaticResponse::Fail) => Err(FetchError::Transport {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}
