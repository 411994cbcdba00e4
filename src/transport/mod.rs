//! Resilient HTTP transport.
//!
//! [`Transport`] wraps an [`Http`] implementation with a per-call
//! timeout race, a bounded retry policy for 408/429 and transport-level
//! errors, and cooperative cancellation. Retry policy for other status
//! classes deliberately lives one layer up: 4xx means the request itself
//! is wrong, and the orchestrator owns the 5xx budget for the job
//! lifecycle.

pub mod client;
pub mod mock;

use std::time::Duration;

use anyhow::Result as HttpResult;
use async_trait::async_trait;
use serde_json::Value;

use crate::cancel::CancelToken;
use crate::error::{JobError, Result};

/// HTTP method subset the client needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One outbound request, already fully addressed.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// JSON body for POST requests.
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            body: Some(body),
        }
    }
}

/// A received response. Non-2xx statuses are data here, not errors;
/// classification happens in the caller.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Value,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The wire. Could be reqwest, or a test script.
#[async_trait]
pub trait Http: Send + Sync {
    async fn execute(&self, request: &HttpRequest) -> HttpResult<HttpResponse>;
}

/// Tuning for [`Transport::send`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_attempts: crate::consts::DEFAULT_MAX_ATTEMPTS,
            base_delay: crate::consts::DEFAULT_BASE_DELAY,
            request_timeout: crate::consts::REQUEST_TIMEOUT,
        }
    }
}

/// Fetch-with-retry wrapper around an [`Http`] implementation.
pub struct Transport {
    http: Box<dyn Http>,
    config: TransportConfig,
}

impl Transport {
    pub fn new(http: Box<dyn Http>, config: TransportConfig) -> Self {
        Self { http, config }
    }

    /// Send a request, retrying 408/429 and transport-level errors with
    /// the policy from the module docs. Returns the final response even
    /// when its status is non-2xx; only transport exhaustion and
    /// cancellation become errors.
    pub async fn send(&self, request: &HttpRequest, cancel: &CancelToken) -> Result<HttpResponse> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match self.attempt(request, cancel).await {
                Ok(response) => {
                    let retriable = response.status == 408 || response.status == 429;
                    if retriable && attempt < max_attempts {
                        // Linear-times-attempt backoff for throttle statuses.
                        let delay = self.config.base_delay * attempt * 2;
                        self.pause(delay, cancel).await?;
                        continue;
                    }
                    // Last attempt returns the throttle response as-is so
                    // the caller can classify it.
                    return Ok(response);
                }
                Err(JobError::Cancelled) => return Err(JobError::Cancelled),
                Err(JobError::NetworkFailure { message, .. }) => {
                    last_error = message;
                    if attempt < max_attempts {
                        let delay = self.config.base_delay * attempt;
                        self.pause(delay, cancel).await?;
                        continue;
                    }
                }
                Err(other) => return Err(other),
            }
        }

        Err(JobError::network(last_error))
    }

    /// One attempt: the HTTP call raced against the per-call timeout and
    /// the cancellation token. The loser of the race is dropped.
    async fn attempt(&self, request: &HttpRequest, cancel: &CancelToken) -> Result<HttpResponse> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(JobError::Cancelled),
            outcome = tokio::time::timeout(self.config.request_timeout, self.http.execute(request)) => {
                match outcome {
                    Ok(Ok(response)) => Ok(response),
                    Ok(Err(e)) => Err(JobError::network(e.to_string())),
                    Err(_) => Err(JobError::network(format!(
                        "request timed out after {:?}",
                        self.config.request_timeout
                    ))),
                }
            }
        }
    }

    /// Sleep between attempts, preemptible by cancellation.
    async fn pause(&self, delay: Duration, cancel: &CancelToken) -> Result<()> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(JobError::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}
