//! Page fetching with retry and backoff.
//!
//! The reconciliation run only needs "give me the text at this URL, or fail
//! after N attempts". That contract is the [`PageFetcher`] trait:
//!
//! - **[`HttpFetcher`]** makes a single GET with browser-like headers.
//! - **[`RetryingFetcher`]** wraps any fetcher with exponential backoff.
//!
//! # Retry Strategy
//!
//! - Network errors, HTTP 429, and HTTP 5xx → retry
//! - Other HTTP 4xx → fail immediately
//! - Backoff before attempt `n` (n ≥ 2): `base_delay × 2^(n-2)`, exponent
//!   capped at 5
//!
//! The backoff sleep is the only suspension point besides the request
//! itself, so fetches for different services interleave freely.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, USER_AGENT,
};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::FetchConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("gave up on {url} after {attempts} attempts: {last_error}")]
    Exhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },
}

impl FetchError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Transport { .. } => true,
            FetchError::Exhausted { .. } => false,
        }
    }
}

/// Retrieves the text of a page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// Single-attempt HTTP GET with a browser-like header set.
///
/// Some documentation hosts serve reduced or blocked pages to clients that
/// do not look like a browser.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .context("fetch.user_agent is not a valid header value")?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(transport)
    }
}

/// Attempt cap and backoff base.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }

    /// Sleep before attempt `attempt` (1-based). The first attempt never waits.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        self.base_delay * (1u32 << (attempt - 2).min(5))
    }
}

/// Wraps a fetcher with retry and exponential backoff.
pub struct RetryingFetcher<F> {
    inner: F,
    policy: RetryPolicy,
}

impl<F: PageFetcher> RetryingFetcher<F> {
    pub fn new(inner: F, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<F: PageFetcher> PageFetcher for RetryingFetcher<F> {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let mut last_error = String::from("no attempt made");

        for attempt in 1..=self.policy.max_attempts {
            let delay = self.policy.delay_before(attempt);
            if !delay.is_zero() {
                debug!(url, attempt, delay_ms = delay.as_millis() as u64, "backing off");
                tokio::time::sleep(delay).await;
            }

            match self.inner.fetch_text(url).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_retryable() => {
                    warn!(
                        url,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        error = %err,
                        "fetch failed"
                    );
                    last_error = err.to_string();
                }
                Err(err) => return Err(err),
            }
        }

        Err(FetchError::Exhausted {
            url: url.to_string(),
            attempts: self.policy.max_attempts,
            last_error,
        })
    }
}

/// The production fetcher: HTTP with the configured retry policy.
pub fn http_fetcher(config: &FetchConfig) -> Result<RetryingFetcher<HttpFetcher>> {
    Ok(RetryingFetcher::new(
        HttpFetcher::new(config)?,
        RetryPolicy::from_config(config),
    ))
}
