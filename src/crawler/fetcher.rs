//! HTTP fetcher for catalog pages
//!
//! The target server rejects requests that do not look like a browser
//! navigating the site, and answers with a "traffic too high" page (HTTP
//! 200) when it is overloaded. Every fetch therefore sends browser-like
//! headers plus the referer of the page that linked here, treats the busy
//! marker as a soft failure, and retries with linearly increasing backoff.
//! The pages also misdeclare their encoding, so bodies are decoded as
//! UTF-8 unconditionally.

use crate::config::FetchConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// User-Agent presented to the catalog server
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Body markers of the server's soft rate-limit page
pub const RATE_LIMIT_MARKERS: [&str; 2] = ["流量過大", "System is busy"];

/// Retry and backoff policy for page fetches
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Attempts per page before giving up
    pub max_attempts: u32,

    /// Linear backoff unit; attempt n waits (n + 1) units
    pub backoff_unit: Duration,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_unit: Duration::from_secs(2),
            timeout: Duration::from_secs(15),
        }
    }
}

impl From<&FetchConfig> for FetchPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff_unit: config.backoff_unit(),
            timeout: config.timeout(),
        }
    }
}

impl FetchPolicy {
    /// Backoff before retrying after the given zero-based attempt:
    /// 2s, 4s, 6s... at the default unit
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff_unit * (attempt + 1)
    }
}

/// Returns true if a response body carries the soft rate-limit marker
pub fn is_rate_limited(body: &str) -> bool {
    RATE_LIMIT_MARKERS.iter().any(|marker| body.contains(marker))
}

/// Builds an HTTP client with browser-like default headers
///
/// One client per run: the cookie jar and referer chain are run-specific
/// state that must not leak across concurrent runs.
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("zh-TW,zh;q=0.9,en-US;q=0.8,en;q=0.7"),
    );

    Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .default_headers(headers)
        .timeout(timeout)
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches catalog pages with retries, backoff, and cooperative stop
pub struct Fetcher {
    client: Client,
    policy: FetchPolicy,
    stop: Arc<AtomicBool>,
}

impl Fetcher {
    /// Creates a fetcher with its own client session
    pub fn new(policy: FetchPolicy, stop: Arc<AtomicBool>) -> Result<Self, reqwest::Error> {
        let client = build_http_client(policy.timeout)?;
        Ok(Self {
            client,
            policy,
            stop,
        })
    }

    /// Fetches a page, returning its body as UTF-8 text
    ///
    /// Up to `max_attempts` tries. A body carrying the busy marker or any
    /// network-level failure (timeout, connection error, non-2xx) waits
    /// out the linear backoff and retries. Exhausting the attempts returns
    /// `None`: the page is currently unobtainable and the caller should
    /// skip it, not abort the run. The stop flag short-circuits before
    /// every attempt without consuming a retry.
    pub async fn fetch(&self, url: &str, referer: Option<&str>) -> Option<String> {
        for attempt in 0..self.policy.max_attempts {
            if self.stop.load(Ordering::Relaxed) {
                tracing::debug!("Stop requested, abandoning fetch of {}", url);
                return None;
            }

            match self.try_fetch(url, referer).await {
                Ok(body) => {
                    if is_rate_limited(&body) {
                        let wait = self.policy.backoff_delay(attempt);
                        tracing::warn!(
                            "Server busy at {}. Retrying in {}s ({}/{})",
                            url,
                            wait.as_secs(),
                            attempt + 1,
                            self.policy.max_attempts
                        );
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                    return Some(body);
                }
                Err(e) => {
                    let wait = self.policy.backoff_delay(attempt);
                    tracing::warn!(
                        "Error fetching {}: {}. Retrying in {}s ({}/{})",
                        url,
                        e,
                        wait.as_secs(),
                        attempt + 1,
                        self.policy.max_attempts
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }

        tracing::warn!(
            "Failed to fetch {} after {} attempts",
            url,
            self.policy.max_attempts
        );
        None
    }

    /// One GET attempt: browser headers, optional referer, status check,
    /// forced UTF-8 decode
    async fn try_fetch(&self, url: &str, referer: Option<&str>) -> Result<String, reqwest::Error> {
        let mut request = self.client.get(url);
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }

        let response = request.send().await?.error_for_status()?;

        // The catalog misdeclares its charset; decode the raw bytes as
        // UTF-8 instead of trusting the Content-Type header.
        let bytes = response.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
