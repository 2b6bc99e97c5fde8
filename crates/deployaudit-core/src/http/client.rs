//! Rate-limited GitHub REST client
//!
//! Every request of a report run goes through [`RateLimitedClient::get_raw`],
//! which is the only place that sleeps. Requests are issued one at a time,
//! so the quota state below has a single reader and writer.

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::transport::{truncate_body, RawResponse, ReqwestTransport};
use crate::traits::HttpTransport;
use crate::types::{FetchOutcome, RateLimitSnapshot};
use parking_lot::Mutex;
use serde_json::Value;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, error, warn};

/// Longest response body excerpt kept in an error
const ERROR_BODY_CHARS: usize = 512;

/// Seconds since the Unix epoch
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Sleep needed before retrying an exhausted quota: `max(reset - now, 1)` seconds.
///
/// Falls back to `fallback` when the server sent no reset time.
pub fn rate_limit_wait(reset_epoch: Option<u64>, now_epoch: u64, fallback: Duration) -> Duration {
    match reset_epoch {
        Some(reset) => Duration::from_secs(reset.saturating_sub(now_epoch).max(1)),
        None => fallback,
    }
}

/// Authenticated GET client with quota waits and bounded retries
pub struct RateLimitedClient<T = ReqwestTransport> {
    transport: T,
    config: ClientConfig,
    rate_limit: Mutex<RateLimitSnapshot>,
}

impl<T> std::fmt::Debug for RateLimitedClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitedClient")
            .field("config", &self.config)
            .field("rate_limit", &*self.rate_limit.lock())
            .finish_non_exhaustive()
    }
}

impl RateLimitedClient<ReqwestTransport> {
    /// Validate the config and build a client over reqwest
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: HttpTransport> RateLimitedClient<T> {
    /// Build a client over any transport
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        Self {
            transport,
            config,
            rate_limit: Mutex::new(RateLimitSnapshot::default()),
        }
    }

    /// Injected configuration
    #[inline]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Underlying transport
    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Absolute URL for an API path such as `/repos/acme/api/deployments`
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_root(), path)
    }

    /// Last quota headers seen
    pub fn rate_limit(&self) -> RateLimitSnapshot {
        *self.rate_limit.lock()
    }

    fn record_rate_limit(&self, response: &RawResponse) {
        let mut snapshot = self.rate_limit.lock();
        if response.rate_limit_remaining.is_some() {
            snapshot.remaining = response.rate_limit_remaining;
        }
        if response.rate_limit_reset.is_some() {
            snapshot.reset_epoch = response.rate_limit_reset;
        }
    }

    /// GET with quota handling and retries.
    ///
    /// - 2xx: `Found(response)`
    /// - 404: `Absent`, not retried
    /// - 403 with zero remaining quota: sleep until reset and retry without
    ///   spending an attempt
    /// - anything else: fixed-delay retry, `Failed` after `max_attempts`
    pub async fn get_raw(&self, url: &str, query: &[(String, String)]) -> FetchOutcome<RawResponse> {
        let mut failures = 0u32;

        loop {
            debug!(url, attempt = failures + 1, "GET");

            let last_error = match self.transport.get(url, query).await {
                Ok(response) => {
                    self.record_rate_limit(&response);

                    if response.is_rate_limited() {
                        let wait = rate_limit_wait(
                            response.rate_limit_reset,
                            unix_now(),
                            self.config.default_rate_limit_wait,
                        );
                        warn!(
                            url,
                            wait_secs = wait.as_secs(),
                            "Rate limit exhausted, sleeping until reset"
                        );
                        tokio::time::sleep(wait).await;
                        continue;
                    }

                    if response.is_success() {
                        return FetchOutcome::Found(response);
                    }

                    if response.status == 404 {
                        debug!(url, "Resource not found");
                        return FetchOutcome::Absent;
                    }

                    Error::Api {
                        status: response.status,
                        body: truncate_body(&response.body, ERROR_BODY_CHARS),
                    }
                }
                Err(e) => e,
            };

            failures += 1;
            if failures >= self.config.max_attempts {
                error!(url, attempts = failures, error = %last_error, "Request failed, giving up");
                return FetchOutcome::Failed(last_error);
            }

            warn!(url, attempt = failures, error = %last_error, "Request failed, retrying");
            tokio::time::sleep(self.config.retry_delay).await;
        }
    }

    /// GET and parse the body as JSON. A non-JSON body fails this call only.
    pub async fn get(&self, url: &str, query: &[(String, String)]) -> FetchOutcome<Value> {
        self.get_raw(url, query)
            .await
            .and_then(|response| parse_json(url, &response.body))
    }
}

/// Parse a response body, naming the URL on failure
pub fn parse_json(url: &str, body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|e| Error::Decode(format!("{}: {}", url, e)))
}
