use std::sync::Arc;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::metrics::RequestMetrics;
use super::rate_limit::{RateLimiter, RateLimits};
use super::retry::RetryPolicy;
use super::types::{RiotApiError, RiotApiResponse};

// Only the EUW shard is served, so routing is a pair of base URLs rather
// than a region enum. Tests point both at a local mock server.
const DEFAULT_REGIONAL_BASE: &str = "https://europe.api.riotgames.com";
const DEFAULT_PLATFORM_BASE: &str = "https://euw1.api.riotgames.com";

/// HTTP client for the Riot API.
///
/// Every request is admitted by the shared [`RateLimiter`] and driven by the
/// [`RetryPolicy`], so callers only ever see a success, a permanent failure
/// or a retries-exhausted give-up.
#[derive(Debug)]
pub struct RiotClient {
    http: reqwest::Client,
    /// Riot API Key
    key: String,
    limiter: RateLimiter,
    retry: RetryPolicy,
    metrics: Arc<RequestMetrics>,
    regional_base: String,
    platform_base: String,
}

impl RiotClient {
    pub fn new(key: String, limits: RateLimits) -> Self {
        Self {
            http: reqwest::Client::new(),
            key,
            limiter: RateLimiter::new(limits),
            retry: RetryPolicy::default(),
            metrics: RequestMetrics::new(),
            regional_base: DEFAULT_REGIONAL_BASE.to_string(),
            platform_base: DEFAULT_PLATFORM_BASE.to_string(),
        }
    }

    /// Point both routing bases at `base` (mock servers in tests).
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        self.regional_base = base.clone();
        self.platform_base = base;
        self
    }

    /// Spawn a task logging periodic metrics about requests.
    pub fn start_metrics_logging(&self) {
        let metrics = self.metrics.clone();
        tokio::spawn(async move { metrics.log_loop().await });
    }

    pub(crate) fn regional_base(&self) -> &str {
        &self.regional_base
    }

    pub(crate) fn platform_base(&self) -> &str {
        &self.platform_base
    }

    /// Perform one GET with rate limiting and the retry policy applied.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: &str) -> RiotApiResponse<T> {
        self.retry.run(|| self.get_once(url)).await
    }

    async fn get_once<T: DeserializeOwned>(&self, url: &str) -> RiotApiResponse<T> {
        self.limiter.acquire().await;
        self.metrics.inc();

        let res = self
            .http
            .get(url)
            .header("X-Riot-Token", &self.key)
            .send()
            .await
            .map_err(RiotApiError::Http)?;

        let status = res.status();
        match status {
            StatusCode::OK => res.json().await.map_err(RiotApiError::Http),
            StatusCode::NOT_FOUND => Err(RiotApiError::NotFound),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = res
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());
                let scope = res
                    .headers()
                    .get("X-Rate-Limit-Type")
                    .and_then(|v| v.to_str().ok())
                    .map(|s| s.to_ascii_lowercase());
                Err(RiotApiError::RateLimited { retry_after, scope })
            }
            s if s.is_server_error() => Err(RiotApiError::Transient {
                status: s.as_u16(),
            }),
            s => {
                let message = res.text().await.unwrap_or_default();
                Err(RiotApiError::Status {
                    status: s.as_u16(),
                    message,
                })
            }
        }
    }
}
