//! Exchange HTTP Client - Rate-limited REST Client
//!
//! Wraps reqwest with concurrency limiting, retries with exponential
//! backoff, and session authentication for all exchange REST calls.
//! Every betting operation on this venue is a POST with a JSON body.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::auth::ExchangeAuth;
use super::types::ApiError;

/// Configuration for the exchange HTTP client.
#[derive(Debug, Clone)]
pub struct RestClientConfig {
    /// Base URL for the betting API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum concurrent requests.
    pub max_concurrent: usize,
    /// Maximum retries on transient errors.
    pub max_retries: u32,
    /// Base delay between retries (exponential backoff).
    pub retry_base_delay: Duration,
}

impl Default for RestClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.betfair.com/exchange/betting/rest/v1.0".to_string(),
            timeout: Duration::from_secs(30),
            max_concurrent: 4,
            max_retries: 3,
            retry_base_delay: Duration::from_millis(200),
        }
    }
}

/// Rate-limited HTTP client for the exchange betting API.
pub struct RestClient {
    /// Underlying HTTP client.
    http: Client,
    /// Session credentials.
    auth: Arc<ExchangeAuth>,
    /// Client configuration.
    config: RestClientConfig,
    /// Concurrency limiter.
    semaphore: Arc<Semaphore>,
}

impl RestClient {
    /// Create a new exchange client.
    pub fn new(auth: Arc<ExchangeAuth>, config: RestClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(5)
            .build()
            .context("Failed to build HTTP client")?;

        let semaphore = Arc::new(Semaphore::new(config.max_concurrent));

        Ok(Self {
            http,
            auth,
            config,
            semaphore,
        })
    }

    /// POST a JSON body and deserialize the JSON response.
    pub async fn post<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R> {
        let _permit = self.semaphore.acquire().await.context("Semaphore closed")?;

        let url = format!("{}{}", self.config.base_url, path);
        let body = serde_json::to_string(body).context("Failed to serialize request body")?;

        let mut last_error: Option<anyhow::Error> = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = self.config.retry_base_delay * 2u32.pow(attempt - 1);
                debug!(attempt, delay_ms = delay.as_millis() as u64, path, "Retrying request");
                sleep(delay).await;
            }

            let request = self
                .http
                .post(&url)
                .header("X-Application", self.auth.app_key())
                .header("X-Authentication", self.auth.session_token())
                .header("Content-Type", "application/json")
                .body(body.clone());

            match request.send().await {
                Ok(response) => match response.status() {
                    StatusCode::OK => {
                        return response
                            .json::<R>()
                            .await
                            .context("Failed to decode API response");
                    }
                    StatusCode::TOO_MANY_REQUESTS => {
                        warn!(path, "Rate limited by exchange API, backing off");
                        sleep(Duration::from_secs(2)).await;
                        last_error = Some(ApiError::RateLimited.into());
                    }
                    status if status.is_server_error() => {
                        warn!(status = %status, path, "Server error, retrying");
                        last_error = Some(
                            ApiError::Status {
                                status: status.as_u16(),
                                body: response.text().await.unwrap_or_default(),
                            }
                            .into(),
                        );
                    }
                    status => {
                        // Client errors are not retryable.
                        let body = response.text().await.unwrap_or_default();
                        return Err(ApiError::Status {
                            status: status.as_u16(),
                            body,
                        }
                        .into());
                    }
                },
                Err(e) => {
                    warn!(error = %e, attempt, path, "Request failed");
                    last_error = Some(e.into());
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ApiError::RetriesExhausted(path.to_string()).into()))
    }

    /// Check if the API is reachable with the current session.
    pub async fn health_check(&self) -> bool {
        self.post::<_, serde_json::Value>("/keepAlive/", &serde_json::json!({}))
            .await
            .is_ok()
    }
}
