//! Core HTTP operations with rate limiting and retry logic
//!
//! Every request to an FDSN service goes through [`HttpHandler`], which
//! applies the rate limit, backs off on throttling (429) and overload (503),
//! and classifies the final outcome into a typed [`ServiceError`]. FDSN
//! services answer "no data" with 204 (or 404 when `nodata=404`), which is
//! returned as `Ok(None)` rather than an error.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use url::Url;

use crate::errors::{ServiceError, ServiceResult};

use super::config::ClientConfig;

/// HTTP operations handler with resilience patterns
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    rate_limiter: RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>,
    max_retries: u32,
    config: ClientConfig,
}

impl HttpHandler {
    /// Creates a new HttpHandler from a client configuration
    ///
    /// # Errors
    ///
    /// Returns `ServiceError` if the rate limit is zero or the client cannot be built
    pub fn new(config: &ClientConfig) -> ServiceResult<Self> {
        let client = config.build_http_client()?;
        let rate_limiter = Self::build_rate_limiter(config.rate_limit_rps)?;
        Ok(Self {
            client,
            rate_limiter,
            max_retries: config.max_retries,
            config: config.clone(),
        })
    }

    fn build_rate_limiter(
        rate_limit_rps: u32,
    ) -> ServiceResult<RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>> {
        let rps = NonZeroU32::new(rate_limit_rps).ok_or_else(|| ServiceError::QueryFailed {
            status: 0,
            reason: "Rate limit must be non-zero".to_string(),
        })?;
        Ok(RateLimiter::direct(Quota::per_second(rps)))
    }

    /// Fetches a response, retrying throttled, overloaded and unreachable requests
    ///
    /// Returns `Ok(None)` when the service reports that no data matches.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Unavailable` when the service cannot be reached
    /// or keeps answering with a gateway-level status, and
    /// `ServiceError::QueryFailed` for any other unsuccessful status.
    pub async fn get_response(&self, url: &Url) -> ServiceResult<Option<reqwest::Response>> {
        let mut retries = 0;
        loop {
            self.rate_limiter
                .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(100)))
                .await;

            match self.client.get(url.as_str()).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_FOUND {
                        tracing::debug!("No data (HTTP {}) for {}", status.as_u16(), url);
                        return Ok(None);
                    }

                    if status.is_success() {
                        tracing::debug!("Successfully fetched response: {}", url);
                        return Ok(Some(response));
                    }

                    let retryable = status == StatusCode::TOO_MANY_REQUESTS
                        || status == StatusCode::SERVICE_UNAVAILABLE;
                    if retryable && retries < self.max_retries {
                        retries += 1;
                        let delay = self.config.retry_delay(retries);
                        tracing::warn!(
                            "Server answered HTTP {} (attempt {}/{}). Backing off for {}ms",
                            status.as_u16(),
                            retries,
                            self.max_retries,
                            delay.as_millis()
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    let body = response.text().await.unwrap_or_default();
                    let reason = first_line(&body)
                        .map(str::to_string)
                        .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        return Err(ServiceError::Unavailable {
                            reason: format!("still throttled after {} retries", retries),
                        });
                    }
                    return Err(ServiceError::from_status(status.as_u16(), reason));
                }
                Err(e) if retries < self.max_retries && (e.is_connect() || e.is_timeout()) => {
                    retries += 1;
                    let delay = self.config.retry_delay(retries);
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}. Retrying in {}ms",
                        retries,
                        self.max_retries,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!("Request to {} failed after {} retries: {}", url, retries, e);
                    return Err(ServiceError::from_transport(&e));
                }
            }
        }
    }

    /// Fetches a text body, `None` when the service has no data
    pub async fn get_text(&self, url: &Url) -> ServiceResult<Option<String>> {
        match self.get_response(url).await? {
            Some(response) => {
                let text = response
                    .text()
                    .await
                    .map_err(|e| ServiceError::from_transport(&e))?;
                Ok(Some(text))
            }
            None => Ok(None),
        }
    }

    /// Fetches a binary body, `None` when the service has no data
    pub async fn get_bytes(&self, url: &Url) -> ServiceResult<Option<Vec<u8>>> {
        match self.get_response(url).await? {
            Some(response) => {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| ServiceError::from_transport(&e))?;
                Ok(Some(bytes.to_vec()))
            }
            None => Ok(None),
        }
    }
}

/// First non-empty line of an error body, used as the failure reason
fn first_line(body: &str) -> Option<&str> {
    body.lines().map(str::trim).find(|line| !line.is_empty())
}
