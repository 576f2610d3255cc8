//! HTTP transport for the shift API, with retry tuned to clock semantics.
//!
//! Requests declare whether repeating them is safe. Perimeter and shift
//! lookups (and the idempotent reset) retry through server errors with
//! exponential backoff. Clock submissions do not: a 5xx may have landed
//! after the shift row was written, and replaying a clock action is the
//! offline queue's job, where the idempotency key guards against doubles.
//! A mutating request is only re-sent when the connection never opened.

use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use shiftfence_domain::ShiftFenceError;
use tracing::debug;

use crate::errors::InfraError;

/// Whether a request can be repeated without risking a duplicate
/// server-side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Idempotency {
    /// Lookups and the reset endpoint. Retried on server errors, timeouts,
    /// and connection failures.
    Safe,
    /// Clock-in and clock-out submissions. Only retried when the connection
    /// was never established.
    Mutating,
}

enum Verdict {
    Done(Response),
    Retry,
    Fail(reqwest::Error),
}

/// Thin wrapper over reqwest carrying the retry policy.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Send a request, re-attempting per the declared idempotency.
    pub async fn send(
        &self,
        builder: RequestBuilder,
        idempotency: Idempotency,
    ) -> Result<Response, ShiftFenceError> {
        let mut remaining = self.max_attempts.max(1);

        loop {
            remaining -= 1;

            let request = builder
                .try_clone()
                .ok_or_else(|| {
                    ShiftFenceError::Internal(
                        "request body cannot be cloned; buffer the body to enable retries".into(),
                    )
                })?
                .build()
                .map_err(|err| ShiftFenceError::from(InfraError::from(err)))?;

            let method = request.method().clone();
            let url = request.url().clone();

            let verdict = match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(%method, %url, %status, remaining, "shift API response");
                    if status.is_server_error()
                        && remaining > 0
                        && idempotency == Idempotency::Safe
                    {
                        Verdict::Retry
                    } else {
                        Verdict::Done(response)
                    }
                }
                Err(err) => {
                    debug!(%method, %url, error = %err, remaining, "shift API request failed");
                    if remaining > 0 && retry_transport_error(&err, idempotency) {
                        Verdict::Retry
                    } else {
                        Verdict::Fail(err)
                    }
                }
            };

            match verdict {
                Verdict::Done(response) => return Ok(response),
                Verdict::Fail(err) => return Err(ShiftFenceError::from(InfraError::from(err))),
                Verdict::Retry => {
                    let retry_number = self.max_attempts.max(1) - remaining;
                    self.sleep_with_backoff(retry_number).await;
                }
            }
        }
    }

    fn backoff_delay(&self, retry_number: usize) -> Duration {
        let shift = retry_number.saturating_sub(1).min(8) as u32;
        self.base_backoff.saturating_mul(1u32 << shift)
    }

    async fn sleep_with_backoff(&self, retry_number: usize) {
        let delay = self.backoff_delay(retry_number);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

fn retry_transport_error(err: &reqwest::Error, idempotency: Idempotency) -> bool {
    match idempotency {
        Idempotency::Safe => err.is_timeout() || err.is_connect(),
        // The request may have reached the server before a timeout fired,
        // so only a failed connection is provably un-sent.
        Idempotency::Mutating => err.is_connect(),
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn build(self) -> Result<HttpClient, ShiftFenceError> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .no_proxy()
            .build()
            .map_err(|err| ShiftFenceError::from(InfraError::from(err)))?;

        Ok(HttpClient {
            client,
            max_attempts: self.max_attempts,
            base_backoff: self.base_backoff,
        })
    }
}
