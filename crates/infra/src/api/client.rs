//! HTTP implementation of the `ShiftApi` port.
//!
//! Talks to the collaborator endpoints the geofence core consumes:
//! perimeter settings, clock-in/out, the idempotent shift reset, and the
//! active-shift lookup. Conflict responses ("already have an active shift")
//! are decoded into the typed domain error so the core can drive the
//! reset-retry protocol.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use shiftfence_core::{ResetOutcome, ShiftApi};
use shiftfence_domain::constants::AUTO_CLOCK_OUT_NOTE;
use shiftfence_domain::{ClockPayload, Perimeter, Result, Shift, ShiftFenceError};
use tracing::{debug, instrument, warn};

use crate::http::{HttpClient, Idempotency};

/// Configuration for the shift API client.
#[derive(Debug, Clone)]
pub struct ShiftApiConfig {
    /// Base URL of the collaborator API (e.g. "http://localhost:3000/api").
    pub base_url: String,
    /// Timeout for API requests.
    pub timeout: Duration,
    /// Total attempts (initial try + retries) for transient failures.
    pub max_attempts: usize,
}

impl Default for ShiftApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            timeout: Duration::from_secs(30),
            max_attempts: 3,
        }
    }
}

/// Wire shape of a clock request body.
#[derive(Debug, Serialize)]
struct ClockBody<'a> {
    latitude: f64,
    longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
}

impl<'a> ClockBody<'a> {
    fn from_payload(payload: &'a ClockPayload) -> Self {
        Self {
            latitude: payload.coordinate.latitude,
            longitude: payload.coordinate.longitude,
            note: payload.note.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ShiftResponse {
    shift: Shift,
}

#[derive(Debug, Deserialize)]
struct ResetResponse {
    success: bool,
    #[serde(default)]
    shift: Option<Shift>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default, rename = "existingShift")]
    existing_shift: Option<Shift>,
}

/// HTTP-backed [`ShiftApi`] implementation.
pub struct ShiftApiClient {
    http: HttpClient,
    config: ShiftApiConfig,
}

impl ShiftApiClient {
    pub fn new(config: ShiftApiConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .max_attempts(config.max_attempts)
            .build()?;
        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn check(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or(ErrorBody {
            message: body.clone(),
            existing_shift: None,
        });

        warn!(%status, message = %parsed.message, "shift API returned an error");
        Err(classify_error(status, parsed))
    }
}

fn classify_error(status: StatusCode, body: ErrorBody) -> ShiftFenceError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ShiftFenceError::Auth(body.message)
        }
        StatusCode::NOT_FOUND => ShiftFenceError::NotFound(body.message),
        StatusCode::BAD_REQUEST => {
            let message = body.message;
            if message.contains("already have an active shift") {
                ShiftFenceError::Conflict { message, existing_shift: body.existing_shift }
            } else if message.contains("outside the designated area") {
                ShiftFenceError::PerimeterViolation(message)
            } else if message.contains("No active shift") {
                ShiftFenceError::NotFound(message)
            } else {
                ShiftFenceError::InvalidInput(message)
            }
        }
        status if status.is_server_error() => {
            ShiftFenceError::Network(format!("server error {status}: {}", body.message))
        }
        status => ShiftFenceError::Internal(format!("unexpected status {status}: {}", body.message)),
    }
}

#[async_trait]
impl ShiftApi for ShiftApiClient {
    #[instrument(skip(self))]
    async fn fetch_perimeter(&self) -> Result<Option<Perimeter>> {
        let request = self.http.request(Method::GET, self.url("/settings/perimeter"));
        let response = self.check(self.http.send(request, Idempotency::Safe).await?).await?;

        let perimeter: Option<Perimeter> = response
            .json()
            .await
            .map_err(|e| ShiftFenceError::Internal(format!("perimeter decode: {e}")))?;
        debug!(configured = perimeter.is_some(), "fetched perimeter settings");
        Ok(perimeter)
    }

    #[instrument(skip(self, payload))]
    async fn clock_in(&self, payload: &ClockPayload) -> Result<Shift> {
        let request = self
            .http
            .request(Method::POST, self.url("/shifts/clockin"))
            .json(&ClockBody::from_payload(payload));
        let response = self.check(self.http.send(request, Idempotency::Mutating).await?).await?;

        let body: ShiftResponse = response
            .json()
            .await
            .map_err(|e| ShiftFenceError::Internal(format!("clock-in decode: {e}")))?;
        Ok(body.shift)
    }

    #[instrument(skip(self, payload))]
    async fn clock_out(&self, payload: &ClockPayload) -> Result<Shift> {
        let request = self
            .http
            .request(Method::POST, self.url("/shifts/clockout"))
            .json(&ClockBody::from_payload(payload));
        let response = self.check(self.http.send(request, Idempotency::Mutating).await?).await?;

        let body: ShiftResponse = response
            .json()
            .await
            .map_err(|e| ShiftFenceError::Internal(format!("clock-out decode: {e}")))?;
        Ok(body.shift)
    }

    #[instrument(skip(self))]
    async fn reset_shift(&self) -> Result<ResetOutcome> {
        // The note lands on the force-closed shift's clock-out record.
        let request = self
            .http
            .request(Method::POST, self.url("/shifts/reset"))
            .json(&serde_json::json!({ "note": AUTO_CLOCK_OUT_NOTE }));
        let response = self.check(self.http.send(request, Idempotency::Safe).await?).await?;

        let body: ResetResponse = response
            .json()
            .await
            .map_err(|e| ShiftFenceError::Internal(format!("reset decode: {e}")))?;
        Ok(ResetOutcome { closed: body.success.then_some(body.shift).flatten() })
    }

    #[instrument(skip(self))]
    async fn active_shift(&self) -> Result<Option<Shift>> {
        let request = self.http.request(Method::GET, self.url("/shifts/active"));
        let response = self.check(self.http.send(request, Idempotency::Safe).await?).await?;

        response
            .json()
            .await
            .map_err(|e| ShiftFenceError::Internal(format!("active shift decode: {e}")))
    }
}
