//! Payment authorization, capture and release against Stripe PaymentIntents.
//!
//! Bookings are paid with manual-capture intents: the guest's card is held at
//! creation, captured when the cast accepts and released on cancellation.
//! A capture whose booking update then loses a race is refunded.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::PaymentConfig;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("failed to build payment client: {0}")]
    Config(String),
    #[error("payment gateway unreachable: {0}")]
    Network(String),
    #[error("payment gateway returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("unexpected payment gateway response: {0}")]
    Decode(String),
}

/// A hold to place on the guest's card for one booking.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub booking_id: Uuid,
    pub guest_id: Uuid,
    pub cast_id: Uuid,
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Refund {
    pub id: String,
    pub status: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Place a manual-capture hold. Keyed on the booking id so retries are safe.
    async fn authorize(&self, request: AuthorizationRequest) -> Result<PaymentIntent, PaymentError>;

    async fn capture(&self, intent_id: &str, booking_id: Uuid) -> Result<PaymentIntent, PaymentError>;

    /// Release an uncaptured hold.
    async fn cancel(&self, intent_id: &str, booking_id: Uuid) -> Result<PaymentIntent, PaymentError>;

    /// Return a captured payment in full.
    async fn refund(&self, intent_id: &str, booking_id: Uuid) -> Result<Refund, PaymentError>;
}

/// Upper bound on one gateway call: every attempt timing out plus every backoff sleep.
pub fn worst_case_call_time(config: &PaymentConfig) -> Duration {
    let attempts = config.max_retries.saturating_add(1);
    (1..attempts).fold(config.timeout.saturating_mul(attempts), |total, attempt| {
        total.saturating_add(backoff_delay(attempt))
    })
}

/// Minor currency units; Stripe takes integer cents.
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
    code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl StripeGateway {
    pub fn new(config: &PaymentConfig) -> Result<Self, PaymentError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.secret_key))
                .map_err(|e| PaymentError::Config(format!("invalid secret key: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: STRIPE_API_BASE.to_string(),
            max_retries: config.max_retries,
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, String)],
        idempotency_key: &str,
    ) -> Result<T, PaymentError> {
        let url = format!("{}{path}", self.base_url);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                warn!(attempt, delay_ms = delay.as_millis() as u64, path, "retrying payment request");
                tokio::time::sleep(delay).await;
            }

            let response = match self
                .client
                .post(&url)
                .header("Idempotency-Key", idempotency_key)
                .form(form)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!(error = %e, path, "payment request failed to send");
                    last_error = Some(PaymentError::Network(e.to_string()));
                    continue;
                }
            };

            let status = response.status();
            debug!(status = %status, attempt, path, "payment gateway responded");

            if status.is_success() {
                return response
                    .json::<T>()
                    .await
                    .map_err(|e| PaymentError::Decode(e.to_string()));
            }

            let body = response.text().await.unwrap_or_default();
            let error = PaymentError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            };

            if is_transient_error(status) {
                warn!(status = %status, path, "transient payment gateway error");
                last_error = Some(error);
                continue;
            }
            return Err(error);
        }

        Err(last_error.unwrap_or_else(|| PaymentError::Network("retries exhausted".into())))
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn authorize(&self, request: AuthorizationRequest) -> Result<PaymentIntent, PaymentError> {
        let form = [
            ("amount", to_minor_units(request.amount).to_string()),
            ("currency", request.currency.clone()),
            ("capture_method", "manual".to_string()),
            ("metadata[booking_id]", request.booking_id.to_string()),
            ("metadata[guest_id]", request.guest_id.to_string()),
            ("metadata[cast_id]", request.cast_id.to_string()),
        ];
        let key = format!("booking-{}-authorize", request.booking_id);
        self.post_form("/payment_intents", &form, &key).await
    }

    async fn capture(&self, intent_id: &str, booking_id: Uuid) -> Result<PaymentIntent, PaymentError> {
        let key = format!("booking-{booking_id}-capture");
        self.post_form(&format!("/payment_intents/{intent_id}/capture"), &[], &key)
            .await
    }

    async fn cancel(&self, intent_id: &str, booking_id: Uuid) -> Result<PaymentIntent, PaymentError> {
        let key = format!("booking-{booking_id}-cancel");
        self.post_form(&format!("/payment_intents/{intent_id}/cancel"), &[], &key)
            .await
    }

    async fn refund(&self, intent_id: &str, booking_id: Uuid) -> Result<Refund, PaymentError> {
        let key = format!("booking-{booking_id}-refund");
        let form = [("payment_intent", intent_id.to_string())];
        self.post_form("/refunds", &form, &key).await
    }
}

/// 200ms, 400ms, 800ms, ... capped at 5s.
fn backoff_delay(attempt: u32) -> Duration {
    let millis = 200u64.saturating_mul(1 << attempt.saturating_sub(1).min(5));
    Duration::from_millis(millis.min(5_000))
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    status.as_u16() == 429 || status.is_server_error()
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<StripeErrorBody>(body) {
        Ok(parsed) => match (parsed.error.code, parsed.error.message) {
            (Some(code), Some(message)) => format!("{code}: {message}"),
            (None, Some(message)) => message,
            (Some(code), None) => code,
            (None, None) => body.to_string(),
        },
        Err(_) => body.to_string(),
    }
}
