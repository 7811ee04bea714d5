//! Verification and de-duplication of inbound Stripe webhook deliveries.

use std::sync::Arc;
use std::time::Duration;

use hmac::{Hmac, Mac};
use moka::future::Cache;
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a signed delivery.
pub const SIGNATURE_TOLERANCE_SECS: u64 = 300;
pub const MAX_PAYLOAD_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("malformed signature header")]
    Malformed,
    #[error("signature timestamp outside tolerance")]
    Stale,
    #[error("no matching signature")]
    Mismatch,
}

/// Hex HMAC-SHA256 of `"{timestamp}.{payload}"`.
pub fn compute_signature(payload: &[u8], timestamp: i64, secret: &str) -> String {
    let mac = signed_mac(payload, timestamp, secret);
    hex::encode(mac.finalize().into_bytes())
}

fn signed_mac(payload: &[u8], timestamp: i64, secret: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac
}

/// Check a `Stripe-Signature` header (`t=<unix>,v1=<hex>[,v1=<hex>...]`).
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now_unix: i64,
) -> Result<(), SignatureError> {
    let mut timestamp = None;
    let mut candidates = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = Some(value.parse::<i64>().map_err(|_| SignatureError::Malformed)?)
            }
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if candidates.is_empty() {
        return Err(SignatureError::Malformed);
    }
    let skew = now_unix.checked_sub(timestamp).map(i64::unsigned_abs);
    if skew.is_none_or(|secs| secs > SIGNATURE_TOLERANCE_SECS) {
        return Err(SignatureError::Stale);
    }

    let mac = signed_mac(payload, timestamp, secret);
    let matched = candidates.iter().any(|candidate| match hex::decode(candidate) {
        Ok(bytes) => mac.clone().verify_slice(&bytes).is_ok(),
        Err(_) => false,
    });

    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

impl WebhookEvent {
    /// The PaymentIntent id for `payment_intent.*` events.
    pub fn payment_intent_id(&self) -> Option<&str> {
        if !self.event_type.starts_with("payment_intent.") {
            return None;
        }
        self.data.object.get("id").and_then(|v| v.as_str())
    }
}

/// Remembers recently processed event ids so redeliveries are acknowledged
/// without being processed again.
#[derive(Clone)]
pub struct WebhookDeduper {
    seen: Arc<Cache<String, ()>>,
}

impl WebhookDeduper {
    pub fn new(ttl: Duration, capacity: u64) -> Self {
        Self {
            seen: Arc::new(
                Cache::builder()
                    .time_to_live(ttl)
                    .max_capacity(capacity)
                    .build(),
            ),
        }
    }

    /// True the first time `event_id` is seen within the TTL.
    pub async fn first_delivery(&self, event_id: &str) -> bool {
        self.seen
            .entry(event_id.to_string())
            .or_insert(())
            .await
            .is_fresh()
    }
}

impl Default for WebhookDeduper {
    fn default() -> Self {
        Self::new(Duration::from_secs(24 * 3600), 10_000)
    }
}
