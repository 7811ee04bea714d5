use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde_json::json;

use crate::config::AppConfig;
use crate::db::bookings as booking_db;
use crate::error::{AppError, AppResult};
use crate::services::webhook::{WebhookDeduper, WebhookEvent, verify_signature};

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// POST /api/stripe/webhook
///
/// Verifies the delivery signature and records PaymentIntent outcomes in the
/// log. Booking state is driven by the lifecycle endpoints, not by events.
pub async fn stripe_webhook(
    req: HttpRequest,
    payload: web::Bytes,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    deduper: web::Data<WebhookDeduper>,
) -> AppResult<HttpResponse> {
    let secret = config
        .payments
        .webhook_secret
        .as_deref()
        .ok_or_else(|| AppError::upstream("Webhook not configured", "STRIPE_WEBHOOK_SECRET unset"))?;

    // 1. Authenticate the delivery.
    let header = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::validation("Missing signature"))?;
    verify_signature(&payload, header, secret, Utc::now().timestamp()).map_err(|e| {
        tracing::warn!(error = %e, "rejected webhook delivery");
        AppError::validation("Invalid signature")
    })?;

    let event: WebhookEvent = serde_json::from_slice(&payload)
        .map_err(|_| AppError::validation("Invalid webhook payload"))?;

    // 2. Redeliveries are acknowledged without processing.
    if !deduper.first_delivery(&event.id).await {
        tracing::debug!(event_id = %event.id, "duplicate webhook delivery");
        return Ok(HttpResponse::Ok().json(json!({ "received": true })));
    }

    // 3. Log payment outcomes against their booking.
    match (event.event_type.as_str(), event.payment_intent_id()) {
        ("payment_intent.succeeded" | "payment_intent.payment_failed", Some(intent_id)) => {
            let booking = booking_db::get_booking_by_payment_intent(db.get_ref(), intent_id).await?;
            let booking_id = booking.map(|b| b.id.to_string());
            if event.event_type == "payment_intent.succeeded" {
                tracing::info!(event_id = %event.id, intent_id, booking_id = ?booking_id, "payment succeeded");
            } else {
                tracing::warn!(event_id = %event.id, intent_id, booking_id = ?booking_id, "payment failed");
            }
        }
        (event_type, _) => {
            tracing::debug!(event_id = %event.id, event_type, "ignored webhook event");
        }
    }

    Ok(HttpResponse::Ok().json(json!({ "received": true })))
}
