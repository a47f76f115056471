use axum::{body::Bytes, extract::State, http::HeaderMap, response::IntoResponse, Json};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::dtos::responses::WebhookAck;
use crate::error::AppError;
use crate::state::AppState;

/// Maximum age of a signed webhook, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Deserialize)]
struct StripeEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Deserialize)]
struct StripeEventData {
    object: StripeEventObject,
}

#[derive(Deserialize)]
struct StripeEventObject {
    id: String,
    payment_intent: Option<String>,
}

/// Checks a `Stripe-Signature` header (`t=<unix>,v1=<hex>[,v1=...]`) against the raw body.
pub fn verify_signature(secret: &str, header: &str, payload: &[u8], now_unix: i64) -> bool {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", t)) => timestamp = t.parse::<i64>().ok(),
            Some(("v1", sig)) => signatures.push(sig),
            _ => {}
        }
    }

    let Some(timestamp) = timestamp else {
        return false;
    };
    if (now_unix - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return false;
    }

    signatures.iter().any(|sig| {
        let Ok(expected) = hex::decode(sig) else {
            return false;
        };
        let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.verify_slice(&expected).is_ok()
    })
}

pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    if let Some(secret) = state.config.stripe_webhook_secret.as_deref() {
        let header = headers.get("Stripe-Signature")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::BadRequest("Missing Stripe-Signature header".into()))?;
        if !verify_signature(secret, header, &body, Utc::now().timestamp()) {
            warn!("Rejected webhook with invalid signature");
            return Err(AppError::BadRequest("Invalid webhook signature".into()));
        }
    }

    let event: StripeEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Malformed webhook payload: {}", e)))?;

    let (payment_intent_id, checkout_session_id) = match event.event_type.as_str() {
        "payment_intent.succeeded" => (Some(event.data.object.id), None),
        "checkout.session.completed" => {
            let session_id = event.data.object.id;
            let payment_intent_id = match event.data.object.payment_intent {
                Some(id) => Some(id),
                None => state.payment_provider.retrieve_checkout_session(&session_id).await?.payment_intent_id,
            };
            (payment_intent_id, Some(session_id))
        }
        other => {
            debug!(event_type = other, "Ignoring webhook event");
            return Ok(Json(WebhookAck { received: true, handled: false }));
        }
    };

    let Some(payment_intent_id) = payment_intent_id else {
        warn!(event_type = %event.event_type, "Webhook carried no payment intent");
        return Ok(Json(WebhookAck { received: true, handled: false }));
    };

    let outcome = state.payment_service
        .process_payment_success(&payment_intent_id, checkout_session_id.as_deref())
        .await?;
    info!(payment_id = %outcome.payment.id, booking_id = %outcome.booking.id, "Webhook processed");

    Ok(Json(WebhookAck { received: true, handled: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, t: i64, payload: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{}.{}", t, payload).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_a_fresh_valid_signature() {
        let payload = r#"{"type":"payment_intent.succeeded"}"#;
        let header = format!("t=1000,v1={}", sign("whsec", 1000, payload));
        assert!(verify_signature("whsec", &header, payload.as_bytes(), 1100));
    }

    #[test]
    fn rejects_wrong_secret_and_stale_timestamp() {
        let payload = "{}";
        let header = format!("t=1000,v1={}", sign("other", 1000, payload));
        assert!(!verify_signature("whsec", &header, payload.as_bytes(), 1000));

        let header = format!("t=1000,v1={}", sign("whsec", 1000, payload));
        assert!(!verify_signature("whsec", &header, payload.as_bytes(), 1000 + SIGNATURE_TOLERANCE_SECS + 1));
    }

    #[test]
    fn any_matching_v1_entry_is_enough() {
        let payload = "{}";
        let header = format!("t=5,v1=deadbeef,v1={}", sign("whsec", 5, payload));
        assert!(verify_signature("whsec", &header, payload.as_bytes(), 5));
    }
}
