use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha1::Sha1;

use super::BookingResponse;
use crate::errors::AppError;
use crate::models::BookingEventKind;
use crate::services::{events, lifecycle, notify};
use crate::state::AppState;

pub const SIGNATURE_HEADER: &str = "x-payment-signature";

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentOutcome {
    Captured,
    Failed,
}

#[derive(Deserialize)]
pub struct PaymentCallback {
    #[serde(alias = "bookingId")]
    pub booking_id: String,
    #[serde(alias = "paymentId")]
    pub payment_id: Option<String>,
    pub outcome: PaymentOutcome,
}

/// base64(HMAC-SHA1(secret, body)).
pub fn sign_payload(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = Hmac::<Sha1>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

fn validate_signature(secret: &str, signature: &str, body: &[u8]) -> bool {
    let Ok(raw) = base64::engine::general_purpose::STANDARD.decode(signature) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha1>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&raw).is_ok()
}

// POST /api/payments/callback
pub async fn payment_callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<BookingResponse>, AppError> {
    // Signature check is skipped when no secret is configured (dev mode).
    let secret = &state.config.payment_webhook_secret;
    if !secret.is_empty() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if signature.is_empty() {
            tracing::warn!("missing X-Payment-Signature header");
            return Err(AppError::Forbidden("missing signature".to_string()));
        }
        if !validate_signature(secret, signature, &body) {
            tracing::warn!("invalid payment callback signature");
            return Err(AppError::Forbidden("invalid signature".to_string()));
        }
    }

    let callback: PaymentCallback = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("invalid callback body: {e}")))?;

    tracing::info!(
        booking_id = %callback.booking_id,
        outcome = ?callback.outcome,
        "payment callback"
    );

    let result = {
        let db = state.db()?;
        match callback.outcome {
            PaymentOutcome::Captured => {
                lifecycle::confirm_payment(&db, &callback.booking_id, callback.payment_id.as_deref())?
            }
            PaymentOutcome::Failed => lifecycle::fail_payment(&db, &callback.booking_id)?,
        }
    };

    if result.changed {
        events::publish(&state.events_tx, BookingEventKind::StatusChanged, &result.booking);
        if callback.outcome == PaymentOutcome::Captured {
            notify::send_confirmation(state.notifier.as_ref(), &result.booking).await;
        }
    }

    Ok(Json(result.booking.into()))
}
