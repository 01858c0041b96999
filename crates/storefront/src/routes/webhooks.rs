//! Paystack webhook receiver.
//!
//! Used for reconciliation only: events are authenticated and logged, never
//! turned into orders.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::paystack::{WebhookEvent, verify_signature};
use crate::state::AppState;

/// Header carrying the hex HMAC-SHA512 of the body.
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Receive a Paystack event.
///
/// POST /api/webhooks/paystack
#[instrument(skip_all)]
pub async fn paystack(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !verify_signature(state.paystack().secret_key(), &body, signature) {
        tracing::warn!("Rejected Paystack webhook with invalid signature");
        return Err(AppError::Unauthorized("Invalid signature".to_string()));
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {e}")))?;

    match event.charge() {
        Some(Ok(charge)) => {
            let reference = charge.reference.as_str();
            match state.db().orders().get_by_reference(reference).await? {
                Some(order) => {
                    tracing::info!(order_id = %order.id, reference = %reference, "Charge matches order");
                }
                None => {
                    tracing::error!(
                        reference = %reference,
                        amount_kobo = charge.amount,
                        currency = %charge.currency,
                        "Successful charge has no persisted order"
                    );
                }
            }
        }
        Some(Err(e)) => {
            tracing::warn!(error = %e, "Could not decode charge.success data");
        }
        None => {
            tracing::debug!(event = %event.event, "Ignoring Paystack event");
        }
    }

    Ok(Json(json!({ "received": true })))
}
