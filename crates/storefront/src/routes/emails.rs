//! Transactional email triggers.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use adire_core::{Email, OrderId};

use super::FormReply;
use crate::error::{AppError, FormError};
use crate::middleware::FormJson;
use crate::services::email::{EmailClient, EmailDeliveryError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OrderConfirmationRequest {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct WelcomeRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
}

fn client(state: &AppState) -> Result<&EmailClient, FormError> {
    Ok(state.email().ok_or(EmailDeliveryError::NotConfigured)?)
}

/// Re-send the confirmation for an order.
///
/// POST /api/emails/order-confirmation
///
/// The email must match the order's customer email (case-insensitive);
/// otherwise the order is reported as not found.
#[instrument(skip_all, fields(order_id = %req.order_id))]
pub async fn order_confirmation(
    State(state): State<AppState>,
    FormJson(req): FormJson<OrderConfirmationRequest>,
) -> Result<Json<FormReply>, FormError> {
    let order_id: OrderId = req
        .order_id
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid order id".to_string()))?;
    let email = Email::parse(&req.email)
        .map_err(|_| AppError::BadRequest("Please enter a valid email address".to_string()))?;

    let order = state
        .db()
        .orders()
        .get(order_id)
        .await?
        .filter(|order| order.customer_email == email)
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

    client(&state)?.send_order_confirmation(&order).await?;
    Ok(Json(FormReply::ok("Order confirmation sent")))
}

/// Send a welcome email.
///
/// POST /api/emails/welcome
#[instrument(skip_all)]
pub async fn welcome(
    State(state): State<AppState>,
    FormJson(req): FormJson<WelcomeRequest>,
) -> Result<Json<FormReply>, FormError> {
    let email = Email::parse(&req.email)
        .map_err(|_| AppError::BadRequest("Please enter a valid email address".to_string()))?;

    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()).into());
    }

    client(&state)?.send_welcome(&email, Some(name)).await?;
    Ok(Json(FormReply::ok("Welcome email sent")))
}
