//! Contact form route.

use axum::{Json, extract::State};
use tracing::instrument;

use adire_core::{ContactForm, ContactMessage};

use super::FormReply;
use crate::error::{AppError, FormError};
use crate::middleware::FormJson;
use crate::services::email::EmailDeliveryError;
use crate::state::AppState;

/// Validate a contact message and forward it to the store inbox.
///
/// POST /api/contact
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    FormJson(form): FormJson<ContactForm>,
) -> Result<Json<FormReply>, FormError> {
    let message =
        ContactMessage::validate(form).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let email = state.email().ok_or(EmailDeliveryError::NotConfigured)?;
    email.forward_contact(&message).await?;

    tracing::info!("Contact message forwarded");
    Ok(Json(FormReply::ok(
        "Thanks for reaching out. We will get back to you soon.",
    )))
}
