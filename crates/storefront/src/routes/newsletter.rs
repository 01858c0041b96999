//! Newsletter subscription route.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use super::FormReply;
use crate::error::FormError;
use crate::middleware::FormJson;
use crate::services::newsletter;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: String,
    pub source: Option<String>,
}

/// Subscribe to the newsletter.
///
/// POST /api/newsletter
///
/// 200 on success, 400 for an invalid address, 409 if already subscribed.
#[instrument(skip_all)]
pub async fn subscribe(
    State(state): State<AppState>,
    FormJson(req): FormJson<SubscribeRequest>,
) -> Result<Json<FormReply>, FormError> {
    newsletter::subscribe(state.db(), state.email(), &req.email, req.source.as_deref()).await?;
    Ok(Json(FormReply::ok("Thanks for subscribing!")))
}
