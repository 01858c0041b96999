//! Administrative order listing.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use adire_core::Order;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Page size when none is given.
pub const DEFAULT_LIMIT: u32 = 50;
/// Largest page size.
pub const MAX_LIMIT: u32 = 200;

#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ListOrdersQuery {
    fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

#[derive(Debug, Serialize)]
pub struct OrderList {
    pub orders: Vec<Order>,
    pub limit: u32,
    pub offset: u32,
}

/// Orders, newest first.
///
/// GET /api/admin/orders?limit&offset
#[instrument(skip_all, fields(admin = %user.email))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<OrderList>> {
    if !state.config().is_admin(&user.email) {
        return Err(AppError::Forbidden);
    }

    let limit = query.limit();
    let offset = query.offset.unwrap_or(0);
    let orders = state.db().orders().list_recent(limit, offset).await?;

    Ok(Json(OrderList {
        orders,
        limit,
        offset,
    }))
}
