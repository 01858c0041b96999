//! Product route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use crate::catalog::Product;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// List all products.
///
/// GET /api/products
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = state.catalog().products().await?;
    Ok(Json(products.as_ref().clone()))
}

/// Show a single product.
///
/// GET /api/products/{id}
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Product>> {
    state
        .catalog()
        .product(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
}
