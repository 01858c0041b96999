//! Cart route handlers.
//!
//! The cart lives in the visitor's session. Prices, names and images are
//! always taken from the catalog, never from the request.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use adire_core::{Cart, CartLine, Naira};

use crate::error::{AppError, Result};
use crate::middleware::{ApiJson, load_cart, save_cart};
use crate::state::AppState;

/// Cart as returned to the client.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub total: Naira,
    pub item_count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart.lines().to_vec(),
            total: cart.total(),
            item_count: cart.item_count(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: String,
    pub quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct LineRequest {
    pub id: String,
}

/// Show the cart.
///
/// GET /api/cart
pub async fn show(session: Session) -> Result<Json<CartView>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Add a catalog product to the cart.
///
/// POST /api/cart/add
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    ApiJson(req): ApiJson<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let product = state
        .catalog()
        .product(&req.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    let mut cart = load_cart(&session).await?;
    cart.add(CartLine {
        image: product.primary_image().map(str::to_string),
        id: product.id,
        name: product.name,
        price: product.price,
        quantity: req.quantity.unwrap_or(1),
    });
    save_cart(&session, &cart).await?;

    tracing::debug!(item_count = cart.item_count(), "Added to cart");
    Ok(Json(CartView::from(&cart)))
}

/// Increase a line's quantity by one.
///
/// POST /api/cart/increment
pub async fn increment(session: Session, ApiJson(req): ApiJson<LineRequest>) -> Result<Json<CartView>> {
    update(&session, |cart| cart.increment(&req.id)).await
}

/// Decrease a line's quantity by one (never below one).
///
/// POST /api/cart/decrement
pub async fn decrement(session: Session, ApiJson(req): ApiJson<LineRequest>) -> Result<Json<CartView>> {
    update(&session, |cart| cart.decrement(&req.id)).await
}

/// Remove a line.
///
/// POST /api/cart/remove
pub async fn remove(session: Session, ApiJson(req): ApiJson<LineRequest>) -> Result<Json<CartView>> {
    update(&session, |cart| cart.remove(&req.id)).await
}

/// Empty the cart.
///
/// POST /api/cart/clear
pub async fn clear(session: Session) -> Result<Json<CartView>> {
    update(&session, Cart::clear).await
}

async fn update(session: &Session, apply: impl FnOnce(&mut Cart)) -> Result<Json<CartView>> {
    let mut cart = load_cart(session).await?;
    apply(&mut cart);
    save_cart(session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}
