//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! # Catalog
//! GET  /api/products                    - Product listing
//! GET  /api/products/{id}               - Product detail
//!
//! # Cart (session)
//! GET  /api/cart                        - Cart view
//! POST /api/cart/add                    - Add a product
//! POST /api/cart/increment              - Quantity +1
//! POST /api/cart/decrement              - Quantity -1 (never below 1)
//! POST /api/cart/remove                 - Remove a line
//! POST /api/cart/clear                  - Empty the cart
//!
//! # Checkout
//! GET  /api/shipping?type=              - Shipping table rows
//! GET  /api/checkout                    - Checkout summary
//! PUT  /api/checkout                    - Save checkout details
//! POST /api/checkout/payment            - Start payment (widget config)
//! POST /api/checkout/callback           - Widget success callback
//! POST /api/checkout/cancel             - Widget closed
//!
//! # Forms
//! POST /api/newsletter                  - Newsletter sign-up
//! POST /api/contact                     - Contact form
//! POST /api/emails/order-confirmation   - Re-send order confirmation
//! POST /api/emails/welcome              - Welcome email
//!
//! # Auth
//! POST /api/auth/register               - Create account and sign in
//! POST /api/auth/login                  - Sign in
//! POST /api/auth/logout                 - Sign out
//! GET  /api/auth/session                - Current user
//!
//! # Admin (ADMIN_EMAILS only)
//! GET  /api/admin/orders                - Orders, newest first
//!
//! # Webhooks (not rate limited)
//! POST /api/webhooks/paystack           - Paystack events
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod contact;
pub mod emails;
pub mod newsletter;
pub mod products;
pub mod shipping;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Serialize;

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Body of a successful form submission.
#[derive(Debug, Serialize)]
pub struct FormReply {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FormReply {
    /// A successful reply with a message for the visitor.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/increment", post(cart::increment))
        .route("/decrement", post(cart::decrement))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).put(checkout::update))
        .route("/payment", post(checkout::start_payment))
        .route("/callback", post(checkout::callback))
        .route("/cancel", post(checkout::cancel))
}

/// Create the transactional email routes router.
pub fn email_routes() -> Router<AppState> {
    Router::new()
        .route("/order-confirmation", post(emails::order_confirmation))
        .route("/welcome", post(emails::welcome))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::session))
}

/// Create all API routes for the storefront.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/shipping", get(shipping::index))
        .nest("/checkout", checkout_routes())
        .route("/newsletter", post(newsletter::subscribe))
        .route("/contact", post(contact::submit))
        .nest("/emails", email_routes())
        .route("/admin/orders", get(admin::orders))
        .layer(api_rate_limiter());

    Router::new()
        .nest("/api", api)
        .nest("/api/auth", auth_routes().layer(auth_rate_limiter()))
        .route("/api/webhooks/paystack", post(webhooks::paystack))
}
