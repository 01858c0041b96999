//! Session middleware configuration and session-state helpers.
//!
//! Sessions are stored in `PostgreSQL` when the store is, and in process
//! memory otherwise. The cart and checkout progress live in the session.

use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use adire_core::{Cart, CheckoutSession};

use crate::config::StorefrontConfig;
use crate::models::session_keys;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "adire_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with a `PostgreSQL` store.
#[must_use]
pub fn postgres_session_layer(
    pool: &sqlx::PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    // The sessions table is created by `adire-cli migrate`
    configure(PostgresStore::new(pool.clone()), config)
}

/// Create the session layer with an in-process store.
#[must_use]
pub fn memory_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MemoryStore> {
    configure(MemoryStore::default(), config)
}

fn configure<S: SessionStore>(store: S, config: &StorefrontConfig) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Load the visitor's cart, empty if none.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_cart(session: &Session) -> Result<Cart, tower_sessions::session::Error> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Store the visitor's cart.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_cart(
    session: &Session,
    cart: &Cart,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}

/// Load checkout progress, fresh if none.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_checkout(
    session: &Session,
) -> Result<CheckoutSession, tower_sessions::session::Error> {
    Ok(session
        .get::<CheckoutSession>(session_keys::CHECKOUT)
        .await?
        .unwrap_or_default())
}

/// Store checkout progress.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_checkout(
    session: &Session,
    checkout: &CheckoutSession,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CHECKOUT, checkout).await
}
