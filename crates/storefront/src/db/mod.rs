//! Document store for storefront data.
//!
//! # Backends
//!
//! - `PostgreSQL` (`Database::Postgres`) when a database URL is configured
//! - In-process memory (`Database::Memory`) otherwise, for local development
//!   and tests; contents are lost on restart
//!
//! ## Tables (`storefront` schema)
//!
//! - `customer_order` - One row per verified payment (unique `payment_reference`)
//! - `newsletter_subscriber` - Newsletter sign-ups (unique `email`)
//! - `user_profile` - Customer accounts with argon2 password hashes
//!
//! Sessions live in `tower_sessions.session`, managed by the session store.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p adire-cli -- migrate
//! ```

pub mod memory;
pub mod orders;
pub mod subscribers;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use memory::MemoryDatabase;
pub use orders::{OrderInsert, OrderRepository};
pub use subscribers::SubscriberRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The store is not accepting writes.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict`.
    pub(crate) fn from_insert(error: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = error
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict.to_owned());
        }
        Self::Database(error)
    }
}

/// Handle to whichever store backs this process.
#[derive(Clone)]
pub enum Database {
    Postgres(PgPool),
    Memory(Arc<MemoryDatabase>),
}

impl Database {
    /// An empty in-memory store.
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(Arc::new(MemoryDatabase::default()))
    }

    /// Order repository.
    #[must_use]
    pub const fn orders(&self) -> OrderRepository<'_> {
        OrderRepository::new(self)
    }

    /// Newsletter subscriber repository.
    #[must_use]
    pub const fn subscribers(&self) -> SubscriberRepository<'_> {
        SubscriberRepository::new(self)
    }

    /// User profile repository.
    #[must_use]
    pub const fn users(&self) -> UserRepository<'_> {
        UserRepository::new(self)
    }

    /// Check that the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if `PostgreSQL` does not answer.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        match self {
            Self::Postgres(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
                Ok(())
            }
            Self::Memory(_) => Ok(()),
        }
    }

    /// Backend name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
