//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! adire-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! Migration files live in `crates/storefront/migrations/`. The session table
//! is owned by `tower-sessions-sqlx-store` and created by its own migration.

use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, connect};

/// Run storefront migrations and create the session table.
pub async fn storefront() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Creating session store table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
