//! In-memory store used when no database URL is configured.
//!
//! Each collection sits behind its own `RwLock`. Uniqueness checks and the
//! insert they guard happen under one write lock, so concurrent requests can
//! never create duplicates.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;

use adire_core::Order;

use super::RepositoryError;
use crate::models::{NewsletterSubscriber, User};

/// A user together with the password hash that never leaves the store layer.
#[derive(Debug, Clone)]
pub(crate) struct StoredUser {
    pub(crate) user: User,
    pub(crate) password_hash: String,
}

/// Process-local collections.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    pub(crate) orders: RwLock<Vec<Order>>,
    pub(crate) subscribers: RwLock<Vec<NewsletterSubscriber>>,
    pub(crate) users: RwLock<Vec<StoredUser>>,
    read_only: AtomicBool,
}

impl MemoryDatabase {
    /// Number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Number of stored newsletter subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Reject every write until cleared. Reads keep working.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    pub(crate) fn ensure_writable(&self) -> Result<(), RepositoryError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "in-memory store is read-only".to_owned(),
            ));
        }
        Ok(())
    }
}
