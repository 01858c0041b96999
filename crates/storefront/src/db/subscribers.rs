//! Newsletter subscriber repository.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use adire_core::{Email, SubscriberId, SubscriberStatus};

use super::{Database, RepositoryError};
use crate::models::NewsletterSubscriber;

/// Repository for newsletter subscribers.
pub struct SubscriberRepository<'a> {
    db: &'a Database,
}

#[derive(sqlx::FromRow)]
struct SubscriberRow {
    id: Uuid,
    email: String,
    subscribed_at: DateTime<Utc>,
    status: String,
    source: Option<String>,
}

impl TryFrom<SubscriberRow> for NewsletterSubscriber {
    type Error = RepositoryError;

    fn try_from(row: SubscriberRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: SubscriberId::from_uuid(row.id),
            email: Email::parse(&row.email).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
            })?,
            subscribed_at: row.subscribed_at,
            status: row
                .status
                .parse::<SubscriberStatus>()
                .map_err(RepositoryError::DataCorruption)?,
            source: row.source,
        })
    }
}

impl<'a> SubscriberRepository<'a> {
    /// Create a new subscriber repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Find a subscriber by normalized email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<NewsletterSubscriber>, RepositoryError> {
        match self.db {
            Database::Postgres(pool) => sqlx::query_as::<_, SubscriberRow>(
                r"
                SELECT id, email, subscribed_at, status, source
                FROM storefront.newsletter_subscriber
                WHERE email = $1
                ",
            )
            .bind(email.as_str())
            .fetch_optional(pool)
            .await?
            .map(NewsletterSubscriber::try_from)
            .transpose(),
            Database::Memory(mem) => Ok(mem
                .subscribers
                .read()
                .await
                .iter()
                .find(|s| &s.email == email)
                .cloned()),
        }
    }

    /// Add an active subscriber.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already subscribed.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &Email,
        source: Option<&str>,
    ) -> Result<NewsletterSubscriber, RepositoryError> {
        let subscriber = NewsletterSubscriber {
            id: SubscriberId::new(),
            email: email.clone(),
            subscribed_at: Utc::now(),
            status: SubscriberStatus::Active,
            source: source.map(str::to_string),
        };

        match self.db {
            Database::Postgres(pool) => sqlx::query_as::<_, SubscriberRow>(
                r"
                INSERT INTO storefront.newsletter_subscriber (id, email, subscribed_at, status, source)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, email, subscribed_at, status, source
                ",
            )
            .bind(subscriber.id)
            .bind(subscriber.email.as_str())
            .bind(subscriber.subscribed_at)
            .bind(subscriber.status.as_str())
            .bind(subscriber.source.as_deref())
            .fetch_one(pool)
            .await
            .map_err(|e| RepositoryError::from_insert(e, "email already subscribed"))?
            .try_into(),
            Database::Memory(mem) => {
                mem.ensure_writable()?;
                let mut subscribers = mem.subscribers.write().await;
                if subscribers.iter().any(|s| s.email == subscriber.email) {
                    return Err(RepositoryError::Conflict(
                        "email already subscribed".to_owned(),
                    ));
                }
                subscribers.push(subscriber.clone());
                Ok(subscriber)
            }
        }
    }
}
