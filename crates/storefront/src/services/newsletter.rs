//! Newsletter subscription.

use tracing::instrument;

use adire_core::Email;

use crate::db::{Database, RepositoryError};
use crate::error::AppError;
use crate::models::NewsletterSubscriber;
use crate::services::email::EmailClient;

/// Message for a duplicate sign-up.
pub const ALREADY_SUBSCRIBED: &str = "This email is already subscribed";

/// Subscribe `email`, rejecting addresses already on the list.
///
/// The welcome email is best effort.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for an invalid address and
/// `AppError::Conflict` when already subscribed.
#[instrument(skip(db, email_client))]
pub async fn subscribe(
    db: &Database,
    email_client: Option<&EmailClient>,
    email: &str,
    source: Option<&str>,
) -> Result<NewsletterSubscriber, AppError> {
    let email = Email::parse(email)
        .map_err(|_| AppError::BadRequest("Please enter a valid email address".to_string()))?;

    let subscribers = db.subscribers();
    if subscribers.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(ALREADY_SUBSCRIBED.to_string()));
    }

    let source = source.map(str::trim).filter(|s| !s.is_empty());
    let subscriber = subscribers
        .create(&email, source)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AppError::Conflict(ALREADY_SUBSCRIBED.to_string()),
            other => AppError::Database(other),
        })?;

    tracing::info!(subscriber_id = %subscriber.id, "Newsletter subscription created");

    if let Some(client) = email_client
        && let Err(e) = client.send_welcome(&subscriber.email, None).await
    {
        tracing::warn!(error = %e, "Failed to send newsletter welcome email");
    }

    Ok(subscriber)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_normalized_duplicate_rejected() {
        let db = Database::memory();

        let first = subscribe(&db, None, "A@B.com", Some("footer")).await.unwrap();
        assert_eq!(first.email.as_str(), "a@b.com");
        assert_eq!(first.source.as_deref(), Some("footer"));

        let err = subscribe(&db, None, "a@b.com", None).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == ALREADY_SUBSCRIBED));

        let err = subscribe(&db, None, "  A@B.COM  ", None).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_invalid_email_rejected() {
        let db = Database::memory();
        let err = subscribe(&db, None, "not-an-email", None).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
