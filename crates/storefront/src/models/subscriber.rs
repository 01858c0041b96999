//! Newsletter subscriber record.

use chrono::{DateTime, Utc};
use serde::Serialize;

use adire_core::{Email, SubscriberId, SubscriberStatus};

/// A newsletter sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsletterSubscriber {
    pub id: SubscriberId,
    /// Trimmed, lowercased address; unique across subscribers.
    pub email: Email,
    pub subscribed_at: DateTime<Utc>,
    pub status: SubscriberStatus,
    /// Where the sign-up came from, e.g. `footer`.
    pub source: Option<String>,
}
