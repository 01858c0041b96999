//! Contact form validation.

use serde::Deserialize;
use thiserror::Error;

use crate::types::Email;

/// Minimum message length, in characters after trimming.
pub const MIN_MESSAGE_CHARS: usize = 10;

/// Why a contact submission was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContactError {
    #[error("Name is required")]
    MissingName,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Message must be at least {MIN_MESSAGE_CHARS} characters")]
    MessageTooShort,
}

/// A raw contact form submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// A validated contact message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage {
    pub name: String,
    pub email: Email,
    pub subject: Option<String>,
    pub message: String,
}

impl ContactMessage {
    /// Validate and trim a form submission.
    ///
    /// # Errors
    ///
    /// Returns the first failing check: name, then email, then message length.
    pub fn validate(form: ContactForm) -> Result<Self, ContactError> {
        let name = form.name.trim();
        if name.is_empty() {
            return Err(ContactError::MissingName);
        }

        let email = Email::parse(&form.email).map_err(|_| ContactError::InvalidEmail)?;

        let message = form.message.trim();
        if message.chars().count() < MIN_MESSAGE_CHARS {
            return Err(ContactError::MessageTooShort);
        }

        let subject = form
            .subject
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Self {
            name: name.to_string(),
            email,
            subject,
            message: message.to_string(),
        })
    }

    /// Subject line for the forwarded email.
    #[must_use]
    pub fn subject_line(&self) -> String {
        self.subject.as_ref().map_or_else(
            || format!("New message from {}", self.name),
            |subject| format!("Contact: {subject}"),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(message: &str) -> ContactForm {
        ContactForm {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            subject: None,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_message_length_boundary() {
        let err = ContactMessage::validate(form("123456789")).unwrap_err();
        assert_eq!(err.to_string(), "Message must be at least 10 characters");

        assert!(ContactMessage::validate(form("1234567890")).is_ok());
    }

    #[test]
    fn test_length_counts_trimmed_characters() {
        assert_eq!(
            ContactMessage::validate(form("   short    ")).unwrap_err(),
            ContactError::MessageTooShort
        );
        // Characters, not bytes.
        assert_eq!(
            ContactMessage::validate(form("₦₦₦₦₦₦₦₦₦")).unwrap_err(),
            ContactError::MessageTooShort
        );
    }

    #[test]
    fn test_name_and_email_required() {
        let mut missing_name = form("Hello there, friends");
        missing_name.name = "  ".to_string();
        assert_eq!(
            ContactMessage::validate(missing_name).unwrap_err(),
            ContactError::MissingName
        );

        let mut bad_email = form("Hello there, friends");
        bad_email.email = "not-an-email".to_string();
        assert_eq!(
            ContactMessage::validate(bad_email).unwrap_err(),
            ContactError::InvalidEmail
        );
    }

    #[test]
    fn test_subject_line() {
        let mut with_subject = form("Where is my order?");
        with_subject.subject = Some(" Delivery ".to_string());
        let message = ContactMessage::validate(with_subject).unwrap();
        assert_eq!(message.subject_line(), "Contact: Delivery");

        let message = ContactMessage::validate(form("Where is my order?")).unwrap();
        assert_eq!(message.subject_line(), "New message from Ada");
    }
}
