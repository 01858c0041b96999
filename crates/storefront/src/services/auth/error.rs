//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] adire_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password shorter than the minimum length.
    #[error("password too short")]
    WeakPassword,

    /// Registration without a display name.
    #[error("name is required")]
    MissingName,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Human-readable text for the client.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidEmail(_) => "Please enter a valid email address",
            Self::InvalidCredentials => "Invalid email or password",
            Self::UserAlreadyExists => "An account with this email already exists",
            Self::WeakPassword => "Password must be at least 8 characters",
            Self::MissingName => "Name is required",
            Self::Repository(_) | Self::PasswordHash => "Something went wrong. Please try again.",
        }
    }
}
