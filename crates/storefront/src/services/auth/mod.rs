//! Authentication service.
//!
//! Email and password accounts with Argon2id hashes.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::instrument;

use adire_core::Email;

use crate::db::{Database, RepositoryError, UserRepository};
use crate::models::User;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self {
            users: UserRepository::new(db),
        }
    }

    /// Register a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::MissingName` if the name is blank.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, password, name))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }

        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create_with_password(&email, name, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "Registered new account");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword);
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_password_length_counts_characters() {
        assert!(matches!(validate_password("1234567"), Err(AuthError::WeakPassword)));
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("ñññññññń").is_ok());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let db = Database::memory();
        let auth = AuthService::new(&db);

        let user = auth
            .register(" Ada@Example.com ", "password123", " Ada ")
            .await
            .unwrap();
        assert_eq!(user.email.as_str(), "ada@example.com");
        assert_eq!(user.name, "Ada");

        let logged_in = auth.login("ada@example.com", "password123").await.unwrap();
        assert_eq!(logged_in.id, user.id);

        assert!(matches!(
            auth.login("ada@example.com", "nope-nope").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody@example.com", "password123").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_rejections() {
        let db = Database::memory();
        let auth = AuthService::new(&db);

        assert!(matches!(
            auth.register("not-an-email", "password123", "Ada").await,
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(matches!(
            auth.register("ada@example.com", "short", "Ada").await,
            Err(AuthError::WeakPassword)
        ));
        assert!(matches!(
            auth.register("ada@example.com", "password123", "  ").await,
            Err(AuthError::MissingName)
        ));

        auth.register("ada@example.com", "password123", "Ada")
            .await
            .unwrap();
        let err = auth
            .register("ADA@example.com", "password123", "Ada")
            .await
            .unwrap_err();
        assert_eq!(
            err.user_message(),
            "An account with this email already exists"
        );
    }
}
