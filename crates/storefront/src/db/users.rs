//! User repository for database operations.
//!
//! Password hashes are only ever returned by [`UserRepository::get_password_hash`].

use chrono::{DateTime, Utc};
use uuid::Uuid;

use adire_core::{Email, UserId};

use super::memory::StoredUser;
use super::{Database, RepositoryError};
use crate::models::User;

/// Repository for user database operations.
pub struct UserRepository<'a> {
    db: &'a Database,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::from_uuid(row.id),
            email,
            name: row.name,
            created_at: row.created_at,
        })
    }
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        match self.db {
            Database::Postgres(pool) => sqlx::query_as::<_, UserRow>(
                r"
                SELECT id, email, name, created_at
                FROM storefront.user_profile
                WHERE id = $1
                ",
            )
            .bind(id)
            .fetch_optional(pool)
            .await?
            .map(User::try_from)
            .transpose(),
            Database::Memory(mem) => Ok(mem
                .users
                .read()
                .await
                .iter()
                .find(|u| u.user.id == id)
                .map(|u| u.user.clone())),
        }
    }

    /// Create a new user with email and password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        email: &Email,
        name: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let user = User {
            id: UserId::new(),
            email: email.clone(),
            name: name.to_string(),
            created_at: Utc::now(),
        };

        match self.db {
            Database::Postgres(pool) => sqlx::query_as::<_, UserRow>(
                r"
                INSERT INTO storefront.user_profile (id, email, name, password_hash, created_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, email, name, created_at
                ",
            )
            .bind(user.id)
            .bind(user.email.as_str())
            .bind(&user.name)
            .bind(password_hash)
            .bind(user.created_at)
            .fetch_one(pool)
            .await
            .map_err(|e| RepositoryError::from_insert(e, "email already exists"))?
            .try_into(),
            Database::Memory(mem) => {
                mem.ensure_writable()?;
                let mut users = mem.users.write().await;
                if users.iter().any(|u| u.user.email == user.email) {
                    return Err(RepositoryError::Conflict("email already exists".to_owned()));
                }
                users.push(StoredUser {
                    user: user.clone(),
                    password_hash: password_hash.to_string(),
                });
                Ok(user)
            }
        }
    }

    /// Get a user together with their password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        match self.db {
            Database::Postgres(pool) => {
                let row = sqlx::query_as::<_, UserWithHashRow>(
                    r"
                    SELECT id, email, name, created_at, password_hash
                    FROM storefront.user_profile
                    WHERE email = $1
                    ",
                )
                .bind(email.as_str())
                .fetch_optional(pool)
                .await?;

                match row {
                    Some(r) => Ok(Some((User::try_from(r.user)?, r.password_hash))),
                    None => Ok(None),
                }
            }
            Database::Memory(mem) => Ok(mem
                .users
                .read()
                .await
                .iter()
                .find(|u| &u.user.email == email)
                .map(|u| (u.user.clone(), u.password_hash.clone()))),
        }
    }
}
