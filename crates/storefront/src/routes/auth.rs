//! Authentication route handlers.
//!
//! Email and password accounts. A successful register or login stores a
//! [`CurrentUser`] in the session.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use adire_core::{Email, UserId};

use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{ApiJson, OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, session_keys};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// User as exposed to the client.
#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub user_id: UserId,
    pub email: Email,
    pub name: String,
}

impl From<CurrentUser> for SessionUser {
    fn from(user: CurrentUser) -> Self {
        Self {
            user_id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

/// `{"user": {...} | null}`
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: Option<SessionUser>,
}

/// Create an account and sign in.
///
/// POST /api/auth/register
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<Json<SessionResponse>> {
    let user = AuthService::new(state.db())
        .register(&req.email, &req.password, &req.name)
        .await?;

    let current = CurrentUser::from(&user);
    set_current_user(&session, &current).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    add_breadcrumb("auth", "Registered", None);

    Ok(Json(SessionResponse {
        user: Some(current.into()),
    }))
}

/// Sign in.
///
/// POST /api/auth/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<SessionResponse>> {
    let user = AuthService::new(state.db())
        .login(&req.email, &req.password)
        .await?;

    let current = CurrentUser::from(&user);
    set_current_user(&session, &current).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    add_breadcrumb("auth", "Logged in", None);

    Ok(Json(SessionResponse {
        user: Some(current.into()),
    }))
}

/// Sign out and destroy the session.
///
/// POST /api/auth/logout
pub async fn logout(session: Session) -> Json<SessionResponse> {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }

    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {}", e);
    }

    clear_sentry_user();
    Json(SessionResponse { user: None })
}

/// The signed-in user, if any.
///
/// GET /api/auth/session
///
/// The session copy is checked against the stored account: a changed name or
/// email is written back, and a session whose account is gone is signed out.
#[instrument(skip_all)]
pub async fn session(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(cached): OptionalAuth,
) -> Result<Json<SessionResponse>> {
    let Some(cached) = cached else {
        return Ok(Json(SessionResponse { user: None }));
    };

    let Some(stored) = state.db().users().get_by_id(cached.id).await? else {
        tracing::warn!(user_id = %cached.id, "Session refers to a missing account");
        clear_current_user(&session).await?;
        clear_sentry_user();
        return Ok(Json(SessionResponse { user: None }));
    };

    let current = CurrentUser::from(&stored);
    if current.email != cached.email || current.name != cached.name {
        session.insert(session_keys::CURRENT_USER, &current).await?;
    }

    Ok(Json(SessionResponse {
        user: Some(current.into()),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use axum::{
        Router,
        body::Body,
        http::{Request, header},
        routing::{get, post},
    };
    use secrecy::SecretString;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::catalog::Catalog;
    use crate::config::{CatalogConfig, PaystackConfig, StorefrontConfig};
    use crate::db::Database;
    use crate::middleware::memory_session_layer;

    fn state(db: Database) -> AppState {
        let config = StorefrontConfig {
            database_url: None,
            host: [127, 0, 0, 1].into(),
            port: 0,
            base_url: "http://localhost:3000".to_string(),
            paystack: PaystackConfig {
                secret_key: SecretString::from("sk_test_9f8e7d6c5b4a3210fedcba98"),
                public_key: "pk_test_0123456789abcdef".to_string(),
                base_url: "http://127.0.0.1:9".to_string(),
            },
            catalog: CatalogConfig::Static(PathBuf::from("unused.json")),
            email: None,
            admin_emails: Vec::new(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        AppState::with_catalog(config, db, Catalog::from_products(Vec::new())).unwrap()
    }

    /// Put `user` in a fresh session, then read `/session` twice.
    async fn session_after_sign_in(db: Database, user: CurrentUser) -> (Value, Value) {
        let state = state(db);
        let sessions = memory_session_layer(state.config());
        let app = Router::new()
            .route(
                "/sign-in",
                post(move |session: Session| async move {
                    set_current_user(&session, &user).await.unwrap();
                }),
            )
            .route("/session", get(super::session))
            .layer(sessions)
            .with_state(state);

        let response = app
            .clone()
            .oneshot(Request::post("/sign-in").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let cookie = response.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();

        let mut bodies = Vec::new();
        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(
                    Request::get("/session")
                        .header(header::COOKIE, &cookie)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            bodies.push(serde_json::from_slice::<Value>(&bytes).unwrap());
        }
        let second = bodies.pop().unwrap();
        (bodies.pop().unwrap(), second)
    }

    #[tokio::test]
    async fn test_session_reflects_stored_account() {
        let db = Database::memory();
        let email = Email::parse("yemi@example.com").unwrap();
        let stored = db
            .users()
            .create_with_password(&email, "Yemi Alade", "$argon2id$fake")
            .await
            .unwrap();

        let mut cached = CurrentUser::from(&stored);
        cached.name = "Yemi".to_string();

        let (first, second) = session_after_sign_in(db, cached).await;
        assert_eq!(first["user"]["name"], "Yemi Alade");
        assert_eq!(first["user"]["user_id"], stored.id.to_string());
        assert_eq!(second["user"]["name"], "Yemi Alade");
    }

    #[tokio::test]
    async fn test_session_for_missing_account_signs_out() {
        let ghost = CurrentUser {
            id: UserId::new(),
            email: Email::parse("gone@example.com").unwrap(),
            name: "Gone".to_string(),
        };

        let (first, second) = session_after_sign_in(Database::memory(), ghost).await;
        assert_eq!(first["user"], Value::Null);
        assert_eq!(second["user"], Value::Null);
    }
}
