//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Errors render as `{"error": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use adire_core::CheckoutError;

use crate::catalog::CatalogError;
use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::email::EmailDeliveryError;
use crate::services::paystack::PaystackError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Catalog provider request failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Paystack request failed.
    #[error("Paystack error: {0}")]
    Paystack(#[from] PaystackError),

    /// Email delivery failed.
    #[error("Email error: {0}")]
    Email(#[from] EmailDeliveryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout transition rejected.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Session store read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// The provider did not confirm the payment.
    #[error("Payment not verified: {0}")]
    PaymentNotVerified(String),

    /// Payment succeeded but the order could not be written.
    #[error("Order not saved for payment {reference}")]
    OrderNotSaved { reference: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but not allowed.
    #[error("Forbidden")]
    Forbidden,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request conflicts with existing state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_)
            | Self::Email(_)
            | Self::Session(_)
            | Self::OrderNotSaved { .. }
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Catalog(_) | Self::Paystack(_) => StatusCode::BAD_GATEWAY,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword | AuthError::InvalidEmail(_) | AuthError::MissingName => {
                    StatusCode::BAD_REQUEST
                }
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Checkout(err) => match err {
                CheckoutError::NotAuthenticated => StatusCode::UNAUTHORIZED,
                CheckoutError::NotReady(_) | CheckoutError::ReferenceMismatch => {
                    StatusCode::BAD_REQUEST
                }
                CheckoutError::NoPaymentInProgress | CheckoutError::CartChanged => {
                    StatusCode::CONFLICT
                }
            },
            Self::PaymentNotVerified(_) => StatusCode::PAYMENT_REQUIRED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Message safe to show the client.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Session(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::Email(_) => "We could not send the email. Please try again later.".to_string(),
            Self::Catalog(_) | Self::Paystack(_) => "External service error".to_string(),
            Self::Auth(err) => err.user_message().to_string(),
            Self::Checkout(err) => err.to_string(),
            Self::PaymentNotVerified(_) => {
                "We could not verify your payment. You have not been charged for an order."
                    .to_string()
            }
            Self::OrderNotSaved { reference } => format!(
                "Your payment was received but we could not save your order. \
                 Please contact support with payment reference {reference}."
            ),
            Self::NotFound(what) => format!("{what} not found"),
            Self::Unauthorized(msg) | Self::BadRequest(msg) | Self::Conflict(msg) => msg.clone(),
            Self::Forbidden => "You do not have access to this resource".to_string(),
            Self::RateLimited => "Too many requests. Please slow down.".to_string(),
        }
    }
}

impl AppError {
    /// Log the error, capturing server errors to Sentry.
    fn report(&self) -> StatusCode {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.report();
        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}

/// An `AppError` rendered as `{"success": false, "message": "..."}`.
///
/// Used by the form endpoints (newsletter, contact, emails).
#[derive(Debug)]
pub struct FormError(pub AppError);

impl<E: Into<AppError>> From<E> for FormError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for FormError {
    fn into_response(self) -> Response {
        let status = self.0.report();
        (
            status,
            Json(json!({ "success": false, "message": self.0.client_message() })),
        )
            .into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use adire_core::Requirement;

    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Product".to_string());
        assert_eq!(err.to_string(), "Not found: Product");
        assert_eq!(err.client_message(), "Product not found");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(get_status(AppError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::PaymentNotVerified("amount".to_string())),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::OrderNotSaved {
                reference: "ADR-1".to_string()
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_checkout_errors_map_to_prompts() {
        let err = AppError::Checkout(CheckoutError::NotReady(vec![Requirement::Phone]));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.client_message(), "Please enter your phone number");

        let err = AppError::Checkout(CheckoutError::NotAuthenticated);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.client_message(), "Please sign in to continue");
    }

    #[test]
    fn test_order_not_saved_mentions_reference() {
        let err = AppError::OrderNotSaved {
            reference: "ADR-0123456789ABCDEF0123".to_string(),
        };
        assert!(err.client_message().contains("ADR-0123456789ABCDEF0123"));
    }

    #[test]
    fn test_form_error_keeps_status() {
        let response = FormError::from(AppError::BadRequest("Name is required".to_string()))
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Internal("pool exhausted at 10.0.0.3".to_string());
        assert_eq!(err.client_message(), "Internal server error");
    }
}
