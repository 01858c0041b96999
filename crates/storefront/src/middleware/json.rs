//! JSON body extractors with JSON rejections.
//!
//! axum's `Json` rejects malformed bodies with plain text and a mix of
//! 400/415/422. These wrappers render every body rejection as a 400 in the
//! same shape as the handler's own errors.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use crate::error::{AppError, FormError};

/// JSON body for API handlers. Rejects with `{"error": "..."}`.
pub struct ApiJson<T>(pub T);

/// JSON body for form handlers. Rejects with `{"success": false, "message": "..."}`.
pub struct FormJson<T>(pub T);

fn bad_body(rejection: &JsonRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(bad_body(&rejection)),
        }
    }
}

impl<T, S> FromRequest<S> for FormJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = FormError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(FormError(bad_body(&rejection))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request as HttpRequest, StatusCode, header},
        routing::post,
    };
    use serde::Deserialize;
    use serde_json::Value;
    use tower::ServiceExt;

    #[derive(Deserialize)]
    struct Message {
        #[allow(dead_code)]
        message: String,
    }

    async fn api(ApiJson(_): ApiJson<Message>) -> StatusCode {
        StatusCode::OK
    }

    async fn form(FormJson(_): FormJson<Message>) -> StatusCode {
        StatusCode::OK
    }

    fn router() -> Router {
        Router::new()
            .route("/api", post(api))
            .route("/form", post(form))
    }

    async fn send(uri: &str, content_type: Option<&str>, body: &'static str) -> (StatusCode, Value) {
        let mut request = HttpRequest::post(uri);
        if let Some(content_type) = content_type {
            request = request.header(header::CONTENT_TYPE, content_type);
        }
        let response = router()
            .oneshot(request.body(Body::from(body)).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_wrong_field_type_is_json_400() {
        let (status, body) = send("/api", Some("application/json"), r#"{"message": 12}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("message"));

        let (status, body) = send("/form", Some("application/json"), r#"{"message": 12}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_missing_content_type_is_json_400() {
        let (status, body) = send("/form", None, r#"{"message": "hi"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_valid_body_passes() {
        let (status, _) = send("/api", Some("application/json"), r#"{"message": "hi"}"#).await;
        assert_eq!(status, StatusCode::OK);
    }
}
