use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::users::repo::DuplicateEmail;

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid credentials, or insufficient privilege.
    #[error("{0}")]
    Forbidden(String),

    /// Bad login credentials.
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<DuplicateEmail>() {
            Ok(DuplicateEmail(email)) => {
                warn!(%email, "email already registered");
                ApiError::Conflict("Email already registered".into())
            }
            Err(err) => ApiError::Internal(err),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl ApiError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn validation(field: &str, msg: impl Into<String>) -> Self {
        ApiError::Validation {
            message: msg.into(),
            field: Some(field.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let (message, field) = match self {
            ApiError::Internal(e) => {
                error!(error = %format!("{e:#}"), "internal error");
                ("Internal server error".to_string(), None)
            }
            ApiError::Validation { message, field } => (message, field),
            other => (other.to_string(), None),
        };
        let body = ErrorBody { code, message, field };
        (status, Json(serde_json::json!({ "error": body }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn forbidden_renders_code_and_message() {
        let (status, json) = body_of(ApiError::forbidden("no credentials")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"]["code"], "FORBIDDEN");
        assert_eq!(json["error"]["message"], "no credentials");
        assert!(json["error"].get("field").is_none());
    }

    #[tokio::test]
    async fn validation_carries_field() {
        let (status, json) = body_of(ApiError::validation("job", "too long")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["field"], "job");
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let (status, json) =
            body_of(ApiError::from(anyhow::anyhow!("connection refused"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["message"], "Internal server error");
    }

    #[tokio::test]
    async fn duplicate_email_from_store_is_conflict() {
        use crate::users::{
            memory::InMemoryUserRepository,
            model::NewUser,
            repo::UserRepository,
        };

        let repo = InMemoryUserRepository::new();
        repo.create(NewUser::regular("mom@example.com", "!")).await.unwrap();
        let err = repo
            .create(NewUser::regular("mom@example.com", "!"))
            .await
            .unwrap_err();

        let (status, json) = body_of(ApiError::from(err)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"]["code"], "CONFLICT");
    }
}
