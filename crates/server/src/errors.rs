use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::users::UserError;
use thiserror::Error;
use tracing::error;

/// Handler failure rendered as `{ "error": <detail> }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::Validation(msg) => ApiError::BadRequest(msg),
            UserError::Conflict | UserError::PasswordMismatch => {
                ApiError::BadRequest(e.to_string())
            }
            UserError::NotFound => ApiError::NotFound(e.to_string()),
            UserError::HashError(_) | UserError::Storage(_) => {
                error!(code = e.code(), error = %e, "user store failure");
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("cannot open user store: {0}")]
    Store(#[from] UserError),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use service::errors::ServiceError;

    #[test]
    fn user_errors_map_to_statuses() {
        let status = |e: UserError| ApiError::from(e).status();
        assert_eq!(status(UserError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(UserError::Conflict), StatusCode::BAD_REQUEST);
        assert_eq!(status(UserError::PasswordMismatch), StatusCode::BAD_REQUEST);
        assert_eq!(status(UserError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status(UserError::HashError("x".into())), StatusCode::INTERNAL_SERVER_ERROR);
        let storage = UserError::Storage(ServiceError::Storage("disk full".into()));
        let api = ApiError::from(storage);
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(api.to_string().contains("disk full"));
    }
}
