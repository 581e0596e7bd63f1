//! HTTP error mapping.
//!
//! Every handler returns `Result<_, ApiError>`; domain errors convert via
//! `From` so the `?` operator carries them straight to the response layer.
//! The response body is always the `{"error": message}` envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde_json::json;

use tandem_core::Error as CoreError;

#[derive(Debug)]
pub enum ApiError {
    Database(CoreError),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match &err {
            CoreError::NotFound(msg) => ApiError::NotFound(msg.clone()),
            CoreError::ProfileNotFound(_)
            | CoreError::EventNotFound(_)
            | CoreError::ProjectNotFound(_) => ApiError::NotFound(err.to_string()),
            CoreError::IdentityExtraction(_) => ApiError::Unauthorized(err.to_string()),
            CoreError::AccessDenied(msg) => ApiError::Forbidden(msg.clone()),
            CoreError::InvalidInput(msg) | CoreError::InvalidSearchRequest(msg) => {
                ApiError::BadRequest(msg.clone())
            }
            CoreError::Database(sqlx_err) => {
                let msg = sqlx_err.to_string();
                if msg.contains("duplicate key") || msg.contains("unique constraint") {
                    return ApiError::Conflict(msg);
                }
                if msg.contains("foreign key") {
                    return ApiError::BadRequest(msg);
                }
                ApiError::Database(err)
            }
            _ => ApiError::Database(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Database(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn status_of(err: CoreError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(CoreError::IdentityExtraction("no subject".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(CoreError::AccessDenied("invalid invitation code".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(CoreError::ProfileNotFound(Uuid::nil())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(CoreError::EventNotFound(7)), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(CoreError::InvalidSearchRequest("bad time".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(CoreError::InvalidInput("not a uuid".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(CoreError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
