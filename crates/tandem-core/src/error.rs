//! Error types for tandem.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using tandem's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for tandem operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// User profile not found
    #[error("UserProfile not found: {0}")]
    ProfileNotFound(Uuid),

    /// Event not found
    #[error("Event not found: {0}")]
    EventNotFound(i64),

    /// Project not found
    #[error("Project not found: {0}")]
    ProjectNotFound(i64),

    /// Credential claims could not be resolved into an identity
    #[error("Identity extraction failed: {0}")]
    IdentityExtraction(String),

    /// Malformed search request (bad date field, etc.)
    #[error("Invalid search request: {0}")]
    InvalidSearchRequest(String),

    /// Role or ownership check failed
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_error_display_profile_not_found() {
        let id = Uuid::nil();
        let err = Error::ProfileNotFound(id);
        assert_eq!(err.to_string(), format!("UserProfile not found: {}", id));
    }

    #[test]
    fn test_error_display_event_not_found() {
        let err = Error::EventNotFound(42);
        assert_eq!(err.to_string(), "Event not found: 42");
    }

    #[test]
    fn test_error_display_project_not_found() {
        let err = Error::ProjectNotFound(7);
        assert_eq!(err.to_string(), "Project not found: 7");
    }

    #[test]
    fn test_error_display_identity_extraction() {
        let err = Error::IdentityExtraction("missing subject claim".to_string());
        assert_eq!(
            err.to_string(),
            "Identity extraction failed: missing subject claim"
        );
    }

    #[test]
    fn test_error_display_invalid_search_request() {
        let err = Error::InvalidSearchRequest("bad eventTime".to_string());
        assert_eq!(err.to_string(), "Invalid search request: bad eventTime");
    }

    #[test]
    fn test_error_display_access_denied() {
        let err = Error::AccessDenied("wrong invitation code".to_string());
        assert_eq!(err.to_string(), "Access denied: wrong invitation code");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_error_debug_format() {
        let err = Error::AccessDenied("test".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("AccessDenied"));
    }
}
