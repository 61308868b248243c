//! Error types for the Federation Registry

/// Result type alias using [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Main error type for the Federation Registry
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Referenced entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness or consistency violation
    #[error("{0}")]
    BadRequest(String),

    /// Input does not satisfy the schema constraints
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid credentials
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Valid credentials without the required access level
    #[error("Authorization failed: {0}")]
    Forbidden(String),

    /// Storage backend failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (should not happen in production)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convert error to HTTP status code
    pub fn to_status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Create a not-found error for an entity kind and uid
    pub fn not_found(kind: &str, uid: &str) -> Self {
        Error::NotFound(format!("{kind} '{uid}' not found"))
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Create a bad-request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Error::BadRequest(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            Error::not_found("Provider", "abc").to_status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::bad_request("duplicate").to_status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::validation("bad latitude").to_status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            Error::Storage("disk full".to_string()).to_status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = Error::not_found("Region", "1234");
        assert_eq!(err.to_string(), "Region '1234' not found");
    }
}
