//! Error types for the table store
//!
//! Every error kind maps onto the `{success, message, data}` envelope, so the
//! HTTP layer never sees an unhandled fault.

use hyper::StatusCode;

/// Main error type for table store operations
#[derive(Debug, thiserror::Error)]
pub enum TableStoreError {
    /// Referenced table or shard does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Permission check failed for the caller
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Malformed identifier or payload
    #[error("Bad input: {0}")]
    BadInput(String),

    /// Storage or membership backend unreachable or failing
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// One or more concurrent shard fetches failed during a full-table read
    #[error("{}", .0.join("\n"))]
    AggregateFailure(Vec<String>),

    /// The fan-out deadline elapsed before every fetch completed
    #[error("Timeout: {0}")]
    Timeout(String),

    /// No valid caller identity on the request
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TableStoreError {
    /// Convert error to HTTP status code.
    ///
    /// Missing records are a domain outcome reported with 200 and
    /// `success: false`; permission failures use 401.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::OK,
            Self::Forbidden(_) => StatusCode::UNAUTHORIZED,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadInput(_) => StatusCode::BAD_REQUEST,
            Self::BackendUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::AggregateFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Timeout(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the response envelope.
    ///
    /// Backend details are logged, not echoed to clients. Aggregate failures
    /// keep their joined messages.
    pub fn client_message(&self) -> String {
        match self {
            Self::NotFound(_) => "ID does not exist".to_string(),
            Self::Forbidden(msg) | Self::BadInput(msg) | Self::Unauthorized(msg) => msg.clone(),
            Self::AggregateFailure(_) => self.to_string(),
            Self::Timeout(_) => "Request timed out".to_string(),
            Self::BackendUnavailable(_) | Self::Config(_) | Self::Internal(_) => {
                "Server error".to_string()
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<std::io::Error> for TableStoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for TableStoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadInput(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for TableStoreError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<mongodb::error::Error> for TableStoreError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::BackendUnavailable(err.to_string())
    }
}

impl From<bson::ser::Error> for TableStoreError {
    fn from(err: bson::ser::Error) -> Self {
        Self::BadInput(format!("Cannot encode document: {}", err))
    }
}

impl From<bson::de::Error> for TableStoreError {
    fn from(err: bson::de::Error) -> Self {
        Self::BackendUnavailable(format!("Cannot decode stored document: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for TableStoreError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Unauthorized(format!("JWT error: {}", err))
    }
}

/// Result type alias for table store operations
pub type Result<T> = std::result::Result<T, TableStoreError>;
