//! Domain error types
//!
//! These errors are framework-agnostic and represent business-level failures.
//! The api layer decides which HTTP status each variant maps to.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Input failed a field-level rule (length, range, format)
    #[error("Validation error: {0}")]
    Validation(String),
    /// Request is well-formed but violates a business rule
    #[error("{0}")]
    BadRequest(String),
    /// Missing, invalid, expired or revoked credentials
    #[error("{0}")]
    Unauthorized(String),
    /// Authenticated, but not allowed to perform the action
    #[error("{0}")]
    Forbidden(String),
    /// Resource not found
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    UnsupportedMediaType(String),
    #[error("{0}")]
    RateLimited(String),
    /// Database/persistence error
    #[error("Database error: {0}")]
    Database(String),
    /// File storage error
    #[error("Storage error: {0}")]
    Storage(String),
    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(what: &str) -> Self {
        DomainError::NotFound(format!("{} not found", what))
    }

    /// Short machine-readable kind used in error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::BadRequest(_) => "bad_request",
            DomainError::Unauthorized(_) => "unauthorized",
            DomainError::Forbidden(_) => "forbidden",
            DomainError::NotFound(_) => "not_found",
            DomainError::PayloadTooLarge(_) => "payload_too_large",
            DomainError::UnsupportedMediaType(_) => "unsupported_media_type",
            DomainError::RateLimited(_) => "rate_limited",
            DomainError::Database(_) | DomainError::Storage(_) | DomainError::Internal(_) => {
                "internal_error"
            }
        }
    }
}

// Conversion from SeaORM errors (used in services and infrastructure)
impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::Database(e.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(e: std::io::Error) -> Self {
        DomainError::Storage(e.to_string())
    }
}
