//! HTTP mapping for domain errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::DomainError;

impl DomainError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DomainError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DomainError::BadRequest(_) => StatusCode::BAD_REQUEST,
            DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            DomainError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            DomainError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            DomainError::Database(_) | DomainError::Storage(_) | DomainError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn detail(&self) -> &str {
        match self {
            DomainError::Validation(msg)
            | DomainError::BadRequest(msg)
            | DomainError::Unauthorized(msg)
            | DomainError::Forbidden(msg)
            | DomainError::NotFound(msg)
            | DomainError::PayloadTooLarge(msg)
            | DomainError::UnsupportedMediaType(msg)
            | DomainError::RateLimited(msg)
            | DomainError::Database(msg)
            | DomainError::Storage(msg)
            | DomainError::Internal(msg) => msg,
        }
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = if status.is_server_error() {
            tracing::error!("{}", self);
            "Internal server error"
        } else {
            self.detail()
        };

        (
            status,
            Json(json!({
                "success": false,
                "error": self.kind(),
                "detail": detail
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_hide_their_cause() {
        let response = DomainError::Database("no such table: orders".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = DomainError::Validation("name too short".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn every_client_error_keeps_its_status() {
        let cases = [
            (DomainError::BadRequest(String::new()), 400),
            (DomainError::Unauthorized(String::new()), 401),
            (DomainError::Forbidden(String::new()), 403),
            (DomainError::not_found("Order"), 404),
            (DomainError::PayloadTooLarge(String::new()), 413),
            (DomainError::UnsupportedMediaType(String::new()), 415),
            (DomainError::RateLimited(String::new()), 429),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code().as_u16(), status, "{:?}", err);
        }
    }
}
