//! API error types with HTTP response mapping.
//!
//! Client-correctable errors carry their message through; anything
//! internal is logged in full server-side and returned as an opaque
//! generic failure.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use domain::DomainError;

const OPAQUE_INTERNAL: &str = "internal server error";

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Missing or invalid credentials.
    Unauthorized(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Checkout workflow error.
    Checkout(CheckoutError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, OPAQUE_INTERNAL.to_string())
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::ProductNotFound(_)
        | DomainError::CategoryNotFound(_)
        | DomainError::OrderNotFound(_)
        | DomainError::CartNotFound(_)
        | DomainError::CartItemNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::InsufficientStock { .. }
        | DomainError::InvalidQuantity(_)
        | DomainError::InvalidPrice => (StatusCode::BAD_REQUEST, err.to_string()),
        DomainError::EmailInUse(_) | DomainError::SkuInUse(_) | DomainError::CategoryInUse(_) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        DomainError::InvalidCredentials | DomainError::InvalidToken => {
            (StatusCode::UNAUTHORIZED, err.to_string())
        }
        _ => {
            tracing::error!(error = %err, "internal server error");
            (StatusCode::INTERNAL_SERVER_ERROR, OPAQUE_INTERNAL.to_string())
        }
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match err {
        CheckoutError::EmptyCart
        | CheckoutError::InsufficientStock { .. }
        | CheckoutError::ProductUnavailable(_)
        | CheckoutError::InvalidPostalCode(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CheckoutError::Domain(inner) => domain_error_to_response(inner),
        other => {
            tracing::error!(error = %other, "internal server error");
            (StatusCode::INTERNAL_SERVER_ERROR, OPAQUE_INTERNAL.to_string())
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}
