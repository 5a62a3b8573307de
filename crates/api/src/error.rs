//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{CartError, DomainError, OrderError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Missing or malformed identity.
    Unauthorized(String),
    /// Domain logic error.
    Domain(DomainError),
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
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::Cart(cart_err) => match cart_err {
            CartError::InvalidQuantity { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
            CartError::ProductNotFound { .. } | CartError::ItemNotFound { .. } => {
                (StatusCode::NOT_FOUND, err.to_string())
            }
        },
        DomainError::Order(order_err) => match order_err {
            OrderError::EmptyCart
            | OrderError::NoItems
            | OrderError::InvalidQuantity { .. }
            | OrderError::EmptyShippingAddress => (StatusCode::BAD_REQUEST, err.to_string()),
            OrderError::ProductNotFound { .. } | OrderError::OrderNotFound { .. } => {
                (StatusCode::NOT_FOUND, err.to_string())
            }
            OrderError::NotOwner | OrderError::AdminRequired => {
                (StatusCode::FORBIDDEN, err.to_string())
            }
            OrderError::InsufficientStock { .. }
            | OrderError::CannotCancel { .. }
            | OrderError::InvalidTransition { .. } => (StatusCode::CONFLICT, err.to_string()),
        },
        DomainError::Store(store_err) => {
            // Storage faults stay generic towards clients.
            tracing::error!(error = %store_err, "storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal storage error".to_string(),
            )
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}
