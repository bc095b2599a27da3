//! Custom error types for the shop service

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::models::{ApiResponse, OrderStatus};

/// Custom error type for the shop service
#[derive(Error, Debug)]
pub enum ShopError {
    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),

    /// No valid session accompanied the request
    #[error("Not logged in")]
    Unauthorized,

    /// Username/password pair did not match
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Authenticated, but not allowed to touch this resource
    #[error("{0}")]
    Forbidden(String),

    /// Too many failed login attempts
    #[error("Too many login attempts, try again later")]
    TooManyAttempts,

    #[error("{0}")]
    NotFound(String),

    #[error("Username exists")]
    UsernameTaken,

    /// Product missing or soft-deleted
    #[error("Product {0} not found or not active")]
    ProductUnavailable(u32),

    #[error("Insufficient stock for product {product_id}")]
    InsufficientStock { product_id: u32 },

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order id {0} already exists")]
    DuplicateOrderId(String),

    /// Backing store failure
    #[error("Storage error: {0}")]
    Storage(#[from] common::StorageError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ShopError {
    /// HTTP status this failure is reported with
    pub fn status(&self) -> StatusCode {
        match self {
            ShopError::Validation(_) => StatusCode::BAD_REQUEST,
            ShopError::Unauthorized | ShopError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ShopError::Forbidden(_) => StatusCode::FORBIDDEN,
            ShopError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            ShopError::NotFound(_) | ShopError::ProductUnavailable(_) => StatusCode::NOT_FOUND,
            ShopError::UsernameTaken
            | ShopError::InsufficientStock { .. }
            | ShopError::EmptyCart
            | ShopError::InvalidTransition { .. }
            | ShopError::DuplicateOrderId(_) => StatusCode::CONFLICT,
            ShopError::Storage(_) | ShopError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ShopError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server-side faults are logged here and reported without detail
        let message = match &self {
            ShopError::Storage(e) => {
                error!("Storage failure: {}", e);
                "Storage error".to_string()
            }
            ShopError::Internal(detail) => {
                error!("Internal failure: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ApiResponse::<()>::failure(message))).into_response()
    }
}

impl From<JsonRejection> for ShopError {
    fn from(rejection: JsonRejection) -> Self {
        ShopError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ShopError {
    fn from(rejection: PathRejection) -> Self {
        ShopError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ShopError {
    fn from(rejection: QueryRejection) -> Self {
        ShopError::Validation(rejection.body_text())
    }
}

/// Type alias for shop results
pub type ShopResult<T> = Result<T, ShopError>;
