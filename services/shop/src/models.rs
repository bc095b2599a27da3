//! Domain records and request/response payloads

use serde::Serialize;

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use cart::{
    AddToCartRequest, Cart, CartItem, CartSummary, RemoveFromCartRequest, UpdateCartRequest,
};
pub use order::{
    CreateOrderRequest, Order, OrderStatistics, OrderStatus, OrderView, UpdateOrderStatusRequest,
};
pub use product::{NewProduct, Product, ProductQuery, ProductStatus, ProductUpdate, StockUpdate};
pub use user::{
    ChangePasswordRequest, LoginRequest, LoginResponse, RegisterRequest, Role, User, UserProfile,
};

/// Envelope wrapping every response body
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn ok_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Success without a payload
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}
