//! Cart endpoints for the logged-in user

use axum::{
    Extension, Json, Router,
    extract::State,
    routing::{delete, get, post, put},
};
use axum_extra::extract::WithRejection;

use super::ApiJson;
use crate::{
    error::{ShopError, ShopResult},
    middleware::AuthContext,
    models::{AddToCartRequest, ApiResponse, CartSummary, RemoveFromCartRequest, UpdateCartRequest},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/cart", get(get_cart))
        .route("/api/cart/add", post(add_item))
        .route("/api/cart/update", put(update_item))
        .route("/api/cart/remove", delete(remove_item))
        .route("/api/cart/clear", delete(clear_cart))
}

pub async fn get_cart(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ShopResult<Json<ApiResponse<CartSummary>>> {
    let cart = state.carts.get_or_create(auth.user_id).await?;
    Ok(Json(ApiResponse::ok(cart.into())))
}

pub async fn add_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    WithRejection(Json(payload), _): ApiJson<AddToCartRequest>,
) -> ShopResult<Json<ApiResponse<CartSummary>>> {
    if payload.quantity <= 0 {
        return Err(ShopError::Validation(
            "Quantity must be greater than zero".to_string(),
        ));
    }
    let quantity = u32::try_from(payload.quantity)
        .map_err(|_| ShopError::Validation("Quantity is too large".to_string()))?;

    let cart = state
        .carts
        .add_item(auth.user_id, payload.product_id, quantity)
        .await?;
    Ok(Json(ApiResponse::ok_with_message(
        "Added to cart",
        cart.into(),
    )))
}

/// Set a line's quantity; zero removes it
pub async fn update_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    WithRejection(Json(payload), _): ApiJson<UpdateCartRequest>,
) -> ShopResult<Json<ApiResponse<CartSummary>>> {
    if payload.quantity < 0 {
        return Err(ShopError::Validation(
            "Quantity must not be negative".to_string(),
        ));
    }

    let cart = state
        .carts
        .update_item(auth.user_id, payload.product_id, payload.quantity)
        .await?;
    Ok(Json(ApiResponse::ok_with_message(
        "Cart updated",
        cart.into(),
    )))
}

pub async fn remove_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    WithRejection(Json(payload), _): ApiJson<RemoveFromCartRequest>,
) -> ShopResult<Json<ApiResponse<CartSummary>>> {
    let cart = state
        .carts
        .remove_item(auth.user_id, payload.product_id)
        .await?;
    Ok(Json(ApiResponse::ok_with_message(
        "Removed from cart",
        cart.into(),
    )))
}

pub async fn clear_cart(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ShopResult<Json<ApiResponse<CartSummary>>> {
    let cart = state.carts.clear(auth.user_id).await?;
    Ok(Json(ApiResponse::ok_with_message(
        "Cart cleared",
        cart.into(),
    )))
}
