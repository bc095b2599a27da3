//! Order endpoints for the logged-in user

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use tracing::info;

use super::{ApiJson, ApiPath};
use crate::{
    error::{ShopError, ShopResult},
    middleware::AuthContext,
    models::{ApiResponse, CreateOrderRequest, OrderView},
    state::AppState,
    validation::normalize_address,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list_orders))
        .route("/api/orders/create", post(create_order))
        .route("/api/orders/:order_id", get(get_order))
        .route("/api/orders/:order_id/cancel", post(cancel_order))
}

/// Check out the caller's cart
pub async fn create_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    WithRejection(Json(payload), _): ApiJson<CreateOrderRequest>,
) -> ShopResult<Json<ApiResponse<OrderView>>> {
    let address = normalize_address(payload.address.as_deref())?;
    let order = state.checkout.checkout(auth.user_id, &address).await?;

    info!("User {} placed order {}", auth.username, order.order_id);
    Ok(Json(ApiResponse::ok_with_message(
        "Order created",
        order.into(),
    )))
}

/// The caller's orders, most recent first
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Json<ApiResponse<Vec<OrderView>>> {
    let orders = state.orders.list_for_user(auth.user_id).await;
    Json(ApiResponse::ok(
        orders.into_iter().map(OrderView::from).collect(),
    ))
}

/// A single order, visible to its owner and to admins
pub async fn get_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    WithRejection(Path(order_id), _): ApiPath<String>,
) -> ShopResult<Json<ApiResponse<OrderView>>> {
    let order = state
        .orders
        .get(&order_id)
        .await
        .ok_or_else(|| ShopError::NotFound(format!("Order {order_id} not found")))?;

    if !order.is_owned_by(auth.user_id) && !auth.is_admin() {
        return Err(ShopError::Forbidden(
            "Not allowed to view this order".to_string(),
        ));
    }

    Ok(Json(ApiResponse::ok(order.into())))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    WithRejection(Path(order_id), _): ApiPath<String>,
) -> ShopResult<Json<ApiResponse<OrderView>>> {
    let order = state.checkout.cancel(&auth, &order_id).await?;
    Ok(Json(ApiResponse::ok_with_message(
        "Order cancelled",
        order.into(),
    )))
}
