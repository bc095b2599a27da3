//! Catalog and order management, admin role only

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    routing::{delete, get, put},
};
use axum_extra::extract::WithRejection;
use tracing::info;

use super::{ApiJson, ApiPath};
use crate::{
    error::ShopResult,
    middleware::AuthContext,
    models::{
        ApiResponse, NewProduct, OrderStatistics, OrderView, Product, ProductUpdate, StockUpdate,
        UpdateOrderStatusRequest,
    },
    state::AppState,
    validation::validate_product,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/admin/products",
            get(list_products).post(create_product),
        )
        .route(
            "/api/admin/products/:id",
            put(update_product).delete(deactivate_product),
        )
        .route("/api/admin/products/:id/stock", put(set_stock))
        .route("/api/admin/products/:id/purge", delete(purge_product))
        .route("/api/admin/orders", get(list_orders))
        .route("/api/admin/orders/:order_id", delete(delete_order))
        .route(
            "/api/admin/orders/:order_id/status",
            put(update_order_status),
        )
        .route("/api/admin/statistics", get(statistics))
}

/// Every product, inactive ones included
pub async fn list_products(State(state): State<AppState>) -> Json<ApiResponse<Vec<Product>>> {
    Json(ApiResponse::ok(state.products.list_all().await))
}

pub async fn create_product(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    WithRejection(Json(payload), _): ApiJson<NewProduct>,
) -> ShopResult<Json<ApiResponse<Product>>> {
    validate_product(&payload.name, payload.price)?;

    let product = state.products.create(payload).await?;
    info!("Admin {} created product {}", auth.username, product.id);
    Ok(Json(ApiResponse::ok_with_message(
        "Product created",
        product,
    )))
}

pub async fn update_product(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    WithRejection(Path(id), _): ApiPath<u32>,
    WithRejection(Json(payload), _): ApiJson<ProductUpdate>,
) -> ShopResult<Json<ApiResponse<Product>>> {
    validate_product(&payload.name, payload.price)?;

    let product = state.products.update(id, payload).await?;
    info!("Admin {} updated product {}", auth.username, id);
    Ok(Json(ApiResponse::ok_with_message(
        "Product updated",
        product,
    )))
}

/// Soft delete: the product stays on file as inactive
pub async fn deactivate_product(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    WithRejection(Path(id), _): ApiPath<u32>,
) -> ShopResult<Json<ApiResponse<Product>>> {
    let product = state.products.deactivate(id).await?;
    info!("Admin {} deactivated product {}", auth.username, id);
    Ok(Json(ApiResponse::ok_with_message(
        "Product deactivated",
        product,
    )))
}

pub async fn set_stock(
    State(state): State<AppState>,
    WithRejection(Path(id), _): ApiPath<u32>,
    WithRejection(Json(payload), _): ApiJson<StockUpdate>,
) -> ShopResult<Json<ApiResponse<Product>>> {
    let product = state.products.set_stock(id, payload.stock).await?;
    Ok(Json(ApiResponse::ok_with_message("Stock updated", product)))
}

/// Hard delete
pub async fn purge_product(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    WithRejection(Path(id), _): ApiPath<u32>,
) -> ShopResult<Json<ApiResponse<Product>>> {
    let product = state.products.remove(id).await?;
    info!("Admin {} purged product {}", auth.username, id);
    Ok(Json(ApiResponse::ok_with_message(
        "Product deleted",
        product,
    )))
}

pub async fn list_orders(State(state): State<AppState>) -> Json<ApiResponse<Vec<OrderView>>> {
    let orders = state.orders.list_all().await;
    Json(ApiResponse::ok(
        orders.into_iter().map(OrderView::from).collect(),
    ))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    WithRejection(Path(order_id), _): ApiPath<String>,
) -> ShopResult<Json<ApiResponse<OrderView>>> {
    let order = state.orders.remove(&order_id).await?;
    info!("Admin {} deleted order {}", auth.username, order_id);
    Ok(Json(ApiResponse::ok_with_message(
        "Order deleted",
        order.into(),
    )))
}

/// Overwrite an order's status without transition checks
pub async fn update_order_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    WithRejection(Path(order_id), _): ApiPath<String>,
    WithRejection(Json(payload), _): ApiJson<UpdateOrderStatusRequest>,
) -> ShopResult<Json<ApiResponse<OrderView>>> {
    let order = state.orders.update_status(&order_id, payload.status).await?;
    info!(
        "Admin {} set order {} to {}",
        auth.username, order_id, order.status
    );
    Ok(Json(ApiResponse::ok_with_message(
        "Status updated",
        order.into(),
    )))
}

pub async fn statistics(State(state): State<AppState>) -> Json<ApiResponse<OrderStatistics>> {
    Json(ApiResponse::ok(state.orders.statistics().await))
}
