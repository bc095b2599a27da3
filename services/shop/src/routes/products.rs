//! Public catalog endpoints

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use axum_extra::extract::WithRejection;

use super::ApiPath;
use crate::{
    error::{ShopError, ShopResult},
    models::{ApiResponse, Product, ProductQuery},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list_products))
        .route("/api/products/:id", get(get_product))
        .route("/api/categories", get(list_categories))
}

/// Active products; `search` takes precedence over `category`
pub async fn list_products(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ProductQuery>, ShopError>,
) -> Json<ApiResponse<Vec<Product>>> {
    let search = query.search.as_deref().map(str::trim).unwrap_or_default();
    let category = query.category.as_deref().map(str::trim).unwrap_or_default();

    let products = if !search.is_empty() {
        state.products.search(search).await
    } else if !category.is_empty() {
        state.products.list_by_category(category).await
    } else {
        state.products.list_active().await
    };

    Json(ApiResponse::ok(products))
}

/// A single product; inactive products are reported as missing
pub async fn get_product(
    State(state): State<AppState>,
    WithRejection(Path(id), _): ApiPath<u32>,
) -> ShopResult<Json<ApiResponse<Product>>> {
    let product = state
        .products
        .get(id)
        .await
        .filter(Product::is_active)
        .ok_or_else(|| ShopError::NotFound(format!("Product {id} not found")))?;

    Ok(Json(ApiResponse::ok(product)))
}

pub async fn list_categories(State(state): State<AppState>) -> Json<ApiResponse<Vec<String>>> {
    Json(ApiResponse::ok(state.products.categories().await))
}
