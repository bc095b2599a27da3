//! Shop service routes
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                            - Health check
//!
//! # Accounts
//! POST /api/register                      - Register
//! POST /api/login                         - Login, returns a bearer token
//! POST /api/logout                        - End the current session
//! GET  /api/user/info                     - Current user
//! POST /api/user/change-password          - Change password
//!
//! # Catalog
//! GET  /api/products?category=&search=    - Active products
//! GET  /api/products/:id                  - Product detail
//! GET  /api/categories                    - Active categories
//!
//! # Cart (login required)
//! GET    /api/cart                        - Cart with totals
//! POST   /api/cart/add                    - Add a product
//! PUT    /api/cart/update                 - Set a line's quantity
//! DELETE /api/cart/remove                 - Drop a line
//! DELETE /api/cart/clear                  - Empty the cart
//!
//! # Orders (login required)
//! POST /api/orders/create                 - Check out the cart
//! GET  /api/orders                        - Own orders, newest first
//! GET  /api/orders/:order_id              - Order detail (owner or admin)
//! POST /api/orders/:order_id/cancel       - Cancel a pending order
//!
//! # Admin
//! GET, POST   /api/admin/products              - All products / create
//! PUT, DELETE /api/admin/products/:id          - Replace / deactivate
//! PUT         /api/admin/products/:id/stock    - Set stock
//! DELETE      /api/admin/products/:id/purge    - Hard delete
//! GET         /api/admin/orders                - All orders
//! DELETE      /api/admin/orders/:order_id      - Delete an order
//! PUT         /api/admin/orders/:order_id/status - Overwrite status
//! GET         /api/admin/statistics            - Order statistics
//! ```

use axum::{
    Json, Router,
    extract::{Path, State},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use axum_extra::extract::WithRejection;
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use crate::{
    error::{ShopError, ShopResult},
    middleware::{admin_middleware, auth_middleware},
    state::AppState,
};

pub mod admin;
pub mod cart;
pub mod orders;
pub mod products;
pub mod users;

/// JSON body whose rejection is reported in the response envelope
pub(crate) type ApiJson<T> = WithRejection<Json<T>, ShopError>;
/// Path parameters whose rejection is reported in the response envelope
pub(crate) type ApiPath<T> = WithRejection<Path<T>, ShopError>;

/// Create the router for the shop service
pub fn create_router(state: AppState) -> Router {
    let authenticated = Router::new()
        .merge(users::authenticated_routes())
        .merge(cart::routes())
        .merge(orders::routes())
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let admin = Router::new()
        .merge(admin::routes())
        .route_layer(from_fn(admin_middleware))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .merge(users::public_routes())
        .merge(products::routes())
        .merge(authenticated)
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> ShopResult<Json<Value>> {
    let storage_ok = match common::storage::health_check(&state.config.data_dir).await {
        Ok(ok) => ok,
        Err(e) => {
            error!("Data directory health check failed: {}", e);
            false
        }
    };

    if !storage_ok {
        return Err(ShopError::Internal(
            "Data directory is not writable".to_string(),
        ));
    }

    Ok(Json(json!({
        "status": "ok",
        "service": "shop",
        "storage": "ok"
    })))
}
