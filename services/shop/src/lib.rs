//! Shop service
//!
//! A small storefront backend: user accounts, a product catalog, per-user
//! carts and orders, served as JSON over HTTP and persisted as one JSON
//! file per collection.

pub mod checkout;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod rate_limiter;
pub mod routes;
pub mod session;
pub mod state;
pub mod stores;
pub mod validation;

use common::{JsonCollection, StorageConfig, storage::init_data_dir};
use tracing::{info, warn};

pub use crate::config::AppConfig;
pub use error::{ShopError, ShopResult};
pub use routes::create_router;
pub use state::AppState;

use crate::{
    checkout::CheckoutCoordinator,
    config::AdminBootstrap,
    models::Role,
    rate_limiter::RateLimiter,
    session::SessionManager,
    stores::{CartStore, OrderLedger, ProductStore, UserStore},
};

/// Load every collection from the data directory and wire up the service
pub async fn build_state(config: AppConfig) -> ShopResult<AppState> {
    let storage = StorageConfig {
        data_dir: config.data_dir.clone(),
    };
    init_data_dir(&storage).await?;

    let dir = &storage.data_dir;
    let products = ProductStore::load(JsonCollection::new(dir, "products")).await?;
    let carts = CartStore::load(JsonCollection::new(dir, "carts"), products.clone()).await?;
    let orders = OrderLedger::load(JsonCollection::new(dir, "orders")).await?;
    let users = UserStore::load(JsonCollection::new(dir, "users")).await?;

    if let Some(admin) = config.admin_bootstrap() {
        bootstrap_admin(&users, &admin).await?;
    }

    Ok(AppState {
        checkout: CheckoutCoordinator::new(products.clone(), carts.clone(), orders.clone()),
        sessions: SessionManager::new(&config.session_secret, config.session_ttl_seconds),
        login_limiter: RateLimiter::new(config.rate_limiter()),
        config,
        products,
        carts,
        orders,
        users,
    })
}

async fn bootstrap_admin(users: &UserStore, admin: &AdminBootstrap) -> ShopResult<()> {
    if let Some(existing) = users.find_by_username(&admin.username).await {
        if existing.role != Role::Admin {
            warn!(
                "Bootstrap admin {} already exists without the admin role",
                admin.username
            );
        }
        return Ok(());
    }

    users
        .insert(&admin.username, &admin.password, &admin.email, Role::Admin)
        .await?;
    info!("Created bootstrap admin {}", admin.username);
    Ok(())
}
