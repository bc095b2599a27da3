//! Application state shared across handlers

use crate::{
    checkout::CheckoutCoordinator,
    config::AppConfig,
    rate_limiter::RateLimiter,
    session::SessionManager,
    stores::{CartStore, OrderLedger, ProductStore, UserStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub products: ProductStore,
    pub carts: CartStore,
    pub orders: OrderLedger,
    pub users: UserStore,
    pub checkout: CheckoutCoordinator,
    pub sessions: SessionManager,
    pub login_limiter: RateLimiter,
}
