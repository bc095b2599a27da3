//! Turning carts into orders and cancelling them
//!
//! Checkout runs under the cart lock, from reading the cart until it is
//! emptied, so one cart yields at most one order. Stock for the whole cart
//! is reserved in a single step: either every line is decremented or none
//! is. If the order cannot be recorded afterwards the reservation is handed
//! back and the cart is left untouched for a retry.

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{error, info, warn};

use crate::{
    error::{ShopError, ShopResult},
    middleware::AuthContext,
    models::{Cart, Order, OrderStatus},
    stores::{CartStore, OrderLedger, ProductStore, StockLine},
};

/// Identifier collisions tolerated before giving up
const ORDER_ID_ATTEMPTS: usize = 5;

#[derive(Clone)]
pub struct CheckoutCoordinator {
    products: ProductStore,
    carts: CartStore,
    orders: OrderLedger,
}

impl CheckoutCoordinator {
    pub fn new(products: ProductStore, carts: CartStore, orders: OrderLedger) -> Self {
        Self {
            products,
            carts,
            orders,
        }
    }

    /// Place an order from the user's current cart, then empty the cart
    pub async fn checkout(&self, user_id: u32, address: &str) -> ShopResult<Order> {
        self.carts
            .checkout_with(user_id, |cart| async move {
                self.place_order(user_id, &cart, address).await
            })
            .await
    }

    /// Reserve stock for `cart` and record an order holding a copy of its lines.
    /// The cart itself is not modified.
    pub async fn place_order(&self, user_id: u32, cart: &Cart, address: &str) -> ShopResult<Order> {
        if cart.is_empty() {
            return Err(ShopError::EmptyCart);
        }

        let lines: Vec<StockLine> = cart.items.iter().map(StockLine::from).collect();
        self.products.reserve(&lines).await?;

        match self.record(user_id, cart, address).await {
            Ok(order) => Ok(order),
            Err(e) => {
                warn!(
                    "Order for user {} not recorded, releasing stock: {}",
                    user_id, e
                );
                if let Err(release_err) = self.products.release(&lines).await {
                    error!(
                        "Stock reserved for user {} could not be released: {}",
                        user_id, release_err
                    );
                }
                Err(e)
            }
        }
    }

    /// Cancel a pending order owned by the caller and return its stock
    pub async fn cancel(&self, auth: &AuthContext, order_id: &str) -> ShopResult<Order> {
        let order = self
            .orders
            .get(order_id)
            .await
            .ok_or_else(|| ShopError::NotFound(format!("Order {order_id} not found")))?;
        if !order.is_owned_by(auth.user_id) {
            return Err(ShopError::Forbidden(
                "Not allowed to cancel this order".to_string(),
            ));
        }

        let cancelled = self
            .orders
            .transition(order_id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await?;

        let lines: Vec<StockLine> = cancelled.items.iter().map(StockLine::from).collect();
        if let Err(e) = self.products.release(&lines).await {
            error!("Order {} cancelled but stock not restored: {}", order_id, e);
            return Err(e);
        }

        info!("User {} cancelled order {}", auth.user_id, order_id);
        Ok(cancelled)
    }

    async fn record(&self, user_id: u32, cart: &Cart, address: &str) -> ShopResult<Order> {
        for _ in 0..ORDER_ID_ATTEMPTS {
            let now = Utc::now();
            let order = Order::from_snapshot(
                generate_order_id(user_id, now),
                user_id,
                cart.items.clone(),
                address.to_string(),
                now,
            );
            match self.orders.append(order).await {
                Err(ShopError::DuplicateOrderId(id)) => {
                    warn!("Order id {} collided, regenerating", id);
                }
                other => return other,
            }
        }

        Err(ShopError::Internal(
            "Could not allocate a unique order id".to_string(),
        ))
    }
}

/// `yyyyMMddHHmmss` + user id + three random digits
pub fn generate_order_id(user_id: u32, now: DateTime<Utc>) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(0..1000);
    format!("{}{}{:03}", now.format("%Y%m%d%H%M%S"), user_id, suffix)
}
