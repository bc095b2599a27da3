//! Order model and related functionality

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::cart::CartItem;

/// Order lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Human-readable label shown to customers
    pub fn description(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Awaiting shipment",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finalized order; `items` is a snapshot of the cart at checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: String,
    pub user_id: u32,
    pub items: Vec<CartItem>,
    pub total_amount: Decimal,
    #[serde(default)]
    pub address: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Build a pending order owning `items`, totalled from their captured prices
    pub fn from_snapshot(
        order_id: String,
        user_id: u32,
        items: Vec<CartItem>,
        address: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        let total_amount = items.iter().map(CartItem::subtotal).sum();
        Self {
            order_id,
            user_id,
            items,
            total_amount,
            address,
            status: OrderStatus::Pending,
            created_at,
        }
    }

    pub fn is_owned_by(&self, user_id: u32) -> bool {
        self.user_id == user_id
    }
}

/// Order as returned to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub status_description: &'static str,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            status_description: order.status.description(),
            order,
        }
    }
}

/// Aggregate figures over the whole ledger
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatistics {
    pub total_orders: usize,
    /// Sum of totals over every order that is not cancelled
    pub total_revenue: Decimal,
    pub pending_orders: usize,
    pub completed_orders: usize,
}

/// Request to turn the current cart into an order
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub address: Option<String>,
}

/// Administrative status overwrite
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}
