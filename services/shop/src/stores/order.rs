//! Append-only ledger of placed orders

use common::JsonCollection;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    error::{ShopError, ShopResult},
    models::{Order, OrderStatistics, OrderStatus},
};

#[derive(Clone)]
pub struct OrderLedger {
    orders: Arc<Mutex<Vec<Order>>>,
    collection: Arc<JsonCollection<Order>>,
}

impl OrderLedger {
    pub async fn load(collection: JsonCollection<Order>) -> ShopResult<Self> {
        let orders = collection.load_all().await?;
        info!("Loaded {} orders", orders.len());

        Ok(Self {
            orders: Arc::new(Mutex::new(orders)),
            collection: Arc::new(collection),
        })
    }

    /// Record a new order; identifiers must be unique
    pub async fn append(&self, order: Order) -> ShopResult<Order> {
        let mut orders = self.orders.lock().await;
        if orders.iter().any(|o| o.order_id == order.order_id) {
            return Err(ShopError::DuplicateOrderId(order.order_id));
        }

        let mut next = orders.clone();
        next.push(order.clone());
        self.collection.save_all(&next).await?;
        *orders = next;

        info!(
            "Recorded order {} for user {} totalling {}",
            order.order_id, order.user_id, order.total_amount
        );
        Ok(order)
    }

    pub async fn get(&self, order_id: &str) -> Option<Order> {
        self.orders
            .lock()
            .await
            .iter()
            .find(|o| o.order_id == order_id)
            .cloned()
    }

    /// Orders placed by `user_id`, most recent first
    pub async fn list_for_user(&self, user_id: u32) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .lock()
            .await
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    pub async fn list_all(&self) -> Vec<Order> {
        self.orders.lock().await.clone()
    }

    /// Overwrite the status with no transition checks
    pub async fn update_status(&self, order_id: &str, status: OrderStatus) -> ShopResult<Order> {
        self.mutate(order_id, |order| {
            order.status = status;
            Ok(())
        })
        .await
    }

    /// Move an order from `from` to `to`, failing if it is in any other state
    pub async fn transition(
        &self,
        order_id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> ShopResult<Order> {
        self.mutate(order_id, |order| {
            if order.status != from {
                return Err(ShopError::InvalidTransition {
                    from: order.status,
                    to,
                });
            }
            order.status = to;
            Ok(())
        })
        .await
    }

    pub async fn remove(&self, order_id: &str) -> ShopResult<Order> {
        let mut orders = self.orders.lock().await;
        let index = orders
            .iter()
            .position(|o| o.order_id == order_id)
            .ok_or_else(|| order_not_found(order_id))?;

        let mut next = orders.clone();
        let removed = next.remove(index);
        self.collection.save_all(&next).await?;
        *orders = next;

        warn!("Deleted order {}", order_id);
        Ok(removed)
    }

    pub async fn statistics(&self) -> OrderStatistics {
        let orders = self.orders.lock().await;
        let count = |status: OrderStatus| orders.iter().filter(|o| o.status == status).count();

        OrderStatistics {
            total_orders: orders.len(),
            total_revenue: orders
                .iter()
                .filter(|o| o.status != OrderStatus::Cancelled)
                .map(|o| o.total_amount)
                .sum::<Decimal>(),
            pending_orders: count(OrderStatus::Pending),
            completed_orders: count(OrderStatus::Completed),
        }
    }

    async fn mutate<F>(&self, order_id: &str, change: F) -> ShopResult<Order>
    where
        F: FnOnce(&mut Order) -> ShopResult<()>,
    {
        let mut orders = self.orders.lock().await;
        let mut next = orders.clone();

        let order = next
            .iter_mut()
            .find(|o| o.order_id == order_id)
            .ok_or_else(|| order_not_found(order_id))?;
        change(order)?;
        let updated = order.clone();

        self.collection.save_all(&next).await?;
        *orders = next;

        info!("Order {} is now {}", order_id, updated.status);
        Ok(updated)
    }
}

fn order_not_found(order_id: &str) -> ShopError {
    ShopError::NotFound(format!("Order {order_id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CartItem;
    use chrono::{Duration, Utc};

    fn order(id: &str, user_id: u32, cents: i64, minutes_ago: i64) -> Order {
        Order::from_snapshot(
            id.to_string(),
            user_id,
            vec![CartItem {
                product_id: 1,
                product_name: "Kettle".into(),
                price: Decimal::new(cents, 2),
                quantity: 1,
            }],
            "Main St".into(),
            Utc::now() - Duration::minutes(minutes_ago),
        )
    }

    async fn ledger() -> (OrderLedger, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let ledger = OrderLedger::load(JsonCollection::new(dir.path(), "orders"))
            .await
            .unwrap();
        (ledger, dir)
    }

    #[tokio::test]
    async fn test_user_orders_newest_first() {
        let (ledger, _dir) = ledger().await;
        ledger.append(order("a", 1, 100, 30)).await.unwrap();
        ledger.append(order("b", 2, 100, 20)).await.unwrap();
        ledger.append(order("c", 1, 100, 10)).await.unwrap();

        let ids: Vec<String> = ledger
            .list_for_user(1)
            .await
            .into_iter()
            .map(|o| o.order_id)
            .collect();
        assert_eq!(ids, vec!["c", "a"]);
        assert_eq!(ledger.list_all().await.len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let (ledger, _dir) = ledger().await;
        ledger.append(order("a", 1, 100, 0)).await.unwrap();
        assert!(matches!(
            ledger.append(order("a", 2, 100, 0)).await,
            Err(ShopError::DuplicateOrderId(_))
        ));
    }

    #[tokio::test]
    async fn test_transition_requires_expected_state() {
        let (ledger, _dir) = ledger().await;
        ledger.append(order("a", 1, 100, 0)).await.unwrap();
        ledger
            .update_status("a", OrderStatus::Shipped)
            .await
            .unwrap();

        let err = ledger
            .transition("a", OrderStatus::Pending, OrderStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ShopError::InvalidTransition {
                from: OrderStatus::Shipped,
                to: OrderStatus::Cancelled
            }
        ));
        assert_eq!(ledger.get("a").await.unwrap().status, OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn test_statistics_exclude_cancelled_revenue() {
        let (ledger, _dir) = ledger().await;
        ledger.append(order("a", 1, 1000, 0)).await.unwrap();
        ledger.append(order("b", 1, 2500, 0)).await.unwrap();
        ledger.append(order("c", 2, 4000, 0)).await.unwrap();
        ledger
            .update_status("b", OrderStatus::Completed)
            .await
            .unwrap();
        ledger
            .update_status("c", OrderStatus::Cancelled)
            .await
            .unwrap();

        let stats = ledger.statistics().await;
        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.total_revenue, Decimal::new(3500, 2));
        assert_eq!(stats.pending_orders, 1);
        assert_eq!(stats.completed_orders, 1);

        ledger.remove("c").await.unwrap();
        assert!(ledger.get("c").await.is_none());
    }
}
