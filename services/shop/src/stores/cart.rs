//! Per-user cart store

use common::JsonCollection;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{error, info, warn};

use super::product::ProductStore;
use crate::{
    error::{ShopError, ShopResult},
    models::{Cart, CartItem},
};

/// Cart table keyed by user id.
///
/// One lock covers the whole table; every mutation is applied and flushed
/// to the backing collection while it is held.
#[derive(Clone)]
pub struct CartStore {
    carts: Arc<Mutex<Vec<Cart>>>,
    collection: Arc<JsonCollection<Cart>>,
    products: ProductStore,
}

impl CartStore {
    pub async fn load(
        collection: JsonCollection<Cart>,
        products: ProductStore,
    ) -> ShopResult<Self> {
        let carts = collection.load_all().await?;
        info!("Loaded {} carts", carts.len());

        Ok(Self {
            carts: Arc::new(Mutex::new(carts)),
            collection: Arc::new(collection),
            products,
        })
    }

    /// The user's cart, created empty (and persisted) on first access
    pub async fn get_or_create(&self, user_id: u32) -> ShopResult<Cart> {
        let mut carts = self.carts.lock().await;
        if let Some(cart) = carts.iter().find(|c| c.user_id == user_id) {
            return Ok(cart.clone());
        }

        let cart = Cart::new(user_id);
        self.commit(&mut carts, |next| next.push(cart.clone()))
            .await?;
        info!("Created cart for user {}", user_id);
        Ok(cart)
    }

    /// Add `quantity` of a product, merging into an existing line
    pub async fn add_item(&self, user_id: u32, product_id: u32, quantity: u32) -> ShopResult<Cart> {
        if quantity == 0 {
            return Err(ShopError::Validation(
                "Quantity must be greater than zero".to_string(),
            ));
        }

        let mut carts = self.carts.lock().await;

        let product = self
            .products
            .get(product_id)
            .await
            .filter(|p| p.is_active())
            .ok_or(ShopError::ProductUnavailable(product_id))?;
        if !self.products.check_stock(product_id, quantity).await {
            return Err(ShopError::InsufficientStock { product_id });
        }

        let item = CartItem {
            product_id: product.id,
            product_name: product.name,
            price: product.price,
            quantity,
        };
        let cart = self
            .commit(&mut carts, |next| {
                let cart = cart_entry(next, user_id);
                cart.add_item(item);
                cart.clone()
            })
            .await?;

        info!(
            "User {} added {} x product {}",
            user_id, quantity, product_id
        );
        Ok(cart)
    }

    /// Set a line's quantity; zero or less removes the line
    pub async fn update_item(
        &self,
        user_id: u32,
        product_id: u32,
        quantity: i64,
    ) -> ShopResult<Cart> {
        let mut carts = self.carts.lock().await;

        if quantity > 0 {
            let present = carts
                .iter()
                .any(|c| c.user_id == user_id && c.item(product_id).is_some());
            if !present {
                return Err(ShopError::NotFound(format!(
                    "Product {product_id} is not in the cart"
                )));
            }

            let wanted = u32::try_from(quantity)
                .map_err(|_| ShopError::Validation("Quantity is too large".to_string()))?;
            if !self.products.check_stock(product_id, wanted).await {
                return Err(ShopError::InsufficientStock { product_id });
            }
        }

        let cart = self
            .commit(&mut carts, |next| {
                let cart = cart_entry(next, user_id);
                cart.update_quantity(product_id, quantity);
                cart.clone()
            })
            .await?;

        info!(
            "User {} set product {} to {}",
            user_id, product_id, quantity
        );
        Ok(cart)
    }

    /// Drop a line; removing an absent product is not an error
    pub async fn remove_item(&self, user_id: u32, product_id: u32) -> ShopResult<Cart> {
        let mut carts = self.carts.lock().await;
        let cart = self
            .commit(&mut carts, |next| {
                let cart = cart_entry(next, user_id);
                cart.remove_item(product_id);
                cart.clone()
            })
            .await?;

        info!("User {} removed product {}", user_id, product_id);
        Ok(cart)
    }

    pub async fn clear(&self, user_id: u32) -> ShopResult<Cart> {
        let mut carts = self.carts.lock().await;
        let cart = self
            .commit(&mut carts, |next| {
                let cart = cart_entry(next, user_id);
                cart.clear();
                cart.clone()
            })
            .await?;

        info!("Cleared cart for user {}", user_id);
        Ok(cart)
    }

    /// Re-check every line against current stock without changing anything
    pub async fn validate(&self, user_id: u32) -> ShopResult<()> {
        let cart = self.get_or_create(user_id).await?;
        self.ensure_in_stock(&cart).await
    }

    /// Run `place` on a snapshot of the user's cart and empty the cart once it
    /// succeeds.
    ///
    /// The cart lock is held from the snapshot to the clear, so concurrent
    /// checkouts of one cart cannot both see its lines and edits made in the
    /// meantime are applied after the clear instead of being lost.
    pub async fn checkout_with<T, F, Fut>(&self, user_id: u32, place: F) -> ShopResult<T>
    where
        F: FnOnce(Cart) -> Fut,
        Fut: Future<Output = ShopResult<T>>,
    {
        let mut carts = self.carts.lock().await;

        let cart = match carts.iter().find(|c| c.user_id == user_id) {
            Some(cart) if !cart.is_empty() => cart.clone(),
            _ => return Err(ShopError::EmptyCart),
        };
        self.ensure_in_stock(&cart).await?;

        let placed = place(cart).await?;

        // Whatever `place` produced is already durable; a cart that fails to
        // clear is only stale
        let cleared = self
            .commit(&mut carts, |next| cart_entry(next, user_id).clear())
            .await;
        if let Err(e) = cleared {
            error!(
                "Checkout of user {} done but cart not cleared: {}",
                user_id, e
            );
        }

        Ok(placed)
    }

    async fn ensure_in_stock(&self, cart: &Cart) -> ShopResult<()> {
        for line in &cart.items {
            if !self.products.check_stock(line.product_id, line.quantity).await {
                warn!(
                    "Cart of user {} fails stock check on product {}",
                    cart.user_id, line.product_id
                );
                return Err(ShopError::InsufficientStock {
                    product_id: line.product_id,
                });
            }
        }
        Ok(())
    }

    /// Apply `change` to a copy of the table, persist it, then swap it in
    async fn commit<R>(
        &self,
        carts: &mut MutexGuard<'_, Vec<Cart>>,
        change: impl FnOnce(&mut Vec<Cart>) -> R,
    ) -> ShopResult<R> {
        let mut next = (**carts).clone();
        let result = change(&mut next);
        self.collection.save_all(&next).await?;
        **carts = next;
        Ok(result)
    }
}

/// The cart for `user_id` inside `carts`, inserted if missing
fn cart_entry(carts: &mut Vec<Cart>, user_id: u32) -> &mut Cart {
    match carts.iter().position(|c| c.user_id == user_id) {
        Some(index) => &mut carts[index],
        None => {
            carts.push(Cart::new(user_id));
            let last = carts.len() - 1;
            &mut carts[last]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Product, ProductStatus};
    use rust_decimal::Decimal;

    async fn fixture(stock: u32) -> (CartStore, ProductStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let products = JsonCollection::new(dir.path(), "products");
        products
            .save_all(&[Product {
                id: 1,
                name: "Kettle".into(),
                description: String::new(),
                price: Decimal::new(1000, 2),
                category: "kitchen".into(),
                stock,
                status: ProductStatus::Active,
            }])
            .await
            .unwrap();
        let products = ProductStore::load(products).await.unwrap();
        let carts = CartStore::load(JsonCollection::new(dir.path(), "carts"), products.clone())
            .await
            .unwrap();
        (carts, products, dir)
    }

    #[tokio::test]
    async fn test_first_access_creates_persisted_cart() {
        let (carts, products, dir) = fixture(5).await;
        let cart = carts.get_or_create(3).await.unwrap();
        assert!(cart.is_empty());

        let reloaded = CartStore::load(JsonCollection::new(dir.path(), "carts"), products)
            .await
            .unwrap();
        assert_eq!(reloaded.carts.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_add_twice_sums_quantity() {
        let (carts, _products, _dir) = fixture(5).await;
        carts.add_item(3, 1, 2).await.unwrap();
        let cart = carts.add_item(3, 1, 2).await.unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 4);
        assert_eq!(cart.items[0].price, Decimal::new(1000, 2));
    }

    #[tokio::test]
    async fn test_add_rejects_unknown_inactive_or_short() {
        let (carts, products, _dir) = fixture(5).await;

        assert!(matches!(
            carts.add_item(3, 1, 6).await,
            Err(ShopError::InsufficientStock { product_id: 1 })
        ));
        assert!(matches!(
            carts.add_item(3, 9, 1).await,
            Err(ShopError::ProductUnavailable(9))
        ));

        products.deactivate(1).await.unwrap();
        assert!(matches!(
            carts.add_item(3, 1, 1).await,
            Err(ShopError::ProductUnavailable(1))
        ));
    }

    #[tokio::test]
    async fn test_update_and_remove() {
        let (carts, _products, _dir) = fixture(5).await;
        carts.add_item(3, 1, 1).await.unwrap();

        let cart = carts.update_item(3, 1, 4).await.unwrap();
        assert_eq!(cart.items[0].quantity, 4);

        assert!(matches!(
            carts.update_item(3, 1, 6).await,
            Err(ShopError::InsufficientStock { .. })
        ));

        let cart = carts.update_item(3, 1, 0).await.unwrap();
        assert!(cart.item(1).is_none());

        carts.add_item(3, 1, 1).await.unwrap();
        let cart = carts.remove_item(3, 1).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_update_of_missing_line_writes_nothing() {
        let (carts, products, dir) = fixture(5).await;

        assert!(matches!(
            carts.update_item(3, 1, 2).await,
            Err(ShopError::NotFound(_))
        ));
        assert!(carts.carts.lock().await.is_empty());
        let reloaded = CartStore::load(JsonCollection::new(dir.path(), "carts"), products)
            .await
            .unwrap();
        assert!(reloaded.carts.lock().await.is_empty());

        // Dropping a line that is not there is still fine
        carts.add_item(3, 1, 1).await.unwrap();
        let cart = carts.update_item(3, 9, 0).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert!(matches!(
            carts.update_item(3, 9, 1).await,
            Err(ShopError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_checkout_with_clears_only_on_success() {
        let (carts, _products, _dir) = fixture(5).await;

        let missing: ShopResult<()> = carts.checkout_with(3, |_| async { Ok(()) }).await;
        assert!(matches!(missing, Err(ShopError::EmptyCart)));

        carts.add_item(3, 1, 2).await.unwrap();
        let failed: ShopResult<()> = carts
            .checkout_with(3, |_| async { Err(ShopError::Unauthorized) })
            .await;
        assert!(matches!(failed, Err(ShopError::Unauthorized)));
        assert_eq!(carts.get_or_create(3).await.unwrap().total_quantity(), 2);

        let seen = carts
            .checkout_with(3, |cart| async move { Ok(cart.total_quantity()) })
            .await
            .unwrap();
        assert_eq!(seen, 2);
        assert!(carts.get_or_create(3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_with_rechecks_stock() {
        let (carts, products, _dir) = fixture(5).await;
        carts.add_item(3, 1, 4).await.unwrap();
        products.set_stock(1, 3).await.unwrap();

        let result: ShopResult<()> = carts.checkout_with(3, |_| async { Ok(()) }).await;
        assert!(matches!(
            result,
            Err(ShopError::InsufficientStock { product_id: 1 })
        ));
        assert_eq!(carts.get_or_create(3).await.unwrap().items[0].quantity, 4);
    }

    #[tokio::test]
    async fn test_validate_sees_later_stock_changes() {
        let (carts, products, _dir) = fixture(5).await;
        carts.add_item(3, 1, 4).await.unwrap();
        assert!(carts.validate(3).await.is_ok());

        products.set_stock(1, 2).await.unwrap();
        assert!(matches!(
            carts.validate(3).await,
            Err(ShopError::InsufficientStock { product_id: 1 })
        ));
        // Validation never mutates the cart
        assert_eq!(carts.get_or_create(3).await.unwrap().items[0].quantity, 4);
    }

    #[tokio::test]
    async fn test_carts_are_per_user() {
        let (carts, _products, _dir) = fixture(5).await;
        carts.add_item(3, 1, 1).await.unwrap();
        carts.add_item(4, 1, 2).await.unwrap();

        carts.clear(3).await.unwrap();
        assert!(carts.get_or_create(3).await.unwrap().is_empty());
        assert_eq!(carts.get_or_create(4).await.unwrap().total_quantity(), 2);
    }
}
