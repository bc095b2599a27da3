//! Product catalog store

use common::JsonCollection;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    error::{ShopError, ShopResult},
    models::{CartItem, NewProduct, Product, ProductStatus, ProductUpdate},
};

/// One product and the quantity wanted of it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLine {
    pub product_id: u32,
    pub quantity: u32,
}

impl From<&CartItem> for StockLine {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id,
            quantity: item.quantity,
        }
    }
}

/// Product table; source of truth for stock levels
#[derive(Clone)]
pub struct ProductStore {
    products: Arc<Mutex<Vec<Product>>>,
    collection: Arc<JsonCollection<Product>>,
}

impl ProductStore {
    /// Load the product table from its backing collection
    pub async fn load(collection: JsonCollection<Product>) -> ShopResult<Self> {
        let products = collection.load_all().await?;
        info!("Loaded {} products", products.len());

        Ok(Self {
            products: Arc::new(Mutex::new(products)),
            collection: Arc::new(collection),
        })
    }

    /// Look up a product regardless of status
    pub async fn get(&self, id: u32) -> Option<Product> {
        self.products
            .lock()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    /// Every product, including inactive ones
    pub async fn list_all(&self) -> Vec<Product> {
        self.products.lock().await.clone()
    }

    pub async fn list_active(&self) -> Vec<Product> {
        self.products
            .lock()
            .await
            .iter()
            .filter(|p| p.is_active())
            .cloned()
            .collect()
    }

    /// Active products in exactly `category`; a blank category lists all active
    pub async fn list_by_category(&self, category: &str) -> Vec<Product> {
        if category.trim().is_empty() {
            return self.list_active().await;
        }
        self.products
            .lock()
            .await
            .iter()
            .filter(|p| p.is_active() && p.category == category)
            .cloned()
            .collect()
    }

    /// Active products whose name or description contains `keyword`, ignoring case
    pub async fn search(&self, keyword: &str) -> Vec<Product> {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return self.list_active().await;
        }
        self.products
            .lock()
            .await
            .iter()
            .filter(|p| p.is_active() && p.matches_keyword(&keyword))
            .cloned()
            .collect()
    }

    /// Distinct categories of active products, in first-seen order
    pub async fn categories(&self) -> Vec<String> {
        let products = self.products.lock().await;
        let mut categories: Vec<String> = Vec::new();
        for product in products.iter().filter(|p| p.is_active()) {
            if !categories.contains(&product.category) {
                categories.push(product.category.clone());
            }
        }
        categories
    }

    /// Add a product with the next identifier; it starts active
    pub async fn create(&self, new_product: NewProduct) -> ShopResult<Product> {
        let mut products = self.products.lock().await;

        let id = products.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let product = Product {
            id,
            name: new_product.name,
            description: new_product.description,
            price: new_product.price,
            category: new_product.category,
            stock: new_product.stock,
            status: ProductStatus::Active,
        };

        let mut next = products.clone();
        next.push(product.clone());
        self.collection.save_all(&next).await?;
        *products = next;

        info!("Created product {} ({})", product.id, product.name);
        Ok(product)
    }

    /// Replace every field of product `id`
    pub async fn update(&self, id: u32, update: ProductUpdate) -> ShopResult<Product> {
        self.mutate(id, |product| {
            product.name = update.name;
            product.description = update.description;
            product.price = update.price;
            product.category = update.category;
            product.stock = update.stock;
            if let Some(status) = update.status {
                product.status = status;
            }
            Ok(())
        })
        .await
    }

    /// Soft delete: flips the status to inactive
    pub async fn deactivate(&self, id: u32) -> ShopResult<Product> {
        self.mutate(id, |product| {
            product.status = ProductStatus::Inactive;
            Ok(())
        })
        .await
    }

    /// Hard delete: physically removes the record
    pub async fn remove(&self, id: u32) -> ShopResult<Product> {
        let mut products = self.products.lock().await;
        let index = products
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| product_not_found(id))?;

        let mut next = products.clone();
        let removed = next.remove(index);
        self.collection.save_all(&next).await?;
        *products = next;

        warn!("Permanently removed product {}", id);
        Ok(removed)
    }

    /// True when the product exists, is active and holds at least `quantity`
    pub async fn check_stock(&self, id: u32, quantity: u32) -> bool {
        self.products
            .lock()
            .await
            .iter()
            .find(|p| p.id == id)
            .is_some_and(|p| p.can_supply(quantity))
    }

    /// Take `quantity` units out of stock; fails without change when short
    pub async fn reduce_stock(&self, id: u32, quantity: u32) -> ShopResult<Product> {
        self.mutate(id, |product| {
            product.stock = product
                .stock
                .checked_sub(quantity)
                .ok_or(ShopError::InsufficientStock { product_id: id })?;
            Ok(())
        })
        .await
    }

    /// Put `quantity` units back; no upper bound is enforced
    pub async fn add_stock(&self, id: u32, quantity: u32) -> ShopResult<Product> {
        self.mutate(id, |product| {
            product.stock = product.stock.saturating_add(quantity);
            Ok(())
        })
        .await
    }

    /// Administrative override of the stock level
    pub async fn set_stock(&self, id: u32, stock: i64) -> ShopResult<Product> {
        if stock < 0 {
            return Err(ShopError::Validation(
                "Stock must not be negative".to_string(),
            ));
        }
        let stock = u32::try_from(stock)
            .map_err(|_| ShopError::Validation("Stock is too large".to_string()))?;

        self.mutate(id, |product| {
            product.stock = stock;
            Ok(())
        })
        .await
    }

    /// Decrement stock for every line, or for none of them.
    ///
    /// All lines are checked against active status and current stock under
    /// one lock and written with a single save, so a failed line leaves the
    /// table exactly as it was.
    pub async fn reserve(&self, lines: &[StockLine]) -> ShopResult<()> {
        let mut products = self.products.lock().await;
        let mut next = products.clone();

        for line in lines {
            let product = next
                .iter_mut()
                .find(|p| p.id == line.product_id)
                .ok_or(ShopError::ProductUnavailable(line.product_id))?;
            if !product.can_supply(line.quantity) {
                return Err(ShopError::InsufficientStock {
                    product_id: line.product_id,
                });
            }
            product.stock -= line.quantity;
        }

        self.collection.save_all(&next).await?;
        *products = next;

        info!("Reserved stock for {} lines", lines.len());
        Ok(())
    }

    /// Return stock for every line with one save.
    /// Lines whose product no longer exists are skipped.
    pub async fn release(&self, lines: &[StockLine]) -> ShopResult<()> {
        let mut products = self.products.lock().await;
        let mut next = products.clone();

        for line in lines {
            match next.iter_mut().find(|p| p.id == line.product_id) {
                Some(product) => product.stock = product.stock.saturating_add(line.quantity),
                None => warn!(
                    "Cannot return {} units to missing product {}",
                    line.quantity, line.product_id
                ),
            }
        }

        self.collection.save_all(&next).await?;
        *products = next;

        info!("Released stock for {} lines", lines.len());
        Ok(())
    }

    /// Apply `change` to product `id` on a working copy, persist, then commit
    async fn mutate<F>(&self, id: u32, change: F) -> ShopResult<Product>
    where
        F: FnOnce(&mut Product) -> ShopResult<()>,
    {
        let mut products = self.products.lock().await;
        let mut next = products.clone();

        let product = next
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| product_not_found(id))?;
        change(product)?;
        let updated = product.clone();

        self.collection.save_all(&next).await?;
        *products = next;

        info!("Updated product {} (stock {})", id, updated.stock);
        Ok(updated)
    }
}

fn product_not_found(id: u32) -> ShopError {
    ShopError::NotFound(format!("Product {id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    async fn store_with(products: Vec<Product>) -> (ProductStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let collection = JsonCollection::new(dir.path(), "products");
        collection.save_all(&products).await.unwrap();
        (ProductStore::load(collection).await.unwrap(), dir)
    }

    fn product(id: u32, name: &str, category: &str, stock: u32) -> Product {
        Product {
            id,
            name: name.to_string(),
            description: format!("A fine {name}"),
            price: Decimal::new(1000, 2),
            category: category.to_string(),
            stock,
            status: ProductStatus::Active,
        }
    }

    fn new_product(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: String::new(),
            price: Decimal::new(500, 2),
            category: "misc".to_string(),
            stock: 1,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_next_id() {
        let (store, _dir) = store_with(vec![product(4, "Kettle", "kitchen", 1)]).await;

        let created = store.create(new_product("Teapot")).await.unwrap();
        assert_eq!(created.id, 5);
        assert_eq!(created.status, ProductStatus::Active);

        let (empty, _dir) = store_with(vec![]).await;
        assert_eq!(empty.create(new_product("First")).await.unwrap().id, 1);
    }

    #[tokio::test]
    async fn test_reduce_stock_refuses_overdraw() {
        let (store, _dir) = store_with(vec![product(1, "Kettle", "kitchen", 5)]).await;

        let err = store.reduce_stock(1, 6).await.unwrap_err();
        assert!(matches!(
            err,
            ShopError::InsufficientStock { product_id: 1 }
        ));
        assert_eq!(store.get(1).await.unwrap().stock, 5);

        assert_eq!(store.reduce_stock(1, 5).await.unwrap().stock, 0);
        assert_eq!(store.add_stock(1, 3).await.unwrap().stock, 3);
    }

    #[tokio::test]
    async fn test_set_stock_rejects_negative() {
        let (store, _dir) = store_with(vec![product(1, "Kettle", "kitchen", 5)]).await;

        assert!(matches!(
            store.set_stock(1, -1).await,
            Err(ShopError::Validation(_))
        ));
        assert_eq!(store.set_stock(1, 42).await.unwrap().stock, 42);
        assert!(matches!(
            store.set_stock(99, 1).await,
            Err(ShopError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_check_stock_requires_active() {
        let (store, _dir) = store_with(vec![product(1, "Kettle", "kitchen", 5)]).await;

        assert!(store.check_stock(1, 5).await);
        assert!(!store.check_stock(1, 6).await);
        assert!(!store.check_stock(2, 1).await);

        store.deactivate(1).await.unwrap();
        assert!(!store.check_stock(1, 1).await);
        assert!(store.get(1).await.is_some());
    }

    #[tokio::test]
    async fn test_search_and_category_only_see_active() {
        let (store, _dir) = store_with(vec![
            product(1, "Blue Kettle", "kitchen", 5),
            product(2, "Desk Lamp", "office", 5),
            product(3, "Red Kettle", "kitchen", 5),
        ])
        .await;
        store.deactivate(3).await.unwrap();

        let found = store.search("  KETTLE ").await;
        assert_eq!(found.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1]);

        let kitchen = store.list_by_category("kitchen").await;
        assert_eq!(kitchen.len(), 1);
        assert!(store.list_by_category("Kitchen").await.is_empty());

        assert_eq!(store.categories().await, vec!["kitchen", "office"]);
        assert_eq!(store.list_all().await.len(), 3);
    }

    #[tokio::test]
    async fn test_reserve_is_all_or_nothing() {
        let (store, _dir) = store_with(vec![
            product(1, "Kettle", "kitchen", 5),
            product(2, "Lamp", "office", 1),
        ])
        .await;

        let lines = [
            StockLine {
                product_id: 1,
                quantity: 3,
            },
            StockLine {
                product_id: 2,
                quantity: 2,
            },
        ];
        let err = store.reserve(&lines).await.unwrap_err();
        assert!(matches!(
            err,
            ShopError::InsufficientStock { product_id: 2 }
        ));
        assert_eq!(store.get(1).await.unwrap().stock, 5);

        store.reserve(&lines[..1]).await.unwrap();
        assert_eq!(store.get(1).await.unwrap().stock, 2);

        store.release(&lines[..1]).await.unwrap();
        assert_eq!(store.get(1).await.unwrap().stock, 5);
    }

    #[tokio::test]
    async fn test_mutations_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProductStore::load(JsonCollection::new(dir.path(), "products"))
            .await
            .unwrap();
        let created = store.create(new_product("Kettle")).await.unwrap();
        store.set_stock(created.id, 9).await.unwrap();

        let reloaded = ProductStore::load(JsonCollection::new(dir.path(), "products"))
            .await
            .unwrap();
        assert_eq!(reloaded.get(created.id).await.unwrap().stock, 9);

        reloaded.remove(created.id).await.unwrap();
        assert!(reloaded.get(created.id).await.is_none());
    }
}
