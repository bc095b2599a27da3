//! Shopping cart model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One cart line. Name and price are captured when the product is added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: u32,
    pub product_name: String,
    pub price: Decimal,
    pub quantity: u32,
}

impl CartItem {
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A user's cart; at most one line per product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub user_id: u32,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn new(user_id: u32) -> Self {
        Self {
            user_id,
            items: Vec::new(),
        }
    }

    /// Merge `item` into the cart, summing quantities for an existing line
    pub fn add_item(&mut self, item: CartItem) {
        match self
            .items
            .iter_mut()
            .find(|line| line.product_id == item.product_id)
        {
            Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
            None => self.items.push(item),
        }
    }

    /// Returns whether a line was removed
    pub fn remove_item(&mut self, product_id: u32) -> bool {
        let before = self.items.len();
        self.items.retain(|line| line.product_id != product_id);
        self.items.len() != before
    }

    /// Set a line's quantity; zero or less drops the line.
    /// Returns false when the product has no line in this cart.
    pub fn update_quantity(&mut self, product_id: u32, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove_item(product_id);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        match self.items.iter_mut().find(|line| line.product_id == product_id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    pub fn item(&self, product_id: u32) -> Option<&CartItem> {
        self.items.iter().find(|line| line.product_id == product_id)
    }

    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(CartItem::subtotal).sum()
    }

    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Cart as returned to clients, with computed totals
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub user_id: u32,
    pub items: Vec<CartItem>,
    pub total_price: Decimal,
    pub total_quantity: u64,
}

impl From<Cart> for CartSummary {
    fn from(cart: Cart) -> Self {
        Self {
            total_price: cart.total_price(),
            total_quantity: cart.total_quantity(),
            user_id: cart.user_id,
            items: cart.items,
        }
    }
}

/// Request to add a product to the cart
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: u32,
    pub quantity: i64,
}

/// Request to change a cart line's quantity
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest {
    pub product_id: u32,
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartRequest {
    pub product_id: u32,
}
