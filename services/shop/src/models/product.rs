//! Product catalog model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Visibility of a product; inactive products are soft-deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
}

/// Product entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub category: String,
    pub stock: u32,
    #[serde(default)]
    pub status: ProductStatus,
}

impl Product {
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }

    /// Purchasable in the requested quantity right now
    pub fn can_supply(&self, quantity: u32) -> bool {
        self.is_active() && self.stock >= quantity
    }

    /// Case-insensitive substring match on name or description.
    /// `keyword` must already be lowercase.
    pub(crate) fn matches_keyword(&self, keyword: &str) -> bool {
        self.name.to_lowercase().contains(keyword)
            || self.description.to_lowercase().contains(keyword)
    }
}

/// New product creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub stock: u32,
}

/// Full replacement payload for an existing product.
/// A missing `status` keeps the current one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub category: String,
    pub stock: u32,
    #[serde(default)]
    pub status: Option<ProductStatus>,
}

/// Administrative stock override
#[derive(Debug, Clone, Deserialize)]
pub struct StockUpdate {
    pub stock: i64,
}

/// Query parameters for product listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    /// Exact category filter
    pub category: Option<String>,
    /// Free-text search over name and description; wins over `category`
    pub search: Option<String>,
}
