//! Catalog product records.

use chrono::{DateTime, Utc};
use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

/// A catalog product, restricted to the fields the checkout flow touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub image_url: Option<String>,
    /// Current unit price. Orders capture their own frozen copy.
    pub price: Money,
    /// On-hand stock. Never negative; all changes are relative and guarded.
    pub stock_quantity: u32,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub title: String,
    pub image_url: Option<String>,
    pub price: Money,
    pub stock_quantity: u32,
}

impl NewProduct {
    pub fn new(title: impl Into<String>, price: Money, stock_quantity: u32) -> Self {
        Self {
            title: title.into(),
            image_url: None,
            price,
            stock_quantity,
        }
    }
}
