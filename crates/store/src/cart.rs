//! Cart line items.

use chrono::{DateTime, Utc};
use common::{CustomerId, Money, ProductId};
use serde::{Deserialize, Serialize};

/// One product a customer intends to buy.
///
/// At most one row exists per (customer, product) pair; adding the same
/// product again increments the quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub customer_id: CustomerId,
    pub product_id: ProductId,
    pub quantity: u32,
    /// Price snapshot taken when the item was added. Display only; checkout
    /// always re-reads the catalog price.
    pub unit_price: Money,
    pub added_at: DateTime<Utc>,
}

/// A cart item joined with current product display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub title: String,
    pub image_url: Option<String>,
    pub quantity: u32,
    /// Snapshot captured at add time.
    pub unit_price: Money,
    /// Current catalog price, authoritative at checkout.
    pub current_price: Money,
    pub stock_quantity: u32,
}

impl CartLine {
    /// Line total at the current catalog price.
    pub fn line_total(&self) -> Money {
        self.current_price.times(self.quantity)
    }
}
