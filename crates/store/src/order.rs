//! Order and order item records.

use chrono::{DateTime, Utc};
use common::{CustomerId, Money, OrderId, OrderStatus, ProductId};
use serde::{Deserialize, Serialize};

/// Default payment method recorded when the caller supplies none.
pub const DEFAULT_PAYMENT_METHOD: &str = "pending";

/// A persisted order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    /// Sum of `unit_price × quantity` over the order's items, fixed at
    /// creation.
    pub total: Money,
    pub shipping_address: String,
    pub payment_method: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// One product line within an order.
///
/// `unit_price` is the catalog price frozen at order creation; it never
/// changes, regardless of later catalog updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderItem {
    /// Total for this line at the frozen price.
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// Header fields for an order about to be created.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub total: Money,
    pub shipping_address: String,
    pub payment_method: String,
}

/// One line of an order about to be created.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}
