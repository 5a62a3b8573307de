//! Order workflow: placement, cancellation, and status transitions.

mod service;

pub use service::OrderService;

use common::{Money, OrderId, OrderStatus, ProductId};
use thiserror::Error;

/// One requested line of an order: which product, how many.
///
/// Prices are never part of the request; the workflow re-reads them from
/// the catalog.
#[derive(Debug, Clone, Copy)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Outcome of a successful placement.
#[derive(Debug, Clone, Copy)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub total: Money,
}

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The cart is empty at checkout.
    #[error("Cart is empty")]
    EmptyCart,

    /// Placement was requested with no lines.
    #[error("Order has no items")]
    NoItems,

    /// Quantity must be greater than zero.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Shipping address must be non-empty.
    #[error("Shipping address is required")]
    EmptyShippingAddress,

    /// A requested product does not exist; nothing was persisted.
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: ProductId },

    /// A requested quantity exceeds available stock; nothing was persisted.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Referenced order does not exist.
    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: OrderId },

    /// The order belongs to another customer.
    #[error("Order belongs to another customer")]
    NotOwner,

    /// Administrator role required.
    #[error("Administrator role required")]
    AdminRequired,

    /// The order is past the point where cancellation is allowed.
    #[error("Cannot cancel an order in {status} status")]
    CannotCancel { status: OrderStatus },

    /// The requested status change is not a legal transition.
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}
