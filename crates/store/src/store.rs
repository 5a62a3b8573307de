//! Storage traits implemented by every backend.

use async_trait::async_trait;
use common::{CustomerId, Money, OrderId, OrderStatus, ProductId};

use crate::{
    Result,
    cart::{CartItem, CartLine},
    order::{NewOrder, NewOrderItem, Order, OrderItem},
    product::{NewProduct, Product},
};

/// Read and write access to catalog products.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Creates a product and returns it with its assigned identifier.
    async fn create_product(&self, product: NewProduct) -> Result<Product>;

    /// Fetches a product by ID. Returns None if it doesn't exist.
    async fn product(&self, product_id: ProductId) -> Result<Option<Product>>;

    /// Lists all products, newest first.
    async fn products(&self) -> Result<Vec<Product>>;

    /// Overwrites a product's price.
    ///
    /// Fails with `ProductNotFound` if the product doesn't exist.
    async fn update_price(&self, product_id: ProductId, price: Money) -> Result<()>;

    /// Applies a relative stock change and returns the new stock level.
    ///
    /// The update is atomic at the storage layer; there is no
    /// read-then-write window. A negative delta that would drive stock
    /// below zero fails with `InsufficientStock` and changes nothing.
    async fn adjust_stock(&self, product_id: ProductId, delta: i64) -> Result<u32>;
}

/// Per-customer cart line items.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Adds a line item, or increments the quantity of an existing
    /// (customer, product) line.
    async fn add_cart_item(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        quantity: u32,
        unit_price: Money,
    ) -> Result<CartItem>;

    /// Overwrites the quantity of an existing line item.
    ///
    /// Fails with `CartItemNotFound` if the customer has no line for the
    /// product.
    async fn set_cart_quantity(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartItem>;

    /// Removes a line item. Returns whether a row existed; removing an
    /// absent line is not an error.
    async fn remove_cart_item(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
    ) -> Result<bool>;

    /// Returns the customer's cart joined with current product data.
    async fn cart_lines(&self, customer_id: CustomerId) -> Result<Vec<CartLine>>;

    /// Deletes every line item for the customer. Returns the number of
    /// rows removed.
    async fn clear_cart(&self, customer_id: CustomerId) -> Result<u64>;
}

/// Persisted orders and their line items.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Creates the order header, all line items, and the matching stock
    /// decrements in a single transaction.
    ///
    /// Either everything is persisted or nothing is: a missing product, an
    /// insufficient stock level, or any write failure rolls the whole
    /// operation back. Item prices are stored exactly as passed in and are
    /// never re-read from the catalog afterwards.
    async fn create_order(&self, order: NewOrder, items: Vec<NewOrderItem>) -> Result<Order>;

    /// Fetches an order by ID. Returns None if it doesn't exist.
    async fn order(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Returns the order's line items.
    async fn order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>>;

    /// Lists a customer's orders, newest first.
    async fn orders_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>>;

    /// Lists all orders, newest first.
    async fn orders(&self) -> Result<Vec<Order>>;

    /// Overwrites an order's status and returns the updated order.
    ///
    /// Transition legality is the caller's concern; this is a plain write.
    /// Fails with `OrderNotFound` if the order doesn't exist.
    async fn update_order_status(&self, order_id: OrderId, status: OrderStatus) -> Result<Order>;
}
