//! In-memory store implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{CustomerId, Money, OrderId, OrderStatus, ProductId};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    cart::{CartItem, CartLine},
    order::{NewOrder, NewOrderItem, Order, OrderItem},
    product::{NewProduct, Product},
    store::{CartStore, CatalogStore, OrderStore},
};

#[derive(Debug, Default)]
struct Inner {
    products: HashMap<ProductId, Product>,
    cart: HashMap<(CustomerId, ProductId), CartItem>,
    orders: HashMap<OrderId, Order>,
    order_items: HashMap<OrderId, Vec<OrderItem>>,
}

/// In-memory store for tests and local runs.
///
/// All collections live behind a single lock so that multi-step writes
/// (order creation with stock consumption) observe the same atomicity the
/// PostgreSQL backend gets from transactions.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes all data.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        *inner = Inner::default();
    }

    /// Returns the total number of persisted orders.
    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }
}

fn apply_stock_delta(product: &Product, delta: i64) -> Result<u32> {
    let new_stock = i64::from(product.stock_quantity) + delta;
    if new_stock < 0 {
        return Err(StoreError::InsufficientStock {
            product_id: product.id,
            requested: delta.unsigned_abs().min(u64::from(u32::MAX)) as u32,
            available: product.stock_quantity,
        });
    }
    Ok(new_stock.min(i64::from(u32::MAX)) as u32)
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn create_product(&self, product: NewProduct) -> Result<Product> {
        let mut inner = self.inner.write().await;
        let product = Product {
            id: ProductId::new(),
            title: product.title,
            image_url: product.image_url,
            price: product.price,
            stock_quantity: product.stock_quantity,
            created_at: Utc::now(),
        };
        inner.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn product(&self, product_id: ProductId) -> Result<Option<Product>> {
        Ok(self.inner.read().await.products.get(&product_id).cloned())
    }

    async fn products(&self) -> Result<Vec<Product>> {
        let inner = self.inner.read().await;
        let mut products: Vec<_> = inner.products.values().cloned().collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn update_price(&self, product_id: ProductId, price: Money) -> Result<()> {
        let mut inner = self.inner.write().await;
        let product = inner
            .products
            .get_mut(&product_id)
            .ok_or(StoreError::ProductNotFound(product_id))?;
        product.price = price;
        Ok(())
    }

    async fn adjust_stock(&self, product_id: ProductId, delta: i64) -> Result<u32> {
        let mut inner = self.inner.write().await;
        let product = inner
            .products
            .get_mut(&product_id)
            .ok_or(StoreError::ProductNotFound(product_id))?;
        let new_stock = apply_stock_delta(product, delta)?;
        product.stock_quantity = new_stock;
        Ok(new_stock)
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn add_cart_item(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        quantity: u32,
        unit_price: Money,
    ) -> Result<CartItem> {
        let mut inner = self.inner.write().await;
        let item = inner
            .cart
            .entry((customer_id, product_id))
            .and_modify(|item| item.quantity += quantity)
            .or_insert_with(|| CartItem {
                customer_id,
                product_id,
                quantity,
                unit_price,
                added_at: Utc::now(),
            });
        Ok(item.clone())
    }

    async fn set_cart_quantity(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartItem> {
        let mut inner = self.inner.write().await;
        let item = inner.cart.get_mut(&(customer_id, product_id)).ok_or(
            StoreError::CartItemNotFound {
                customer_id,
                product_id,
            },
        )?;
        item.quantity = quantity;
        Ok(item.clone())
    }

    async fn remove_cart_item(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
    ) -> Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.cart.remove(&(customer_id, product_id)).is_some())
    }

    async fn cart_lines(&self, customer_id: CustomerId) -> Result<Vec<CartLine>> {
        let inner = self.inner.read().await;
        let mut items: Vec<_> = inner
            .cart
            .values()
            .filter(|item| item.customer_id == customer_id)
            .collect();
        items.sort_by_key(|item| item.added_at);

        // Inner join: lines whose product vanished from the catalog drop out.
        Ok(items
            .into_iter()
            .filter_map(|item| {
                inner.products.get(&item.product_id).map(|p| CartLine {
                    product_id: item.product_id,
                    title: p.title.clone(),
                    image_url: p.image_url.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    current_price: p.price,
                    stock_quantity: p.stock_quantity,
                })
            })
            .collect())
    }

    async fn clear_cart(&self, customer_id: CustomerId) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.cart.len();
        inner.cart.retain(|(owner, _), _| *owner != customer_id);
        Ok((before - inner.cart.len()) as u64)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order(&self, order: NewOrder, items: Vec<NewOrderItem>) -> Result<Order> {
        let mut inner = self.inner.write().await;

        // Validate every line before mutating anything, so a failure on the
        // third item cannot leave the first two decremented. Quantities are
        // aggregated per product first: two lines for the same product must
        // not both be checked against the starting stock.
        let mut required: HashMap<ProductId, i64> = HashMap::new();
        for item in &items {
            *required.entry(item.product_id).or_default() += i64::from(item.quantity);
        }
        let mut new_stocks = Vec::with_capacity(required.len());
        for (&product_id, &quantity) in &required {
            let product = inner
                .products
                .get(&product_id)
                .ok_or(StoreError::ProductNotFound(product_id))?;
            new_stocks.push((product_id, apply_stock_delta(product, -quantity)?));
        }

        for (product_id, new_stock) in new_stocks {
            if let Some(product) = inner.products.get_mut(&product_id) {
                product.stock_quantity = new_stock;
            }
        }

        let order = Order {
            id: OrderId::new(),
            customer_id: order.customer_id,
            total: order.total,
            shipping_address: order.shipping_address,
            payment_method: order.payment_method,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        };
        let order_items = items
            .into_iter()
            .map(|item| OrderItem {
                order_id: order.id,
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect();
        inner.orders.insert(order.id, order.clone());
        inner.order_items.insert(order.id, order_items);
        Ok(order)
    }

    async fn order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.inner.read().await.orders.get(&order_id).cloned())
    }

    async fn order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let inner = self.inner.read().await;
        Ok(inner.order_items.get(&order_id).cloned().unwrap_or_default())
    }

    async fn orders_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>> {
        let inner = self.inner.read().await;
        let mut orders: Vec<_> = inner
            .orders
            .values()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn orders(&self) -> Result<Vec<Order>> {
        let inner = self.inner.read().await;
        let mut orders: Vec<_> = inner.orders.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update_order_status(&self, order_id: OrderId, status: OrderStatus) -> Result<Order> {
        let mut inner = self.inner.write().await;
        let order = inner
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;
        order.status = status;
        Ok(order.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_product(store: &MemoryStore, price_cents: i64, stock: u32) -> Product {
        store
            .create_product(NewProduct::new("Widget", Money::from_cents(price_cents), stock))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_and_fetch_product() {
        let store = MemoryStore::new();
        let product = seed_product(&store, 500, 10).await;

        let fetched = store.product(product.id).await.unwrap().unwrap();
        assert_eq!(fetched, product);

        let missing = store.product(ProductId::new()).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn adjust_stock_is_relative() {
        let store = MemoryStore::new();
        let product = seed_product(&store, 500, 10).await;

        assert_eq!(store.adjust_stock(product.id, -3).await.unwrap(), 7);
        assert_eq!(store.adjust_stock(product.id, 5).await.unwrap(), 12);
    }

    #[tokio::test]
    async fn adjust_stock_rejects_going_negative() {
        let store = MemoryStore::new();
        let product = seed_product(&store, 500, 2).await;

        let result = store.adjust_stock(product.id, -3).await;
        assert!(matches!(
            result,
            Err(StoreError::InsufficientStock {
                requested: 3,
                available: 2,
                ..
            })
        ));

        // Nothing changed.
        let fetched = store.product(product.id).await.unwrap().unwrap();
        assert_eq!(fetched.stock_quantity, 2);
    }

    #[tokio::test]
    async fn adjust_stock_unknown_product() {
        let store = MemoryStore::new();
        let result = store.adjust_stock(ProductId::new(), 1).await;
        assert!(matches!(result, Err(StoreError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn update_price_does_not_touch_stock() {
        let store = MemoryStore::new();
        let product = seed_product(&store, 500, 10).await;

        store
            .update_price(product.id, Money::from_cents(750))
            .await
            .unwrap();

        let fetched = store.product(product.id).await.unwrap().unwrap();
        assert_eq!(fetched.price.cents(), 750);
        assert_eq!(fetched.stock_quantity, 10);
    }

    #[tokio::test]
    async fn adding_same_product_increments_quantity() {
        let store = MemoryStore::new();
        let product = seed_product(&store, 500, 10).await;
        let customer = CustomerId::new();

        store
            .add_cart_item(customer, product.id, 2, product.price)
            .await
            .unwrap();
        let item = store
            .add_cart_item(customer, product.id, 3, product.price)
            .await
            .unwrap();

        assert_eq!(item.quantity, 5);
        let lines = store.cart_lines(customer).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);
    }

    #[tokio::test]
    async fn set_quantity_requires_existing_line() {
        let store = MemoryStore::new();
        let product = seed_product(&store, 500, 10).await;
        let customer = CustomerId::new();

        let result = store.set_cart_quantity(customer, product.id, 4).await;
        assert!(matches!(result, Err(StoreError::CartItemNotFound { .. })));

        store
            .add_cart_item(customer, product.id, 1, product.price)
            .await
            .unwrap();
        let item = store.set_cart_quantity(customer, product.id, 4).await.unwrap();
        assert_eq!(item.quantity, 4);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = MemoryStore::new();
        let product = seed_product(&store, 500, 10).await;
        let customer = CustomerId::new();

        store
            .add_cart_item(customer, product.id, 1, product.price)
            .await
            .unwrap();

        assert!(store.remove_cart_item(customer, product.id).await.unwrap());
        assert!(!store.remove_cart_item(customer, product.id).await.unwrap());
    }

    #[tokio::test]
    async fn cart_lines_join_current_product_data() {
        let store = MemoryStore::new();
        let product = seed_product(&store, 500, 10).await;
        let customer = CustomerId::new();

        store
            .add_cart_item(customer, product.id, 2, product.price)
            .await
            .unwrap();

        // Price changes after the item was added.
        store
            .update_price(product.id, Money::from_cents(650))
            .await
            .unwrap();

        let lines = store.cart_lines(customer).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].unit_price.cents(), 500);
        assert_eq!(lines[0].current_price.cents(), 650);
        assert_eq!(lines[0].line_total().cents(), 1300);
        assert_eq!(lines[0].title, "Widget");
    }

    #[tokio::test]
    async fn carts_are_isolated_per_customer() {
        let store = MemoryStore::new();
        let product = seed_product(&store, 500, 10).await;
        let alice = CustomerId::new();
        let bob = CustomerId::new();

        store
            .add_cart_item(alice, product.id, 1, product.price)
            .await
            .unwrap();

        assert!(store.cart_lines(bob).await.unwrap().is_empty());
        assert_eq!(store.clear_cart(bob).await.unwrap(), 0);
        assert_eq!(store.cart_lines(alice).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn clear_cart_reports_removed_rows() {
        let store = MemoryStore::new();
        let a = seed_product(&store, 500, 10).await;
        let b = seed_product(&store, 2000, 10).await;
        let customer = CustomerId::new();

        store.add_cart_item(customer, a.id, 1, a.price).await.unwrap();
        store.add_cart_item(customer, b.id, 1, b.price).await.unwrap();

        assert_eq!(store.clear_cart(customer).await.unwrap(), 2);
        assert!(store.cart_lines(customer).await.unwrap().is_empty());
    }

    fn order_request(customer_id: CustomerId, total_cents: i64) -> NewOrder {
        NewOrder {
            customer_id,
            total: Money::from_cents(total_cents),
            shipping_address: "1 Main St".to_string(),
            payment_method: "pending".to_string(),
        }
    }

    #[tokio::test]
    async fn create_order_persists_header_items_and_stock() {
        let store = MemoryStore::new();
        let product = seed_product(&store, 500, 10).await;
        let customer = CustomerId::new();

        let order = store
            .create_order(
                order_request(customer, 1000),
                vec![NewOrderItem {
                    product_id: product.id,
                    quantity: 2,
                    unit_price: product.price,
                }],
            )
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total.cents(), 1000);

        let items = store.order_items(order.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);

        let fetched = store.product(product.id).await.unwrap().unwrap();
        assert_eq!(fetched.stock_quantity, 8);
    }

    #[tokio::test]
    async fn create_order_rolls_back_on_missing_product() {
        let store = MemoryStore::new();
        let product = seed_product(&store, 500, 10).await;
        let customer = CustomerId::new();

        let result = store
            .create_order(
                order_request(customer, 1500),
                vec![
                    NewOrderItem {
                        product_id: product.id,
                        quantity: 2,
                        unit_price: product.price,
                    },
                    NewOrderItem {
                        product_id: ProductId::new(),
                        quantity: 1,
                        unit_price: Money::from_cents(500),
                    },
                ],
            )
            .await;
        assert!(matches!(result, Err(StoreError::ProductNotFound(_))));

        // No order, no stock change.
        assert_eq!(store.order_count().await, 0);
        let fetched = store.product(product.id).await.unwrap().unwrap();
        assert_eq!(fetched.stock_quantity, 10);
    }

    #[tokio::test]
    async fn create_order_rolls_back_on_insufficient_stock() {
        let store = MemoryStore::new();
        let plenty = seed_product(&store, 500, 10).await;
        let scarce = seed_product(&store, 2000, 1).await;
        let customer = CustomerId::new();

        let result = store
            .create_order(
                order_request(customer, 5000),
                vec![
                    NewOrderItem {
                        product_id: plenty.id,
                        quantity: 2,
                        unit_price: plenty.price,
                    },
                    NewOrderItem {
                        product_id: scarce.id,
                        quantity: 2,
                        unit_price: scarce.price,
                    },
                ],
            )
            .await;
        assert!(matches!(result, Err(StoreError::InsufficientStock { .. })));

        assert_eq!(store.order_count().await, 0);
        let fetched = store.product(plenty.id).await.unwrap().unwrap();
        assert_eq!(fetched.stock_quantity, 10);
    }

    #[tokio::test]
    async fn orders_for_customer_filters_and_sorts() {
        let store = MemoryStore::new();
        let product = seed_product(&store, 500, 100).await;
        let alice = CustomerId::new();
        let bob = CustomerId::new();

        for customer in [alice, alice, bob] {
            store
                .create_order(
                    order_request(customer, 500),
                    vec![NewOrderItem {
                        product_id: product.id,
                        quantity: 1,
                        unit_price: product.price,
                    }],
                )
                .await
                .unwrap();
        }

        assert_eq!(store.orders_for_customer(alice).await.unwrap().len(), 2);
        assert_eq!(store.orders_for_customer(bob).await.unwrap().len(), 1);
        assert_eq!(store.orders().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn update_order_status_overwrites() {
        let store = MemoryStore::new();
        let product = seed_product(&store, 500, 10).await;
        let order = store
            .create_order(
                order_request(CustomerId::new(), 500),
                vec![NewOrderItem {
                    product_id: product.id,
                    quantity: 1,
                    unit_price: product.price,
                }],
            )
            .await
            .unwrap();

        let updated = store
            .update_order_status(order.id, OrderStatus::Processing)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Processing);

        let result = store
            .update_order_status(OrderId::new(), OrderStatus::Shipped)
            .await;
        assert!(matches!(result, Err(StoreError::OrderNotFound(_))));
    }
}
