//! The order workflow.

use common::{Money, OrderStatus};
use store::{
    CartStore, CatalogStore, NewOrder, NewOrderItem, Order, OrderId, OrderItem, OrderStore,
    StoreError, order::DEFAULT_PAYMENT_METHOD,
};

use crate::actor::Actor;
use crate::error::DomainError;
use crate::order::{OrderError, OrderLine, PlacedOrder};

/// Orchestrates checkout and the order lifecycle.
///
/// Placement re-reads every price from the catalog (client input is never
/// trusted), computes the total, and persists header, items, and stock
/// consumption in a single storage transaction. Cancellation gates on the
/// status machine and restores stock per item.
pub struct OrderService<S> {
    store: S,
}

impl<S: CatalogStore + CartStore + OrderStore> OrderService<S> {
    /// Creates a new order service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Places an order for the given lines.
    ///
    /// Any missing product or short stock aborts the whole placement; no
    /// order, item, or stock change survives a failure.
    #[tracing::instrument(skip(self, lines), fields(customer_id = %actor.customer_id))]
    pub async fn place_order(
        &self,
        actor: &Actor,
        lines: &[OrderLine],
        shipping_address: &str,
        payment_method: Option<&str>,
    ) -> Result<PlacedOrder, DomainError> {
        if lines.is_empty() {
            return Err(OrderError::NoItems.into());
        }
        let shipping_address = shipping_address.trim();
        if shipping_address.is_empty() {
            return Err(OrderError::EmptyShippingAddress.into());
        }
        if let Some(line) = lines.iter().find(|line| line.quantity == 0) {
            return Err(OrderError::InvalidQuantity {
                quantity: line.quantity,
            }
            .into());
        }

        // Re-fetch every product: the catalog price at this moment is the
        // one frozen onto the order items.
        let mut items = Vec::with_capacity(lines.len());
        let mut total = Money::zero();
        for line in lines {
            let product = self
                .store
                .product(line.product_id)
                .await?
                .ok_or(OrderError::ProductNotFound {
                    product_id: line.product_id,
                })?;
            total += product.price.times(line.quantity);
            items.push(NewOrderItem {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: product.price,
            });
        }

        let order = self
            .store
            .create_order(
                NewOrder {
                    customer_id: actor.customer_id,
                    total,
                    shipping_address: shipping_address.to_string(),
                    payment_method: payment_method
                        .unwrap_or(DEFAULT_PAYMENT_METHOD)
                        .to_string(),
                },
                items,
            )
            .await
            .map_err(|e| match e {
                // A product can vanish or run short between the price read
                // and the transactional write; surface those as order
                // errors, everything else as a storage fault.
                StoreError::ProductNotFound(product_id) => {
                    DomainError::Order(OrderError::ProductNotFound { product_id })
                }
                StoreError::InsufficientStock {
                    product_id,
                    requested,
                    available,
                } => DomainError::Order(OrderError::InsufficientStock {
                    product_id,
                    requested,
                    available,
                }),
                other => DomainError::Store(other),
            })?;

        metrics::counter!("orders_placed_total").increment(1);
        tracing::info!(order_id = %order.id, total = %order.total, "order placed");

        Ok(PlacedOrder {
            order_id: order.id,
            total: order.total,
        })
    }

    /// Checks out the actor's cart: places an order for its lines, then
    /// clears the cart.
    ///
    /// A cart-clear failure after the order is placed is logged and does not
    /// fail the checkout; the order stands.
    #[tracing::instrument(skip(self), fields(customer_id = %actor.customer_id))]
    pub async fn checkout(
        &self,
        actor: &Actor,
        shipping_address: &str,
        payment_method: Option<&str>,
    ) -> Result<PlacedOrder, DomainError> {
        let start = std::time::Instant::now();

        let cart = self.store.cart_lines(actor.customer_id).await?;
        if cart.is_empty() {
            return Err(OrderError::EmptyCart.into());
        }

        let lines: Vec<OrderLine> = cart
            .iter()
            .map(|line| OrderLine {
                product_id: line.product_id,
                quantity: line.quantity,
            })
            .collect();

        let placed = self
            .place_order(actor, &lines, shipping_address, payment_method)
            .await?;

        if let Err(error) = self.store.clear_cart(actor.customer_id).await {
            tracing::warn!(
                %error,
                order_id = %placed.order_id,
                "cart clear failed after checkout, stale items remain"
            );
        }

        metrics::histogram!("checkout_duration_seconds").record(start.elapsed().as_secs_f64());
        Ok(placed)
    }

    /// Cancels an order and restores its items' stock.
    ///
    /// The actor must own the order or be an administrator, and the order
    /// must still be in a cancellable status. Restock is best-effort per
    /// item: a failed restock is logged and does not undo the cancellation
    /// or the other items' restocks.
    #[tracing::instrument(skip(self), fields(customer_id = %actor.customer_id))]
    pub async fn cancel_order(&self, actor: &Actor, order_id: OrderId) -> Result<Order, DomainError> {
        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound { order_id })?;

        if !actor.can_access_order(&order) {
            return Err(OrderError::NotOwner.into());
        }
        if !order.status.can_cancel() {
            return Err(OrderError::CannotCancel {
                status: order.status,
            }
            .into());
        }

        let items = self.store.order_items(order_id).await?;
        let cancelled = self
            .store
            .update_order_status(order_id, OrderStatus::Cancelled)
            .await?;

        for item in &items {
            if let Err(error) = self
                .store
                .adjust_stock(item.product_id, i64::from(item.quantity))
                .await
            {
                tracing::warn!(
                    %error,
                    order_id = %order_id,
                    product_id = %item.product_id,
                    quantity = item.quantity,
                    "restock failed during cancellation"
                );
            }
        }

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(order_id = %order_id, "order cancelled");
        Ok(cancelled)
    }

    /// Moves an order to a new status (administrators only).
    ///
    /// Only single forward steps are legal. A `Cancelled` target routes
    /// through [`cancel_order`](Self::cancel_order) so restock is never
    /// skipped by entering through this path.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        actor: &Actor,
        order_id: OrderId,
        new_status: OrderStatus,
    ) -> Result<Order, DomainError> {
        if !actor.is_admin() {
            return Err(OrderError::AdminRequired.into());
        }

        if new_status == OrderStatus::Cancelled {
            return self.cancel_order(actor, order_id).await;
        }

        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound { order_id })?;

        if !order.status.can_transition_to(new_status) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: new_status,
            }
            .into());
        }

        Ok(self.store.update_order_status(order_id, new_status).await?)
    }

    /// Loads an order with its items. The actor must own it or be an
    /// administrator.
    #[tracing::instrument(skip(self))]
    pub async fn order(
        &self,
        actor: &Actor,
        order_id: OrderId,
    ) -> Result<(Order, Vec<OrderItem>), DomainError> {
        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound { order_id })?;

        if !actor.can_access_order(&order) {
            return Err(OrderError::NotOwner.into());
        }

        let items = self.store.order_items(order_id).await?;
        Ok((order, items))
    }

    /// Lists orders: the actor's own, or every order for administrators.
    #[tracing::instrument(skip(self))]
    pub async fn orders(&self, actor: &Actor) -> Result<Vec<Order>, DomainError> {
        if actor.is_admin() {
            Ok(self.store.orders().await?)
        } else {
            Ok(self.store.orders_for_customer(actor.customer_id).await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::CustomerId;
    use store::{MemoryStore, NewProduct, Product};

    async fn seed_product(store: &MemoryStore, price_cents: i64, stock: u32) -> Product {
        store
            .create_product(NewProduct::new(
                "Widget",
                Money::from_cents(price_cents),
                stock,
            ))
            .await
            .unwrap()
    }

    fn line(product: &Product, quantity: u32) -> OrderLine {
        OrderLine {
            product_id: product.id,
            quantity,
        }
    }

    #[tokio::test]
    async fn place_order_computes_total_from_catalog() {
        let store = MemoryStore::new();
        let service = OrderService::new(store.clone());
        let a = seed_product(&store, 500, 10).await;
        let b = seed_product(&store, 2000, 10).await;
        let actor = Actor::customer(CustomerId::new());

        let placed = service
            .place_order(&actor, &[line(&a, 2), line(&b, 1)], "1 Main St", None)
            .await
            .unwrap();

        assert_eq!(placed.total.cents(), 3000);

        let (order, items) = service.order(&actor, placed.order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_method, "pending");
        let item_sum: Money = items.iter().map(OrderItem::line_total).sum();
        assert_eq!(order.total, item_sum);
    }

    #[tokio::test]
    async fn place_order_rejects_empty_input() {
        let store = MemoryStore::new();
        let service = OrderService::new(store);
        let actor = Actor::customer(CustomerId::new());

        let result = service.place_order(&actor, &[], "1 Main St", None).await;
        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::NoItems))
        ));
    }

    #[tokio::test]
    async fn place_order_rejects_blank_address() {
        let store = MemoryStore::new();
        let service = OrderService::new(store.clone());
        let product = seed_product(&store, 500, 10).await;
        let actor = Actor::customer(CustomerId::new());

        let result = service
            .place_order(&actor, &[line(&product, 1)], "   ", None)
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::EmptyShippingAddress))
        ));
    }

    #[tokio::test]
    async fn place_order_rejects_zero_quantity() {
        let store = MemoryStore::new();
        let service = OrderService::new(store.clone());
        let product = seed_product(&store, 500, 10).await;
        let actor = Actor::customer(CustomerId::new());

        let result = service
            .place_order(&actor, &[line(&product, 0)], "1 Main St", None)
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::InvalidQuantity { .. }))
        ));
    }

    #[tokio::test]
    async fn place_order_aborts_on_missing_product() {
        let store = MemoryStore::new();
        let service = OrderService::new(store.clone());
        let product = seed_product(&store, 500, 10).await;
        let actor = Actor::customer(CustomerId::new());

        let missing = OrderLine {
            product_id: common::ProductId::new(),
            quantity: 1,
        };
        let result = service
            .place_order(&actor, &[line(&product, 2), missing], "1 Main St", None)
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::ProductNotFound { .. }))
        ));

        // Nothing persisted, nothing consumed.
        assert!(service.orders(&actor).await.unwrap().is_empty());
        assert_eq!(
            store.product(product.id).await.unwrap().unwrap().stock_quantity,
            10
        );
    }

    #[tokio::test]
    async fn place_order_consumes_stock_and_rejects_oversell() {
        let store = MemoryStore::new();
        let service = OrderService::new(store.clone());
        let product = seed_product(&store, 500, 3).await;
        let actor = Actor::customer(CustomerId::new());

        service
            .place_order(&actor, &[line(&product, 2)], "1 Main St", None)
            .await
            .unwrap();
        assert_eq!(
            store.product(product.id).await.unwrap().unwrap().stock_quantity,
            1
        );

        let result = service
            .place_order(&actor, &[line(&product, 2)], "1 Main St", None)
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::InsufficientStock {
                requested: 2,
                available: 1,
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn prices_are_frozen_at_placement() {
        let store = MemoryStore::new();
        let service = OrderService::new(store.clone());
        let product = seed_product(&store, 500, 10).await;
        let actor = Actor::customer(CustomerId::new());

        let placed = service
            .place_order(&actor, &[line(&product, 2)], "1 Main St", None)
            .await
            .unwrap();

        store
            .update_price(product.id, Money::from_cents(9900))
            .await
            .unwrap();

        let (order, items) = service.order(&actor, placed.order_id).await.unwrap();
        assert_eq!(items[0].unit_price.cents(), 500);
        assert_eq!(order.total.cents(), 1000);
    }

    #[tokio::test]
    async fn cancel_restores_stock_per_item() {
        let store = MemoryStore::new();
        let service = OrderService::new(store.clone());
        let a = seed_product(&store, 500, 50).await;
        let b = seed_product(&store, 2000, 20).await;
        let actor = Actor::customer(CustomerId::new());

        let placed = service
            .place_order(&actor, &[line(&a, 2), line(&b, 1)], "1 Main St", None)
            .await
            .unwrap();
        assert_eq!(store.product(a.id).await.unwrap().unwrap().stock_quantity, 48);
        assert_eq!(store.product(b.id).await.unwrap().unwrap().stock_quantity, 19);

        let cancelled = service.cancel_order(&actor, placed.order_id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(store.product(a.id).await.unwrap().unwrap().stock_quantity, 50);
        assert_eq!(store.product(b.id).await.unwrap().unwrap().stock_quantity, 20);
    }

    #[tokio::test]
    async fn cancel_requires_ownership_or_admin() {
        let store = MemoryStore::new();
        let service = OrderService::new(store.clone());
        let product = seed_product(&store, 500, 10).await;
        let owner = Actor::customer(CustomerId::new());

        let placed = service
            .place_order(&owner, &[line(&product, 1)], "1 Main St", None)
            .await
            .unwrap();

        let stranger = Actor::customer(CustomerId::new());
        let result = service.cancel_order(&stranger, placed.order_id).await;
        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::NotOwner))
        ));

        // An admin who is not the owner may cancel.
        let admin = Actor::admin(CustomerId::new());
        let cancelled = service.cancel_order(&admin, placed.order_id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn cancel_gates_on_status() {
        let store = MemoryStore::new();
        let service = OrderService::new(store.clone());
        let product = seed_product(&store, 500, 10).await;
        let actor = Actor::customer(CustomerId::new());
        let admin = Actor::admin(CustomerId::new());

        let placed = service
            .place_order(&actor, &[line(&product, 3)], "1 Main St", None)
            .await
            .unwrap();

        // Walk the order to Delivered.
        for status in [
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            service
                .update_status(&admin, placed.order_id, status)
                .await
                .unwrap();
        }

        let result = service.cancel_order(&actor, placed.order_id).await;
        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::CannotCancel {
                status: OrderStatus::Delivered
            }))
        ));

        // Delivered means consumed: no stock came back.
        assert_eq!(store.product(product.id).await.unwrap().unwrap().stock_quantity, 7);
    }

    #[tokio::test]
    async fn cancel_twice_fails_and_restocks_once() {
        let store = MemoryStore::new();
        let service = OrderService::new(store.clone());
        let product = seed_product(&store, 500, 10).await;
        let actor = Actor::customer(CustomerId::new());

        let placed = service
            .place_order(&actor, &[line(&product, 4)], "1 Main St", None)
            .await
            .unwrap();
        service.cancel_order(&actor, placed.order_id).await.unwrap();

        let result = service.cancel_order(&actor, placed.order_id).await;
        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::CannotCancel {
                status: OrderStatus::Cancelled
            }))
        ));
        assert_eq!(store.product(product.id).await.unwrap().unwrap().stock_quantity, 10);
    }

    #[tokio::test]
    async fn update_status_is_admin_only_and_stepwise() {
        let store = MemoryStore::new();
        let service = OrderService::new(store.clone());
        let product = seed_product(&store, 500, 10).await;
        let actor = Actor::customer(CustomerId::new());
        let admin = Actor::admin(CustomerId::new());

        let placed = service
            .place_order(&actor, &[line(&product, 1)], "1 Main St", None)
            .await
            .unwrap();

        let result = service
            .update_status(&actor, placed.order_id, OrderStatus::Processing)
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::AdminRequired))
        ));

        // Skipping a step is not a legal transition.
        let result = service
            .update_status(&admin, placed.order_id, OrderStatus::Shipped)
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Shipped
            }))
        ));

        let updated = service
            .update_status(&admin, placed.order_id, OrderStatus::Processing)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Processing);
    }

    #[tokio::test]
    async fn update_status_to_cancelled_restocks() {
        let store = MemoryStore::new();
        let service = OrderService::new(store.clone());
        let product = seed_product(&store, 500, 10).await;
        let actor = Actor::customer(CustomerId::new());
        let admin = Actor::admin(CustomerId::new());

        let placed = service
            .place_order(&actor, &[line(&product, 5)], "1 Main St", None)
            .await
            .unwrap();

        let cancelled = service
            .update_status(&admin, placed.order_id, OrderStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(store.product(product.id).await.unwrap().unwrap().stock_quantity, 10);
    }

    #[tokio::test]
    async fn order_listing_scopes_by_role() {
        let store = MemoryStore::new();
        let service = OrderService::new(store.clone());
        let product = seed_product(&store, 500, 100).await;
        let alice = Actor::customer(CustomerId::new());
        let bob = Actor::customer(CustomerId::new());
        let admin = Actor::admin(CustomerId::new());

        for actor in [&alice, &alice, &bob] {
            service
                .place_order(actor, &[line(&product, 1)], "1 Main St", None)
                .await
                .unwrap();
        }

        assert_eq!(service.orders(&alice).await.unwrap().len(), 2);
        assert_eq!(service.orders(&bob).await.unwrap().len(), 1);
        assert_eq!(service.orders(&admin).await.unwrap().len(), 3);

        // Strangers cannot read each other's orders.
        let bobs = service.orders(&bob).await.unwrap();
        let result = service.order(&alice, bobs[0].id).await;
        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::NotOwner))
        ));
    }
}
