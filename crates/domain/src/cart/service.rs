//! Cart service providing the per-customer cart operations.

use common::{Money, ProductId};
use store::{CartItem, CartLine, CartStore, CatalogStore, StoreError};

use crate::actor::Actor;
use crate::cart::CartError;
use crate::error::DomainError;

/// Service for managing a customer's cart.
///
/// Write operations return typed errors. Display reads (`lines`,
/// `item_count`, `total`) deliberately swallow storage failures into
/// empty/zero results: the storefront renders an empty cart rather than an
/// error page, and the cause is logged. Checkout does not go through these
/// reads, so a broken store fails checkout instead of ordering nothing.
pub struct CartService<S> {
    store: S,
}

impl<S: CatalogStore + CartStore> CartService<S> {
    /// Creates a new cart service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Adds a product to the actor's cart, incrementing the quantity when a
    /// line for it already exists.
    ///
    /// The catalog price is captured onto the line for display; checkout
    /// re-reads the catalog and never trusts this snapshot.
    #[tracing::instrument(skip(self), fields(customer_id = %actor.customer_id))]
    pub async fn add_item(
        &self,
        actor: &Actor,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartItem, DomainError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity }.into());
        }

        let product = self
            .store
            .product(product_id)
            .await?
            .ok_or(CartError::ProductNotFound { product_id })?;

        let item = self
            .store
            .add_cart_item(actor.customer_id, product_id, quantity, product.price)
            .await?;
        Ok(item)
    }

    /// Overwrites the quantity of an existing cart line.
    #[tracing::instrument(skip(self), fields(customer_id = %actor.customer_id))]
    pub async fn set_quantity(
        &self,
        actor: &Actor,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartItem, DomainError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity }.into());
        }

        self.store
            .set_cart_quantity(actor.customer_id, product_id, quantity)
            .await
            .map_err(|e| match e {
                StoreError::CartItemNotFound { product_id, .. } => {
                    CartError::ItemNotFound { product_id }.into()
                }
                other => DomainError::Store(other),
            })
    }

    /// Removes a cart line. Removing an absent line is not an error; the
    /// returned flag tells whether anything was deleted.
    #[tracing::instrument(skip(self), fields(customer_id = %actor.customer_id))]
    pub async fn remove_item(
        &self,
        actor: &Actor,
        product_id: ProductId,
    ) -> Result<bool, DomainError> {
        Ok(self
            .store
            .remove_cart_item(actor.customer_id, product_id)
            .await?)
    }

    /// Returns the cart joined with current product data, or an empty vec
    /// when the store fails.
    pub async fn lines(&self, actor: &Actor) -> Vec<CartLine> {
        match self.store.cart_lines(actor.customer_id).await {
            Ok(lines) => lines,
            Err(error) => {
                tracing::warn!(
                    %error,
                    customer_id = %actor.customer_id,
                    "cart read failed, rendering empty cart"
                );
                Vec::new()
            }
        }
    }

    /// Total quantity across all cart lines; 0 when the store fails.
    pub async fn item_count(&self, actor: &Actor) -> u32 {
        self.lines(actor).await.iter().map(|line| line.quantity).sum()
    }

    /// Cart total at current catalog prices; zero when the store fails.
    pub async fn total(&self, actor: &Actor) -> Money {
        self.lines(actor)
            .await
            .iter()
            .map(CartLine::line_total)
            .sum()
    }

    /// Deletes every line in the actor's cart.
    #[tracing::instrument(skip(self), fields(customer_id = %actor.customer_id))]
    pub async fn clear(&self, actor: &Actor) -> Result<u64, DomainError> {
        Ok(self.store.clear_cart(actor.customer_id).await?)
    }
}
