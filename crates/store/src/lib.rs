//! Storage layer for the storefront.
//!
//! Defines the entities and the [`CatalogStore`], [`CartStore`], and
//! [`OrderStore`] traits, with two interchangeable backends:
//! [`MemoryStore`] for tests and local runs, and [`PostgresStore`] backed by
//! sqlx with migrations under `migrations/`.

pub mod cart;
pub mod error;
pub mod memory;
pub mod order;
pub mod postgres;
pub mod product;
pub mod store;

pub use cart::{CartItem, CartLine};
pub use common::{CustomerId, Money, OrderId, OrderStatus, ProductId};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use order::{NewOrder, NewOrderItem, Order, OrderItem};
pub use postgres::PostgresStore;
pub use product::{NewProduct, Product};
pub use store::{CartStore, CatalogStore, OrderStore};
