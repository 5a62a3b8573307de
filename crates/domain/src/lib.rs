//! Domain layer: the cart service and the order workflow.
//!
//! Services are generic over the storage traits so they run unchanged
//! against the in-memory backend and PostgreSQL.

mod actor;
pub mod cart;
mod error;
pub mod order;

pub use actor::{Actor, Role};
pub use cart::{CartError, CartService};
pub use common::{CustomerId, Money, OrderId, OrderStatus, ProductId};
pub use error::DomainError;
pub use order::{OrderError, OrderLine, OrderService, PlacedOrder};
