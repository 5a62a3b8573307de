//! The acting identity passed into every operation.
//!
//! Authentication itself happens upstream; the domain only ever sees an
//! already-resolved identity, never ambient session state.

use common::CustomerId;
use store::Order;

/// Role of the acting identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Admin,
}

/// An authenticated caller: a customer identifier plus their role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub customer_id: CustomerId,
    pub role: Role,
}

impl Actor {
    /// A regular customer.
    pub fn customer(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            role: Role::Customer,
        }
    }

    /// An administrator.
    pub fn admin(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether this actor may read or cancel the given order.
    pub fn can_access_order(&self, order: &Order) -> bool {
        self.is_admin() || order.customer_id == self.customer_id
    }
}
