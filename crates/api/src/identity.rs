//! Identity extraction from request headers.
//!
//! Authentication itself lives upstream (a session gateway terminates the
//! login flow); by the time a request reaches this service, the resolved
//! identity arrives in headers:
//!
//! - `x-customer-id` — customer UUID (required)
//! - `x-role` — `customer` (default) or `admin`

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::CustomerId;
use domain::{Actor, Role};

use crate::error::ApiError;

pub const CUSTOMER_ID_HEADER: &str = "x-customer-id";
pub const ROLE_HEADER: &str = "x-role";

/// The authenticated caller, extractable in any handler.
#[derive(Debug, Clone, Copy)]
pub struct Identity(pub Actor);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let customer_id = parts
            .headers
            .get(CUSTOMER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ApiError::Unauthorized(format!("Missing {CUSTOMER_ID_HEADER} header"))
            })?;
        let customer_id: CustomerId = customer_id
            .parse()
            .map_err(|e| ApiError::BadRequest(format!("Invalid {CUSTOMER_ID_HEADER}: {e}")))?;

        let role = match parts.headers.get(ROLE_HEADER).map(|v| v.to_str()) {
            None => Role::Customer,
            Some(Ok("customer")) => Role::Customer,
            Some(Ok("admin")) => Role::Admin,
            Some(_) => {
                return Err(ApiError::BadRequest(format!(
                    "Invalid {ROLE_HEADER}: expected \"customer\" or \"admin\""
                )));
            }
        };

        Ok(Identity(Actor { customer_id, role }))
    }
}

impl Identity {
    pub fn actor(&self) -> &Actor {
        &self.0
    }
}
