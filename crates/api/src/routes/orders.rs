//! Order placement, checkout, and lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{OrderId, OrderStatus, ProductId};
use domain::{OrderLine, PlacedOrder};
use serde::{Deserialize, Serialize};
use store::{Order, OrderItem};
use uuid::Uuid;

use crate::error::ApiError;
use crate::identity::Identity;
use crate::{AppState, Backend};

// -- Request types --

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderLineRequest>,
    pub shipping_address: String,
    pub payment_method: Option<String>,
}

#[derive(Deserialize)]
pub struct OrderLineRequest {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: String,
    pub payment_method: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

// -- Response types --

#[derive(Serialize)]
pub struct PlacedOrderResponse {
    pub order_id: String,
    pub total_cents: i64,
    pub status: OrderStatus,
}

impl From<PlacedOrder> for PlacedOrderResponse {
    fn from(placed: PlacedOrder) -> Self {
        Self {
            order_id: placed.order_id.to_string(),
            total_cents: placed.total.cents(),
            status: OrderStatus::Pending,
        }
    }
}

#[derive(Serialize)]
pub struct OrderSummaryResponse {
    pub id: String,
    pub customer_id: String,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub created_at: String,
}

impl From<Order> for OrderSummaryResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.to_string(),
            customer_id: order.customer_id.to_string(),
            total_cents: order.total.cents(),
            status: order.status,
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub customer_id: String,
    pub total_cents: i64,
    pub shipping_address: String,
    pub payment_method: String,
    pub status: OrderStatus,
    pub created_at: String,
    pub items: Vec<OrderItemResponse>,
}

fn order_to_response(order: Order, items: Vec<OrderItem>) -> OrderResponse {
    OrderResponse {
        id: order.id.to_string(),
        customer_id: order.customer_id.to_string(),
        total_cents: order.total.cents(),
        shipping_address: order.shipping_address,
        payment_method: order.payment_method,
        status: order.status,
        created_at: order.created_at.to_rfc3339(),
        items: items
            .into_iter()
            .map(|item| OrderItemResponse {
                product_id: item.product_id.to_string(),
                quantity: item.quantity,
                unit_price_cents: item.unit_price.cents(),
            })
            .collect(),
    }
}

// -- Handlers --

/// POST /orders — place an order for explicit lines.
#[tracing::instrument(skip(state, req))]
pub async fn place<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<PlacedOrderResponse>), ApiError> {
    let lines: Vec<OrderLine> = req
        .items
        .iter()
        .map(|item| OrderLine {
            product_id: ProductId::from_uuid(item.product_id),
            quantity: item.quantity,
        })
        .collect();

    let placed = state
        .orders
        .place_order(
            identity.actor(),
            &lines,
            &req.shipping_address,
            req.payment_method.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(placed.into())))
}

/// POST /checkout — place an order for the cart's contents and clear it.
#[tracing::instrument(skip(state, req))]
pub async fn checkout<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<PlacedOrderResponse>), ApiError> {
    let placed = state
        .orders
        .checkout(
            identity.actor(),
            &req.shipping_address,
            req.payment_method.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(placed.into())))
}

/// GET /orders — the caller's orders; all orders for administrators.
#[tracing::instrument(skip(state))]
pub async fn list<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
) -> Result<Json<Vec<OrderSummaryResponse>>, ApiError> {
    let orders = state.orders.orders(identity.actor()).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// GET /orders/:id — one order with its items.
#[tracing::instrument(skip(state))]
pub async fn get<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError> {
    let (order, items) = state
        .orders
        .order(identity.actor(), OrderId::from_uuid(id))
        .await?;

    Ok(Json(order_to_response(order, items)))
}

/// POST /orders/:id/cancel — cancel an order and restore stock.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderSummaryResponse>, ApiError> {
    let order = state
        .orders
        .cancel_order(identity.actor(), OrderId::from_uuid(id))
        .await?;

    Ok(Json(order.into()))
}

/// PUT /orders/:id/status — move an order along its lifecycle (admin only).
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderSummaryResponse>, ApiError> {
    let order = state
        .orders
        .update_status(identity.actor(), OrderId::from_uuid(id), req.status)
        .await?;

    Ok(Json(order.into()))
}
