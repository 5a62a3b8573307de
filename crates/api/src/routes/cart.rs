//! Cart endpoints.
//!
//! The cart view (`GET /cart`) always answers 200: a storage failure
//! renders as an empty cart with a zero total, per the service contract.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::ProductId;
use serde::{Deserialize, Serialize};
use store::{CartItem, CartLine};
use uuid::Uuid;

use crate::error::ApiError;
use crate::identity::Identity;
use crate::{AppState, Backend};

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: u32,
}

#[derive(Serialize)]
pub struct CartItemResponse {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

impl From<CartItem> for CartItemResponse {
    fn from(item: CartItem) -> Self {
        Self {
            product_id: item.product_id.to_string(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price.cents(),
        }
    }
}

#[derive(Serialize)]
pub struct CartLineResponse {
    pub product_id: String,
    pub title: String,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub current_price_cents: i64,
    pub line_total_cents: i64,
}

#[derive(Serialize)]
pub struct CartResponse {
    pub items: Vec<CartLineResponse>,
    pub item_count: u32,
    pub total_cents: i64,
}

fn line_to_response(line: &CartLine) -> CartLineResponse {
    CartLineResponse {
        product_id: line.product_id.to_string(),
        title: line.title.clone(),
        image_url: line.image_url.clone(),
        quantity: line.quantity,
        unit_price_cents: line.unit_price.cents(),
        current_price_cents: line.current_price.cents(),
        line_total_cents: line.line_total().cents(),
    }
}

/// POST /cart/items — add a product to the cart.
#[tracing::instrument(skip(state, req))]
pub async fn add_item<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartItemResponse>), ApiError> {
    let item = state
        .cart
        .add_item(
            identity.actor(),
            ProductId::from_uuid(req.product_id),
            req.quantity,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(item.into())))
}

/// PUT /cart/items/:product_id — overwrite a line's quantity.
#[tracing::instrument(skip(state, req))]
pub async fn set_quantity<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(product_id): Path<Uuid>,
    Json(req): Json<SetQuantityRequest>,
) -> Result<Json<CartItemResponse>, ApiError> {
    let item = state
        .cart
        .set_quantity(
            identity.actor(),
            ProductId::from_uuid(product_id),
            req.quantity,
        )
        .await?;

    Ok(Json(item.into()))
}

/// DELETE /cart/items/:product_id — remove a line (idempotent).
#[tracing::instrument(skip(state))]
pub async fn remove_item<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(product_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .cart
        .remove_item(identity.actor(), ProductId::from_uuid(product_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /cart — the cart with current product data and totals.
#[tracing::instrument(skip(state))]
pub async fn get<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
) -> Json<CartResponse> {
    let lines = state.cart.lines(identity.actor()).await;

    let item_count = lines.iter().map(|line| line.quantity).sum();
    let total_cents = lines
        .iter()
        .map(|line| line.line_total().cents())
        .sum();

    Json(CartResponse {
        items: lines.iter().map(line_to_response).collect(),
        item_count,
        total_cents,
    })
}

/// DELETE /cart — remove every line.
#[tracing::instrument(skip(state))]
pub async fn clear<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
) -> Result<StatusCode, ApiError> {
    state.cart.clear(identity.actor()).await?;
    Ok(StatusCode::NO_CONTENT)
}
