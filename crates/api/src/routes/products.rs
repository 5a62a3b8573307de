//! Catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{Money, ProductId};
use serde::{Deserialize, Serialize};
use store::{CatalogStore, NewProduct, Product};
use uuid::Uuid;

use crate::error::ApiError;
use crate::identity::Identity;
use crate::{AppState, Backend};

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub title: String,
    pub image_url: Option<String>,
    pub price_cents: i64,
    pub stock_quantity: u32,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub title: String,
    pub image_url: Option<String>,
    pub price_cents: i64,
    pub stock_quantity: u32,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id.to_string(),
            title: p.title,
            image_url: p.image_url,
            price_cents: p.price.cents(),
            stock_quantity: p.stock_quantity,
        }
    }
}

/// POST /products — create a catalog product (admin only).
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Json(req): Json<CreateProductRequest>,
) -> Result<(axum::http::StatusCode, Json<ProductResponse>), ApiError> {
    if !identity.actor().is_admin() {
        return Err(ApiError::Domain(domain::OrderError::AdminRequired.into()));
    }
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }
    if req.price_cents < 0 {
        return Err(ApiError::BadRequest(
            "Price must not be negative".to_string(),
        ));
    }

    let product = state
        .catalog
        .create_product(NewProduct {
            title: req.title,
            image_url: req.image_url,
            price: Money::from_cents(req.price_cents),
            stock_quantity: req.stock_quantity,
        })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((axum::http::StatusCode::CREATED, Json(product.into())))
}

/// GET /products — list the catalog.
#[tracing::instrument(skip(state))]
pub async fn list<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state
        .catalog
        .products()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// GET /products/:id — fetch one product.
#[tracing::instrument(skip(state))]
pub async fn get<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id = ProductId::from_uuid(id);
    let product = state
        .catalog
        .product(product_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Product {product_id} not found")))?;

    Ok(Json(product.into()))
}
