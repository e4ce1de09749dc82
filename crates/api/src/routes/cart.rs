//! Cart endpoints. All of them require a bearer token.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use common::{CartId, CartItemId, ProductId};
use domain::cart_total;
use serde::{Deserialize, Serialize};
use store::{CartRecord, CommerceStore};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartItemResponse {
    pub id: CartItemId,
    pub product_id: Option<ProductId>,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub added_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct CartResponse {
    pub id: CartId,
    pub items: Vec<CartItemResponse>,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CartRecord> for CartResponse {
    fn from(cart: CartRecord) -> Self {
        let total_cents = cart_total(&cart).cents();
        Self {
            id: cart.id,
            items: cart
                .items
                .into_iter()
                .map(|item| CartItemResponse {
                    id: item.id,
                    product_id: item.product_id,
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price.cents(),
                    added_at: item.added_at,
                })
                .collect(),
            total_cents,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        }
    }
}

// -- Handlers --

/// GET /cart — the caller's cart, or `null` if they never had one.
#[tracing::instrument(skip(state, user))]
pub async fn get<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Option<CartResponse>>, ApiError> {
    let cart = state.cart.get_cart(user.id).await?;
    Ok(Json(cart.map(Into::into)))
}

/// POST /cart/items — add a quantity of a product.
#[tracing::instrument(skip(state, user, req))]
pub async fn add_item<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state
        .cart
        .add_item(user.id, ProductId::from_uuid(req.product_id), req.quantity)
        .await?;
    Ok(Json(cart.into()))
}

/// PATCH /cart/items/{id} — replace a line's quantity.
#[tracing::instrument(skip(state, user, req))]
pub async fn update_item<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<Option<CartResponse>>, ApiError> {
    let cart = state
        .cart
        .update_item_quantity(user.id, CartItemId::new(id), req.quantity)
        .await?;
    Ok(Json(cart.map(Into::into)))
}

/// DELETE /cart/items/{id} — remove a line.
#[tracing::instrument(skip(state, user))]
pub async fn remove_item<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Option<CartResponse>>, ApiError> {
    let cart = state
        .cart
        .remove_item(user.id, CartItemId::new(id))
        .await?;
    Ok(Json(cart.map(Into::into)))
}

/// DELETE /cart — drop every line.
#[tracing::instrument(skip(state, user))]
pub async fn clear<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Option<CartResponse>>, ApiError> {
    let cart = state.cart.clear(user.id).await?;
    Ok(Json(cart.map(Into::into)))
}
