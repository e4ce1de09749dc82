//! Order endpoints: checkout and order history.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{OrderId, OrderItemId, ProductId};
use serde::{Deserialize, Serialize};
use store::{Address, CommerceStore, OrderRecord, OrderStatus};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub id: OrderItemId,
    pub product_id: Option<ProductId>,
    pub product_name: Option<String>,
    pub product_sku: Option<String>,
    pub quantity: i32,
    pub unit_price_cents: i64,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub items: Vec<OrderItemResponse>,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderRecord> for OrderResponse {
    fn from(order: OrderRecord) -> Self {
        Self {
            id: order.id,
            status: order.status,
            total_cents: order.total.cents(),
            items: order
                .items
                .into_iter()
                .map(|item| OrderItemResponse {
                    id: item.id,
                    product_id: item.product_id,
                    product_name: item.product_name,
                    product_sku: item.product_sku,
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price.cents(),
                })
                .collect(),
            shipping_address: order.shipping_address,
            billing_address: order.billing_address,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

// -- Handlers --

/// POST /orders — convert the caller's cart into an order.
#[tracing::instrument(skip(state, user, req))]
pub async fn create<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let order = state
        .checkout
        .place_order(user.id, req.shipping_address, req.billing_address)
        .await?;

    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /orders — the caller's orders, newest first.
#[tracing::instrument(skip(state, user))]
pub async fn list<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.orders_for_user(user.id).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// GET /orders/{id} — one of the caller's orders.
#[tracing::instrument(skip(state, user))]
pub async fn get<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .orders
        .find_order(OrderId::from_uuid(id), Some(user.id))
        .await?;
    Ok(Json(order.into()))
}
