//! Product catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{CategoryId, Money, ProductId};
use serde::{Deserialize, Serialize};
use store::{CommerceStore, NewProduct, ProductChanges, ProductQuery, ProductRecord, ProductSort};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub sort: ProductSort,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Deserialize)]
pub struct FeaturedParams {
    pub limit: Option<u32>,
}

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub sku: String,
    #[serde(default)]
    pub stock_quantity: i32,
    pub image_url: Option<String>,
    pub category_id: Uuid,
}

#[derive(Deserialize, Default)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub sku: Option<String>,
    pub stock_quantity: Option<i32>,
    pub image_url: Option<String>,
    pub category_id: Option<Uuid>,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub sku: String,
    pub stock_quantity: i32,
    pub image_url: Option<String>,
    pub category_id: CategoryId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct ProductPageResponse {
    pub items: Vec<ProductResponse>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
}

impl From<ProductRecord> for ProductResponse {
    fn from(p: ProductRecord) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            price_cents: p.price.cents(),
            sku: p.sku,
            stock_quantity: p.stock_quantity,
            image_url: p.image_url,
            category_id: p.category_id,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

// -- Handlers --

/// GET /products — list with filtering, sorting and pagination.
#[tracing::instrument(skip(state, params))]
pub async fn list<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListParams>,
) -> Result<Json<ProductPageResponse>, ApiError> {
    let page = state
        .catalog
        .list_products(ProductQuery {
            category_slug: params.category,
            search: params.search,
            sort: params.sort,
            page: params.page.unwrap_or(1),
            per_page: params.per_page.unwrap_or(20),
        })
        .await?;

    Ok(Json(ProductPageResponse {
        items: page.items.into_iter().map(Into::into).collect(),
        total: page.total,
        page: page.page,
        total_pages: page.total_pages,
    }))
}

/// GET /products/featured — a random storefront selection.
#[tracing::instrument(skip(state, params))]
pub async fn featured<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<FeaturedParams>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.catalog.featured_products(params.limit).await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// GET /products/{id} — a single product.
#[tracing::instrument(skip(state))]
pub async fn get<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.catalog.get_product(ProductId::from_uuid(id)).await?;
    Ok(Json(product.into()))
}

/// POST /products — create a product (authenticated).
#[tracing::instrument(skip(state, _user, req))]
pub async fn create<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    _user: CurrentUser,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let product = state
        .catalog
        .create_product(NewProduct {
            name: req.name,
            description: req.description,
            price: Money::from_cents(req.price_cents),
            sku: req.sku,
            stock_quantity: req.stock_quantity,
            image_url: req.image_url,
            category_id: CategoryId::from_uuid(req.category_id),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(product.into())))
}

/// PATCH /products/{id} — partial update (authenticated).
#[tracing::instrument(skip(state, _user, req))]
pub async fn update<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .catalog
        .update_product(
            ProductId::from_uuid(id),
            ProductChanges {
                name: req.name,
                description: req.description,
                price: req.price_cents.map(Money::from_cents),
                sku: req.sku,
                stock_quantity: req.stock_quantity,
                image_url: req.image_url,
                category_id: req.category_id.map(CategoryId::from_uuid),
            },
        )
        .await?;

    Ok(Json(product.into()))
}
