//! Category endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::CategoryId;
use serde::{Deserialize, Serialize};
use store::{CategoryRecord, CommerceStore, NewCategory};

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

#[derive(Serialize)]
pub struct CategoryResponse {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CategoryRecord> for CategoryResponse {
    fn from(c: CategoryRecord) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            description: c.description,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// GET /categories — all categories.
#[tracing::instrument(skip(state))]
pub async fn list<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = state.catalog.list_categories().await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// POST /categories — create a category (authenticated).
#[tracing::instrument(skip(state, _user, req))]
pub async fn create<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    _user: CurrentUser,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    if req.name.trim().is_empty() || req.slug.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "name and slug are required".to_string(),
        ));
    }

    let category = state
        .catalog
        .create_category(NewCategory {
            name: req.name,
            slug: req.slug,
            description: req.description,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(category.into())))
}
