//! Registration, login and current-user endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use domain::{AuthPayload, UserProfile};
use serde::Deserialize;
use store::CommerceStore;

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/register — create an account.
#[tracing::instrument(skip(state, req))]
pub async fn register<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "name, email and password are required".to_string(),
        ));
    }

    let profile = state
        .auth
        .register(req.name.trim(), req.email.trim(), &req.password)
        .await?;

    Ok((StatusCode::CREATED, Json(profile)))
}

/// POST /auth/login — exchange credentials for a bearer token.
#[tracing::instrument(skip(state, req))]
pub async fn login<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthPayload>, ApiError> {
    let payload = state.auth.login(&req.email, &req.password).await?;
    Ok(Json(payload))
}

/// GET /auth/me — the user behind the presented token.
#[tracing::instrument(skip(_state, user))]
pub async fn me<S: CommerceStore + Clone + 'static>(
    State(_state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(user.into()))
}
