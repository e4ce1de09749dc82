//! Shipping quote endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use checkout::ShippingEstimator;
use serde::{Deserialize, Serialize};
use store::CommerceStore;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct QuoteParams {
    pub postal_code: String,
}

#[derive(Serialize)]
pub struct QuoteResponse {
    pub service: String,
    pub price_cents: i64,
    pub estimated_days: u32,
}

/// GET /shipping/quotes?postal_code= — mock carrier options.
#[tracing::instrument(skip(state, params))]
pub async fn quotes<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<QuoteParams>,
) -> Result<Json<Vec<QuoteResponse>>, ApiError> {
    let quotes = state.shipping.quote(&params.postal_code).await?;

    Ok(Json(
        quotes
            .into_iter()
            .map(|q| QuoteResponse {
                service: q.service,
                price_cents: q.price.cents(),
                estimated_days: q.estimated_days,
            })
            .collect(),
    ))
}
