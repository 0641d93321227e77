use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use super::ApiResponse;
use crate::errors::AppError;
use crate::models::PayoutStatus;
use crate::services::payouts;
use crate::AppState;

#[derive(Deserialize)]
pub struct PayoutQuery {
    pub account: String,
    /// Bypass the hint store and go straight to the chain.
    #[serde(default)]
    pub force: bool,
}

#[derive(Deserialize)]
pub struct PayoutActionRequest {
    pub account: String,
}

pub async fn status(
    State(state): State<AppState>,
    Path(market_id): Path<String>,
    Query(query): Query<PayoutQuery>,
) -> Result<Json<ApiResponse<PayoutStatus>>, AppError> {
    let market = super::fetch_market(&state, &market_id).await?;

    let status = payouts::payout_status(
        state.gateway.as_ref(),
        state.hints.as_deref(),
        &state.payouts,
        &market,
        &query.account,
        query.force,
    )
    .await?;

    Ok(Json(ApiResponse::ok(status)))
}

pub async fn request(
    State(state): State<AppState>,
    Path(market_id): Path<String>,
    Json(req): Json<PayoutActionRequest>,
) -> Result<Json<ApiResponse<PayoutStatus>>, AppError> {
    let market = super::fetch_market(&state, &market_id).await?;

    let status = payouts::request_payout(
        state.gateway.as_ref(),
        &state.payouts,
        &market,
        &req.account,
    )
    .await?;

    Ok(Json(ApiResponse::ok(status)))
}

pub async fn claim(
    State(state): State<AppState>,
    Path(market_id): Path<String>,
    Json(req): Json<PayoutActionRequest>,
) -> Result<Json<ApiResponse<PayoutStatus>>, AppError> {
    let market = super::fetch_market(&state, &market_id).await?;

    let status = payouts::claim_payout(
        &state.db,
        state.gateway.as_ref(),
        &state.payouts,
        &market,
        &req.account,
        state.config.chain_id,
    )
    .await?;

    Ok(Json(ApiResponse::ok(status)))
}
