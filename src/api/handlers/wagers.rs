use axum::extract::{Path, State};
use axum::Json;
use metrics::counter;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::ApiResponse;
use crate::errors::AppError;
use crate::models::{LocalWagerRecord, Outcome};
use crate::services::{reveal, wagers};
use crate::AppState;

#[derive(Deserialize)]
pub struct PlaceWagerRequest {
    pub account: String,
    pub option_index: usize,
    pub outcome: Option<Outcome>,
    pub amount: Decimal,
}

#[derive(Deserialize)]
pub struct RevealRequest {
    pub account: String,
}

pub async fn place(
    State(state): State<AppState>,
    Path(market_id): Path<String>,
    Json(req): Json<PlaceWagerRequest>,
) -> Result<Json<ApiResponse<LocalWagerRecord>>, AppError> {
    let request = wagers::WagerRequest {
        account: req.account,
        option_index: req.option_index,
        outcome: req.outcome,
        amount: req.amount,
    };

    let record = wagers::place_wager(
        &state.db,
        state.gateway.as_ref(),
        state.decryptor.as_ref(),
        state.hints.as_deref(),
        &state.snapshots,
        state.config.chain_id,
        &market_id,
        request,
    )
    .await
    .map_err(|e| {
        counter!("wagers_rejected_total").increment(1);
        AppError::from(e)
    })?;

    Ok(Json(ApiResponse::ok(record)))
}

/// Bulk-decrypt the account's wagers on this market and return the
/// reconciled ledger.
pub async fn reveal(
    State(state): State<AppState>,
    Path(market_id): Path<String>,
    Json(req): Json<RevealRequest>,
) -> Result<Json<ApiResponse<Vec<LocalWagerRecord>>>, AppError> {
    let market = super::fetch_market(&state, &market_id).await?;

    let records = reveal::reveal_market(
        &state.db,
        state.gateway.as_ref(),
        state.decryptor.as_ref(),
        state.config.chain_id,
        &market,
        &req.account,
    )
    .await?;

    Ok(Json(ApiResponse::ok(records)))
}
