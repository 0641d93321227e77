use axum::extract::{Path, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ApiResponse;
use crate::errors::AppError;
use crate::models::{Market, Outcome, Selection, StatisticsSnapshot};
use crate::pricing::{self, Quote};
use crate::services::statistics::refresh_statistics;
use crate::AppState;

#[derive(Serialize)]
pub struct MarketDetail {
    pub market: Market,
    pub statistics: StatisticsSnapshot,
}

#[derive(Deserialize)]
pub struct QuoteRequest {
    pub option_index: usize,
    pub outcome: Option<Outcome>,
    pub amount: Decimal,
}

#[derive(Serialize)]
pub struct QuoteResponse {
    #[serde(flatten)]
    pub quote: Quote,
    /// Where the pool numbers behind this quote came from; a degraded
    /// snapshot prices a pool of zeros.
    pub provenance: crate::models::Provenance,
}

/// Latest snapshot for a market, fetching one if none is published yet.
async fn snapshot_for(state: &AppState, market: &Market) -> StatisticsSnapshot {
    match state.snapshots.current(&market.id).await {
        Some(snapshot) => snapshot,
        None => {
            refresh_statistics(
                state.gateway.as_ref(),
                state.decryptor.as_ref(),
                &state.snapshots,
                market,
            )
            .await
        }
    }
}

pub async fn list(State(state): State<AppState>) -> Json<ApiResponse<Vec<Market>>> {
    match state.gateway.list_markets().await {
        Ok(markets) => Json(ApiResponse::ok(markets)),
        Err(e) => Json(ApiResponse {
            success: false,
            data: None,
            error: Some(e.to_string()),
        }),
    }
}

pub async fn detail(
    State(state): State<AppState>,
    Path(market_id): Path<String>,
) -> Result<Json<ApiResponse<MarketDetail>>, AppError> {
    let market = super::fetch_market(&state, &market_id).await?;
    let statistics = snapshot_for(&state, &market).await;

    Ok(Json(ApiResponse::ok(MarketDetail { market, statistics })))
}

/// Manual re-check. Decryption can take minutes, so the UI exposes this
/// instead of blocking on a timeout.
pub async fn refresh(
    State(state): State<AppState>,
    Path(market_id): Path<String>,
) -> Result<Json<ApiResponse<StatisticsSnapshot>>, AppError> {
    let market = super::fetch_market(&state, &market_id).await?;

    let snapshot = refresh_statistics(
        state.gateway.as_ref(),
        state.decryptor.as_ref(),
        &state.snapshots,
        &market,
    )
    .await;

    Ok(Json(ApiResponse::ok(snapshot)))
}

/// Live price quote and projected return for a candidate wager. Recomputed
/// by the caller on every keystroke; always an estimate that moves as other
/// wagers land.
pub async fn quote(
    State(state): State<AppState>,
    Path(market_id): Path<String>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<ApiResponse<QuoteResponse>>, AppError> {
    let market = super::fetch_market(&state, &market_id).await?;
    let snapshot = snapshot_for(&state, &market).await;

    let selection = Selection {
        option_index: req.option_index,
        outcome: req.outcome,
    };
    let quote = pricing::quote(&market, &snapshot, selection, req.amount)
        .ok_or_else(|| AppError::BadRequest("selection does not match market".into()))?;

    Ok(Json(ApiResponse::ok(QuoteResponse {
        quote,
        provenance: snapshot.provenance,
    })))
}
