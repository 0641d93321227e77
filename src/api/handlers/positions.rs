use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use super::ApiResponse;
use crate::db::wager_repo;
use crate::errors::AppError;
use crate::models::PositionAggregate;
use crate::services::positions::aggregate_positions;
use crate::services::statistics::refresh_statistics;
use crate::AppState;

#[derive(Deserialize)]
pub struct PositionsQuery {
    pub account: String,
}

pub async fn list(
    State(state): State<AppState>,
    Path(market_id): Path<String>,
    Query(query): Query<PositionsQuery>,
) -> Result<Json<ApiResponse<Vec<PositionAggregate>>>, AppError> {
    let market = super::fetch_market(&state, &market_id).await?;

    let snapshot = match state.snapshots.current(&market.id).await {
        Some(snapshot) => snapshot,
        None => {
            refresh_statistics(
                state.gateway.as_ref(),
                state.decryptor.as_ref(),
                &state.snapshots,
                &market,
            )
            .await
        }
    };

    let wagers = wager_repo::list_for_market(
        &state.db,
        &query.account,
        state.config.chain_id,
        &market_id,
    )
    .await?;

    let positions = aggregate_positions(&market, &snapshot, &wagers);

    Ok(Json(ApiResponse::ok(positions)))
}
