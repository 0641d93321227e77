use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::ApiResponse;
use crate::db::{balance_repo, wager_repo};
use crate::errors::AppError;
use crate::models::BalanceCacheEntry;
use crate::services::balance;
use crate::AppState;

#[derive(Deserialize)]
pub struct BalanceQuery {
    pub account: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub account: String,
}

#[derive(Serialize)]
pub struct BalanceView {
    /// `None` renders as "balance unknown" — the cache is empty or expired.
    pub balance: Option<rust_decimal::Decimal>,
    pub cached_at: Option<chrono::DateTime<chrono::Utc>>,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<Option<BalanceCacheEntry>> for BalanceView {
    fn from(entry: Option<BalanceCacheEntry>) -> Self {
        match entry {
            Some(e) => Self {
                balance: Some(e.balance),
                cached_at: Some(e.created_at),
                expires_at: Some(e.expires_at),
            },
            None => Self {
                balance: None,
                cached_at: None,
                expires_at: None,
            },
        }
    }
}

pub async fn get(
    State(state): State<AppState>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<ApiResponse<BalanceView>>, AppError> {
    let entry =
        balance_repo::get_valid(&state.db, &query.account, state.config.chain_id).await?;
    Ok(Json(ApiResponse::ok(entry.into())))
}

/// Decrypt the account's balance through the relayer and cache it.
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<BalanceView>>, AppError> {
    let entry = balance::refresh_balance(
        &state.db,
        state.gateway.as_ref(),
        state.decryptor.as_ref(),
        &state.config.token_contract,
        &req.account,
        state.config.chain_id,
        state.config.balance_cache_ttl(),
    )
    .await?;

    Ok(Json(ApiResponse::ok(Some(entry).into())))
}

/// Drop the cached balance for an account.
pub async fn invalidate(
    State(state): State<AppState>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    balance_repo::invalidate(&state.db, &query.account, state.config.chain_id).await?;
    Ok(Json(ApiResponse::ok(())))
}

/// End-of-session cleanup: forget the account's ledger and balance on this
/// chain. Called on logout and network switch.
pub async fn clear_session(
    State(state): State<AppState>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    wager_repo::wipe_account(&state.db, &query.account, state.config.chain_id).await?;
    balance_repo::invalidate(&state.db, &query.account, state.config.chain_id).await?;
    Ok(Json(ApiResponse::ok(())))
}
