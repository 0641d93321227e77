pub mod http_store;

pub use http_store::HttpHintStore;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Outcome;

#[derive(Debug, Error)]
pub enum HintError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// Cleartext wager terms mirrored off-chain for fast UX hints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WagerHint {
    pub market_id: String,
    pub account: String,
    pub option_index: usize,
    pub outcome: Option<Outcome>,
    pub amount: Decimal,
    pub placed_at_ms: i64,
    pub tx_hash: String,
}

/// Best-effort off-chain record store.
///
/// Nothing here is authoritative: writes may be dropped, reads may be stale,
/// and every failure is logged and otherwise ignored by callers. No core
/// flow is allowed to change behavior on a hint-store error.
#[async_trait]
pub trait HintStore: Send + Sync {
    async fn record_wager(&self, hint: &WagerHint) -> Result<(), HintError>;

    /// Whether this account's position on a resolved market is a known loss.
    /// `None` means the store has no opinion.
    async fn resolved_loss(
        &self,
        market_id: &str,
        account: &str,
    ) -> Result<Option<bool>, HintError>;
}
