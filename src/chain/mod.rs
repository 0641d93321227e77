pub mod http_gateway;

pub use http_gateway::HttpGateway;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Market, OptionPool, Outcome};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("market not found: {0}")]
    NotFound(String),

    #[error("transaction rejected by user")]
    Cancelled,

    #[error("contract rejected: {0}")]
    Rejected(String),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

// ---------------------------------------------------------------------------
// Ciphertext handles
// ---------------------------------------------------------------------------

/// Opaque reference to an encrypted on-chain value. Decryptable only through
/// the decryption capability; the engine never inspects the bytes beyond the
/// placeholder check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CiphertextHandle(pub String);

impl CiphertextHandle {
    /// Contracts return an empty or all-zero handle for slots that were
    /// never written. Those decode to zero without a relayer round-trip.
    pub fn is_placeholder(&self) -> bool {
        let hex = self.0.strip_prefix("0x").unwrap_or(&self.0);
        hex.is_empty() || hex.chars().all(|c| c == '0')
    }
}

// ---------------------------------------------------------------------------
// Gateway wire types
// ---------------------------------------------------------------------------

/// The periodically published oracle aggregate for a market. Values are only
/// meaningful when `is_decrypted` is set; otherwise the oracle has not yet
/// caught up and callers fall back to live decryption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleSnapshot {
    pub market_id: String,
    pub version: u64,
    pub is_decrypted: bool,
    pub total_volume: Decimal,
    pub unique_traders: u64,
    pub pools: Vec<OptionPool>,
}

/// Encrypted per-option share handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionHandles {
    Flat {
        shares: CiphertextHandle,
    },
    Nested {
        yes: CiphertextHandle,
        no: CiphertextHandle,
    },
}

/// Every encrypted aggregate the contract exposes for one market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolHandles {
    pub total_volume: CiphertextHandle,
    pub participant_count: CiphertextHandle,
    pub options: Vec<OptionHandles>,
}

/// One of the user's own wagers as stored on-chain: cleartext placement
/// metadata plus the encrypted amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserWagerHandle {
    pub placed_at_ms: i64,
    pub option_index: usize,
    pub outcome: Option<Outcome>,
    pub amount: CiphertextHandle,
}

/// An encrypted wager ready for submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedWagerSubmission {
    pub market_id: String,
    pub account: String,
    pub option_index: usize,
    pub outcome: Option<Outcome>,
    pub ciphertext: String,
    pub input_proof: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WagerReceipt {
    pub tx_hash: String,
    /// Placement timestamp the contract recorded; the ledger merge key.
    pub placed_at_ms: i64,
}

/// Raw payout state as the contract reports it. Amounts are base units and
/// only present once processing has decrypted them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainPayoutStatus {
    pub participated: bool,
    pub has_requested: bool,
    pub is_processed: bool,
    pub has_claimed: bool,
    pub payout_amount: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: String,
}

// ---------------------------------------------------------------------------
// Gateway trait
// ---------------------------------------------------------------------------

/// Remote procedure surface of the market contract, as seen by this engine.
#[async_trait]
pub trait MarketGateway: Send + Sync {
    async fn list_markets(&self) -> Result<Vec<Market>, GatewayError>;

    async fn get_market(&self, market_id: &str) -> Result<Market, GatewayError>;

    async fn oracle_snapshot(&self, market_id: &str) -> Result<OracleSnapshot, GatewayError>;

    async fn pool_handles(&self, market_id: &str) -> Result<PoolHandles, GatewayError>;

    async fn user_wager_handles(
        &self,
        market_id: &str,
        account: &str,
    ) -> Result<Vec<UserWagerHandle>, GatewayError>;

    async fn user_balance_handle(&self, account: &str) -> Result<CiphertextHandle, GatewayError>;

    async fn submit_wager(
        &self,
        submission: &EncryptedWagerSubmission,
    ) -> Result<WagerReceipt, GatewayError>;

    async fn payout_status(
        &self,
        market_id: &str,
        account: &str,
    ) -> Result<ChainPayoutStatus, GatewayError>;

    async fn request_payout(
        &self,
        market_id: &str,
        account: &str,
    ) -> Result<TxReceipt, GatewayError>;

    async fn claim_payout(&self, market_id: &str, account: &str)
        -> Result<TxReceipt, GatewayError>;
}
