pub mod auth;
pub mod relayer;

pub use auth::RelayerAuth;
pub use relayer::RelayerClient;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chain::CiphertextHandle;

#[derive(Debug, Error)]
pub enum DecryptionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request signing failed: {0}")]
    Auth(#[from] auth::AuthError),

    #[error("decryption grant expired")]
    GrantExpired,

    #[error("relayer rejected request: {0}")]
    Rejected(String),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// Time-boxed authorization to decrypt values scoped to one contract and
/// account. The relayer refuses user-scoped decryption without a live grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptionGrant {
    pub token: String,
    pub contract_address: String,
    pub account: String,
    pub expires_at: DateTime<Utc>,
}

impl DecryptionGrant {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Ciphertext plus input proof, ready to submit on-chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedAmount {
    pub ciphertext: String,
    pub input_proof: String,
}

/// The threshold decryption protocol, treated as an opaque capability.
///
/// Decryption is asynchronous on the relayer side and may take minutes; the
/// engine never enforces its own timeout on these calls.
#[async_trait]
pub trait DecryptionCapability: Send + Sync {
    /// Encrypt a base-unit amount for submission to the given contract.
    async fn encrypt_amount(
        &self,
        amount: u64,
        contract_address: &str,
        account: &str,
    ) -> Result<EncryptedAmount, DecryptionError>;

    /// Decrypt publicly decryptable handles (pool aggregates) in one batch.
    async fn public_batch_decrypt(
        &self,
        handles: &[CiphertextHandle],
    ) -> Result<HashMap<CiphertextHandle, u64>, DecryptionError>;

    /// Obtain a time-boxed grant for user-scoped decryption.
    async fn request_grant(
        &self,
        contract_address: &str,
        account: &str,
    ) -> Result<DecryptionGrant, DecryptionError>;

    /// Decrypt the user's own handles in one batch under a grant.
    async fn user_batch_decrypt(
        &self,
        grant: &DecryptionGrant,
        handles: &[CiphertextHandle],
    ) -> Result<HashMap<CiphertextHandle, u64>, DecryptionError>;
}

/// Look up a handle in a batch-decryption result. Placeholder handles were
/// never sent to the relayer and always read as zero.
pub fn decrypted_value(
    results: &HashMap<CiphertextHandle, u64>,
    handle: &CiphertextHandle,
) -> Option<u64> {
    if handle.is_placeholder() {
        return Some(0);
    }
    results.get(handle).copied()
}
