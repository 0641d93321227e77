use chrono::Duration;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::chain::{GatewayError, MarketGateway};
use crate::crypto::{decrypted_value, DecryptionCapability, DecryptionError};
use crate::db::balance_repo;
use crate::models::{from_base_units, BalanceCacheEntry};

#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("gateway unavailable: {0}")]
    Gateway(#[from] GatewayError),

    #[error("decryption unavailable: {0}")]
    Decryption(#[from] DecryptionError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Decrypt the account's balance under a user-scoped grant and cache the
/// cleartext. The balance analogue of revealing wagers.
pub async fn refresh_balance(
    db: &SqlitePool,
    gateway: &dyn MarketGateway,
    decryptor: &dyn DecryptionCapability,
    token_contract: &str,
    account: &str,
    chain_id: i64,
    ttl: Duration,
) -> Result<BalanceCacheEntry, BalanceError> {
    let handle = gateway.user_balance_handle(account).await?;

    let balance = if handle.is_placeholder() {
        rust_decimal::Decimal::ZERO
    } else {
        let grant = decryptor.request_grant(token_contract, account).await?;
        let handles = [handle.clone()];
        let results = decryptor.user_batch_decrypt(&grant, &handles).await?;
        let raw = decrypted_value(&results, &handle)
            .ok_or_else(|| anyhow::anyhow!("balance handle missing from decryption result"))?;
        from_base_units(raw)
    };

    let entry = balance_repo::store_balance(db, account, chain_id, balance, ttl).await?;

    tracing::info!(account = %account, "Balance decrypted and cached");
    Ok(entry)
}
