use metrics::counter;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::chain::{CiphertextHandle, GatewayError, MarketGateway};
use crate::crypto::{decrypted_value, DecryptionCapability, DecryptionError};
use crate::db::wager_repo;
use crate::models::{from_base_units, LocalWagerRecord, Market, RevealedWager};

#[derive(Debug, Error)]
pub enum RevealError {
    #[error("gateway unavailable: {0}")]
    Gateway(#[from] GatewayError),

    #[error("decryption unavailable: {0}")]
    Decryption(#[from] DecryptionError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Decrypt every wager this account holds on a market and fold the results
/// into the local ledger.
///
/// This is how optimistic records become oracle-confirmed truth, and how a
/// fresh session recovers positions it never saw placed. The merge keys on
/// placement timestamp and is idempotent; locally-known `tx_hash` and
/// `price_at_wager` survive because the decrypted side has neither.
pub async fn reveal_market(
    db: &SqlitePool,
    gateway: &dyn MarketGateway,
    decryptor: &dyn DecryptionCapability,
    chain_id: i64,
    market: &Market,
    account: &str,
) -> Result<Vec<LocalWagerRecord>, RevealError> {
    let handles = gateway.user_wager_handles(&market.id, account).await?;

    if handles.is_empty() {
        return Ok(wager_repo::list_for_market(db, account, chain_id, &market.id).await?);
    }

    // Placeholder amount handles decode to zero locally; everything else
    // goes to the relayer as one user-scoped batch under a fresh grant.
    let batch: Vec<CiphertextHandle> = handles
        .iter()
        .filter(|h| !h.amount.is_placeholder())
        .map(|h| h.amount.clone())
        .collect();

    let results = if batch.is_empty() {
        Default::default()
    } else {
        let grant = decryptor
            .request_grant(&market.contract_address, account)
            .await?;
        decryptor.user_batch_decrypt(&grant, &batch).await?
    };

    let mut revealed = Vec::with_capacity(handles.len());
    for handle in &handles {
        let raw = decrypted_value(&results, &handle.amount).ok_or_else(|| {
            anyhow::anyhow!("wager amount handle missing from decryption result")
        })?;
        revealed.push(RevealedWager {
            placed_at_ms: handle.placed_at_ms,
            option_index: handle.option_index,
            outcome: handle.outcome,
            amount: from_base_units(raw),
        });
    }

    wager_repo::merge_revealed(db, account, chain_id, &market.id, &revealed).await?;

    counter!("reveals_total").increment(1);
    tracing::info!(
        market_id = %market.id,
        account = %account,
        wager_count = revealed.len(),
        "Wagers revealed"
    );

    Ok(wager_repo::list_for_market(db, account, chain_id, &market.id).await?)
}
