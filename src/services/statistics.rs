use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use tokio::sync::{broadcast, RwLock};

use crate::chain::{CiphertextHandle, MarketGateway, OptionHandles};
use crate::crypto::{decrypted_value, DecryptionCapability};
use crate::models::{from_base_units, Market, MarketKind, OptionPool, Provenance, StatisticsSnapshot};

/// Process-wide snapshot registry, keyed by market id.
///
/// Publishing goes through `publish`, which enforces oracle authority: an
/// `OracleDecrypted` snapshot stands until the oracle version advances, no
/// matter how many live or degraded fetches land in between. Consumers
/// either read `current` or subscribe to the broadcast and re-derive their
/// own figures from each snapshot.
#[derive(Clone)]
pub struct SnapshotStore {
    inner: Arc<RwLock<HashMap<String, StatisticsSnapshot>>>,
    tx: broadcast::Sender<StatisticsSnapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            tx,
        }
    }

    pub async fn current(&self, market_id: &str) -> Option<StatisticsSnapshot> {
        self.inner.read().await.get(market_id).cloned()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatisticsSnapshot> {
        self.tx.subscribe()
    }

    /// Publish a snapshot and return the one consumers should now use —
    /// which is the existing snapshot when an authoritative oracle value
    /// would otherwise be clobbered by a live or degraded fetch.
    pub async fn publish(&self, snapshot: StatisticsSnapshot) -> StatisticsSnapshot {
        let mut map = self.inner.write().await;

        let adopted = match map.get(&snapshot.market_id) {
            Some(existing)
                if existing.provenance == Provenance::OracleDecrypted
                    && snapshot.provenance != Provenance::OracleDecrypted
                    && snapshot.oracle_version <= existing.oracle_version =>
            {
                existing.clone()
            }
            _ => {
                map.insert(snapshot.market_id.clone(), snapshot.clone());
                snapshot
            }
        };
        drop(map);

        let _ = self.tx.send(adopted.clone());
        adopted
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Refresh one market's statistics and publish the result.
///
/// Never fails: the worst case is a zero-filled `Degraded` snapshot, so
/// statistics unavailability cannot block browsing.
pub async fn refresh_statistics(
    gateway: &dyn MarketGateway,
    decryptor: &dyn DecryptionCapability,
    store: &SnapshotStore,
    market: &Market,
) -> StatisticsSnapshot {
    let snapshot = fetch_statistics(gateway, decryptor, market).await;
    counter!("statistics_refreshes_total").increment(1);
    store.publish(snapshot).await
}

/// The three-tier fetch: oracle snapshot, then live batch decryption, then
/// the degraded fallback.
async fn fetch_statistics(
    gateway: &dyn MarketGateway,
    decryptor: &dyn DecryptionCapability,
    market: &Market,
) -> StatisticsSnapshot {
    let nested = market.kind == MarketKind::Nested;

    let oracle = match gateway.oracle_snapshot(&market.id).await {
        Ok(o) => o,
        Err(e) => {
            tracing::warn!(error = %e, market_id = %market.id, "Oracle snapshot fetch failed");
            counter!("degraded_snapshots_total").increment(1);
            return StatisticsSnapshot::degraded(&market.id, market.option_count(), nested, 0);
        }
    };

    if oracle.is_decrypted {
        // Authoritative and free — no reason to touch the relayer.
        return StatisticsSnapshot {
            market_id: market.id.clone(),
            total_volume: oracle.total_volume,
            pools: oracle.pools,
            unique_traders: oracle.unique_traders,
            provenance: Provenance::OracleDecrypted,
            oracle_version: oracle.version,
            fetched_at: Utc::now(),
        };
    }

    match live_decrypt(gateway, decryptor, market, oracle.version).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(
                error = %e,
                market_id = %market.id,
                "Live decryption failed, emitting degraded snapshot"
            );
            counter!("degraded_snapshots_total").increment(1);
            StatisticsSnapshot::degraded(&market.id, market.option_count(), nested, oracle.version)
        }
    }
}

/// Decrypt the market's encrypted aggregates in a single batch request.
async fn live_decrypt(
    gateway: &dyn MarketGateway,
    decryptor: &dyn DecryptionCapability,
    market: &Market,
    oracle_version: u64,
) -> anyhow::Result<StatisticsSnapshot> {
    let handles = gateway.pool_handles(&market.id).await?;

    // One batch for everything; per-handle requests are slower and billed
    // per round, so they are never issued.
    fn push(batch: &mut Vec<CiphertextHandle>, h: &CiphertextHandle) {
        if !h.is_placeholder() {
            batch.push(h.clone());
        }
    }

    let mut batch: Vec<CiphertextHandle> = Vec::new();
    push(&mut batch, &handles.total_volume);
    push(&mut batch, &handles.participant_count);
    for option in &handles.options {
        match option {
            OptionHandles::Flat { shares } => push(&mut batch, shares),
            OptionHandles::Nested { yes, no } => {
                push(&mut batch, yes);
                push(&mut batch, no);
            }
        }
    }

    let results = if batch.is_empty() {
        HashMap::new()
    } else {
        decryptor.public_batch_decrypt(&batch).await?
    };

    let read = |h: &CiphertextHandle| -> anyhow::Result<u64> {
        decrypted_value(&results, h)
            .ok_or_else(|| anyhow::anyhow!("handle missing from decryption result"))
    };

    let mut pools = Vec::with_capacity(handles.options.len());
    for option in &handles.options {
        let pool = match option {
            OptionHandles::Flat { shares } => OptionPool::Flat {
                shares: from_base_units(read(shares)?),
            },
            OptionHandles::Nested { yes, no } => OptionPool::Nested {
                yes_shares: from_base_units(read(yes)?),
                no_shares: from_base_units(read(no)?),
            },
        };
        pools.push(pool);
    }

    let total_volume = from_base_units(read(&handles.total_volume)?);
    let unique_traders = read(&handles.participant_count)?;

    Ok(StatisticsSnapshot {
        market_id: market.id.clone(),
        total_volume,
        pools,
        unique_traders,
        provenance: Provenance::LiveDecrypted,
        oracle_version,
        fetched_at: Utc::now(),
    })
}
