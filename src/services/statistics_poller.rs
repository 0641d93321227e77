use std::sync::Arc;

use metrics::gauge;
use tokio::time::{interval, Duration};

use crate::chain::MarketGateway;
use crate::crypto::DecryptionCapability;
use crate::services::statistics::{refresh_statistics, SnapshotStore};

/// Periodically refresh statistics for every active market so browsing
/// always has a recent snapshot without waiting on a fetch.
pub async fn run_statistics_poller(
    gateway: Arc<dyn MarketGateway>,
    decryptor: Arc<dyn DecryptionCapability>,
    store: SnapshotStore,
    interval_secs: u64,
) {
    tracing::info!(interval_secs = interval_secs, "Statistics poller started");

    let mut ticker = interval(Duration::from_secs(interval_secs));

    loop {
        ticker.tick().await;

        let markets = match gateway.list_markets().await {
            Ok(m) => m,
            Err(e) => {
                tracing::error!(error = %e, "Statistics poller: failed to list markets");
                continue;
            }
        };

        let active: Vec<_> = markets
            .into_iter()
            .filter(|m| m.is_active && !m.is_resolved)
            .collect();

        gauge!("tracked_markets").set(active.len() as f64);

        for market in &active {
            let snapshot =
                refresh_statistics(gateway.as_ref(), decryptor.as_ref(), &store, market).await;
            tracing::debug!(
                market_id = %market.id,
                provenance = ?snapshot.provenance,
                total_volume = %snapshot.total_volume,
                "Statistics refreshed"
            );
        }
    }
}
