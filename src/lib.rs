pub mod api;
pub mod chain;
pub mod config;
pub mod crypto;
pub mod db;
pub mod errors;
pub mod hints;
pub mod metrics;
pub mod models;
pub mod pricing;
pub mod services;

use std::sync::Arc;

use crate::chain::MarketGateway;
use crate::config::AppConfig;
use crate::crypto::DecryptionCapability;
use crate::hints::HintStore;
use crate::services::payouts::PayoutTracker;
use crate::services::statistics::SnapshotStore;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub config: AppConfig,
    pub gateway: Arc<dyn MarketGateway>,
    pub decryptor: Arc<dyn DecryptionCapability>,
    pub hints: Option<Arc<dyn HintStore>>,
    pub snapshots: SnapshotStore,
    pub payouts: PayoutTracker,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}
