use std::sync::Arc;

use veilbet::api::router::create_router;
use veilbet::chain::HttpGateway;
use veilbet::config::AppConfig;
use veilbet::crypto::{RelayerAuth, RelayerClient};
use veilbet::hints::HttpHintStore;
use veilbet::services::payouts::PayoutTracker;
use veilbet::services::statistics::SnapshotStore;
use veilbet::services::statistics_poller::run_statistics_poller;
use veilbet::{db, metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Opening local ledger...");
    let db = db::init_pool(&config.database_url).await?;
    tracing::info!("Local ledger ready");

    let metrics_handle = metrics::init_metrics();

    let http = reqwest::Client::new();
    let gateway: Arc<dyn veilbet::chain::MarketGateway> =
        Arc::new(HttpGateway::new(http.clone(), config.gateway_url.clone()));

    let relayer_auth = RelayerAuth::new(
        config.relayer_api_key.clone(),
        config.relayer_api_secret.clone(),
    );
    let decryptor: Arc<dyn veilbet::crypto::DecryptionCapability> = Arc::new(RelayerClient::new(
        http.clone(),
        relayer_auth,
        config.relayer_url.clone(),
    ));

    let hints: Option<Arc<dyn veilbet::hints::HintStore>> = match &config.hint_store_url {
        Some(url) => Some(Arc::new(HttpHintStore::new(http.clone(), url.clone()))),
        None => {
            tracing::info!("HINT_STORE_URL not set — off-chain hints disabled");
            None
        }
    };

    let snapshots = SnapshotStore::new();

    if config.stats_poller_enabled {
        let poller_gateway = gateway.clone();
        let poller_decryptor = decryptor.clone();
        let poller_store = snapshots.clone();
        let interval_secs = config.stats_poller_interval_secs;
        tokio::spawn(async move {
            run_statistics_poller(poller_gateway, poller_decryptor, poller_store, interval_secs)
                .await;
        });
    } else {
        tracing::info!("Statistics poller disabled (STATS_POLLER_ENABLED=false)");
    }

    let state = AppState {
        db,
        config,
        gateway,
        decryptor,
        hints,
        snapshots,
        payouts: PayoutTracker::new(),
        metrics_handle,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();
}
