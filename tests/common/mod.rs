#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use veilbet::chain::{
    ChainPayoutStatus, CiphertextHandle, EncryptedWagerSubmission, GatewayError, MarketGateway,
    OracleSnapshot, PoolHandles, TxReceipt, UserWagerHandle, WagerReceipt,
};
use veilbet::config::AppConfig;
use veilbet::crypto::{DecryptionCapability, DecryptionError, DecryptionGrant, EncryptedAmount};
use veilbet::hints::{HintError, HintStore, WagerHint};
use veilbet::models::{Market, MarketKind, MarketOption, OptionPool};

pub const CHAIN_ID: i64 = 31337;
pub const ACCOUNT: &str = "0xuser";

/// Open a fresh in-memory ledger and run all migrations. A single
/// connection keeps the in-memory database alive for the whole test.
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// The Prometheus recorder is process-global; install it once and share the
/// handle across tests.
pub fn test_metrics_handle() -> PrometheusHandle {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    HANDLE.get_or_init(veilbet::metrics::init_metrics).clone()
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 0,
        chain_id: CHAIN_ID,
        gateway_url: "http://localhost:0".into(),
        relayer_url: "http://localhost:0".into(),
        relayer_api_key: "test-key".into(),
        relayer_api_secret: "dGVzdC1zZWNyZXQ=".into(),
        token_contract: "0xtoken".into(),
        hint_store_url: None,
        balance_cache_ttl_days: 30,
        stats_poller_enabled: false,
        stats_poller_interval_secs: 30,
    }
}

pub fn handle(s: &str) -> CiphertextHandle {
    CiphertextHandle(s.into())
}

/// A two-option binary market with liquidity 100 and bounds [1, 1000].
pub fn binary_market(id: &str) -> Market {
    Market {
        id: id.into(),
        contract_address: format!("0xmarket-{id}"),
        question: "Will the event happen?".into(),
        kind: MarketKind::Binary,
        options: vec![
            MarketOption { title: "Yes".into() },
            MarketOption { title: "No".into() },
        ],
        liquidity_param: Decimal::from(100),
        min_wager: Decimal::ONE,
        max_wager: Decimal::from(1_000),
        ends_at: Utc::now() + Duration::days(7),
        is_active: true,
        is_resolved: false,
        winning_option: None,
        winning_outcome: None,
    }
}

pub fn nested_market(id: &str) -> Market {
    let mut market = binary_market(id);
    market.kind = MarketKind::Nested;
    market.options = vec![
        MarketOption { title: "Candidate A".into() },
        MarketOption { title: "Candidate B".into() },
    ];
    market
}

/// Decrypted oracle snapshot for the worked binary scenario:
/// A=400, B=100, volume=500.
pub fn decrypted_oracle(market_id: &str) -> OracleSnapshot {
    OracleSnapshot {
        market_id: market_id.into(),
        version: 1,
        is_decrypted: true,
        total_volume: Decimal::from(500),
        unique_traders: 12,
        pools: vec![
            OptionPool::Flat { shares: Decimal::from(400) },
            OptionPool::Flat { shares: Decimal::from(100) },
        ],
    }
}

pub fn undecrypted_oracle(market_id: &str, version: u64) -> OracleSnapshot {
    OracleSnapshot {
        market_id: market_id.into(),
        version,
        is_decrypted: false,
        total_volume: Decimal::ZERO,
        unique_traders: 0,
        pools: vec![],
    }
}

// ---------------------------------------------------------------------------
// MockGateway
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockGateway {
    pub markets: Mutex<Vec<Market>>,
    pub oracle: Mutex<HashMap<String, OracleSnapshot>>,
    pub handles: Mutex<HashMap<String, PoolHandles>>,
    pub user_wagers: Mutex<HashMap<String, Vec<UserWagerHandle>>>,
    pub balance_handles: Mutex<HashMap<String, CiphertextHandle>>,
    pub payouts: Mutex<HashMap<(String, String), ChainPayoutStatus>>,
    /// Error to return from the next submit_wager call.
    pub submit_error: Mutex<Option<GatewayError>>,
    pub submissions: AtomicUsize,
    pub payout_queries: AtomicUsize,
    next_placed_at_ms: AtomicI64,
}

impl MockGateway {
    pub fn with_market(market: Market) -> Self {
        let gateway = Self {
            next_placed_at_ms: AtomicI64::new(1_700_000_000_000),
            ..Self::default()
        };
        gateway.markets.lock().unwrap().push(market);
        gateway
    }

    pub fn set_oracle(&self, snapshot: OracleSnapshot) {
        self.oracle
            .lock()
            .unwrap()
            .insert(snapshot.market_id.clone(), snapshot);
    }

    pub fn set_handles(&self, market_id: &str, handles: PoolHandles) {
        self.handles.lock().unwrap().insert(market_id.into(), handles);
    }

    pub fn set_payout(&self, market_id: &str, account: &str, status: ChainPayoutStatus) {
        self.payouts
            .lock()
            .unwrap()
            .insert((market_id.into(), account.into()), status);
    }
}

#[async_trait]
impl MarketGateway for MockGateway {
    async fn list_markets(&self) -> Result<Vec<Market>, GatewayError> {
        Ok(self.markets.lock().unwrap().clone())
    }

    async fn get_market(&self, market_id: &str) -> Result<Market, GatewayError> {
        self.markets
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == market_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(market_id.into()))
    }

    async fn oracle_snapshot(&self, market_id: &str) -> Result<OracleSnapshot, GatewayError> {
        self.oracle
            .lock()
            .unwrap()
            .get(market_id)
            .cloned()
            .ok_or_else(|| GatewayError::Unexpected("no oracle snapshot".into()))
    }

    async fn pool_handles(&self, market_id: &str) -> Result<PoolHandles, GatewayError> {
        self.handles
            .lock()
            .unwrap()
            .get(market_id)
            .cloned()
            .ok_or_else(|| GatewayError::Unexpected("no pool handles".into()))
    }

    async fn user_wager_handles(
        &self,
        market_id: &str,
        _account: &str,
    ) -> Result<Vec<UserWagerHandle>, GatewayError> {
        Ok(self
            .user_wagers
            .lock()
            .unwrap()
            .get(market_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn user_balance_handle(&self, account: &str) -> Result<CiphertextHandle, GatewayError> {
        Ok(self
            .balance_handles
            .lock()
            .unwrap()
            .get(account)
            .cloned()
            .unwrap_or_else(|| CiphertextHandle("0x0".into())))
    }

    async fn submit_wager(
        &self,
        _submission: &EncryptedWagerSubmission,
    ) -> Result<WagerReceipt, GatewayError> {
        if let Some(err) = self.submit_error.lock().unwrap().take() {
            return Err(err);
        }

        let n = self.submissions.fetch_add(1, Ordering::SeqCst) + 1;
        let placed_at_ms = self.next_placed_at_ms.fetch_add(1_000, Ordering::SeqCst);
        Ok(WagerReceipt {
            tx_hash: format!("0xtx{n}"),
            placed_at_ms,
        })
    }

    async fn payout_status(
        &self,
        market_id: &str,
        account: &str,
    ) -> Result<ChainPayoutStatus, GatewayError> {
        self.payout_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .payouts
            .lock()
            .unwrap()
            .get(&(market_id.to_string(), account.to_string()))
            .cloned()
            .unwrap_or(ChainPayoutStatus {
                participated: false,
                has_requested: false,
                is_processed: false,
                has_claimed: false,
                payout_amount: None,
            }))
    }

    async fn request_payout(
        &self,
        market_id: &str,
        account: &str,
    ) -> Result<TxReceipt, GatewayError> {
        let key = (market_id.to_string(), account.to_string());
        if let Some(status) = self.payouts.lock().unwrap().get_mut(&key) {
            status.has_requested = true;
        }
        Ok(TxReceipt {
            tx_hash: "0xrequest".into(),
        })
    }

    async fn claim_payout(
        &self,
        market_id: &str,
        account: &str,
    ) -> Result<TxReceipt, GatewayError> {
        let key = (market_id.to_string(), account.to_string());
        if let Some(status) = self.payouts.lock().unwrap().get_mut(&key) {
            status.has_claimed = true;
        }
        Ok(TxReceipt {
            tx_hash: "0xclaim".into(),
        })
    }
}

// ---------------------------------------------------------------------------
// MockDecryptor
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockDecryptor {
    pub values: Mutex<HashMap<CiphertextHandle, u64>>,
    pub fail_decrypt: AtomicBool,
    pub batch_calls: AtomicUsize,
    pub grant_calls: AtomicUsize,
}

impl MockDecryptor {
    /// Register cleartexts, scaling display amounts into base units.
    pub fn set_amount(&self, h: CiphertextHandle, display_amount: u64) {
        self.values.lock().unwrap().insert(h, display_amount * 1_000_000);
    }

    /// Register a raw (unscaled) cleartext, e.g. a participant count.
    pub fn set_raw(&self, h: CiphertextHandle, value: u64) {
        self.values.lock().unwrap().insert(h, value);
    }

    fn decrypt(
        &self,
        handles: &[CiphertextHandle],
    ) -> Result<HashMap<CiphertextHandle, u64>, DecryptionError> {
        if self.fail_decrypt.load(Ordering::SeqCst) {
            return Err(DecryptionError::Rejected("relayer unavailable".into()));
        }

        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        let values = self.values.lock().unwrap();
        Ok(handles
            .iter()
            .filter_map(|h| values.get(h).map(|v| (h.clone(), *v)))
            .collect())
    }
}

#[async_trait]
impl DecryptionCapability for MockDecryptor {
    async fn encrypt_amount(
        &self,
        amount: u64,
        _contract_address: &str,
        _account: &str,
    ) -> Result<EncryptedAmount, DecryptionError> {
        Ok(EncryptedAmount {
            ciphertext: format!("0xenc{amount}"),
            input_proof: "0xproof".into(),
        })
    }

    async fn public_batch_decrypt(
        &self,
        handles: &[CiphertextHandle],
    ) -> Result<HashMap<CiphertextHandle, u64>, DecryptionError> {
        self.decrypt(handles)
    }

    async fn request_grant(
        &self,
        contract_address: &str,
        account: &str,
    ) -> Result<DecryptionGrant, DecryptionError> {
        self.grant_calls.fetch_add(1, Ordering::SeqCst);
        Ok(DecryptionGrant {
            token: "grant-token".into(),
            contract_address: contract_address.into(),
            account: account.into(),
            expires_at: Utc::now() + Duration::minutes(5),
        })
    }

    async fn user_batch_decrypt(
        &self,
        _grant: &DecryptionGrant,
        handles: &[CiphertextHandle],
    ) -> Result<HashMap<CiphertextHandle, u64>, DecryptionError> {
        self.decrypt(handles)
    }
}

// ---------------------------------------------------------------------------
// MockHintStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockHintStore {
    pub recorded: Mutex<Vec<WagerHint>>,
    pub losses: Mutex<HashMap<(String, String), bool>>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub reads: AtomicUsize,
}

impl MockHintStore {
    pub fn set_loss(&self, market_id: &str, account: &str, is_loss: bool) {
        self.losses
            .lock()
            .unwrap()
            .insert((market_id.into(), account.into()), is_loss);
    }
}

#[async_trait]
impl HintStore for MockHintStore {
    async fn record_wager(&self, hint: &WagerHint) -> Result<(), HintError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(HintError::Unexpected("hint store down".into()));
        }
        self.recorded.lock().unwrap().push(hint.clone());
        Ok(())
    }

    async fn resolved_loss(
        &self,
        market_id: &str,
        account: &str,
    ) -> Result<Option<bool>, HintError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(HintError::Unexpected("hint store down".into()));
        }
        Ok(self
            .losses
            .lock()
            .unwrap()
            .get(&(market_id.to_string(), account.to_string()))
            .copied())
    }
}
