use std::env;

const DEFAULT_DATABASE_URL: &str = "sqlite:veilbet.db";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    /// Chain this engine instance serves; ledger and balance keys include it
    /// so switching networks never cross-contaminates.
    pub chain_id: i64,

    // Market gateway (contract RPC bridge)
    pub gateway_url: String,

    // Decryption relayer
    pub relayer_url: String,
    pub relayer_api_key: String,
    pub relayer_api_secret: String,

    /// Token contract the user's encrypted balance lives on; scopes the
    /// balance decryption grant.
    pub token_contract: String,

    // Off-chain hint store (optional — engine runs fine without it)
    pub hint_store_url: Option<String>,

    pub balance_cache_ttl_days: i64,

    // Background statistics refresh
    pub stats_poller_enabled: bool,
    pub stats_poller_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.into()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,

            chain_id: env::var("CHAIN_ID")
                .unwrap_or_else(|_| "1".into())
                .parse()?,

            gateway_url: env::var("GATEWAY_URL")
                .map_err(|_| anyhow::anyhow!("GATEWAY_URL must be set"))?,

            relayer_url: env::var("RELAYER_URL")
                .map_err(|_| anyhow::anyhow!("RELAYER_URL must be set"))?,
            relayer_api_key: env::var("RELAYER_API_KEY")
                .map_err(|_| anyhow::anyhow!("RELAYER_API_KEY must be set"))?,
            relayer_api_secret: env::var("RELAYER_API_SECRET")
                .map_err(|_| anyhow::anyhow!("RELAYER_API_SECRET must be set"))?,

            token_contract: env::var("TOKEN_CONTRACT")
                .map_err(|_| anyhow::anyhow!("TOKEN_CONTRACT must be set"))?,

            hint_store_url: env::var("HINT_STORE_URL").ok(),

            balance_cache_ttl_days: env::var("BALANCE_CACHE_TTL_DAYS")
                .unwrap_or_else(|_| "30".into())
                .parse()
                .unwrap_or(30),

            stats_poller_enabled: env::var("STATS_POLLER_ENABLED")
                .unwrap_or_else(|_| "true".into())
                .parse()
                .unwrap_or(true),
            stats_poller_interval_secs: env::var("STATS_POLLER_INTERVAL_SECS")
                .unwrap_or_else(|_| "30".into())
                .parse()
                .unwrap_or(30),
        })
    }

    pub fn balance_cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.balance_cache_ttl_days)
    }
}
