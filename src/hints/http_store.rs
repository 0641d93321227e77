use reqwest::Client;
use serde::Deserialize;

use super::{HintError, HintStore, WagerHint};

/// HTTP client for the off-chain hint store.
#[derive(Debug, Clone)]
pub struct HttpHintStore {
    http: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ResolvedLossResponse {
    is_loss: Option<bool>,
}

impl HttpHintStore {
    pub fn new(http: Client, base_url: String) -> Self {
        Self { http, base_url }
    }
}

#[async_trait::async_trait]
impl HintStore for HttpHintStore {
    async fn record_wager(&self, hint: &WagerHint) -> Result<(), HintError> {
        self.http
            .post(format!("{}/wagers", self.base_url))
            .json(hint)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn resolved_loss(
        &self,
        market_id: &str,
        account: &str,
    ) -> Result<Option<bool>, HintError> {
        let resp = self
            .http
            .get(format!("{}/positions/{market_id}/resolution", self.base_url))
            .query(&[("account", account)])
            .send()
            .await?
            .error_for_status()?;

        let body: ResolvedLossResponse = resp.json().await?;
        Ok(body.is_loss)
    }
}
