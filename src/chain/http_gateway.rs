use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{
    ChainPayoutStatus, CiphertextHandle, EncryptedWagerSubmission, GatewayError, MarketGateway,
    OracleSnapshot, PoolHandles, TxReceipt, UserWagerHandle, WagerReceipt,
};
use crate::models::Market;

/// HTTP client for the market gateway: a thin RPC bridge in front of the
/// market contract and the oracle snapshot service.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    http: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct GatewayErrorBody {
    code: Option<String>,
    error: Option<String>,
}

impl HttpGateway {
    pub fn new(http: Client, base_url: String) -> Self {
        Self { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-2xx transaction response into the matching error variant.
    /// The gateway reports wallet-side rejection and contract reverts as
    /// structured codes; anything else is an infrastructure failure.
    async fn tx_error(resp: reqwest::Response) -> GatewayError {
        let status = resp.status();
        let body: GatewayErrorBody = match resp.json().await {
            Ok(b) => b,
            Err(e) => return GatewayError::Http(e),
        };

        let message = body.error.unwrap_or_else(|| status.to_string());
        match body.code.as_deref() {
            Some("user_cancelled") => GatewayError::Cancelled,
            Some("market_expired") => GatewayError::Rejected("market has ended".into()),
            Some("market_resolved") => GatewayError::Rejected("market is already resolved".into()),
            Some("invalid_option") => GatewayError::Rejected("invalid option".into()),
            Some("amount_out_of_bounds") => {
                GatewayError::Rejected("amount outside market limits".into())
            }
            Some("insufficient_funds") => GatewayError::Rejected("insufficient funds".into()),
            Some(_) | None => GatewayError::Unexpected(message),
        }
    }
}

#[async_trait::async_trait]
impl MarketGateway for HttpGateway {
    async fn list_markets(&self) -> Result<Vec<Market>, GatewayError> {
        let resp = self
            .http
            .get(self.url("/markets"))
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn get_market(&self, market_id: &str) -> Result<Market, GatewayError> {
        let resp = self
            .http
            .get(self.url(&format!("/markets/{market_id}")))
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(market_id.to_string()));
        }
        Ok(resp.error_for_status()?.json().await?)
    }

    async fn oracle_snapshot(&self, market_id: &str) -> Result<OracleSnapshot, GatewayError> {
        let resp = self
            .http
            .get(self.url(&format!("/markets/{market_id}/oracle-snapshot")))
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn pool_handles(&self, market_id: &str) -> Result<PoolHandles, GatewayError> {
        let resp = self
            .http
            .get(self.url(&format!("/markets/{market_id}/handles")))
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn user_wager_handles(
        &self,
        market_id: &str,
        account: &str,
    ) -> Result<Vec<UserWagerHandle>, GatewayError> {
        let resp = self
            .http
            .get(self.url(&format!("/markets/{market_id}/wagers")))
            .query(&[("account", account)])
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn user_balance_handle(&self, account: &str) -> Result<CiphertextHandle, GatewayError> {
        let resp = self
            .http
            .get(self.url("/balance-handle"))
            .query(&[("account", account)])
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn submit_wager(
        &self,
        submission: &EncryptedWagerSubmission,
    ) -> Result<WagerReceipt, GatewayError> {
        let resp = self
            .http
            .post(self.url(&format!("/markets/{}/wagers", submission.market_id)))
            .json(submission)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::tx_error(resp).await);
        }
        Ok(resp.json().await?)
    }

    async fn payout_status(
        &self,
        market_id: &str,
        account: &str,
    ) -> Result<ChainPayoutStatus, GatewayError> {
        let resp = self
            .http
            .get(self.url(&format!("/markets/{market_id}/payout")))
            .query(&[("account", account)])
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn request_payout(
        &self,
        market_id: &str,
        account: &str,
    ) -> Result<TxReceipt, GatewayError> {
        let resp = self
            .http
            .post(self.url(&format!("/markets/{market_id}/payout/request")))
            .json(&serde_json::json!({ "account": account }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::tx_error(resp).await);
        }
        Ok(resp.json().await?)
    }

    async fn claim_payout(
        &self,
        market_id: &str,
        account: &str,
    ) -> Result<TxReceipt, GatewayError> {
        let resp = self
            .http
            .post(self.url(&format!("/markets/{market_id}/payout/claim")))
            .json(&serde_json::json!({ "account": account }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::tx_error(resp).await);
        }
        Ok(resp.json().await?)
    }
}
