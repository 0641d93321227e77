use std::collections::HashMap;

use chrono::Utc;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use super::{DecryptionCapability, DecryptionError, DecryptionGrant, EncryptedAmount, RelayerAuth};
use crate::chain::CiphertextHandle;

/// HTTP client for the threshold-decryption relayer.
///
/// Every decryption of more than one handle goes through one batch call;
/// per-handle requests are slower and billed per round, so the engine never
/// issues them.
#[derive(Debug, Clone)]
pub struct RelayerClient {
    http: Client,
    auth: RelayerAuth,
    base_url: String,
}

#[derive(Serialize)]
struct EncryptRequest<'a> {
    amount: u64,
    contract_address: &'a str,
    account: &'a str,
}

#[derive(Serialize)]
struct PublicDecryptRequest<'a> {
    handles: &'a [CiphertextHandle],
}

#[derive(Serialize)]
struct GrantRequest<'a> {
    contract_address: &'a str,
    account: &'a str,
}

#[derive(Serialize)]
struct UserDecryptRequest<'a> {
    grant_token: &'a str,
    handles: &'a [CiphertextHandle],
}

#[derive(Deserialize)]
struct DecryptResponse {
    values: HashMap<CiphertextHandle, u64>,
}

#[derive(Deserialize)]
struct RelayerErrorBody {
    error: Option<String>,
}

impl RelayerClient {
    pub fn new(http: Client, auth: RelayerAuth, base_url: String) -> Self {
        Self { http, auth, base_url }
    }

    /// Build a signed POST request with HMAC signature headers.
    fn signed_post(&self, path: &str, body: &str) -> Result<RequestBuilder, DecryptionError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.auth.sign(&timestamp, "POST", path, body)?;

        let url = format!("{}{}", self.base_url, path);
        let req = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .header("X-RELAYER-KEY", &self.auth.api_key)
            .header("X-RELAYER-SIGNATURE", signature)
            .header("X-RELAYER-TIMESTAMP", &timestamp)
            .body(body.to_string());

        Ok(req)
    }

    async fn send_signed<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: String,
    ) -> Result<T, DecryptionError> {
        let resp = self.signed_post(path, &body)?.send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let message = resp
                .json::<RelayerErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| status.to_string());
            return Err(DecryptionError::Rejected(message));
        }

        Ok(resp.json().await?)
    }
}

#[async_trait::async_trait]
impl DecryptionCapability for RelayerClient {
    async fn encrypt_amount(
        &self,
        amount: u64,
        contract_address: &str,
        account: &str,
    ) -> Result<EncryptedAmount, DecryptionError> {
        let body = serde_json::to_string(&EncryptRequest {
            amount,
            contract_address,
            account,
        })
        .map_err(|e| DecryptionError::Unexpected(e.to_string()))?;

        self.send_signed("/encrypt", body).await
    }

    async fn public_batch_decrypt(
        &self,
        handles: &[CiphertextHandle],
    ) -> Result<HashMap<CiphertextHandle, u64>, DecryptionError> {
        let body = serde_json::to_string(&PublicDecryptRequest { handles })
            .map_err(|e| DecryptionError::Unexpected(e.to_string()))?;

        let resp: DecryptResponse = self.send_signed("/decrypt/public", body).await?;
        Ok(resp.values)
    }

    async fn request_grant(
        &self,
        contract_address: &str,
        account: &str,
    ) -> Result<DecryptionGrant, DecryptionError> {
        let body = serde_json::to_string(&GrantRequest {
            contract_address,
            account,
        })
        .map_err(|e| DecryptionError::Unexpected(e.to_string()))?;

        self.send_signed("/grants", body).await
    }

    async fn user_batch_decrypt(
        &self,
        grant: &DecryptionGrant,
        handles: &[CiphertextHandle],
    ) -> Result<HashMap<CiphertextHandle, u64>, DecryptionError> {
        if grant.is_expired(Utc::now()) {
            return Err(DecryptionError::GrantExpired);
        }

        let body = serde_json::to_string(&UserDecryptRequest {
            grant_token: &grant.token,
            handles,
        })
        .map_err(|e| DecryptionError::Unexpected(e.to_string()))?;

        let resp: DecryptResponse = self.send_signed("/decrypt/user", body).await?;
        Ok(resp.values)
    }
}
