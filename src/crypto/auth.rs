use base64::{
    engine::general_purpose::{STANDARD as BASE64, URL_SAFE as BASE64_URL_SAFE},
    Engine,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid base64 secret: {0}")]
    InvalidSecret(#[from] base64::DecodeError),

    #[error("HMAC computation failed: {0}")]
    HmacError(String),
}

/// API-key credentials for the decryption relayer.
#[derive(Debug, Clone)]
pub struct RelayerAuth {
    pub api_key: String,
    pub api_secret: String,
}

impl RelayerAuth {
    pub fn new(api_key: String, api_secret: String) -> Self {
        Self { api_key, api_secret }
    }

    /// Build the HMAC-SHA256 signature the relayer expects.
    ///
    /// message = `{timestamp}{method}{path}{body}`
    /// secret is base64-decoded before use.
    pub fn sign(
        &self,
        timestamp: &str,
        method: &str,
        path: &str,
        body: &str,
    ) -> Result<String, AuthError> {
        // Some relayer deployments issue URL-safe base64 secrets
        let secret_bytes = BASE64_URL_SAFE
            .decode(&self.api_secret)
            .or_else(|_| BASE64.decode(&self.api_secret))?;

        let message = format!("{timestamp}{method}{path}{body}");

        let mut mac = HmacSha256::new_from_slice(&secret_bytes)
            .map_err(|e| AuthError::HmacError(e.to_string()))?;

        mac.update(message.as_bytes());
        let result = mac.finalize();

        Ok(BASE64.encode(result.into_bytes()))
    }
}
