pub mod balance;
pub mod health;
pub mod markets;
pub mod metrics;
pub mod payouts;
pub mod positions;
pub mod wagers;

use serde::Serialize;

use crate::chain::GatewayError;
use crate::errors::AppError;
use crate::models::Market;
use crate::AppState;

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Load a market from the gateway, mapping gateway failures onto API
/// status codes.
pub async fn fetch_market(state: &AppState, market_id: &str) -> Result<Market, AppError> {
    state.gateway.get_market(market_id).await.map_err(|e| match e {
        GatewayError::NotFound(id) => AppError::NotFound(format!("market not found: {id}")),
        other => AppError::Unavailable(other.to_string()),
    })
}
