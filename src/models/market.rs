use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Outcome;

/// Market shape. Binary and MultipleChoice markets pool wagers per option;
/// Nested markets treat every option as its own yes/no sub-market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketKind {
    Binary,
    MultipleChoice,
    Nested,
}

/// One side of a market as the gateway reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketOption {
    pub title: String,
}

/// Static market fields read from the gateway. Created by contract
/// deployment; this engine only ever refreshes shares and resolution fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub id: String,
    pub contract_address: String,
    pub question: String,
    pub kind: MarketKind,
    pub options: Vec<MarketOption>,
    /// Phantom subsidy injected into pool math; returned to the market
    /// creator at resolution, never distributed to winners.
    pub liquidity_param: rust_decimal::Decimal,
    pub min_wager: rust_decimal::Decimal,
    pub max_wager: rust_decimal::Decimal,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
    pub is_resolved: bool,
    pub winning_option: Option<usize>,
    pub winning_outcome: Option<Outcome>,
}

impl Market {
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.ends_at
    }
}
