pub mod balance;
pub mod market;
pub mod payout;
pub mod position;
pub mod statistics;
pub mod wager;

pub use balance::BalanceCacheEntry;
pub use market::{Market, MarketKind, MarketOption};
pub use payout::{PayoutPhase, PayoutStatus};
pub use position::PositionAggregate;
pub use statistics::{OptionPool, Provenance, StatisticsSnapshot};
pub use wager::{LocalWagerRecord, RevealedWager};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Yes/No side of a nested option's sub-market. Only meaningful for
/// `MarketKind::Nested`; flat markets carry no outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Yes,
    No,
}

impl Outcome {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "yes" => Some(Outcome::Yes),
            "no" => Some(Outcome::No),
            _ => None,
        }
    }

    pub fn as_db_str(&self) -> &'static str {
        match self {
            Outcome::Yes => "yes",
            Outcome::No => "no",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

// ---------------------------------------------------------------------------
// Selection — which side of a market a wager targets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub option_index: usize,
    /// Required for Nested markets, absent for flat ones.
    pub outcome: Option<Outcome>,
}

// ---------------------------------------------------------------------------
// Base-unit conversions
// ---------------------------------------------------------------------------

/// On-chain cleartexts are u64 amounts with 6 decimal places.
pub const BASE_UNIT_DECIMALS: u32 = 6;

/// Convert an on-chain cleartext integer into a display amount.
pub fn from_base_units(raw: u64) -> Decimal {
    Decimal::from_i128_with_scale(raw as i128, BASE_UNIT_DECIMALS).normalize()
}

/// Convert a display amount into on-chain base units.
///
/// Returns `None` when the amount is negative, carries more than 6 decimal
/// places, or overflows u64.
pub fn to_base_units(amount: Decimal) -> Option<u64> {
    if amount.is_sign_negative() {
        return None;
    }
    let scaled = amount.checked_mul(Decimal::from(1_000_000u64))?;
    if scaled.fract() != Decimal::ZERO {
        return None;
    }
    u64::try_from(scaled.normalize().mantissa()).ok()
}
