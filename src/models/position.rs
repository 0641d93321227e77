use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Outcome;

/// A user's aggregated stake on one (option, outcome) group.
///
/// Derived from ledger records plus the current snapshot on every change;
/// never persisted. `current_value` and `pnl` are `None` when the snapshot
/// is degraded so the caller never renders a fabricated mark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionAggregate {
    pub option_index: usize,
    pub outcome: Option<Outcome>,
    pub option_title: String,
    pub total_amount: Decimal,
    /// Sum of amount / (price_at_wager / 100) over records with a known
    /// entry price. Zero with `shares_known = false` when none have one.
    pub shares: Decimal,
    pub shares_known: bool,
    pub wager_count: usize,
    pub current_probability: Option<Decimal>,
    pub current_value: Option<Decimal>,
    pub pnl: Option<Decimal>,
}
