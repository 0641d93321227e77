use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Outcome;

/// A wager in the local ledger.
///
/// Written optimistically right after on-chain submission (the submitter
/// knows their own amount even though the contract only stores ciphertext),
/// then overwritten in place by the reveal merge. `price_at_wager` and
/// `tx_hash` exist only on the local side and survive the merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalWagerRecord {
    pub id: Uuid,
    pub account: String,
    pub chain_id: i64,
    pub market_id: String,
    /// Unix milliseconds; the only correlation key shared with the
    /// oracle-revealed side.
    pub placed_at_ms: i64,
    pub option_index: usize,
    pub outcome: Option<Outcome>,
    pub amount: Decimal,
    pub tx_hash: Option<String>,
    /// Probability percentage quoted before this wager hit the pool.
    pub price_at_wager: Option<Decimal>,
    pub is_revealed: bool,
}

/// A wager as the reveal flow decrypted it: the `(option, outcome, amount)`
/// triple keyed by placement timestamp. Carries no tx hash or entry price;
/// those are preserved from the local record during the merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealedWager {
    pub placed_at_ms: i64,
    pub option_index: usize,
    pub outcome: Option<Outcome>,
    pub amount: Decimal,
}
