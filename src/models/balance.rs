use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A decrypted balance snapshot for one (account, chain).
///
/// Decrypting a balance takes a relayer round-trip, so the cleartext is
/// cached with a long expiry and adjusted optimistically as wagers and
/// claims land. Any delta that would drive it negative invalidates the
/// entry instead; an unknown balance is safer than a wrong one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceCacheEntry {
    pub account: String,
    pub chain_id: i64,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl BalanceCacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
