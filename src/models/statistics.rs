use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where a snapshot's numbers came from.
///
/// `OracleDecrypted` values are authoritative: once published they are only
/// replaced when the oracle snapshot version itself advances. `Degraded`
/// means a decryption attempt failed and every figure is a zero placeholder,
/// not a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    OracleDecrypted,
    LiveDecrypted,
    Degraded,
}

/// Cleartext share totals for one option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionPool {
    Flat { shares: Decimal },
    Nested { yes_shares: Decimal, no_shares: Decimal },
}

impl OptionPool {
    /// Total volume sitting on this option.
    pub fn total(&self) -> Decimal {
        match self {
            OptionPool::Flat { shares } => *shares,
            OptionPool::Nested { yes_shares, no_shares } => *yes_shares + *no_shares,
        }
    }
}

/// Normalized pool statistics published to every consumer. Consumers
/// re-derive their figures from the latest snapshot; they never patch one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub market_id: String,
    pub total_volume: Decimal,
    pub pools: Vec<OptionPool>,
    pub unique_traders: u64,
    pub provenance: Provenance,
    /// Oracle snapshot version observed at fetch time, used to decide when
    /// an authoritative snapshot may be replaced.
    pub oracle_version: u64,
    pub fetched_at: DateTime<Utc>,
}

impl StatisticsSnapshot {
    /// Zero-filled placeholder emitted when statistics cannot be obtained.
    pub fn degraded(market_id: &str, option_count: usize, nested: bool, oracle_version: u64) -> Self {
        let pools = (0..option_count)
            .map(|_| {
                if nested {
                    OptionPool::Nested {
                        yes_shares: Decimal::ZERO,
                        no_shares: Decimal::ZERO,
                    }
                } else {
                    OptionPool::Flat { shares: Decimal::ZERO }
                }
            })
            .collect();

        Self {
            market_id: market_id.to_string(),
            total_volume: Decimal::ZERO,
            pools,
            unique_traders: 0,
            provenance: Provenance::Degraded,
            oracle_version,
            fetched_at: Utc::now(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.provenance == Provenance::Degraded
    }
}
