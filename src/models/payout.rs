use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Claim lifecycle for a resolved market.
///
/// NotRequested → Requested → Processed → Claimed, with NotParticipated and
/// Lost absorbing. Refresh may re-confirm a phase but never moves it
/// backwards; `merge` enforces that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutPhase {
    NotParticipated,
    NotRequested,
    Requested,
    Processed,
    Claimed,
    Lost,
}

impl PayoutPhase {
    /// Forward-progress rank. Lost sits alongside Claimed as terminal.
    fn rank(&self) -> u8 {
        match self {
            PayoutPhase::NotParticipated => 0,
            PayoutPhase::NotRequested => 1,
            PayoutPhase::Requested => 2,
            PayoutPhase::Processed => 3,
            PayoutPhase::Claimed => 4,
            PayoutPhase::Lost => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutStatus {
    pub phase: PayoutPhase,
    pub payout_amount: Option<Decimal>,
    /// True when `Lost` came from the off-chain hint store rather than the
    /// chain; such a status may still be overturned by an on-chain check.
    pub from_hint: bool,
}

impl PayoutStatus {
    pub fn new(phase: PayoutPhase) -> Self {
        Self {
            phase,
            payout_amount: None,
            from_hint: false,
        }
    }

    /// Merge a freshly queried status into a previously observed one.
    ///
    /// An authoritative (non-hint) answer always replaces a hint-derived
    /// Lost, never the other way around. Beyond that the phase only moves
    /// forward: a refresh reporting an earlier phase re-confirms nothing
    /// and the prior status stands.
    pub fn merge(previous: Option<&PayoutStatus>, fresh: PayoutStatus) -> PayoutStatus {
        let Some(prev) = previous else {
            return fresh;
        };

        if prev.from_hint && !fresh.from_hint {
            return fresh;
        }
        if fresh.from_hint && !prev.from_hint {
            return prev.clone();
        }

        if fresh.phase.rank() < prev.phase.rank() {
            return prev.clone();
        }

        fresh
    }
}
