use std::collections::HashMap;
use std::sync::Arc;

use metrics::counter;
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::chain::{ChainPayoutStatus, GatewayError, MarketGateway};
use crate::db::balance_repo;
use crate::db::balance_repo::DeltaOutcome;
use crate::hints::HintStore;
use crate::models::{from_base_units, Market, PayoutPhase, PayoutStatus};

#[derive(Debug, Error)]
pub enum PayoutError {
    #[error("market is not resolved yet")]
    MarketNotResolved,

    #[error("payout cannot be requested in the current state")]
    NotRequestable,

    #[error("payout is not claimable")]
    NotClaimable,

    #[error("transaction rejected by user")]
    Cancelled,

    #[error("payout rejected: {0}")]
    Rejected(String),

    #[error("gateway unavailable: {0}")]
    Gateway(GatewayError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<GatewayError> for PayoutError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Cancelled => PayoutError::Cancelled,
            GatewayError::Rejected(reason) => PayoutError::Rejected(reason),
            other => PayoutError::Gateway(other),
        }
    }
}

/// Process-wide record of the last payout status observed per
/// (market, account).
///
/// Refreshes merge through `PayoutStatus::merge`, so a transient chain
/// answer can never silently walk a Processed or Claimed state backwards.
#[derive(Clone, Default)]
pub struct PayoutTracker {
    inner: Arc<RwLock<HashMap<(String, String), PayoutStatus>>>,
}

impl PayoutTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self, market_id: &str, account: &str) -> Option<PayoutStatus> {
        self.inner
            .read()
            .await
            .get(&(market_id.to_string(), account.to_string()))
            .cloned()
    }

    /// Merge a freshly observed status and return what the caller should
    /// display.
    pub async fn observe(
        &self,
        market_id: &str,
        account: &str,
        fresh: PayoutStatus,
    ) -> PayoutStatus {
        let key = (market_id.to_string(), account.to_string());
        let mut map = self.inner.write().await;
        let merged = PayoutStatus::merge(map.get(&key), fresh);
        map.insert(key, merged.clone());
        merged
    }
}

fn from_chain(chain: &ChainPayoutStatus) -> PayoutStatus {
    if !chain.participated {
        return PayoutStatus::new(PayoutPhase::NotParticipated);
    }
    if chain.has_claimed {
        return PayoutStatus {
            phase: PayoutPhase::Claimed,
            payout_amount: chain.payout_amount.map(from_base_units),
            from_hint: false,
        };
    }
    if chain.is_processed {
        let amount = chain.payout_amount.map(from_base_units).unwrap_or_default();
        if amount > Decimal::ZERO {
            return PayoutStatus {
                phase: PayoutPhase::Processed,
                payout_amount: Some(amount),
                from_hint: false,
            };
        }
        return PayoutStatus {
            phase: PayoutPhase::Lost,
            payout_amount: Some(Decimal::ZERO),
            from_hint: false,
        };
    }
    if chain.has_requested {
        return PayoutStatus::new(PayoutPhase::Requested);
    }
    PayoutStatus::new(PayoutPhase::NotRequested)
}

/// Current payout status for an account on a resolved market.
///
/// The hint store is consulted first as a cheap skip for known losses; a
/// hint read failure falls open to the chain, and `force_chain` bypasses the
/// hint entirely so the authoritative answer is always reachable.
pub async fn payout_status(
    gateway: &dyn MarketGateway,
    hints: Option<&dyn HintStore>,
    tracker: &PayoutTracker,
    market: &Market,
    account: &str,
    force_chain: bool,
) -> Result<PayoutStatus, PayoutError> {
    if !market.is_resolved {
        return Err(PayoutError::MarketNotResolved);
    }

    if !force_chain {
        if let Some(store) = hints {
            match store.resolved_loss(&market.id, account).await {
                Ok(Some(true)) => {
                    let lost = PayoutStatus {
                        phase: PayoutPhase::Lost,
                        payout_amount: None,
                        from_hint: true,
                    };
                    return Ok(tracker.observe(&market.id, account, lost).await);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        market_id = %market.id,
                        "Hint store read failed, falling through to chain"
                    );
                }
            }
        }
    }

    let chain = gateway.payout_status(&market.id, account).await?;
    Ok(tracker.observe(&market.id, account, from_chain(&chain)).await)
}

/// Ask the contract to start decrypting this account's winnings. The
/// decryption runs on the order of minutes; callers re-check rather than
/// wait.
pub async fn request_payout(
    gateway: &dyn MarketGateway,
    tracker: &PayoutTracker,
    market: &Market,
    account: &str,
) -> Result<PayoutStatus, PayoutError> {
    if !market.is_resolved {
        return Err(PayoutError::MarketNotResolved);
    }

    let chain = gateway.payout_status(&market.id, account).await?;
    let status = from_chain(&chain);
    if status.phase != PayoutPhase::NotRequested {
        return Err(PayoutError::NotRequestable);
    }

    let receipt = gateway.request_payout(&market.id, account).await?;
    tracing::info!(
        market_id = %market.id,
        account = %account,
        tx_hash = %receipt.tx_hash,
        "Payout decryption requested"
    );

    Ok(tracker
        .observe(&market.id, account, PayoutStatus::new(PayoutPhase::Requested))
        .await)
}

/// Claim a processed payout and credit the cached balance optimistically.
pub async fn claim_payout(
    db: &SqlitePool,
    gateway: &dyn MarketGateway,
    tracker: &PayoutTracker,
    market: &Market,
    account: &str,
    chain_id: i64,
) -> Result<PayoutStatus, PayoutError> {
    if !market.is_resolved {
        return Err(PayoutError::MarketNotResolved);
    }

    let chain = gateway.payout_status(&market.id, account).await?;
    let status = from_chain(&chain);
    let amount = match (status.phase, status.payout_amount) {
        (PayoutPhase::Processed, Some(amount)) if amount > Decimal::ZERO => amount,
        _ => return Err(PayoutError::NotClaimable),
    };

    let receipt = gateway.claim_payout(&market.id, account).await?;

    match balance_repo::apply_delta(db, account, chain_id, amount).await? {
        DeltaOutcome::Applied(new_balance) => {
            tracing::debug!(account = %account, balance = %new_balance, "Balance credited");
        }
        DeltaOutcome::Invalidated | DeltaOutcome::Missing => {}
    }

    counter!("payouts_claimed_total").increment(1);
    tracing::info!(
        market_id = %market.id,
        account = %account,
        amount = %amount,
        tx_hash = %receipt.tx_hash,
        "Payout claimed"
    );

    let claimed = PayoutStatus {
        phase: PayoutPhase::Claimed,
        payout_amount: Some(amount),
        from_hint: false,
    };
    Ok(tracker.observe(&market.id, account, claimed).await)
}
