use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::chain::{
    CiphertextHandle, EncryptedWagerSubmission, GatewayError, MarketGateway, OptionHandles,
};
use crate::crypto::{decrypted_value, DecryptionCapability, DecryptionError};
use crate::db::{balance_repo, wager_repo};
use crate::db::balance_repo::DeltaOutcome;
use crate::hints::{HintStore, WagerHint};
use crate::models::{
    from_base_units, to_base_units, LocalWagerRecord, Market, MarketKind, Outcome, Selection,
};
use crate::pricing;
use crate::services::statistics::{refresh_statistics, SnapshotStore};

#[derive(Debug, Error)]
pub enum WagerError {
    #[error("market not found")]
    MarketNotFound,

    #[error("market is not active")]
    MarketInactive,

    #[error("market has ended")]
    MarketExpired,

    #[error("market is already resolved")]
    MarketResolved,

    #[error("no such option")]
    InvalidOption,

    #[error("an outcome must be chosen for this market")]
    OutcomeRequired,

    #[error("this market has no outcomes")]
    OutcomeNotApplicable,

    #[error("amount must be at least {0}")]
    BelowMinimum(Decimal),

    #[error("amount must be at most {0}")]
    AboveMaximum(Decimal),

    #[error("amount has more precision than the chain supports")]
    InvalidAmount,

    #[error("balance unknown — refresh your balance first")]
    BalanceUnknown,

    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("transaction rejected by user")]
    Cancelled,

    #[error("wager rejected: {0}")]
    ContractRejected(String),

    #[error("gateway unavailable: {0}")]
    Gateway(GatewayError),

    #[error("decryption unavailable: {0}")]
    Decryption(DecryptionError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<GatewayError> for WagerError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::NotFound(_) => WagerError::MarketNotFound,
            GatewayError::Cancelled => WagerError::Cancelled,
            GatewayError::Rejected(reason) => WagerError::ContractRejected(reason),
            other => WagerError::Gateway(other),
        }
    }
}

impl From<DecryptionError> for WagerError {
    fn from(e: DecryptionError) -> Self {
        WagerError::Decryption(e)
    }
}

#[derive(Debug, Clone)]
pub struct WagerRequest {
    pub account: String,
    pub option_index: usize,
    pub outcome: Option<Outcome>,
    pub amount: Decimal,
}

impl WagerRequest {
    pub fn selection(&self) -> Selection {
        Selection {
            option_index: self.option_index,
            outcome: self.outcome,
        }
    }
}

/// Local precondition checks. Everything here fails before any network
/// traffic; the gateway never sees an invalid wager.
fn validate(market: &Market, req: &WagerRequest) -> Result<(), WagerError> {
    if !market.is_active {
        return Err(WagerError::MarketInactive);
    }
    if market.is_resolved {
        return Err(WagerError::MarketResolved);
    }
    if market.is_expired(Utc::now()) {
        return Err(WagerError::MarketExpired);
    }
    if req.option_index >= market.option_count() {
        return Err(WagerError::InvalidOption);
    }
    match (market.kind, req.outcome) {
        (MarketKind::Nested, None) => return Err(WagerError::OutcomeRequired),
        (MarketKind::Binary | MarketKind::MultipleChoice, Some(_)) => {
            return Err(WagerError::OutcomeNotApplicable)
        }
        _ => {}
    }
    if req.amount < market.min_wager {
        return Err(WagerError::BelowMinimum(market.min_wager));
    }
    if req.amount > market.max_wager {
        return Err(WagerError::AboveMaximum(market.max_wager));
    }
    if to_base_units(req.amount).is_none() {
        return Err(WagerError::InvalidAmount);
    }
    Ok(())
}

/// Price the selection against pool state fetched *now*.
///
/// Cached statistics views are never reused here: two nearly-simultaneous
/// wagers must each price against the pool as the chain currently has it,
/// not against whatever a component last rendered.
async fn fresh_pretrade_price(
    gateway: &dyn MarketGateway,
    decryptor: &dyn DecryptionCapability,
    market: &Market,
    selection: Selection,
) -> Result<Decimal, WagerError> {
    let oracle = gateway.oracle_snapshot(&market.id).await?;

    if oracle.is_decrypted {
        return pricing::selection_probability(
            market.kind,
            &oracle.pools,
            market.liquidity_param,
            selection,
        )
        .ok_or_else(|| {
            WagerError::Internal(anyhow::anyhow!("oracle snapshot shape mismatch"))
        });
    }

    // Live path: decrypt only the handles this price needs, in one batch.
    let handles = gateway.pool_handles(&market.id).await?;
    let option = handles
        .options
        .get(selection.option_index)
        .ok_or(WagerError::InvalidOption)?;

    let mut batch: Vec<CiphertextHandle> = Vec::new();
    let mut keep = |h: &CiphertextHandle| {
        if !h.is_placeholder() {
            batch.push(h.clone());
        }
    };

    match option {
        OptionHandles::Flat { shares } => {
            keep(shares);
            keep(&handles.total_volume);
        }
        OptionHandles::Nested { yes, no } => {
            keep(yes);
            keep(no);
        }
    }

    let results = if batch.is_empty() {
        Default::default()
    } else {
        decryptor.public_batch_decrypt(&batch).await?
    };

    let read = |h: &CiphertextHandle| -> Result<Decimal, WagerError> {
        decrypted_value(&results, h)
            .map(from_base_units)
            .ok_or_else(|| {
                WagerError::Internal(anyhow::anyhow!("handle missing from decryption result"))
            })
    };

    let price = match option {
        OptionHandles::Flat { shares } => pricing::flat_probability(
            read(shares)?,
            read(&handles.total_volume)?,
            market.liquidity_param,
            market.option_count(),
        ),
        OptionHandles::Nested { yes, no } => {
            let outcome = selection.outcome.ok_or(WagerError::OutcomeRequired)?;
            pricing::nested_probability(read(yes)?, read(no)?, market.liquidity_param, outcome)
        }
    };

    Ok(price)
}

/// Place a wager end to end: validate, price against a fresh pool fetch,
/// encrypt, submit, then record optimistically.
///
/// Nothing local is written until the chain confirms, so a cancelled or
/// rejected submission leaves the ledger and balance cache untouched.
pub async fn place_wager(
    db: &SqlitePool,
    gateway: &dyn MarketGateway,
    decryptor: &dyn DecryptionCapability,
    hints: Option<&dyn HintStore>,
    snapshots: &SnapshotStore,
    chain_id: i64,
    market_id: &str,
    req: WagerRequest,
) -> Result<LocalWagerRecord, WagerError> {
    let market = gateway.get_market(market_id).await?;
    validate(&market, &req)?;

    let balance = balance_repo::get_valid(db, &req.account, chain_id)
        .await?
        .ok_or(WagerError::BalanceUnknown)?;
    if req.amount > balance.balance {
        return Err(WagerError::InsufficientBalance);
    }

    let price_before = fresh_pretrade_price(gateway, decryptor, &market, req.selection()).await?;

    // to_base_units was checked in validate
    let amount_base = to_base_units(req.amount).ok_or(WagerError::InvalidAmount)?;
    let encrypted = decryptor
        .encrypt_amount(amount_base, &market.contract_address, &req.account)
        .await?;

    let submission = EncryptedWagerSubmission {
        market_id: market.id.clone(),
        account: req.account.clone(),
        option_index: req.option_index,
        outcome: req.outcome,
        ciphertext: encrypted.ciphertext,
        input_proof: encrypted.input_proof,
    };
    let receipt = gateway.submit_wager(&submission).await?;

    // The submitter knows their own amount, so the optimistic record is
    // born revealed even though the chain only stores ciphertext.
    let record = LocalWagerRecord {
        id: Uuid::new_v4(),
        account: req.account.clone(),
        chain_id,
        market_id: market.id.clone(),
        placed_at_ms: receipt.placed_at_ms,
        option_index: req.option_index,
        outcome: req.outcome,
        amount: req.amount,
        tx_hash: Some(receipt.tx_hash.clone()),
        price_at_wager: Some(price_before),
        is_revealed: true,
    };
    wager_repo::insert_optimistic(db, &record).await?;

    match balance_repo::apply_delta(db, &req.account, chain_id, -req.amount).await? {
        DeltaOutcome::Applied(new_balance) => {
            tracing::debug!(account = %req.account, balance = %new_balance, "Balance adjusted");
        }
        DeltaOutcome::Invalidated => {
            tracing::warn!(
                account = %req.account,
                "Balance cache invalidated — wager exceeded cached balance"
            );
        }
        DeltaOutcome::Missing => {}
    }

    counter!("wagers_placed_total").increment(1);
    tracing::info!(
        market_id = %market.id,
        account = %req.account,
        option = req.option_index,
        amount = %req.amount,
        price = %price_before,
        tx_hash = %receipt.tx_hash,
        "Wager placed"
    );

    // Everyone else's view updates off the refreshed snapshot.
    refresh_statistics(gateway, decryptor, snapshots, &market).await;

    // Best-effort mirror; a hint-store failure never surfaces.
    if let Some(store) = hints {
        let hint = WagerHint {
            market_id: market.id.clone(),
            account: req.account.clone(),
            option_index: req.option_index,
            outcome: req.outcome,
            amount: req.amount,
            placed_at_ms: receipt.placed_at_ms,
            tx_hash: receipt.tx_hash.clone(),
        };
        if let Err(e) = store.record_wager(&hint).await {
            tracing::warn!(error = %e, market_id = %market.id, "Hint store mirror failed");
        }
    }

    Ok(record)
}
