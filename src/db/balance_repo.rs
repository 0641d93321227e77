use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, SqlitePool};

use crate::models::BalanceCacheEntry;

#[derive(Debug, FromRow)]
struct BalanceRow {
    account: String,
    chain_id: i64,
    balance: String,
    created_at_ms: i64,
    expires_at_ms: i64,
}

/// Result of applying an optimistic delta to the cached balance.
#[derive(Debug, Clone, PartialEq)]
pub enum DeltaOutcome {
    /// Cache updated; carries the new balance.
    Applied(Decimal),
    /// The delta would have driven the balance negative — the entry was
    /// deleted, since a known-wrong balance is worse than none.
    Invalidated,
    /// No valid cache entry existed.
    Missing,
}

fn to_entry(row: BalanceRow) -> anyhow::Result<BalanceCacheEntry> {
    let created_at = DateTime::<Utc>::from_timestamp_millis(row.created_at_ms)
        .ok_or_else(|| anyhow::anyhow!("invalid created_at_ms: {}", row.created_at_ms))?;
    let expires_at = DateTime::<Utc>::from_timestamp_millis(row.expires_at_ms)
        .ok_or_else(|| anyhow::anyhow!("invalid expires_at_ms: {}", row.expires_at_ms))?;

    Ok(BalanceCacheEntry {
        account: row.account,
        chain_id: row.chain_id,
        balance: row.balance.parse::<Decimal>()?,
        created_at,
        expires_at,
    })
}

/// Cache a freshly decrypted balance with the given time-to-live.
pub async fn store_balance(
    pool: &SqlitePool,
    account: &str,
    chain_id: i64,
    balance: Decimal,
    ttl: Duration,
) -> anyhow::Result<BalanceCacheEntry> {
    let now = Utc::now();
    let expires_at = now + ttl;

    sqlx::query(
        r#"
        INSERT INTO balance_cache (account, chain_id, balance, created_at_ms, expires_at_ms)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (account, chain_id) DO UPDATE SET
            balance = excluded.balance,
            created_at_ms = excluded.created_at_ms,
            expires_at_ms = excluded.expires_at_ms
        "#,
    )
    .bind(account)
    .bind(chain_id)
    .bind(balance.to_string())
    .bind(now.timestamp_millis())
    .bind(expires_at.timestamp_millis())
    .execute(pool)
    .await?;

    Ok(BalanceCacheEntry {
        account: account.to_string(),
        chain_id,
        balance,
        created_at: now,
        expires_at,
    })
}

/// Read the cached balance if one exists and has not expired. Expired rows
/// are deleted on the way out.
pub async fn get_valid(
    pool: &SqlitePool,
    account: &str,
    chain_id: i64,
) -> anyhow::Result<Option<BalanceCacheEntry>> {
    let row = sqlx::query_as::<_, BalanceRow>(
        "SELECT account, chain_id, balance, created_at_ms, expires_at_ms
         FROM balance_cache WHERE account = $1 AND chain_id = $2",
    )
    .bind(account)
    .bind(chain_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let entry = to_entry(row)?;
    if entry.is_expired(Utc::now()) {
        invalidate(pool, account, chain_id).await?;
        return Ok(None);
    }

    Ok(Some(entry))
}

/// Adjust the cached balance after a balance-changing action confirmed.
///
/// Negative results never persist: the entry is invalidated instead and the
/// next read reports the balance as unknown.
pub async fn apply_delta(
    pool: &SqlitePool,
    account: &str,
    chain_id: i64,
    delta: Decimal,
) -> anyhow::Result<DeltaOutcome> {
    let Some(entry) = get_valid(pool, account, chain_id).await? else {
        return Ok(DeltaOutcome::Missing);
    };

    let new_balance = entry.balance + delta;
    if new_balance < Decimal::ZERO {
        invalidate(pool, account, chain_id).await?;
        return Ok(DeltaOutcome::Invalidated);
    }

    sqlx::query(
        "UPDATE balance_cache SET balance = $3 WHERE account = $1 AND chain_id = $2",
    )
    .bind(account)
    .bind(chain_id)
    .bind(new_balance.to_string())
    .execute(pool)
    .await?;

    Ok(DeltaOutcome::Applied(new_balance))
}

/// Drop the cached balance for an account.
pub async fn invalidate(pool: &SqlitePool, account: &str, chain_id: i64) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM balance_cache WHERE account = $1 AND chain_id = $2")
        .bind(account)
        .bind(chain_id)
        .execute(pool)
        .await?;

    Ok(())
}
