use rust_decimal::Decimal;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::models::{LocalWagerRecord, Outcome, RevealedWager};

/// Raw `wagers` row. Amounts and prices are TEXT columns parsed into
/// `Decimal` on the way out.
#[derive(Debug, FromRow)]
struct WagerRow {
    id: String,
    account: String,
    chain_id: i64,
    market_id: String,
    placed_at_ms: i64,
    option_index: i64,
    outcome: Option<String>,
    amount: String,
    tx_hash: Option<String>,
    price_at_wager: Option<String>,
    is_revealed: bool,
}

fn to_record(row: WagerRow) -> anyhow::Result<LocalWagerRecord> {
    Ok(LocalWagerRecord {
        id: Uuid::parse_str(&row.id)?,
        account: row.account,
        chain_id: row.chain_id,
        market_id: row.market_id,
        placed_at_ms: row.placed_at_ms,
        option_index: usize::try_from(row.option_index)?,
        outcome: row.outcome.as_deref().and_then(Outcome::from_db_str),
        amount: row.amount.parse::<Decimal>()?,
        tx_hash: row.tx_hash,
        price_at_wager: row
            .price_at_wager
            .map(|p| p.parse::<Decimal>())
            .transpose()?,
        is_revealed: row.is_revealed,
    })
}

/// Append a wager the account just placed. Called only after on-chain
/// confirmation, so a failed submission never touches the ledger.
pub async fn insert_optimistic(
    pool: &SqlitePool,
    record: &LocalWagerRecord,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO wagers
            (id, account, chain_id, market_id, placed_at_ms, option_index,
             outcome, amount, tx_hash, price_at_wager, is_revealed, created_at_ms)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(record.id.to_string())
    .bind(&record.account)
    .bind(record.chain_id)
    .bind(&record.market_id)
    .bind(record.placed_at_ms)
    .bind(record.option_index as i64)
    .bind(record.outcome.map(|o| o.as_db_str()))
    .bind(record.amount.to_string())
    .bind(&record.tx_hash)
    .bind(record.price_at_wager.map(|p| p.to_string()))
    .bind(record.is_revealed)
    .bind(chrono::Utc::now().timestamp_millis())
    .execute(pool)
    .await?;

    Ok(())
}

/// All of an account's wagers on one market, oldest first.
pub async fn list_for_market(
    pool: &SqlitePool,
    account: &str,
    chain_id: i64,
    market_id: &str,
) -> anyhow::Result<Vec<LocalWagerRecord>> {
    let rows = sqlx::query_as::<_, WagerRow>(
        r#"
        SELECT id, account, chain_id, market_id, placed_at_ms, option_index,
               outcome, amount, tx_hash, price_at_wager, is_revealed
        FROM wagers
        WHERE account = $1 AND chain_id = $2 AND market_id = $3
        ORDER BY placed_at_ms ASC
        "#,
    )
    .bind(account)
    .bind(chain_id)
    .bind(market_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(to_record).collect()
}

/// Fold oracle-revealed wagers into the ledger, keyed by placement
/// timestamp.
///
/// Rows the ledger already holds are overwritten with the decrypted option,
/// outcome and amount; `tx_hash` and `price_at_wager` only exist locally and
/// are left untouched. Running the merge twice with the same input is a
/// no-op the second time.
pub async fn merge_revealed(
    pool: &SqlitePool,
    account: &str,
    chain_id: i64,
    market_id: &str,
    revealed: &[RevealedWager],
) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;
    let now_ms = chrono::Utc::now().timestamp_millis();

    for wager in revealed {
        sqlx::query(
            r#"
            INSERT INTO wagers
                (id, account, chain_id, market_id, placed_at_ms, option_index,
                 outcome, amount, tx_hash, price_at_wager, is_revealed, created_at_ms)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NULL, NULL, 1, $9)
            ON CONFLICT (account, chain_id, market_id, placed_at_ms) DO UPDATE SET
                option_index = excluded.option_index,
                outcome = excluded.outcome,
                amount = excluded.amount,
                is_revealed = 1
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(account)
        .bind(chain_id)
        .bind(market_id)
        .bind(wager.placed_at_ms)
        .bind(wager.option_index as i64)
        .bind(wager.outcome.map(|o| o.as_db_str()))
        .bind(wager.amount.to_string())
        .bind(now_ms)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Drop every ledger row for an account on a chain. Used on logout and
/// network switch.
pub async fn wipe_account(pool: &SqlitePool, account: &str, chain_id: i64) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM wagers WHERE account = $1 AND chain_id = $2")
        .bind(account)
        .bind(chain_id)
        .execute(pool)
        .await?;

    Ok(())
}
