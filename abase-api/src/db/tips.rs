//! Tip rows
//!
//! Settlement is a single conditional UPDATE so a tip leaves `pending` at
//! most once even under concurrent confirm/fail calls.

use abase_common::db::{TipRecord, TipStatus};
use abase_common::time;
use sqlx::SqlitePool;

pub struct NewTip<'a> {
    pub user_id: &'a str,
    pub artist_id: &'a str,
    pub amount: &'a str,
    pub currency: &'a str,
    pub message: Option<&'a str>,
}

pub async fn insert_tip(pool: &SqlitePool, tip: &NewTip<'_>) -> Result<TipRecord, sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = time::now();

    sqlx::query(
        r#"
        INSERT INTO tips (id, user_id, artist_id, amount, currency, status, message, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, 'pending', ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(tip.user_id)
    .bind(tip.artist_id)
    .bind(tip.amount)
    .bind(tip.currency)
    .bind(tip.message)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(TipRecord {
        id,
        user_id: tip.user_id.to_string(),
        artist_id: tip.artist_id.to_string(),
        amount: tip.amount.to_string(),
        currency: tip.currency.to_string(),
        status: TipStatus::Pending,
        transaction_hash: None,
        message: tip.message.map(str::to_string),
        created_at: now,
        updated_at: now,
    })
}

pub async fn get_tip(pool: &SqlitePool, id: &str) -> Result<Option<TipRecord>, sqlx::Error> {
    sqlx::query_as::<_, TipRecord>("SELECT * FROM tips WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Move a pending tip to `status`; returns false if it was not pending
pub async fn settle_tip(
    pool: &SqlitePool,
    id: &str,
    status: TipStatus,
    transaction_hash: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE tips
        SET status = ?, transaction_hash = COALESCE(?, transaction_hash), updated_at = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(status.as_str())
    .bind(transaction_hash)
    .bind(time::now())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn list_sent(pool: &SqlitePool, user_id: &str) -> Result<Vec<TipRecord>, sqlx::Error> {
    sqlx::query_as::<_, TipRecord>(
        "SELECT * FROM tips WHERE user_id = ? ORDER BY created_at DESC, id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn list_for_artist(
    pool: &SqlitePool,
    artist_id: &str,
    status: Option<TipStatus>,
) -> Result<Vec<TipRecord>, sqlx::Error> {
    match status {
        Some(status) => {
            sqlx::query_as::<_, TipRecord>(
                "SELECT * FROM tips WHERE artist_id = ? AND status = ? ORDER BY created_at DESC, id",
            )
            .bind(artist_id)
            .bind(status.as_str())
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, TipRecord>(
                "SELECT * FROM tips WHERE artist_id = ? ORDER BY created_at DESC, id",
            )
            .bind(artist_id)
            .fetch_all(pool)
            .await
        }
    }
}

pub async fn count_pending(pool: &SqlitePool, artist_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM tips WHERE artist_id = ? AND status = 'pending'")
        .bind(artist_id)
        .fetch_one(pool)
        .await
}
