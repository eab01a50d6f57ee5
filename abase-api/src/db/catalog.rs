//! Catalog record queries
//!
//! All six kinds share one table shape; the table name always comes from
//! `CatalogKind::table_name`, never from request input.

use abase_common::db::{CatalogKind, CatalogRecord, RecordStatus};
use abase_common::time;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

fn map_row(kind: CatalogKind, row: &SqliteRow) -> Result<CatalogRecord, sqlx::Error> {
    let details: String = row.try_get("details")?;
    let details = serde_json::from_str(&details).map_err(|e| sqlx::Error::ColumnDecode {
        index: "details".to_string(),
        source: Box::new(e),
    })?;

    Ok(CatalogRecord {
        id: row.try_get("id")?,
        kind,
        owner_id: row.try_get("owner_id")?,
        title: row.try_get("title")?,
        status: row.try_get("status")?,
        details,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn insert(
    pool: &SqlitePool,
    kind: CatalogKind,
    owner_id: &str,
    title: &str,
    details: &serde_json::Value,
) -> Result<CatalogRecord, sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = time::now();

    let sql = format!(
        "INSERT INTO {} (id, owner_id, title, status, details, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        kind.table_name()
    );
    sqlx::query(&sql)
        .bind(&id)
        .bind(owner_id)
        .bind(title)
        .bind(RecordStatus::Draft)
        .bind(details.to_string())
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

    Ok(CatalogRecord {
        id,
        kind,
        owner_id: owner_id.to_string(),
        title: title.to_string(),
        status: RecordStatus::Draft,
        details: details.clone(),
        created_at: now,
        updated_at: now,
    })
}

pub async fn get(
    pool: &SqlitePool,
    kind: CatalogKind,
    id: &str,
) -> Result<Option<CatalogRecord>, sqlx::Error> {
    let sql = format!("SELECT * FROM {} WHERE id = ?", kind.table_name());
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    row.map(|r| map_row(kind, &r)).transpose()
}

pub async fn count_live(pool: &SqlitePool, kind: CatalogKind) -> Result<i64, sqlx::Error> {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE status = ?", kind.table_name());
    sqlx::query_scalar(&sql)
        .bind(kind.live_status())
        .fetch_one(pool)
        .await
}

/// Live records, newest first
pub async fn list_live(
    pool: &SqlitePool,
    kind: CatalogKind,
    limit: i64,
    offset: i64,
) -> Result<Vec<CatalogRecord>, sqlx::Error> {
    let sql = format!(
        "SELECT * FROM {} WHERE status = ? ORDER BY created_at DESC, id LIMIT ? OFFSET ?",
        kind.table_name()
    );
    let rows = sqlx::query(&sql)
        .bind(kind.live_status())
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    rows.iter().map(|r| map_row(kind, r)).collect()
}

/// Everything an owner has that is not deleted
pub async fn list_owned(
    pool: &SqlitePool,
    kind: CatalogKind,
    owner_id: &str,
) -> Result<Vec<CatalogRecord>, sqlx::Error> {
    let sql = format!(
        "SELECT * FROM {} WHERE owner_id = ? AND status <> 'deleted' ORDER BY created_at DESC, id",
        kind.table_name()
    );
    let rows = sqlx::query(&sql).bind(owner_id).fetch_all(pool).await?;
    rows.iter().map(|r| map_row(kind, r)).collect()
}

pub async fn update_content(
    pool: &SqlitePool,
    kind: CatalogKind,
    id: &str,
    title: &str,
    details: &serde_json::Value,
) -> Result<(), sqlx::Error> {
    let sql = format!(
        "UPDATE {} SET title = ?, details = ?, updated_at = ? WHERE id = ?",
        kind.table_name()
    );
    sqlx::query(&sql)
        .bind(title)
        .bind(details.to_string())
        .bind(time::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Compare-and-set on status; false if the record was not in `from`
pub async fn transition(
    pool: &SqlitePool,
    kind: CatalogKind,
    id: &str,
    from: &[RecordStatus],
    to: RecordStatus,
) -> Result<bool, sqlx::Error> {
    let placeholders = vec!["?"; from.len()].join(", ");
    let sql = format!(
        "UPDATE {} SET status = ?, updated_at = ? WHERE id = ? AND status IN ({})",
        kind.table_name(),
        placeholders
    );

    let mut query = sqlx::query(&sql).bind(to).bind(time::now()).bind(id);
    for status in from {
        query = query.bind(*status);
    }

    Ok(query.execute(pool).await?.rows_affected() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use abase_common::db::init_memory_database;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_and_get_round_trip_details() {
        let pool = init_memory_database().await.unwrap();
        let details = json!({ "venue": "Warehouse 9", "starts_at": "2026-11-01T20:00:00Z" });

        let created = insert(&pool, CatalogKind::Event, "artist", "Launch", &details)
            .await
            .unwrap();
        let loaded = get(&pool, CatalogKind::Event, &created.id).await.unwrap().unwrap();

        assert_eq!(loaded.status, RecordStatus::Draft);
        assert_eq!(loaded.details["venue"], "Warehouse 9");
        assert!(get(&pool, CatalogKind::Merch, &created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transition_is_conditional() {
        let pool = init_memory_database().await.unwrap();
        let album = insert(&pool, CatalogKind::Album, "artist", "LP", &json!({}))
            .await
            .unwrap();

        let from = [RecordStatus::Draft];
        assert!(transition(&pool, CatalogKind::Album, &album.id, &from, RecordStatus::Published)
            .await
            .unwrap());
        assert!(!transition(&pool, CatalogKind::Album, &album.id, &from, RecordStatus::Published)
            .await
            .unwrap());

        assert_eq!(count_live(&pool, CatalogKind::Album).await.unwrap(), 1);
        assert_eq!(list_live(&pool, CatalogKind::Album, 50, 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_owned_listing_skips_deleted() {
        let pool = init_memory_database().await.unwrap();
        let a = insert(&pool, CatalogKind::Merch, "artist", "Tee", &json!({ "price": "25" }))
            .await
            .unwrap();
        insert(&pool, CatalogKind::Merch, "artist", "Hoodie", &json!({ "price": "60" }))
            .await
            .unwrap();

        transition(&pool, CatalogKind::Merch, &a.id, &[RecordStatus::Draft], RecordStatus::Deleted)
            .await
            .unwrap();

        let owned = list_owned(&pool, CatalogKind::Merch, "artist").await.unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].title, "Hoodie");
    }
}
