//! Catalog ownership and lifecycle rules
//!
//! `draft -> live -> deleted`, with `draft -> deleted` also allowed. Deleted
//! records are invisible to everyone. Drafts are visible only to their owner.

use abase_common::db::{CatalogKind, CatalogRecord, RecordStatus};
use abase_common::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::info;

use crate::db::catalog as store;

pub const MAX_TITLE_CHARS: usize = 200;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecord {
    pub title: String,
    #[serde(default = "empty_object")]
    pub details: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRecord {
    pub title: Option<String>,
    /// Replaces the stored details when present
    pub details: Option<Value>,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

pub async fn create(
    db: &SqlitePool,
    kind: CatalogKind,
    owner_id: &str,
    input: &CreateRecord,
) -> Result<CatalogRecord> {
    let title = check_title(&input.title)?;
    check_details(db, kind, owner_id, &input.details).await?;

    let record = store::insert(db, kind, owner_id, title, &input.details).await?;
    info!(kind = kind.path_segment(), id = %record.id, owner = %owner_id, "Catalog record created");
    Ok(record)
}

/// A record as `viewer` may see it
pub async fn get_visible(
    db: &SqlitePool,
    kind: CatalogKind,
    id: &str,
    viewer: Option<&str>,
) -> Result<CatalogRecord> {
    let record = find(db, kind, id).await?;
    if record.status.is_live() || viewer == Some(record.owner_id.as_str()) {
        Ok(record)
    } else {
        Err(not_found(kind, id))
    }
}

pub async fn update(
    db: &SqlitePool,
    kind: CatalogKind,
    id: &str,
    caller: &str,
    input: &UpdateRecord,
) -> Result<CatalogRecord> {
    let record = owned(db, kind, id, caller).await?;

    let title = match &input.title {
        Some(t) => check_title(t)?.to_string(),
        None => record.title.clone(),
    };
    let details = match &input.details {
        Some(d) => {
            check_details(db, kind, caller, d).await?;
            d.clone()
        }
        None => record.details.clone(),
    };

    store::update_content(db, kind, id, &title, &details).await?;
    find(db, kind, id).await
}

pub async fn publish(
    db: &SqlitePool,
    kind: CatalogKind,
    id: &str,
    caller: &str,
) -> Result<CatalogRecord> {
    let record = owned(db, kind, id, caller).await?;
    if record.status.is_live() {
        return Err(Error::Conflict(format!("{} is already live", id)));
    }

    let live = kind.live_status();
    if !store::transition(db, kind, id, &[RecordStatus::Draft], live).await? {
        return Err(Error::Conflict(format!("{} changed status concurrently", id)));
    }

    info!(kind = kind.path_segment(), id = %id, "Catalog record published");
    find(db, kind, id).await
}

/// Soft delete
pub async fn delete(db: &SqlitePool, kind: CatalogKind, id: &str, caller: &str) -> Result<()> {
    owned(db, kind, id, caller).await?;

    let from = [RecordStatus::Draft, kind.live_status()];
    if !store::transition(db, kind, id, &from, RecordStatus::Deleted).await? {
        return Err(not_found(kind, id));
    }

    info!(kind = kind.path_segment(), id = %id, "Catalog record deleted");
    Ok(())
}

async fn find(db: &SqlitePool, kind: CatalogKind, id: &str) -> Result<CatalogRecord> {
    match store::get(db, kind, id).await? {
        Some(record) if record.status != RecordStatus::Deleted => Ok(record),
        _ => Err(not_found(kind, id)),
    }
}

/// Load for mutation by `caller`
///
/// Someone else's draft is reported as missing; someone else's live record
/// as forbidden.
async fn owned(db: &SqlitePool, kind: CatalogKind, id: &str, caller: &str) -> Result<CatalogRecord> {
    let record = get_visible(db, kind, id, Some(caller)).await?;
    if record.owner_id != caller {
        return Err(Error::Forbidden(format!("{} is owned by another user", id)));
    }
    Ok(record)
}

fn not_found(kind: CatalogKind, id: &str) -> Error {
    Error::NotFound(format!("{} {}", kind.path_segment(), id))
}

fn check_title(title: &str) -> Result<&str> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::InvalidInput("title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(Error::InvalidInput(format!(
            "title exceeds {} characters",
            MAX_TITLE_CHARS
        )));
    }
    Ok(title)
}

async fn check_details(
    db: &SqlitePool,
    kind: CatalogKind,
    owner_id: &str,
    details: &Value,
) -> Result<()> {
    let map = details
        .as_object()
        .ok_or_else(|| Error::InvalidInput("details must be a JSON object".to_string()))?;

    for key in kind.required_details() {
        match map.get(*key) {
            None | Some(Value::Null) => {
                return Err(Error::InvalidInput(format!("details.{} is required", key)))
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                return Err(Error::InvalidInput(format!("details.{} is empty", key)))
            }
            _ => {}
        }
    }

    if kind == CatalogKind::NftToken {
        let collection_id = map
            .get("collection_id")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidInput("details.collection_id must be a string".to_string()))?;

        let collection = store::get(db, CatalogKind::NftCollection, collection_id).await?;
        match collection {
            Some(c) if c.status != RecordStatus::Deleted && c.owner_id == owner_id => {}
            _ => {
                return Err(Error::InvalidInput(format!(
                    "collection {} is not one of your collections",
                    collection_id
                )))
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use abase_common::db::init_memory_database;
    use serde_json::json;

    fn input(title: &str, details: Value) -> CreateRecord {
        CreateRecord {
            title: title.to_string(),
            details,
        }
    }

    #[tokio::test]
    async fn test_lifecycle_draft_live_deleted() {
        let db = init_memory_database().await.unwrap();
        let upload = create(
            &db,
            CatalogKind::Upload,
            "artist",
            &input("Demo", json!({ "audio_url": "ipfs://demo" })),
        )
        .await
        .unwrap();
        assert_eq!(upload.status, RecordStatus::Draft);

        // Draft hidden from the public
        assert!(matches!(
            get_visible(&db, CatalogKind::Upload, &upload.id, None).await,
            Err(Error::NotFound(_))
        ));

        let live = publish(&db, CatalogKind::Upload, &upload.id, "artist").await.unwrap();
        assert_eq!(live.status, RecordStatus::Published);
        assert!(matches!(
            publish(&db, CatalogKind::Upload, &upload.id, "artist").await,
            Err(Error::Conflict(_))
        ));
        assert!(get_visible(&db, CatalogKind::Upload, &upload.id, None).await.is_ok());

        delete(&db, CatalogKind::Upload, &upload.id, "artist").await.unwrap();
        assert!(matches!(
            get_visible(&db, CatalogKind::Upload, &upload.id, Some("artist")).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            delete(&db, CatalogKind::Upload, &upload.id, "artist").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_required_details() {
        let db = init_memory_database().await.unwrap();
        let missing = create(&db, CatalogKind::Event, "artist", &input("Gig", json!({ "venue": "Hall" }))).await;
        assert!(matches!(missing, Err(Error::InvalidInput(_))));

        let not_object = create(&db, CatalogKind::Album, "artist", &input("LP", json!([1, 2]))).await;
        assert!(matches!(not_object, Err(Error::InvalidInput(_))));

        let blank_title = create(&db, CatalogKind::Album, "artist", &input("   ", json!({}))).await;
        assert!(matches!(blank_title, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_ownership() {
        let db = init_memory_database().await.unwrap();
        let merch = create(&db, CatalogKind::Merch, "artist", &input("Tee", json!({ "price": "25" })))
            .await
            .unwrap();

        // Someone else's draft does not exist for them
        assert!(matches!(
            publish(&db, CatalogKind::Merch, &merch.id, "mallory").await,
            Err(Error::NotFound(_))
        ));

        publish(&db, CatalogKind::Merch, &merch.id, "artist").await.unwrap();
        assert!(matches!(
            delete(&db, CatalogKind::Merch, &merch.id, "mallory").await,
            Err(Error::Forbidden(_))
        ));

        let update = UpdateRecord {
            title: Some("Tee (black)".to_string()),
            details: None,
        };
        let updated = super::update(&db, CatalogKind::Merch, &merch.id, "artist", &update)
            .await
            .unwrap();
        assert_eq!(updated.title, "Tee (black)");
        assert_eq!(updated.details["price"], "25");
    }

    #[tokio::test]
    async fn test_nft_token_needs_own_collection() {
        let db = init_memory_database().await.unwrap();
        let collection = create(
            &db,
            CatalogKind::NftCollection,
            "artist",
            &input("Genesis", json!({ "symbol": "GEN" })),
        )
        .await
        .unwrap();

        let token = input("#1", json!({ "collection_id": collection.id }));
        assert!(create(&db, CatalogKind::NftToken, "artist", &token).await.is_ok());
        assert!(matches!(
            create(&db, CatalogKind::NftToken, "mallory", &token).await,
            Err(Error::InvalidInput(_))
        ));

        delete(&db, CatalogKind::NftCollection, &collection.id, "artist").await.unwrap();
        assert!(matches!(
            create(&db, CatalogKind::NftToken, "artist", &token).await,
            Err(Error::InvalidInput(_))
        ));
    }
}
