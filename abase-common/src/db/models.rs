//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::Error;

/// Receipt of a confirmed contract deployment (append-only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub id: i64,
    pub contract_name: String,
    pub contract_address: String,
    pub transaction_hash: String,
    pub block_number: Option<i64>,
    pub gas_used: Option<i64>,
    pub deployer_address: String,
    pub network: String,
    pub deployed_at: DateTime<Utc>,
}

/// Tip lifecycle: created pending, then settled exactly once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TipStatus {
    Pending,
    Confirmed,
    Failed,
}

impl TipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipStatus::Pending => "pending",
            TipStatus::Confirmed => "confirmed",
            TipStatus::Failed => "failed",
        }
    }
}

/// A tip from a listener to an artist
///
/// `amount` is the canonical decimal string; arithmetic happens in the API
/// crate.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TipRecord {
    pub id: String,
    pub user_id: String,
    pub artist_id: String,
    pub amount: String,
    pub currency: String,
    pub status: TipStatus,
    pub transaction_hash: Option<String>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Owned catalog record kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Upload,
    Album,
    Event,
    Merch,
    NftCollection,
    NftToken,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 6] = [
        CatalogKind::Upload,
        CatalogKind::Album,
        CatalogKind::Event,
        CatalogKind::Merch,
        CatalogKind::NftCollection,
        CatalogKind::NftToken,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            CatalogKind::Upload => "artist_uploads",
            CatalogKind::Album => "albums",
            CatalogKind::Event => "events",
            CatalogKind::Merch => "merch_items",
            CatalogKind::NftCollection => "nft_collections",
            CatalogKind::NftToken => "nft_tokens",
        }
    }

    /// URL path segment under `/api/catalog/`
    pub fn path_segment(&self) -> &'static str {
        match self {
            CatalogKind::Upload => "uploads",
            CatalogKind::Album => "albums",
            CatalogKind::Event => "events",
            CatalogKind::Merch => "merch",
            CatalogKind::NftCollection => "nft-collections",
            CatalogKind::NftToken => "nft-tokens",
        }
    }

    /// Status a record takes when its owner publishes it
    pub fn live_status(&self) -> RecordStatus {
        match self {
            CatalogKind::Upload | CatalogKind::Album => RecordStatus::Published,
            _ => RecordStatus::Active,
        }
    }

    /// Keys that must be present in `details`
    pub fn required_details(&self) -> &'static [&'static str] {
        match self {
            CatalogKind::Upload => &["audio_url"],
            CatalogKind::Album => &[],
            CatalogKind::Event => &["venue", "starts_at"],
            CatalogKind::Merch => &["price"],
            CatalogKind::NftCollection => &["symbol"],
            CatalogKind::NftToken => &["collection_id"],
        }
    }
}

impl FromStr for CatalogKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CatalogKind::ALL
            .into_iter()
            .find(|kind| kind.path_segment() == s)
            .ok_or_else(|| Error::NotFound(format!("Unknown catalog kind: {}", s)))
    }
}

/// Catalog record status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RecordStatus {
    Draft,
    Published,
    Active,
    Deleted,
}

impl RecordStatus {
    pub fn is_live(&self) -> bool {
        matches!(self, RecordStatus::Published | RecordStatus::Active)
    }
}

/// Owned catalog record; `details` is a kind-specific JSON object
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    pub id: String,
    pub kind: CatalogKind,
    pub owner_id: String,
    pub title: String,
    pub status: RecordStatus,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub track_id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistTrack {
    pub track_id: String,
    pub position: i64,
    pub added_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_kind_from_path_segment() {
        for kind in CatalogKind::ALL {
            assert_eq!(kind.path_segment().parse::<CatalogKind>().unwrap(), kind);
        }
        assert!("songs".parse::<CatalogKind>().is_err());
    }

    #[test]
    fn test_live_status_per_kind() {
        assert_eq!(CatalogKind::Upload.live_status(), RecordStatus::Published);
        assert_eq!(CatalogKind::Event.live_status(), RecordStatus::Active);
        assert!(RecordStatus::Active.is_live());
        assert!(!RecordStatus::Draft.is_live());
        assert!(!RecordStatus::Deleted.is_live());
    }

    #[test]
    fn test_tip_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TipStatus::Confirmed).unwrap(), "\"confirmed\"");
        assert_eq!(TipStatus::Pending.as_str(), "pending");
    }
}
