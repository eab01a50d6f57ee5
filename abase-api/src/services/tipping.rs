//! Artist tipping
//!
//! A tip is validated, stored as `pending`, handed to the wallet, then
//! settled exactly once: `confirmed` with the transaction hash the wallet
//! reported, or `failed`. The hash is recorded as reported; nothing here
//! checks it against the chain.

use abase_common::chain::{is_base58, is_evm_tx_hash};
use abase_common::config::TippingConfig;
use abase_common::db::{TipRecord, TipStatus};
use async_trait::async_trait;
use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::db::tips::{self, NewTip};

pub const MAX_MESSAGE_CHARS: usize = 280;

#[derive(Debug, Error)]
pub enum TipError {
    #[error("Artist id is required")]
    MissingArtist,

    #[error("Cannot tip yourself")]
    SelfTip,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    #[error("Amount exceeds the {currency} maximum of {max}")]
    AmountAboveLimit { currency: Currency, max: BigDecimal },

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Message exceeds 280 characters ({0})")]
    MessageTooLong(usize),

    #[error("Invalid {currency} transaction hash: {hash}")]
    InvalidTransactionHash { currency: Currency, hash: String },

    #[error("Tip not found: {0}")]
    NotFound(String),

    #[error("Only the tipper can settle this tip")]
    NotTipper,

    #[error("Tip is already {status}")]
    AlreadySettled { status: &'static str },

    #[error("Wallet transfer for tip {tip_id} failed: {reason}")]
    Transport { tip_id: String, reason: String },

    #[error("Invalid tipping configuration: {0}")]
    InvalidConfig(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Supported tip currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "ETH")]
    Eth,
    #[serde(rename = "USDC")]
    Usdc,
    #[serde(rename = "SOL")]
    Sol,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Eth => "ETH",
            Currency::Usdc => "USDC",
            Currency::Sol => "SOL",
        }
    }

    /// Settles on an EVM chain (hex transaction hashes)
    pub fn is_evm(&self) -> bool {
        !matches!(self, Currency::Sol)
    }

    pub fn accepts_hash(&self, hash: &str) -> bool {
        if self.is_evm() {
            is_evm_tx_hash(hash)
        } else {
            is_base58(hash)
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = TipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ETH" => Ok(Currency::Eth),
            "USDC" => Ok(Currency::Usdc),
            "SOL" => Ok(Currency::Sol),
            other => Err(TipError::UnsupportedCurrency(other.to_string())),
        }
    }
}

/// Amount as sent by clients: a JSON number or a decimal string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(serde_json::Number),
    Text(String),
}

impl AmountInput {
    fn parse(&self) -> Result<BigDecimal, TipError> {
        let raw = match self {
            AmountInput::Number(n) => n.to_string(),
            AmountInput::Text(s) => s.trim().to_string(),
        };
        BigDecimal::from_str(&raw).map_err(|_| TipError::InvalidAmount(raw))
    }
}

/// Body of `POST /api/tips`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TipRequest {
    pub artist_id: String,
    pub amount: AmountInput,
    pub currency: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// A tip that passed every check
#[derive(Debug, Clone, PartialEq)]
pub struct ValidTip {
    pub artist_id: String,
    pub amount: BigDecimal,
    pub currency: Currency,
    pub message: Option<String>,
}

/// Per-currency ceilings
#[derive(Debug, Clone)]
pub struct TipPolicy {
    max_eth: BigDecimal,
    max_usdc: BigDecimal,
    max_sol: BigDecimal,
}

impl TipPolicy {
    pub fn from_config(config: &TippingConfig) -> Result<Self, TipError> {
        let parse = |name: &str, raw: &str| {
            BigDecimal::from_str(raw.trim())
                .map_err(|_| TipError::InvalidConfig(format!("{} = {:?}", name, raw)))
        };

        Ok(Self {
            max_eth: parse("max_eth", &config.max_eth)?,
            max_usdc: parse("max_usdc", &config.max_usdc)?,
            max_sol: parse("max_sol", &config.max_sol)?,
        })
    }

    pub fn max_for(&self, currency: Currency) -> &BigDecimal {
        match currency {
            Currency::Eth => &self.max_eth,
            Currency::Usdc => &self.max_usdc,
            Currency::Sol => &self.max_sol,
        }
    }

    pub fn validate(&self, tipper: &str, request: &TipRequest) -> Result<ValidTip, TipError> {
        let artist_id = request.artist_id.trim();
        if artist_id.is_empty() {
            return Err(TipError::MissingArtist);
        }
        if artist_id == tipper {
            return Err(TipError::SelfTip);
        }

        let currency: Currency = request.currency.parse()?;

        let amount = request.amount.parse()?;
        if amount <= BigDecimal::zero() {
            return Err(TipError::NonPositiveAmount);
        }
        let max = self.max_for(currency);
        if &amount > max {
            return Err(TipError::AmountAboveLimit {
                currency,
                max: max.clone(),
            });
        }

        let message = request
            .message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty());
        if let Some(m) = message {
            let chars = m.chars().count();
            if chars > MAX_MESSAGE_CHARS {
                return Err(TipError::MessageTooLong(chars));
            }
        }

        Ok(ValidTip {
            artist_id: artist_id.to_string(),
            amount,
            currency,
            message: message.map(str::to_string),
        })
    }
}

impl Default for TipPolicy {
    fn default() -> Self {
        Self {
            max_eth: BigDecimal::from(10),
            max_usdc: BigDecimal::from(10_000),
            max_sol: BigDecimal::from(500),
        }
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Transfer handed to the wallet
#[derive(Debug, Clone)]
pub struct Transfer<'a> {
    pub tip_id: &'a str,
    pub artist_id: &'a str,
    pub amount: &'a BigDecimal,
    pub currency: Currency,
}

/// Wallet seam: sends the transfer and returns its transaction hash
#[async_trait]
pub trait TipTransport: Send + Sync {
    async fn send(&self, transfer: Transfer<'_>) -> Result<String, TransportError>;
}

/// Confirmed totals for one currency
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyTotal {
    pub currency: String,
    pub total: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Earnings {
    pub artist_id: String,
    pub totals: Vec<CurrencyTotal>,
    pub pending_count: i64,
}

pub struct TipService {
    db: SqlitePool,
    policy: Arc<TipPolicy>,
}

impl TipService {
    pub fn new(db: SqlitePool, policy: Arc<TipPolicy>) -> Self {
        Self { db, policy }
    }

    /// Validate and store a pending tip
    pub async fn create(&self, tipper: &str, request: &TipRequest) -> Result<TipRecord, TipError> {
        let tip = self.policy.validate(tipper, request)?;
        let amount = tip.amount.to_string();

        let record = tips::insert_tip(
            &self.db,
            &NewTip {
                user_id: tipper,
                artist_id: &tip.artist_id,
                amount: &amount,
                currency: tip.currency.as_str(),
                message: tip.message.as_deref(),
            },
        )
        .await?;

        info!(tip_id = %record.id, artist = %record.artist_id, amount = %amount, currency = %tip.currency, "Tip pending");
        Ok(record)
    }

    pub async fn confirm(
        &self,
        tipper: &str,
        tip_id: &str,
        transaction_hash: &str,
    ) -> Result<TipRecord, TipError> {
        let tip = self.load_pending(tipper, tip_id).await?;

        let currency: Currency = tip.currency.parse()?;
        let hash = transaction_hash.trim();
        if !currency.accepts_hash(hash) {
            return Err(TipError::InvalidTransactionHash {
                currency,
                hash: hash.to_string(),
            });
        }

        self.settle(tip_id, TipStatus::Confirmed, Some(hash)).await
    }

    pub async fn fail(&self, tipper: &str, tip_id: &str) -> Result<TipRecord, TipError> {
        self.load_pending(tipper, tip_id).await?;
        self.settle(tip_id, TipStatus::Failed, None).await
    }

    /// Full flow: store pending, send through the wallet, settle
    ///
    /// Requests that fail validation never reach the transport.
    pub async fn send_tip(
        &self,
        transport: &dyn TipTransport,
        tipper: &str,
        request: &TipRequest,
    ) -> Result<TipRecord, TipError> {
        let pending = self.create(tipper, request).await?;
        let amount = BigDecimal::from_str(&pending.amount)
            .map_err(|_| TipError::InvalidAmount(pending.amount.clone()))?;
        let currency: Currency = pending.currency.parse()?;

        let transfer = Transfer {
            tip_id: &pending.id,
            artist_id: &pending.artist_id,
            amount: &amount,
            currency,
        };

        match transport.send(transfer).await {
            Ok(hash) => self.confirm(tipper, &pending.id, &hash).await,
            Err(e) => {
                warn!(tip_id = %pending.id, "Wallet transfer failed: {}", e);
                self.settle(&pending.id, TipStatus::Failed, None).await?;
                Err(TipError::Transport {
                    tip_id: pending.id,
                    reason: e.0,
                })
            }
        }
    }

    pub async fn earnings(&self, artist_id: &str) -> Result<Earnings, TipError> {
        let confirmed = tips::list_for_artist(&self.db, artist_id, Some(TipStatus::Confirmed)).await?;

        let mut totals: BTreeMap<String, (BigDecimal, i64)> = BTreeMap::new();
        for tip in confirmed {
            let amount = BigDecimal::from_str(&tip.amount)
                .map_err(|_| TipError::InvalidAmount(tip.amount.clone()))?;
            let entry = totals
                .entry(tip.currency)
                .or_insert_with(|| (BigDecimal::zero(), 0));
            entry.0 += amount;
            entry.1 += 1;
        }

        Ok(Earnings {
            artist_id: artist_id.to_string(),
            totals: totals
                .into_iter()
                .map(|(currency, (total, count))| CurrencyTotal {
                    currency,
                    total: total.to_string(),
                    count,
                })
                .collect(),
            pending_count: tips::count_pending(&self.db, artist_id).await?,
        })
    }

    async fn load_pending(&self, tipper: &str, tip_id: &str) -> Result<TipRecord, TipError> {
        let tip = tips::get_tip(&self.db, tip_id)
            .await?
            .ok_or_else(|| TipError::NotFound(tip_id.to_string()))?;

        if tip.user_id != tipper {
            return Err(TipError::NotTipper);
        }
        if tip.status != TipStatus::Pending {
            return Err(TipError::AlreadySettled {
                status: tip.status.as_str(),
            });
        }
        Ok(tip)
    }

    async fn settle(
        &self,
        tip_id: &str,
        status: TipStatus,
        hash: Option<&str>,
    ) -> Result<TipRecord, TipError> {
        let changed = tips::settle_tip(&self.db, tip_id, status, hash).await?;
        let tip = tips::get_tip(&self.db, tip_id)
            .await?
            .ok_or_else(|| TipError::NotFound(tip_id.to_string()))?;

        // Lost a race with another settlement
        if !changed {
            return Err(TipError::AlreadySettled {
                status: tip.status.as_str(),
            });
        }

        info!(tip_id = %tip_id, status = %status.as_str(), "Tip settled");
        Ok(tip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(amount: &str, currency: &str) -> TipRequest {
        TipRequest {
            artist_id: "artist".to_string(),
            amount: AmountInput::Text(amount.to_string()),
            currency: currency.to_string(),
            message: None,
        }
    }

    #[test]
    fn test_valid_tip() {
        let tip = TipPolicy::default()
            .validate("fan", &request("0.25", "ETH"))
            .unwrap();
        assert_eq!(tip.currency, Currency::Eth);
        assert_eq!(tip.amount, BigDecimal::from_str("0.25").unwrap());
    }

    #[test]
    fn test_amount_bounds() {
        let policy = TipPolicy::default();
        assert!(matches!(
            policy.validate("fan", &request("0", "ETH")),
            Err(TipError::NonPositiveAmount)
        ));
        assert!(matches!(
            policy.validate("fan", &request("-1", "USDC")),
            Err(TipError::NonPositiveAmount)
        ));
        assert!(matches!(
            policy.validate("fan", &request("10.0001", "ETH")),
            Err(TipError::AmountAboveLimit { currency: Currency::Eth, .. })
        ));
        // The maximum itself is allowed
        assert!(policy.validate("fan", &request("10", "ETH")).is_ok());
        assert!(matches!(
            policy.validate("fan", &request("lots", "SOL")),
            Err(TipError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_json_number_amount() {
        let req: TipRequest = serde_json::from_str(
            r#"{"artistId": "artist", "amount": 1.5, "currency": "USDC"}"#,
        )
        .unwrap();
        let tip = TipPolicy::default().validate("fan", &req).unwrap();
        assert_eq!(tip.amount, BigDecimal::from_str("1.5").unwrap());
    }

    #[test]
    fn test_rejects_unsupported_currency_and_self_tip() {
        let policy = TipPolicy::default();
        assert!(matches!(
            policy.validate("fan", &request("1", "eth")),
            Err(TipError::UnsupportedCurrency(_))
        ));
        assert!(matches!(
            policy.validate("artist", &request("1", "ETH")),
            Err(TipError::SelfTip)
        ));
    }

    #[test]
    fn test_message_length_counts_characters() {
        let policy = TipPolicy::default();
        let mut req = request("1", "USDC");

        req.message = Some("é".repeat(MAX_MESSAGE_CHARS));
        assert!(policy.validate("fan", &req).is_ok());

        req.message = Some("a".repeat(MAX_MESSAGE_CHARS + 1));
        assert!(matches!(
            policy.validate("fan", &req),
            Err(TipError::MessageTooLong(281))
        ));

        req.message = Some("   ".to_string());
        assert_eq!(policy.validate("fan", &req).unwrap().message, None);
    }

    #[test]
    fn test_policy_from_config() {
        let config = TippingConfig {
            max_eth: "0.5".to_string(),
            ..TippingConfig::default()
        };
        let policy = TipPolicy::from_config(&config).unwrap();
        assert!(matches!(
            policy.validate("fan", &request("0.6", "ETH")),
            Err(TipError::AmountAboveLimit { .. })
        ));

        let bad = TippingConfig {
            max_sol: "many".to_string(),
            ..TippingConfig::default()
        };
        assert!(matches!(
            TipPolicy::from_config(&bad),
            Err(TipError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_hash_shape_per_currency() {
        let evm = format!("0x{}", "a".repeat(64));
        assert!(Currency::Eth.accepts_hash(&evm));
        assert!(Currency::Usdc.accepts_hash(&evm));
        assert!(!Currency::Sol.accepts_hash(&evm));
        assert!(Currency::Sol.accepts_hash("5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnb"));
        assert!(!Currency::Eth.accepts_hash("0x1234"));
    }
}
