//! Current contract address per kind
//!
//! The most recent deployment of each kind wins; kinds never deployed on the
//! network resolve to the zero address.

use abase_common::db::DeploymentRecord;
use abase_common::{ContractKind, ZERO_ADDRESS};
use std::collections::BTreeMap;

/// Map contract name -> address for every allow-listed contract
pub fn resolve_addresses(records: &[DeploymentRecord]) -> BTreeMap<String, String> {
    let mut newest_first: Vec<&DeploymentRecord> = records.iter().collect();
    newest_first.sort_by(|a, b| {
        b.deployed_at
            .cmp(&a.deployed_at)
            .then_with(|| b.id.cmp(&a.id))
    });

    ContractKind::ALL
        .into_iter()
        .map(|kind| {
            let address = newest_first
                .iter()
                .find(|r| r.contract_name == kind.as_str())
                .map(|r| r.contract_address.clone())
                .unwrap_or_else(|| ZERO_ADDRESS.to_string());
            (kind.as_str().to_string(), address)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn record(id: i64, name: &str, address: &str, minutes: i64) -> DeploymentRecord {
        DeploymentRecord {
            id,
            contract_name: name.to_string(),
            contract_address: address.to_string(),
            transaction_hash: format!("0x{:064x}", id),
            block_number: Some(id),
            gas_used: None,
            deployer_address: ZERO_ADDRESS.to_string(),
            network: "base".to_string(),
            deployed_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
                + Duration::minutes(minutes),
        }
    }

    #[test]
    fn test_empty_history_resolves_to_zero() {
        let resolved = resolve_addresses(&[]);
        assert_eq!(resolved.len(), 3);
        assert!(resolved.values().all(|a| a == ZERO_ADDRESS));
    }

    #[test]
    fn test_most_recent_wins_regardless_of_input_order() {
        let records = vec![
            record(1, "ArtistTipping", "0xold", 0),
            record(3, "ArtistTipping", "0xnew", 10),
            record(2, "ArtistTipping", "0xmid", 5),
            record(4, "EventTicketing", "0xevent", 1),
        ];

        let resolved = resolve_addresses(&records);
        assert_eq!(resolved["ArtistTipping"], "0xnew");
        assert_eq!(resolved["EventTicketing"], "0xevent");
        assert_eq!(resolved["MusicNFTFactory"], ZERO_ADDRESS);
    }

    #[test]
    fn test_same_timestamp_breaks_tie_by_insertion() {
        let records = vec![
            record(5, "MusicNFTFactory", "0xfirst", 0),
            record(6, "MusicNFTFactory", "0xsecond", 0),
        ];
        assert_eq!(resolve_addresses(&records)["MusicNFTFactory"], "0xsecond");
    }

    #[test]
    fn test_unknown_names_ignored() {
        let records = vec![record(1, "LegacyVault", "0xlegacy", 0)];
        let resolved = resolve_addresses(&records);
        assert!(!resolved.contains_key("LegacyVault"));
    }
}
