//! Contract and network identifiers shared by the deployer and the API
//!
//! Contract names are matched exactly as the web client sends them
//! (`MusicNFTFactory`, not `MusicNftFactory`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Address returned by the resolver for contracts that were never deployed
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// The contracts the deployer is allowed to deploy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContractKind {
    ArtistTipping,
    #[serde(rename = "MusicNFTFactory")]
    MusicNftFactory,
    EventTicketing,
}

impl ContractKind {
    /// Allow-list in resolver output order
    pub const ALL: [ContractKind; 3] = [
        ContractKind::ArtistTipping,
        ContractKind::MusicNftFactory,
        ContractKind::EventTicketing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractKind::ArtistTipping => "ArtistTipping",
            ContractKind::MusicNftFactory => "MusicNFTFactory",
            ContractKind::EventTicketing => "EventTicketing",
        }
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContractKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown contract: {}", s)))
    }
}

/// EVM networks the platform records deployments for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    Base,
    BaseSepolia,
    Ethereum,
    Sepolia,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Base => "base",
            Network::BaseSepolia => "base-sepolia",
            Network::Ethereum => "ethereum",
            Network::Sepolia => "sepolia",
        }
    }

    /// EIP-155 chain id
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Base => 8453,
            Network::BaseSepolia => 84532,
            Network::Ethereum => 1,
            Network::Sepolia => 11155111,
        }
    }

    /// Public RPC endpoint used when no `rpc_url` is configured
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Network::Base => "https://mainnet.base.org",
            Network::BaseSepolia => "https://sepolia.base.org",
            Network::Ethereum => "https://eth.llamarpc.com",
            Network::Sepolia => "https://rpc.sepolia.org",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base" => Ok(Network::Base),
            "base-sepolia" => Ok(Network::BaseSepolia),
            "ethereum" => Ok(Network::Ethereum),
            "sepolia" => Ok(Network::Sepolia),
            other => Err(Error::InvalidInput(format!("Unknown network: {}", other))),
        }
    }
}

/// `0x` followed by exactly 40 hex digits; checksum casing is not verified
pub fn is_evm_address(value: &str) -> bool {
    is_prefixed_hex(value, 40)
}

/// `0x` followed by exactly 64 hex digits
pub fn is_evm_tx_hash(value: &str) -> bool {
    is_prefixed_hex(value, 64)
}

/// Solana signatures and addresses are base58 (no 0, O, I, l)
pub fn is_base58(value: &str) -> bool {
    !value.is_empty()
        && value.chars().all(|c| {
            c.is_ascii_alphanumeric() && !matches!(c, '0' | 'O' | 'I' | 'l')
        })
}

fn is_prefixed_hex(value: &str, digits: usize) -> bool {
    match value.strip_prefix("0x") {
        Some(hex) => hex.len() == digits && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_kind_round_trips_names() {
        for kind in ContractKind::ALL {
            assert_eq!(kind.as_str().parse::<ContractKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_contract_kind_is_case_sensitive() {
        assert!("MusicNftFactory".parse::<ContractKind>().is_err());
        assert!("artisttipping".parse::<ContractKind>().is_err());
        assert!("Unknown".parse::<ContractKind>().is_err());
    }

    #[test]
    fn test_contract_kind_serde_uses_wire_names() {
        let json = serde_json::to_string(&ContractKind::MusicNftFactory).unwrap();
        assert_eq!(json, "\"MusicNFTFactory\"");
    }

    #[test]
    fn test_network_parse() {
        assert_eq!("base-sepolia".parse::<Network>().unwrap(), Network::BaseSepolia);
        assert_eq!(Network::BaseSepolia.chain_id(), 84532);
        assert!("polygon".parse::<Network>().is_err());
    }

    #[test]
    fn test_evm_address_shape() {
        assert!(is_evm_address("0x52908400098527886E0F7030069857D2E4169EE7"));
        assert!(is_evm_address(ZERO_ADDRESS));
        assert!(!is_evm_address("52908400098527886E0F7030069857D2E4169EE7"));
        assert!(!is_evm_address("0x52908400098527886E0F7030069857D2E4169EE"));
        assert!(!is_evm_address("0xZZ908400098527886E0F7030069857D2E4169EE7"));
    }

    #[test]
    fn test_tx_hash_shape() {
        let hash = format!("0x{}", "ab".repeat(32));
        assert!(is_evm_tx_hash(&hash));
        assert!(!is_evm_tx_hash("0xabc"));
    }

    #[test]
    fn test_base58() {
        assert!(is_base58("5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnb"));
        assert!(!is_base58("0OIl"));
        assert!(!is_base58(""));
    }
}
