//! Contract creation bytecode by contract kind
//!
//! The embedded set is placeholder init code, not the production contracts:
//! each one deploys a stub whose runtime returns a single word identifying
//! the contract kind. Real bytecode is supplied through `bytecode_dir`.

use abase_common::config::DeployConfig;
use abase_common::ContractKind;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

// init: copy 10 bytes of runtime from offset 0x0c and return them
// runtime: mstore(0, id) return(0, 32)
const ARTIST_TIPPING_PLACEHOLDER: &str = "0x600a600c600039600a6000f3600160005260206000f3";
const MUSIC_NFT_FACTORY_PLACEHOLDER: &str = "0x600a600c600039600a6000f3600260005260206000f3";
const EVENT_TICKETING_PLACEHOLDER: &str = "0x600a600c600039600a6000f3600360005260206000f3";

#[derive(Debug, Error)]
pub enum BytecodeError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid hex bytecode for {kind}: {reason}")]
    InvalidHex { kind: ContractKind, reason: String },
}

/// Bytecode lookup table
#[derive(Debug, Clone, Default)]
pub struct BytecodeRegistry {
    entries: HashMap<ContractKind, Vec<u8>>,
}

impl BytecodeRegistry {
    /// Placeholder bytecode for every allow-listed contract
    pub fn embedded() -> Result<Self, BytecodeError> {
        let mut registry = Self::default();
        for (kind, hex) in [
            (ContractKind::ArtistTipping, ARTIST_TIPPING_PLACEHOLDER),
            (ContractKind::MusicNftFactory, MUSIC_NFT_FACTORY_PLACEHOLDER),
            (ContractKind::EventTicketing, EVENT_TICKETING_PLACEHOLDER),
        ] {
            registry.insert(kind, decode_hex(kind, hex)?);
        }
        Ok(registry)
    }

    /// Load `<dir>/<ContractName>.bin` hex files
    ///
    /// Kinds without a file are left out; deploying them fails with missing
    /// bytecode.
    pub fn from_dir(dir: &Path) -> Result<Self, BytecodeError> {
        let mut registry = Self::default();

        for kind in ContractKind::ALL {
            let path = dir.join(format!("{}.bin", kind.as_str()));
            if !path.exists() {
                warn!(contract = %kind, path = %path.display(), "No bytecode file");
                continue;
            }

            let content = std::fs::read_to_string(&path).map_err(|source| BytecodeError::Read {
                path: path.clone(),
                source,
            })?;
            registry.insert(kind, decode_hex(kind, &content)?);
            info!(contract = %kind, path = %path.display(), "Loaded bytecode");
        }

        Ok(registry)
    }

    /// Directory bytecode when configured, embedded placeholders otherwise
    pub fn from_config(config: &DeployConfig) -> Result<Self, BytecodeError> {
        match &config.bytecode_dir {
            Some(dir) => Self::from_dir(dir),
            None => {
                warn!("Using embedded placeholder bytecode; not for production");
                Self::embedded()
            }
        }
    }

    pub fn insert(&mut self, kind: ContractKind, bytecode: Vec<u8>) {
        self.entries.insert(kind, bytecode);
    }

    pub fn get(&self, kind: ContractKind) -> Option<&[u8]> {
        self.entries.get(&kind).map(Vec::as_slice)
    }
}

fn decode_hex(kind: ContractKind, raw: &str) -> Result<Vec<u8>, BytecodeError> {
    let cleaned = raw.trim().trim_start_matches("0x");
    if cleaned.is_empty() {
        return Err(BytecodeError::InvalidHex {
            kind,
            reason: "empty".to_string(),
        });
    }

    hex::decode(cleaned).map_err(|e| BytecodeError::InvalidHex {
        kind,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_covers_every_contract() {
        let registry = BytecodeRegistry::embedded().unwrap();
        for kind in ContractKind::ALL {
            let code = registry.get(kind).expect("bytecode present");
            // 12 bytes of init code + 10 bytes of runtime
            assert_eq!(code.len(), 22);
        }
    }

    #[test]
    fn test_embedded_placeholders_differ() {
        let registry = BytecodeRegistry::embedded().unwrap();
        assert_ne!(
            registry.get(ContractKind::ArtistTipping),
            registry.get(ContractKind::EventTicketing)
        );
    }

    #[test]
    fn test_from_dir_loads_present_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ArtistTipping.bin"), "0x6001\n").unwrap();

        let registry = BytecodeRegistry::from_dir(dir.path()).unwrap();
        assert_eq!(registry.get(ContractKind::ArtistTipping), Some(&[0x60, 0x01][..]));
        assert!(registry.get(ContractKind::MusicNftFactory).is_none());
    }

    #[test]
    fn test_from_dir_rejects_bad_hex() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("EventTicketing.bin"), "0xzz").unwrap();

        assert!(matches!(
            BytecodeRegistry::from_dir(dir.path()),
            Err(BytecodeError::InvalidHex { kind: ContractKind::EventTicketing, .. })
        ));
    }

    #[test]
    fn test_from_config_prefers_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = DeployConfig {
            bytecode_dir: Some(dir.path().to_path_buf()),
            ..DeployConfig::default()
        };
        let registry = BytecodeRegistry::from_config(&config).unwrap();
        assert!(registry.get(ContractKind::ArtistTipping).is_none());
    }
}
