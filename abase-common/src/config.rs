//! Configuration loading and root folder resolution
//!
//! Bootstrap settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or malformed TOML file never stops a service from starting;
//! the compiled defaults are used instead. Loading happens before tracing is
//! installed, so the outcome is returned as a [`ConfigSource`] and logged by
//! the caller afterwards.

use crate::{Error, Network, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "ABASE_ROOT_FOLDER";

/// Environment variable naming an explicit config file
pub const CONFIG_FILE_ENV: &str = "ABASE_CONFIG";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "audiobase.db";

/// Compiled fallbacks for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let root_folder = if cfg!(target_os = "linux") {
            // ~/.local/share/audiobase
            dirs::data_local_dir()
                .map(|d| d.join("audiobase"))
                .unwrap_or_else(|| PathBuf::from("/var/lib/audiobase"))
        } else if cfg!(target_os = "macos") {
            dirs::data_dir()
                .map(|d| d.join("audiobase"))
                .unwrap_or_else(|| PathBuf::from("/Library/Application Support/audiobase"))
        } else if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .map(|d| d.join("audiobase"))
                .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\audiobase"))
        } else {
            PathBuf::from("./audiobase_data")
        };

        Self {
            root_folder,
            log_level: "info".to_string(),
        }
    }
}

/// Bootstrap configuration loaded from TOML
///
/// Every section is optional; absent keys take the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Folder holding the database (optional)
    pub root_folder: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub deploy: DeployConfig,
    pub api: ApiConfig,
    pub discovery: DiscoveryConfig,
    pub tipping: TippingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Deployment executor settings
///
/// The signing key is deliberately absent: it is read from
/// `ABASE_DEPLOYER_PRIVATE_KEY` only.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    pub port: u16,
    pub network: Network,
    /// RPC endpoint; falls back to the network's public endpoint
    pub rpc_url: Option<String>,
    /// Gas limit ceiling for every deployment transaction
    pub gas_limit: u64,
    pub confirmations: usize,
    /// Upper bound on the confirmation wait; unset waits indefinitely
    pub confirmation_timeout_secs: Option<u64>,
    /// Directory of `<ContractName>.bin` files replacing the embedded bytecode
    pub bytecode_dir: Option<PathBuf>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            port: 5730,
            network: Network::BaseSepolia,
            rpc_url: None,
            gas_limit: 5_000_000,
            confirmations: 1,
            confirmation_timeout_secs: None,
            bytecode_dir: None,
        }
    }
}

impl DeployConfig {
    pub fn effective_rpc_url(&self) -> &str {
        self.rpc_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_rpc_url())
    }
}

/// Application API settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 5731 }
    }
}

/// Discovery node list and client settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub nodes: Vec<String>,
    pub app_name: String,
    pub timeout_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            nodes: vec![
                "https://discoveryprovider.audius.co".to_string(),
                "https://discoveryprovider2.audius.co".to_string(),
                "https://discoveryprovider3.audius.co".to_string(),
            ],
            app_name: "AudioBASE".to_string(),
            timeout_secs: 15,
        }
    }
}

/// Per-currency tip ceilings, as decimal strings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TippingConfig {
    pub max_eth: String,
    pub max_usdc: String,
    pub max_sol: String,
}

impl Default for TippingConfig {
    fn default() -> Self {
        Self {
            max_eth: "10".to_string(),
            max_usdc: "10000".to_string(),
            max_sol: "500".to_string(),
        }
    }
}

/// Where the bootstrap configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// No config file found
    Defaults,
    /// Parsed from this file
    File(PathBuf),
    /// File present but unusable; defaults were used
    Rejected { path: PathBuf, reason: String },
}

impl ConfigSource {
    /// Report how the configuration was obtained
    ///
    /// Call after the tracing subscriber is installed.
    pub fn log(&self) {
        match self {
            ConfigSource::Defaults => info!("No config file found, using compiled defaults"),
            ConfigSource::File(path) => info!("Loaded config from {}", path.display()),
            ConfigSource::Rejected { path, reason } => {
                warn!("Ignoring config file {}: {}", path.display(), reason)
            }
        }
    }
}

impl TomlConfig {
    /// Parse a config file, failing on I/O or syntax errors
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Locate and load the config file, degrading to defaults
    ///
    /// `explicit` (from the command line) wins over `ABASE_CONFIG`, which wins
    /// over the per-user and system locations.
    pub fn load(explicit: Option<&Path>) -> (Self, ConfigSource) {
        let candidate = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from))
            .or_else(default_config_path);

        let Some(path) = candidate else {
            return (Self::default(), ConfigSource::Defaults);
        };

        match Self::load_from(&path) {
            Ok(config) => (config, ConfigSource::File(path)),
            Err(e) => {
                let reason = e.to_string();
                (Self::default(), ConfigSource::Rejected { path, reason })
            }
        }
    }
}

/// Existing config file in the platform's standard locations
fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("audiobase").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc/audiobase/config.toml");
    if cfg!(unix) && system_config.exists() {
        return Some(system_config);
    }

    None
}

/// Resolves the root folder for a service
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
        }
    }

    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    pub fn resolve(&self, config: &TomlConfig) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!("[{}] Root folder from command line: {}", self.module_name, path.display());
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.is_empty() {
                info!("[{}] Root folder from {}: {}", self.module_name, ROOT_FOLDER_ENV, path);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &config.root_folder {
            info!("[{}] Root folder from config file: {}", self.module_name, path.display());
            return path.clone();
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder and locates the database inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config.deploy.port, 5730);
        assert_eq!(config.api.port, 5731);
        assert_eq!(config.deploy.network, Network::BaseSepolia);
        assert_eq!(config.deploy.gas_limit, 5_000_000);
        assert_eq!(config.discovery.nodes.len(), 3);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            [deploy]
            network = "base"
            confirmation_timeout_secs = 120
            "#,
        )
        .unwrap();
        assert_eq!(config.deploy.network, Network::Base);
        assert_eq!(config.deploy.confirmation_timeout_secs, Some(120));
        assert_eq!(config.deploy.confirmations, 1);
        assert_eq!(config.deploy.effective_rpc_url(), "https://mainnet.base.org");
    }

    #[test]
    fn test_database_path_inside_root() {
        let init = RootFolderInitializer::new(PathBuf::from("/tmp/abase-root"));
        assert_eq!(init.database_path(), PathBuf::from("/tmp/abase-root/audiobase.db"));
    }
}
