//! Co-signer configuration — parsed from TOML file + environment variable overrides.
//!
//! Priority: environment variables > config file > defaults.

use anyhow::{Context, Result};
use bitcoin::sighash::EcdsaSighashType;
use bitcoin::{Network, NetworkKind, PrivateKey};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Top-level co-signer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CosignerConfig {
    /// Signing key and sighash settings
    #[serde(default)]
    pub signer: SignerSection,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingSection,

    /// Bitcoin network settings
    #[serde(default)]
    pub bitcoin: BitcoinSection,
}

/// Signing key and sighash settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerSection {
    /// WIF-encoded private key. Empty means inspect-only.
    #[serde(default)]
    pub private_key: String,

    /// Sighash type applied to new signatures, e.g. "SIGHASH_ALL"
    #[serde(default = "default_sighash_type")]
    pub sighash_type: String,
}

impl Default for SignerSection {
    fn default() -> Self {
        Self {
            private_key: String::new(),
            sighash_type: default_sighash_type(),
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Bitcoin network settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitcoinSection {
    /// Bitcoin network: "bitcoin", "testnet", "signet", "regtest"
    #[serde(default = "default_network")]
    pub network: String,
}

impl Default for BitcoinSection {
    fn default() -> Self {
        Self {
            network: default_network(),
        }
    }
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_sighash_type() -> String {
    "SIGHASH_ALL".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_network() -> String {
    "bitcoin".to_string()
}

// ============================================================================
// Loading & environment override
// ============================================================================

impl CosignerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: CosignerConfig =
            toml::from_str(&contents).with_context(|| "Failed to parse TOML config")?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `BAREMULTISIG_PRIVATE_KEY`
    /// - `BAREMULTISIG_SIGHASH_TYPE`
    /// - `BAREMULTISIG_LOG_LEVEL`
    /// - `BAREMULTISIG_NETWORK`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("BAREMULTISIG_PRIVATE_KEY") {
            self.signer.private_key = v;
        }
        if let Ok(v) = std::env::var("BAREMULTISIG_SIGHASH_TYPE") {
            self.signer.sighash_type = v;
        }
        if let Ok(v) = std::env::var("BAREMULTISIG_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = std::env::var("BAREMULTISIG_NETWORK") {
            self.bitcoin.network = v;
        }
    }

    /// Parse the bitcoin network string to a `bitcoin::Network`.
    pub fn network(&self) -> Network {
        match self.bitcoin.network.as_str() {
            "testnet" | "testnet3" => Network::Testnet,
            "signet" => Network::Signet,
            "regtest" => Network::Regtest,
            _ => Network::Bitcoin,
        }
    }

    pub fn sighash_type(&self) -> Result<EcdsaSighashType> {
        EcdsaSighashType::from_str(&self.signer.sighash_type)
            .with_context(|| format!("Unknown sighash type: {}", self.signer.sighash_type))
    }

    /// The configured signing key, if any.
    pub fn private_key(&self) -> Result<Option<PrivateKey>> {
        if self.signer.private_key.is_empty() {
            return Ok(None);
        }
        let key = PrivateKey::from_wif(&self.signer.private_key)
            .context("signer.private_key is not a valid WIF key")?;
        Ok(Some(key))
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        // Sighash type must be one of the standard ones
        self.sighash_type()?;

        // A configured key must belong to the configured network
        if let Some(key) = self.private_key()? {
            anyhow::ensure!(
                key.network == NetworkKind::from(self.network()),
                "signer.private_key is not a {} key",
                self.bitcoin.network
            );
        }

        anyhow::ensure!(
            matches!(
                self.logging.level.as_str(),
                "error" | "warn" | "info" | "debug" | "trace" | "off"
            ),
            "logging.level must be one of error/warn/info/debug/trace/off"
        );

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
