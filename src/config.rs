//! # Configuration Management
//!
//! This module provides configuration for the verification client. The only
//! deployment-dependent setting is the identity provider, which follows the
//! network flag the bundle was built for. An optional JSON document can
//! override any field.
//!
//! ## Configuration Sources
//!
//! 1. **JSON document**: injected by the hosting page, fields optional
//! 2. **Network flag**: `ic` selects the public network, anything else is local
//! 3. **Defaults**: local network, 1 MiB chunks
//!
//! ## Example
//!
//! ```rust
//! use decentra_verify_web::config::{Config, Network};
//!
//! let config = Config::load(None, Some("ic")).unwrap();
//! assert_eq!(config.network, Network::Mainnet);
//! assert_eq!(config.identity_provider, "https://identity.ic0.app");
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CHUNK_SIZE, LOCAL_IDENTITY_PROVIDER, MAINNET_IDENTITY_PROVIDER, MAINNET_NETWORK_FLAG,
};
use crate::errors::{AppError, AppResult};
use crate::logging::Logger;
use crate::log_data;

/// Deployment network the client talks to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Local,
}

impl Network {
    /// Interprets the build-time network flag.
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag.map(str::trim) {
            Some(MAINNET_NETWORK_FLAG) => Network::Mainnet,
            _ => Network::Local,
        }
    }

    pub fn identity_provider(self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_IDENTITY_PROVIDER,
            Network::Local => LOCAL_IDENTITY_PROVIDER,
        }
    }
}

/// Configuration structure for the verification client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Network the backend canister is deployed on.
    pub network: Network,

    /// Login page used by the authentication client.
    pub identity_provider: String,

    /// Size of transfer chunks in bytes.
    /// Must match what the backend expects to append per call.
    pub chunk_size: usize,

    /// Backend canister id, when the hosting page supplies one.
    pub backend_canister_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::for_network(Network::default())
    }
}

impl Config {
    pub fn for_network(network: Network) -> Self {
        Self {
            network,
            identity_provider: network.identity_provider().to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            backend_canister_id: None,
        }
    }

    /// Loads configuration from an optional JSON document with fallback to
    /// values derived from the network flag.
    ///
    /// Fields missing from the document take the defaults of the network
    /// named by the document, or by `network_flag` when the document does not
    /// name one. An explicit `identity_provider` always wins.
    ///
    /// # Errors
    ///
    /// - `Config`: the document is not valid JSON for this structure
    /// - `Validation`: the chunk size is zero
    pub fn load(json: Option<&str>, network_flag: Option<&str>) -> AppResult<Self> {
        let logger = Logger::new("config");
        let flag_network = Network::from_flag(network_flag);

        let config = match json.map(str::trim).filter(|s| !s.is_empty()) {
            Some(document) => {
                let value: serde_json::Value = serde_json::from_str(document)?;
                let network = match value.get("network") {
                    Some(network) => serde_json::from_value(network.clone())?,
                    None => flag_network,
                };
                let mut base = serde_json::to_value(Self::for_network(network))?;
                if let (Some(base), Some(overrides)) = (base.as_object_mut(), value.as_object()) {
                    for (key, field) in overrides {
                        base.insert(key.clone(), field.clone());
                    }
                }
                let config: Config = serde_json::from_value(base)?;
                logger.info(
                    "Configuration loaded from document",
                    log_data!("network" => config.network, "chunk_size" => config.chunk_size),
                );
                config
            }
            None => {
                logger.info(
                    "No configuration document, using network defaults",
                    log_data!("network" => flag_network),
                );
                Self::for_network(flag_network)
            }
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::validation("chunk_size must be greater than zero"));
        }
        Ok(())
    }
}
