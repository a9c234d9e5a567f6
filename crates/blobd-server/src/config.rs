use std::net::SocketAddr;
use std::path::Path;

use blobd_store::StoreConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Port the server listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 37899;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            store: StoreConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}
