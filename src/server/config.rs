//! Configuration loading for mimird.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag, must exist)
//! 2. `~/.mimir/config.toml` (user)
//! 3. `/etc/mimir/config.toml` (system)
//!
//! All files are optional; without one the defaults apply. Environment
//! variables are applied on top of whatever was loaded:
//!
//! | Variable                 | Field                        |
//! |--------------------------|------------------------------|
//! | `EMBEDDING_MODEL_SERVER` | `embedding.server_url`       |
//! | `EMBEDDING_MODEL_HOST`   | `embedding.host`             |
//! | `SIMILARITY_THRESHOLD`   | `cache.similarity_threshold` |
//! | `MIMIR_ADDRESS`          | `server.address`             |

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::processor::{DEFAULT_SIMILARITY_THRESHOLD, Mimir, Processor};
use crate::server::service::DEFAULT_STREAM_BUFFER;
use crate::{MimirError, Result};

/// Daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Server network configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0:50051).
    #[serde(default = "default_address")]
    pub address: String,
    /// Answers buffered per processing stream (default: 16).
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            stream_buffer: default_stream_buffer(),
        }
    }
}

fn default_address() -> String {
    "0.0.0.0:50051".to_string()
}

fn default_stream_buffer() -> usize {
    DEFAULT_STREAM_BUFFER
}

/// Embedding service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding endpoint. Empty or absent disables embedding lookups.
    #[serde(default)]
    pub server_url: Option<String>,
    /// Override for the `Host` header on embedding calls.
    #[serde(default)]
    pub host: Option<String>,
}

/// Semantic cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Minimum cosine similarity (inclusive) for a hit (default: 0.75).
    #[serde(default = "default_threshold")]
    pub similarity_threshold: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_threshold(),
        }
    }
}

fn default_threshold() -> f64 {
    DEFAULT_SIMILARITY_THRESHOLD
}

const ENV_EMBEDDING_SERVER: &str = "EMBEDDING_MODEL_SERVER";
const ENV_EMBEDDING_HOST: &str = "EMBEDDING_MODEL_HOST";
const ENV_SIMILARITY_THRESHOLD: &str = "SIMILARITY_THRESHOLD";
const ENV_ADDRESS: &str = "MIMIR_ADDRESS";

impl Config {
    /// Load configuration from the standard locations, then apply
    /// environment overrides.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Parse a config file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            MimirError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            MimirError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path; `None` when no file is present.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(MimirError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".mimir").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/mimir/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// Apply overrides from an environment lookup. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(url) = get(ENV_EMBEDDING_SERVER) {
            self.embedding.server_url = Some(url);
        }
        if let Some(host) = get(ENV_EMBEDDING_HOST) {
            self.embedding.host = Some(host);
        }
        if let Some(raw) = get(ENV_SIMILARITY_THRESHOLD) {
            self.cache.similarity_threshold = raw.trim().parse().map_err(|e| {
                MimirError::Configuration(format!(
                    "Invalid {ENV_SIMILARITY_THRESHOLD} {raw:?}: {e}"
                ))
            })?;
        }
        if let Some(address) = get(ENV_ADDRESS) {
            self.server.address = address;
        }
        Ok(())
    }

    /// Build a [`Processor`] from this configuration.
    pub fn processor(&self) -> Result<Processor> {
        let mut builder = Mimir::builder().similarity_threshold(self.cache.similarity_threshold);
        if let Some(ref url) = self.embedding.server_url {
            builder = builder.embedding_server(url);
        }
        if let Some(ref host) = self.embedding.host {
            builder = builder.embedding_host(host);
        }
        builder.build()
    }
}
