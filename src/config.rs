//! Configuration: built-in deployment constants plus an optional TOML overlay.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::route::RouteConfig;

/// Tag of the current cache generation. Bump it to force a full re-fetch.
pub const CACHE_NAME: &str = "grannybqr-v1";

/// Paths precached at install, in order.
pub const ASSET_MANIFEST: &[&str] = &[
    "/",
    "/granny-b-logo.png",
    "/granny-b-logo.svg",
    "/granny-b-tin.png",
    "/granny-b-animated.mp4",
];

/// Path prefix of API routes.
pub const DYNAMIC_PREFIX: &str = "/api/";

/// Endpoints that are always served from the network.
pub const DYNAMIC_ENDPOINTS: &[&str] = &["/chat", "/lead", "/tts", "/stt", "/recap"];

/// Configuration for the cache lifecycle manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Name of the current cache generation.
    pub cache_name: String,
    /// Asset manifest precached at install.
    pub assets: Vec<String>,
    /// Requests that bypass the cache.
    pub routes: RouteConfig,
    /// Skip the waiting phase on install and claim clients on activate.
    pub eager_activation: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_name: CACHE_NAME.to_string(),
            assets: ASSET_MANIFEST.iter().map(|&p| p.to_string()).collect(),
            routes: RouteConfig::default(),
            eager_activation: true,
        }
    }
}

impl WorkerConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cache generation name.
    #[must_use]
    pub fn with_cache_name(mut self, name: impl Into<String>) -> Self {
        self.cache_name = name.into();
        self
    }

    /// Sets the asset manifest.
    #[must_use]
    pub fn with_assets<I, S>(mut self, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assets = assets.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the dynamic route set.
    #[must_use]
    pub fn with_routes(mut self, routes: RouteConfig) -> Self {
        self.routes = routes;
        self
    }

    /// Sets whether the worker activates and claims clients eagerly.
    #[must_use]
    pub const fn with_eager_activation(mut self, eager: bool) -> Self {
        self.eager_activation = eager;
        self
    }

    /// Checks the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the cache name is empty or a manifest
    /// entry is blank.
    pub fn validate(&self) -> Result<()> {
        if self.cache_name.trim().is_empty() {
            return Err(Error::Config("cache_name must not be empty".to_string()));
        }
        if self.assets.iter().any(|a| a.trim().is_empty()) {
            return Err(Error::Config("asset manifest contains a blank path".to_string()));
        }
        Ok(())
    }
}

/// Settings for the command-line host that drives the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Origin manifest paths are resolved against.
    pub origin: String,
    /// Directory holding the cache generations.
    pub store_dir: PathBuf,
}

impl Default for HostConfig {
    fn default() -> Self {
        let cache_dir = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            origin: "http://127.0.0.1:3000".to_string(),
            store_dir: cache_dir.join("offline-shell"),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Worker configuration.
    pub worker: WorkerConfig,
    /// Host configuration.
    pub host: HostConfig,
}

impl AppConfig {
    /// Parses configuration from TOML, filling missing keys with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the TOML is malformed or fails validation.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| Error::Config(e.to_string()))?;
        config.worker.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}
