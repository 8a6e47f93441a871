//! Configuration loader
//!
//! Handles loading configuration from TOML files, environment variables and
//! default values.

use crate::config::types::{CdiConfig, LoggingConfig};
use crate::constants::{
    CONFIG_ENV_PREFIX, CONFIG_ENV_SEPARATOR, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILENAME,
};
use crate::error_ext::ErrorContext;
use crate::logging::{log_config_loaded, parse_log_level};
use cdi_domain::error::{Error, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader service
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Configuration file path
    config_path: Option<PathBuf>,

    /// Environment prefix
    env_prefix: String,
}

impl ConfigLoader {
    /// Create a new configuration loader with default settings
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: CONFIG_ENV_PREFIX.to_string(),
        }
    }

    /// Set the configuration file path
    #[must_use]
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the environment variable prefix
    #[must_use]
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load configuration from all sources
    ///
    /// Sources are merged in this order (later sources override earlier):
    /// 1. Default values from `CdiConfig::default()`
    /// 2. TOML configuration file (if it exists)
    /// 3. Environment variables with prefix, nested with `__`
    ///    (e.g. `CDI_EVENTS__ASYNC_WORKER_THREADS`)
    pub fn load(&self) -> Result<CdiConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(CdiConfig::default()));

        if let Some(config_path) = &self.config_path {
            let exists = config_path.exists();
            if exists {
                figment = figment.merge(Toml::file(config_path));
            }
            log_config_loaded(config_path, exists);
        } else if let Some(default_path) = Self::find_default_config_path() {
            figment = figment.merge(Toml::file(&default_path));
            log_config_loaded(&default_path, true);
        }

        figment = figment.merge(
            Env::prefixed(&format!("{}_", self.env_prefix)).split(CONFIG_ENV_SEPARATOR),
        );

        let config: CdiConfig = figment
            .extract()
            .config_context("Failed to extract configuration")?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, config: &CdiConfig, path: P) -> Result<()> {
        let toml_string =
            toml::to_string_pretty(config).config_context("Failed to serialize config to TOML")?;
        std::fs::write(path.as_ref(), toml_string)?;
        Ok(())
    }

    /// Get the current configuration file path
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// First existing default configuration file
    fn find_default_config_path() -> Option<PathBuf> {
        let current_dir = env::current_dir().ok()?;

        let mut candidates = vec![
            current_dir.join(DEFAULT_CONFIG_FILENAME),
            current_dir
                .join(DEFAULT_CONFIG_DIR)
                .join(DEFAULT_CONFIG_FILENAME),
        ];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILENAME));
        }

        candidates.into_iter().find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a configuration
///
/// Runs after extraction; the loader and [`ConfigBuilder`] both use it.
pub fn validate_config(config: &CdiConfig) -> Result<()> {
    if config.events.async_worker_threads == Some(0) {
        return Err(Error::configuration(
            "events.async_worker_threads cannot be 0",
        ));
    }
    parse_log_level(&config.logging.level)?;
    config.alternatives().map_err(|e| {
        Error::configuration(format!("Invalid alternatives.selected: {e}"))
    })?;
    Ok(())
}

/// Programmatic configuration
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: CdiConfig,
}

impl ConfigBuilder {
    /// Create a new configuration builder with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Select an alternative pattern
    #[must_use]
    pub fn with_alternative(mut self, pattern: impl Into<String>) -> Self {
        self.config.alternatives.selected.push(pattern.into());
        self
    }

    /// Set the asynchronous worker thread count
    #[must_use]
    pub fn with_async_worker_threads(mut self, threads: usize) -> Self {
        self.config.events.async_worker_threads = Some(threads);
        self
    }

    /// Enable or disable the observer lookup index
    #[must_use]
    pub fn with_observer_index(mut self, enabled: bool) -> Self {
        self.config.events.observer_index = enabled;
        self
    }

    /// Whether the request context starts active
    #[must_use]
    pub fn with_request_active(mut self, active: bool) -> Self {
        self.config.contexts.request_active = active;
        self
    }

    /// Set logging configuration
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Result<CdiConfig> {
        validate_config(&self.config)?;
        Ok(self.config)
    }
}
