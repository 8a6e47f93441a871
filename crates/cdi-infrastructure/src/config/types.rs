//! Configuration data types
//!
//! Every section deserializes with defaults so a partial `cdi.toml` (or none
//! at all) yields a complete [`CdiConfig`].

use crate::constants::{DEFAULT_LOG_LEVEL, DEFAULT_OBSERVER_INDEX, DEFAULT_REQUEST_ACTIVE};
use cdi_application::{Alternatives, BeanManagerOptions};
use cdi_domain::error::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Root configuration of a container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CdiConfig {
    /// Alternative selection
    pub alternatives: AlternativesConfig,
    /// Event delivery
    pub events: EventsConfig,
    /// Built-in contexts
    pub contexts: ContextsConfig,
    /// Logging
    pub logging: LoggingConfig,
}

impl CdiConfig {
    /// Compile the selected alternative patterns
    pub fn alternatives(&self) -> Result<Alternatives> {
        Alternatives::new(&self.alternatives.selected)
    }

    /// Bean manager tunables derived from this configuration
    pub fn manager_options(&self) -> BeanManagerOptions {
        BeanManagerOptions {
            request_active: self.contexts.request_active,
            async_worker_threads: self.events.async_worker_threads,
            observer_index: self.events.observer_index,
        }
    }
}

/// Alternatives enabled for the deployment
///
/// `selected` accepts a TOML list or a comma-separated string, so
/// `CDI_ALTERNATIVES__SELECTED="app::MockPayment,**::Stub*"` works from the
/// environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlternativesConfig {
    /// Glob patterns over bean class names
    #[serde(deserialize_with = "deserialize_patterns")]
    pub selected: Vec<String>,
}

/// Event delivery settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Worker threads of the asynchronous executor, tokio's default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub async_worker_threads: Option<usize>,
    /// Memoize observer lookups per event type and qualifiers
    pub observer_index: bool,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            async_worker_threads: None,
            observer_index: DEFAULT_OBSERVER_INDEX,
        }
    }
}

/// Built-in context settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextsConfig {
    /// Whether the request context is active when the container starts
    pub request_active: bool,
}

impl Default for ContextsConfig {
    fn default() -> Self {
        Self {
            request_active: DEFAULT_REQUEST_ACTIVE,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json_format: bool,
    /// Also write a daily rolling log file at this path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_output: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            json_format: false,
            file_output: None,
        }
    }
}

fn deserialize_patterns<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Patterns {
        List(Vec<String>),
        Joined(String),
    }

    let patterns = match Patterns::deserialize(deserializer)? {
        Patterns::List(list) => list,
        Patterns::Joined(joined) => joined.split(',').map(str::to_string).collect(),
    };
    Ok(patterns
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect())
}
