//! Configuration
//!
//! [`CdiConfig`] is layered by [`ConfigLoader`] from defaults, `cdi.toml`
//! and `CDI_*` environment variables.

pub mod loader;
pub mod types;

pub use loader::{ConfigBuilder, ConfigLoader, validate_config};
pub use types::{AlternativesConfig, CdiConfig, ContextsConfig, EventsConfig, LoggingConfig};
