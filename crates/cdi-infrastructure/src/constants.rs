//! Infrastructure layer constants
//!
//! Contains constants that are part of the infrastructure implementation.
//! Runtime constants (qualifier names, priority bands) are defined in
//! `cdi_domain::constants`.

// ============================================================================
// CONFIGURATION CONSTANTS
// ============================================================================

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "cdi.toml";

/// Default configuration directory name
pub const DEFAULT_CONFIG_DIR: &str = "cdi";

/// Environment variable prefix for configuration
pub const CONFIG_ENV_PREFIX: &str = "CDI";

/// Separator for nested keys in environment variables
pub const CONFIG_ENV_SEPARATOR: &str = "__";

// ============================================================================
// LOGGING CONSTANTS
// ============================================================================

/// Environment variable overriding the log filter
pub const LOG_FILTER_ENV: &str = "CDI_LOG";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// File name prefix of rolling log files
pub const LOG_FILE_PREFIX: &str = "cdi";

// ============================================================================
// CONTAINER CONSTANTS
// ============================================================================

/// Whether the request context is active when a container starts
pub const DEFAULT_REQUEST_ACTIVE: bool = true;

/// Whether observer lookups are memoized by default
pub const DEFAULT_OBSERVER_INDEX: bool = true;
