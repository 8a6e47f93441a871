//! # Infrastructure Layer
//!
//! Configuration, logging and container bootstrap for the CDI runtime.
//!
//! ## Module Categories
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Layered configuration (defaults, `cdi.toml`, `CDI_*` env) |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`error_ext`] | Context extensions for foreign errors |
//! | [`bootstrap`] | Container builder, facade and registry |
//! | [`constants`] | File names, env prefixes and defaults |

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod error_ext;
pub mod logging;

pub use bootstrap::{CdiContainer, ContainerBuilder, ContainerRegistry};
pub use config::{CdiConfig, ConfigBuilder, ConfigLoader};
pub use error_ext::ErrorContext;
