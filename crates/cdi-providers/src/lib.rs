//! # CDI Runtime - Bean Store Implementations
//!
//! Implementations of the [`BeanStore`] port defined in `cdi-domain`.
//!
//! | Store | Description |
//! |-------|-------------|
//! | [`InMemoryBeanStore`] | Definitions registered programmatically or discovered at link time |

pub use cdi_domain::error::{Error, Result};
pub use cdi_domain::ports::BeanStore;

/// Bean store implementations
pub mod bean_store;

pub use bean_store::InMemoryBeanStore;
