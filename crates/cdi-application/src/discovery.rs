//! Build-time discovery
//!
//! Beans and observers can register themselves at compile time instead of
//! being handed to the container builder:
//!
//! ```ignore
//! use cdi_application::discovery::{BEANS, BeanEntry};
//!
//! #[linkme::distributed_slice(BEANS)]
//! static ORDER_SERVICE: BeanEntry = BeanEntry {
//!     name: "order_service",
//!     factory: || BeanDefinition::builder::<OrderService>()
//!         .scope(Scope::ApplicationScoped)
//!         .produce(|ctx| OrderService::new(ctx))
//!         .build(),
//! };
//! ```
//!
//! Entries are collected when a container starts with discovery enabled.

use crate::observer::ObserverMethod;
use cdi_domain::BeanDefinition;
use cdi_domain::error::Result;
use tracing::debug;

/// Bean registered at compile time
pub struct BeanEntry {
    /// Unique entry name, used in logs
    pub name: &'static str,
    /// Builds the bean definition
    pub factory: fn() -> Result<BeanDefinition>,
}

/// Observer registered at compile time
pub struct ObserverEntry {
    /// Unique entry name, used in logs
    pub name: &'static str,
    /// Builds the observer
    pub factory: fn() -> Result<ObserverMethod>,
}

#[linkme::distributed_slice]
pub static BEANS: [BeanEntry] = [..];

#[linkme::distributed_slice]
pub static OBSERVERS: [ObserverEntry] = [..];

/// Build every discovered bean definition
///
/// Fails on the first entry whose factory fails.
pub fn discovered_beans() -> Result<Vec<BeanDefinition>> {
    BEANS
        .iter()
        .map(|entry| {
            debug!(entry = entry.name, "Discovered bean");
            (entry.factory)()
        })
        .collect()
}

/// Build every discovered observer
pub fn discovered_observers() -> Result<Vec<ObserverMethod>> {
    OBSERVERS
        .iter()
        .map(|entry| {
            debug!(entry = entry.name, "Discovered observer");
            (entry.factory)()
        })
        .collect()
}

/// Names of the discovered bean entries
pub fn list_beans() -> Vec<&'static str> {
    BEANS.iter().map(|e| e.name).collect()
}

/// Names of the discovered observer entries
pub fn list_observers() -> Vec<&'static str> {
    OBSERVERS.iter().map(|e| e.name).collect()
}
