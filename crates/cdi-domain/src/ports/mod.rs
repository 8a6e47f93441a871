//! Domain Port Interfaces
//!
//! Contracts between the CDI runtime and the host that owns bean
//! definitions.
//!
//! ## Organization
//!
//! - **bean_store** - The external bean-definition store and its lifecycle
//!   callbacks
//! - **injection** - What a producer sees while an instance is being created

/// External bean-definition store
pub mod bean_store;
/// Injection during instance creation
pub mod injection;

pub use bean_store::{BeanStore, SharedBeanStore};
pub use injection::InjectionContext;
