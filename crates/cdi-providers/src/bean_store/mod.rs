//! Bean Store Implementations
//!
//! A bean store owns definitions and runs their producers and disposers on
//! behalf of the scoped contexts.

pub mod in_memory;

pub use in_memory::InMemoryBeanStore;
