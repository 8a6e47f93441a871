//! Container bootstrap
//!
//! | Type | Role |
//! |------|------|
//! | [`ContainerBuilder`] | Collects beans, observers and configuration |
//! | [`CdiContainer`] | Facade over one running bean manager |
//! | [`ContainerRegistry`] | Running containers by id |
//!
//! ```ignore
//! let registry = ContainerRegistry::new();
//! let container = registry.start(
//!     ContainerBuilder::new()
//!         .config(ConfigLoader::new().load()?)
//!         .bean(payment_bean),
//! )?;
//! let processor = container.reference::<dyn PaymentProcessor>(&QualifierSet::new())?;
//! registry.close_all()?;
//! ```

pub mod builder;
pub mod container;
pub mod registry;

pub use builder::ContainerBuilder;
pub use container::CdiContainer;
pub use registry::ContainerRegistry;
