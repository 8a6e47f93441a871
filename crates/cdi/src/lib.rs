//! # CDI
//!
//! A Contexts and Dependency Injection runtime: typesafe bean resolution by
//! type and qualifiers, scoped contextual instances, programmatic lookup and
//! priority-ordered synchronous and asynchronous events.
//!
//! ## Example
//!
//! ```ignore
//! use cdi::prelude::*;
//!
//! let registry = ContainerRegistry::new();
//! let container = registry.start(
//!     ContainerBuilder::new()
//!         .config(ConfigLoader::new().load()?)
//!         .bean(
//!             BeanDefinition::builder::<CardProcessor>()
//!                 .expose::<dyn PaymentProcessor>(|p| p)
//!                 .scope(Scope::ApplicationScoped)
//!                 .produce(|_| Ok(CardProcessor))
//!                 .build()?,
//!         ),
//! )?;
//!
//! let processor = container.reference::<dyn PaymentProcessor>(&QualifierSet::new())?;
//! container.fire(OrderPlaced { id: 7 })?;
//! registry.close_all()?;
//! ```
//!
//! ## Architecture
//!
//! - `domain` - Type keys, qualifiers, scopes, bean metadata, ports and errors
//! - `application` - Resolution, contexts, selectors, observers and dispatch
//! - `providers` - The in-memory bean store
//! - `infrastructure` - Configuration, logging and container bootstrap

/// Domain layer - runtime vocabulary
///
/// Re-exports from the domain crate for convenience
pub mod domain {
    pub use cdi_domain::*;
}

/// Application layer - the runtime core
///
/// Re-exports from the application crate for convenience
pub mod application {
    pub use cdi_application::*;
}

/// Providers - bean store implementations
pub mod providers {
    pub use cdi_providers::*;
}

/// Infrastructure layer - configuration, logging and bootstrap
///
/// Re-exports from the infrastructure crate for convenience
pub mod infrastructure {
    pub use cdi_infrastructure::*;
}

/// Commonly used types
pub mod prelude {
    pub use cdi_application::{
        BeanManager, Context, CreationalContext, Event, FireAsync, Handle, Instance,
        NotificationOptions, ObserverInvocation, ObserverMethod, Reception, ScopedContext,
    };
    pub use cdi_domain::{
        Annotation, BeanDefinition, Error, Qualifier, QualifierSet, Result, Scope, Shutdown,
        Startup, TypeKey,
    };
    pub use cdi_infrastructure::{
        CdiConfig, CdiContainer, ConfigBuilder, ConfigLoader, ContainerBuilder, ContainerRegistry,
    };
}

pub use domain::{Error, Result};
pub use infrastructure::{CdiContainer, ContainerBuilder, ContainerRegistry};
