//! Contexts
//!
//! A [`Context`] stores contextual instances for one scope. Normal scopes and
//! `@Singleton` use [`ScopedContext`]; `@Dependent` uses the non-storing
//! [`DependentContext`].
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Context`] | Storage contract of one scope |
//! | [`Contextual`] | What a context asks to create an instance |
//! | [`CreationalContext`] | Lifecycle record of one instance |
//! | [`ScopedContext`] | Concurrent map with one instance per bean |
//! | [`DependentContext`] | Fresh instance per request, bound to the requester |

pub mod creational;
pub mod dependent;
pub mod scoped;

pub use creational::{CreationalContext, DestroyTarget};
pub use dependent::DependentContext;
pub use scoped::ScopedContext;

use cdi_domain::error::Result;
use cdi_domain::{BeanDefinition, ContextualInstance, Scope};
use std::sync::Arc;

/// Something a context can create an instance of
pub trait Contextual: Send + Sync {
    /// Bean being created
    fn bean(&self) -> &Arc<BeanDefinition>;

    /// Create a new instance and record its destruction target in `creational`
    fn create(&self, creational: &CreationalContext) -> Result<ContextualInstance>;
}

/// Storage of contextual instances for one scope
///
/// Instances are keyed by [`BeanDefinition::canonical_id`]. Returned
/// instances are the bean's concrete view; callers cast them to the
/// requested type.
pub trait Context: Send + Sync {
    /// Scope served by this context
    fn scope(&self) -> &Scope;

    /// Existing instance of the bean, or a new one created exactly once
    fn get(
        &self,
        contextual: &dyn Contextual,
        creational: &CreationalContext,
    ) -> Result<ContextualInstance>;

    /// Existing instance of the bean, without creating one
    fn get_if_exists(&self, bean: &BeanDefinition) -> Result<Option<ContextualInstance>>;

    /// Remove and destroy the instance of the bean, if any
    fn destroy(&self, bean: &BeanDefinition) -> Result<()>;

    /// Destroy every instance and deactivate the context
    fn destroy_all(&self);

    /// Make the context usable
    fn activate(&self);

    /// Suspend the context, keeping its instances
    fn deactivate(&self);

    /// Whether the context is active
    fn is_active(&self) -> bool;
}

/// Shared context handle
pub type SharedContext = Arc<dyn Context>;
