//! Bean Store Port
//!
//! The runtime never constructs beans itself. It asks the store that owns
//! the definitions to create and destroy instances, and keeps only the
//! scoping and wiring.

use crate::entities::bean::BeanDefinition;
use crate::entities::instance::ContextualInstance;
use crate::error::Result;
use crate::ports::injection::InjectionContext;
use crate::value_objects::type_key::TypeKey;
use std::sync::Arc;

/// Shared handle to a bean store
pub type SharedBeanStore = Arc<dyn BeanStore>;

/// Owner of bean definitions and of the lifecycle of managed instances
///
/// Implementations must be safe to call from many threads; scoped contexts
/// serialize creation per bean identity but not across beans.
pub trait BeanStore: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Every enabled and disabled definition the store knows about
    fn definitions(&self) -> Vec<Arc<BeanDefinition>>;

    /// Definitions whose type closure contains `required`
    fn definitions_for(&self, required: &TypeKey) -> Vec<Arc<BeanDefinition>> {
        self.definitions()
            .into_iter()
            .filter(|bean| bean.has_type(required))
            .collect()
    }

    /// Create a new instance of `bean`
    ///
    /// Dependencies are obtained through `ctx`, which also records them as
    /// dependents of the instance being created.
    fn create(&self, bean: &BeanDefinition, ctx: &dyn InjectionContext)
    -> Result<ContextualInstance>;

    /// Destroy an instance previously returned by [`create`](Self::create)
    fn destroy(&self, bean: &BeanDefinition, instance: &ContextualInstance) -> Result<()>;

    /// Release store-level resources once the container is closed
    fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}
