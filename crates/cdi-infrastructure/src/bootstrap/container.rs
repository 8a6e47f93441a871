//! Container facade
//!
//! A started container: programmatic lookup, event firing and shutdown over
//! one [`BeanManager`]. Cloning a [`CdiContainer`] shares the container.

use super::registry::Containers;
use cdi_application::{BeanManager, CreationalContext, Event, FireAsync, Instance, SharedContext};
use cdi_domain::error::{Error, Result};
use cdi_domain::{
    BeanDefinition, ContextualInstance, QualifierSet, Scope, Shutdown, Startup, TypeKey,
};
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{info, warn};

struct ContainerInner {
    manager: BeanManager,
    registry: Option<Weak<Containers>>,
    closed: AtomicBool,
}

/// A running CDI container
#[derive(Clone)]
pub struct CdiContainer {
    inner: Arc<ContainerInner>,
}

impl CdiContainer {
    /// Register `manager` and fire [`Startup`]
    ///
    /// A failing startup observer closes the container again.
    pub(crate) fn start(manager: BeanManager, registry: Option<&Arc<Containers>>) -> Result<Self> {
        let container = Self {
            inner: Arc::new(ContainerInner {
                manager,
                registry: registry.map(Arc::downgrade),
                closed: AtomicBool::new(false),
            }),
        };

        if let Some(containers) = registry {
            match containers.entry(container.id().to_string()) {
                Entry::Occupied(_) => {
                    container.inner.closed.store(true, Ordering::Release);
                    if let Err(e) = container.inner.manager.shutdown() {
                        warn!(
                            container = %container.id(),
                            error = %e,
                            "Shutdown of rejected container failed"
                        );
                    }
                    return Err(Error::illegal_state(format!(
                        "A container with id {} is already running",
                        container.id()
                    )));
                }
                Entry::Vacant(slot) => {
                    slot.insert(container.clone());
                }
            }
        }

        if let Err(e) = container.fire(Startup {
            container_id: container.id().to_string(),
        }) {
            if let Err(close) = container.close() {
                warn!(
                    container = %container.id(),
                    error = %close,
                    "Closing after failed startup failed"
                );
            }
            return Err(e);
        }
        info!(container = %container.id(), "Container started");
        Ok(container)
    }

    /// Container id
    pub fn id(&self) -> &str {
        self.inner.manager.id()
    }

    /// Bean manager of the container
    pub fn manager(&self) -> &BeanManager {
        &self.inner.manager
    }

    /// Whether the container accepts requests
    pub fn is_running(&self) -> bool {
        !self.inner.closed.load(Ordering::Acquire) && self.inner.manager.is_running()
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Selector over beans of type `T`
    pub fn instance<T>(&self) -> Instance<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.inner.manager.instance::<T>()
    }

    /// Selector over beans of type `T` with `qualifiers`
    pub fn select<T>(&self, qualifiers: &QualifierSet) -> Result<Instance<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.instance::<T>().select(qualifiers)
    }

    /// Every enabled bean matching the request
    pub fn beans(
        &self,
        required: &TypeKey,
        qualifiers: &QualifierSet,
    ) -> Vec<Arc<BeanDefinition>> {
        self.inner.manager.beans(required, qualifiers)
    }

    /// The single bean satisfying a request
    pub fn resolve(
        &self,
        required: &TypeKey,
        qualifiers: &QualifierSet,
    ) -> Result<Arc<BeanDefinition>> {
        self.inner.manager.resolve(required, qualifiers)
    }

    /// Contextual reference to `bean`, viewed as `required`
    pub fn get_reference(
        &self,
        bean: &Arc<BeanDefinition>,
        required: &TypeKey,
        creational: &CreationalContext,
    ) -> Result<ContextualInstance> {
        self.inner.manager.get_reference(bean, required, creational)
    }

    /// Typed reference to the single bean satisfying a request
    pub fn reference<T>(&self, qualifiers: &QualifierSet) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.inner.manager.reference::<T>(qualifiers)
    }

    /// Context of a scope
    pub fn context(&self, scope: &Scope) -> Result<SharedContext> {
        self.inner.manager.context(scope)
    }

    /// New root creational context
    pub fn create_creational_context(&self, bean: Option<&BeanDefinition>) -> CreationalContext {
        self.inner.manager.create_creational_context(bean)
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Event handle for events of type `T`
    pub fn event<T>(&self) -> Event<T>
    where
        T: Send + Sync + 'static,
    {
        self.inner.manager.event::<T>()
    }

    /// Fire an unqualified event synchronously
    pub fn fire<T>(&self, event: T) -> Result<()>
    where
        T: Send + Sync + 'static,
    {
        self.inner.manager.fire(event)
    }

    /// Fire an unqualified event to the asynchronous observers
    pub fn fire_async<T>(&self, event: T) -> FireAsync<T>
    where
        T: Send + Sync + 'static,
    {
        self.event::<T>().fire_async(event)
    }

    // ========================================================================
    // Shutdown
    // ========================================================================

    /// Fire [`Shutdown`], unregister and shut the bean manager down
    ///
    /// Runs once; later calls do nothing. A failing shutdown observer is
    /// logged and does not stop the shutdown.
    pub fn close(&self) -> Result<()> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if let Err(e) = self.inner.manager.fire(Shutdown {
            container_id: self.id().to_string(),
        }) {
            warn!(container = %self.id(), error = %e, "Shutdown observer failed");
        }
        if let Some(containers) = self.inner.registry.as_ref().and_then(Weak::upgrade) {
            containers.remove_if(self.id(), |_, registered| {
                Arc::ptr_eq(&registered.inner, &self.inner)
            });
        }
        let result = self.inner.manager.shutdown();
        info!(container = %self.id(), "Container closed");
        result
    }
}

impl std::fmt::Debug for CdiContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdiContainer")
            .field("id", &self.id())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
