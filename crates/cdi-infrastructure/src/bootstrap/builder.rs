//! Container builder
//!
//! Collects beans, observers, custom contexts and configuration, then
//! starts a [`CdiContainer`] either standalone or inside a
//! [`ContainerRegistry`](super::ContainerRegistry).

use super::container::CdiContainer;
use super::registry::Containers;
use crate::config::CdiConfig;
use cdi_application::discovery::{discovered_beans, discovered_observers};
use cdi_application::{BeanManager, ObserverMethod, SharedContext};
use cdi_domain::BeanDefinition;
use cdi_domain::error::{Error, Result};
use cdi_domain::ports::SharedBeanStore;
use cdi_providers::InMemoryBeanStore;
use std::sync::Arc;
use tracing::debug;

/// Builder for [`CdiContainer`]
pub struct ContainerBuilder {
    id: Option<String>,
    config: CdiConfig,
    store: Option<SharedBeanStore>,
    beans: Vec<BeanDefinition>,
    observers: Vec<ObserverMethod>,
    contexts: Vec<SharedContext>,
    discovery: bool,
}

impl ContainerBuilder {
    /// Builder with default configuration and discovery enabled
    pub fn new() -> Self {
        Self {
            id: None,
            config: CdiConfig::default(),
            store: None,
            beans: Vec::new(),
            observers: Vec::new(),
            contexts: Vec::new(),
            discovery: true,
        }
    }

    /// Container id (random when unset)
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Explicit id, if one was set
    pub fn requested_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Configuration
    #[must_use]
    pub fn config(mut self, config: CdiConfig) -> Self {
        self.config = config;
        self
    }

    /// Bean store of the host container
    ///
    /// Replaces the in-memory store; beans can then no longer be added
    /// through the builder.
    #[must_use]
    pub fn store(mut self, store: SharedBeanStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Register a bean in the in-memory store
    #[must_use]
    pub fn bean(mut self, bean: BeanDefinition) -> Self {
        self.beans.push(bean);
        self
    }

    /// Register several beans
    #[must_use]
    pub fn beans(mut self, beans: impl IntoIterator<Item = BeanDefinition>) -> Self {
        self.beans.extend(beans);
        self
    }

    /// Register an observer
    #[must_use]
    pub fn observer(mut self, observer: ObserverMethod) -> Self {
        self.observers.push(observer);
        self
    }

    /// Register several observers
    #[must_use]
    pub fn observers(mut self, observers: impl IntoIterator<Item = ObserverMethod>) -> Self {
        self.observers.extend(observers);
        self
    }

    /// Register a context for a custom scope
    #[must_use]
    pub fn context(mut self, context: SharedContext) -> Self {
        self.contexts.push(context);
        self
    }

    /// Collect link-time registered beans and observers (default `true`)
    #[must_use]
    pub fn discovery(mut self, enabled: bool) -> Self {
        self.discovery = enabled;
        self
    }

    /// Start a container outside any registry
    pub fn start(self) -> Result<CdiContainer> {
        self.launch(None)
    }

    pub(crate) fn launch(self, registry: Option<&Arc<Containers>>) -> Result<CdiContainer> {
        if let (Some(containers), Some(id)) = (registry, self.id.as_deref())
            && containers.contains_key(id)
        {
            return Err(Error::illegal_state(format!(
                "A container with id {id} is already running"
            )));
        }
        let manager = self.build_manager()?;
        CdiContainer::start(manager, registry)
    }

    fn build_manager(self) -> Result<BeanManager> {
        let Self {
            id,
            config,
            store,
            mut beans,
            mut observers,
            contexts,
            discovery,
        } = self;

        if discovery {
            observers.extend(discovered_observers()?);
        }

        let store: SharedBeanStore = match store {
            Some(store) if !beans.is_empty() => {
                return Err(Error::definition(format!(
                    "Beans cannot be added to the custom bean store {}",
                    store.name()
                )));
            }
            Some(store) => {
                if discovery {
                    debug!(store = store.name(), "Custom bean store, discovered beans ignored");
                }
                store
            }
            None => {
                if discovery {
                    beans.extend(discovered_beans()?);
                }
                let store = InMemoryBeanStore::new();
                for bean in beans {
                    store.register(bean);
                }
                Arc::new(store)
            }
        };

        let mut builder = BeanManager::builder(store)
            .alternatives(config.alternatives()?)
            .options(config.manager_options())
            .observers(observers);
        if let Some(id) = id {
            builder = builder.id(id);
        }
        for context in contexts {
            builder = builder.context(context);
        }
        builder.build()
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("id", &self.id)
            .field("beans", &self.beans.len())
            .field("observers", &self.observers.len())
            .field("contexts", &self.contexts.len())
            .field("discovery", &self.discovery)
            .finish_non_exhaustive()
    }
}
