//! In-memory bean store
//!
//! Holds definitions in a concurrent map keyed by bean id and delegates
//! instance creation to each definition's producer.

use cdi_domain::error::{Error, Result};
use cdi_domain::ports::{BeanStore, InjectionContext};
use cdi_domain::{BeanDefinition, BeanId, ContextualInstance, TypeKey};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::debug;

/// In-memory bean store
///
/// Definitions are returned in registration order. Counters of created and
/// destroyed instances are kept for diagnostics.
pub struct InMemoryBeanStore {
    definitions: DashMap<BeanId, Arc<BeanDefinition>>,
    created: AtomicU64,
    destroyed: AtomicU64,
    closed: AtomicBool,
}

impl InMemoryBeanStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            definitions: DashMap::new(),
            created: AtomicU64::new(0),
            destroyed: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Register a definition, returning the shared handle
    pub fn register(&self, bean: BeanDefinition) -> Arc<BeanDefinition> {
        let bean = Arc::new(bean);
        self.register_shared(Arc::clone(&bean));
        bean
    }

    /// Register an already shared definition
    pub fn register_shared(&self, bean: Arc<BeanDefinition>) {
        debug!(bean = %bean, id = %bean.id(), "Registered bean definition");
        self.definitions.insert(bean.id(), bean);
    }

    /// Builder-style [`register`](Self::register)
    #[must_use]
    pub fn with_bean(self, bean: BeanDefinition) -> Self {
        self.register(bean);
        self
    }

    /// Definition by id
    pub fn get(&self, id: BeanId) -> Option<Arc<BeanDefinition>> {
        self.definitions.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of definitions
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether no definition is registered
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Instances created so far
    pub fn created_count(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    /// Instances destroyed so far
    pub fn destroyed_count(&self) -> u64 {
        self.destroyed.load(Ordering::Relaxed)
    }

    /// Whether [`shutdown`](BeanStore::shutdown) ran
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Default for InMemoryBeanStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BeanStore for InMemoryBeanStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    fn definitions(&self) -> Vec<Arc<BeanDefinition>> {
        let mut definitions: Vec<_> = self
            .definitions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        definitions.sort_by_key(|bean| bean.id());
        definitions
    }

    fn definitions_for(&self, required: &TypeKey) -> Vec<Arc<BeanDefinition>> {
        let mut definitions: Vec<_> = self
            .definitions
            .iter()
            .filter(|entry| entry.value().has_type(required))
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        definitions.sort_by_key(|bean| bean.id());
        definitions
    }

    fn create(
        &self,
        bean: &BeanDefinition,
        ctx: &dyn InjectionContext,
    ) -> Result<ContextualInstance> {
        if self.is_closed() {
            return Err(Error::illegal_state(format!(
                "Bean store is closed, cannot create {}",
                bean.bean_class_name()
            )));
        }
        let instance = bean.produce(ctx)?;
        self.created.fetch_add(1, Ordering::Relaxed);
        debug!(bean = %bean, "Created instance");
        Ok(instance)
    }

    fn destroy(&self, bean: &BeanDefinition, instance: &ContextualInstance) -> Result<()> {
        bean.dispose(instance)?;
        self.destroyed.fetch_add(1, Ordering::Relaxed);
        debug!(bean = %bean, "Destroyed instance");
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(
                definitions = self.definitions.len(),
                created = self.created_count(),
                destroyed = self.destroyed_count(),
                "Bean store shut down"
            );
        }
        Ok(())
    }
}
