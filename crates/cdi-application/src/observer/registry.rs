//! Observer registry
//!
//! Built once when the manager starts; immutable afterwards. Lookups can be
//! memoized per `(event type, qualifiers)`.

use crate::observer::method::{ObserverMethod, TransactionPhase};
use crate::resolution::BeanResolver;
use cdi_domain::error::Result;
use cdi_domain::{QualifierSet, TypeKey};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

type ObserverKey = (TypeKey, QualifierSet);

/// Collects observers before the manager starts
#[derive(Default)]
pub struct ObserverRegistryBuilder {
    observers: Vec<ObserverMethod>,
}

impl ObserverRegistryBuilder {
    /// Empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one observer
    pub fn add(&mut self, observer: ObserverMethod) -> &mut Self {
        self.observers.push(observer);
        self
    }

    /// Register several observers
    pub fn extend(&mut self, observers: impl IntoIterator<Item = ObserverMethod>) -> &mut Self {
        self.observers.extend(observers);
        self
    }

    /// Register one observer, by value
    #[must_use]
    pub fn with(mut self, observer: ObserverMethod) -> Self {
        self.observers.push(observer);
        self
    }

    /// Number of collected observers
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether no observer was collected
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Bind declaring beans and freeze the registry
    ///
    /// Observers are ordered by priority; equal priorities keep registration
    /// order.
    pub fn build(self, resolver: &BeanResolver, index: bool) -> Result<ObserverRegistry> {
        let mut observers = self.observers;
        for observer in &mut observers {
            observer.bind(resolver)?;
        }
        observers.sort_by_key(ObserverMethod::priority);

        for observer in observers
            .iter()
            .filter(|o| o.transaction_phase() != TransactionPhase::InProgress)
        {
            debug!(
                observer = %observer,
                phase = ?observer.transaction_phase(),
                "No transaction support, observer is notified immediately"
            );
        }

        Ok(ObserverRegistry {
            observers: observers.into_iter().map(Arc::new).collect(),
            index: index.then(DashMap::new),
        })
    }
}

/// Frozen, ordered observer table
pub struct ObserverRegistry {
    observers: Vec<Arc<ObserverMethod>>,
    index: Option<DashMap<ObserverKey, Arc<[Arc<ObserverMethod>]>>>,
}

impl ObserverRegistry {
    /// Observers of an event, in notification order
    pub fn find_list(
        &self,
        event_type: &TypeKey,
        qualifiers: &QualifierSet,
    ) -> Arc<[Arc<ObserverMethod>]> {
        let canonical = qualifiers.canonical();
        let Some(index) = &self.index else {
            return self.scan(event_type, &canonical);
        };
        let key = (*event_type, canonical);
        if let Some(found) = index.get(&key) {
            return Arc::clone(found.value());
        }
        let found = self.scan(event_type, &key.1);
        index.insert(key, Arc::clone(&found));
        found
    }

    /// Observers of an event, each observer once
    pub fn find_set(
        &self,
        event_type: &TypeKey,
        qualifiers: &QualifierSet,
    ) -> Vec<Arc<ObserverMethod>> {
        let mut seen = HashSet::new();
        self.find_list(event_type, qualifiers)
            .iter()
            .filter(|observer| seen.insert(observer.id()))
            .cloned()
            .collect()
    }

    fn scan(&self, event_type: &TypeKey, qualifiers: &QualifierSet) -> Arc<[Arc<ObserverMethod>]> {
        self.observers
            .iter()
            .filter(|observer| observer.matches(event_type, qualifiers))
            .cloned()
            .collect()
    }

    /// Number of registered observers
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether no observer is registered
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Every observer, in notification order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ObserverMethod>> {
        self.observers.iter()
    }
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.observers.len())
            .field("indexed", &self.index.is_some())
            .finish()
    }
}
