//! Storing context for normal scopes and `@Singleton`

use crate::context::{Context, Contextual, CreationalContext};
use cdi_domain::error::{Error, Result};
use cdi_domain::{BeanDefinition, BeanId, ContextualInstance, Scope};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, info, warn};

struct StoredInstance {
    instance: ContextualInstance,
    creational: CreationalContext,
    sequence: u64,
}

#[derive(Default)]
struct Slot {
    cell: OnceCell<StoredInstance>,
}

/// Context holding at most one instance per bean
///
/// Concurrent callers racing on the same bean converge on one slot; the
/// slot's once-cell runs the producer for exactly one of them and the others
/// block until it finishes. A slot whose instance is still being built is
/// left in place by [`destroy`](Context::destroy) and
/// [`destroy_all`](Context::destroy_all), so the instance is stored and
/// destroyed by a later call.
///
/// Cycles are detected along one creational chain only. Two threads that
/// start creating two scoped beans injecting each other at the same time
/// each wait on the other's slot and deadlock; break such cycles with
/// [`push`](CreationalContext::push) or a lazy `Instance` lookup.
pub struct ScopedContext {
    scope: Scope,
    active: AtomicBool,
    entries: DashMap<BeanId, Arc<Slot>>,
    sequence: AtomicU64,
}

impl ScopedContext {
    /// Create an active context
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            active: AtomicBool::new(true),
            entries: DashMap::new(),
            sequence: AtomicU64::new(0),
        }
    }

    /// Create an inactive context
    pub fn inactive(scope: Scope) -> Self {
        let context = Self::new(scope);
        context.active.store(false, Ordering::Release);
        context
    }

    /// Number of stored instances
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().cell.get().is_some())
            .count()
    }

    /// Whether no instance is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(Error::context_not_active(self.scope.name()))
        }
    }
}

impl Context for ScopedContext {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn get(
        &self,
        contextual: &dyn Contextual,
        creational: &CreationalContext,
    ) -> Result<ContextualInstance> {
        self.ensure_active()?;
        let bean = contextual.bean();
        // must run before waiting on the slot: a re-entrant init deadlocks
        if let Some(partial) = creational.check_cycle(bean)? {
            return Ok(partial);
        }

        let slot = Arc::clone(self.entries.entry(bean.canonical_id()).or_default().value());
        let stored = slot.cell.get_or_try_init(|| {
            let instance = contextual.create(creational)?;
            debug!(scope = %self.scope, bean = %bean, "Stored contextual instance");
            Ok::<_, Error>(StoredInstance {
                instance,
                creational: creational.clone(),
                sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
            })
        })?;
        Ok(stored.instance.clone())
    }

    fn get_if_exists(&self, bean: &BeanDefinition) -> Result<Option<ContextualInstance>> {
        self.ensure_active()?;
        Ok(self
            .entries
            .get(&bean.canonical_id())
            .and_then(|slot| slot.cell.get().map(|stored| stored.instance.clone())))
    }

    fn destroy(&self, bean: &BeanDefinition) -> Result<()> {
        self.ensure_active()?;
        let id = bean.canonical_id();
        let Some((_, slot)) = self.entries.remove_if(&id, |_, slot| slot.cell.get().is_some())
        else {
            if self.entries.contains_key(&id) {
                debug!(
                    scope = %self.scope,
                    bean = %bean,
                    "Skipped destroy of instance under construction"
                );
            }
            return Ok(());
        };
        match slot.cell.get() {
            Some(stored) => stored.creational.release(),
            None => Ok(()),
        }
    }

    fn destroy_all(&self) {
        let mut stored: Vec<Arc<Slot>> = Vec::new();
        self.entries.retain(|_, slot| {
            if slot.cell.get().is_some() {
                stored.push(Arc::clone(slot));
                false
            } else {
                true
            }
        });
        stored.sort_by_key(|slot| slot.cell.get().map_or(0, |s| s.sequence));

        let count = stored.len();
        for slot in stored.iter().rev() {
            let Some(entry) = slot.cell.get() else {
                continue;
            };
            if let Err(e) = entry.creational.release() {
                warn!(
                    scope = %self.scope,
                    error = %e,
                    "Failed to destroy contextual instance"
                );
            }
        }
        self.active.store(false, Ordering::Release);
        info!(scope = %self.scope, destroyed = count, "Context destroyed");
    }

    fn activate(&self) {
        self.active.store(true, Ordering::Release);
    }

    fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}
