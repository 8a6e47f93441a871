//! Creational contexts
//!
//! A creational context follows one contextual instance from construction to
//! destruction. It records the partially constructed instance while the
//! producer runs, the destruction target once construction completes, and
//! every dependent instance created on its behalf.

use cdi_domain::error::{Error, Result};
use cdi_domain::ports::SharedBeanStore;
use cdi_domain::{BeanDefinition, BeanId, ContextualInstance};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, warn};

/// How an instance is destroyed once its creational context is released
#[derive(Clone)]
pub enum DestroyTarget {
    /// Destroy through the bean store that created it
    Container {
        /// Owning store
        store: SharedBeanStore,
        /// Bean of the instance
        bean: Arc<BeanDefinition>,
        /// The instance
        instance: ContextualInstance,
    },
    /// Destroy through the bean's own disposer
    Contextual {
        /// Bean of the instance
        bean: Arc<BeanDefinition>,
        /// The instance
        instance: ContextualInstance,
    },
}

impl DestroyTarget {
    /// Instance to be destroyed
    pub fn instance(&self) -> &ContextualInstance {
        match self {
            Self::Container { instance, .. } | Self::Contextual { instance, .. } => instance,
        }
    }

    /// Bean of the instance
    pub fn bean(&self) -> &Arc<BeanDefinition> {
        match self {
            Self::Container { bean, .. } | Self::Contextual { bean, .. } => bean,
        }
    }

    fn destroy(&self) -> Result<()> {
        match self {
            Self::Container {
                store,
                bean,
                instance,
            } => store.destroy(bean, instance),
            Self::Contextual { bean, instance } => bean.dispose(instance),
        }
    }
}

struct Inner {
    bean: Option<(BeanId, &'static str)>,
    parent: Weak<Inner>,
    incomplete: Mutex<Option<ContextualInstance>>,
    destruction: Mutex<Option<DestroyTarget>>,
    dependents: Mutex<Vec<CreationalContext>>,
    released: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lifecycle record of one contextual instance
///
/// Cloning shares the record.
#[derive(Clone)]
pub struct CreationalContext {
    inner: Arc<Inner>,
}

impl CreationalContext {
    /// Root context not tied to any bean
    pub fn new() -> Self {
        Self::build(None, Weak::new())
    }

    /// Root context for an instance of `bean`
    pub fn for_bean(bean: &BeanDefinition) -> Self {
        Self::build(Some(bean), Weak::new())
    }

    /// Context for an instance of `bean` created on behalf of this one
    ///
    /// The child is linked to its parent for cycle detection only; the
    /// dependent context decides whether it also becomes a dependent.
    pub fn child(&self, bean: &BeanDefinition) -> Self {
        Self::build(Some(bean), Arc::downgrade(&self.inner))
    }

    fn build(bean: Option<&BeanDefinition>, parent: Weak<Inner>) -> Self {
        Self {
            inner: Arc::new(Inner {
                bean: bean.map(|b| (b.canonical_id(), b.bean_class_name())),
                parent,
                incomplete: Mutex::new(None),
                destruction: Mutex::new(None),
                dependents: Mutex::new(Vec::new()),
                released: AtomicBool::new(false),
            }),
        }
    }

    /// Bean this context creates an instance of
    pub fn bean(&self) -> Option<BeanId> {
        self.inner.bean.map(|(id, _)| id)
    }

    /// Parent context, while it is alive
    pub fn parent(&self) -> Option<CreationalContext> {
        self.inner.parent.upgrade().map(|inner| Self { inner })
    }

    /// Record a partially constructed instance
    pub fn push(&self, instance: ContextualInstance) {
        *lock(&self.inner.incomplete) = Some(instance);
    }

    /// The partially constructed instance, if one was pushed
    pub fn incomplete(&self) -> Option<ContextualInstance> {
        lock(&self.inner.incomplete).clone()
    }

    /// Mark construction as complete and remember how to destroy the result
    pub fn complete(&self, target: DestroyTarget) {
        *lock(&self.inner.destruction) = Some(target);
        lock(&self.inner.incomplete).take();
    }

    /// Whether construction completed
    pub fn is_complete(&self) -> bool {
        lock(&self.inner.destruction).is_some()
    }

    /// The completed instance
    pub fn instance(&self) -> Option<ContextualInstance> {
        lock(&self.inner.destruction)
            .as_ref()
            .map(|target| target.instance().clone())
    }

    /// Bind a dependent instance's context to this one
    pub fn add_dependent(&self, dependent: CreationalContext) {
        lock(&self.inner.dependents).push(dependent);
    }

    /// Unbind a dependent that was released separately
    pub fn remove_dependent(&self, dependent: &CreationalContext) {
        lock(&self.inner.dependents).retain(|d| !d.same_context(dependent));
    }

    /// Number of bound dependents
    pub fn dependent_count(&self) -> usize {
        lock(&self.inner.dependents).len()
    }

    /// Whether both handles share one record
    pub fn same_context(&self, other: &CreationalContext) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether [`release`](Self::release) already ran
    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::Acquire)
    }

    /// Check whether creating `bean` under this context re-enters a bean
    /// that is still being constructed further up the chain
    ///
    /// Returns the partial instance pushed by that construction, fails when
    /// none was pushed, and returns `None` when there is no cycle.
    pub fn check_cycle(&self, bean: &BeanDefinition) -> Result<Option<ContextualInstance>> {
        let id = bean.canonical_id();
        let mut current = self.parent();
        while let Some(ctx) = current {
            if ctx.bean() == Some(id) && !ctx.is_complete() && !ctx.is_released() {
                return match ctx.incomplete() {
                    Some(partial) => {
                        debug!(bean = %bean, "Resolved circular dependency with partial instance");
                        Ok(Some(partial))
                    }
                    None => Err(Error::circular(bean.bean_class_name())),
                };
            }
            current = ctx.parent();
        }
        Ok(None)
    }

    /// Destroy the instance, then every dependent
    ///
    /// Runs at most once. A failure destroying this instance is returned;
    /// failures of dependents are logged and do not stop the others.
    pub fn release(&self) -> Result<()> {
        if self.inner.released.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let target = lock(&self.inner.destruction).take();
        lock(&self.inner.incomplete).take();
        let result = target.as_ref().map_or(Ok(()), DestroyTarget::destroy);

        let dependents = std::mem::take(&mut *lock(&self.inner.dependents));
        for dependent in dependents.iter().rev() {
            if let Err(e) = dependent.release() {
                warn!(
                    bean = dependent.bean_name().unwrap_or("<unknown>"),
                    error = %e,
                    "Failed to destroy dependent instance"
                );
            }
        }
        result
    }

    /// Undo a failed construction
    ///
    /// Releases the dependents bound after `mark` (a previous
    /// [`dependent_count`](Self::dependent_count)) and drops the partial
    /// instance. The context is not marked released, so construction can be
    /// retried with it.
    pub fn rollback(&self, mark: usize) {
        lock(&self.inner.incomplete).take();
        let abandoned = {
            let mut dependents = lock(&self.inner.dependents);
            let mark = mark.min(dependents.len());
            dependents.split_off(mark)
        };
        for dependent in abandoned.iter().rev() {
            if let Err(e) = dependent.release() {
                warn!(
                    bean = dependent.bean_name().unwrap_or("<unknown>"),
                    error = %e,
                    "Failed to release partial dependent"
                );
            }
        }
    }

    fn bean_name(&self) -> Option<&'static str> {
        self.inner.bean.map(|(_, name)| name)
    }
}

impl Default for CreationalContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CreationalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreationalContext")
            .field("bean", &self.bean_name())
            .field("complete", &self.is_complete())
            .field("dependents", &self.dependent_count())
            .field("released", &self.is_released())
            .finish()
    }
}
