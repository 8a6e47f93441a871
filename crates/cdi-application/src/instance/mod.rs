//! Programmatic lookup
//!
//! [`Instance`] is an immutable view (type + qualifiers) over the beans of a
//! container. [`select`](Instance::select) returns a narrower child view;
//! the parent is never modified.
//!
//! Dependent instances returned by [`get`](Instance::get) and
//! [`iter`](Instance::iter) belong to the view that created them and are
//! destroyed when it is dropped. Child views track their own.
//!
//! ## Usage
//!
//! ```ignore
//! let processors = manager.instance::<dyn PaymentProcessor>();
//! let synchronous = processors.select(&QualifierSet::single(Qualifier::new("Synchronous")))?;
//! let processor = synchronous.get()?;
//! ```

pub mod handle;

pub use handle::Handle;

use handle::HandleDependents;

use crate::bean_manager::{BeanManager, downcast_reference};
use crate::context::CreationalContext;
use cdi_domain::error::{Error, Result};
use cdi_domain::{
    BeanDefinition, ContextualInstance, InjectionPoint, QualifierSet, TypeKey, identity_of,
};
use futures::stream::{self, Stream};
use once_cell::sync::OnceCell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Selector over the beans of type `T`
pub struct Instance<T: ?Sized> {
    manager: BeanManager,
    required: TypeKey,
    qualifiers: QualifierSet,
    injection_point: Option<Arc<InjectionPoint>>,
    parent: CreationalContext,
    resolved: OnceCell<Arc<BeanDefinition>>,
    dependents: Mutex<Vec<(usize, CreationalContext)>>,
    handles: Arc<HandleDependents>,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T> Instance<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    pub(crate) fn new(
        manager: BeanManager,
        qualifiers: QualifierSet,
        injection_point: Option<Arc<InjectionPoint>>,
    ) -> Self {
        Self::with_parent(
            manager,
            qualifiers,
            injection_point,
            CreationalContext::new(),
            Arc::default(),
        )
    }

    fn with_parent(
        manager: BeanManager,
        qualifiers: QualifierSet,
        injection_point: Option<Arc<InjectionPoint>>,
        parent: CreationalContext,
        handles: Arc<HandleDependents>,
    ) -> Self {
        Self {
            manager,
            required: TypeKey::of::<T>(),
            qualifiers,
            injection_point,
            parent,
            resolved: OnceCell::new(),
            dependents: Mutex::new(Vec::new()),
            handles,
            _marker: PhantomData,
        }
    }

    /// Attach an injection point, reported to dependent instances created
    /// through this view
    #[must_use]
    pub fn at(mut self, injection_point: InjectionPoint) -> Self {
        self.injection_point = Some(Arc::new(injection_point));
        self
    }

    /// Requested type
    pub fn required_type(&self) -> TypeKey {
        self.required
    }

    /// Accumulated qualifiers
    pub fn qualifiers(&self) -> &QualifierSet {
        &self.qualifiers
    }

    /// Child view with additional qualifiers
    pub fn select(&self, qualifiers: &QualifierSet) -> Result<Instance<T>> {
        self.select_type::<T>(qualifiers)
    }

    /// Child view over a more specific type
    pub fn select_type<U>(&self, qualifiers: &QualifierSet) -> Result<Instance<U>>
    where
        U: ?Sized + Send + Sync + 'static,
    {
        let narrowed = self.qualifiers.narrow(qualifiers)?;
        Ok(Instance::with_parent(
            self.manager.clone(),
            narrowed,
            self.injection_point.clone(),
            self.parent.clone(),
            Arc::clone(&self.handles),
        ))
    }

    /// Bean this view resolves to, cached after the first success
    pub fn bean(&self) -> Result<&Arc<BeanDefinition>> {
        self.resolved.get_or_try_init(|| {
            self.manager.resolve(&self.required, &self.qualifiers)
        })
    }

    /// Contextual reference to the single matching bean
    pub fn get(&self) -> Result<Arc<T>> {
        let bean = Arc::clone(self.bean()?);
        self.get_bean(&bean)
    }

    fn get_bean(&self, bean: &Arc<BeanDefinition>) -> Result<Arc<T>> {
        let creational = self.parent.child(bean);
        let instance = self.manager.get_reference_at(
            bean,
            &self.required,
            &creational,
            self.injection_point.clone(),
        )?;
        let reference = downcast_reference::<T>(&instance, &self.required)?;
        if bean.scope().is_dependent() {
            self.dependents
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((instance.identity(), creational));
        }
        Ok(reference)
    }

    /// Contextual references to every matching bean
    ///
    /// Instances are created lazily as the iterator advances.
    pub fn iter(&self) -> impl Iterator<Item = Result<Arc<T>>> + '_ {
        self.manager
            .beans(&self.required, &self.qualifiers)
            .into_iter()
            .map(move |bean| self.get_bean(&bean))
    }

    /// [`iter`](Self::iter) as a `Stream`
    pub fn stream(&self) -> impl Stream<Item = Result<Arc<T>>> + '_ {
        stream::iter(self.iter())
    }

    /// Whether no bean matches
    pub fn is_unsatisfied(&self) -> bool {
        self.manager
            .resolution(&self.required, &self.qualifiers)
            .is_unsatisfied()
    }

    /// Whether several beans remain after disambiguation
    pub fn is_ambiguous(&self) -> bool {
        self.manager
            .resolution(&self.required, &self.qualifiers)
            .is_ambiguous()
    }

    /// Whether exactly one bean matches
    pub fn is_resolvable(&self) -> bool {
        self.manager
            .resolution(&self.required, &self.qualifiers)
            .is_resolved()
    }

    /// Destroy an instance obtained from this view
    ///
    /// A dependent instance created by this view's [`get`](Self::get) or by
    /// one of its handles is released with its own dependents, and the handle
    /// is closed. A contextual instance is removed from its context. Anything
    /// else goes straight to the bean's destruction callbacks.
    pub fn destroy(&self, instance: &Arc<T>) -> Result<()> {
        let identity = identity_of(instance);
        if let Some(creational) = take_tracked(&self.dependents, identity) {
            self.parent.remove_dependent(&creational);
            return creational.release();
        }
        if let Some(creational) = take_tracked(&self.handles, identity) {
            return creational.release();
        }

        let bean = Arc::clone(self.bean()?);
        if bean.scope().is_dependent() {
            debug!(bean = %bean, "Destroying untracked dependent instance");
            let erased = ContextualInstance::new(Arc::clone(instance));
            return self.manager.destroy_detached(&bean, &erased);
        }
        let context = self.manager.context(bean.scope())?;
        match context.get_if_exists(&bean)? {
            Some(current) if current.identity() == identity => context.destroy(&bean),
            Some(_) | None => Err(Error::illegal_argument(format!(
                "Instance is not the current contextual instance of {bean}"
            ))),
        }
    }

    /// Lazy handle to the single matching bean
    pub fn handle(&self) -> Result<Handle<T>> {
        let bean = Arc::clone(self.bean()?);
        Ok(Handle::new(
            self.manager.clone(),
            bean,
            self.required,
            self.injection_point.clone(),
            Arc::downgrade(&self.handles),
        ))
    }

    /// Lazy handles to every matching bean
    pub fn handles(&self) -> Vec<Handle<T>> {
        self.manager
            .beans(&self.required, &self.qualifiers)
            .into_iter()
            .map(|bean| {
                Handle::new(
                    self.manager.clone(),
                    bean,
                    self.required,
                    self.injection_point.clone(),
                    Arc::downgrade(&self.handles),
                )
            })
            .collect()
    }
}

fn take_tracked(
    tracked: &Mutex<Vec<(usize, CreationalContext)>>,
    identity: usize,
) -> Option<CreationalContext> {
    let mut tracked = tracked.lock().unwrap_or_else(PoisonError::into_inner);
    tracked
        .iter()
        .position(|(id, _)| *id == identity)
        .map(|index| tracked.remove(index).1)
}

impl<T: ?Sized> Drop for Instance<T> {
    fn drop(&mut self) {
        let dependents = std::mem::take(
            self.dependents
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for (_, creational) in dependents.iter().rev() {
            self.parent.remove_dependent(creational);
            if let Err(e) = creational.release() {
                warn!(
                    required = self.required.name(),
                    error = %e,
                    "Failed to release dependent instance"
                );
            }
        }
    }
}

impl<T: ?Sized> fmt::Debug for Instance<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.required)
            .field("qualifiers", &self.qualifiers)
            .finish_non_exhaustive()
    }
}
