//! Lazy instance handles

use crate::bean_manager::{BeanManager, downcast_reference};
use crate::context::CreationalContext;
use cdi_domain::error::{Error, Result};
use cdi_domain::{BeanDefinition, InjectionPoint, TypeKey, identity_of};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tracing::warn;

/// Dependent instances created through the handles of one view, by identity
pub(crate) type HandleDependents = Mutex<Vec<(usize, CreationalContext)>>;

/// Handle to one bean whose instance is created on first [`get`](Self::get)
///
/// [`destroy`](Self::destroy) destroys the instance whatever its scope;
/// [`close`](Self::close) releases it only when it is dependent. Either runs
/// at most once, and dropping the handle closes it. A dependent instance
/// destroyed through the [`Instance`](super::Instance) the handle came from
/// also closes the handle.
pub struct Handle<T: ?Sized> {
    manager: BeanManager,
    bean: Arc<BeanDefinition>,
    required: TypeKey,
    injection_point: Option<Arc<InjectionPoint>>,
    instance: OnceCell<(Arc<T>, CreationalContext)>,
    closed: AtomicBool,
    tracker: Weak<HandleDependents>,
}

impl<T> Handle<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    pub(crate) fn new(
        manager: BeanManager,
        bean: Arc<BeanDefinition>,
        required: TypeKey,
        injection_point: Option<Arc<InjectionPoint>>,
        tracker: Weak<HandleDependents>,
    ) -> Self {
        Self {
            manager,
            bean,
            required,
            injection_point,
            instance: OnceCell::new(),
            closed: AtomicBool::new(false),
            tracker,
        }
    }

    /// Bean behind the handle
    pub fn bean(&self) -> &Arc<BeanDefinition> {
        &self.bean
    }

    /// Contextual reference, created on first call
    pub fn get(&self) -> Result<Arc<T>> {
        if self.is_closed() {
            return Err(Error::illegal_state(format!(
                "Handle for {} is already destroyed",
                self.bean
            )));
        }
        let (instance, _) = self.instance.get_or_try_init(|| {
            let creational = CreationalContext::for_bean(&self.bean);
            let instance = self.manager.get_reference_at(
                &self.bean,
                &self.required,
                &creational,
                self.injection_point.clone(),
            )?;
            let reference = downcast_reference::<T>(&instance, &self.required)?;
            if self.bean.scope().is_dependent()
                && let Some(tracker) = self.tracker.upgrade()
            {
                tracker
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push((identity_of(&reference), creational.clone()));
            }
            Ok::<_, Error>((reference, creational))
        })?;
        Ok(Arc::clone(instance))
    }

    /// Destroy the instance, if one was created
    ///
    /// Dependent instances are released; contextual instances are removed
    /// from their context.
    pub fn destroy(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let Some((reference, creational)) = self.instance.get() else {
            return Ok(());
        };
        if self.bean.scope().is_dependent() {
            self.untrack(creational);
            return creational.release();
        }
        let context = self.manager.context(self.bean.scope())?;
        if !context.is_active() {
            return Ok(());
        }
        match context.get_if_exists(&self.bean)? {
            Some(current) if current.identity() == identity_of(reference) => {
                context.destroy(&self.bean)
            }
            _ => Ok(()),
        }
    }
}

impl<T: ?Sized> Handle<T> {
    /// Release a dependent instance; contextual instances are left alone
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if !self.bean.scope().is_dependent() {
            return;
        }
        if let Some((_, creational)) = self.instance.get() {
            self.untrack(creational);
            if let Err(e) = creational.release() {
                warn!(bean = %self.bean, error = %e, "Failed to release dependent instance");
            }
        }
    }

    /// Whether the handle was destroyed or closed, or its dependent
    /// instance was destroyed through the view
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
            || (self.bean.scope().is_dependent()
                && self
                    .instance
                    .get()
                    .is_some_and(|(_, creational)| creational.is_released()))
    }

    fn untrack(&self, creational: &CreationalContext) {
        if let Some(tracker) = self.tracker.upgrade() {
            tracker
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(_, tracked)| !tracked.same_context(creational));
        }
    }
}

impl<T: ?Sized> Drop for Handle<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T: ?Sized> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("bean", &self.bean)
            .field("created", &self.instance.get().is_some())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
