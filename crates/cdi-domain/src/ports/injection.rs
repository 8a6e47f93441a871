//! Injection Port
//!
//! Producers receive a `&dyn InjectionContext` and pull their dependencies
//! from it. Dependent-scoped references obtained this way are bound to the
//! lifecycle of the instance being produced.

use crate::entities::instance::ContextualInstance;
use crate::error::{Error, Result};
use crate::value_objects::injection_point::InjectionPoint;
use crate::value_objects::qualifier::QualifierSet;
use crate::value_objects::type_key::TypeKey;
use std::sync::Arc;

/// Services available to a producer while it creates an instance
pub trait InjectionContext: Send + Sync {
    /// Publish a partially constructed instance
    ///
    /// A dependency cycle that reaches back to this bean receives the pushed
    /// instance instead of failing.
    fn push(&self, instance: ContextualInstance);

    /// Obtain a contextual reference for an injection
    fn reference(&self, required: TypeKey, qualifiers: &QualifierSet)
    -> Result<ContextualInstance>;

    /// Obtain a contextual reference for a described injection point
    ///
    /// A dependent instance created this way sees `point` through
    /// [`injection_point`](Self::injection_point).
    fn reference_at(&self, point: Arc<InjectionPoint>) -> Result<ContextualInstance> {
        self.reference(point.required_type(), point.qualifiers())
    }

    /// Injection point being satisfied, when the instance is created for one
    fn injection_point(&self) -> Option<Arc<InjectionPoint>>;
}

impl dyn InjectionContext + '_ {
    /// Typed [`reference`](InjectionContext::reference)
    pub fn inject<T>(&self, qualifiers: &QualifierSet) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let required = TypeKey::of::<T>();
        self.reference(required, qualifiers)?
            .downcast::<T>()
            .ok_or_else(|| {
                Error::illegal_state(format!(
                    "Reference resolved for {} has an incompatible type",
                    required.name()
                ))
            })
    }

    /// Typed [`push`](InjectionContext::push)
    pub fn push_instance<T>(&self, instance: &Arc<T>)
    where
        T: Send + Sync + 'static,
    {
        self.push(ContextualInstance::new(Arc::clone(instance)));
    }
}
