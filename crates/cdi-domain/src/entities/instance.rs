//! Type-erased contextual instances

use crate::value_objects::type_key::TypeKey;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A live bean instance, erased to `Arc<dyn Any>` around an `Arc<T>`
///
/// `T` may be unsized, so one instance can be viewed both as its concrete
/// type and as a trait object it exposes. All views of one object share the
/// same [`identity`](Self::identity).
#[derive(Clone)]
pub struct ContextualInstance {
    value: Arc<dyn Any + Send + Sync>,
    type_key: TypeKey,
    identity: usize,
}

impl ContextualInstance {
    /// Wrap a typed instance
    pub fn new<T: ?Sized + Send + Sync + 'static>(instance: Arc<T>) -> Self {
        Self {
            identity: identity_of(&instance),
            type_key: TypeKey::of::<T>(),
            value: Arc::new(instance),
        }
    }

    /// Typed view, if this instance is viewed as `T`
    pub fn downcast<T: ?Sized + 'static>(&self) -> Option<Arc<T>> {
        self.value.downcast_ref::<Arc<T>>().cloned()
    }

    /// Type of the current view
    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    /// Address of the underlying object, shared by all views
    pub fn identity(&self) -> usize {
        self.identity
    }

    /// Whether both values refer to the same object
    pub fn same_instance(&self, other: &ContextualInstance) -> bool {
        self.identity == other.identity
    }
}

impl fmt::Debug for ContextualInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextualInstance")
            .field("type", &self.type_key)
            .field("identity", &format_args!("{:#x}", self.identity))
            .finish()
    }
}

/// Address of the object behind an `Arc`, ignoring pointer metadata
pub fn identity_of<T: ?Sized>(instance: &Arc<T>) -> usize {
    Arc::as_ptr(instance).cast::<()>() as usize
}
