//! Reified type identity
//!
//! Bean types and event types are matched on [`TypeKey`], a `TypeId` paired
//! with the type's name for diagnostics. Generics are reified, so
//! `Repository<User>` and `Repository<Order>` are distinct keys.

use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The universal type, observed by "any event" observers
pub type UniversalType = dyn Any + Send + Sync;

/// Identity of a Rust type used for bean and event matching
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key of `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Key of [`UniversalType`]
    pub fn universal() -> Self {
        Self::of::<UniversalType>()
    }

    /// Whether this is the universal type
    pub fn is_universal(&self) -> bool {
        self.id == TypeId::of::<UniversalType>()
    }

    /// Underlying `TypeId`
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of the type name, without generic arguments
    ///
    /// `my_app::orders::Repository<my_app::User>` becomes `Repository` and
    /// `dyn my_app::Processor` becomes `Processor`.
    pub fn simple_name(&self) -> &'static str {
        let name = self.name.strip_prefix("dyn ").unwrap_or(self.name);
        let base = name.split('<').next().unwrap_or(name);
        let base = base.split(" + ").next().unwrap_or(base);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for TypeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(other.name)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeKey").field(&self.name).finish()
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
