//! Bean definitions
//!
//! A [`BeanDefinition`] carries everything resolution and the contexts need:
//! the type closure (with casters for trait-object views), qualifiers,
//! scope, alternative status and the create/destroy callbacks.
//!
//! ## Usage
//!
//! ```
//! use cdi_domain::{BeanDefinition, Qualifier, Scope};
//! use std::sync::Arc;
//!
//! trait PaymentProcessor: Send + Sync {
//!     fn process(&self, amount: u64) -> bool;
//! }
//!
//! struct CardProcessor;
//!
//! impl PaymentProcessor for CardProcessor {
//!     fn process(&self, _amount: u64) -> bool {
//!         true
//!     }
//! }
//!
//! let bean = BeanDefinition::builder::<CardProcessor>()
//!     .expose::<dyn PaymentProcessor>(|p| p)
//!     .qualifier(Qualifier::new("Synchronous"))
//!     .scope(Scope::ApplicationScoped)
//!     .produce(|_| Ok(CardProcessor))
//!     .build()
//!     .expect("valid bean");
//!
//! assert!(bean.has_type(&cdi_domain::TypeKey::of::<dyn PaymentProcessor>()));
//! ```

use crate::entities::instance::ContextualInstance;
use crate::error::{Error, Result};
use crate::ports::injection::InjectionContext;
use crate::value_objects::qualifier::{Qualifier, QualifierSet};
use crate::value_objects::scope::Scope;
use crate::value_objects::type_key::{TypeKey, UniversalType};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Creates an instance, wiring its injections through the context
pub type Producer =
    Arc<dyn Fn(&dyn InjectionContext) -> Result<ContextualInstance> + Send + Sync>;

/// Runs pre-destroy callbacks and disposer methods for an instance
pub type Disposer = Arc<dyn Fn(&ContextualInstance) -> Result<()> + Send + Sync>;

/// Converts the canonical instance into a view of another type
type Caster = Arc<dyn Fn(&ContextualInstance) -> Option<ContextualInstance> + Send + Sync>;

static NEXT_BEAN_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identity of a bean definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BeanId(u64);

impl BeanId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        Self(NEXT_BEAN_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BeanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bean#{}", self.0)
    }
}

/// Who owns a bean's lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeanKind {
    /// Defined by the host bean store; created and destroyed through it
    Managed,
    /// Registered programmatically; uses its own create/destroy callbacks
    Synthetic,
}

/// One entry of a bean's type closure
#[derive(Clone)]
pub struct BeanType {
    key: TypeKey,
    caster: Option<Caster>,
}

impl BeanType {
    /// Type key of this entry
    pub fn key(&self) -> TypeKey {
        self.key
    }
}

impl fmt::Debug for BeanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key.name())
    }
}

/// Metadata and lifecycle callbacks of one bean
pub struct BeanDefinition {
    id: BeanId,
    bean_class: TypeKey,
    types: Vec<BeanType>,
    declared_qualifiers: QualifierSet,
    qualifiers: QualifierSet,
    scope: Scope,
    name: Option<String>,
    alternative: bool,
    priority: Option<i32>,
    kind: BeanKind,
    proxy_target: Option<BeanId>,
    producer: Option<Producer>,
    disposer: Option<Disposer>,
}

impl BeanDefinition {
    /// Start a definition for a bean whose concrete class is `T`
    pub fn builder<T: Send + Sync + 'static>() -> BeanDefinitionBuilder<T> {
        BeanDefinitionBuilder::new()
    }

    /// Unique id
    pub fn id(&self) -> BeanId {
        self.id
    }

    /// Identity used at every storage boundary
    ///
    /// A proxy bean stores and looks up instances under its target's id.
    pub fn canonical_id(&self) -> BeanId {
        self.proxy_target.unwrap_or(self.id)
    }

    /// Concrete class
    pub fn bean_class(&self) -> TypeKey {
        self.bean_class
    }

    /// Fully qualified name of the concrete class
    pub fn bean_class_name(&self) -> &'static str {
        self.bean_class.name()
    }

    /// Exposed types, concrete class first
    pub fn types(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.types.iter().map(BeanType::key)
    }

    /// Whether `required` is part of the type closure
    pub fn has_type(&self, required: &TypeKey) -> bool {
        self.types.iter().any(|t| t.key == *required)
    }

    /// View a canonical instance of this bean as `required`
    pub fn cast(
        &self,
        instance: &ContextualInstance,
        required: &TypeKey,
    ) -> Option<ContextualInstance> {
        let entry = self.types.iter().find(|t| t.key == *required)?;
        match &entry.caster {
            None => Some(instance.clone()),
            Some(caster) => caster(instance),
        }
    }

    /// Qualifiers as declared
    pub fn declared_qualifiers(&self) -> &QualifierSet {
        &self.declared_qualifiers
    }

    /// Qualifiers including the implicit `@Default`
    pub fn qualifiers(&self) -> &QualifierSet {
        &self.qualifiers
    }

    /// Whether the declared qualifiers make this a default candidate
    /// (empty, `@Default`, or only `@Named`)
    pub fn is_default_candidate(&self) -> bool {
        self.declared_qualifiers
            .iter()
            .all(|q| q.is_default() || q.is_named() || q.is_any())
    }

    /// Scope
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Bean name (`@Named`)
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether this is an alternative
    pub fn is_alternative(&self) -> bool {
        self.alternative
    }

    /// Priority, if declared
    pub fn priority(&self) -> Option<i32> {
        self.priority
    }

    /// Lifecycle owner
    pub fn kind(&self) -> BeanKind {
        self.kind
    }

    /// Run the producer
    pub fn produce(&self, ctx: &dyn InjectionContext) -> Result<ContextualInstance> {
        match &self.producer {
            Some(producer) => producer(ctx),
            None => Err(Error::definition(format!(
                "Bean {} has no producer",
                self.bean_class_name()
            ))),
        }
    }

    /// Run the disposer, if any
    pub fn dispose(&self, instance: &ContextualInstance) -> Result<()> {
        match &self.disposer {
            Some(disposer) => disposer(instance),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDefinition")
            .field("id", &self.id)
            .field("class", &self.bean_class.name())
            .field("types", &self.types)
            .field("qualifiers", &self.qualifiers)
            .field("scope", &self.scope)
            .field("alternative", &self.alternative)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.scope,
            self.bean_class.simple_name(),
            self.qualifiers
        )
    }
}

/// Builder for [`BeanDefinition`]
pub struct BeanDefinitionBuilder<T> {
    types: Vec<BeanType>,
    qualifiers: Vec<Qualifier>,
    scope: Scope,
    name: Option<String>,
    alternative: bool,
    priority: Option<i32>,
    kind: BeanKind,
    proxy_target: Option<BeanId>,
    producer: Option<Producer>,
    disposer: Option<Disposer>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> BeanDefinitionBuilder<T> {
    fn new() -> Self {
        let universal: Caster = Arc::new(|instance: &ContextualInstance| {
            instance
                .downcast::<T>()
                .map(|concrete| ContextualInstance::new(concrete as Arc<UniversalType>))
        });
        Self {
            types: vec![
                BeanType {
                    key: TypeKey::of::<T>(),
                    caster: None,
                },
                BeanType {
                    key: TypeKey::universal(),
                    caster: Some(universal),
                },
            ],
            qualifiers: Vec::new(),
            scope: Scope::Dependent,
            name: None,
            alternative: false,
            priority: None,
            kind: BeanKind::Managed,
            proxy_target: None,
            producer: None,
            disposer: None,
            _marker: PhantomData,
        }
    }

    /// Expose the bean under another type, usually a trait object
    pub fn expose<U>(mut self, cast: impl Fn(Arc<T>) -> Arc<U> + Send + Sync + 'static) -> Self
    where
        U: ?Sized + Send + Sync + 'static,
    {
        let caster: Caster = Arc::new(move |instance: &ContextualInstance| {
            instance
                .downcast::<T>()
                .map(|concrete| ContextualInstance::new(cast(concrete)))
        });
        let key = TypeKey::of::<U>();
        self.types.retain(|t| t.key != key);
        self.types.push(BeanType {
            key,
            caster: Some(caster),
        });
        self
    }

    /// Add a qualifier
    pub fn qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    /// Add every qualifier of a set
    pub fn qualifiers(mut self, qualifiers: &QualifierSet) -> Self {
        self.qualifiers.extend(qualifiers.iter().cloned());
        self
    }

    /// Set the scope
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Give the bean a name (adds `@Named`)
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name the bean after its class in lower camel case
    pub fn default_named(self) -> Self {
        let simple = TypeKey::of::<T>().simple_name();
        let mut chars = simple.chars();
        let name = match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect::<String>(),
            None => String::new(),
        };
        self.named(name)
    }

    /// Mark as an alternative
    pub fn alternative(mut self) -> Self {
        self.alternative = true;
        self
    }

    /// Set the priority
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Mark as a synthetic bean owning its lifecycle
    pub fn synthetic(mut self) -> Self {
        self.kind = BeanKind::Synthetic;
        self
    }

    /// Store instances under another bean's identity
    pub fn proxy_for(mut self, target: BeanId) -> Self {
        self.proxy_target = Some(target);
        self
    }

    /// Construct instances by value
    pub fn produce(
        self,
        producer: impl Fn(&dyn InjectionContext) -> Result<T> + Send + Sync + 'static,
    ) -> Self {
        self.produce_arc(move |ctx| producer(ctx).map(Arc::new))
    }

    /// Construct instances already wrapped in an `Arc`
    ///
    /// Producers that need to break a dependency cycle allocate the `Arc`
    /// first, [`push`](InjectionContext::push) it, then finish wiring.
    pub fn produce_arc(
        mut self,
        producer: impl Fn(&dyn InjectionContext) -> Result<Arc<T>> + Send + Sync + 'static,
    ) -> Self {
        self.producer = Some(Arc::new(move |ctx: &dyn InjectionContext| {
            producer(ctx).map(ContextualInstance::new)
        }));
        self
    }

    /// Callback run when an instance is destroyed
    pub fn dispose(
        mut self,
        disposer: impl Fn(Arc<T>) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.disposer = Some(Arc::new(move |instance: &ContextualInstance| {
            match instance.downcast::<T>() {
                Some(concrete) => disposer(concrete),
                None => Err(Error::illegal_argument(format!(
                    "Cannot dispose {:?} as {}",
                    instance,
                    std::any::type_name::<T>()
                ))),
            }
        }));
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<BeanDefinition> {
        let mut qualifiers = self.qualifiers;
        if let Some(name) = &self.name
            && !qualifiers.iter().any(Qualifier::is_named)
        {
            qualifiers.push(Qualifier::named(name.clone()));
        }
        // every bean implicitly carries @Any; unconstrained requests match it
        qualifiers.retain(|q| !q.is_any());
        let declared = QualifierSet::of(qualifiers)?;
        Ok(BeanDefinition {
            id: BeanId::next(),
            bean_class: TypeKey::of::<T>(),
            types: self.types,
            qualifiers: QualifierSet::for_bean(&declared),
            declared_qualifiers: declared,
            scope: self.scope,
            name: self.name,
            alternative: self.alternative,
            priority: self.priority,
            kind: self.kind,
            proxy_target: self.proxy_target,
            producer: self.producer,
            disposer: self.disposer,
        })
    }
}
