//! Observer methods
//!
//! An [`ObserverMethod`] is a dispatch-table entry built once at startup:
//! the observed type and qualifiers, ordering and delivery flags, and a
//! closure bound to the strategy that supplies its arguments.
//!
//! ## Usage
//!
//! ```ignore
//! let audit = ObserverMethod::builder::<OrderPlaced>()
//!     .priority(PRIORITY_APPLICATION)
//!     .declared_on::<AuditLog>(|log, event, _| log.record(event))
//!     .build()?;
//!
//! let metrics = ObserverMethod::builder::<OrderPlaced>()
//!     .asynchronous()
//!     .notify(|event, invocation| {
//!         let counter = invocation.inject::<OrderCounter>(&QualifierSet::new())?;
//!         counter.increment(event.total);
//!         Ok(())
//!     })
//!     .build()?;
//! ```

use crate::bean_manager::{BeanManager, downcast_reference};
use crate::context::CreationalContext;
use crate::event::Delivery;
use crate::resolution::BeanResolver;
use cdi_domain::constants::DEFAULT_OBSERVER_PRIORITY;
use cdi_domain::error::{Error, Result};
use cdi_domain::{
    BeanDefinition, ContextualInstance, EventMetadata, Qualifier, QualifierSet, TypeKey,
    UniversalType,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Values handed to synthetic observers
pub type Parameters = serde_json::Map<String, Value>;

type EventFn = Arc<dyn Fn(&UniversalType, &ObserverInvocation<'_>) -> Result<()> + Send + Sync>;

type MethodFn = Arc<
    dyn Fn(&ContextualInstance, &UniversalType, &ObserverInvocation<'_>) -> Result<()>
        + Send
        + Sync,
>;

static NEXT_OBSERVER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an observer registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer#{}", self.0)
    }
}

/// When a method observer is notified
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reception {
    /// Always; the declaring bean is created when needed
    #[default]
    Always,
    /// Only when the declaring bean already has a contextual instance
    IfExists,
}

/// Transaction phase an observer is bound to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionPhase {
    /// Immediately
    #[default]
    InProgress,
    /// Before the transaction completes
    BeforeCompletion,
    /// After the transaction completes
    AfterCompletion,
    /// After the transaction fails
    AfterFailure,
    /// After the transaction succeeds
    AfterSuccess,
}

#[derive(Clone)]
enum Invocation {
    Method {
        declaring: TypeKey,
        bean: Option<Arc<BeanDefinition>>,
        call: MethodFn,
    },
    Synthetic {
        parameters: Parameters,
        call: EventFn,
    },
}

/// One registered observer
#[derive(Clone)]
pub struct ObserverMethod {
    id: ObserverId,
    description: String,
    observed: TypeKey,
    qualifiers: QualifierSet,
    priority: i32,
    asynchronous: bool,
    reception: Reception,
    phase: TransactionPhase,
    invocation: Invocation,
}

impl ObserverMethod {
    /// Start an observer of events of type `E`
    pub fn builder<E: Send + Sync + 'static>() -> ObserverMethodBuilder<E> {
        ObserverMethodBuilder::new()
    }

    /// Start an observer receiving every event
    pub fn universal() -> ObserverMethodBuilder<UniversalType> {
        ObserverMethodBuilder::new()
    }

    /// Registration id
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Human-readable description used in logs and errors
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Observed event type
    pub fn observed_type(&self) -> TypeKey {
        self.observed
    }

    /// Declared qualifiers
    pub fn qualifiers(&self) -> &QualifierSet {
        &self.qualifiers
    }

    /// Ordering priority (lower first)
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Whether the observer is notified by asynchronous firing only
    pub fn is_async(&self) -> bool {
        self.asynchronous
    }

    /// Reception mode
    pub fn reception(&self) -> Reception {
        self.reception
    }

    /// Transaction phase
    pub fn transaction_phase(&self) -> TransactionPhase {
        self.phase
    }

    /// Type declaring a method observer
    pub fn declaring_type(&self) -> Option<TypeKey> {
        match &self.invocation {
            Invocation::Method { declaring, .. } => Some(*declaring),
            Invocation::Synthetic { .. } => None,
        }
    }

    /// Bean declaring a method observer, once the registry is built
    pub fn declaring_bean(&self) -> Option<&Arc<BeanDefinition>> {
        match &self.invocation {
            Invocation::Method { bean, .. } => bean.as_ref(),
            Invocation::Synthetic { .. } => None,
        }
    }

    /// Parameters of a synthetic observer
    pub fn parameters(&self) -> Option<&Parameters> {
        match &self.invocation {
            Invocation::Synthetic { parameters, .. } => Some(parameters),
            Invocation::Method { .. } => None,
        }
    }

    /// Whether the observer was registered programmatically
    pub fn is_synthetic(&self) -> bool {
        matches!(self.invocation, Invocation::Synthetic { .. })
    }

    /// Whether the observer receives an event of `event_type` fired with
    /// `qualifiers`
    ///
    /// The observer's qualifiers must contain the event's; an observer
    /// without qualifiers observes `@Default` events and an `@Any` observer
    /// observes everything.
    pub fn matches(&self, event_type: &TypeKey, qualifiers: &QualifierSet) -> bool {
        (self.observed == *event_type || self.observed.is_universal())
            && self.qualifiers.contains(qualifiers)
    }

    /// Resolve the declaring bean of a method observer
    pub(crate) fn bind(&mut self, resolver: &BeanResolver) -> Result<()> {
        let Invocation::Method {
            declaring, bean, ..
        } = &mut self.invocation
        else {
            return Ok(());
        };
        let resolved = resolver
            .bean_for_class(declaring)
            .into_result(declaring, &QualifierSet::new())
            .map_err(|e| {
                Error::definition(format!(
                    "Observer {} has no declaring bean: {e}",
                    self.description
                ))
            })?;
        if self.reception == Reception::IfExists && resolved.scope().is_dependent() {
            return Err(Error::definition(format!(
                "Observer {} cannot use IfExists reception on a @Dependent bean",
                self.description
            )));
        }
        *bean = Some(resolved);
        Ok(())
    }

    /// Deliver one event
    ///
    /// Dependent instances created for the call are released afterwards.
    pub(crate) fn notify(&self, manager: &BeanManager, delivery: &Delivery) -> Result<()> {
        let creational = CreationalContext::new();
        let invocation = ObserverInvocation {
            manager,
            observer: self,
            delivery,
            creational: &creational,
        };
        let result = match &self.invocation {
            Invocation::Synthetic { call, .. } => call(delivery.payload(), &invocation),
            Invocation::Method { bean, call, .. } => {
                let bean = bean.as_ref().ok_or_else(|| {
                    Error::illegal_state(format!(
                        "Observer {} is not bound to its declaring bean",
                        self.description
                    ))
                })?;
                match self.receiver(manager, bean, &creational)? {
                    Some(receiver) => call(&receiver, delivery.payload(), &invocation),
                    None => {
                        debug!(observer = %self, "Declaring bean has no instance, skipped");
                        Ok(())
                    }
                }
            }
        };
        if let Err(e) = creational.release() {
            warn!(observer = %self, error = %e, "Failed to release observer dependents");
        }
        result
    }

    fn receiver(
        &self,
        manager: &BeanManager,
        bean: &Arc<BeanDefinition>,
        creational: &CreationalContext,
    ) -> Result<Option<ContextualInstance>> {
        match self.reception {
            Reception::IfExists => {
                let context = manager.context(bean.scope())?;
                if !context.is_active() {
                    return Ok(None);
                }
                context.get_if_exists(bean)
            }
            Reception::Always => manager
                .get_reference(bean, &bean.bean_class(), &creational.child(bean))
                .map(Some),
        }
    }
}

impl fmt::Debug for ObserverMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverMethod")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("observed", &self.observed)
            .field("qualifiers", &self.qualifiers)
            .field("priority", &self.priority)
            .field("async", &self.asynchronous)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ObserverMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// What an observer sees while it is notified
pub struct ObserverInvocation<'a> {
    manager: &'a BeanManager,
    observer: &'a ObserverMethod,
    delivery: &'a Delivery,
    creational: &'a CreationalContext,
}

impl ObserverInvocation<'_> {
    /// Metadata of the event, built on first access
    pub fn metadata(&self) -> &EventMetadata {
        self.delivery.metadata()
    }

    /// Observer being notified
    pub fn observer(&self) -> &ObserverMethod {
        self.observer
    }

    /// Parameters of a synthetic observer
    pub fn parameters(&self) -> Option<&Parameters> {
        self.observer.parameters()
    }

    /// One parameter of a synthetic observer
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters().and_then(|p| p.get(name))
    }

    /// Manager delivering the event
    pub fn manager(&self) -> &BeanManager {
        self.manager
    }

    /// Resolve an additional observer parameter
    ///
    /// Dependent instances are destroyed when the notification returns.
    pub fn inject<T>(&self, qualifiers: &QualifierSet) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let required = TypeKey::of::<T>();
        let bean = self.manager.resolve(&required, qualifiers)?;
        let instance =
            self.manager
                .get_reference(&bean, &required, &self.creational.child(&bean))?;
        downcast_reference(&instance, &required)
    }
}

/// Builder for [`ObserverMethod`]
pub struct ObserverMethodBuilder<E: ?Sized> {
    description: Option<String>,
    qualifiers: Vec<Qualifier>,
    priority: i32,
    asynchronous: bool,
    reception: Reception,
    phase: TransactionPhase,
    parameters: Parameters,
    invocation: Option<Invocation>,
    _marker: PhantomData<fn(&E)>,
}

impl<E: ?Sized + 'static> ObserverMethodBuilder<E> {
    fn new() -> Self {
        Self {
            description: None,
            qualifiers: Vec::new(),
            priority: DEFAULT_OBSERVER_PRIORITY,
            asynchronous: false,
            reception: Reception::Always,
            phase: TransactionPhase::InProgress,
            parameters: Parameters::new(),
            invocation: None,
            _marker: PhantomData,
        }
    }

    /// Description used in logs and errors
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add an observed qualifier
    #[must_use]
    pub fn qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    /// Add every qualifier of a set
    #[must_use]
    pub fn qualifiers(mut self, qualifiers: &QualifierSet) -> Self {
        self.qualifiers.extend(qualifiers.iter().cloned());
        self
    }

    /// Ordering priority (lower first)
    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Observe asynchronous firing instead of synchronous firing
    #[must_use]
    pub fn asynchronous(mut self) -> Self {
        self.asynchronous = true;
        self
    }

    /// Reception mode
    #[must_use]
    pub fn reception(mut self, reception: Reception) -> Self {
        self.reception = reception;
        self
    }

    /// Transaction phase
    #[must_use]
    pub fn transaction_phase(mut self, phase: TransactionPhase) -> Self {
        self.phase = phase;
        self
    }

    /// Parameter handed to a synthetic observer
    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    fn synthetic<F>(mut self, call: F) -> Self
    where
        F: Fn(&UniversalType, &ObserverInvocation<'_>) -> Result<()> + Send + Sync + 'static,
    {
        let call: EventFn = Arc::new(call);
        self.invocation = Some(Invocation::Synthetic {
            parameters: Parameters::new(),
            call,
        });
        self
    }

    fn method<B, F>(mut self, call: F) -> Self
    where
        B: Send + Sync + 'static,
        F: Fn(&ContextualInstance, &UniversalType, &ObserverInvocation<'_>) -> Result<()>
            + Send
            + Sync
            + 'static,
    {
        let call: MethodFn = Arc::new(call);
        self.invocation = Some(Invocation::Method {
            declaring: TypeKey::of::<B>(),
            bean: None,
            call,
        });
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<ObserverMethod> {
        let observed = TypeKey::of::<E>();
        let mut invocation = self.invocation.ok_or_else(|| {
            Error::definition(format!(
                "Observer of {} has no notification callback",
                observed.name()
            ))
        })?;
        let description = match (&self.description, &invocation) {
            (Some(description), _) => description.clone(),
            (None, Invocation::Method { declaring, .. }) => format!(
                "{}::observe({})",
                declaring.simple_name(),
                observed.simple_name()
            ),
            (None, Invocation::Synthetic { .. }) => {
                format!("synthetic observer of {}", observed.simple_name())
            }
        };
        match &mut invocation {
            Invocation::Synthetic { parameters, .. } => *parameters = self.parameters,
            Invocation::Method { .. } if !self.parameters.is_empty() => {
                return Err(Error::definition(format!(
                    "Observer {description} declares parameters but is not synthetic"
                )));
            }
            Invocation::Method { .. } => {}
        }
        if self.asynchronous && self.phase != TransactionPhase::InProgress {
            return Err(Error::definition(format!(
                "Asynchronous observer {description} cannot be transactional"
            )));
        }
        Ok(ObserverMethod {
            id: ObserverId(NEXT_OBSERVER_ID.fetch_add(1, Ordering::Relaxed)),
            description,
            observed,
            qualifiers: QualifierSet::of(self.qualifiers)?,
            priority: self.priority,
            asynchronous: self.asynchronous,
            reception: self.reception,
            phase: self.phase,
            invocation,
        })
    }
}

impl<E: Send + Sync + 'static> ObserverMethodBuilder<E> {
    /// Synthetic observer receiving the typed event
    #[must_use]
    pub fn notify<F>(self, callback: F) -> Self
    where
        F: Fn(&E, &ObserverInvocation<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.synthetic(move |event, invocation| callback(typed_event::<E>(event)?, invocation))
    }

    /// Method observer declared on bean class `B`
    #[must_use]
    pub fn declared_on<B, F>(self, callback: F) -> Self
    where
        B: Send + Sync + 'static,
        F: Fn(&B, &E, &ObserverInvocation<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.method::<B, _>(move |receiver, event, invocation| {
            let receiver = typed_receiver::<B>(receiver)?;
            callback(&receiver, typed_event::<E>(event)?, invocation)
        })
    }
}

impl ObserverMethodBuilder<UniversalType> {
    /// Synthetic observer receiving every event type-erased
    #[must_use]
    pub fn notify_any<F>(self, callback: F) -> Self
    where
        F: Fn(&UniversalType, &ObserverInvocation<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.synthetic(callback)
    }

    /// Method observer on bean class `B` receiving every event type-erased
    #[must_use]
    pub fn declared_on_any<B, F>(self, callback: F) -> Self
    where
        B: Send + Sync + 'static,
        F: Fn(&B, &UniversalType, &ObserverInvocation<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.method::<B, _>(move |receiver, event, invocation| {
            let receiver = typed_receiver::<B>(receiver)?;
            callback(&receiver, event, invocation)
        })
    }
}

fn typed_event<E: 'static>(event: &UniversalType) -> Result<&E> {
    event.downcast_ref::<E>().ok_or_else(|| {
        Error::illegal_state(format!(
            "Event delivered to an observer of {} has another type",
            std::any::type_name::<E>()
        ))
    })
}

fn typed_receiver<B: Send + Sync + 'static>(receiver: &ContextualInstance) -> Result<Arc<B>> {
    receiver.downcast::<B>().ok_or_else(|| {
        Error::illegal_state(format!(
            "Declaring bean instance is not a {}",
            std::any::type_name::<B>()
        ))
    })
}
