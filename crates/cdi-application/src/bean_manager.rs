//! Bean manager
//!
//! The runtime core of one container: resolution, the contexts of every
//! scope, the observer registry and the asynchronous executor. Cloning a
//! [`BeanManager`] shares the same container.

use crate::context::{
    Contextual, CreationalContext, DependentContext, DestroyTarget, ScopedContext, SharedContext,
};
use crate::event::{AsyncExecutor, Event};
use crate::injection::InjectionScope;
use crate::instance::Instance;
use crate::observer::{ObserverMethod, ObserverRegistry, ObserverRegistryBuilder};
use crate::resolution::{Alternatives, BeanResolver, Resolution};
use cdi_domain::error::{Error, Result};
use cdi_domain::ports::SharedBeanStore;
use cdi_domain::{
    BeanDefinition, BeanKind, ContextualInstance, InjectionPoint, QualifierSet, Scope, TypeKey,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Tunables of a bean manager
#[derive(Debug, Clone)]
pub struct BeanManagerOptions {
    /// Whether the request context starts active
    pub request_active: bool,
    /// Worker threads of the asynchronous executor (`None` = tokio default)
    pub async_worker_threads: Option<usize>,
    /// Whether observer lookups are memoized
    pub observer_index: bool,
}

impl Default for BeanManagerOptions {
    fn default() -> Self {
        Self {
            request_active: true,
            async_worker_threads: None,
            observer_index: true,
        }
    }
}

struct ManagerInner {
    id: String,
    store: SharedBeanStore,
    resolver: BeanResolver,
    contexts: Vec<SharedContext>,
    dependent: SharedContext,
    observers: ObserverRegistry,
    executor: AsyncExecutor,
    running: AtomicBool,
}

/// Runtime core of one container
#[derive(Clone)]
pub struct BeanManager {
    inner: Arc<ManagerInner>,
}

impl BeanManager {
    /// Start building a manager over `store`
    pub fn builder(store: SharedBeanStore) -> BeanManagerBuilder {
        BeanManagerBuilder::new(store)
    }

    /// Container id
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Bean store
    pub fn store(&self) -> &SharedBeanStore {
        &self.inner.store
    }

    /// Resolver
    pub fn resolver(&self) -> &BeanResolver {
        &self.inner.resolver
    }

    /// Observer registry
    pub fn observers(&self) -> &ObserverRegistry {
        &self.inner.observers
    }

    /// Asynchronous executor
    pub fn executor(&self) -> &AsyncExecutor {
        &self.inner.executor
    }

    /// Whether the manager accepts requests
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    pub(crate) fn ensure_running(&self) -> Result<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(Error::illegal_state(format!(
                "Container {} is not running",
                self.inner.id
            )))
        }
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Every enabled bean matching the request
    pub fn beans(
        &self,
        required: &TypeKey,
        qualifiers: &QualifierSet,
    ) -> Vec<Arc<BeanDefinition>> {
        self.inner.resolver.resolve_all(required, qualifiers)
    }

    /// Resolution outcome of a request
    pub fn resolution(&self, required: &TypeKey, qualifiers: &QualifierSet) -> Resolution {
        self.inner.resolver.resolve(required, qualifiers)
    }

    /// The single bean satisfying a request
    pub fn resolve(
        &self,
        required: &TypeKey,
        qualifiers: &QualifierSet,
    ) -> Result<Arc<BeanDefinition>> {
        self.inner.resolver.resolve_one(required, qualifiers)
    }

    // ========================================================================
    // Contexts
    // ========================================================================

    /// Context of a scope, active or not
    pub fn context(&self, scope: &Scope) -> Result<SharedContext> {
        if scope.is_dependent() {
            return Ok(Arc::clone(&self.inner.dependent));
        }
        self.inner
            .contexts
            .iter()
            .find(|context| context.scope() == scope)
            .cloned()
            .ok_or_else(|| Error::context_not_active(scope.name()))
    }

    /// Every storing context, in registration order
    pub fn contexts(&self) -> &[SharedContext] {
        &self.inner.contexts
    }

    /// New root creational context
    pub fn create_creational_context(&self, bean: Option<&BeanDefinition>) -> CreationalContext {
        bean.map_or_else(CreationalContext::new, CreationalContext::for_bean)
    }

    // ========================================================================
    // References
    // ========================================================================

    /// Contextual reference to `bean`, viewed as `required`
    ///
    /// `creational` is the context of the instance itself; make it a
    /// [`child`](CreationalContext::child) of the requester's context to bind
    /// a dependent instance to the requester.
    pub fn get_reference(
        &self,
        bean: &Arc<BeanDefinition>,
        required: &TypeKey,
        creational: &CreationalContext,
    ) -> Result<ContextualInstance> {
        self.get_reference_at(bean, required, creational, None)
    }

    /// [`get_reference`](Self::get_reference) on behalf of an injection point
    pub fn get_reference_at(
        &self,
        bean: &Arc<BeanDefinition>,
        required: &TypeKey,
        creational: &CreationalContext,
        injection_point: Option<Arc<InjectionPoint>>,
    ) -> Result<ContextualInstance> {
        self.ensure_running()?;
        if !bean.has_type(required) {
            return Err(Error::illegal_argument(format!(
                "{} is not a type of bean {}",
                required.name(),
                bean
            )));
        }
        let context = self.context(bean.scope())?;
        let contextual = BoundBean {
            manager: self,
            bean,
            injection_point,
        };
        let instance = context.get(&contextual, creational)?;
        bean.cast(&instance, required).ok_or_else(|| {
            Error::illegal_state(format!(
                "Instance of {} cannot be viewed as {}",
                bean.bean_class_name(),
                required.name()
            ))
        })
    }

    /// Typed reference to the single bean satisfying a request
    pub fn reference<T>(&self, qualifiers: &QualifierSet) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let required = TypeKey::of::<T>();
        let bean = self.resolve(&required, qualifiers)?;
        let instance = self.get_reference(&bean, &required, &CreationalContext::for_bean(&bean))?;
        downcast_reference(&instance, &required)
    }

    /// Destroy an instance that no context or creational context tracks
    pub(crate) fn destroy_detached(
        &self,
        bean: &BeanDefinition,
        instance: &ContextualInstance,
    ) -> Result<()> {
        match bean.kind() {
            BeanKind::Managed => self.inner.store.destroy(bean, instance),
            BeanKind::Synthetic => bean.dispose(instance),
        }
    }

    // ========================================================================
    // Selectors and events
    // ========================================================================

    /// Selector over beans of type `T`
    pub fn instance<T>(&self) -> Instance<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Instance::new(self.clone(), QualifierSet::new(), None)
    }

    /// Event handle for events of type `T`
    pub fn event<T>(&self) -> Event<T>
    where
        T: Send + Sync + 'static,
    {
        Event::new(self.clone(), QualifierSet::new(), None)
    }

    /// Fire an unqualified event synchronously
    pub fn fire<T>(&self, event: T) -> Result<()>
    where
        T: Send + Sync + 'static,
    {
        self.event::<T>().fire(event)
    }

    // ========================================================================
    // Shutdown
    // ========================================================================

    /// Destroy every context, shut the bean store and the executor down
    ///
    /// Runs once; later calls do nothing. Failures of individual instances
    /// are logged, a failing store shutdown is returned.
    pub fn shutdown(&self) -> Result<()> {
        if !self.inner.running.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        for context in self.inner.contexts.iter().rev() {
            context.destroy_all();
        }
        let result = self.inner.store.shutdown();
        if let Err(e) = &result {
            warn!(container = %self.inner.id, error = %e, "Bean store shutdown failed");
        }
        self.inner.executor.shutdown();
        info!(container = %self.inner.id, "Bean manager shut down");
        result
    }
}

impl std::fmt::Debug for BeanManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanManager")
            .field("id", &self.inner.id)
            .field("store", &self.inner.store.name())
            .field("observers", &self.inner.observers.len())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

pub(crate) fn downcast_reference<T>(
    instance: &ContextualInstance,
    required: &TypeKey,
) -> Result<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    instance.downcast::<T>().ok_or_else(|| {
        Error::illegal_state(format!(
            "Reference resolved for {} has an incompatible type",
            required.name()
        ))
    })
}

/// A bean bound to the manager that creates it
struct BoundBean<'a> {
    manager: &'a BeanManager,
    bean: &'a Arc<BeanDefinition>,
    injection_point: Option<Arc<InjectionPoint>>,
}

impl Contextual for BoundBean<'_> {
    fn bean(&self) -> &Arc<BeanDefinition> {
        self.bean
    }

    fn create(&self, creational: &CreationalContext) -> Result<ContextualInstance> {
        let scope = InjectionScope::new(
            self.manager.clone(),
            creational.clone(),
            self.injection_point.clone(),
        );
        let bean = self.bean;
        let mark = creational.dependent_count();
        let produced = match bean.kind() {
            BeanKind::Managed => self.manager.store().create(bean, &scope),
            BeanKind::Synthetic => bean.produce(&scope),
        };
        match produced {
            Ok(instance) => {
                let target = match bean.kind() {
                    BeanKind::Managed => DestroyTarget::Container {
                        store: Arc::clone(self.manager.store()),
                        bean: Arc::clone(bean),
                        instance: instance.clone(),
                    },
                    BeanKind::Synthetic => DestroyTarget::Contextual {
                        bean: Arc::clone(bean),
                        instance: instance.clone(),
                    },
                };
                creational.complete(target);
                debug!(bean = %bean, "Created contextual instance");
                Ok(instance)
            }
            Err(e) => {
                creational.rollback(mark);
                Err(Error::creation(bean.bean_class_name(), e))
            }
        }
    }
}

/// Builder for [`BeanManager`]
pub struct BeanManagerBuilder {
    id: Option<String>,
    store: SharedBeanStore,
    alternatives: Alternatives,
    contexts: Vec<SharedContext>,
    observers: ObserverRegistryBuilder,
    options: BeanManagerOptions,
}

impl BeanManagerBuilder {
    fn new(store: SharedBeanStore) -> Self {
        Self {
            id: None,
            store,
            alternatives: Alternatives::none(),
            contexts: Vec::new(),
            observers: ObserverRegistryBuilder::new(),
            options: BeanManagerOptions::default(),
        }
    }

    /// Container id (random when unset)
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Alternative selection
    #[must_use]
    pub fn alternatives(mut self, alternatives: Alternatives) -> Self {
        self.alternatives = alternatives;
        self
    }

    /// Register a context for a custom scope
    #[must_use]
    pub fn context(mut self, context: SharedContext) -> Self {
        self.contexts.push(context);
        self
    }

    /// Register an observer
    #[must_use]
    pub fn observer(mut self, observer: ObserverMethod) -> Self {
        self.observers.add(observer);
        self
    }

    /// Register several observers
    #[must_use]
    pub fn observers(mut self, observers: impl IntoIterator<Item = ObserverMethod>) -> Self {
        self.observers.extend(observers);
        self
    }

    /// Tunables
    #[must_use]
    pub fn options(mut self, options: BeanManagerOptions) -> Self {
        self.options = options;
        self
    }

    /// Validate the deployment and start the manager
    pub fn build(self) -> Result<BeanManager> {
        let id = self
            .id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let request: SharedContext = if self.options.request_active {
            Arc::new(ScopedContext::new(Scope::RequestScoped))
        } else {
            Arc::new(ScopedContext::inactive(Scope::RequestScoped))
        };
        let mut contexts: Vec<SharedContext> = vec![
            Arc::new(ScopedContext::new(Scope::Singleton)),
            Arc::new(ScopedContext::new(Scope::ApplicationScoped)),
            request,
        ];
        for context in self.contexts {
            if context.scope().is_dependent()
                || contexts.iter().any(|c| c.scope() == context.scope())
            {
                return Err(Error::definition(format!(
                    "A context for {} is already registered",
                    context.scope()
                )));
            }
            contexts.push(context);
        }

        for bean in self.store.definitions() {
            let scope = bean.scope();
            if !scope.is_dependent() && !contexts.iter().any(|c| c.scope() == scope) {
                return Err(Error::definition(format!(
                    "No context registered for {scope} required by bean {bean}"
                )));
            }
        }

        let resolver = BeanResolver::new(Arc::clone(&self.store), self.alternatives);
        let observers = self.observers.build(&resolver, self.options.observer_index)?;
        let executor = AsyncExecutor::new(self.options.async_worker_threads);

        info!(
            container = %id,
            store = self.store.name(),
            beans = self.store.definitions().len(),
            observers = observers.len(),
            contexts = contexts.len(),
            "Bean manager started"
        );

        Ok(BeanManager {
            inner: Arc::new(ManagerInner {
                id,
                store: self.store,
                resolver,
                contexts,
                dependent: Arc::new(DependentContext::new()),
                observers,
                executor,
                running: AtomicBool::new(true),
            }),
        })
    }
}
