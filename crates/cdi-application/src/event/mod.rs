//! Events
//!
//! [`Event`] fires events of one type, with the qualifiers accumulated by
//! [`select`](Event::select). Synchronous observers run on the caller's
//! thread in priority order; asynchronous observers run on the manager's
//! [`AsyncExecutor`] and are aggregated by the returned [`FireAsync`].
//!
//! ## Usage
//!
//! ```ignore
//! let logins = manager.event::<LoggedIn>();
//! logins.fire(LoggedIn { user: "ada".into() })?;
//!
//! let mobile = logins.select(&QualifierSet::single(Qualifier::new("Mobile")))?;
//! let event = mobile.fire_async(LoggedIn { user: "ada".into() }).await?;
//! ```

pub mod dispatcher;
pub mod executor;

pub use executor::AsyncExecutor;

use crate::bean_manager::BeanManager;
use cdi_domain::error::{Error, Result};
use cdi_domain::{EventMetadata, InjectionPoint, QualifierSet, TypeKey, UniversalType};
use once_cell::sync::OnceCell;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Per-call options of an asynchronous firing
#[derive(Debug, Clone, Default)]
pub struct NotificationOptions {
    executor: Option<Handle>,
}

impl NotificationOptions {
    /// Options using the manager's executor
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the observers on another runtime
    #[must_use]
    pub fn executor(mut self, handle: Handle) -> Self {
        self.executor = Some(handle);
        self
    }

    /// Runtime overriding the manager's executor
    pub fn executor_handle(&self) -> Option<&Handle> {
        self.executor.as_ref()
    }
}

/// Handle firing events of type `T`
pub struct Event<T> {
    manager: BeanManager,
    qualifiers: QualifierSet,
    injection_point: Option<Arc<InjectionPoint>>,
    _marker: PhantomData<fn(T)>,
}

impl<T> Event<T>
where
    T: Send + Sync + 'static,
{
    pub(crate) fn new(
        manager: BeanManager,
        qualifiers: QualifierSet,
        injection_point: Option<Arc<InjectionPoint>>,
    ) -> Self {
        Self {
            manager,
            qualifiers,
            injection_point,
            _marker: PhantomData,
        }
    }

    /// Attach the injection point reported in event metadata
    #[must_use]
    pub fn at(mut self, injection_point: InjectionPoint) -> Self {
        self.injection_point = Some(Arc::new(injection_point));
        self
    }

    /// Accumulated qualifiers
    pub fn qualifiers(&self) -> &QualifierSet {
        &self.qualifiers
    }

    /// Child handle with additional qualifiers
    pub fn select(&self, qualifiers: &QualifierSet) -> Result<Event<T>> {
        self.select_type::<T>(qualifiers)
    }

    /// Child handle firing another event type
    pub fn select_type<U>(&self, qualifiers: &QualifierSet) -> Result<Event<U>>
    where
        U: Send + Sync + 'static,
    {
        Ok(Event::new(
            self.manager.clone(),
            self.qualifiers.narrow(qualifiers)?,
            self.injection_point.clone(),
        ))
    }

    /// Notify the synchronous observers, in priority order
    ///
    /// The first failing observer stops delivery.
    pub fn fire(&self, event: T) -> Result<()> {
        let delivery = self.delivery(Arc::new(event));
        dispatcher::fire_sync(&self.manager, &delivery)
    }

    /// Notify the asynchronous observers on the manager's executor
    pub fn fire_async(&self, event: T) -> FireAsync<T> {
        self.fire_async_with(event, NotificationOptions::default())
    }

    /// Notify the asynchronous observers with per-call options
    pub fn fire_async_with(&self, event: T, options: NotificationOptions) -> FireAsync<T> {
        let event = Arc::new(event);
        let delivery = self.delivery(Arc::clone(&event));
        let state = match dispatcher::fire_async(&self.manager, delivery, options.executor) {
            Ok(Some(task)) => FireState::Pending(task),
            Ok(None) => FireState::Done(Some(Ok(()))),
            Err(e) => FireState::Done(Some(Err(e))),
        };
        FireAsync {
            state,
            event: Some(event),
        }
    }

    fn delivery(&self, event: Arc<T>) -> Delivery {
        Delivery::new(
            event,
            TypeKey::of::<T>(),
            self.qualifiers.clone(),
            self.injection_point.clone(),
        )
    }
}

impl<T> fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("type", &std::any::type_name::<T>())
            .field("qualifiers", &self.qualifiers)
            .finish_non_exhaustive()
    }
}

/// One event on its way to observers
pub struct Delivery {
    payload: Arc<UniversalType>,
    event_type: TypeKey,
    qualifiers: QualifierSet,
    injection_point: Option<Arc<InjectionPoint>>,
    metadata: OnceCell<EventMetadata>,
}

impl Delivery {
    pub(crate) fn new(
        payload: Arc<UniversalType>,
        event_type: TypeKey,
        qualifiers: QualifierSet,
        injection_point: Option<Arc<InjectionPoint>>,
    ) -> Self {
        Self {
            payload,
            event_type,
            qualifiers,
            injection_point,
            metadata: OnceCell::new(),
        }
    }

    /// The event, type-erased
    pub fn payload(&self) -> &UniversalType {
        self.payload.as_ref()
    }

    /// Type of the event
    pub fn event_type(&self) -> TypeKey {
        self.event_type
    }

    /// Qualifiers the event was fired with
    pub fn qualifiers(&self) -> &QualifierSet {
        &self.qualifiers
    }

    /// Event metadata, built on first access
    pub fn metadata(&self) -> &EventMetadata {
        self.metadata.get_or_init(|| {
            EventMetadata::new(
                self.event_type,
                &self.qualifiers,
                self.injection_point.clone(),
            )
        })
    }
}

enum FireState {
    Done(Option<Result<()>>),
    Pending(JoinHandle<Result<()>>),
}

/// Completion of an asynchronous firing
///
/// Resolves to the event once every asynchronous observer returned, or to
/// [`Error::AsyncObserverFailures`] carrying every observer failure.
#[must_use = "observer failures are only reported through the returned future"]
pub struct FireAsync<T> {
    state: FireState,
    event: Option<Arc<T>>,
}

impl<T> FireAsync<T> {
    /// Block the current thread until every observer returned
    ///
    /// For callers outside an async runtime; inside one, `.await` instead.
    pub fn wait(self) -> Result<Arc<T>> {
        futures::executor::block_on(self)
    }

    /// Whether the observers are known to have completed
    pub fn is_finished(&self) -> bool {
        match &self.state {
            FireState::Done(_) => true,
            FireState::Pending(task) => task.is_finished(),
        }
    }
}

impl<T> Future for FireAsync<T> {
    type Output = Result<Arc<T>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let outcome = match &mut this.state {
            FireState::Done(result) => result.take(),
            FireState::Pending(task) => match Pin::new(task).poll(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Ok(result)) => Some(result),
                Poll::Ready(Err(join)) => Some(Err(Error::application(join))),
            },
        };
        this.state = FireState::Done(None);
        let outcome = outcome
            .ok_or_else(|| Error::illegal_state("Asynchronous firing polled after completion"))
            .and_then(|result| result);
        Poll::Ready(outcome.and_then(|()| {
            this.event
                .take()
                .ok_or_else(|| Error::illegal_state("Asynchronous firing polled after completion"))
        }))
    }
}

impl<T> fmt::Debug for FireAsync<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FireAsync")
            .field("finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}
