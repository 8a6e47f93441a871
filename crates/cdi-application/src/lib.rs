//! Application Layer - CDI Runtime
//!
//! This crate implements the runtime core of a CDI container on top of the
//! domain vocabulary: resolution, scoped contexts, programmatic lookup and
//! event delivery.
//!
//! ## Architecture
//!
//! The application layer:
//! - Resolves bean requests against the [`BeanStore`](cdi_domain::ports::BeanStore) port
//! - Stores contextual instances per scope and tracks their dependents
//! - Exposes `Instance<T>` and `Event<T>` selector chains
//! - Dispatches events to priority-ordered observers, synchronously or on a
//!   tokio worker pool
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`resolution`] | Typesafe resolution and alternative selection |
//! | [`context`] | Scoped, dependent and creational contexts |
//! | [`instance`] | Programmatic lookup and lazy handles |
//! | [`observer`] | Observer methods and the observer registry |
//! | [`event`] | Event handles, dispatch and the async executor |
//! | [`bean_manager`] | The runtime core tying everything together |
//! | [`discovery`] | Link-time registration of beans and observers |
//!
//! ## Dependencies
//!
//! This crate depends only on:
//! - `cdi-domain`: For type keys, qualifiers, bean metadata and ports
//! - Pure Rust libraries for async, concurrency and pattern matching

pub mod bean_manager;
pub mod context;
pub mod discovery;
pub mod event;
pub mod injection;
pub mod instance;
pub mod observer;
pub mod resolution;

pub use bean_manager::{BeanManager, BeanManagerBuilder, BeanManagerOptions};
pub use context::{
    Context, Contextual, CreationalContext, DependentContext, ScopedContext, SharedContext,
};
pub use event::{AsyncExecutor, Event, FireAsync, NotificationOptions};
pub use injection::InjectionScope;
pub use instance::{Handle, Instance};
pub use observer::{
    ObserverInvocation, ObserverMethod, ObserverRegistry, Reception, TransactionPhase,
};
pub use resolution::{Alternatives, BeanResolver, Resolution};
