//! Unit tests for the container builder, facade and registry

#[cfg(test)]
mod tests {
    use cdi_application::ObserverMethod;
    use cdi_application::discovery::{OBSERVERS, ObserverEntry};
    use cdi_domain::{
        BeanDefinition, Error, QualifierSet, Result, Scope, Shutdown, Startup, TypeKey,
    };
    use cdi_infrastructure::{CdiContainer, ConfigBuilder, ContainerBuilder, ContainerRegistry};
    use cdi_providers::InMemoryBeanStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    trait Clock: Send + Sync {
        fn name(&self) -> &'static str;
    }

    struct SystemClock;
    struct FixedClock;

    impl Clock for SystemClock {
        fn name(&self) -> &'static str {
            "system"
        }
    }

    impl Clock for FixedClock {
        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct Ping;

    static PINGS: AtomicUsize = AtomicUsize::new(0);

    #[linkme::distributed_slice(OBSERVERS)]
    static PING_OBSERVER: ObserverEntry = ObserverEntry {
        name: "ping_counter",
        factory: ping_observer,
    };

    fn ping_observer() -> Result<ObserverMethod> {
        ObserverMethod::builder::<Ping>()
            .notify(|_, _| {
                PINGS.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build()
    }

    type Log = Arc<Mutex<Vec<String>>>;

    fn clocks() -> Vec<BeanDefinition> {
        vec![
            BeanDefinition::builder::<SystemClock>()
                .expose::<dyn Clock>(|c| c)
                .scope(Scope::ApplicationScoped)
                .produce(|_| Ok(SystemClock))
                .build()
                .expect("valid bean"),
            BeanDefinition::builder::<FixedClock>()
                .expose::<dyn Clock>(|c| c)
                .alternative()
                .priority(10)
                .produce(|_| Ok(FixedClock))
                .build()
                .expect("valid bean"),
        ]
    }

    fn builder(id: &str) -> ContainerBuilder {
        ContainerBuilder::new().id(id).discovery(false)
    }

    fn recording<E: Send + Sync + 'static>(log: &Log, label: &'static str) -> ObserverMethod {
        let log = Arc::clone(log);
        ObserverMethod::builder::<E>()
            .notify(move |_, _| {
                log.lock().expect("log").push(label.to_string());
                Ok(())
            })
            .build()
            .expect("valid observer")
    }

    // ========================================================================
    // Container facade
    // ========================================================================

    #[test]
    fn test_standalone_container_lookup() {
        let container = builder("standalone")
            .beans(clocks())
            .start()
            .expect("container starts");

        assert_eq!(container.id(), "standalone");
        let clock = container
            .reference::<dyn Clock>(&QualifierSet::new())
            .expect("resolved");
        assert_eq!(clock.name(), "system");

        let required = TypeKey::of::<dyn Clock>();
        assert_eq!(container.beans(&required, &QualifierSet::new()).len(), 1);
        let bean = container
            .resolve(&required, &QualifierSet::new())
            .expect("resolved");
        let creational = container.create_creational_context(Some(&bean));
        let instance = container
            .get_reference(&bean, &required, &creational)
            .expect("reference");
        assert!(instance.downcast::<dyn Clock>().is_some());
        let context = container
            .context(&Scope::ApplicationScoped)
            .expect("context");
        assert!(context.get_if_exists(&bean).expect("active").is_some());

        let selected = container
            .select::<dyn Clock>(&QualifierSet::new())
            .expect("selector");
        assert!(selected.is_resolvable());

        container.close().expect("closed");
    }

    #[test]
    fn test_configured_alternative_selected() {
        let config = ConfigBuilder::new()
            .with_alternative("**::FixedClock")
            .build()
            .expect("valid config");
        let container = builder("alternatives")
            .config(config)
            .beans(clocks())
            .start()
            .expect("container starts");

        let clock = container
            .instance::<dyn Clock>()
            .get()
            .expect("resolved");
        assert_eq!(clock.name(), "fixed");
        container.close().expect("closed");
    }

    #[test]
    fn test_inactive_request_context_from_config() {
        let config = ConfigBuilder::new()
            .with_request_active(false)
            .build()
            .expect("valid config");
        let container = builder("inactive-request")
            .config(config)
            .start()
            .expect("container starts");
        assert!(
            !container
                .context(&Scope::RequestScoped)
                .expect("context")
                .is_active()
        );
        container.close().expect("closed");
    }

    #[test]
    fn test_custom_store_rejects_builder_beans() {
        let result = builder("custom-store")
            .store(Arc::new(InMemoryBeanStore::new()))
            .beans(clocks())
            .start();
        assert!(matches!(result, Err(Error::Definition { .. })));
    }

    // ========================================================================
    // Lifecycle events
    // ========================================================================

    #[test]
    fn test_startup_and_shutdown_events() {
        let log: Log = Arc::default();
        let disposer_log = Arc::clone(&log);
        let container = builder("lifecycle")
            .bean(
                BeanDefinition::builder::<SystemClock>()
                    .scope(Scope::ApplicationScoped)
                    .produce(|_| Ok(SystemClock))
                    .dispose(move |_| {
                        disposer_log.lock().expect("log").push("dispose".to_string());
                        Ok(())
                    })
                    .build()
                    .expect("valid bean"),
            )
            .observer(recording::<Startup>(&log, "startup"))
            .observer(recording::<Shutdown>(&log, "shutdown"))
            .start()
            .expect("container starts");

        container
            .reference::<SystemClock>(&QualifierSet::new())
            .expect("reference");
        container.close().expect("closed");
        container.close().expect("idempotent");

        assert_eq!(
            *log.lock().expect("log"),
            vec!["startup", "shutdown", "dispose"]
        );
        assert!(!container.is_running());
        assert!(matches!(
            container.reference::<SystemClock>(&QualifierSet::new()),
            Err(Error::IllegalState { .. })
        ));
    }

    #[test]
    fn test_failing_startup_observer_aborts_start() {
        let registry = ContainerRegistry::new();
        let result = registry.start(
            builder("refused").observer(
                ObserverMethod::builder::<Startup>()
                    .notify(|_, _| Err(Error::application_msg("refused")))
                    .build()
                    .expect("valid observer"),
            ),
        );
        assert!(matches!(result, Err(Error::ObserverInvocation { .. })));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_discovered_observers_follow_discovery_flag() {
        let discovered = ContainerBuilder::new()
            .id("discovered")
            .start()
            .expect("container starts");
        discovered.fire(Ping).expect("fired");
        assert_eq!(PINGS.load(Ordering::SeqCst), 1);
        discovered.close().expect("closed");

        let undiscovered = builder("undiscovered").start().expect("container starts");
        undiscovered.fire(Ping).expect("fired");
        assert_eq!(PINGS.load(Ordering::SeqCst), 1);
        undiscovered.close().expect("closed");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fire_async_through_container() {
        let delivered = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&delivered);
        let container = builder("async")
            .observer(
                ObserverMethod::builder::<Ping>()
                    .asynchronous()
                    .notify(move |_, _| {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .build()
                    .expect("valid observer"),
            )
            .start()
            .expect("container starts");

        container.fire_async(Ping).await.expect("delivered");
        assert_eq!(delivered.load(Ordering::SeqCst), 1);

        let closing = container.clone();
        tokio::task::spawn_blocking(move || closing.close())
            .await
            .expect("joined")
            .expect("closed");
    }

    // ========================================================================
    // Registry
    // ========================================================================

    #[test]
    fn test_registry_current_requires_exactly_one() {
        let registry = ContainerRegistry::new();
        assert!(matches!(
            registry.current(),
            Err(Error::IllegalState { .. })
        ));

        let orders = registry.start(builder("orders")).expect("container starts");
        assert_eq!(registry.current().expect("current").id(), "orders");

        registry.start(builder("billing")).expect("container starts");
        assert!(matches!(
            registry.current(),
            Err(Error::IllegalState { .. })
        ));
        assert_eq!(registry.running(), vec!["billing", "orders"]);
        assert!(registry.get("orders").is_some_and(|c| c.is_running()));

        orders.close().expect("closed");
        assert!(registry.get("orders").is_none());
        assert_eq!(registry.current().expect("current").id(), "billing");

        registry.close_all().expect("closed");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registry_rejects_duplicate_id() {
        let registry = ContainerRegistry::new();
        let first = registry.start(builder("dup")).expect("container starts");
        let second = registry.start(builder("dup"));

        assert!(matches!(second, Err(Error::IllegalState { .. })));
        assert!(first.is_running());
        assert_eq!(registry.len(), 1);
        registry.close("dup").expect("closed");
    }

    #[test]
    fn test_registry_close_unknown_id() {
        let registry = ContainerRegistry::new();
        assert!(matches!(
            registry.close("missing"),
            Err(Error::IllegalArgument { .. })
        ));
    }

    #[test]
    fn test_registries_are_independent() {
        let left = ContainerRegistry::new();
        let right = ContainerRegistry::new();
        let container: CdiContainer = left.start(builder("shared-id")).expect("container starts");
        right
            .start(builder("shared-id"))
            .expect("same id in another registry");

        assert_eq!(left.len(), 1);
        assert_eq!(right.len(), 1);
        container.close().expect("closed");
        assert!(left.is_empty());
        assert_eq!(right.len(), 1);
        right.close_all().expect("closed");
    }
}
