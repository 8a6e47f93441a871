//! Unit tests for observers and event delivery

#[cfg(test)]
mod tests {
    use cdi_application::observer::TransactionPhase;
    use cdi_application::{
        BeanManager, NotificationOptions, ObserverInvocation, ObserverMethod, Reception,
    };
    use cdi_domain::{BeanDefinition, Error, Qualifier, QualifierSet, Result, Scope, TypeKey};
    use cdi_providers::InMemoryBeanStore;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Debug)]
    struct LoggedIn {
        user: String,
    }

    struct Deployed;

    fn logged_in(user: &str) -> LoggedIn {
        LoggedIn {
            user: user.to_string(),
        }
    }

    fn mobile() -> QualifierSet {
        QualifierSet::single(Qualifier::new("Mobile"))
    }

    fn android() -> QualifierSet {
        QualifierSet::single(Qualifier::new("Android"))
    }

    type Log = Arc<Mutex<Vec<String>>>;

    fn recorder(
        log: &Log,
        label: &'static str,
    ) -> impl Fn(&LoggedIn, &ObserverInvocation<'_>) -> Result<()> + Send + Sync + 'static {
        let log = Arc::clone(log);
        move |_, _| {
            log.lock().expect("log").push(label.to_string());
            Ok(())
        }
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().expect("log").clone()
    }

    fn manager(store: InMemoryBeanStore, observers: Vec<ObserverMethod>) -> BeanManager {
        BeanManager::builder(Arc::new(store))
            .observers(observers)
            .build()
            .expect("manager starts")
    }

    // ========================================================================
    // Synchronous delivery
    // ========================================================================

    #[test]
    fn test_observers_notified_in_priority_order() {
        let log: Log = Arc::default();
        let observers = [10, 5, 20]
            .into_iter()
            .map(|priority| {
                let log = Arc::clone(&log);
                ObserverMethod::builder::<LoggedIn>()
                    .priority(priority)
                    .notify(move |_, _| {
                        log.lock().expect("log").push(priority.to_string());
                        Ok(())
                    })
                    .build()
                    .expect("valid observer")
            })
            .collect();
        let manager = manager(InMemoryBeanStore::new(), observers);

        manager.fire(logged_in("ada")).expect("delivered");
        assert_eq!(entries(&log), vec!["5", "10", "20"]);
    }

    #[test]
    fn test_equal_priorities_keep_registration_order() {
        let log: Log = Arc::default();
        let observers = ["first", "second", "third"]
            .into_iter()
            .map(|label| {
                ObserverMethod::builder::<LoggedIn>()
                    .notify(recorder(&log, label))
                    .build()
                    .expect("valid observer")
            })
            .collect();
        let manager = manager(InMemoryBeanStore::new(), observers);

        manager.fire(logged_in("ada")).expect("delivered");
        assert_eq!(entries(&log), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_narrowed_event_reaches_only_matching_observers() {
        let log: Log = Arc::default();
        let observers = vec![
            ObserverMethod::builder::<LoggedIn>()
                .qualifiers(&mobile())
                .notify(recorder(&log, "mobile"))
                .build()
                .expect("valid observer"),
            ObserverMethod::builder::<LoggedIn>()
                .qualifiers(&mobile())
                .qualifiers(&android())
                .notify(recorder(&log, "mobile+android"))
                .build()
                .expect("valid observer"),
            ObserverMethod::builder::<LoggedIn>()
                .notify(recorder(&log, "default"))
                .build()
                .expect("valid observer"),
            ObserverMethod::builder::<LoggedIn>()
                .qualifier(Qualifier::any())
                .notify(recorder(&log, "any"))
                .build()
                .expect("valid observer"),
        ];
        let manager = manager(InMemoryBeanStore::new(), observers);

        let event = manager
            .event::<LoggedIn>()
            .select(&mobile())
            .and_then(|e| e.select(&android()))
            .expect("selected");
        event.fire(logged_in("ada")).expect("delivered");
        assert_eq!(entries(&log), vec!["mobile+android", "any"]);

        log.lock().expect("log").clear();
        manager.fire(logged_in("ada")).expect("delivered");
        assert_eq!(entries(&log), vec!["default", "any"]);
    }

    #[test]
    fn test_first_failure_stops_delivery() {
        let reached = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&reached);
        let observers = vec![
            ObserverMethod::builder::<LoggedIn>()
                .description("Failing::on_login")
                .priority(1)
                .notify(|_, _| Err(Error::application_msg("rejected")))
                .build()
                .expect("valid observer"),
            ObserverMethod::builder::<LoggedIn>()
                .priority(2)
                .notify(move |_, _| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .build()
                .expect("valid observer"),
        ];
        let manager = manager(InMemoryBeanStore::new(), observers);

        let err = manager.fire(logged_in("ada")).expect_err("observer fails");
        match &err {
            Error::ObserverInvocation { observer, source } => {
                assert_eq!(observer, "Failing::on_login");
                assert_eq!(source.to_string(), "rejected");
            }
            other => panic!("expected observer failure, got {other:?}"),
        }
        assert_eq!(reached.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_universal_observer_sees_every_type() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observer = ObserverMethod::universal()
            .qualifier(Qualifier::any())
            .notify_any(move |event, invocation| {
                let name = invocation.metadata().event_type().simple_name();
                assert_eq!(event.is::<LoggedIn>(), name == "LoggedIn");
                sink.lock().expect("log").push(name);
                Ok(())
            })
            .build()
            .expect("valid observer");
        let manager = manager(InMemoryBeanStore::new(), vec![observer]);

        manager.fire(logged_in("ada")).expect("delivered");
        manager
            .event::<Deployed>()
            .select(&mobile())
            .and_then(|e| e.fire(Deployed))
            .expect("delivered");
        assert_eq!(*seen.lock().expect("log"), vec!["LoggedIn", "Deployed"]);
    }

    #[test]
    fn test_metadata_reports_qualifiers_and_type() {
        let captured = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&captured);
        let observer = ObserverMethod::builder::<LoggedIn>()
            .qualifier(Qualifier::any())
            .notify(move |event, invocation| {
                let metadata = invocation.metadata();
                assert_eq!(event.user, "ada");
                *sink.lock().expect("slot") =
                    Some((metadata.event_type(), metadata.qualifiers().clone()));
                Ok(())
            })
            .build()
            .expect("valid observer");
        let manager = manager(InMemoryBeanStore::new(), vec![observer]);

        manager
            .event::<LoggedIn>()
            .select(&mobile())
            .and_then(|e| e.fire(logged_in("ada")))
            .expect("delivered");

        let (event_type, qualifiers) = captured.lock().expect("slot").clone().expect("notified");
        assert_eq!(event_type, TypeKey::of::<LoggedIn>());
        assert!(qualifiers.contains_qualifier(&Qualifier::new("Mobile")));
        assert!(qualifiers.has_any());
    }

    #[test]
    fn test_synthetic_observer_parameters() {
        let threshold = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&threshold);
        let observer = ObserverMethod::builder::<LoggedIn>()
            .parameter("threshold", 3)
            .notify(move |_, invocation| {
                *sink.lock().expect("slot") = invocation.parameter("threshold").cloned();
                Ok(())
            })
            .build()
            .expect("valid observer");
        let manager = manager(InMemoryBeanStore::new(), vec![observer]);

        manager.fire(logged_in("ada")).expect("delivered");
        assert_eq!(*threshold.lock().expect("slot"), Some(Value::from(3)));
    }

    // ========================================================================
    // Method observers
    // ========================================================================

    #[derive(Default)]
    struct AuditLog {
        entries: Mutex<Vec<String>>,
    }

    impl AuditLog {
        fn on_login(&self, event: &LoggedIn) -> Result<()> {
            self.entries.lock().expect("entries").push(event.user.clone());
            Ok(())
        }
    }

    fn audit_store(created: &Arc<AtomicUsize>) -> InMemoryBeanStore {
        let counter = Arc::clone(created);
        InMemoryBeanStore::new().with_bean(
            BeanDefinition::builder::<AuditLog>()
                .scope(Scope::ApplicationScoped)
                .produce(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(AuditLog::default())
                })
                .build()
                .expect("valid bean"),
        )
    }

    #[test]
    fn test_method_observer_creates_declaring_bean() {
        let created = Arc::new(AtomicUsize::new(0));
        let observer = ObserverMethod::builder::<LoggedIn>()
            .declared_on::<AuditLog, _>(|log, event, _| log.on_login(event))
            .build()
            .expect("valid observer");
        assert_eq!(observer.declaring_type(), Some(TypeKey::of::<AuditLog>()));
        let manager = manager(audit_store(&created), vec![observer]);

        manager.fire(logged_in("ada")).expect("delivered");
        manager.fire(logged_in("grace")).expect("delivered");

        let log = manager.reference::<AuditLog>(&QualifierSet::new()).expect("bean");
        assert_eq!(*log.entries.lock().expect("entries"), vec!["ada", "grace"]);
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_if_exists_observer_skips_missing_instance() {
        let created = Arc::new(AtomicUsize::new(0));
        let observer = ObserverMethod::builder::<LoggedIn>()
            .reception(Reception::IfExists)
            .declared_on::<AuditLog, _>(|log, event, _| log.on_login(event))
            .build()
            .expect("valid observer");
        let manager = manager(audit_store(&created), vec![observer]);

        manager.fire(logged_in("ada")).expect("delivered");
        assert_eq!(created.load(Ordering::SeqCst), 0);

        let log = manager.reference::<AuditLog>(&QualifierSet::new()).expect("bean");
        manager.fire(logged_in("grace")).expect("delivered");
        assert_eq!(*log.entries.lock().expect("entries"), vec!["grace"]);
    }

    #[test]
    fn test_if_exists_on_dependent_bean_rejected() {
        struct Scratch;

        let store = InMemoryBeanStore::new().with_bean(
            BeanDefinition::builder::<Scratch>()
                .produce(|_| Ok(Scratch))
                .build()
                .expect("valid bean"),
        );
        let observer = ObserverMethod::builder::<LoggedIn>()
            .reception(Reception::IfExists)
            .declared_on::<Scratch, _>(|_, _, _| Ok(()))
            .build()
            .expect("valid observer");
        let result = BeanManager::builder(Arc::new(store)).observer(observer).build();
        assert!(matches!(result, Err(Error::Definition { .. })));
    }

    #[test]
    fn test_observer_without_declaring_bean_rejected() {
        let observer = ObserverMethod::builder::<LoggedIn>()
            .declared_on::<AuditLog, _>(|log, event, _| log.on_login(event))
            .build()
            .expect("valid observer");
        let result = BeanManager::builder(Arc::new(InMemoryBeanStore::new()))
            .observer(observer)
            .build();
        assert!(matches!(result, Err(Error::Definition { .. })));
    }

    #[test]
    fn test_injected_dependents_released_after_notification() {
        struct Formatter;

        let destroyed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&destroyed);
        let store = InMemoryBeanStore::new().with_bean(
            BeanDefinition::builder::<Formatter>()
                .produce(|_| Ok(Formatter))
                .dispose(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .build()
                .expect("valid bean"),
        );
        let observer = ObserverMethod::builder::<LoggedIn>()
            .notify(|_, invocation| {
                let _formatter = invocation.inject::<Formatter>(&QualifierSet::new())?;
                Ok(())
            })
            .build()
            .expect("valid observer");
        let manager = manager(store, vec![observer]);

        manager.fire(logged_in("ada")).expect("delivered");
        manager.fire(logged_in("grace")).expect("delivered");
        assert_eq!(destroyed.load(Ordering::SeqCst), 2);
    }

    // ========================================================================
    // Builder validation
    // ========================================================================

    #[test]
    fn test_async_transactional_observer_rejected() {
        let result = ObserverMethod::builder::<LoggedIn>()
            .asynchronous()
            .transaction_phase(TransactionPhase::AfterSuccess)
            .notify(|_, _| Ok(()))
            .build();
        assert!(matches!(result, Err(Error::Definition { .. })));
    }

    #[test]
    fn test_transactional_observer_notified_immediately() {
        let log: Log = Arc::default();
        let observer = ObserverMethod::builder::<LoggedIn>()
            .transaction_phase(TransactionPhase::AfterSuccess)
            .notify(recorder(&log, "after-success"))
            .build()
            .expect("valid observer");
        let manager = manager(InMemoryBeanStore::new(), vec![observer]);

        manager.fire(logged_in("ada")).expect("delivered");
        assert_eq!(entries(&log), vec!["after-success"]);
    }

    #[test]
    fn test_method_observer_parameters_rejected() {
        let result = ObserverMethod::builder::<LoggedIn>()
            .parameter("threshold", 3)
            .declared_on::<AuditLog, _>(|_, _, _| Ok(()))
            .build();
        assert!(matches!(result, Err(Error::Definition { .. })));
    }

    #[test]
    fn test_observer_without_callback_rejected() {
        let result = ObserverMethod::builder::<LoggedIn>().priority(1).build();
        assert!(matches!(result, Err(Error::Definition { .. })));
    }

    #[test]
    fn test_default_priority_and_description() {
        let observer = ObserverMethod::builder::<LoggedIn>()
            .declared_on::<AuditLog, _>(|_, _, _| Ok(()))
            .build()
            .expect("valid observer");
        assert_eq!(observer.priority(), 2500);
        assert_eq!(observer.description(), "AuditLog::observe(LoggedIn)");
        assert!(!observer.is_synthetic());
    }

    // ========================================================================
    // Asynchronous delivery
    // ========================================================================

    fn async_observers(completed: &Arc<AtomicUsize>) -> Vec<ObserverMethod> {
        let counter = Arc::clone(completed);
        vec![
            ObserverMethod::builder::<LoggedIn>()
                .asynchronous()
                .notify(|_, _| Err(Error::application_msg("boom")))
                .build()
                .expect("valid observer"),
            ObserverMethod::builder::<LoggedIn>()
                .asynchronous()
                .notify(move |_, _| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .build()
                .expect("valid observer"),
        ]
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_async_failures_are_aggregated() {
        let completed = Arc::new(AtomicUsize::new(0));
        let manager = manager(InMemoryBeanStore::new(), async_observers(&completed));

        let err = manager
            .event::<LoggedIn>()
            .fire_async(logged_in("ada"))
            .await
            .expect_err("one observer fails");

        let suppressed = err.suppressed();
        assert_eq!(suppressed.len(), 1);
        assert_eq!(suppressed[0].to_string(), "boom");
        assert_eq!(completed.load(Ordering::SeqCst), 1);
        manager.shutdown().expect("shut down");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_async_completion_returns_event() {
        let completed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&completed);
        let observer = ObserverMethod::builder::<LoggedIn>()
            .asynchronous()
            .notify(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build()
            .expect("valid observer");
        let manager = manager(InMemoryBeanStore::new(), vec![observer]);

        let options = NotificationOptions::new().executor(tokio::runtime::Handle::current());
        let event = manager
            .event::<LoggedIn>()
            .fire_async_with(logged_in("ada"), options)
            .await
            .expect("delivered");
        assert_eq!(event.user, "ada");
        assert_eq!(completed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_async_and_sync_observers_are_separate() {
        let completed = Arc::new(AtomicUsize::new(0));
        let manager = manager(InMemoryBeanStore::new(), async_observers(&completed));

        manager.fire(logged_in("ada")).expect("no synchronous observers");
        assert_eq!(completed.load(Ordering::SeqCst), 0);
        assert!(!manager.executor().is_started());

        let err = manager
            .event::<LoggedIn>()
            .fire_async(logged_in("ada"))
            .wait()
            .expect_err("one observer fails");
        assert!(matches!(err, Error::AsyncObserverFailures { .. }));
        assert_eq!(completed.load(Ordering::SeqCst), 1);
        manager.shutdown().expect("shut down");
    }

    #[test]
    fn test_async_without_observers_completes_immediately() {
        let manager = manager(InMemoryBeanStore::new(), Vec::new());
        let fired = manager.event::<LoggedIn>().fire_async(logged_in("ada"));
        assert!(fired.is_finished());
        assert_eq!(fired.wait().expect("delivered").user, "ada");
        assert!(!manager.executor().is_started());
    }

    #[test]
    fn test_fire_after_shutdown_fails() {
        let manager = manager(InMemoryBeanStore::new(), Vec::new());
        manager.shutdown().expect("shut down");
        assert!(matches!(
            manager.fire(logged_in("ada")),
            Err(Error::IllegalState { .. })
        ));
        assert!(
            manager
                .event::<LoggedIn>()
                .fire_async(logged_in("ada"))
                .wait()
                .is_err()
        );
    }
}
