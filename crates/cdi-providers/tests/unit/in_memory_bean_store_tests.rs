//! Unit tests for the in-memory bean store

#[cfg(test)]
mod tests {
    use cdi_domain::ports::{BeanStore, InjectionContext};
    use cdi_domain::{
        BeanDefinition, ContextualInstance, Error, InjectionPoint, QualifierSet, Result, TypeKey,
    };
    use cdi_providers::InMemoryBeanStore;
    use std::sync::Arc;

    struct NoInjection;

    impl InjectionContext for NoInjection {
        fn push(&self, _instance: ContextualInstance) {}

        fn reference(
            &self,
            required: TypeKey,
            qualifiers: &QualifierSet,
        ) -> Result<ContextualInstance> {
            Err(Error::unsatisfied(required.name(), qualifiers.to_string()))
        }

        fn injection_point(&self) -> Option<Arc<InjectionPoint>> {
            None
        }
    }

    struct Clock;
    struct Calendar;

    fn clock() -> BeanDefinition {
        BeanDefinition::builder::<Clock>()
            .produce(|_| Ok(Clock))
            .build()
            .expect("valid bean")
    }

    #[test]
    fn test_definitions_in_registration_order() {
        let store = InMemoryBeanStore::new();
        let first = store.register(clock());
        let second = store.register(
            BeanDefinition::builder::<Calendar>()
                .produce(|_| Ok(Calendar))
                .build()
                .expect("valid bean"),
        );

        let ids: Vec<_> = store.definitions().iter().map(|b| b.id()).collect();
        assert_eq!(ids, vec![first.id(), second.id()]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_definitions_for_filters_by_type() {
        let store = InMemoryBeanStore::new().with_bean(clock());
        assert_eq!(store.definitions_for(&TypeKey::of::<Clock>()).len(), 1);
        assert!(store.definitions_for(&TypeKey::of::<Calendar>()).is_empty());
        assert_eq!(store.definitions_for(&TypeKey::universal()).len(), 1);
    }

    #[test]
    fn test_create_and_destroy_count() {
        let store = InMemoryBeanStore::new();
        let bean = store.register(clock());

        let instance = store.create(&bean, &NoInjection).expect("created");
        assert!(instance.downcast::<Clock>().is_some());
        store.destroy(&bean, &instance).expect("destroyed");

        assert_eq!(store.created_count(), 1);
        assert_eq!(store.destroyed_count(), 1);
    }

    #[test]
    fn test_create_propagates_injection_failure() {
        let store = InMemoryBeanStore::new();
        let bean = store.register(
            BeanDefinition::builder::<Calendar>()
                .produce(|ctx| {
                    let _clock = ctx.inject::<Clock>(&QualifierSet::new())?;
                    Ok(Calendar)
                })
                .build()
                .expect("valid bean"),
        );

        let result = store.create(&bean, &NoInjection);
        assert!(matches!(result, Err(Error::UnsatisfiedResolution { .. })));
        assert_eq!(store.created_count(), 0);
    }

    #[test]
    fn test_closed_store_refuses_creation() {
        let store = InMemoryBeanStore::new();
        let bean = store.register(clock());
        store.shutdown().expect("shutdown");
        store.shutdown().expect("idempotent");

        assert!(store.is_closed());
        assert!(matches!(
            store.create(&bean, &NoInjection),
            Err(Error::IllegalState { .. })
        ));
    }
}
