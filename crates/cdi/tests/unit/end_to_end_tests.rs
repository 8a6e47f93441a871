//! End-to-end tests through the facade: configuration, bootstrap, lookup,
//! injection and events

#[cfg(test)]
mod tests {
    use cdi::prelude::*;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    trait PaymentProcessor: Send + Sync {
        fn charge(&self, cents: u64) -> String;
    }

    struct CardProcessor;
    struct MockProcessor;

    impl PaymentProcessor for CardProcessor {
        fn charge(&self, cents: u64) -> String {
            format!("card:{cents}")
        }
    }

    impl PaymentProcessor for MockProcessor {
        fn charge(&self, cents: u64) -> String {
            format!("mock:{cents}")
        }
    }

    struct Checkout {
        processor: Arc<dyn PaymentProcessor>,
        placed: Event<OrderPlaced>,
    }

    impl Checkout {
        fn place(&self, id: u32, cents: u64) -> Result<String> {
            let receipt = self.processor.charge(cents);
            self.placed.fire(OrderPlaced { id })?;
            Ok(receipt)
        }
    }

    struct OrderPlaced {
        id: u32,
    }

    fn express() -> Qualifier {
        Qualifier::new("Express")
    }

    fn beans(events: Arc<Mutex<Option<Event<OrderPlaced>>>>) -> Vec<BeanDefinition> {
        vec![
            BeanDefinition::builder::<CardProcessor>()
                .expose::<dyn PaymentProcessor>(|p| p)
                .scope(Scope::ApplicationScoped)
                .produce(|_| Ok(CardProcessor))
                .build()
                .expect("valid bean"),
            BeanDefinition::builder::<MockProcessor>()
                .expose::<dyn PaymentProcessor>(|p| p)
                .alternative()
                .priority(100)
                .produce(|_| Ok(MockProcessor))
                .build()
                .expect("valid bean"),
            BeanDefinition::builder::<Checkout>()
                .scope(Scope::RequestScoped)
                .produce(move |ctx| {
                    let placed = events
                        .lock()
                        .expect("events")
                        .as_ref()
                        .map(|e| e.select(&QualifierSet::single(express())))
                        .transpose()?
                        .ok_or_else(|| Error::illegal_state("Container not started"))?;
                    Ok(Checkout {
                        processor: ctx.inject::<dyn PaymentProcessor>(&QualifierSet::new())?,
                        placed,
                    })
                })
                .build()
                .expect("valid bean"),
        ]
    }

    type Orders = Arc<Mutex<Vec<u32>>>;

    fn start(registry: &ContainerRegistry, config: CdiConfig) -> (CdiContainer, Orders) {
        let express_orders = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&express_orders);
        let events = Arc::new(Mutex::new(None));
        let container = registry
            .start(
                ContainerBuilder::new()
                    .id("shop")
                    .discovery(false)
                    .config(config)
                    .beans(beans(Arc::clone(&events)))
                    .observer(
                        ObserverMethod::builder::<OrderPlaced>()
                            .qualifier(express())
                            .notify(move |order, _| {
                                recorded.lock().expect("orders").push(order.id);
                                Ok(())
                            })
                            .build()
                            .expect("valid observer"),
                    ),
            )
            .expect("container starts");
        *events.lock().expect("events") = Some(container.event::<OrderPlaced>());
        (container, express_orders)
    }

    #[test]
    fn test_checkout_with_default_configuration() {
        let registry = ContainerRegistry::new();
        let (container, orders) = start(&registry, CdiConfig::default());

        let checkout = registry
            .current()
            .expect("one container")
            .reference::<Checkout>(&QualifierSet::new())
            .expect("checkout");
        assert_eq!(checkout.place(7, 1250).expect("placed"), "card:1250");
        assert_eq!(*orders.lock().expect("orders"), vec![7]);

        container.fire(OrderPlaced { id: 8 }).expect("fired");
        assert_eq!(*orders.lock().expect("orders"), vec![7]);

        registry.close_all().expect("closed");
        assert!(registry.is_empty());
        assert!(!container.is_running());
    }

    #[test]
    fn test_checkout_with_configured_alternative() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("cdi.toml");
        fs::write(&path, "[alternatives]\nselected = [\"**::MockProcessor\"]\n")
            .expect("write config");
        let config = ConfigLoader::new()
            .with_config_path(&path)
            .with_env_prefix("CDI_E2E_UNSET")
            .load()
            .expect("config loads");

        let registry = ContainerRegistry::new();
        let (container, _) = start(&registry, config);
        let checkout = container
            .reference::<Checkout>(&QualifierSet::new())
            .expect("checkout");
        assert_eq!(checkout.place(1, 99).expect("placed"), "mock:99");
        container.close().expect("closed");
        assert!(registry.is_empty());
    }
}
