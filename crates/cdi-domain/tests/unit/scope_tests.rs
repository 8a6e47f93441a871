//! Unit tests for scopes, type keys and lifecycle events

#[cfg(test)]
mod tests {
    use cdi_domain::{Scope, Shutdown, Startup, TypeKey};

    #[test]
    fn test_scope_classification() {
        assert!(Scope::ApplicationScoped.is_normal());
        assert!(Scope::RequestScoped.is_normal());
        assert!(!Scope::Singleton.is_normal());
        assert!(!Scope::Dependent.is_normal());
        assert!(Scope::Dependent.is_dependent());
        assert_eq!(Scope::default(), Scope::Dependent);
    }

    #[test]
    fn test_custom_scope() {
        let scope = Scope::custom("ConversationScoped");
        assert!(scope.is_normal());
        assert_eq!(scope.name(), "ConversationScoped");
        assert_eq!(scope.to_string(), "@ConversationScoped");
        assert!(!Scope::built_in().contains(&scope));
    }

    #[test]
    fn test_type_keys_are_reified() {
        assert_ne!(TypeKey::of::<Vec<String>>(), TypeKey::of::<Vec<u32>>());
        assert_eq!(TypeKey::of::<Vec<String>>(), TypeKey::of::<Vec<String>>());
        assert!(TypeKey::universal().is_universal());
        assert!(!TypeKey::of::<String>().is_universal());
    }

    #[test]
    fn test_lifecycle_events_serialize() {
        let startup = Startup {
            container_id: "main".to_string(),
        };
        let json = serde_json::to_value(&startup).expect("serializable");
        assert_eq!(json["container_id"], "main");

        let shutdown: Shutdown =
            serde_json::from_str(r#"{"container_id":"main"}"#).expect("deserializable");
        assert_eq!(shutdown.container_id, "main");
    }
}
