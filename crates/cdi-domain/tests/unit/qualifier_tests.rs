//! Unit tests for qualifiers and qualifier sets
//!
//! Covers the containment laws, canonicalization, annotation validation and
//! the narrowing rule used by chained selectors.

#[cfg(test)]
mod tests {
    use cdi_domain::{Annotation, AnnotationKind, Error, Qualifier, QualifierSet, Retention};

    fn set(names: &[&'static str]) -> QualifierSet {
        QualifierSet::of(names.iter().map(|n| Qualifier::new(*n))).expect("distinct qualifiers")
    }

    // ========================================================================
    // Containment laws
    // ========================================================================

    #[test]
    fn test_empty_set_is_equivalent_to_default() {
        let empty = QualifierSet::new();
        assert_eq!(empty.canonical(), QualifierSet::default_set());
        assert!(QualifierSet::default_set().contains(&empty));
        assert!(empty.contains(&QualifierSet::default_set()));
    }

    #[test]
    fn test_any_contains_every_set() {
        let any = QualifierSet::any();
        assert!(any.contains(&set(&["Synchronous"])));
        assert!(any.contains(&set(&["Synchronous", "Reliable"])));
        assert!(any.contains(&QualifierSet::new()));
    }

    #[test]
    fn test_containment_is_reflexive() {
        for candidate in [
            QualifierSet::new(),
            QualifierSet::any(),
            set(&["Synchronous"]),
            set(&["Synchronous", "Reliable"]),
        ] {
            assert!(candidate.contains(&candidate), "{candidate} must contain itself");
        }
    }

    #[test]
    fn test_containment_is_not_symmetric() {
        let broad = set(&["Synchronous", "Reliable"]);
        let narrow = set(&["Synchronous"]);
        assert!(broad.contains(&narrow));
        assert!(!narrow.contains(&broad));
    }

    #[test]
    fn test_any_on_requested_side_is_ignored() {
        let candidate = set(&["Synchronous"]);
        let required = QualifierSet::of([Qualifier::new("Synchronous"), Qualifier::any()])
            .expect("distinct qualifiers");
        assert!(candidate.contains(&required));
    }

    #[test]
    fn test_members_take_part_in_identity() {
        let eu = QualifierSet::single(Qualifier::new("Region").with_member("value", "eu"));
        let us = QualifierSet::single(Qualifier::new("Region").with_member("value", "us"));
        assert!(!eu.contains(&us));
        assert!(eu.contains(&eu.clone()));
    }

    // ========================================================================
    // Bean qualifiers
    // ========================================================================

    #[test]
    fn test_for_bean_adds_default_when_unqualified() {
        let carried = QualifierSet::for_bean(&QualifierSet::new());
        assert!(carried.has_default());
        assert!(!carried.has_any());
    }

    #[test]
    fn test_for_bean_adds_default_next_to_named() {
        let declared = QualifierSet::single(Qualifier::named("paymentProcessor"));
        let carried = QualifierSet::for_bean(&declared);
        assert!(carried.has_default());
        assert_eq!(carried.len(), 2);
    }

    #[test]
    fn test_for_bean_keeps_specific_qualifiers_only() {
        let carried = QualifierSet::for_bean(&set(&["Synchronous"]));
        assert!(!carried.has_default());
        assert_eq!(carried, set(&["Synchronous"]));
    }

    #[test]
    fn test_unconstrained_requests() {
        assert!(QualifierSet::new().is_unconstrained());
        assert!(QualifierSet::any().is_unconstrained());
        assert!(QualifierSet::default_set().is_unconstrained());
        assert!(!set(&["Synchronous"]).is_unconstrained());
    }

    // ========================================================================
    // Construction and annotation validation
    // ========================================================================

    #[test]
    fn test_duplicate_qualifier_type_rejected() {
        let result = QualifierSet::of([
            Qualifier::new("Region").with_member("value", "eu"),
            Qualifier::new("Region").with_member("value", "us"),
        ]);
        assert!(matches!(result, Err(Error::Definition { .. })));
    }

    #[test]
    fn test_from_annotation_requires_qualifier_kind() {
        let scope = Annotation::new("ApplicationScoped", AnnotationKind::NormalScope);
        assert!(matches!(
            Qualifier::from_annotation(&scope),
            Err(Error::Definition { .. })
        ));
    }

    #[test]
    fn test_from_annotation_requires_runtime_retention() {
        let annotation = Annotation::qualifier("Synchronous").with_retention(Retention::Class);
        assert!(Qualifier::from_annotation(&annotation).is_err());
    }

    #[test]
    fn test_from_annotation_drops_nonbinding_members() {
        let annotation = Annotation::qualifier("Region")
            .with_member("value", "eu")
            .with_member("comment", "primary site")
            .with_nonbinding("comment");
        let qualifier = Qualifier::from_annotation(&annotation).expect("valid qualifier");
        assert_eq!(qualifier.member("value"), Some("eu"));
        assert_eq!(qualifier.member("comment"), None);
    }

    #[test]
    fn test_from_annotations_builds_set() {
        let annotations = vec![
            Annotation::qualifier("Synchronous"),
            Annotation::qualifier("Reliable"),
        ];
        let qualifiers = QualifierSet::from_annotations(&annotations).expect("valid set");
        assert_eq!(qualifiers, set(&["Synchronous", "Reliable"]));
    }

    #[test]
    fn test_display() {
        let named = QualifierSet::single(Qualifier::named("cart"));
        assert_eq!(named.to_string(), "[@Named(value=cart)]");
    }

    // ========================================================================
    // Narrowing
    // ========================================================================

    #[test]
    fn test_narrow_accumulates_qualifiers() {
        let parent = set(&["Synchronous"]);
        let child = parent.narrow(&set(&["Reliable"])).expect("narrowed");
        assert_eq!(child, set(&["Synchronous", "Reliable"]));
    }

    #[test]
    fn test_narrow_drops_inherited_any() {
        let child = QualifierSet::any()
            .narrow(&set(&["Synchronous"]))
            .expect("narrowed");
        assert_eq!(child, set(&["Synchronous"]));
    }

    #[test]
    fn test_narrow_drops_inherited_default() {
        let child = QualifierSet::default_set()
            .narrow(&set(&["Synchronous"]))
            .expect("narrowed");
        assert!(!child.has_default());
    }

    #[test]
    fn test_narrow_with_nothing_is_identity() {
        let parent = set(&["Synchronous"]);
        assert_eq!(parent.narrow(&QualifierSet::new()).expect("narrowed"), parent);
    }

    #[test]
    fn test_narrow_same_qualifier_is_noop() {
        let parent = set(&["Synchronous"]);
        assert_eq!(parent.narrow(&parent).expect("narrowed"), parent);
    }

    #[test]
    fn test_narrow_conflicting_members_rejected() {
        let parent = QualifierSet::single(Qualifier::new("Region").with_member("value", "eu"));
        let conflicting =
            QualifierSet::single(Qualifier::new("Region").with_member("value", "us"));
        assert!(matches!(
            parent.narrow(&conflicting),
            Err(Error::IllegalArgument { .. })
        ));
    }

    #[test]
    fn test_narrow_is_monotonic() {
        let candidates = [
            set(&["Synchronous"]),
            set(&["Synchronous", "Reliable"]),
            set(&["Reliable"]),
        ];
        let parent = set(&["Synchronous"]);
        let child = parent.narrow(&set(&["Reliable"])).expect("narrowed");
        for candidate in &candidates {
            if candidate.contains(&child) {
                assert!(candidate.contains(&parent));
            }
        }
    }
}
