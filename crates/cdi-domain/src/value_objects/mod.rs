//! Value Objects
//!
//! Immutable values describing types, qualifiers, scopes and injection
//! points.
//!
//! | Value Object | Description |
//! |--------------|-------------|
//! | [`TypeKey`] | Reified type identity |
//! | [`Annotation`] | Annotation metadata produced at build time |
//! | [`Qualifier`] / [`QualifierSet`] | Canonical qualifier identity and matching |
//! | [`Scope`] | Bean scope |
//! | [`InjectionPoint`] / [`Annotated`] | Injection point introspection |
//! | [`EventMetadata`] | Metadata of a fired event |

pub mod annotation;
pub mod event_metadata;
pub mod injection_point;
pub mod qualifier;
pub mod scope;
pub mod type_key;

pub use annotation::{Annotation, AnnotationKind, Retention};
pub use event_metadata::EventMetadata;
pub use injection_point::{Annotated, AnnotatedKind, InjectionPoint};
pub use qualifier::{Qualifier, QualifierSet};
pub use scope::Scope;
pub use type_key::{TypeKey, UniversalType};
