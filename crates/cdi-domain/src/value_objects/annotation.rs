//! Annotation metadata
//!
//! Annotations are produced by the build-time classifier (outside this
//! workspace) and consumed here as plain data: a type name, member values,
//! the meta-category the classifier assigned, and the retention policy.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

/// Meta-category assigned to an annotation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationKind {
    /// Meta-annotated with `@Qualifier`
    Qualifier,
    /// Pseudo-scope annotation (`@Singleton`, `@Dependent`)
    Scope,
    /// Normal scope annotation (`@ApplicationScoped`, `@RequestScoped`)
    NormalScope,
    /// Stereotype annotation
    Stereotype,
    /// Interceptor binding annotation
    InterceptorBinding,
    /// Any other annotation
    Other,
}

/// Retention policy of an annotation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Retention {
    /// Visible at runtime
    #[default]
    Runtime,
    /// Recorded in the compiled artifact only
    Class,
    /// Discarded after compilation
    Source,
}

/// One annotation instance with its member values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    type_name: Cow<'static, str>,
    kind: AnnotationKind,
    retention: Retention,
    members: BTreeMap<String, String>,
    nonbinding: BTreeSet<String>,
}

impl Annotation {
    /// Create an annotation of the given kind with runtime retention
    pub fn new(type_name: impl Into<Cow<'static, str>>, kind: AnnotationKind) -> Self {
        Self {
            type_name: type_name.into(),
            kind,
            retention: Retention::Runtime,
            members: BTreeMap::new(),
            nonbinding: BTreeSet::new(),
        }
    }

    /// Create a qualifier annotation with runtime retention
    pub fn qualifier(type_name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(type_name, AnnotationKind::Qualifier)
    }

    /// Set the retention policy
    pub fn with_retention(mut self, retention: Retention) -> Self {
        self.retention = retention;
        self
    }

    /// Add a member value
    pub fn with_member(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.members.insert(name.into(), value.into());
        self
    }

    /// Mark a member as `@Nonbinding` (ignored when comparing qualifiers)
    pub fn with_nonbinding(mut self, name: impl Into<String>) -> Self {
        self.nonbinding.insert(name.into());
        self
    }

    /// Annotation type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Meta-category
    pub fn kind(&self) -> AnnotationKind {
        self.kind
    }

    /// Retention policy
    pub fn retention(&self) -> Retention {
        self.retention
    }

    /// Value of a member
    pub fn member(&self, name: &str) -> Option<&str> {
        self.members.get(name).map(String::as_str)
    }

    /// Members that participate in equality
    pub fn binding_members(&self) -> impl Iterator<Item = (&String, &String)> {
        self.members
            .iter()
            .filter(|(name, _)| !self.nonbinding.contains(*name))
    }

    pub(crate) fn owned_type_name(&self) -> Cow<'static, str> {
        self.type_name.clone()
    }
}
