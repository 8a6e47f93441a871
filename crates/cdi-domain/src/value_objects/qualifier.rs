//! Qualifiers and qualifier sets
//!
//! A [`QualifierSet`] is the canonical form used for every matching decision:
//! bean resolution, observer selection and selector narrowing.
//!
//! ## Rules
//!
//! | Rule | Behaviour |
//! |------|-----------|
//! | Empty set | Equivalent to `{@Default}` |
//! | `@Any` on the requested side | Ignored; `{@Any}` alone matches every candidate |
//! | `@Any` on the candidate side | Candidate matches every request |
//! | Containment | Every non-`@Any` requested qualifier must be present in the candidate |

use crate::constants::{ANY_QUALIFIER, DEFAULT_QUALIFIER, NAMED_QUALIFIER, NAMED_VALUE_MEMBER};
use crate::error::{Error, Result};
use crate::value_objects::annotation::{Annotation, AnnotationKind, Retention};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A qualifier: annotation type name plus its binding member values
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Qualifier {
    name: Cow<'static, str>,
    members: BTreeMap<String, String>,
}

impl Qualifier {
    /// Create a qualifier without members
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            members: BTreeMap::new(),
        }
    }

    /// Add a binding member value
    pub fn with_member(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.members.insert(name.into(), value.into());
        self
    }

    /// The `@Any` qualifier
    pub fn any() -> Self {
        Self::new(ANY_QUALIFIER)
    }

    /// The `@Default` qualifier
    pub fn default_qualifier() -> Self {
        Self::new(DEFAULT_QUALIFIER)
    }

    /// A `@Named(value)` qualifier
    pub fn named(value: impl Into<String>) -> Self {
        Self::new(NAMED_QUALIFIER).with_member(NAMED_VALUE_MEMBER, value)
    }

    /// Convert annotation metadata into a qualifier
    ///
    /// Fails unless the annotation is classified as a qualifier with runtime
    /// retention. `@Nonbinding` members are dropped.
    pub fn from_annotation(annotation: &Annotation) -> Result<Self> {
        if annotation.kind() != AnnotationKind::Qualifier {
            return Err(Error::definition(format!(
                "@{} is not a qualifier type",
                annotation.type_name()
            )));
        }
        if annotation.retention() != Retention::Runtime {
            return Err(Error::definition(format!(
                "Qualifier @{} must have runtime retention",
                annotation.type_name()
            )));
        }
        Ok(Self {
            name: annotation.owned_type_name(),
            members: annotation
                .binding_members()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        })
    }

    /// Annotation type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of a member
    pub fn member(&self, name: &str) -> Option<&str> {
        self.members.get(name).map(String::as_str)
    }

    /// Whether this is `@Any`
    pub fn is_any(&self) -> bool {
        self.name == ANY_QUALIFIER
    }

    /// Whether this is `@Default`
    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_QUALIFIER
    }

    /// Whether this is `@Named`
    pub fn is_named(&self) -> bool {
        self.name == NAMED_QUALIFIER
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)?;
        if !self.members.is_empty() {
            let members: Vec<String> = self
                .members
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            write!(f, "({})", members.join(", "))?;
        }
        Ok(())
    }
}

/// Canonical set of qualifiers with at most one qualifier per type
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualifierSet(BTreeSet<Qualifier>);

impl QualifierSet {
    /// Empty set (implies `@Default`)
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set, rejecting two qualifiers of the same type
    pub fn of<I>(qualifiers: I) -> Result<Self>
    where
        I: IntoIterator<Item = Qualifier>,
    {
        let mut set = BTreeSet::new();
        let mut seen = BTreeSet::new();
        for qualifier in qualifiers {
            if !seen.insert(qualifier.name.clone()) {
                return Err(Error::definition(format!(
                    "Duplicate qualifier type @{}",
                    qualifier.name
                )));
            }
            set.insert(qualifier);
        }
        Ok(Self(set))
    }

    /// Resolve annotation metadata into a qualifier set
    pub fn from_annotations(annotations: &[Annotation]) -> Result<Self> {
        let qualifiers = annotations
            .iter()
            .map(Qualifier::from_annotation)
            .collect::<Result<Vec<_>>>()?;
        Self::of(qualifiers)
    }

    /// Set holding one qualifier
    pub fn single(qualifier: Qualifier) -> Self {
        Self(BTreeSet::from([qualifier]))
    }

    /// `{@Any}`
    pub fn any() -> Self {
        Self::single(Qualifier::any())
    }

    /// `{@Default}`
    pub fn default_set() -> Self {
        Self::single(Qualifier::default_qualifier())
    }

    /// Qualifier set carried by a bean declaring `declared`
    ///
    /// A bean that declares nothing besides `@Named`/`@Any` also carries
    /// `@Default`.
    pub fn for_bean(declared: &QualifierSet) -> Self {
        let mut set = declared.0.clone();
        if declared.iter().all(|q| q.is_named() || q.is_any()) {
            set.insert(Qualifier::default_qualifier());
        }
        Self(set)
    }

    /// Canonical form: the empty set becomes `{@Default}`
    pub fn canonical(&self) -> Self {
        if self.0.is_empty() {
            Self::default_set()
        } else {
            self.clone()
        }
    }

    /// Whether a request with these qualifiers places no constraint beyond
    /// `@Default`/`@Any`
    pub fn is_unconstrained(&self) -> bool {
        self.iter().all(|q| q.is_any() || q.is_default())
    }

    /// Whether this (candidate) set contains the `required` set
    pub fn contains(&self, required: &QualifierSet) -> bool {
        let candidate = self.canonical();
        if candidate.has_any() {
            return true;
        }
        required
            .canonical()
            .iter()
            .filter(|q| !q.is_any())
            .all(|q| candidate.0.contains(q))
    }

    /// Layer `additional` qualifiers over this set (AND semantics)
    ///
    /// Inherited `@Any`/`@Default` are dropped once more specific qualifiers
    /// are selected. Re-selecting an identical qualifier is a no-op; a
    /// qualifier of the same type with different members is rejected.
    pub fn narrow(&self, additional: &QualifierSet) -> Result<Self> {
        if additional.is_empty() {
            return Ok(self.clone());
        }
        let child_specific = additional.iter().any(|q| !q.is_any());
        let mut merged: BTreeSet<Qualifier> = self
            .iter()
            .filter(|q| !(child_specific && (q.is_any() || q.is_default())))
            .cloned()
            .collect();
        for qualifier in additional.iter() {
            if let Some(existing) = merged.iter().find(|q| q.name == qualifier.name)
                && existing != qualifier
            {
                return Err(Error::illegal_argument(format!(
                    "Qualifier {qualifier} conflicts with already selected {existing}"
                )));
            }
            merged.insert(qualifier.clone());
        }
        if merged.iter().any(|q| !q.is_any()) {
            merged.retain(|q| !q.is_any());
        }
        Ok(Self(merged))
    }

    /// Whether `@Any` is present
    pub fn has_any(&self) -> bool {
        self.0.iter().any(Qualifier::is_any)
    }

    /// Whether `@Default` is present
    pub fn has_default(&self) -> bool {
        self.0.iter().any(Qualifier::is_default)
    }

    /// Whether a qualifier is present
    pub fn contains_qualifier(&self, qualifier: &Qualifier) -> bool {
        self.0.contains(qualifier)
    }

    /// First qualifier of the given type
    pub fn get(&self, name: &str) -> Option<&Qualifier> {
        self.0.iter().find(|q| q.name() == name)
    }

    /// Iterate qualifiers in canonical order
    pub fn iter(&self) -> impl Iterator<Item = &Qualifier> {
        self.0.iter()
    }

    /// Number of qualifiers
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy with `@Any` added
    pub fn with_any(&self) -> Self {
        let mut set = self.0.clone();
        set.insert(Qualifier::any());
        Self(set)
    }
}

impl From<Qualifier> for QualifierSet {
    fn from(qualifier: Qualifier) -> Self {
        Self::single(qualifier)
    }
}

impl fmt::Display for QualifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}
