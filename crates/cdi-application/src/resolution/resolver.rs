//! Bean resolution
//!
//! Matches a requested (type, qualifiers) pair against the bean store and
//! reduces the candidates to a single bean.
//!
//! ## Rules
//!
//! 1. The requested type must be in the bean's type closure.
//! 2. A request with no qualifiers, `{@Default}` or `{@Any}` accepts every
//!    bean of the type; otherwise the bean's qualifiers must contain the
//!    requested ones.
//! 3. Alternatives take part only when selected.
//! 4. With several candidates, selected alternatives win (highest priority
//!    first), then beans without specific qualifiers. Anything left over is
//!    ambiguous.

use crate::resolution::alternatives::Alternatives;
use cdi_domain::error::{Error, Result};
use cdi_domain::ports::SharedBeanStore;
use cdi_domain::{BeanDefinition, QualifierSet, TypeKey};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Outcome of resolving a request
#[derive(Debug, Clone)]
pub enum Resolution {
    /// No bean matched
    Unsatisfied,
    /// Exactly one bean remained
    Resolved(Arc<BeanDefinition>),
    /// Several beans remained after disambiguation
    Ambiguous(Vec<Arc<BeanDefinition>>),
}

impl Resolution {
    /// Whether no bean matched
    pub fn is_unsatisfied(&self) -> bool {
        matches!(self, Self::Unsatisfied)
    }

    /// Whether several beans remained
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous(_))
    }

    /// Whether exactly one bean remained
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Convert into the resolved bean or the matching resolution error
    pub fn into_result(
        self,
        required: &TypeKey,
        qualifiers: &QualifierSet,
    ) -> Result<Arc<BeanDefinition>> {
        match self {
            Self::Resolved(bean) => Ok(bean),
            Self::Unsatisfied => Err(Error::unsatisfied(required.name(), qualifiers.to_string())),
            Self::Ambiguous(beans) => Err(Error::ambiguous(
                required.name(),
                qualifiers.to_string(),
                beans
                    .iter()
                    .map(|b| b.bean_class_name().to_string())
                    .collect(),
            )),
        }
    }
}

type CacheKey = (TypeKey, QualifierSet);

/// Resolves requests against a bean store
///
/// The store is closed once the container starts, so results are memoized
/// without invalidation.
pub struct BeanResolver {
    store: SharedBeanStore,
    alternatives: Alternatives,
    resolved: DashMap<CacheKey, Resolution>,
    matching: DashMap<CacheKey, Arc<[Arc<BeanDefinition>]>>,
}

impl BeanResolver {
    /// Create a resolver over `store`
    pub fn new(store: SharedBeanStore, alternatives: Alternatives) -> Self {
        Self {
            store,
            alternatives,
            resolved: DashMap::new(),
            matching: DashMap::new(),
        }
    }

    /// Underlying store
    pub fn store(&self) -> &SharedBeanStore {
        &self.store
    }

    /// Alternative selection in effect
    pub fn alternatives(&self) -> &Alternatives {
        &self.alternatives
    }

    /// Whether a bean takes part in resolution
    pub fn is_enabled(&self, bean: &BeanDefinition) -> bool {
        !bean.is_alternative() || self.alternatives.is_selected(bean.bean_class_name())
    }

    /// Whether a bean satisfies a request, ignoring enablement
    pub fn matches(bean: &BeanDefinition, required: &TypeKey, qualifiers: &QualifierSet) -> bool {
        bean.has_type(required)
            && (qualifiers.is_unconstrained() || bean.qualifiers().contains(qualifiers))
    }

    /// Every enabled bean matching the request
    ///
    /// Sorted by priority (highest first), then registration order.
    pub fn resolve_all(
        &self,
        required: &TypeKey,
        qualifiers: &QualifierSet,
    ) -> Vec<Arc<BeanDefinition>> {
        let key = (*required, qualifiers.clone());
        if let Some(cached) = self.matching.get(&key) {
            return cached.to_vec();
        }
        let mut beans: Vec<_> = self
            .store
            .definitions_for(required)
            .into_iter()
            .filter(|bean| self.is_enabled(bean) && Self::matches(bean, required, qualifiers))
            .collect();
        beans.sort_by(|a, b| {
            b.priority()
                .unwrap_or(i32::MIN)
                .cmp(&a.priority().unwrap_or(i32::MIN))
                .then_with(|| a.id().cmp(&b.id()))
        });
        let shared: Arc<[Arc<BeanDefinition>]> = beans.into();
        self.matching.insert(key, Arc::clone(&shared));
        shared.to_vec()
    }

    /// Reduce the matching beans to one
    pub fn resolve(&self, required: &TypeKey, qualifiers: &QualifierSet) -> Resolution {
        let key = (*required, qualifiers.clone());
        if let Some(cached) = self.resolved.get(&key) {
            return cached.clone();
        }
        let resolution = Self::reduce(self.resolve_all(required, qualifiers));
        debug!(
            required = required.name(),
            qualifiers = %qualifiers,
            outcome = resolution_label(&resolution),
            "Resolved bean"
        );
        self.resolved.insert(key, resolution.clone());
        resolution
    }

    /// [`resolve`](Self::resolve) as a `Result`
    pub fn resolve_one(
        &self,
        required: &TypeKey,
        qualifiers: &QualifierSet,
    ) -> Result<Arc<BeanDefinition>> {
        self.resolve(required, qualifiers)
            .into_result(required, qualifiers)
    }

    /// Enabled bean whose concrete class is `class`
    pub fn bean_for_class(&self, class: &TypeKey) -> Resolution {
        let beans: Vec<_> = self
            .store
            .definitions_for(class)
            .into_iter()
            .filter(|bean| bean.bean_class() == *class && self.is_enabled(bean))
            .collect();
        match beans.len() {
            0 => Resolution::Unsatisfied,
            1 => beans
                .into_iter()
                .next()
                .map_or(Resolution::Unsatisfied, Resolution::Resolved),
            _ => Resolution::Ambiguous(beans),
        }
    }

    fn reduce(candidates: Vec<Arc<BeanDefinition>>) -> Resolution {
        if candidates.len() <= 1 {
            return candidates
                .into_iter()
                .next()
                .map_or(Resolution::Unsatisfied, Resolution::Resolved);
        }

        let alternatives: Vec<_> = candidates
            .iter()
            .filter(|bean| bean.is_alternative())
            .cloned()
            .collect();
        if !alternatives.is_empty() {
            let top = alternatives
                .iter()
                .map(|bean| bean.priority().unwrap_or(i32::MIN))
                .max()
                .unwrap_or(i32::MIN);
            let winners: Vec<_> = alternatives
                .into_iter()
                .filter(|bean| bean.priority().unwrap_or(i32::MIN) == top)
                .collect();
            return Self::single_or_ambiguous(winners);
        }

        let defaults: Vec<_> = candidates
            .iter()
            .filter(|bean| bean.is_default_candidate())
            .cloned()
            .collect();
        match defaults.len() {
            1 => Self::single_or_ambiguous(defaults),
            0 => Resolution::Ambiguous(candidates),
            _ => Resolution::Ambiguous(defaults),
        }
    }

    fn single_or_ambiguous(mut beans: Vec<Arc<BeanDefinition>>) -> Resolution {
        if beans.len() == 1 {
            beans.pop().map_or(Resolution::Unsatisfied, Resolution::Resolved)
        } else {
            Resolution::Ambiguous(beans)
        }
    }
}

fn resolution_label(resolution: &Resolution) -> &'static str {
    match resolution {
        Resolution::Unsatisfied => "unsatisfied",
        Resolution::Resolved(_) => "resolved",
        Resolution::Ambiguous(_) => "ambiguous",
    }
}
