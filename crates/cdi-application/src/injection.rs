//! Injection during instance creation
//!
//! [`InjectionScope`] is the [`InjectionContext`] handed to producers. Every
//! reference it hands out is created under a child of the producing
//! instance's creational context, so dependent instances are destroyed with
//! their owner.

use crate::bean_manager::BeanManager;
use crate::context::CreationalContext;
use cdi_domain::error::Result;
use cdi_domain::ports::InjectionContext;
use cdi_domain::{ContextualInstance, InjectionPoint, QualifierSet, TypeKey};
use std::sync::Arc;

/// Injection context of one instance under construction
pub struct InjectionScope {
    manager: BeanManager,
    creational: CreationalContext,
    injection_point: Option<Arc<InjectionPoint>>,
}

impl InjectionScope {
    /// Create a scope for the instance owning `creational`
    pub fn new(
        manager: BeanManager,
        creational: CreationalContext,
        injection_point: Option<Arc<InjectionPoint>>,
    ) -> Self {
        Self {
            manager,
            creational,
            injection_point,
        }
    }

    /// Creational context of the instance under construction
    pub fn creational(&self) -> &CreationalContext {
        &self.creational
    }

    fn lookup(
        &self,
        required: TypeKey,
        qualifiers: &QualifierSet,
        point: Option<Arc<InjectionPoint>>,
    ) -> Result<ContextualInstance> {
        let bean = self.manager.resolve(&required, qualifiers)?;
        let child = self.creational.child(&bean);
        self.manager
            .get_reference_at(&bean, &required, &child, point)
    }
}

impl InjectionContext for InjectionScope {
    fn push(&self, instance: ContextualInstance) {
        self.creational.push(instance);
    }

    fn reference(
        &self,
        required: TypeKey,
        qualifiers: &QualifierSet,
    ) -> Result<ContextualInstance> {
        self.lookup(required, qualifiers, None)
    }

    fn reference_at(&self, point: Arc<InjectionPoint>) -> Result<ContextualInstance> {
        let required = point.required_type();
        let qualifiers = point.qualifiers().clone();
        self.lookup(required, &qualifiers, Some(point))
    }

    fn injection_point(&self) -> Option<Arc<InjectionPoint>> {
        self.injection_point.clone()
    }
}
