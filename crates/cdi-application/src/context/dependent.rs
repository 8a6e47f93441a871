//! `@Dependent` pseudo-scope

use crate::context::{Context, Contextual, CreationalContext};
use cdi_domain::error::Result;
use cdi_domain::{BeanDefinition, ContextualInstance, Scope};

/// Context creating a fresh instance on every request
///
/// The new instance's creational context becomes a dependent of the
/// requesting one, so destroying the requester destroys it too. Nothing is
/// stored and the context is always active.
pub struct DependentContext {
    scope: Scope,
}

impl DependentContext {
    /// Create the dependent context
    pub fn new() -> Self {
        Self {
            scope: Scope::Dependent,
        }
    }
}

impl Default for DependentContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Context for DependentContext {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn get(
        &self,
        contextual: &dyn Contextual,
        creational: &CreationalContext,
    ) -> Result<ContextualInstance> {
        if let Some(partial) = creational.check_cycle(contextual.bean())? {
            return Ok(partial);
        }
        let instance = contextual.create(creational)?;
        if let Some(parent) = creational.parent() {
            parent.add_dependent(creational.clone());
        }
        Ok(instance)
    }

    fn get_if_exists(&self, _bean: &BeanDefinition) -> Result<Option<ContextualInstance>> {
        Ok(None)
    }

    fn destroy(&self, _bean: &BeanDefinition) -> Result<()> {
        Ok(())
    }

    fn destroy_all(&self) {}

    fn activate(&self) {}

    fn deactivate(&self) {}

    fn is_active(&self) -> bool {
        true
    }
}
