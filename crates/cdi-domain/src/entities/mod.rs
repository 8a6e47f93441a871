//! Entities
//!
//! Bean definitions and the type-erased instances they produce.

pub mod bean;
pub mod instance;

pub use bean::{
    BeanDefinition, BeanDefinitionBuilder, BeanId, BeanKind, BeanType, Disposer, Producer,
};
pub use instance::{ContextualInstance, identity_of};
