//! Bean scopes

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Scope of a bean, deciding which context stores its instances
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Scope {
    /// One instance per container, no client proxy
    Singleton,
    /// One instance per container
    ApplicationScoped,
    /// One instance per active request context
    RequestScoped,
    /// A new instance per injection point
    #[default]
    Dependent,
    /// User-declared scope
    Custom {
        /// Scope annotation name
        name: Cow<'static, str>,
        /// Whether the scope is a normal scope
        normal: bool,
    },
}

impl Scope {
    /// Declare a custom normal scope
    pub fn custom(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Custom {
            name: name.into(),
            normal: true,
        }
    }

    /// Scope annotation name
    pub fn name(&self) -> &str {
        match self {
            Self::Singleton => "Singleton",
            Self::ApplicationScoped => "ApplicationScoped",
            Self::RequestScoped => "RequestScoped",
            Self::Dependent => "Dependent",
            Self::Custom { name, .. } => name,
        }
    }

    /// Whether this is the dependent pseudo-scope
    pub fn is_dependent(&self) -> bool {
        matches!(self, Self::Dependent)
    }

    /// Whether this is a normal scope
    pub fn is_normal(&self) -> bool {
        match self {
            Self::ApplicationScoped | Self::RequestScoped => true,
            Self::Custom { normal, .. } => *normal,
            Self::Singleton | Self::Dependent => false,
        }
    }

    /// Scopes every container creates a context for
    pub fn built_in() -> [Scope; 3] {
        [
            Self::Singleton,
            Self::ApplicationScoped,
            Self::RequestScoped,
        ]
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name())
    }
}
