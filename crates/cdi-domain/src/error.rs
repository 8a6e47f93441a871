//! Error handling types

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the CDI runtime
///
/// Every failure path of the runtime maps to one of these variants. The
/// resolution outcomes (`UnsatisfiedResolution`, `AmbiguousResolution`) and
/// `ContextNotActive` are always surfaced to the immediate caller.
#[derive(Error, Debug)]
pub enum Error {
    /// No bean matched the requested type and qualifiers
    #[error("Unsatisfied dependency: no bean matches type {type_name} with qualifiers {qualifiers}")]
    UnsatisfiedResolution {
        /// Requested type
        type_name: String,
        /// Requested qualifiers (display form)
        qualifiers: String,
    },

    /// More than one bean remained after disambiguation
    #[error(
        "Ambiguous dependency: type {type_name} with qualifiers {qualifiers} matches {candidates:?}"
    )]
    AmbiguousResolution {
        /// Requested type
        type_name: String,
        /// Requested qualifiers (display form)
        qualifiers: String,
        /// Bean classes of the remaining candidates
        candidates: Vec<String>,
    },

    /// An operation was attempted on an inactive context
    #[error("Context not active: {scope}")]
    ContextNotActive {
        /// Scope of the inactive context
        scope: String,
    },

    /// Construction of a bean failed
    #[error("Failed to create bean {bean}: {source}")]
    Creation {
        /// Bean class that failed to construct
        bean: String,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Circular dependency that no partial instance could satisfy
    #[error("Circular dependency detected while creating {bean}")]
    CircularDependency {
        /// Bean class that was re-entered
        bean: String,
    },

    /// A synchronous observer failed
    #[error("Observer {observer} failed: {source}")]
    ObserverInvocation {
        /// Observer description
        observer: String,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// One or more asynchronous observers failed
    #[error("{} asynchronous observer(s) failed", failures.len())]
    AsyncObserverFailures {
        /// Every captured observer failure
        failures: Vec<Error>,
    },

    /// Invalid metadata (duplicate qualifiers, non-qualifier annotations, ...)
    #[error("Definition error: {message}")]
    Definition {
        /// Description of the definition problem
        message: String,
    },

    /// Invalid argument provided to a function
    #[error("Invalid argument: {message}")]
    IllegalArgument {
        /// Description of the invalid argument
        message: String,
    },

    /// Operation not valid in the current state
    #[error("Illegal state: {message}")]
    IllegalState {
        /// Description of the state problem
        message: String,
    },

    /// Configuration-related error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O operation error
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// Error raised by application code, passed through unaltered
    #[error(transparent)]
    Application(#[from] Box<dyn std::error::Error + Send + Sync>),
}

// Resolution error creation methods
impl Error {
    /// Create an unsatisfied resolution error
    pub fn unsatisfied(type_name: impl Into<String>, qualifiers: impl Into<String>) -> Self {
        Self::UnsatisfiedResolution {
            type_name: type_name.into(),
            qualifiers: qualifiers.into(),
        }
    }

    /// Create an ambiguous resolution error
    pub fn ambiguous(
        type_name: impl Into<String>,
        qualifiers: impl Into<String>,
        candidates: Vec<String>,
    ) -> Self {
        Self::AmbiguousResolution {
            type_name: type_name.into(),
            qualifiers: qualifiers.into(),
            candidates,
        }
    }

    /// Create a context-not-active error
    pub fn context_not_active(scope: impl Into<String>) -> Self {
        Self::ContextNotActive {
            scope: scope.into(),
        }
    }

    /// Whether this error is a resolution outcome rather than a failure
    pub fn is_resolution_outcome(&self) -> bool {
        matches!(
            self,
            Self::UnsatisfiedResolution { .. } | Self::AmbiguousResolution { .. }
        )
    }
}

// Creation and observer error creation methods
impl Error {
    /// Wrap a construction failure
    ///
    /// Resolution outcomes, inactive contexts and cycles pass through
    /// unwrapped so the caller sees the original cause.
    pub fn creation(bean: impl Into<String>, source: Error) -> Self {
        if source.is_resolution_outcome()
            || matches!(
                source,
                Self::ContextNotActive { .. } | Self::CircularDependency { .. }
            )
        {
            return source;
        }
        Self::Creation {
            bean: bean.into(),
            source: Box::new(source),
        }
    }

    /// Create a circular dependency error
    pub fn circular(bean: impl Into<String>) -> Self {
        Self::CircularDependency { bean: bean.into() }
    }

    /// Wrap a synchronous observer failure
    pub fn observer(observer: impl Into<String>, source: Error) -> Self {
        Self::ObserverInvocation {
            observer: observer.into(),
            source: Box::new(source),
        }
    }

    /// Aggregate asynchronous observer failures
    pub fn async_failures(failures: Vec<Error>) -> Self {
        Self::AsyncObserverFailures { failures }
    }

    /// Failures carried by an aggregated asynchronous error
    pub fn suppressed(&self) -> &[Error] {
        match self {
            Self::AsyncObserverFailures { failures } => failures,
            _ => &[],
        }
    }

    /// Wrap an application error without altering it
    pub fn application<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Application(Box::new(error))
    }

    /// Create an application error from a message
    pub fn application_msg(message: impl Into<String>) -> Self {
        Self::Application(message.into().into())
    }
}

// Validation and state error creation methods
impl Error {
    /// Create a definition error
    pub fn definition<S: Into<String>>(message: S) -> Self {
        Self::Definition {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    pub fn illegal_argument<S: Into<String>>(message: S) -> Self {
        Self::IllegalArgument {
            message: message.into(),
        }
    }

    /// Create an illegal state error
    pub fn illegal_state<S: Into<String>>(message: S) -> Self {
        Self::IllegalState {
            message: message.into(),
        }
    }
}

// Configuration error creation methods
impl Error {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn configuration_with_source<
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    >(
        message: S,
        source: E,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
