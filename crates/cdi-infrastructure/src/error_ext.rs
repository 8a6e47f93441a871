//! Error extension utilities
//!
//! Attaches context to foreign errors while converting them into the domain
//! [`Error`].

use cdi_domain::error::{Error, Result};
use std::fmt;

/// Foreign error with a context message
#[derive(Debug, thiserror::Error)]
#[error("{message}: {source}")]
pub struct ContextError {
    message: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

/// Extension trait for adding context to errors
///
/// # Example
///
/// ```ignore
/// use cdi_infrastructure::error_ext::ErrorContext;
///
/// let raw = std::fs::read_to_string(&path)
///     .config_context(format!("Failed to read {}", path.display()))?;
///
/// // Inside a producer
/// let pool = Pool::connect(&url).creation_context("ConnectionPool")?;
/// ```
pub trait ErrorContext<T> {
    /// Add context, keeping the failure an application error
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display;

    /// Add context with lazy evaluation for expensive context creation
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C;

    /// Add context for configuration operations
    fn config_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display;

    /// Report the failure as the construction failure of `bean`
    fn creation_context<C>(self, bean: C) -> Result<T>
    where
        C: fmt::Display;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display,
    {
        self.map_err(|err| {
            Error::application(ContextError {
                message: context.to_string(),
                source: Box::new(err),
            })
        })
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|err| {
            Error::application(ContextError {
                message: f().to_string(),
                source: Box::new(err),
            })
        })
    }

    fn config_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display,
    {
        self.map_err(|err| Error::configuration_with_source(format!("{context}: {err}"), err))
    }

    fn creation_context<C>(self, bean: C) -> Result<T>
    where
        C: fmt::Display,
    {
        self.map_err(|err| Error::creation(bean.to_string(), Error::application(err)))
    }
}
