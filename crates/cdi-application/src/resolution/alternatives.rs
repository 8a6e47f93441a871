//! Alternative selection
//!
//! Alternatives are enabled by listing their fully qualified type names, or
//! patterns over them, in the container's selection list. Path separators
//! `::` and `.` are interchangeable; `*` matches within one path segment and
//! `**` across segments.

use cdi_domain::error::{Error, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Compiled selection list
#[derive(Debug, Clone)]
pub struct Alternatives {
    patterns: Vec<String>,
    set: GlobSet,
}

impl Alternatives {
    /// Selection list that enables no alternative
    pub fn none() -> Self {
        Self {
            patterns: Vec::new(),
            set: GlobSet::empty(),
        }
    }

    /// Compile a list of patterns
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut kept = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() {
                continue;
            }
            let glob = GlobBuilder::new(&normalize(pattern))
                .literal_separator(true)
                .build()
                .map_err(|e| {
                    Error::configuration_with_source(
                        format!("Invalid alternative selection pattern '{pattern}'"),
                        e,
                    )
                })?;
            builder.add(glob);
            kept.push(pattern.to_string());
        }
        let set = builder.build().map_err(|e| {
            Error::configuration_with_source("Failed to compile alternative selection", e)
        })?;
        Ok(Self {
            patterns: kept,
            set,
        })
    }

    /// Compile a comma-separated list
    pub fn parse(list: &str) -> Result<Self> {
        Self::new(list.split(','))
    }

    /// Whether a bean class is selected
    pub fn is_selected(&self, type_name: &str) -> bool {
        !self.patterns.is_empty() && self.set.is_match(normalize(type_name))
    }

    /// Patterns as given
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for Alternatives {
    fn default() -> Self {
        Self::none()
    }
}

fn normalize(path: &str) -> String {
    path.replace("::", "/").replace('.', "/")
}
