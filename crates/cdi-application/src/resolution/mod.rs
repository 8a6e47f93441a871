//! Bean resolution
//!
//! | Type | Description |
//! |------|-------------|
//! | [`BeanResolver`] | Matches requests against the bean store and disambiguates |
//! | [`Resolution`] | Unsatisfied, resolved or ambiguous outcome |
//! | [`Alternatives`] | Selection list enabling alternatives |

pub mod alternatives;
pub mod resolver;

pub use alternatives::Alternatives;
pub use resolver::{BeanResolver, Resolution};
