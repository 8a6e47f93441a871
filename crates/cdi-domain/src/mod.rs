//! # Domain Layer
//!
//! Core types of the CDI runtime. Nothing in this crate performs resolution
//! or storage; it defines the vocabulary the application layer works with.
//!
//! ## Module Categories
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`value_objects`] | Type keys, annotations, qualifiers, scopes, injection points |
//! | [`entities`] | Bean definitions and contextual instances |
//! | [`events`] | Container lifecycle events |
//! | [`ports`] | Contracts for the host bean store and injection |
//! | [`error`] | Error taxonomy shared by every layer |
//! | [`constants`] | Built-in qualifier names and priority bands |

pub mod constants;
pub mod entities;
pub mod error;
pub mod events;
pub mod ports;
pub mod value_objects;

pub use entities::*;
pub use error::{Error, Result};
pub use events::*;
pub use value_objects::*;
