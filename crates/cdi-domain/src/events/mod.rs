//! Container lifecycle events
//!
//! Fired by the container itself; observers subscribe to them like any other
//! event type.

pub mod lifecycle;

pub use lifecycle::{Shutdown, Startup};
