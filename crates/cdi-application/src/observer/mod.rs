//! Observers
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ObserverMethod`] | One observer: observed type, qualifiers, flags and callback |
//! | [`ObserverInvocation`] | Arguments available to a notified observer |
//! | [`ObserverRegistry`] | Frozen, priority-ordered observer table |

pub mod method;
pub mod registry;

pub use method::{
    ObserverId, ObserverInvocation, ObserverMethod, ObserverMethodBuilder, Parameters, Reception,
    TransactionPhase,
};
pub use registry::{ObserverRegistry, ObserverRegistryBuilder};
