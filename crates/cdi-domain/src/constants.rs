//! Domain constants
//!
//! Built-in qualifier names and the priority bands used to order observers
//! and alternatives.

// ============================================================================
// BUILT-IN QUALIFIERS
// ============================================================================

/// Name of the implicit `@Default` qualifier
pub const DEFAULT_QUALIFIER: &str = "Default";

/// Name of the `@Any` qualifier carried by every bean
pub const ANY_QUALIFIER: &str = "Any";

/// Name of the `@Named` qualifier
pub const NAMED_QUALIFIER: &str = "Named";

/// Member holding the value of a `@Named` qualifier
pub const NAMED_VALUE_MEMBER: &str = "value";

// ============================================================================
// PRIORITY BANDS
// ============================================================================

/// Start of the range for early platform components
pub const PRIORITY_PLATFORM_BEFORE: i32 = 0;

/// Start of the range for early library components
pub const PRIORITY_LIBRARY_BEFORE: i32 = 1000;

/// Start of the range for application components
pub const PRIORITY_APPLICATION: i32 = 2000;

/// Start of the range for late library components
pub const PRIORITY_LIBRARY_AFTER: i32 = 3000;

/// Start of the range for late platform components
pub const PRIORITY_PLATFORM_AFTER: i32 = 4000;

/// Priority assigned to observers that do not declare one
pub const DEFAULT_OBSERVER_PRIORITY: i32 = PRIORITY_APPLICATION + 500;
