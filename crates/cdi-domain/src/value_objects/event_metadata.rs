//! Metadata describing a fired event

use crate::value_objects::injection_point::InjectionPoint;
use crate::value_objects::qualifier::QualifierSet;
use crate::value_objects::type_key::TypeKey;
use std::sync::Arc;

/// Event type, qualifiers and originating injection point of a fired event
#[derive(Debug, Clone)]
pub struct EventMetadata {
    event_type: TypeKey,
    qualifiers: QualifierSet,
    injection_point: Option<Arc<InjectionPoint>>,
}

impl EventMetadata {
    /// Create metadata; `@Any` is always part of the reported qualifiers
    pub fn new(
        event_type: TypeKey,
        qualifiers: &QualifierSet,
        injection_point: Option<Arc<InjectionPoint>>,
    ) -> Self {
        Self {
            event_type,
            qualifiers: qualifiers.canonical().with_any(),
            injection_point,
        }
    }

    /// Runtime type of the event
    pub fn event_type(&self) -> TypeKey {
        self.event_type
    }

    /// Qualifiers the event was fired with
    pub fn qualifiers(&self) -> &QualifierSet {
        &self.qualifiers
    }

    /// Injection point of the `Event` handle that fired the event
    pub fn injection_point(&self) -> Option<&InjectionPoint> {
        self.injection_point.as_deref()
    }
}
