//! Injection points and annotated elements
//!
//! An [`Annotated`] element is a single tagged union over the element kinds
//! an injection point can sit on. Accessors return `None` for capabilities a
//! kind does not have (a field has no position, a type has no member name).

use crate::value_objects::annotation::Annotation;
use crate::value_objects::qualifier::QualifierSet;
use crate::value_objects::type_key::TypeKey;
use std::borrow::Cow;

/// Kind of annotated element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotatedKind {
    /// A field of the declaring type
    Field {
        /// Field name
        name: Cow<'static, str>,
    },
    /// A method (initializer, producer or observer)
    Method {
        /// Method name
        name: Cow<'static, str>,
    },
    /// A parameter of a method or constructor
    Parameter {
        /// Name of the method or constructor declaring the parameter
        callable: Cow<'static, str>,
        /// Zero-based position
        position: usize,
    },
    /// A constructor
    Constructor,
    /// The declaring type itself
    Type,
}

/// An annotated program element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotated {
    kind: AnnotatedKind,
    declaring_type: Option<TypeKey>,
    base_type: TypeKey,
    annotations: Vec<Annotation>,
}

impl Annotated {
    /// Create an annotated element
    pub fn new(kind: AnnotatedKind, base_type: TypeKey) -> Self {
        Self {
            kind,
            declaring_type: None,
            base_type,
            annotations: Vec::new(),
        }
    }

    /// Field element
    pub fn field(name: impl Into<Cow<'static, str>>, base_type: TypeKey) -> Self {
        Self::new(AnnotatedKind::Field { name: name.into() }, base_type)
    }

    /// Parameter element
    pub fn parameter(
        callable: impl Into<Cow<'static, str>>,
        position: usize,
        base_type: TypeKey,
    ) -> Self {
        Self::new(
            AnnotatedKind::Parameter {
                callable: callable.into(),
                position,
            },
            base_type,
        )
    }

    /// Set the declaring type
    pub fn declared_by(mut self, declaring_type: TypeKey) -> Self {
        self.declaring_type = Some(declaring_type);
        self
    }

    /// Attach an annotation
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Element kind
    pub fn kind(&self) -> &AnnotatedKind {
        &self.kind
    }

    /// Type of the element (field type, parameter type, return type)
    pub fn base_type(&self) -> TypeKey {
        self.base_type
    }

    /// Type declaring the element
    pub fn declaring_type(&self) -> Option<TypeKey> {
        self.declaring_type
    }

    /// Member name, when the kind has one
    pub fn member_name(&self) -> Option<&str> {
        match &self.kind {
            AnnotatedKind::Field { name } | AnnotatedKind::Method { name } => Some(name),
            AnnotatedKind::Parameter { callable, .. } => Some(callable),
            AnnotatedKind::Constructor | AnnotatedKind::Type => None,
        }
    }

    /// Parameter position, when the kind has one
    pub fn position(&self) -> Option<usize> {
        match self.kind {
            AnnotatedKind::Parameter { position, .. } => Some(position),
            _ => None,
        }
    }

    /// All annotations
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Annotation of the given type
    pub fn annotation(&self, type_name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.type_name() == type_name)
    }

    /// Whether an annotation of the given type is present
    pub fn is_annotation_present(&self, type_name: &str) -> bool {
        self.annotation(type_name).is_some()
    }
}

/// A place where a bean reference is injected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionPoint {
    required_type: TypeKey,
    qualifiers: QualifierSet,
    annotated: Annotated,
    declaring_bean: Option<String>,
    delegate: bool,
    transient: bool,
}

impl InjectionPoint {
    /// Create an injection point for an annotated element
    pub fn new(required_type: TypeKey, qualifiers: QualifierSet, annotated: Annotated) -> Self {
        Self {
            required_type,
            qualifiers,
            annotated,
            declaring_bean: None,
            delegate: false,
            transient: false,
        }
    }

    /// Set the bean class declaring the injection point
    pub fn with_declaring_bean(mut self, bean_class: impl Into<String>) -> Self {
        self.declaring_bean = Some(bean_class.into());
        self
    }

    /// Mark as a decorator delegate injection point
    pub fn as_delegate(mut self) -> Self {
        self.delegate = true;
        self
    }

    /// Mark as transient
    pub fn as_transient(mut self) -> Self {
        self.transient = true;
        self
    }

    /// Required type
    pub fn required_type(&self) -> TypeKey {
        self.required_type
    }

    /// Required qualifiers
    pub fn qualifiers(&self) -> &QualifierSet {
        &self.qualifiers
    }

    /// Annotated element
    pub fn annotated(&self) -> &Annotated {
        &self.annotated
    }

    /// Bean class declaring the injection point
    pub fn declaring_bean(&self) -> Option<&str> {
        self.declaring_bean.as_deref()
    }

    /// Whether this is a delegate injection point
    pub fn is_delegate(&self) -> bool {
        self.delegate
    }

    /// Whether this is a transient field
    pub fn is_transient(&self) -> bool {
        self.transient
    }
}
