//! Annotation values attached to methods and method parameters.
//!
//! An [`AnnotationValue`] records which annotation class was applied and the named element
//! values it carried (`@CheckReturnValue(explanation = "...")`). Method metadata stores them in
//! an [`AnnotationTable`] keyed by the annotation class descriptor, so at most one value per
//! annotation class exists for each method or parameter. A later write for the same class
//! replaces the earlier one.

use std::collections::{BTreeMap, HashMap};

use crate::metadata::descriptor::ClassDescriptor;

/// Annotation values of one method or parameter, keyed by annotation class.
pub type AnnotationTable = HashMap<ClassDescriptor, AnnotationValue>;

/// Annotation tables of all parameters of a method, keyed by parameter index.
pub type ParameterAnnotationTable = HashMap<usize, AnnotationTable>;

/// A single element value inside an annotation.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    /// `boolean` constant
    Boolean(bool),
    /// Any integral constant (`byte`, `char`, `short`, `int`, `long`)
    Int(i64),
    /// `float` or `double` constant
    Float(f64),
    /// `String` constant
    String(String),
    /// Enum constant as (enum type signature, constant name)
    Enum {
        /// Type signature of the enum, e.g. `Ljavax/annotation/meta/When;`
        type_signature: String,
        /// Name of the constant, e.g. `ALWAYS`
        constant: String,
    },
    /// Class literal, given by its type signature
    Class(String),
    /// Nested annotation
    Annotation(Box<AnnotationValue>),
    /// Array of element values
    Array(Vec<ElementValue>),
}

/// An applied annotation: its class plus its named element values.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationValue {
    annotation_class: ClassDescriptor,
    values: BTreeMap<String, ElementValue>,
}

impl AnnotationValue {
    /// Creates an annotation value without elements
    #[must_use]
    pub fn new(annotation_class: ClassDescriptor) -> Self {
        AnnotationValue {
            annotation_class,
            values: BTreeMap::new(),
        }
    }

    /// Builder-style helper adding one named element value
    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, value: ElementValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Sets a named element value, replacing an earlier one
    pub fn set_value(&mut self, name: impl Into<String>, value: ElementValue) {
        self.values.insert(name.into(), value);
    }

    /// The annotation class
    #[must_use]
    pub fn annotation_class(&self) -> &ClassDescriptor {
        &self.annotation_class
    }

    /// Looks up a named element value
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&ElementValue> {
        self.values.get(name)
    }

    /// All element values, ordered by name
    pub fn values(&self) -> impl Iterator<Item = (&str, &ElementValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Convenience accessor for enum-valued elements such as `when = When.ALWAYS`
    #[must_use]
    pub fn enum_constant(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ElementValue::Enum { constant, .. }) => Some(constant),
            _ => None,
        }
    }
}
