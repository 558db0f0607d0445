//! Classfile reader collaborator.
//!
//! The cache never parses bytes itself. Whatever turns classfiles into [`ParsedClass`]
//! structures (a jar scanner, a bytecode library, a test fixture) implements
//! [`ClassfileReader`] and is handed to [`crate::analysis::AnalysisCache::new`].

use dashmap::DashMap;

use crate::{
    metadata::{
        class::ParsedClass, descriptor::ClassDescriptor, registry::to_slashed_class_name,
    },
    Error, Result,
};

/// Source of parsed class structures.
pub trait ClassfileReader: Send + Sync {
    /// Reads the class `class`.
    ///
    /// # Errors
    /// Returns [`Error::MissingClass`] if the class is not on the classpath and
    /// [`Error::Malformed`] if its classfile is damaged.
    fn read_class(&self, class: &ClassDescriptor) -> Result<ParsedClass>;
}

/// Classpath held entirely in memory.
///
/// Classes are registered up front with [`InMemoryClassPath::add_class`]; a read hands out a
/// clone of the stored structure.
///
/// # Examples
///
/// ```rust
/// use jvmscope::analysis::{ClassfileReader, InMemoryClassPath};
/// use jvmscope::metadata::{class::ParsedClass, registry::DescriptorRegistry};
///
/// let classpath = InMemoryClassPath::new();
/// classpath.add_class(ParsedClass::new("com/example/Main"));
///
/// let registry = DescriptorRegistry::new();
/// let main = registry.class_descriptor("com.example.Main")?;
/// assert_eq!(classpath.read_class(&main)?.name, "com/example/Main");
/// # Ok::<(), jvmscope::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct InMemoryClassPath {
    classes: DashMap<String, ParsedClass>,
}

impl InMemoryClassPath {
    /// Creates an empty classpath
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a class, keyed by its slashed name
    pub fn add_class(&self, class: ParsedClass) {
        self.classes
            .insert(to_slashed_class_name(&class.name), class);
    }

    /// Number of classes on this classpath
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if no class was added
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ClassfileReader for InMemoryClassPath {
    fn read_class(&self, class: &ClassDescriptor) -> Result<ParsedClass> {
        self.classes
            .get(class.name())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::MissingClass(class.name().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::registry::DescriptorRegistry;

    #[test]
    fn missing_class() {
        let classpath = InMemoryClassPath::new();
        assert!(classpath.is_empty());
        classpath.add_class(ParsedClass::new("a.B"));
        assert_eq!(classpath.len(), 1);

        let registry = DescriptorRegistry::new();
        let present = registry.class_descriptor("a/B").unwrap();
        let absent = registry.class_descriptor("a/C").unwrap();
        assert!(classpath.read_class(&present).is_ok());
        assert!(matches!(
            classpath.read_class(&absent),
            Err(Error::MissingClass(name)) if name == "a/C"
        ));
    }
}
