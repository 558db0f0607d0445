//! Class structure as delivered by a classfile reader, and its resolved form.
//!
//! A [`crate::analysis::ClassfileReader`] turns classfile bytes into a [`ParsedClass`]: plain
//! strings plus one [`MethodInfoBuilder`] per method. Resolving it through the
//! [`AnalysisCache`] yields a [`ClassInfo`] whose names are interned descriptors and whose
//! methods are built [`MethodInfo`]s registered in the cache's method table.

use std::sync::Arc;

use bitflags::bitflags;

use crate::{
    analysis::{AnalysisCache, ClassAnalysis},
    metadata::{
        descriptor::{ClassDescriptor, FieldDescriptor, MethodDescriptor},
        method::{MethodAccessFlags, MethodInfo, MethodInfoBuilder},
        registry::to_slashed_class_name,
    },
    Result,
};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Class access and property flags
    pub struct ClassAccessFlags: u32 {
        /// Declared `public`
        const PUBLIC = 0x0001;
        /// Declared `final`
        const FINAL = 0x0010;
        /// Uses `invokespecial` semantics for superclass calls
        const SUPER = 0x0020;
        /// Is an interface
        const INTERFACE = 0x0200;
        /// Declared `abstract`
        const ABSTRACT = 0x0400;
        /// Not present in the source code
        const SYNTHETIC = 0x1000;
        /// Is an annotation interface
        const ANNOTATION = 0x2000;
        /// Is an enum
        const ENUM = 0x4000;
        /// Is a module descriptor
        const MODULE = 0x8000;
    }
}

/// A field as delivered by the classfile reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedField {
    /// Field name
    pub name: String,
    /// Field type signature
    pub signature: String,
    /// Declared `static`
    pub is_static: bool,
}

/// Unresolved class structure produced by a classfile reader.
#[derive(Debug, Clone)]
pub struct ParsedClass {
    /// Class name, slashed or dotted
    pub name: String,
    /// Superclass name; `None` only for `java/lang/Object` and module descriptors
    pub superclass: Option<String>,
    /// Directly implemented interfaces
    pub interfaces: Vec<String>,
    /// Class access flags
    pub access_flags: ClassAccessFlags,
    /// Value of the `SourceFile` attribute
    pub source_file: Option<String>,
    /// One builder per declared method
    pub methods: Vec<MethodInfoBuilder>,
    /// Declared fields
    pub fields: Vec<ParsedField>,
}

impl ParsedClass {
    /// Creates a public class extending `java/lang/Object` without members
    #[must_use]
    pub fn new(name: &str) -> Self {
        ParsedClass {
            name: name.to_string(),
            superclass: Some("java/lang/Object".to_string()),
            interfaces: Vec::new(),
            access_flags: ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
            source_file: None,
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Replaces the superclass
    #[must_use]
    pub fn with_superclass(mut self, superclass: Option<&str>) -> Self {
        self.superclass = superclass.map(str::to_string);
        self
    }

    /// Adds a directly implemented interface
    #[must_use]
    pub fn with_interface(mut self, interface: &str) -> Self {
        self.interfaces.push(interface.to_string());
        self
    }

    /// Replaces the access flags
    #[must_use]
    pub fn with_access_flags(mut self, flags: ClassAccessFlags) -> Self {
        self.access_flags = flags;
        self
    }

    /// Sets the source file name
    #[must_use]
    pub fn with_source_file(mut self, source_file: &str) -> Self {
        self.source_file = Some(source_file.to_string());
        self
    }

    /// Adds a method
    #[must_use]
    pub fn with_method(mut self, method: MethodInfoBuilder) -> Self {
        self.methods.push(method);
        self
    }

    /// Adds a field
    #[must_use]
    pub fn with_field(mut self, name: &str, signature: &str, is_static: bool) -> Self {
        self.fields.push(ParsedField {
            name: name.to_string(),
            signature: signature.to_string(),
            is_static,
        });
        self
    }
}

/// Resolved class: interned names and built methods.
#[derive(Debug)]
pub struct ClassInfo {
    descriptor: ClassDescriptor,
    superclass: Option<ClassDescriptor>,
    interfaces: Vec<ClassDescriptor>,
    access_flags: ClassAccessFlags,
    source_file: Option<Arc<str>>,
    methods: Vec<Arc<MethodInfo>>,
    fields: Vec<FieldDescriptor>,
}

impl ClassInfo {
    /// Resolves `parsed` as the class `descriptor`.
    ///
    /// Every method is built against the cache's registry and indices and stored in the cache's
    /// method table; the `ClassInfo` holds the instances the table kept. If any method fails,
    /// no method of the class is registered.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the parsed class or one of its methods declares a
    /// different class name, and [`crate::Error::InvalidDescriptor`] for invalid member names.
    pub fn resolve(
        cache: &AnalysisCache,
        descriptor: &ClassDescriptor,
        parsed: ParsedClass,
    ) -> Result<Self> {
        if to_slashed_class_name(&parsed.name) != descriptor.name() {
            return Err(malformed_error!(
                "classfile for {} declares class {}",
                descriptor,
                parsed.name
            ));
        }

        let registry = cache.registry();
        let superclass = parsed
            .superclass
            .as_deref()
            .map(|name| registry.class_descriptor(name))
            .transpose()?;
        let interfaces = parsed
            .interfaces
            .iter()
            .map(|name| registry.class_descriptor(name))
            .collect::<Result<Vec<_>>>()?;
        let fields = parsed
            .fields
            .iter()
            .map(|field| {
                registry.field_descriptor(
                    descriptor.name(),
                    &field.name,
                    &field.signature,
                    field.is_static,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let mut prepared = Vec::with_capacity(parsed.methods.len());
        for builder in parsed.methods {
            if to_slashed_class_name(builder.class_name()) != descriptor.name() {
                return Err(malformed_error!(
                    "method {}{} of {} is declared in {}",
                    builder.method_name(),
                    builder.method_signature(),
                    descriptor,
                    builder.class_name()
                ));
            }
            prepared.push(builder.prepare(registry, cache.indices())?);
        }

        // Nothing reaches the indices or the method table unless every method built
        let methods = prepared
            .into_iter()
            .map(|method| cache.register_method(method.register()))
            .collect();

        Ok(ClassInfo {
            descriptor: descriptor.clone(),
            superclass,
            interfaces,
            access_flags: parsed.access_flags,
            source_file: parsed
                .source_file
                .as_deref()
                .map(|file| registry.canonicalize_string(file)),
            methods,
            fields,
        })
    }

    /// The class descriptor
    #[must_use]
    pub fn descriptor(&self) -> &ClassDescriptor {
        &self.descriptor
    }

    /// Direct superclass
    #[must_use]
    pub fn superclass(&self) -> Option<&ClassDescriptor> {
        self.superclass.as_ref()
    }

    /// Directly implemented interfaces
    #[must_use]
    pub fn interfaces(&self) -> &[ClassDescriptor] {
        &self.interfaces
    }

    /// Class access flags
    #[must_use]
    pub fn access_flags(&self) -> ClassAccessFlags {
        self.access_flags
    }

    /// Returns `true` for interfaces and annotation interfaces
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.access_flags.contains(ClassAccessFlags::INTERFACE)
    }

    /// Source file name
    #[must_use]
    pub fn source_file(&self) -> Option<&str> {
        self.source_file.as_deref()
    }

    /// Declared methods
    #[must_use]
    pub fn methods(&self) -> &[Arc<MethodInfo>] {
        &self.methods
    }

    /// Declared fields
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Finds a declared method by name and signature
    #[must_use]
    pub fn find_method(&self, name: &str, signature: &str) -> Option<&Arc<MethodInfo>> {
        self.methods
            .iter()
            .find(|method| method.name() == name && method.signature() == signature)
    }

    /// Finds a declared method by descriptor
    #[must_use]
    pub fn method(&self, descriptor: &MethodDescriptor) -> Option<&Arc<MethodInfo>> {
        self.methods
            .iter()
            .find(|method| method.descriptor() == descriptor)
    }

    /// Number of methods with a body
    #[must_use]
    pub fn concrete_method_count(&self) -> usize {
        self.methods
            .iter()
            .filter(|method| {
                !method
                    .access_flags()
                    .intersects(MethodAccessFlags::ABSTRACT | MethodAccessFlags::NATIVE)
            })
            .count()
    }
}

impl ClassAnalysis for ClassInfo {
    fn analyze(cache: &AnalysisCache, class: &ClassDescriptor) -> Result<Self> {
        let parsed = cache.reader().read_class(class)?;
        ClassInfo::resolve(cache, class, parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::{AnalysisConfig, InMemoryClassPath},
        Error,
    };

    fn cache_with(classes: Vec<ParsedClass>) -> AnalysisCache {
        let classpath = InMemoryClassPath::new();
        for class in classes {
            classpath.add_class(class);
        }
        AnalysisCache::new(Arc::new(classpath), AnalysisConfig::default())
    }

    #[test]
    fn resolves_members_and_registers_methods() {
        let parsed = ParsedClass::new("com/example/Widget")
            .with_interface("java/lang/Runnable")
            .with_source_file("Widget.java")
            .with_field("count", "I", false)
            .with_method(MethodInfoBuilder::new(
                "com/example/Widget",
                "run",
                "()V",
                MethodAccessFlags::PUBLIC,
            ))
            .with_method(MethodInfoBuilder::new(
                "com/example/Widget",
                "size",
                "()I",
                MethodAccessFlags::PUBLIC | MethodAccessFlags::ABSTRACT,
            ));
        let cache = cache_with(vec![parsed]);
        let class = cache.registry().class_descriptor("com/example/Widget").unwrap();

        let info = cache.get_class_analysis::<ClassInfo>(&class).unwrap();
        assert_eq!(info.descriptor(), &class);
        assert_eq!(info.superclass().map(ClassDescriptor::name), Some("java/lang/Object"));
        assert_eq!(info.interfaces()[0].name(), "java/lang/Runnable");
        assert_eq!(info.source_file(), Some("Widget.java"));
        assert_eq!(info.fields()[0].name(), "count");
        assert!(!info.is_interface());
        assert_eq!(info.concrete_method_count(), 1);

        let run = info.find_method("run", "()V").unwrap();
        let cached = cache.method_info(run.descriptor()).unwrap();
        assert!(Arc::ptr_eq(run, &cached));
        assert!(info.method(run.descriptor()).is_some());
    }

    #[test]
    fn mismatched_names_are_malformed() {
        let parsed = ParsedClass::new("a/Other");
        let cache = cache_with(vec![]);
        let class = cache.registry().class_descriptor("a/Expected").unwrap();

        let result = ClassInfo::resolve(&cache, &class, parsed);
        assert!(matches!(result, Err(Error::Malformed { .. })));

        let stray = ParsedClass::new("a/Expected").with_method(MethodInfoBuilder::new(
            "a/Elsewhere",
            "m",
            "()V",
            MethodAccessFlags::empty(),
        ));
        let result = ClassInfo::resolve(&cache, &class, stray);
        assert!(matches!(result, Err(Error::Malformed { .. })));
    }

    #[test]
    fn failed_class_registers_no_methods() {
        let mut fail = MethodInfoBuilder::new("a/Broken", "fail", "()V", MethodAccessFlags::STATIC);
        fail.set_is_unconditional_thrower();
        let parsed = ParsedClass::new("a/Broken")
            .with_method(fail)
            .with_method(MethodInfoBuilder::new(
                "a/Broken",
                "bad.name",
                "()V",
                MethodAccessFlags::PUBLIC,
            ));
        let cache = cache_with(vec![parsed]);
        let class = cache.registry().class_descriptor("a/Broken").unwrap();

        let result = cache.get_class_analysis::<ClassInfo>(&class);
        assert!(matches!(result, Err(Error::ClassUnavailable { .. })));
        assert!(cache.indices().is_empty());
        assert!(cache.all_methods().is_empty());
    }
}
