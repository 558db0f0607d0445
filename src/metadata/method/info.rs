//! Immutable method metadata with a copy-on-write annotation overlay.
//!
//! A [`MethodInfo`] is produced once per method by
//! [`crate::metadata::method::MethodInfoBuilder::build`] and shared as `Arc<MethodInfo>` for the
//! rest of the run. All of its fields are fixed at build time with two exceptions: method and
//! parameter annotations can still be added afterwards (for example when a database applies
//! default annotations). Those tables are swapped copy-on-write, so a snapshot taken earlier
//! never changes.
//!
//! Facts that live outside the object (unconditional thrower, unsupported, identity, access
//! method redirection) are answered by the run's
//! [`crate::metadata::indices::AuxiliaryIndices`]; bridge links are answered by the
//! [`crate::analysis::AnalysisContext`].

use std::{
    cmp::Ordering,
    fmt,
    sync::{Arc, RwLock},
};

use crate::{
    analysis::{AnalysisCache, AnalysisContext},
    metadata::{
        annotation::{AnnotationTable, AnnotationValue, ParameterAnnotationTable},
        class::ClassInfo,
        descriptor::{ClassDescriptor, FieldDescriptor, MethodDescriptor},
        indices::AuxiliaryIndices,
        method::{
            builder::TRACKED_PARAMETERS,
            types::{ElementType, MethodAccessFlags},
        },
        signature::SignatureParser,
    },
};

/// Metadata of one resolved method.
pub struct MethodInfo {
    pub(super) descriptor: MethodDescriptor,
    pub(super) access_flags: MethodAccessFlags,
    pub(super) source_signature: Option<Arc<str>>,
    pub(super) exceptions: Vec<Arc<str>>,
    pub(super) annotations: RwLock<Arc<AnnotationTable>>,
    pub(super) parameter_annotations: RwLock<Arc<ParameterAnnotationTable>>,
    pub(super) variable_is_synthetic: u64,
    pub(super) method_call_count: u32,
    pub(super) uses_concurrency: bool,
    pub(super) has_back_branch: bool,
    pub(super) is_stub: bool,
    pub(super) indices: Arc<AuxiliaryIndices>,
}

impl MethodInfo {
    /// The canonical descriptor of this method
    #[must_use]
    pub fn descriptor(&self) -> &MethodDescriptor {
        &self.descriptor
    }

    /// Method name
    #[must_use]
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Erased JVM signature
    #[must_use]
    pub fn signature(&self) -> &str {
        self.descriptor.signature()
    }

    /// Raw access flags
    #[must_use]
    pub fn access_flags(&self) -> MethodAccessFlags {
        self.access_flags
    }

    fn check_flag(&self, flag: MethodAccessFlags) -> bool {
        self.access_flags.contains(flag)
    }

    /// Returns `true` for `native` methods
    #[must_use]
    pub fn is_native(&self) -> bool {
        self.check_flag(MethodAccessFlags::NATIVE)
    }

    /// Returns `true` for `abstract` methods
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.check_flag(MethodAccessFlags::ABSTRACT)
    }

    /// Returns `true` for `synchronized` methods
    #[must_use]
    pub fn is_synchronized(&self) -> bool {
        self.check_flag(MethodAccessFlags::SYNCHRONIZED)
    }

    /// Returns `true` for `final` methods
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.check_flag(MethodAccessFlags::FINAL)
    }

    /// Returns `true` for `private` methods
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.check_flag(MethodAccessFlags::PRIVATE)
    }

    /// Returns `true` for `protected` methods
    #[must_use]
    pub fn is_protected(&self) -> bool {
        self.check_flag(MethodAccessFlags::PROTECTED)
    }

    /// Returns `true` for `public` methods
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.check_flag(MethodAccessFlags::PUBLIC)
    }

    /// Returns `true` for `static` methods
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.check_flag(MethodAccessFlags::STATIC)
    }

    /// Returns `true` for compiler-generated methods
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.check_flag(MethodAccessFlags::SYNTHETIC)
    }

    /// Returns `true` for methods marked deprecated
    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.check_flag(MethodAccessFlags::DEPRECATED)
    }

    /// Returns `true` for varargs methods
    #[must_use]
    pub fn is_var_args(&self) -> bool {
        self.check_flag(MethodAccessFlags::VARARGS)
    }

    /// Returns `true` for bridge methods
    #[must_use]
    pub fn is_bridge(&self) -> bool {
        self.check_flag(MethodAccessFlags::BRIDGE)
    }

    /// Always `true`: a `MethodInfo` only exists for methods whose class was read
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        true
    }

    /// Declared thrown exceptions (slashed class names)
    #[must_use]
    pub fn thrown_exceptions(&self) -> &[Arc<str>] {
        &self.exceptions
    }

    /// Generic source signature, if the class carried one
    #[must_use]
    pub fn source_signature(&self) -> Option<&str> {
        self.source_signature.as_deref()
    }

    /// Number of declared parameters, parsed from the signature
    #[must_use]
    pub fn num_params(&self) -> usize {
        SignatureParser::new(self.signature()).map_or(0, |parser| parser.num_parameters())
    }

    /// Returns `true` if the method returns an object or array
    #[must_use]
    pub fn is_return_type_reference_type(&self) -> bool {
        SignatureParser::new(self.signature()).is_ok_and(|parser| parser.returns_reference())
    }

    /// Returns `true` if parameter `param` is synthetic.
    ///
    /// Always `false` for indices of 64 and above, which are not tracked.
    #[must_use]
    pub fn is_variable_synthetic(&self, param: usize) -> bool {
        param < TRACKED_PARAMETERS && (self.variable_is_synthetic & (1u64 << param)) != 0
    }

    /// Number of call instructions in the method body
    #[must_use]
    pub fn method_call_count(&self) -> u32 {
        self.method_call_count
    }

    /// Returns `true` if the method uses `java.util.concurrent`
    #[must_use]
    pub fn uses_concurrency(&self) -> bool {
        self.uses_concurrency
    }

    /// Returns `true` if the method body contains a backward branch
    #[must_use]
    pub fn has_back_branch(&self) -> bool {
        self.has_back_branch
    }

    /// Returns `true` for generated stubs
    #[must_use]
    pub fn is_stub(&self) -> bool {
        self.is_stub
    }

    /// The declaring class
    #[must_use]
    pub fn class_descriptor(&self) -> &ClassDescriptor {
        self.descriptor.class()
    }

    /// Declaring class in dotted form
    #[must_use]
    pub fn class_name(&self) -> String {
        self.descriptor.class().dotted_name()
    }

    /// Package of the declaring class in dotted form
    #[must_use]
    pub fn package_name(&self) -> String {
        self.descriptor.class().package_name()
    }

    /// Constructor or method
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        if self.name() == "<init>" {
            ElementType::Constructor
        } else {
            ElementType::Method
        }
    }

    /// Returns `true` if the method always throws
    #[must_use]
    pub fn is_unconditional_thrower(&self) -> bool {
        self.indices.is_unconditional_thrower(self.descriptor.id())
    }

    /// Returns `true` if the method only throws `UnsupportedOperationException`
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        self.indices.is_unsupported(self.descriptor.id())
    }

    /// Returns `true` if the method returns one of its parameters unchanged
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.indices.is_identity(self.descriptor.id())
    }

    /// The method this access method forwards to
    #[must_use]
    pub fn access_method_for_method(&self) -> Option<MethodDescriptor> {
        self.indices.access_method_for_method(self.descriptor.id())
    }

    /// The field this access method reads or writes
    #[must_use]
    pub fn access_method_for_field(&self) -> Option<FieldDescriptor> {
        self.indices.access_method_for_field(self.descriptor.id())
    }

    /// The forwarding target for access methods, otherwise this method's own descriptor
    #[must_use]
    pub fn resolve_access_method_for_method(&self) -> MethodDescriptor {
        self.access_method_for_method()
            .unwrap_or_else(|| self.descriptor.clone())
    }

    /// The method this bridge method forwards to, if the context knows one
    pub fn bridge_to<C: AnalysisContext + ?Sized>(&self, context: &C) -> Option<Arc<MethodInfo>> {
        context.bridge_to(&self.descriptor)
    }

    /// The bridge method that forwards to this method, if the context knows one
    pub fn bridge_from<C: AnalysisContext + ?Sized>(&self, context: &C) -> Option<Arc<MethodInfo>> {
        context.bridge_from(&self.descriptor)
    }

    /// The declaring class, resolved through the cache; `None` if it cannot be read
    #[must_use]
    pub fn containing_class(&self, cache: &AnalysisCache) -> Option<Arc<ClassInfo>> {
        cache
            .get_class_analysis::<ClassInfo>(self.descriptor.class())
            .ok()
    }

    /// Snapshot of the method annotation table
    #[must_use]
    pub fn annotation_table(&self) -> Arc<AnnotationTable> {
        snapshot!(self.annotations)
    }

    /// Snapshot of all parameter annotation tables
    #[must_use]
    pub fn parameter_annotation_table(&self) -> Arc<ParameterAnnotationTable> {
        snapshot!(self.parameter_annotations)
    }

    /// The method annotation of class `annotation`
    #[must_use]
    pub fn annotation(&self, annotation: &ClassDescriptor) -> Option<AnnotationValue> {
        read_lock!(self.annotations).get(annotation).cloned()
    }

    /// Classes of all method annotations
    #[must_use]
    pub fn annotation_descriptors(&self) -> Vec<ClassDescriptor> {
        read_lock!(self.annotations).keys().cloned().collect()
    }

    /// All method annotations
    #[must_use]
    pub fn annotations(&self) -> Vec<AnnotationValue> {
        read_lock!(self.annotations).values().cloned().collect()
    }

    /// The annotation of class `annotation` on parameter `param`
    #[must_use]
    pub fn parameter_annotation(
        &self,
        param: usize,
        annotation: &ClassDescriptor,
    ) -> Option<AnnotationValue> {
        read_lock!(self.parameter_annotations)
            .get(&param)
            .and_then(|table| table.get(annotation))
            .cloned()
    }

    /// Classes of all annotations on parameter `param`
    #[must_use]
    pub fn parameter_annotation_descriptors(&self, param: usize) -> Vec<ClassDescriptor> {
        read_lock!(self.parameter_annotations)
            .get(&param)
            .map(|table| table.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// All annotations on parameter `param`
    #[must_use]
    pub fn parameter_annotations(&self, param: usize) -> Vec<AnnotationValue> {
        read_lock!(self.parameter_annotations)
            .get(&param)
            .map(|table| table.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Adds or replaces a method annotation after the method was built.
    ///
    /// The table is replaced copy-on-write; earlier snapshots keep the old content. Annotation
    /// listeners of the run are notified afterwards. Conclusions other components derived from
    /// the previous annotations are not recomputed.
    pub fn add_annotation(&self, value: AnnotationValue) {
        {
            let mut table = write_lock!(self.annotations);
            Arc::make_mut(&mut table).insert(value.annotation_class().clone(), value);
        }
        self.indices.notify_annotations_updated(self);
    }

    /// Adds or replaces an annotation of parameter `param` after the method was built.
    ///
    /// Same copy-on-write and notification behaviour as [`MethodInfo::add_annotation`].
    pub fn add_parameter_annotation(&self, param: usize, value: AnnotationValue) {
        {
            let mut table = write_lock!(self.parameter_annotations);
            Arc::make_mut(&mut table)
                .entry(param)
                .or_default()
                .insert(value.annotation_class().clone(), value);
        }
        self.indices.notify_annotations_updated(self);
    }
}

impl PartialEq for MethodInfo {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MethodInfo {}

impl PartialOrd for MethodInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MethodInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.descriptor
            .cmp(&other.descriptor)
            .then_with(|| self.access_flags.bits().cmp(&other.access_flags.bits()))
            .then_with(|| self.source_signature.cmp(&other.source_signature))
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("descriptor", &self.descriptor)
            .field("access_flags", &self.access_flags)
            .field("source_signature", &self.source_signature)
            .field("exceptions", &self.exceptions)
            .field("variable_is_synthetic", &self.variable_is_synthetic)
            .field("method_call_count", &self.method_call_count)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.descriptor.fmt(f)
    }
}
