//! Mutable accumulator for method metadata.
//!
//! A classfile scanner creates one [`MethodInfoBuilder`] per visited method, feeds it every fact
//! it discovers and finally calls [`MethodInfoBuilder::build`]. Building is the only step that
//! touches shared state: it interns the descriptors, produces the immutable [`MethodInfo`] and
//! records the cross-cutting facts into the run's [`AuxiliaryIndices`].
//!
//! # Parameter Tracking
//!
//! Whether a parameter has a name in the `LocalVariableTable` and whether it is synthetic is
//! tracked in two 64-bit masks. Parameters beyond index 63 are not tracked; setting their bits
//! is a no-op apart from a debug log line.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use jvmscope::metadata::{
//!     indices::AuxiliaryIndices,
//!     method::{MethodAccessFlags, MethodInfoBuilder},
//!     registry::DescriptorRegistry,
//! };
//!
//! let registry = DescriptorRegistry::new();
//! let indices = Arc::new(AuxiliaryIndices::new());
//!
//! let mut builder = MethodInfoBuilder::new("com/example/Util", "fail", "(Ljava/lang/String;)V", MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC);
//! builder.set_is_unconditional_thrower();
//! builder.set_variable_has_name(0);
//!
//! let method = builder.build(&registry, &indices)?;
//! assert!(method.is_unconditional_thrower());
//! assert!(method.is_static());
//! # Ok::<(), jvmscope::Error>(())
//! ```

use std::sync::{Arc, RwLock};

use crate::{
    metadata::{
        annotation::{AnnotationTable, AnnotationValue, ParameterAnnotationTable},
        descriptor::{FieldDescriptor, MethodDescriptor},
        indices::AuxiliaryIndices,
        method::{info::MethodInfo, types::MethodAccessFlags},
        registry::DescriptorRegistry,
    },
    Result,
};

/// Number of parameters covered by the has-name / synthetic masks
pub const TRACKED_PARAMETERS: usize = 64;

/// Raw reference to the member an access method stands in for
#[derive(Debug, Clone, PartialEq, Eq)]
struct MemberRef {
    owner: String,
    name: String,
    signature: String,
    is_static: bool,
}

impl MemberRef {
    fn new(owner: &str, name: &str, signature: &str, is_static: bool) -> Self {
        MemberRef {
            owner: owner.to_string(),
            name: name.to_string(),
            signature: signature.to_string(),
            is_static,
        }
    }
}

/// Per-method accumulator, finalized by [`MethodInfoBuilder::build`].
#[derive(Debug, Clone)]
pub struct MethodInfoBuilder {
    class_name: String,
    method_name: String,
    method_signature: String,
    access_flags: MethodAccessFlags,
    source_signature: Option<String>,
    exceptions: Vec<String>,
    variable_has_name: u64,
    variable_is_synthetic: u64,
    is_unconditional_thrower: bool,
    is_unsupported: bool,
    uses_concurrency: bool,
    is_stub: bool,
    has_back_branch: bool,
    is_identity: bool,
    method_call_count: u32,
    access_method_for_method: Option<MemberRef>,
    access_method_for_field: Option<MemberRef>,
    annotations: AnnotationTable,
    parameter_annotations: ParameterAnnotationTable,
}

impl MethodInfoBuilder {
    /// Starts a builder for the method `class_name.method_name method_signature`.
    ///
    /// ## Arguments
    /// * `class_name` - Declaring class, slashed or dotted
    /// * `method_name` - Method name, `<init>` / `<clinit>` included
    /// * `method_signature` - Erased JVM method signature
    /// * `access_flags` - Initial access flags
    #[must_use]
    pub fn new(
        class_name: &str,
        method_name: &str,
        method_signature: &str,
        access_flags: MethodAccessFlags,
    ) -> Self {
        MethodInfoBuilder {
            class_name: class_name.to_string(),
            method_name: method_name.to_string(),
            method_signature: method_signature.to_string(),
            access_flags,
            source_signature: None,
            exceptions: Vec::new(),
            variable_has_name: 0,
            variable_is_synthetic: 0,
            is_unconditional_thrower: false,
            is_unsupported: false,
            uses_concurrency: false,
            is_stub: false,
            has_back_branch: false,
            is_identity: false,
            method_call_count: 0,
            access_method_for_method: None,
            access_method_for_field: None,
            annotations: AnnotationTable::new(),
            parameter_annotations: ParameterAnnotationTable::new(),
        }
    }

    /// Replaces the access flags
    pub fn set_access_flags(&mut self, flags: MethodAccessFlags) -> &mut Self {
        self.access_flags = flags;
        self
    }

    /// Merges additional access flags into the current ones
    pub fn add_access_flags(&mut self, flags: MethodAccessFlags) -> &mut Self {
        self.access_flags |= flags;
        self
    }

    /// Sets the generic source signature from the `Signature` attribute
    pub fn set_source_signature(&mut self, signature: &str) -> &mut Self {
        self.source_signature = Some(signature.to_string());
        self
    }

    /// Sets the declared thrown exceptions (slashed class names)
    pub fn set_thrown_exceptions<I, S>(&mut self, exceptions: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exceptions = exceptions.into_iter().map(Into::into).collect();
        self
    }

    /// Records that parameter `p` has a name in the local variable table
    pub fn set_variable_has_name(&mut self, p: usize) -> &mut Self {
        if p < TRACKED_PARAMETERS {
            self.variable_has_name |= 1u64 << p;
        } else {
            log::debug!(
                "{}.{}{}: parameter {} is beyond the tracked range, has-name bit dropped",
                self.class_name,
                self.method_name,
                self.method_signature,
                p
            );
        }
        self
    }

    /// Records that parameter `p` is synthetic
    pub fn set_variable_is_synthetic(&mut self, p: usize) -> &mut Self {
        if p < TRACKED_PARAMETERS {
            self.variable_is_synthetic |= 1u64 << p;
        } else {
            log::debug!(
                "{}.{}{}: parameter {} is beyond the tracked range, synthetic bit dropped",
                self.class_name,
                self.method_name,
                self.method_signature,
                p
            );
        }
        self
    }

    /// Marks the method as always throwing
    pub fn set_is_unconditional_thrower(&mut self) -> &mut Self {
        self.is_unconditional_thrower = true;
        self
    }

    /// Marks the method as an unsupported-operation stub
    pub fn set_unsupported(&mut self) -> &mut Self {
        self.is_unsupported = true;
        self
    }

    /// Marks the method as using `java.util.concurrent`
    pub fn set_uses_concurrency(&mut self) -> &mut Self {
        self.uses_concurrency = true;
        self
    }

    /// Marks the method as a generated stub
    pub fn set_is_stub(&mut self) -> &mut Self {
        self.is_stub = true;
        self
    }

    /// Marks the method as containing a backward branch
    pub fn set_has_back_branch(&mut self) -> &mut Self {
        self.has_back_branch = true;
        self
    }

    /// Marks the method as an identity method.
    ///
    /// Ignored when parameter 0 already carries an annotation: an annotated parameter is not a
    /// plain pass-through.
    pub fn set_is_identity(&mut self) -> &mut Self {
        if !self.parameter_annotations.contains_key(&0) {
            self.is_identity = true;
        }
        self
    }

    /// Sets the number of call instructions in the method body
    pub fn set_number_method_calls(&mut self, count: u32) -> &mut Self {
        self.method_call_count = count;
        self
    }

    /// Records that this method is an access method for the given method
    pub fn set_access_method_for_method(
        &mut self,
        owner: &str,
        name: &str,
        signature: &str,
        is_static: bool,
    ) -> &mut Self {
        self.access_method_for_method = Some(MemberRef::new(owner, name, signature, is_static));
        self
    }

    /// Records that this method is an access method for the given field
    pub fn set_access_method_for_field(
        &mut self,
        owner: &str,
        name: &str,
        signature: &str,
        is_static: bool,
    ) -> &mut Self {
        self.access_method_for_field = Some(MemberRef::new(owner, name, signature, is_static));
        self
    }

    /// Adds a method annotation, replacing an earlier one of the same class
    pub fn add_annotation(&mut self, value: AnnotationValue) -> &mut Self {
        self.annotations
            .insert(value.annotation_class().clone(), value);
        self
    }

    /// Adds an annotation to parameter `parameter`, replacing an earlier one of the same class
    pub fn add_parameter_annotation(&mut self, parameter: usize, value: AnnotationValue) -> &mut Self {
        self.parameter_annotations
            .entry(parameter)
            .or_default()
            .insert(value.annotation_class().clone(), value);
        self
    }

    /// Slashed or dotted name of the declaring class, as given to [`MethodInfoBuilder::new`]
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Method name
    #[must_use]
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// Erased method signature
    #[must_use]
    pub fn method_signature(&self) -> &str {
        &self.method_signature
    }

    /// Finalizes the method.
    ///
    /// The synthetic mask of the result is the explicit synthetic bits plus every parameter
    /// without a name, provided at least one parameter had a name. Any unconditional-thrower,
    /// unsupported, identity or access-method fact is registered into `indices`.
    ///
    /// # Arguments
    /// * `registry` - Registry used to intern the method, its strings and redirection targets
    /// * `indices` - Fact tables of the current run; shared with the resulting [`MethodInfo`]
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidDescriptor`] if the method or a redirection target has an
    /// invalid name or signature. Nothing is registered in that case.
    pub fn build(
        self,
        registry: &DescriptorRegistry,
        indices: &Arc<AuxiliaryIndices>,
    ) -> Result<Arc<MethodInfo>> {
        Ok(self.prepare(registry, indices)?.register())
    }

    /// Interns and validates everything without touching `indices`.
    ///
    /// The facts are recorded by [`PreparedMethod::register`], which cannot fail.
    pub(crate) fn prepare(
        self,
        registry: &DescriptorRegistry,
        indices: &Arc<AuxiliaryIndices>,
    ) -> Result<PreparedMethod> {
        let descriptor = registry.method_descriptor(
            &self.class_name,
            &self.method_name,
            &self.method_signature,
            self.access_flags.contains(MethodAccessFlags::STATIC),
        )?;

        let access_method_for_method = self
            .access_method_for_method
            .as_ref()
            .map(|target| {
                registry.method_descriptor(
                    &target.owner,
                    &target.name,
                    &target.signature,
                    target.is_static,
                )
            })
            .transpose()?;
        let access_method_for_field = self
            .access_method_for_field
            .as_ref()
            .map(|target| {
                registry.field_descriptor(
                    &target.owner,
                    &target.name,
                    &target.signature,
                    target.is_static,
                )
            })
            .transpose()?;

        let mut variable_is_synthetic = self.variable_is_synthetic;
        if self.variable_has_name != 0 {
            variable_is_synthetic |= !self.variable_has_name;
        }

        let exceptions = self
            .exceptions
            .iter()
            .map(|exception| registry.canonicalize_string(exception))
            .collect();
        let source_signature = self
            .source_signature
            .as_deref()
            .map(|signature| registry.canonicalize_string(signature));

        let method = Arc::new(MethodInfo {
            descriptor,
            access_flags: self.access_flags,
            source_signature,
            exceptions,
            annotations: RwLock::new(Arc::new(self.annotations)),
            parameter_annotations: RwLock::new(Arc::new(self.parameter_annotations)),
            variable_is_synthetic,
            method_call_count: self.method_call_count,
            uses_concurrency: self.uses_concurrency,
            has_back_branch: self.has_back_branch,
            is_stub: self.is_stub,
            indices: Arc::clone(indices),
        });

        Ok(PreparedMethod {
            method,
            is_unconditional_thrower: self.is_unconditional_thrower,
            is_unsupported: self.is_unsupported,
            is_identity: self.is_identity,
            access_method_for_method,
            access_method_for_field,
        })
    }
}

/// A built method whose facts are not yet in the indices
pub(crate) struct PreparedMethod {
    method: Arc<MethodInfo>,
    is_unconditional_thrower: bool,
    is_unsupported: bool,
    is_identity: bool,
    access_method_for_method: Option<MethodDescriptor>,
    access_method_for_field: Option<FieldDescriptor>,
}

impl PreparedMethod {
    /// Records the method's facts in the indices it was prepared against
    pub(crate) fn register(self) -> Arc<MethodInfo> {
        let indices = &self.method.indices;
        let id = self.method.descriptor.id();
        if self.is_unconditional_thrower {
            indices.mark_unconditional_thrower(id);
        }
        if self.is_unsupported {
            indices.mark_unsupported(id);
        }
        if self.is_identity {
            indices.mark_identity(id);
        }
        if let Some(target) = self.access_method_for_method {
            indices.set_access_method_for_method(id, target);
        }
        if let Some(target) = self.access_method_for_field {
            indices.set_access_method_for_field(id, target);
        }
        self.method
    }
}
