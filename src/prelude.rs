//! # jvmscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the jvmscope library. Import this module to get quick access to the essential
//! types for building method metadata and querying analysis databases.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all jvmscope operations
pub use crate::Error;

/// The result type used throughout jvmscope
pub use crate::Result;

/// Configuration of an analysis run
pub use crate::analysis::AnalysisConfig;

// ================================================================================================
// Descriptors
// ================================================================================================

/// Interning registry and the descriptor handles it hands out
pub use crate::metadata::{
    descriptor::{
        ClassDescriptor, Descriptor, DescriptorId, DescriptorKind, FieldDescriptor,
        MethodDescriptor,
    },
    registry::DescriptorRegistry,
};

/// Type-signature parsing
pub use crate::metadata::signature::SignatureParser;

// ================================================================================================
// Method and Class Metadata
// ================================================================================================

/// Method metadata and its builder
pub use crate::metadata::method::{ElementType, MethodAccessFlags, MethodInfo, MethodInfoBuilder};

/// Annotation values
pub use crate::metadata::annotation::{AnnotationValue, ElementValue};

/// Per-run fact tables
pub use crate::metadata::indices::{AnnotationListener, AuxiliaryIndices};

/// Parsed and resolved classes
pub use crate::metadata::class::{ClassAccessFlags, ClassInfo, ParsedClass};

// ================================================================================================
// Analysis Cache and Context
// ================================================================================================

/// Cache, context and their extension traits
pub use crate::analysis::{
    AnalysisCache, AnalysisContext, CacheBackedContext, ClassAnalysis, Database,
    RepositoryContext,
};

/// Collaborators supplied by the host
pub use crate::analysis::{ClassfileReader, ErrorLogger, InMemoryClassPath, LogErrorLogger};

/// Whole-program databases
pub use crate::analysis::{
    CheckReturnAnnotationDatabase, CheckReturnValue, NullnessAnnotation,
    NullnessAnnotationLookup, SubtypeGraph,
};

// ================================================================================================
// Statistics
// ================================================================================================

/// Package and class bug statistics
pub use crate::stats::{ClassStats, Finding, PackageStats, SourceLocation};
