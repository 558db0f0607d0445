//! Run-scoped whole-program databases.
//!
//! Every type here implements [`crate::analysis::Database`] and is obtained through
//! [`crate::analysis::AnalysisCache::get_database`], which creates it on first request and hands
//! out the same instance for the rest of the run.

mod annotations;
mod subtypes;

pub use annotations::{
    AnnotationRetentionDatabase, CheckReturnAnnotationDatabase, CheckReturnValue,
    NullnessAnnotation, NullnessAnnotationDatabase, NullnessAnnotationLookup,
    TypeQualifierNullnessDatabase,
};
pub use subtypes::{ClassVertex, InheritanceEdge, SubtypeGraph, VertexKind};
