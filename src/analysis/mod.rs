//! Analysis cache and context for JVM class metadata.
//!
//! This module is the entry point analysis passes use. It builds on the descriptors and method
//! metadata in [`crate::metadata`] and the graph infrastructure in [`crate::utils::graph`].
//!
//! # Architecture
//!
//! - [`cache`] - Run-scoped memoization of databases, class analyses and methods
//! - [`context`] - The [`AnalysisContext`] façade and its two variants
//! - [`database`] - Whole-program databases (inheritance graph, annotation databases)
//! - [`config`] - Run configuration
//! - [`reader`] - The classfile reader collaborator
//! - [`logger`] - The error callback collaborator
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use jvmscope::analysis::{
//!     AnalysisCache, AnalysisConfig, AnalysisContext, CacheBackedContext, InMemoryClassPath,
//! };
//! use jvmscope::metadata::class::ParsedClass;
//!
//! let classpath = InMemoryClassPath::new();
//! classpath.add_class(ParsedClass::new("com/example/App"));
//!
//! let cache = Arc::new(AnalysisCache::new(Arc::new(classpath), AnalysisConfig::minimal()));
//! let context = CacheBackedContext::new(cache.clone());
//!
//! let app = context.lookup_class("com.example.App")?;
//! context.set_app_class_list(&[app.descriptor().clone()]);
//! assert!(context.subtypes().is_application_class(app.descriptor()));
//! # Ok::<(), jvmscope::Error>(())
//! ```

pub mod cache;
pub mod config;
pub mod context;
pub mod database;
pub mod logger;
pub mod reader;

pub use cache::{AnalysisCache, BridgeTable, ClassAnalysis, Database};
pub use config::AnalysisConfig;
pub use context::{AnalysisContext, CacheBackedContext, RepositoryContext};
pub use database::{
    AnnotationRetentionDatabase, CheckReturnAnnotationDatabase, CheckReturnValue,
    NullnessAnnotation, NullnessAnnotationDatabase, NullnessAnnotationLookup, SubtypeGraph,
    TypeQualifierNullnessDatabase,
};
pub use logger::{CollectingErrorLogger, ErrorEvent, ErrorLogger, LogErrorLogger};
pub use reader::{ClassfileReader, InMemoryClassPath};
