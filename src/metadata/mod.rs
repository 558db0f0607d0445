//! Identity-stable descriptors and method metadata for JVM classes.
//!
//! This module holds everything that describes *what* a class or method is, independent of the
//! analyses that run over it.
//!
//! # Key Components
//!
//! - [`registry`] - Interning of class, method and field descriptors
//! - [`descriptor`] - The descriptor handles and their [`descriptor::DescriptorId`]s
//! - [`signature`] - JVM type-signature parsing
//! - [`method`] - Method metadata and its builder
//! - [`annotation`] - Annotation values attached to methods and parameters
//! - [`indices`] - Per-run tables of cross-cutting method facts
//! - [`class`] - Parsed and resolved class structures
//!
//! # Examples
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
//! let mut builder =
//!     MethodInfoBuilder::new("com/example/Util", "fail", "()V", MethodAccessFlags::STATIC);
//! builder.set_is_unconditional_thrower();
//! let method = builder.build(&registry, &indices)?;
//!
//! assert!(method.is_static());
//! assert!(method.is_unconditional_thrower());
//! assert_eq!(method.class_name(), "com.example.Util");
//! # Ok::<(), jvmscope::Error>(())
//! ```

pub mod annotation;
pub mod class;
pub mod descriptor;
pub mod indices;
pub mod method;
pub mod registry;
pub mod signature;
