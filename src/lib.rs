// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # jvmscope
//!
//! The metadata-and-cache layer of a whole-program static analyzer for compiled JVM bytecode.
//! `jvmscope` turns parsed class and method records into identity-stable descriptors and
//! immutable method metadata, and computes expensive whole-program facts ("databases") lazily,
//! once per analysis run.
//!
//! ## Features
//!
//! - **Canonical descriptors** - Every class, method and field name is interned once; equal
//!   descriptors are the same object and carry a stable [`metadata::descriptor::DescriptorId`]
//! - **Immutable method metadata** - Built once from a mutable builder, with a copy-on-write
//!   annotation overlay for late augmentation
//! - **Per-run fact tables** - Unconditional throwers, identity methods and access-method
//!   redirections live in explicitly resettable indices
//! - **Memoized databases** - Inheritance graph and annotation databases are created on first
//!   request and shared for the rest of the run
//! - **Bug statistics** - Per-package rollups with deterministic XML output
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use jvmscope::prelude::*;
//!
//! let classpath = InMemoryClassPath::new();
//! let mut fail = MethodInfoBuilder::new("com/example/Guard", "fail", "()V", MethodAccessFlags::STATIC);
//! fail.set_is_unconditional_thrower();
//! classpath.add_class(ParsedClass::new("com/example/Guard").with_method(fail));
//!
//! let cache = Arc::new(AnalysisCache::new(Arc::new(classpath), AnalysisConfig::default()));
//! let context = CacheBackedContext::new(cache.clone());
//!
//! let guard = context.lookup_class("com.example.Guard")?;
//! context.set_app_class_list(&[guard.descriptor().clone()]);
//!
//! let fail = guard.find_method("fail", "()V").unwrap();
//! assert!(fail.is_unconditional_thrower());
//! assert!(context.subtypes().is_application_class(guard.descriptor()));
//! # Ok::<(), jvmscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metadata`] - Descriptor registry, method metadata and its builder, auxiliary indices
//! - [`analysis`] - Analysis cache, context façade and the databases
//! - [`stats`] - Package and class bug statistics
//! - [`utils`] - Directed graph infrastructure
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Runs
//!
//! Everything computed during a run (databases, class analyses, method metadata, index facts)
//! belongs to one [`analysis::AnalysisCache`]. [`analysis::AnalysisCache::reset`] forgets all of
//! it so the next run starts clean; interned descriptors survive because they are identities,
//! not facts.
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade and never installs a logger itself. Non-fatal
//! per-class failures are routed through an [`analysis::ErrorLogger`], which defaults to
//! [`analysis::LogErrorLogger`].

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use jvmscope::prelude::*;
///
/// let registry = DescriptorRegistry::new();
/// let string = registry.class_descriptor("java.lang.String")?;
/// assert_eq!(string.name(), "java/lang/String");
/// # Ok::<(), jvmscope::Error>(())
/// ```
pub mod prelude;

/// Descriptors, method metadata and per-run fact tables.
pub mod metadata;

/// Analysis cache, context façade and whole-program databases.
pub mod analysis;

/// Package and class bug statistics.
pub mod stats;

/// Supporting infrastructure.
pub mod utils;

/// `jvmscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `jvmscope` Error type
///
/// The main error type for all operations in this crate.
///
/// # Examples
///
/// ```rust
/// use jvmscope::{metadata::registry::DescriptorRegistry, Error};
///
/// let registry = DescriptorRegistry::new();
/// match registry.class_descriptor("") {
///     Err(Error::InvalidDescriptor(message)) => println!("rejected: {message}"),
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
pub use error::Error;
