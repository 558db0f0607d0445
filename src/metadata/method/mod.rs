//! Method metadata: builder, immutable info and flag types.
//!
//! # Key Components
//!
//! - [`MethodInfoBuilder`] - Per-method accumulator filled while a class is scanned
//! - [`MethodInfo`] - Immutable result with copy-on-write annotations
//! - [`MethodAccessFlags`] - JVM method access flags
//! - [`ElementType`] - Constructor vs. ordinary method
//!
//! # Lifecycle
//!
//! ```text
//! classfile scanner ──► MethodInfoBuilder ──build()──► Arc<MethodInfo> ──► AnalysisCache
//!                                              │
//!                                              └──► AuxiliaryIndices (facts)
//! ```

mod builder;
mod info;
mod types;

pub use builder::{MethodInfoBuilder, TRACKED_PARAMETERS};
pub(crate) use builder::PreparedMethod;
pub use info::MethodInfo;
pub use types::{ElementType, MethodAccessFlags, METHOD_VISIBILITY_MASK};
