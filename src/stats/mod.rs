//! Bug statistics per package and class.
//!
//! Detectors report [`Finding`]s; the report layer rolls them up into one [`PackageStats`] per
//! package, each holding a [`ClassStats`] per class, and serializes them as XML.
//!
//! # Serialization
//!
//! ```xml
//! <PackageStats package="p" total_bugs="4" total_types="1" total_size="120"
//!               priority_4="1" priority_3="1" priority_2="1" priority_1="1">
//!   <ClassStats class="p.A" sourceFile="A.java" interface="false" size="80" bugs="4"
//!               priority_4="1" priority_3="1" priority_2="1" priority_1="1"/>
//! </PackageStats>
//! ```
//!
//! A `priority_N` attribute is written only for nonzero buckets, highest `N` first. Nodes with
//! size zero are not written at all, even when they carry findings.

mod package;

pub use package::{ClassStats, PackageStats, PRIORITY_BUCKETS};

/// Where a finding was reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Dotted name of the class
    pub class_name: String,
    /// Source file of the class, if known
    pub source_file: Option<String>,
}

impl SourceLocation {
    /// Creates a location in `class_name`
    #[must_use]
    pub fn new(class_name: &str, source_file: Option<&str>) -> Self {
        SourceLocation {
            class_name: class_name.to_string(),
            source_file: source_file.map(str::to_string),
        }
    }
}

/// A single bug reported by a detector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Priority, 1 (highest) to 4; other values are not counted
    pub priority: u8,
    /// Primary source location
    pub location: SourceLocation,
}

impl Finding {
    /// Creates a finding of `priority` at `location`
    #[must_use]
    pub fn new(priority: u8, location: SourceLocation) -> Self {
        Finding { priority, location }
    }

    /// Returns the counter slot of this finding, `None` if its priority is not counted
    #[must_use]
    pub(crate) fn bucket(&self) -> Option<usize> {
        let bucket = usize::from(self.priority);
        (1..PRIORITY_BUCKETS).contains(&bucket).then_some(bucket)
    }
}
