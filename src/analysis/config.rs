//! Analysis run configuration
//!
//! This module provides the switches that change how the analysis cache and context behave
//! for a run. Nothing here changes results that passes can observe through the descriptor or
//! method APIs; the options select database variants and execution strategy.

/// Configuration of one analysis run
///
/// The default configuration resolves classes in parallel and uses the type-qualifier backed
/// nullness database, which is what a full analysis wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct AnalysisConfig {
    /// Answer nullness queries from type-qualifier annotations (`@Nonnull(when=...)`)
    /// Otherwise the plain table-backed nullness database is used
    pub use_type_qualifiers: bool,

    /// Resolve the class universe with `rayon` when the application class list is set
    /// Results are still fed to the inheritance graph in universe order
    pub parallel_class_resolution: bool,

    /// Log inheritance-graph statistics at debug level after it was built
    pub debug_subtypes: bool,

    /// Load the built-in JDK annotation tables when databases are updated after pass 0
    pub load_auxiliary_annotations: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            use_type_qualifiers: true,
            parallel_class_resolution: true,
            debug_subtypes: false,
            load_auxiliary_annotations: true,
        }
    }
}

impl AnalysisConfig {
    /// Creates a minimal configuration
    ///
    /// Sequential resolution, table-backed nullness and no auxiliary annotation tables.
    /// Useful for tests and for embedding hosts that bring their own annotation sources.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            use_type_qualifiers: false,
            parallel_class_resolution: false,
            debug_subtypes: false,
            load_auxiliary_annotations: false,
        }
    }

    /// Creates a configuration with every feature and diagnostic enabled
    #[must_use]
    pub fn comprehensive() -> Self {
        Self {
            debug_subtypes: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        let minimal = AnalysisConfig::minimal();
        assert!(!minimal.use_type_qualifiers);
        assert!(!minimal.parallel_class_resolution);
        assert!(!minimal.load_auxiliary_annotations);

        let comprehensive = AnalysisConfig::comprehensive();
        assert!(comprehensive.use_type_qualifiers);
        assert!(comprehensive.parallel_class_resolution);
        assert!(comprehensive.debug_subtypes);
        assert!(comprehensive.load_auxiliary_annotations);

        let default = AnalysisConfig::default();
        assert_ne!(default, comprehensive);
        assert!(!default.debug_subtypes);
    }
}
