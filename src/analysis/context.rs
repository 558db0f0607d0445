//! Analysis context façade.
//!
//! Analysis passes do not talk to the [`AnalysisCache`] directly. They go through an
//! [`AnalysisContext`], which adds class lookup by dotted name, application class bookkeeping,
//! database accessors and the bridge-method links of the run.
//!
//! Two variants exist:
//!
//! - [`CacheBackedContext`] - everything comes from the cache; classpath mutation is a caller
//!   error and returns [`Error::Unsupported`]
//! - [`RepositoryContext`] - additionally tracks classpath entries and can drop its cached class
//!   analyses

use std::{
    collections::HashSet,
    sync::{Arc, RwLock},
};

use rayon::prelude::*;

use crate::{
    analysis::{
        database::{
            AnnotationRetentionDatabase, CheckReturnAnnotationDatabase,
            NullnessAnnotationDatabase, NullnessAnnotationLookup, SubtypeGraph,
            TypeQualifierNullnessDatabase,
        },
        logger::ErrorLogger,
        AnalysisCache, BridgeTable,
    },
    metadata::{
        class::ClassInfo,
        descriptor::{ClassDescriptor, MethodDescriptor},
        method::MethodInfo,
        registry::{is_valid_class_name, to_slashed_class_name},
    },
    Error, Result,
};

/// The façade analysis passes query.
///
/// Implementors provide access to the cache plus the classpath operations that differ between
/// variants; everything else is shared.
pub trait AnalysisContext: Send + Sync {
    /// The cache backing this context
    fn cache(&self) -> &AnalysisCache;

    /// The bridge-method links of this run
    fn bridges(&self) -> &BridgeTable {
        self.cache().bridges()
    }

    /// Ends the current run: forgets bridge links, databases, class analyses and facts
    fn reset(&self) {
        self.cache().reset();
    }

    /// Adds a classpath entry.
    ///
    /// # Errors
    /// Returns [`Error::Unsupported`] on variants without a mutable classpath.
    fn add_classpath_entry(&self, entry: &str) -> Result<()>;

    /// Drops cached class analyses.
    ///
    /// # Errors
    /// Returns [`Error::Unsupported`] on variants whose cache is owned elsewhere.
    fn clear_class_context_cache(&self) -> Result<()>;

    /// Human readable cache statistics
    fn class_context_stats(&self) -> String;

    /// Resolves a class by dotted (or slashed) name.
    ///
    /// # Errors
    /// - [`Error::InvalidDescriptor`] if `class_name` is empty
    /// - [`Error::ClassNotFound`] with message `Invalid class name: ...` if the name is not a
    ///   valid class name
    /// - [`Error::ClassNotFound`] with message `Class not found: ...` and the cause attached if
    ///   the class cannot be resolved
    fn lookup_class(&self, class_name: &str) -> Result<Arc<ClassInfo>> {
        if class_name.is_empty() {
            return Err(Error::InvalidDescriptor("Class name is empty".to_string()));
        }
        if !is_valid_class_name(class_name) {
            return Err(Error::ClassNotFound {
                message: format!("Invalid class name: {class_name}"),
                source: None,
            });
        }

        let not_found = |error: Error| Error::ClassNotFound {
            message: format!("Class not found: {class_name}"),
            source: Some(Box::new(error)),
        };
        let cache = self.cache();
        let class = cache
            .registry()
            .class_descriptor(&to_slashed_class_name(class_name))
            .map_err(not_found)?;
        cache
            .get_class_analysis::<ClassInfo>(&class)
            .map_err(not_found)
    }

    /// Declares the application classes and builds the inheritance graph.
    ///
    /// Every class descriptor known at this point is resolved. Classes in `app_classes` are
    /// added to the [`SubtypeGraph`] as application classes, all others as library classes.
    /// Array classes are skipped. A class that cannot be resolved is reported through the
    /// error logger and skipped; the remaining classes are still processed.
    ///
    /// With [`crate::analysis::AnalysisConfig::parallel_class_resolution`] the classes are
    /// resolved on the `rayon` pool. Graph insertion and error reporting always happen in
    /// interning order.
    fn set_app_class_list(&self, app_classes: &[ClassDescriptor]) {
        let cache = self.cache();
        let app_set: HashSet<&ClassDescriptor> = app_classes.iter().collect();
        let universe: Vec<ClassDescriptor> = cache
            .registry()
            .all_class_descriptors()
            .into_iter()
            .filter(|class| !class.is_array())
            .collect();

        let resolve = |class: &ClassDescriptor| cache.get_class_analysis::<ClassInfo>(class);
        let resolved: Vec<Result<Arc<ClassInfo>>> = if cache.config().parallel_class_resolution {
            universe.par_iter().map(resolve).collect()
        } else {
            universe.iter().map(resolve).collect()
        };

        let subtypes = self.subtypes();
        let logger = cache.error_logger();
        for (class, result) in universe.iter().zip(resolved) {
            let added = result.and_then(|info| {
                if app_set.contains(class) {
                    subtypes.add_application_class(&info)
                } else {
                    subtypes.add_class(&info)
                }
            });

            match added {
                Ok(()) => {}
                Err(error) if error.is_missing_class() => logger.report_missing_class(&error),
                Err(error) => logger.log_error_with_cause(
                    &format!("Unable to get class info for {}", class.dotted_name()),
                    &error,
                ),
            }
        }

        if cache.config().debug_subtypes {
            log::debug!(
                "{} vertices in inheritance graph",
                subtypes.num_vertices()
            );
        }
    }

    /// Loads the auxiliary annotation tables after pass 0.
    ///
    /// Only pass 0 has an effect, and only when
    /// [`crate::analysis::AnalysisConfig::load_auxiliary_annotations`] is set. Each database
    /// loads its tables at most once.
    fn update_databases(&self, pass: usize) {
        if pass != 0 || !self.cache().config().load_auxiliary_annotations {
            return;
        }
        self.check_return_database()
            .load_auxiliary_annotations(self.cache());
        self.nullness_database()
            .load_auxiliary_annotations(self.cache());
    }

    /// Records that `from` is a bridge method forwarding to `to`
    fn set_bridge_method(&self, from: &Arc<MethodInfo>, to: &Arc<MethodInfo>) {
        self.bridges().set(from, to);
    }

    /// The method the bridge `method` forwards to; `None` until recorded
    fn bridge_to(&self, method: &MethodDescriptor) -> Option<Arc<MethodInfo>> {
        self.bridges().bridge_to(method)
    }

    /// The bridge forwarding to `method`; `None` until recorded
    fn bridge_from(&self, method: &MethodDescriptor) -> Option<Arc<MethodInfo>> {
        self.bridges().bridge_from(method)
    }

    /// The inheritance graph of the run
    fn subtypes(&self) -> Arc<SubtypeGraph> {
        self.cache().get_database::<SubtypeGraph>()
    }

    /// The check-return-value database
    fn check_return_database(&self) -> Arc<CheckReturnAnnotationDatabase> {
        self.cache().get_database::<CheckReturnAnnotationDatabase>()
    }

    /// The nullness database selected by
    /// [`crate::analysis::AnalysisConfig::use_type_qualifiers`]
    fn nullness_database(&self) -> Arc<dyn NullnessAnnotationLookup> {
        if self.cache().config().use_type_qualifiers {
            self.cache().get_database::<TypeQualifierNullnessDatabase>()
        } else {
            self.cache().get_database::<NullnessAnnotationDatabase>()
        }
    }

    /// The annotation retention database
    fn annotation_retention_database(&self) -> Arc<AnnotationRetentionDatabase> {
        self.cache().get_database::<AnnotationRetentionDatabase>()
    }

    /// The error callback used for lookup failures
    fn lookup_failure_callback(&self) -> Arc<dyn ErrorLogger> {
        self.cache().error_logger().clone()
    }
}

/// Context that delegates everything to a shared [`AnalysisCache`].
pub struct CacheBackedContext {
    cache: Arc<AnalysisCache>,
}

impl CacheBackedContext {
    /// Creates a context over `cache`
    #[must_use]
    pub fn new(cache: Arc<AnalysisCache>) -> Self {
        CacheBackedContext {
            cache,
        }
    }
}

impl AnalysisContext for CacheBackedContext {
    fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    fn add_classpath_entry(&self, _entry: &str) -> Result<()> {
        Err(Error::Unsupported("add_classpath_entry"))
    }

    fn clear_class_context_cache(&self) -> Result<()> {
        Err(Error::Unsupported("clear_class_context_cache"))
    }

    fn class_context_stats(&self) -> String {
        "<unknown ClassContext stats>".to_string()
    }
}

/// Context that owns a classpath list and may drop its cached class analyses.
pub struct RepositoryContext {
    cache: Arc<AnalysisCache>,
    classpath: RwLock<Vec<String>>,
}

impl RepositoryContext {
    /// Creates a context over `cache` with an empty classpath list
    #[must_use]
    pub fn new(cache: Arc<AnalysisCache>) -> Self {
        RepositoryContext {
            cache,
            classpath: RwLock::new(Vec::new()),
        }
    }

    /// Classpath entries in insertion order
    #[must_use]
    pub fn classpath_entries(&self) -> Vec<String> {
        read_lock!(self.classpath).clone()
    }
}

impl AnalysisContext for RepositoryContext {
    fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    fn add_classpath_entry(&self, entry: &str) -> Result<()> {
        if entry.is_empty() {
            return Err(Error::Error("empty classpath entry".to_string()));
        }
        let mut classpath = write_lock!(self.classpath);
        if !classpath.iter().any(|existing| existing == entry) {
            classpath.push(entry.to_string());
        }
        Ok(())
    }

    fn clear_class_context_cache(&self) -> Result<()> {
        self.cache.purge_class_analyses();
        Ok(())
    }

    fn class_context_stats(&self) -> String {
        format!(
            "{} classpath entries, {} methods, {} databases",
            read_lock!(self.classpath).len(),
            self.cache.all_methods().len(),
            self.cache.database_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::{
            logger::{CollectingErrorLogger, ErrorEvent},
            AnalysisConfig, InMemoryClassPath,
        },
        metadata::{
            class::ParsedClass,
            method::{MethodAccessFlags, MethodInfoBuilder},
        },
    };

    fn classpath() -> InMemoryClassPath {
        let classpath = InMemoryClassPath::new();
        classpath.add_class(ParsedClass::new("java/lang/Object").with_superclass(None));
        classpath.add_class(
            ParsedClass::new("app/Main")
                .with_method(MethodInfoBuilder::new(
                    "app/Main",
                    "compareTo",
                    "(Ljava/lang/Object;)I",
                    MethodAccessFlags::PUBLIC
                        | MethodAccessFlags::BRIDGE
                        | MethodAccessFlags::SYNTHETIC,
                ))
                .with_method(MethodInfoBuilder::new(
                    "app/Main",
                    "compareTo",
                    "(Lapp/Main;)I",
                    MethodAccessFlags::PUBLIC,
                )),
        );
        classpath.add_class(ParsedClass::new("lib/Helper"));
        classpath
    }

    fn new_context(config: AnalysisConfig) -> (CacheBackedContext, Arc<CollectingErrorLogger>) {
        let logger = Arc::new(CollectingErrorLogger::new());
        let cache = AnalysisCache::new(Arc::new(classpath()), config)
            .with_error_logger(logger.clone());
        (CacheBackedContext::new(Arc::new(cache)), logger)
    }

    #[test]
    fn lookup_class_errors() {
        let (context, _) = new_context(AnalysisConfig::minimal());
        assert!(matches!(
            context.lookup_class(""),
            Err(Error::InvalidDescriptor(_))
        ));

        match context.lookup_class("not a class") {
            Err(Error::ClassNotFound { message, source }) => {
                assert_eq!(message, "Invalid class name: not a class");
                assert!(source.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }

        match context.lookup_class("app.Missing") {
            Err(error @ Error::ClassNotFound { .. }) => {
                assert_eq!(error.to_string(), "Class not found: app.Missing");
                assert!(error.is_missing_class());
            }
            other => panic!("unexpected {other:?}"),
        }

        let main = context.lookup_class("app.Main").unwrap();
        assert_eq!(main.descriptor().name(), "app/Main");
    }

    #[test]
    fn app_class_list_partitions_universe() {
        for config in [AnalysisConfig::minimal(), AnalysisConfig::comprehensive()] {
            let (context, logger) = new_context(config);
            let registry = context.cache().registry().clone();
            let main = registry.class_descriptor("app/Main").unwrap();
            registry.class_descriptor("lib/Helper").unwrap();
            registry.class_descriptor("lib/Gone").unwrap();
            registry.class_descriptor("[Lapp/Main;").unwrap();

            context.set_app_class_list(&[main.clone()]);

            let subtypes = context.subtypes();
            assert!(subtypes.is_application_class(&main));
            let helper = registry.get_class("lib/Helper").unwrap();
            assert!(subtypes.contains(&helper));
            assert!(!subtypes.is_application_class(&helper));
            assert_eq!(logger.missing_classes(), vec!["lib/Gone"]);
        }
    }

    #[test]
    fn bridges() {
        let (context, _) = new_context(AnalysisConfig::minimal());
        let main = context.lookup_class("app.Main").unwrap();
        let bridge = main.find_method("compareTo", "(Ljava/lang/Object;)I").unwrap();
        let target = main.find_method("compareTo", "(Lapp/Main;)I").unwrap();

        assert!(bridge.bridge_to(&context).is_none());
        context.set_bridge_method(bridge, target);

        let to = bridge.bridge_to(&context).unwrap();
        assert!(Arc::ptr_eq(&to, target));
        let from = target.bridge_from(&context).unwrap();
        assert!(Arc::ptr_eq(&from, bridge));
        assert!(bridge.is_bridge());
    }

    #[test]
    fn reset_forgets_bridges() {
        let (context, _) = new_context(AnalysisConfig::minimal());
        let main = context.lookup_class("app.Main").unwrap();
        let bridge = main.find_method("compareTo", "(Ljava/lang/Object;)I").unwrap();
        let target = main.find_method("compareTo", "(Lapp/Main;)I").unwrap();
        context.set_bridge_method(bridge, target);

        context.cache().reset();
        assert!(context.bridges().is_empty());

        let main = context.lookup_class("app.Main").unwrap();
        let bridge = main.find_method("compareTo", "(Ljava/lang/Object;)I").unwrap();
        assert!(bridge.bridge_to(&context).is_none());
        let target = main.find_method("compareTo", "(Lapp/Main;)I").unwrap();
        assert!(target.bridge_from(&context).is_none());

        context.set_bridge_method(bridge, target);
        context.reset();
        assert!(bridge.bridge_to(&context).is_none());
    }

    #[test]
    fn cache_backed_mutators_are_unsupported() {
        let (context, _) = new_context(AnalysisConfig::minimal());
        assert!(matches!(
            context.add_classpath_entry("lib.jar"),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            context.clear_class_context_cache(),
            Err(Error::Unsupported(_))
        ));
        assert_eq!(context.class_context_stats(), "<unknown ClassContext stats>");
    }

    #[test]
    fn repository_context() {
        let cache = Arc::new(AnalysisCache::new(
            Arc::new(classpath()),
            AnalysisConfig::minimal(),
        ));
        let context = RepositoryContext::new(cache.clone());
        context.add_classpath_entry("app.jar").unwrap();
        context.add_classpath_entry("app.jar").unwrap();
        assert!(context.add_classpath_entry("").is_err());
        assert_eq!(context.classpath_entries(), vec!["app.jar"]);

        let main = context.lookup_class("app/Main").unwrap();
        context.clear_class_context_cache().unwrap();
        assert!(!cache.has_class_analysis::<ClassInfo>(main.descriptor()));
        assert!(context.class_context_stats().starts_with("1 classpath entries"));
    }

    #[test]
    fn update_databases_only_after_pass_zero() {
        let (context, _) = new_context(AnalysisConfig::default());
        context.update_databases(1);
        assert!(!context.check_return_database().is_loaded());

        context.update_databases(0);
        assert!(context.check_return_database().is_loaded());
        assert!(context.nullness_database().is_loaded());

        let (minimal, _) = new_context(AnalysisConfig::minimal());
        minimal.update_databases(0);
        assert!(!minimal.check_return_database().is_loaded());
    }

    #[test]
    fn lookup_failure_callback_is_the_cache_logger() {
        let (context, logger) = new_context(AnalysisConfig::minimal());
        context.lookup_failure_callback().log_error("boom");
        assert_eq!(logger.events(), vec![ErrorEvent::Error("boom".to_string())]);
    }
}
