//! Run-scoped analysis cache.
//!
//! The [`AnalysisCache`] is the one place where expensive derived results live during a run:
//!
//! - **Databases**: whole-program structures such as the inheritance graph, at most one
//!   observable instance per type ([`AnalysisCache::get_database`])
//! - **Class analyses**: per-class results keyed by (analysis type, class), computed from the
//!   classfile reader on first request ([`AnalysisCache::get_class_analysis`])
//! - **Method table**: every [`MethodInfo`] built while resolving classes
//! - **Bridge links**: bridge methods and the methods they forward to ([`BridgeTable`])
//!
//! # Construction Races
//!
//! A value is computed outside of any map lock and then offered to the map; if another thread
//! stored a value first, that one is returned and the fresh one is dropped. Computation may
//! therefore run twice under a race, but callers never observe two instances or a partially
//! built one.
//!
//! # Reset
//!
//! [`AnalysisCache::reset`] drops every database, class analysis, method and bridge link and
//! clears the run's [`AuxiliaryIndices`], so the next run starts without stale facts.

use std::{
    any::{type_name, Any, TypeId},
    sync::Arc,
};

use dashmap::DashMap;

use crate::{
    analysis::{
        config::AnalysisConfig,
        logger::{ErrorLogger, LogErrorLogger},
        reader::ClassfileReader,
    },
    metadata::{
        descriptor::{ClassDescriptor, DescriptorId, MethodDescriptor},
        indices::AuxiliaryIndices,
        method::MethodInfo,
        registry::DescriptorRegistry,
    },
    Error, Result,
};

type AnyArc = Arc<dyn Any + Send + Sync>;

/// Bridge-method links of one run.
///
/// `set` records both directions; a later `set` for the same method overwrites the earlier link.
#[derive(Default)]
pub struct BridgeTable {
    to: DashMap<DescriptorId, Arc<MethodInfo>>,
    from: DashMap<DescriptorId, Arc<MethodInfo>>,
}

impl BridgeTable {
    /// Creates an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `from` is a bridge forwarding to `to`
    pub fn set(&self, from: &Arc<MethodInfo>, to: &Arc<MethodInfo>) {
        self.to.insert(from.descriptor().id(), to.clone());
        self.from.insert(to.descriptor().id(), from.clone());
    }

    /// The method the bridge `method` forwards to
    #[must_use]
    pub fn bridge_to(&self, method: &MethodDescriptor) -> Option<Arc<MethodInfo>> {
        self.to.get(&method.id()).map(|entry| entry.value().clone())
    }

    /// The bridge forwarding to `method`
    #[must_use]
    pub fn bridge_from(&self, method: &MethodDescriptor) -> Option<Arc<MethodInfo>> {
        self.from.get(&method.id()).map(|entry| entry.value().clone())
    }

    /// Number of recorded bridges
    #[must_use]
    pub fn len(&self) -> usize {
        self.to.len()
    }

    /// Returns `true` if no bridge was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to.is_empty()
    }

    /// Forgets all links
    pub fn clear(&self) {
        self.to.clear();
        self.from.clear();
    }
}

/// A whole-program structure created lazily, once per run.
pub trait Database: Any + Send + Sync + Sized {
    /// Creates the empty database.
    ///
    /// Runs outside of any cache lock, so it may request other databases.
    fn create(cache: &AnalysisCache) -> Self;

    /// Called once with the instance that was actually stored
    fn on_created(_this: &Arc<Self>, _cache: &AnalysisCache) {}
}

/// A per-class result computed from the class structure.
pub trait ClassAnalysis: Any + Send + Sync + Sized {
    /// Computes the analysis for `class`.
    ///
    /// # Errors
    /// Any error is reported to the caller of [`AnalysisCache::get_class_analysis`] wrapped in
    /// [`Error::ClassUnavailable`].
    fn analyze(cache: &AnalysisCache, class: &ClassDescriptor) -> Result<Self>;
}

/// Memoizing cache for one analysis run.
pub struct AnalysisCache {
    registry: Arc<DescriptorRegistry>,
    indices: Arc<AuxiliaryIndices>,
    reader: Arc<dyn ClassfileReader>,
    error_logger: Arc<dyn ErrorLogger>,
    config: AnalysisConfig,
    databases: DashMap<TypeId, AnyArc>,
    class_analyses: DashMap<(TypeId, DescriptorId), AnyArc>,
    methods: DashMap<MethodDescriptor, Arc<MethodInfo>>,
    bridges: BridgeTable,
}

impl AnalysisCache {
    /// Creates a cache with a fresh registry, fresh indices and a [`LogErrorLogger`].
    ///
    /// ## Arguments
    /// * `reader` - Source of class structures
    /// * `config` - Run configuration
    #[must_use]
    pub fn new(reader: Arc<dyn ClassfileReader>, config: AnalysisConfig) -> Self {
        AnalysisCache {
            registry: Arc::new(DescriptorRegistry::new()),
            indices: Arc::new(AuxiliaryIndices::new()),
            reader,
            error_logger: Arc::new(LogErrorLogger),
            config,
            databases: DashMap::new(),
            class_analyses: DashMap::new(),
            methods: DashMap::new(),
            bridges: BridgeTable::new(),
        }
    }

    /// Uses `registry` instead of a fresh one, e.g. one shared with a classfile scanner
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<DescriptorRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Uses `logger` as the error callback
    #[must_use]
    pub fn with_error_logger(mut self, logger: Arc<dyn ErrorLogger>) -> Self {
        self.error_logger = logger;
        self
    }

    /// The descriptor registry of this run
    #[must_use]
    pub fn registry(&self) -> &Arc<DescriptorRegistry> {
        &self.registry
    }

    /// The auxiliary indices of this run
    #[must_use]
    pub fn indices(&self) -> &Arc<AuxiliaryIndices> {
        &self.indices
    }

    /// The classfile reader
    #[must_use]
    pub fn reader(&self) -> &Arc<dyn ClassfileReader> {
        &self.reader
    }

    /// The error callback
    #[must_use]
    pub fn error_logger(&self) -> &Arc<dyn ErrorLogger> {
        &self.error_logger
    }

    /// The run configuration
    #[must_use]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Returns the database `D`, creating it on first request.
    ///
    /// Repeated calls for the same type return the same instance until [`AnalysisCache::reset`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use jvmscope::analysis::{AnalysisCache, AnalysisConfig, InMemoryClassPath, SubtypeGraph};
    ///
    /// let cache = AnalysisCache::new(Arc::new(InMemoryClassPath::new()), AnalysisConfig::minimal());
    /// let a = cache.get_database::<SubtypeGraph>();
    /// let b = cache.get_database::<SubtypeGraph>();
    /// assert!(Arc::ptr_eq(&a, &b));
    /// ```
    pub fn get_database<D: Database>(&self) -> Arc<D> {
        let key = TypeId::of::<D>();
        if let Some(existing) = self.databases.get(&key) {
            return downcast(existing.value().clone());
        }

        let created = Arc::new(D::create(self));
        let stored = self
            .databases
            .entry(key)
            .or_insert_with(|| created.clone() as AnyArc)
            .value()
            .clone();

        let database = downcast::<D>(stored);
        if Arc::ptr_eq(&database, &created) {
            D::on_created(&database, self);
        }
        database
    }

    /// Returns the analysis `A` of `class`, computing it on first request.
    ///
    /// # Errors
    /// Returns [`Error::ClassUnavailable`] wrapping the reader or analysis failure. Failures are
    /// not cached; a later request tries again.
    pub fn get_class_analysis<A: ClassAnalysis>(&self, class: &ClassDescriptor) -> Result<Arc<A>> {
        let key = (TypeId::of::<A>(), class.id());
        if let Some(existing) = self.class_analyses.get(&key) {
            return Ok(downcast(existing.value().clone()));
        }

        let analysis = A::analyze(self, class).map_err(|error| match error {
            Error::ClassUnavailable { .. } => error,
            other => Error::ClassUnavailable {
                class: class.name().to_string(),
                source: Box::new(other),
            },
        })?;

        let stored = self
            .class_analyses
            .entry(key)
            .or_insert_with(|| Arc::new(analysis) as AnyArc)
            .value()
            .clone();
        Ok(downcast(stored))
    }

    /// Returns `true` if analysis `A` of `class` is already cached
    #[must_use]
    pub fn has_class_analysis<A: ClassAnalysis>(&self, class: &ClassDescriptor) -> bool {
        self.class_analyses
            .contains_key(&(TypeId::of::<A>(), class.id()))
    }

    /// Stores `method` in the method table and returns the stored instance.
    ///
    /// If a method with the same descriptor is already stored, that one is kept and returned.
    pub fn register_method(&self, method: Arc<MethodInfo>) -> Arc<MethodInfo> {
        self.methods
            .entry(method.descriptor().clone())
            .or_insert(method)
            .value()
            .clone()
    }

    /// Looks up a built method
    #[must_use]
    pub fn method_info(&self, descriptor: &MethodDescriptor) -> Option<Arc<MethodInfo>> {
        self.methods
            .get(descriptor)
            .map(|entry| entry.value().clone())
    }

    /// All built methods, ordered by descriptor
    #[must_use]
    pub fn all_methods(&self) -> Vec<Arc<MethodInfo>> {
        let mut methods: Vec<Arc<MethodInfo>> = self
            .methods
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        methods.sort_by(|a, b| a.descriptor().cmp(b.descriptor()));
        methods
    }

    /// Bridge-method links recorded in this run
    #[must_use]
    pub fn bridges(&self) -> &BridgeTable {
        &self.bridges
    }

    /// Number of cached databases
    #[must_use]
    pub fn database_count(&self) -> usize {
        self.databases.len()
    }

    /// Drops all cached class analyses; databases and methods are kept
    pub fn purge_class_analyses(&self) {
        self.class_analyses.clear();
    }

    /// Forgets everything computed in this run, auxiliary indices and bridge links included.
    ///
    /// Annotation listeners registered by the dropped databases are unregistered as well.
    /// Descriptors stay interned; they are identities, not facts.
    pub fn reset(&self) {
        self.databases.clear();
        self.indices.remove_annotation_listeners();
        self.class_analyses.clear();
        self.methods.clear();
        self.bridges.clear();
        self.indices.clear();
    }
}

/// Entries are keyed by `TypeId::of::<T>()`, so the cast cannot fail.
fn downcast<T: Any + Send + Sync>(value: AnyArc) -> Arc<T> {
    match value.downcast::<T>() {
        Ok(typed) => typed,
        Err(_) => unreachable!("cache entry stored under the TypeId of {}", type_name::<T>()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::reader::InMemoryClassPath,
        metadata::{
            class::{ClassInfo, ParsedClass},
            method::{MethodAccessFlags, MethodInfoBuilder},
        },
    };
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
    };

    static CREATED: AtomicUsize = AtomicUsize::new(0);

    struct CountingDatabase {
        serial: usize,
    }

    impl Database for CountingDatabase {
        fn create(_cache: &AnalysisCache) -> Self {
            CountingDatabase {
                serial: CREATED.fetch_add(1, Ordering::SeqCst),
            }
        }
    }

    #[derive(Default)]
    struct OtherDatabase;

    impl Database for OtherDatabase {
        fn create(_cache: &AnalysisCache) -> Self {
            OtherDatabase
        }
    }

    fn cache() -> AnalysisCache {
        let classpath = InMemoryClassPath::new();
        let mut thrower = MethodInfoBuilder::new("p/A", "fail", "()V", MethodAccessFlags::STATIC);
        thrower.set_is_unconditional_thrower();
        classpath.add_class(ParsedClass::new("p/A").with_method(thrower));
        AnalysisCache::new(Arc::new(classpath), AnalysisConfig::minimal())
    }

    #[test]
    fn databases_are_memoized_per_type() {
        let cache = cache();
        let a = cache.get_database::<CountingDatabase>();
        let b = cache.get_database::<CountingDatabase>();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.serial, b.serial);

        let _other = cache.get_database::<OtherDatabase>();
        assert_eq!(cache.database_count(), 2);

        cache.reset();
        let c = cache.get_database::<CountingDatabase>();
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn concurrent_first_access_yields_one_instance() {
        let cache = Arc::new(cache());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                thread::spawn(move || cache.get_database::<OtherDatabase>())
            })
            .collect();
        let instances: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn class_analyses_are_memoized() {
        let cache = cache();
        let class = cache.registry().class_descriptor("p/A").unwrap();
        assert!(!cache.has_class_analysis::<ClassInfo>(&class));

        let first = cache.get_class_analysis::<ClassInfo>(&class).unwrap();
        let second = cache.get_class_analysis::<ClassInfo>(&class).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.has_class_analysis::<ClassInfo>(&class));

        cache.purge_class_analyses();
        assert!(!cache.has_class_analysis::<ClassInfo>(&class));
        assert_eq!(cache.all_methods().len(), 1);
    }

    #[test]
    fn read_failure_becomes_class_unavailable() {
        let cache = cache();
        let missing = cache.registry().class_descriptor("p/Missing").unwrap();
        let error = cache.get_class_analysis::<ClassInfo>(&missing).unwrap_err();
        match &error {
            Error::ClassUnavailable { class, source } => {
                assert_eq!(class, "p/Missing");
                assert!(matches!(**source, Error::MissingClass(_)));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(error.is_missing_class());
    }

    #[test]
    fn reset_clears_facts_and_methods() {
        let cache = cache();
        let class = cache.registry().class_descriptor("p/A").unwrap();
        let info = cache.get_class_analysis::<ClassInfo>(&class).unwrap();
        let method = info.find_method("fail", "()V").unwrap().clone();
        assert!(method.is_unconditional_thrower());
        assert!(cache.method_info(method.descriptor()).is_some());

        cache.reset();
        assert!(!method.is_unconditional_thrower());
        assert!(cache.method_info(method.descriptor()).is_none());
        assert!(cache.indices().is_empty());
        assert!(!cache.has_class_analysis::<ClassInfo>(&class));
    }

    #[test]
    fn register_method_keeps_first_instance() {
        let cache = cache();
        let build = || {
            MethodInfoBuilder::new("p/A", "m", "()V", MethodAccessFlags::empty())
                .build(cache.registry(), cache.indices())
                .unwrap()
        };
        let first = cache.register_method(build());
        let second = cache.register_method(build());
        assert!(Arc::ptr_eq(&first, &second));
    }
}
