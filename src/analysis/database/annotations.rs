//! Annotation-derived databases.
//!
//! Detectors ask these databases what a method promises about its return value and parameters:
//!
//! - [`CheckReturnAnnotationDatabase`] - must the caller use the return value
//! - [`NullnessAnnotationDatabase`] - table-backed nullness of returns and parameters
//! - [`TypeQualifierNullnessDatabase`] - nullness from JSR-305 style type qualifiers, memoized
//!   and invalidated when annotations are added to built methods
//! - [`AnnotationRetentionDatabase`] - which annotation classes are visible at runtime
//!
//! Explicit annotations on a method always take precedence over the built-in JDK tables, which
//! are loaded at most once per database by `load_auxiliary_annotations`.

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use strum::{Display, EnumIter};

use crate::{
    analysis::{AnalysisCache, Database},
    metadata::{
        annotation::{AnnotationValue, ElementValue},
        descriptor::{ClassDescriptor, DescriptorId, MethodDescriptor},
        indices::AnnotationListener,
        method::MethodInfo,
        registry::{to_slashed_class_name, DescriptorRegistry},
    },
};

/// How strongly a method's return value must be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
pub enum CheckReturnValue {
    /// Ignoring the value is fine
    #[strum(serialize = "ignore")]
    Ignore,
    /// Ignoring the value is suspicious
    #[strum(serialize = "low")]
    Low,
    /// Ignoring the value is probably a bug
    #[strum(serialize = "medium")]
    Medium,
    /// Ignoring the value is a bug
    #[strum(serialize = "high")]
    High,
}

const CHECK_RETURN_VALUE_CLASSES: &[&str] = &[
    "javax/annotation/CheckReturnValue",
    "edu/umd/cs/findbugs/annotations/CheckReturnValue",
    "com/google/errorprone/annotations/CheckReturnValue",
];

const CAN_IGNORE_RETURN_VALUE: &str = "com/google/errorprone/annotations/CanIgnoreReturnValue";

/// Built-in method entries: class, name, signature, strength
const CHECK_RETURN_METHODS: &[(&str, &str, &str, CheckReturnValue)] = &[
    (
        "java/lang/String",
        "getBytes",
        "(Ljava/lang/String;)[B",
        CheckReturnValue::Ignore,
    ),
    (
        "java/lang/String",
        "charAt",
        "(I)C",
        CheckReturnValue::Low,
    ),
    ("java/io/File", "createNewFile", "()Z", CheckReturnValue::Medium),
    ("java/io/File", "delete", "()Z", CheckReturnValue::Medium),
    ("java/io/File", "mkdir", "()Z", CheckReturnValue::Medium),
    ("java/io/File", "mkdirs", "()Z", CheckReturnValue::Medium),
    (
        "java/io/File",
        "renameTo",
        "(Ljava/io/File;)Z",
        CheckReturnValue::Medium,
    ),
    (
        "java/io/InputStream",
        "skip",
        "(J)J",
        CheckReturnValue::Medium,
    ),
    (
        "java/io/InputStream",
        "read",
        "([B)I",
        CheckReturnValue::Medium,
    ),
    (
        "java/util/concurrent/locks/Lock",
        "tryLock",
        "()Z",
        CheckReturnValue::High,
    ),
    (
        "java/util/concurrent/BlockingQueue",
        "offer",
        "(Ljava/lang/Object;)Z",
        CheckReturnValue::Medium,
    ),
    (
        "java/util/concurrent/locks/Condition",
        "await",
        "(JLjava/util/concurrent/TimeUnit;)Z",
        CheckReturnValue::Medium,
    ),
];

/// Built-in class-wide defaults: every method of these immutable types
const CHECK_RETURN_CLASSES: &[(&str, CheckReturnValue)] = &[
    ("java/lang/String", CheckReturnValue::Medium),
    ("java/math/BigDecimal", CheckReturnValue::High),
    ("java/math/BigInteger", CheckReturnValue::High),
    ("java/time/LocalDate", CheckReturnValue::High),
    ("java/time/Instant", CheckReturnValue::High),
];

/// Answers whether the return value of a method must be checked.
#[derive(Default)]
pub struct CheckReturnAnnotationDatabase {
    methods: DashMap<DescriptorId, CheckReturnValue>,
    classes: DashMap<DescriptorId, CheckReturnValue>,
    loaded: OnceLock<()>,
}

impl CheckReturnAnnotationDatabase {
    /// Creates an empty database
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the strength for one method
    pub fn add_method_annotation(&self, method: &MethodDescriptor, value: CheckReturnValue) {
        self.methods.insert(method.id(), value);
    }

    /// Records the default strength for every method of `class`
    pub fn add_default_class_annotation(&self, class: &ClassDescriptor, value: CheckReturnValue) {
        self.classes.insert(class.id(), value);
    }

    /// Loads the built-in JDK table; later calls do nothing.
    pub fn load_auxiliary_annotations(&self, cache: &AnalysisCache) {
        self.loaded.get_or_init(|| {
            let registry = cache.registry();
            for &(class, name, signature, value) in CHECK_RETURN_METHODS {
                match registry.method_descriptor(class, name, signature, false) {
                    Ok(method) => self.add_method_annotation(&method, value),
                    Err(error) => log::warn!("skipping check-return entry {class}.{name}: {error}"),
                }
            }
            for &(class, value) in CHECK_RETURN_CLASSES {
                match registry.class_descriptor(class) {
                    Ok(descriptor) => self.add_default_class_annotation(&descriptor, value),
                    Err(error) => log::warn!("skipping check-return entry {class}: {error}"),
                }
            }
            log::debug!(
                "loaded {} check-return method entries and {} class defaults",
                self.methods.len(),
                self.classes.len()
            );
        });
    }

    /// Returns `true` once the built-in table was loaded
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// Resolves the strength for `method`.
    ///
    /// Explicit annotations on the method win, then the method table, then the class default.
    /// Constructors and `void` methods have nothing to check.
    #[must_use]
    pub fn resolve(&self, method: &MethodInfo) -> Option<CheckReturnValue> {
        for annotation in method.annotation_descriptors() {
            if annotation.name() == CAN_IGNORE_RETURN_VALUE {
                return Some(CheckReturnValue::Ignore);
            }
            if CHECK_RETURN_VALUE_CLASSES.contains(&annotation.name()) {
                return Some(CheckReturnValue::Medium);
            }
        }

        if let Some(value) = self.methods.get(&method.descriptor().id()) {
            return Some(*value);
        }
        if method.name() == "<init>" || method.signature().ends_with(")V") {
            return None;
        }
        self.classes
            .get(&method.class_descriptor().id())
            .map(|value| *value)
    }
}

impl Database for CheckReturnAnnotationDatabase {
    fn create(_cache: &AnalysisCache) -> Self {
        CheckReturnAnnotationDatabase::new()
    }
}

/// Nullness promise of a return value or parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum NullnessAnnotation {
    /// May be null; callers must check
    #[strum(serialize = "CheckForNull")]
    CheckForNull,
    /// Never null
    #[strum(serialize = "Nonnull")]
    Nonnull,
    /// May be null; checking is up to the context
    #[strum(serialize = "Nullable")]
    Nullable,
    /// Explicitly unknown
    #[strum(serialize = "UnknownNullness")]
    UnknownNullness,
}

const JSR305_NONNULL: &str = "javax/annotation/Nonnull";
const JSR305_CHECK_FOR_NULL: &str = "javax/annotation/CheckForNull";

impl NullnessAnnotation {
    /// Maps a well-known nullness annotation class (slashed or dotted) to its meaning
    #[must_use]
    pub fn from_annotation_class(name: &str) -> Option<Self> {
        match to_slashed_class_name(name).as_str() {
            "javax/annotation/CheckForNull" | "edu/umd/cs/findbugs/annotations/CheckForNull" => {
                Some(NullnessAnnotation::CheckForNull)
            }
            "javax/annotation/Nonnull"
            | "edu/umd/cs/findbugs/annotations/NonNull"
            | "org/jetbrains/annotations/NotNull"
            | "androidx/annotation/NonNull" => Some(NullnessAnnotation::Nonnull),
            "javax/annotation/Nullable"
            | "edu/umd/cs/findbugs/annotations/Nullable"
            | "org/jetbrains/annotations/Nullable"
            | "androidx/annotation/Nullable" => Some(NullnessAnnotation::Nullable),
            "edu/umd/cs/findbugs/annotations/UnknownNullness" => {
                Some(NullnessAnnotation::UnknownNullness)
            }
            _ => None,
        }
    }

    /// Maps the `when` element of a `@Nonnull` type qualifier
    #[must_use]
    pub fn from_when(when: &str) -> Option<Self> {
        match when {
            "ALWAYS" => Some(NullnessAnnotation::Nonnull),
            "MAYBE" | "NEVER" => Some(NullnessAnnotation::CheckForNull),
            "UNKNOWN" => Some(NullnessAnnotation::UnknownNullness),
            _ => None,
        }
    }
}

/// Query interface shared by both nullness databases.
pub trait NullnessAnnotationLookup: Send + Sync {
    /// Loads the built-in JDK entries; runs at most once per database
    fn load_auxiliary_annotations(&self, cache: &AnalysisCache);

    /// Returns `true` once the built-in entries were loaded
    fn is_loaded(&self) -> bool;

    /// Nullness of the return value of `method`
    fn resolved_annotation(&self, method: &MethodInfo) -> Option<NullnessAnnotation>;

    /// Nullness of parameter `param` of `method`
    fn resolved_parameter_annotation(
        &self,
        method: &MethodInfo,
        param: usize,
    ) -> Option<NullnessAnnotation>;
}

/// Built-in return-value entries
const NULLNESS_RETURNS: &[(&str, &str, &str, NullnessAnnotation)] = &[
    (
        "java/lang/Class",
        "getResource",
        "(Ljava/lang/String;)Ljava/net/URL;",
        NullnessAnnotation::CheckForNull,
    ),
    (
        "java/lang/ClassLoader",
        "getResource",
        "(Ljava/lang/String;)Ljava/net/URL;",
        NullnessAnnotation::CheckForNull,
    ),
    (
        "java/io/File",
        "listFiles",
        "()[Ljava/io/File;",
        NullnessAnnotation::CheckForNull,
    ),
    (
        "java/lang/String",
        "toString",
        "()Ljava/lang/String;",
        NullnessAnnotation::Nonnull,
    ),
];

/// Built-in parameter entries
const NULLNESS_PARAMETERS: &[(&str, &str, &str, usize, NullnessAnnotation)] = &[
    (
        "java/lang/Object",
        "equals",
        "(Ljava/lang/Object;)Z",
        0,
        NullnessAnnotation::CheckForNull,
    ),
    (
        "java/lang/String",
        "<init>",
        "(Ljava/lang/String;)V",
        0,
        NullnessAnnotation::Nonnull,
    ),
    (
        "java/util/Objects",
        "requireNonNull",
        "(Ljava/lang/Object;)Ljava/lang/Object;",
        0,
        NullnessAnnotation::Nullable,
    ),
];

fn plain_nullness(annotations: &[ClassDescriptor]) -> Option<NullnessAnnotation> {
    annotations
        .iter()
        .find_map(|class| NullnessAnnotation::from_annotation_class(class.name()))
}

/// Table-backed nullness database.
///
/// Explicit annotations on the method are read by class name only; type-qualifier elements
/// such as `when` are not interpreted.
#[derive(Default)]
pub struct NullnessAnnotationDatabase {
    returns: DashMap<DescriptorId, NullnessAnnotation>,
    parameters: DashMap<(DescriptorId, usize), NullnessAnnotation>,
    loaded: OnceLock<()>,
}

impl NullnessAnnotationDatabase {
    /// Creates an empty database
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the nullness of the return value of `method`
    pub fn add_method_annotation(&self, method: &MethodDescriptor, value: NullnessAnnotation) {
        self.returns.insert(method.id(), value);
    }

    /// Records the nullness of parameter `param` of `method`
    pub fn add_parameter_annotation(
        &self,
        method: &MethodDescriptor,
        param: usize,
        value: NullnessAnnotation,
    ) {
        self.parameters.insert((method.id(), param), value);
    }

    fn load_tables(&self, registry: &DescriptorRegistry) {
        for &(class, name, signature, value) in NULLNESS_RETURNS {
            match registry.method_descriptor(class, name, signature, false) {
                Ok(method) => self.add_method_annotation(&method, value),
                Err(error) => log::warn!("skipping nullness entry {class}.{name}: {error}"),
            }
        }
        for &(class, name, signature, param, value) in NULLNESS_PARAMETERS {
            let is_static = class == "java/util/Objects";
            match registry.method_descriptor(class, name, signature, is_static) {
                Ok(method) => self.add_parameter_annotation(&method, param, value),
                Err(error) => log::warn!("skipping nullness entry {class}.{name}: {error}"),
            }
        }
    }
}

impl NullnessAnnotationLookup for NullnessAnnotationDatabase {
    fn load_auxiliary_annotations(&self, cache: &AnalysisCache) {
        self.loaded.get_or_init(|| self.load_tables(cache.registry()));
    }

    fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    fn resolved_annotation(&self, method: &MethodInfo) -> Option<NullnessAnnotation> {
        plain_nullness(&method.annotation_descriptors()).or_else(|| {
            self.returns
                .get(&method.descriptor().id())
                .map(|value| *value)
        })
    }

    fn resolved_parameter_annotation(
        &self,
        method: &MethodInfo,
        param: usize,
    ) -> Option<NullnessAnnotation> {
        plain_nullness(&method.parameter_annotation_descriptors(param)).or_else(|| {
            self.parameters
                .get(&(method.descriptor().id(), param))
                .map(|value| *value)
        })
    }
}

impl Database for NullnessAnnotationDatabase {
    fn create(_cache: &AnalysisCache) -> Self {
        NullnessAnnotationDatabase::new()
    }
}

/// Slot of a memoized answer: `None` for the return value, `Some(i)` for parameter `i`
type Slot = Option<usize>;

fn qualifier_nullness(annotations: &[AnnotationValue]) -> Option<NullnessAnnotation> {
    annotations.iter().find_map(|annotation| {
        if annotation.annotation_class().name() == JSR305_NONNULL {
            return match annotation.enum_constant("when") {
                Some(when) => NullnessAnnotation::from_when(when),
                None => Some(NullnessAnnotation::Nonnull),
            };
        }
        NullnessAnnotation::from_annotation_class(annotation.annotation_class().name())
    })
}

/// Nullness from type-qualifier annotations.
///
/// Answers are memoized per method and slot. The database registers itself as an
/// [`AnnotationListener`] when the cache creates it, and drops the memoized answers of a method
/// as soon as that method gains an annotation.
#[derive(Default)]
pub struct TypeQualifierNullnessDatabase {
    memo: DashMap<(DescriptorId, Slot), Option<NullnessAnnotation>>,
    loaded: OnceLock<()>,
}

impl TypeQualifierNullnessDatabase {
    /// Creates an empty database that is not yet listening for annotation changes
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of memoized answers
    #[must_use]
    pub fn memoized(&self) -> usize {
        self.memo.len()
    }

    fn lookup(
        &self,
        method: &MethodInfo,
        slot: Slot,
        compute: impl FnOnce() -> Option<NullnessAnnotation>,
    ) -> Option<NullnessAnnotation> {
        let key = (method.descriptor().id(), slot);
        if let Some(answer) = self.memo.get(&key) {
            return *answer;
        }
        // Computed under the entry lock so an invalidation cannot slip between compute and insert
        *self.memo.entry(key).or_insert_with(compute)
    }
}

impl NullnessAnnotationLookup for TypeQualifierNullnessDatabase {
    /// Marks parameter 0 of every built `equals(Object)` as `@CheckForNull` unless it already
    /// carries a nullness annotation.
    fn load_auxiliary_annotations(&self, cache: &AnalysisCache) {
        self.loaded.get_or_init(|| {
            let check_for_null = match cache.registry().class_descriptor(JSR305_CHECK_FOR_NULL) {
                Ok(class) => class,
                Err(error) => {
                    log::warn!("cannot intern {JSR305_CHECK_FOR_NULL}: {error}");
                    return;
                }
            };

            let mut added = 0usize;
            for method in cache.all_methods() {
                if method.name() != "equals"
                    || method.signature() != "(Ljava/lang/Object;)Z"
                    || method.is_static()
                {
                    continue;
                }
                if qualifier_nullness(&method.parameter_annotations(0)).is_some() {
                    continue;
                }
                method.add_parameter_annotation(0, AnnotationValue::new(check_for_null.clone()));
                added += 1;
            }
            log::debug!("added @CheckForNull to {added} equals methods");
        });
    }

    fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    fn resolved_annotation(&self, method: &MethodInfo) -> Option<NullnessAnnotation> {
        self.lookup(method, None, || qualifier_nullness(&method.annotations()))
    }

    fn resolved_parameter_annotation(
        &self,
        method: &MethodInfo,
        param: usize,
    ) -> Option<NullnessAnnotation> {
        self.lookup(method, Some(param), || {
            qualifier_nullness(&method.parameter_annotations(param))
        })
    }
}

impl AnnotationListener for TypeQualifierNullnessDatabase {
    fn annotations_updated(&self, method: &MethodInfo) {
        let id = method.descriptor().id();
        self.memo.retain(|(method, _), _| *method != id);
    }
}

impl Database for TypeQualifierNullnessDatabase {
    fn create(_cache: &AnalysisCache) -> Self {
        TypeQualifierNullnessDatabase::new()
    }

    fn on_created(this: &Arc<Self>, cache: &AnalysisCache) {
        let listener: Arc<dyn AnnotationListener> = this.clone();
        cache.indices().add_annotation_listener(&listener);
    }
}

/// Which annotation classes are retained at runtime.
///
/// Unknown classes are assumed to be retained.
#[derive(Default)]
pub struct AnnotationRetentionDatabase {
    retention: DashMap<DescriptorId, bool>,
}

impl AnnotationRetentionDatabase {
    /// Creates an empty database
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records whether `annotation` has `RetentionPolicy.RUNTIME`
    pub fn set_runtime_retention(&self, annotation: &ClassDescriptor, runtime: bool) {
        self.retention.insert(annotation.id(), runtime);
    }

    /// Records the retention declared by an `@Retention` annotation value
    pub fn record_retention(&self, annotation: &ClassDescriptor, retention: &AnnotationValue) {
        if let Some(ElementValue::Enum { constant, .. }) = retention.value("value") {
            self.set_runtime_retention(annotation, constant == "RUNTIME");
        }
    }

    /// Returns `true` if `annotation` is known not to be retained at runtime
    #[must_use]
    pub fn lacks_runtime_retention(&self, annotation: &ClassDescriptor) -> bool {
        self.retention
            .get(&annotation.id())
            .is_some_and(|runtime| !*runtime)
    }
}

impl Database for AnnotationRetentionDatabase {
    fn create(_cache: &AnalysisCache) -> Self {
        AnnotationRetentionDatabase::new()
    }
}
