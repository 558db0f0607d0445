//! Central descriptor registry.
//!
//! This module provides the [`DescriptorRegistry`], which interns every class, method and field
//! key seen during a run. Interning guarantees that repeated lookups of the same tuple return
//! the same instance, so identity-keyed tables such as
//! [`crate::metadata::indices::AuxiliaryIndices`] stay consistent no matter which component
//! created a descriptor first.
//!
//! # Registry Architecture
//!
//! - **String table**: canonical `Arc<str>` for every name and signature
//! - **Class table**: slashed class name → [`ClassDescriptor`]
//! - **Member tables**: (class, name, signature, static) → method / field descriptor
//! - **Class arena**: append-only list of classes in interning order, used to enumerate the
//!   whole-program class universe deterministically
//!
//! # Thread Safety
//!
//! All tables are `DashMap`s and the arena is a `boxcar::Vec`, so interning is safe from any
//! number of threads. Insertion of a new key happens under the shard lock of that key, which is
//! what keeps the result canonical under races.
//!
//! # Examples
//!
//! ```rust
//! use jvmscope::metadata::registry::DescriptorRegistry;
//!
//! let registry = DescriptorRegistry::new();
//! let a = registry.class_descriptor("java/lang/String")?;
//! let b = registry.class_descriptor("java.lang.String")?;
//! assert_eq!(a, b);
//!
//! let m1 = registry.method_descriptor("java/lang/String", "length", "()I", false)?;
//! let m2 = registry.method_descriptor("java.lang.String", "length", "()I", false)?;
//! assert_eq!(m1, m2);
//! # Ok::<(), jvmscope::Error>(())
//! ```

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use dashmap::{mapref::entry::Entry, DashMap};

use crate::{
    metadata::{
        descriptor::{
            ClassDescriptor, Descriptor, DescriptorId, DescriptorKind, FieldDescriptor,
            MethodDescriptor,
        },
        signature::{is_valid_field_type, is_valid_method_signature},
    },
    Error, Result,
};

/// Lookup key for method and field tables
#[derive(Clone, PartialEq, Eq, Hash)]
struct MemberKey {
    class: DescriptorId,
    name: Arc<str>,
    signature: Arc<str>,
    is_static: bool,
}

/// Interning table for all descriptors of an analysis run.
pub struct DescriptorRegistry {
    /// Canonical strings
    strings: DashMap<Arc<str>, ()>,
    /// Classes keyed by slashed name
    classes: DashMap<Arc<str>, ClassDescriptor>,
    /// Methods keyed by their identity tuple
    methods: DashMap<MemberKey, MethodDescriptor>,
    /// Fields keyed by their identity tuple
    fields: DashMap<MemberKey, FieldDescriptor>,
    /// Classes in interning order
    class_arena: boxcar::Vec<ClassDescriptor>,
    /// Next descriptor id
    next_id: AtomicU32,
}

impl Default for DescriptorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorRegistry {
    /// Creates an empty registry
    #[must_use]
    pub fn new() -> Self {
        DescriptorRegistry {
            strings: DashMap::new(),
            classes: DashMap::new(),
            methods: DashMap::new(),
            fields: DashMap::new(),
            class_arena: boxcar::Vec::new(),
            next_id: AtomicU32::new(1),
        }
    }

    fn next_id(&self) -> DescriptorId {
        DescriptorId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the canonical instance of `value`.
    ///
    /// Every name and signature held by descriptors goes through this table, so equal strings
    /// share one allocation for the whole run.
    pub fn canonicalize_string(&self, value: &str) -> Arc<str> {
        if let Some(existing) = self.strings.get(value) {
            return existing.key().clone();
        }

        self.strings
            .entry(Arc::from(value))
            .or_insert(())
            .key()
            .clone()
    }

    /// Generic interning entry point.
    ///
    /// For [`DescriptorKind::Class`] only `class` is used; `member`, `signature` and
    /// `is_static` are ignored.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDescriptor`] if any of the names is empty or invalid.
    pub fn intern(
        &self,
        kind: DescriptorKind,
        class: &str,
        member: &str,
        signature: &str,
        is_static: bool,
    ) -> Result<Descriptor> {
        match kind {
            DescriptorKind::Class => self.class_descriptor(class).map(Descriptor::Class),
            DescriptorKind::Method => self
                .method_descriptor(class, member, signature, is_static)
                .map(Descriptor::Method),
            DescriptorKind::Field => self
                .field_descriptor(class, member, signature, is_static)
                .map(Descriptor::Field),
        }
    }

    /// Interns a class given in slashed or dotted form.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDescriptor`] if the name is empty or not a valid class name.
    pub fn class_descriptor(&self, name: &str) -> Result<ClassDescriptor> {
        if name.is_empty() {
            return Err(Error::InvalidDescriptor("empty class name".to_string()));
        }
        if !is_valid_class_name(name) {
            return Err(Error::InvalidDescriptor(format!(
                "invalid class name '{name}'"
            )));
        }

        let slashed = to_slashed_class_name(name);
        if let Some(existing) = self.classes.get(slashed.as_str()) {
            return Ok(existing.value().clone());
        }

        let key = self.canonicalize_string(&slashed);
        match self.classes.entry(key.clone()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let descriptor = ClassDescriptor::new(self.next_id(), key);
                self.class_arena.push(descriptor.clone());
                entry.insert(descriptor.clone());
                Ok(descriptor)
            }
        }
    }

    /// Interns a class from its type signature, e.g. `Ljavax/annotation/Nonnull;`.
    ///
    /// Array signatures are kept as they are. A plain class name is accepted as well.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDescriptor`] if the signature does not name a class.
    pub fn class_descriptor_from_signature(&self, signature: &str) -> Result<ClassDescriptor> {
        if signature.starts_with('L') && signature.ends_with(';') && signature.len() > 2 {
            self.class_descriptor(&signature[1..signature.len() - 1])
        } else {
            self.class_descriptor(signature)
        }
    }

    /// Interns a method descriptor.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDescriptor`] on an invalid class name, method name or signature.
    pub fn method_descriptor(
        &self,
        class: &str,
        name: &str,
        signature: &str,
        is_static: bool,
    ) -> Result<MethodDescriptor> {
        if !is_valid_method_name(name) {
            return Err(Error::InvalidDescriptor(format!(
                "invalid method name '{name}'"
            )));
        }
        if !is_valid_method_signature(signature) {
            return Err(Error::InvalidDescriptor(format!(
                "invalid method signature '{signature}'"
            )));
        }

        let class = self.class_descriptor(class)?;
        let key = self.member_key(&class, name, signature, is_static);
        if let Some(existing) = self.methods.get(&key) {
            return Ok(existing.value().clone());
        }

        match self.methods.entry(key.clone()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let descriptor =
                    MethodDescriptor::new(self.next_id(), class, key.name, key.signature, is_static);
                entry.insert(descriptor.clone());
                Ok(descriptor)
            }
        }
    }

    /// Interns a field descriptor.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDescriptor`] on an invalid class name, field name or signature.
    pub fn field_descriptor(
        &self,
        class: &str,
        name: &str,
        signature: &str,
        is_static: bool,
    ) -> Result<FieldDescriptor> {
        if !is_valid_field_name(name) {
            return Err(Error::InvalidDescriptor(format!(
                "invalid field name '{name}'"
            )));
        }
        if !is_valid_field_type(signature) {
            return Err(Error::InvalidDescriptor(format!(
                "invalid field signature '{signature}'"
            )));
        }

        let class = self.class_descriptor(class)?;
        let key = self.member_key(&class, name, signature, is_static);
        if let Some(existing) = self.fields.get(&key) {
            return Ok(existing.value().clone());
        }

        match self.fields.entry(key.clone()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let descriptor =
                    FieldDescriptor::new(self.next_id(), class, key.name, key.signature, is_static);
                entry.insert(descriptor.clone());
                Ok(descriptor)
            }
        }
    }

    fn member_key(
        &self,
        class: &ClassDescriptor,
        name: &str,
        signature: &str,
        is_static: bool,
    ) -> MemberKey {
        MemberKey {
            class: class.id(),
            name: self.canonicalize_string(name),
            signature: self.canonicalize_string(signature),
            is_static,
        }
    }

    /// Looks up an already interned class without creating it
    #[must_use]
    pub fn get_class(&self, name: &str) -> Option<ClassDescriptor> {
        let slashed = to_slashed_class_name(name);
        self.classes
            .get(slashed.as_str())
            .map(|entry| entry.value().clone())
    }

    /// Snapshot of every class interned so far, in interning order.
    ///
    /// Classes interned while the caller walks the snapshot are not included.
    #[must_use]
    pub fn all_class_descriptors(&self) -> Vec<ClassDescriptor> {
        self.class_arena
            .iter()
            .map(|(_, class)| class.clone())
            .collect()
    }

    /// Number of interned classes
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.class_arena.count()
    }

    /// Number of interned methods
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Number of interned fields
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// Converts a dotted class name into slashed form.
#[must_use]
pub fn to_slashed_class_name(name: &str) -> String {
    if name.starts_with('[') {
        name.to_string()
    } else {
        name.replace('.', "/")
    }
}

/// Converts a slashed class name into dotted form.
#[must_use]
pub fn to_dotted_class_name(name: &str) -> String {
    name.replace('/', ".")
}

/// Checks whether `name` is a syntactically valid class name.
///
/// Slashed and dotted forms are accepted, but not mixed. Array types must be complete field
/// type signatures (`[I`, `[Ljava/lang/String;`).
#[must_use]
pub fn is_valid_class_name(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    if name.starts_with('[') {
        return is_valid_field_type(name);
    }
    if name.contains('.') && name.contains('/') {
        return false;
    }

    name.split(['.', '/']).all(|segment| {
        !segment.is_empty()
            && !segment.chars().any(|c| {
                c.is_whitespace() || matches!(c, ';' | '[' | '(' | ')' | '<' | '>' | ':')
            })
    })
}

/// Checks whether `name` is a valid method name (`<init>` and `<clinit>` included).
#[must_use]
pub fn is_valid_method_name(name: &str) -> bool {
    if name == "<init>" || name == "<clinit>" {
        return true;
    }
    is_valid_field_name(name) && !name.contains(['<', '>'])
}

/// Checks whether `name` is a valid field name.
#[must_use]
pub fn is_valid_field_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['.', ';', '[', '/'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn class_interning_is_canonical() {
        let registry = DescriptorRegistry::new();
        let a = registry.class_descriptor("com/example/Foo").unwrap();
        let b = registry.class_descriptor("com.example.Foo").unwrap();
        let c = registry.class_descriptor("com/example/Bar").unwrap();

        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
        assert_ne!(a, c);
        assert!(Arc::ptr_eq(a.name_arc(), b.name_arc()));
        assert_eq!(registry.class_count(), 2);
    }

    #[test]
    fn member_interning_is_canonical() {
        let registry = DescriptorRegistry::new();
        let m1 = registry
            .method_descriptor("a/B", "run", "(I)V", false)
            .unwrap();
        let m2 = registry
            .method_descriptor("a.B", "run", "(I)V", false)
            .unwrap();
        let m3 = registry.method_descriptor("a/B", "run", "(I)V", true).unwrap();
        assert_eq!(m1, m2);
        assert_ne!(m1, m3);
        assert_eq!(registry.method_count(), 2);

        let f1 = registry.field_descriptor("a/B", "count", "I", false).unwrap();
        let f2 = registry.field_descriptor("a/B", "count", "I", false).unwrap();
        assert_eq!(f1, f2);
        assert_eq!(f1.class(), m1.class());
    }

    #[test]
    fn generic_intern_matches_typed_helpers() {
        let registry = DescriptorRegistry::new();
        let typed = registry
            .method_descriptor("x/Y", "<init>", "()V", false)
            .unwrap();
        let generic = registry
            .intern(DescriptorKind::Method, "x/Y", "<init>", "()V", false)
            .unwrap();
        assert_eq!(generic.as_method(), Some(&typed));

        let class = registry
            .intern(DescriptorKind::Class, "x/Y", "", "", false)
            .unwrap();
        assert_eq!(class.kind(), DescriptorKind::Class);
        assert_eq!(class.class(), typed.class());
    }

    #[test]
    fn rejects_invalid_names() {
        let registry = DescriptorRegistry::new();
        assert!(matches!(
            registry.class_descriptor(""),
            Err(Error::InvalidDescriptor(_))
        ));
        for bad in ["a//B", "/a/B", "a/B/", "a.b/C", "a;B", "a b", "[", "[V"] {
            assert!(registry.class_descriptor(bad).is_err(), "accepted {bad:?}");
        }
        assert!(registry.method_descriptor("a/B", "", "()V", false).is_err());
        assert!(registry.method_descriptor("a/B", "<foo>", "()V", false).is_err());
        assert!(registry.method_descriptor("a/B", "m", "I", false).is_err());
        assert!(registry.field_descriptor("a/B", "f", "()V", false).is_err());
        assert!(registry.field_descriptor("a/B", "a.b", "I", false).is_err());
        assert_eq!(registry.class_count(), 0);
    }

    #[test]
    fn class_from_signature() {
        let registry = DescriptorRegistry::new();
        let from_sig = registry
            .class_descriptor_from_signature("Ljavax/annotation/Nonnull;")
            .unwrap();
        let plain = registry.class_descriptor("javax/annotation/Nonnull").unwrap();
        assert_eq!(from_sig, plain);

        let array = registry.class_descriptor_from_signature("[I").unwrap();
        assert!(array.is_array());
    }

    #[test]
    fn canonical_strings_share_allocation() {
        let registry = DescriptorRegistry::new();
        let a = registry.canonicalize_string("java/io/IOException");
        let b = registry.canonicalize_string(&String::from("java/io/IOException"));
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn universe_keeps_interning_order() {
        let registry = DescriptorRegistry::new();
        let names = ["c/C", "a/A", "b/B"];
        for name in names {
            registry.class_descriptor(name).unwrap();
        }
        let all: Vec<_> = registry
            .all_class_descriptors()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(all, names);
        assert!(registry.get_class("a.A").is_some());
        assert!(registry.get_class("z/Z").is_none());
    }

    #[test]
    fn concurrent_interning_returns_one_instance() {
        let registry = Arc::new(DescriptorRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || {
                    registry
                        .method_descriptor("p/Q", "m", "()V", false)
                        .unwrap()
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(registry.class_count(), 1);
    }
}
