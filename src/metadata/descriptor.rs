//! Canonical identity handles for classes, methods and fields.
//!
//! Descriptors are only ever created by the [`crate::metadata::registry::DescriptorRegistry`],
//! which guarantees that two logically equal keys resolve to the very same allocation. Equality
//! and hashing therefore work on identity (pointer and [`DescriptorId`]) instead of comparing
//! strings, which keeps the millions of lookups made by analysis passes cheap.
//!
//! # Key Types
//! - [`DescriptorId`] - Stable numeric handle assigned at interning time
//! - [`ClassDescriptor`] - A class, stored in slashed form (`java/lang/String`)
//! - [`MethodDescriptor`] - (class, name, signature, static) of a method
//! - [`FieldDescriptor`] - (class, name, signature, static) of a field
//! - [`Descriptor`] - Any of the above, as returned by the generic interning entry point
//!
//! # Ordering
//!
//! Descriptors order by content: class name, then member name, then signature, then the static
//! flag. The id only breaks ties between descriptors of different registries.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use strum::{Display, EnumCount, EnumIter};

/// Stable handle of an interned descriptor.
///
/// Ids are handed out sequentially by a registry and are never reused within it, so they can
/// key side tables (see [`crate::metadata::indices::AuxiliaryIndices`]) without holding on to
/// the descriptor itself.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DescriptorId(pub u32);

impl DescriptorId {
    /// Creates a new id from a raw value
    #[must_use]
    pub fn new(value: u32) -> Self {
        DescriptorId(value)
    }

    /// Returns the raw id value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for DescriptorId {
    fn from(value: u32) -> Self {
        DescriptorId(value)
    }
}

impl fmt::Debug for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DescriptorId({})", self.0)
    }
}

impl fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kind of entity a descriptor identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumCount)]
pub enum DescriptorKind {
    /// A class, interface or array type
    #[strum(serialize = "class")]
    Class,
    /// A method or constructor
    #[strum(serialize = "method")]
    Method,
    /// A field
    #[strum(serialize = "field")]
    Field,
}

struct ClassDescriptorInner {
    id: DescriptorId,
    name: Arc<str>,
}

/// Canonical handle of a class.
///
/// Cloning is a reference count increment. Two `ClassDescriptor`s compare equal only if they
/// are the same interned instance.
#[derive(Clone)]
pub struct ClassDescriptor(Arc<ClassDescriptorInner>);

impl ClassDescriptor {
    pub(crate) fn new(id: DescriptorId, name: Arc<str>) -> Self {
        ClassDescriptor(Arc::new(ClassDescriptorInner { id, name }))
    }

    /// The interning id of this class
    #[must_use]
    pub fn id(&self) -> DescriptorId {
        self.0.id
    }

    /// Class name in slashed form, e.g. `java/lang/String`
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Shared handle to the canonical name string
    #[must_use]
    pub fn name_arc(&self) -> &Arc<str> {
        &self.0.name
    }

    /// Class name in dotted form, e.g. `java.lang.String`
    #[must_use]
    pub fn dotted_name(&self) -> String {
        self.0.name.replace('/', ".")
    }

    /// The part of the name after the last package separator
    #[must_use]
    pub fn simple_name(&self) -> &str {
        match self.0.name.rfind('/') {
            Some(pos) => &self.0.name[pos + 1..],
            None => &self.0.name,
        }
    }

    /// Package name in dotted form; empty for the default package
    #[must_use]
    pub fn package_name(&self) -> String {
        match self.0.name.rfind('/') {
            Some(pos) => self.0.name[..pos].replace('/', "."),
            None => String::new(),
        }
    }

    /// The JVM type signature of this class, e.g. `Ljava/lang/String;`
    #[must_use]
    pub fn signature(&self) -> String {
        if self.is_array() {
            self.0.name.to_string()
        } else {
            format!("L{};", self.0.name)
        }
    }

    /// Returns `true` if this descriptor names an array type
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.0.name.starts_with('[')
    }
}

impl PartialEq for ClassDescriptor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ClassDescriptor {}

impl Hash for ClassDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl PartialOrd for ClassDescriptor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ClassDescriptor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .name
            .cmp(&other.0.name)
            .then_with(|| self.0.id.cmp(&other.0.id))
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassDescriptor({}, {})", self.0.name, self.0.id)
    }
}

impl fmt::Display for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

/// Shared payload of method and field descriptors.
struct MemberInner {
    id: DescriptorId,
    class: ClassDescriptor,
    name: Arc<str>,
    signature: Arc<str>,
    is_static: bool,
}

impl MemberInner {
    fn content_cmp(&self, other: &MemberInner) -> Ordering {
        self.class
            .name()
            .cmp(other.class.name())
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.signature.cmp(&other.signature))
            .then_with(|| self.is_static.cmp(&other.is_static))
            .then_with(|| self.id.cmp(&other.id))
    }
}

macro_rules! member_descriptor {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name(Arc<MemberInner>);

        impl $name {
            pub(crate) fn new(
                id: DescriptorId,
                class: ClassDescriptor,
                name: Arc<str>,
                signature: Arc<str>,
                is_static: bool,
            ) -> Self {
                $name(Arc::new(MemberInner {
                    id,
                    class,
                    name,
                    signature,
                    is_static,
                }))
            }

            /// The interning id of this member
            #[must_use]
            pub fn id(&self) -> DescriptorId {
                self.0.id
            }

            /// The declaring class
            #[must_use]
            pub fn class(&self) -> &ClassDescriptor {
                &self.0.class
            }

            /// Slashed name of the declaring class
            #[must_use]
            pub fn class_name(&self) -> &str {
                self.0.class.name()
            }

            /// Member name
            #[must_use]
            pub fn name(&self) -> &str {
                &self.0.name
            }

            /// JVM type signature
            #[must_use]
            pub fn signature(&self) -> &str {
                &self.0.signature
            }

            /// Returns `true` for static members
            #[must_use]
            pub fn is_static(&self) -> bool {
                self.0.is_static
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0)
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.id.hash(state);
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.0.content_cmp(&other.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(
                    f,
                    concat!(stringify!($name), "({}.{}{}, static: {}, {})"),
                    self.0.class.name(),
                    self.0.name,
                    self.0.signature,
                    self.0.is_static,
                    self.0.id
                )
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}.{}{}", self.0.class.name(), self.0.name, self.0.signature)
            }
        }
    };
}

member_descriptor! {
    /// Canonical handle of a method: (class, name, signature, static).
    MethodDescriptor
}

member_descriptor! {
    /// Canonical handle of a field: (class, name, signature, static).
    FieldDescriptor
}

/// Any interned descriptor.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Descriptor {
    /// A class descriptor
    Class(ClassDescriptor),
    /// A method descriptor
    Method(MethodDescriptor),
    /// A field descriptor
    Field(FieldDescriptor),
}

impl Descriptor {
    /// The kind of entity this descriptor identifies
    #[must_use]
    pub fn kind(&self) -> DescriptorKind {
        match self {
            Descriptor::Class(_) => DescriptorKind::Class,
            Descriptor::Method(_) => DescriptorKind::Method,
            Descriptor::Field(_) => DescriptorKind::Field,
        }
    }

    /// The interning id of the wrapped descriptor
    #[must_use]
    pub fn id(&self) -> DescriptorId {
        match self {
            Descriptor::Class(class) => class.id(),
            Descriptor::Method(method) => method.id(),
            Descriptor::Field(field) => field.id(),
        }
    }

    /// The class descriptor, or the declaring class for members
    #[must_use]
    pub fn class(&self) -> &ClassDescriptor {
        match self {
            Descriptor::Class(class) => class,
            Descriptor::Method(method) => method.class(),
            Descriptor::Field(field) => field.class(),
        }
    }

    /// Returns the method descriptor if this is one
    #[must_use]
    pub fn as_method(&self) -> Option<&MethodDescriptor> {
        match self {
            Descriptor::Method(method) => Some(method),
            _ => None,
        }
    }

    /// Returns the field descriptor if this is one
    #[must_use]
    pub fn as_field(&self) -> Option<&FieldDescriptor> {
        match self {
            Descriptor::Field(field) => Some(field),
            _ => None,
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Class(class) => class.fmt(f),
            Descriptor::Method(method) => method.fmt(f),
            Descriptor::Field(field) => field.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(id: u32, name: &str) -> ClassDescriptor {
        ClassDescriptor::new(DescriptorId::new(id), Arc::from(name))
    }

    #[test]
    fn class_name_forms() {
        let string = class(1, "java/lang/String");
        assert_eq!(string.dotted_name(), "java.lang.String");
        assert_eq!(string.simple_name(), "String");
        assert_eq!(string.package_name(), "java.lang");
        assert_eq!(string.signature(), "Ljava/lang/String;");

        let default_pkg = class(2, "Main");
        assert_eq!(default_pkg.package_name(), "");
        assert_eq!(default_pkg.simple_name(), "Main");

        let array = class(3, "[I");
        assert!(array.is_array());
        assert_eq!(array.signature(), "[I");
    }

    #[test]
    fn equality_is_identity() {
        let a = class(1, "a/A");
        let b = class(2, "a/A");
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        // Same content, different instance: ordered by id
        assert_eq!(a.cmp(&b), Ordering::Less);
    }

    #[test]
    fn member_ordering_follows_content() {
        let owner = class(1, "a/A");
        let m1 = MethodDescriptor::new(
            DescriptorId::new(10),
            owner.clone(),
            Arc::from("bar"),
            Arc::from("()V"),
            false,
        );
        let m2 = MethodDescriptor::new(
            DescriptorId::new(5),
            owner.clone(),
            Arc::from("foo"),
            Arc::from("()V"),
            false,
        );
        assert!(m1 < m2);
        assert_eq!(m1.to_string(), "a/A.bar()V");

        let descriptor = Descriptor::Method(m1.clone());
        assert_eq!(descriptor.kind(), DescriptorKind::Method);
        assert_eq!(descriptor.id(), DescriptorId::new(10));
        assert_eq!(descriptor.class(), &owner);
        assert!(descriptor.as_field().is_none());
        assert_eq!(DescriptorKind::Field.to_string(), "field");
    }
}
