//! Access flags and element kinds for JVM methods.
//!
//! # Key Types
//! - [`MethodAccessFlags`]: The `access_flags` item of a `method_info` structure, plus the
//!   pseudo flag used for `@Deprecated`
//! - [`ElementType`]: Whether a method is a constructor or an ordinary method, as seen by
//!   annotation targeting

use bitflags::bitflags;
use strum::{Display, EnumIter};

/// Bitmask of the visibility bits
pub const METHOD_VISIBILITY_MASK: u32 = 0x0007;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Method access and property flags
    pub struct MethodAccessFlags: u32 {
        /// Declared `public`
        const PUBLIC = 0x0001;
        /// Declared `private`
        const PRIVATE = 0x0002;
        /// Declared `protected`
        const PROTECTED = 0x0004;
        /// Declared `static`
        const STATIC = 0x0008;
        /// Declared `final`
        const FINAL = 0x0010;
        /// Declared `synchronized`
        const SYNCHRONIZED = 0x0020;
        /// Compiler-generated bridge method
        const BRIDGE = 0x0040;
        /// Declared with a variable number of arguments
        const VARARGS = 0x0080;
        /// Declared `native`
        const NATIVE = 0x0100;
        /// Declared `abstract`
        const ABSTRACT = 0x0400;
        /// Declared `strictfp`
        const STRICT = 0x0800;
        /// Not present in the source code
        const SYNTHETIC = 0x1000;
        /// Carries the `Deprecated` attribute (not a classfile flag)
        const DEPRECATED = 0x20000;
    }
}

impl MethodAccessFlags {
    /// Builds flags from a raw `access_flags` value, dropping unknown bits
    #[must_use]
    pub fn from_raw(flags: u32) -> Self {
        Self::from_bits_truncate(flags)
    }

    /// Only the visibility bits
    #[must_use]
    pub fn visibility(self) -> Self {
        Self::from_bits_truncate(self.bits() & METHOD_VISIBILITY_MASK)
    }
}

/// Program element kind of a method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ElementType {
    /// `<init>`
    #[strum(serialize = "CONSTRUCTOR")]
    Constructor,
    /// Any other method, `<clinit>` included
    #[strum(serialize = "METHOD")]
    Method,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_flags() {
        let flags = MethodAccessFlags::from_raw(0x0001 | 0x0008 | 0x0040 | 0x8000);
        assert!(flags.contains(MethodAccessFlags::PUBLIC));
        assert!(flags.contains(MethodAccessFlags::STATIC));
        assert!(flags.contains(MethodAccessFlags::BRIDGE));
        // 0x8000 is not a method flag
        assert_eq!(flags.bits(), 0x0049);
        assert_eq!(flags.visibility(), MethodAccessFlags::PUBLIC);
    }

    #[test]
    fn element_type_names() {
        assert_eq!(ElementType::Constructor.to_string(), "CONSTRUCTOR");
        assert_eq!(ElementType::Method.to_string(), "METHOD");
    }
}
