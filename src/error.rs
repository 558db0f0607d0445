use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## Lookup Errors
/// - [`Error::InvalidDescriptor`] - Empty or syntactically invalid class, member or signature
/// - [`Error::ClassNotFound`] - A class lookup through the context failed
/// - [`Error::MissingClass`] - The classfile reader has no class under that name
/// - [`Error::ClassUnavailable`] - A class analysis could not be produced
///
/// ## Classfile Errors
/// - [`Error::Malformed`] - The classfile reader produced an inconsistent class
///
/// ## Contract Violations
/// - [`Error::Unsupported`] - The operation is not available on this context variant
///
/// ## Miscellaneous
/// - [`Error::FileError`] - I/O errors, mostly while writing reports
/// - [`Error::GraphError`] - Invalid node references in the inheritance graph
/// - [`Error::Error`] - Anything else
///
/// # Examples
///
/// ```rust
/// use jvmscope::Error;
///
/// fn describe(err: &Error) -> &'static str {
///     match err {
///         Error::ClassNotFound { .. } => "lookup failed",
///         Error::Unsupported(_) => "caller bug",
///         _ => "other",
///     }
/// }
/// # let _ = describe;
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A descriptor could not be interned.
    ///
    /// Raised by the [`crate::metadata::registry::DescriptorRegistry`] when a class name,
    /// member name or type signature is empty or does not follow JVM naming rules.
    #[error("Invalid descriptor - {0}")]
    InvalidDescriptor(String),

    /// A class could not be found through the analysis context.
    ///
    /// The message distinguishes a syntactically invalid name (`Invalid class name: ...`)
    /// from a genuine resolution failure (`Class not found: ...`), in which case the
    /// original cause is attached.
    #[error("{message}")]
    ClassNotFound {
        /// Human readable reason
        message: String,
        /// The failure that caused the lookup to fail, if any
        #[source]
        source: Option<Box<Error>>,
    },

    /// The classfile reader does not know the requested class.
    #[error("Missing class - {0}")]
    MissingClass(String),

    /// A class analysis could not be computed because the class structure was unavailable.
    #[error("Class {class} is unavailable")]
    ClassUnavailable {
        /// Slashed name of the class
        class: String,
        /// The underlying read or build failure
        #[source]
        source: Box<Error>,
    },

    /// The classfile is damaged and could not be turned into class metadata.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The operation is not supported by this context variant.
    ///
    /// This signals caller misuse, never a data problem, and is not recovered from
    /// anywhere inside the library.
    #[error("Operation not supported by this context - {0}")]
    Unsupported(&'static str),

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Inheritance graph error.
    #[error("{0}")]
    GraphError(String),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}

impl Error {
    /// Returns `true` if this error (or the error it wraps) means the class does not exist.
    #[must_use]
    pub fn is_missing_class(&self) -> bool {
        match self {
            Error::MissingClass(_) => true,
            Error::ClassUnavailable { source, .. } => source.is_missing_class(),
            Error::ClassNotFound {
                source: Some(source),
                ..
            } => source.is_missing_class(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn malformed_macro_records_location() {
        let err = malformed_error!("bad class {}", "a/B");
        match err {
            Error::Malformed { message, file, .. } => {
                assert_eq!(message, "bad class a/B");
                assert!(file.ends_with("error.rs"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_class_is_seen_through_wrappers() {
        let err = Error::ClassNotFound {
            message: "Class not found: a.B".to_string(),
            source: Some(Box::new(Error::ClassUnavailable {
                class: "a/B".to_string(),
                source: Box::new(Error::MissingClass("a/B".to_string())),
            })),
        };
        assert!(err.is_missing_class());
        assert!(err.source().is_some());
        assert!(!Error::Unsupported("x").is_missing_class());
    }
}
