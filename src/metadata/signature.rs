//! JVM type-signature parsing.
//!
//! Method signatures (`(ILjava/lang/String;[J)V`) and field signatures (`[Ljava/lang/Object;`)
//! are validated when descriptors are interned and parsed again on demand, e.g. to count the
//! parameters of a [`crate::metadata::method::MethodInfo`]. Only erased descriptor syntax is
//! handled here; generic source signatures are kept as opaque strings.

use crate::{Error, Result};

/// Parser for a single JVM method signature.
///
/// # Examples
///
/// ```rust
/// use jvmscope::metadata::signature::SignatureParser;
///
/// let parser = SignatureParser::new("(ILjava/lang/String;[J)Z")?;
/// assert_eq!(parser.num_parameters(), 3);
/// assert_eq!(parser.return_type(), "Z");
/// assert_eq!(parser.parameters().nth(1), Some("Ljava/lang/String;"));
/// # Ok::<(), jvmscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct SignatureParser<'a> {
    signature: &'a str,
    /// Byte ranges of every parameter type inside `signature`
    params: Vec<(usize, usize)>,
    /// Byte offset where the return type starts
    return_start: usize,
}

impl<'a> SignatureParser<'a> {
    /// Parses `signature`, which must be a complete method signature.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDescriptor`] if the signature is not well formed.
    pub fn new(signature: &'a str) -> Result<Self> {
        let bytes = signature.as_bytes();
        if bytes.first() != Some(&b'(') {
            return Err(Error::InvalidDescriptor(format!(
                "method signature must start with '(' - {signature}"
            )));
        }

        let mut params = Vec::new();
        let mut pos = 1;
        loop {
            match bytes.get(pos) {
                Some(b')') => break,
                Some(_) => {
                    let end = type_end(bytes, pos, false).ok_or_else(|| {
                        Error::InvalidDescriptor(format!(
                            "bad parameter type at offset {pos} - {signature}"
                        ))
                    })?;
                    params.push((pos, end));
                    pos = end;
                }
                None => {
                    return Err(Error::InvalidDescriptor(format!(
                        "unterminated parameter list - {signature}"
                    )))
                }
            }
        }

        let return_start = pos + 1;
        match type_end(bytes, return_start, true) {
            Some(end) if end == bytes.len() => Ok(SignatureParser {
                signature,
                params,
                return_start,
            }),
            _ => Err(Error::InvalidDescriptor(format!(
                "bad return type - {signature}"
            ))),
        }
    }

    /// Number of declared parameters (`long` and `double` count once)
    #[must_use]
    pub fn num_parameters(&self) -> usize {
        self.params.len()
    }

    /// Iterator over the parameter type signatures, in declaration order
    pub fn parameters(&self) -> impl Iterator<Item = &'a str> + '_ {
        let signature = self.signature;
        self.params
            .iter()
            .map(move |&(start, end)| &signature[start..end])
    }

    /// The return type signature, `V` for void
    #[must_use]
    pub fn return_type(&self) -> &'a str {
        &self.signature[self.return_start..]
    }

    /// Returns `true` if the method returns an object or array reference
    #[must_use]
    pub fn returns_reference(&self) -> bool {
        is_reference_type(self.return_type())
    }
}

/// Returns `true` if `signature` denotes an object or array type.
#[must_use]
pub fn is_reference_type(signature: &str) -> bool {
    signature.starts_with('L') || signature.starts_with('[')
}

/// Returns `true` if `signature` is exactly one well formed field type.
#[must_use]
pub fn is_valid_field_type(signature: &str) -> bool {
    let bytes = signature.as_bytes();
    matches!(type_end(bytes, 0, false), Some(end) if end == bytes.len())
}

/// Returns `true` if `signature` is a well formed method signature.
#[must_use]
pub fn is_valid_method_signature(signature: &str) -> bool {
    SignatureParser::new(signature).is_ok()
}

/// Finds the end offset of the type starting at `start`.
fn type_end(bytes: &[u8], start: usize, allow_void: bool) -> Option<usize> {
    let mut pos = start;
    let mut dims = 0usize;
    while bytes.get(pos) == Some(&b'[') {
        pos += 1;
        dims += 1;
        // The JVM limits arrays to 255 dimensions
        if dims > 255 {
            return None;
        }
    }

    match bytes.get(pos)? {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' => Some(pos + 1),
        b'V' if allow_void && dims == 0 => Some(pos + 1),
        b'L' => {
            let rest = &bytes[pos + 1..];
            let len = rest.iter().position(|&b| b == b';')?;
            let name = &rest[..len];
            if name.is_empty()
                || name.first() == Some(&b'/')
                || name.last() == Some(&b'/')
                || name.windows(2).any(|w| w == b"//")
                || name
                    .iter()
                    .any(|b| matches!(b, b'.' | b'[' | b'(' | b')' | b'<' | b'>'))
            {
                return None;
            }
            Some(pos + 1 + len + 1)
        }
        _ => None,
    }
}
