//! Type encoding for method signatures.
//!
//! Every registered method carries a compact signature string in the
//! Objective-C `@encode()` style:
//!
//! - First character: return type
//! - `@`: the receiver (self)
//! - `:`: the selector (_cmd)
//! - Remaining characters: argument types
//!
//! # Encoding Format
//!
//! - `v` - void
//! - `B` - bool
//! - `i` - int (i32)
//! - `q` - long long (i64)
//! - `d` - double (f64)
//! - `*` - string
//! - `@` - object (receiver)
//! - `:` - selector
//!
//! Example encodings:
//! - `"*@:"` - string getter
//! - `"v@:*"` - string setter
//! - `"v@:ii"` - two-argument command

use crate::error::{Error, Result};

/// Type encoding constant definitions.
pub mod types {
    /// Void type encoding
    pub const VOID: char = 'v';

    /// Bool type encoding
    pub const BOOL: char = 'B';

    /// Int (i32) type encoding
    pub const INT: char = 'i';

    /// Long long (i64) type encoding
    pub const LONG_LONG: char = 'q';

    /// Double (f64) type encoding
    pub const DOUBLE: char = 'd';

    /// String type encoding
    pub const STRING: char = '*';

    /// `Object` (receiver) type encoding
    pub const OBJECT: char = '@';

    /// `Selector` type encoding
    pub const SELECTOR: char = ':';
}

/// Checks if a character may appear as a value (return or argument) type.
const fn is_value_type_char(ch: char) -> bool {
    matches!(ch, 'B' | 'i' | 'q' | 'd' | '*')
}

/// Parsed method signature.
///
/// Holds the return type and the argument types after the implicit
/// receiver and selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    ret: char,
    args: Vec<char>,
}

impl Signature {
    /// Return type encoding.
    #[must_use]
    pub const fn return_type(&self) -> char {
        self.ret
    }

    /// Argument type encodings, excluding receiver and selector.
    #[must_use]
    pub fn arg_types(&self) -> &[char] {
        &self.args
    }

    /// Number of explicit arguments.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Zero arguments and a value return.
    #[must_use]
    pub fn is_getter_shape(&self) -> bool {
        self.args.is_empty() && self.ret != types::VOID
    }

    /// Exactly one argument and a void return.
    #[must_use]
    pub fn is_setter_shape(&self) -> bool {
        self.args.len() == 1 && self.ret == types::VOID
    }
}

/// Validates a type encoding string for a method signature.
///
/// # Example
///
/// ```
/// use metafactory::runtime::encoding::validate_encoding;
///
/// assert!(validate_encoding("v@:").is_ok());
/// assert!(validate_encoding("i@:i").is_ok());
/// assert!(validate_encoding("xyz").is_err());
/// assert!(validate_encoding("*").is_err()); // Missing self and _cmd
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidEncoding`] if the string is empty, contains an
/// unknown character, lacks the `@:` prefix after the return type, or uses
/// `@`/`:`/`v` where a value type is required.
pub fn validate_encoding(encoding: &str) -> Result<()> {
    parse_signature(encoding).map(|_| ())
}

/// Parses a method signature encoding.
///
/// # Example
///
/// ```
/// use metafactory::runtime::encoding::parse_signature;
///
/// let sig = parse_signature("v@:*").unwrap();
/// assert_eq!(sig.return_type(), 'v');
/// assert_eq!(sig.arg_types(), &['*']);
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidEncoding`] for malformed encodings (see
/// [`validate_encoding`]).
pub fn parse_signature(encoding: &str) -> Result<Signature> {
    let invalid = || Error::InvalidEncoding {
        encoding: encoding.to_string(),
    };

    let mut chars = encoding.chars();
    let ret = chars.next().ok_or_else(invalid)?;
    if ret != types::VOID && !is_value_type_char(ret) {
        return Err(invalid());
    }

    // All methods receive self and _cmd
    if chars.next() != Some(types::OBJECT) || chars.next() != Some(types::SELECTOR) {
        return Err(invalid());
    }

    let args: Vec<char> = chars.collect();
    if args.iter().any(|&ch| !is_value_type_char(ch)) {
        return Err(invalid());
    }

    Ok(Signature { ret, args })
}

/// Builds the encoding of a getter returning `ret`.
#[must_use]
pub fn getter_encoding(ret: char) -> String {
    format!("{ret}@:")
}

/// Builds the encoding of a setter taking `arg`.
#[must_use]
pub fn setter_encoding(arg: char) -> String {
    format!("v@:{arg}")
}

/// Whether a value of type `from` may be passed where `to` is declared.
///
/// Identity, plus the widening conversions `i -> q`, `i -> d`, `q -> d`.
#[must_use]
pub const fn is_assignable(from: char, to: char) -> bool {
    from == to || matches!((from, to), ('i', 'q') | ('i', 'd') | ('q', 'd'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_encoding_valid() {
        assert!(validate_encoding("v@:").is_ok());
        assert!(validate_encoding("i@:i").is_ok());
        assert!(validate_encoding("*@:").is_ok());
        assert!(validate_encoding("q@:dq").is_ok());
        assert!(validate_encoding("B@:").is_ok());
    }

    #[test]
    fn test_validate_encoding_invalid() {
        assert!(validate_encoding("").is_err());
        assert!(validate_encoding("xyz").is_err());
        assert!(validate_encoding("v@:x").is_err());
        assert!(validate_encoding("*").is_err()); // Missing self and _cmd
        assert!(validate_encoding("@@:").is_err()); // Object is not a value
        assert!(validate_encoding("v@:v").is_err()); // Void argument
        assert!(validate_encoding("v:@").is_err()); // Swapped prefix
    }

    #[test]
    fn test_parse_signature() {
        let sig = parse_signature("i@:id").unwrap();
        assert_eq!(sig.return_type(), 'i');
        assert_eq!(sig.arg_types(), &['i', 'd']);
        assert_eq!(sig.arity(), 2);

        let sig = parse_signature("v@:").unwrap();
        assert_eq!(sig.return_type(), 'v');
        assert!(sig.arg_types().is_empty());
    }

    #[test]
    fn test_signature_shapes() {
        assert!(parse_signature("*@:").unwrap().is_getter_shape());
        assert!(!parse_signature("v@:").unwrap().is_getter_shape());
        assert!(!parse_signature("*@:i").unwrap().is_getter_shape());

        assert!(parse_signature("v@:*").unwrap().is_setter_shape());
        assert!(!parse_signature("i@:*").unwrap().is_setter_shape());
        assert!(!parse_signature("v@:ii").unwrap().is_setter_shape());
    }

    #[test]
    fn test_accessor_encodings() {
        assert_eq!(getter_encoding(types::STRING), "*@:");
        assert_eq!(setter_encoding(types::BOOL), "v@:B");
        assert!(validate_encoding(&getter_encoding(types::DOUBLE)).is_ok());
        assert!(validate_encoding(&setter_encoding(types::INT)).is_ok());
    }

    #[test]
    fn test_is_assignable() {
        assert!(is_assignable('*', '*'));
        assert!(is_assignable('i', 'q'));
        assert!(is_assignable('i', 'd'));
        assert!(is_assignable('q', 'd'));
        assert!(!is_assignable('q', 'i'));
        assert!(!is_assignable('d', 'i'));
        assert!(!is_assignable('B', 'i'));
        assert!(!is_assignable('i', '*'));
    }
}
