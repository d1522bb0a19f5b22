//! Boxed values at the type-erased boundary.
//!
//! Reflective calls and synthetic accessors take and return [`Value`]. The
//! bound call underneath stays statically typed; [`ValueType`] is the bridge
//! between a concrete Rust type and its boxed form.

use crate::runtime::encoding::types;
use std::fmt;
use std::sync::Arc;

/// A boxed property value.
///
/// Strings are `Arc<str>` so boxing and unboxing a string is a reference
/// count bump, not a copy.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value (setter results).
    Void,
    /// `B`
    Bool(bool),
    /// `i`
    Int(i32),
    /// `q`
    Long(i64),
    /// `d`
    Double(f64),
    /// `*`
    Str(Arc<str>),
}

impl Value {
    /// Type encoding character of this value.
    #[must_use]
    pub const fn encoding(&self) -> char {
        match self {
            Value::Void => types::VOID,
            Value::Bool(_) => types::BOOL,
            Value::Int(_) => types::INT,
            Value::Long(_) => types::LONG_LONG,
            Value::Double(_) => types::DOUBLE,
            Value::Str(_) => types::STRING,
        }
    }

    /// Borrows the string payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this is [`Value::Void`].
    #[must_use]
    pub const fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => f.write_str("void"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Long(l) => write!(f, "{l}"),
            Value::Double(d) => write!(f, "{d}"),
            Value::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

/// A Rust type that can cross the erased boundary.
///
/// `from_value` applies the same widening the reflective path accepts
/// (`Int` into `i64`/`f64`, `Long` into `f64`).
pub trait ValueType: Sized + Send + Sync + 'static {
    /// Type encoding character.
    const ENCODING: char;

    /// Boxes `self`.
    fn into_value(self) -> Value;

    /// Unboxes, or `None` when the variant does not fit.
    fn from_value(value: &Value) -> Option<Self>;
}

impl ValueType for bool {
    const ENCODING: char = types::BOOL;

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl ValueType for i32 {
    const ENCODING: char = types::INT;

    fn into_value(self) -> Value {
        Value::Int(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl ValueType for i64 {
    const ENCODING: char = types::LONG_LONG;

    fn into_value(self) -> Value {
        Value::Long(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(i64::from(*i)),
            Value::Long(l) => Some(*l),
            _ => None,
        }
    }
}

impl ValueType for f64 {
    const ENCODING: char = types::DOUBLE;

    fn into_value(self) -> Value {
        Value::Double(self)
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(f64::from(*i)),
            Value::Long(l) => Some(*l as f64),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }
}

impl ValueType for Arc<str> {
    const ENCODING: char = types::STRING;

    fn into_value(self) -> Value {
        Value::Str(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(Arc::clone(s)),
            _ => None,
        }
    }
}

impl ValueType for String {
    const ENCODING: char = types::STRING;

    fn into_value(self) -> Value {
        Value::Str(Arc::from(self))
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
}

macro_rules! impl_from_value_type {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    v.into_value()
                }
            }
        )*
    };
}

impl_from_value_type!(bool, i32, i64, f64, Arc<str>, String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_encoding() {
        assert_eq!(Value::Void.encoding(), 'v');
        assert_eq!(Value::Bool(true).encoding(), 'B');
        assert_eq!(Value::Int(1).encoding(), 'i');
        assert_eq!(Value::Long(1).encoding(), 'q');
        assert_eq!(Value::Double(1.0).encoding(), 'd');
        assert_eq!(Value::from("x").encoding(), '*');
    }

    #[test]
    fn test_encoding_matches_value_type() {
        assert_eq!(true.into_value().encoding(), bool::ENCODING);
        assert_eq!(7i32.into_value().encoding(), i32::ENCODING);
        assert_eq!(7i64.into_value().encoding(), i64::ENCODING);
        assert_eq!(7.5f64.into_value().encoding(), f64::ENCODING);
        assert_eq!(String::from("s").into_value().encoding(), String::ENCODING);
    }

    #[test]
    fn test_widening_unbox() {
        assert_eq!(i64::from_value(&Value::Int(3)), Some(3));
        assert_eq!(f64::from_value(&Value::Int(3)), Some(3.0));
        assert_eq!(f64::from_value(&Value::Long(4)), Some(4.0));
        assert_eq!(i32::from_value(&Value::Long(4)), None);
        assert_eq!(bool::from_value(&Value::Int(1)), None);
    }

    #[test]
    fn test_string_unbox_shares_allocation() {
        let value = Value::from("shared");
        let a = <Arc<str>>::from_value(&value).unwrap();
        let Value::Str(inner) = &value else {
            panic!("expected a string value");
        };
        assert!(Arc::ptr_eq(&a, inner));
        assert_eq!(String::from_value(&value).as_deref(), Some("shared"));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Void.to_string(), "void");
        assert_eq!(Value::Int(-2).to_string(), "-2");
        assert_eq!(Value::from("abc").to_string(), "\"abc\"");
        assert!(Value::Void.is_void());
        assert_eq!(Value::from("abc").as_str(), Some("abc"));
        assert_eq!(Value::Bool(false).as_str(), None);
    }
}
