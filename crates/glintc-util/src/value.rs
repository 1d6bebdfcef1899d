//! `Value` - the tagged union every opcode operates on.
//!
//! Tag is one of `{NULL, INT, FLOAT, STRING, ARRAY, FN}`. `Fn` carries a
//! code-object-relative entry point but is never constructed by the
//! supplied parser or VM - user-defined functions are an explicit
//! Non-goal; the tag exists so `TEST`'s "FN is always true" rule and the
//! opcode table's `CALL`/`RET`/`RET1` placeholders type-check against
//! something.

use crate::array::Array;
use crate::gstring::GString;
use std::fmt;
use std::rc::Rc;

/// An entry point for a not-yet-implemented function value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FnHandle(pub u32);

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    /// `Rc` rather than a bare `GString` because array elements and global
    /// cells are frequently cloned onto the stack; cloning the handle is
    /// O(1) where cloning the bytes would not be.
    Str(Rc<GString>),
    Array(Rc<std::cell::RefCell<Array>>),
    Fn(FnHandle),
}

impl Value {
    pub fn str(s: impl Into<Vec<u8>>) -> Self {
        Value::Str(Rc::new(GString::new(s.into())))
    }

    pub fn array(a: Array) -> Self {
        Value::Array(Rc::new(std::cell::RefCell::new(a)))
    }

    pub fn tag_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Int(_) => "INT",
            Value::Float(_) => "FLOAT",
            Value::Str(_) => "STRING",
            Value::Array(_) => "ARRAY",
            Value::Fn(_) => "FN",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Array(a) => {
                write!(f, "[")?;
                for (i, v) in a.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Fn(h) => write!(f, "<fn {}>", h.0),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_null() {
        assert_eq!(Value::default(), Value::Null);
    }

    #[test]
    fn display_int_and_float() {
        assert_eq!(Value::Int(7).to_string(), "7");
        assert_eq!(Value::Float(1.5).to_string(), "1.5");
    }

    #[test]
    fn display_str() {
        assert_eq!(Value::str("hi").to_string(), "hi");
    }

    #[test]
    fn display_array() {
        let a = Value::array(Array::from_values(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(a.to_string(), "[1, 2]");
    }
}
