//! `Array` - ordered, integer-indexed sequence of Value cells.
//!
//! The data model allows associative (string-keyed) storage too, but every
//! operation this repository implements (`ARRAY`/`ARRAY0`/`ARRAYK`,
//! `IDXA`/`IDXV`, `LEN`) only ever uses integer keys, so the associative
//! side is left as a documented extension point (`Array::set_named` /
//! `get_named`) rather than wired into any opcode.

use crate::value::Value;
use rustc_hash::FxHashMap;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Array {
    elems: Vec<Value>,
    named: FxHashMap<String, Value>,
}

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an array from `n` popped values where `values[i]` is the
    /// element that was `n - 1 - i` from the top of the stack, per the
    /// `ARRAY`/`ARRAY0`/`ARRAYK` contract.
    pub fn from_values(values: Vec<Value>) -> Self {
        Self {
            elems: values,
            named: FxHashMap::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn get(&self, index: i64) -> Option<&Value> {
        usize::try_from(index).ok().and_then(|i| self.elems.get(i))
    }

    pub fn get_mut(&mut self, index: i64) -> Option<&mut Value> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.elems.get_mut(i))
    }

    /// Returns a mutable reference to the element at `index`, growing the
    /// backing vector with `NULL` padding if `index` is beyond the current
    /// length - this is how `IDXA` "creates it NULL" on first write.
    pub fn get_or_insert_mut(&mut self, index: i64) -> Option<&mut Value> {
        let i = usize::try_from(index).ok()?;
        if i >= self.elems.len() {
            self.elems.resize_with(i + 1, || Value::Null);
        }
        self.elems.get_mut(i)
    }

    pub fn set_named(&mut self, key: impl Into<String>, value: Value) {
        self.named.insert(key.into(), value);
    }

    pub fn get_named(&self, key: &str) -> Option<&Value> {
        self.named.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.elems.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_values_preserves_order() {
        let a = Array::from_values(vec![Value::Int(10), Value::Int(20), Value::Int(30)]);
        assert_eq!(a.get(1), Some(&Value::Int(20)));
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn get_or_insert_mut_pads_with_null() {
        let mut a = Array::new();
        *a.get_or_insert_mut(2).unwrap() = Value::Int(7);
        assert_eq!(a.len(), 3);
        assert_eq!(a.get(0), Some(&Value::Null));
        assert_eq!(a.get(2), Some(&Value::Int(7)));
    }

    #[test]
    fn named_storage_is_independent_of_integer_indices() {
        let mut a = Array::new();
        a.set_named("k", Value::Int(1));
        assert_eq!(a.get_named("k"), Some(&Value::Int(1)));
        assert_eq!(a.get(0), None);
    }
}
