//! `Address` - what a stack slot actually holds.
//!
//! The stack never holds a bare `Value`; every slot is a reference to a
//! live cell somewhere (a reserve-pool slot, a global, a local, an array
//! element, or an argv element), matching the "address on stack" model.
//! Reading/writing through an `Address` always goes through [`crate::vm::Vm`]
//! rather than holding a Rust reference, since a `Global`'s cell can move
//! when the hash table resizes and an array element's cell lives behind a
//! `RefCell`.

use std::rc::Rc;

use glintc_util::{Array, GString};

#[derive(Clone, Debug)]
pub enum Address {
    Reserve(usize),
    Global(Rc<GString>),
    Local(usize),
    Array(Rc<std::cell::RefCell<Array>>, i64),
    Arg(i64),
}
