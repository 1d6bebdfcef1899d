//! The stack-based interpreter that executes a [`glintc_util::CodeObject`].
//!
//! Depends on the bytecode layout and the value model only (`glintc-util`),
//! never on `glintc-emit` or `glintc-parser` - an embedder can run
//! hand-assembled or externally-produced bytecode through this crate alone.

pub mod address;
pub mod config;
pub mod numeric;
pub mod vm;

pub use address::Address;
pub use config::VmConfig;
pub use vm::Vm;
