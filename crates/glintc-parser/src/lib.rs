//! The recursive-descent parser gluing the lexer's token stream to the
//! emitter's bytecode operations.
//!
//! Depends on `glintc-lex` for tokens and `glintc-emit` for the only way it
//! can affect the output; never touches `glintc-vm`.

pub mod parser;

pub use parser::{compile, Parser};
