//! Per-phase error enums.
//!
//! Each compiler/VM phase gets its own `thiserror`-derived enum so call
//! sites match exhaustively instead of stringly; `glintc-driver::GlintError`
//! wraps all four with `#[from]` and is the only place that turns one into
//! a process exit code (see §7/§11 of SPEC_FULL.md).

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("line {line}: unexpected character {ch:?}")]
    UnexpectedChar { line: u32, ch: char },

    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: u32 },

    #[error("line {line}: unterminated block comment")]
    UnterminatedComment { line: u32 },

    #[error("line {line}: invalid escape sequence '\\{ch}'")]
    InvalidEscape { line: u32, ch: char },

    #[error("line {line}: decimal byte escape \\{value} exceeds 255")]
    EscapeByteOverflow { line: u32, value: u32 },

    #[error("line {line}: '.' is not valid in a binary literal")]
    DotInBinaryLiteral { line: u32 },

    #[error("line {line}: invalid numeric literal")]
    InvalidNumber { line: u32 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: unexpected token {found}, expected {expected}")]
    UnexpectedToken {
        line: u32,
        found: String,
        expected: String,
    },

    #[error("line {line}: {what} is not yet supported")]
    Unsupported { line: u32, what: String },

    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Emit(#[from] EmitError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmitError {
    #[error("constant table overflow: cannot intern more than 256 constants")]
    ConstantTableFull,

    #[error("jump displacement {0} does not fit in a signed byte")]
    ShortJumpOutOfRange(i64),

    #[error("jump displacement {0} does not fit in a signed 16-bit word")]
    LongJumpOutOfRange(i64),

    #[error("array literal has {0} elements, more than the 255 a single ARRAY immediate can encode")]
    ArrayTooLarge(usize),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    #[error("stack overflow")]
    StackOverflow,

    #[error("stack underflow")]
    StackUnderflow,

    #[error("cannot index into a value of type {0}")]
    InvalidIndexTarget(&'static str),

    #[error("array index {0} out of bounds")]
    ArrayIndexOutOfBounds(i64),

    #[error("malformed bytecode at offset {0}")]
    MalformedBytecode(usize),
}

/// Top-level error every pipeline phase's `Result` can be converted into.
/// Lives here (rather than only in the driver) so library crates that want
/// to run the whole pipeline programmatically (e.g. integration tests) do
/// not need to depend on the driver crate.
#[derive(Debug, Error)]
pub enum GlintError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Emit(#[from] EmitError),
    #[error(transparent)]
    Vm(#[from] VmError),
}
