//! Token kinds and the `Token` the lexer hands the parser.

use glintc_util::{GString, Symbol};

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Literals
    Flt(f64),
    Int(u64),
    Str(GString),
    Id(Symbol),

    // Single-character
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Hash,
    Tilde,
    Eq,
    Lt,
    Gt,
    Amp,
    Pipe,
    Caret,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,
    Colon,

    // Two-character
    EqEq,
    NotEq,
    LtEq,
    GtEq,
    AndAnd,
    OrOr,
    PlusPlus,
    MinusMinus,
    StarStar,
    Shl,
    Shr,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    AmpEq,
    PipeEq,
    CaretEq,
    ColonColon,
    DotDot,

    // Three-character
    StarStarEq,
    ShlEq,
    ShrEq,
    ColonColonEq,

    // Keywords
    KwBreak,
    KwContinue,
    KwDo,
    KwElse,
    KwExit,
    KwFn,
    KwFor,
    KwIf,
    KwLocal,
    KwPrint,
    KwReturn,
    KwWhile,
    KwElif,
    KwIn,
    KwLoop,

    /// End-of-input sentinel.
    Eoi,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, line: u32) -> Self {
        Self { kind, line }
    }

    pub fn eoi(line: u32) -> Self {
        Self::new(TokenKind::Eoi, line)
    }

    pub fn is_eoi(&self) -> bool {
        matches!(self.kind, TokenKind::Eoi)
    }
}

/// Maps a scanned identifier to its keyword token kind, or `None` if it is
/// a plain identifier. A hand-written match over the full scanned word,
/// rather than the character-by-character "peek the next char" trick a C
/// lexer uses to bail out of a keyword match early - in Rust, comparing
/// the fully-scanned `&str` against a keyword table is just as fast and a
/// great deal easier to read.
pub fn keyword(word: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match word {
        "break" => KwBreak,
        "continue" => KwContinue,
        "do" => KwDo,
        "else" => KwElse,
        "exit" => KwExit,
        "fn" => KwFn,
        "for" => KwFor,
        "if" => KwIf,
        "local" => KwLocal,
        "print" => KwPrint,
        "return" => KwReturn,
        "while" => KwWhile,
        "elif" => KwElif,
        "in" => KwIn,
        "loop" => KwLoop,
        _ => return None,
    })
}
