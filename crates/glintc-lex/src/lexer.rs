//! The hand-written lexer.
//!
//! Operates on raw bytes rather than `char`s: every character class the
//! grammar cares about (`[A-Za-z_]`, digits, the fixed operator set) is
//! ASCII, so there is no multi-byte decoding to get right, and string
//! literals are explicitly byte arrays rather than validated UTF-8 (see
//! `GString`). One-token lookahead is modeled directly: `current()` is
//! always valid, `advance()` consumes it and scans the next, `peek()`
//! scans the next into a side slot without disturbing `current()`.

use glintc_util::error::LexError;
use glintc_util::GString;

use crate::token::{keyword, Token, TokenKind};

pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: u32,
    current: Token,
    lookahead: Option<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Result<Self, LexError> {
        let mut lexer = Lexer {
            src: src.as_bytes(),
            pos: 0,
            line: 1,
            current: Token::eoi(1),
            lookahead: None,
        };
        lexer.current = lexer.scan_token()?;
        Ok(lexer)
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    /// Discards the current token and scans the next one (consuming the
    /// lookahead slot if `peek` had already filled it), returning it.
    pub fn advance(&mut self) -> Result<&Token, LexError> {
        let next = match self.lookahead.take() {
            Some(tok) => tok,
            None => self.scan_token()?,
        };
        self.current = next;
        Ok(&self.current)
    }

    /// Scans ahead into the lookahead slot without disturbing `current`.
    pub fn peek(&mut self) -> Result<&Token, LexError> {
        if self.lookahead.is_none() {
            self.lookahead = Some(self.scan_token()?);
        }
        Ok(self.lookahead.as_ref().unwrap())
    }

    // -- low-level cursor -------------------------------------------------

    fn byte_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn peek_byte(&self) -> Option<u8> {
        self.byte_at(0)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    /// Consumes and returns the current byte, bumping the line counter on
    /// CR or LF independently (a CRLF pair therefore counts as two lines,
    /// matching the lexer this repository is grounded on).
    fn bump(&mut self) -> Option<u8> {
        let b = self.peek_byte()?;
        self.pos += 1;
        if b == b'\n' || b == b'\r' {
            self.line += 1;
        }
        Some(b)
    }

    fn matches(&mut self, expected: u8) -> bool {
        if self.peek_byte() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // -- top-level dispatch -------------------------------------------------

    fn scan_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia()?;
        let line = self.line;
        let Some(c) = self.peek_byte() else {
            return Ok(Token::eoi(line));
        };

        if is_digit(c) || (c == b'.' && self.byte_at(1).is_some_and(is_digit)) {
            return self.scan_number(line);
        }
        if is_alpha(c) {
            return self.scan_ident_or_keyword(line);
        }
        if c == b'\'' || c == b'"' {
            return self.scan_string(line, c);
        }
        self.scan_operator(line)
    }

    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek_byte() {
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => {
                    self.bump();
                }
                Some(b'/') if self.byte_at(1) == Some(b'/') => {
                    while !matches!(self.peek_byte(), None | Some(b'\n')) {
                        self.bump();
                    }
                }
                Some(b'/') if self.byte_at(1) == Some(b'*') => {
                    let start_line = self.line;
                    self.bump();
                    self.bump();
                    loop {
                        match (self.peek_byte(), self.byte_at(1)) {
                            (None, _) => {
                                return Err(LexError::UnterminatedComment { line: start_line })
                            }
                            (Some(b'*'), Some(b'/')) => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            _ => {
                                self.bump();
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    // -- identifiers / keywords -------------------------------------------------

    fn scan_ident_or_keyword(&mut self, line: u32) -> Result<Token, LexError> {
        let start = self.pos;
        while self.peek_byte().is_some_and(is_alnum) {
            self.pos += 1;
        }
        let word = std::str::from_utf8(&self.src[start..self.pos])
            .expect("identifier bytes are ASCII by construction");
        let kind = keyword(word).unwrap_or_else(|| TokenKind::Id(glintc_util::Symbol::intern(word)));
        Ok(Token::new(kind, line))
    }

    // -- numbers -------------------------------------------------

    fn scan_number(&mut self, line: u32) -> Result<Token, LexError> {
        let mut base: u32 = 10;
        if self.peek_byte() == Some(b'0') {
            match self.byte_at(1) {
                Some(b'x') | Some(b'X') => {
                    base = 16;
                    self.bump();
                    self.bump();
                }
                Some(b'b') | Some(b'B') => {
                    base = 2;
                    self.bump();
                    self.bump();
                }
                _ => {}
            }
        }

        let mut int_value: u64 = 0;
        let mut float_value: f64 = 0.0;
        let mut overflowed = false;
        let mut saw_digit = false;
        while let Some(d) = self.peek_byte().and_then(|b| digit_value(b, base)) {
            saw_digit = true;
            float_value = float_value * base as f64 + d as f64;
            match int_value
                .checked_mul(base as u64)
                .and_then(|v| v.checked_add(d as u64))
            {
                Some(v) => int_value = v,
                None => overflowed = true,
            }
            self.bump();
        }

        let has_fraction = self.peek_byte() == Some(b'.') && self.byte_at(1) != Some(b'.');
        if has_fraction {
            if base == 2 {
                return Err(LexError::DotInBinaryLiteral { line });
            }
            self.bump(); // consume '.'
            let mut scale = 1.0 / base as f64;
            while let Some(d) = self.peek_byte().and_then(|b| digit_value(b, base)) {
                saw_digit = true;
                float_value += d as f64 * scale;
                scale /= base as f64;
                self.bump();
            }
            if !saw_digit {
                return Err(LexError::InvalidNumber { line });
            }
            return Ok(Token::new(TokenKind::Flt(float_value), line));
        }

        if !saw_digit {
            return Err(LexError::InvalidNumber { line });
        }

        let demote_to_float = overflowed || (base == 10 && int_value > i64::MAX as u64);
        let kind = if demote_to_float {
            TokenKind::Flt(float_value)
        } else {
            TokenKind::Int(int_value)
        };
        Ok(Token::new(kind, line))
    }

    // -- strings -------------------------------------------------

    fn scan_string(&mut self, line: u32, quote: u8) -> Result<Token, LexError> {
        self.bump(); // opening quote
        let mut bytes = Vec::new();
        loop {
            match self.peek_byte() {
                None => return Err(LexError::UnterminatedString { line }),
                Some(b) if b == quote => {
                    self.bump();
                    break;
                }
                Some(b'\\') => {
                    self.bump();
                    self.scan_escape(line, &mut bytes)?;
                }
                Some(b'\r') => {
                    // Bare CR or CRLF inside a string normalizes to '\n'.
                    self.bump();
                    if self.peek_byte() == Some(b'\n') {
                        self.bump();
                    }
                    bytes.push(b'\n');
                }
                Some(b) => {
                    self.bump();
                    bytes.push(b);
                }
            }
        }
        Ok(Token::new(TokenKind::Str(GString::new(bytes)), line))
    }

    fn scan_escape(&mut self, line: u32, out: &mut Vec<u8>) -> Result<(), LexError> {
        let Some(c) = self.peek_byte() else {
            return Err(LexError::UnterminatedString { line });
        };
        match c {
            b'a' => {
                self.bump();
                out.push(0x07);
            }
            b'b' => {
                self.bump();
                out.push(0x08);
            }
            b'e' => {
                self.bump();
                out.push(0x1B);
            }
            b'f' => {
                self.bump();
                out.push(0x0C);
            }
            b'n' => {
                self.bump();
                out.push(b'\n');
            }
            b'r' => {
                self.bump();
                out.push(b'\r');
            }
            b't' => {
                self.bump();
                out.push(b'\t');
            }
            b'v' => {
                self.bump();
                out.push(0x0B);
            }
            b'\\' | b'\'' | b'"' => {
                self.bump();
                out.push(c);
            }
            b'\n' | b'\r' => {
                self.bump();
                out.push(b'\n');
            }
            b'x' => {
                self.bump();
                let mut value: u32 = 0;
                let mut digits = 0;
                while digits < 2 {
                    let Some(h) = self.peek_byte().and_then(|b| digit_value(b, 16)) else {
                        break;
                    };
                    value = value * 16 + h as u32;
                    self.bump();
                    digits += 1;
                }
                out.push(value as u8);
            }
            b'0'..=b'9' => {
                let mut value: u32 = 0;
                let mut digits = 0;
                while digits < 3 {
                    let Some(d) = self.peek_byte().and_then(|b| digit_value(b, 10)) else {
                        break;
                    };
                    value = value * 10 + d as u32;
                    self.bump();
                    digits += 1;
                }
                if value > 255 {
                    return Err(LexError::EscapeByteOverflow { line, value });
                }
                out.push(value as u8);
            }
            other => return Err(LexError::InvalidEscape { line, ch: other as char }),
        }
        Ok(())
    }

    // -- operators -------------------------------------------------

    fn scan_operator(&mut self, line: u32) -> Result<Token, LexError> {
        use TokenKind::*;
        let c = self.bump().expect("caller already peeked a byte");
        let kind = match c {
            b'+' => {
                if self.matches(b'+') {
                    PlusPlus
                } else if self.matches(b'=') {
                    PlusEq
                } else {
                    Plus
                }
            }
            b'-' => {
                if self.matches(b'-') {
                    MinusMinus
                } else if self.matches(b'=') {
                    MinusEq
                } else {
                    Minus
                }
            }
            b'*' => {
                if self.matches(b'*') {
                    if self.matches(b'=') {
                        StarStarEq
                    } else {
                        StarStar
                    }
                } else if self.matches(b'=') {
                    StarEq
                } else {
                    Star
                }
            }
            b'/' => {
                if self.matches(b'=') {
                    SlashEq
                } else {
                    Slash
                }
            }
            b'%' => {
                if self.matches(b'=') {
                    PercentEq
                } else {
                    Percent
                }
            }
            b'!' => {
                if self.matches(b'=') {
                    NotEq
                } else {
                    Bang
                }
            }
            b'#' => Hash,
            b'~' => Tilde,
            b'=' => {
                if self.matches(b'=') {
                    EqEq
                } else {
                    Eq
                }
            }
            b'<' => {
                if self.matches(b'<') {
                    if self.matches(b'=') {
                        ShlEq
                    } else {
                        Shl
                    }
                } else if self.matches(b'=') {
                    LtEq
                } else {
                    Lt
                }
            }
            b'>' => {
                if self.matches(b'>') {
                    if self.matches(b'=') {
                        ShrEq
                    } else {
                        Shr
                    }
                } else if self.matches(b'=') {
                    GtEq
                } else {
                    Gt
                }
            }
            b'&' => {
                if self.matches(b'&') {
                    AndAnd
                } else if self.matches(b'=') {
                    AmpEq
                } else {
                    Amp
                }
            }
            b'|' => {
                if self.matches(b'|') {
                    OrOr
                } else if self.matches(b'=') {
                    PipeEq
                } else {
                    Pipe
                }
            }
            b'^' => {
                if self.matches(b'=') {
                    CaretEq
                } else {
                    Caret
                }
            }
            b':' => {
                if self.matches(b':') {
                    if self.matches(b'=') {
                        ColonColonEq
                    } else {
                        ColonColon
                    }
                } else {
                    Colon
                }
            }
            b'.' => {
                if self.matches(b'.') {
                    DotDot
                } else {
                    return Err(LexError::UnexpectedChar { line, ch: '.' });
                }
            }
            b'(' => LParen,
            b')' => RParen,
            b'{' => LBrace,
            b'}' => RBrace,
            b'[' => LBracket,
            b']' => RBracket,
            b',' => Comma,
            b';' => Semi,
            other => {
                return Err(LexError::UnexpectedChar {
                    line,
                    ch: other as char,
                })
            }
        };
        Ok(Token::new(kind, line))
    }
}

fn is_alpha(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

fn is_alnum(b: u8) -> bool {
    is_alpha(b) || is_digit(b)
}

fn digit_value(b: u8, base: u32) -> Option<u32> {
    let v = match b {
        b'0'..=b'9' => (b - b'0') as u32,
        b'a'..=b'f' => (b - b'a') as u32 + 10,
        b'A'..=b'F' => (b - b'A') as u32 + 10,
        _ => return None,
    };
    (v < base).then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lex = Lexer::new(src).unwrap();
        let mut out = Vec::new();
        loop {
            let tok = lex.current().clone();
            if tok.is_eoi() {
                break;
            }
            out.push(tok.kind);
            lex.advance().unwrap();
        }
        out
    }

    #[test]
    fn decimal_hex_and_binary_integers() {
        assert_eq!(kinds("0xff"), vec![TokenKind::Int(255)]);
        assert_eq!(kinds("0b11111111"), vec![TokenKind::Int(255)]);
        assert_eq!(kinds("42"), vec![TokenKind::Int(42)]);
    }

    #[test]
    fn i64_overflowing_decimal_becomes_float() {
        match &kinds("9223372036854775808")[0] {
            TokenKind::Flt(f) => assert_eq!(*f, 9223372036854775808.0),
            other => panic!("expected Flt, got {other:?}"),
        }
    }

    #[test]
    fn dot_in_binary_literal_is_an_error() {
        let mut lex = Lexer::new("0b1.1").unwrap();
        // Lexer::new scans the first token eagerly, so the error surfaces there.
        let _ = lex;
        assert!(matches!(
            Lexer::new("0b1.1"),
            Err(LexError::DotInBinaryLiteral { .. })
        ));
    }

    #[test]
    fn leading_dot_float() {
        assert_eq!(kinds(".5"), vec![TokenKind::Flt(0.5)]);
    }

    #[test]
    fn hex_escape_produces_expected_byte() {
        let toks = kinds(r#""\x1b[31m""#);
        match &toks[0] {
            TokenKind::Str(s) => {
                assert_eq!(s.len(), 5);
                assert_eq!(s.byte_at(0), Some(0x1B));
            }
            other => panic!("expected Str, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_block_comment_errors() {
        assert!(matches!(
            Lexer::new("/* unterminated"),
            Err(LexError::UnterminatedComment { .. })
        ));
    }

    #[test]
    fn keyword_vs_identifier_prefix() {
        assert_eq!(kinds("if"), vec![TokenKind::KwIf]);
        assert!(matches!(kinds("ifx")[0], TokenKind::Id(_)));
    }

    #[test]
    fn two_and_three_char_operators() {
        assert_eq!(
            kinds("** **= << <<= >> >>= :: ::="),
            vec![
                TokenKind::StarStar,
                TokenKind::StarStarEq,
                TokenKind::Shl,
                TokenKind::ShlEq,
                TokenKind::Shr,
                TokenKind::ShrEq,
                TokenKind::ColonColon,
                TokenKind::ColonColonEq,
            ]
        );
    }

    #[test]
    fn peek_does_not_disturb_current() {
        let mut lex = Lexer::new("1 2").unwrap();
        assert_eq!(lex.current().kind, TokenKind::Int(1));
        assert_eq!(lex.peek().unwrap().kind, TokenKind::Int(2));
        assert_eq!(lex.current().kind, TokenKind::Int(1));
        lex.advance().unwrap();
        assert_eq!(lex.current().kind, TokenKind::Int(2));
    }

    #[test]
    fn crlf_increments_line_twice() {
        let mut lex = Lexer::new("1\r\n2").unwrap();
        lex.advance().unwrap();
        assert_eq!(lex.current().line, 3);
    }
}
