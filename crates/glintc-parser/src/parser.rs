//! Recursive-descent parser.
//!
//! Each expression-precedence level is one method; none of them know about
//! bytecode beyond the handful of `Emitter` calls they make. The one wrinkle
//! the grammar in SPEC_FULL.md needs that a plain tree-walker wouldn't is
//! *deferred* address/value resolution: an identifier or index expression
//! doesn't know whether it's about to be read, written, or incremented until
//! the parser sees what comes next, so `parse_primary`/`parse_postfix`
//! return a [`Target`] instead of emitting right away, and the caller picks
//! `finish_value` (GBLV/IDXV) or `finish_address` (GBLA/IDXA).

use glintc_emit::Emitter;
use glintc_lex::{Lexer, TokenKind};
use glintc_util::error::ParseError;
use glintc_util::{CodeObject, Opcode};
use tracing::trace;

/// A not-yet-emitted reference to an lvalue, or `None` for an expression
/// that has already been pushed as a plain value.
enum Target {
    None,
    Global(String),
    Index,
}

#[derive(Default)]
struct LoopCtx {
    /// Placeholder offsets of `break;` jumps, patched once the loop's exit
    /// point is known.
    break_patches: Vec<usize>,
    /// Placeholder offsets of `continue;` jumps, patched once the loop's
    /// continue target (condition recheck, or post-expression) is known.
    continue_patches: Vec<usize>,
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    emitter: Emitter,
    loop_stack: Vec<LoopCtx>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Result<Self, ParseError> {
        Ok(Self {
            lexer: Lexer::new(source)?,
            emitter: Emitter::new(),
            loop_stack: Vec::new(),
        })
    }

    /// Parses and emits the whole program, returning the finished code
    /// object. An implicit `EXIT` is appended so every program has an
    /// explicit terminal instruction even if the source never names one.
    pub fn compile(mut self) -> Result<CodeObject, ParseError> {
        while !matches!(self.lexer.current().kind, TokenKind::Eoi) {
            self.parse_statement()?;
        }
        self.emitter.emit_exit();
        Ok(self.emitter.into_code())
    }

    // -- token plumbing -------------------------------------------------

    fn advance(&mut self) -> Result<(), ParseError> {
        self.lexer.advance()?;
        Ok(())
    }

    fn current_line(&self) -> u32 {
        self.lexer.current().line
    }

    fn expect(&mut self, want: TokenKind) -> Result<(), ParseError> {
        if std::mem::discriminant(&self.lexer.current().kind) == std::mem::discriminant(&want) {
            self.advance()
        } else {
            let found = format!("{:?}", self.lexer.current().kind);
            Err(ParseError::UnexpectedToken {
                line: self.current_line(),
                found,
                expected: format!("{want:?}"),
            })
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            line: self.current_line(),
            found: format!("{:?}", self.lexer.current().kind),
            expected: expected.to_string(),
        }
    }

    fn unsupported(&self, what: &str) -> ParseError {
        ParseError::Unsupported {
            line: self.current_line(),
            what: what.to_string(),
        }
    }

    // -- target resolution -------------------------------------------------

    fn finish_value(&mut self, target: Target) -> Result<(), ParseError> {
        match target {
            Target::None => Ok(()),
            Target::Global(name) => {
                self.emitter.reference_global(&name, false)?;
                Ok(())
            }
            Target::Index => {
                self.emitter.emit_index_value();
                Ok(())
            }
        }
    }

    fn finish_address(&mut self, target: Target) -> Result<(), ParseError> {
        match target {
            Target::Global(name) => {
                self.emitter.reference_global(&name, true)?;
                Ok(())
            }
            Target::Index => {
                self.emitter.emit_index_addr();
                Ok(())
            }
            Target::None => Err(self.unsupported("assignment to a non-lvalue expression")),
        }
    }

    // -- statements -------------------------------------------------

    fn parse_statement(&mut self) -> Result<(), ParseError> {
        trace!(line = self.current_line(), "statement");
        match self.lexer.current().kind {
            TokenKind::KwLocal => self.parse_local(),
            TokenKind::KwPrint => self.parse_print(),
            TokenKind::KwIf => self.parse_if(),
            TokenKind::KwWhile => self.parse_while(),
            TokenKind::KwDo => self.parse_do_while(),
            TokenKind::KwFor => self.parse_for(),
            TokenKind::KwLoop => self.parse_loop(),
            TokenKind::KwBreak => self.parse_break(),
            TokenKind::KwContinue => self.parse_continue(),
            TokenKind::KwExit => self.parse_exit(),
            TokenKind::LBrace => self.parse_block(),
            TokenKind::KwReturn | TokenKind::KwFn | TokenKind::KwIn => {
                let what = format!("{:?}", self.lexer.current().kind);
                let err = self.unsupported(&what);
                self.advance()?;
                Err(err)
            }
            _ => self.parse_expr_statement(),
        }
    }

    fn parse_block(&mut self) -> Result<(), ParseError> {
        self.advance()?; // '{'
        while !matches!(self.lexer.current().kind, TokenKind::RBrace | TokenKind::Eoi) {
            self.parse_statement()?;
        }
        self.expect(TokenKind::RBrace)
    }

    fn parse_local(&mut self) -> Result<(), ParseError> {
        self.advance()?; // 'local'
        let name = self.expect_identifier()?;
        if matches!(self.lexer.current().kind, TokenKind::Eq) {
            self.advance()?;
            self.emitter.reference_global(&name, true)?;
            let rhs = self.parse_assignment()?;
            self.finish_value(rhs)?;
            self.emitter.emit_set();
        } else {
            // No initializer: still intern the name and force the global
            // cell into existence, NULL-initialized.
            self.emitter.reference_global(&name, true)?;
            self.emitter.emit_null();
            self.emitter.emit_set();
        }
        self.emitter.emit_pop();
        self.expect(TokenKind::Semi)
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match self.lexer.current().kind.clone() {
            TokenKind::Id(sym) => {
                let name = sym.as_str().to_string();
                self.advance()?;
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn parse_print(&mut self) -> Result<(), ParseError> {
        self.advance()?; // 'print'
        let mut count = 0usize;
        loop {
            let value = self.parse_assignment()?;
            self.finish_value(value)?;
            count += 1;
            if matches!(self.lexer.current().kind, TokenKind::Comma) {
                self.advance()?;
            } else {
                break;
            }
        }
        self.expect(TokenKind::Semi)?;
        self.emitter.emit_print(count);
        Ok(())
    }

    fn parse_exit(&mut self) -> Result<(), ParseError> {
        self.advance()?; // 'exit'
        self.expect(TokenKind::Semi)?;
        self.emitter.emit_exit();
        Ok(())
    }

    fn parse_expr_statement(&mut self) -> Result<(), ParseError> {
        let value = self.parse_assignment()?;
        self.finish_value(value)?;
        self.expect(TokenKind::Semi)?;
        self.emitter.emit_pop();
        Ok(())
    }

    fn parse_if(&mut self) -> Result<(), ParseError> {
        self.advance()?; // 'if'
        self.parse_if_tail()
    }

    /// Shared by `if` and `elif`: both enter here after their keyword is
    /// already consumed, which is what lets an `elif` chain recurse.
    fn parse_if_tail(&mut self) -> Result<(), ParseError> {
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_assignment()?;
        self.finish_value(cond)?;
        self.expect(TokenKind::RParen)?;
        let else_patch = self.emitter.prepare_jump8(Opcode::Jz8);
        self.parse_statement()?;
        match self.lexer.current().kind {
            TokenKind::KwElse => {
                let end_patch = self.emitter.prepare_jump8(Opcode::Jmp8);
                self.emitter.patch_jump8(else_patch)?;
                self.advance()?;
                self.parse_statement()?;
                self.emitter.patch_jump8(end_patch)?;
            }
            TokenKind::KwElif => {
                let end_patch = self.emitter.prepare_jump8(Opcode::Jmp8);
                self.emitter.patch_jump8(else_patch)?;
                self.advance()?; // 'elif'
                self.parse_if_tail()?;
                self.emitter.patch_jump8(end_patch)?;
            }
            _ => {
                self.emitter.patch_jump8(else_patch)?;
            }
        }
        Ok(())
    }

    fn parse_while(&mut self) -> Result<(), ParseError> {
        self.advance()?; // 'while'
        self.expect(TokenKind::LParen)?;
        let cond_start = self.emitter.here();
        let cond = self.parse_assignment()?;
        self.finish_value(cond)?;
        self.expect(TokenKind::RParen)?;
        let exit_patch = self.emitter.prepare_jump8(Opcode::Jz8);

        self.loop_stack.push(LoopCtx::default());
        self.parse_statement()?;
        let ctx = self.loop_stack.pop().expect("just pushed");
        for p in ctx.continue_patches {
            self.emitter.patch_jump8_to(p, cond_start)?;
        }

        let back_patch = self.emitter.prepare_jump8(Opcode::Jmp8);
        self.emitter.patch_jump8_to(back_patch, cond_start)?;
        self.emitter.patch_jump8(exit_patch)?;
        let end = self.emitter.here();
        for p in ctx.break_patches {
            self.emitter.patch_jump8_to(p, end)?;
        }
        Ok(())
    }

    fn parse_do_while(&mut self) -> Result<(), ParseError> {
        self.advance()?; // 'do'
        let body_start = self.emitter.here();

        self.loop_stack.push(LoopCtx::default());
        self.parse_statement()?;
        let ctx = self.loop_stack.pop().expect("just pushed");
        let cond_check = self.emitter.here();
        for p in ctx.continue_patches {
            self.emitter.patch_jump8_to(p, cond_check)?;
        }

        self.expect(TokenKind::KwWhile)?;
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_assignment()?;
        self.finish_value(cond)?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Semi)?;

        let back_patch = self.emitter.prepare_jump8(Opcode::Jnz8);
        self.emitter.patch_jump8_to(back_patch, body_start)?;
        let end = self.emitter.here();
        for p in ctx.break_patches {
            self.emitter.patch_jump8_to(p, end)?;
        }
        Ok(())
    }

    /// Emits `init; cond; [skip to body]; post; [back to cond]; body; [back
    /// to post]` so the post-expression's tokens are parsed and emitted
    /// only once, immediately after the condition, even though they run
    /// after the body on every iteration.
    fn parse_for(&mut self) -> Result<(), ParseError> {
        self.advance()?; // 'for'
        self.expect(TokenKind::LParen)?;

        if matches!(self.lexer.current().kind, TokenKind::Semi) {
            self.advance()?;
        } else {
            let init = self.parse_assignment()?;
            self.finish_value(init)?;
            self.emitter.emit_pop();
            self.expect(TokenKind::Semi)?;
        }

        let cond_start = self.emitter.here();
        let exit_patch = if matches!(self.lexer.current().kind, TokenKind::Semi) {
            None
        } else {
            let cond = self.parse_assignment()?;
            self.finish_value(cond)?;
            Some(self.emitter.prepare_jump8(Opcode::Jz8))
        };
        self.expect(TokenKind::Semi)?;

        let skip_to_body = self.emitter.prepare_jump8(Opcode::Jmp8);
        let post_start = self.emitter.here();
        if !matches!(self.lexer.current().kind, TokenKind::RParen) {
            let post = self.parse_assignment()?;
            self.finish_value(post)?;
            self.emitter.emit_pop();
        }
        let back_to_cond = self.emitter.prepare_jump8(Opcode::Jmp8);
        self.emitter.patch_jump8_to(back_to_cond, cond_start)?;
        self.expect(TokenKind::RParen)?;
        self.emitter.patch_jump8(skip_to_body)?;

        self.loop_stack.push(LoopCtx::default());
        self.parse_statement()?;
        let ctx = self.loop_stack.pop().expect("just pushed");
        for p in ctx.continue_patches {
            self.emitter.patch_jump8_to(p, post_start)?;
        }

        let back_to_post = self.emitter.prepare_jump8(Opcode::Jmp8);
        self.emitter.patch_jump8_to(back_to_post, post_start)?;

        let end = self.emitter.here();
        if let Some(p) = exit_patch {
            self.emitter.patch_jump8_to(p, end)?;
        }
        for p in ctx.break_patches {
            self.emitter.patch_jump8_to(p, end)?;
        }
        Ok(())
    }

    /// `loop { ... }`: unconditional repetition, exited only by `break`.
    /// Not named in the supplied grammar's statement list, but `loop` is a
    /// reserved keyword in the lexer with no other grammar use, so this
    /// gives it the natural reading.
    fn parse_loop(&mut self) -> Result<(), ParseError> {
        self.advance()?; // 'loop'
        let start = self.emitter.here();
        self.loop_stack.push(LoopCtx::default());
        self.parse_statement()?;
        let ctx = self.loop_stack.pop().expect("just pushed");
        for p in ctx.continue_patches {
            self.emitter.patch_jump8_to(p, start)?;
        }
        let back_patch = self.emitter.prepare_jump8(Opcode::Jmp8);
        self.emitter.patch_jump8_to(back_patch, start)?;
        let end = self.emitter.here();
        for p in ctx.break_patches {
            self.emitter.patch_jump8_to(p, end)?;
        }
        Ok(())
    }

    fn parse_break(&mut self) -> Result<(), ParseError> {
        let line = self.current_line();
        self.advance()?; // 'break'
        self.expect(TokenKind::Semi)?;
        let placeholder = self.emitter.prepare_jump8(Opcode::Jmp8);
        match self.loop_stack.last_mut() {
            Some(ctx) => ctx.break_patches.push(placeholder),
            None => {
                return Err(ParseError::Unsupported {
                    line,
                    what: "break outside a loop".to_string(),
                })
            }
        }
        Ok(())
    }

    fn parse_continue(&mut self) -> Result<(), ParseError> {
        let line = self.current_line();
        self.advance()?; // 'continue'
        self.expect(TokenKind::Semi)?;
        let placeholder = self.emitter.prepare_jump8(Opcode::Jmp8);
        match self.loop_stack.last_mut() {
            Some(ctx) => ctx.continue_patches.push(placeholder),
            None => {
                return Err(ParseError::Unsupported {
                    line,
                    what: "continue outside a loop".to_string(),
                })
            }
        }
        Ok(())
    }

    // -- expressions -------------------------------------------------

    fn parse_assignment(&mut self) -> Result<Target, ParseError> {
        let lhs = self.parse_logical_or()?;
        match self.lexer.current().kind.clone() {
            TokenKind::Eq => {
                self.advance()?;
                self.finish_address(lhs)?;
                let rhs = self.parse_assignment()?;
                self.finish_value(rhs)?;
                self.emitter.emit_set();
                Ok(Target::None)
            }
            kind if is_compound_assign(&kind) => {
                self.advance()?;
                self.finish_address(lhs)?;
                let rhs = self.parse_assignment()?;
                self.finish_value(rhs)?;
                self.emitter
                    .emit_compound_assign(&kind)
                    .expect("kind already checked by is_compound_assign");
                Ok(Target::None)
            }
            _ => Ok(lhs),
        }
    }

    fn parse_logical_or(&mut self) -> Result<Target, ParseError> {
        let lhs = self.parse_logical_and()?;
        if !matches!(self.lexer.current().kind, TokenKind::OrOr) {
            return Ok(lhs);
        }
        self.finish_value(lhs)?;
        let mut end_patches = Vec::new();
        while matches!(self.lexer.current().kind, TokenKind::OrOr) {
            self.advance()?;
            end_patches.push(self.emitter.prepare_jump8(Opcode::XJnz8));
            self.emitter.emit_pop();
            let rhs = self.parse_logical_and()?;
            self.finish_value(rhs)?;
        }
        for p in end_patches {
            self.emitter.patch_jump8(p)?;
        }
        Ok(Target::None)
    }

    fn parse_logical_and(&mut self) -> Result<Target, ParseError> {
        let lhs = self.parse_bitwise()?;
        if !matches!(self.lexer.current().kind, TokenKind::AndAnd) {
            return Ok(lhs);
        }
        self.finish_value(lhs)?;
        let mut end_patches = Vec::new();
        while matches!(self.lexer.current().kind, TokenKind::AndAnd) {
            self.advance()?;
            end_patches.push(self.emitter.prepare_jump8(Opcode::XJz8));
            self.emitter.emit_pop();
            let rhs = self.parse_bitwise()?;
            self.finish_value(rhs)?;
        }
        for p in end_patches {
            self.emitter.patch_jump8(p)?;
        }
        Ok(Target::None)
    }

    fn parse_bitwise(&mut self) -> Result<Target, ParseError> {
        let mut lhs = self.parse_equality()?;
        loop {
            let kind = self.lexer.current().kind.clone();
            if !matches!(kind, TokenKind::Pipe | TokenKind::Caret | TokenKind::Amp) {
                return Ok(lhs);
            }
            self.finish_value(lhs)?;
            self.advance()?;
            let rhs = self.parse_equality()?;
            self.finish_value(rhs)?;
            self.emitter.emit_infix(&kind).expect("checked above");
            lhs = Target::None;
        }
    }

    fn parse_equality(&mut self) -> Result<Target, ParseError> {
        let mut lhs = self.parse_relational()?;
        loop {
            let kind = self.lexer.current().kind.clone();
            if !matches!(kind, TokenKind::EqEq | TokenKind::NotEq) {
                return Ok(lhs);
            }
            self.finish_value(lhs)?;
            self.advance()?;
            let rhs = self.parse_relational()?;
            self.finish_value(rhs)?;
            self.emitter.emit_infix(&kind).expect("checked above");
            lhs = Target::None;
        }
    }

    fn parse_relational(&mut self) -> Result<Target, ParseError> {
        let mut lhs = self.parse_shift()?;
        loop {
            let kind = self.lexer.current().kind.clone();
            if !matches!(
                kind,
                TokenKind::Lt | TokenKind::LtEq | TokenKind::Gt | TokenKind::GtEq
            ) {
                return Ok(lhs);
            }
            self.finish_value(lhs)?;
            self.advance()?;
            let rhs = self.parse_shift()?;
            self.finish_value(rhs)?;
            self.emitter.emit_infix(&kind).expect("checked above");
            lhs = Target::None;
        }
    }

    fn parse_shift(&mut self) -> Result<Target, ParseError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let kind = self.lexer.current().kind.clone();
            if !matches!(kind, TokenKind::Shl | TokenKind::Shr) {
                return Ok(lhs);
            }
            self.finish_value(lhs)?;
            self.advance()?;
            let rhs = self.parse_additive()?;
            self.finish_value(rhs)?;
            self.emitter.emit_infix(&kind).expect("checked above");
            lhs = Target::None;
        }
    }

    fn parse_additive(&mut self) -> Result<Target, ParseError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let kind = self.lexer.current().kind.clone();
            if !matches!(kind, TokenKind::Plus | TokenKind::Minus | TokenKind::DotDot) {
                return Ok(lhs);
            }
            self.finish_value(lhs)?;
            self.advance()?;
            let rhs = self.parse_multiplicative()?;
            self.finish_value(rhs)?;
            self.emitter.emit_infix(&kind).expect("checked above");
            lhs = Target::None;
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Target, ParseError> {
        let mut lhs = self.parse_power()?;
        loop {
            let kind = self.lexer.current().kind.clone();
            if !matches!(kind, TokenKind::Star | TokenKind::Slash | TokenKind::Percent) {
                return Ok(lhs);
            }
            self.finish_value(lhs)?;
            self.advance()?;
            let rhs = self.parse_power()?;
            self.finish_value(rhs)?;
            self.emitter.emit_infix(&kind).expect("checked above");
            lhs = Target::None;
        }
    }

    /// Right-associative: `2 ** 3 ** 2` is `2 ** (3 ** 2)`.
    fn parse_power(&mut self) -> Result<Target, ParseError> {
        let lhs = self.parse_unary()?;
        if !matches!(self.lexer.current().kind, TokenKind::StarStar) {
            return Ok(lhs);
        }
        self.finish_value(lhs)?;
        self.advance()?;
        let rhs = self.parse_power()?;
        self.finish_value(rhs)?;
        self.emitter.emit_infix(&TokenKind::StarStar).expect("StarStar is infix");
        Ok(Target::None)
    }

    fn parse_unary(&mut self) -> Result<Target, ParseError> {
        let kind = self.lexer.current().kind.clone();
        match kind {
            TokenKind::Bang | TokenKind::Hash | TokenKind::Plus | TokenKind::Minus | TokenKind::Tilde => {
                self.advance()?;
                let operand = self.parse_unary()?;
                self.finish_value(operand)?;
                self.emitter.emit_prefix(&kind).expect("checked above");
                Ok(Target::None)
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                self.advance()?;
                let operand = self.parse_unary()?;
                self.finish_address(operand)?;
                self.emitter.emit_prefix(&kind).expect("checked above");
                Ok(Target::None)
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Target, ParseError> {
        let mut target = self.parse_primary()?;
        loop {
            match self.lexer.current().kind {
                TokenKind::LBracket => {
                    // The container must resolve to its address (GBLA/IDXA),
                    // not a value copy: IDXA promotes a NULL container to a
                    // fresh array in place, and that promotion has to land in
                    // the real global/array cell, not a scratch Reserve copy.
                    // A non-lvalue container (already `Target::None`, e.g. a
                    // literal or parenthesized expression) has nothing left
                    // to resolve.
                    if !matches!(target, Target::None) {
                        self.finish_address(target)?;
                    }
                    self.advance()?;
                    let key = self.parse_assignment()?;
                    self.finish_value(key)?;
                    self.expect(TokenKind::RBracket)?;
                    target = Target::Index;
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let kind = self.lexer.current().kind.clone();
                    self.finish_address(target)?;
                    self.advance()?;
                    self.emitter.emit_postfix(&kind).expect("checked above");
                    target = Target::None;
                }
                _ => break,
            }
        }
        Ok(target)
    }

    fn parse_primary(&mut self) -> Result<Target, ParseError> {
        let kind = self.lexer.current().kind.clone();
        let target = match kind {
            TokenKind::Int(n) => {
                self.emitter.push_int(n as i64)?;
                self.advance()?;
                Target::None
            }
            TokenKind::Flt(f) => {
                self.emitter.push_float(f)?;
                self.advance()?;
                Target::None
            }
            TokenKind::Str(s) => {
                self.emitter.push_string(s.as_bytes().to_vec())?;
                self.advance()?;
                Target::None
            }
            TokenKind::Id(sym) => {
                self.advance()?;
                Target::Global(sym.as_str().to_string())
            }
            TokenKind::LParen => {
                self.advance()?;
                let inner = self.parse_assignment()?;
                self.finish_value(inner)?;
                self.expect(TokenKind::RParen)?;
                Target::None
            }
            TokenKind::LBrace => {
                self.advance()?;
                let mut count = 0usize;
                if !matches!(self.lexer.current().kind, TokenKind::RBrace) {
                    loop {
                        let elem = self.parse_assignment()?;
                        self.finish_value(elem)?;
                        count += 1;
                        if matches!(self.lexer.current().kind, TokenKind::Comma) {
                            self.advance()?;
                        } else {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBrace)?;
                self.emitter.emit_array(count)?;
                Target::None
            }
            _ => return Err(self.unexpected("expression")),
        };
        Ok(target)
    }
}

fn is_compound_assign(kind: &TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        PlusEq | MinusEq | StarEq | SlashEq | PercentEq | StarStarEq | AmpEq | PipeEq | CaretEq | ShlEq | ShrEq
    )
}

/// Parses and compiles `source` into a finished code object.
pub fn compile(source: &str) -> Result<CodeObject, ParseError> {
    Parser::new(source)?.compile()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glintc_vm::{Vm, VmConfig};

    fn run(source: &str) {
        let code = compile(source).unwrap();
        let mut vm = Vm::new(VmConfig::default(), vec![]);
        vm.run(&code).unwrap();
    }

    fn global(source: &str, name: &str) -> glintc_util::Value {
        let code = compile(source).unwrap();
        let mut vm = Vm::new(VmConfig::default(), vec![]);
        vm.run(&code).unwrap();
        vm.global(name).unwrap()
    }

    #[test]
    fn simple_addition_prints() {
        run("print 1 + 2;");
    }

    #[test]
    fn compound_assign_adds_in_place() {
        assert_eq!(global("a = 3; a += 4;", "a"), glintc_util::Value::Int(7));
    }

    #[test]
    fn string_coerces_through_plus() {
        assert_eq!(global("a = \"10\"; b = a + 5;", "b"), glintc_util::Value::Int(15));
    }

    #[test]
    fn indexed_assignment_promotes_a_null_global_in_place() {
        // b has never been assigned, so it starts NULL; indexing into it as
        // an assignment target must build the array in b's own global cell,
        // not in a scratch copy the container read would otherwise produce.
        assert_eq!(
            global("b[0] = 5; c = b[0];", "c"),
            glintc_util::Value::Int(5)
        );
    }

    #[test]
    fn array_literal_and_index() {
        assert_eq!(
            global("a = {10, 20, 30}; b = a[1];", "b"),
            glintc_util::Value::Int(20)
        );
    }

    #[test]
    fn post_increment_yields_numeric_preimage_then_bumps_variable() {
        assert_eq!(
            global("a = 3; b = a++;", "b"),
            glintc_util::Value::Int(3)
        );
        assert_eq!(global("a = 3; b = a++;", "a"), glintc_util::Value::Int(4));
    }

    #[test]
    fn pre_increment_on_string_numerifies_then_bumps() {
        assert_eq!(
            global("a = \"10\"; ++a;", "a"),
            glintc_util::Value::Float(11.0)
        );
    }

    #[test]
    fn short_circuit_or_preserves_left_operand() {
        // covers scenario 6 of the end-to-end tests: if (0 || "hi") print "yes";
        run(r#"if (0 || "hi") print "yes"; else print "no";"#);
    }

    #[test]
    fn while_loop_counts_to_five() {
        assert_eq!(
            global("i = 0; while (i < 5) i += 1;", "i"),
            glintc_util::Value::Int(5)
        );
    }

    #[test]
    fn do_while_runs_body_before_checking_condition() {
        assert_eq!(
            global("i = 0; do i += 1; while (i < 0);", "i"),
            glintc_util::Value::Int(1)
        );
    }

    #[test]
    fn for_loop_sums_zero_through_four() {
        assert_eq!(
            global("sum = 0; for (i = 0; i < 5; i += 1) sum += i;", "sum"),
            glintc_util::Value::Int(10)
        );
    }

    #[test]
    fn break_exits_loop_early() {
        assert_eq!(
            global("i = 0; while (1) { if (i == 3) break; i += 1; }", "i"),
            glintc_util::Value::Int(3)
        );
    }

    #[test]
    fn continue_skips_rest_of_for_body() {
        assert_eq!(
            global(
                "sum = 0; for (i = 0; i < 5; i += 1) { if (i == 2) continue; sum += i; }",
                "sum"
            ),
            glintc_util::Value::Int(8)
        );
    }

    #[test]
    fn elif_chain_picks_matching_branch() {
        assert_eq!(
            global("x = 2; if (x == 1) y = 10; elif (x == 2) y = 20; else y = 30;", "y"),
            glintc_util::Value::Int(20)
        );
    }

    #[test]
    fn loop_keyword_runs_until_break() {
        assert_eq!(
            global("i = 0; loop { i += 1; if (i == 4) break; }", "i"),
            glintc_util::Value::Int(4)
        );
    }

    #[test]
    fn return_keyword_is_rejected_as_unsupported() {
        assert!(matches!(
            compile("return;"),
            Err(ParseError::Unsupported { .. })
        ));
    }

    #[test]
    fn power_is_right_associative() {
        // 2 ** (3 ** 2) == 2 ** 9 == 512, not (2 ** 3) ** 2 == 64.
        assert_eq!(global("a = 2 ** 3 ** 2;", "a"), glintc_util::Value::Float(512.0));
    }
}
