//! The bytecode emitter.
//!
//! The emitter has no notion of grammar or precedence; it exposes one
//! operation per thing the parser needs to happen in syntactic order
//! (push this literal, emit this binary operator, prepare a jump here,
//! patch it there) and leaves all sequencing decisions to `glintc-parser`.
//! This mirrors the teacher's separation of a dumb "assembler" layer from
//! the tree-walking/codegen layer that drives it.

use glintc_lex::TokenKind;
use glintc_util::error::EmitError;
use glintc_util::{CodeObject, GString, Opcode, Value};

pub struct Emitter {
    code: CodeObject,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter {
    pub fn new() -> Self {
        Self {
            code: CodeObject::new(),
        }
    }

    pub fn code(&self) -> &CodeObject {
        &self.code
    }

    pub fn into_code(self) -> CodeObject {
        self.code
    }

    pub fn here(&self) -> usize {
        self.code.len()
    }

    fn emit(&mut self, op: Opcode) -> usize {
        self.code.push_byte(op.as_u8())
    }

    fn emit_byte(&mut self, b: u8) {
        self.code.push_byte(b);
    }

    // -- literal / symbol pushes -------------------------------------------------

    pub fn push_int(&mut self, n: i64) -> Result<(), EmitError> {
        match n {
            0 => {
                self.emit(Opcode::Push0);
            }
            1 => {
                self.emit(Opcode::Push1);
            }
            2 => {
                self.emit(Opcode::Push2);
            }
            3..=255 => {
                self.emit(Opcode::PushI);
                self.emit_byte(n as u8);
            }
            _ => self.push_constant(Value::Int(n), false)?,
        }
        Ok(())
    }

    pub fn push_float(&mut self, f: f64) -> Result<(), EmitError> {
        self.push_constant(Value::Float(f), false)
    }

    pub fn push_string(&mut self, bytes: Vec<u8>) -> Result<(), EmitError> {
        self.push_constant(Value::Str(std::rc::Rc::new(GString::new(bytes))), false)
    }

    /// Interns `name` the same way a string literal is interned and emits
    /// the `PUSHS` family instead of `PUSHK`. Not reachable from the
    /// supplied grammar (identifier references compile straight to
    /// `GBLA`/`GBLV`, see [`Self::reference_global`]) but kept correct for
    /// hand-assembled bytecode exercising the opcode, matching this
    /// repository's treatment of `LCL*`/`CALL`/`RET*` as placeholder
    /// surface.
    pub fn push_symbol(&mut self, name: &str) -> Result<(), EmitError> {
        self.push_constant(Value::str(name.as_bytes().to_vec()), true)
    }

    fn push_constant(&mut self, value: Value, as_symbol: bool) -> Result<(), EmitError> {
        let idx = self
            .code
            .find_or_push_constant(value)
            .ok_or(EmitError::ConstantTableFull)?;
        let op = match (as_symbol, idx) {
            (false, 0) => Opcode::PushK0,
            (false, 1) => Opcode::PushK1,
            (false, 2) => Opcode::PushK2,
            (false, _) => Opcode::PushK,
            (true, 0) => Opcode::PushS0,
            (true, 1) => Opcode::PushS1,
            (true, 2) => Opcode::PushS2,
            (true, _) => Opcode::PushS,
        };
        self.emit(op);
        if matches!(op, Opcode::PushK | Opcode::PushS) {
            self.emit_byte(idx);
        }
        Ok(())
    }

    /// Interns `name` into the constant pool and emits `GBLA`/`GBLV` with
    /// that constant-pool index as the immediate - the path every
    /// identifier reference in the supplied grammar actually takes.
    pub fn reference_global(&mut self, name: &str, want_address: bool) -> Result<(), EmitError> {
        let idx = self
            .code
            .find_or_push_constant(Value::str(name.as_bytes().to_vec()))
            .ok_or(EmitError::ConstantTableFull)?;
        self.emit(if want_address {
            Opcode::GblA
        } else {
            Opcode::GblV
        });
        self.emit_byte(idx);
        Ok(())
    }

    pub fn emit_null(&mut self) {
        self.emit(Opcode::Null);
    }

    pub fn emit_pop(&mut self) {
        self.emit(Opcode::Pop);
    }

    // -- operators -------------------------------------------------

    pub fn emit_infix(&mut self, kind: &TokenKind) -> Option<()> {
        let op = infix_opcode(kind)?;
        self.emit(op);
        Some(())
    }

    pub fn emit_compound_assign(&mut self, kind: &TokenKind) -> Option<()> {
        let op = compound_opcode(kind)?;
        self.emit(op);
        Some(())
    }

    pub fn emit_prefix(&mut self, kind: &TokenKind) -> Option<()> {
        use TokenKind::*;
        let op = match kind {
            Bang => Opcode::LNot,
            Hash => Opcode::Len,
            Plus => Opcode::Num,
            Minus => Opcode::Neg,
            Tilde => Opcode::BNot,
            PlusPlus => Opcode::PreInc,
            MinusMinus => Opcode::PreDec,
            _ => return None,
        };
        self.emit(op);
        Some(())
    }

    pub fn emit_postfix(&mut self, kind: &TokenKind) -> Option<()> {
        use TokenKind::*;
        let op = match kind {
            PlusPlus => Opcode::PostInc,
            MinusMinus => Opcode::PostDec,
            _ => return None,
        };
        self.emit(op);
        Some(())
    }

    pub fn emit_set(&mut self) {
        self.emit(Opcode::Set);
    }

    pub fn emit_index_addr(&mut self) {
        self.emit(Opcode::IdxA);
    }

    pub fn emit_index_value(&mut self) {
        self.emit(Opcode::IdxV);
    }

    pub fn emit_array(&mut self, count: usize) -> Result<(), EmitError> {
        match count {
            0 => {
                self.emit(Opcode::Array0);
            }
            1..=255 => {
                self.emit(Opcode::Array);
                self.emit_byte(count as u8);
            }
            _ => return Err(EmitError::ArrayTooLarge(count)),
        }
        Ok(())
    }

    pub fn emit_print(&mut self, count: usize) {
        if count == 1 {
            self.emit(Opcode::Print1);
        } else {
            self.emit(Opcode::Print);
            self.emit_byte(count as u8);
        }
    }

    pub fn emit_exit(&mut self) {
        self.emit(Opcode::Exit);
    }

    // -- jumps -------------------------------------------------

    /// Emits the opcode and a one-byte placeholder, returning the index of
    /// that placeholder byte for a later [`Self::patch_jump8`] call.
    pub fn prepare_jump8(&mut self, op: Opcode) -> usize {
        debug_assert!(is_short_jump(op));
        self.emit(op);
        self.emit_byte(0);
        self.code.len() - 1
    }

    /// Long form: two placeholder bytes, patched big-endian by
    /// [`Self::patch_jump16`].
    pub fn prepare_jump16(&mut self, op: Opcode) -> usize {
        debug_assert!(is_long_jump(op));
        self.emit(op);
        self.emit_byte(0);
        self.emit_byte(0);
        self.code.len() - 2
    }

    /// Patches `placeholder` to land at the current code length - the
    /// common case, used for forward jumps.
    pub fn patch_jump8(&mut self, placeholder: usize) -> Result<(), EmitError> {
        self.patch_jump8_to(placeholder, self.code.len())
    }

    /// Patches `placeholder` to land at an arbitrary `target` offset,
    /// which may be behind the placeholder - this is how loop bodies jump
    /// back to their condition check.
    pub fn patch_jump8_to(&mut self, placeholder: usize, target: usize) -> Result<(), EmitError> {
        let disp = target as i64 - (placeholder as i64 + 1);
        if !(i8::MIN as i64..=i8::MAX as i64).contains(&disp) {
            return Err(EmitError::ShortJumpOutOfRange(disp));
        }
        self.code.patch_byte(placeholder, disp as i8 as u8);
        Ok(())
    }

    pub fn patch_jump16(&mut self, placeholder: usize) -> Result<(), EmitError> {
        self.patch_jump16_to(placeholder, self.code.len())
    }

    pub fn patch_jump16_to(&mut self, placeholder: usize, target: usize) -> Result<(), EmitError> {
        let disp = target as i64 - (placeholder as i64 + 2);
        if !(i16::MIN as i64..=i16::MAX as i64).contains(&disp) {
            return Err(EmitError::LongJumpOutOfRange(disp));
        }
        let bytes = (disp as i16).to_be_bytes();
        self.code.patch_byte(placeholder, bytes[0]);
        self.code.patch_byte(placeholder + 1, bytes[1]);
        Ok(())
    }
}

fn is_short_jump(op: Opcode) -> bool {
    matches!(
        op,
        Opcode::Jmp8 | Opcode::Jz8 | Opcode::Jnz8 | Opcode::XJz8 | Opcode::XJnz8
    )
}

fn is_long_jump(op: Opcode) -> bool {
    matches!(
        op,
        Opcode::Jmp16 | Opcode::Jz16 | Opcode::Jnz16 | Opcode::XJz16 | Opcode::XJnz16
    )
}

fn infix_opcode(kind: &TokenKind) -> Option<Opcode> {
    use TokenKind::*;
    Some(match kind {
        Plus => Opcode::Add,
        Minus => Opcode::Sub,
        Star => Opcode::Mul,
        Slash => Opcode::Div,
        Percent => Opcode::Mod,
        StarStar => Opcode::Pow,
        DotDot => Opcode::Cat,
        Amp => Opcode::BAnd,
        Pipe => Opcode::BOr,
        Caret => Opcode::BXor,
        Shl => Opcode::Shl,
        Shr => Opcode::Shr,
        EqEq => Opcode::Eq,
        NotEq => Opcode::Ne,
        Gt => Opcode::Gt,
        GtEq => Opcode::Ge,
        Lt => Opcode::Lt,
        LtEq => Opcode::Le,
        _ => return None,
    })
}

fn compound_opcode(kind: &TokenKind) -> Option<Opcode> {
    use TokenKind::*;
    Some(match kind {
        PlusEq => Opcode::AddX,
        MinusEq => Opcode::SubX,
        StarEq => Opcode::MulX,
        SlashEq => Opcode::DivX,
        PercentEq => Opcode::ModX,
        StarStarEq => Opcode::PowX,
        AmpEq => Opcode::AndX,
        PipeEq => Opcode::OrX,
        CaretEq => Opcode::XorX,
        ShlEq => Opcode::ShlX,
        ShrEq => Opcode::ShrX,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_int_literals_never_grow_the_constant_table() {
        for n in 0..=255i64 {
            let mut e = Emitter::new();
            e.push_int(n).unwrap();
            assert!(e.code().constants().is_empty());
        }
    }

    #[test]
    fn small_int_emits_at_most_two_bytes() {
        for n in 0..=255i64 {
            let mut e = Emitter::new();
            e.push_int(n).unwrap();
            assert!(e.code().len() <= 2, "n={n} took {} bytes", e.code().len());
        }
    }

    #[test]
    fn large_int_uses_constant_table() {
        let mut e = Emitter::new();
        e.push_int(100_000).unwrap();
        assert_eq!(e.code().constants(), &[Value::Int(100_000)]);
    }

    #[test]
    fn duplicate_literals_share_one_constant_slot() {
        let mut e = Emitter::new();
        e.push_float(3.5).unwrap();
        e.push_float(3.5).unwrap();
        assert_eq!(e.code().constants().len(), 1);
    }

    #[test]
    fn jump_patch_targets_current_code_length() {
        let mut e = Emitter::new();
        let placeholder = e.prepare_jump8(Opcode::Jmp8);
        e.emit(Opcode::Add);
        e.emit(Opcode::Add);
        e.patch_jump8(placeholder).unwrap();
        let disp = e.code().read_u8(placeholder) as i8;
        assert_eq!(placeholder as i64 + 1 + disp as i64, e.code().len() as i64);
    }

    #[test]
    fn long_jump_patches_two_big_endian_bytes() {
        let mut e = Emitter::new();
        let placeholder = e.prepare_jump16(Opcode::Jmp16);
        for _ in 0..300 {
            e.emit(Opcode::Add);
        }
        e.patch_jump16(placeholder).unwrap();
        let hi = e.code().read_u8(placeholder);
        let lo = e.code().read_u8(placeholder + 1);
        let disp = i16::from_be_bytes([hi, lo]);
        assert_eq!(placeholder as i64 + 2 + disp as i64, e.code().len() as i64);
    }

    #[test]
    fn reference_global_interns_name_once() {
        let mut e = Emitter::new();
        e.reference_global("a", true).unwrap();
        e.reference_global("a", false).unwrap();
        assert_eq!(e.code().constants().len(), 1);
    }
}
