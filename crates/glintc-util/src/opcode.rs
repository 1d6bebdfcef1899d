//! The bytecode instruction set.
//!
//! One byte of opcode, followed by zero or more immediate bytes depending
//! on the variant (documented per-opcode below and tabulated in
//! SPEC_FULL.md §9). This enum is the single source of truth both
//! `glintc-emit` (which only ever writes `u8::from(Opcode)`) and
//! `glintc-vm` (which only ever reads back via `Opcode::try_from(u8)`)
//! agree on.

use std::convert::TryFrom;

macro_rules! opcodes {
    ($($name:ident = $val:expr),* $(,)?) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum Opcode {
            $($name = $val),*
        }

        impl Opcode {
            pub const fn as_u8(self) -> u8 {
                self as u8
            }
        }

        impl TryFrom<u8> for Opcode {
            type Error = u8;
            fn try_from(byte: u8) -> Result<Self, u8> {
                match byte {
                    $($val => Ok(Opcode::$name),)*
                    other => Err(other),
                }
            }
        }
    };
}

opcodes! {
    Push0 = 0, Push1 = 1, Push2 = 2,
    PushI = 3,
    PushK = 4, PushK0 = 5, PushK1 = 6, PushK2 = 7,
    PushS = 8, PushS0 = 9, PushS1 = 10, PushS2 = 11,
    Null = 12,
    Pop = 13, PopI = 14,

    GblA = 15, GblV = 16,
    Lcl = 17, LclA = 18, LclV = 19,
    ArgA = 20, ArgV = 21,

    Add = 22, Sub = 23, Mul = 24, Div = 25, Mod = 26, Pow = 27, Cat = 28,
    BAnd = 29, BOr = 30, BXor = 31, Shl = 32, Shr = 33,
    Eq = 34, Ne = 35, Gt = 36, Ge = 37, Lt = 38, Le = 39,

    LNot = 40, Len = 41, Neg = 42, BNot = 43, Num = 44, Test = 45,

    PreInc = 46, PreDec = 47, PostInc = 48, PostDec = 49,

    AddX = 50, SubX = 51, MulX = 52, DivX = 53, ModX = 54, PowX = 55, CatX = 56,
    AndX = 57, OrX = 58, XorX = 59, ShlX = 60, ShrX = 61,

    Set = 62,

    IdxA = 63, IdxV = 64,

    Array0 = 65, Array = 66, ArrayK = 67,

    Jmp8 = 68, Jmp16 = 69,
    Jz8 = 70, Jnz8 = 71, Jz16 = 72, Jnz16 = 73,
    XJz8 = 74, XJnz8 = 75, XJz16 = 76, XJnz16 = 77,

    Call = 78, Ret = 79, Ret1 = 80,

    Print1 = 81, Print = 82,

    Exit = 83,
}

impl Opcode {
    /// Number of immediate operand bytes this opcode's encoding carries,
    /// for disassembly/debug tooling - the dispatch loop itself reads
    /// immediates directly rather than consulting this table.
    pub const fn immediate_len(self) -> usize {
        use Opcode::*;
        match self {
            PushI | PushK | PushS | PopI | GblA | GblV | Lcl | LclA | LclV | Array | ArrayK
            | Jmp8 | Jz8 | Jnz8 | XJz8 | XJnz8 | Print => 1,
            Jmp16 | Jz16 | Jnz16 | XJz16 | XJnz16 => 2,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_u8() {
        for op in [Opcode::Add, Opcode::PushK2, Opcode::XJnz16, Opcode::Exit] {
            let byte = op.as_u8();
            assert_eq!(Opcode::try_from(byte).unwrap(), op);
        }
    }

    #[test]
    fn unknown_byte_is_rejected() {
        assert!(Opcode::try_from(255u8).is_err());
    }

    #[test]
    fn long_jump_immediates_are_two_bytes() {
        assert_eq!(Opcode::Jmp16.immediate_len(), 2);
        assert_eq!(Opcode::Jmp8.immediate_len(), 1);
        assert_eq!(Opcode::Add.immediate_len(), 0);
    }
}
