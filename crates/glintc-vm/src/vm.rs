//! The dispatch loop.
//!
//! One `match` over [`Opcode`] driven by a byte instruction pointer; every
//! arm either leaves `ip` where the opcode's immediates left it or
//! overwrites it for a jump. Stack slots are always [`Address`]es; reading
//! or writing through one goes through [`Vm::read_value`] /
//! [`Vm::write_value`] rather than a borrowed reference, since a global's
//! backing cell can move when the hash table resizes.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::trace;

use glintc_util::error::VmError;
use glintc_util::{Array, CodeObject, GString, Opcode, Value};

use crate::address::Address;
use crate::config::VmConfig;
use crate::numeric::{fltval, intval, numval, to_cat_bytes, truthy, value_len, Num};

pub struct Vm {
    stack: Vec<Address>,
    reserve: Vec<Value>,
    globals: FxHashMap<Rc<GString>, Value>,
    locals: Vec<Value>,
    argv: Rc<RefCell<Array>>,
    argv_offset: i64,
    stack_size: usize,
}

impl Vm {
    pub fn new(config: VmConfig, raw_argv: Vec<String>) -> Self {
        let argv_array = Array::from_values(raw_argv.into_iter().map(Value::str).collect());
        Self {
            stack: Vec::with_capacity(config.stack_size),
            reserve: vec![Value::Null; config.stack_size],
            globals: FxHashMap::default(),
            locals: Vec::new(),
            argv: Rc::new(RefCell::new(argv_array)),
            argv_offset: config.argv_offset,
            stack_size: config.stack_size,
        }
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(&GString::from_str(name)).cloned()
    }

    pub fn run(&mut self, code: &CodeObject) -> Result<(), VmError> {
        let mut ip: usize = 0;
        let len = code.len();
        while ip < len {
            let byte = code.read_u8(ip);
            let op = Opcode::try_from(byte).map_err(|_| VmError::MalformedBytecode(ip))?;
            ip += 1;
            trace!(ip, ?op, "dispatch");

            match op {
                Opcode::Push0 => self.push_value(Value::Int(0))?,
                Opcode::Push1 => self.push_value(Value::Int(1))?,
                Opcode::Push2 => self.push_value(Value::Int(2))?,
                Opcode::PushI => {
                    let n = code.read_u8(ip) as i64;
                    ip += 1;
                    self.push_value(Value::Int(n))?;
                }
                Opcode::PushK0 => self.push_value(code.constant(0).clone())?,
                Opcode::PushK1 => self.push_value(code.constant(1).clone())?,
                Opcode::PushK2 => self.push_value(code.constant(2).clone())?,
                Opcode::PushK => {
                    let idx = code.read_u8(ip);
                    ip += 1;
                    self.push_value(code.constant(idx).clone())?;
                }
                Opcode::PushS0 => self.push_value(code.constant(0).clone())?,
                Opcode::PushS1 => self.push_value(code.constant(1).clone())?,
                Opcode::PushS2 => self.push_value(code.constant(2).clone())?,
                Opcode::PushS => {
                    let idx = code.read_u8(ip);
                    ip += 1;
                    self.push_value(code.constant(idx).clone())?;
                }
                Opcode::Null => self.push_value(Value::Null)?,

                Opcode::Pop => {
                    self.pop_addr()?;
                }
                Opcode::PopI => {
                    let n = code.read_u8(ip);
                    ip += 1;
                    for _ in 0..n {
                        self.pop_addr()?;
                    }
                }

                Opcode::GblA | Opcode::GblV => {
                    let idx = code.read_u8(ip);
                    ip += 1;
                    let name = match code.constant(idx) {
                        Value::Str(s) => s.clone(),
                        _ => return Err(VmError::MalformedBytecode(ip)),
                    };
                    self.globals.entry(name.clone()).or_insert(Value::Null);
                    if op == Opcode::GblA {
                        self.push_addr(Address::Global(name))?;
                    } else {
                        let v = self.globals.get(&name).cloned().unwrap_or(Value::Null);
                        self.push_value(v)?;
                    }
                }

                Opcode::Lcl => {
                    let slot = code.read_u8(ip) as usize;
                    ip += 1;
                    self.ensure_local(slot);
                    self.locals[slot] = Value::Null;
                }
                Opcode::LclA => {
                    let slot = code.read_u8(ip) as usize;
                    ip += 1;
                    self.ensure_local(slot);
                    self.push_addr(Address::Local(slot))?;
                }
                Opcode::LclV => {
                    let slot = code.read_u8(ip) as usize;
                    ip += 1;
                    self.ensure_local(slot);
                    self.push_value(self.locals[slot].clone())?;
                }

                Opcode::ArgA | Opcode::ArgV => {
                    let key_addr = self.pop_addr()?;
                    let key = intval(&self.read_value(&key_addr));
                    if op == Opcode::ArgA {
                        self.push_addr(Address::Arg(key))?;
                    } else {
                        let internal = key + self.argv_offset;
                        let v = self
                            .argv
                            .borrow()
                            .get(internal)
                            .cloned()
                            .ok_or(VmError::ArrayIndexOutOfBounds(key))?;
                        self.push_value(v)?;
                    }
                }

                Opcode::Add => self.binary_arith(ArithOp::Add)?,
                Opcode::Sub => self.binary_arith(ArithOp::Sub)?,
                Opcode::Mul => self.binary_arith(ArithOp::Mul)?,
                Opcode::Div => self.binary_arith(ArithOp::Div)?,
                Opcode::Mod => self.binary_arith(ArithOp::Mod)?,
                Opcode::Pow => self.binary_arith(ArithOp::Pow)?,
                Opcode::Cat => self.binary_op(|l, r| Ok(cat_values(l, r)))?,

                Opcode::BAnd => self.binary_bitwise(BitOp::And)?,
                Opcode::BOr => self.binary_bitwise(BitOp::Or)?,
                Opcode::BXor => self.binary_bitwise(BitOp::Xor)?,
                Opcode::Shl => self.binary_bitwise(BitOp::Shl)?,
                Opcode::Shr => self.binary_bitwise(BitOp::Shr)?,

                Opcode::Eq => self.binary_compare(|o| o == std::cmp::Ordering::Equal)?,
                Opcode::Ne => self.binary_compare(|o| o != std::cmp::Ordering::Equal)?,
                Opcode::Gt => self.binary_compare(|o| o == std::cmp::Ordering::Greater)?,
                Opcode::Ge => self.binary_compare(|o| o != std::cmp::Ordering::Less)?,
                Opcode::Lt => self.binary_compare(|o| o == std::cmp::Ordering::Less)?,
                Opcode::Le => self.binary_compare(|o| o != std::cmp::Ordering::Greater)?,

                Opcode::LNot => self.unary(|v| Value::Int(!numval(v).is_nonzero() as i64))?,
                Opcode::Len => self.unary(|v| Value::Int(value_len(v)))?,
                Opcode::Neg => self.unary(|v| match numval(v) {
                    Num::Int(i) => Value::Int(i.wrapping_neg()),
                    Num::Float(f) => Value::Float(-f),
                })?,
                Opcode::BNot => self.unary(|v| Value::Int(!intval(v)))?,
                Opcode::Num => self.unary(|v| numval(v).into_value())?,
                Opcode::Test => self.unary(|v| Value::Int(truthy(v) as i64))?,

                Opcode::PreInc => self.pre_step(1)?,
                Opcode::PreDec => self.pre_step(-1)?,
                Opcode::PostInc => self.post_step(1)?,
                Opcode::PostDec => self.post_step(-1)?,

                Opcode::AddX => self.compound(ArithOp::Add.into())?,
                Opcode::SubX => self.compound(ArithOp::Sub.into())?,
                Opcode::MulX => self.compound(ArithOp::Mul.into())?,
                Opcode::DivX => self.compound(ArithOp::Div.into())?,
                Opcode::ModX => self.compound(ArithOp::Mod.into())?,
                Opcode::PowX => self.compound(ArithOp::Pow.into())?,
                Opcode::CatX => self.compound(CompoundOp::Cat)?,
                Opcode::AndX => self.compound(BitOp::And.into())?,
                Opcode::OrX => self.compound(BitOp::Or.into())?,
                Opcode::XorX => self.compound(BitOp::Xor.into())?,
                Opcode::ShlX => self.compound(BitOp::Shl.into())?,
                Opcode::ShrX => self.compound(BitOp::Shr.into())?,

                Opcode::Set => {
                    let rhs_addr = self.pop_addr()?;
                    let lhs_addr = self.pop_addr()?;
                    let v = self.read_value(&rhs_addr);
                    self.write_value(&lhs_addr, v.clone())?;
                    self.push_value(v)?;
                }

                Opcode::IdxA => self.index_addr()?,
                Opcode::IdxV => self.index_value()?,

                Opcode::Array0 => self.build_array(0)?,
                Opcode::Array => {
                    let n = code.read_u8(ip) as usize;
                    ip += 1;
                    self.build_array(n)?;
                }
                Opcode::ArrayK => {
                    let idx = code.read_u8(ip);
                    ip += 1;
                    let n = match code.constant(idx) {
                        Value::Int(i) => *i as usize,
                        _ => return Err(VmError::MalformedBytecode(ip)),
                    };
                    self.build_array(n)?;
                }

                Opcode::Jmp8 => {
                    let disp = code.read_u8(ip) as i8;
                    ip += 1;
                    ip = (ip as i64 + disp as i64) as usize;
                }
                Opcode::Jmp16 => {
                    let disp = read_i16(code, ip);
                    ip += 2;
                    ip = (ip as i64 + disp as i64) as usize;
                }
                Opcode::Jz8 | Opcode::Jnz8 => {
                    let disp = code.read_u8(ip) as i8;
                    ip += 1;
                    let addr = self.pop_addr()?;
                    let cond = truthy(&self.read_value(&addr));
                    if cond == (op == Opcode::Jnz8) {
                        ip = (ip as i64 + disp as i64) as usize;
                    }
                }
                Opcode::Jz16 | Opcode::Jnz16 => {
                    let disp = read_i16(code, ip);
                    ip += 2;
                    let addr = self.pop_addr()?;
                    let cond = truthy(&self.read_value(&addr));
                    if cond == (op == Opcode::Jnz16) {
                        ip = (ip as i64 + disp as i64) as usize;
                    }
                }
                Opcode::XJz8 | Opcode::XJnz8 => {
                    let disp = code.read_u8(ip) as i8;
                    ip += 1;
                    let addr = self.stack.last().cloned().ok_or(VmError::StackUnderflow)?;
                    let cond = truthy(&self.read_value(&addr));
                    let take = cond == (op == Opcode::XJnz8);
                    if take {
                        ip = (ip as i64 + disp as i64) as usize;
                    } else {
                        self.pop_addr()?;
                    }
                }
                Opcode::XJz16 | Opcode::XJnz16 => {
                    let disp = read_i16(code, ip);
                    ip += 2;
                    let addr = self.stack.last().cloned().ok_or(VmError::StackUnderflow)?;
                    let cond = truthy(&self.read_value(&addr));
                    let take = cond == (op == Opcode::XJnz16);
                    if take {
                        ip = (ip as i64 + disp as i64) as usize;
                    } else {
                        self.pop_addr()?;
                    }
                }

                Opcode::Call => return Ok(()),
                Opcode::Ret | Opcode::Ret1 => return Ok(()),

                Opcode::Print1 => {
                    let addr = self.pop_addr()?;
                    println!("{}", self.read_value(&addr));
                }
                Opcode::Print => {
                    let n = code.read_u8(ip) as usize;
                    ip += 1;
                    let mut values = Vec::with_capacity(n);
                    for _ in 0..n {
                        let addr = self.pop_addr()?;
                        values.push(self.read_value(&addr));
                    }
                    values.reverse();
                    let line: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                    println!("{}", line.join(" "));
                }

                Opcode::Exit => return Ok(()),
            }
        }
        Ok(())
    }

    // -- stack plumbing -------------------------------------------------

    fn push_addr(&mut self, addr: Address) -> Result<(), VmError> {
        if self.stack.len() >= self.stack_size {
            return Err(VmError::StackOverflow);
        }
        self.stack.push(addr);
        Ok(())
    }

    fn push_value(&mut self, v: Value) -> Result<(), VmError> {
        if self.stack.len() >= self.stack_size {
            return Err(VmError::StackOverflow);
        }
        let idx = self.stack.len();
        self.reserve[idx] = v;
        self.push_addr(Address::Reserve(idx))
    }

    fn pop_addr(&mut self) -> Result<Address, VmError> {
        self.stack.pop().ok_or(VmError::StackUnderflow)
    }

    fn ensure_local(&mut self, slot: usize) {
        if slot >= self.locals.len() {
            self.locals.resize(slot + 1, Value::Null);
        }
    }

    fn read_value(&self, addr: &Address) -> Value {
        match addr {
            Address::Reserve(i) => self.reserve[*i].clone(),
            Address::Global(key) => self.globals.get(key).cloned().unwrap_or(Value::Null),
            Address::Local(i) => self.locals.get(*i).cloned().unwrap_or(Value::Null),
            Address::Array(rc, idx) => rc.borrow().get(*idx).cloned().unwrap_or(Value::Null),
            Address::Arg(idx) => self
                .argv
                .borrow()
                .get(*idx + self.argv_offset)
                .cloned()
                .unwrap_or(Value::Null),
        }
    }

    fn write_value(&mut self, addr: &Address, v: Value) -> Result<(), VmError> {
        match addr {
            Address::Reserve(i) => self.reserve[*i] = v,
            Address::Global(key) => {
                self.globals.insert(key.clone(), v);
            }
            Address::Local(i) => {
                self.ensure_local(*i);
                self.locals[*i] = v;
            }
            Address::Array(rc, idx) => {
                let mut arr = rc.borrow_mut();
                match arr.get_or_insert_mut(*idx) {
                    Some(slot) => *slot = v,
                    None => return Err(VmError::ArrayIndexOutOfBounds(*idx)),
                }
            }
            Address::Arg(idx) => {
                let mut arr = self.argv.borrow_mut();
                match arr.get_or_insert_mut(*idx + self.argv_offset) {
                    Some(slot) => *slot = v,
                    None => return Err(VmError::ArrayIndexOutOfBounds(*idx)),
                }
            }
        }
        Ok(())
    }

    // -- operators -------------------------------------------------

    fn unary(&mut self, f: impl Fn(&Value) -> Value) -> Result<(), VmError> {
        let addr = self.pop_addr()?;
        let v = self.read_value(&addr);
        let result = f(&v);
        self.write_value(&addr, result.clone())?;
        self.push_addr(addr)
    }

    fn binary_op(&mut self, f: impl Fn(&Value, &Value) -> Result<Value, VmError>) -> Result<(), VmError> {
        let rhs_addr = self.pop_addr()?;
        let lhs_addr = self.pop_addr()?;
        let rhs = self.read_value(&rhs_addr);
        let lhs = self.read_value(&lhs_addr);
        let result = f(&lhs, &rhs)?;
        self.write_value(&lhs_addr, result)?;
        self.push_addr(lhs_addr)
    }

    fn binary_arith(&mut self, op: ArithOp) -> Result<(), VmError> {
        self.binary_op(move |l, r| Ok(apply_arith(op, l, r)))
    }

    fn binary_bitwise(&mut self, op: BitOp) -> Result<(), VmError> {
        self.binary_op(move |l, r| Ok(apply_bitwise(op, l, r)))
    }

    fn binary_compare(&mut self, pick: impl Fn(std::cmp::Ordering) -> bool) -> Result<(), VmError> {
        self.binary_op(move |l, r| Ok(Value::Int(pick(compare(l, r)) as i64)))
    }

    fn pre_step(&mut self, delta: i64) -> Result<(), VmError> {
        let addr = self.pop_addr()?;
        let cur = self.read_value(&addr);
        let new = apply_arith(ArithOp::Add, &cur, &Value::Int(delta));
        self.write_value(&addr, new)?;
        self.push_addr(addr)
    }

    fn post_step(&mut self, delta: i64) -> Result<(), VmError> {
        let addr = self.pop_addr()?;
        let cur = self.read_value(&addr);
        let pre_numeric = numval(&cur).into_value();
        let new = apply_arith(ArithOp::Add, &cur, &Value::Int(delta));
        self.write_value(&addr, new)?;
        self.push_value(pre_numeric)
    }

    fn compound(&mut self, op: CompoundOp) -> Result<(), VmError> {
        let rhs_addr = self.pop_addr()?;
        let lhs_addr = self.pop_addr()?;
        let rhs = self.read_value(&rhs_addr);
        let lhs = self.read_value(&lhs_addr);
        let result = match op {
            CompoundOp::Arith(a) => apply_arith(a, &lhs, &rhs),
            CompoundOp::Bit(b) => apply_bitwise(b, &lhs, &rhs),
            CompoundOp::Cat => cat_values(&lhs, &rhs),
        };
        self.write_value(&lhs_addr, result.clone())?;
        self.push_value(result)
    }

    fn index_addr(&mut self) -> Result<(), VmError> {
        let key_addr = self.pop_addr()?;
        let container_addr = self.pop_addr()?;
        let key = intval(&self.read_value(&key_addr));
        let container = self.read_value(&container_addr);
        match container {
            Value::Null => {
                let fresh = Rc::new(RefCell::new(Array::new()));
                self.write_value(&container_addr, Value::Array(fresh.clone()))?;
                fresh
                    .borrow_mut()
                    .get_or_insert_mut(key)
                    .ok_or(VmError::ArrayIndexOutOfBounds(key))?;
                self.push_addr(Address::Array(fresh, key))
            }
            Value::Array(rc) => {
                rc.borrow_mut()
                    .get_or_insert_mut(key)
                    .ok_or(VmError::ArrayIndexOutOfBounds(key))?;
                self.push_addr(Address::Array(rc, key))
            }
            other => Err(VmError::InvalidIndexTarget(other.tag_name())),
        }
    }

    fn index_value(&mut self) -> Result<(), VmError> {
        let key_addr = self.pop_addr()?;
        let container_addr = self.pop_addr()?;
        let key = intval(&self.read_value(&key_addr));
        let container = self.read_value(&container_addr);
        match &container {
            Value::Array(rc) => {
                let v = rc
                    .borrow()
                    .get(key)
                    .cloned()
                    .ok_or(VmError::ArrayIndexOutOfBounds(key))?;
                self.push_value(v)
            }
            Value::Fn(_) => Err(VmError::InvalidIndexTarget(container.tag_name())),
            scalar => {
                let bytes = to_cat_bytes(scalar);
                let byte = usize::try_from(key)
                    .ok()
                    .and_then(|i| bytes.get(i).copied())
                    .ok_or(VmError::ArrayIndexOutOfBounds(key))?;
                self.push_value(Value::str(vec![byte]))
            }
        }
    }

    fn build_array(&mut self, n: usize) -> Result<(), VmError> {
        let mut values = Vec::with_capacity(n);
        for _ in 0..n {
            let addr = self.pop_addr()?;
            values.push(self.read_value(&addr));
        }
        values.reverse();
        self.push_value(Value::array(Array::from_values(values)))
    }
}

fn read_i16(code: &CodeObject, at: usize) -> i16 {
    i16::from_be_bytes([code.read_u8(at), code.read_u8(at + 1)])
}

#[derive(Clone, Copy)]
enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

#[derive(Clone, Copy)]
enum BitOp {
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

enum CompoundOp {
    Arith(ArithOp),
    Bit(BitOp),
    Cat,
}

impl From<ArithOp> for CompoundOp {
    fn from(op: ArithOp) -> Self {
        CompoundOp::Arith(op)
    }
}

impl From<BitOp> for CompoundOp {
    fn from(op: BitOp) -> Self {
        CompoundOp::Bit(op)
    }
}

fn apply_arith(op: ArithOp, lhs: &Value, rhs: &Value) -> Value {
    let l = numval(lhs);
    let r = numval(rhs);
    let float_path = matches!(op, ArithOp::Div | ArithOp::Pow)
        || matches!(l, Num::Float(_))
        || matches!(r, Num::Float(_));
    if float_path {
        let lf = l.as_f64();
        let rf = r.as_f64();
        let res = match op {
            ArithOp::Add => lf + rf,
            ArithOp::Sub => lf - rf,
            ArithOp::Mul => lf * rf,
            ArithOp::Div => lf / rf,
            ArithOp::Pow => lf.powf(rf),
            ArithOp::Mod => {
                let m = lf % rf;
                if m < 0.0 {
                    m + rf
                } else {
                    m
                }
            }
        };
        Value::Float(res)
    } else {
        let li = match l {
            Num::Int(i) => i,
            Num::Float(_) => unreachable!(),
        };
        let ri = match r {
            Num::Int(i) => i,
            Num::Float(_) => unreachable!(),
        };
        let res = match op {
            ArithOp::Add => li.wrapping_add(ri),
            ArithOp::Sub => li.wrapping_sub(ri),
            ArithOp::Mul => li.wrapping_mul(ri),
            ArithOp::Mod => {
                if ri == 0 {
                    0
                } else {
                    let m = li.wrapping_rem(ri);
                    if m < 0 {
                        m.wrapping_add(ri)
                    } else {
                        m
                    }
                }
            }
            ArithOp::Div | ArithOp::Pow => unreachable!("always takes the float path"),
        };
        Value::Int(res)
    }
}

fn apply_bitwise(op: BitOp, lhs: &Value, rhs: &Value) -> Value {
    let l = intval(lhs);
    let r = intval(rhs);
    let res = match op {
        BitOp::And => l & r,
        BitOp::Or => l | r,
        BitOp::Xor => l ^ r,
        BitOp::Shl => l.wrapping_shl((r as u32) & 63),
        BitOp::Shr => l.wrapping_shr((r as u32) & 63),
    };
    Value::Int(res)
}

fn compare(lhs: &Value, rhs: &Value) -> std::cmp::Ordering {
    match (numval(lhs), numval(rhs)) {
        (Num::Int(a), Num::Int(b)) => a.cmp(&b),
        (a, b) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(std::cmp::Ordering::Equal),
    }
}

fn cat_values(lhs: &Value, rhs: &Value) -> Value {
    let mut bytes = to_cat_bytes(lhs);
    bytes.extend(to_cat_bytes(rhs));
    Value::str(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glintc_emit::Emitter;

    fn run_expr_get_global(build: impl FnOnce(&mut Emitter), name: &str) -> Value {
        let mut e = Emitter::new();
        build(&mut e);
        let code = e.into_code();
        let mut vm = Vm::new(VmConfig::default(), vec![]);
        vm.run(&code).unwrap();
        vm.global(name).unwrap()
    }

    #[test]
    fn add_two_literals_and_print() {
        let mut e = Emitter::new();
        e.push_int(1).unwrap();
        e.push_int(2).unwrap();
        e.emit_infix(&glintc_lex::TokenKind::Plus);
        e.emit_print(1);
        e.emit_exit();
        let code = e.into_code();
        let mut vm = Vm::new(VmConfig::default(), vec![]);
        vm.run(&code).unwrap();
    }

    #[test]
    fn compound_assign_adds_in_place() {
        // a = 3; a += 4;
        let v = run_expr_get_global(
            |e| {
                e.reference_global("a", true).unwrap();
                e.push_int(3).unwrap();
                e.emit_set();
                e.emit_pop();
                e.reference_global("a", true).unwrap();
                e.push_int(4).unwrap();
                e.emit_compound_assign(&glintc_lex::TokenKind::PlusEq);
                e.emit_pop();
            },
            "a",
        );
        assert_eq!(v, Value::Int(7));
    }

    #[test]
    fn string_coerces_through_plus() {
        // a = "10"; a + 5 == 15
        let mut e = Emitter::new();
        e.reference_global("a", true).unwrap();
        e.push_string(b"10".to_vec()).unwrap();
        e.emit_set();
        e.emit_pop();
        e.reference_global("a", false).unwrap();
        e.push_int(5).unwrap();
        e.emit_infix(&glintc_lex::TokenKind::Plus);
        e.emit_print(1);
        e.emit_exit();
        let code = e.into_code();
        let mut vm = Vm::new(VmConfig::default(), vec![]);
        vm.run(&code).unwrap();
    }

    #[test]
    fn array_literal_and_index() {
        let mut e = Emitter::new();
        e.push_int(10).unwrap();
        e.push_int(20).unwrap();
        e.push_int(30).unwrap();
        e.emit_array(3).unwrap();
        e.push_int(1).unwrap();
        e.emit_index_value();
        e.emit_print(1);
        e.emit_exit();
        let code = e.into_code();
        let mut vm = Vm::new(VmConfig::default(), vec![]);
        vm.run(&code).unwrap();
    }

    #[test]
    fn post_increment_yields_numeric_preimage_then_bumps_variable() {
        let v = run_expr_get_global(
            |e| {
                e.reference_global("a", true).unwrap();
                e.push_int(3).unwrap();
                e.emit_set();
                e.emit_pop();
                e.reference_global("a", true).unwrap();
                e.emit_postfix(&glintc_lex::TokenKind::PlusPlus);
                e.emit_pop();
            },
            "a",
        );
        assert_eq!(v, Value::Int(4));
    }

    #[test]
    fn modulus_is_nonnegative_for_positive_divisor() {
        assert_eq!(apply_arith(ArithOp::Mod, &Value::Int(-7), &Value::Int(3)), Value::Int(2));
        assert_eq!(
            apply_arith(ArithOp::Mod, &Value::Float(-7.5), &Value::Float(2.0)),
            Value::Float(0.5)
        );
    }

    #[test]
    fn short_circuit_or_preserves_left_operand() {
        // if (0 || "hi") print "yes";
        let mut e = Emitter::new();
        e.push_int(0).unwrap();
        let placeholder = e.prepare_jump8(glintc_util::Opcode::XJnz8);
        e.emit_pop();
        e.push_string(b"hi".to_vec()).unwrap();
        e.patch_jump8(placeholder).unwrap();
        let skip = e.prepare_jump8(glintc_util::Opcode::Jz8);
        e.push_string(b"yes".to_vec()).unwrap();
        e.emit_print(1);
        e.patch_jump8(skip).unwrap();
        e.emit_exit();
        let code = e.into_code();
        let mut vm = Vm::new(VmConfig::default(), vec![]);
        vm.run(&code).unwrap();
    }

    #[test]
    fn stack_overflow_is_fatal() {
        let config = VmConfig {
            stack_size: 2,
            ..VmConfig::default()
        };
        let mut e = Emitter::new();
        e.push_int(1).unwrap();
        e.push_int(2).unwrap();
        e.push_int(3).unwrap();
        e.emit_exit();
        let code = e.into_code();
        let mut vm = Vm::new(config, vec![]);
        assert!(matches!(vm.run(&code), Err(VmError::StackOverflow)));
    }
}
