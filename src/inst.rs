//! Typed bytecode instruction model.
//!
//! The output program is an append-only sequence of [`Line`]s. Until label
//! resolution runs, a line may carry symbolic label markers and an `li` may
//! hold a symbolic jump target ([`Imm::Label`]) instead of a number. The
//! resolution pass rewrites every symbolic immediate to a 1-based instruction
//! index and strips the markers, after which [`render`] produces the final
//! one-instruction-per-line text program.

use std::fmt;

/// Numeric register id, 0..=7.
pub type Reg = u8;

/// Size of the register file.
pub const NUM_REGISTERS: usize = 8;

/// Register permanently reserved for the stack pointer.
pub const STACK_POINTER: Reg = 6;

/// Register permanently reserved for the frame pointer.
pub const FRAME_POINTER: Reg = 7;

/// Initial value of the stack and frame pointers in the entry function.
pub const START_OF_STACK: u64 = 9216;

/// Immediate operand of `li`.
///
/// Jump targets are staged through `li`, so before resolution an immediate is
/// either a plain number or a reference to a label defined elsewhere in the
/// stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Imm {
    Value(u64),
    Label(String),
}

impl fmt::Display for Imm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Imm::Value(v) => write!(f, "{v}"),
            Imm::Label(name) => write!(f, "{name}"),
        }
    }
}

/// One bytecode instruction.
///
/// Memory operands (`load`, `store`, `request`) name the register holding the
/// address, not the address itself; addresses are staged with `li` first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inst {
    Exit,
    Add(Reg, Reg, Reg),
    Sub(Reg, Reg, Reg),
    Mul(Reg, Reg, Reg),
    CmpGt(Reg, Reg, Reg),
    /// (address register, destination register)
    Load(Reg, Reg),
    /// (address register, source register)
    Store(Reg, Reg),
    /// (address register, cycle-budget register)
    Request(Reg, Reg),
    Li(Reg, Imm),
    /// (test register, target-index register); jumps when the test is zero
    JmpEqZ(Reg, Reg),
    Syscall(Reg),
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inst::Exit => write!(f, "exit"),
            Inst::Add(a, b, out) => write!(f, "add {a} {b} {out}"),
            Inst::Sub(a, b, out) => write!(f, "sub {a} {b} {out}"),
            Inst::Mul(a, b, out) => write!(f, "mul {a} {b} {out}"),
            Inst::CmpGt(a, b, out) => write!(f, "cmpGT {a} {b} {out}"),
            Inst::Load(addr, dest) => write!(f, "load {addr} {dest}"),
            Inst::Store(addr, src) => write!(f, "store {addr} {src}"),
            Inst::Request(addr, cycles) => write!(f, "request {addr} {cycles}"),
            Inst::Li(reg, imm) => write!(f, "li {reg} {imm}"),
            Inst::JmpEqZ(test, target) => write!(f, "jmpEqZ {test} {target}"),
            Inst::Syscall(num) => write!(f, "syscall {num}"),
        }
    }
}

/// An emitted line: one instruction plus the label markers attached to it.
///
/// Several labels may attach to the same instruction, for example when a
/// branch end label falls directly before the next function's entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub labels: Vec<String>,
    pub inst: Inst,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for label in &self.labels {
            write!(f, "{label}:")?;
        }
        write!(f, "{}", self.inst)
    }
}

/// Render a resolved instruction stream as the final text program.
pub fn render(program: &[Inst]) -> String {
    let mut out = String::new();
    for inst in program {
        out.push_str(&inst.to_string());
        out.push('\n');
    }
    out
}
