//! Code generation for the gate bytecode target.
//!
//! One [`Codegen`] value carries all mutable compiler state: the register
//! file, the per-function symbol table, the privileged-address table, the
//! shared instruction buffer and the branch-label counter. The state is
//! threaded explicitly through the recursive expression and statement
//! generators; nothing is process-global. Register and symbol state is reset
//! at each function boundary, while the instruction buffer and the label
//! counter span the whole compilation unit (labels must be unique
//! process-wide, since all functions share one flat stream).

pub mod expr;
pub mod priv_access;
pub mod resolve;
pub mod stmt;

use crate::ast::{Function, Program};
use crate::core::error::{CompileError, CompileResult};
use crate::core::register_file::{RegisterFile, USABLE_REGISTERS};
use crate::inst::{Imm, Inst, Line, Reg, FRAME_POINTER, STACK_POINTER, START_OF_STACK};
use hashbrown::HashMap;

/// Cycle budget requested for a read access (`request` + `load`). Loads are
/// dearer than stores, so reads get the larger window. An access costs
/// `20 + cycles^2 / 100`, so this budget charges 29 cycles.
pub const READ_BUDGET: u64 = 30;

/// Cycle budget requested for a write access (`request` + `store`); charges
/// 24 cycles. The value to store is always computed before the request is
/// issued, so the window never needs to cover evaluation.
pub const WRITE_BUDGET: u64 = 20;

/// The distinguished entry function that receives stack/frame setup.
pub const ENTRY_FUNCTION: &str = "main";

/// Result of lowering an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    /// Value resident in a register.
    Reg(Reg),
    /// Deferred reference to a privileged cell. The consuming operator
    /// resolves it through the access protocol; until then no instruction
    /// has been emitted for it.
    Priv(u16),
}

/// All mutable state of one compilation unit.
pub struct Codegen<'a> {
    program: &'a Program,
    /// Privileged name to address, built once before any function compiles.
    priv_objects: HashMap<String, u16>,
    regs: RegisterFile,
    /// Identifier to resident register, non-privileged names only.
    symbols: HashMap<String, Reg>,
    lines: Vec<Line>,
    /// Labels waiting to attach to the next emitted instruction.
    pending_labels: Vec<String>,
    /// Process-wide counter disambiguating branch label instances.
    branch_seq: u32,
    current_function: String,
}

impl<'a> Codegen<'a> {
    pub fn new(program: &'a Program) -> Self {
        let priv_objects = program
            .priv_objects
            .iter()
            .map(|obj| (obj.name.clone(), obj.address))
            .collect();
        Self {
            program,
            priv_objects,
            regs: RegisterFile::new(),
            symbols: HashMap::new(),
            lines: Vec::new(),
            pending_labels: Vec::new(),
            branch_seq: 0,
            current_function: String::new(),
        }
    }

    /// Lower every function into the labeled instruction stream.
    pub fn lower(mut self) -> CompileResult<Vec<Line>> {
        for func in &self.program.functions {
            self.compile_function(func)?;
        }
        Ok(self.lines)
    }

    /// Lower and resolve, producing the final instruction stream.
    pub fn run(self) -> CompileResult<Vec<Inst>> {
        let lines = self.lower()?;
        resolve::resolve(lines)
    }

    fn compile_function(&mut self, func: &Function) -> CompileResult<()> {
        log::debug!("compiling function `{}`", func.name);
        self.current_function = func.name.clone();
        self.regs.reset();
        self.symbols.clear();
        self.define_label(func.name.clone());

        if func.name == ENTRY_FUNCTION {
            self.emit(Inst::Li(FRAME_POINTER, Imm::Value(START_OF_STACK)));
            self.emit(Inst::Li(STACK_POINTER, Imm::Value(START_OF_STACK)));
        }

        if func.params.len() > USABLE_REGISTERS {
            return Err(CompileError::TooManyParameters {
                function: func.name.clone(),
                count: func.params.len(),
                max: USABLE_REGISTERS,
            });
        }
        for (index, param) in func.params.iter().enumerate() {
            let reg = index as Reg;
            self.regs.mark_occupied(reg);
            self.symbols.insert(param.clone(), reg);
        }

        self.stmt(func.body)?;

        // A body with no trailing return leaves no halt, and a body ending
        // in a branch leaves its end label dangling; either way execution
        // would fall through into the next function. Cap the body with an
        // `exit` unless the last emitted instruction already is one.
        if !self.pending_labels.is_empty()
            || !matches!(self.lines.last().map(|line| &line.inst), Some(Inst::Exit))
        {
            self.emit(Inst::Exit);
        }
        Ok(())
    }

    // ---- emission helpers -------------------------------------------------

    /// Append an instruction, attaching any pending label markers.
    pub(crate) fn emit(&mut self, inst: Inst) {
        let labels = std::mem::take(&mut self.pending_labels);
        self.lines.push(Line { labels, inst });
    }

    /// Mark the next emitted instruction with a label.
    pub(crate) fn define_label(&mut self, name: String) {
        self.pending_labels.push(name);
    }

    /// Fresh else/end label pair for one branch instance.
    pub(crate) fn fresh_branch_labels(&mut self) -> (String, String) {
        let seq = self.branch_seq;
        self.branch_seq += 1;
        (format!("__else_{seq}"), format!("__end_{seq}"))
    }

    // ---- register helpers -------------------------------------------------

    pub(crate) fn alloc(&mut self) -> CompileResult<Reg> {
        self.regs
            .allocate()
            .map_err(|_| CompileError::RegistersExhausted {
                function: self.current_function.clone(),
            })
    }

    /// Free a register unless an identifier is bound to it. Bound registers
    /// stay resident: later references resolve through the binding, and a
    /// freed register must never be read before re-allocation.
    pub(crate) fn release(&mut self, reg: Reg) {
        if self.symbols.values().any(|&bound| bound == reg) {
            return;
        }
        self.regs.free(reg);
    }

    pub(crate) fn release_value(&mut self, value: Value) {
        if let Value::Reg(reg) = value {
            self.release(reg);
        }
    }

    pub(crate) fn malformed(&self, detail: impl Into<String>) -> CompileError {
        CompileError::MalformedAst {
            function: self.current_function.clone(),
            detail: detail.into(),
        }
    }
}
