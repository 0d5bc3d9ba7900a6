//! Statement and control-flow lowering.

use super::Codegen;
use crate::ast::{ExprId, Stmt, StmtId};
use crate::core::error::CompileResult;
use crate::inst::{FRAME_POINTER, Imm, Inst, Reg, STACK_POINTER};

impl Codegen<'_> {
    pub(crate) fn stmt(&mut self, id: StmtId) -> CompileResult<()> {
        let program = self.program;
        match program.stmt(id) {
            Stmt::Scope(children) => {
                for &child in children {
                    self.stmt(child)?;
                }
                Ok(())
            }
            Stmt::Expr(expr) => {
                let value = self.expr(*expr)?;
                self.release_value(value);
                Ok(())
            }
            Stmt::Return(expr) => self.ret(*expr),
            Stmt::Branch {
                condition,
                then_stmt,
                else_stmt,
            } => self.branch(*condition, *then_stmt, *else_stmt),
        }
    }

    /// The return value lands in register 0, then the function halts. There
    /// is no return jump in the instruction set; callers resume at the
    /// instruction after their own `jmpEqZ`.
    fn ret(&mut self, expr: Option<ExprId>) -> CompileResult<()> {
        if let Some(expr) = expr {
            let value = self.expr(expr)?;
            let src = self.resolve_value(value)?;
            if src != 0 {
                self.emit(Inst::Li(0, Imm::Value(0)));
                self.emit(Inst::Add(src, 0, 0));
                self.release(src);
            }
            self.regs.mark_occupied(0);
        }
        self.emit(Inst::Exit);
        Ok(())
    }

    /// `jmpEqZ test target` jumps when `test` is zero, so the condition
    /// register steers straight into the else label; the then arm ends with
    /// an always-zero test jumping over the else arm. Labels are fresh per
    /// branch instance so nesting cannot alias targets.
    fn branch(
        &mut self,
        condition: ExprId,
        then_stmt: StmtId,
        else_stmt: Option<StmtId>,
    ) -> CompileResult<()> {
        let (else_label, end_label) = self.fresh_branch_labels();

        let value = self.expr(condition)?;
        let cond = self.resolve_value(value)?;
        let target = self.alloc()?;
        self.emit(Inst::Li(target, Imm::Label(else_label.clone())));
        self.emit(Inst::JmpEqZ(cond, target));
        self.regs.free(target);
        self.release(cond);

        self.stmt(then_stmt)?;

        let zero = self.alloc()?;
        self.emit(Inst::Li(zero, Imm::Value(0)));
        let target = self.alloc()?;
        self.emit(Inst::Li(target, Imm::Label(end_label.clone())));
        self.emit(Inst::JmpEqZ(zero, target));
        self.regs.free(target);
        self.regs.free(zero);

        self.define_label(else_label);
        if let Some(else_stmt) = else_stmt {
            self.stmt(else_stmt)?;
        }
        self.define_label(end_label);
        Ok(())
    }

    // ---- call-boundary stack traffic --------------------------------------

    /// Store each saved register at the stack pointer, advancing the
    /// stack/frame pair one cell per register.
    pub(crate) fn push_registers(&mut self, saved: &[Reg]) -> CompileResult<()> {
        if saved.is_empty() {
            return Ok(());
        }
        let one = self.alloc()?;
        self.emit(Inst::Li(one, Imm::Value(1)));
        for &reg in saved {
            self.emit(Inst::Store(STACK_POINTER, reg));
            self.emit(Inst::Add(STACK_POINTER, one, STACK_POINTER));
            self.emit(Inst::Add(FRAME_POINTER, one, FRAME_POINTER));
        }
        self.regs.free(one);
        Ok(())
    }

    /// Exact mirror of [`push_registers`]: walk the saved list backwards,
    /// retreating the pointer pair before each load.
    ///
    /// [`push_registers`]: Codegen::push_registers
    pub(crate) fn pop_registers(&mut self, saved: &[Reg]) -> CompileResult<()> {
        if saved.is_empty() {
            return Ok(());
        }
        let one = self.alloc()?;
        self.emit(Inst::Li(one, Imm::Value(1)));
        for &reg in saved.iter().rev() {
            self.emit(Inst::Sub(STACK_POINTER, one, STACK_POINTER));
            self.emit(Inst::Sub(FRAME_POINTER, one, FRAME_POINTER));
            self.emit(Inst::Load(STACK_POINTER, reg));
            self.regs.mark_occupied(reg);
        }
        self.regs.free(one);
        Ok(())
    }
}
