//! Expression lowering.
//!
//! Each generator emits instructions into the shared buffer and returns a
//! [`Value`]: the register holding the result, or a deferred privileged
//! descriptor that the consuming operator resolves through the access
//! protocol. Operand registers holding temporaries are freed once consumed;
//! registers bound to identifiers stay resident.

use super::{Codegen, Value};
use crate::ast::{BinOp, Expr, ExprId, Syscall};
use crate::core::error::CompileResult;
use crate::inst::{Imm, Inst, Reg, STACK_POINTER};

impl Codegen<'_> {
    pub(crate) fn expr(&mut self, id: ExprId) -> CompileResult<Value> {
        let program = self.program;
        match program.expr(id) {
            Expr::Number(value) => {
                let reg = self.alloc()?;
                self.emit(Inst::Li(reg, Imm::Value(*value)));
                Ok(Value::Reg(reg))
            }
            Expr::Ident(name) => self.ident(name),
            Expr::Binary {
                op: BinOp::Assign,
                lhs,
                rhs,
            } => self.assign(*lhs, *rhs),
            Expr::Binary { op, lhs, rhs } => self.binary(*op, *lhs, *rhs),
            Expr::Call { callee, args } => self.call(callee, args),
            Expr::Syscall { call, args } => self.syscall(*call, args),
        }
    }

    /// Privileged names always resolve through the address table and never
    /// get a symbol-table entry. A first reference to a plain identifier
    /// binds a fresh register; well-formed input assigns before reading.
    fn ident(&mut self, name: &str) -> CompileResult<Value> {
        if let Some(&address) = self.priv_objects.get(name) {
            return Ok(Value::Priv(address));
        }
        if let Some(&reg) = self.symbols.get(name) {
            return Ok(Value::Reg(reg));
        }
        let reg = self.alloc()?;
        self.symbols.insert(name.to_string(), reg);
        Ok(Value::Reg(reg))
    }

    fn binary(&mut self, op: BinOp, lhs: ExprId, rhs: ExprId) -> CompileResult<Value> {
        let lhs_value = self.expr(lhs)?;
        let a = self.resolve_value(lhs_value)?;
        let rhs_value = self.expr(rhs)?;
        let b = self.resolve_value(rhs_value)?;

        let result = match op {
            BinOp::Add => {
                let dest = self.alloc()?;
                self.emit(Inst::Add(a, b, dest));
                dest
            }
            BinOp::Sub => {
                let dest = self.alloc()?;
                self.emit(Inst::Sub(a, b, dest));
                dest
            }
            BinOp::Mul => {
                let dest = self.alloc()?;
                self.emit(Inst::Mul(a, b, dest));
                dest
            }
            // a > b is the primitive; a < b swaps the operands
            BinOp::Gt => {
                let dest = self.alloc()?;
                self.emit(Inst::CmpGt(a, b, dest));
                dest
            }
            BinOp::Lt => {
                let dest = self.alloc()?;
                self.emit(Inst::CmpGt(b, a, dest));
                dest
            }
            BinOp::Le => self.not_greater(a, b)?,
            BinOp::Ge => self.not_greater(b, a)?,
            BinOp::Eq => {
                // a == b is cmpGT(1, a - b): the unsigned difference is zero
                // exactly when 1 exceeds it
                let dest = self.alloc()?;
                self.emit(Inst::Sub(a, b, dest));
                let one = self.alloc()?;
                self.emit(Inst::Li(one, Imm::Value(1)));
                self.emit(Inst::CmpGt(one, dest, dest));
                self.regs.free(one);
                dest
            }
            BinOp::Ne => {
                // nonzero difference is true
                let dest = self.alloc()?;
                self.emit(Inst::Sub(a, b, dest));
                dest
            }
            BinOp::Assign => {
                return Err(self.malformed("assignment reached the arithmetic generator"))
            }
        };

        self.release(a);
        self.release(b);
        Ok(Value::Reg(result))
    }

    /// `1 - cmpGT(a, b)`, the shared tail of `<=` and `>=`.
    fn not_greater(&mut self, a: Reg, b: Reg) -> CompileResult<Reg> {
        let dest = self.alloc()?;
        self.emit(Inst::CmpGt(a, b, dest));
        let one = self.alloc()?;
        self.emit(Inst::Li(one, Imm::Value(1)));
        self.emit(Inst::Sub(one, dest, dest));
        self.regs.free(one);
        Ok(dest)
    }

    /// Assignment evaluates the right-hand side fully first. A privileged
    /// target then goes through the write protocol (the request window only
    /// covers the store); a plain identifier is rebound to the value's
    /// register.
    fn assign(&mut self, lhs: ExprId, rhs: ExprId) -> CompileResult<Value> {
        let program = self.program;
        let name = match program.expr(lhs) {
            Expr::Ident(name) => name.as_str(),
            other => {
                return Err(self.malformed(format!(
                    "assignment target must be an identifier, found {other:?}"
                )))
            }
        };

        let rhs_value = self.expr(rhs)?;
        let src = self.resolve_value(rhs_value)?;

        if let Some(&address) = self.priv_objects.get(name) {
            self.priv_write(address, src)?;
            // The stored value stays resident as the expression result, but
            // the privileged name itself keeps resolving through the address
            // table on every reference.
            return Ok(Value::Reg(src));
        }

        if let Some(&old) = self.symbols.get(name) {
            if old != src {
                self.symbols.remove(name);
                self.release(old);
            }
        }
        self.symbols.insert(name.to_string(), src);
        Ok(Value::Reg(src))
    }

    /// User function call ABI: push every live register (the result channel,
    /// register 0, excepted), marshal arguments into registers 2.. in
    /// declaration order, jump to the callee's label staged through the
    /// caller-clobbered pair 0/1, then restore symmetrically. Register 0
    /// carries the return value and is copied into a fresh register so a
    /// later call cannot clobber it.
    fn call(&mut self, callee: &str, args: &[ExprId]) -> CompileResult<Value> {
        log::trace!("call to `{callee}` with {} arguments", args.len());
        let saved: Vec<Reg> = (1..STACK_POINTER)
            .filter(|&reg| self.regs.is_occupied(reg))
            .collect();
        self.push_registers(&saved)?;

        for (index, &arg) in args.iter().enumerate() {
            let slot = (index + 2) as Reg;
            if slot >= STACK_POINTER {
                return Err(self.malformed(format!(
                    "call to `{callee}` passes {} arguments, more than the register file holds",
                    args.len()
                )));
            }
            let value = self.expr(arg)?;
            let src = self.resolve_value(value)?;
            self.move_into(slot, src);
        }

        self.emit(Inst::Li(0, Imm::Value(0)));
        self.emit(Inst::Li(1, Imm::Label(callee.to_string())));
        self.emit(Inst::JmpEqZ(0, 1));

        let result_channel_was_free = !self.regs.is_occupied(0);
        if result_channel_was_free {
            self.regs.mark_occupied(0);
        }
        self.pop_registers(&saved)?;

        // Argument slots are dead after the restore unless they were saved
        // (a saved slot holds a live caller value again).
        for index in 0..args.len() {
            let slot = (index + 2) as Reg;
            if !saved.contains(&slot) {
                self.release(slot);
            }
        }

        let dest = self.alloc()?;
        self.emit(Inst::Li(dest, Imm::Value(0)));
        self.emit(Inst::Add(0, dest, dest));
        if result_channel_was_free {
            self.regs.free(0);
        }
        Ok(Value::Reg(dest))
    }

    /// Syscall ABI: arguments go into registers 0..=2 in order, the fixed
    /// syscall number into the next free register, then `syscall`. Syscalls
    /// are not user-call boundaries, so nothing is saved or restored; live
    /// occupants of a staging register are moved aside and rebound. Source
    /// order among syscalls is preserved exactly.
    fn syscall(&mut self, call: Syscall, args: &[ExprId]) -> CompileResult<Value> {
        if args.len() != call.arity() {
            return Err(self.malformed(format!(
                "syscall {} takes {} arguments, got {}",
                call.name(),
                call.arity(),
                args.len()
            )));
        }

        for (index, &arg) in args.iter().enumerate() {
            let slot = index as Reg;
            if self.regs.is_occupied(slot) {
                // Move the occupant aside and retarget any binding to it.
                let fresh = self.alloc()?;
                self.emit(Inst::Li(fresh, Imm::Value(0)));
                self.emit(Inst::Add(slot, fresh, fresh));
                for bound in self.symbols.values_mut() {
                    if *bound == slot {
                        *bound = fresh;
                    }
                }
                self.regs.free(slot);
            }
            let value = self.expr(arg)?;
            let src = self.resolve_value(value)?;
            self.move_into(slot, src);
        }

        let num = self.alloc()?;
        self.emit(Inst::Li(num, Imm::Value(call.number())));
        self.emit(Inst::Syscall(num));
        self.regs.free(num);

        // The kernel transition consumes the argument registers; register 0
        // carries the result.
        for index in 1..args.len() {
            self.release(index as Reg);
        }
        self.regs.mark_occupied(0);
        Ok(Value::Reg(0))
    }

    /// Copy `src` into the fixed register `dest` (argument marshaling).
    /// There is no register move, so the copy is `li dest 0; add src dest
    /// dest`.
    fn move_into(&mut self, dest: Reg, src: Reg) {
        if dest == src {
            self.regs.mark_occupied(dest);
            return;
        }
        self.regs.mark_occupied(dest);
        self.emit(Inst::Li(dest, Imm::Value(0)));
        self.emit(Inst::Add(src, dest, dest));
        self.release(src);
    }
}
