//! Privileged-cell access bracketing.
//!
//! Every load or store of a privileged address is preceded by a `request`
//! naming that exact address and a cycle-budget window. Requests are never
//! merged across addresses and privileged stores are never reordered, even
//! when the two accesses are adjacent in source: sequential consistency
//! across privileged stores is a hard contract. Register-resident
//! computation never enters this path, so the only cost lever is not issuing
//! requests that are not needed.

use super::{Codegen, Value, READ_BUDGET, WRITE_BUDGET};
use crate::core::error::CompileResult;
use crate::inst::{Imm, Inst, Reg};

impl Codegen<'_> {
    /// Emit the read sequence for a privileged cell and return the register
    /// holding the loaded value. The address register is reused as the
    /// destination once the request is in flight.
    pub(crate) fn priv_read(&mut self, address: u16) -> CompileResult<Reg> {
        log::trace!("privileged read of address {address}");
        let addr = self.alloc()?;
        self.emit(Inst::Li(addr, Imm::Value(u64::from(address))));
        let cycles = self.alloc()?;
        self.emit(Inst::Li(cycles, Imm::Value(READ_BUDGET)));
        self.emit(Inst::Request(addr, cycles));
        self.regs.free(cycles);
        self.emit(Inst::Load(addr, addr));
        Ok(addr)
    }

    /// Emit the write sequence storing `src` into a privileged cell. The
    /// value must already be computed so the request window only covers the
    /// store itself.
    pub(crate) fn priv_write(&mut self, address: u16, src: Reg) -> CompileResult<()> {
        log::trace!("privileged write of address {address}");
        let addr = self.alloc()?;
        self.emit(Inst::Li(addr, Imm::Value(u64::from(address))));
        let cycles = self.alloc()?;
        self.emit(Inst::Li(cycles, Imm::Value(WRITE_BUDGET)));
        self.emit(Inst::Request(addr, cycles));
        self.emit(Inst::Store(addr, src));
        self.regs.free(cycles);
        self.regs.free(addr);
        Ok(())
    }

    /// Resolve a value to a resident register, entering the access protocol
    /// for deferred privileged descriptors.
    pub(crate) fn resolve_value(&mut self, value: Value) -> CompileResult<Reg> {
        match value {
            Value::Reg(reg) => Ok(reg),
            Value::Priv(address) => self.priv_read(address),
        }
    }
}
