//! Register occupancy tracking and allocation.
//!
//! The target machine has eight registers. Two of them, the stack pointer and
//! the frame pointer, are permanently reserved for the duration of a function
//! body and are never handed out. Occupancy is a plain boolean per register,
//! reset at every function boundary. There is no spilling: when nothing is
//! free, allocation fails and the caller reports a fatal diagnostic.

use crate::inst::{Reg, FRAME_POINTER, NUM_REGISTERS, STACK_POINTER};

/// Number of registers usable for values (total minus the reserved pair).
pub const USABLE_REGISTERS: usize = NUM_REGISTERS - 2;

/// No general-purpose register is free. There is no spill fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistersExhausted;

/// Per-function register occupancy state.
pub struct RegisterFile {
    occupied: [bool; NUM_REGISTERS],
}

impl RegisterFile {
    pub fn new() -> Self {
        let mut file = Self {
            occupied: [false; NUM_REGISTERS],
        };
        file.reset();
        file
    }

    /// Reset for a new function body: everything free except the reserved
    /// stack/frame pointer pair.
    pub fn reset(&mut self) {
        self.occupied = [false; NUM_REGISTERS];
        self.occupied[STACK_POINTER as usize] = true;
        self.occupied[FRAME_POINTER as usize] = true;
    }

    /// Allocate the lowest free register id.
    ///
    /// Lowest-first is the fixed deterministic rule; it also lets syscall
    /// argument staging land in registers 0..=2 without extra moves in the
    /// common case.
    pub fn allocate(&mut self) -> Result<Reg, RegistersExhausted> {
        for id in 0..NUM_REGISTERS {
            if !self.occupied[id] {
                self.occupied[id] = true;
                return Ok(id as Reg);
            }
        }
        Err(RegistersExhausted)
    }

    /// Mark a specific register occupied (parameter binding, argument
    /// marshaling into fixed slots).
    pub fn mark_occupied(&mut self, reg: Reg) {
        self.occupied[reg as usize] = true;
    }

    /// Return a register to the free pool. The reserved pair stays occupied.
    pub fn free(&mut self, reg: Reg) {
        if reg == STACK_POINTER || reg == FRAME_POINTER {
            return;
        }
        debug_assert!(self.occupied[reg as usize], "freeing register {reg} twice");
        self.occupied[reg as usize] = false;
    }

    pub fn is_occupied(&self, reg: Reg) -> bool {
        self.occupied[reg as usize]
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_is_lowest_free_first() {
        let mut regs = RegisterFile::new();
        assert_eq!(regs.allocate(), Ok(0));
        assert_eq!(regs.allocate(), Ok(1));
        regs.free(0);
        assert_eq!(regs.allocate(), Ok(0));
        assert_eq!(regs.allocate(), Ok(2));
    }

    #[test]
    fn test_reserved_registers_are_never_allocated() {
        let mut regs = RegisterFile::new();
        for _ in 0..USABLE_REGISTERS {
            let reg = regs.allocate().unwrap();
            assert_ne!(reg, STACK_POINTER);
            assert_ne!(reg, FRAME_POINTER);
        }
        assert_eq!(regs.allocate(), Err(RegistersExhausted));
    }

    #[test]
    fn test_free_on_reserved_register_is_ignored() {
        let mut regs = RegisterFile::new();
        regs.free(STACK_POINTER);
        regs.free(FRAME_POINTER);
        assert!(regs.is_occupied(STACK_POINTER));
        assert!(regs.is_occupied(FRAME_POINTER));
    }

    #[test]
    fn test_reset_clears_everything_but_the_reserved_pair() {
        let mut regs = RegisterFile::new();
        while regs.allocate().is_ok() {}
        regs.reset();
        assert_eq!(regs.allocate(), Ok(0));
        assert!(regs.is_occupied(STACK_POINTER));
        assert!(regs.is_occupied(FRAME_POINTER));
    }

    #[test]
    fn test_mark_occupied_pins_a_slot() {
        let mut regs = RegisterFile::new();
        regs.mark_occupied(2);
        assert_eq!(regs.allocate(), Ok(0));
        assert_eq!(regs.allocate(), Ok(1));
        assert_eq!(regs.allocate(), Ok(3));
    }
}
