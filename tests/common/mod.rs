//! Shared test harness: a small interpreter for the resolved instruction
//! stream, recording the side effects the compiler must get right (request
//! windows, privileged stores, syscall ordering).
#![allow(dead_code)]

use gatec::ast::Program;
use gatec::inst::{Imm, Inst};

const MEMORY_CELLS: usize = 65536;
const STEP_LIMIT: usize = 100_000;

pub struct Vm {
    pub regs: [u64; 8],
    pub mem: Vec<u64>,
    /// Every executed `request`, as (address, cycle window).
    pub requests: Vec<(u64, u64)>,
    /// Every executed `store`, as (address, value).
    pub stores: Vec<(u64, u64)>,
    /// Every executed `syscall`, as (number, [r0, r1, r2]).
    pub syscalls: Vec<(u64, [u64; 3])>,
}

impl Vm {
    /// Execute a resolved program until `exit` and return the final state.
    pub fn run(program: &[Inst]) -> Vm {
        let mut vm = Vm {
            regs: [0; 8],
            mem: vec![0; MEMORY_CELLS],
            requests: Vec::new(),
            stores: Vec::new(),
            syscalls: Vec::new(),
        };
        let mut pc: usize = 1;
        for _ in 0..STEP_LIMIT {
            let inst = program
                .get(pc - 1)
                .unwrap_or_else(|| panic!("pc {pc} ran off the end of the program"));
            pc += 1;
            match inst {
                Inst::Exit => return vm,
                Inst::Add(a, b, d) => {
                    vm.regs[*d as usize] =
                        vm.regs[*a as usize].wrapping_add(vm.regs[*b as usize]);
                }
                Inst::Sub(a, b, d) => {
                    vm.regs[*d as usize] =
                        vm.regs[*a as usize].wrapping_sub(vm.regs[*b as usize]);
                }
                Inst::Mul(a, b, d) => {
                    vm.regs[*d as usize] =
                        vm.regs[*a as usize].wrapping_mul(vm.regs[*b as usize]);
                }
                Inst::CmpGt(a, b, d) => {
                    vm.regs[*d as usize] =
                        u64::from(vm.regs[*a as usize] > vm.regs[*b as usize]);
                }
                Inst::Load(addr, dest) => {
                    vm.regs[*dest as usize] = vm.mem[vm.regs[*addr as usize] as usize];
                }
                Inst::Store(addr, src) => {
                    let address = vm.regs[*addr as usize];
                    let value = vm.regs[*src as usize];
                    vm.mem[address as usize] = value;
                    vm.stores.push((address, value));
                }
                Inst::Request(addr, cycles) => {
                    vm.requests
                        .push((vm.regs[*addr as usize], vm.regs[*cycles as usize]));
                }
                Inst::Li(reg, Imm::Value(value)) => vm.regs[*reg as usize] = *value,
                Inst::Li(_, Imm::Label(label)) => {
                    panic!("unresolved label `{label}` reached the interpreter")
                }
                Inst::JmpEqZ(test, target) => {
                    if vm.regs[*test as usize] == 0 {
                        pc = vm.regs[*target as usize] as usize;
                    }
                }
                Inst::Syscall(num) => {
                    vm.syscalls.push((
                        vm.regs[*num as usize],
                        [vm.regs[0], vm.regs[1], vm.regs[2]],
                    ));
                    vm.regs[0] = 0;
                }
            }
        }
        panic!("program exceeded {STEP_LIMIT} steps without exiting");
    }
}

pub fn parse(source: &str) -> Program {
    gatec::parse::parse(source).expect("source should parse")
}

pub fn compile(source: &str) -> Vec<Inst> {
    gatec::compile_program(&parse(source)).expect("source should compile")
}

pub fn run(source: &str) -> Vm {
    Vm::run(&compile(source))
}
