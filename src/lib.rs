//! gatec - compiler for a capability-gated bytecode target.
//!
//! gatec lowers a small C-like language to a register bytecode in which
//! certain named memory cells ("privileged objects") cannot be touched
//! directly: every load or store of such a cell must be bracketed by a
//! cost-charging `request` instruction naming the exact address and a cycle
//! window, and privileged stores are globally ordered side effects. The
//! interesting work is in the code generator: register allocation under a
//! hard 8-register file, the access-request protocol, call and syscall ABI
//! lowering, and resolving the flat labeled stream to numeric jump targets.
//!
//! # Primary Usage
//!
//! ```
//! let source = "//(gate, 200)\nmain() { d = 0; e = 2; gate = d + e; }";
//! let bytecode = gatec::compile_source(source)?;
//! assert!(bytecode.lines().any(|line| line.starts_with("request")));
//! # Ok::<(), gatec::Error>(())
//! ```
//!
//! # Architecture
//!
//! - [`lex`] / [`parse`] - front end producing the arena AST
//! - [`ast`] - arena-stored AST node types
//! - [`codegen`] - register allocation, privileged access, lowering
//! - [`inst`] - typed instruction representation and text rendering
//! - [`core`] - shared infrastructure (errors, register file)

pub mod ast;
pub mod codegen;
pub mod core;
pub mod inst;
pub mod lex;
pub mod parse;

pub use crate::core::{CompileError, CompileResult, Error, ParseError, ParseResult};

use crate::ast::Program;
use crate::codegen::Codegen;
use crate::inst::{Inst, Line};

/// Lower a program to the labeled instruction stream, before resolution.
pub fn lower_program(program: &Program) -> CompileResult<Vec<Line>> {
    Codegen::new(program).lower()
}

/// Compile a program to the final resolved instruction stream.
pub fn compile_program(program: &Program) -> CompileResult<Vec<Inst>> {
    Codegen::new(program).run()
}

/// Compile source text all the way to rendered bytecode, one instruction
/// per line.
pub fn compile_source(source: &str) -> Result<String, Error> {
    let program = parse::parse(source)?;
    let instructions = compile_program(&program)?;
    Ok(inst::render(&instructions))
}
