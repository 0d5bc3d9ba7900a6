//! Shared compiler infrastructure.
//!
//! # Key Components
//!
//! ## Register Allocation (`register_file`)
//! - Boolean occupancy over the eight machine registers
//! - Stack/frame pointer pair permanently reserved
//! - Lowest-free-first allocation, no spilling
//!
//! ## Error Handling (`error`)
//! - Fatal, context-carrying diagnostics for both the front end and the
//!   code generator

pub mod error;
pub mod register_file;

pub use error::{CompileError, CompileResult, Error, ParseError, ParseResult};
pub use register_file::{RegisterFile, RegistersExhausted, USABLE_REGISTERS};
