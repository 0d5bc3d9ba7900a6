//! Error types for the gate compiler.
//!
//! Every failure is fatal: there is no partial-success mode and no recovery
//! mid-compilation. Errors carry enough context (function name, source line,
//! node detail) to locate the cause.

use thiserror::Error;

/// Fatal code-generation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// All general-purpose registers are occupied and no spill path exists.
    /// This is a documented capability limit of the target, not a recoverable
    /// condition.
    #[error("register budget exhausted in function `{function}`: no free register and spilling is unsupported")]
    RegistersExhausted { function: String },

    #[error("jump target `{label}` is never defined")]
    UnresolvedLabel { label: String },

    #[error("label `{label}` is defined more than once")]
    LabelCollision { label: String },

    #[error("function `{function}` declares {count} parameters, but only {max} registers are available")]
    TooManyParameters {
        function: String,
        count: usize,
        max: usize,
    },

    /// A node reached a generator path that does not accept it. Well-formed
    /// input never triggers this, but it is detected rather than skipped.
    #[error("malformed AST in function `{function}`: {detail}")]
    MalformedAst { function: String, detail: String },
}

/// Result type alias for code-generation operations.
pub type CompileResult<T> = Result<T, CompileError>;

/// Fatal scanner or parser failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: unexpected character `{ch}`")]
    UnexpectedChar { ch: char, line: usize },

    #[error("line {line}: numeric literal does not fit in 64 bits")]
    NumberOutOfRange { line: usize },

    /// Privileged-object addresses must fit in 16 bits.
    #[error("line {line}: privileged address {value} does not fit in 16 bits")]
    AddressOutOfRange { value: u64, line: usize },

    #[error("line {line}: unexpected {found}, expected {expected}")]
    Unexpected {
        found: String,
        expected: String,
        line: usize,
    },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },
}

/// Result type alias for front-end operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Any failure the compiler driver can produce.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Compile(#[from] CompileError),
}
