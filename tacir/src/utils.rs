use strum::{EnumIs, EnumTryAs};
use thiserror::Error;

use crate::modules::operand::Value;

/// A single diagnostic produced while parsing textual IR.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParserError {
    /// Source file, when parsing from a path.
    pub file: Option<String>,
    /// Byte offset where the error starts.
    pub start: usize,
    /// Byte offset where the error ends.
    pub end: usize,
    pub message: String,
}

impl std::fmt::Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}..{}: {}",
            self.file.as_deref().unwrap_or("<input>"),
            self.start,
            self.end,
            self.message
        )
    }
}

fn join_errors(errors: &[ParserError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, PartialEq, Eq, Hash, EnumIs, EnumTryAs, Error)]
pub enum Error {
    /// A value is defined more than once within the same function.
    #[error(
        "Multiple definitions of `{duplicate}` violate SSA requirements in function `{function}`. A value must be defined exactly once within a function."
    )]
    DuplicateDefinition { function: String, duplicate: Value },

    /// An operand refers to a value never defined within the function.
    #[error("Function `{function}` uses `{undefined}` which is never defined in the function.")]
    UndefinedValue { function: String, undefined: Value },

    /// An operand refers to a value defined in the function but not visible
    /// at the point of use.
    #[error(
        "Function `{function}` uses `{value}` at a point not dominated by its definition."
    )]
    UseBeforeDefinition { function: String, value: Value },

    /// Two functions share the same symbol name.
    #[error("A function named `{0}` already exists in the module.")]
    DuplicateFunction(String),

    /// The function body has no entry block.
    #[error("Function `{0}` has no entry block.")]
    MissingEntryBlock(String),

    /// A call operation carries no callee symbol.
    #[error("A call in function `{function}` has no `callee` symbol attribute.")]
    MissingCallee { function: String },

    /// A call refers to a function not defined within the module.
    #[error(
        "An operation of function `{function}` calls `{callee}` which is not defined within the module."
    )]
    UndefinedCallee { function: String, callee: String },

    /// Operand or result list of a call does not match the callee signature.
    #[error(
        "A call to `{callee}` in function `{function}` does not match the callee signature: expected ({expected}), found ({found})."
    )]
    CallSignatureMismatch {
        function: String,
        callee: String,
        expected: String,
        found: String,
    },

    /// A return operation does not match the declared result types.
    #[error(
        "Function `{function}` returns {found} values but declares {expected} result types."
    )]
    ReturnArityMismatch {
        function: String,
        expected: usize,
        found: usize,
    },

    /// A return operation yields values of the wrong types.
    #[error(
        "Function `{function}` returns ({found}) but declares result types ({expected})."
    )]
    ReturnTypeMismatch {
        function: String,
        expected: String,
        found: String,
    },

    /// The textual IR could not be read.
    #[error("Failed to read `{path}`: {message}")]
    IoError { path: String, message: String },

    /// The textual IR could not be parsed.
    #[error("Failed to parse module: {}", join_errors(.errors))]
    ParserErrors { errors: Vec<ParserError> },
}
