//! Crate-wide error type.
//!
//! Every phase of the pipeline returns `Result<_, CompileError>` and
//! propagates failures with `?`. Front-end diagnostics (lexing through type
//! checking) are reported plainly; `Internal` marks a violation of an
//! invariant later phases assume has already been ruled out.

use std::fmt;

#[derive(Debug)]
pub enum CompileError {
    Lex(String),
    Parse(String),
    Name(String),
    Type(String),
    Internal(String),
    Io(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Lex(s) => write!(f, "lex error: {s}"),
            CompileError::Parse(s) => write!(f, "parse error: {s}"),
            CompileError::Name(s) => write!(f, "name error: {s}"),
            CompileError::Type(s) => write!(f, "type error: {s}"),
            CompileError::Internal(s) => write!(f, "Compiler is Broken! {s}"),
            CompileError::Io(s) => write!(f, "io error: {s}"),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<std::io::Error> for CompileError {
    fn from(e: std::io::Error) -> Self {
        CompileError::Io(e.to_string())
    }
}

impl From<std::fmt::Error> for CompileError {
    fn from(e: std::fmt::Error) -> Self {
        CompileError::Internal(format!("formatting failure: {e}"))
    }
}

impl From<crate::codegen::error::CodeGenError> for CompileError {
    fn from(e: crate::codegen::error::CodeGenError) -> Self {
        CompileError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_carry_the_broken_prefix() {
        let e = CompileError::Internal("null symbol".to_string());
        assert_eq!(e.to_string(), "Compiler is Broken! null symbol");
    }

    #[test]
    fn front_end_errors_are_plain() {
        let e = CompileError::Type("cannot add Bool to Int".to_string());
        assert_eq!(e.to_string(), "type error: cannot add Bool to Int");
    }
}
