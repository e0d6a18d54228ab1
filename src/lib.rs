//! Lake compiler backend.
//!
//! Source text goes through six independent phases — lex, parse, resolve,
//! type-check, lower, codegen — each taking sole ownership of the previous
//! phase's output. `main.rs` drives individual phases for the
//! `-t/-p/-n/-c/-a/-o` flags; [`compile_to_asm`] runs all of them.

pub mod ast;
pub mod codegen;
pub mod error;
pub mod ir;
pub mod lexer;
pub mod lower;
pub mod parser;
pub mod resolver;
pub mod typechecker;
pub mod types;
pub mod unparse;

pub use error::CompileError;
pub use ir::program::IRProgram;
pub use lexer::{Token, tokenize};
pub use lower::Lowering;
pub use parser::Parser;
pub use resolver::Resolver;
pub use typechecker::TypeChecker;

/// Lex only. One line per token in source order, `Eof` included.
pub fn dump_tokens(source: &str) -> Result<String, CompileError> {
    let toks = tokenize(source)?;
    let mut out = String::new();
    for t in &toks {
        out.push_str(&t.to_string());
        out.push('\n');
    }
    Ok(out)
}

/// Lex and parse. Pretty-prints the raw, unresolved AST.
pub fn unparse(source: &str) -> Result<String, CompileError> {
    let toks = tokenize(source)?;
    let prog = Parser::new(toks).parse_program()?;
    Ok(unparse::unparse_program(&prog))
}

/// Lex, parse, and resolve. Pretty-prints the AST with every identifier
/// annotated by its resolved symbol id.
pub fn dump_resolved(source: &str) -> Result<String, CompileError> {
    let toks = tokenize(source)?;
    let mut prog = Parser::new(toks).parse_program()?;
    let table = Resolver::new().resolve(&mut prog)?;
    Ok(unparse::unparse_resolved(&prog, &table))
}

/// Lex, parse, resolve, and type-check. Returns `Ok(())` on a well-typed
/// program; the back end is never invoked.
pub fn check(source: &str) -> Result<(), CompileError> {
    let toks = tokenize(source)?;
    let mut prog = Parser::new(toks).parse_program()?;
    let table = Resolver::new().resolve(&mut prog)?;
    TypeChecker::new(&table).check_program(&prog)
}

/// Lex through lowering. Returns the completed 3AC IR.
pub fn lower(source: &str) -> Result<IRProgram, CompileError> {
    let toks = tokenize(source)?;
    let mut prog = Parser::new(toks).parse_program()?;
    let table = Resolver::new().resolve(&mut prog)?;
    TypeChecker::new(&table).check_program(&prog)?;
    Lowering::new(table).lower_program(&prog)
}

/// Runs every phase and emits x86-64 AT&T-syntax assembly text.
pub fn compile_to_asm(source: &str) -> Result<String, CompileError> {
    let ir = lower(source)?;
    Ok(codegen::emit_x64(&ir)?)
}
