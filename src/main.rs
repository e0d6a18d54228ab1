//! `lakec` command-line driver.
//!
//! Each flag runs an independent phase against a fresh parse of the input
//! file, matching the original tool's behavior of never sharing state
//! between requested outputs. `--` as an output path means "write to
//! standard output".

use clap::Parser as ClapParser;
use lakec::CompileError;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

#[derive(ClapParser)]
#[command(name = "lakec")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Lake compiler: source to tokens, AST, 3AC, or x86-64", long_about = None)]
struct Cli {
    /// Lake source file to compile
    infile: PathBuf,

    /// Dump the token stream
    #[arg(short = 't', value_name = "FILE", allow_hyphen_values = true)]
    tokens: Option<PathBuf>,

    /// Pretty-print the unresolved AST
    #[arg(short = 'p', value_name = "FILE", allow_hyphen_values = true)]
    unparse: Option<PathBuf>,

    /// Pretty-print the AST with resolved symbol annotations
    #[arg(short = 'n', value_name = "FILE", allow_hyphen_values = true)]
    name_analysis: Option<PathBuf>,

    /// Run type checking only
    #[arg(short = 'c')]
    check: bool,

    /// Dump the lowered 3AC IR
    #[arg(short = 'a', value_name = "FILE", allow_hyphen_values = true)]
    three_ac: Option<PathBuf>,

    /// Emit x86-64 AT&T-syntax assembly
    #[arg(short = 'o', value_name = "FILE", allow_hyphen_values = true)]
    out: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    if cli.tokens.is_none()
        && cli.unparse.is_none()
        && cli.name_analysis.is_none()
        && !cli.check
        && cli.three_ac.is_none()
        && cli.out.is_none()
    {
        eprintln!(
            "usage: lakec <infile> [-t <tokensFile>] [-p <unparseFile>] \
             [-n <nameAnalysisFile>] [-c] [-a <3ACFile>] [-o <x64File>]"
        );
        process::exit(1);
    }

    let source = match fs::read_to_string(&cli.infile) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error reading {}: {e}", cli.infile.display());
            process::exit(1);
        }
    };

    let mut ok = true;

    if let Some(path) = &cli.tokens {
        ok &= run_phase(path, lakec::dump_tokens(&source));
    }
    if let Some(path) = &cli.unparse {
        ok &= run_phase(path, lakec::unparse(&source));
    }
    if let Some(path) = &cli.name_analysis {
        ok &= run_phase(path, lakec::dump_resolved(&source));
    }
    if cli.check {
        match lakec::check(&source) {
            Ok(()) => println!("{}: no type errors", cli.infile.display()),
            Err(e) => {
                eprintln!("{e}");
                ok = false;
            }
        }
    }
    if let Some(path) = &cli.three_ac {
        ok &= run_phase(path, lakec::lower(&source).map(|ir| ir.render()));
    }
    if let Some(path) = &cli.out {
        ok &= run_phase(path, lakec::compile_to_asm(&source));
    }

    if !ok {
        process::exit(1);
    }
}

/// Runs one phase and routes its output to `path` (or stdout for `--`).
/// Returns whether the phase succeeded.
fn run_phase(path: &Path, result: Result<String, CompileError>) -> bool {
    match result {
        Ok(text) => {
            if path == Path::new("--") {
                print!("{text}");
            } else if let Err(e) = fs::write(path, text) {
                eprintln!("error writing {}: {e}", path.display());
                return false;
            }
            true
        }
        Err(e) => {
            eprintln!("{e}");
            false
        }
    }
}
