//! Black-box CLI tests: drive the built `lakec` binary against temp files
//! instead of calling library functions directly.

use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn lakec() -> Command {
    Command::new(env!("CARGO_BIN_EXE_lakec"))
}

#[test]
fn no_flags_prints_usage_and_exits_nonzero() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("a.lake");
    fs::write(&src, "fn main() { }").unwrap();

    let out = lakec().arg(&src).output().unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("usage"));
}

#[test]
fn dash_dash_tokens_sentinel_writes_to_stdout() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("a.lake");
    fs::write(&src, "int x;").unwrap();

    let out = lakec().arg(&src).arg("-t").arg("--").output().unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("IntType"));
    assert!(stdout.lines().last().unwrap().starts_with("Eof"));
}

#[test]
fn three_ac_flag_writes_ir_dump_to_a_file() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("a.lake");
    let ir_out = dir.path().join("a.3ac");
    fs::write(&src, "fn main() { write 1; }").unwrap();

    let status = lakec()
        .arg(&src)
        .arg("-a")
        .arg(&ir_out)
        .status()
        .unwrap();
    assert!(status.success());
    let ir_text = fs::read_to_string(&ir_out).unwrap();
    assert!(ir_text.contains("enter main"));
}

#[test]
fn out_flag_emits_assembly_with_a_start_label() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("a.lake");
    let asm_out = dir.path().join("a.s");
    fs::write(&src, "fn main() { write \"hi\"; }").unwrap();

    let status = lakec()
        .arg(&src)
        .arg("-o")
        .arg(&asm_out)
        .status()
        .unwrap();
    assert!(status.success());
    let asm = fs::read_to_string(&asm_out).unwrap();
    assert!(asm.contains("_start:"));
    assert!(asm.contains("callq printString"));
}

#[test]
fn check_flag_fails_on_a_type_error_and_exits_nonzero() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("bad.lake");
    fs::write(&src, "fn main() { int x; x = true; }").unwrap();

    let out = lakec().arg(&src).arg("-c").output().unwrap();
    assert!(!out.status.success());
    assert!(!String::from_utf8_lossy(&out.stderr).is_empty());
}

#[test]
fn multiple_flags_run_independent_phases_in_one_invocation() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("a.lake");
    let tokens_out = dir.path().join("a.tok");
    let unparse_out = dir.path().join("a.unparse");
    fs::write(&src, "fn main() { write 1; }").unwrap();

    let status = lakec()
        .arg(&src)
        .arg("-t")
        .arg(&tokens_out)
        .arg("-p")
        .arg(&unparse_out)
        .status()
        .unwrap();
    assert!(status.success());
    assert!(tokens_out.exists());
    assert!(unparse_out.exists());
}
