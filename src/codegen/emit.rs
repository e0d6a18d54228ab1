//! 3AC → x86-64 (AT&T syntax) emission. Runs after [`super::alloc::allocate`]
//! has fixed every operand's memory location.

use super::alloc::{allocate, frame_size};
use super::error::CodeGenError;
use crate::ir::operand::{Locations, Operand, OperandType};
use crate::ir::procedure::Procedure;
use crate::ir::program::IRProgram;
use crate::ir::quad::{BinOp, Instr, Quad, SyscallKind, UnaryOp};
use std::fmt::Write as _;

pub fn emit_x64(prog: &IRProgram) -> Result<String, CodeGenError> {
    let locs = allocate(prog);
    let mut out = String::new();
    emit_data(prog, &mut out)?;
    out.push_str(".text\n");
    out.push_str(".globl _start\n");
    for proc in &prog.procedures {
        writeln!(out, ".globl fun_{}", proc.name)?;
    }
    out.push_str("_start:\n");
    let main_proc = prog
        .procedures
        .iter()
        .find(|p| p.is_main)
        .ok_or_else(|| CodeGenError::Logic("program has no 'main' procedure".to_string()))?;
    writeln!(out, "jmp fun_{}", main_proc.name)?;
    for proc in &prog.procedures {
        emit_procedure(prog, proc, &locs, &mut out)?;
    }
    Ok(out)
}

fn emit_data(prog: &IRProgram, out: &mut String) -> Result<(), CodeGenError> {
    out.push_str(".data\n");
    for g in &prog.globals {
        let name = &prog.symtab.get(*g).name;
        writeln!(out, "gbl_{name}:")?;
        out.push_str(".quad 0\n");
    }
    for (id, s) in prog.strings() {
        writeln!(out, "str_{}:", id.0)?;
        writeln!(out, ".asciz {:?}", s)?;
    }
    out.push_str(".align 8\n");
    Ok(())
}

fn emit_procedure(
    prog: &IRProgram,
    proc: &Procedure,
    locs: &Locations,
    out: &mut String,
) -> Result<(), CodeGenError> {
    writeln!(out, "fun_{}:", proc.name)?;
    let frame = frame_size(prog, proc.id);
    emit_instr(prog, proc, &proc.enter, locs, frame, out)?;
    for instr in &proc.body {
        emit_instr(prog, proc, instr, locs, frame, out)?;
    }
    emit_instr(prog, proc, &proc.leave, locs, frame, out)?;
    Ok(())
}

fn emit_instr(
    prog: &IRProgram,
    proc: &Procedure,
    instr: &Instr,
    locs: &Locations,
    frame: i64,
    out: &mut String,
) -> Result<(), CodeGenError> {
    for label in &instr.labels {
        writeln!(out, "{label}:")?;
    }
    emit_quad(prog, proc, &instr.quad, locs, frame, out)
}

fn emit_quad(
    prog: &IRProgram,
    proc: &Procedure,
    quad: &Quad,
    locs: &Locations,
    frame: i64,
    out: &mut String,
) -> Result<(), CodeGenError> {
    match quad {
        Quad::Enter { .. } => {
            out.push_str("subq $8,%rsp\n");
            out.push_str("movq %rbp,(%rsp)\n");
            out.push_str("movq %rsp,%rbp\n");
            out.push_str("addq $16,%rbp\n");
            writeln!(out, "subq ${frame},%rsp")?;
        }
        Quad::Leave { .. } => {
            writeln!(out, "addq ${frame},%rsp")?;
            out.push_str("movq (%rsp),%rbp\n");
            out.push_str("addq $8,%rsp\n");
            out.push_str("ret\n");
        }
        Quad::Assign { dst, src } => {
            load(src, "%rax", prog, locs, out)?;
            store(dst, "%rax", prog, locs, out)?;
        }
        Quad::BinOp { dst, op, src1, src2 } => {
            emit_binop(*op, dst, src1, src2, prog, locs, out)?;
        }
        Quad::UnaryOp { dst, op, src } => {
            load(src, "%rax", prog, locs, out)?;
            match op {
                UnaryOp::Neg => out.push_str("negq %rax\n"),
                UnaryOp::Not => out.push_str("notq %rax\n"),
            }
            store(dst, "%rax", prog, locs, out)?;
        }
        Quad::Jmp { target } => writeln!(out, "jmp {target}")?,
        Quad::JmpIf { cond, invert, target } => {
            load(cond, "%rax", prog, locs, out)?;
            out.push_str("cmpq $0,%rax\n");
            let mnemonic = if *invert { "jne" } else { "je" };
            writeln!(out, "{mnemonic} {target}")?;
        }
        Quad::Nop => out.push_str("nop\n"),
        Quad::Syscall { kind, arg } => emit_syscall(*kind, arg.as_ref(), prog, locs, out)?,
        Quad::Call { callee, arity } => {
            let name = &prog.symtab.get(*callee).name;
            writeln!(out, "callq fun_{name}")?;
            if *arity > 0 {
                writeln!(out, "addq ${},%rsp", 8 * arity)?;
            }
        }
        Quad::SetIn { arg, .. } => {
            load(arg, "%rax", prog, locs, out)?;
            out.push_str("subq $8,%rsp\n");
            out.push_str("movq %rax,(%rsp)\n");
        }
        Quad::GetIn { .. } => {
            let _ = proc;
        }
        Quad::SetOut { arg, .. } => {
            load(arg, "%rdi", prog, locs, out)?;
        }
        Quad::GetOut { dst, .. } => {
            store(dst, "%rdi", prog, locs, out)?;
        }
    }
    Ok(())
}

fn emit_binop(
    op: BinOp,
    dst: &Operand,
    src1: &Operand,
    src2: &Operand,
    prog: &IRProgram,
    locs: &Locations,
    out: &mut String,
) -> Result<(), CodeGenError> {
    match op {
        BinOp::Add | BinOp::Sub => {
            load(src1, "%rax", prog, locs, out)?;
            load(src2, "%rbx", prog, locs, out)?;
            let mnemonic = if op == BinOp::Add { "addq" } else { "subq" };
            writeln!(out, "{mnemonic} %rbx,%rax")?;
            store(dst, "%rax", prog, locs, out)?;
        }
        BinOp::Mult => {
            load(src1, "%rax", prog, locs, out)?;
            load(src2, "%rbx", prog, locs, out)?;
            out.push_str("imulq %rbx\n");
            store(dst, "%rax", prog, locs, out)?;
        }
        BinOp::Div => {
            out.push_str("xorq %rdx,%rdx\n");
            load(src1, "%rax", prog, locs, out)?;
            load(src2, "%rbx", prog, locs, out)?;
            out.push_str("idivq %rbx\n");
            store(dst, "%rax", prog, locs, out)?;
        }
        BinOp::Eq | BinOp::Neq | BinOp::Lt | BinOp::Gt | BinOp::Lte | BinOp::Gte => {
            load(src1, "%rax", prog, locs, out)?;
            load(src2, "%rbx", prog, locs, out)?;
            out.push_str("cmpq %rbx,%rax\n");
            let setcc = match op {
                BinOp::Eq => "sete",
                BinOp::Neq => "setne",
                BinOp::Lt => "setl",
                BinOp::Gt => "setg",
                BinOp::Lte => "setle",
                BinOp::Gte => "setge",
                _ => unreachable!(),
            };
            writeln!(out, "{setcc} %al")?;
            out.push_str("movzbq %al,%rax\n");
            store(dst, "%rax", prog, locs, out)?;
        }
        BinOp::And | BinOp::Or => {
            load(src1, "%rax", prog, locs, out)?;
            load(src2, "%rbx", prog, locs, out)?;
            let mnemonic = if op == BinOp::And { "andq" } else { "orq" };
            writeln!(out, "{mnemonic} %rbx,%rax")?;
            store(dst, "%rax", prog, locs, out)?;
        }
    }
    Ok(())
}

fn emit_syscall(
    kind: SyscallKind,
    arg: Option<&Operand>,
    prog: &IRProgram,
    locs: &Locations,
    out: &mut String,
) -> Result<(), CodeGenError> {
    match kind {
        SyscallKind::Write => {
            let arg = arg.ok_or_else(|| CodeGenError::Logic("write syscall missing its operand".to_string()))?;
            load(arg, "%rdi", prog, locs, out)?;
            let helper = match arg.operand_type(&prog.symtab) {
                OperandType::Str => "printString",
                OperandType::Numeric => "printInt",
            };
            writeln!(out, "callq {helper}")?;
        }
        SyscallKind::Read => {
            let arg = arg.ok_or_else(|| CodeGenError::Logic("read syscall missing its operand".to_string()))?;
            load(arg, "%rdi", prog, locs, out)?;
            out.push_str("callq getInt\n");
        }
        SyscallKind::Exit => {
            out.push_str("movq $60,%rax\n");
            out.push_str("syscall\n");
        }
    }
    Ok(())
}

fn load(
    opd: &Operand,
    reg: &str,
    prog: &IRProgram,
    locs: &Locations,
    out: &mut String,
) -> Result<(), CodeGenError> {
    match opd {
        Operand::Literal(v) => {
            writeln!(out, "movq ${v},{reg}")?;
        }
        Operand::Str(_) => {
            let loc = locs
                .of(opd)
                .ok_or_else(|| CodeGenError::Logic("string operand has no assigned location".to_string()))?;
            writeln!(out, "leaq {loc}(%rip),{reg}")?;
        }
        Operand::Symbol(_) | Operand::Temp(..) => {
            let loc = locs
                .of(opd)
                .ok_or_else(|| CodeGenError::Logic(format!("{} has no assigned location", opd.render(&prog.symtab))))?;
            writeln!(out, "movq {loc},{reg}")?;
        }
    }
    Ok(())
}

fn store(
    opd: &Operand,
    reg: &str,
    prog: &IRProgram,
    locs: &Locations,
    out: &mut String,
) -> Result<(), CodeGenError> {
    match opd {
        Operand::Literal(_) => Err(CodeGenError::Logic(
            "cannot store to a literal operand".to_string(),
        )),
        Operand::Str(_) => Err(CodeGenError::Logic(
            "cannot store to a string operand".to_string(),
        )),
        Operand::Symbol(_) | Operand::Temp(..) => {
            let loc = locs
                .of(opd)
                .ok_or_else(|| CodeGenError::Logic(format!("{} has no assigned location", opd.render(&prog.symtab))))?;
            writeln!(out, "movq {reg},{loc}")?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::lower::Lowering;
    use crate::parser::Parser;
    use crate::resolver::Resolver;

    fn compile(src: &str) -> String {
        let toks = tokenize(src).unwrap();
        let mut ast = Parser::new(toks).parse_program().unwrap();
        let table = Resolver::new().resolve(&mut ast).unwrap();
        let prog = Lowering::new(table).lower_program(&ast).unwrap();
        emit_x64(&prog).unwrap()
    }

    #[test]
    fn start_label_jumps_into_main() {
        let asm = compile("fn main() { }");
        assert!(asm.contains("_start:\njmp fun_main\n"));
    }

    #[test]
    fn main_leaves_via_exit_syscall() {
        let asm = compile("fn main() { }");
        assert!(asm.contains("movq $60,%rax"));
        assert!(asm.contains("syscall"));
        assert!(!asm.contains("\nret\n"));
    }

    #[test]
    fn addition_loads_both_operands_and_stores_the_result() {
        let asm = compile("int x; fn main() { x = 3 + 4; }");
        assert!(asm.contains("movq $3,%rax"));
        assert!(asm.contains("movq $4,%rbx"));
        assert!(asm.contains("addq %rbx,%rax"));
        assert!(asm.contains("movq %rax,gbl_x(%rip)"));
    }

    #[test]
    fn comparison_zero_extends_before_storing() {
        let asm = compile("fn main() { int x; x = 1 < 2; }");
        assert!(asm.contains("setl %al"));
        assert!(asm.contains("movzbq %al,%rax"));
    }

    #[test]
    fn string_write_loads_an_address_and_calls_print_string() {
        let asm = compile("fn main() { write \"hi\"; }");
        assert!(asm.contains("leaq str_0(%rip),%rdi"));
        assert!(asm.contains("callq printString"));
    }

    #[test]
    fn int_write_calls_print_int() {
        let asm = compile("fn main() { write 5; }");
        assert!(asm.contains("callq printInt"));
    }

    #[test]
    fn jmp_if_emits_an_explicit_comparison_and_je_when_not_inverted() {
        let asm = compile("fn main() { if (true) { write 1; } }");
        assert!(asm.contains("cmpq $0,%rax"));
        assert!(asm.contains("je lbl_"));
    }

    #[test]
    fn call_pops_the_arguments_it_pushed() {
        let asm = compile("fn f(int a, int b) -> int { return a + b; } fn main() { write f(2, 3); }");
        assert!(asm.contains("callq fun_f"));
        assert!(asm.contains("addq $16,%rsp"));
    }

    #[test]
    fn and_or_store_their_result() {
        let asm = compile("fn main() { bool x; x = true && false; }");
        assert!(asm.contains("andq %rbx,%rax"));
    }
}
