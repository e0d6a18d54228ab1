//! AST → three-address-code lowering.
//!
//! Expression lowering returns the `Operand` holding the expression's
//! value; statement lowering only appends quads. Evaluation order is
//! always left-to-right and never short-circuits, including for `&&`/`||`
//! (see [`crate::ir::quad::BinOp::And`]/[`crate::ir::quad::BinOp::Or`]).

use crate::ast::*;
use crate::error::CompileError;
use crate::ir::operand::{Operand, ProcId, SymbolKind, SymbolTable};
use crate::ir::program::IRProgram;
use crate::ir::quad::{Instr, Quad};
use crate::types::Type;

pub struct Lowering {
    prog: IRProgram,
}

impl Lowering {
    pub fn new(table: SymbolTable) -> Self {
        let mut prog = IRProgram::new();
        prog.symtab = table;
        Lowering { prog }
    }

    pub fn lower_program(mut self, ast: &Program) -> Result<IRProgram, CompileError> {
        for decl in &ast.decls {
            if let Decl::Var(v) = decl {
                let sym = self.require_symbol(&v.name)?;
                self.prog.declare_global(sym);
            }
        }
        for decl in &ast.decls {
            if let Decl::Fn(f) = decl {
                self.lower_fn(f)?;
            }
        }
        Ok(self.prog)
    }

    fn require_symbol(&self, id: &Ident) -> Result<crate::ir::operand::SymbolId, CompileError> {
        id.symbol()
            .ok_or_else(|| CompileError::Internal(format!("identifier '{}' was never resolved", id.name)))
    }

    fn lower_fn(&mut self, f: &FnDecl) -> Result<(), CompileError> {
        if f.nested {
            return Err(CompileError::Internal(format!(
                "nested function declaration '{}' is not allowed",
                f.name.name
            )));
        }
        let is_main = f.name.name == "main";
        let proc = self.prog.make_proc(f.name.name.clone(), is_main);
        for formal in &f.formals {
            let sym = self.require_symbol(&formal.name)?;
            let idx = self.prog.proc_mut(proc).declare_formal(sym);
            self.prog.proc_mut(proc).add_quad(Instr::new(Quad::GetIn {
                index: idx,
                formal: Operand::Symbol(sym),
            }));
        }
        self.lower_block(&f.body, proc)?;
        Ok(())
    }

    fn lower_block(&mut self, items: &[BlockItem], proc: ProcId) -> Result<(), CompileError> {
        for item in items {
            match item {
                BlockItem::VarDecl(v) => {
                    let sym = self.require_symbol(&v.name)?;
                    self.prog.proc_mut(proc).declare_local(sym);
                }
                BlockItem::Stmt(s) => self.lower_stmt(s, proc)?,
                BlockItem::FnDecl(_) => {
                    return Err(CompileError::Internal(
                        "nested function declaration is not allowed".to_string(),
                    ))
                }
            }
        }
        Ok(())
    }

    fn lower_stmt(&mut self, stmt: &Stmt, proc: ProcId) -> Result<(), CompileError> {
        match stmt {
            Stmt::Assign(a) => {
                self.lower_assign(a, proc)?;
            }
            Stmt::PostInc(id) => self.lower_post(id, crate::ir::quad::BinOp::Add, proc)?,
            Stmt::PostDec(id) => self.lower_post(id, crate::ir::quad::BinOp::Sub, proc)?,
            Stmt::Read(e) => {
                let opd = self.lower_expr(e, proc)?;
                self.prog.proc_mut(proc).add_quad(Instr::new(Quad::Syscall {
                    kind: crate::ir::quad::SyscallKind::Read,
                    arg: Some(opd),
                }));
            }
            Stmt::Write(e) => {
                let opd = self.lower_expr(e, proc)?;
                self.prog.proc_mut(proc).add_quad(Instr::new(Quad::Syscall {
                    kind: crate::ir::quad::SyscallKind::Write,
                    arg: Some(opd),
                }));
            }
            Stmt::If(cond, then_body, None) => {
                let cond_opd = self.lower_expr(cond, proc)?;
                let after = self.prog.make_label();
                self.prog.proc_mut(proc).add_quad(Instr::new(Quad::JmpIf {
                    cond: cond_opd,
                    invert: false,
                    target: after.clone(),
                }));
                self.lower_block(then_body, proc)?;
                self.prog
                    .proc_mut(proc)
                    .add_quad(Instr::new(Quad::Nop).with_label(after));
            }
            Stmt::If(cond, then_body, Some(else_body)) => {
                let cond_opd = self.lower_expr(cond, proc)?;
                let else_lbl = self.prog.make_label();
                let after = self.prog.make_label();
                self.prog.proc_mut(proc).add_quad(Instr::new(Quad::JmpIf {
                    cond: cond_opd,
                    invert: false,
                    target: else_lbl.clone(),
                }));
                self.lower_block(then_body, proc)?;
                self.prog.proc_mut(proc).add_quad(Instr::new(Quad::Jmp {
                    target: after.clone(),
                }));
                self.prog
                    .proc_mut(proc)
                    .add_quad(Instr::new(Quad::Nop).with_label(else_lbl));
                self.lower_block(else_body, proc)?;
                self.prog
                    .proc_mut(proc)
                    .add_quad(Instr::new(Quad::Nop).with_label(after));
            }
            Stmt::While(cond, body) => {
                let head = self.prog.make_label();
                let after = self.prog.make_label();
                self.prog
                    .proc_mut(proc)
                    .add_quad(Instr::new(Quad::Nop).with_label(head.clone()));
                let cond_opd = self.lower_expr(cond, proc)?;
                self.prog.proc_mut(proc).add_quad(Instr::new(Quad::JmpIf {
                    cond: cond_opd,
                    invert: false,
                    target: after.clone(),
                }));
                self.lower_block(body, proc)?;
                self.prog
                    .proc_mut(proc)
                    .add_quad(Instr::new(Quad::Jmp { target: head }));
                self.prog
                    .proc_mut(proc)
                    .add_quad(Instr::new(Quad::Nop).with_label(after));
            }
            Stmt::Call(c) => {
                let ret = self.lower_call(c, proc)?;
                if ret.is_some() {
                    self.prog.proc_mut(proc).pop_quad();
                }
            }
            Stmt::Return(Some(e)) => {
                let v = self.lower_expr(e, proc)?;
                self.prog
                    .proc_mut(proc)
                    .add_quad(Instr::new(Quad::SetOut { index: 1, arg: v }));
                let leave = self.prog.proc(proc).leave_label.clone();
                self.prog
                    .proc_mut(proc)
                    .add_quad(Instr::new(Quad::Jmp { target: leave }));
            }
            Stmt::Return(None) => {
                let leave = self.prog.proc(proc).leave_label.clone();
                self.prog
                    .proc_mut(proc)
                    .add_quad(Instr::new(Quad::Jmp { target: leave }));
            }
        }
        Ok(())
    }

    fn lower_post(&mut self, id: &Ident, op: crate::ir::quad::BinOp, proc: ProcId) -> Result<(), CompileError> {
        let opd = self.lower_ident(id, proc)?;
        self.prog.proc_mut(proc).add_quad(Instr::new(Quad::BinOp {
            dst: opd.clone(),
            op,
            src1: opd,
            src2: Operand::Literal("1".to_string()),
        }));
        Ok(())
    }

    fn lower_ident(&mut self, id: &Ident, proc: ProcId) -> Result<Operand, CompileError> {
        let sym = self.require_symbol(id)?;
        self.prog.resolve_operand(proc, sym)
    }

    fn lower_assign(&mut self, a: &AssignExpr, proc: ProcId) -> Result<Operand, CompileError> {
        let rhs = self.lower_expr(&a.rhs, proc)?;
        let lhs = self.lower_ident(&a.lhs, proc)?;
        self.prog.proc_mut(proc).add_quad(Instr::new(Quad::Assign {
            dst: lhs.clone(),
            src: rhs,
        }));
        Ok(lhs)
    }

    fn lower_expr(&mut self, expr: &Expr, proc: ProcId) -> Result<Operand, CompileError> {
        match expr {
            Expr::IntLit(v) => Ok(Operand::Literal(v.to_string())),
            Expr::BoolLit(b) => Ok(Operand::Literal(if *b { "1" } else { "0" }.to_string())),
            Expr::StrLit(s) => Ok(self.prog.make_string(s.clone())),
            Expr::Ident(id) => self.lower_ident(id, proc),
            Expr::Unary(op, inner) => {
                let src = self.lower_expr(inner, proc)?;
                let dst = self.prog.proc_mut(proc).make_temp();
                self.prog.proc_mut(proc).add_quad(Instr::new(Quad::UnaryOp {
                    dst: dst.clone(),
                    op: *op,
                    src,
                }));
                Ok(dst)
            }
            Expr::Binary(op, l, r) => {
                let src1 = self.lower_expr(l, proc)?;
                let src2 = self.lower_expr(r, proc)?;
                let dst = self.prog.proc_mut(proc).make_temp();
                self.prog.proc_mut(proc).add_quad(Instr::new(Quad::BinOp {
                    dst: dst.clone(),
                    op: *op,
                    src1,
                    src2,
                }));
                Ok(dst)
            }
            Expr::Assign(a) => self.lower_assign(a, proc),
            Expr::Call(c) => {
                let ret = self.lower_call(c, proc)?;
                ret.ok_or_else(|| {
                    CompileError::Internal(format!(
                        "call to void function '{}' used in value position",
                        c.callee.name
                    ))
                })
            }
        }
    }

    fn lower_call(&mut self, call: &CallExpr, proc: ProcId) -> Result<Option<Operand>, CompileError> {
        let callee = self.require_symbol(&call.callee)?;
        for (i, arg) in call.args.iter().enumerate() {
            let opd = self.lower_expr(arg, proc)?;
            self.prog.proc_mut(proc).add_quad(Instr::new(Quad::SetIn {
                index: (i + 1) as u32,
                arg: opd,
            }));
        }
        let arity = call.args.len();
        self.prog
            .proc_mut(proc)
            .add_quad(Instr::new(Quad::Call { callee, arity }));

        let is_void = matches!(
            &self.prog.symtab.get(callee).kind,
            SymbolKind::Function { return_type, .. } if *return_type == Type::Void
        );
        if is_void {
            Ok(None)
        } else {
            let dst = self.prog.proc_mut(proc).make_temp();
            self.prog.proc_mut(proc).add_quad(Instr::new(Quad::GetOut {
                index: 1,
                dst: dst.clone(),
            }));
            Ok(Some(dst))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::quad::{BinOp, SyscallKind};
    use crate::lexer::tokenize;
    use crate::parser::Parser;
    use crate::resolver::Resolver;

    fn lower(src: &str) -> IRProgram {
        let toks = tokenize(src).unwrap();
        let mut ast = Parser::new(toks).parse_program().unwrap();
        let table = Resolver::new().resolve(&mut ast).unwrap();
        Lowering::new(table).lower_program(&ast).unwrap()
    }

    #[test]
    fn main_terminates_with_exit_not_leave() {
        let prog = lower("fn main() { }");
        assert!(matches!(
            prog.procedures[0].leave.quad,
            Quad::Syscall {
                kind: SyscallKind::Exit,
                ..
            }
        ));
    }

    #[test]
    fn binary_expression_lowers_operands_left_to_right() {
        let prog = lower("int x; fn main() { x = 3 + 4; }");
        let body = &prog.procedures[0].body;
        assert!(matches!(
            body[0].quad,
            Quad::BinOp {
                op: BinOp::Add,
                ..
            }
        ));
        assert!(matches!(body[1].quad, Quad::Assign { .. }));
    }

    #[test]
    fn call_statement_discards_its_return_value() {
        let prog = lower("fn f() -> int { return 1; } fn main() { f(); }");
        let main_body = &prog.procedures[1].body;
        assert!(!main_body
            .iter()
            .any(|i| matches!(i.quad, Quad::GetOut { .. })));
        assert!(main_body.iter().any(|i| matches!(i.quad, Quad::Call { .. })));
    }

    #[test]
    fn call_expression_keeps_its_return_value() {
        let prog = lower("fn f() -> int { return 1; } fn main() { write f(); }");
        let main_body = &prog.procedures[1].body;
        assert!(main_body
            .iter()
            .any(|i| matches!(i.quad, Quad::GetOut { .. })));
    }

    #[test]
    fn while_loop_emits_head_and_after_labels_in_order() {
        let prog = lower("fn main() { int i; i = 0; while (i < 10) { i++; } }");
        let body = &prog.procedures[0].body;
        let head_pos = body.iter().position(|i| !i.labels.is_empty()).unwrap();
        assert!(matches!(body[head_pos].quad, Quad::Nop));
        let jmp_if_pos = body
            .iter()
            .position(|i| matches!(i.quad, Quad::JmpIf { .. }))
            .unwrap();
        assert!(jmp_if_pos > head_pos);
    }

    #[test]
    fn nested_function_declaration_is_fatal() {
        let mut ast = crate::ast::Program {
            decls: vec![Decl::Fn(FnDecl {
                name: Ident::new("main", 1, 1),
                formals: vec![],
                ret_ty: Type::Void,
                body: vec![BlockItem::FnDecl(FnDecl {
                    name: Ident::new("inner", 1, 1),
                    formals: vec![],
                    ret_ty: Type::Void,
                    body: vec![],
                    nested: false,
                })],
                nested: false,
            })],
        };
        let table = Resolver::new().resolve(&mut ast).unwrap();
        assert!(Lowering::new(table).lower_program(&ast).is_err());
    }

    #[test]
    fn if_without_else_anchors_a_single_after_label() {
        let prog = lower("fn main() { if (true) { } }");
        let body = &prog.procedures[0].body;
        assert_eq!(body.len(), 2);
        assert!(matches!(body[0].quad, Quad::JmpIf { .. }));
        assert!(matches!(body[1].quad, Quad::Nop));
    }
}
