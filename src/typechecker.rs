//! Minimal nominal type checker. Runs after resolution; every `Ident` is
//! expected to already carry a resolved `SymbolId`.

use crate::ast::*;
use crate::error::CompileError;
use crate::ir::operand::{SymbolKind, SymbolTable};
use crate::ir::quad::{BinOp, UnaryOp};
use crate::types::Type;

pub struct TypeChecker<'a> {
    table: &'a SymbolTable,
}

impl<'a> TypeChecker<'a> {
    pub fn new(table: &'a SymbolTable) -> Self {
        TypeChecker { table }
    }

    pub fn check_program(&self, prog: &Program) -> Result<(), CompileError> {
        for decl in &prog.decls {
            if let Decl::Fn(f) = decl {
                self.check_block(&f.body, &f.ret_ty)?;
            }
        }
        Ok(())
    }

    fn check_block(&self, items: &[BlockItem], ret_ty: &Type) -> Result<(), CompileError> {
        for item in items {
            match item {
                BlockItem::VarDecl(_) => {}
                BlockItem::Stmt(s) => self.check_stmt(s, ret_ty)?,
                BlockItem::FnDecl(_) => {}
            }
        }
        Ok(())
    }

    fn check_stmt(&self, stmt: &Stmt, ret_ty: &Type) -> Result<(), CompileError> {
        match stmt {
            Stmt::Assign(a) => {
                let lt = self.ident_type(&a.lhs)?;
                let rt = self.expr_type(&a.rhs)?;
                if lt != rt {
                    return Err(CompileError::Type(format!(
                        "cannot assign {rt} to '{}' of type {lt}",
                        a.lhs.name
                    )));
                }
            }
            Stmt::PostInc(id) | Stmt::PostDec(id) => {
                let t = self.ident_type(id)?;
                if t != Type::Int {
                    return Err(CompileError::Type(format!(
                        "'++'/'--' require int, found {t}"
                    )));
                }
            }
            Stmt::Read(e) => {
                let t = self.expr_type(e)?;
                if t != Type::Int {
                    return Err(CompileError::Type(format!("read requires int, found {t}")));
                }
            }
            Stmt::Write(e) => {
                let t = self.expr_type(e)?;
                if t != Type::Int && t != Type::String {
                    return Err(CompileError::Type(format!(
                        "write requires int or string, found {t}"
                    )));
                }
            }
            Stmt::If(cond, then_body, else_body) => {
                self.expect(cond, &Type::Bool)?;
                self.check_block(then_body, ret_ty)?;
                if let Some(eb) = else_body {
                    self.check_block(eb, ret_ty)?;
                }
            }
            Stmt::While(cond, body) => {
                self.expect(cond, &Type::Bool)?;
                self.check_block(body, ret_ty)?;
            }
            Stmt::Call(c) => {
                self.check_call(c)?;
            }
            Stmt::Return(Some(e)) => {
                let t = self.expr_type(e)?;
                if &t != ret_ty {
                    return Err(CompileError::Type(format!(
                        "return type mismatch: expected {ret_ty}, found {t}"
                    )));
                }
            }
            Stmt::Return(None) => {
                if *ret_ty != Type::Void {
                    return Err(CompileError::Type(format!(
                        "missing return value, expected {ret_ty}"
                    )));
                }
            }
        }
        Ok(())
    }

    fn expect(&self, e: &Expr, want: &Type) -> Result<(), CompileError> {
        let t = self.expr_type(e)?;
        if &t != want {
            return Err(CompileError::Type(format!("expected {want}, found {t}")));
        }
        Ok(())
    }

    fn expr_type(&self, e: &Expr) -> Result<Type, CompileError> {
        match e {
            Expr::IntLit(_) => Ok(Type::Int),
            Expr::StrLit(_) => Ok(Type::String),
            Expr::BoolLit(_) => Ok(Type::Bool),
            Expr::Ident(id) => self.ident_type(id),
            Expr::Unary(op, inner) => {
                let t = self.expr_type(inner)?;
                match op {
                    UnaryOp::Neg if t == Type::Int => Ok(Type::Int),
                    UnaryOp::Not if t == Type::Bool => Ok(Type::Bool),
                    _ => Err(CompileError::Type(format!(
                        "unary {op} does not apply to {t}"
                    ))),
                }
            }
            Expr::Binary(op, l, r) => {
                let lt = self.expr_type(l)?;
                let rt = self.expr_type(r)?;
                match op {
                    BinOp::Add | BinOp::Sub | BinOp::Mult | BinOp::Div => {
                        if lt == Type::Int && rt == Type::Int {
                            Ok(Type::Int)
                        } else {
                            Err(CompileError::Type(format!(
                                "arithmetic {op} requires int, int; found {lt}, {rt}"
                            )))
                        }
                    }
                    BinOp::Eq | BinOp::Neq | BinOp::Lt | BinOp::Gt | BinOp::Lte | BinOp::Gte => {
                        if lt == Type::Int && rt == Type::Int {
                            Ok(Type::Bool)
                        } else {
                            Err(CompileError::Type(format!(
                                "comparison {op} requires int, int; found {lt}, {rt}"
                            )))
                        }
                    }
                    BinOp::And | BinOp::Or => {
                        if lt == Type::Bool && rt == Type::Bool {
                            Ok(Type::Bool)
                        } else {
                            Err(CompileError::Type(format!(
                                "logical {op} requires bool, bool; found {lt}, {rt}"
                            )))
                        }
                    }
                }
            }
            Expr::Assign(a) => {
                let lt = self.ident_type(&a.lhs)?;
                let rt = self.expr_type(&a.rhs)?;
                if lt != rt {
                    return Err(CompileError::Type(format!(
                        "cannot assign {rt} to '{}' of type {lt}",
                        a.lhs.name
                    )));
                }
                Ok(lt)
            }
            Expr::Call(c) => self.check_call(c),
        }
    }

    fn ident_type(&self, id: &Ident) -> Result<Type, CompileError> {
        let sym = id
            .symbol()
            .ok_or_else(|| CompileError::Internal(format!("unresolved identifier '{}'", id.name)))?;
        Ok(self.table.get(sym).ty.clone())
    }

    fn check_call(&self, call: &CallExpr) -> Result<Type, CompileError> {
        let sym = call.callee.symbol().ok_or_else(|| {
            CompileError::Internal(format!("unresolved call target '{}'", call.callee.name))
        })?;
        let info = self.table.get(sym);
        let (arity, return_type) = match &info.kind {
            SymbolKind::Function { arity, return_type } => (*arity, return_type.clone()),
            _ => {
                return Err(CompileError::Internal(format!(
                    "'{}' resolved to a non-function symbol",
                    call.callee.name
                )))
            }
        };
        if call.args.len() != arity {
            return Err(CompileError::Type(format!(
                "'{}' expects {arity} argument(s), found {}",
                call.callee.name,
                call.args.len()
            )));
        }
        if let Type::Fn(params, _) = &info.ty {
            for (arg, expected) in call.args.iter().zip(params) {
                let at = self.expr_type(arg)?;
                if &at != expected {
                    return Err(CompileError::Type(format!(
                        "argument to '{}' expected {expected}, found {at}",
                        call.callee.name
                    )));
                }
            }
        }
        Ok(return_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::Parser;
    use crate::resolver::Resolver;

    fn check(src: &str) -> Result<(), CompileError> {
        let toks = tokenize(src).unwrap();
        let mut prog = Parser::new(toks).parse_program().unwrap();
        let table = Resolver::new().resolve(&mut prog).unwrap();
        TypeChecker::new(&table).check_program(&prog)
    }

    #[test]
    fn accepts_well_typed_program() {
        assert!(check("fn add(int a, int b) -> int { return a + b; } fn main() { write add(1, 2); }").is_ok());
    }

    #[test]
    fn rejects_mismatched_call_argument_type() {
        let toks = tokenize("fn f(int a) { } fn main() { f(true); }").unwrap();
        let mut prog = Parser::new(toks).parse_program().unwrap();
        let table = Resolver::new().resolve(&mut prog).unwrap();
        assert!(TypeChecker::new(&table).check_program(&prog).is_err());
    }

    #[test]
    fn rejects_adding_bool_to_int() {
        assert!(check("fn main() { int x; x = 1 + true; }").is_err());
    }

    #[test]
    fn write_accepts_string_or_int() {
        assert!(check("fn main() { write \"hi\"; write 1; }").is_ok());
    }
}
