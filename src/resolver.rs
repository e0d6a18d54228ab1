//! Name analysis: binds every identifier to a `SymbolId` and classifies it
//! as global, local, formal, or function.

use crate::ast::*;
use crate::error::CompileError;
use crate::ir::operand::{SymbolId, SymbolKind, SymbolTable};
use crate::types::Type;
use std::collections::HashMap;

pub struct Resolver {
    table: SymbolTable,
    scopes: Vec<HashMap<String, SymbolId>>,
}

impl Resolver {
    pub fn new() -> Self {
        Resolver {
            table: SymbolTable::new(),
            scopes: vec![HashMap::new()],
        }
    }

    fn global_scope(&mut self) -> &mut HashMap<String, SymbolId> {
        &mut self.scopes[0]
    }

    fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.scopes.iter().rev().find_map(|s| s.get(name).copied())
    }

    pub fn resolve(mut self, prog: &mut Program) -> Result<SymbolTable, CompileError> {
        for decl in prog.decls.iter() {
            if let Decl::Fn(f) = decl {
                if self.global_scope().contains_key(&f.name.name) {
                    return Err(CompileError::Name(format!(
                        "duplicate top-level declaration '{}'",
                        f.name.name
                    )));
                }
                let param_tys = f.formals.iter().map(|v| v.ty.clone()).collect();
                let sym = self.table.declare(
                    f.name.name.clone(),
                    Type::Fn(param_tys, Box::new(f.ret_ty.clone())),
                    SymbolKind::Function {
                        arity: f.formals.len(),
                        return_type: f.ret_ty.clone(),
                    },
                );
                self.global_scope().insert(f.name.name.clone(), sym);
            }
        }

        for decl in prog.decls.iter_mut() {
            match decl {
                Decl::Var(v) => {
                    if self.global_scope().contains_key(&v.name.name) {
                        return Err(CompileError::Name(format!(
                            "duplicate top-level declaration '{}'",
                            v.name.name
                        )));
                    }
                    let sym = self
                        .table
                        .declare(v.name.name.clone(), v.ty.clone(), SymbolKind::Global);
                    self.global_scope().insert(v.name.name.clone(), sym);
                    v.name.sym = Some(sym);
                }
                Decl::Fn(f) => {
                    let fn_sym = *self.scopes[0].get(&f.name.name).unwrap();
                    f.name.sym = Some(fn_sym);
                    self.resolve_fn(f, fn_sym)?;
                }
            }
        }

        Ok(self.table)
    }

    fn resolve_fn(&mut self, f: &mut FnDecl, fn_sym: SymbolId) -> Result<(), CompileError> {
        self.scopes.push(HashMap::new());
        for (i, formal) in f.formals.iter_mut().enumerate() {
            if self.scopes.last().unwrap().contains_key(&formal.name.name) {
                return Err(CompileError::Name(format!(
                    "duplicate formal '{}' in '{}'",
                    formal.name.name, f.name.name
                )));
            }
            let sym = self.table.declare(
                formal.name.name.clone(),
                formal.ty.clone(),
                SymbolKind::Formal {
                    owner: fn_sym,
                    index: (i + 1) as u32,
                },
            );
            formal.name.sym = Some(sym);
            self.scopes
                .last_mut()
                .unwrap()
                .insert(formal.name.name.clone(), sym);
        }
        self.resolve_block(&mut f.body, fn_sym)?;
        self.scopes.pop();
        Ok(())
    }

    fn resolve_block(&mut self, items: &mut [BlockItem], fn_sym: SymbolId) -> Result<(), CompileError> {
        for item in items {
            match item {
                BlockItem::VarDecl(v) => {
                    if self.scopes.last().unwrap().contains_key(&v.name.name) {
                        return Err(CompileError::Name(format!(
                            "duplicate local declaration '{}'",
                            v.name.name
                        )));
                    }
                    let sym = self
                        .table
                        .declare(v.name.name.clone(), v.ty.clone(), SymbolKind::Local { owner: fn_sym });
                    v.name.sym = Some(sym);
                    self.scopes
                        .last_mut()
                        .unwrap()
                        .insert(v.name.name.clone(), sym);
                }
                BlockItem::Stmt(s) => self.resolve_stmt(s, fn_sym)?,
                BlockItem::FnDecl(nested) => {
                    // Recorded but left unresolved — lowering rejects it.
                    nested.nested = true;
                }
            }
        }
        Ok(())
    }

    fn resolve_stmt(&mut self, stmt: &mut Stmt, fn_sym: SymbolId) -> Result<(), CompileError> {
        match stmt {
            Stmt::Assign(a) => {
                self.bind_ident(&mut a.lhs)?;
                self.resolve_expr(&mut a.rhs)?;
            }
            Stmt::PostInc(id) | Stmt::PostDec(id) => self.bind_ident(id)?,
            Stmt::Read(e) | Stmt::Write(e) => self.resolve_expr(e)?,
            Stmt::If(cond, then_body, else_body) => {
                self.resolve_expr(cond)?;
                self.resolve_block(then_body, fn_sym)?;
                if let Some(eb) = else_body {
                    self.resolve_block(eb, fn_sym)?;
                }
            }
            Stmt::While(cond, body) => {
                self.resolve_expr(cond)?;
                self.resolve_block(body, fn_sym)?;
            }
            Stmt::Call(c) => self.resolve_call(c)?,
            Stmt::Return(Some(e)) => self.resolve_expr(e)?,
            Stmt::Return(None) => {}
        }
        Ok(())
    }

    fn resolve_expr(&mut self, expr: &mut Expr) -> Result<(), CompileError> {
        match expr {
            Expr::IntLit(_) | Expr::StrLit(_) | Expr::BoolLit(_) => {}
            Expr::Ident(id) => self.bind_ident(id)?,
            Expr::Unary(_, e) => self.resolve_expr(e)?,
            Expr::Binary(_, l, r) => {
                self.resolve_expr(l)?;
                self.resolve_expr(r)?;
            }
            Expr::Assign(a) => {
                self.bind_ident(&mut a.lhs)?;
                self.resolve_expr(&mut a.rhs)?;
            }
            Expr::Call(c) => self.resolve_call(c)?,
        }
        Ok(())
    }

    fn resolve_call(&mut self, call: &mut CallExpr) -> Result<(), CompileError> {
        let sym = self
            .lookup(&call.callee.name)
            .ok_or_else(|| CompileError::Name(format!("call to undeclared function '{}'", call.callee.name)))?;
        call.callee.sym = Some(sym);
        for arg in &mut call.args {
            self.resolve_expr(arg)?;
        }
        Ok(())
    }

    fn bind_ident(&mut self, id: &mut Ident) -> Result<(), CompileError> {
        let sym = self
            .lookup(&id.name)
            .ok_or_else(|| CompileError::Name(format!("reference to undeclared name '{}'", id.name)))?;
        id.sym = Some(sym);
        Ok(())
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::Parser;

    fn resolve(src: &str) -> (Program, SymbolTable) {
        let toks = tokenize(src).unwrap();
        let mut prog = Parser::new(toks).parse_program().unwrap();
        let table = Resolver::new().resolve(&mut prog).unwrap();
        (prog, table)
    }

    #[test]
    fn binds_a_global_reference() {
        let (prog, _table) = resolve("int x; fn main() { x = 1; }");
        let Decl::Fn(f) = &prog.decls[1] else { panic!() };
        let BlockItem::Stmt(Stmt::Assign(a)) = &f.body[0] else {
            panic!()
        };
        assert!(a.lhs.symbol().is_some());
    }

    #[test]
    fn forward_reference_between_top_level_functions_resolves() {
        let (_prog, _table) =
            resolve("fn main() { write callee(); } fn callee() -> int { return 1; }");
    }

    #[test]
    fn undeclared_reference_is_a_name_error() {
        let toks = tokenize("fn main() { write y; }").unwrap();
        let mut prog = Parser::new(toks).parse_program().unwrap();
        assert!(Resolver::new().resolve(&mut prog).is_err());
    }

    #[test]
    fn if_body_locals_are_function_scoped() {
        let (prog, table) = resolve("fn main() { if (true) { int y; y = 1; } }");
        let Decl::Fn(f) = &prog.decls[0] else { panic!() };
        let BlockItem::Stmt(Stmt::If(_, then_body, _)) = &f.body[0] else {
            panic!()
        };
        let BlockItem::VarDecl(v) = &then_body[0] else {
            panic!()
        };
        let sym = v.name.symbol().unwrap();
        assert!(matches!(table.get(sym).kind, SymbolKind::Local { .. }));
    }
}
