//! The parsed/resolved representation of a Lake program.
//!
//! Binary and unary operator tags are shared with the IR (see
//! [`crate::ir::quad`]) rather than duplicated — lowering copies them
//! straight across an expression node into the quad it emits.

use crate::ir::operand::SymbolId;
use crate::ir::quad::{BinOp, UnaryOp};
use crate::types::Type;

#[derive(Debug, Clone)]
pub struct Ident {
    pub name: String,
    pub line: u32,
    pub col: u32,
    pub sym: Option<SymbolId>,
}

impl Ident {
    pub fn new(name: impl Into<String>, line: u32, col: u32) -> Self {
        Ident {
            name: name.into(),
            line,
            col,
            sym: None,
        }
    }

    pub fn symbol(&self) -> Option<SymbolId> {
        self.sym
    }
}

#[derive(Debug, Clone)]
pub struct Program {
    pub decls: Vec<Decl>,
}

#[derive(Debug, Clone)]
pub enum Decl {
    Var(VarDecl),
    Fn(FnDecl),
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub ty: Type,
    pub name: Ident,
}

#[derive(Debug, Clone)]
pub enum BlockItem {
    VarDecl(VarDecl),
    Stmt(Stmt),
    /// The grammar never produces this — a `block` only admits `varDecl`
    /// and `stmt`. It exists so a nested function declaration can be
    /// constructed directly for exercising the lowering-time rejection of
    /// nested functions.
    FnDecl(FnDecl),
}

#[derive(Debug, Clone)]
pub struct FnDecl {
    pub name: Ident,
    pub formals: Vec<VarDecl>,
    pub ret_ty: Type,
    pub body: Vec<BlockItem>,
    /// Set by the resolver when this declaration is found nested inside
    /// another function's body. Lowering, not resolution, rejects it.
    pub nested: bool,
}

#[derive(Debug, Clone)]
pub struct AssignExpr {
    pub lhs: Ident,
    pub rhs: Expr,
}

#[derive(Debug, Clone)]
pub struct CallExpr {
    pub callee: Ident,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub enum Expr {
    IntLit(i64),
    StrLit(String),
    BoolLit(bool),
    Ident(Ident),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Assign(Box<AssignExpr>),
    Call(CallExpr),
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Assign(AssignExpr),
    PostInc(Ident),
    PostDec(Ident),
    Read(Expr),
    Write(Expr),
    If(Expr, Vec<BlockItem>, Option<Vec<BlockItem>>),
    While(Expr, Vec<BlockItem>),
    Call(CallExpr),
    Return(Option<Expr>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ident_has_no_resolved_symbol() {
        let id = Ident::new("x", 1, 1);
        assert_eq!(id.symbol(), None);
    }
}
