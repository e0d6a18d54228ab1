//! Recursive-descent parser: token stream to an unresolved AST.

use crate::ast::*;
use crate::error::CompileError;
use crate::ir::quad::{BinOp, UnaryOp};
use crate::lexer::{Token, TokenKind};
use crate::types::Type;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if !self.is_at_end() {
            self.pos += 1;
        }
        t
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: &TokenKind, what: &str) -> Result<Token, CompileError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(CompileError::Parse(format!(
                "expected {what} at {}:{}, found {:?}",
                self.peek().line,
                self.peek().col,
                self.peek().kind
            )))
        }
    }

    fn consume_ident(&mut self) -> Result<Ident, CompileError> {
        let t = self.peek().clone();
        if let TokenKind::Ident(name) = t.kind {
            self.advance();
            Ok(Ident::new(name, t.line, t.col))
        } else {
            Err(CompileError::Parse(format!(
                "expected identifier at {}:{}, found {:?}",
                t.line, t.col, t.kind
            )))
        }
    }

    fn parse_type(&mut self) -> Result<Type, CompileError> {
        let t = self.advance();
        match t.kind {
            TokenKind::IntType => Ok(Type::Int),
            TokenKind::BoolType => Ok(Type::Bool),
            TokenKind::StringType => Ok(Type::String),
            TokenKind::VoidType => Ok(Type::Void),
            other => Err(CompileError::Parse(format!(
                "expected a type at {}:{}, found {other:?}",
                t.line, t.col
            ))),
        }
    }

    pub fn parse_program(&mut self) -> Result<Program, CompileError> {
        let mut decls = Vec::new();
        while !self.is_at_end() {
            decls.push(self.parse_decl()?);
        }
        Ok(Program { decls })
    }

    fn parse_decl(&mut self) -> Result<Decl, CompileError> {
        if self.check(&TokenKind::Fn) {
            Ok(Decl::Fn(self.parse_fn_decl()?))
        } else {
            let v = self.parse_var_decl()?;
            self.consume(&TokenKind::Semi, "';' after variable declaration")?;
            Ok(Decl::Var(v))
        }
    }

    fn parse_var_decl(&mut self) -> Result<VarDecl, CompileError> {
        let ty = self.parse_type()?;
        let name = self.consume_ident()?;
        Ok(VarDecl { ty, name })
    }

    fn parse_fn_decl(&mut self) -> Result<FnDecl, CompileError> {
        self.consume(&TokenKind::Fn, "'fn'")?;
        let name = self.consume_ident()?;
        self.consume(&TokenKind::LParen, "'(' after function name")?;
        let mut formals = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                formals.push(self.parse_var_decl()?);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(&TokenKind::RParen, "')' after formals")?;
        let ret_ty = if self.matches(&TokenKind::Arrow) {
            self.parse_type()?
        } else {
            Type::Void
        };
        let body = self.parse_block()?;
        Ok(FnDecl {
            name,
            formals,
            ret_ty,
            body,
            nested: false,
        })
    }

    fn parse_block(&mut self) -> Result<Vec<BlockItem>, CompileError> {
        self.consume(&TokenKind::LBrace, "'{' to start a block")?;
        let mut items = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            items.push(self.parse_block_item()?);
        }
        self.consume(&TokenKind::RBrace, "'}' to end a block")?;
        Ok(items)
    }

    fn starts_type(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::IntType | TokenKind::BoolType | TokenKind::StringType | TokenKind::VoidType
        )
    }

    fn parse_block_item(&mut self) -> Result<BlockItem, CompileError> {
        if self.starts_type() {
            let v = self.parse_var_decl()?;
            self.consume(&TokenKind::Semi, "';' after variable declaration")?;
            Ok(BlockItem::VarDecl(v))
        } else {
            Ok(BlockItem::Stmt(self.parse_stmt()?))
        }
    }

    fn parse_stmt(&mut self) -> Result<Stmt, CompileError> {
        match &self.peek().kind {
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Read => {
                self.advance();
                let e = self.parse_expr()?;
                self.consume(&TokenKind::Semi, "';' after read")?;
                Ok(Stmt::Read(e))
            }
            TokenKind::Write => {
                self.advance();
                let e = self.parse_expr()?;
                self.consume(&TokenKind::Semi, "';' after write")?;
                Ok(Stmt::Write(e))
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.check(&TokenKind::Semi) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.consume(&TokenKind::Semi, "';' after return")?;
                Ok(Stmt::Return(value))
            }
            TokenKind::Ident(_) => self.parse_ident_led_stmt(),
            other => Err(CompileError::Parse(format!(
                "unexpected token {other:?} at {}:{}",
                self.peek().line,
                self.peek().col
            ))),
        }
    }

    fn parse_ident_led_stmt(&mut self) -> Result<Stmt, CompileError> {
        let id = self.consume_ident()?;
        match &self.peek().kind {
            TokenKind::PlusPlus => {
                self.advance();
                self.consume(&TokenKind::Semi, "';' after '++'")?;
                Ok(Stmt::PostInc(id))
            }
            TokenKind::MinusMinus => {
                self.advance();
                self.consume(&TokenKind::Semi, "';' after '--'")?;
                Ok(Stmt::PostDec(id))
            }
            TokenKind::Assign => {
                self.advance();
                let rhs = self.parse_expr()?;
                self.consume(&TokenKind::Semi, "';' after assignment")?;
                Ok(Stmt::Assign(AssignExpr { lhs: id, rhs }))
            }
            TokenKind::LParen => {
                let call = self.parse_call_tail(id)?;
                self.consume(&TokenKind::Semi, "';' after call")?;
                Ok(Stmt::Call(call))
            }
            other => Err(CompileError::Parse(format!(
                "unexpected token {other:?} after identifier at {}:{}",
                self.peek().line,
                self.peek().col
            ))),
        }
    }

    fn parse_if(&mut self) -> Result<Stmt, CompileError> {
        self.consume(&TokenKind::If, "'if'")?;
        self.consume(&TokenKind::LParen, "'(' after if")?;
        let cond = self.parse_expr()?;
        self.consume(&TokenKind::RParen, "')' after if condition")?;
        let then_body = self.parse_block()?;
        let else_body = if self.matches(&TokenKind::Else) {
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Stmt::If(cond, then_body, else_body))
    }

    fn parse_while(&mut self) -> Result<Stmt, CompileError> {
        self.consume(&TokenKind::While, "'while'")?;
        self.consume(&TokenKind::LParen, "'(' after while")?;
        let cond = self.parse_expr()?;
        self.consume(&TokenKind::RParen, "')' after while condition")?;
        let body = self.parse_block()?;
        Ok(Stmt::While(cond, body))
    }

    fn parse_call_tail(&mut self, callee: Ident) -> Result<CallExpr, CompileError> {
        self.consume(&TokenKind::LParen, "'(' to start a call")?;
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(&TokenKind::RParen, "')' to end a call")?;
        Ok(CallExpr { callee, args })
    }

    // Expression precedence, lowest to highest:
    // assignment > logical-or > logical-and > equality > relational
    // > additive > multiplicative > unary > primary

    pub fn parse_expr(&mut self) -> Result<Expr, CompileError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr, CompileError> {
        let lhs = self.parse_or()?;
        if self.matches(&TokenKind::Assign) {
            let id = match lhs {
                Expr::Ident(id) => id,
                _ => {
                    return Err(CompileError::Parse(
                        "left-hand side of assignment must be an identifier".to_string(),
                    ))
                }
            };
            let rhs = self.parse_assignment()?;
            return Ok(Expr::Assign(Box::new(AssignExpr { lhs: id, rhs })));
        }
        Ok(lhs)
    }

    fn parse_or(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_and()?;
        while self.matches(&TokenKind::OrOr) {
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_equality()?;
        while self.matches(&TokenKind::AndAnd) {
            let rhs = self.parse_equality()?;
            lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::BangEq => BinOp::Neq,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_relational()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Lte => BinOp::Lte,
                TokenKind::Gte => BinOp::Gte,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mult,
                TokenKind::Slash => BinOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        match self.peek().kind {
            TokenKind::Minus => {
                self.advance();
                Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.parse_unary()?)))
            }
            TokenKind::Bang => {
                self.advance();
                Ok(Expr::Unary(UnaryOp::Not, Box::new(self.parse_unary()?)))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        let t = self.peek().clone();
        match t.kind {
            TokenKind::IntLit(v) => {
                self.advance();
                Ok(Expr::IntLit(v))
            }
            TokenKind::StrLit(s) => {
                self.advance();
                Ok(Expr::StrLit(s))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::BoolLit(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::BoolLit(false))
            }
            TokenKind::LParen => {
                self.advance();
                let e = self.parse_expr()?;
                self.consume(&TokenKind::RParen, "')' to close a parenthesized expression")?;
                Ok(e)
            }
            TokenKind::Ident(_) => {
                let id = self.consume_ident()?;
                if self.check(&TokenKind::LParen) {
                    Ok(Expr::Call(self.parse_call_tail(id)?))
                } else {
                    Ok(Expr::Ident(id))
                }
            }
            other => Err(CompileError::Parse(format!(
                "unexpected token {other:?} at {}:{}",
                t.line, t.col
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse(src: &str) -> Program {
        let toks = tokenize(src).unwrap();
        Parser::new(toks).parse_program().unwrap()
    }

    #[test]
    fn parses_a_global_declaration() {
        let prog = parse("int x;");
        assert_eq!(prog.decls.len(), 1);
        assert!(matches!(&prog.decls[0], Decl::Var(v) if v.name.name == "x"));
    }

    #[test]
    fn parses_a_function_with_formals_and_return_type() {
        let prog = parse("fn add(int a, int b) -> int { return a + b; }");
        match &prog.decls[0] {
            Decl::Fn(f) => {
                assert_eq!(f.name.name, "add");
                assert_eq!(f.formals.len(), 2);
                assert_eq!(f.ret_ty, Type::Int);
            }
            _ => panic!("expected a function declaration"),
        }
    }

    #[test]
    fn assignment_is_right_associative_and_binds_loosest() {
        let prog = parse("fn main() { int x; x = 1 + 2 * 3; }");
        let Decl::Fn(f) = &prog.decls[0] else {
            panic!()
        };
        let BlockItem::Stmt(Stmt::Assign(a)) = &f.body[1] else {
            panic!("expected assignment statement")
        };
        assert!(matches!(&a.rhs, Expr::Binary(BinOp::Add, _, _)));
    }

    #[test]
    fn rejects_assignment_to_non_identifier() {
        let toks = tokenize("fn main() { 1 = 2; }").unwrap();
        assert!(Parser::new(toks).parse_program().is_err());
    }

    #[test]
    fn parses_if_else_and_while() {
        let prog = parse(
            "fn main() { if (true) { write 1; } else { write 2; } while (true) { write 3; } }",
        );
        let Decl::Fn(f) = &prog.decls[0] else {
            panic!()
        };
        assert!(matches!(&f.body[0], BlockItem::Stmt(Stmt::If(_, _, Some(_)))));
        assert!(matches!(&f.body[1], BlockItem::Stmt(Stmt::While(..))));
    }
}
