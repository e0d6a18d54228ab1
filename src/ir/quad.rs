//! The quad model: one tagged enum per kind of three-address instruction,
//! plus the small `Instr` wrapper that attaches labels and an optional
//! comment to a quad for emission.

use super::label::Label;
use super::operand::{Operand, ProcId, SymbolId, SymbolTable};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mult,
    Div,
    Or,
    And,
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "Add",
            BinOp::Sub => "Sub",
            BinOp::Mult => "Mult",
            BinOp::Div => "Div",
            BinOp::Or => "Or",
            BinOp::And => "And",
            BinOp::Eq => "Eq",
            BinOp::Neq => "Neq",
            BinOp::Lt => "Lt",
            BinOp::Gt => "Gt",
            BinOp::Lte => "Lte",
            BinOp::Gte => "Gte",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnaryOp::Neg => "Neg",
            UnaryOp::Not => "Not",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyscallKind {
    Read,
    Write,
    Exit,
}

#[derive(Debug, Clone)]
pub enum Quad {
    BinOp {
        dst: Operand,
        op: BinOp,
        src1: Operand,
        src2: Operand,
    },
    UnaryOp {
        dst: Operand,
        op: UnaryOp,
        src: Operand,
    },
    Assign {
        dst: Operand,
        src: Operand,
    },
    Jmp {
        target: Label,
    },
    JmpIf {
        cond: Operand,
        invert: bool,
        target: Label,
    },
    Nop,
    Syscall {
        kind: SyscallKind,
        arg: Option<Operand>,
    },
    /// `arity` is carried alongside the callee so the code generator can
    /// emit the caller-side stack cleanup without re-deriving it from the
    /// symbol table at emission time. It is emission-only bookkeeping, not
    /// part of the documented IR-dump text — `render` prints just the
    /// callee's name, matching the original `CallQuad::repr()`.
    Call {
        callee: SymbolId,
        arity: usize,
    },
    Enter {
        proc: ProcId,
    },
    Leave {
        proc: ProcId,
    },
    SetIn {
        index: u32,
        arg: Operand,
    },
    GetIn {
        index: u32,
        formal: Operand,
    },
    SetOut {
        index: u32,
        arg: Operand,
    },
    GetOut {
        index: u32,
        dst: Operand,
    },
}

/// A quad with its attached labels (emitted as `<label>:` lines immediately
/// before the instruction) and an optional trailing comment.
#[derive(Debug, Clone)]
pub struct Instr {
    pub labels: Vec<Label>,
    pub quad: Quad,
    pub comment: Option<String>,
}

impl Instr {
    pub fn new(quad: Quad) -> Self {
        Instr {
            labels: Vec::new(),
            quad,
            comment: None,
        }
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// One-line IR dump representation: `lbl_a,lbl_b: <instr> #<comment>`.
    pub fn render(&self, symtab: &SymbolTable, proc_names: &[String]) -> String {
        let labels = self
            .labels
            .iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let body = self.quad.render(symtab, proc_names);
        let mut line = if labels.is_empty() {
            body
        } else {
            format!("{labels}: {body}")
        };
        if let Some(c) = &self.comment {
            line.push_str(" #");
            line.push_str(c);
        }
        line
    }
}

impl Quad {
    pub fn render(&self, symtab: &SymbolTable, proc_names: &[String]) -> String {
        let r = |o: &Operand| o.render(symtab);
        let proc_name = |p: &ProcId| {
            proc_names
                .get(p.0 as usize)
                .cloned()
                .unwrap_or_else(|| format!("proc{}", p.0))
        };
        match self {
            Quad::BinOp { dst, op, src1, src2 } => {
                format!("{} := {} {} {}", r(dst), r(src1), op, r(src2))
            }
            Quad::UnaryOp { dst, op, src } => format!("{} := {} {}", r(dst), op, r(src)),
            Quad::Assign { dst, src } => format!("{} := {}", r(dst), r(src)),
            Quad::Jmp { target } => format!("goto {target}"),
            Quad::JmpIf { cond, invert, target } => {
                let kw = if *invert { "iftrue" } else { "iffalse" };
                format!("{kw} {} goto {target}", r(cond))
            }
            Quad::Nop => "nop".to_string(),
            Quad::Syscall { kind, arg } => match (kind, arg) {
                (SyscallKind::Read, Some(a)) => format!("read {}", r(a)),
                (SyscallKind::Write, Some(a)) => format!("write {}", r(a)),
                (SyscallKind::Exit, _) => "exit".to_string(),
                (k, None) => format!("{k:?}"),
            },
            Quad::Call { callee, .. } => format!("call {}", symtab.get(*callee).name),
            Quad::Enter { proc } => format!("enter {}", proc_name(proc)),
            Quad::Leave { proc } => format!("leave {}", proc_name(proc)),
            Quad::SetIn { index, arg } => format!("setin {index} {}", r(arg)),
            Quad::GetIn { index, formal } => format!("getin {index} {}", r(formal)),
            Quad::SetOut { index, arg } => format!("setout {index} {}", r(arg)),
            Quad::GetOut { index, dst } => format!("getout {index} {}", r(dst)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::label::LabelId;
    use crate::ir::operand::{ProcId as PId, SymbolKind};
    use crate::types::Type;

    #[test]
    fn binop_renders_with_the_infix_shape() {
        let mut table = SymbolTable::new();
        let x = table.declare("x", Type::Int, SymbolKind::Global);
        let q = Quad::BinOp {
            dst: Operand::Symbol(x),
            op: BinOp::Add,
            src1: Operand::Literal("3".into()),
            src2: Operand::Literal("4".into()),
        };
        assert_eq!(q.render(&table, &[]), "x := 3 Add 4");
    }

    #[test]
    fn jmp_if_uses_iffalse_when_not_inverted() {
        let table = SymbolTable::new();
        let q = Quad::JmpIf {
            cond: Operand::Literal("1".into()),
            invert: false,
            target: Label(LabelId(3)),
        };
        assert_eq!(q.render(&table, &[]), "iffalse 1 goto lbl_3");
    }

    #[test]
    fn instr_prefixes_attached_labels() {
        let table = SymbolTable::new();
        let instr = Instr::new(Quad::Nop).with_label(Label(LabelId(1)));
        assert_eq!(instr.render(&table, &[]), "lbl_1: nop");
    }

    #[test]
    fn enter_renders_with_proc_name() {
        let table = SymbolTable::new();
        let names = vec!["main".to_string()];
        let q = Quad::Enter { proc: PId(0) };
        assert_eq!(q.render(&table, &names), "enter main");
    }

    #[test]
    fn call_renders_the_callee_name_only_not_its_arity() {
        let mut table = SymbolTable::new();
        let f = table.declare(
            "f",
            Type::Fn(vec![Type::Int, Type::Int], Box::new(Type::Int)),
            SymbolKind::Function {
                arity: 2,
                return_type: Type::Int,
            },
        );
        let q = Quad::Call { callee: f, arity: 2 };
        assert_eq!(q.render(&table, &[]), "call f");
    }
}
