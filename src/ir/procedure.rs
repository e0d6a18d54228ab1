//! A single procedure's IR: formals, locals, temporaries, and body quads.

use super::label::Label;
use super::operand::{Operand, ProcId, SymbolId, SymbolTable};
use super::quad::{Instr, Quad, SyscallKind};

#[derive(Debug, Clone)]
pub struct Procedure {
    pub id: ProcId,
    pub name: String,
    pub is_main: bool,
    pub enter: Instr,
    pub leave: Instr,
    pub leave_label: Label,
    pub formals: Vec<SymbolId>,
    pub locals: Vec<SymbolId>,
    pub body: Vec<Instr>,
    temp_counter: u32,
}

impl Procedure {
    pub fn new(id: ProcId, name: impl Into<String>, is_main: bool, leave_label: Label) -> Self {
        let leave = if is_main {
            Instr::new(Quad::Syscall {
                kind: SyscallKind::Exit,
                arg: None,
            })
        } else {
            Instr::new(Quad::Leave { proc: id })
        }
        .with_label(leave_label.clone());

        Procedure {
            id,
            name: name.into(),
            is_main,
            enter: Instr::new(Quad::Enter { proc: id }),
            leave,
            leave_label,
            formals: Vec::new(),
            locals: Vec::new(),
            body: Vec::new(),
            temp_counter: 0,
        }
    }

    pub fn declare_local(&mut self, sym: SymbolId) {
        self.locals.push(sym);
    }

    /// Appends `sym` to the formal list, in declaration order. Returns the
    /// formal's 1-indexed position.
    pub fn declare_formal(&mut self, sym: SymbolId) -> u32 {
        self.formals.push(sym);
        self.formals.len() as u32
    }

    /// Looks `sym` up among this procedure's formals, then locals. Returns
    /// `None` if neither owns it — the caller falls back to the program's
    /// globals and raises a fatal internal error if that also misses.
    pub fn local_operand(&self, sym: SymbolId) -> Option<Operand> {
        if self.formals.contains(&sym) || self.locals.contains(&sym) {
            Some(Operand::Symbol(sym))
        } else {
            None
        }
    }

    pub fn make_temp(&mut self) -> Operand {
        let n = self.temp_counter;
        self.temp_counter += 1;
        Operand::Temp(self.id, n)
    }

    pub fn add_quad(&mut self, instr: Instr) {
        self.body.push(instr);
    }

    pub fn pop_quad(&mut self) -> Option<Instr> {
        self.body.pop()
    }

    pub fn num_locals(&self) -> usize {
        self.locals.len()
    }

    pub fn num_temps(&self) -> usize {
        self.temp_counter as usize
    }

    pub fn render(&self, symtab: &SymbolTable, proc_names: &[String]) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "[{}] locals={} temps={}\n",
            self.name,
            self.num_locals(),
            self.num_temps()
        ));
        out.push_str(&self.enter.render(symtab, proc_names));
        out.push('\n');
        for instr in &self.body {
            out.push_str(&instr.render(symtab, proc_names));
            out.push('\n');
        }
        out.push_str(&self.leave.render(symtab, proc_names));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::label::LabelId;

    #[test]
    fn main_procedure_leaves_via_exit_not_leave_quad() {
        let p = Procedure::new(ProcId(0), "main", true, Label(LabelId(0)));
        assert!(matches!(
            p.leave.quad,
            Quad::Syscall {
                kind: SyscallKind::Exit,
                ..
            }
        ));
    }

    #[test]
    fn non_main_procedure_leaves_via_leave_quad() {
        let p = Procedure::new(ProcId(1), "f", false, Label(LabelId(0)));
        assert!(matches!(p.leave.quad, Quad::Leave { .. }));
    }

    #[test]
    fn temp_indices_are_unique_within_a_procedure() {
        let mut p = Procedure::new(ProcId(0), "main", true, Label(LabelId(0)));
        let a = p.make_temp();
        let b = p.make_temp();
        assert_ne!(a, b);
        assert_eq!(p.num_temps(), 2);
    }

    #[test]
    fn formal_declaration_order_is_preserved() {
        let mut p = Procedure::new(ProcId(0), "f", false, Label(LabelId(0)));
        let idx_a = p.declare_formal(SymbolId(5));
        let idx_b = p.declare_formal(SymbolId(6));
        assert_eq!(idx_a, 1);
        assert_eq!(idx_b, 2);
        assert_eq!(p.formals, vec![SymbolId(5), SymbolId(6)]);
    }
}
