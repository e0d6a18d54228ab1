//! The top-level IR container: procedures, globals, interned strings, and
//! the shared symbol table and label/string counters.

use super::label::{Label, LabelId};
use super::operand::{Operand, ProcId, StrId, SymbolId, SymbolTable};
use super::procedure::Procedure;
use crate::error::CompileError;

#[derive(Debug, Clone, Default)]
pub struct IRProgram {
    pub symtab: SymbolTable,
    pub procedures: Vec<Procedure>,
    pub globals: Vec<SymbolId>,
    strings: Vec<String>,
    next_label: u32,
}

impl IRProgram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn make_proc(&mut self, name: impl Into<String>, is_main: bool) -> ProcId {
        let id = ProcId(self.procedures.len() as u32);
        let leave_label = self.make_label();
        self.procedures.push(Procedure::new(id, name, is_main, leave_label));
        id
    }

    pub fn proc(&self, id: ProcId) -> &Procedure {
        &self.procedures[id.0 as usize]
    }

    pub fn proc_mut(&mut self, id: ProcId) -> &mut Procedure {
        &mut self.procedures[id.0 as usize]
    }

    pub fn make_label(&mut self) -> Label {
        let l = Label(LabelId(self.next_label));
        self.next_label += 1;
        l
    }

    pub fn make_string(&mut self, val: impl Into<String>) -> Operand {
        let id = StrId(self.strings.len() as u32);
        self.strings.push(val.into());
        Operand::Str(id)
    }

    pub fn string_literal(&self, id: StrId) -> &str {
        &self.strings[id.0 as usize]
    }

    pub fn strings(&self) -> impl Iterator<Item = (StrId, &str)> {
        self.strings
            .iter()
            .enumerate()
            .map(|(i, s)| (StrId(i as u32), s.as_str()))
    }

    pub fn declare_global(&mut self, sym: SymbolId) {
        self.globals.push(sym);
    }

    pub fn global_operand(&self, sym: SymbolId) -> Option<Operand> {
        if self.globals.contains(&sym) {
            Some(Operand::Symbol(sym))
        } else {
            None
        }
    }

    /// Implements the formal → local → global lookup order. A miss here is
    /// an internal invariant violation: resolution should have rejected any
    /// reference to a name that isn't bound.
    pub fn resolve_operand(&self, proc: ProcId, sym: SymbolId) -> Result<Operand, CompileError> {
        if let Some(opd) = self.proc(proc).local_operand(sym) {
            return Ok(opd);
        }
        if let Some(opd) = self.global_operand(sym) {
            return Ok(opd);
        }
        Err(CompileError::Internal(format!(
            "unresolved symbol '{}' referenced in procedure '{}'",
            self.symtab.get(sym).name,
            self.proc(proc).name
        )))
    }

    pub fn proc_names(&self) -> Vec<String> {
        self.procedures.iter().map(|p| p.name.clone()).collect()
    }

    /// Pretty-prints the whole program: a globals/strings header followed
    /// by each procedure's locals header, Enter, body, and Leave.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("globals:");
        for g in &self.globals {
            out.push(' ');
            out.push_str(&self.symtab.get(*g).name);
        }
        out.push('\n');
        out.push_str("strings:");
        for (id, s) in self.strings() {
            out.push_str(&format!(" str_{}={s:?}", id.0));
        }
        out.push('\n');
        let names = self.proc_names();
        for proc in &self.procedures {
            out.push_str(&proc.render(&self.symtab, &names));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_interning_hands_out_increasing_ids() {
        let mut prog = IRProgram::new();
        let a = prog.make_string("hi");
        let b = prog.make_string("there");
        assert_eq!(a, Operand::Str(StrId(0)));
        assert_eq!(b, Operand::Str(StrId(1)));
    }

    #[test]
    fn label_counter_is_monotonic_and_program_wide() {
        let mut prog = IRProgram::new();
        let a = prog.make_label();
        let _proc = prog.make_proc("f", false); // consumes a label for leave_label
        let b = prog.make_label();
        assert_ne!(a, b);
    }

    #[test]
    fn resolve_operand_falls_back_to_globals() {
        use crate::ir::operand::SymbolKind;
        use crate::types::Type;
        let mut prog = IRProgram::new();
        let g = prog.symtab.declare("x", Type::Int, SymbolKind::Global);
        prog.declare_global(g);
        let p = prog.make_proc("main", true);
        assert_eq!(prog.resolve_operand(p, g).unwrap(), Operand::Symbol(g));
    }

    #[test]
    fn resolve_operand_is_fatal_when_unbound() {
        use crate::ir::operand::SymbolKind;
        use crate::types::Type;
        let mut prog = IRProgram::new();
        let stray = prog.symtab.declare("y", Type::Int, SymbolKind::Global);
        let p = prog.make_proc("main", true);
        assert!(prog.resolve_operand(p, stray).is_err());
    }
}
