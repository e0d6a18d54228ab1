//! The operand model: symbols, the program-wide symbol table, and the
//! tagged `Operand` enum that every quad's operand positions carry.

use crate::types::Type;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StrId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    Global,
    /// `owner` is the enclosing function's own symbol. Resolution runs
    /// before any `ProcId` exists, so procedures are identified by their
    /// declaring symbol until lowering creates the real `Procedure`.
    Local { owner: SymbolId },
    Formal { owner: SymbolId, index: u32 },
    Function { arity: usize, return_type: Type },
}

#[derive(Debug, Clone)]
pub struct SymbolInfo {
    pub name: String,
    pub ty: Type,
    pub kind: SymbolKind,
}

/// Program-wide symbol interning table. Every declared name gets exactly
/// one `SymbolId`, allocated once at resolution time and never reused.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<SymbolInfo>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: impl Into<String>, ty: Type, kind: SymbolKind) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(SymbolInfo {
            name: name.into(),
            ty,
            kind,
        });
        id
    }

    pub fn get(&self, id: SymbolId) -> &SymbolInfo {
        &self.symbols[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandType {
    Numeric,
    Str,
}

/// A value carrier. Symbol and Temp operands are frame- or data-resident;
/// Literal operands never have a memory location; String operands carry
/// the address of interned data once the allocation phase has run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    Symbol(SymbolId),
    Literal(String),
    Temp(ProcId, u32),
    Str(StrId),
}

impl Operand {
    pub fn operand_type(&self, table: &SymbolTable) -> OperandType {
        match self {
            Operand::Symbol(id) => match &table.get(*id).ty {
                Type::String => OperandType::Str,
                _ => OperandType::Numeric,
            },
            Operand::Literal(_) | Operand::Temp(..) => OperandType::Numeric,
            Operand::Str(_) => OperandType::Str,
        }
    }

    pub fn render(&self, table: &SymbolTable) -> String {
        match self {
            Operand::Symbol(id) => table.get(*id).name.clone(),
            Operand::Literal(s) => s.clone(),
            Operand::Temp(_, n) => format!("tmp{n}"),
            Operand::Str(id) => format!("str_{}", id.0),
        }
    }
}

/// Memory locations are assigned once, by the allocation phase, into this
/// map — never stored on the operand itself. Before allocation the map has
/// no entries for any operand; afterward it is read-only.
#[derive(Debug, Clone, Default)]
pub struct Locations {
    symbols: HashMap<SymbolId, String>,
    temps: HashMap<(ProcId, u32), String>,
    strings: HashMap<StrId, String>,
}

impl Locations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_symbol(&mut self, id: SymbolId, loc: impl Into<String>) {
        self.symbols.insert(id, loc.into());
    }

    pub fn set_temp(&mut self, proc: ProcId, idx: u32, loc: impl Into<String>) {
        self.temps.insert((proc, idx), loc.into());
    }

    pub fn set_string(&mut self, id: StrId, loc: impl Into<String>) {
        self.strings.insert(id, loc.into());
    }

    pub fn of(&self, opd: &Operand) -> Option<&str> {
        match opd {
            Operand::Symbol(id) => self.symbols.get(id).map(String::as_str),
            Operand::Temp(p, n) => self.temps.get(&(*p, *n)).map(String::as_str),
            Operand::Str(id) => self.strings.get(id).map(String::as_str),
            Operand::Literal(_) => None,
        }
    }
}

impl fmt::Display for OperandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperandType::Numeric => write!(f, "NUMERIC"),
            OperandType::Str => write!(f, "STRING"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_operand_has_no_location_until_never() {
        let locs = Locations::new();
        let lit = Operand::Literal("3".to_string());
        assert_eq!(locs.of(&lit), None);
    }

    #[test]
    fn symbol_location_is_absent_before_allocation_and_present_after() {
        let mut table = SymbolTable::new();
        let id = table.declare("x", Type::Int, SymbolKind::Global);
        let opd = Operand::Symbol(id);
        let mut locs = Locations::new();
        assert_eq!(locs.of(&opd), None);
        locs.set_symbol(id, "(gbl_x)");
        assert_eq!(locs.of(&opd), Some("(gbl_x)"));
    }

    #[test]
    fn string_operand_type_is_str() {
        let table = SymbolTable::new();
        let opd = Operand::Str(StrId(0));
        assert_eq!(opd.operand_type(&table), OperandType::Str);
    }
}
