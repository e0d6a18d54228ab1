//! Memory-location allocation: the one pass that assigns every symbol,
//! temp, and string operand its home before any emission runs. Before this
//! pass, [`Locations`] has no entries; afterward it is read-only.

use crate::ir::operand::{Locations, ProcId};
use crate::ir::program::IRProgram;

const FIRST_LOCAL_OFFSET: i64 = 24;
const SLOT_SIZE: i64 = 8;

/// Total stack space (locals + temps) a procedure's frame reserves, used
/// both by `alloc_procedure` to assign frame offsets and by the emitter to
/// size the `Enter`/`Leave` adjustment.
pub fn frame_size(prog: &IRProgram, proc: ProcId) -> i64 {
    let p = prog.proc(proc);
    SLOT_SIZE * (p.num_locals() + p.num_temps()) as i64
}

pub fn allocate(prog: &IRProgram) -> Locations {
    let mut locs = Locations::new();
    for (id, _) in prog.strings() {
        locs.set_string(id, format!("str_{}", id.0));
    }
    for g in &prog.globals {
        let name = &prog.symtab.get(*g).name;
        locs.set_symbol(*g, format!("gbl_{name}(%rip)"));
    }
    for proc in &prog.procedures {
        allocate_procedure(proc, &mut locs);
    }
    locs
}

fn allocate_procedure(proc: &crate::ir::procedure::Procedure, locs: &mut Locations) {
    let mut offset = FIRST_LOCAL_OFFSET;
    for &local in &proc.locals {
        locs.set_symbol(local, format!("-{offset}(%rbp)"));
        offset += SLOT_SIZE;
    }
    for n in 0..proc.num_temps() as u32 {
        locs.set_temp(proc.id, n, format!("-{offset}(%rbp)"));
        offset += SLOT_SIZE;
    }

    let arity = proc.formals.len() as i64;
    for (zero_idx, &formal) in proc.formals.iter().enumerate() {
        let i = zero_idx as i64 + 1; // 1-indexed declaration position
        let slot = SLOT_SIZE * (arity - i);
        locs.set_symbol(formal, format!("{slot}(%rbp)"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::operand::{Operand, SymbolKind};
    use crate::ir::program::IRProgram;
    use crate::types::Type;

    #[test]
    fn two_formal_offsets_are_mirrored() {
        let mut prog = IRProgram::new();
        let proc = prog.make_proc("f", false);
        let fn_sym = prog.symtab.declare(
            "f",
            Type::Fn(vec![Type::Int, Type::Int], Box::new(Type::Int)),
            SymbolKind::Function {
                arity: 2,
                return_type: Type::Int,
            },
        );
        let a = prog.symtab.declare(
            "a",
            Type::Int,
            SymbolKind::Formal {
                owner: fn_sym,
                index: 1,
            },
        );
        let b = prog.symtab.declare(
            "b",
            Type::Int,
            SymbolKind::Formal {
                owner: fn_sym,
                index: 2,
            },
        );
        prog.proc_mut(proc).declare_formal(a);
        prog.proc_mut(proc).declare_formal(b);

        let locs = allocate(&prog);
        assert_eq!(locs.of(&Operand::Symbol(a)), Some("8(%rbp)"));
        assert_eq!(locs.of(&Operand::Symbol(b)), Some("0(%rbp)"));
    }

    #[test]
    fn locals_and_temps_step_by_eight_from_the_base_offset() {
        let mut prog = IRProgram::new();
        let proc = prog.make_proc("main", true);
        let x = prog.symtab.declare(
            "x",
            Type::Int,
            SymbolKind::Local {
                owner: crate::ir::operand::SymbolId(0),
            },
        );
        prog.proc_mut(proc).declare_local(x);
        let _t0 = prog.proc_mut(proc).make_temp();

        let locs = allocate(&prog);
        assert_eq!(locs.of(&Operand::Symbol(x)), Some("-24(%rbp)"));
        assert_eq!(locs.of(&Operand::Temp(proc, 0)), Some("-32(%rbp)"));
    }

    #[test]
    fn globals_use_rip_relative_addressing() {
        let mut prog = IRProgram::new();
        let g = prog.symtab.declare("counter", Type::Int, SymbolKind::Global);
        prog.declare_global(g);
        let locs = allocate(&prog);
        assert_eq!(locs.of(&Operand::Symbol(g)), Some("gbl_counter(%rip)"));
    }
}
