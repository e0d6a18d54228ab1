//! Three-address-code intermediate representation.
//!
//! [`operand`] defines the value-carrier model and the program-wide symbol
//! table; [`quad`] defines the tagged instruction set; [`procedure`] and
//! [`program`] are the two owning containers lowering builds up and code
//! generation walks back down.

pub mod label;
pub mod operand;
pub mod procedure;
pub mod program;
pub mod quad;

pub use label::{Label, LabelId};
pub use operand::{Locations, Operand, OperandType, ProcId, StrId, SymbolId, SymbolInfo, SymbolKind, SymbolTable};
pub use procedure::Procedure;
pub use program::IRProgram;
pub use quad::{BinOp, Instr, Quad, SyscallKind, UnaryOp};
