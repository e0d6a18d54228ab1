//! 3AC → x86-64 code generation.
//!
//! [`alloc`] assigns every operand its memory location in one pass;
//! [`emit`] walks the IR a second time, now that locations are fixed, and
//! produces AT&T-syntax assembly text.

pub mod alloc;
pub mod emit;
pub mod error;

pub use emit::emit_x64;
pub use error::CodeGenError;
