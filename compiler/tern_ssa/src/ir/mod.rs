//! SSA intermediate representation.
//!
//! Values, instructions, blocks and functions are arena entries owned by a
//! [`Context`] and named by copyable ids. Operands reference values by
//! [`ValueId`]; branch targets are label values, so a block is reached
//! exactly when its label appears in a terminator operand.
//!
//! Structure of a function:
//!
//! ```text
//! function
//!   block (label value)
//!     phi*            one incoming pair per predecessor edge
//!     instruction*
//!     terminator      jmp | br | switch | ret
//! ```

mod block;
mod context;
mod function;
mod ids;
mod instr;
mod module;
mod value;

pub use block::BlockData;
pub use context::Context;
pub use function::FunctionData;
pub use ids::{BlockId, FuncId, InstrId, ValueId};
pub use instr::{AtomicOp, Arity, BinaryOp, BranchKind, InstrData, InstrKind, MemoryOrder};
pub use module::{DefKind, Definition, Module};
pub use value::{GlobalRef, Use, ValueData, ValueKind};
