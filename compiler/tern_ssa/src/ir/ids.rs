//! Arena handles for IR nodes.
//!
//! All handles index into the owning [`Context`](crate::Context) and are
//! unique across every function of a compilation, not just within one.

use tern_tree::define_id;

define_id!(
    /// Handle of a value (instruction result, constant, label, global,
    /// string reference, parameter or undef).
    ValueId,
    /// Handle of an instruction or terminator.
    InstrId,
    /// Handle of a basic block.
    BlockId,
    /// Handle of a function.
    FuncId,
);
