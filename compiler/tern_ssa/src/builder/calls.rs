//! Call construction for [`Builder`].

use tern_tree::TypeId;

use super::Builder;
use crate::ir::{InstrId, InstrKind, ValueId};
use crate::SsaResult;

impl Builder<'_> {
    /// Start a call of `callee` returning `ret`. The call is placed by
    /// [`finish_call`](Self::finish_call) once every argument is added.
    pub fn begin_call(&mut self, ret: TypeId, callee: ValueId) -> SsaResult<InstrId> {
        let fn_ty = self.pointee(callee);
        assert!(
            self.ctx.types.is_function(fn_ty),
            "callee {callee:?} is not a function pointer"
        );
        self.ctx.new_instr(InstrKind::Call, Some(ret), &[callee])
    }

    pub fn add_call_arg(&mut self, call: InstrId, arg: ValueId) {
        assert_eq!(self.ctx.instr(call).kind(), InstrKind::Call, "{call:?} is not a call");
        self.ctx.add_operand(call, arg);
    }

    /// Append the call to the current block; returns its result, if any.
    pub fn finish_call(&mut self, call: InstrId) -> Option<ValueId> {
        let block = self.current();
        self.ctx.append_instr(block, call);
        self.ctx.instr(call).result()
    }
}
