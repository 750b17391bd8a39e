//! Atomic read-modify-write, fences and compare-and-swap for [`Builder`].

use super::Builder;
use crate::ir::{AtomicOp, InstrId, InstrKind, MemoryOrder, ValueId};
use crate::SsaResult;

impl Builder<'_> {
    /// Atomically apply `op` to `*ptr` with `value`; yields the old value.
    pub fn atomic_rmw(
        &mut self,
        op: AtomicOp,
        ptr: ValueId,
        value: ValueId,
        ordering: MemoryOrder,
    ) -> SsaResult<ValueId> {
        let ty = self.pointee(ptr);
        assert_eq!(self.ctx.ty(value), ty, "atomic operand type differs from *ptr");
        assert!(
            op == AtomicOp::Xchg || self.ctx.types.is_integer(ty),
            "atomic add needs an integer"
        );
        self.emit_value(InstrKind::AtomicRmw { op, ordering }, ty, &[ptr, value])
    }

    pub fn fence(&mut self, ordering: MemoryOrder) -> SsaResult<InstrId> {
        self.emit(InstrKind::Fence { ordering }, None, &[])
    }

    /// Store `desired` into `*ptr` if it holds `expected`; yields the old
    /// value.
    pub fn cmpxchg(
        &mut self,
        ptr: ValueId,
        expected: ValueId,
        desired: ValueId,
        success: MemoryOrder,
        failure: MemoryOrder,
    ) -> SsaResult<ValueId> {
        let ty = self.pointee(ptr);
        assert!(
            self.ctx.ty(expected) == ty && self.ctx.ty(desired) == ty,
            "cmpxchg operand types differ from *ptr"
        );
        self.emit_value(
            InstrKind::CmpXchg { success, failure },
            ty,
            &[ptr, expected, desired],
        )
    }
}
