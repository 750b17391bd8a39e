//! Stack slots, loads, stores and address computation for [`Builder`].

use tern_eval::Scalar;
use tern_tree::TypeId;

use super::Builder;
use crate::ir::{BlockId, InstrId, InstrKind, ValueId};
use crate::SsaResult;

impl Builder<'_> {
    /// Stack slot for a `ty`, at the current position.
    pub fn alloca(&mut self, ty: TypeId) -> SsaResult<ValueId> {
        let ptr = self.ctx.types.pointer_to(ty);
        self.emit_value(InstrKind::Alloca { allocated: ty }, ptr, &[])
    }

    /// Stack slot for a `ty`, placed in `block` right after `anchor` (or at
    /// the front). Returns the instruction so callers can chain slots.
    pub fn alloca_after(
        &mut self,
        block: BlockId,
        anchor: Option<InstrId>,
        ty: TypeId,
    ) -> SsaResult<(InstrId, ValueId)> {
        let ptr = self.ctx.types.pointer_to(ty);
        let instr = self
            .ctx
            .new_instr(InstrKind::Alloca { allocated: ty }, Some(ptr), &[])?;
        self.ctx.insert_instr_after(block, anchor, instr);
        let value = self
            .ctx
            .instr(instr)
            .result()
            .unwrap_or_else(|| panic!("alloca without result"));
        Ok((instr, value))
    }

    pub(super) fn pointee(&self, ptr: ValueId) -> TypeId {
        let ty = self.ctx.ty(ptr);
        self.ctx
            .types
            .pointee(ty)
            .unwrap_or_else(|| panic!("{ptr:?} of type {ty:?} is not a pointer"))
    }

    pub fn load(&mut self, ptr: ValueId) -> SsaResult<ValueId> {
        let ty = self.pointee(ptr);
        self.emit_value(InstrKind::Load, ty, &[ptr])
    }

    pub fn store(&mut self, value: ValueId, ptr: ValueId) -> SsaResult<InstrId> {
        let ty = self.pointee(ptr);
        assert_eq!(
            self.ctx.ty(value),
            ty,
            "storing a value of another type through {ptr:?}"
        );
        self.emit(InstrKind::Store, None, &[value, ptr])
    }

    /// `ptr + index * sizeof(*ptr) + offset`, typed `result`.
    pub fn address(
        &mut self,
        ptr: ValueId,
        index: ValueId,
        offset: ValueId,
        result: TypeId,
    ) -> SsaResult<ValueId> {
        let _ = self.pointee(ptr);
        assert!(
            self.ctx.types.is_integer(self.ctx.ty(index))
                && self.ctx.types.is_integer(self.ctx.ty(offset)),
            "address index and offset must be integers"
        );
        assert!(
            self.ctx.types.is_pointer(result),
            "address result must be a pointer"
        );
        self.emit_value(InstrKind::Address, result, &[ptr, index, offset])
    }

    /// `ptr + index` in units of the pointee.
    pub fn ptr_add(&mut self, ptr: ValueId, index: ValueId) -> SsaResult<ValueId> {
        let ptrdiff = self.ctx.target.ptrdiff_type;
        let index = self.cast(index, ptrdiff)?;
        let size_type = self.ctx.target.size_type;
        let offset = self.zero(size_type)?;
        let ty = self.ctx.ty(ptr);
        self.address(ptr, index, offset, ty)
    }

    /// Address of the field at `byte_offset` inside `*ptr`, typed as a
    /// pointer to `field_ty`.
    pub fn field_addr(&mut self, ptr: ValueId, byte_offset: u64, field_ty: TypeId) -> SsaResult<ValueId> {
        let ptrdiff = self.ctx.target.ptrdiff_type;
        let index = self.zero(ptrdiff)?;
        let size_type = self.ctx.target.size_type;
        let offset = self
            .ctx
            .constant_of(Scalar::int(byte_offset, 64, false), size_type)?;
        let result = self.ctx.types.pointer_to(field_ty);
        self.address(ptr, index, offset, result)
    }
}
