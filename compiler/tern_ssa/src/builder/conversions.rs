//! Scalar conversions for [`Builder`].

use tern_tree::TypeId;

use super::Builder;
use crate::ir::{InstrKind, ValueId};
use crate::SsaResult;

impl Builder<'_> {
    /// Convert `value` to the scalar type `ty`; no-op if it already has it.
    pub fn cast(&mut self, value: ValueId, ty: TypeId) -> SsaResult<ValueId> {
        assert!(
            self.ctx.types.is_scalar(ty),
            "cast target {ty:?} is not a scalar type"
        );
        if self.ctx.ty(value) == ty {
            return Ok(value);
        }
        self.emit_value(InstrKind::Cast, ty, &[value])
    }
}
