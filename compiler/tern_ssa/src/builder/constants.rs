//! Constant materialization for [`Builder`].

use tern_eval::Scalar;
use tern_tree::TypeId;

use super::Builder;
use crate::ir::ValueId;
use crate::SsaResult;

impl Builder<'_> {
    /// Integer or floating constant `value` of type `ty`.
    pub fn int_const(&mut self, value: i64, ty: TypeId) -> SsaResult<ValueId> {
        self.ctx.constant_of(Scalar::from_i64(value, 64, true), ty)
    }

    pub fn float_const(&mut self, value: f64, ty: TypeId) -> SsaResult<ValueId> {
        self.ctx.constant_of(Scalar::Double(value), ty)
    }

    pub fn zero(&mut self, ty: TypeId) -> SsaResult<ValueId> {
        self.int_const(0, ty)
    }

    pub fn one(&mut self, ty: TypeId) -> SsaResult<ValueId> {
        self.int_const(1, ty)
    }

    pub fn constant(&mut self, value: Scalar, ty: TypeId) -> SsaResult<ValueId> {
        self.ctx.constant(value, ty)
    }
}
