//! Comparisons; every result is an `int` 0 or 1 for [`Builder`].

use tern_tree::TypeId;

use super::Builder;
use crate::ir::{BinaryOp, InstrKind, ValueId};
use crate::SsaResult;

impl Builder<'_> {
    /// Compare two scalars of one type; the result is an `int` 0 or 1.
    pub fn compare(&mut self, op: BinaryOp, lhs: ValueId, rhs: ValueId) -> SsaResult<ValueId> {
        assert!(op.is_comparison(), "`{}` is not a comparison", op.mnemonic());
        let ty = self.same_type(op, lhs, rhs);
        assert!(
            self.ctx.types.is_scalar(ty),
            "`{}` needs scalar operands, got {ty:?}",
            op.mnemonic()
        );
        self.emit_value(InstrKind::Binary(op), TypeId::INT, &[lhs, rhs])
    }

    pub fn lt(&mut self, lhs: ValueId, rhs: ValueId) -> SsaResult<ValueId> {
        self.compare(BinaryOp::Lt, lhs, rhs)
    }

    pub fn gt(&mut self, lhs: ValueId, rhs: ValueId) -> SsaResult<ValueId> {
        self.compare(BinaryOp::Gt, lhs, rhs)
    }

    pub fn le(&mut self, lhs: ValueId, rhs: ValueId) -> SsaResult<ValueId> {
        self.compare(BinaryOp::Le, lhs, rhs)
    }

    pub fn ge(&mut self, lhs: ValueId, rhs: ValueId) -> SsaResult<ValueId> {
        self.compare(BinaryOp::Ge, lhs, rhs)
    }

    pub fn eq(&mut self, lhs: ValueId, rhs: ValueId) -> SsaResult<ValueId> {
        self.compare(BinaryOp::Eq, lhs, rhs)
    }

    pub fn ne(&mut self, lhs: ValueId, rhs: ValueId) -> SsaResult<ValueId> {
        self.compare(BinaryOp::Ne, lhs, rhs)
    }

    /// `value != 0`, the truth value of a scalar.
    pub fn ne_zero(&mut self, value: ValueId) -> SsaResult<ValueId> {
        let ty = self.ctx.ty(value);
        let zero = self.zero(ty)?;
        self.ne(value, zero)
    }
}
