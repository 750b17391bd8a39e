//! Arithmetic, bitwise and unary operations for [`Builder`].

use tern_tree::TypeId;

use super::Builder;
use crate::ir::{BinaryOp, InstrKind, ValueId};
use crate::SsaResult;

impl Builder<'_> {
    pub(super) fn same_type(&self, op: BinaryOp, lhs: ValueId, rhs: ValueId) -> TypeId {
        let ty = self.ctx.ty(lhs);
        assert_eq!(
            ty,
            self.ctx.ty(rhs),
            "`{}` operands have different types",
            op.mnemonic()
        );
        ty
    }

    fn arith(&mut self, op: BinaryOp, lhs: ValueId, rhs: ValueId) -> SsaResult<ValueId> {
        let ty = self.same_type(op, lhs, rhs);
        assert!(
            self.ctx.types.is_arithmetic(ty),
            "`{}` needs arithmetic operands, got {ty:?}",
            op.mnemonic()
        );
        self.emit_value(InstrKind::Binary(op), ty, &[lhs, rhs])
    }

    fn bitwise(&mut self, op: BinaryOp, lhs: ValueId, rhs: ValueId) -> SsaResult<ValueId> {
        let ty = self.same_type(op, lhs, rhs);
        assert!(
            self.ctx.types.is_integer(ty),
            "`{}` needs integer operands, got {ty:?}",
            op.mnemonic()
        );
        self.emit_value(InstrKind::Binary(op), ty, &[lhs, rhs])
    }

    pub fn add(&mut self, lhs: ValueId, rhs: ValueId) -> SsaResult<ValueId> {
        self.arith(BinaryOp::Add, lhs, rhs)
    }

    pub fn sub(&mut self, lhs: ValueId, rhs: ValueId) -> SsaResult<ValueId> {
        self.arith(BinaryOp::Sub, lhs, rhs)
    }

    pub fn mul(&mut self, lhs: ValueId, rhs: ValueId) -> SsaResult<ValueId> {
        self.arith(BinaryOp::Mul, lhs, rhs)
    }

    pub fn div(&mut self, lhs: ValueId, rhs: ValueId) -> SsaResult<ValueId> {
        self.arith(BinaryOp::Div, lhs, rhs)
    }

    pub fn rem(&mut self, lhs: ValueId, rhs: ValueId) -> SsaResult<ValueId> {
        self.bitwise(BinaryOp::Rem, lhs, rhs)
    }

    pub fn shl(&mut self, lhs: ValueId, rhs: ValueId) -> SsaResult<ValueId> {
        self.bitwise(BinaryOp::Shl, lhs, rhs)
    }

    pub fn shr(&mut self, lhs: ValueId, rhs: ValueId) -> SsaResult<ValueId> {
        self.bitwise(BinaryOp::Shr, lhs, rhs)
    }

    pub fn and(&mut self, lhs: ValueId, rhs: ValueId) -> SsaResult<ValueId> {
        self.bitwise(BinaryOp::And, lhs, rhs)
    }

    pub fn or(&mut self, lhs: ValueId, rhs: ValueId) -> SsaResult<ValueId> {
        self.bitwise(BinaryOp::Or, lhs, rhs)
    }

    pub fn xor(&mut self, lhs: ValueId, rhs: ValueId) -> SsaResult<ValueId> {
        self.bitwise(BinaryOp::Xor, lhs, rhs)
    }

    /// Any binary opcode, dispatched to the family check it belongs to.
    pub fn binary(&mut self, op: BinaryOp, lhs: ValueId, rhs: ValueId) -> SsaResult<ValueId> {
        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                self.arith(op, lhs, rhs)
            }
            BinaryOp::Rem
            | BinaryOp::Shl
            | BinaryOp::Shr
            | BinaryOp::And
            | BinaryOp::Or
            | BinaryOp::Xor => self.bitwise(op, lhs, rhs),
            BinaryOp::Lt
            | BinaryOp::Gt
            | BinaryOp::Le
            | BinaryOp::Ge
            | BinaryOp::Eq
            | BinaryOp::Ne => self.compare(op, lhs, rhs),
        }
    }

    /// `0 - value`.
    pub fn neg(&mut self, value: ValueId) -> SsaResult<ValueId> {
        let ty = self.ctx.ty(value);
        let zero = self.zero(ty)?;
        self.sub(zero, value)
    }

    /// `value ^ ~0`.
    pub fn not(&mut self, value: ValueId) -> SsaResult<ValueId> {
        let ty = self.ctx.ty(value);
        let ones = self.int_const(-1, ty)?;
        self.xor(value, ones)
    }

    /// `value == 0`, as `int`.
    pub fn log_not(&mut self, value: ValueId) -> SsaResult<ValueId> {
        let ty = self.ctx.ty(value);
        let zero = self.zero(ty)?;
        self.eq(value, zero)
    }
}
