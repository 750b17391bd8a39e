//! Arithmetic, bitwise and comparison operators on [`Scalar`].
//!
//! Binary operators require both operands to have the same [`ScalarKind`];
//! the frontend's usual arithmetic conversions guarantee that for checked
//! trees. Integer results wrap at the operand width. Shift amounts may be of
//! any integer kind.

use std::cmp::Ordering;

use crate::{EvalError, EvalResult, IntScalar, Scalar, ScalarKind};

/// Binary operator selector, for callers that dispatch on an opcode.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    And,
    Or,
    Xor,
}

impl BinOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::And => "&",
            BinOp::Or => "|",
            BinOp::Xor => "^",
        }
    }
}

fn same_kind(lhs: &Scalar, rhs: &Scalar) -> EvalResult<()> {
    if lhs.kind() == rhs.kind() {
        Ok(())
    } else {
        Err(EvalError::KindMismatch {
            lhs: lhs.kind(),
            rhs: rhs.kind(),
        })
    }
}

fn ints(op: BinOp, lhs: Scalar, rhs: Scalar) -> EvalResult<(IntScalar, IntScalar)> {
    match (lhs, rhs) {
        (Scalar::Int(a), Scalar::Int(b)) => Ok((a, b)),
        (Scalar::Int(_), other) | (other, _) => Err(EvalError::UnsupportedOperation {
            op: op.symbol(),
            kind: other.kind(),
        }),
    }
}

impl Scalar {
    /// Apply `op` to `self` and `rhs`.
    pub fn binary(self, op: BinOp, rhs: Scalar) -> EvalResult<Scalar> {
        match op {
            BinOp::Add => self.checked_add(rhs),
            BinOp::Sub => self.checked_sub(rhs),
            BinOp::Mul => self.checked_mul(rhs),
            BinOp::Div => self.checked_div(rhs),
            BinOp::Rem => self.checked_rem(rhs),
            BinOp::Shl => self.checked_shl(rhs),
            BinOp::Shr => self.checked_shr(rhs),
            BinOp::And => self.checked_bitand(rhs),
            BinOp::Or => self.checked_bitor(rhs),
            BinOp::Xor => self.checked_bitxor(rhs),
        }
    }

    pub fn checked_add(self, rhs: Scalar) -> EvalResult<Scalar> {
        same_kind(&self, &rhs)?;
        Ok(match (self, rhs) {
            (Scalar::Int(a), Scalar::Int(b)) => a.with_raw(a.to_u64().wrapping_add(b.to_u64())).into(),
            (Scalar::Single(a), Scalar::Single(b)) => Scalar::Single(a + b),
            (Scalar::Double(a), Scalar::Double(b)) => Scalar::Double(a + b),
            _ => unreachable!("kinds checked above"),
        })
    }

    pub fn checked_sub(self, rhs: Scalar) -> EvalResult<Scalar> {
        same_kind(&self, &rhs)?;
        Ok(match (self, rhs) {
            (Scalar::Int(a), Scalar::Int(b)) => a.with_raw(a.to_u64().wrapping_sub(b.to_u64())).into(),
            (Scalar::Single(a), Scalar::Single(b)) => Scalar::Single(a - b),
            (Scalar::Double(a), Scalar::Double(b)) => Scalar::Double(a - b),
            _ => unreachable!("kinds checked above"),
        })
    }

    pub fn checked_mul(self, rhs: Scalar) -> EvalResult<Scalar> {
        same_kind(&self, &rhs)?;
        Ok(match (self, rhs) {
            (Scalar::Int(a), Scalar::Int(b)) => a.with_raw(a.to_u64().wrapping_mul(b.to_u64())).into(),
            (Scalar::Single(a), Scalar::Single(b)) => Scalar::Single(a * b),
            (Scalar::Double(a), Scalar::Double(b)) => Scalar::Double(a * b),
            _ => unreachable!("kinds checked above"),
        })
    }

    /// Division, truncating toward zero for integers.
    #[expect(
        clippy::cast_sign_loss,
        reason = "two's complement reinterpretation is intended"
    )]
    pub fn checked_div(self, rhs: Scalar) -> EvalResult<Scalar> {
        same_kind(&self, &rhs)?;
        Ok(match (self, rhs) {
            (Scalar::Int(a), Scalar::Int(b)) => {
                if b.is_zero() {
                    return Err(EvalError::DivisionByZero);
                }
                let raw = if a.is_signed() {
                    a.to_i64().wrapping_div(b.to_i64()) as u64
                } else {
                    a.to_u64() / b.to_u64()
                };
                a.with_raw(raw).into()
            }
            (Scalar::Single(a), Scalar::Single(b)) => Scalar::Single(a / b),
            (Scalar::Double(a), Scalar::Double(b)) => Scalar::Double(a / b),
            _ => unreachable!("kinds checked above"),
        })
    }

    /// Remainder with the sign of the dividend. Integers only.
    #[expect(
        clippy::cast_sign_loss,
        reason = "two's complement reinterpretation is intended"
    )]
    pub fn checked_rem(self, rhs: Scalar) -> EvalResult<Scalar> {
        same_kind(&self, &rhs)?;
        let (a, b) = ints(BinOp::Rem, self, rhs)?;
        if b.is_zero() {
            return Err(EvalError::DivisionByZero);
        }
        let raw = if a.is_signed() {
            a.to_i64().wrapping_rem(b.to_i64()) as u64
        } else {
            a.to_u64() % b.to_u64()
        };
        Ok(a.with_raw(raw).into())
    }

    /// Left shift. The result has the kind of `self`.
    pub fn checked_shl(self, rhs: Scalar) -> EvalResult<Scalar> {
        let (a, b) = ints(BinOp::Shl, self, rhs)?;
        let amount = shift_amount(a, b)?;
        Ok(a.with_raw(a.to_u64() << amount).into())
    }

    /// Right shift: arithmetic for signed operands, logical otherwise.
    #[expect(
        clippy::cast_sign_loss,
        reason = "two's complement reinterpretation is intended"
    )]
    pub fn checked_shr(self, rhs: Scalar) -> EvalResult<Scalar> {
        let (a, b) = ints(BinOp::Shr, self, rhs)?;
        let amount = shift_amount(a, b)?;
        let raw = if a.is_signed() {
            (a.to_i64() >> amount) as u64
        } else {
            a.to_u64() >> amount
        };
        Ok(a.with_raw(raw).into())
    }

    pub fn checked_bitand(self, rhs: Scalar) -> EvalResult<Scalar> {
        same_kind(&self, &rhs)?;
        let (a, b) = ints(BinOp::And, self, rhs)?;
        Ok(a.with_raw(a.to_u64() & b.to_u64()).into())
    }

    pub fn checked_bitor(self, rhs: Scalar) -> EvalResult<Scalar> {
        same_kind(&self, &rhs)?;
        let (a, b) = ints(BinOp::Or, self, rhs)?;
        Ok(a.with_raw(a.to_u64() | b.to_u64()).into())
    }

    pub fn checked_bitxor(self, rhs: Scalar) -> EvalResult<Scalar> {
        same_kind(&self, &rhs)?;
        let (a, b) = ints(BinOp::Xor, self, rhs)?;
        Ok(a.with_raw(a.to_u64() ^ b.to_u64()).into())
    }

    /// Arithmetic negation (wrapping for integers).
    pub fn wrapping_neg(self) -> Scalar {
        match self {
            Scalar::Int(a) => a.with_raw(a.to_u64().wrapping_neg()).into(),
            Scalar::Single(v) => Scalar::Single(-v),
            Scalar::Double(v) => Scalar::Double(-v),
        }
    }

    /// Bitwise complement. Integers only.
    pub fn checked_not(self) -> EvalResult<Scalar> {
        match self {
            Scalar::Int(a) => Ok(a.with_raw(!a.to_u64()).into()),
            other => Err(EvalError::UnsupportedOperation {
                op: "~",
                kind: other.kind(),
            }),
        }
    }

    /// Three-way comparison under the operands' signedness.
    ///
    /// Fails with [`EvalError::Unordered`] when a float operand is NaN.
    pub fn compare(&self, rhs: &Scalar) -> EvalResult<Ordering> {
        same_kind(self, rhs)?;
        match (self, rhs) {
            (Scalar::Int(a), Scalar::Int(b)) if a.is_signed() => Ok(a.to_i64().cmp(&b.to_i64())),
            (Scalar::Int(a), Scalar::Int(b)) => Ok(a.to_u64().cmp(&b.to_u64())),
            (Scalar::Single(a), Scalar::Single(b)) => a.partial_cmp(b).ok_or(EvalError::Unordered),
            (Scalar::Double(a), Scalar::Double(b)) => a.partial_cmp(b).ok_or(EvalError::Unordered),
            _ => unreachable!("kinds checked above"),
        }
    }
}

fn shift_amount(lhs: IntScalar, rhs: IntScalar) -> EvalResult<u32> {
    let amount = rhs.to_i64();
    match u32::try_from(amount) {
        Ok(n) if n < lhs.bits() && !rhs.is_negative() => Ok(n),
        _ => Err(EvalError::InvalidShift {
            amount,
            bits: lhs.bits(),
        }),
    }
}

impl ScalarKind {
    pub const fn is_int(self) -> bool {
        matches!(self, ScalarKind::Int { .. })
    }
}
