//! Evaluation errors.

use thiserror::Error;

use crate::ScalarKind;

pub type EvalResult<T> = Result<T, EvalError>;

/// Why an operation on [`Scalar`](crate::Scalar)s produced no value.
///
/// None of these are fatal: constant folding leaves the operation in place
/// and lets it fail (or trap) at run time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("shift amount {amount} out of range for a {bits}-bit operand")]
    InvalidShift { amount: i64, bits: u32 },

    #[error("operands have mismatched kinds: {lhs} and {rhs}")]
    KindMismatch { lhs: ScalarKind, rhs: ScalarKind },

    #[error("operator `{op}` is not defined for {kind}")]
    UnsupportedOperation { op: &'static str, kind: ScalarKind },

    #[error("comparison involving NaN is unordered")]
    Unordered,

    #[error("expression is not a compile-time constant")]
    NotConstant,
}
