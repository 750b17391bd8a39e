//! Numeric evaluation for the tern middle end.
//!
//! - **[`Scalar`]**: a C arithmetic value with the width, signedness and
//!   representation of its type. Every operator returns an
//!   [`EvalResult`], so division by zero or an out-of-range shift is a value
//!   the caller inspects, never a panic.
//! - **[`ConstEvaluator`]**: folds tree expressions that the language
//!   requires to be constant (case labels, static initializers).
//!
//! Constant folding over SSA uses `Scalar` directly; it never needs the tree.

mod const_eval;
mod error;
mod ops;
mod scalar;

pub use const_eval::{convert_to_type, scalar_kind, ConstEvaluator};
pub use error::{EvalError, EvalResult};
pub use ops::BinOp;
pub use scalar::{IntScalar, Scalar, ScalarKind};
