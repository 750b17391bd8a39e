//! Constant folding.
//!
//! A binary instruction with two constant operands, or a cast of a
//! constant, is evaluated with [`Scalar`] arithmetic at the width and
//! signedness of its type. The result is materialized as a new constant,
//! every use is redirected to it, and the instruction is removed. Folding
//! repeats until nothing changes, so chains collapse completely.
//!
//! Evaluation failures (division by zero, oversized shifts, unordered float
//! comparisons) leave the instruction alone. Pointer casts are never folded.

use std::cmp::Ordering;

use tern_eval::{convert_to_type, BinOp, Scalar};

use super::{Pass, PassError, PassResult};
use crate::ir::{BinaryOp, Context, FuncId, InstrId, InstrKind};
use crate::SsaResult;

pub struct ConstantFolding;

impl Pass for ConstantFolding {
    fn name(&self) -> &'static str {
        "constant_folding"
    }

    fn run_on_function(&self, ctx: &mut Context, func: FuncId) -> Result<PassResult, PassError> {
        let folded = fold_function(ctx, func)?;
        tracing::debug!(
            function = ctx.names.lookup(ctx.function(func).name()),
            folded,
            "constant folding"
        );
        Ok(PassResult::changed(folded))
    }
}

/// Fold to a fixpoint; returns the number of instructions removed.
pub(crate) fn fold_function(ctx: &mut Context, func: FuncId) -> SsaResult<usize> {
    let mut folded = 0;
    loop {
        let mut round = 0;
        let blocks = ctx.function(func).blocks().to_vec();
        for block in blocks {
            let instrs = ctx.block(block).instrs().to_vec();
            for instr in instrs {
                let Some(value) = evaluate(ctx, instr) else {
                    continue;
                };
                let Some(result) = ctx.instr(instr).result() else {
                    continue;
                };
                let ty = ctx.ty(result);
                let constant = ctx.constant_of(value, ty)?;
                tracing::trace!(?instr, %value, "folded");
                ctx.replace_all_uses(result, constant);
                ctx.remove_instr(instr);
                round += 1;
            }
        }
        if round == 0 {
            return Ok(folded);
        }
        folded += round;
    }
}

/// The constant `instr` computes, if its operands are all constants and the
/// evaluation succeeds.
fn evaluate(ctx: &Context, instr: InstrId) -> Option<Scalar> {
    let data = ctx.instr(instr);
    match data.kind() {
        InstrKind::Binary(op) => {
            let (lhs, rhs) = data.binary_operands()?;
            let lhs = ctx.as_constant(lhs)?;
            let rhs = ctx.as_constant(rhs)?;
            if op.is_comparison() {
                let ordering = lhs.compare(&rhs).ok()?;
                return Some(Scalar::from_bool(holds(op, ordering), 32, true));
            }
            lhs.binary(arith_op(op)?, rhs).ok()
        }
        InstrKind::Cast => {
            let operand = data.operand(0);
            let result = data.result()?;
            let (from, to) = (ctx.ty(operand), ctx.ty(result));
            if ctx.types.is_pointer(from) || ctx.types.is_pointer(to) {
                return None;
            }
            let value = ctx.as_constant(operand)?;
            convert_to_type(&ctx.types, &ctx.target, value, to)
        }
        _ => None,
    }
}

/// Whether comparison `op` holds for a three-way result.
fn holds(op: BinaryOp, ordering: Ordering) -> bool {
    match op {
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Ge => ordering != Ordering::Less,
        BinaryOp::Eq => ordering == Ordering::Equal,
        BinaryOp::Ne => ordering != Ordering::Equal,
        _ => false,
    }
}

fn arith_op(op: BinaryOp) -> Option<BinOp> {
    Some(match op {
        BinaryOp::Add => BinOp::Add,
        BinaryOp::Sub => BinOp::Sub,
        BinaryOp::Mul => BinOp::Mul,
        BinaryOp::Div => BinOp::Div,
        BinaryOp::Rem => BinOp::Rem,
        BinaryOp::Shl => BinOp::Shl,
        BinaryOp::Shr => BinOp::Shr,
        BinaryOp::And => BinOp::And,
        BinaryOp::Or => BinOp::Or,
        BinaryOp::Xor => BinOp::Xor,
        _ => return None,
    })
}
