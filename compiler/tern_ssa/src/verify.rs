//! Structural checks over finished IR.
//!
//! The verifier does not fix anything. It reports the first violated
//! property of a function:
//! - every block is placed in the function and ends in a terminator
//! - operand slots and use-lists mirror each other exactly
//! - phis lead their block and have one incoming pair per predecessor
//! - every use of an instruction result is dominated by its definition
//! - binary operands and stored values have matching types
//!
//! Unreachable blocks are exempt from the dominance check; nothing
//! dominates them.

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::graph::DominatorTree;
use crate::ir::{BlockId, Context, FuncId, InstrId, InstrKind, Module, ValueId};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("{block:?} has no terminator")]
    Unterminated { block: BlockId },

    #[error("{block:?} is listed in {func:?} but not placed there")]
    MisplacedBlock { func: FuncId, block: BlockId },

    #[error("{instr:?} is listed in {block:?} but not placed there")]
    Detached { instr: InstrId, block: BlockId },

    #[error("{instr:?} slot {slot} holds {value:?}, which has no matching use")]
    UseListMismatch {
        value: ValueId,
        instr: InstrId,
        slot: u32,
    },

    #[error("{value:?} lists a use by {instr:?} slot {slot} that does not hold it")]
    StaleUse {
        value: ValueId,
        instr: InstrId,
        slot: u32,
    },

    #[error("phi {instr:?} follows a non-phi instruction in {block:?}")]
    MisplacedPhi { instr: InstrId, block: BlockId },

    #[error("phi {instr:?} has {incoming} incoming values for {preds} predecessors")]
    PhiArity {
        instr: InstrId,
        incoming: usize,
        preds: usize,
    },

    #[error("phi {instr:?} has an incoming edge from {block:?}, which is not a unique predecessor")]
    PhiIncomingMismatch { instr: InstrId, block: BlockId },

    #[error("{instr:?} uses {value:?}, whose definition does not dominate it")]
    UseNotDominated { instr: InstrId, value: ValueId },

    #[error("{instr:?} has operands of mismatched types")]
    OperandTypeMismatch { instr: InstrId },
}

/// Verify every function with a body in `module`.
pub fn verify_module(ctx: &Context, module: &Module) -> Result<(), VerifyError> {
    for func in module.functions() {
        if ctx.function(func).has_body() {
            verify_function(ctx, func)?;
        }
    }
    Ok(())
}

pub fn verify_function(ctx: &Context, func: FuncId) -> Result<(), VerifyError> {
    let blocks = ctx.function(func).blocks();
    for &block in blocks {
        check_layout(ctx, func, block)?;
    }
    for &block in blocks {
        for instr in ctx.block(block).all_instrs() {
            check_operand_uses(ctx, instr)?;
            check_types(ctx, instr)?;
        }
        check_value_uses(ctx, ctx.label(block))?;
    }
    for &param in ctx.function(func).params() {
        check_value_uses(ctx, param)?;
    }

    let dom = DominatorTree::build(ctx, func);
    for &block in blocks {
        check_phis(ctx, block)?;
        if dom.is_reachable(block) {
            check_dominance(ctx, &dom, block)?;
        }
    }
    Ok(())
}

fn check_layout(ctx: &Context, func: FuncId, block: BlockId) -> Result<(), VerifyError> {
    let data = ctx.block(block);
    if data.function() != Some(func) {
        return Err(VerifyError::MisplacedBlock { func, block });
    }
    if !data.is_terminated() {
        return Err(VerifyError::Unterminated { block });
    }
    let mut seen_non_phi = false;
    for instr in data.all_instrs() {
        let i = ctx.instr(instr);
        if i.block() != Some(block) {
            return Err(VerifyError::Detached { instr, block });
        }
        if i.is_phi() {
            if seen_non_phi {
                return Err(VerifyError::MisplacedPhi { instr, block });
            }
        } else {
            seen_non_phi = true;
        }
    }
    Ok(())
}

fn check_operand_uses(ctx: &Context, instr: InstrId) -> Result<(), VerifyError> {
    for (slot, &value) in ctx.instr(instr).operands().iter().enumerate() {
        let slot = u32::try_from(slot).unwrap_or(u32::MAX);
        let count = ctx
            .uses(value)
            .iter()
            .filter(|u| u.instr == instr && u.slot == slot)
            .count();
        if count != 1 {
            return Err(VerifyError::UseListMismatch { value, instr, slot });
        }
    }
    if let Some(result) = ctx.instr(instr).result() {
        check_value_uses(ctx, result)?;
    }
    Ok(())
}

fn check_value_uses(ctx: &Context, value: ValueId) -> Result<(), VerifyError> {
    for u in ctx.uses(value) {
        let user = ctx.instr(u.instr);
        let holds = user.operands().get(u.slot as usize) == Some(&value);
        if !holds || user.block().is_none() {
            return Err(VerifyError::StaleUse {
                value,
                instr: u.instr,
                slot: u.slot,
            });
        }
    }
    Ok(())
}

fn check_types(ctx: &Context, instr: InstrId) -> Result<(), VerifyError> {
    let data = ctx.instr(instr);
    let ok = match data.kind() {
        InstrKind::Binary(_) => {
            let (lhs, rhs) = (data.operand(0), data.operand(1));
            ctx.ty(lhs) == ctx.ty(rhs)
        }
        InstrKind::Store => {
            let (value, ptr) = (data.operand(0), data.operand(1));
            ctx.types.pointee(ctx.ty(ptr)) == Some(ctx.ty(value))
        }
        InstrKind::Phi => {
            let ty = data.result().map(|r| ctx.ty(r));
            data.phi_incoming()
                .into_iter()
                .flatten()
                .all(|(value, label)| {
                    Some(ctx.ty(value)) == ty && ctx.label_block(label).is_some()
                })
        }
        _ => true,
    };
    if ok {
        Ok(())
    } else {
        Err(VerifyError::OperandTypeMismatch { instr })
    }
}

fn check_phis(ctx: &Context, block: BlockId) -> Result<(), VerifyError> {
    let preds = ctx.predecessors(block);
    for &instr in ctx.block(block).instrs() {
        let data = ctx.instr(instr);
        let Some(incoming) = data.phi_incoming() else {
            break;
        };
        let mut seen = FxHashSet::default();
        let mut count = 0;
        for (_, label) in incoming {
            count += 1;
            let Some(from) = ctx.label_block(label) else {
                return Err(VerifyError::OperandTypeMismatch { instr });
            };
            if !preds.contains(&from) || !seen.insert(from) {
                return Err(VerifyError::PhiIncomingMismatch { instr, block: from });
            }
        }
        if count != preds.len() {
            return Err(VerifyError::PhiArity {
                instr,
                incoming: count,
                preds: preds.len(),
            });
        }
    }
    Ok(())
}

fn check_dominance(ctx: &Context, dom: &DominatorTree, block: BlockId) -> Result<(), VerifyError> {
    let order: Vec<InstrId> = ctx.block(block).all_instrs().collect();
    for (position, &instr) in order.iter().enumerate() {
        let data = ctx.instr(instr);
        if let Some(incoming) = data.phi_incoming() {
            // An incoming value must be available at the end of its edge.
            for (value, label) in incoming {
                let (Some(def), Some(pred)) = (ctx.def_block(value), ctx.label_block(label)) else {
                    continue;
                };
                if dom.is_reachable(pred) && !dom.dominates(def, pred) {
                    return Err(VerifyError::UseNotDominated { instr, value });
                }
            }
            continue;
        }
        for &value in data.operands() {
            let Some(def_instr) = ctx.def_instr(value) else {
                continue;
            };
            let Some(def) = ctx.instr(def_instr).block() else {
                return Err(VerifyError::UseNotDominated { instr, value });
            };
            let dominated = if def == block {
                order[..position].contains(&def_instr)
            } else {
                dom.dominates(def, block)
            };
            if !dominated {
                return Err(VerifyError::UseNotDominated { instr, value });
            }
        }
    }
    Ok(())
}
