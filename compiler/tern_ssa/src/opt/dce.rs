//! Dead-code elimination.
//!
//! Three rewrites, repeated until none applies:
//! 1. A conditional jump on a constant becomes a jump to the chosen target;
//!    a switch on a constant becomes a jump to the matching case or the
//!    default.
//! 2. Blocks not reachable from the entry are removed. Phis in surviving
//!    blocks lose their incoming pairs for removed edges first.
//! 3. Phis left with a single incoming value are replaced by it.
//!
//! The entry block is always reachable and is never removed.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use super::{strip_phi_incoming, Pass, PassError, PassResult};
use crate::graph::reachable;
use crate::ir::{BlockId, BranchKind, Context, FuncId, InstrId, InstrKind, ValueId};
use crate::SsaResult;

pub struct DeadCodeElimination;

impl Pass for DeadCodeElimination {
    fn name(&self) -> &'static str {
        "dead_code_elimination"
    }

    fn run_on_function(&self, ctx: &mut Context, func: FuncId) -> Result<PassResult, PassError> {
        let stats = eliminate(ctx, func)?;
        tracing::debug!(
            function = ctx.names.lookup(ctx.function(func).name()),
            branches_folded = stats.branches,
            blocks_removed = stats.blocks,
            phis_collapsed = stats.phis,
            "dead code eliminated"
        );
        Ok(PassResult::changed(stats.branches + stats.blocks + stats.phis))
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct DceStats {
    pub branches: usize,
    pub blocks: usize,
    pub phis: usize,
}

pub(crate) fn eliminate(ctx: &mut Context, func: FuncId) -> SsaResult<DceStats> {
    let mut stats = DceStats::default();
    loop {
        let branches = fold_branches(ctx, func)?;
        let blocks = prune_unreachable(ctx, func)?;
        let phis = collapse_phis(ctx, func)?;
        if branches + blocks + phis == 0 {
            return Ok(stats);
        }
        stats.branches += branches;
        stats.blocks += blocks;
        stats.phis += phis;
    }
}

// ── Branch folding ──────────────────────────────────────────────────

/// Replace constant conditional jumps and switches with plain jumps.
pub(crate) fn fold_branches(ctx: &mut Context, func: FuncId) -> SsaResult<usize> {
    let mut folded = 0;
    let blocks = ctx.function(func).blocks().to_vec();
    for block in blocks {
        let Some(term) = ctx.block(block).terminator() else {
            continue;
        };
        let Some(taken) = constant_target(ctx, term) else {
            continue;
        };
        let before = ctx.successors(block);
        replace_terminator(ctx, block, term, taken)?;
        let after = ctx.successors(block);
        for dropped in before.into_iter().filter(|b| !after.contains(b)) {
            strip_phi_incoming(ctx, dropped, block);
        }
        tracing::trace!(?block, ?taken, "folded constant branch");
        folded += 1;
    }
    Ok(folded)
}

/// Label statically taken by a conditional jump or switch on a constant.
fn constant_target(ctx: &Context, term: InstrId) -> Option<ValueId> {
    let data = ctx.instr(term);
    match data.branch_kind()? {
        BranchKind::CondJump => {
            let (cond, if_true, if_false) = data.cond_jump_parts()?;
            let cond = ctx.as_constant(cond)?;
            Some(if cond.is_zero() { if_false } else { if_true })
        }
        BranchKind::Switch => {
            let (scrutinee, default) = data.switch_head()?;
            let scrutinee = ctx.as_constant(scrutinee)?.as_int()?;
            let taken = data
                .switch_cases()?
                .find(|&(case, _)| {
                    ctx.as_constant(case)
                        .and_then(|c| c.as_int())
                        .is_some_and(|c| c.to_u64() == scrutinee.to_u64())
                })
                .map_or(default, |(_, dest)| dest);
            Some(taken)
        }
        BranchKind::Jump | BranchKind::Return => None,
    }
}

fn replace_terminator(ctx: &mut Context, block: BlockId, old: InstrId, dest: ValueId) -> SsaResult<()> {
    let jump = ctx.new_instr(InstrKind::Branch(BranchKind::Jump), None, &[dest])?;
    ctx.remove_instr(old);
    ctx.set_terminator(block, jump);
    Ok(())
}

// ── Unreachable blocks ──────────────────────────────────────────────

/// Remove every block the entry cannot reach; returns how many.
pub(crate) fn prune_unreachable(ctx: &mut Context, func: FuncId) -> SsaResult<usize> {
    let live = reachable(ctx, func);
    let dead: Vec<BlockId> = ctx
        .function(func)
        .blocks()
        .iter()
        .copied()
        .filter(|b| !live.contains(b))
        .collect();
    if dead.is_empty() {
        return Ok(0);
    }
    let doomed: FxHashSet<BlockId> = dead.iter().copied().collect();

    for &block in &dead {
        let succs: SmallVec<[BlockId; 4]> = ctx.successors(block);
        for succ in succs.into_iter().filter(|s| !doomed.contains(s)) {
            strip_phi_incoming(ctx, succ, block);
        }
    }
    for &block in &dead {
        ctx.clear_block_operands(block);
    }
    // Results of dead blocks can only reach live code through edges that no
    // longer exist; anything left over reads an unspecified value.
    for &block in &dead {
        let results: Vec<ValueId> = ctx
            .block(block)
            .all_instrs()
            .filter_map(|i| ctx.instr(i).result())
            .filter(|&r| ctx.value(r).has_uses())
            .collect();
        for result in results {
            let undef = ctx.undef(ctx.ty(result))?;
            ctx.replace_all_uses(result, undef);
        }
    }
    for &block in &dead {
        ctx.remove_block(block);
    }
    tracing::trace!(removed = dead.len(), "pruned unreachable blocks");
    Ok(dead.len())
}

// ── Phi cleanup ─────────────────────────────────────────────────────

/// Replace phis with exactly one incoming value by that value.
pub(crate) fn collapse_phis(ctx: &mut Context, func: FuncId) -> SsaResult<usize> {
    let mut collapsed = 0;
    let blocks = ctx.function(func).blocks().to_vec();
    for block in blocks {
        let phis: Vec<InstrId> = ctx
            .block(block)
            .instrs()
            .iter()
            .copied()
            .take_while(|&i| ctx.instr(i).is_phi())
            .collect();
        for phi in phis {
            let operands = ctx.instr(phi).operands().to_vec();
            let Some(result) = ctx.instr(phi).result() else {
                continue;
            };
            let replacement = match operands.len() {
                2 if operands[0] != result => operands[0],
                0 => ctx.undef(ctx.ty(result))?,
                _ => continue,
            };
            ctx.replace_all_uses(result, replacement);
            ctx.remove_instr(phi);
            collapsed += 1;
        }
    }
    Ok(collapsed)
}
