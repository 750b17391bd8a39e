//! Stack slot promotion.
//!
//! Lowering gives every local variable an `alloca` and reads and writes it
//! through loads and stores. This pass turns each slot whose address never
//! escapes into SSA values:
//!
//! 1. **Select** allocas of scalar type whose every use is the pointer
//!    operand of a load or a store.
//! 2. **Place phis** at the iterated dominance frontier of the blocks that
//!    store to the slot (Cytron et al., 1991).
//! 3. **Rename** by walking the dominator tree with one stack of reaching
//!    definitions per slot: a store pushes its value, a load is replaced
//!    by the top of the stack, and each successor's phis receive the top as
//!    the incoming value for this edge. A load with no reaching store reads
//!    `undef`.
//! 4. **Prune** phis that merge a single value and phis nothing live reads.

use rustc_hash::{FxHashMap, FxHashSet};
use tern_tree::TypeId;

use super::{Pass, PassError, PassResult};
use crate::builder::add_phi_incoming;
use crate::graph::DominatorTree;
use crate::ir::{BlockId, Context, FuncId, InstrId, InstrKind, ValueId};
use crate::SsaResult;

pub struct PromoteAllocas;

impl Pass for PromoteAllocas {
    fn name(&self) -> &'static str {
        "promote_allocas"
    }

    fn run_on_function(&self, ctx: &mut Context, func: FuncId) -> Result<PassResult, PassError> {
        let stats = promote(ctx, func)?;
        tracing::debug!(
            function = ctx.names.lookup(ctx.function(func).name()),
            promoted = stats.slots,
            phis_inserted = stats.phis,
            "promoted stack slots"
        );
        Ok(PassResult::changed(stats.slots))
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct PromoteStats {
    pub slots: usize,
    /// Phis left after pruning.
    pub phis: usize,
}

/// A slot chosen for promotion.
struct Slot {
    alloca: InstrId,
    ptr: ValueId,
    ty: TypeId,
    /// Lazily created `undef` for reads with no reaching store.
    undef: Option<ValueId>,
}

pub(crate) fn promote(ctx: &mut Context, func: FuncId) -> SsaResult<PromoteStats> {
    let mut slots = select_slots(ctx, func);
    if slots.is_empty() {
        return Ok(PromoteStats::default());
    }
    let by_ptr: FxHashMap<ValueId, usize> =
        slots.iter().enumerate().map(|(i, s)| (s.ptr, i)).collect();

    let dom = DominatorTree::build(ctx, func);
    drop_unreachable_accesses(ctx, func, &dom, &mut slots)?;
    let phi_slot = place_phis(ctx, &dom, &slots)?;
    rename(ctx, &dom, &mut slots, &by_ptr, &phi_slot)?;

    for slot in &slots {
        ctx.remove_instr(slot.alloca);
    }
    let inserted: Vec<InstrId> = phi_slot.keys().copied().collect();
    let phis = prune_phis(ctx, &inserted)?;
    Ok(PromoteStats {
        slots: slots.len(),
        phis,
    })
}

// ── Selection ───────────────────────────────────────────────────────

fn select_slots(ctx: &Context, func: FuncId) -> Vec<Slot> {
    let mut slots = Vec::new();
    for &block in ctx.function(func).blocks() {
        for &instr in ctx.block(block).instrs() {
            let InstrKind::Alloca { allocated } = ctx.instr(instr).kind() else {
                continue;
            };
            let Some(ptr) = ctx.instr(instr).result() else {
                continue;
            };
            if !ctx.types.is_scalar(allocated) {
                continue;
            }
            let promotable = ctx.uses(ptr).iter().all(|u| {
                matches!(
                    (ctx.instr(u.instr).kind(), u.slot),
                    (InstrKind::Load, 0) | (InstrKind::Store, 1)
                )
            });
            if promotable {
                slots.push(Slot {
                    alloca: instr,
                    ptr,
                    ty: allocated,
                    undef: None,
                });
            }
        }
    }
    slots
}

fn undef_for(ctx: &mut Context, slot: &mut Slot) -> SsaResult<ValueId> {
    if let Some(undef) = slot.undef {
        return Ok(undef);
    }
    let undef = ctx.undef(slot.ty)?;
    slot.undef = Some(undef);
    Ok(undef)
}

/// Loads and stores in unreachable blocks are never visited by the rename
/// walk; resolve them up front.
fn drop_unreachable_accesses(
    ctx: &mut Context,
    func: FuncId,
    dom: &DominatorTree,
    slots: &mut [Slot],
) -> SsaResult<()> {
    let dead: FxHashSet<BlockId> = ctx
        .function(func)
        .blocks()
        .iter()
        .copied()
        .filter(|&b| !dom.is_reachable(b))
        .collect();
    if dead.is_empty() {
        return Ok(());
    }
    for slot in slots.iter_mut() {
        let users: Vec<InstrId> = ctx
            .uses(slot.ptr)
            .iter()
            .map(|u| u.instr)
            .filter(|&i| ctx.instr(i).block().is_some_and(|b| dead.contains(&b)))
            .collect();
        for user in users {
            if let Some(result) = ctx.instr(user).result() {
                let undef = undef_for(ctx, slot)?;
                ctx.replace_all_uses(result, undef);
            }
            ctx.remove_instr(user);
        }
    }
    Ok(())
}

// ── Phi placement ───────────────────────────────────────────────────

/// Insert empty phis at the iterated dominance frontier of each slot's
/// store blocks. Returns the slot index of every inserted phi.
fn place_phis(ctx: &mut Context, dom: &DominatorTree, slots: &[Slot]) -> SsaResult<FxHashMap<InstrId, usize>> {
    let frontiers = dom.frontiers(ctx);
    let mut phi_slot = FxHashMap::default();

    for (index, slot) in slots.iter().enumerate() {
        let mut worklist: Vec<BlockId> = ctx
            .uses(slot.ptr)
            .iter()
            .filter(|u| ctx.instr(u.instr).kind() == InstrKind::Store)
            .filter_map(|u| ctx.instr(u.instr).block())
            .collect();
        let mut queued: FxHashSet<BlockId> = worklist.iter().copied().collect();
        let mut has_phi: FxHashSet<BlockId> = FxHashSet::default();

        while let Some(block) = worklist.pop() {
            let Some(frontier) = frontiers.get(&block) else {
                continue;
            };
            for &join in frontier {
                if !has_phi.insert(join) {
                    continue;
                }
                let phi = ctx.new_instr(InstrKind::Phi, Some(slot.ty), &[])?;
                ctx.insert_phi(join, phi);
                phi_slot.insert(phi, index);
                if queued.insert(join) {
                    worklist.push(join);
                }
            }
        }
    }
    Ok(phi_slot)
}

// ── Renaming ────────────────────────────────────────────────────────

enum Visit {
    Enter(BlockId),
    /// Pop the definitions pushed while visiting a block.
    Exit(Vec<usize>),
}

fn rename(
    ctx: &mut Context,
    dom: &DominatorTree,
    slots: &mut [Slot],
    by_ptr: &FxHashMap<ValueId, usize>,
    phi_slot: &FxHashMap<InstrId, usize>,
) -> SsaResult<()> {
    let mut defs: Vec<Vec<ValueId>> = vec![Vec::new(); slots.len()];
    let Some(&entry) = dom.preorder().first() else {
        return Ok(());
    };
    let mut stack = vec![Visit::Enter(entry)];

    while let Some(visit) = stack.pop() {
        let block = match visit {
            Visit::Exit(pushed) => {
                for slot in pushed {
                    defs[slot].pop();
                }
                continue;
            }
            Visit::Enter(block) => block,
        };
        let mut pushed = Vec::new();

        let instrs = ctx.block(block).instrs().to_vec();
        for instr in instrs {
            if let Some(&slot) = phi_slot.get(&instr) {
                if let Some(result) = ctx.instr(instr).result() {
                    defs[slot].push(result);
                    pushed.push(slot);
                }
                continue;
            }
            match ctx.instr(instr).kind() {
                InstrKind::Load => {
                    let Some(&slot) = by_ptr.get(&ctx.instr(instr).operand(0)) else {
                        continue;
                    };
                    let value = match defs[slot].last() {
                        Some(&v) => v,
                        None => undef_for(ctx, &mut slots[slot])?,
                    };
                    if let Some(result) = ctx.instr(instr).result() {
                        ctx.replace_all_uses(result, value);
                    }
                    ctx.remove_instr(instr);
                }
                InstrKind::Store => {
                    let Some(&slot) = by_ptr.get(&ctx.instr(instr).operand(1)) else {
                        continue;
                    };
                    defs[slot].push(ctx.instr(instr).operand(0));
                    pushed.push(slot);
                    ctx.remove_instr(instr);
                }
                _ => {}
            }
        }

        for succ in ctx.successors(block) {
            let phis: Vec<(InstrId, usize)> = ctx
                .block(succ)
                .instrs()
                .iter()
                .filter_map(|i| phi_slot.get(i).map(|&s| (*i, s)))
                .collect();
            for (phi, slot) in phis {
                let value = match defs[slot].last() {
                    Some(&v) => v,
                    None => undef_for(ctx, &mut slots[slot])?,
                };
                add_phi_incoming(ctx, phi, value, block);
            }
        }

        stack.push(Visit::Exit(pushed));
        let children: Vec<BlockId> = dom.children(block).collect();
        for child in children.into_iter().rev() {
            stack.push(Visit::Enter(child));
        }
    }

    // Edges from unreachable predecessors still need an incoming pair.
    for (&phi, &slot) in phi_slot {
        let Some(block) = ctx.instr(phi).block() else {
            continue;
        };
        let dead_preds: Vec<BlockId> = ctx
            .predecessors(block)
            .into_iter()
            .filter(|&p| !dom.is_reachable(p))
            .collect();
        for pred in dead_preds {
            let undef = undef_for(ctx, &mut slots[slot])?;
            add_phi_incoming(ctx, phi, undef, pred);
        }
    }
    Ok(())
}

// ── Pruning ─────────────────────────────────────────────────────────

/// Remove trivial and unused phis among `inserted`; returns how many are
/// left.
fn prune_phis(ctx: &mut Context, inserted: &[InstrId]) -> SsaResult<usize> {
    let mut alive: FxHashSet<InstrId> = inserted.iter().copied().collect();

    // A phi whose incoming values are all one value `v` (or itself) is `v`.
    let mut changed = true;
    while changed {
        changed = false;
        let current: Vec<InstrId> = alive.iter().copied().collect();
        for phi in current {
            let Some(result) = ctx.instr(phi).result() else {
                continue;
            };
            let mut unique = None;
            let mut trivial = true;
            for (value, _) in ctx.instr(phi).phi_incoming().into_iter().flatten() {
                if value == result || Some(value) == unique {
                    continue;
                }
                if unique.is_some() {
                    trivial = false;
                    break;
                }
                unique = Some(value);
            }
            if !trivial {
                continue;
            }
            let replacement = match unique {
                Some(v) => v,
                None => ctx.undef(ctx.ty(result))?,
            };
            ctx.replace_all_uses(result, replacement);
            ctx.remove_instr(phi);
            alive.remove(&phi);
            changed = true;
        }
    }

    // Mark phis reachable from a non-phi use (or a phi outside this set),
    // then sweep the rest.
    let mut live: FxHashSet<InstrId> = FxHashSet::default();
    let mut worklist: Vec<InstrId> = alive
        .iter()
        .copied()
        .filter(|&phi| {
            ctx.instr(phi).result().is_some_and(|r| {
                ctx.uses(r)
                    .iter()
                    .any(|u| !alive.contains(&u.instr))
            })
        })
        .collect();
    while let Some(phi) = worklist.pop() {
        if !live.insert(phi) {
            continue;
        }
        for (value, _) in ctx.instr(phi).phi_incoming().into_iter().flatten() {
            if let Some(def) = ctx.def_instr(value) {
                if alive.contains(&def) && !live.contains(&def) {
                    worklist.push(def);
                }
            }
        }
    }
    let dead: Vec<InstrId> = alive.iter().copied().filter(|p| !live.contains(p)).collect();
    for &phi in &dead {
        let len = ctx.instr(phi).operands().len();
        ctx.remove_operands(phi, 0..len);
    }
    for &phi in &dead {
        ctx.remove_instr(phi);
    }
    Ok(live.len())
}

#[cfg(test)]
mod tests;
