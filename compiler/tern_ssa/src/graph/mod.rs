//! CFG analysis shared by the passes and the verifier.
//!
//! Edges are derived from the IR, never stored: successors come from
//! terminator label operands, predecessors from label use-lists (see
//! [`Context::successors`] and [`Context::predecessors`]). The functions
//! here only add traversal orders and dominance on top.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::ir::{BlockId, Context, FuncId};

/// Blocks reachable from the entry in postorder.
///
/// Iterative DFS with an explicit stack, so deep CFGs cannot overflow the
/// native stack.
pub fn postorder(ctx: &Context, func: FuncId) -> Vec<BlockId> {
    let Some(entry) = ctx.function(func).entry() else {
        return Vec::new();
    };
    let mut visited = FxHashSet::default();
    let mut order = Vec::with_capacity(ctx.function(func).blocks().len());

    // (block, successors pushed)
    let mut stack: Vec<(BlockId, bool)> = vec![(entry, false)];
    while let Some(&mut (block, ref mut expanded)) = stack.last_mut() {
        if *expanded {
            order.push(block);
            stack.pop();
            continue;
        }
        *expanded = true;
        if !visited.insert(block) {
            stack.pop();
            continue;
        }
        // Reverse so the first successor is visited first.
        for succ in ctx.successors(block).into_iter().rev() {
            if !visited.contains(&succ) {
                stack.push((succ, false));
            }
        }
    }
    order
}

pub fn reverse_postorder(ctx: &Context, func: FuncId) -> Vec<BlockId> {
    let mut order = postorder(ctx, func);
    order.reverse();
    order
}

/// Set of blocks reachable from the entry.
pub fn reachable(ctx: &Context, func: FuncId) -> FxHashSet<BlockId> {
    postorder(ctx, func).into_iter().collect()
}

/// Dominator tree of the reachable part of a function.
///
/// Cooper, Harvey and Kennedy, "A Simple, Fast Dominance Algorithm" (2001):
/// iterate `idom` to a fixpoint over reverse postorder, intersecting the
/// dominators of processed predecessors. Unreachable blocks have no
/// dominator and dominate nothing but themselves.
pub struct DominatorTree {
    /// Reachable blocks in reverse postorder; positions are dense indices.
    rpo: Vec<BlockId>,
    index: FxHashMap<BlockId, usize>,
    /// Immediate dominator by index; the entry maps to itself.
    idom: Vec<usize>,
    children: Vec<SmallVec<[usize; 4]>>,
}

impl DominatorTree {
    pub fn build(ctx: &Context, func: FuncId) -> Self {
        let rpo = reverse_postorder(ctx, func);
        let index: FxHashMap<BlockId, usize> =
            rpo.iter().enumerate().map(|(i, &b)| (b, i)).collect();
        let n = rpo.len();
        if n == 0 {
            return DominatorTree {
                rpo,
                index,
                idom: Vec::new(),
                children: Vec::new(),
            };
        }

        let preds: Vec<SmallVec<[usize; 4]>> = rpo
            .iter()
            .map(|&b| {
                ctx.predecessors(b)
                    .into_iter()
                    .filter_map(|p| index.get(&p).copied())
                    .collect()
            })
            .collect();

        let mut idom: Vec<Option<usize>> = vec![None; n];
        idom[0] = Some(0);
        let mut changed = true;
        while changed {
            changed = false;
            for b in 1..n {
                let mut new_idom = None;
                for &p in &preds[b] {
                    if idom[p].is_none() {
                        continue;
                    }
                    new_idom = Some(match new_idom {
                        None => p,
                        Some(current) => intersect(p, current, &idom),
                    });
                }
                if new_idom.is_some() && idom[b] != new_idom {
                    idom[b] = new_idom;
                    changed = true;
                }
            }
        }

        // Every block in `rpo` is reachable, so each got a dominator.
        let idom: Vec<usize> = idom.into_iter().map(|d| d.unwrap_or(0)).collect();
        let mut children: Vec<SmallVec<[usize; 4]>> = vec![SmallVec::new(); n];
        for (b, &d) in idom.iter().enumerate().skip(1) {
            children[d].push(b);
        }

        DominatorTree {
            rpo,
            index,
            idom,
            children,
        }
    }

    pub fn is_reachable(&self, block: BlockId) -> bool {
        self.index.contains_key(&block)
    }

    /// Immediate dominator; `None` for the entry and unreachable blocks.
    pub fn idom(&self, block: BlockId) -> Option<BlockId> {
        let &i = self.index.get(&block)?;
        (i != 0).then(|| self.rpo[self.idom[i]])
    }

    /// Does `a` dominate `b`? Every block dominates itself.
    pub fn dominates(&self, a: BlockId, b: BlockId) -> bool {
        if a == b {
            return true;
        }
        let (Some(&a), Some(&b)) = (self.index.get(&a), self.index.get(&b)) else {
            return false;
        };
        let mut current = b;
        // Dominators precede their subtrees in reverse postorder.
        while current > a {
            current = self.idom[current];
        }
        current == a
    }

    /// Blocks immediately dominated by `block`.
    pub fn children(&self, block: BlockId) -> impl Iterator<Item = BlockId> + '_ {
        let kids: &[usize] = match self.index.get(&block) {
            Some(&i) => &self.children[i],
            None => &[],
        };
        kids.iter().map(|&c| self.rpo[c])
    }

    /// Reachable blocks, dominators before the blocks they dominate.
    pub fn preorder(&self) -> Vec<BlockId> {
        let mut out = Vec::with_capacity(self.rpo.len());
        if self.rpo.is_empty() {
            return out;
        }
        let mut stack = vec![0usize];
        while let Some(i) = stack.pop() {
            out.push(self.rpo[i]);
            for &c in self.children[i].iter().rev() {
                stack.push(c);
            }
        }
        out
    }

    /// Dominance frontier of every reachable block.
    ///
    /// For each join point `b`, walk up from each predecessor until reaching
    /// `idom(b)`; every block passed has `b` in its frontier.
    pub fn frontiers(&self, ctx: &Context) -> FxHashMap<BlockId, SmallVec<[BlockId; 4]>> {
        let mut df: FxHashMap<BlockId, SmallVec<[BlockId; 4]>> = FxHashMap::default();
        for (b, &block) in self.rpo.iter().enumerate() {
            let preds: SmallVec<[usize; 4]> = ctx
                .predecessors(block)
                .into_iter()
                .filter_map(|p| self.index.get(&p).copied())
                .collect();
            if preds.len() < 2 {
                continue;
            }
            for p in preds {
                let mut runner = p;
                while runner != self.idom[b] {
                    let entry = df.entry(self.rpo[runner]).or_default();
                    if !entry.contains(&block) {
                        entry.push(block);
                    }
                    if runner == 0 {
                        break;
                    }
                    runner = self.idom[runner];
                }
            }
        }
        df
    }
}

/// CHK intersect: walk both fingers up until they meet. Lower reverse
/// postorder index means closer to the entry.
fn intersect(mut a: usize, mut b: usize, idom: &[Option<usize>]) -> usize {
    while a != b {
        while a > b {
            let Some(next) = idom[a] else {
                debug_assert!(false, "intersect: broken idom chain at {a}");
                return b;
            };
            a = next;
        }
        while b > a {
            let Some(next) = idom[b] else {
                debug_assert!(false, "intersect: broken idom chain at {b}");
                return a;
            };
            b = next;
        }
    }
    a
}
