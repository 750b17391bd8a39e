//! Basic blocks.

use super::{FuncId, InstrId, ValueId};

/// Arena entry for a basic block.
///
/// `instrs` holds the non-terminating instructions in order, phis first.
/// The terminator is kept apart so a block is "finished" exactly when it is
/// set.
#[derive(Clone, Debug)]
pub struct BlockData {
    pub(crate) label: ValueId,
    pub(crate) instrs: Vec<InstrId>,
    pub(crate) terminator: Option<InstrId>,
    pub(crate) function: Option<FuncId>,
}

impl BlockData {
    pub(crate) fn new(label: ValueId) -> Self {
        BlockData {
            label,
            instrs: Vec::new(),
            terminator: None,
            function: None,
        }
    }

    /// The label value branches use to name this block.
    #[inline]
    pub fn label(&self) -> ValueId {
        self.label
    }

    #[inline]
    pub fn instrs(&self) -> &[InstrId] {
        &self.instrs
    }

    #[inline]
    pub fn terminator(&self) -> Option<InstrId> {
        self.terminator
    }

    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.terminator.is_some()
    }

    /// Owning function; `None` until appended and after removal.
    #[inline]
    pub fn function(&self) -> Option<FuncId> {
        self.function
    }

    /// Instructions followed by the terminator, if any.
    pub fn all_instrs(&self) -> impl Iterator<Item = InstrId> + '_ {
        self.instrs.iter().copied().chain(self.terminator)
    }
}
