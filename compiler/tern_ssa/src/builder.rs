//! Typed instruction construction.
//!
//! [`Builder`] wraps a [`Context`] and a current block. Each method checks
//! operand types, creates the instruction, appends it to the current block
//! and returns the result value. Type mismatches are bugs in the caller and
//! panic.
//!
//! Emitting a terminator ends the current block: the builder is left
//! without a position until [`Builder::position_at_end`] is called again.

mod arithmetic;
mod atomics;
mod calls;
mod comparisons;
mod constants;
mod control_flow;
mod conversions;
mod memory;
mod phi;

use tern_tree::TypeId;

use crate::ir::{BlockId, BranchKind, Context, InstrId, InstrKind, ValueId};
use crate::SsaResult;

pub(crate) use phi::add_phi_incoming;

pub struct Builder<'ctx> {
    ctx: &'ctx mut Context,
    block: Option<BlockId>,
}

impl<'ctx> Builder<'ctx> {
    pub fn new(ctx: &'ctx mut Context) -> Self {
        Builder { ctx, block: None }
    }

    #[inline]
    pub fn ctx(&self) -> &Context {
        self.ctx
    }

    #[inline]
    pub fn ctx_mut(&mut self) -> &mut Context {
        self.ctx
    }

    // ── Positioning ─────────────────────────────────────────────

    /// Emit subsequent instructions at the end of `block`.
    pub fn position_at_end(&mut self, block: BlockId) {
        debug_assert!(
            !self.ctx.block(block).is_terminated(),
            "{block:?} is already terminated"
        );
        self.block = Some(block);
    }

    /// Current block; `None` after a terminator until repositioned.
    #[inline]
    pub fn block(&self) -> Option<BlockId> {
        self.block
    }

    pub fn clear_position(&mut self) {
        self.block = None;
    }

    fn current(&self) -> BlockId {
        self.block
            .unwrap_or_else(|| panic!("builder has no current block"))
    }

    fn emit(&mut self, kind: InstrKind, result: Option<TypeId>, operands: &[ValueId]) -> SsaResult<InstrId> {
        let block = self.current();
        let instr = self.ctx.new_instr(kind, result, operands)?;
        self.ctx.append_instr(block, instr);
        Ok(instr)
    }

    fn emit_value(&mut self, kind: InstrKind, ty: TypeId, operands: &[ValueId]) -> SsaResult<ValueId> {
        let instr = self.emit(kind, Some(ty), operands)?;
        Ok(self
            .ctx
            .instr(instr)
            .result()
            .unwrap_or_else(|| panic!("`{}` of type {ty:?} has no result", kind.mnemonic())))
    }

    fn terminate(&mut self, kind: BranchKind, operands: &[ValueId]) -> SsaResult<InstrId> {
        let block = self.current();
        let instr = self.ctx.new_instr(InstrKind::Branch(kind), None, operands)?;
        self.ctx.set_terminator(block, instr);
        self.block = None;
        Ok(instr)
    }
}
