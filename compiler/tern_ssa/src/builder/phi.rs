//! Phi nodes for [`Builder`].

use tern_tree::TypeId;

use super::Builder;
use crate::ir::{BlockId, Context, InstrId, InstrKind, ValueId};
use crate::SsaResult;

impl Builder<'_> {
    /// Empty phi of type `ty` at the front of the current block.
    pub fn phi(&mut self, ty: TypeId) -> SsaResult<InstrId> {
        let block = self.current();
        let phi = self.ctx.new_instr(InstrKind::Phi, Some(ty), &[])?;
        self.ctx.insert_phi(block, phi);
        Ok(phi)
    }

    /// Add the incoming `value` for the edge from `pred`.
    pub fn add_phi_incoming(&mut self, phi: InstrId, value: ValueId, pred: BlockId) {
        add_phi_incoming(self.ctx, phi, value, pred);
    }
}

/// Add the incoming `value` for the edge from `pred` to `phi`.
pub(crate) fn add_phi_incoming(ctx: &mut Context, phi: InstrId, value: ValueId, pred: BlockId) {
    assert!(ctx.instr(phi).is_phi(), "{phi:?} is not a phi");
    let result = ctx
        .instr(phi)
        .result()
        .unwrap_or_else(|| panic!("phi without result"));
    assert_eq!(
        ctx.ty(value),
        ctx.ty(result),
        "phi incoming type differs from the phi"
    );
    let label = ctx.label(pred);
    ctx.add_operand(phi, value);
    ctx.add_operand(phi, label);
}
