//! Block terminators for [`Builder`].

use super::Builder;
use crate::ir::{BlockId, BranchKind, InstrId, ValueId};
use crate::SsaResult;

impl Builder<'_> {
    pub fn jump(&mut self, dest: BlockId) -> SsaResult<InstrId> {
        let label = self.ctx.label(dest);
        self.terminate(BranchKind::Jump, &[label])
    }

    pub fn cond_jump(&mut self, cond: ValueId, if_true: BlockId, if_false: BlockId) -> SsaResult<InstrId> {
        assert!(
            self.ctx.types.is_scalar(self.ctx.ty(cond)),
            "branch condition must be a scalar"
        );
        let t = self.ctx.label(if_true);
        let f = self.ctx.label(if_false);
        self.terminate(BranchKind::CondJump, &[cond, t, f])
    }

    /// Switch on `scrutinee`; cases are added with
    /// [`add_switch_case`](Self::add_switch_case).
    pub fn switch(&mut self, scrutinee: ValueId, default: BlockId) -> SsaResult<InstrId> {
        assert!(
            self.ctx.types.is_integer(self.ctx.ty(scrutinee)),
            "switch scrutinee must be an integer"
        );
        let default = self.ctx.label(default);
        self.terminate(BranchKind::Switch, &[scrutinee, default])
    }

    pub fn add_switch_case(&mut self, switch: InstrId, value: ValueId, dest: BlockId) {
        let data = self.ctx.instr(switch);
        let (scrutinee, _) = data
            .switch_head()
            .unwrap_or_else(|| panic!("{switch:?} is not a switch"));
        assert!(
            self.ctx.value(value).is_constant(),
            "switch case values must be constants"
        );
        assert_eq!(
            self.ctx.ty(value),
            self.ctx.ty(scrutinee),
            "switch case type differs from the scrutinee"
        );
        let label = self.ctx.label(dest);
        self.ctx.add_operand(switch, value);
        self.ctx.add_operand(switch, label);
    }

    pub fn ret(&mut self, value: Option<ValueId>) -> SsaResult<InstrId> {
        match value {
            Some(value) => self.terminate(BranchKind::Return, &[value]),
            None => self.terminate(BranchKind::Return, &[]),
        }
    }
}
