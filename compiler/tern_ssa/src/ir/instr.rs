//! Instructions and terminators.
//!
//! An instruction is a kind tag plus an ordered operand list. Operand layouts
//! are fixed per kind:
//!
//! | kind       | operands                                   |
//! |------------|--------------------------------------------|
//! | `Alloca`   | (none)                                     |
//! | `Load`     | `ptr`                                      |
//! | `Store`    | `value, ptr`                               |
//! | `Cast`     | `operand`                                  |
//! | `Binary`   | `lhs, rhs`                                 |
//! | `Call`     | `callee, args...`                          |
//! | `Address`  | `ptr, index, offset`                       |
//! | `Phi`      | `(value, label)...`                        |
//! | `AtomicRmw`| `ptr, value`                               |
//! | `Fence`    | (none)                                     |
//! | `CmpXchg`  | `ptr, expected, desired`                   |
//! | `Jump`     | `dest`                                     |
//! | `CondJump` | `cond, if_true, if_false`                  |
//! | `Switch`   | `scrutinee, default, (case, dest)...`      |
//! | `Return`   | `value?`                                   |
//!
//! Branch destinations are ordinary label operands, so replacing a label
//! retargets every branch and phi edge that names it.

use smallvec::SmallVec;
use tern_tree::TypeId;

use super::{BlockId, ValueId};

/// Arithmetic, bitwise and comparison opcodes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    And,
    Or,
    Xor,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

impl BinaryOp {
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
        )
    }

    pub const fn is_bitwise(self) -> bool {
        matches!(
            self,
            BinaryOp::Shl | BinaryOp::Shr | BinaryOp::And | BinaryOp::Or | BinaryOp::Xor
        )
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Rem => "rem",
            BinaryOp::Shl => "shl",
            BinaryOp::Shr => "shr",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
            BinaryOp::Lt => "lt",
            BinaryOp::Gt => "gt",
            BinaryOp::Le => "le",
            BinaryOp::Ge => "ge",
            BinaryOp::Eq => "eq",
            BinaryOp::Ne => "ne",
        }
    }
}

/// Memory ordering of atomic operations.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MemoryOrder {
    Relaxed,
    Acquire,
    Release,
    AcqRel,
    SeqCst,
}

/// Read-modify-write operation of an atomic instruction.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum AtomicOp {
    Add,
    Xchg,
}

/// Control-flow transfer ending a block.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BranchKind {
    Jump,
    CondJump,
    Switch,
    Return,
}

/// Operand count class of an instruction kind.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Arity {
    Nullary,
    Unary,
    Binary,
    Ternary,
    /// Growable operand list.
    Variadic,
}

impl Arity {
    /// Exact operand count, for fixed arities.
    pub const fn fixed(self) -> Option<usize> {
        match self {
            Arity::Nullary => Some(0),
            Arity::Unary => Some(1),
            Arity::Binary => Some(2),
            Arity::Ternary => Some(3),
            Arity::Variadic => None,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum InstrKind {
    Alloca { allocated: TypeId },
    Load,
    Store,
    Cast,
    Binary(BinaryOp),
    Call,
    Address,
    Phi,
    AtomicRmw { op: AtomicOp, ordering: MemoryOrder },
    Fence { ordering: MemoryOrder },
    CmpXchg { success: MemoryOrder, failure: MemoryOrder },
    Branch(BranchKind),
}

impl InstrKind {
    pub const fn arity(self) -> Arity {
        match self {
            InstrKind::Alloca { .. } | InstrKind::Fence { .. } => Arity::Nullary,
            InstrKind::Load | InstrKind::Cast | InstrKind::Branch(BranchKind::Jump) => Arity::Unary,
            InstrKind::Store | InstrKind::Binary(_) | InstrKind::AtomicRmw { .. } => Arity::Binary,
            InstrKind::Address
            | InstrKind::CmpXchg { .. }
            | InstrKind::Branch(BranchKind::CondJump) => Arity::Ternary,
            InstrKind::Call
            | InstrKind::Phi
            | InstrKind::Branch(BranchKind::Switch | BranchKind::Return) => Arity::Variadic,
        }
    }

    pub const fn is_terminator(self) -> bool {
        matches!(self, InstrKind::Branch(_))
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            InstrKind::Alloca { .. } => "alloca",
            InstrKind::Load => "load",
            InstrKind::Store => "store",
            InstrKind::Cast => "cast",
            InstrKind::Binary(op) => op.mnemonic(),
            InstrKind::Call => "call",
            InstrKind::Address => "getaddr",
            InstrKind::Phi => "phi",
            InstrKind::AtomicRmw { .. } => "atomicrmw",
            InstrKind::Fence { .. } => "fence",
            InstrKind::CmpXchg { .. } => "cmpxchg",
            InstrKind::Branch(BranchKind::Jump) => "jmp",
            InstrKind::Branch(BranchKind::CondJump) => "br",
            InstrKind::Branch(BranchKind::Switch) => "switch",
            InstrKind::Branch(BranchKind::Return) => "ret",
        }
    }
}

/// Arena entry for an instruction.
#[derive(Clone, Debug)]
pub struct InstrData {
    pub(crate) kind: InstrKind,
    pub(crate) operands: SmallVec<[ValueId; 3]>,
    pub(crate) result: Option<ValueId>,
    pub(crate) block: Option<BlockId>,
}

impl InstrData {
    #[inline]
    pub fn kind(&self) -> InstrKind {
        self.kind
    }

    #[inline]
    pub fn operands(&self) -> &[ValueId] {
        &self.operands
    }

    #[inline]
    pub fn operand(&self, slot: usize) -> ValueId {
        self.operands[slot]
    }

    #[inline]
    pub fn result(&self) -> Option<ValueId> {
        self.result
    }

    /// Containing block; `None` once the instruction has been removed.
    #[inline]
    pub fn block(&self) -> Option<BlockId> {
        self.block
    }

    #[inline]
    pub fn is_terminator(&self) -> bool {
        self.kind.is_terminator()
    }

    pub fn is_phi(&self) -> bool {
        self.kind == InstrKind::Phi
    }

    pub fn binary_op(&self) -> Option<BinaryOp> {
        match self.kind {
            InstrKind::Binary(op) => Some(op),
            _ => None,
        }
    }

    /// `(lhs, rhs)` of a binary instruction.
    pub fn binary_operands(&self) -> Option<(ValueId, ValueId)> {
        match self.kind {
            InstrKind::Binary(_) => Some((self.operands[0], self.operands[1])),
            _ => None,
        }
    }

    pub fn branch_kind(&self) -> Option<BranchKind> {
        match self.kind {
            InstrKind::Branch(k) => Some(k),
            _ => None,
        }
    }

    /// `(cond, if_true, if_false)` of a conditional jump.
    pub fn cond_jump_parts(&self) -> Option<(ValueId, ValueId, ValueId)> {
        match self.kind {
            InstrKind::Branch(BranchKind::CondJump) => {
                Some((self.operands[0], self.operands[1], self.operands[2]))
            }
            _ => None,
        }
    }

    /// Destination label of an unconditional jump.
    pub fn jump_dest(&self) -> Option<ValueId> {
        match self.kind {
            InstrKind::Branch(BranchKind::Jump) => Some(self.operands[0]),
            _ => None,
        }
    }

    /// `(scrutinee, default)` of a switch.
    pub fn switch_head(&self) -> Option<(ValueId, ValueId)> {
        match self.kind {
            InstrKind::Branch(BranchKind::Switch) => Some((self.operands[0], self.operands[1])),
            _ => None,
        }
    }

    /// `(case value, dest label)` pairs of a switch.
    pub fn switch_cases(&self) -> Option<impl Iterator<Item = (ValueId, ValueId)> + '_> {
        match self.kind {
            InstrKind::Branch(BranchKind::Switch) => Some(
                self.operands[2..]
                    .chunks_exact(2)
                    .map(|pair| (pair[0], pair[1])),
            ),
            _ => None,
        }
    }

    /// Returned value, `Some(None)` for `ret void`.
    pub fn return_value(&self) -> Option<Option<ValueId>> {
        match self.kind {
            InstrKind::Branch(BranchKind::Return) => Some(self.operands.first().copied()),
            _ => None,
        }
    }

    /// `(value, label)` incoming pairs of a phi.
    pub fn phi_incoming(&self) -> Option<impl Iterator<Item = (ValueId, ValueId)> + '_> {
        match self.kind {
            InstrKind::Phi => Some(self.operands.chunks_exact(2).map(|pair| (pair[0], pair[1]))),
            _ => None,
        }
    }

    /// `(ptr)` of a load.
    pub fn load_ptr(&self) -> Option<ValueId> {
        match self.kind {
            InstrKind::Load => Some(self.operands[0]),
            _ => None,
        }
    }

    /// `(value, ptr)` of a store.
    pub fn store_parts(&self) -> Option<(ValueId, ValueId)> {
        match self.kind {
            InstrKind::Store => Some((self.operands[0], self.operands[1])),
            _ => None,
        }
    }

    /// Callee and arguments of a call.
    pub fn call_parts(&self) -> Option<(ValueId, &[ValueId])> {
        match self.kind {
            InstrKind::Call => Some((self.operands[0], &self.operands[1..])),
            _ => None,
        }
    }
}
