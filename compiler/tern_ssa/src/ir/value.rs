//! Values: everything an instruction operand can reference.

use tern_eval::Scalar;
use tern_tree::{DeclId, Name, TypeId};

use super::{BlockId, FuncId, InstrId};

/// A reference from an instruction operand slot to a value.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Use {
    pub instr: InstrId,
    pub slot: u32,
}

/// Module-level entity a [`ValueKind::Global`] points at.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct GlobalRef {
    pub decl: Option<DeclId>,
    pub name: Name,
    /// Set when the global is a function.
    pub function: Option<FuncId>,
}

/// What a value is.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ValueKind {
    /// The result of an instruction; a local SSA name.
    Result(InstrId),
    /// A compile-time number.
    Constant(Scalar),
    /// The label of a block. Branch targets and phi incoming edges refer to
    /// blocks through their labels.
    Label(BlockId),
    /// Address of a function or a module-level variable.
    Global(GlobalRef),
    /// Address of an interned string literal.
    StringRef(Name),
    /// A formal parameter of `func`.
    Param { func: FuncId, index: u32 },
    /// An unspecified value of its type.
    Undef,
}

/// Arena entry for a value.
#[derive(Clone, Debug)]
pub struct ValueData {
    pub(crate) kind: ValueKind,
    pub(crate) ty: TypeId,
    pub(crate) number: Option<u32>,
    pub(crate) uses: Vec<Use>,
}

impl ValueData {
    pub(crate) fn new(kind: ValueKind, ty: TypeId) -> Self {
        ValueData {
            kind,
            ty,
            number: None,
            uses: Vec::new(),
        }
    }

    #[inline]
    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    #[inline]
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    /// Dense id assigned by the renumbering pass; `None` before it runs and
    /// for values that are not numbered (constants, globals, strings).
    #[inline]
    pub fn number(&self) -> Option<u32> {
        self.number
    }

    /// Every operand slot currently holding this value.
    #[inline]
    pub fn uses(&self) -> &[Use] {
        &self.uses
    }

    #[inline]
    pub fn has_uses(&self) -> bool {
        !self.uses.is_empty()
    }

    pub fn as_constant(&self) -> Option<&Scalar> {
        match &self.kind {
            ValueKind::Constant(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_label(&self) -> Option<BlockId> {
        match self.kind {
            ValueKind::Label(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_global(&self) -> Option<&GlobalRef> {
        match &self.kind {
            ValueKind::Global(g) => Some(g),
            _ => None,
        }
    }

    /// The instruction producing this value, for instruction results.
    pub fn defining_instr(&self) -> Option<InstrId> {
        match self.kind {
            ValueKind::Result(i) => Some(i),
            _ => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.kind, ValueKind::Constant(_))
    }
}
