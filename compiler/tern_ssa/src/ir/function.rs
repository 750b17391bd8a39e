//! Functions.

use tern_tree::{DeclId, Name, TypeId};

use super::{BlockId, ValueId};

/// Arena entry for a function.
///
/// A function without blocks is a prototype: declared, callable, but
/// defined elsewhere.
#[derive(Clone, Debug)]
pub struct FunctionData {
    pub(crate) name: Name,
    pub(crate) decl: Option<DeclId>,
    pub(crate) ty: TypeId,
    pub(crate) value: ValueId,
    pub(crate) params: Vec<ValueId>,
    pub(crate) blocks: Vec<BlockId>,
}

impl FunctionData {
    #[inline]
    pub fn name(&self) -> Name {
        self.name
    }

    /// Declaration the function was lowered from.
    #[inline]
    pub fn decl(&self) -> Option<DeclId> {
        self.decl
    }

    /// The function type (not a pointer to it).
    #[inline]
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    /// Global value holding the function's address.
    #[inline]
    pub fn value(&self) -> ValueId {
        self.value
    }

    #[inline]
    pub fn params(&self) -> &[ValueId] {
        &self.params
    }

    /// Blocks in layout order; the first is the entry.
    #[inline]
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    #[inline]
    pub fn entry(&self) -> Option<BlockId> {
        self.blocks.first().copied()
    }

    #[inline]
    pub fn has_body(&self) -> bool {
        !self.blocks.is_empty()
    }
}
