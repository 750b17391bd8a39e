//! Lexical definitions stack: where each local declaration lives.

use rustc_hash::FxHashMap;
use tern_tree::DeclId;

use crate::ir::ValueId;

/// Maps block-scope declarations to the value holding their address,
/// innermost scope last.
pub(super) struct DefinitionStack {
    scopes: Vec<FxHashMap<DeclId, ValueId>>,
}

impl DefinitionStack {
    pub(super) fn new() -> Self {
        DefinitionStack { scopes: Vec::new() }
    }

    pub(super) fn push(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub(super) fn pop(&mut self) {
        let popped = self.scopes.pop();
        debug_assert!(popped.is_some(), "popped an empty definitions stack");
    }

    pub(super) fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Bind `decl` in the innermost scope.
    pub(super) fn define(&mut self, decl: DeclId, value: ValueId) {
        let scope = self
            .scopes
            .last_mut()
            .unwrap_or_else(|| panic!("definition outside of any scope"));
        let previous = scope.insert(decl, value);
        assert!(previous.is_none(), "{decl:?} defined twice in one scope");
    }

    pub(super) fn lookup(&self, decl: DeclId) -> Option<ValueId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(&decl).copied())
    }

    pub(super) fn clear(&mut self) {
        self.scopes.clear();
    }
}
