//! Translation-unit container handed from the frontend to the middle end.

use crate::{DeclId, Name, StringInterner, Target, TreeArena, TypePool};

/// A checked translation unit.
///
/// `decls` lists the file-scope declarations in source order. Block-scope
/// declarations are reachable only through the statements that declare them.
#[derive(Clone, Debug)]
pub struct TreeModule {
    pub name: Name,
    pub names: StringInterner,
    pub types: TypePool,
    pub target: Target,
    pub arena: TreeArena,
    pub decls: Vec<DeclId>,
}

impl TreeModule {
    pub fn new(name: &str, target: Target) -> Self {
        let mut names = StringInterner::new();
        let name = names.intern(name);
        TreeModule {
            name,
            names,
            types: TypePool::new(),
            target,
            arena: TreeArena::new(),
            decls: Vec::new(),
        }
    }

    /// Register a file-scope declaration.
    pub fn add_global(&mut self, decl: DeclId) {
        self.decls.push(decl);
    }
}
