//! Module: the named, ordered set of definitions produced for one
//! translation unit.

use rustc_hash::FxHashMap;
use tern_eval::Scalar;
use tern_tree::{Name, TypeId};

use super::{FuncId, ValueId};

#[derive(Clone, Debug, PartialEq)]
pub enum DefKind {
    Function(FuncId),
    Variable {
        ty: TypeId,
        /// Compile-time initializer; `None` means zero-initialized or
        /// initialized by something this layer cannot evaluate.
        init: Option<Scalar>,
        thread_local: bool,
    },
    /// An interned string literal; `Definition::name` holds its contents.
    String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Definition {
    pub name: Name,
    /// Global or string-reference value standing for the definition's
    /// address.
    pub value: ValueId,
    pub kind: DefKind,
}

impl Definition {
    pub fn as_function(&self) -> Option<FuncId> {
        match self.kind {
            DefKind::Function(f) => Some(f),
            _ => None,
        }
    }
}

/// Definitions in insertion order with lookup by name.
///
/// String literals are deduplicated by contents and live in their own
/// namespace, so a literal `"main"` never collides with function `main`.
#[derive(Clone, Debug, Default)]
pub struct Module {
    name: Name,
    defs: Vec<Definition>,
    by_name: FxHashMap<Name, usize>,
    strings: FxHashMap<Name, usize>,
    records: Vec<TypeId>,
}

impl Module {
    pub fn new(name: Name) -> Self {
        Module {
            name,
            ..Module::default()
        }
    }

    #[inline]
    pub fn name(&self) -> Name {
        self.name
    }

    /// All definitions in insertion order.
    #[inline]
    pub fn definitions(&self) -> &[Definition] {
        &self.defs
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Function or variable named `name`.
    pub fn lookup(&self, name: Name) -> Option<&Definition> {
        self.by_name.get(&name).map(|&i| &self.defs[i])
    }

    pub(crate) fn lookup_mut(&mut self, name: Name) -> Option<&mut Definition> {
        self.by_name.get(&name).map(|&i| &mut self.defs[i])
    }

    /// Function definition named `name`.
    pub fn function(&self, name: Name) -> Option<FuncId> {
        self.lookup(name).and_then(Definition::as_function)
    }

    /// Functions in insertion order, prototypes included.
    pub fn functions(&self) -> impl Iterator<Item = FuncId> + '_ {
        self.defs.iter().filter_map(Definition::as_function)
    }

    /// Add a named definition.
    ///
    /// # Panics
    ///
    /// Panics if a function or variable with the same name already exists.
    pub fn define(&mut self, def: Definition) {
        assert!(
            !matches!(def.kind, DefKind::String),
            "string literals are added with `define_string`"
        );
        let index = self.defs.len();
        let previous = self.by_name.insert(def.name, index);
        assert!(previous.is_none(), "duplicate definition of {:?}", def.name);
        self.defs.push(def);
    }

    /// The string definition with `contents`, if one was added.
    pub fn string(&self, contents: Name) -> Option<&Definition> {
        self.strings.get(&contents).map(|&i| &self.defs[i])
    }

    /// Add a string definition unless one with the same contents exists.
    pub(crate) fn define_string(&mut self, contents: Name, value: ValueId) {
        if self.strings.contains_key(&contents) {
            return;
        }
        self.strings.insert(contents, self.defs.len());
        self.defs.push(Definition {
            name: contents,
            value,
            kind: DefKind::String,
        });
    }

    /// Record and union types referenced by the translation unit, in first
    /// appearance order.
    pub fn record_types(&self) -> &[TypeId] {
        &self.records
    }

    pub(crate) fn add_record_type(&mut self, ty: TypeId) {
        if !self.records.contains(&ty) {
            self.records.push(ty);
        }
    }
}
