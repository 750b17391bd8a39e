//! String interner for identifiers and string literal contents.
//!
//! The tree and the SSA module refer to every identifier and every string
//! literal body through a [`Name`]. One interner lives per translation unit;
//! the SSA context takes a copy so its output is self-describing.

use rustc_hash::FxHashMap;

use crate::Name;

/// Single-threaded string interner.
///
/// Index 0 is always the empty string, so `Name::EMPTY` resolves without a
/// lookup.
#[derive(Clone, Debug)]
pub struct StringInterner {
    map: FxHashMap<Box<str>, Name>,
    strings: Vec<Box<str>>,
}

impl StringInterner {
    pub fn new() -> Self {
        let mut interner = StringInterner {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(64),
        };
        interner.strings.push("".into());
        interner.map.insert("".into(), Name::EMPTY);
        interner
    }

    /// Intern a string, returning its Name.
    ///
    /// # Panics
    /// Panics if more than `u32::MAX` distinct strings are interned.
    pub fn intern(&mut self, s: &str) -> Name {
        if let Some(&name) = self.map.get(s) {
            return name;
        }
        let raw = u32::try_from(self.strings.len())
            .unwrap_or_else(|_| panic!("interner exceeded {} strings", u32::MAX));
        let name = Name::from_raw(raw);
        self.strings.push(s.into());
        self.map.insert(s.into(), name);
        name
    }

    /// Look up a string without interning it.
    pub fn get(&self, s: &str) -> Option<Name> {
        self.map.get(s).copied()
    }

    /// Resolve a Name back to its string.
    ///
    /// # Panics
    /// Panics if `name` did not come from this interner.
    pub fn lookup(&self, name: Name) -> &str {
        &self.strings[name.index()]
    }

    /// Number of interned strings, including the empty string.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.len() <= 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}
