//! Type pool: hash-consed C types referenced by [`TypeId`].
//!
//! Built-in types have fixed indices so the middle end can name them without
//! a pool lookup. Derived types (pointers, arrays, functions) are interned on
//! demand, so two structurally equal types always share one [`TypeId`] and
//! type equality is an index comparison. Records are nominal: each
//! declaration gets its own [`RecordId`].
//!
//! Qualifiers are not represented. The frontend strips them before handing
//! the tree over; they carry no meaning for lowering.

use std::fmt;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::Name;

// ── Handles ─────────────────────────────────────────────────────────

/// A 32-bit index into the [`TypePool`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    // === Built-in types (indices 0-14) ===
    // Pre-interned at pool creation, in `Builtin::ALL` order.

    pub const VOID: Self = Self(0);
    pub const BOOL: Self = Self(1);
    /// Plain `char`. Signed on every supported target.
    pub const CHAR: Self = Self(2);
    pub const SCHAR: Self = Self(3);
    pub const UCHAR: Self = Self(4);
    pub const SHORT: Self = Self(5);
    pub const USHORT: Self = Self(6);
    pub const INT: Self = Self(7);
    pub const UINT: Self = Self(8);
    pub const LONG: Self = Self(9);
    pub const ULONG: Self = Self(10);
    pub const LLONG: Self = Self(11);
    pub const ULLONG: Self = Self(12);
    pub const FLOAT: Self = Self(13);
    pub const DOUBLE: Self = Self(14);

    /// Number of pre-interned built-in types.
    pub const BUILTIN_COUNT: u32 = 15;

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The built-in this id names, if it is one of the fixed indices.
    #[inline]
    pub fn builtin(self) -> Option<Builtin> {
        Builtin::ALL.get(self.index()).copied()
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.builtin() {
            Some(b) => write!(f, "TypeId({})", b.name()),
            None => write!(f, "TypeId({})", self.0),
        }
    }
}

/// Index of a record (struct/union) declaration in the pool.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct RecordId(u32);

impl RecordId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

// ── Kinds ───────────────────────────────────────────────────────────

/// C built-in types.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Builtin {
    Void,
    Bool,
    Char,
    SChar,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LLong,
    ULLong,
    Float,
    Double,
}

impl Builtin {
    /// All built-ins, in [`TypeId`] index order.
    pub const ALL: [Builtin; 15] = [
        Builtin::Void,
        Builtin::Bool,
        Builtin::Char,
        Builtin::SChar,
        Builtin::UChar,
        Builtin::Short,
        Builtin::UShort,
        Builtin::Int,
        Builtin::UInt,
        Builtin::Long,
        Builtin::ULong,
        Builtin::LLong,
        Builtin::ULLong,
        Builtin::Float,
        Builtin::Double,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Builtin::Void => "void",
            Builtin::Bool => "_Bool",
            Builtin::Char => "char",
            Builtin::SChar => "signed char",
            Builtin::UChar => "unsigned char",
            Builtin::Short => "short",
            Builtin::UShort => "unsigned short",
            Builtin::Int => "int",
            Builtin::UInt => "unsigned int",
            Builtin::Long => "long",
            Builtin::ULong => "unsigned long",
            Builtin::LLong => "long long",
            Builtin::ULLong => "unsigned long long",
            Builtin::Float => "float",
            Builtin::Double => "double",
        }
    }

    pub const fn is_integer(self) -> bool {
        !matches!(self, Builtin::Void | Builtin::Float | Builtin::Double)
    }

    pub const fn is_floating(self) -> bool {
        matches!(self, Builtin::Float | Builtin::Double)
    }

    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            Builtin::Char
                | Builtin::SChar
                | Builtin::Short
                | Builtin::Int
                | Builtin::Long
                | Builtin::LLong
                | Builtin::Float
                | Builtin::Double
        )
    }

    /// The [`TypeId`] pre-interned for this built-in.
    pub const fn id(self) -> TypeId {
        TypeId::from_raw(self as u32)
    }
}

/// Struct or union.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum RecordKind {
    Struct,
    Union,
}

/// The structure of a type.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum TypeKind {
    Builtin(Builtin),
    Pointer(TypeId),
    /// `len == None` for arrays of unknown bound (`int a[]`).
    Array { elem: TypeId, len: Option<u64> },
    Function {
        ret: TypeId,
        params: SmallVec<[TypeId; 4]>,
        variadic: bool,
    },
    Record(RecordId),
    /// Enumerations are integers of their underlying type.
    Enum { name: Name, underlying: TypeId },
}

/// A named member of a record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Field {
    pub name: Name,
    pub ty: TypeId,
}

/// A struct/union declaration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordDef {
    pub name: Name,
    pub kind: RecordKind,
    pub fields: Vec<Field>,
    /// False until the definition (with its field list) has been seen.
    pub complete: bool,
}

impl RecordDef {
    /// Position of the field named `name`.
    pub fn field_index(&self, name: Name) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

// ── Pool ────────────────────────────────────────────────────────────

/// Hash-consing type pool.
#[derive(Clone, Debug)]
pub struct TypePool {
    kinds: Vec<TypeKind>,
    dedup: FxHashMap<TypeKind, TypeId>,
    records: Vec<RecordDef>,
}

impl TypePool {
    pub fn new() -> Self {
        let mut pool = TypePool {
            kinds: Vec::with_capacity(64),
            dedup: FxHashMap::default(),
            records: Vec::new(),
        };
        for builtin in Builtin::ALL {
            pool.intern(TypeKind::Builtin(builtin));
        }
        debug_assert_eq!(pool.kinds.len(), TypeId::BUILTIN_COUNT as usize);
        pool
    }

    /// Intern a type structure, returning the canonical id.
    ///
    /// # Panics
    /// Panics if the pool exceeds `u32::MAX` types.
    pub fn intern(&mut self, kind: TypeKind) -> TypeId {
        if let Some(&id) = self.dedup.get(&kind) {
            return id;
        }
        let raw = u32::try_from(self.kinds.len())
            .unwrap_or_else(|_| panic!("type pool exceeded {} types", u32::MAX));
        let id = TypeId::from_raw(raw);
        self.kinds.push(kind.clone());
        self.dedup.insert(kind, id);
        id
    }

    pub fn pointer_to(&mut self, pointee: TypeId) -> TypeId {
        self.intern(TypeKind::Pointer(pointee))
    }

    pub fn array_of(&mut self, elem: TypeId, len: Option<u64>) -> TypeId {
        self.intern(TypeKind::Array { elem, len })
    }

    pub fn function(&mut self, ret: TypeId, params: &[TypeId], variadic: bool) -> TypeId {
        self.intern(TypeKind::Function {
            ret,
            params: params.iter().copied().collect(),
            variadic,
        })
    }

    pub fn enumeration(&mut self, name: Name, underlying: TypeId) -> TypeId {
        self.intern(TypeKind::Enum { name, underlying })
    }

    /// Declare a (possibly incomplete) record. Every call creates a new
    /// nominal type.
    pub fn declare_record(&mut self, name: Name, kind: RecordKind) -> (RecordId, TypeId) {
        let raw = u32::try_from(self.records.len())
            .unwrap_or_else(|_| panic!("type pool exceeded {} records", u32::MAX));
        let id = RecordId::from_raw(raw);
        self.records.push(RecordDef {
            name,
            kind,
            fields: Vec::new(),
            complete: false,
        });
        (id, self.intern(TypeKind::Record(id)))
    }

    /// Complete a record with its field list.
    pub fn define_record(&mut self, record: RecordId, fields: Vec<Field>) {
        let def = &mut self.records[record.index()];
        debug_assert!(!def.complete, "record {} defined twice", record.raw());
        def.fields = fields;
        def.complete = true;
    }

    #[inline]
    pub fn kind(&self, ty: TypeId) -> &TypeKind {
        &self.kinds[ty.index()]
    }

    #[inline]
    pub fn record(&self, record: RecordId) -> &RecordDef {
        &self.records[record.index()]
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    // ── Classification ──────────────────────────────────────────

    pub fn is_void(&self, ty: TypeId) -> bool {
        ty == TypeId::VOID
    }

    pub fn is_integer(&self, ty: TypeId) -> bool {
        match self.kind(ty) {
            TypeKind::Builtin(b) => b.is_integer(),
            TypeKind::Enum { .. } => true,
            _ => false,
        }
    }

    pub fn is_floating(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Builtin(b) if b.is_floating())
    }

    /// Signedness of an arithmetic type. Pointers count as unsigned.
    pub fn is_signed(&self, ty: TypeId) -> bool {
        match self.kind(ty) {
            TypeKind::Builtin(b) => b.is_signed(),
            TypeKind::Enum { underlying, .. } => self.is_signed(*underlying),
            _ => false,
        }
    }

    pub fn is_arithmetic(&self, ty: TypeId) -> bool {
        self.is_integer(ty) || self.is_floating(ty)
    }

    pub fn is_pointer(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Pointer(_))
    }

    /// Pointer to something other than a function.
    pub fn is_object_pointer(&self, ty: TypeId) -> bool {
        match self.kind(ty) {
            TypeKind::Pointer(p) => !self.is_function(*p),
            _ => false,
        }
    }

    pub fn is_scalar(&self, ty: TypeId) -> bool {
        self.is_arithmetic(ty) || self.is_pointer(ty)
    }

    pub fn is_array(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Array { .. })
    }

    pub fn is_function(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Function { .. })
    }

    pub fn is_record(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Record(_))
    }

    // ── Projections ─────────────────────────────────────────────

    pub fn pointee(&self, ty: TypeId) -> Option<TypeId> {
        match self.kind(ty) {
            TypeKind::Pointer(p) => Some(*p),
            _ => None,
        }
    }

    pub fn array_elem(&self, ty: TypeId) -> Option<TypeId> {
        match self.kind(ty) {
            TypeKind::Array { elem, .. } => Some(*elem),
            _ => None,
        }
    }

    pub fn record_of(&self, ty: TypeId) -> Option<RecordId> {
        match self.kind(ty) {
            TypeKind::Record(r) => Some(*r),
            _ => None,
        }
    }

    /// Return type of a function type, or of a pointer to one.
    pub fn return_type(&self, ty: TypeId) -> Option<TypeId> {
        match self.kind(ty) {
            TypeKind::Function { ret, .. } => Some(*ret),
            TypeKind::Pointer(p) => match self.kind(*p) {
                TypeKind::Function { ret, .. } => Some(*ret),
                _ => None,
            },
            _ => None,
        }
    }

    /// Parameter types of a function type.
    pub fn params(&self, ty: TypeId) -> &[TypeId] {
        match self.kind(ty) {
            TypeKind::Function { params, .. } => params,
            _ => &[],
        }
    }
}

impl Default for TypePool {
    fn default() -> Self {
        Self::new()
    }
}
