//! Target description: sizes and alignments of built-in and derived types.
//!
//! Lowering asks the target how large a stack slot must be, what `sizeof`
//! evaluates to, and at which byte offset a record member lives. Constant
//! folding asks it for the bit width of an integer type so wraparound matches
//! the machine.

use crate::{Builtin, RecordId, RecordKind, TypeId, TypeKind, TypePool};

/// Width and signedness of an integer type on a target.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct IntLayout {
    pub bits: u32,
    pub signed: bool,
}

/// Size, alignment and member offsets of a record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordLayout {
    pub size: u64,
    pub align: u64,
    pub offsets: Vec<u64>,
}

/// Machine description handed over by the driver.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Target {
    pub name: &'static str,
    pub pointer_size: u64,
    pub pointer_align: u64,
    /// `(size, align)` per built-in, indexed like [`Builtin::ALL`].
    builtins: [(u64, u64); 15],
    /// Type of `sizeof` expressions and pointer-sized indices.
    pub size_type: TypeId,
    /// Type of the difference of two pointers.
    pub ptrdiff_type: TypeId,
}

impl Target {
    /// 64-bit Unix-like target: `long` and pointers are 8 bytes.
    pub fn lp64() -> Self {
        Target {
            name: "lp64",
            pointer_size: 8,
            pointer_align: 8,
            builtins: [
                (1, 1), // void
                (1, 1), // _Bool
                (1, 1), // char
                (1, 1), // signed char
                (1, 1), // unsigned char
                (2, 2), // short
                (2, 2), // unsigned short
                (4, 4), // int
                (4, 4), // unsigned int
                (8, 8), // long
                (8, 8), // unsigned long
                (8, 8), // long long
                (8, 8), // unsigned long long
                (4, 4), // float
                (8, 8), // double
            ],
            size_type: TypeId::ULONG,
            ptrdiff_type: TypeId::LONG,
        }
    }

    /// 32-bit target: `int`, `long` and pointers are 4 bytes.
    pub fn ilp32() -> Self {
        Target {
            name: "ilp32",
            pointer_size: 4,
            pointer_align: 4,
            builtins: [
                (1, 1),
                (1, 1),
                (1, 1),
                (1, 1),
                (1, 1),
                (2, 2),
                (2, 2),
                (4, 4),
                (4, 4),
                (4, 4),
                (4, 4),
                (8, 4),
                (8, 4),
                (4, 4),
                (8, 4),
            ],
            size_type: TypeId::UINT,
            ptrdiff_type: TypeId::INT,
        }
    }

    fn builtin(&self, b: Builtin) -> (u64, u64) {
        self.builtins[b.id().index()]
    }

    /// `sizeof(ty)` in bytes.
    ///
    /// Functions and `void` have size 1 (the GNU convention used for pointer
    /// arithmetic). Arrays of unknown bound have size 0.
    pub fn size_of(&self, pool: &TypePool, ty: TypeId) -> u64 {
        match pool.kind(ty) {
            TypeKind::Builtin(b) => self.builtin(*b).0,
            TypeKind::Pointer(_) => self.pointer_size,
            TypeKind::Array { elem, len } => {
                len.map_or(0, |n| n.saturating_mul(self.size_of(pool, *elem)))
            }
            TypeKind::Function { .. } => 1,
            TypeKind::Record(r) => self.record_layout(pool, *r).size,
            TypeKind::Enum { underlying, .. } => self.size_of(pool, *underlying),
        }
    }

    /// `_Alignof(ty)` in bytes.
    pub fn align_of(&self, pool: &TypePool, ty: TypeId) -> u64 {
        match pool.kind(ty) {
            TypeKind::Builtin(b) => self.builtin(*b).1,
            TypeKind::Pointer(_) => self.pointer_align,
            TypeKind::Array { elem, .. } => self.align_of(pool, *elem),
            TypeKind::Function { .. } => 1,
            TypeKind::Record(r) => self.record_layout(pool, *r).align,
            TypeKind::Enum { underlying, .. } => self.align_of(pool, *underlying),
        }
    }

    /// Lay out a record: members in declaration order, each at the next
    /// offset aligned to its own alignment (all at 0 for unions), total size
    /// rounded up to the record's alignment.
    pub fn record_layout(&self, pool: &TypePool, record: RecordId) -> RecordLayout {
        let def = pool.record(record);
        let mut offsets = Vec::with_capacity(def.fields.len());
        let mut size = 0u64;
        let mut align = 1u64;
        for field in &def.fields {
            let field_size = self.size_of(pool, field.ty);
            let field_align = self.align_of(pool, field.ty).max(1);
            align = align.max(field_align);
            match def.kind {
                RecordKind::Struct => {
                    let offset = round_up(size, field_align);
                    offsets.push(offset);
                    size = offset + field_size;
                }
                RecordKind::Union => {
                    offsets.push(0);
                    size = size.max(field_size);
                }
            }
        }
        RecordLayout {
            size: round_up(size, align),
            align,
            offsets,
        }
    }

    /// Byte offset of field `index` within `record`.
    pub fn field_offset(&self, pool: &TypePool, record: RecordId, index: usize) -> u64 {
        self.record_layout(pool, record).offsets[index]
    }

    /// Bit width and signedness of an integer (or enum) type.
    ///
    /// Returns `None` for non-integer types.
    pub fn int_layout(&self, pool: &TypePool, ty: TypeId) -> Option<IntLayout> {
        if !pool.is_integer(ty) {
            return None;
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "built-in integer sizes are at most 8 bytes"
        )]
        let bits = (self.size_of(pool, ty) * 8) as u32;
        Some(IntLayout {
            bits,
            signed: pool.is_signed(ty),
        })
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::lp64()
    }
}

fn round_up(value: u64, align: u64) -> u64 {
    value.div_ceil(align) * align
}
