//! Fixed-width numeric values.
//!
//! [`Scalar`] models a C arithmetic value exactly as the target machine would
//! hold it: integers carry their bit width and signedness and are always kept
//! truncated to that width, so wraparound falls out of every operation. Float
//! values keep their IEEE single/double representation.
//!
//! Arithmetic is not exposed through the `std::ops` traits. The `checked_*`
//! methods report division by zero, bad shifts and mismatched kinds as
//! [`EvalError`](crate::EvalError).

use std::fmt;

/// Shape of a [`Scalar`]: which representation and, for integers, which
/// width and signedness.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ScalarKind {
    Int { bits: u32, signed: bool },
    Single,
    Double,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::Int { bits, signed: true } => write!(f, "i{bits}"),
            ScalarKind::Int { bits, signed: false } => write!(f, "u{bits}"),
            ScalarKind::Single => f.write_str("f32"),
            ScalarKind::Double => f.write_str("f64"),
        }
    }
}

/// An integer of 1..=64 bits.
///
/// `raw` holds the value zero-extended from `bits`; the bits above `bits`
/// are always clear.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct IntScalar {
    raw: u64,
    bits: u32,
    signed: bool,
}

impl IntScalar {
    /// Create from the low `bits` bits of `value`.
    ///
    /// # Panics
    /// Panics if `bits` is 0 or greater than 64.
    pub fn new(value: u64, bits: u32, signed: bool) -> Self {
        assert!((1..=64).contains(&bits), "invalid integer width {bits}");
        IntScalar {
            raw: value & mask(bits),
            bits,
            signed,
        }
    }

    /// Create from a signed value, truncating to `bits`.
    #[expect(
        clippy::cast_sign_loss,
        reason = "two's complement reinterpretation is intended"
    )]
    pub fn from_i64(value: i64, bits: u32, signed: bool) -> Self {
        Self::new(value as u64, bits, signed)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.bits
    }

    #[inline]
    pub const fn is_signed(self) -> bool {
        self.signed
    }

    /// The value zero-extended to 64 bits.
    #[inline]
    pub const fn to_u64(self) -> u64 {
        self.raw
    }

    /// The value extended to 64 bits according to its signedness.
    #[expect(
        clippy::cast_possible_wrap,
        reason = "two's complement reinterpretation is intended"
    )]
    pub fn to_i64(self) -> i64 {
        if self.signed && self.bits < 64 {
            let shift = 64 - self.bits;
            ((self.raw << shift) as i64) >> shift
        } else {
            self.raw as i64
        }
    }

    /// Whether the value is negative under its own signedness.
    pub fn is_negative(self) -> bool {
        self.signed && (self.raw >> (self.bits - 1)) & 1 == 1
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.raw == 0
    }

    pub const fn kind(self) -> ScalarKind {
        ScalarKind::Int {
            bits: self.bits,
            signed: self.signed,
        }
    }

    /// Re-express with another width/signedness. Narrowing truncates,
    /// widening sign- or zero-extends according to the source signedness.
    #[expect(
        clippy::cast_sign_loss,
        reason = "two's complement reinterpretation is intended"
    )]
    pub fn resize(self, bits: u32, signed: bool) -> Self {
        let extended = if self.signed {
            self.to_i64() as u64
        } else {
            self.raw
        };
        Self::new(extended, bits, signed)
    }

    pub(crate) const fn with_raw(self, raw: u64) -> Self {
        IntScalar {
            raw: raw & mask(self.bits),
            bits: self.bits,
            signed: self.signed,
        }
    }
}

impl fmt::Debug for IntScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self, self.kind())
    }
}

impl fmt::Display for IntScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.signed {
            write!(f, "{}", self.to_i64())
        } else {
            write!(f, "{}", self.raw)
        }
    }
}

/// All-ones mask for the low `bits` bits.
pub(crate) const fn mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// A compile-time arithmetic value.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Scalar {
    Int(IntScalar),
    Single(f32),
    Double(f64),
}

impl Scalar {
    /// Integer from the low `bits` bits of `value`.
    pub fn int(value: u64, bits: u32, signed: bool) -> Self {
        Scalar::Int(IntScalar::new(value, bits, signed))
    }

    /// Integer from a signed value.
    pub fn from_i64(value: i64, bits: u32, signed: bool) -> Self {
        Scalar::Int(IntScalar::from_i64(value, bits, signed))
    }

    /// Zero of the given kind.
    pub fn zero(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Int { bits, signed } => Scalar::int(0, bits, signed),
            ScalarKind::Single => Scalar::Single(0.0),
            ScalarKind::Double => Scalar::Double(0.0),
        }
    }

    /// One of the given kind.
    pub fn one(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Int { bits, signed } => Scalar::int(1, bits, signed),
            ScalarKind::Single => Scalar::Single(1.0),
            ScalarKind::Double => Scalar::Double(1.0),
        }
    }

    /// A truth value as a C comparison produces it (0 or 1).
    pub fn from_bool(value: bool, bits: u32, signed: bool) -> Self {
        Scalar::int(u64::from(value), bits, signed)
    }

    pub const fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Int(i) => i.kind(),
            Scalar::Single(_) => ScalarKind::Single,
            Scalar::Double(_) => ScalarKind::Double,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Scalar::Int(i) => i.is_zero(),
            Scalar::Single(v) => *v == 0.0,
            Scalar::Double(v) => *v == 0.0,
        }
    }

    pub fn as_int(&self) -> Option<IntScalar> {
        match self {
            Scalar::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Sign-extended integer value, if this is an integer.
    pub fn to_i64(&self) -> Option<i64> {
        self.as_int().map(IntScalar::to_i64)
    }

    /// Zero-extended integer value, if this is an integer.
    pub fn to_u64(&self) -> Option<u64> {
        self.as_int().map(IntScalar::to_u64)
    }

    /// Value as `f64`, converting integers by their signedness.
    #[expect(
        clippy::cast_precision_loss,
        reason = "C integer-to-floating conversion rounds"
    )]
    pub fn to_f64(&self) -> f64 {
        match self {
            Scalar::Int(i) if i.is_signed() => i.to_i64() as f64,
            Scalar::Int(i) => i.to_u64() as f64,
            Scalar::Single(v) => f64::from(*v),
            Scalar::Double(v) => *v,
        }
    }

    /// Convert to another kind with C conversion semantics: integers truncate
    /// or extend, floats truncate toward zero when converted to integers
    /// (saturating out-of-range values), integers round to nearest when
    /// converted to floats.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "C conversion semantics are lossy by definition"
    )]
    pub fn convert(self, kind: ScalarKind) -> Scalar {
        match (self, kind) {
            (Scalar::Int(i), ScalarKind::Int { bits, signed }) => Scalar::Int(i.resize(bits, signed)),
            (Scalar::Single(_) | Scalar::Double(_), ScalarKind::Int { bits, signed }) => {
                let v = self.to_f64();
                if signed {
                    Scalar::from_i64(v as i64, bits, true)
                } else {
                    Scalar::int(v as u64, bits, false)
                }
            }
            (_, ScalarKind::Single) => Scalar::Single(self.to_f64() as f32),
            (_, ScalarKind::Double) => Scalar::Double(self.to_f64()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Single(v) => write!(f, "{v:?}"),
            Scalar::Double(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<IntScalar> for Scalar {
    fn from(value: IntScalar) -> Self {
        Scalar::Int(value)
    }
}
