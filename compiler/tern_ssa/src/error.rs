//! Construction-time failures.
//!
//! The only recoverable failures in this crate come from allocating IR
//! nodes. Structural misuse (type-mismatched operands, removing a value that
//! still has uses, asking a branch for operands it does not have) is a bug
//! in the caller and panics instead.

use thiserror::Error;

/// An IR node could not be allocated.
///
/// Lowering stops at the first such error and returns it; whatever was
/// already added to the module stays there.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum SsaError {
    /// The context reached its configured node limit.
    #[error("IR arena exhausted while allocating {what}: limit of {limit} nodes reached")]
    ArenaExhausted { what: &'static str, limit: usize },

    /// The allocator refused to grow an arena.
    #[error("out of memory while allocating {what}")]
    OutOfMemory { what: &'static str },
}

pub type SsaResult<T> = Result<T, SsaError>;
