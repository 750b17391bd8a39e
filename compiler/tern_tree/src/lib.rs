//! Checked syntax tree consumed by the tern middle end.
//!
//! This crate is the boundary between the frontend (lexing, parsing,
//! semantic analysis) and SSA lowering. It holds:
//!
//! - **Names** ([`Name`], [`StringInterner`]) for identifiers and string
//!   literal contents
//! - **Types** ([`TypeId`], [`TypeKind`], [`TypePool`]) hash-consed so type
//!   equality is index equality
//! - **Target** ([`Target`]) sizes, alignments and record layout
//! - **Tree** ([`Expr`], [`Stmt`], [`Decl`] in a [`TreeArena`]) bundled per
//!   translation unit as a [`TreeModule`]
//!
//! Nothing in here validates its input; the frontend guarantees the tree is
//! well-typed before it reaches the middle end.

mod build;
mod id;
mod interner;
mod module;
mod name;
mod target;
mod tree;
mod types;

pub use interner::StringInterner;
pub use module::TreeModule;
pub use name::Name;
pub use target::{IntLayout, RecordLayout, Target};
pub use tree::{
    BinaryOp, Decl, DeclId, DeclKind, Expr, ExprId, ExprKind, Stmt, StmtId, StorageDuration,
    TreeArena, UnaryOp, ValueCategory,
};
pub use types::{Builtin, Field, RecordDef, RecordId, RecordKind, TypeId, TypeKind, TypePool};
