//! Typed syntax tree.
//!
//! The frontend hands the middle end a fully checked tree: every expression
//! carries its resolved type and value category, implicit conversions are
//! explicit [`ExprKind::Cast`] nodes, and every identifier has been bound to
//! its declaration. Nodes live in a flat [`TreeArena`] and refer to each
//! other by index.
//!
//! # Value categories
//!
//! [`ValueCategory::LValue`] marks an expression whose *location* is consumed
//! by its parent: the left side of an assignment, the operand of `&`, `++`
//! and `--`, the base of `.`, and an array operand that decays to a pointer.
//! Every other use is [`ValueCategory::RValue`], and lowering loads from the
//! location.

use crate::{define_id, Name, TypeId};

define_id!(
    /// Index of an [`Expr`] in the [`TreeArena`].
    ExprId,
    /// Index of a [`Stmt`] in the [`TreeArena`].
    StmtId,
    /// Index of a [`Decl`] in the [`TreeArena`].
    DeclId,
);

// ── Expressions ─────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ValueCategory {
    LValue,
    RValue,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BinaryOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    LogAnd,
    LogOr,
    Assign,
    MulAssign,
    DivAssign,
    ModAssign,
    AddAssign,
    SubAssign,
    ShlAssign,
    ShrAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    Comma,
}

impl BinaryOp {
    /// The arithmetic operator a compound assignment applies.
    pub const fn compound_base(self) -> Option<BinaryOp> {
        Some(match self {
            BinaryOp::MulAssign => BinaryOp::Mul,
            BinaryOp::DivAssign => BinaryOp::Div,
            BinaryOp::ModAssign => BinaryOp::Mod,
            BinaryOp::AddAssign => BinaryOp::Add,
            BinaryOp::SubAssign => BinaryOp::Sub,
            BinaryOp::ShlAssign => BinaryOp::Shl,
            BinaryOp::ShrAssign => BinaryOp::Shr,
            BinaryOp::AndAssign => BinaryOp::BitAnd,
            BinaryOp::OrAssign => BinaryOp::BitOr,
            BinaryOp::XorAssign => BinaryOp::BitXor,
            _ => return None,
        })
    }

    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
        )
    }

    pub const fn is_logical(self) -> bool {
        matches!(self, BinaryOp::LogAnd | BinaryOp::LogOr)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum UnaryOp {
    PreInc,
    PreDec,
    PostInc,
    PostDec,
    Plus,
    Minus,
    BitNot,
    LogNot,
    Deref,
    AddrOf,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    Call {
        callee: ExprId,
        args: Vec<ExprId>,
    },
    /// `base[index]`; either operand may be the pointer.
    Subscript {
        base: ExprId,
        index: ExprId,
    },
    Conditional {
        cond: ExprId,
        then_expr: ExprId,
        else_expr: ExprId,
    },
    IntLiteral(u64),
    CharLiteral(u32),
    FloatLiteral(f64),
    /// String literal contents, interned without quotes or escapes.
    StringLiteral(Name),
    DeclRef(DeclId),
    /// `base.field` or `base->field`; `field` indexes the record's field list.
    Member {
        base: ExprId,
        field: usize,
        arrow: bool,
    },
    /// Explicit or implicit conversion to the node's type.
    Cast {
        operand: ExprId,
        explicit: bool,
    },
    SizeofType(TypeId),
    SizeofExpr(ExprId),
    Paren(ExprId),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: TypeId,
    pub category: ValueCategory,
}

impl Expr {
    pub fn is_lvalue(&self) -> bool {
        self.category == ValueCategory::LValue
    }
}

// ── Statements ──────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Labeled {
        label: DeclId,
        body: StmtId,
    },
    /// `case value: body`; `value` is an integer constant expression.
    Case {
        value: ExprId,
        body: StmtId,
    },
    Default {
        body: StmtId,
    },
    Compound(Vec<StmtId>),
    /// Expression statement; `None` is the empty statement `;`.
    Expr(Option<ExprId>),
    If {
        cond: ExprId,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
    },
    Switch {
        scrutinee: ExprId,
        body: StmtId,
    },
    While {
        cond: ExprId,
        body: StmtId,
    },
    DoWhile {
        body: StmtId,
        cond: ExprId,
    },
    For {
        init: Option<StmtId>,
        cond: Option<ExprId>,
        step: Option<ExprId>,
        body: StmtId,
    },
    Goto(DeclId),
    Continue,
    Break,
    /// A declaration group (`int a, b = 1;`).
    Decl(Vec<DeclId>),
    Return(Option<ExprId>),
}

// ── Declarations ────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum StorageDuration {
    Automatic,
    Static,
    Thread,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DeclKind {
    Var {
        ty: TypeId,
        storage: StorageDuration,
        init: Option<ExprId>,
        /// Declared at file scope.
        global: bool,
    },
    Param {
        ty: TypeId,
    },
    Function {
        ty: TypeId,
        params: Vec<DeclId>,
        body: Option<StmtId>,
    },
    Label,
    Enumerator {
        ty: TypeId,
        value: i64,
    },
    Record {
        ty: TypeId,
    },
    Typedef {
        ty: TypeId,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Decl {
    /// `Name::EMPTY` for anonymous declarations.
    pub name: Name,
    pub kind: DeclKind,
}

impl Decl {
    /// Declared type, for declarations that have one.
    pub fn ty(&self) -> Option<TypeId> {
        match &self.kind {
            DeclKind::Var { ty, .. }
            | DeclKind::Param { ty }
            | DeclKind::Function { ty, .. }
            | DeclKind::Enumerator { ty, .. }
            | DeclKind::Record { ty }
            | DeclKind::Typedef { ty } => Some(*ty),
            DeclKind::Label => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }
}

// ── Arena ───────────────────────────────────────────────────────────

/// Flat storage for all tree nodes of a translation unit.
#[derive(Clone, Debug, Default)]
pub struct TreeArena {
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
    decls: Vec<Decl>,
}

fn next_id(len: usize, what: &str) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("tree arena exceeded {} {what}", u32::MAX))
}

impl TreeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(next_id(self.exprs.len(), "expressions"));
        self.exprs.push(expr);
        id
    }

    pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId::new(next_id(self.stmts.len(), "statements"));
        self.stmts.push(stmt);
        id
    }

    pub fn alloc_decl(&mut self, decl: Decl) -> DeclId {
        let id = DeclId::new(next_id(self.decls.len(), "declarations"));
        self.decls.push(decl);
        id
    }

    #[inline]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    #[inline]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    #[inline]
    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.index()]
    }

    /// Mutable access, used to attach bodies to earlier declarations.
    #[inline]
    pub fn decl_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.index()]
    }

    /// Mutable access, used to fill a compound statement after its children.
    #[inline]
    pub fn stmt_mut(&mut self, id: StmtId) -> &mut Stmt {
        &mut self.stmts[id.index()]
    }

    /// Strip any number of enclosing parentheses.
    pub fn skip_parens(&self, mut id: ExprId) -> ExprId {
        while let ExprKind::Paren(inner) = self.expr(id).kind {
            id = inner;
        }
        id
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    pub fn stmt_count(&self) -> usize {
        self.stmts.len()
    }

    pub fn decl_count(&self) -> usize {
        self.decls.len()
    }
}

#[cfg(test)]
mod tests;
