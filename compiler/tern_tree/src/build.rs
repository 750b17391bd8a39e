//! Shorthand constructors for assembling checked trees.
//!
//! Callers are responsible for the types they pass in; nothing here checks
//! them. The helpers only save spelling out [`Expr`] and [`Decl`] literals.

use crate::{
    BinaryOp, Decl, DeclId, DeclKind, Expr, ExprId, ExprKind, Stmt, StmtId, StorageDuration,
    TreeModule, TypeId, UnaryOp, ValueCategory,
};

impl TreeModule {
    // ── Expressions ─────────────────────────────────────────────

    pub fn expr(&mut self, kind: ExprKind, ty: TypeId, category: ValueCategory) -> ExprId {
        self.arena.alloc_expr(Expr { kind, ty, category })
    }

    pub fn rvalue(&mut self, kind: ExprKind, ty: TypeId) -> ExprId {
        self.expr(kind, ty, ValueCategory::RValue)
    }

    pub fn int_lit(&mut self, value: u64, ty: TypeId) -> ExprId {
        self.rvalue(ExprKind::IntLiteral(value), ty)
    }

    pub fn float_lit(&mut self, value: f64, ty: TypeId) -> ExprId {
        self.rvalue(ExprKind::FloatLiteral(value), ty)
    }

    /// A string literal already decayed to `char *`.
    pub fn string_lit(&mut self, contents: &str) -> ExprId {
        let name = self.names.intern(contents);
        let len = contents.len() as u64 + 1;
        let array = self.types.array_of(TypeId::CHAR, Some(len));
        let ptr = self.types.pointer_to(TypeId::CHAR);
        let lit = self.expr(ExprKind::StringLiteral(name), array, ValueCategory::LValue);
        self.cast(lit, ptr)
    }

    /// Read of a declared entity (its value).
    pub fn load_of(&mut self, decl: DeclId) -> ExprId {
        let ty = self.decl_type(decl);
        self.rvalue(ExprKind::DeclRef(decl), ty)
    }

    /// Reference to the location of a declared entity.
    pub fn place_of(&mut self, decl: DeclId) -> ExprId {
        let ty = self.decl_type(decl);
        self.expr(ExprKind::DeclRef(decl), ty, ValueCategory::LValue)
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId, ty: TypeId) -> ExprId {
        self.rvalue(ExprKind::Binary { op, lhs, rhs }, ty)
    }

    /// `decl = value`, typed as the variable.
    pub fn assign(&mut self, decl: DeclId, value: ExprId) -> ExprId {
        let ty = self.decl_type(decl);
        let place = self.place_of(decl);
        self.binary(BinaryOp::Assign, place, value, ty)
    }

    pub fn unary(&mut self, op: UnaryOp, operand: ExprId, ty: TypeId) -> ExprId {
        self.rvalue(ExprKind::Unary { op, operand }, ty)
    }

    /// Implicit conversion of `operand` to `ty`.
    pub fn cast(&mut self, operand: ExprId, ty: TypeId) -> ExprId {
        self.rvalue(
            ExprKind::Cast {
                operand,
                explicit: false,
            },
            ty,
        )
    }

    pub fn call(&mut self, callee: DeclId, args: Vec<ExprId>) -> ExprId {
        let fn_ty = self.decl_type(callee);
        let ret = self.types.return_type(fn_ty).unwrap_or(TypeId::VOID);
        let callee = self.place_of(callee);
        self.rvalue(ExprKind::Call { callee, args }, ret)
    }

    // ── Statements ──────────────────────────────────────────────

    pub fn stmt(&mut self, stmt: Stmt) -> StmtId {
        self.arena.alloc_stmt(stmt)
    }

    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        self.stmt(Stmt::Expr(Some(expr)))
    }

    pub fn compound(&mut self, stmts: Vec<StmtId>) -> StmtId {
        self.stmt(Stmt::Compound(stmts))
    }

    pub fn ret(&mut self, value: Option<ExprId>) -> StmtId {
        self.stmt(Stmt::Return(value))
    }

    pub fn decl_stmt(&mut self, decl: DeclId) -> StmtId {
        self.stmt(Stmt::Decl(vec![decl]))
    }

    // ── Declarations ────────────────────────────────────────────

    fn decl_type(&self, decl: DeclId) -> TypeId {
        self.arena.decl(decl).ty().unwrap_or(TypeId::VOID)
    }

    pub fn decl(&mut self, name: &str, kind: DeclKind) -> DeclId {
        let name = self.names.intern(name);
        self.arena.alloc_decl(Decl { name, kind })
    }

    /// Block-scope automatic variable.
    pub fn local(&mut self, name: &str, ty: TypeId, init: Option<ExprId>) -> DeclId {
        self.decl(
            name,
            DeclKind::Var {
                ty,
                storage: StorageDuration::Automatic,
                init,
                global: false,
            },
        )
    }

    /// File-scope variable, registered in `decls`.
    pub fn global_var(&mut self, name: &str, ty: TypeId, init: Option<ExprId>) -> DeclId {
        let decl = self.decl(
            name,
            DeclKind::Var {
                ty,
                storage: StorageDuration::Static,
                init,
                global: true,
            },
        );
        self.add_global(decl);
        decl
    }

    pub fn param(&mut self, name: &str, ty: TypeId) -> DeclId {
        self.decl(name, DeclKind::Param { ty })
    }

    pub fn label(&mut self, name: &str) -> DeclId {
        self.decl(name, DeclKind::Label)
    }

    /// Declare a function at file scope. Its type is built from `ret` and
    /// the parameter declarations.
    pub fn function(
        &mut self,
        name: &str,
        ret: TypeId,
        params: Vec<DeclId>,
        body: Option<StmtId>,
    ) -> DeclId {
        let param_types: Vec<TypeId> = params.iter().map(|&p| self.decl_type(p)).collect();
        let ty = self.types.function(ret, &param_types, false);
        let decl = self.decl(name, DeclKind::Function { ty, params, body });
        self.add_global(decl);
        decl
    }
}
