//! Expressions.
//!
//! Every expression lowers to one value. An lvalue expression lowers to
//! the address of its location; an rvalue to its contents. Expressions of
//! type `void` yield an undefined `void` value so callers never special-case
//! them.

use tern_eval::Scalar;
use tern_tree::{BinaryOp as TreeOp, DeclId, DeclKind, ExprId, ExprKind, Name, TypeId, UnaryOp};

use crate::ir::{BinaryOp, ValueId, ValueKind};
use crate::SsaResult;

use super::{ensure_sufficient_stack, Lowerer};

/// IR opcode for a tree arithmetic, bitwise or comparison operator.
fn ir_op(op: TreeOp) -> BinaryOp {
    match op {
        TreeOp::Mul => BinaryOp::Mul,
        TreeOp::Div => BinaryOp::Div,
        TreeOp::Mod => BinaryOp::Rem,
        TreeOp::Add => BinaryOp::Add,
        TreeOp::Sub => BinaryOp::Sub,
        TreeOp::Shl => BinaryOp::Shl,
        TreeOp::Shr => BinaryOp::Shr,
        TreeOp::BitAnd => BinaryOp::And,
        TreeOp::BitOr => BinaryOp::Or,
        TreeOp::BitXor => BinaryOp::Xor,
        TreeOp::Lt => BinaryOp::Lt,
        TreeOp::Gt => BinaryOp::Gt,
        TreeOp::Le => BinaryOp::Le,
        TreeOp::Ge => BinaryOp::Ge,
        TreeOp::Eq => BinaryOp::Eq,
        TreeOp::Ne => BinaryOp::Ne,
        other => panic!("`{other:?}` has no single IR opcode"),
    }
}

impl Lowerer<'_> {
    pub(super) fn lower_expr(&mut self, expr: ExprId) -> SsaResult<ValueId> {
        ensure_sufficient_stack(|| self.lower_expr_inner(expr))
    }

    fn lower_expr_inner(&mut self, id: ExprId) -> SsaResult<ValueId> {
        let expr = self.tree.arena.expr(id);
        let ty = expr.ty;
        let lvalue = expr.is_lvalue();
        match &expr.kind {
            &ExprKind::IntLiteral(value) => {
                self.ctx_mut().constant_of(Scalar::int(value, 64, false), ty)
            }
            &ExprKind::CharLiteral(value) => self
                .ctx_mut()
                .constant_of(Scalar::int(u64::from(value), 32, false), ty),
            &ExprKind::FloatLiteral(value) => self.builder.float_const(value, ty),
            &ExprKind::StringLiteral(contents) => self.lower_string(contents, ty),
            &ExprKind::DeclRef(decl) => self.lower_decl_ref(decl, ty, lvalue),
            &ExprKind::Paren(inner) => self.lower_expr(inner),
            &ExprKind::Binary { op, lhs, rhs } => self.lower_binary(op, lhs, rhs, ty),
            &ExprKind::Unary { op, operand } => self.lower_unary(op, operand, ty, lvalue),
            ExprKind::Call { callee, args } => self.lower_call(*callee, args, ty),
            &ExprKind::Subscript { base, index } => {
                let addr = self.subscript_address(base, index)?;
                self.load_unless(addr, lvalue || self.ctx().types.is_array(ty))
            }
            &ExprKind::Member { base, field, arrow } => {
                let addr = self.member_address(base, field, arrow)?;
                self.load_unless(addr, lvalue || self.ctx().types.is_array(ty))
            }
            &ExprKind::Conditional {
                cond,
                then_expr,
                else_expr,
            } => self.lower_conditional(cond, then_expr, else_expr, ty),
            &ExprKind::Cast { operand, .. } => self.lower_cast(operand, ty),
            &ExprKind::SizeofType(of) => self.size_of(of, ty),
            &ExprKind::SizeofExpr(operand) => {
                let of = self.tree.arena.expr(operand).ty;
                self.size_of(of, ty)
            }
        }
    }

    /// Lower `expr` as a branch condition: an `int` that is 0 or 1.
    pub(super) fn lower_condition(&mut self, expr: ExprId) -> SsaResult<ValueId> {
        let value = self.lower_expr(expr)?;
        let is_comparison = self
            .ctx()
            .def_instr(value)
            .and_then(|instr| self.ctx().instr(instr).binary_op())
            .is_some_and(BinaryOp::is_comparison);
        if is_comparison {
            return Ok(value);
        }
        self.builder.ne_zero(value)
    }

    fn load_unless(&mut self, addr: ValueId, lvalue: bool) -> SsaResult<ValueId> {
        if lvalue {
            Ok(addr)
        } else {
            self.builder.load(addr)
        }
    }

    /// `value` as a `ty`, converting only when the types differ.
    fn coerce(&mut self, value: ValueId, ty: TypeId) -> SsaResult<ValueId> {
        if self.ctx().ty(value) == ty {
            return Ok(value);
        }
        if ty == TypeId::BOOL {
            let truth = self.builder.ne_zero(value)?;
            return self.builder.cast(truth, ty);
        }
        self.builder.cast(value, ty)
    }

    fn void_value(&mut self) -> SsaResult<ValueId> {
        self.ctx_mut().undef(TypeId::VOID)
    }

    fn size_of(&mut self, of: TypeId, ty: TypeId) -> SsaResult<ValueId> {
        let size = self.ctx().target.size_of(&self.ctx().types, of);
        self.ctx_mut().constant_of(Scalar::int(size, 64, false), ty)
    }

    // ── Names ───────────────────────────────────────────────────

    /// Address of a string literal. Equal literals share one definition.
    fn lower_string(&mut self, contents: Name, ty: TypeId) -> SsaResult<ValueId> {
        if let Some(def) = self.module.string(contents) {
            return Ok(def.value);
        }
        let ptr = self.ctx_mut().types.pointer_to(ty);
        let value = self
            .ctx_mut()
            .new_value(ValueKind::StringRef(contents), ptr)?;
        self.module.define_string(contents, value);
        Ok(value)
    }

    fn lower_decl_ref(&mut self, decl: DeclId, ty: TypeId, lvalue: bool) -> SsaResult<ValueId> {
        match self.decl_kind(decl) {
            &DeclKind::Enumerator { value, .. } => self.builder.int_const(value, ty),
            DeclKind::Function { .. } => self.global_value(decl),
            DeclKind::Var { .. } | DeclKind::Param { .. } => {
                let addr = match self.defs.lookup(decl) {
                    Some(addr) => addr,
                    None => self.global_value(decl)?,
                };
                self.load_unless(addr, lvalue || self.ctx().types.is_array(ty))
            }
            other => panic!("{decl:?} ({other:?}) is not a value"),
        }
    }

    // ── Operators ───────────────────────────────────────────────

    fn lower_binary(&mut self, op: TreeOp, lhs: ExprId, rhs: ExprId, ty: TypeId) -> SsaResult<ValueId> {
        if let Some(base) = op.compound_base() {
            return self.lower_compound_assign(base, lhs, rhs);
        }
        match op {
            TreeOp::Assign => {
                let place = self.lower_expr(lhs)?;
                let value = self.lower_expr(rhs)?;
                self.builder.store(value, place)?;
                Ok(value)
            }
            TreeOp::Comma => {
                self.lower_expr(lhs)?;
                self.lower_expr(rhs)
            }
            TreeOp::LogAnd | TreeOp::LogOr => self.lower_logical(op, lhs, rhs, ty),
            _ => {
                let lhs = self.lower_expr(lhs)?;
                let rhs = self.lower_expr(rhs)?;
                self.apply_binary(op, lhs, rhs, ty)
            }
        }
    }

    /// `lhs op rhs` on already-lowered operands, producing a `ty`.
    fn apply_binary(&mut self, op: TreeOp, lhs: ValueId, rhs: ValueId, ty: TypeId) -> SsaResult<ValueId> {
        if op.is_comparison() {
            let (lhs, rhs) = self.unify_comparison(lhs, rhs)?;
            let result = self.builder.compare(ir_op(op), lhs, rhs)?;
            return self.coerce(result, ty);
        }
        let types = &self.ctx().types;
        if types.is_pointer(self.ctx().ty(lhs)) || types.is_pointer(self.ctx().ty(rhs)) {
            let result = self.pointer_arith(op, lhs, rhs)?;
            return self.coerce(result, ty);
        }
        let lhs = self.coerce(lhs, ty)?;
        let rhs = self.coerce(rhs, ty)?;
        self.builder.binary(ir_op(op), lhs, rhs)
    }

    /// Bring comparison operands to one type. A literal zero compared with
    /// a pointer becomes a null pointer of that type.
    fn unify_comparison(&mut self, lhs: ValueId, rhs: ValueId) -> SsaResult<(ValueId, ValueId)> {
        let lhs_ty = self.ctx().ty(lhs);
        let rhs_ty = self.ctx().ty(rhs);
        if lhs_ty == rhs_ty {
            return Ok((lhs, rhs));
        }
        let is_null = |this: &Self, v: ValueId| this.ctx().as_constant(v).is_some_and(|c| c.is_zero());
        if self.ctx().types.is_pointer(lhs_ty) && is_null(self, rhs) {
            return Ok((lhs, self.builder.zero(lhs_ty)?));
        }
        if self.ctx().types.is_pointer(rhs_ty) && is_null(self, lhs) {
            return Ok((self.builder.zero(rhs_ty)?, rhs));
        }
        if self.ctx().types.is_pointer(rhs_ty) && !self.ctx().types.is_pointer(lhs_ty) {
            return Ok((self.builder.cast(lhs, rhs_ty)?, rhs));
        }
        Ok((lhs, self.builder.cast(rhs, lhs_ty)?))
    }

    /// `p + i`, `i + p`, `p - i` and `p - q`, scaled by the pointee size.
    fn pointer_arith(&mut self, op: TreeOp, lhs: ValueId, rhs: ValueId) -> SsaResult<ValueId> {
        let lhs_ptr = self.ctx().types.is_pointer(self.ctx().ty(lhs));
        let rhs_ptr = self.ctx().types.is_pointer(self.ctx().ty(rhs));
        let ptrdiff = self.ctx().target.ptrdiff_type;
        match (op, lhs_ptr, rhs_ptr) {
            (TreeOp::Add, true, false) => self.builder.ptr_add(lhs, rhs),
            (TreeOp::Add, false, true) => self.builder.ptr_add(rhs, lhs),
            (TreeOp::Sub, true, false) => {
                let index = self.builder.cast(rhs, ptrdiff)?;
                let index = self.builder.neg(index)?;
                self.builder.ptr_add(lhs, index)
            }
            (TreeOp::Sub, true, true) => {
                let elem = self
                    .ctx()
                    .types
                    .pointee(self.ctx().ty(lhs))
                    .unwrap_or(TypeId::VOID);
                let size = self.ctx().target.size_of(&self.ctx().types, elem).max(1);
                let lhs = self.builder.cast(lhs, ptrdiff)?;
                let rhs = self.builder.cast(rhs, ptrdiff)?;
                let bytes = self.builder.sub(lhs, rhs)?;
                let size = self
                    .ctx_mut()
                    .constant_of(Scalar::int(size, 64, false), ptrdiff)?;
                self.builder.div(bytes, size)
            }
            _ => panic!("`{op:?}` is not defined on these pointer operands"),
        }
    }

    /// `lhs op= rhs`: the operation runs in the type of `rhs` (the left
    /// operand's type for shifts), then the result is converted back.
    fn lower_compound_assign(&mut self, op: TreeOp, lhs: ExprId, rhs: ExprId) -> SsaResult<ValueId> {
        let place = self.lower_expr(lhs)?;
        let value = self.lower_expr(rhs)?;
        let current = self.builder.load(place)?;
        let lhs_ty = self.ctx().ty(current);

        let result = if self.ctx().types.is_pointer(lhs_ty) {
            self.pointer_arith(op, current, value)?
        } else {
            let op_ty = match op {
                TreeOp::Shl | TreeOp::Shr => lhs_ty,
                _ => self.ctx().ty(value),
            };
            self.apply_binary(op, current, value, op_ty)?
        };
        let result = self.coerce(result, lhs_ty)?;
        self.builder.store(result, place)?;
        Ok(result)
    }

    /// Short-circuit `&&` / `||`.
    ///
    /// A left-nested chain of the same operator (`a && b && c`) shares one
    /// exit block whose phi takes, from every operand's block, that
    /// operand's truth value.
    fn lower_logical(&mut self, op: TreeOp, lhs: ExprId, rhs: ExprId, ty: TypeId) -> SsaResult<ValueId> {
        let mut operands = vec![rhs];
        let mut head = lhs;
        loop {
            let inner = self.tree.arena.skip_parens(head);
            match self.tree.arena.expr(inner).kind {
                ExprKind::Binary {
                    op: inner_op,
                    lhs,
                    rhs,
                } if inner_op == op => {
                    operands.push(rhs);
                    head = lhs;
                }
                _ => {
                    operands.push(head);
                    break;
                }
            }
        }
        operands.reverse();

        let exit = self.new_block()?;
        let phi = self.phi_in(exit, TypeId::INT)?;
        let last = operands.len() - 1;
        for (i, &operand) in operands.iter().enumerate() {
            let truth = self.lower_condition(operand)?;
            let pred = self.current_block();
            self.add_incoming(phi, truth, pred);
            if i == last {
                self.jump(exit)?;
                break;
            }
            let next = self.new_block()?;
            if op == TreeOp::LogAnd {
                self.branch(truth, next, exit)?;
            } else {
                self.branch(truth, exit, next)?;
            }
            self.enter_block(next);
        }

        self.enter_block(exit);
        let result = self
            .ctx()
            .instr(phi)
            .result()
            .unwrap_or_else(|| panic!("phi without result"));
        self.coerce(result, ty)
    }

    fn lower_conditional(
        &mut self,
        cond: ExprId,
        then_expr: ExprId,
        else_expr: ExprId,
        ty: TypeId,
    ) -> SsaResult<ValueId> {
        let then_block = self.new_block()?;
        let else_block = self.new_block()?;
        let exit = self.new_block()?;
        let cond = self.lower_condition(cond)?;
        self.branch(cond, then_block, else_block)?;

        let phi = if ty == TypeId::VOID {
            None
        } else {
            Some(self.phi_in(exit, ty)?)
        };
        for (block, expr) in [(then_block, then_expr), (else_block, else_expr)] {
            self.enter_block(block);
            let value = self.lower_expr(expr)?;
            if let Some(phi) = phi {
                let value = self.coerce(value, ty)?;
                let pred = self.current_block();
                self.add_incoming(phi, value, pred);
            }
            self.jump(exit)?;
        }

        self.enter_block(exit);
        match phi {
            Some(phi) => Ok(self
                .ctx()
                .instr(phi)
                .result()
                .unwrap_or_else(|| panic!("phi without result"))),
            None => self.void_value(),
        }
    }

    fn lower_unary(&mut self, op: UnaryOp, operand: ExprId, ty: TypeId, lvalue: bool) -> SsaResult<ValueId> {
        match op {
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => {
                self.lower_increment(op, operand)
            }
            UnaryOp::Plus => {
                let value = self.lower_expr(operand)?;
                self.coerce(value, ty)
            }
            UnaryOp::Minus => {
                let value = self.lower_expr(operand)?;
                let value = self.coerce(value, ty)?;
                self.builder.neg(value)
            }
            UnaryOp::BitNot => {
                let value = self.lower_expr(operand)?;
                let value = self.coerce(value, ty)?;
                self.builder.not(value)
            }
            UnaryOp::LogNot => {
                let value = self.lower_expr(operand)?;
                let result = self.builder.log_not(value)?;
                self.coerce(result, ty)
            }
            UnaryOp::Deref => {
                let ptr = self.lower_expr(operand)?;
                // `*fp` designates the function; its address is the pointer.
                let types = &self.ctx().types;
                if types.is_function(ty) {
                    return Ok(ptr);
                }
                let keep_address = lvalue || types.is_array(ty);
                self.load_unless(ptr, keep_address)
            }
            // The operand is an lvalue, so it already lowers to its address.
            UnaryOp::AddrOf => self.lower_expr(operand),
        }
    }

    fn lower_increment(&mut self, op: UnaryOp, operand: ExprId) -> SsaResult<ValueId> {
        let increment = matches!(op, UnaryOp::PreInc | UnaryOp::PostInc);
        let place = self.lower_expr(operand)?;
        let old = self.builder.load(place)?;
        let ty = self.ctx().ty(old);

        let new = if self.ctx().types.is_pointer(ty) {
            let ptrdiff = self.ctx().target.ptrdiff_type;
            let step = self.builder.int_const(if increment { 1 } else { -1 }, ptrdiff)?;
            self.builder.ptr_add(old, step)?
        } else {
            let one = self.builder.one(ty)?;
            if increment {
                self.builder.add(old, one)?
            } else {
                self.builder.sub(old, one)?
            }
        };
        self.builder.store(new, place)?;

        Ok(match op {
            UnaryOp::PostInc | UnaryOp::PostDec => old,
            _ => new,
        })
    }

    // ── Memory access ───────────────────────────────────────────

    fn subscript_address(&mut self, base: ExprId, index: ExprId) -> SsaResult<ValueId> {
        let base_ty = self.tree.arena.expr(base).ty;
        let (ptr, index) = if self.ctx().types.is_pointer(base_ty) {
            (base, index)
        } else {
            (index, base)
        };
        let ptr = self.lower_expr(ptr)?;
        let index = self.lower_expr(index)?;
        self.builder.ptr_add(ptr, index)
    }

    fn member_address(&mut self, base: ExprId, field: usize, arrow: bool) -> SsaResult<ValueId> {
        let base_expr = self.tree.arena.expr(base);
        let base_ty = base_expr.ty;
        let base_is_lvalue = base_expr.is_lvalue();

        let mut ptr = self.lower_expr(base)?;
        let record_ty = if arrow {
            self.ctx()
                .types
                .pointee(base_ty)
                .unwrap_or_else(|| panic!("`->` on non-pointer {base_ty:?}"))
        } else {
            base_ty
        };
        if !arrow && !base_is_lvalue {
            // A record rvalue (e.g. a call result) has no address; give it
            // a temporary one.
            let slot = self.alloca(record_ty)?;
            self.builder.store(ptr, slot)?;
            ptr = slot;
        }

        let types = &self.ctx().types;
        let record = types
            .record_of(record_ty)
            .unwrap_or_else(|| panic!("member access on non-record {record_ty:?}"));
        let field_ty = types.record(record).fields[field].ty;
        let offset = self.ctx().target.field_offset(types, record, field);
        self.builder.field_addr(ptr, offset, field_ty)
    }

    fn lower_call(&mut self, callee: ExprId, args: &[ExprId], ty: TypeId) -> SsaResult<ValueId> {
        let callee = self.lower_expr(callee)?;
        let call = self.builder.begin_call(ty, callee)?;
        for &arg in args {
            let value = self.lower_expr(arg)?;
            self.builder.add_call_arg(call, value);
        }
        match self.builder.finish_call(call) {
            Some(result) => Ok(result),
            None => self.void_value(),
        }
    }

    /// Conversions. Array and function operands are already addresses, so
    /// their decay is a pointer-to-pointer conversion.
    fn lower_cast(&mut self, operand: ExprId, ty: TypeId) -> SsaResult<ValueId> {
        let value = self.lower_expr(operand)?;
        if ty == TypeId::VOID {
            return self.void_value();
        }
        self.coerce(value, ty)
    }
}
