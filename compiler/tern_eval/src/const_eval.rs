//! Compile-time evaluation of integer and floating constant expressions.
//!
//! Used for `case` labels and for initializers of variables with static
//! storage duration. Anything that needs run-time state (loads, calls,
//! assignments, addresses) is rejected with [`EvalError::NotConstant`].

use tern_tree::{
    BinaryOp, Builtin, DeclKind, ExprId, ExprKind, Target, TreeModule, TypeId, TypeKind, TypePool,
    UnaryOp,
};

use crate::ops::BinOp;
use crate::{EvalError, EvalResult, Scalar, ScalarKind};

/// The [`ScalarKind`] values of `ty` are represented with on `target`.
///
/// Pointers are modelled as unsigned integers of pointer width. Returns
/// `None` for aggregates, functions and `void`.
pub fn scalar_kind(pool: &TypePool, target: &Target, ty: TypeId) -> Option<ScalarKind> {
    if let Some(layout) = target.int_layout(pool, ty) {
        return Some(ScalarKind::Int {
            bits: layout.bits,
            signed: layout.signed,
        });
    }
    #[expect(
        clippy::cast_possible_truncation,
        reason = "pointer sizes are at most 8 bytes"
    )]
    let pointer_bits = (target.pointer_size * 8) as u32;
    match pool.kind(ty) {
        TypeKind::Builtin(Builtin::Float) => Some(ScalarKind::Single),
        TypeKind::Builtin(Builtin::Double) => Some(ScalarKind::Double),
        TypeKind::Pointer(_) => Some(ScalarKind::Int {
            bits: pointer_bits,
            signed: false,
        }),
        _ => None,
    }
}

/// `value` converted to `ty` with C's conversion rules.
///
/// Conversion to `_Bool` yields 1 for any nonzero value instead of
/// truncating. Returns `None` when `ty` has no scalar representation.
pub fn convert_to_type(
    pool: &TypePool,
    target: &Target,
    value: Scalar,
    ty: TypeId,
) -> Option<Scalar> {
    let kind = scalar_kind(pool, target, ty)?;
    Some(match kind {
        ScalarKind::Int { bits, signed } if ty == TypeId::BOOL => {
            Scalar::from_bool(!value.is_zero(), bits, signed)
        }
        _ => value.convert(kind),
    })
}

/// Evaluator over one translation unit.
pub struct ConstEvaluator<'a> {
    tree: &'a TreeModule,
}

impl<'a> ConstEvaluator<'a> {
    pub fn new(tree: &'a TreeModule) -> Self {
        ConstEvaluator { tree }
    }

    fn kind(&self, ty: TypeId) -> EvalResult<ScalarKind> {
        match scalar_kind(&self.tree.types, &self.tree.target, ty) {
            Some(kind) if !self.tree.types.is_pointer(ty) => Ok(kind),
            _ => Err(EvalError::NotConstant),
        }
    }

    /// Evaluate `expr` to a value of the expression's own type.
    pub fn eval(&self, expr: ExprId) -> EvalResult<Scalar> {
        let node = self.tree.arena.expr(expr);
        let result = match &node.kind {
            ExprKind::IntLiteral(v) => Ok(int_of(*v, self.kind(node.ty)?)),
            ExprKind::CharLiteral(c) => Ok(int_of(u64::from(*c), self.kind(node.ty)?)),
            ExprKind::FloatLiteral(v) => Ok(Scalar::Double(*v).convert(self.kind(node.ty)?)),
            ExprKind::Paren(inner) => self.eval(*inner),
            ExprKind::Cast { operand, .. } => {
                self.kind(node.ty)?;
                let value = self.eval(*operand)?;
                convert_to_type(&self.tree.types, &self.tree.target, value, node.ty)
                    .ok_or(EvalError::NotConstant)
            }
            ExprKind::SizeofType(ty) => {
                let size = self.tree.target.size_of(&self.tree.types, *ty);
                Ok(int_of(size, self.kind(node.ty)?))
            }
            ExprKind::SizeofExpr(inner) => {
                let ty = self.tree.arena.expr(*inner).ty;
                let size = self.tree.target.size_of(&self.tree.types, ty);
                Ok(int_of(size, self.kind(node.ty)?))
            }
            ExprKind::DeclRef(decl) => match self.tree.arena.decl(*decl).kind {
                DeclKind::Enumerator { value, .. } => {
                    let kind = self.kind(node.ty)?;
                    Ok(Scalar::from_i64(value, 64, true).convert(kind))
                }
                _ => Err(EvalError::NotConstant),
            },
            ExprKind::Unary { op, operand } => self.eval_unary(*op, *operand, node.ty),
            ExprKind::Binary { op, lhs, rhs } => self.eval_binary(*op, *lhs, *rhs, node.ty),
            ExprKind::Conditional {
                cond,
                then_expr,
                else_expr,
            } => {
                if self.eval(*cond)?.is_zero() {
                    self.eval(*else_expr)
                } else {
                    self.eval(*then_expr)
                }
            }
            ExprKind::Call { .. }
            | ExprKind::Subscript { .. }
            | ExprKind::StringLiteral(_)
            | ExprKind::Member { .. } => Err(EvalError::NotConstant),
        };
        if let Err(err) = &result {
            tracing::trace!(expr = expr.raw(), %err, "constant evaluation failed");
        }
        result
    }

    fn eval_unary(&self, op: UnaryOp, operand: ExprId, ty: TypeId) -> EvalResult<Scalar> {
        match op {
            UnaryOp::Plus => self.eval(operand),
            UnaryOp::Minus => Ok(self.eval(operand)?.wrapping_neg()),
            UnaryOp::BitNot => self.eval(operand)?.checked_not(),
            UnaryOp::LogNot => {
                let value = self.eval(operand)?;
                Ok(bool_of(value.is_zero(), self.kind(ty)?))
            }
            UnaryOp::PreInc
            | UnaryOp::PreDec
            | UnaryOp::PostInc
            | UnaryOp::PostDec
            | UnaryOp::Deref
            | UnaryOp::AddrOf => Err(EvalError::NotConstant),
        }
    }

    fn eval_binary(&self, op: BinaryOp, lhs: ExprId, rhs: ExprId, ty: TypeId) -> EvalResult<Scalar> {
        match op {
            BinaryOp::LogAnd => {
                let result = !self.eval(lhs)?.is_zero() && !self.eval(rhs)?.is_zero();
                return Ok(bool_of(result, self.kind(ty)?));
            }
            BinaryOp::LogOr => {
                let result = !self.eval(lhs)?.is_zero() || !self.eval(rhs)?.is_zero();
                return Ok(bool_of(result, self.kind(ty)?));
            }
            _ => {}
        }

        let a = self.eval(lhs)?;
        let b = self.eval(rhs)?;
        if op.is_comparison() {
            let ord = a.compare(&b)?;
            let result = match op {
                BinaryOp::Lt => ord.is_lt(),
                BinaryOp::Gt => ord.is_gt(),
                BinaryOp::Le => ord.is_le(),
                BinaryOp::Ge => ord.is_ge(),
                BinaryOp::Eq => ord.is_eq(),
                _ => ord.is_ne(),
            };
            return Ok(bool_of(result, self.kind(ty)?));
        }

        let bin = match op {
            BinaryOp::Add => BinOp::Add,
            BinaryOp::Sub => BinOp::Sub,
            BinaryOp::Mul => BinOp::Mul,
            BinaryOp::Div => BinOp::Div,
            BinaryOp::Mod => BinOp::Rem,
            BinaryOp::Shl => BinOp::Shl,
            BinaryOp::Shr => BinOp::Shr,
            BinaryOp::BitAnd => BinOp::And,
            BinaryOp::BitOr => BinOp::Or,
            BinaryOp::BitXor => BinOp::Xor,
            _ => return Err(EvalError::NotConstant),
        };
        a.binary(bin, b)
    }
}

fn int_of(value: u64, kind: ScalarKind) -> Scalar {
    match kind {
        ScalarKind::Int { bits, signed } => Scalar::int(value, bits, signed),
        other => Scalar::int(value, 64, false).convert(other),
    }
}

fn bool_of(value: bool, kind: ScalarKind) -> Scalar {
    int_of(u64::from(value), kind)
}
