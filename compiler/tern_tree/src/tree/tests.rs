//! Tests for the typed tree arena and value categories.

use pretty_assertions::assert_eq;

use super::*;
use crate::{Target, TreeModule};

#[test]
fn arena_hands_out_dense_ids() {
    let mut arena = TreeArena::new();
    let a = arena.alloc_expr(Expr {
        kind: ExprKind::IntLiteral(1),
        ty: TypeId::INT,
        category: ValueCategory::RValue,
    });
    let b = arena.alloc_expr(Expr {
        kind: ExprKind::Paren(a),
        ty: TypeId::INT,
        category: ValueCategory::RValue,
    });
    assert_eq!(a.raw(), 0);
    assert_eq!(b.raw(), 1);
    assert_eq!(arena.skip_parens(b), a);
    assert_eq!(arena.expr_count(), 2);
}

#[test]
fn compound_assign_maps_to_base_operator() {
    assert_eq!(BinaryOp::AddAssign.compound_base(), Some(BinaryOp::Add));
    assert_eq!(BinaryOp::XorAssign.compound_base(), Some(BinaryOp::BitXor));
    assert_eq!(BinaryOp::Assign.compound_base(), None);
    assert!(BinaryOp::Ne.is_comparison());
    assert!(BinaryOp::LogOr.is_logical());
}

#[test]
fn function_helper_builds_signature() {
    let mut tm = TreeModule::new("t", Target::lp64());
    let x = tm.param("x", TypeId::INT);
    let body = tm.compound(vec![]);
    let f = tm.function("f", TypeId::LONG, vec![x], Some(body));

    let decl = tm.arena.decl(f);
    let ty = decl.ty().unwrap_or(TypeId::VOID);
    assert_eq!(tm.types.params(ty), &[TypeId::INT]);
    assert_eq!(tm.types.return_type(ty), Some(TypeId::LONG));
    assert_eq!(tm.decls, vec![f]);
    assert_eq!(tm.names.lookup(decl.name), "f");
}

#[test]
fn string_literal_decays_to_char_pointer() {
    let mut tm = TreeModule::new("t", Target::lp64());
    let s = tm.string_lit("hi");
    let expr = tm.arena.expr(s);
    let char_ptr = tm.types.pointer_to(TypeId::CHAR);
    assert_eq!(expr.ty, char_ptr);
    let ExprKind::Cast { operand, .. } = expr.kind else {
        panic!("expected cast, got {:?}", expr.kind);
    };
    assert!(tm.arena.expr(operand).is_lvalue());
    assert_eq!(tm.types.array_elem(tm.arena.expr(operand).ty), Some(TypeId::CHAR));
}
