//! Tests for lowering typed trees to SSA IR.

#![allow(
    clippy::unwrap_used,
    reason = "test code uses unwrap for concise assertions"
)]

use pretty_assertions::assert_eq;
use tern_eval::Scalar;
use tern_tree::{
    BinaryOp as TreeOp, DeclKind, ExprKind, Field, RecordKind, Stmt, StorageDuration, Target,
    TreeModule, TypeId, UnaryOp, ValueCategory,
};

use crate::ir::{BranchKind, Context, DefKind, FuncId, InstrKind, Module, ValueId, ValueKind};
use crate::test_helpers::{all_instrs, func_named, lower, mnemonics, returned_value};
use crate::{lower_module, optimize, verify_module, ContextConfig, OptimizerOptions, SsaError};

fn tree() -> TreeModule {
    TreeModule::new("t", Target::lp64())
}

fn optimized(tree: &TreeModule) -> (Context, Module) {
    let (mut ctx, mut m) = lower(tree);
    verify_module(&ctx, &m).unwrap();
    optimize(&mut ctx, &mut m, &OptimizerOptions::all()).unwrap();
    (ctx, m)
}

fn count(ctx: &Context, func: FuncId, pred: impl Fn(InstrKind) -> bool) -> usize {
    all_instrs(ctx, func)
        .into_iter()
        .filter(|&i| pred(ctx.instr(i).kind()))
        .count()
}

fn constant(ctx: &Context, value: ValueId) -> Option<i64> {
    ctx.as_constant(value).and_then(|v| v.to_i64())
}

fn variable(ctx: &Context, m: &Module, name: &str) -> DefKind {
    let name = ctx.names.get(name).unwrap();
    m.lookup(name).unwrap().kind.clone()
}

// ── Functions and locals ────────────────────────────────────────────

/// `int f(int x) { int y = x + 1; return y; }`
fn add_one() -> TreeModule {
    let mut tm = tree();
    let x = tm.param("x", TypeId::INT);
    let one = tm.int_lit(1, TypeId::INT);
    let x_val = tm.load_of(x);
    let sum = tm.binary(TreeOp::Add, x_val, one, TypeId::INT);
    let y = tm.local("y", TypeId::INT, Some(sum));
    let decl = tm.decl_stmt(y);
    let y_val = tm.load_of(y);
    let ret = tm.ret(Some(y_val));
    let body = tm.compound(vec![decl, ret]);
    tm.function("f", TypeId::INT, vec![x], Some(body));
    tm
}

#[test]
fn locals_live_in_entry_block_slots() {
    let (ctx, m) = lower(&add_one());
    verify_module(&ctx, &m).unwrap();
    let f = func_named(&ctx, &m, "f");
    assert_eq!(
        mnemonics(&ctx, f),
        vec![vec!["alloca", "alloca", "store", "load", "add", "store", "load", "ret"]]
    );
    assert_eq!(ctx.function(f).params().len(), 1);
}

#[test]
fn optimized_locals_become_registers() {
    let (ctx, m) = optimized(&add_one());
    let f = func_named(&ctx, &m, "f");
    assert_eq!(mnemonics(&ctx, f), vec![vec!["add", "ret"]]);

    let ret = returned_value(&ctx, f).unwrap();
    let add = ctx.def_instr(ret).unwrap();
    let x = ctx.function(f).params()[0];
    assert_eq!(ctx.instr(add).operand(0), x);
    assert_eq!(constant(&ctx, ctx.instr(add).operand(1)), Some(1));
}

#[test]
fn constant_expression_folds_to_return() {
    let mut tm = tree();
    let two = tm.int_lit(2, TypeId::INT);
    let three = tm.int_lit(3, TypeId::INT);
    let sum = tm.binary(TreeOp::Add, two, three, TypeId::INT);
    let ret = tm.ret(Some(sum));
    let body = tm.compound(vec![ret]);
    tm.function("f", TypeId::INT, vec![], Some(body));

    let (ctx, m) = optimized(&tm);
    let f = func_named(&ctx, &m, "f");
    assert_eq!(mnemonics(&ctx, f), vec![vec!["ret"]]);
    assert_eq!(constant(&ctx, returned_value(&ctx, f).unwrap()), Some(5));
}

#[test]
fn assignment_operators_fold_through_slots() {
    // int f() { int x = 1; x += 2; x++; return x; }
    let mut tm = tree();
    let one = tm.int_lit(1, TypeId::INT);
    let x = tm.local("x", TypeId::INT, Some(one));
    let decl = tm.decl_stmt(x);
    let place = tm.place_of(x);
    let two = tm.int_lit(2, TypeId::INT);
    let add_assign = tm.binary(TreeOp::AddAssign, place, two, TypeId::INT);
    let add_assign = tm.expr_stmt(add_assign);
    let place = tm.place_of(x);
    let inc = tm.unary(UnaryOp::PostInc, place, TypeId::INT);
    let inc = tm.expr_stmt(inc);
    let x_val = tm.load_of(x);
    let ret = tm.ret(Some(x_val));
    let body = tm.compound(vec![decl, add_assign, inc, ret]);
    tm.function("f", TypeId::INT, vec![], Some(body));

    let (ctx, m) = optimized(&tm);
    let f = func_named(&ctx, &m, "f");
    assert_eq!(constant(&ctx, returned_value(&ctx, f).unwrap()), Some(4));
}

#[test]
fn unary_operators_fold() {
    // int f() { return -(~5) + !0 + sizeof(long); }
    let mut tm = tree();
    let five = tm.int_lit(5, TypeId::INT);
    let not = tm.unary(UnaryOp::BitNot, five, TypeId::INT);
    let neg = tm.unary(UnaryOp::Minus, not, TypeId::INT);
    let zero = tm.int_lit(0, TypeId::INT);
    let log_not = tm.unary(UnaryOp::LogNot, zero, TypeId::INT);
    let size = tm.rvalue(ExprKind::SizeofType(TypeId::LONG), TypeId::ULONG);
    let size = tm.cast(size, TypeId::INT);
    let sum = tm.binary(TreeOp::Add, neg, log_not, TypeId::INT);
    let sum = tm.binary(TreeOp::Add, sum, size, TypeId::INT);
    let ret = tm.ret(Some(sum));
    let body = tm.compound(vec![ret]);
    tm.function("f", TypeId::INT, vec![], Some(body));

    let (ctx, m) = optimized(&tm);
    let f = func_named(&ctx, &m, "f");
    assert_eq!(constant(&ctx, returned_value(&ctx, f).unwrap()), Some(6 + 1 + 8));
}

#[test]
fn enumerators_are_constants() {
    let mut tm = tree();
    let red = tm.decl("RED", DeclKind::Enumerator { ty: TypeId::INT, value: 4 });
    let red_val = tm.load_of(red);
    let ret = tm.ret(Some(red_val));
    let body = tm.compound(vec![ret]);
    tm.function("f", TypeId::INT, vec![], Some(body));

    let (ctx, m) = lower(&tm);
    let f = func_named(&ctx, &m, "f");
    assert_eq!(mnemonics(&ctx, f), vec![vec!["ret"]]);
    assert_eq!(constant(&ctx, returned_value(&ctx, f).unwrap()), Some(4));
}

#[test]
fn deeply_nested_expressions_lower() {
    let mut tm = tree();
    let mut expr = tm.int_lit(1, TypeId::INT);
    for _ in 0..5000 {
        let one = tm.int_lit(1, TypeId::INT);
        expr = tm.binary(TreeOp::Add, expr, one, TypeId::INT);
    }
    let ret = tm.ret(Some(expr));
    let body = tm.compound(vec![ret]);
    tm.function("f", TypeId::INT, vec![], Some(body));

    let (ctx, m) = optimized(&tm);
    let f = func_named(&ctx, &m, "f");
    assert_eq!(constant(&ctx, returned_value(&ctx, f).unwrap()), Some(5001));
}

#[test]
fn node_limit_surfaces_as_error() {
    let tm = add_one();
    let mut ctx = Context::from_tree(&tm, ContextConfig::with_node_limit(8));
    let mut m = Module::new(tm.name);
    let err = lower_module(&tm, &mut ctx, &mut m).unwrap_err();
    assert!(matches!(err, SsaError::ArenaExhausted { limit: 8, .. }));
}

// ── Control flow ────────────────────────────────────────────────────

#[test]
fn if_else_with_returns_leaves_unreachable_exit() {
    // int f(int x) { if (x > 0) return 1; else return 2; }
    let mut tm = tree();
    let x = tm.param("x", TypeId::INT);
    let x_val = tm.load_of(x);
    let zero = tm.int_lit(0, TypeId::INT);
    let cond = tm.binary(TreeOp::Gt, x_val, zero, TypeId::INT);
    let one = tm.int_lit(1, TypeId::INT);
    let then_ret = tm.ret(Some(one));
    let two = tm.int_lit(2, TypeId::INT);
    let else_ret = tm.ret(Some(two));
    let if_stmt = tm.stmt(Stmt::If {
        cond,
        then_branch: then_ret,
        else_branch: Some(else_ret),
    });
    let body = tm.compound(vec![if_stmt]);
    tm.function("f", TypeId::INT, vec![x], Some(body));

    let (ctx, m) = lower(&tm);
    verify_module(&ctx, &m).unwrap();
    let f = func_named(&ctx, &m, "f");
    let blocks = ctx.function(f).blocks().to_vec();
    assert_eq!(blocks.len(), 4);
    // The comparison result is the branch condition as is.
    assert_eq!(mnemonics(&ctx, f)[0], vec!["alloca", "store", "load", "gt", "br"]);
    assert!(ctx.predecessors(blocks[3]).is_empty());

    let (ctx, m) = optimized(&tm);
    let f = func_named(&ctx, &m, "f");
    assert_eq!(ctx.function(f).blocks().len(), 3);
}

#[test]
fn falling_off_the_end_returns() {
    // void f() {}  int g(int x) { if (x) return 1; }
    let mut tm = tree();
    let empty = tm.compound(vec![]);
    tm.function("f", TypeId::VOID, vec![], Some(empty));
    let x = tm.param("x", TypeId::INT);
    let x_val = tm.load_of(x);
    let one = tm.int_lit(1, TypeId::INT);
    let then_ret = tm.ret(Some(one));
    let if_stmt = tm.stmt(Stmt::If {
        cond: x_val,
        then_branch: then_ret,
        else_branch: None,
    });
    let body = tm.compound(vec![if_stmt]);
    tm.function("g", TypeId::INT, vec![x], Some(body));

    let (ctx, m) = lower(&tm);
    verify_module(&ctx, &m).unwrap();
    let f = func_named(&ctx, &m, "f");
    assert_eq!(mnemonics(&ctx, f), vec![vec!["ret"]]);

    let g = func_named(&ctx, &m, "g");
    let exit = *ctx.function(g).blocks().last().unwrap();
    let term = ctx.block(exit).terminator().unwrap();
    let value = ctx.instr(term).return_value().flatten().unwrap();
    assert!(matches!(ctx.value(value).kind(), ValueKind::Undef));
    assert_eq!(ctx.ty(value), TypeId::INT);
}

/// `int f(int n) { int s = 0; int i = 0; while (i < n) { s = s + i; i = i + 1; } return s; }`
fn sum_below() -> TreeModule {
    let mut tm = tree();
    let n = tm.param("n", TypeId::INT);
    let zero = tm.int_lit(0, TypeId::INT);
    let s = tm.local("s", TypeId::INT, Some(zero));
    let zero = tm.int_lit(0, TypeId::INT);
    let i = tm.local("i", TypeId::INT, Some(zero));
    let decls = tm.stmt(Stmt::Decl(vec![s, i]));

    let i_val = tm.load_of(i);
    let n_val = tm.load_of(n);
    let cond = tm.binary(TreeOp::Lt, i_val, n_val, TypeId::INT);
    let s_val = tm.load_of(s);
    let i_val = tm.load_of(i);
    let acc = tm.binary(TreeOp::Add, s_val, i_val, TypeId::INT);
    let acc = tm.assign(s, acc);
    let acc = tm.expr_stmt(acc);
    let i_val = tm.load_of(i);
    let one = tm.int_lit(1, TypeId::INT);
    let step = tm.binary(TreeOp::Add, i_val, one, TypeId::INT);
    let step = tm.assign(i, step);
    let step = tm.expr_stmt(step);
    let loop_body = tm.compound(vec![acc, step]);
    let while_stmt = tm.stmt(Stmt::While {
        cond,
        body: loop_body,
    });

    let s_val = tm.load_of(s);
    let ret = tm.ret(Some(s_val));
    let body = tm.compound(vec![decls, while_stmt, ret]);
    tm.function("f", TypeId::INT, vec![n], Some(body));
    tm
}

#[test]
fn while_loop_block_layout() {
    let (ctx, m) = lower(&sum_below());
    verify_module(&ctx, &m).unwrap();
    let f = func_named(&ctx, &m, "f");
    let blocks = ctx.function(f).blocks().to_vec();
    assert_eq!(blocks.len(), 4);
    let [entry, cond, body, exit] = [blocks[0], blocks[1], blocks[2], blocks[3]];
    assert_eq!(ctx.successors(entry).as_slice(), &[cond]);
    assert_eq!(ctx.successors(cond).as_slice(), &[body, exit]);
    assert_eq!(ctx.successors(body).as_slice(), &[cond]);
    assert_eq!(ctx.predecessors(cond).as_slice(), &[entry, body]);
}

#[test]
fn while_loop_promotes_to_header_phis() {
    let (ctx, m) = optimized(&sum_below());
    let f = func_named(&ctx, &m, "f");
    let cond = ctx.function(f).blocks()[1];
    let phis = ctx
        .block(cond)
        .instrs()
        .iter()
        .filter(|&&i| ctx.instr(i).is_phi())
        .count();
    assert_eq!(phis, 2);
    let memory = count(&ctx, f, |k| {
        matches!(k, InstrKind::Alloca { .. } | InstrKind::Load | InstrKind::Store)
    });
    assert_eq!(memory, 0);
}

#[test]
fn for_and_do_while_with_break_and_continue() {
    // void f(int n) {
    //     for (int i = 0; i < n; i++) { if (i == 5) continue; if (i == 8) break; }
    //     do { n--; } while (n > 0);
    // }
    let mut tm = tree();
    let n = tm.param("n", TypeId::INT);
    let zero = tm.int_lit(0, TypeId::INT);
    let i = tm.local("i", TypeId::INT, Some(zero));
    let init = tm.decl_stmt(i);
    let i_val = tm.load_of(i);
    let n_val = tm.load_of(n);
    let cond = tm.binary(TreeOp::Lt, i_val, n_val, TypeId::INT);
    let place = tm.place_of(i);
    let step = tm.unary(UnaryOp::PostInc, place, TypeId::INT);

    let guard = |tm: &mut TreeModule, value: u64, exit: Stmt| {
        let i_val = tm.load_of(i);
        let lit = tm.int_lit(value, TypeId::INT);
        let cond = tm.binary(TreeOp::Eq, i_val, lit, TypeId::INT);
        let then_branch = tm.stmt(exit);
        tm.stmt(Stmt::If {
            cond,
            then_branch,
            else_branch: None,
        })
    };
    let skip = guard(&mut tm, 5, Stmt::Continue);
    let stop = guard(&mut tm, 8, Stmt::Break);
    let loop_body = tm.compound(vec![skip, stop]);
    let for_stmt = tm.stmt(Stmt::For {
        init: Some(init),
        cond: Some(cond),
        step: Some(step),
        body: loop_body,
    });

    let place = tm.place_of(n);
    let dec = tm.unary(UnaryOp::PostDec, place, TypeId::INT);
    let dec = tm.expr_stmt(dec);
    let do_body = tm.compound(vec![dec]);
    let n_val = tm.load_of(n);
    let zero = tm.int_lit(0, TypeId::INT);
    let do_cond = tm.binary(TreeOp::Gt, n_val, zero, TypeId::INT);
    let do_while = tm.stmt(Stmt::DoWhile {
        body: do_body,
        cond: do_cond,
    });
    let body = tm.compound(vec![for_stmt, do_while]);
    tm.function("f", TypeId::VOID, vec![n], Some(body));

    let (ctx, m) = lower(&tm);
    verify_module(&ctx, &m).unwrap();
    let f = func_named(&ctx, &m, "f");
    for &block in ctx.function(f).blocks() {
        assert!(ctx.block(block).is_terminated());
    }
    let (ctx, m) = optimized(&tm);
    let f = func_named(&ctx, &m, "f");
    assert_eq!(count(&ctx, f, |k| matches!(k, InstrKind::Alloca { .. })), 0);
}

#[test]
fn switch_adds_cases_and_default() {
    // int f(int x) {
    //     switch (x) { case 1: return 10; case 2: x = 3; break; default: return 0; }
    //     return x;
    // }
    let mut tm = tree();
    let x = tm.param("x", TypeId::INT);
    let ten = tm.int_lit(10, TypeId::INT);
    let ret_ten = tm.ret(Some(ten));
    let one = tm.int_lit(1, TypeId::INT);
    let case_one = tm.stmt(Stmt::Case {
        value: one,
        body: ret_ten,
    });
    let three = tm.int_lit(3, TypeId::INT);
    let assign = tm.assign(x, three);
    let assign = tm.expr_stmt(assign);
    let two = tm.int_lit(2, TypeId::INT);
    let case_two = tm.stmt(Stmt::Case {
        value: two,
        body: assign,
    });
    let brk = tm.stmt(Stmt::Break);
    let zero = tm.int_lit(0, TypeId::INT);
    let ret_zero = tm.ret(Some(zero));
    let default = tm.stmt(Stmt::Default { body: ret_zero });
    let switch_body = tm.compound(vec![case_one, case_two, brk, default]);
    let scrutinee = tm.load_of(x);
    let switch = tm.stmt(Stmt::Switch {
        scrutinee,
        body: switch_body,
    });
    let x_val = tm.load_of(x);
    let ret = tm.ret(Some(x_val));
    let body = tm.compound(vec![switch, ret]);
    tm.function("f", TypeId::INT, vec![x], Some(body));

    let (ctx, m) = lower(&tm);
    verify_module(&ctx, &m).unwrap();
    let f = func_named(&ctx, &m, "f");
    let blocks = ctx.function(f).blocks().to_vec();
    assert_eq!(blocks.len(), 5);

    let switch = ctx.block(blocks[0]).terminator().unwrap();
    assert_eq!(ctx.instr(switch).branch_kind(), Some(BranchKind::Switch));
    let (_, default) = ctx.instr(switch).switch_head().unwrap();
    assert_eq!(ctx.label_block(default), Some(blocks[3]));
    let cases: Vec<(Option<i64>, Option<_>)> = ctx
        .instr(switch)
        .switch_cases()
        .unwrap()
        .map(|(value, dest)| (constant(&ctx, value), ctx.label_block(dest)))
        .collect();
    assert_eq!(cases, vec![(Some(1), Some(blocks[1])), (Some(2), Some(blocks[2]))]);
    assert_eq!(ctx.successors(blocks[2]).as_slice(), &[blocks[4]]);
}

#[test]
fn goto_reaches_forward_label() {
    // void f() { goto end; end: ; }
    let mut tm = tree();
    let end = tm.label("end");
    let goto = tm.stmt(Stmt::Goto(end));
    let empty = tm.stmt(Stmt::Expr(None));
    let labeled = tm.stmt(Stmt::Labeled {
        label: end,
        body: empty,
    });
    let body = tm.compound(vec![goto, labeled]);
    tm.function("f", TypeId::VOID, vec![], Some(body));

    let (ctx, m) = lower(&tm);
    verify_module(&ctx, &m).unwrap();
    let f = func_named(&ctx, &m, "f");
    assert_eq!(mnemonics(&ctx, f), vec![vec!["jmp"], vec!["ret"]]);
}

// ── Short-circuit and conditional expressions ───────────────────────

#[test]
fn logical_and_chain_shares_one_phi() {
    // int f(int a, int b, int c) { return a && b && c; }
    let mut tm = tree();
    let params: Vec<_> = ["a", "b", "c"]
        .iter()
        .map(|name| tm.param(name, TypeId::INT))
        .collect();
    let a = tm.load_of(params[0]);
    let b = tm.load_of(params[1]);
    let c = tm.load_of(params[2]);
    let ab = tm.binary(TreeOp::LogAnd, a, b, TypeId::INT);
    let abc = tm.binary(TreeOp::LogAnd, ab, c, TypeId::INT);
    let ret = tm.ret(Some(abc));
    let body = tm.compound(vec![ret]);
    tm.function("f", TypeId::INT, params, Some(body));

    let (ctx, m) = lower(&tm);
    verify_module(&ctx, &m).unwrap();
    let f = func_named(&ctx, &m, "f");
    let blocks = ctx.function(f).blocks().to_vec();
    assert_eq!(blocks.len(), 4);

    let exit = blocks[3];
    let phi = ctx.block(exit).instrs()[0];
    let preds: Vec<_> = ctx
        .instr(phi)
        .phi_incoming()
        .unwrap()
        .map(|(_, label)| ctx.label_block(label).unwrap())
        .collect();
    assert_eq!(preds, blocks[..3].to_vec());
    assert_eq!(returned_value(&ctx, f), ctx.instr(phi).result());
}

#[test]
fn logical_or_short_circuits_on_true() {
    // int f(int a, int b) { return a || b; }
    let mut tm = tree();
    let a = tm.param("a", TypeId::INT);
    let b = tm.param("b", TypeId::INT);
    let a_val = tm.load_of(a);
    let b_val = tm.load_of(b);
    let or = tm.binary(TreeOp::LogOr, a_val, b_val, TypeId::INT);
    let ret = tm.ret(Some(or));
    let body = tm.compound(vec![ret]);
    tm.function("f", TypeId::INT, vec![a, b], Some(body));

    let (ctx, m) = lower(&tm);
    let f = func_named(&ctx, &m, "f");
    let blocks = ctx.function(f).blocks().to_vec();
    let br = ctx.block(blocks[0]).terminator().unwrap();
    let (_, if_true, if_false) = ctx.instr(br).cond_jump_parts().unwrap();
    assert_eq!(ctx.label_block(if_true), Some(blocks[2]));
    assert_eq!(ctx.label_block(if_false), Some(blocks[1]));
}

#[test]
fn conditional_expression_merges_with_phi() {
    // int f(int c) { return c ? 1 : 2; }
    let mut tm = tree();
    let c = tm.param("c", TypeId::INT);
    let c_val = tm.load_of(c);
    let one = tm.int_lit(1, TypeId::INT);
    let two = tm.int_lit(2, TypeId::INT);
    let select = tm.rvalue(
        ExprKind::Conditional {
            cond: c_val,
            then_expr: one,
            else_expr: two,
        },
        TypeId::INT,
    );
    let ret = tm.ret(Some(select));
    let body = tm.compound(vec![ret]);
    tm.function("f", TypeId::INT, vec![c], Some(body));

    let (ctx, m) = optimized(&tm);
    let f = func_named(&ctx, &m, "f");
    assert_eq!(count(&ctx, f, |k| k == InstrKind::Phi), 1);
    let ret = returned_value(&ctx, f).unwrap();
    let phi = ctx.def_instr(ret).unwrap();
    let values: Vec<Option<i64>> = ctx
        .instr(phi)
        .phi_incoming()
        .unwrap()
        .map(|(v, _)| constant(&ctx, v))
        .collect();
    assert_eq!(values, vec![Some(1), Some(2)]);
}

// ── Pointers and records ────────────────────────────────────────────

#[test]
fn pointer_plus_integer_scales_through_address() {
    // int f(int *p) { return *(p + 1); }
    let mut tm = tree();
    let int_ptr = tm.types.pointer_to(TypeId::INT);
    let p = tm.param("p", int_ptr);
    let p_val = tm.load_of(p);
    let one = tm.int_lit(1, TypeId::INT);
    let sum = tm.binary(TreeOp::Add, p_val, one, int_ptr);
    let deref = tm.unary(UnaryOp::Deref, sum, TypeId::INT);
    let ret = tm.ret(Some(deref));
    let body = tm.compound(vec![ret]);
    tm.function("f", TypeId::INT, vec![p], Some(body));

    let (ctx, m) = optimized(&tm);
    let f = func_named(&ctx, &m, "f");
    assert_eq!(mnemonics(&ctx, f), vec![vec!["getaddr", "load", "ret"]]);
    let addr = all_instrs(&ctx, f)[0];
    let data = ctx.instr(addr);
    assert_eq!(data.operand(0), ctx.function(f).params()[0]);
    assert_eq!(constant(&ctx, data.operand(1)), Some(1));
    assert_eq!(ctx.ty(data.operand(1)), TypeId::LONG);
    assert_eq!(ctx.ty(data.result().unwrap()), int_ptr);
}

#[test]
fn pointer_difference_divides_by_element_size() {
    // long f(int *p, int *q) { return p - q; }
    let mut tm = tree();
    let int_ptr = tm.types.pointer_to(TypeId::INT);
    let p = tm.param("p", int_ptr);
    let q = tm.param("q", int_ptr);
    let p_val = tm.load_of(p);
    let q_val = tm.load_of(q);
    let diff = tm.binary(TreeOp::Sub, p_val, q_val, TypeId::LONG);
    let ret = tm.ret(Some(diff));
    let body = tm.compound(vec![ret]);
    tm.function("f", TypeId::LONG, vec![p, q], Some(body));

    let (ctx, m) = optimized(&tm);
    let f = func_named(&ctx, &m, "f");
    assert_eq!(mnemonics(&ctx, f), vec![vec!["cast", "cast", "sub", "div", "ret"]]);
    let ret = returned_value(&ctx, f).unwrap();
    let div = ctx.def_instr(ret).unwrap();
    assert_eq!(constant(&ctx, ctx.instr(div).operand(1)), Some(4));
}

#[test]
fn subscript_accepts_either_operand_order() {
    // int f(int *p, int i) { return p[i] + i[p]; }
    let mut tm = tree();
    let int_ptr = tm.types.pointer_to(TypeId::INT);
    let p = tm.param("p", int_ptr);
    let i = tm.param("i", TypeId::INT);
    let p_val = tm.load_of(p);
    let i_val = tm.load_of(i);
    let forward = tm.rvalue(
        ExprKind::Subscript {
            base: p_val,
            index: i_val,
        },
        TypeId::INT,
    );
    let p_val = tm.load_of(p);
    let i_val = tm.load_of(i);
    let backward = tm.rvalue(
        ExprKind::Subscript {
            base: i_val,
            index: p_val,
        },
        TypeId::INT,
    );
    let sum = tm.binary(TreeOp::Add, forward, backward, TypeId::INT);
    let ret = tm.ret(Some(sum));
    let body = tm.compound(vec![ret]);
    tm.function("f", TypeId::INT, vec![p, i], Some(body));

    let (ctx, m) = optimized(&tm);
    let f = func_named(&ctx, &m, "f");
    let p_param = ctx.function(f).params()[0];
    let bases: Vec<_> = all_instrs(&ctx, f)
        .into_iter()
        .filter(|&i| ctx.instr(i).kind() == InstrKind::Address)
        .map(|i| ctx.instr(i).operand(0))
        .collect();
    assert_eq!(bases, vec![p_param, p_param]);
}

#[test]
fn member_access_uses_field_offsets() {
    // struct S { int a; long b; };
    // long f(struct S *s) { struct S local; local.a = 1; return s->b + local.a; }
    let mut tm = tree();
    let s_name = tm.names.intern("S");
    let (record, s_ty) = tm.types.declare_record(s_name, RecordKind::Struct);
    let fields = vec![
        Field {
            name: tm.names.intern("a"),
            ty: TypeId::INT,
        },
        Field {
            name: tm.names.intern("b"),
            ty: TypeId::LONG,
        },
    ];
    tm.types.define_record(record, fields);
    let s_ptr = tm.types.pointer_to(s_ty);

    let s = tm.param("s", s_ptr);
    let local = tm.local("local", s_ty, None);
    let decl = tm.decl_stmt(local);
    let base = tm.place_of(local);
    let field_a = tm.expr(
        ExprKind::Member {
            base,
            field: 0,
            arrow: false,
        },
        TypeId::INT,
        ValueCategory::LValue,
    );
    let one = tm.int_lit(1, TypeId::INT);
    let store = tm.binary(TreeOp::Assign, field_a, one, TypeId::INT);
    let store = tm.expr_stmt(store);

    let s_val = tm.load_of(s);
    let b = tm.rvalue(
        ExprKind::Member {
            base: s_val,
            field: 1,
            arrow: true,
        },
        TypeId::LONG,
    );
    let base = tm.place_of(local);
    let a = tm.rvalue(
        ExprKind::Member {
            base,
            field: 0,
            arrow: false,
        },
        TypeId::INT,
    );
    let a = tm.cast(a, TypeId::LONG);
    let sum = tm.binary(TreeOp::Add, b, a, TypeId::LONG);
    let ret = tm.ret(Some(sum));
    let body = tm.compound(vec![decl, store, ret]);
    tm.function("f", TypeId::LONG, vec![s], Some(body));

    let (ctx, m) = lower(&tm);
    verify_module(&ctx, &m).unwrap();
    assert_eq!(m.record_types(), &[s_ty]);

    let f = func_named(&ctx, &m, "f");
    let offsets: Vec<Option<i64>> = all_instrs(&ctx, f)
        .into_iter()
        .filter(|&i| ctx.instr(i).kind() == InstrKind::Address)
        .map(|i| constant(&ctx, ctx.instr(i).operand(2)))
        .collect();
    assert_eq!(offsets, vec![Some(0), Some(8), Some(0)]);

    // The record slot has its address taken by field access and stays.
    let (ctx, m) = optimized(&tm);
    let f = func_named(&ctx, &m, "f");
    assert_eq!(count(&ctx, f, |k| matches!(k, InstrKind::Alloca { .. })), 1);
}

// ── Module-level definitions ────────────────────────────────────────

#[test]
fn equal_string_literals_share_a_definition() {
    let mut tm = tree();
    let char_ptr = tm.types.pointer_to(TypeId::CHAR);
    for name in ["f", "g"] {
        let hi = tm.string_lit("hi");
        let ret = tm.ret(Some(hi));
        let body = tm.compound(vec![ret]);
        tm.function(name, char_ptr, vec![], Some(body));
    }

    let (ctx, m) = lower(&tm);
    verify_module(&ctx, &m).unwrap();
    let strings: Vec<_> = m
        .definitions()
        .iter()
        .filter(|d| d.kind == DefKind::String)
        .collect();
    assert_eq!(strings.len(), 1);
    assert_eq!(ctx.names.lookup(strings[0].name), "hi");
    assert!(matches!(
        ctx.value(strings[0].value).kind(),
        ValueKind::StringRef(_)
    ));

    let sources: Vec<ValueId> = ["f", "g"]
        .iter()
        .map(|name| {
            let f = func_named(&ctx, &m, name);
            let ret = returned_value(&ctx, f).unwrap();
            let cast = ctx.def_instr(ret).unwrap();
            ctx.instr(cast).operand(0)
        })
        .collect();
    assert_eq!(sources, vec![strings[0].value, strings[0].value]);
}

#[test]
fn file_scope_variables_keep_initializers() {
    // int counter = 3; int later; int later = 9; _Thread_local long tls;
    // char *s = "hi";
    let mut tm = tree();
    let three = tm.int_lit(3, TypeId::INT);
    tm.global_var("counter", TypeId::INT, Some(three));
    tm.global_var("later", TypeId::INT, None);
    let nine = tm.int_lit(9, TypeId::INT);
    tm.global_var("later", TypeId::INT, Some(nine));
    let tls = tm.decl(
        "tls",
        DeclKind::Var {
            ty: TypeId::LONG,
            storage: StorageDuration::Thread,
            init: None,
            global: true,
        },
    );
    tm.add_global(tls);
    let char_ptr = tm.types.pointer_to(TypeId::CHAR);
    let hi = tm.string_lit("hi");
    tm.global_var("s", char_ptr, Some(hi));

    let (ctx, m) = lower(&tm);
    let init_of = |name: &str| match variable(&ctx, &m, name) {
        DefKind::Variable { init, .. } => init.and_then(|v| v.to_i64()),
        other => panic!("{name} is {other:?}"),
    };
    assert_eq!(init_of("counter"), Some(3));
    assert_eq!(init_of("later"), Some(9));
    assert_eq!(init_of("s"), None);
    assert!(matches!(
        variable(&ctx, &m, "tls"),
        DefKind::Variable {
            ty: TypeId::LONG,
            init: None,
            thread_local: true,
        }
    ));
    assert_eq!(m.functions().count(), 0);
}

#[test]
fn bool_static_initializers_normalize_to_one() {
    // static _Bool flag = (_Bool)256; _Bool bare = 2;
    let mut tm = tree();
    let wide = tm.int_lit(256, TypeId::INT);
    let wide = tm.cast(wide, TypeId::BOOL);
    tm.global_var("flag", TypeId::BOOL, Some(wide));
    let two = tm.int_lit(2, TypeId::INT);
    tm.global_var("bare", TypeId::BOOL, Some(two));

    let (ctx, m) = lower(&tm);
    for name in ["flag", "bare"] {
        let DefKind::Variable { init, .. } = variable(&ctx, &m, name) else {
            panic!("`{name}` is not a variable");
        };
        assert_eq!(init, Some(Scalar::int(1, 8, false)), "{name}");
    }
}

#[test]
fn block_scope_static_becomes_module_variable() {
    // int f() { static int n = 7; return n; }
    let mut tm = tree();
    let seven = tm.int_lit(7, TypeId::INT);
    let n = tm.decl(
        "n",
        DeclKind::Var {
            ty: TypeId::INT,
            storage: StorageDuration::Static,
            init: Some(seven),
            global: false,
        },
    );
    let decl = tm.decl_stmt(n);
    let n_val = tm.load_of(n);
    let ret = tm.ret(Some(n_val));
    let body = tm.compound(vec![decl, ret]);
    tm.function("f", TypeId::INT, vec![], Some(body));

    let (ctx, m) = lower(&tm);
    let DefKind::Variable { init, .. } = variable(&ctx, &m, "n.0") else {
        panic!("`n.0` is not a variable");
    };
    assert_eq!(init.and_then(|v| v.to_i64()), Some(7));

    let f = func_named(&ctx, &m, "f");
    assert_eq!(mnemonics(&ctx, f), vec![vec!["load", "ret"]]);
    let load = all_instrs(&ctx, f)[0];
    let addr = ctx.instr(load).operand(0);
    assert!(matches!(ctx.value(addr).kind(), ValueKind::Global(_)));
}

#[test]
fn prototype_and_definition_share_one_function() {
    // int g(int); int f() { return g(1); } int g(int x) { return x; }
    let mut tm = tree();
    let proto_param = tm.param("", TypeId::INT);
    let proto = tm.function("g", TypeId::INT, vec![proto_param], None);
    let one = tm.int_lit(1, TypeId::INT);
    let call = tm.call(proto, vec![one]);
    let ret = tm.ret(Some(call));
    let body = tm.compound(vec![ret]);
    tm.function("f", TypeId::INT, vec![], Some(body));
    let x = tm.param("x", TypeId::INT);
    let x_val = tm.load_of(x);
    let ret = tm.ret(Some(x_val));
    let body = tm.compound(vec![ret]);
    tm.function("g", TypeId::INT, vec![x], Some(body));

    let (ctx, m) = lower(&tm);
    verify_module(&ctx, &m).unwrap();
    assert_eq!(m.functions().count(), 2);
    let g = func_named(&ctx, &m, "g");
    assert!(ctx.function(g).has_body());
    assert_eq!(ctx.function(g).params().len(), 1);

    let f = func_named(&ctx, &m, "f");
    let call = all_instrs(&ctx, f)
        .into_iter()
        .find(|&i| ctx.instr(i).kind() == InstrKind::Call)
        .unwrap();
    let (callee, args) = ctx.instr(call).call_parts().unwrap();
    assert_eq!(callee, ctx.function(g).value());
    assert_eq!(args.len(), 1);
}

#[test]
fn void_calls_are_statements() {
    // void g(); void f() { g(); }
    let mut tm = tree();
    let g = tm.function("g", TypeId::VOID, vec![], None);
    let call = tm.call(g, vec![]);
    let call = tm.expr_stmt(call);
    let body = tm.compound(vec![call]);
    tm.function("f", TypeId::VOID, vec![], Some(body));

    let (ctx, m) = lower(&tm);
    verify_module(&ctx, &m).unwrap();
    let f = func_named(&ctx, &m, "f");
    assert_eq!(mnemonics(&ctx, f), vec![vec!["call", "ret"]]);
    let g = func_named(&ctx, &m, "g");
    assert!(!ctx.function(g).has_body());
}
