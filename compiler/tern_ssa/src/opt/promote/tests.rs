//! Tests for stack slot promotion and phi placement.

#![allow(
    clippy::unwrap_used,
    reason = "test code uses unwrap for concise assertions"
)]

use pretty_assertions::assert_eq;
use tern_tree::TypeId;

use super::*;
use crate::ir::ValueKind;
use crate::test_helpers::{all_instrs, blocks, context, function, module, returned_value};
use crate::verify_function;
use crate::Builder;

fn count(ctx: &Context, func: FuncId, kind: InstrKind) -> usize {
    all_instrs(ctx, func)
        .into_iter()
        .filter(|&i| ctx.instr(i).kind() == kind)
        .count()
}

fn is_memory(kind: InstrKind) -> bool {
    matches!(kind, InstrKind::Alloca { .. } | InstrKind::Load | InstrKind::Store)
}

#[test]
fn store_on_one_arm_places_phi_at_merge() {
    // int y = x; if (x) y = 5; return y;
    let mut ctx = context();
    let mut m = module(&mut ctx);
    let f = function(&mut ctx, &mut m, "f", TypeId::INT, &[TypeId::INT]);
    let [entry, then, exit] = blocks(&mut ctx, f);
    let x = ctx.function(f).params()[0];
    let mut b = Builder::new(&mut ctx);

    b.position_at_end(entry);
    let y = b.alloca(TypeId::INT).unwrap();
    b.store(x, y).unwrap();
    let c = b.ne_zero(x).unwrap();
    b.cond_jump(c, then, exit).unwrap();
    b.position_at_end(then);
    let five = b.int_const(5, TypeId::INT).unwrap();
    b.store(five, y).unwrap();
    b.jump(exit).unwrap();
    b.position_at_end(exit);
    let v = b.load(y).unwrap();
    b.ret(Some(v)).unwrap();

    let stats = promote(&mut ctx, f).unwrap();
    assert_eq!(stats, PromoteStats { slots: 1, phis: 1 });
    assert!(all_instrs(&ctx, f).into_iter().all(|i| !is_memory(ctx.instr(i).kind())));

    let phi = ctx.block(exit).instrs()[0];
    assert!(ctx.instr(phi).is_phi());
    let incoming: Vec<(ValueId, ValueId)> = ctx.instr(phi).phi_incoming().unwrap().collect();
    assert_eq!(
        incoming,
        vec![(x, ctx.label(entry)), (five, ctx.label(then))]
    );
    assert_eq!(returned_value(&ctx, f), ctx.instr(phi).result());
    verify_function(&ctx, f).unwrap();
}

#[test]
fn straight_line_slot_needs_no_phi() {
    let mut ctx = context();
    let mut m = module(&mut ctx);
    let f = function(&mut ctx, &mut m, "f", TypeId::INT, &[TypeId::INT]);
    let [entry, next] = blocks(&mut ctx, f);
    let x = ctx.function(f).params()[0];
    let mut b = Builder::new(&mut ctx);

    b.position_at_end(entry);
    let slot = b.alloca(TypeId::INT).unwrap();
    b.store(x, slot).unwrap();
    b.jump(next).unwrap();
    b.position_at_end(next);
    let v = b.load(slot).unwrap();
    b.ret(Some(v)).unwrap();

    let stats = promote(&mut ctx, f).unwrap();
    assert_eq!(stats, PromoteStats { slots: 1, phis: 0 });
    assert_eq!(returned_value(&ctx, f), Some(x));
    assert_eq!(count(&ctx, f, InstrKind::Phi), 0);
}

#[test]
fn loop_counter_gets_header_phi() {
    // int i = 0; while (i < n) i = i + 1; return i;
    let mut ctx = context();
    let mut m = module(&mut ctx);
    let f = function(&mut ctx, &mut m, "f", TypeId::INT, &[TypeId::INT]);
    let [entry, head, body, exit] = blocks(&mut ctx, f);
    let n = ctx.function(f).params()[0];
    let mut b = Builder::new(&mut ctx);

    b.position_at_end(entry);
    let i = b.alloca(TypeId::INT).unwrap();
    let zero = b.zero(TypeId::INT).unwrap();
    b.store(zero, i).unwrap();
    b.jump(head).unwrap();
    b.position_at_end(head);
    let cur = b.load(i).unwrap();
    let c = b.lt(cur, n).unwrap();
    b.cond_jump(c, body, exit).unwrap();
    b.position_at_end(body);
    let cur = b.load(i).unwrap();
    let one = b.one(TypeId::INT).unwrap();
    let next = b.add(cur, one).unwrap();
    b.store(next, i).unwrap();
    b.jump(head).unwrap();
    b.position_at_end(exit);
    let out = b.load(i).unwrap();
    b.ret(Some(out)).unwrap();

    let stats = promote(&mut ctx, f).unwrap();
    assert_eq!(stats, PromoteStats { slots: 1, phis: 1 });
    let phi = ctx.block(head).instrs()[0];
    let result = ctx.instr(phi).result();
    assert_eq!(returned_value(&ctx, f), result);
    let incoming: Vec<(ValueId, ValueId)> = ctx.instr(phi).phi_incoming().unwrap().collect();
    assert_eq!(
        incoming,
        vec![(zero, ctx.label(entry)), (next, ctx.label(body))]
    );
    verify_function(&ctx, f).unwrap();
}

#[test]
fn escaping_slot_is_not_promoted() {
    let mut ctx = context();
    let mut m = module(&mut ctx);
    let int_ptr = ctx.types.pointer_to(TypeId::INT);
    let sink = function(&mut ctx, &mut m, "sink", TypeId::VOID, &[int_ptr]);
    let f = function(&mut ctx, &mut m, "f", TypeId::INT, &[]);
    let [entry] = blocks(&mut ctx, f);
    let callee = ctx.function(sink).value();
    let mut b = Builder::new(&mut ctx);

    b.position_at_end(entry);
    let slot = b.alloca(TypeId::INT).unwrap();
    let one = b.one(TypeId::INT).unwrap();
    b.store(one, slot).unwrap();
    let call = b.begin_call(TypeId::VOID, callee).unwrap();
    b.add_call_arg(call, slot);
    b.finish_call(call);
    let v = b.load(slot).unwrap();
    b.ret(Some(v)).unwrap();

    assert_eq!(promote(&mut ctx, f).unwrap(), PromoteStats::default());
    assert_eq!(count(&ctx, f, InstrKind::Load), 1);
    assert_eq!(count(&ctx, f, InstrKind::Store), 1);
}

#[test]
fn aggregate_slots_are_not_promoted() {
    let mut ctx = context();
    let mut m = module(&mut ctx);
    let f = function(&mut ctx, &mut m, "f", TypeId::VOID, &[]);
    let [entry] = blocks(&mut ctx, f);
    let array = ctx.types.array_of(TypeId::INT, Some(4));
    let mut b = Builder::new(&mut ctx);
    b.position_at_end(entry);
    b.alloca(array).unwrap();
    b.ret(None).unwrap();

    assert_eq!(promote(&mut ctx, f).unwrap().slots, 0);
}

#[test]
fn load_before_any_store_reads_undef() {
    let mut ctx = context();
    let mut m = module(&mut ctx);
    let f = function(&mut ctx, &mut m, "f", TypeId::INT, &[]);
    let [entry] = blocks(&mut ctx, f);
    let mut b = Builder::new(&mut ctx);
    b.position_at_end(entry);
    let slot = b.alloca(TypeId::INT).unwrap();
    let v = b.load(slot).unwrap();
    b.ret(Some(v)).unwrap();

    assert_eq!(promote(&mut ctx, f).unwrap().slots, 1);
    let ret = returned_value(&ctx, f).unwrap();
    assert!(matches!(ctx.value(ret).kind(), ValueKind::Undef));
    assert_eq!(ctx.ty(ret), TypeId::INT);
}

#[test]
fn unused_merge_phi_is_pruned() {
    // The slot is written on both arms but never read after the merge.
    let mut ctx = context();
    let mut m = module(&mut ctx);
    let f = function(&mut ctx, &mut m, "f", TypeId::VOID, &[TypeId::INT]);
    let [entry, then, els, exit] = blocks(&mut ctx, f);
    let x = ctx.function(f).params()[0];
    let mut b = Builder::new(&mut ctx);

    b.position_at_end(entry);
    let slot = b.alloca(TypeId::INT).unwrap();
    b.cond_jump(x, then, els).unwrap();
    for (value, arm) in [(1, then), (2, els)] {
        b.position_at_end(arm);
        let v = b.int_const(value, TypeId::INT).unwrap();
        b.store(v, slot).unwrap();
        b.jump(exit).unwrap();
    }
    b.position_at_end(exit);
    b.ret(None).unwrap();

    let stats = promote(&mut ctx, f).unwrap();
    assert_eq!(stats, PromoteStats { slots: 1, phis: 0 });
    assert!(ctx.block(exit).instrs().is_empty());
    verify_function(&ctx, f).unwrap();
}
