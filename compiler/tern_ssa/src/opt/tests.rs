//! Tests for the pass manager and the optimization pipeline.

#![allow(
    clippy::unwrap_used,
    reason = "test code uses unwrap for concise assertions"
)]

use std::cell::Cell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use tern_tree::TypeId;

use super::*;
use crate::test_helpers::{blocks, context, function, module, returned_value};
use crate::verify::VerifyError;
use crate::Builder;

/// Counts the functions it is run on.
struct Visits(Rc<Cell<usize>>);

impl Pass for Visits {
    fn name(&self) -> &'static str {
        "visits"
    }

    fn run_on_function(&self, _ctx: &mut Context, _func: FuncId) -> Result<PassResult, PassError> {
        self.0.set(self.0.get() + 1);
        Ok(PassResult::unchanged())
    }
}

/// Drops the entry block's terminator.
struct Unterminate;

impl Pass for Unterminate {
    fn name(&self) -> &'static str {
        "unterminate"
    }

    fn run_on_function(&self, ctx: &mut Context, func: FuncId) -> Result<PassResult, PassError> {
        let entry = ctx.function(func).entry().unwrap();
        let term = ctx.block(entry).terminator().unwrap();
        ctx.remove_instr(term);
        Ok(PassResult::changed(1))
    }
}

/// `int f(int x) { int y = 2 + 3; if (y) return x; return y; }` spelled
/// out with a stack slot, plus a body-less prototype `g`.
fn sample(ctx: &mut Context) -> Module {
    let mut m = module(ctx);
    function(ctx, &mut m, "g", TypeId::VOID, &[]);
    let f = function(ctx, &mut m, "f", TypeId::INT, &[TypeId::INT]);
    let [entry, then, els] = blocks(ctx, f);
    let x = ctx.function(f).params()[0];
    let mut b = Builder::new(ctx);

    b.position_at_end(entry);
    let slot = b.alloca(TypeId::INT).unwrap();
    let two = b.int_const(2, TypeId::INT).unwrap();
    let three = b.int_const(3, TypeId::INT).unwrap();
    let sum = b.add(two, three).unwrap();
    b.store(sum, slot).unwrap();
    let y = b.load(slot).unwrap();
    let c = b.ne_zero(y).unwrap();
    b.cond_jump(c, then, els).unwrap();
    b.position_at_end(then);
    b.ret(Some(x)).unwrap();
    b.position_at_end(els);
    let y = b.load(slot).unwrap();
    b.ret(Some(y)).unwrap();
    m
}

#[test]
fn from_options_orders_enabled_passes() {
    let pm = PassManager::from_options(&OptimizerOptions::all());
    assert_eq!(
        pm.pass_names(),
        vec!["promote_allocas", "constant_folding", "dead_code_elimination"]
    );

    let only_dce = OptimizerOptions {
        eliminate_dead_code: true,
        ..OptimizerOptions::default()
    };
    assert_eq!(
        PassManager::from_options(&only_dce).pass_names(),
        vec!["dead_code_elimination"]
    );
    assert!(PassManager::from_options(&OptimizerOptions::default()).is_empty());
}

#[test]
fn function_passes_skip_prototypes() {
    let mut ctx = context();
    let mut m = sample(&mut ctx);
    let visits = Rc::new(Cell::new(0));
    let mut pm = PassManager::new();
    pm.add(Visits(Rc::clone(&visits)));
    pm.run(&mut ctx, &mut m).unwrap();
    assert_eq!(visits.get(), 1);
}

#[test]
fn full_pipeline_reduces_to_a_single_return() {
    let mut ctx = context();
    let mut m = sample(&mut ctx);
    optimize(&mut ctx, &mut m, &OptimizerOptions::all()).unwrap();

    let f = m.function(ctx.names.get("f").unwrap()).unwrap();
    let blocks = ctx.function(f).blocks().to_vec();
    assert_eq!(blocks.len(), 2);
    let x = ctx.function(f).params()[0];
    assert_eq!(returned_value(&ctx, f), Some(x));
    assert!(ctx.block(blocks[0]).instrs().is_empty());
    // Renumbering always runs last: the parameter, then both labels.
    assert_eq!(ctx.value(x).number(), Some(0));
    assert_eq!(ctx.value(ctx.label(blocks[1])).number(), Some(2));
}

#[test]
fn disabled_passes_leave_ir_alone_but_renumber() {
    let mut ctx = context();
    let mut m = sample(&mut ctx);
    optimize(&mut ctx, &mut m, &OptimizerOptions::default()).unwrap();

    let f = m.function(ctx.names.get("f").unwrap()).unwrap();
    assert_eq!(ctx.function(f).blocks().len(), 3);
    let entry = ctx.function(f).blocks()[0];
    assert_eq!(ctx.value(ctx.label(entry)).number(), Some(1));
}

#[test]
fn verification_failure_names_the_pass() {
    let mut ctx = context();
    let mut m = sample(&mut ctx);
    let mut pm = PassManager::new();
    pm.set_verify(true);
    pm.add(Unterminate);

    let err = pm.run(&mut ctx, &mut m).unwrap_err();
    assert!(matches!(
        err,
        PassError::Verification {
            pass: "unterminate",
            error: VerifyError::Unterminated { .. }
        }
    ));
    assert_eq!(err.to_string(), "IR is malformed after pass `unterminate`");
}

#[test]
fn broken_ir_passes_without_verification() {
    let mut ctx = context();
    let mut m = sample(&mut ctx);
    let mut pm = PassManager::new();
    pm.add(Unterminate);
    assert!(pm.run(&mut ctx, &mut m).is_ok());
}

#[test]
fn strip_phi_incoming_drops_only_the_named_edge() {
    let mut ctx = context();
    let mut m = module(&mut ctx);
    let f = function(&mut ctx, &mut m, "f", TypeId::INT, &[]);
    let [a, b_block, join] = blocks(&mut ctx, f);
    let mut b = Builder::new(&mut ctx);
    b.position_at_end(join);
    let phi = b.phi(TypeId::INT).unwrap();
    let one = b.one(TypeId::INT).unwrap();
    let two = b.int_const(2, TypeId::INT).unwrap();
    b.add_phi_incoming(phi, one, a);
    b.add_phi_incoming(phi, two, b_block);

    strip_phi_incoming(&mut ctx, join, a);
    let incoming: Vec<_> = ctx.instr(phi).phi_incoming().unwrap().collect();
    assert_eq!(incoming, vec![(two, ctx.label(b_block))]);
    assert!(!ctx.value(one).has_uses());
}

#[test]
fn passes_log_through_an_installed_subscriber() {
    let subscriber = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::new("tern_ssa=trace"))
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let mut ctx = context();
    let mut m = sample(&mut ctx);
    optimize(&mut ctx, &mut m, &OptimizerOptions::all()).unwrap();
}
