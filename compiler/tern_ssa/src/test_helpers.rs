//! Fixtures for building IR by hand and lowering small trees in unit tests.

#![allow(
    clippy::unwrap_used,
    reason = "fixtures fail the test on arena exhaustion"
)]

use tern_tree::{Target, TreeModule, TypeId};

use crate::ir::{BlockId, Context, DefKind, Definition, FuncId, InstrId, Module, ValueId};
use crate::{lower_module, ContextConfig};

/// An empty context for an LP64 target.
pub(crate) fn context() -> Context {
    let tree = TreeModule::new("test", Target::lp64());
    Context::from_tree(&tree, ContextConfig::default())
}

pub(crate) fn module(ctx: &mut Context) -> Module {
    Module::new(ctx.names.intern("test"))
}

/// Declare `name` with parameters of `params` and return type `ret` in
/// `module`. The function has no blocks yet.
pub(crate) fn function(
    ctx: &mut Context,
    module: &mut Module,
    name: &str,
    ret: TypeId,
    params: &[TypeId],
) -> FuncId {
    let ty = ctx.types.function(ret, params, false);
    let name = ctx.names.intern(name);
    let func = ctx.new_function(name, None, ty).unwrap();
    for &param in params {
        ctx.add_param(func, param).unwrap();
    }
    let value = ctx.function(func).value();
    module.define(Definition {
        name,
        value,
        kind: DefKind::Function(func),
    });
    func
}

/// A fresh block appended to `func`.
pub(crate) fn block(ctx: &mut Context, func: FuncId) -> BlockId {
    let block = ctx.new_block().unwrap();
    ctx.append_block(func, block);
    block
}

/// `N` fresh blocks appended to `func`, in order.
pub(crate) fn blocks<const N: usize>(ctx: &mut Context, func: FuncId) -> [BlockId; N] {
    std::array::from_fn(|_| block(ctx, func))
}

pub(crate) fn int(ctx: &mut Context, value: i64) -> ValueId {
    ctx.constant_of(tern_eval::Scalar::from_i64(value, 64, true), TypeId::INT)
        .unwrap()
}

/// Lower `tree` into a fresh context and module.
pub(crate) fn lower(tree: &TreeModule) -> (Context, Module) {
    let mut ctx = Context::from_tree(tree, ContextConfig::default());
    let mut module = Module::new(tree.name);
    lower_module(tree, &mut ctx, &mut module).unwrap();
    (ctx, module)
}

/// The function named `name` in `module`.
pub(crate) fn func_named(ctx: &Context, module: &Module, name: &str) -> FuncId {
    let name = ctx.names.get(name).unwrap();
    module.function(name).unwrap()
}

/// Mnemonics of every instruction in `func`, block by block, terminators
/// included.
pub(crate) fn mnemonics(ctx: &Context, func: FuncId) -> Vec<Vec<&'static str>> {
    ctx.function(func)
        .blocks()
        .iter()
        .map(|&b| {
            ctx.block(b)
                .all_instrs()
                .map(|i| ctx.instr(i).kind().mnemonic())
                .collect()
        })
        .collect()
}

/// Every instruction of `func` in layout order.
pub(crate) fn all_instrs(ctx: &Context, func: FuncId) -> Vec<InstrId> {
    ctx.function(func)
        .blocks()
        .iter()
        .flat_map(|&b| ctx.block(b).all_instrs().collect::<Vec<_>>())
        .collect()
}

/// The value returned by the single `ret` in `func`.
pub(crate) fn returned_value(ctx: &Context, func: FuncId) -> Option<ValueId> {
    let rets: Vec<ValueId> = all_instrs(ctx, func)
        .into_iter()
        .filter_map(|i| ctx.instr(i).return_value().flatten())
        .collect();
    assert_eq!(rets.len(), 1, "expected exactly one value-returning `ret`");
    rets.first().copied()
}
