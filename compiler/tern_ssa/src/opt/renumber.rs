//! Dense renumbering.
//!
//! Within each function, parameters are numbered first, then each block's
//! label followed by the results of its instructions, in layout order.
//! Numbers restart at zero per function. Constants, globals and strings are
//! not numbered.

use super::{Pass, PassError, PassResult, PassScope};
use crate::ir::{Context, FuncId, Module, ValueId};

pub struct Renumber;

impl Pass for Renumber {
    fn name(&self) -> &'static str {
        "renumber"
    }

    fn scope(&self) -> PassScope {
        PassScope::Module
    }

    fn run_on_module(&self, ctx: &mut Context, module: &mut Module) -> Result<PassResult, PassError> {
        let mut numbered = 0;
        let funcs: Vec<FuncId> = module.functions().collect();
        for func in funcs {
            numbered += renumber_function(ctx, func) as usize;
        }
        Ok(PassResult::changed(numbered))
    }
}

/// Number `func`'s values; returns how many were numbered.
pub fn renumber_function(ctx: &mut Context, func: FuncId) -> u32 {
    let mut next = 0u32;
    let mut assign = |ctx: &mut Context, value: ValueId| {
        ctx.set_number(value, Some(next));
        next += 1;
    };

    let params = ctx.function(func).params().to_vec();
    for param in params {
        assign(ctx, param);
    }
    let blocks = ctx.function(func).blocks().to_vec();
    for block in blocks {
        let label = ctx.label(block);
        assign(ctx, label);
        let results: Vec<_> = ctx
            .block(block)
            .all_instrs()
            .filter_map(|i| ctx.instr(i).result())
            .collect();
        for result in results {
            assign(ctx, result);
        }
    }
    next
}
