//! Pass infrastructure and the optimization passes.
//!
//! Passes are function- or module-scoped. [`PassManager::run`] executes them
//! in registration order and always finishes with [`Renumber`], so ids are
//! dense whatever was removed along the way.
//!
//! - `promote`: stack slots to SSA values, phis at merge points
//! - `const_fold`: binary operations and casts on constants
//! - `dce`: constant branch folding and unreachable-block removal
//! - `renumber`: dense sequential value numbers

mod const_fold;
mod dce;
mod promote;
mod renumber;

pub use const_fold::ConstantFolding;
pub use dce::DeadCodeElimination;
pub use promote::PromoteAllocas;
pub use renumber::Renumber;

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::ir::{BlockId, Context, FuncId, Module};
use crate::verify::{verify_function, verify_module, VerifyError};
use crate::{OptimizerOptions, SsaError};

/// Outcome of running a pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassResult {
    pub changed: bool,
    pub stats: PassStats,
}

impl PassResult {
    pub fn unchanged() -> Self {
        PassResult::default()
    }

    /// A change of `items_transformed` items; zero items is no change.
    pub fn changed(items_transformed: usize) -> Self {
        PassResult {
            changed: items_transformed > 0,
            stats: PassStats {
                duration: Duration::ZERO,
                items_transformed,
            },
        }
    }

    fn merge(&mut self, other: &PassResult) {
        self.changed |= other.changed;
        self.stats.items_transformed += other.stats.items_transformed;
        self.stats.duration += other.stats.duration;
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassStats {
    pub duration: Duration,
    pub items_transformed: usize,
}

#[derive(Debug, Error)]
pub enum PassError {
    #[error("IR is malformed after pass `{pass}`")]
    Verification {
        pass: &'static str,
        #[source]
        error: VerifyError,
    },

    #[error(transparent)]
    Ssa(#[from] SsaError),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PassScope {
    /// Run once per function with a body.
    Function,
    /// Run once over the whole module.
    Module,
}

pub trait Pass {
    fn name(&self) -> &'static str;

    fn scope(&self) -> PassScope {
        PassScope::Function
    }

    fn run_on_function(&self, _ctx: &mut Context, _func: FuncId) -> Result<PassResult, PassError> {
        Ok(PassResult::unchanged())
    }

    fn run_on_module(&self, _ctx: &mut Context, _module: &mut Module) -> Result<PassResult, PassError> {
        Ok(PassResult::unchanged())
    }
}

impl<T: Pass + ?Sized> Pass for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn scope(&self) -> PassScope {
        (**self).scope()
    }

    fn run_on_function(&self, ctx: &mut Context, func: FuncId) -> Result<PassResult, PassError> {
        (**self).run_on_function(ctx, func)
    }

    fn run_on_module(&self, ctx: &mut Context, module: &mut Module) -> Result<PassResult, PassError> {
        (**self).run_on_module(ctx, module)
    }
}

/// Ordered list of passes.
#[derive(Default)]
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
    verify: bool,
}

impl PassManager {
    pub fn new() -> Self {
        PassManager::default()
    }

    /// The pipeline selected by `options`: promotion, folding, then dead
    /// code elimination.
    pub fn from_options(options: &OptimizerOptions) -> Self {
        let mut pm = PassManager::new();
        pm.set_verify(options.verify);
        if options.promote_allocas {
            pm.add(PromoteAllocas);
        }
        if options.fold_constants {
            pm.add(ConstantFolding);
        }
        if options.eliminate_dead_code {
            pm.add(DeadCodeElimination);
        }
        pm
    }

    pub fn add<P: Pass + 'static>(&mut self, pass: P) {
        self.passes.push(Box::new(pass));
    }

    /// Verify the IR after every pass, failing on the first problem.
    pub fn set_verify(&mut self, verify: bool) {
        self.verify = verify;
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Run every pass over `module`, then renumber.
    pub fn run(&self, ctx: &mut Context, module: &mut Module) -> Result<(), PassError> {
        for pass in &self.passes {
            self.run_pass(pass.as_ref(), ctx, module)?;
        }
        self.run_pass(&Renumber, ctx, module)
    }

    fn run_pass(&self, pass: &dyn Pass, ctx: &mut Context, module: &mut Module) -> Result<(), PassError> {
        let name = pass.name();
        let start = Instant::now();
        let mut result = match pass.scope() {
            PassScope::Module => pass.run_on_module(ctx, module)?,
            PassScope::Function => {
                let mut total = PassResult::unchanged();
                let funcs: Vec<FuncId> = module.functions().collect();
                for func in funcs {
                    if !ctx.function(func).has_body() {
                        continue;
                    }
                    let result = pass.run_on_function(ctx, func)?;
                    total.merge(&result);
                    if self.verify {
                        verify_function(ctx, func)
                            .map_err(|error| PassError::Verification { pass: name, error })?;
                    }
                }
                total
            }
        };
        result.stats.duration = start.elapsed();

        if self.verify && pass.scope() == PassScope::Module {
            verify_module(ctx, module)
                .map_err(|error| PassError::Verification { pass: name, error })?;
        }

        tracing::debug!(
            pass = name,
            changed = result.changed,
            items = result.stats.items_transformed,
            duration_us = result.stats.duration.as_micros(),
            "pass finished"
        );
        Ok(())
    }
}

/// Run the passes `options` enables over `module`, then renumber.
pub fn optimize(
    ctx: &mut Context,
    module: &mut Module,
    options: &OptimizerOptions,
) -> Result<(), PassError> {
    PassManager::from_options(options).run(ctx, module)
}

/// Drop the incoming pairs of every phi in `block` that name `pred`.
pub(crate) fn strip_phi_incoming(ctx: &mut Context, block: BlockId, pred: BlockId) {
    let pred_label = ctx.label(pred);
    let phis: Vec<_> = ctx
        .block(block)
        .instrs()
        .iter()
        .copied()
        .take_while(|&i| ctx.instr(i).is_phi())
        .collect();
    for phi in phis {
        let mut slot = 0;
        while slot + 1 < ctx.instr(phi).operands().len() {
            if ctx.instr(phi).operand(slot + 1) == pred_label {
                ctx.remove_operands(phi, slot..slot + 2);
            } else {
                slot += 2;
            }
        }
    }
}

#[cfg(test)]
mod tests;
