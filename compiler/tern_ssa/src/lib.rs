//! SSA middle layer of the tern C compiler.
//!
//! Takes a checked [`TreeModule`](tern_tree::TreeModule) and produces a
//! [`Module`] of functions in static single assignment form:
//!
//! - **IR** ([`ir`]): values with use-lists, instructions, blocks and
//!   functions in a [`Context`] arena
//! - **Builder** ([`Builder`]): typed instruction construction at a current
//!   block
//! - **Lowering** ([`lower_module`]): tree to IR, with locals in stack slots
//! - **Passes** ([`PassManager`]): alloca promotion, constant folding, dead
//!   code elimination, and a final renumbering of local names
//! - **Verifier** ([`verify_module`]): structural and dominance checks
//!
//! # Example
//!
//! ```ignore
//! let mut ctx = Context::from_tree(&tree, ContextConfig::default());
//! let mut module = Module::new(tree.name);
//! lower_module(&tree, &mut ctx, &mut module)?;
//! optimize(&mut ctx, &mut module, &OptimizerOptions::all())?;
//! ```

mod builder;
mod config;
mod error;
pub mod graph;
pub mod ir;
mod lower;
mod opt;
mod verify;

#[cfg(test)]
mod test_helpers;

pub use builder::Builder;
pub use config::{ContextConfig, OptimizerOptions};
pub use error::{SsaError, SsaResult};
pub use graph::DominatorTree;
pub use ir::{
    BlockId, Context, DefKind, Definition, FuncId, InstrId, InstrKind, Module, ValueId, ValueKind,
};
pub use lower::lower_module;
pub use opt::{
    optimize, ConstantFolding, DeadCodeElimination, Pass, PassError, PassManager, PassResult,
    PassScope, PassStats, PromoteAllocas, Renumber,
};
pub use verify::{verify_function, verify_module, VerifyError};
