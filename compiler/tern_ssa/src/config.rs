//! Knobs for IR construction and optimization.

/// Limits applied to a [`Context`](crate::Context).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ContextConfig {
    /// Maximum number of values, instructions, blocks and functions the
    /// context may hold in total. `None` means unbounded.
    pub node_limit: Option<usize>,
}

impl ContextConfig {
    pub fn with_node_limit(limit: usize) -> Self {
        ContextConfig {
            node_limit: Some(limit),
        }
    }
}

/// Which optimization passes [`optimize`](crate::optimize) runs.
///
/// Everything is off by default; the driver opts in per flag.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct OptimizerOptions {
    /// Promote scalar stack slots to SSA values, inserting phis at merges.
    pub promote_allocas: bool,
    /// Evaluate arithmetic, comparisons and casts on constant operands.
    pub fold_constants: bool,
    /// Fold constant branches and drop unreachable blocks.
    pub eliminate_dead_code: bool,
    /// Run the IR verifier after every pass.
    pub verify: bool,
}

impl OptimizerOptions {
    /// Every pass enabled, verification included.
    pub fn all() -> Self {
        OptimizerOptions {
            promote_allocas: true,
            fold_constants: true,
            eliminate_dead_code: true,
            verify: true,
        }
    }
}
