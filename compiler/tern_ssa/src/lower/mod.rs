//! Typed tree → SSA lowering.
//!
//! [`lower_module`] walks the declarations of a [`TreeModule`] and fills a
//! [`Module`]: one function per function declaration (body-less ones stay
//! prototypes), one variable per static or thread-local object, one string
//! per distinct literal.
//!
//! # Architecture
//!
//! - [`Lowerer`] carries the per-translation-unit state: the builder (whose
//!   current block is the lowering position), the definitions stack, the
//!   label table, the break/continue stacks and open switches.
//! - `decl.rs` lowers functions, variables and parameters.
//! - `stmt.rs` lowers statements into blocks and branches.
//! - `expr.rs` lowers expressions into instructions.
//!
//! # Blocks
//!
//! A block is created detached and appended to the function when it is
//! terminated, so layout order is the order in which blocks are finished.
//! The function's first block is current from the start and is always the
//! first one finished, which keeps it at the front as the entry.
//!
//! Local variables live in stack slots: every automatic variable and
//! parameter gets an `alloca` at the top of the entry block, and reads and
//! writes go through loads and stores. Phis for variables are introduced
//! later by the promotion pass; lowering only emits phis for `&&`, `||` and
//! `?:`.

mod decl;
mod expr;
mod scope;
mod stmt;

use rustc_hash::{FxHashMap, FxHashSet};
use tern_tree::{DeclId, DeclKind, Name, TreeModule, TypeId, TypeKind};

use crate::builder::Builder;
use crate::ir::{BlockId, Context, FuncId, InstrId, InstrKind, Module, ValueId};
use crate::SsaResult;

use self::scope::DefinitionStack;

/// Minimum stack space to keep available before recursing.
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f` on a stack with at least [`RED_ZONE`] bytes left, growing it if
/// needed. Wraps every recursive step of the tree walk.
#[inline]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// Lower every declaration of `tree` into `module`.
///
/// On failure the error is returned immediately; definitions added before
/// it stay in `module`.
pub fn lower_module(tree: &TreeModule, ctx: &mut Context, module: &mut Module) -> SsaResult<()> {
    let mut lowerer = Lowerer::new(tree, ctx, module);
    for &decl in &tree.decls {
        lowerer.lower_global_decl(decl)?;
    }
    Ok(())
}

/// Destination of `break` inside a `switch`, plus what `case` and
/// `default` need.
struct SwitchContext {
    instr: InstrId,
    scrutinee_ty: TypeId,
}

pub(crate) struct Lowerer<'a> {
    tree: &'a TreeModule,
    builder: Builder<'a>,
    module: &'a mut Module,

    // Per-function state.
    function: Option<FuncId>,
    entry: Option<BlockId>,
    /// Last alloca placed in the entry block; new slots go after it.
    alloca_cursor: Option<InstrId>,
    defs: DefinitionStack,
    labels: FxHashMap<DeclId, BlockId>,
    break_stack: Vec<BlockId>,
    continue_stack: Vec<BlockId>,
    switches: Vec<SwitchContext>,

    // Per-module state.
    /// File-scope functions and variables by name.
    globals: FxHashMap<Name, ValueId>,
    emitted_records: FxHashSet<TypeId>,
    static_counter: u32,
}

impl<'a> Lowerer<'a> {
    fn new(tree: &'a TreeModule, ctx: &'a mut Context, module: &'a mut Module) -> Self {
        Lowerer {
            tree,
            builder: Builder::new(ctx),
            module,
            function: None,
            entry: None,
            alloca_cursor: None,
            defs: DefinitionStack::new(),
            labels: FxHashMap::default(),
            break_stack: Vec::new(),
            continue_stack: Vec::new(),
            switches: Vec::new(),
            globals: FxHashMap::default(),
            emitted_records: FxHashSet::default(),
            static_counter: 0,
        }
    }

    #[inline]
    fn ctx(&self) -> &Context {
        self.builder.ctx()
    }

    #[inline]
    fn ctx_mut(&mut self) -> &mut Context {
        self.builder.ctx_mut()
    }

    fn current_function(&self) -> FuncId {
        self.function
            .unwrap_or_else(|| panic!("lowering a statement outside of a function"))
    }

    fn decl_kind(&self, decl: DeclId) -> &'a DeclKind {
        &self.tree.arena.decl(decl).kind
    }

    // ── Blocks ──────────────────────────────────────────────────

    fn new_block(&mut self) -> SsaResult<BlockId> {
        self.ctx_mut().new_block()
    }

    fn enter_block(&mut self, block: BlockId) {
        self.builder.position_at_end(block);
    }

    /// The current block, opening a fresh (unreachable) one if the previous
    /// block was just terminated.
    fn ensure_block(&mut self) -> SsaResult<BlockId> {
        if let Some(block) = self.builder.block() {
            return Ok(block);
        }
        let block = self.new_block()?;
        self.enter_block(block);
        Ok(block)
    }

    fn current_block(&self) -> BlockId {
        self.builder
            .block()
            .unwrap_or_else(|| panic!("no current block"))
    }

    /// Append the just-terminated `block` to the function.
    fn finish_block(&mut self, block: BlockId) {
        let func = self.current_function();
        self.ctx_mut().append_block(func, block);
    }

    fn jump(&mut self, dest: BlockId) -> SsaResult<()> {
        let block = self.ensure_block()?;
        self.builder.jump(dest)?;
        self.finish_block(block);
        Ok(())
    }

    /// Jump to `dest` unless control already left the current block.
    fn maybe_jump(&mut self, dest: BlockId) -> SsaResult<()> {
        if self.builder.block().is_some() {
            self.jump(dest)?;
        }
        Ok(())
    }

    fn branch(&mut self, cond: ValueId, if_true: BlockId, if_false: BlockId) -> SsaResult<()> {
        let block = self.current_block();
        self.builder.cond_jump(cond, if_true, if_false)?;
        self.finish_block(block);
        Ok(())
    }

    fn ret(&mut self, value: Option<ValueId>) -> SsaResult<()> {
        let block = self.ensure_block()?;
        self.builder.ret(value)?;
        self.finish_block(block);
        Ok(())
    }

    /// An empty phi of type `ty` at the front of `block`.
    fn phi_in(&mut self, block: BlockId, ty: TypeId) -> SsaResult<InstrId> {
        let phi = self.ctx_mut().new_instr(InstrKind::Phi, Some(ty), &[])?;
        self.ctx_mut().insert_phi(block, phi);
        Ok(phi)
    }

    fn add_incoming(&mut self, phi: InstrId, value: ValueId, pred: BlockId) {
        self.builder.add_phi_incoming(phi, value, pred);
    }

    /// Stack slot for a `ty` at the top of the entry block.
    fn alloca(&mut self, ty: TypeId) -> SsaResult<ValueId> {
        let entry = self
            .entry
            .unwrap_or_else(|| panic!("stack slot requested outside of a function"));
        let (instr, ptr) = self.builder.alloca_after(entry, self.alloca_cursor, ty)?;
        self.alloca_cursor = Some(instr);
        Ok(ptr)
    }

    /// Record `ty` (and the records it mentions) in the module type list.
    fn note_type(&mut self, mut ty: TypeId) {
        loop {
            match self.ctx().types.kind(ty).clone() {
                TypeKind::Pointer(inner) | TypeKind::Array { elem: inner, .. } => ty = inner,
                TypeKind::Function { ret, params, .. } => {
                    for param in params {
                        self.note_type(param);
                    }
                    ty = ret;
                }
                TypeKind::Record(record) => {
                    if !self.emitted_records.insert(ty) {
                        return;
                    }
                    let fields: Vec<TypeId> = self
                        .ctx()
                        .types
                        .record(record)
                        .fields
                        .iter()
                        .map(|f| f.ty)
                        .collect();
                    for field in fields {
                        self.note_type(field);
                    }
                    self.module.add_record_type(ty);
                    return;
                }
                TypeKind::Builtin(_) | TypeKind::Enum { .. } => return,
            }
        }
    }
}

#[cfg(test)]
mod tests;
