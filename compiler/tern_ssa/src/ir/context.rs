//! The IR arena.
//!
//! A [`Context`] owns every value, instruction, block and function created
//! for one compilation. Nothing is freed individually: removal unlinks a node
//! from its block or function and from every use-list, and the storage goes
//! away with the context.
//!
//! Use-lists are maintained here and only here. Every operation that writes
//! an operand slot also updates the use-list of the value it stores and the
//! value it displaces, so `uses(v)` always lists exactly the `(instr, slot)`
//! pairs that hold `v`.

use std::ops::Range;

use smallvec::SmallVec;
use tern_eval::{convert_to_type, scalar_kind, Scalar};
use tern_tree::{DeclId, Name, StringInterner, Target, TreeModule, TypeId, TypePool};

use super::{
    BlockData, BlockId, FuncId, FunctionData, GlobalRef, InstrData, InstrId, InstrKind, Use,
    ValueData, ValueId, ValueKind,
};
use crate::{ContextConfig, SsaError, SsaResult};

pub struct Context {
    config: ContextConfig,
    /// Type pool; starts as a copy of the frontend's so tree type ids stay
    /// valid, and grows as lowering needs pointer types.
    pub types: TypePool,
    pub target: Target,
    pub names: StringInterner,
    values: Vec<ValueData>,
    instrs: Vec<InstrData>,
    blocks: Vec<BlockData>,
    functions: Vec<FunctionData>,
}

/// Push `item` into `arena`, reporting allocator failure instead of aborting.
fn alloc<T>(arena: &mut Vec<T>, item: T, what: &'static str) -> SsaResult<u32> {
    arena
        .try_reserve(1)
        .map_err(|_| SsaError::OutOfMemory { what })?;
    let id = u32::try_from(arena.len()).map_err(|_| SsaError::ArenaExhausted {
        what,
        limit: u32::MAX as usize,
    })?;
    arena.push(item);
    Ok(id)
}

impl Context {
    pub fn new(types: TypePool, target: Target, names: StringInterner, config: ContextConfig) -> Self {
        Context {
            config,
            types,
            target,
            names,
            values: Vec::new(),
            instrs: Vec::new(),
            blocks: Vec::new(),
            functions: Vec::new(),
        }
    }

    /// A context sharing the frontend's types, target and names.
    pub fn from_tree(tree: &TreeModule, config: ContextConfig) -> Self {
        Self::new(
            tree.types.clone(),
            tree.target.clone(),
            tree.names.clone(),
            config,
        )
    }

    #[inline]
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Total number of nodes allocated so far.
    pub fn node_count(&self) -> usize {
        self.values.len() + self.instrs.len() + self.blocks.len() + self.functions.len()
    }

    fn check_capacity(&self, what: &'static str) -> SsaResult<()> {
        match self.config.node_limit {
            Some(limit) if self.node_count() >= limit => {
                Err(SsaError::ArenaExhausted { what, limit })
            }
            _ => Ok(()),
        }
    }

    // ── Accessors ───────────────────────────────────────────────

    #[inline]
    pub fn value(&self, id: ValueId) -> &ValueData {
        &self.values[id.index()]
    }

    #[inline]
    pub fn instr(&self, id: InstrId) -> &InstrData {
        &self.instrs[id.index()]
    }

    #[inline]
    pub fn block(&self, id: BlockId) -> &BlockData {
        &self.blocks[id.index()]
    }

    #[inline]
    pub fn function(&self, id: FuncId) -> &FunctionData {
        &self.functions[id.index()]
    }

    #[inline]
    pub fn ty(&self, value: ValueId) -> TypeId {
        self.value(value).ty
    }

    #[inline]
    pub fn uses(&self, value: ValueId) -> &[Use] {
        &self.value(value).uses
    }

    /// Constant payload of `value`, if it is a constant.
    pub fn as_constant(&self, value: ValueId) -> Option<Scalar> {
        self.value(value).as_constant().copied()
    }

    /// The block a label value names.
    pub fn label_block(&self, label: ValueId) -> Option<BlockId> {
        self.value(label).as_label()
    }

    /// Label value of `block`.
    #[inline]
    pub fn label(&self, block: BlockId) -> ValueId {
        self.block(block).label
    }

    /// Instruction defining `value`, if it is an instruction result.
    pub fn def_instr(&self, value: ValueId) -> Option<InstrId> {
        self.value(value).defining_instr()
    }

    /// Block containing the instruction defining `value`.
    pub fn def_block(&self, value: ValueId) -> Option<BlockId> {
        self.def_instr(value).and_then(|i| self.instr(i).block)
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    // ── Creation ────────────────────────────────────────────────

    /// Create a detached value with an empty use-list.
    pub fn new_value(&mut self, kind: ValueKind, ty: TypeId) -> SsaResult<ValueId> {
        self.check_capacity("value")?;
        alloc(&mut self.values, ValueData::new(kind, ty), "value").map(ValueId::new)
    }

    /// A constant of type `ty`.
    ///
    /// # Panics
    ///
    /// Panics if `value`'s representation does not match `ty` on this
    /// target.
    pub fn constant(&mut self, value: Scalar, ty: TypeId) -> SsaResult<ValueId> {
        let expected = scalar_kind(&self.types, &self.target, ty);
        assert_eq!(
            expected,
            Some(value.kind()),
            "constant {value} does not fit type {ty:?}"
        );
        self.new_value(ValueKind::Constant(value), ty)
    }

    /// `value` converted to the representation of `ty` and materialized.
    pub fn constant_of(&mut self, value: Scalar, ty: TypeId) -> SsaResult<ValueId> {
        let value = convert_to_type(&self.types, &self.target, value, ty)
            .unwrap_or_else(|| panic!("type {ty:?} has no scalar representation"));
        self.new_value(ValueKind::Constant(value), ty)
    }

    pub fn undef(&mut self, ty: TypeId) -> SsaResult<ValueId> {
        self.new_value(ValueKind::Undef, ty)
    }

    /// Create a detached instruction. A result value of type `result` is
    /// created with it; `None` or `void` means no result.
    pub fn new_instr(
        &mut self,
        kind: InstrKind,
        result: Option<TypeId>,
        operands: &[ValueId],
    ) -> SsaResult<InstrId> {
        if let Some(n) = kind.arity().fixed() {
            assert_eq!(
                operands.len(),
                n,
                "`{}` takes {n} operands",
                kind.mnemonic()
            );
        }
        self.check_capacity("instruction")?;
        let data = InstrData {
            kind,
            operands: SmallVec::from_slice(operands),
            result: None,
            block: None,
        };
        let instr = InstrId::new(alloc(&mut self.instrs, data, "instruction")?);
        if let Some(ty) = result.filter(|&ty| ty != TypeId::VOID) {
            let value = self.new_value(ValueKind::Result(instr), ty)?;
            self.instrs[instr.index()].result = Some(value);
        }
        for (slot, &value) in operands.iter().enumerate() {
            self.add_use(value, instr, slot);
        }
        Ok(instr)
    }

    /// Create a detached block together with its label.
    pub fn new_block(&mut self) -> SsaResult<BlockId> {
        self.check_capacity("block")?;
        let next = u32::try_from(self.blocks.len()).map_err(|_| SsaError::ArenaExhausted {
            what: "block",
            limit: u32::MAX as usize,
        })?;
        let label = self.new_value(ValueKind::Label(BlockId::new(next)), TypeId::VOID)?;
        alloc(&mut self.blocks, BlockData::new(label), "block").map(BlockId::new)
    }

    /// Create a function without blocks or parameters. Its address is a
    /// global value of pointer-to-`ty` type.
    pub fn new_function(&mut self, name: Name, decl: Option<DeclId>, ty: TypeId) -> SsaResult<FuncId> {
        self.check_capacity("function")?;
        let next = u32::try_from(self.functions.len()).map_err(|_| SsaError::ArenaExhausted {
            what: "function",
            limit: u32::MAX as usize,
        })?;
        let ptr = self.types.pointer_to(ty);
        let global = GlobalRef {
            decl,
            name,
            function: Some(FuncId::new(next)),
        };
        let value = self.new_value(ValueKind::Global(global), ptr)?;
        let data = FunctionData {
            name,
            decl,
            ty,
            value,
            params: Vec::new(),
            blocks: Vec::new(),
        };
        alloc(&mut self.functions, data, "function").map(FuncId::new)
    }

    /// Append a parameter value of type `ty` to `func`.
    pub fn add_param(&mut self, func: FuncId, ty: TypeId) -> SsaResult<ValueId> {
        let index = u32::try_from(self.function(func).params.len())
            .unwrap_or_else(|_| panic!("too many parameters"));
        let value = self.new_value(ValueKind::Param { func, index }, ty)?;
        self.functions[func.index()].params.push(value);
        Ok(value)
    }

    // ── Placement ───────────────────────────────────────────────

    /// Append `block` to the end of `func`'s layout.
    pub fn append_block(&mut self, func: FuncId, block: BlockId) {
        let data = &mut self.blocks[block.index()];
        assert!(data.function.is_none(), "{block:?} is already placed");
        data.function = Some(func);
        self.functions[func.index()].blocks.push(block);
    }

    /// Append a non-terminating instruction to `block`.
    pub fn append_instr(&mut self, block: BlockId, instr: InstrId) {
        self.insert_instr_at(block, usize::MAX, instr);
    }

    /// Insert `instr` right after `anchor`, or at the front when `anchor` is
    /// `None`.
    pub fn insert_instr_after(&mut self, block: BlockId, anchor: Option<InstrId>, instr: InstrId) {
        let position = match anchor {
            None => 0,
            Some(anchor) => {
                let index = self.blocks[block.index()]
                    .instrs
                    .iter()
                    .position(|&i| i == anchor)
                    .unwrap_or_else(|| panic!("{anchor:?} is not in {block:?}"));
                index + 1
            }
        };
        self.insert_instr_at(block, position, instr);
    }

    /// Insert a phi at the front of `block`.
    pub fn insert_phi(&mut self, block: BlockId, phi: InstrId) {
        assert!(self.instr(phi).is_phi(), "{phi:?} is not a phi");
        self.insert_instr_at(block, 0, phi);
    }

    fn insert_instr_at(&mut self, block: BlockId, position: usize, instr: InstrId) {
        let data = &mut self.instrs[instr.index()];
        assert!(
            !data.kind.is_terminator(),
            "terminators are placed with `set_terminator`"
        );
        assert!(data.block.is_none(), "{instr:?} is already placed");
        data.block = Some(block);
        let list = &mut self.blocks[block.index()].instrs;
        let position = position.min(list.len());
        list.insert(position, instr);
    }

    /// Finish `block` with `terminator`.
    pub fn set_terminator(&mut self, block: BlockId, terminator: InstrId) {
        let data = &mut self.instrs[terminator.index()];
        assert!(data.kind.is_terminator(), "{terminator:?} is not a terminator");
        assert!(data.block.is_none(), "{terminator:?} is already placed");
        let slot = &mut self.blocks[block.index()].terminator;
        assert!(slot.is_none(), "{block:?} is already terminated");
        *slot = Some(terminator);
        data.block = Some(block);
    }

    // ── Operands and use-lists ──────────────────────────────────

    fn add_use(&mut self, value: ValueId, instr: InstrId, slot: usize) {
        let slot = u32::try_from(slot).unwrap_or_else(|_| panic!("operand slot overflow"));
        self.values[value.index()].uses.push(Use { instr, slot });
    }

    fn remove_use(&mut self, value: ValueId, instr: InstrId, slot: usize) {
        let wanted = Use {
            instr,
            slot: u32::try_from(slot).unwrap_or(u32::MAX),
        };
        let uses = &mut self.values[value.index()].uses;
        let index = uses
            .iter()
            .position(|&u| u == wanted)
            .unwrap_or_else(|| panic!("use-list of {value:?} lacks {wanted:?}"));
        uses.swap_remove(index);
    }

    /// Append an operand to a variable-arity instruction.
    pub fn add_operand(&mut self, instr: InstrId, value: ValueId) {
        let data = &mut self.instrs[instr.index()];
        assert!(
            data.kind.arity().fixed().is_none(),
            "`{}` has a fixed operand count",
            data.kind.mnemonic()
        );
        let slot = data.operands.len();
        data.operands.push(value);
        self.add_use(value, instr, slot);
    }

    /// Overwrite operand `slot` of `instr`.
    pub fn set_operand(&mut self, instr: InstrId, slot: usize, value: ValueId) {
        let old = self.instrs[instr.index()].operands[slot];
        if old == value {
            return;
        }
        self.remove_use(old, instr, slot);
        self.instrs[instr.index()].operands[slot] = value;
        self.add_use(value, instr, slot);
    }

    /// Remove the operands in `range` from a variable-arity instruction,
    /// shifting the rest down.
    pub fn remove_operands(&mut self, instr: InstrId, range: Range<usize>) {
        let old: SmallVec<[ValueId; 3]> = self.instrs[instr.index()].operands.clone();
        assert!(
            range.end <= old.len() && range.start <= range.end,
            "operand range {range:?} out of bounds for {instr:?}"
        );
        for (slot, &value) in old.iter().enumerate().skip(range.start) {
            self.remove_use(value, instr, slot);
        }
        self.instrs[instr.index()].operands.drain(range.clone());
        for slot in range.start..self.instrs[instr.index()].operands.len() {
            let value = self.instrs[instr.index()].operands[slot];
            self.add_use(value, instr, slot);
        }
    }

    /// Drop every operand of `instr`, leaving the list empty.
    fn clear_operands(&mut self, instr: InstrId) {
        let len = self.instrs[instr.index()].operands.len();
        for slot in 0..len {
            let value = self.instrs[instr.index()].operands[slot];
            self.remove_use(value, instr, slot);
        }
        self.instrs[instr.index()].operands.clear();
    }

    /// Redirect every use of `old` to `new`.
    ///
    /// # Panics
    ///
    /// Panics if the two values have different types.
    pub fn replace_all_uses(&mut self, old: ValueId, new: ValueId) {
        if old == new {
            return;
        }
        assert_eq!(
            self.ty(old),
            self.ty(new),
            "replacing {old:?} with a value of another type"
        );
        let uses = std::mem::take(&mut self.values[old.index()].uses);
        for u in &uses {
            self.instrs[u.instr.index()].operands[u.slot as usize] = new;
        }
        self.values[new.index()].uses.extend(uses);
    }

    // ── Removal ─────────────────────────────────────────────────

    /// Unlink `instr` from its block and drop its operands.
    ///
    /// # Panics
    ///
    /// Panics if the instruction's result still has uses.
    pub fn remove_instr(&mut self, instr: InstrId) {
        if let Some(result) = self.instr(instr).result {
            assert!(
                !self.value(result).has_uses(),
                "removing {instr:?} whose result {result:?} is still used"
            );
        }
        self.clear_operands(instr);
        let Some(block) = self.instrs[instr.index()].block.take() else {
            return;
        };
        let data = &mut self.blocks[block.index()];
        if data.terminator == Some(instr) {
            data.terminator = None;
        } else {
            data.instrs.retain(|&i| i != instr);
        }
    }

    /// Drop the operands of every instruction in `block`, so that values
    /// flowing between doomed blocks no longer pin each other.
    pub fn clear_block_operands(&mut self, block: BlockId) {
        let instrs: Vec<InstrId> = self.block(block).all_instrs().collect();
        for instr in instrs {
            self.clear_operands(instr);
        }
    }

    /// Unlink `block` and all of its instructions from its function.
    ///
    /// # Panics
    ///
    /// Panics if the block's label or any of its results is still used.
    pub fn remove_block(&mut self, block: BlockId) {
        let label = self.label(block);
        assert!(
            !self.value(label).has_uses(),
            "removing {block:?} whose label is still used"
        );
        let instrs: Vec<InstrId> = self.block(block).all_instrs().collect();
        for instr in instrs {
            self.remove_instr(instr);
        }
        if let Some(func) = self.blocks[block.index()].function.take() {
            self.functions[func.index()].blocks.retain(|&b| b != block);
        }
    }

    // ── Control flow ────────────────────────────────────────────

    /// Distinct successor blocks, in terminator operand order.
    pub fn successors(&self, block: BlockId) -> SmallVec<[BlockId; 4]> {
        let mut out: SmallVec<[BlockId; 4]> = SmallVec::new();
        let Some(term) = self.block(block).terminator else {
            return out;
        };
        for &operand in self.instr(term).operands() {
            if let Some(target) = self.label_block(operand) {
                if !out.contains(&target) {
                    out.push(target);
                }
            }
        }
        out
    }

    /// Distinct predecessor blocks, found through the label's use-list.
    /// Phi incoming labels are not edges.
    pub fn predecessors(&self, block: BlockId) -> SmallVec<[BlockId; 4]> {
        let mut out: SmallVec<[BlockId; 4]> = SmallVec::new();
        for u in self.uses(self.label(block)) {
            let user = self.instr(u.instr);
            if !user.is_terminator() {
                continue;
            }
            if let Some(pred) = user.block {
                if !out.contains(&pred) {
                    out.push(pred);
                }
            }
        }
        out
    }

    // ── Numbering ───────────────────────────────────────────────

    pub fn set_number(&mut self, value: ValueId, number: Option<u32>) {
        self.values[value.index()].number = number;
    }
}
