//! Declarations: functions, parameters, locals and statics.

use tern_eval::{convert_to_type, scalar_kind, ConstEvaluator, Scalar};
use tern_tree::{DeclId, DeclKind, ExprId, Name, StmtId, StorageDuration, TypeId};
use tracing::{debug, warn};

use crate::ir::{DefKind, Definition, FuncId, GlobalRef, ValueId, ValueKind};
use crate::SsaResult;

use super::Lowerer;

impl Lowerer<'_> {
    pub(super) fn lower_global_decl(&mut self, decl: DeclId) -> SsaResult<()> {
        match self.decl_kind(decl) {
            DeclKind::Function { ty, params, body } => {
                self.lower_function(decl, *ty, params, *body)
            }
            DeclKind::Var { ty, .. } => {
                self.note_type(*ty);
                self.global_value(decl)?;
                Ok(())
            }
            DeclKind::Record { ty } | DeclKind::Typedef { ty } => {
                self.note_type(*ty);
                Ok(())
            }
            DeclKind::Param { .. } | DeclKind::Label | DeclKind::Enumerator { .. } => Ok(()),
        }
    }

    /// Address of the file-scope function or variable `decl`, creating its
    /// definition on first reference.
    ///
    /// Declarations are merged by name, so a prototype and its later
    /// definition share one function, and an initializer on a later
    /// redeclaration fills in an earlier tentative one.
    pub(super) fn global_value(&mut self, decl: DeclId) -> SsaResult<ValueId> {
        let name = self.tree.arena.decl(decl).name;
        match self.decl_kind(decl) {
            DeclKind::Function { ty, .. } => {
                let func = self.declare_function(decl, name, *ty)?;
                Ok(self.ctx().function(func).value())
            }
            &DeclKind::Var {
                ty, storage, init, ..
            } => {
                if let Some(&value) = self.globals.get(&name) {
                    if let Some(init) = init {
                        self.fill_initializer(name, init, ty);
                    }
                    return Ok(value);
                }
                let value = self.define_variable(decl, name, ty, storage, init)?;
                self.globals.insert(name, value);
                Ok(value)
            }
            other => panic!("{decl:?} ({other:?}) has no module-level storage"),
        }
    }

    /// The function named `name`, declaring a prototype if it is new.
    fn declare_function(&mut self, decl: DeclId, name: Name, ty: TypeId) -> SsaResult<FuncId> {
        if let Some(func) = self.module.function(name) {
            return Ok(func);
        }
        self.note_type(ty);
        let func = self.ctx_mut().new_function(name, Some(decl), ty)?;
        let value = self.ctx().function(func).value();
        self.module.define(Definition {
            name,
            value,
            kind: DefKind::Function(func),
        });
        self.globals.insert(name, value);
        Ok(func)
    }

    fn define_variable(
        &mut self,
        decl: DeclId,
        name: Name,
        ty: TypeId,
        storage: StorageDuration,
        init: Option<ExprId>,
    ) -> SsaResult<ValueId> {
        let ptr_ty = self.ctx_mut().types.pointer_to(ty);
        let value = self.ctx_mut().new_value(
            ValueKind::Global(GlobalRef {
                decl: Some(decl),
                name,
                function: None,
            }),
            ptr_ty,
        )?;
        let init = init.and_then(|init| self.evaluate_initializer(name, init, ty));
        self.module.define(Definition {
            name,
            value,
            kind: DefKind::Variable {
                ty,
                init,
                thread_local: storage == StorageDuration::Thread,
            },
        });
        Ok(value)
    }

    fn fill_initializer(&mut self, name: Name, init: ExprId, ty: TypeId) {
        let Some(value) = self.evaluate_initializer(name, init, ty) else {
            return;
        };
        if let Some(Definition {
            kind: DefKind::Variable { init: slot, .. },
            ..
        }) = self.module.lookup_mut(name)
        {
            *slot = Some(value);
        }
    }

    /// Compile-time value of a static initializer, converted to the
    /// variable's type.
    fn evaluate_initializer(&self, name: Name, init: ExprId, ty: TypeId) -> Option<Scalar> {
        scalar_kind(&self.ctx().types, &self.ctx().target, ty)?;
        match ConstEvaluator::new(self.tree).eval(init) {
            Ok(value) => convert_to_type(&self.ctx().types, &self.ctx().target, value, ty),
            Err(error) => {
                warn!(
                    variable = self.ctx().names.lookup(name),
                    %error,
                    "static initializer is not a constant; leaving it zero"
                );
                None
            }
        }
    }

    fn lower_function(
        &mut self,
        decl: DeclId,
        ty: TypeId,
        params: &[DeclId],
        body: Option<StmtId>,
    ) -> SsaResult<()> {
        let name = self.tree.arena.decl(decl).name;
        let func = self.declare_function(decl, name, ty)?;
        let Some(body) = body else {
            return Ok(());
        };
        debug_assert!(
            !self.ctx().function(func).has_body(),
            "function defined twice"
        );

        self.function = Some(func);
        let entry = self.new_block()?;
        self.entry = Some(entry);
        self.alloca_cursor = None;
        self.labels.clear();
        self.defs.clear();
        self.defs.push();
        self.enter_block(entry);

        for &param in params {
            self.lower_param(func, param)?;
        }
        self.lower_stmt(body)?;

        if let Some(last) = self.builder.block() {
            let ret = self
                .ctx()
                .types
                .return_type(ty)
                .unwrap_or(TypeId::VOID);
            if ret == TypeId::VOID {
                self.ret(None)?;
            } else {
                let reached = last == entry || !self.ctx().predecessors(last).is_empty();
                if reached {
                    warn!(
                        function = self.ctx().names.lookup(name),
                        "control reaches the end of a non-void function"
                    );
                }
                let undef = self.ctx_mut().undef(ret)?;
                self.ret(Some(undef))?;
            }
        }
        self.defs.pop();
        debug_assert_eq!(self.defs.depth(), 0);

        debug!(
            function = self.ctx().names.lookup(name),
            blocks = self.ctx().function(func).blocks().len(),
            "lowered function"
        );
        self.function = None;
        self.entry = None;
        Ok(())
    }

    /// Spill a parameter into a stack slot so it can be assigned like any
    /// other local.
    fn lower_param(&mut self, func: FuncId, param: DeclId) -> SsaResult<()> {
        let decl = self.tree.arena.decl(param);
        let ty = decl
            .ty()
            .unwrap_or_else(|| panic!("parameter {param:?} without a type"));
        self.note_type(ty);
        let value = self.ctx_mut().add_param(func, ty)?;
        if decl.is_anonymous() {
            return Ok(());
        }
        let slot = self.alloca(ty)?;
        self.builder.store(value, slot)?;
        self.defs.define(param, slot);
        Ok(())
    }

    /// A declaration inside a function body.
    pub(super) fn lower_local_decl(&mut self, decl: DeclId) -> SsaResult<()> {
        match self.decl_kind(decl) {
            &DeclKind::Var {
                ty,
                storage: StorageDuration::Automatic,
                init,
                ..
            } => {
                self.note_type(ty);
                let slot = self.alloca(ty)?;
                self.defs.define(decl, slot);
                if let Some(init) = init {
                    let value = self.lower_expr(init)?;
                    self.builder.store(value, slot)?;
                }
                Ok(())
            }
            &DeclKind::Var {
                ty,
                storage,
                init,
                global,
            } => {
                self.note_type(ty);
                if global {
                    self.global_value(decl)?;
                    return Ok(());
                }
                let name = self.static_name(decl);
                let value = self.define_variable(decl, name, ty, storage, init)?;
                self.defs.define(decl, value);
                Ok(())
            }
            DeclKind::Function { ty, .. } => {
                let name = self.tree.arena.decl(decl).name;
                self.declare_function(decl, name, *ty)?;
                Ok(())
            }
            DeclKind::Record { ty } | DeclKind::Typedef { ty } => {
                self.note_type(*ty);
                Ok(())
            }
            DeclKind::Param { .. } | DeclKind::Label | DeclKind::Enumerator { .. } => Ok(()),
        }
    }

    /// Module-unique name `name.N` for a block-scope static.
    fn static_name(&mut self, decl: DeclId) -> Name {
        let base = self.tree.names.lookup(self.tree.arena.decl(decl).name);
        let mangled = format!("{base}.{}", self.static_counter);
        self.static_counter += 1;
        self.ctx_mut().names.intern(&mangled)
    }
}
