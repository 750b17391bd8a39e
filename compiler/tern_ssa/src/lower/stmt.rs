//! Statements: control flow becomes blocks and terminators.

use tern_eval::{scalar_kind, ConstEvaluator};
use tern_tree::{DeclId, ExprId, Stmt, StmtId, TypeId};

use crate::ir::{BlockId, InstrId};
use crate::SsaResult;

use super::{ensure_sufficient_stack, Lowerer, SwitchContext};

impl Lowerer<'_> {
    pub(super) fn lower_stmt(&mut self, stmt: StmtId) -> SsaResult<()> {
        ensure_sufficient_stack(|| self.lower_stmt_inner(stmt))
    }

    fn lower_stmt_inner(&mut self, stmt: StmtId) -> SsaResult<()> {
        let stmt = self.tree.arena.stmt(stmt);

        // Code after a terminator is unreachable but still lowered into a
        // fresh block; dead-code elimination removes it. Labels and cases
        // open their own block, and a compound leaves it to its children.
        if !matches!(
            stmt,
            Stmt::Labeled { .. } | Stmt::Case { .. } | Stmt::Default { .. } | Stmt::Compound(_)
        ) {
            self.ensure_block()?;
        }

        match stmt {
            Stmt::Labeled { label, body } => {
                let block = self.label_block(*label)?;
                self.maybe_jump(block)?;
                self.enter_block(block);
                self.lower_stmt(*body)
            }
            Stmt::Case { value, body } => self.lower_case(*value, *body),
            Stmt::Default { body } => self.lower_default(*body),
            Stmt::Compound(stmts) => {
                self.defs.push();
                for &stmt in stmts {
                    self.lower_stmt(stmt)?;
                }
                self.defs.pop();
                Ok(())
            }
            Stmt::Expr(expr) => {
                if let Some(expr) = expr {
                    self.lower_expr(*expr)?;
                }
                Ok(())
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let exit = self.new_block()?;
                self.lower_if(*cond, *then_branch, *else_branch, exit)?;
                self.enter_block(exit);
                Ok(())
            }
            Stmt::Switch { scrutinee, body } => self.lower_switch(*scrutinee, *body),
            Stmt::While { cond, body } => self.lower_while(*cond, *body),
            Stmt::DoWhile { body, cond } => self.lower_do_while(*body, *cond),
            Stmt::For {
                init,
                cond,
                step,
                body,
            } => self.lower_for(*init, *cond, *step, *body),
            Stmt::Goto(label) => {
                let block = self.label_block(*label)?;
                self.jump(block)
            }
            Stmt::Continue => {
                let dest = *self
                    .continue_stack
                    .last()
                    .unwrap_or_else(|| panic!("`continue` outside of a loop"));
                self.jump(dest)
            }
            Stmt::Break => {
                let dest = *self
                    .break_stack
                    .last()
                    .unwrap_or_else(|| panic!("`break` outside of a loop or switch"));
                self.jump(dest)
            }
            Stmt::Decl(decls) => {
                for &decl in decls {
                    self.lower_local_decl(decl)?;
                }
                Ok(())
            }
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => {
                        let value = self.lower_expr(*expr)?;
                        let ty = self.ctx().ty(value);
                        (ty != TypeId::VOID).then_some(value)
                    }
                    None => None,
                };
                self.ret(value)
            }
        }
    }

    /// Block for a label, created on first mention so forward `goto`s work.
    fn label_block(&mut self, label: DeclId) -> SsaResult<BlockId> {
        if let Some(&block) = self.labels.get(&label) {
            return Ok(block);
        }
        let block = self.new_block()?;
        self.labels.insert(label, block);
        Ok(block)
    }

    /// `if` chains: an `else if` reuses the outer exit block instead of
    /// nesting another one.
    fn lower_if(
        &mut self,
        cond: ExprId,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
        exit: BlockId,
    ) -> SsaResult<()> {
        let then_block = self.new_block()?;
        let else_block = match else_branch {
            Some(_) => self.new_block()?,
            None => exit,
        };
        let cond = self.lower_condition(cond)?;
        self.branch(cond, then_block, else_block)?;

        self.enter_block(then_block);
        self.lower_stmt(then_branch)?;
        self.maybe_jump(exit)?;

        if let Some(else_branch) = else_branch {
            self.enter_block(else_block);
            if let &Stmt::If {
                cond,
                then_branch,
                else_branch,
            } = self.tree.arena.stmt(else_branch)
            {
                return self.lower_if(cond, then_branch, else_branch, exit);
            }
            self.lower_stmt(else_branch)?;
            self.maybe_jump(exit)?;
        }
        Ok(())
    }

    fn lower_while(&mut self, cond: ExprId, body: StmtId) -> SsaResult<()> {
        let cond_block = self.new_block()?;
        let body_block = self.new_block()?;
        let exit = self.new_block()?;
        self.jump(cond_block)?;

        self.enter_block(cond_block);
        let cond = self.lower_condition(cond)?;
        self.branch(cond, body_block, exit)?;

        self.enter_block(body_block);
        self.lower_loop_body(body, cond_block, exit)?;
        self.maybe_jump(cond_block)?;

        self.enter_block(exit);
        Ok(())
    }

    fn lower_do_while(&mut self, body: StmtId, cond: ExprId) -> SsaResult<()> {
        let body_block = self.new_block()?;
        let cond_block = self.new_block()?;
        let exit = self.new_block()?;
        self.jump(body_block)?;

        self.enter_block(body_block);
        self.lower_loop_body(body, cond_block, exit)?;
        self.maybe_jump(cond_block)?;

        self.enter_block(cond_block);
        let cond = self.lower_condition(cond)?;
        self.branch(cond, body_block, exit)?;

        self.enter_block(exit);
        Ok(())
    }

    fn lower_for(
        &mut self,
        init: Option<StmtId>,
        cond: Option<ExprId>,
        step: Option<ExprId>,
        body: StmtId,
    ) -> SsaResult<()> {
        // The init clause may declare variables scoped to the loop.
        self.defs.push();
        if let Some(init) = init {
            self.lower_stmt(init)?;
        }

        let cond_block = self.new_block()?;
        let body_block = self.new_block()?;
        let step_block = self.new_block()?;
        let exit = self.new_block()?;
        self.jump(cond_block)?;

        self.enter_block(cond_block);
        match cond {
            Some(cond) => {
                let cond = self.lower_condition(cond)?;
                self.branch(cond, body_block, exit)?;
            }
            None => self.jump(body_block)?,
        }

        self.enter_block(body_block);
        self.lower_loop_body(body, step_block, exit)?;
        self.maybe_jump(step_block)?;

        self.enter_block(step_block);
        if let Some(step) = step {
            self.lower_expr(step)?;
        }
        self.jump(cond_block)?;

        self.enter_block(exit);
        self.defs.pop();
        Ok(())
    }

    fn lower_loop_body(&mut self, body: StmtId, cont: BlockId, exit: BlockId) -> SsaResult<()> {
        self.continue_stack.push(cont);
        self.break_stack.push(exit);
        let result = self.lower_stmt(body);
        self.break_stack.pop();
        self.continue_stack.pop();
        result
    }

    /// The switch terminator is emitted up front with its default pointing
    /// at the exit; `case` and `default` labels add edges as they are met.
    fn lower_switch(&mut self, scrutinee: ExprId, body: StmtId) -> SsaResult<()> {
        let value = self.lower_expr(scrutinee)?;
        let scrutinee_ty = self.ctx().ty(value);
        let exit = self.new_block()?;
        let block = self.current_block();
        let instr = self.builder.switch(value, exit)?;
        self.finish_block(block);

        self.switches.push(SwitchContext {
            instr,
            scrutinee_ty,
        });
        self.break_stack.push(exit);
        let result = self.lower_stmt(body);
        self.break_stack.pop();
        self.switches.pop();
        result?;

        self.maybe_jump(exit)?;
        self.enter_block(exit);
        Ok(())
    }

    fn lower_case(&mut self, value: ExprId, body: StmtId) -> SsaResult<()> {
        let (instr, ty) = self.innermost_switch("case");
        let block = self.new_block()?;
        self.maybe_jump(block)?;

        let kind = scalar_kind(&self.ctx().types, &self.ctx().target, ty)
            .unwrap_or_else(|| panic!("switch on non-scalar type {ty:?}"));
        let scalar = ConstEvaluator::new(self.tree)
            .eval(value)
            .unwrap_or_else(|error| panic!("case label is not a constant: {error}"));
        let value = self.ctx_mut().constant(scalar.convert(kind), ty)?;
        self.builder.add_switch_case(instr, value, block);

        self.enter_block(block);
        self.lower_stmt(body)
    }

    fn lower_default(&mut self, body: StmtId) -> SsaResult<()> {
        let (instr, _) = self.innermost_switch("default");
        let block = self.new_block()?;
        self.maybe_jump(block)?;

        let label = self.ctx().label(block);
        self.ctx_mut().set_operand(instr, 1, label);

        self.enter_block(block);
        self.lower_stmt(body)
    }

    fn innermost_switch(&self, what: &str) -> (InstrId, TypeId) {
        let switch = self
            .switches
            .last()
            .unwrap_or_else(|| panic!("`{what}` outside of a switch"));
        (switch.instr, switch.scrutinee_ty)
    }
}
