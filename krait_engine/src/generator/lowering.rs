//! Lowering of generator and async bodies into a linear instruction plan.
//!
//! Control structures decompose into jumps, branches, try-frames and
//! iterator drivers, so the executor can suspend between instructions and
//! route abrupt completions through `finally` blocks. Simple statements
//! stay whole; suspension points inside them are handled by the per-site
//! resume replay of the expression evaluator.

use std::rc::Rc;

use krait_ast::{
    declaration::{Binding, Declaration, LexicalDeclaration, Variable, VariableList},
    expression::{AssignTarget, Expression, Ident},
    statement::{ForLoopInitializer, IterableLoopInitializer, LabelledItem, Statement},
    statement_list::StatementListItem,
};

use crate::string::JsString;

/// One instruction of a [`Plan`].
#[derive(Debug)]
pub(crate) enum Instruction {
    /// Evaluate a statement; on normal completion, go to `next`.
    Statement {
        /// The statement (or declaration) to evaluate.
        item: StatementListItem,
        /// The following instruction.
        next: usize,
    },

    /// Evaluate the operand (if any), suspend producing
    /// `{value, done: false}`, resume at `next`.
    Yield {
        /// The yielded operand.
        expr: Option<Expression>,
        /// The instruction the consumed resume continues at.
        next: usize,
    },

    /// Delegating yield: drive the sub-iterator in `state_slot`, storing
    /// its completion value in `result_slot`.
    YieldStar {
        /// The delegated iterable expression.
        iter_expr: Expression,
        /// The slot holding the delegation state.
        state_slot: usize,
        /// The slot receiving the completion value.
        result_slot: usize,
        /// The following instruction.
        next: usize,
    },

    /// Consume the pending resume payload: abrupt payloads inject their
    /// signal, normal payloads store into the target binding.
    StoreResumeValue {
        /// Where the resumed value lands, if anywhere.
        target: Option<ResumeTarget>,
        /// The following instruction.
        next: usize,
    },

    /// Store a slot value into a binding; used for `yield*` results.
    StoreSlot {
        /// The source slot.
        slot: usize,
        /// The target binding.
        target: ResumeTarget,
        /// The following instruction.
        next: usize,
    },

    /// Push a try-frame.
    EnterTry {
        /// The handler entry, if the statement has a catch clause.
        handler: Option<usize>,
        /// The catch parameter binding.
        catch_binding: Option<Binding>,
        /// The finalizer entry, if any.
        finally: Option<usize>,
        /// The following instruction.
        next: usize,
    },

    /// Leave the protected region normally: schedule the finalizer or pop
    /// the frame.
    LeaveTry {
        /// The instruction after the whole `try` statement.
        next: usize,
    },

    /// End a finalizer: re-raise the pending completion or continue.
    EndFinally {
        /// The instruction after the whole `try` statement.
        next: usize,
    },

    /// Build the iterator driver of a `for-in`/`for-of` loop.
    IteratorInit {
        /// The iterated expression.
        expr: Expression,
        /// The slot receiving the driver state.
        slot: usize,
        /// The driver flavor.
        kind: IterKind,
        /// The following instruction.
        next: usize,
    },

    /// Pull the next iteration value; jump to `break_target` on
    /// exhaustion, bind and continue at `next` otherwise.
    IteratorMoveNext {
        /// The driver slot.
        slot: usize,
        /// The loop-head binding.
        init: IterableLoopInitializer,
        /// Where exhaustion jumps.
        break_target: usize,
        /// The body entry.
        next: usize,
    },

    /// Push a block scope and declare its lexical names.
    EnterScope {
        /// The block items, scanned for declarations.
        items: Rc<Vec<StatementListItem>>,
        /// The following instruction.
        next: usize,
    },

    /// Pop the innermost block scope.
    LeaveScope {
        /// The following instruction.
        next: usize,
    },

    /// Unconditional jump.
    Jump {
        /// The target instruction.
        target: usize,
    },

    /// Evaluate the condition and branch.
    Branch {
        /// The condition.
        cond: Expression,
        /// Taken when truthy.
        if_true: usize,
        /// Taken when falsy.
        if_false: usize,
    },

    /// `break`, routed through enclosing try-frames.
    Break {
        /// The target instruction.
        target: usize,
        /// The try-frame depth at the target.
        frame_depth: usize,
        /// The scope depth at the target.
        scope_depth: usize,
    },

    /// `continue`, routed through enclosing try-frames.
    Continue {
        /// The target instruction.
        target: usize,
        /// The try-frame depth at the target.
        frame_depth: usize,
        /// The scope depth at the target.
        scope_depth: usize,
    },

    /// Evaluate the operand and complete the generator, routing through
    /// enclosing try-frames.
    Return {
        /// The returned operand.
        expr: Option<Expression>,
    },

    /// Normal completion of the body.
    Complete,
}

/// Where a consumed resume value (or `yield*` result) is stored.
#[derive(Clone, Debug)]
pub(crate) struct ResumeTarget {
    /// The binding name.
    pub name: JsString,
    /// How the binding stores.
    pub mode: ResumeTargetMode,
}

/// The binding flavor of a [`ResumeTarget`].
#[derive(Clone, Copy, Debug)]
pub(crate) enum ResumeTargetMode {
    /// Assign an existing binding.
    Assign,

    /// Initialize a hoisted `let` binding.
    Let,

    /// Initialize a hoisted `const` binding.
    Const,

    /// Assign the function-scoped `var` binding.
    Var,
}

/// The flavor of an iterator driver.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum IterKind {
    /// The sync iterator protocol.
    Sync,

    /// The async iterator protocol (`for await-of`).
    Async,

    /// The `for-in` key enumerator.
    Enumerate,
}

/// A lowered body.
#[derive(Debug)]
pub(crate) struct Plan {
    pub(crate) instructions: Vec<Instruction>,
    pub(crate) slot_count: usize,
}

/// Lowers a function body. `async_mode` selects the statement-path
/// treatment of yields (async generators resume through per-site replay,
/// where awaits compose with yields).
pub(crate) fn build(
    items: &[StatementListItem],
    async_mode: bool,
) -> Result<Plan, String> {
    let mut lowerer = Lowerer {
        instructions: Vec::new(),
        loops: Vec::new(),
        frame_depth: 0,
        scope_depth: 0,
        slot_count: 0,
        async_mode,
    };
    for item in items {
        lowerer.lower_item(item)?;
    }
    lowerer.push(Instruction::Complete);
    Ok(Plan {
        instructions: lowerer.instructions,
        slot_count: lowerer.slot_count,
    })
}

/// An open loop (or labelled statement) collecting its pending jumps.
struct LoopScope {
    labels: Vec<JsString>,
    is_loop: bool,
    continue_target: Option<usize>,
    continue_scope_depth: usize,
    break_patches: Vec<usize>,
    continue_patches: Vec<usize>,
    frame_depth: usize,
    scope_depth: usize,
}

struct Lowerer {
    instructions: Vec<Instruction>,
    loops: Vec<LoopScope>,
    frame_depth: usize,
    scope_depth: usize,
    slot_count: usize,
    async_mode: bool,
}

impl Lowerer {
    fn push(&mut self, instruction: Instruction) -> usize {
        self.instructions.push(instruction);
        self.instructions.len() - 1
    }

    fn here(&self) -> usize {
        self.instructions.len()
    }

    fn new_slot(&mut self) -> usize {
        self.slot_count += 1;
        self.slot_count - 1
    }

    fn lower_item(&mut self, item: &StatementListItem) -> Result<(), String> {
        match item {
            StatementListItem::Statement(statement) => self.lower_statement(statement, &[]),
            StatementListItem::Declaration(declaration) => {
                self.lower_declaration(item, declaration)
            }
        }
    }

    fn lower_declaration(
        &mut self,
        item: &StatementListItem,
        declaration: &Declaration,
    ) -> Result<(), String> {
        match declaration {
            // Hoisting already created the binding (body level) or the
            // enclosing EnterScope will (block level); the Annex-B
            // writeback of the statement evaluator still applies.
            Declaration::Function(_) => {
                self.emit_statement_item(item.clone());
                Ok(())
            }
            Declaration::Class(_) => {
                self.emit_statement_item(item.clone());
                Ok(())
            }
            Declaration::Lexical(lexical) => {
                if !self.async_mode {
                    if let Some((target, yield_node)) = lexical_yield_form(lexical) {
                        return self.emit_yield_form(target, yield_node);
                    }
                }
                self.emit_statement_item(item.clone());
                Ok(())
            }
        }
    }

    fn emit_statement_item(&mut self, item: StatementListItem) {
        let at = self.here();
        self.push(Instruction::Statement { item, next: at + 1 });
    }

    /// Emits the instruction form of a statement-position yield.
    fn emit_yield_form(
        &mut self,
        target: Option<ResumeTarget>,
        node: &krait_ast::expression::Yield,
    ) -> Result<(), String> {
        if node.is_delegate() {
            let iter_expr = node
                .target()
                .cloned()
                .ok_or_else(|| "delegating yield without an operand".to_owned())?;
            let state_slot = self.new_slot();
            let result_slot = self.new_slot();
            let at = self.here();
            self.push(Instruction::YieldStar {
                iter_expr,
                state_slot,
                result_slot,
                next: at + 1,
            });
            if let Some(target) = target {
                let at = self.here();
                self.push(Instruction::StoreSlot {
                    slot: result_slot,
                    target,
                    next: at + 1,
                });
            }
            return Ok(());
        }

        let at = self.here();
        self.push(Instruction::Yield {
            expr: node.target().cloned(),
            next: at + 1,
        });
        let at = self.here();
        self.push(Instruction::StoreResumeValue {
            target,
            next: at + 1,
        });
        Ok(())
    }

    fn lower_statement(
        &mut self,
        statement: &Statement,
        labels: &[JsString],
    ) -> Result<(), String> {
        match statement {
            Statement::Empty => Ok(()),

            Statement::Expression(expression) => {
                if !self.async_mode {
                    if let Some((target, node)) = expression_yield_form(expression) {
                        return self.emit_yield_form(target, node);
                    }
                }
                self.emit_statement_item(StatementListItem::Statement(statement.clone()));
                Ok(())
            }

            Statement::Var(declaration) => {
                if !self.async_mode {
                    if let Some((target, node)) = var_yield_form(&declaration.0) {
                        return self.emit_yield_form(Some(target), node);
                    }
                }
                self.emit_statement_item(StatementListItem::Statement(statement.clone()));
                Ok(())
            }

            Statement::Throw(_) => {
                self.emit_statement_item(StatementListItem::Statement(statement.clone()));
                Ok(())
            }

            Statement::Return(node) => {
                self.push(Instruction::Return {
                    expr: node.target().cloned(),
                });
                Ok(())
            }

            Statement::Block(block) => {
                self.lower_block(block.statement_list().statements())
            }

            Statement::If(node) => {
                let branch = self.push(Instruction::Branch {
                    cond: node.cond().clone(),
                    if_true: usize::MAX,
                    if_false: usize::MAX,
                });
                let then_start = self.here();
                self.lower_statement(node.body(), &[])?;
                match node.else_node() {
                    Some(else_node) => {
                        let skip = self.push(Instruction::Jump { target: usize::MAX });
                        let else_start = self.here();
                        self.lower_statement(else_node, &[])?;
                        let after = self.here();
                        self.patch_branch(branch, then_start, else_start);
                        self.patch_jump(skip, after);
                    }
                    None => {
                        let after = self.here();
                        self.patch_branch(branch, then_start, after);
                    }
                }
                Ok(())
            }

            Statement::WhileLoop(node) => {
                let head = self.here();
                self.begin_loop(labels, Some(head), self.scope_depth);
                let branch = self.push(Instruction::Branch {
                    cond: node.condition().clone(),
                    if_true: usize::MAX,
                    if_false: usize::MAX,
                });
                let body = self.here();
                self.lower_statement(node.body(), &[])?;
                self.push(Instruction::Jump { target: head });
                let exit = self.here();
                self.patch_branch(branch, body, exit);
                self.end_loop(exit, head);
                Ok(())
            }

            Statement::DoWhileLoop(node) => {
                let body = self.here();
                self.begin_loop(labels, None, self.scope_depth);
                self.lower_statement(node.body(), &[])?;
                let check = self.here();
                self.push(Instruction::Branch {
                    cond: node.cond().clone(),
                    if_true: body,
                    if_false: check + 1,
                });
                let exit = self.here();
                self.end_loop_with_continue(exit, check);
                Ok(())
            }

            Statement::ForLoop(node) => self.lower_for_loop(node, labels),

            Statement::ForInLoop(node) => self.lower_iteration(
                IterKind::Enumerate,
                node.target(),
                node.initializer(),
                node.body(),
                labels,
            ),

            Statement::ForOfLoop(node) => self.lower_iteration(
                if node.r#await() {
                    IterKind::Async
                } else {
                    IterKind::Sync
                },
                node.iterable(),
                node.initializer(),
                node.body(),
                labels,
            ),

            Statement::Switch(node) => self.lower_switch(node, labels),

            Statement::Break(node) => {
                let label = node.label().map(|label| JsString::from(label.name()));
                let (frame_depth, scope_depth) = {
                    let scope = self
                        .find_loop(label.as_ref(), false)
                        .ok_or_else(|| "break outside a breakable statement".to_owned())?;
                    (scope.frame_depth, scope.scope_depth)
                };
                let at = self.push(Instruction::Break {
                    target: usize::MAX,
                    frame_depth,
                    scope_depth,
                });
                if let Some(scope) = self.find_loop_mut(label.as_ref(), false) {
                    scope.break_patches.push(at);
                }
                Ok(())
            }

            Statement::Continue(node) => {
                let label = node.label().map(|label| JsString::from(label.name()));
                let (frame_depth, scope_depth, target) = {
                    let scope = self
                        .find_loop(label.as_ref(), true)
                        .ok_or_else(|| "continue outside a loop".to_owned())?;
                    (
                        scope.frame_depth,
                        scope.continue_scope_depth,
                        scope.continue_target,
                    )
                };
                let at = self.push(Instruction::Continue {
                    target: target.unwrap_or(usize::MAX),
                    frame_depth,
                    scope_depth,
                });
                if target.is_none() {
                    if let Some(scope) = self.find_loop_mut(label.as_ref(), true) {
                        scope.continue_patches.push(at);
                    }
                }
                Ok(())
            }

            Statement::Labelled(node) => {
                let mut all_labels: Vec<JsString> = labels.to_vec();
                all_labels.push(node.label().name().into());
                match node.item() {
                    LabelledItem::Statement(inner) => match inner {
                        Statement::WhileLoop(_)
                        | Statement::DoWhileLoop(_)
                        | Statement::ForLoop(_)
                        | Statement::ForInLoop(_)
                        | Statement::ForOfLoop(_)
                        | Statement::Switch(_)
                        | Statement::Labelled(_) => self.lower_statement(inner, &all_labels),
                        other => {
                            // A labelled plain statement: only `break
                            // label` applies.
                            self.loops.push(LoopScope {
                                labels: all_labels,
                                is_loop: false,
                                continue_target: None,
                                continue_scope_depth: self.scope_depth,
                                break_patches: Vec::new(),
                                continue_patches: Vec::new(),
                                frame_depth: self.frame_depth,
                                scope_depth: self.scope_depth,
                            });
                            self.lower_statement(other, &[])?;
                            let exit = self.here();
                            self.end_loop(exit, exit);
                            Ok(())
                        }
                    },
                    LabelledItem::Function(_) => Ok(()),
                }
            }

            Statement::Try(node) => self.lower_try(node),

            Statement::With(node) => {
                if statement_suspends(node.statement()) {
                    return Err("cannot suspend inside a 'with' statement".to_owned());
                }
                self.emit_statement_item(StatementListItem::Statement(statement.clone()));
                Ok(())
            }
        }
    }

    fn lower_block(&mut self, items: &[StatementListItem]) -> Result<(), String> {
        let shared: Rc<Vec<StatementListItem>> = Rc::new(items.to_vec());
        let at = self.here();
        self.push(Instruction::EnterScope {
            items: shared,
            next: at + 1,
        });
        self.scope_depth += 1;
        for item in items {
            self.lower_item(item)?;
        }
        self.scope_depth -= 1;
        let at = self.here();
        self.push(Instruction::LeaveScope { next: at + 1 });
        Ok(())
    }

    fn lower_for_loop(
        &mut self,
        node: &krait_ast::statement::ForLoop,
        labels: &[JsString],
    ) -> Result<(), String> {
        // The head scope carries the loop variables. Lowered generator
        // loops keep one environment across iterations.
        let head_items: Vec<StatementListItem> = match node.init() {
            Some(ForLoopInitializer::Lexical(lexical)) => {
                vec![StatementListItem::Declaration(Declaration::Lexical(
                    lexical.clone(),
                ))]
            }
            _ => Vec::new(),
        };
        let shared = Rc::new(head_items.clone());
        let at = self.here();
        self.push(Instruction::EnterScope {
            items: shared,
            next: at + 1,
        });
        self.scope_depth += 1;

        match node.init() {
            Some(ForLoopInitializer::Expression(expression)) => {
                self.emit_statement_item(StatementListItem::Statement(Statement::Expression(
                    expression.clone(),
                )));
            }
            Some(ForLoopInitializer::Var(declaration)) => {
                self.emit_statement_item(StatementListItem::Statement(Statement::Var(
                    declaration.clone(),
                )));
            }
            Some(ForLoopInitializer::Lexical(lexical)) => {
                self.emit_statement_item(StatementListItem::Declaration(Declaration::Lexical(
                    lexical.clone(),
                )));
            }
            None => {}
        }

        let head = self.here();
        self.begin_loop(labels, None, self.scope_depth);
        let branch = node.condition().map(|condition| {
            self.push(Instruction::Branch {
                cond: condition.clone(),
                if_true: usize::MAX,
                if_false: usize::MAX,
            })
        });
        let body = self.here();
        self.lower_statement(node.body(), &[])?;

        let update = self.here();
        if let Some(final_expr) = node.final_expr() {
            self.emit_statement_item(StatementListItem::Statement(Statement::Expression(
                final_expr.clone(),
            )));
        }
        self.push(Instruction::Jump { target: head });
        let exit = self.here();
        if let Some(branch) = branch {
            self.patch_branch(branch, body, exit);
        }
        self.end_loop_with_continue(exit, update);

        self.scope_depth -= 1;
        let at = self.here();
        self.push(Instruction::LeaveScope { next: at + 1 });
        Ok(())
    }

    fn lower_iteration(
        &mut self,
        kind: IterKind,
        iterable: &Expression,
        init: &IterableLoopInitializer,
        body: &Statement,
        labels: &[JsString],
    ) -> Result<(), String> {
        let slot = self.new_slot();
        let at = self.here();
        self.push(Instruction::IteratorInit {
            expr: iterable.clone(),
            slot,
            kind,
            next: at + 1,
        });

        let head = self.here();
        self.begin_loop(labels, Some(head), self.scope_depth);
        self.push(Instruction::IteratorMoveNext {
            slot,
            init: init.clone(),
            break_target: usize::MAX,
            next: head + 1,
        });

        // The body runs inside the per-iteration scope the driver pushes.
        self.scope_depth += 1;
        self.lower_statement(body, &[])?;
        self.scope_depth -= 1;
        self.push(Instruction::Jump { target: head });

        let exit = self.here();
        if let Some(Instruction::IteratorMoveNext { break_target, .. }) =
            self.instructions.get_mut(head)
        {
            *break_target = exit;
        }
        self.end_loop(exit, head);
        Ok(())
    }

    fn lower_switch(
        &mut self,
        node: &krait_ast::statement::Switch,
        labels: &[JsString],
    ) -> Result<(), String> {
        // The discriminant lands in a synthesized binding; all clauses
        // share one scope.
        let discriminant_name: Rc<str> = "%switch".into();
        let mut scope_items: Vec<StatementListItem> = vec![StatementListItem::Declaration(
            Declaration::Lexical(LexicalDeclaration::Let(VariableList::new(vec![
                Variable::from_identifier(Ident::new(discriminant_name.clone()), None),
            ]))),
        )];
        for case in node.cases() {
            scope_items.extend(case.body().statements().iter().cloned());
        }
        let at = self.here();
        self.push(Instruction::EnterScope {
            items: Rc::new(scope_items),
            next: at + 1,
        });
        self.scope_depth += 1;

        // Initializing through the declaration lifts the binding out of its
        // TDZ.
        self.emit_statement_item(StatementListItem::Declaration(Declaration::Lexical(
            LexicalDeclaration::Let(VariableList::new(vec![Variable::from_identifier(
                Ident::new(discriminant_name.clone()),
                Some(node.val().clone()),
            )])),
        )));

        self.loops.push(LoopScope {
            labels: labels.to_vec(),
            is_loop: false,
            continue_target: None,
            continue_scope_depth: self.scope_depth,
            break_patches: Vec::new(),
            continue_patches: Vec::new(),
            frame_depth: self.frame_depth,
            scope_depth: self.scope_depth - 1,
        });

        // Dispatch chain.
        let mut case_branches = Vec::new();
        for case in node.cases() {
            let Some(condition) = case.condition() else {
                case_branches.push(None);
                continue;
            };
            let test = Expression::Binary(krait_ast::expression::Binary::new(
                krait_ast::operator::BinaryOp::Relational(
                    krait_ast::operator::RelationalOp::StrictEqual,
                ),
                Expression::Identifier(Ident::new(discriminant_name.clone())),
                condition.clone(),
            ));
            let branch = self.push(Instruction::Branch {
                cond: test,
                if_true: usize::MAX,
                if_false: usize::MAX,
            });
            case_branches.push(Some(branch));
        }
        let default_jump = self.push(Instruction::Jump { target: usize::MAX });

        // Clause bodies, in order, falling through.
        let mut body_starts = Vec::new();
        for case in node.cases() {
            body_starts.push(self.here());
            for item in case.body().statements() {
                self.lower_item(item)?;
            }
        }
        let exit_jump = self.push(Instruction::Jump { target: usize::MAX });

        // Patch dispatch targets.
        for (index, branch) in case_branches.iter().enumerate() {
            if let Some(branch) = branch {
                let next_check = self
                    .next_check_after(*branch)
                    .unwrap_or(default_jump);
                self.patch_branch(*branch, body_starts[index], next_check);
            }
        }
        let default_target = node
            .cases()
            .iter()
            .position(krait_ast::statement::Case::is_default)
            .map_or(exit_jump + 1, |index| body_starts[index]);
        self.patch_jump(default_jump, default_target);

        // The fall-through exit runs the scope pop; breaks land after it
        // (their truncation already dropped the switch scope).
        self.scope_depth -= 1;
        let leave_at = self.here();
        self.push(Instruction::LeaveScope {
            next: leave_at + 1,
        });
        let after = self.here();
        self.patch_jump(exit_jump, leave_at);
        self.end_loop(after, after);
        Ok(())
    }

    /// Gets the instruction after `branch` in the dispatch chain, which is
    /// the next case check (or the default jump).
    fn next_check_after(&self, branch: usize) -> Option<usize> {
        match self.instructions.get(branch + 1) {
            Some(Instruction::Branch { .. } | Instruction::Jump { .. }) => Some(branch + 1),
            _ => None,
        }
    }

    fn lower_try(&mut self, node: &krait_ast::statement::Try) -> Result<(), String> {
        let at = self.here();
        let enter = self.push(Instruction::EnterTry {
            handler: None,
            catch_binding: node.handler().and_then(|catch| catch.parameter().cloned()),
            finally: None,
            next: at + 1,
        });
        self.frame_depth += 1;

        self.lower_block(node.block().statement_list().statements())?;
        let leave = self.push(Instruction::LeaveTry { next: usize::MAX });

        let mut handler_start = None;
        let mut handler_leave = None;
        if let Some(catch) = node.handler() {
            handler_start = Some(self.here());
            // The executor pushed the catch-parameter scope when it
            // dispatched here.
            self.scope_depth += 1;
            self.lower_block(catch.block().statement_list().statements())?;
            self.scope_depth -= 1;
            let at = self.here();
            self.push(Instruction::LeaveScope { next: at + 1 });
            handler_leave = Some(self.push(Instruction::LeaveTry { next: usize::MAX }));
        }

        self.frame_depth -= 1;

        let mut finally_start = None;
        let mut end_finally = None;
        if let Some(finally) = node.finally() {
            finally_start = Some(self.here());
            self.lower_block(finally.block().statement_list().statements())?;
            end_finally = Some(self.push(Instruction::EndFinally { next: usize::MAX }));
        }

        let after = self.here();
        if let Some(Instruction::EnterTry {
            handler, finally, ..
        }) = self.instructions.get_mut(enter)
        {
            *handler = handler_start;
            *finally = finally_start;
        }
        self.patch_leave(leave, after);
        if let Some(leave) = handler_leave {
            self.patch_leave(leave, after);
        }
        if let Some(end) = end_finally {
            if let Some(Instruction::EndFinally { next }) = self.instructions.get_mut(end) {
                *next = after;
            }
        }
        Ok(())
    }

    fn begin_loop(
        &mut self,
        labels: &[JsString],
        continue_target: Option<usize>,
        continue_scope_depth: usize,
    ) {
        self.loops.push(LoopScope {
            labels: labels.to_vec(),
            is_loop: true,
            continue_target,
            continue_scope_depth,
            break_patches: Vec::new(),
            continue_patches: Vec::new(),
            frame_depth: self.frame_depth,
            scope_depth: self.scope_depth,
        });
    }

    fn end_loop(&mut self, break_target: usize, continue_target: usize) {
        if let Some(scope) = self.loops.pop() {
            for at in scope.break_patches {
                self.patch_abrupt(at, break_target);
            }
            for at in scope.continue_patches {
                self.patch_abrupt(at, continue_target);
            }
        }
    }

    fn end_loop_with_continue(&mut self, break_target: usize, continue_target: usize) {
        self.end_loop(break_target, continue_target);
    }

    fn find_loop(&self, label: Option<&JsString>, needs_loop: bool) -> Option<&LoopScope> {
        self.loops.iter().rev().find(|scope| {
            (!needs_loop || scope.is_loop)
                && label.map_or(true, |label| scope.labels.contains(label))
        })
    }

    fn find_loop_mut(
        &mut self,
        label: Option<&JsString>,
        needs_loop: bool,
    ) -> Option<&mut LoopScope> {
        self.loops.iter_mut().rev().find(|scope| {
            (!needs_loop || scope.is_loop)
                && label.map_or(true, |label| scope.labels.contains(label))
        })
    }

    fn patch_branch(&mut self, at: usize, if_true: usize, if_false: usize) {
        if let Some(Instruction::Branch {
            if_true: t,
            if_false: f,
            ..
        }) = self.instructions.get_mut(at)
        {
            *t = if_true;
            *f = if_false;
        }
    }

    fn patch_jump(&mut self, at: usize, target: usize) {
        if let Some(Instruction::Jump { target: t }) = self.instructions.get_mut(at) {
            *t = target;
        }
    }

    fn patch_leave(&mut self, at: usize, target: usize) {
        if let Some(Instruction::LeaveTry { next }) = self.instructions.get_mut(at) {
            *next = target;
        }
    }

    fn patch_abrupt(&mut self, at: usize, target: usize) {
        match self.instructions.get_mut(at) {
            Some(
                Instruction::Break { target: t, .. } | Instruction::Continue { target: t, .. },
            ) => {
                if *t == usize::MAX {
                    *t = target;
                }
            }
            _ => {}
        }
    }
}

/// Recognizes `x = yield e` expression statements.
fn expression_yield_form(
    expression: &Expression,
) -> Option<(Option<ResumeTarget>, &krait_ast::expression::Yield)> {
    match expression {
        Expression::Yield(node) if operand_is_simple(node) => Some((None, node)),
        Expression::Assign(assign)
            if assign.op() == krait_ast::operator::AssignOp::Assign =>
        {
            let AssignTarget::Identifier(ident) = assign.target() else {
                return None;
            };
            let Expression::Yield(node) = assign.value() else {
                return None;
            };
            if !operand_is_simple(node) {
                return None;
            }
            Some((
                Some(ResumeTarget {
                    name: ident.name().into(),
                    mode: ResumeTargetMode::Assign,
                }),
                node,
            ))
        }
        _ => None,
    }
}

/// Recognizes `let`/`const x = yield e` declarations.
fn lexical_yield_form(
    lexical: &LexicalDeclaration,
) -> Option<(Option<ResumeTarget>, &krait_ast::expression::Yield)> {
    let variables = lexical.variable_list().as_ref();
    let [variable] = variables else {
        return None;
    };
    let Binding::Identifier(ident) = variable.binding() else {
        return None;
    };
    let Some(Expression::Yield(node)) = variable.init() else {
        return None;
    };
    if !operand_is_simple(node) {
        return None;
    }
    let mode = if lexical.is_const() {
        ResumeTargetMode::Const
    } else {
        ResumeTargetMode::Let
    };
    Some((
        Some(ResumeTarget {
            name: ident.name().into(),
            mode,
        }),
        node,
    ))
}

/// Recognizes `var x = yield e` declarations.
fn var_yield_form(
    variables: &VariableList,
) -> Option<(ResumeTarget, &krait_ast::expression::Yield)> {
    let [variable] = variables.as_ref() else {
        return None;
    };
    let Binding::Identifier(ident) = variable.binding() else {
        return None;
    };
    let Some(Expression::Yield(node)) = variable.init() else {
        return None;
    };
    if !operand_is_simple(node) {
        return None;
    }
    Some((
        ResumeTarget {
            name: ident.name().into(),
            mode: ResumeTargetMode::Var,
        },
        node,
    ))
}

fn operand_is_simple(node: &krait_ast::expression::Yield) -> bool {
    node.target().map_or(true, |target| !expr_suspends(target))
}

/// Returns `true` if the expression contains a suspension point, without
/// descending into nested function bodies.
pub(crate) fn expr_suspends(expression: &Expression) -> bool {
    use krait_ast::expression::UpdateTarget;
    match expression {
        Expression::Yield(_) | Expression::Await(_) => true,
        Expression::Literal(_)
        | Expression::Identifier(_)
        | Expression::This
        | Expression::NewTarget
        | Expression::Function(_) => false,
        Expression::Class(class) => {
            class.super_ref().is_some_and(expr_suspends)
                || class.elements().iter().any(|element| match element {
                    krait_ast::function::ClassElement::MethodDefinition { name, .. }
                    | krait_ast::function::ClassElement::FieldDefinition { name, .. } => {
                        matches!(name, krait_ast::property::PropertyName::Computed(e) if expr_suspends(e))
                    }
                    _ => false,
                })
        }
        Expression::Array(array) => array
            .elements()
            .iter()
            .flatten()
            .any(expr_suspends),
        Expression::Object(object) => object.members().iter().any(|member| match member {
            krait_ast::property::PropertyDefinition::IdentifierReference(_) => false,
            krait_ast::property::PropertyDefinition::Property(name, value) => {
                property_name_suspends(name) || expr_suspends(value)
            }
            krait_ast::property::PropertyDefinition::MethodDefinition(name, _, _) => {
                property_name_suspends(name)
            }
            krait_ast::property::PropertyDefinition::SpreadObject(value) => expr_suspends(value),
        }),
        Expression::Template(template) => template.parts().iter().any(|part| match part {
            krait_ast::expression::TemplatePart::String(_) => false,
            krait_ast::expression::TemplatePart::Expr(e) => expr_suspends(e),
        }),
        Expression::TaggedTemplate(template) => {
            expr_suspends(template.tag()) || template.exprs().iter().any(expr_suspends)
        }
        Expression::Spread(spread) => expr_suspends(spread.target()),
        Expression::PropertyAccess(access) => {
            expr_suspends(access.target()) || access_field_suspends(access.field())
        }
        Expression::PrivateAccess(access) => expr_suspends(access.target()),
        Expression::SuperPropertyAccess(access) => access_field_suspends(access.field()),
        Expression::Call(call) => {
            expr_suspends(call.target()) || call.args().iter().any(expr_suspends)
        }
        Expression::SuperCall(call) => call.args().iter().any(expr_suspends),
        Expression::New(new) => {
            expr_suspends(new.target()) || new.args().iter().any(expr_suspends)
        }
        Expression::Unary(unary) => expr_suspends(unary.target()),
        Expression::Update(update) => match update.target() {
            UpdateTarget::Identifier(_) => false,
            UpdateTarget::PropertyAccess(access) => {
                expr_suspends(access.target()) || access_field_suspends(access.field())
            }
        },
        Expression::Binary(binary) => expr_suspends(binary.lhs()) || expr_suspends(binary.rhs()),
        Expression::Conditional(conditional) => {
            expr_suspends(conditional.condition())
                || expr_suspends(conditional.if_true())
                || expr_suspends(conditional.if_false())
        }
        Expression::Assign(assign) => expr_suspends(assign.value()),
        Expression::Sequence(expressions) => expressions.iter().any(expr_suspends),
    }
}

fn property_name_suspends(name: &krait_ast::property::PropertyName) -> bool {
    matches!(name, krait_ast::property::PropertyName::Computed(e) if expr_suspends(e))
}

fn access_field_suspends(field: &krait_ast::expression::PropertyAccessField) -> bool {
    matches!(field, krait_ast::expression::PropertyAccessField::Expr(e) if expr_suspends(e))
}

/// Returns `true` if the statement contains a suspension point, without
/// descending into nested function bodies.
pub(crate) fn statement_suspends(statement: &Statement) -> bool {
    match statement {
        Statement::Empty | Statement::Break(_) | Statement::Continue(_) => false,
        Statement::Expression(expression) => expr_suspends(expression),
        Statement::Throw(node) => expr_suspends(node.target()),
        Statement::Var(declaration) => declaration
            .0
            .as_ref()
            .iter()
            .any(|variable| variable.init().is_some_and(expr_suspends)),
        Statement::Block(block) => items_suspend(block.statement_list().statements()),
        Statement::If(node) => {
            expr_suspends(node.cond())
                || statement_suspends(node.body())
                || node.else_node().is_some_and(statement_suspends)
        }
        Statement::WhileLoop(node) => {
            expr_suspends(node.condition()) || statement_suspends(node.body())
        }
        Statement::DoWhileLoop(node) => {
            expr_suspends(node.cond()) || statement_suspends(node.body())
        }
        Statement::ForLoop(node) => {
            let init = match node.init() {
                Some(ForLoopInitializer::Expression(expression)) => expr_suspends(expression),
                Some(ForLoopInitializer::Var(declaration)) => declaration
                    .0
                    .as_ref()
                    .iter()
                    .any(|variable| variable.init().is_some_and(expr_suspends)),
                Some(ForLoopInitializer::Lexical(lexical)) => lexical
                    .variable_list()
                    .as_ref()
                    .iter()
                    .any(|variable| variable.init().is_some_and(expr_suspends)),
                None => false,
            };
            init
                || node.condition().is_some_and(expr_suspends)
                || node.final_expr().is_some_and(expr_suspends)
                || statement_suspends(node.body())
        }
        Statement::ForInLoop(node) => {
            expr_suspends(node.target()) || statement_suspends(node.body())
        }
        Statement::ForOfLoop(node) => {
            node.r#await()
                || expr_suspends(node.iterable())
                || statement_suspends(node.body())
        }
        Statement::Switch(node) => {
            expr_suspends(node.val())
                || node.cases().iter().any(|case| {
                    case.condition().is_some_and(expr_suspends)
                        || items_suspend(case.body().statements())
                })
        }
        Statement::Return(node) => node.target().is_some_and(expr_suspends),
        Statement::Labelled(node) => match node.item() {
            LabelledItem::Statement(statement) => statement_suspends(statement),
            LabelledItem::Function(_) => false,
        },
        Statement::Try(node) => {
            items_suspend(node.block().statement_list().statements())
                || node.handler().is_some_and(|catch| {
                    items_suspend(catch.block().statement_list().statements())
                })
                || node.finally().is_some_and(|finally| {
                    items_suspend(finally.block().statement_list().statements())
                })
        }
        Statement::With(node) => {
            expr_suspends(node.expression()) || statement_suspends(node.statement())
        }
    }
}

fn items_suspend(items: &[StatementListItem]) -> bool {
    items.iter().any(|item| match item {
        StatementListItem::Statement(statement) => statement_suspends(statement),
        StatementListItem::Declaration(Declaration::Lexical(lexical)) => lexical
            .variable_list()
            .as_ref()
            .iter()
            .any(|variable| variable.init().is_some_and(expr_suspends)),
        StatementListItem::Declaration(Declaration::Class(class)) => {
            class.super_ref().is_some_and(expr_suspends)
        }
        StatementListItem::Declaration(Declaration::Function(_)) => false,
    })
}
