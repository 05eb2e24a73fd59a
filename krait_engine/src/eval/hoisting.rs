//! Hoisting and scope analysis.
//!
//! A two-pass pre-order scan over every block and function body collects
//! the lexically declared names, the catch-parameter names, and the simple
//! (bare-identifier) catch names. The evaluator uses these sets to decide,
//! per sloppy-mode block function declaration, whether it may create a
//! var-side binding (Annex-B) or must stay block-lexical. Hoisting then
//! declares functions first and `var` slots second, descending through all
//! control structures but never into nested function bodies.

use krait_ast::{
    declaration::{Binding, Declaration, LexicalDeclaration, VarDeclaration},
    statement::{ForLoopInitializer, IterableLoopInitializer, LabelledItem, Statement},
    statement_list::StatementListItem,
};
use rustc_hash::FxHashSet;

use crate::{
    context::Context,
    environments::{DefineOptions, Environment},
    error::{EvalResult, JsNativeError},
    string::JsString,
    value::JsValue,
};

/// The name sets of one block scan.
#[derive(Clone, Debug, Default)]
pub struct BlockNames {
    /// `let`/`const`/`class` names declared directly in the block.
    pub lexical: FxHashSet<JsString>,

    /// Catch-parameter names anywhere in the block (not crossing function
    /// boundaries).
    pub catch_params: FxHashSet<JsString>,

    /// The subset of catch parameters that are bare identifiers.
    pub simple_catch: FxHashSet<JsString>,
}

/// Scans a block for its name sets. Idempotent: scanning twice produces
/// identical sets.
#[must_use]
pub fn collect_block_names(items: &[StatementListItem]) -> BlockNames {
    let mut names = BlockNames::default();
    for item in items {
        match item {
            StatementListItem::Declaration(declaration) => match declaration {
                Declaration::Lexical(lexical) => {
                    for variable in lexical.variable_list().as_ref() {
                        for ident in variable.idents() {
                            names.lexical.insert(ident.name().into());
                        }
                    }
                }
                Declaration::Class(class) => {
                    if let Some(name) = class.name() {
                        names.lexical.insert(name.name().into());
                    }
                }
                Declaration::Function(_) => {}
            },
            StatementListItem::Statement(statement) => {
                collect_catch_names(statement, &mut names);
            }
        }
    }
    names
}

fn collect_catch_names(statement: &Statement, names: &mut BlockNames) {
    match statement {
        Statement::Block(block) => {
            for item in block.statement_list().statements() {
                if let StatementListItem::Statement(statement) = item {
                    collect_catch_names(statement, names);
                }
            }
        }
        Statement::If(node) => {
            collect_catch_names(node.body(), names);
            if let Some(else_node) = node.else_node() {
                collect_catch_names(else_node, names);
            }
        }
        Statement::WhileLoop(node) => collect_catch_names(node.body(), names),
        Statement::DoWhileLoop(node) => collect_catch_names(node.body(), names),
        Statement::ForLoop(node) => collect_catch_names(node.body(), names),
        Statement::ForInLoop(node) => collect_catch_names(node.body(), names),
        Statement::ForOfLoop(node) => collect_catch_names(node.body(), names),
        Statement::Switch(node) => {
            for case in node.cases() {
                for item in case.body().statements() {
                    if let StatementListItem::Statement(statement) = item {
                        collect_catch_names(statement, names);
                    }
                }
            }
        }
        Statement::Labelled(node) => {
            if let LabelledItem::Statement(statement) = node.item() {
                collect_catch_names(statement, names);
            }
        }
        Statement::With(node) => collect_catch_names(node.statement(), names),
        Statement::Try(node) => {
            for item in node.block().statement_list().statements() {
                if let StatementListItem::Statement(statement) = item {
                    collect_catch_names(statement, names);
                }
            }
            if let Some(catch) = node.handler() {
                match catch.parameter() {
                    Some(Binding::Identifier(ident)) => {
                        names.catch_params.insert(ident.name().into());
                        names.simple_catch.insert(ident.name().into());
                    }
                    Some(Binding::Pattern(pattern)) => {
                        for ident in pattern.idents() {
                            names.catch_params.insert(ident.name().into());
                        }
                    }
                    None => {}
                }
                for item in catch.block().statement_list().statements() {
                    if let StatementListItem::Statement(statement) = item {
                        collect_catch_names(statement, names);
                    }
                }
            }
            if let Some(finally) = node.finally() {
                for item in finally.block().statement_list().statements() {
                    if let StatementListItem::Statement(statement) = item {
                        collect_catch_names(statement, names);
                    }
                }
            }
        }
        _ => {}
    }
}

/// Collects the `var`-declared names of a body, descending through control
/// structures but not into nested functions.
#[must_use]
pub fn var_declared_names(items: &[StatementListItem]) -> Vec<JsString> {
    let mut names = Vec::new();
    for item in items {
        if let StatementListItem::Statement(statement) = item {
            var_names_of_statement(statement, &mut names);
        }
    }
    names
}

fn var_names_of_declaration(declaration: &VarDeclaration, names: &mut Vec<JsString>) {
    for variable in declaration.0.as_ref() {
        for ident in variable.idents() {
            names.push(ident.name().into());
        }
    }
}

fn var_names_of_statement(statement: &Statement, names: &mut Vec<JsString>) {
    match statement {
        Statement::Var(declaration) => var_names_of_declaration(declaration, names),
        Statement::Block(block) => {
            names.extend(var_declared_names(block.statement_list().statements()));
        }
        Statement::If(node) => {
            var_names_of_statement(node.body(), names);
            if let Some(else_node) = node.else_node() {
                var_names_of_statement(else_node, names);
            }
        }
        Statement::WhileLoop(node) => var_names_of_statement(node.body(), names),
        Statement::DoWhileLoop(node) => var_names_of_statement(node.body(), names),
        Statement::ForLoop(node) => {
            if let Some(ForLoopInitializer::Var(declaration)) = node.init() {
                var_names_of_declaration(declaration, names);
            }
            var_names_of_statement(node.body(), names);
        }
        Statement::ForInLoop(node) => {
            if let IterableLoopInitializer::Var(binding) = node.initializer() {
                for ident in binding.idents() {
                    names.push(ident.name().into());
                }
            }
            var_names_of_statement(node.body(), names);
        }
        Statement::ForOfLoop(node) => {
            if let IterableLoopInitializer::Var(binding) = node.initializer() {
                for ident in binding.idents() {
                    names.push(ident.name().into());
                }
            }
            var_names_of_statement(node.body(), names);
        }
        Statement::Switch(node) => {
            for case in node.cases() {
                names.extend(var_declared_names(case.body().statements()));
            }
        }
        Statement::Labelled(node) => match node.item() {
            LabelledItem::Statement(statement) => var_names_of_statement(statement, names),
            LabelledItem::Function(_) => {}
        },
        Statement::With(node) => var_names_of_statement(node.statement(), names),
        Statement::Try(node) => {
            names.extend(var_declared_names(node.block().statement_list().statements()));
            if let Some(catch) = node.handler() {
                names.extend(var_declared_names(
                    catch.block().statement_list().statements(),
                ));
            }
            if let Some(finally) = node.finally() {
                names.extend(var_declared_names(
                    finally.block().statement_list().statements(),
                ));
            }
        }
        _ => {}
    }
}

/// Collects the Annex-B candidates of a body: the names of function
/// declarations nested in blocks, excluding those blocked by a lexical
/// name on the path from the body down to the declaration. Simple catch
/// parameters are permeable.
#[must_use]
pub fn annex_b_function_names(items: &[StatementListItem]) -> Vec<JsString> {
    let mut found = Vec::new();
    // The body's own lexical declarations block from the start.
    let blockers = collect_block_names(items).lexical;
    for item in items {
        if let StatementListItem::Statement(statement) = item {
            annex_b_of_statement(statement, &blockers, &mut found);
        }
    }
    found
}

fn annex_b_of_items(
    items: &[StatementListItem],
    blockers: &FxHashSet<JsString>,
    found: &mut Vec<JsString>,
) {
    let names = collect_block_names(items);
    let mut blockers = blockers.clone();
    blockers.extend(names.lexical.iter().cloned());

    for item in items {
        match item {
            StatementListItem::Declaration(Declaration::Function(function)) => {
                if let Some(name) = function.name() {
                    let name = JsString::from(name.name());
                    if !blockers.contains(&name) {
                        found.push(name);
                    }
                }
            }
            StatementListItem::Statement(statement) => {
                annex_b_of_statement(statement, &blockers, found);
            }
            StatementListItem::Declaration(_) => {}
        }
    }
}

fn annex_b_of_statement(
    statement: &Statement,
    blockers: &FxHashSet<JsString>,
    found: &mut Vec<JsString>,
) {
    match statement {
        Statement::Block(block) => {
            annex_b_of_items(block.statement_list().statements(), blockers, found);
        }
        Statement::If(node) => {
            annex_b_of_statement(node.body(), blockers, found);
            if let Some(else_node) = node.else_node() {
                annex_b_of_statement(else_node, blockers, found);
            }
        }
        Statement::WhileLoop(node) => annex_b_of_statement(node.body(), blockers, found),
        Statement::DoWhileLoop(node) => annex_b_of_statement(node.body(), blockers, found),
        Statement::ForLoop(node) => annex_b_of_statement(node.body(), blockers, found),
        Statement::ForInLoop(node) => annex_b_of_statement(node.body(), blockers, found),
        Statement::ForOfLoop(node) => annex_b_of_statement(node.body(), blockers, found),
        Statement::Switch(node) => {
            for case in node.cases() {
                annex_b_of_items(case.body().statements(), blockers, found);
            }
        }
        Statement::Labelled(node) => {
            if let LabelledItem::Statement(statement) = node.item() {
                annex_b_of_statement(statement, blockers, found);
            }
        }
        Statement::Try(node) => {
            annex_b_of_items(node.block().statement_list().statements(), blockers, found);
            if let Some(catch) = node.handler() {
                let mut blockers = blockers.clone();
                match catch.parameter() {
                    // Simple catch parameters are permeable.
                    Some(Binding::Identifier(_)) | None => {}
                    Some(Binding::Pattern(pattern)) => {
                        for ident in pattern.idents() {
                            blockers.insert(ident.name().into());
                        }
                    }
                }
                annex_b_of_items(
                    catch.block().statement_list().statements(),
                    &blockers,
                    found,
                );
            }
            if let Some(finally) = node.finally() {
                annex_b_of_items(
                    finally.block().statement_list().statements(),
                    blockers,
                    found,
                );
            }
        }
        _ => {}
    }
}

/// Declares the lexical bindings of a block or body on `env`: `let`/
/// `const`/`class` names enter the TDZ; block-level function declarations
/// are created initialized, in source order.
///
/// Fails with a `SyntaxError` on duplicate lexical names, and with a
/// `SyntaxError` when a lexical name would shadow a restricted global of a
/// global scope.
pub(crate) fn declare_lexical_bindings(
    items: &[StatementListItem],
    env: &Environment,
    functions_as_lexical: bool,
    context: &mut Context,
) -> EvalResult<()> {
    for item in items {
        let StatementListItem::Declaration(declaration) = item else {
            continue;
        };
        match declaration {
            Declaration::Lexical(lexical) => {
                let is_const = lexical.is_const();
                for variable in lexical.variable_list().as_ref() {
                    for ident in variable.idents() {
                        let name = JsString::from(ident.name());
                        if declare_checked(&name, env, context)? {
                            return Ok(());
                        }
                        let options = if is_const {
                            DefineOptions::constant()
                        } else {
                            DefineOptions::lexical()
                        };
                        env.define_uninitialized(
                            name,
                            DefineOptions {
                                blocks_function_scope: true,
                                ..options
                            },
                        );
                    }
                }
            }
            Declaration::Class(class) => {
                if let Some(ident) = class.name() {
                    let name = JsString::from(ident.name());
                    if declare_checked(&name, env, context)? {
                        return Ok(());
                    }
                    env.define_uninitialized(
                        name,
                        DefineOptions {
                            blocks_function_scope: true,
                            ..DefineOptions::lexical()
                        },
                    );
                }
            }
            Declaration::Function(function) => {
                if !functions_as_lexical {
                    continue;
                }
                let Some(ident) = function.name() else {
                    continue;
                };
                let name = JsString::from(ident.name());
                let value = crate::eval::function::make_function(function, env, context);
                env.define(name, value.into(), DefineOptions::lexical());
            }
        }
    }
    Ok(())
}

fn declare_checked(
    name: &JsString,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<bool> {
    if env.has_own_binding(name) {
        context.throw(JsNativeError::syntax().with_message(format!(
            "Identifier '{name}' has already been declared"
        )))?;
        return Ok(true);
    }
    if env.is_global() && context.realm().is_restricted_global(name) {
        context.throw(JsNativeError::syntax().with_message(format!(
            "Cannot declare a lexical binding named '{name}'"
        )))?;
        return Ok(true);
    }
    Ok(false)
}

/// Hoists the declarations of a program or function body into its
/// function-scope environment: functions first (establishing initial
/// values), then Annex-B block functions when enabled, then `var` slots.
pub(crate) fn hoist_declarations(
    items: &[StatementListItem],
    env: &Environment,
    annex_b: bool,
    context: &mut Context,
) -> EvalResult<()> {
    // Functions first: source order, later declarations win.
    for item in items {
        if let StatementListItem::Declaration(Declaration::Function(function)) = item {
            if let Some(ident) = function.name() {
                let value = crate::eval::function::make_function(function, env, context);
                env.define_function_scoped(ident.name().into(), value.into(), true);
            }
        }
    }

    // Annex-B block functions get an `undefined` var-side slot.
    if annex_b {
        for name in annex_b_function_names(items) {
            env.define_function_scoped(name, JsValue::Undefined, false);
        }
    }

    // Vars create `undefined` slots without clobbering initialized ones.
    for name in var_declared_names(items) {
        env.define_function_scoped(name, JsValue::Undefined, false);
    }

    Ok(())
}
