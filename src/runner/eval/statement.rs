//! Statement execution.

use futures::future::{FutureExt, LocalBoxFuture};

use crate::parser::ast::{
    CatchClauseData, DeclarationType, ExpressionType, ForInit, PatternType, StatementType,
    SwitchCaseData, VariableDeclarationData, VariableDeclarationKind,
};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::object::{iterate, own_keys};
use crate::runner::ds::operations::test_and_comparison::strict_equals;
use crate::runner::ds::operations::type_conversion::to_boolean;
use crate::runner::ds::value::JsValue;

use super::expression::evaluate_expression;
use super::function::instantiate_function;
use super::pattern::bind_pattern;
use super::types::{Completion, CompletionType, EvalResult, ExecutionContext};

/// Runs the statements of a function body in the scope of `ctx`.
pub fn execute_function_body<'a>(
    body: &'a [StatementType],
    ctx: &'a ExecutionContext,
) -> LocalBoxFuture<'a, EvalResult> {
    execute_statements(body, ctx)
}

/// Hoists the declarations of `body` into the innermost scope, then runs the
/// statements in order until one completes abruptly.
pub fn execute_statements<'a>(
    body: &'a [StatementType],
    ctx: &'a ExecutionContext,
) -> LocalBoxFuture<'a, EvalResult> {
    async move {
        hoist_declarations(body, ctx);
        for statement in body {
            let completion = execute_statement(statement, ctx).await?;
            if completion.is_abrupt() {
                return Ok(completion);
            }
        }
        Ok(Completion::normal())
    }
    .boxed_local()
}

/// Function declarations are initialized up front; lexical declarations
/// exist but stay uninitialized until their statement runs.
fn hoist_declarations(body: &[StatementType], ctx: &ExecutionContext) {
    for statement in body {
        match statement {
            StatementType::Declaration(DeclarationType::FunctionDeclaration(data)) => {
                if let Some(id) = &data.id {
                    let f = instantiate_function(data, ctx);
                    ctx.environment.initialize_binding(&id.name, f, true);
                }
            }
            StatementType::Declaration(DeclarationType::VariableDeclaration(decl)) => {
                let mutable = decl.kind != VariableDeclarationKind::Const;
                for name in declared_names(decl) {
                    ctx.environment.create_binding(&name, mutable);
                }
            }
            _ => {}
        }
    }
}

fn declared_names(decl: &VariableDeclarationData) -> Vec<String> {
    let mut names = vec![];
    for d in &decl.declarations {
        d.id.bound_names(&mut names);
    }
    names
}

pub fn execute_statement<'a>(
    statement: &'a StatementType,
    ctx: &'a ExecutionContext,
) -> LocalBoxFuture<'a, EvalResult> {
    async move {
        match statement {
            StatementType::ExpressionStatement { expression, .. } => {
                let value = evaluate_expression(expression, ctx).await?;
                Ok(Completion {
                    completion_type: CompletionType::Normal,
                    value: Some(value),
                })
            }
            StatementType::BlockStatement { body, .. } => {
                execute_statements(body, &ctx.new_block()).await
            }
            StatementType::EmptyStatement { .. } => Ok(Completion::normal()),
            StatementType::Declaration(DeclarationType::FunctionDeclaration(_)) => {
                Ok(Completion::normal())
            }
            StatementType::Declaration(DeclarationType::VariableDeclaration(decl)) => {
                execute_variable_declaration(decl, ctx).await?;
                Ok(Completion::normal())
            }
            StatementType::IfStatement {
                test,
                consequent,
                alternate,
                ..
            } => {
                if to_boolean(&evaluate_expression(test, ctx).await?) {
                    execute_statement(consequent, ctx).await
                } else if let Some(alternate) = alternate {
                    execute_statement(alternate, ctx).await
                } else {
                    Ok(Completion::normal())
                }
            }
            StatementType::WhileStatement { test, body, .. } => {
                while to_boolean(&evaluate_expression(test, ctx).await?) {
                    let completion = execute_statement(body, ctx).await?;
                    if let Some(exit) = loop_exit(completion) {
                        return Ok(exit);
                    }
                }
                Ok(Completion::normal())
            }
            StatementType::ForStatement {
                init,
                test,
                update,
                body,
                ..
            } => {
                let loop_ctx = ctx.new_block();
                let mut per_iteration = vec![];
                match init {
                    Some(ForInit::VariableDeclaration(decl)) => {
                        per_iteration = declared_names(decl);
                        let mutable = decl.kind != VariableDeclarationKind::Const;
                        for name in &per_iteration {
                            loop_ctx.environment.create_binding(name, mutable);
                        }
                        execute_variable_declaration(decl, &loop_ctx).await?;
                    }
                    Some(ForInit::Expression(e)) => {
                        evaluate_expression(e, &loop_ctx).await?;
                    }
                    None => {}
                }
                let mut iteration_ctx = loop_ctx
                    .with_environment(loop_ctx.environment.copy_for_iteration(&per_iteration));
                loop {
                    if let Some(test) = test {
                        if !to_boolean(&evaluate_expression(test, &iteration_ctx).await?) {
                            break;
                        }
                    }
                    let completion = execute_statement(body, &iteration_ctx).await?;
                    if let Some(exit) = loop_exit(completion) {
                        return Ok(exit);
                    }
                    iteration_ctx = iteration_ctx.with_environment(
                        iteration_ctx.environment.copy_for_iteration(&per_iteration),
                    );
                    if let Some(update) = update {
                        evaluate_expression(update, &iteration_ctx).await?;
                    }
                }
                Ok(Completion::normal())
            }
            StatementType::ForInStatement {
                kind,
                left,
                right,
                body,
                ..
            } => {
                let object = evaluate_expression(right, ctx).await?;
                let keys = if object.is_nullish() {
                    vec![]
                } else {
                    own_keys(&object)
                };
                let values = keys.into_iter().map(JsValue::String).collect();
                execute_for_each(kind, left, values, body, ctx).await
            }
            StatementType::ForOfStatement {
                kind,
                left,
                right,
                body,
                ..
            } => {
                let iterable = evaluate_expression(right, ctx).await?;
                let values = iterate(&iterable)?;
                execute_for_each(kind, left, values, body, ctx).await
            }
            StatementType::SwitchStatement {
                discriminant,
                cases,
                ..
            } => execute_switch(discriminant, cases, ctx).await,
            StatementType::ReturnStatement { argument, .. } => {
                let value = match argument {
                    Some(e) => evaluate_expression(e, ctx).await?,
                    None => JsValue::Undefined,
                };
                Ok(Completion::return_value(value))
            }
            StatementType::ThrowStatement { argument, .. } => {
                let value = evaluate_expression(argument, ctx).await?;
                Err(JErrorType::Thrown(value))
            }
            StatementType::TryStatement {
                block,
                handler,
                finalizer,
                ..
            } => execute_try(block, handler.as_ref(), finalizer.as_deref(), ctx).await,
            StatementType::BreakStatement { .. } => Ok(Completion::break_completion()),
            StatementType::ContinueStatement { .. } => Ok(Completion::continue_completion()),
        }
    }
    .boxed_local()
}

/// Maps a loop body completion to the completion that ends the loop, if any.
fn loop_exit(completion: Completion) -> Option<Completion> {
    match completion.completion_type {
        CompletionType::Normal | CompletionType::Continue => None,
        CompletionType::Break => Some(Completion::normal()),
        CompletionType::Return => Some(completion),
    }
}

async fn execute_variable_declaration(
    decl: &VariableDeclarationData,
    ctx: &ExecutionContext,
) -> Result<(), JErrorType> {
    let mutable = decl.kind != VariableDeclarationKind::Const;
    for d in &decl.declarations {
        let value = match &d.init {
            Some(init) => evaluate_expression(init, ctx).await?,
            None => JsValue::Undefined,
        };
        bind_pattern(&d.id, value, ctx, mutable).await?;
    }
    Ok(())
}

async fn execute_for_each(
    kind: &VariableDeclarationKind,
    left: &PatternType,
    values: Vec<JsValue>,
    body: &StatementType,
    ctx: &ExecutionContext,
) -> EvalResult {
    let mutable = *kind != VariableDeclarationKind::Const;
    for value in values {
        let iteration_ctx = ctx.new_block();
        bind_pattern(left, value, &iteration_ctx, mutable).await?;
        let completion = execute_statement(body, &iteration_ctx).await?;
        if let Some(exit) = loop_exit(completion) {
            return Ok(exit);
        }
    }
    Ok(Completion::normal())
}

async fn execute_switch(
    discriminant: &ExpressionType,
    cases: &[SwitchCaseData],
    ctx: &ExecutionContext,
) -> EvalResult {
    let value = evaluate_expression(discriminant, ctx).await?;
    let block_ctx = ctx.new_block();
    for case in cases {
        hoist_declarations(&case.consequent, &block_ctx);
    }
    let mut start = None;
    for (idx, case) in cases.iter().enumerate() {
        if let Some(test) = &case.test {
            let candidate = evaluate_expression(test, &block_ctx).await?;
            if strict_equals(&value, &candidate) {
                start = Some(idx);
                break;
            }
        }
    }
    let start = match start.or_else(|| cases.iter().position(|c| c.test.is_none())) {
        Some(idx) => idx,
        None => return Ok(Completion::normal()),
    };
    for case in &cases[start..] {
        for statement in &case.consequent {
            let completion = execute_statement(statement, &block_ctx).await?;
            match completion.completion_type {
                CompletionType::Normal => {}
                CompletionType::Break => return Ok(Completion::normal()),
                _ => return Ok(completion),
            }
        }
    }
    Ok(Completion::normal())
}

async fn execute_try(
    block: &[StatementType],
    handler: Option<&CatchClauseData>,
    finalizer: Option<&[StatementType]>,
    ctx: &ExecutionContext,
) -> EvalResult {
    let mut result = execute_statements(block, &ctx.new_block()).await;
    if let Some(handler) = handler {
        if let Err(e) = &result {
            let thrown = e.to_value();
            result = execute_catch(handler, thrown, &ctx.new_block()).await;
        }
    }
    if let Some(finalizer) = finalizer {
        let completion = execute_statements(finalizer, &ctx.new_block()).await?;
        if completion.is_abrupt() {
            return Ok(completion);
        }
    }
    result
}

async fn execute_catch(
    handler: &CatchClauseData,
    thrown: JsValue,
    ctx: &ExecutionContext,
) -> EvalResult {
    if let Some(param) = &handler.param {
        bind_pattern(param, thrown, ctx, true).await?;
    }
    execute_statements(&handler.body, ctx).await
}
