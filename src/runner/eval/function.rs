//! Function objects: creation, calls and `new`.

use std::rc::Rc;

use futures::future::{self, FutureExt, LocalBoxFuture};

use crate::parser::ast::{FunctionBodyType, FunctionData};
use crate::runner::ds::env_record::Environment;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::{new_function, FunctionKind};
use crate::runner::ds::object::{new_array, new_object, ObjectType};
use crate::runner::ds::operations::object::unwrap_proxy;
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;

use super::expression::evaluate_expression;
use super::pattern::bind_pattern;
use super::statement::execute_function_body;
use super::types::{CompletionType, ExecutionContext, ValueResult};

/// Creates a closure over the current scope.
pub fn instantiate_function(data: &Rc<FunctionData>, ctx: &ExecutionContext) -> JsValue {
    let name = data
        .id
        .as_ref()
        .map(|id| id.name.clone())
        .unwrap_or_default();
    let lexical_this = if data.is_arrow {
        Some(ctx.this.clone())
    } else {
        None
    };
    new_function(
        &name,
        FunctionKind::Script {
            data: data.clone(),
            environment: ctx.environment.clone(),
            lexical_this,
        },
    )
}

/// A named function expression can refer to itself by its name.
pub fn instantiate_function_expression(data: &Rc<FunctionData>, ctx: &ExecutionContext) -> JsValue {
    match &data.id {
        Some(id) if !data.is_arrow => {
            let environment = ctx.environment.new_child();
            let f = instantiate_function(data, &ctx.with_environment(environment.clone()));
            environment.initialize_binding(&id.name, f.clone(), false);
            f
        }
        _ => instantiate_function(data, ctx),
    }
}

fn function_kind(callee: &JsValue) -> Option<FunctionKind> {
    let target = unwrap_proxy(callee);
    let kind = match &target {
        JsValue::Object(o) => match &*o.borrow() {
            ObjectType::Function(f) => Some(f.kind.clone()),
            _ => None,
        },
        _ => None,
    };
    kind
}

/// Calls `callee` with the given `this` and arguments.
pub fn call_function(
    realm: &Rc<Realm>,
    callee: &JsValue,
    this: JsValue,
    args: Vec<JsValue>,
) -> LocalBoxFuture<'static, ValueResult> {
    let kind = match function_kind(callee) {
        Some(k) => k,
        None => {
            return future::ready(Err(JErrorType::TypeError(format!(
                "{} is not a function",
                to_string(callee)
            ))))
            .boxed_local()
        }
    };
    match kind {
        FunctionKind::Native(f) => future::ready(f(this, args)).boxed_local(),
        FunctionKind::AsyncNative(f) => f(realm.clone(), this, args),
        FunctionKind::Host(f) => future::ready(f(this, args)).boxed_local(),
        FunctionKind::AsyncHost(f) => f(this, args),
        FunctionKind::Script {
            data,
            environment,
            lexical_this,
        } => call_script_function(
            realm.clone(),
            data,
            environment,
            lexical_this.unwrap_or(this),
            args,
        )
        .boxed_local(),
    }
}

async fn call_script_function(
    realm: Rc<Realm>,
    data: Rc<FunctionData>,
    environment: Environment,
    this: JsValue,
    args: Vec<JsValue>,
) -> ValueResult {
    let _call = realm.enter_call()?;
    let ctx = ExecutionContext::new(realm, environment.new_child(), this);
    let mut args = args.into_iter();
    for param in &data.params {
        let arg = args.next().unwrap_or(JsValue::Undefined);
        bind_pattern(param, arg, &ctx, true).await?;
    }
    if let Some(rest) = &data.rest {
        bind_pattern(rest, new_array(args.collect()), &ctx, true).await?;
    }
    match &data.body {
        FunctionBodyType::Expression(e) => evaluate_expression(e, &ctx).await,
        FunctionBodyType::Block(body) => {
            let completion = execute_function_body(body, &ctx).await?;
            Ok(if completion.completion_type == CompletionType::Return {
                completion.get_value()
            } else {
                JsValue::Undefined
            })
        }
    }
}

/// `new callee(...args)`.
pub fn construct(
    realm: Rc<Realm>,
    callee: JsValue,
    args: Vec<JsValue>,
) -> LocalBoxFuture<'static, ValueResult> {
    async move {
        let target = unwrap_proxy(&callee);
        let (is_constructor, is_script) = match &target {
            JsValue::Object(o) => match &*o.borrow() {
                ObjectType::Function(f) => (
                    f.is_constructor(),
                    matches!(f.kind, FunctionKind::Script { .. }),
                ),
                _ => (false, false),
            },
            _ => (false, false),
        };
        if !is_constructor {
            return Err(JErrorType::TypeError(format!(
                "{} is not a constructor",
                to_string(&callee)
            )));
        }
        if !is_script {
            return call_function(&realm, &target, JsValue::Undefined, args).await;
        }
        let this = new_object();
        let result = call_function(&realm, &target, this.clone(), args).await?;
        Ok(match result {
            JsValue::Object(_) => result,
            _ => this,
        })
    }
    .boxed_local()
}
