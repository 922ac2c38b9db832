//! Expression evaluation.
//!
//! Every evaluator returns a boxed local future: expressions may contain
//! `await` and calls into async host functions.

use futures::future::{FutureExt, LocalBoxFuture};

use crate::parser::ast::{
    AssignmentOperator, BinaryOperator, ExpressionOrSpreadElement, ExpressionType, LiteralData,
    LiteralType, LogicalOperator, MemberExpressionType, PropertyKey, PropertyType, UnaryOperator,
    UpdateOperator,
};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{array_length, new_array, new_object, ObjectType};
use crate::runner::ds::operations::object::{
    delete_property, get, has_property, iterate, own_keys, set, unwrap_proxy,
};
use crate::runner::ds::operations::test_and_comparison::{
    less_than, loose_equals, strict_equals, to_primitive,
};
use crate::runner::ds::operations::type_conversion::{
    get_type, to_boolean, to_int32, to_number, to_property_key, to_string,
};
use crate::runner::ds::value::{check_string_length, JsValue};

use super::function::{call_function, construct, instantiate_function, instantiate_function_expression};
use super::types::{ExecutionContext, ValueResult};

/// Evaluate an expression and return its value.
pub fn evaluate_expression<'a>(
    expr: &'a ExpressionType,
    ctx: &'a ExecutionContext,
) -> LocalBoxFuture<'a, ValueResult> {
    async move {
        match expr {
            ExpressionType::Literal(lit) => Ok(evaluate_literal(lit)),

            ExpressionType::Identifier(id) => ctx.environment.get_binding_value(&id.name),

            ExpressionType::ThisExpression { .. } => Ok(ctx.this.clone()),

            ExpressionType::TemplateLiteral {
                quasis,
                expressions,
                ..
            } => {
                let mut s = String::new();
                for (idx, quasi) in quasis.iter().enumerate() {
                    check_string_length(s.len() + quasi.len())?;
                    s.push_str(quasi);
                    if let Some(e) = expressions.get(idx) {
                        let part = to_string(&evaluate_expression(e, ctx).await?);
                        check_string_length(s.len() + part.len())?;
                        s.push_str(&part);
                    }
                }
                Ok(JsValue::String(s))
            }

            ExpressionType::ArrayExpression { elements, .. } => {
                let values = evaluate_list(elements, ctx).await?;
                array_length(values.len() as f64)?;
                Ok(new_array(values))
            }

            ExpressionType::ObjectExpression { properties, .. } => {
                evaluate_object_literal(properties, ctx).await
            }

            ExpressionType::FunctionExpression(data) => {
                Ok(instantiate_function_expression(data, ctx))
            }

            ExpressionType::ArrowFunctionExpression(data) => Ok(instantiate_function(data, ctx)),

            ExpressionType::UnaryExpression {
                operator, argument, ..
            } => evaluate_unary_expression(operator, argument, ctx).await,

            ExpressionType::UpdateExpression {
                operator,
                argument,
                prefix,
                ..
            } => {
                let old = to_number(&evaluate_expression(argument, ctx).await?);
                let new = match operator {
                    UpdateOperator::PlusPlus => old + 1.0,
                    UpdateOperator::MinusMinus => old - 1.0,
                };
                assign_to(argument, JsValue::Number(new), ctx).await?;
                Ok(JsValue::Number(if *prefix { new } else { old }))
            }

            ExpressionType::BinaryExpression {
                operator,
                left,
                right,
                ..
            } => {
                let l = evaluate_expression(left, ctx).await?;
                let r = evaluate_expression(right, ctx).await?;
                apply_binary_operator(operator, &l, &r, ctx)
            }

            ExpressionType::LogicalExpression {
                operator,
                left,
                right,
                ..
            } => {
                let l = evaluate_expression(left, ctx).await?;
                let short_circuit = match operator {
                    LogicalOperator::Or => to_boolean(&l),
                    LogicalOperator::And => !to_boolean(&l),
                    LogicalOperator::Nullish => !l.is_nullish(),
                };
                if short_circuit {
                    Ok(l)
                } else {
                    evaluate_expression(right, ctx).await
                }
            }

            ExpressionType::AssignmentExpression {
                operator,
                left,
                right,
                ..
            } => evaluate_assignment_expression(operator, left, right, ctx).await,

            ExpressionType::ConditionalExpression {
                test,
                consequent,
                alternate,
                ..
            } => {
                if to_boolean(&evaluate_expression(test, ctx).await?) {
                    evaluate_expression(consequent, ctx).await
                } else {
                    evaluate_expression(alternate, ctx).await
                }
            }

            ExpressionType::CallExpression { .. } | ExpressionType::MemberExpression(_) => {
                Ok(match evaluate_chain(expr, ctx).await? {
                    ChainResult::Value { value, .. } => value,
                    ChainResult::ShortCircuit => JsValue::Undefined,
                })
            }

            ExpressionType::NewExpression {
                callee, arguments, ..
            } => {
                let callee = evaluate_expression(callee, ctx).await?;
                let args = evaluate_list(arguments, ctx).await?;
                construct(ctx.realm.clone(), callee, args).await
            }

            // There are no promises: async functions complete before the call
            // returns, so the awaited value is the value.
            ExpressionType::AwaitExpression { argument, .. } => {
                evaluate_expression(argument, ctx).await
            }
        }
    }
    .boxed_local()
}

fn evaluate_literal(lit: &LiteralData) -> JsValue {
    match &lit.value {
        LiteralType::NullLiteral => JsValue::Null,
        LiteralType::BooleanLiteral(b) => JsValue::Boolean(*b),
        LiteralType::StringLiteral(s) => JsValue::String(s.clone()),
        LiteralType::NumberLiteral(n) => JsValue::Number(*n),
    }
}

/// Evaluates call arguments or array elements, expanding spreads.
pub async fn evaluate_list(
    elements: &[ExpressionOrSpreadElement],
    ctx: &ExecutionContext,
) -> Result<Vec<JsValue>, JErrorType> {
    let mut values = Vec::with_capacity(elements.len());
    for element in elements {
        match element {
            ExpressionOrSpreadElement::Expression(e) => {
                values.push(evaluate_expression(e, ctx).await?)
            }
            ExpressionOrSpreadElement::SpreadElement(e) => {
                let v = evaluate_expression(e, ctx).await?;
                values.extend(iterate(&v)?);
            }
        }
    }
    Ok(values)
}

async fn evaluate_property_key(key: &PropertyKey, ctx: &ExecutionContext) -> Result<String, JErrorType> {
    Ok(match key {
        PropertyKey::Static(s) => s.clone(),
        PropertyKey::Computed(e) => to_property_key(&evaluate_expression(e, ctx).await?),
    })
}

async fn evaluate_object_literal(properties: &[PropertyType], ctx: &ExecutionContext) -> ValueResult {
    let object = new_object();
    for p in properties {
        match p {
            PropertyType::Init { key, value, .. } => {
                let key = evaluate_property_key(key, ctx).await?;
                let value = evaluate_expression(value, ctx).await?;
                set(&object, &key, value)?;
            }
            PropertyType::Method { key, value, .. } => {
                let key = evaluate_property_key(key, ctx).await?;
                let f = instantiate_function(value, ctx);
                set(&object, &key, f)?;
            }
            PropertyType::Spread { argument, .. } => {
                let source = evaluate_expression(argument, ctx).await?;
                if source.is_nullish() {
                    continue;
                }
                for key in own_keys(&source) {
                    let v = get(&ctx.realm, &source, &key)?;
                    set(&object, &key, v)?;
                }
            }
        }
    }
    Ok(object)
}

async fn evaluate_unary_expression(
    operator: &UnaryOperator,
    argument: &ExpressionType,
    ctx: &ExecutionContext,
) -> ValueResult {
    match operator {
        UnaryOperator::TypeOf => {
            if let ExpressionType::Identifier(id) = argument {
                if !ctx.environment.has_binding(&id.name) {
                    return Ok(JsValue::from("undefined"));
                }
            }
            let v = evaluate_expression(argument, ctx).await?;
            Ok(JsValue::from(get_type(&v)))
        }
        UnaryOperator::Delete => match argument {
            ExpressionType::MemberExpression(member) => {
                let (object, key) = evaluate_member_target(member, ctx).await?;
                Ok(JsValue::Boolean(delete_property(&object, &key)))
            }
            _ => Ok(JsValue::Boolean(true)),
        },
        _ => {
            let v = evaluate_expression(argument, ctx).await?;
            Ok(match operator {
                UnaryOperator::Minus => JsValue::Number(-to_number(&v)),
                UnaryOperator::Plus => JsValue::Number(to_number(&v)),
                UnaryOperator::LogicalNot => JsValue::Boolean(!to_boolean(&v)),
                UnaryOperator::BitwiseNot => JsValue::Number(!to_int32(&v) as f64),
                _ => JsValue::Undefined,
            })
        }
    }
}

pub fn apply_binary_operator(
    operator: &BinaryOperator,
    l: &JsValue,
    r: &JsValue,
    ctx: &ExecutionContext,
) -> ValueResult {
    Ok(match operator {
        BinaryOperator::Add => {
            if let (JsValue::String(a), JsValue::String(b)) = (l, r) {
                check_string_length(a.len() + b.len())?;
                return Ok(JsValue::String(format!("{}{}", a, b)));
            }
            let lp = to_primitive(l);
            let rp = to_primitive(r);
            if matches!(lp, JsValue::String(_)) || matches!(rp, JsValue::String(_)) {
                let (ls, rs) = (to_string(&lp), to_string(&rp));
                check_string_length(ls.len() + rs.len())?;
                JsValue::String(ls + &rs)
            } else {
                JsValue::Number(to_number(&lp) + to_number(&rp))
            }
        }
        BinaryOperator::Subtract => JsValue::Number(to_number(l) - to_number(r)),
        BinaryOperator::Multiply => JsValue::Number(to_number(l) * to_number(r)),
        BinaryOperator::Divide => JsValue::Number(to_number(l) / to_number(r)),
        BinaryOperator::Modulo => JsValue::Number(to_number(l) % to_number(r)),
        BinaryOperator::Exponent => JsValue::Number(to_number(l).powf(to_number(r))),
        BinaryOperator::BitwiseOr => JsValue::Number((to_int32(l) | to_int32(r)) as f64),
        BinaryOperator::BitwiseXor => JsValue::Number((to_int32(l) ^ to_int32(r)) as f64),
        BinaryOperator::BitwiseAnd => JsValue::Number((to_int32(l) & to_int32(r)) as f64),
        BinaryOperator::StrictlyEqual => JsValue::Boolean(strict_equals(l, r)),
        BinaryOperator::StrictlyUnequal => JsValue::Boolean(!strict_equals(l, r)),
        BinaryOperator::LooselyEqual => JsValue::Boolean(loose_equals(l, r)),
        BinaryOperator::LooselyUnequal => JsValue::Boolean(!loose_equals(l, r)),
        BinaryOperator::LessThan => JsValue::Boolean(less_than(l, r) == Some(true)),
        BinaryOperator::GreaterThan => JsValue::Boolean(less_than(r, l) == Some(true)),
        BinaryOperator::LessThanEqual => JsValue::Boolean(less_than(r, l) == Some(false)),
        BinaryOperator::GreaterThanEqual => JsValue::Boolean(less_than(l, r) == Some(false)),
        BinaryOperator::In => JsValue::Boolean(has_property(&ctx.realm, r, &to_property_key(l))?),
        BinaryOperator::InstanceOf => JsValue::Boolean(instance_of(l, r)?),
    })
}

/// Without prototype chains, `instanceof` is answered from the kind of the
/// value and the name of the built-in constructor.
fn instance_of(value: &JsValue, constructor: &JsValue) -> Result<bool, JErrorType> {
    let constructor = unwrap_proxy(constructor);
    let constructor_name = match constructor.as_object() {
        Some(o) => match &*o.borrow() {
            ObjectType::Function(f) => Some(f.name.clone()),
            _ => None,
        },
        None => None,
    };
    let constructor_name = constructor_name.ok_or_else(|| {
        JErrorType::TypeError("Right-hand side of 'instanceof' is not callable".to_string())
    })?;
    let value = unwrap_proxy(value);
    let o = match value.as_object() {
        Some(o) => o,
        None => return Ok(false),
    };
    let borrowed = o.borrow();
    let result = match (&*borrowed, constructor_name.as_str()) {
        (_, "Object") => true,
        (ObjectType::Array(_), "Array") => true,
        (ObjectType::Function(_), "Function") => true,
        (ObjectType::Error(_), "Error") => true,
        (ObjectType::Error(base), name) => base.get("name") == Some(JsValue::from(name)),
        _ => false,
    };
    Ok(result)
}

async fn evaluate_assignment_expression(
    operator: &AssignmentOperator,
    left: &ExpressionType,
    right: &ExpressionType,
    ctx: &ExecutionContext,
) -> ValueResult {
    let value = match operator {
        AssignmentOperator::Equals => evaluate_expression(right, ctx).await?,
        AssignmentOperator::OrEquals
        | AssignmentOperator::AndEquals
        | AssignmentOperator::NullishEquals => {
            let current = evaluate_expression(left, ctx).await?;
            let keep = match operator {
                AssignmentOperator::OrEquals => to_boolean(&current),
                AssignmentOperator::AndEquals => !to_boolean(&current),
                _ => !current.is_nullish(),
            };
            if keep {
                return Ok(current);
            }
            evaluate_expression(right, ctx).await?
        }
        _ => {
            let current = evaluate_expression(left, ctx).await?;
            let r = evaluate_expression(right, ctx).await?;
            let binary = match operator {
                AssignmentOperator::AddEquals => BinaryOperator::Add,
                AssignmentOperator::SubtractEquals => BinaryOperator::Subtract,
                AssignmentOperator::MultiplyEquals => BinaryOperator::Multiply,
                AssignmentOperator::DivideEquals => BinaryOperator::Divide,
                _ => BinaryOperator::Modulo,
            };
            apply_binary_operator(&binary, &current, &r, ctx)?
        }
    };
    assign_to(left, value.clone(), ctx).await?;
    Ok(value)
}

/// Stores `value` into an identifier or member target.
async fn assign_to(target: &ExpressionType, value: JsValue, ctx: &ExecutionContext) -> Result<(), JErrorType> {
    match target {
        ExpressionType::Identifier(id) => ctx.environment.set_mutable_binding(&id.name, value),
        ExpressionType::MemberExpression(member) => {
            let (object, key) = evaluate_member_target(member, ctx).await?;
            set(&object, &key, value)
        }
        _ => Err(JErrorType::SyntaxError(
            "Invalid left-hand side in assignment".to_string(),
        )),
    }
}

async fn evaluate_member_target(
    member: &MemberExpressionType,
    ctx: &ExecutionContext,
) -> Result<(JsValue, String), JErrorType> {
    Ok(match member {
        MemberExpressionType::SimpleMemberExpression {
            object, property, ..
        } => (
            evaluate_expression(object, ctx).await?,
            property.name.clone(),
        ),
        MemberExpressionType::ComputedMemberExpression {
            object, property, ..
        } => {
            let object = evaluate_expression(object, ctx).await?;
            let key = to_property_key(&evaluate_expression(property, ctx).await?);
            (object, key)
        }
    })
}

enum ChainResult {
    /// An optional link hit `null`/`undefined`; the whole chain is undefined.
    ShortCircuit,
    Value { this: JsValue, value: JsValue },
}

/// Evaluates member accesses and calls, tracking the `this` value for
/// method calls and optional-chaining short circuits.
fn evaluate_chain<'a>(
    expr: &'a ExpressionType,
    ctx: &'a ExecutionContext,
) -> LocalBoxFuture<'a, Result<ChainResult, JErrorType>> {
    async move {
        match expr {
            ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
                object,
                property,
                optional,
                ..
            }) => {
                let object = match evaluate_chain(object, ctx).await? {
                    ChainResult::ShortCircuit => return Ok(ChainResult::ShortCircuit),
                    ChainResult::Value { value, .. } => value,
                };
                if *optional && object.is_nullish() {
                    return Ok(ChainResult::ShortCircuit);
                }
                let value = get(&ctx.realm, &object, &property.name)?;
                Ok(ChainResult::Value {
                    this: object,
                    value,
                })
            }
            ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
                object,
                property,
                optional,
                ..
            }) => {
                let object = match evaluate_chain(object, ctx).await? {
                    ChainResult::ShortCircuit => return Ok(ChainResult::ShortCircuit),
                    ChainResult::Value { value, .. } => value,
                };
                if *optional && object.is_nullish() {
                    return Ok(ChainResult::ShortCircuit);
                }
                let key = to_property_key(&evaluate_expression(property, ctx).await?);
                let value = get(&ctx.realm, &object, &key)?;
                Ok(ChainResult::Value {
                    this: object,
                    value,
                })
            }
            ExpressionType::CallExpression {
                callee,
                arguments,
                optional,
                ..
            } => {
                let (this, f) = match evaluate_chain(callee, ctx).await? {
                    ChainResult::ShortCircuit => return Ok(ChainResult::ShortCircuit),
                    ChainResult::Value { this, value } => (this, value),
                };
                if *optional && f.is_nullish() {
                    return Ok(ChainResult::ShortCircuit);
                }
                let args = evaluate_list(arguments, ctx).await?;
                if !f.is_callable() && !unwrap_proxy(&f).is_callable() {
                    return Err(JErrorType::TypeError(format!(
                        "{} is not a function",
                        describe_callee(callee)
                    )));
                }
                let value = call_function(&ctx.realm, &f, this, args).await?;
                Ok(ChainResult::Value {
                    this: JsValue::Undefined,
                    value,
                })
            }
            other => Ok(ChainResult::Value {
                this: JsValue::Undefined,
                value: evaluate_expression(other, ctx).await?,
            }),
        }
    }
    .boxed_local()
}

fn describe_callee(callee: &ExpressionType) -> String {
    match callee {
        ExpressionType::Identifier(id) => id.name.clone(),
        ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
            object,
            property,
            ..
        }) => format!("{}.{}", describe_callee(object), property.name),
        ExpressionType::MemberExpression(_) => "member".to_string(),
        ExpressionType::ThisExpression { .. } => "this".to_string(),
        _ => "expression".to_string(),
    }
}
