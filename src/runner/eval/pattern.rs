//! Binding initialization for declarations, parameters and loop heads.

use futures::future::{FutureExt, LocalBoxFuture};

use crate::parser::ast::{PatternType, PropertyKey};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{new_array, object_from_entries};
use crate::runner::ds::operations::object::{get, iterate, own_keys};
use crate::runner::ds::operations::type_conversion::{to_property_key, to_string};
use crate::runner::ds::value::JsValue;

use super::expression::evaluate_expression;
use super::types::ExecutionContext;

/// Binds every name of `pattern` in the innermost scope of `ctx`.
pub fn bind_pattern<'a>(
    pattern: &'a PatternType,
    value: JsValue,
    ctx: &'a ExecutionContext,
    mutable: bool,
) -> LocalBoxFuture<'a, Result<(), JErrorType>> {
    async move {
        match pattern {
            PatternType::Identifier(id) => {
                ctx.environment.initialize_binding(&id.name, value, mutable);
            }
            PatternType::AssignmentPattern { left, right, .. } => {
                let value = match value {
                    JsValue::Undefined => evaluate_expression(right, ctx).await?,
                    v => v,
                };
                bind_pattern(left, value, ctx, mutable).await?;
            }
            PatternType::ObjectPattern {
                properties, rest, ..
            } => {
                if value.is_nullish() {
                    return Err(JErrorType::TypeError(format!(
                        "Cannot destructure '{}' as it is {}.",
                        to_string(&value),
                        to_string(&value)
                    )));
                }
                let mut used = vec![];
                for p in properties {
                    let key = match &p.key {
                        PropertyKey::Static(s) => s.clone(),
                        PropertyKey::Computed(e) => {
                            to_property_key(&evaluate_expression(e, ctx).await?)
                        }
                    };
                    let v = get(&ctx.realm, &value, &key)?;
                    used.push(key);
                    bind_pattern(&p.value, v, ctx, mutable).await?;
                }
                if let Some(rest) = rest {
                    let mut entries = vec![];
                    for key in own_keys(&value) {
                        if !used.contains(&key) {
                            let v = get(&ctx.realm, &value, &key)?;
                            entries.push((key, v));
                        }
                    }
                    bind_pattern(rest, object_from_entries(entries), ctx, mutable).await?;
                }
            }
            PatternType::ArrayPattern { elements, rest, .. } => {
                let items = iterate(&value)?;
                for (idx, element) in elements.iter().enumerate() {
                    let v = items.get(idx).cloned().unwrap_or(JsValue::Undefined);
                    bind_pattern(element, v, ctx, mutable).await?;
                }
                if let Some(rest) = rest {
                    let remaining = items.into_iter().skip(elements.len()).collect();
                    bind_pattern(rest, new_array(remaining), ctx, mutable).await?;
                }
            }
        }
        Ok(())
    }
    .boxed_local()
}
