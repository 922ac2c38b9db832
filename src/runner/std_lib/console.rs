//! Console built-in object.
//!
//! Output goes to the `log` facade under the `plugin` target; the host
//! decides where it ends up.

use crate::runner::ds::operations::object::unwrap_proxy;
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::ValueResult;

use super::core::BuiltInObject;
use super::json::to_json;

/// Register the console object.
pub fn register(realm: &Realm) {
    BuiltInObject::new("console")
        .add_method("log", console_log)
        .add_method("info", console_log)
        .add_method("debug", console_debug)
        .add_method("warn", console_warn)
        .add_method("error", console_error)
        .install(realm);
}

/// Strings print raw; plain objects and arrays print as JSON.
fn format_value(value: &JsValue) -> String {
    let target = unwrap_proxy(value);
    match &target {
        JsValue::String(s) => s.clone(),
        JsValue::Object(_) if !target.is_callable() => match to_json(&target) {
            Ok(Some(json)) if json.is_object() || json.is_array() => json.to_string(),
            _ => to_string(&target),
        },
        other => to_string(other),
    }
}

/// Format all arguments for console output.
pub fn format_args(args: &[JsValue]) -> String {
    args.iter()
        .map(format_value)
        .collect::<Vec<_>>()
        .join(" ")
}

fn console_log(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    info!(target: "plugin", "{}", format_args(&args));
    Ok(JsValue::Undefined)
}

fn console_debug(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    debug!(target: "plugin", "{}", format_args(&args));
    Ok(JsValue::Undefined)
}

fn console_warn(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    warn!(target: "plugin", "{}", format_args(&args));
    Ok(JsValue::Undefined)
}

fn console_error(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    error!(target: "plugin", "{}", format_args(&args));
    Ok(JsValue::Undefined)
}
