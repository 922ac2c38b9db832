//! Number built-in and the numeric global functions.

use crate::parser::util::format_number;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::native_function;
use crate::runner::ds::operations::object::unwrap_proxy;
use crate::runner::ds::operations::type_conversion::{to_number, to_string};
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::ValueResult;

use super::core::{arg, BuiltInObject, PrototypeKind};

/// Register the Number built-in plus `parseInt`, `parseFloat`, `isNaN` and
/// `isFinite`.
pub fn register(realm: &Realm) {
    BuiltInObject::new("Number")
        .with_constructor(number_constructor)
        .with_prototype(PrototypeKind::Number)
        .add_property("MAX_SAFE_INTEGER", JsValue::from(9007199254740991.0))
        .add_property("MIN_SAFE_INTEGER", JsValue::from(-9007199254740991.0))
        .add_property("EPSILON", JsValue::from(f64::EPSILON))
        .add_property("POSITIVE_INFINITY", JsValue::from(f64::INFINITY))
        .add_property("NEGATIVE_INFINITY", JsValue::from(f64::NEG_INFINITY))
        .add_property("NaN", JsValue::from(f64::NAN))
        .add_method("isInteger", number_is_integer)
        .add_method("isFinite", number_is_finite)
        .add_method("isNaN", number_is_nan)
        .add_method("parseFloat", parse_float)
        .add_method("parseInt", parse_int)
        .add_prototype_method("toFixed", number_to_fixed)
        .add_prototype_method("toString", number_to_string)
        .install(realm);

    let globals: [(&str, fn(JsValue, Vec<JsValue>) -> ValueResult); 4] = [
        ("parseInt", parse_int),
        ("parseFloat", parse_float),
        ("isNaN", global_is_nan),
        ("isFinite", global_is_finite),
    ];
    for (name, f) in globals {
        realm
            .global_env
            .initialize_binding(name, native_function(name, f), true);
    }
    realm
        .global_env
        .initialize_binding("NaN", JsValue::from(f64::NAN), false);
    realm
        .global_env
        .initialize_binding("Infinity", JsValue::from(f64::INFINITY), false);
    realm
        .global_env
        .initialize_binding("undefined", JsValue::Undefined, false);
}

fn this_number(this: &JsValue) -> Result<f64, JErrorType> {
    match unwrap_proxy(this) {
        JsValue::Number(n) => Ok(n),
        other => Err(JErrorType::TypeError(format!(
            "Number.prototype method called on {}",
            to_string(&other)
        ))),
    }
}

fn number_constructor(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    Ok(JsValue::Number(match args.first() {
        Some(v) => to_number(v),
        None => 0.0,
    }))
}

fn number_is_integer(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    Ok(JsValue::Boolean(matches!(
        arg(&args, 0),
        JsValue::Number(n) if n.is_finite() && n.fract() == 0.0
    )))
}

fn number_is_finite(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    Ok(JsValue::Boolean(matches!(
        arg(&args, 0),
        JsValue::Number(n) if n.is_finite()
    )))
}

fn number_is_nan(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    Ok(JsValue::Boolean(matches!(
        arg(&args, 0),
        JsValue::Number(n) if n.is_nan()
    )))
}

fn global_is_nan(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    Ok(JsValue::Boolean(to_number(&arg(&args, 0)).is_nan()))
}

fn global_is_finite(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    Ok(JsValue::Boolean(to_number(&arg(&args, 0)).is_finite()))
}

/// Longest numeric prefix, as `parseFloat("3.5px") === 3.5`.
fn parse_float(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let s = to_string(&arg(&args, 0));
    let s = s.trim_start();
    for prefix in ["Infinity", "+Infinity", "-Infinity"] {
        if s.starts_with(prefix) {
            let sign = if prefix.starts_with('-') { -1.0 } else { 1.0 };
            return Ok(JsValue::Number(sign * f64::INFINITY));
        }
    }
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut seen_exp = false;
    let bytes = s.as_bytes();
    while end < bytes.len() {
        let c = bytes[end];
        match c {
            b'0'..=b'9' => seen_digit = true,
            b'+' | b'-' if end == 0 || matches!(bytes[end - 1], b'e' | b'E') => {}
            b'.' if !seen_dot && !seen_exp => seen_dot = true,
            b'e' | b'E' if seen_digit && !seen_exp => seen_exp = true,
            _ => break,
        }
        end += 1;
    }
    let mut candidate = &s[..end];
    while !candidate.is_empty() {
        if let Ok(n) = candidate.parse::<f64>() {
            return Ok(JsValue::Number(n));
        }
        candidate = &candidate[..candidate.len() - 1];
    }
    Ok(JsValue::Number(f64::NAN))
}

fn parse_int(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let s = to_string(&arg(&args, 0));
    let mut s = s.trim();
    let mut sign = 1.0;
    if let Some(rest) = s.strip_prefix('-') {
        sign = -1.0;
        s = rest;
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    }
    let mut radix = match arg(&args, 1) {
        JsValue::Undefined => 10,
        r => to_number(&r) as u32,
    };
    if radix == 0 {
        radix = 10;
    }
    if radix == 16 || matches!(arg(&args, 1), JsValue::Undefined) {
        if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            s = rest;
            radix = 16;
        }
    }
    if !(2..=36).contains(&radix) {
        return Ok(JsValue::Number(f64::NAN));
    }
    let digits: Vec<u32> = s.chars().map_while(|c| c.to_digit(radix)).collect();
    if digits.is_empty() {
        return Ok(JsValue::Number(f64::NAN));
    }
    let n = digits
        .into_iter()
        .fold(0.0, |acc, d| acc * radix as f64 + d as f64);
    Ok(JsValue::Number(sign * n))
}

fn number_to_fixed(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let n = this_number(&this)?;
    let digits = to_number(&arg(&args, 0));
    let digits = if digits.is_nan() { 0.0 } else { digits.trunc() };
    if !(0.0..=100.0).contains(&digits) {
        return Err(JErrorType::RangeError(
            "toFixed() digits argument must be between 0 and 100".to_string(),
        ));
    }
    if !n.is_finite() {
        return Ok(JsValue::String(format_number(n)));
    }
    Ok(JsValue::String(format!("{:.*}", digits as usize, n)))
}

fn number_to_string(this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let n = this_number(&this)?;
    let radix = match arg(&args, 0) {
        JsValue::Undefined => 10,
        r => to_number(&r) as u32,
    };
    if radix == 10 || !n.is_finite() || n.fract() != 0.0 {
        return Ok(JsValue::String(format_number(n)));
    }
    if !(2..=36).contains(&radix) {
        return Err(JErrorType::RangeError(
            "toString() radix must be between 2 and 36".to_string(),
        ));
    }
    let mut value = n.abs() as u64;
    let mut digits = vec![];
    loop {
        let d = (value % radix as u64) as u32;
        digits.push(std::char::from_digit(d, radix).unwrap_or('0'));
        value /= radix as u64;
        if value == 0 {
            break;
        }
    }
    if n < 0.0 {
        digits.push('-');
    }
    Ok(JsValue::String(digits.into_iter().rev().collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int() {
        let parse = |s: &str| parse_int(JsValue::Undefined, vec![JsValue::from(s)]).unwrap();
        assert_eq!(parse("42px"), JsValue::from(42));
        assert_eq!(parse("  -0x1f"), JsValue::from(-31));
        assert!(parse("px").as_number().unwrap().is_nan());
        assert_eq!(
            parse_int(JsValue::Undefined, vec![JsValue::from("101"), JsValue::from(2)]).unwrap(),
            JsValue::from(5)
        );
    }

    #[test]
    fn test_parse_float() {
        let parse = |s: &str| parse_float(JsValue::Undefined, vec![JsValue::from(s)]).unwrap();
        assert_eq!(parse("3.5px"), JsValue::from(3.5));
        assert_eq!(parse("1e3"), JsValue::from(1000));
        assert_eq!(parse("1e"), JsValue::from(1));
        assert!(parse(".").as_number().unwrap().is_nan());
    }

    #[test]
    fn test_formatting() {
        assert_eq!(
            number_to_fixed(JsValue::from(3.14159), vec![JsValue::from(2)]).unwrap(),
            JsValue::from("3.14")
        );
        assert_eq!(
            number_to_string(JsValue::from(255), vec![JsValue::from(16)]).unwrap(),
            JsValue::from("ff")
        );
    }
}
