use crate::runner::ds::operations::type_conversion::{to_number, to_string};
use crate::runner::ds::value::JsValue;

pub fn strict_equals(a: &JsValue, b: &JsValue) -> bool {
    a == b
}

/// SameValueZero, used by `includes`: like `===` but NaN equals NaN.
pub fn same_value_zero(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Number(x), JsValue::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => a == b,
    }
}

pub fn loose_equals(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Undefined | JsValue::Null, JsValue::Undefined | JsValue::Null) => true,
        (JsValue::Undefined | JsValue::Null, _) | (_, JsValue::Undefined | JsValue::Null) => false,
        (JsValue::Number(_), JsValue::String(_)) | (JsValue::String(_), JsValue::Number(_)) => {
            to_number(a) == to_number(b)
        }
        (JsValue::Boolean(_), _) => loose_equals(&JsValue::Number(to_number(a)), b),
        (_, JsValue::Boolean(_)) => loose_equals(a, &JsValue::Number(to_number(b))),
        (JsValue::Object(_), JsValue::Object(_)) => a == b,
        (JsValue::Object(_), _) => loose_equals(&JsValue::String(to_string(a)), b),
        (_, JsValue::Object(_)) => loose_equals(a, &JsValue::String(to_string(b))),
        _ => a == b,
    }
}

/// Abstract relational comparison `a < b`. `None` means undefined (NaN
/// involved), which every relational operator treats as `false`.
pub fn less_than(a: &JsValue, b: &JsValue) -> Option<bool> {
    let pa = to_primitive(a);
    let pb = to_primitive(b);
    if let (JsValue::String(x), JsValue::String(y)) = (&pa, &pb) {
        return Some(x < y);
    }
    let x = to_number(&pa);
    let y = to_number(&pb);
    if x.is_nan() || y.is_nan() {
        None
    } else {
        Some(x < y)
    }
}

/// Objects become their string form; everything else is already primitive.
pub fn to_primitive(v: &JsValue) -> JsValue {
    match v {
        JsValue::Object(_) => JsValue::String(to_string(v)),
        other => other.clone(),
    }
}
