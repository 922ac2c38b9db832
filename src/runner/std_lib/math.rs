//! Math built-in object.

use std::cell::Cell;

use crate::runner::ds::operations::type_conversion::to_number;
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::ValueResult;

use super::core::{arg, BuiltInObject};

/// Defines a `Math` method applying an `f64 -> f64` function to its first
/// argument.
macro_rules! unary_math_fn {
    ($name:ident, $op:expr) => {
        fn $name(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
            let f: fn(f64) -> f64 = $op;
            Ok(JsValue::Number(f(to_number(&arg(&args, 0)))))
        }
    };
}

/// Register the Math object.
pub fn register(realm: &Realm) {
    BuiltInObject::new("Math")
        .add_property("E", JsValue::from(std::f64::consts::E))
        .add_property("LN10", JsValue::from(std::f64::consts::LN_10))
        .add_property("LN2", JsValue::from(std::f64::consts::LN_2))
        .add_property("LOG10E", JsValue::from(std::f64::consts::LOG10_E))
        .add_property("LOG2E", JsValue::from(std::f64::consts::LOG2_E))
        .add_property("PI", JsValue::from(std::f64::consts::PI))
        .add_property("SQRT1_2", JsValue::from(std::f64::consts::FRAC_1_SQRT_2))
        .add_property("SQRT2", JsValue::from(std::f64::consts::SQRT_2))
        .add_method("abs", math_abs)
        .add_method("floor", math_floor)
        .add_method("ceil", math_ceil)
        .add_method("round", math_round)
        .add_method("trunc", math_trunc)
        .add_method("sign", math_sign)
        .add_method("sqrt", math_sqrt)
        .add_method("cbrt", math_cbrt)
        .add_method("exp", math_exp)
        .add_method("log", math_log)
        .add_method("log10", math_log10)
        .add_method("log2", math_log2)
        .add_method("sin", math_sin)
        .add_method("cos", math_cos)
        .add_method("tan", math_tan)
        .add_method("atan", math_atan)
        .add_method("atan2", math_atan2)
        .add_method("pow", math_pow)
        .add_method("min", math_min)
        .add_method("max", math_max)
        .add_method("hypot", math_hypot)
        .add_method("random", math_random)
        .install(realm);
}

unary_math_fn!(math_abs, f64::abs);
unary_math_fn!(math_floor, f64::floor);
unary_math_fn!(math_ceil, f64::ceil);
unary_math_fn!(math_trunc, f64::trunc);
unary_math_fn!(math_sqrt, f64::sqrt);
unary_math_fn!(math_cbrt, f64::cbrt);
unary_math_fn!(math_exp, f64::exp);
unary_math_fn!(math_log, f64::ln);
unary_math_fn!(math_log10, f64::log10);
unary_math_fn!(math_log2, f64::log2);
unary_math_fn!(math_sin, f64::sin);
unary_math_fn!(math_cos, f64::cos);
unary_math_fn!(math_tan, f64::tan);
unary_math_fn!(math_atan, f64::atan);

/// Rounds half up, as `Math.round(-2.5) === -2`.
fn math_round(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let n = to_number(&arg(&args, 0));
    Ok(JsValue::Number((n + 0.5).floor()))
}

fn math_sign(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let n = to_number(&arg(&args, 0));
    Ok(JsValue::Number(if n.is_nan() || n == 0.0 {
        n
    } else {
        n.signum()
    }))
}

fn math_atan2(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let y = to_number(&arg(&args, 0));
    let x = to_number(&arg(&args, 1));
    Ok(JsValue::Number(y.atan2(x)))
}

fn math_pow(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let base = to_number(&arg(&args, 0));
    let exponent = to_number(&arg(&args, 1));
    Ok(JsValue::Number(base.powf(exponent)))
}

fn fold_numbers(args: &[JsValue], init: f64, pick: fn(f64, f64) -> f64) -> f64 {
    let mut acc = init;
    for a in args {
        let n = to_number(a);
        if n.is_nan() {
            return f64::NAN;
        }
        acc = pick(acc, n);
    }
    acc
}

fn math_min(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    Ok(JsValue::Number(fold_numbers(&args, f64::INFINITY, f64::min)))
}

fn math_max(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    Ok(JsValue::Number(fold_numbers(
        &args,
        f64::NEG_INFINITY,
        f64::max,
    )))
}

fn math_hypot(_this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let sum: f64 = args.iter().map(|a| to_number(a).powi(2)).sum();
    Ok(JsValue::Number(sum.sqrt()))
}

thread_local! {
    static RANDOM_STATE: Cell<u64> = Cell::new(0);
}

/// xorshift64*, seeded from the clock on first use.
fn math_random(_this: JsValue, _args: Vec<JsValue>) -> ValueResult {
    let next = RANDOM_STATE.with(|state| {
        let mut x = state.get();
        if x == 0 {
            use std::time::{SystemTime, UNIX_EPOCH};
            x = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0x2545_f491_4f6c_dd1d)
                | 1;
        }
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        state.set(x);
        x.wrapping_mul(0x2545_f491_4f6c_dd1d)
    });
    Ok(JsValue::Number((next >> 11) as f64 / (1u64 << 53) as f64))
}
