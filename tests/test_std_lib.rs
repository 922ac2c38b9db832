//! Tests for the built-in objects, run through the sandbox.

extern crate playground;

use std::rc::Rc;

use futures::executor::block_on;

use playground::runner::ds::value::JsValue;
use playground::runner::{NoopRequire, Sandbox};

fn eval(body: &str) -> JsValue {
    match block_on(Sandbox::new().execute(body, Rc::new(NoopRequire))) {
        Ok(v) => v,
        Err(e) => panic!("`{}` failed: {}", body, e),
    }
}

fn s(v: &str) -> JsValue {
    JsValue::from(v)
}

// ============================================================================
// Array tests
// ============================================================================

mod array_tests {
    use super::*;

    #[test]
    fn test_callbacks() {
        assert_eq!(
            eval("return [1, 2, 3, 4].filter(n => n % 2 === 0).map(n => n * 10).join('-');"),
            s("20-40")
        );
        assert_eq!(eval("return [3, 1, 2].find(n => n < 3);"), JsValue::from(1));
        assert_eq!(eval("return [1, 2].some(n => n > 1) && [1, 2].every(n => n > 0);"), JsValue::Boolean(true));
    }

    #[test]
    fn test_sort() {
        assert_eq!(eval("return [10, 9, 1].sort().join(',');"), s("1,10,9"));
        assert_eq!(eval("return [10, 9, 1].sort((a, b) => a - b).join(',');"), s("1,9,10"));
    }

    #[test]
    fn test_mutators() {
        assert_eq!(
            eval("const a = [1, 2, 3]; a.push(4); a.shift(); a.splice(1, 1); return a.join(',');"),
            s("2,4")
        );
        assert_eq!(eval("return [[1, [2]], 3].flat(2).length;"), JsValue::from(3));
        assert_eq!(eval("return Array.isArray([]) && !Array.isArray({});"), JsValue::Boolean(true));
    }
}

// ============================================================================
// String tests
// ============================================================================

mod string_tests {
    use super::*;

    #[test]
    fn test_common_methods() {
        assert_eq!(eval("return '  Hello '.trim().toUpperCase();"), s("HELLO"));
        assert_eq!(eval("return 'a,b,c'.split(',').length;"), JsValue::from(3));
        assert_eq!(eval("return 'plugin.ts'.endsWith('.ts');"), JsValue::Boolean(true));
        assert_eq!(eval("return '7'.padStart(3, '0');"), s("007"));
        assert_eq!(eval("return 'a-b-c'.replaceAll('-', '+');"), s("a+b+c"));
        assert_eq!(eval("return 'abc'.slice(-2);"), s("bc"));
    }
}

// ============================================================================
// Object and JSON tests
// ============================================================================

mod object_tests {
    use super::*;

    #[test]
    fn test_keys_and_entries() {
        assert_eq!(eval("return Object.keys({ b: 1, a: 2 }).join();"), s("b,a"));
        assert_eq!(
            eval("return Object.entries({ a: 1 }).map(([k, v]) => k + v).join();"),
            s("a1")
        );
        assert_eq!(
            eval("const o = Object.assign({}, { a: 1 }, { b: 2 }); return o.a + o.b;"),
            JsValue::from(3)
        );
    }

    #[test]
    fn test_json_round_trip() {
        assert_eq!(
            eval("return JSON.stringify({ a: [1, 'x', null], b: undefined });"),
            s(r#"{"a":[1,"x",null]}"#)
        );
        assert_eq!(eval("return JSON.parse('{\"n\": 2.5}').n;"), JsValue::from(2.5));
    }

    #[test]
    fn test_json_parse_error_is_catchable() {
        assert_eq!(
            eval("try { JSON.parse('{'); } catch (e) { return e.name; }"),
            s("SyntaxError")
        );
    }
}

// ============================================================================
// Math and Number tests
// ============================================================================

mod number_tests {
    use super::*;

    #[test]
    fn test_math() {
        assert_eq!(eval("return Math.max(1, 5, 3) + Math.abs(-2);"), JsValue::from(7));
        assert_eq!(eval("return Math.round(2.5) + Math.floor(-1.5);"), JsValue::from(1));
        assert_eq!(eval("const r = Math.random(); return r >= 0 && r < 1;"), JsValue::Boolean(true));
    }

    #[test]
    fn test_number() {
        assert_eq!(eval("return parseInt('42px') + Number('1.5');"), JsValue::from(43.5));
        assert_eq!(eval("return (3.14159).toFixed(2);"), s("3.14"));
        assert_eq!(eval("return Number.isInteger(5) && isNaN('x');"), JsValue::Boolean(true));
    }
}

// ============================================================================
// Error and console tests
// ============================================================================

mod error_tests {
    use super::*;

    #[test]
    fn test_error_objects() {
        assert_eq!(eval("return new TypeError('bad').toString();"), s("TypeError: bad"));
        assert_eq!(eval("return new Error('x') instanceof Error;"), JsValue::Boolean(true));
    }

    #[test]
    fn test_console_returns_undefined() {
        assert_eq!(eval("return console.log('hello', { a: 1 });"), JsValue::Undefined);
    }
}
