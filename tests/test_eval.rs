//! Tests for the interpreter.
//!
//! Each snippet runs as a sandbox body; its `return` value is checked.

extern crate playground;

use std::rc::Rc;

use futures::executor::block_on;

use playground::runner::ds::error::JErrorType;
use playground::runner::ds::operations::object::get_own;
use playground::runner::ds::value::JsValue;
use playground::runner::{NoopRequire, Sandbox, SandboxError};

fn eval(body: &str) -> JsValue {
    match block_on(Sandbox::new().execute(body, Rc::new(NoopRequire))) {
        Ok(v) => v,
        Err(e) => panic!("`{}` failed: {}", body, e),
    }
}

fn eval_err(body: &str) -> JErrorType {
    match block_on(Sandbox::new().execute(body, Rc::new(NoopRequire))) {
        Err(SandboxError::Runtime(e)) => e,
        Err(e) => panic!("`{}` did not parse: {}", body, e),
        Ok(v) => panic!("`{}` returned {:?}", body, v),
    }
}

fn num(n: f64) -> JsValue {
    JsValue::Number(n)
}

fn s(v: &str) -> JsValue {
    JsValue::from(v)
}

// ============================================================================
// Operators
// ============================================================================

mod operator_tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("return 1 + 1;"), num(2.0));
        assert_eq!(eval("return 7 % 3 * 2 - 1;"), num(1.0));
        assert_eq!(eval("return 7 % (3 * 2) - 1;"), num(0.0));
        assert_eq!(eval("return 2 ** 10;"), num(1024.0));
        assert_eq!(eval("return 2 ** 3 ** 2;"), num(512.0));
        assert_eq!(eval("return 1 / 4;"), num(0.25));
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(eval("return 'a' + 1 + 2;"), s("a12"));
        assert_eq!(eval("return 1 + 2 + 'a';"), s("3a"));
        assert_eq!(eval("const n = 3; return `n = ${n + 1}!`;"), s("n = 4!"));
    }

    #[test]
    fn test_comparison() {
        assert_eq!(eval("return 1 < 2 && 'b' > 'a';"), JsValue::Boolean(true));
        assert_eq!(eval("return 1 == '1';"), JsValue::Boolean(true));
        assert_eq!(eval("return 1 === '1';"), JsValue::Boolean(false));
        assert_eq!(eval("return null == undefined;"), JsValue::Boolean(true));
        assert_eq!(eval("return null === undefined;"), JsValue::Boolean(false));
    }

    #[test]
    fn test_logical_and_nullish() {
        assert_eq!(eval("return 0 || 'x';"), s("x"));
        assert_eq!(eval("return 0 ?? 'x';"), num(0.0));
        assert_eq!(eval("return null ?? 'x';"), s("x"));
        assert_eq!(eval("let a = null; a ??= 5; return a;"), num(5.0));
        assert_eq!(eval("let b = 1; b &&= 2; return b;"), num(2.0));
    }

    #[test]
    fn test_unary_left_of_exponent() {
        assert!(matches!(
            block_on(Sandbox::new().execute("return -2 ** 2;", Rc::new(NoopRequire))),
            Err(SandboxError::Syntax(_))
        ));
        assert_eq!(eval("return (-2) ** 2;"), num(4.0));
        assert_eq!(eval("return -(2 ** 2);"), num(-4.0));
        assert_eq!(eval("return 2 ** -1;"), num(0.5));
        assert_eq!(eval("let i = 1; return ++i ** 2;"), num(4.0));
    }

    #[test]
    fn test_typeof() {
        assert_eq!(eval("return typeof 1;"), s("number"));
        assert_eq!(eval("return typeof 'a';"), s("string"));
        assert_eq!(eval("return typeof {};"), s("object"));
        assert_eq!(eval("return typeof (() => 1);"), s("function"));
        assert_eq!(eval("return typeof notDeclared;"), s("undefined"));
    }

    #[test]
    fn test_update_and_compound_assignment() {
        assert_eq!(eval("let i = 1; const j = i++; return i * 10 + j;"), num(21.0));
        assert_eq!(eval("let i = 1; const j = ++i; return i * 10 + j;"), num(22.0));
        assert_eq!(eval("let x = 10; x -= 3; x *= 2; return x;"), num(14.0));
    }
}

// ============================================================================
// Objects and arrays
// ============================================================================

mod object_tests {
    use super::*;

    #[test]
    fn test_object_literal_and_members() {
        assert_eq!(
            eval("const k = 'b'; const o = { a: 1, [k]: 2, f() { return this.a; } }; return o.f() + o.b;"),
            num(3.0)
        );
        assert_eq!(eval("const o = { a: { b: 5 } }; return o['a'].b;"), num(5.0));
    }

    #[test]
    fn test_optional_chaining() {
        assert_eq!(eval("const o = null; return o?.a.b;"), JsValue::Undefined);
        assert_eq!(eval("const o = { a: { b: 1 } }; return o?.a?.b;"), num(1.0));
        assert_eq!(eval("const o = {}; return o.f?.();"), JsValue::Undefined);
        assert_eq!(eval("const o = { f() { return 2; } }; return o.f?.();"), num(2.0));
        assert_eq!(eval("const o = null; return o?.[0];"), JsValue::Undefined);
        assert_eq!(eval("const o = { k: 3 }; const key = 'k'; return o?.[key];"), num(3.0));
        assert_eq!(eval("const f = null; return f?.(missing);"), JsValue::Undefined);
        assert_eq!(eval("const o = { a: [4] }; return o.b?.[0].c ?? o.a?.[0];"), num(4.0));
    }

    #[test]
    fn test_optional_chain_is_not_assignable() {
        for body in ["const o = {}; o?.a = 1;", "const o = {}; o?.['a'] = 1;", "const o = {}; o?.a++;"] {
            assert!(matches!(
                block_on(Sandbox::new().execute(body, Rc::new(NoopRequire))),
                Err(SandboxError::Syntax(_))
            ));
        }
        assert_eq!(eval("const o = { p: {} }; o.p.a = 1; return o?.p.a;"), num(1.0));
    }

    #[test]
    fn test_spread_and_rest() {
        assert_eq!(eval("const a = [1, 2]; const b = [...a, 3]; return b.length;"), num(3.0));
        assert_eq!(
            eval("const o = { a: 1 }; const p = { ...o, b: 2 }; return p.a + p.b;"),
            num(3.0)
        );
        assert_eq!(
            eval("function sum(...xs) { return xs.reduce((a, b) => a + b, 0); } return sum(1, 2, 3);"),
            num(6.0)
        );
    }

    #[test]
    fn test_destructuring() {
        assert_eq!(
            eval("const { a, b: { c = 4 } = {} } = { a: 1 }; return a + c;"),
            num(5.0)
        );
        assert_eq!(eval("const [x, y = 3] = [1]; return x + y;"), num(4.0));
        assert_eq!(eval("const [h, ...t] = [1, 2, 3]; return t.length;"), num(2.0));
    }

    #[test]
    fn test_oversized_arrays_are_range_errors() {
        for body in [
            "const a = []; a.length = 2 ** 60; return 1;",
            "const a = []; a.length = 2 ** 32; return 1;",
            "const a = []; a.length = -1; return 1;",
            "return new Array(2 ** 40).length;",
            "const a = []; a[16777216] = 1; return a.length;",
        ] {
            match eval_err(body) {
                JErrorType::RangeError(m) => assert_eq!(m, "Invalid array length"),
                other => panic!("`{}` raised {}", body, other),
            }
        }
        assert_eq!(
            eval("const a = [1, 2, 3]; a.length = 1; a.length = 2; return a.length + ':' + a[1];"),
            s("2:undefined")
        );
        assert_eq!(
            eval("const a = []; a[4294967295] = 'x'; return a.length + a[4294967295];"),
            s("0x")
        );
    }

    #[test]
    fn test_oversized_strings_are_range_errors() {
        for body in [
            "return 'ab'.repeat(2 ** 62).length;",
            "return 'ab'.repeat(2 ** 27).length;",
            "return 'x'.padStart(2 ** 40);",
            "const big = 'x'.repeat(2 ** 27); return big + 'y';",
            "const big = 'x'.repeat(2 ** 27); return `${big}y`;",
        ] {
            match eval_err(body) {
                JErrorType::RangeError(m) => assert_eq!(m, "Invalid string length"),
                other => panic!("`{}` raised {}", body, other),
            }
        }
        assert_eq!(eval("return ''.repeat(2 ** 62);"), s(""));
        assert_eq!(
            eval("try { 'ab'.repeat(2 ** 62); } catch (e) { return e.name; }"),
            s("RangeError")
        );
    }

    #[test]
    fn test_delete_and_in() {
        assert_eq!(
            eval("const o = { a: 1, b: 2 }; delete o.a; return ('a' in o) + ':' + ('b' in o);"),
            s("false:true")
        );
    }

    #[test]
    fn test_returned_object() {
        let o = eval("return { name: 'p', id: 7 };");
        assert_eq!(get_own(&o, "name"), Some(s("p")));
        assert_eq!(get_own(&o, "id"), Some(num(7.0)));
    }
}

// ============================================================================
// Functions
// ============================================================================

mod function_tests {
    use super::*;

    #[test]
    fn test_closures() {
        assert_eq!(
            eval("function counter() { let n = 0; return () => ++n; } const c = counter(); c(); c(); return c();"),
            num(3.0)
        );
    }

    #[test]
    fn test_hoisted_function_declaration() {
        assert_eq!(eval("return twice(4); function twice(n) { return n * 2; }"), num(8.0));
    }

    #[test]
    fn test_default_parameters() {
        assert_eq!(eval("function f(a, b = a + 1) { return a + b; } return f(1);"), num(3.0));
    }

    #[test]
    fn test_recursion() {
        assert_eq!(
            eval("const fib = (n) => n < 2 ? n : fib(n - 1) + fib(n - 2); return fib(10);"),
            num(55.0)
        );
    }

    #[test]
    fn test_async_functions_complete_before_returning() {
        assert_eq!(
            eval("async function f() { return 1; } const g = async () => (await f()) + 1; return await g();"),
            num(2.0)
        );
    }

    #[test]
    fn test_runaway_recursion_is_a_range_error() {
        match eval_err("function f(n) { return f(n + 1); } return f(0);") {
            JErrorType::RangeError(m) => assert_eq!(m, "Maximum call stack size exceeded"),
            other => panic!("unexpected error {}", other),
        }
        assert!(matches!(
            eval_err("function h() { return [1].map(h); } return h();"),
            JErrorType::RangeError(_)
        ));
    }

    #[test]
    fn test_call_depth_recovers_after_overflow() {
        assert_eq!(
            eval(
                "function f() { return f(); }\n\
                 let caught = '';\n\
                 try { f(); } catch (e) { caught = e.name; }\n\
                 const down = (n) => n === 0 ? 0 : 1 + down(n - 1);\n\
                 return caught + down(40);"
            ),
            s("RangeError40")
        );
    }

    #[test]
    fn test_method_this() {
        assert_eq!(
            eval("const o = { v: 2, read() { return this.v; } }; const p = { v: 3, read: o.read }; return p.read();"),
            num(3.0)
        );
    }

    #[test]
    fn test_new_with_script_function() {
        assert_eq!(
            eval("function Point(x) { this.x = x; } const p = new Point(4); return p.x;"),
            num(4.0)
        );
    }
}

// ============================================================================
// Statements
// ============================================================================

mod statement_tests {
    use super::*;

    #[test]
    fn test_loops() {
        assert_eq!(
            eval("let t = 0; for (let i = 0; i < 5; i++) { if (i === 3) continue; t += i; } return t;"),
            num(7.0)
        );
        assert_eq!(eval("let i = 0; while (true) { if (++i > 4) break; } return i;"), num(5.0));
        assert_eq!(
            eval("let t = ''; for (const x of ['a', 'b']) { t += x; } return t;"),
            s("ab")
        );
        assert_eq!(
            eval("let t = ''; for (const k in { a: 1, b: 2 }) { t += k; } return t;"),
            s("ab")
        );
    }

    #[test]
    fn test_per_iteration_bindings() {
        assert_eq!(
            eval("const fs = []; for (let i = 0; i < 3; i++) { fs.push(() => i); } return fs[0]() + fs[2]();"),
            num(2.0)
        );
    }

    #[test]
    fn test_switch() {
        let body = "function f(x) { switch (x) { case 1: return 'one'; case 2: case 3: return 'few'; default: return 'many'; } }";
        assert_eq!(eval(&format!("{} return f(1);", body)), s("one"));
        assert_eq!(eval(&format!("{} return f(2);", body)), s("few"));
        assert_eq!(eval(&format!("{} return f(9);", body)), s("many"));
    }

    #[test]
    fn test_try_catch_finally() {
        assert_eq!(
            eval("let log = ''; try { throw new Error('boom'); } catch (e) { log += e.message; } finally { log += '!'; } return log;"),
            s("boom!")
        );
        assert_eq!(
            eval("function f() { try { return 1; } finally { return 2; } } return f();"),
            num(2.0)
        );
        assert_eq!(
            eval("try { null.x; } catch (e) { return e instanceof TypeError; }"),
            JsValue::Boolean(true)
        );
    }

    #[test]
    fn test_uncaught_errors() {
        assert!(matches!(eval_err("return missing;"), JErrorType::ReferenceError(_)));
        assert!(matches!(eval_err("const o = {}; o.f();"), JErrorType::TypeError(_)));
        assert!(matches!(eval_err("throw 'x';"), JErrorType::Thrown(JsValue::String(_))));
    }

    #[test]
    fn test_const_cannot_be_reassigned() {
        assert!(matches!(eval_err("const a = 1; a = 2;"), JErrorType::TypeError(_)));
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(
            block_on(Sandbox::new().execute("return ;;)", Rc::new(NoopRequire))),
            Err(SandboxError::Syntax(_))
        ));
    }
}
