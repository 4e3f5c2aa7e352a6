use microjs::{Value, evaluate_script};

#[ctor::ctor]
fn init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

fn eval_num(source: &str) -> f64 {
    match evaluate_script(source, None) {
        Ok(v) => v.as_number().unwrap_or_else(|| panic!("expected a number, got {v:?}")),
        Err(e) => panic!("evaluation failed: {e}"),
    }
}

fn eval_str(source: &str) -> String {
    match evaluate_script(source, None) {
        Ok(Value::String(s)) => s.to_rust_string(),
        other => panic!("expected a string, got {other:?}"),
    }
}

#[test]
fn catch_receives_thrown_object() {
    assert_eq!(
        eval_num("function f() { try { throw { m: 1 }; } catch (e) { return e.m + 41; } finally { } } f();"),
        42.0
    );
}

#[test]
fn catch_preserves_primitive_throws() {
    assert_eq!(eval_num("try { throw 42; } catch (e) { e; }"), 42.0);
    assert_eq!(eval_str("try { throw 'boom'; } catch (e) { e; }"), "boom");
}

#[test]
fn uncaught_throw_reaches_the_embedder() {
    let result = evaluate_script("throw 'unhandled';", None);
    match result {
        Err(microjs::JSError::Thrown(Value::String(s))) => assert_eq!(s.to_rust_string(), "unhandled"),
        other => panic!("expected a thrown string, got {other:?}"),
    }
}

#[test]
fn finally_runs_on_both_paths() {
    assert_eq!(
        eval_str("var log = ''; try { log += 'try'; } finally { log += ',finally'; } log;"),
        "try,finally"
    );
    assert_eq!(
        eval_str("var log = ''; try { try { throw 'x'; } finally { log += 'finally'; } } catch (e) { log += ',' + e; } log;"),
        "finally,x"
    );
}

#[test]
fn normal_finally_preserves_pending_return() {
    assert_eq!(eval_num("function f() { try { return 1; } finally { } } f();"), 1.0);
}

#[test]
fn non_normal_finally_replaces_the_outcome() {
    assert_eq!(eval_num("function f() { try { return 1; } finally { return 2; } } f();"), 2.0);
    // a break in finally swallows the exception
    assert_eq!(
        eval_num("function f() { while (true) { try { throw 'x'; } finally { break; } } return 3; } f();"),
        3.0
    );
}

#[test]
fn catch_parameter_does_not_leak_into_function_scope() {
    assert_eq!(
        eval_str("function f() { var e = 'outer'; try { throw 'inner'; } catch (e) { } return e; } f();"),
        "outer"
    );
}

#[test]
fn var_declared_in_catch_is_function_scoped() {
    assert_eq!(
        eval_num("function f() { try { throw 1; } catch (e) { var hoisted = 9; } return hoisted; } f();"),
        9.0
    );
}

#[test]
fn rethrow_from_catch() {
    assert_eq!(
        eval_str("var r; try { try { throw 'inner'; } catch (e) { throw 'outer:' + e; } } catch (e2) { r = e2; } r;"),
        "outer:inner"
    );
}

#[test]
fn runtime_errors_are_catchable_error_objects() {
    assert_eq!(
        eval_str("try { missingFunction(); } catch (e) { e.name; }"),
        "ReferenceError"
    );
    assert_eq!(eval_str("try { null.x; } catch (e) { e.name; }"), "TypeError");
    assert_eq!(eval_str("try { var n = 1; n(); } catch (e) { e.name; }"), "TypeError");
}

#[test]
fn error_to_string_joins_name_and_message() {
    assert_eq!(eval_str("new Error('broken').toString();"), "Error: broken");
    assert_eq!(eval_str("new Error().toString();"), "Error");
    assert_eq!(eval_str("String(new Error('x'));"), "Error: x");
}

#[test]
fn throw_inside_loop_propagates_through_completion() {
    assert_eq!(
        eval_num("var r = 0; try { for (var i = 0; i < 10; i++) { if (i == 3) throw i; } } catch (e) { r = e; } r;"),
        3.0
    );
}
