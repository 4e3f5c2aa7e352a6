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

fn eval_bool(source: &str) -> bool {
    match evaluate_script(source, None) {
        Ok(Value::Boolean(b)) => b,
        other => panic!("expected a boolean, got {other:?}"),
    }
}

#[test]
fn typeof_covers_every_tag() {
    assert_eq!(eval_str("typeof undefined;"), "undefined");
    assert_eq!(eval_str("typeof null;"), "object");
    assert_eq!(eval_str("typeof true;"), "boolean");
    assert_eq!(eval_str("typeof 1.5;"), "number");
    assert_eq!(eval_str("typeof 'x';"), "string");
    assert_eq!(eval_str("typeof {};"), "object");
    assert_eq!(eval_str("typeof Math.floor;"), "function");
}

#[test]
fn typeof_of_an_undeclared_name_does_not_throw() {
    assert_eq!(eval_str("typeof undeclaredVar;"), "undefined");
}

#[test]
fn reading_an_undeclared_name_throws() {
    assert_eq!(eval_str("try { undeclaredVar; } catch (e) { e.name; }"), "ReferenceError");
}

#[test]
fn strict_equality_is_type_sensitive() {
    assert_eq!(eval_bool("1 === 1;"), true);
    assert_eq!(eval_bool("1 === '1';"), false);
    assert_eq!(eval_bool("null === undefined;"), false);
    assert_eq!(eval_bool("NaN === NaN;"), false);
    assert_eq!(eval_bool("0 === -0;"), true);
    assert_eq!(eval_bool("var o = {}; o === o;"), true);
    assert_eq!(eval_bool("({}) === ({});"), false);
}

#[test]
fn abstract_equality_coerces() {
    assert_eq!(eval_bool("null == undefined;"), true);
    assert_eq!(eval_bool("1 == '1';"), true);
    assert_eq!(eval_bool("0 == false;"), true);
    assert_eq!(eval_bool("'' == 0;"), true);
    assert_eq!(eval_bool("'0' == false;"), true);
    assert_eq!(eval_bool("null == 0;"), false);
    assert_eq!(eval_bool("NaN == NaN;"), false);
    assert_eq!(eval_bool("({}) == '[object Object]';"), true);
}

#[test]
fn to_boolean_falsy_table() {
    assert_eq!(eval_bool("!0 && !'' && !null && !undefined && !NaN;"), true);
    assert_eq!(eval_bool("!!{} && !!'x' && !!1 && !!'0';"), true);
}

#[test]
fn to_number_conversions() {
    assert_eq!(eval_num("+'12';"), 12.0);
    assert_eq!(eval_num("+'  3.5  ';"), 3.5);
    assert_eq!(eval_num("+'';"), 0.0);
    assert_eq!(eval_num("+'0x10';"), 16.0);
    assert_eq!(eval_num("+null;"), 0.0);
    assert_eq!(eval_num("+true;"), 1.0);
    assert_eq!(eval_bool("var n = +'bogus'; n !== n;"), true);
    assert_eq!(eval_bool("var n = +undefined; n !== n;"), true);
}

#[test]
fn to_string_of_numbers_round_trips() {
    assert_eq!(eval_str("'' + 3;"), "3");
    assert_eq!(eval_str("'' + 3.25;"), "3.25");
    assert_eq!(eval_str("'' + (1 / 0);"), "Infinity");
    assert_eq!(eval_str("'' + (-1 / 0);"), "-Infinity");
    assert_eq!(eval_str("'' + (0 / 0);"), "NaN");
    assert_eq!(eval_bool("+('' + 0.1) === 0.1;"), true);
    assert_eq!(eval_bool("+('' + 123456789.25) === 123456789.25;"), true);
}

#[test]
fn arithmetic_follows_ieee() {
    assert_eq!(eval_num("5 / 2;"), 2.5);
    assert_eq!(eval_num("7 % 3;"), 1.0);
    assert_eq!(eval_num("-7 % 3;"), -1.0);
    assert_eq!(eval_num("2 * 3 + 4;"), 10.0);
    assert_eq!(eval_bool("1 / 0 === Infinity;"), true);
}

#[test]
fn bitwise_and_shift_operate_on_int32() {
    assert_eq!(eval_num("(0xff & 0x0f) | 0x30;"), 0x3f as f64);
    assert_eq!(eval_num("1 << 3;"), 8.0);
    assert_eq!(eval_num("-8 >> 1;"), -4.0);
    assert_eq!(eval_num("-8 >>> 28;"), 15.0);
    assert_eq!(eval_num("~5;"), -6.0);
    assert_eq!(eval_num("5.9 | 0;"), 5.0);
}

#[test]
fn relational_operators_compare_numerically() {
    assert_eq!(eval_bool("1 < 2 && 2 <= 2 && 3 > 2 && 3 >= 3;"), true);
    assert_eq!(eval_bool("'10' < 9;"), false);
    assert_eq!(eval_bool("NaN < 1;"), false);
    assert_eq!(eval_bool("NaN >= 1;"), false);
}

#[test]
fn plus_prefers_strings_after_to_primitive() {
    assert_eq!(eval_str("1 + '2';"), "12");
    assert_eq!(eval_num("'3' * '4';"), 12.0);
    assert_eq!(eval_num("true + true;"), 2.0);
    assert_eq!(eval_num("null + 1;"), 1.0);
    assert_eq!(eval_str("[1, 2] + '';"), "[object Array]");
}

#[test]
fn objects_convert_through_value_of_and_to_string() {
    assert_eq!(
        eval_num("var o = { valueOf: function () { return 6; } }; o * 7;"),
        42.0
    );
    assert_eq!(
        eval_str("var o = { toString: function () { return 'as-string'; } }; '' + o;"),
        "as-string"
    );
    assert_eq!(eval_str("try { var o = Object.create(null); } catch (e) { 'thrown'; } typeof o;"), "object");
}

#[test]
fn conversion_failures_throw_type_errors() {
    assert_eq!(eval_str("try { null.x; } catch (e) { e.name; }"), "TypeError");
    assert_eq!(eval_str("try { undefined.x; } catch (e) { e.name; }"), "TypeError");
}

#[test]
fn logical_operators_return_operands() {
    assert_eq!(eval_num("0 || 5;"), 5.0);
    assert_eq!(eval_num("3 || 5;"), 3.0);
    assert_eq!(eval_num("0 && 5;"), 0.0);
    assert_eq!(eval_num("1 && 5;"), 5.0);
    assert_eq!(eval_str("null || 'fallback';"), "fallback");
}

#[test]
fn short_circuit_skips_evaluation() {
    assert_eq!(eval_num("var n = 0; false && (n = 1); n;"), 0.0);
    assert_eq!(eval_num("var n = 0; true || (n = 1); n;"), 0.0);
}

#[test]
fn update_operators_coerce_via_to_number() {
    assert_eq!(eval_num("var x = '5'; x++;"), 5.0);
    assert_eq!(eval_num("var x = '5'; x++; x;"), 6.0);
    assert_eq!(eval_num("var x = 5; ++x;"), 6.0);
    assert_eq!(eval_num("var x = 5; x--; x;"), 4.0);
}

#[test]
fn compound_assignment_matches_its_operator() {
    assert_eq!(eval_num("var x = 10; x += 5; x -= 3; x *= 2; x /= 4; x;"), 6.0);
    assert_eq!(eval_num("var x = 0xf0; x &= 0x3c; x |= 1; x;"), 0x31 as f64);
    assert_eq!(eval_str("var s = 'a'; s += 1; s += 'b'; s;"), "a1b");
}
