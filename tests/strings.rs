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
fn substring_clamps_and_swaps() {
    assert_eq!(eval_str("'abc'.substring(1, 10);"), "bc");
    assert_eq!(eval_str("'abcdef'.substring(4, 1);"), "bcd");
    assert_eq!(eval_str("'abc'.substring(1);"), "bc");
    assert_eq!(eval_str("'abc'.substring(-5, 2);"), "ab");
}

#[test]
fn char_code_at_returns_the_code_unit() {
    assert_eq!(eval_num("'abc'.charCodeAt(1);"), 98.0);
    assert_eq!(eval_num("'abc'.charCodeAt();"), 97.0);
    assert_eq!(eval_bool("isNaNHelper('abc'.charCodeAt(9)); function isNaNHelper(x) { return x !== x; }"), true);
}

#[test]
fn from_char_code_builds_from_all_arguments() {
    assert_eq!(eval_str("String.fromCharCode(104, 105);"), "hi");
    assert_eq!(eval_str("String.fromCharCode();"), "");
}

#[test]
fn index_of_scans_forward() {
    assert_eq!(eval_num("'hello'.indexOf('l');"), 2.0);
    assert_eq!(eval_num("'hello'.indexOf('l', 3);"), 3.0);
    assert_eq!(eval_num("'hello'.indexOf('o');"), 4.0);
    assert_eq!(eval_num("'hello'.indexOf('x');"), -1.0);
    assert_eq!(eval_num("'hello'.indexOf('');"), 0.0);
}

#[test]
fn last_index_of_scans_backward() {
    assert_eq!(eval_num("'abcabc'.lastIndexOf('b');"), 4.0);
    assert_eq!(eval_num("'abcabc'.lastIndexOf('b', 3);"), 1.0);
    assert_eq!(eval_num("'abcabc'.lastIndexOf('x');"), -1.0);
}

#[test]
fn ascii_case_mapping_covers_the_full_range() {
    assert_eq!(eval_str("'az AZ z'.toUpperCase();"), "AZ AZ Z");
    assert_eq!(eval_str("'AZ az Z'.toLowerCase();"), "az az z");
    // non-ASCII passes through untouched
    assert_eq!(eval_str("'étude'.toUpperCase();"), "éTUDE");
}

#[test]
fn concatenation_via_plus() {
    assert_eq!(eval_str("'foo' + 'bar';"), "foobar");
    assert_eq!(eval_str("'n=' + 5;"), "n=5");
    assert_eq!(eval_str("1 + 2 + 'x';"), "3x");
    assert_eq!(eval_str("'x' + 1 + 2;"), "x12");
}

#[test]
fn string_wrapper_round_trips() {
    assert_eq!(eval_str("new String('wrapped').toString();"), "wrapped");
    assert_eq!(eval_str("new String('wrapped').valueOf();"), "wrapped");
    assert_eq!(eval_num("new String('abc').length;"), 3.0);
    assert_eq!(eval_str("typeof new String('x');"), "object");
}

#[test]
fn search_finds_pattern_offsets() {
    assert_eq!(eval_num("'hello world'.search(/world/);"), 6.0);
    assert_eq!(eval_num("'hello'.search(/x/);"), -1.0);
    assert_eq!(eval_num("'a1b2'.search(/[0-9]/);"), 1.0);
}

#[test]
fn to_string_methods_reject_foreign_receivers() {
    assert_eq!(eval_str("try { String.prototype.toString.call(5); } catch (e) { e.name; }"), "TypeError");
}

#[test]
fn string_comparison_is_by_content() {
    assert_eq!(eval_bool("'abc' === 'abc';"), true);
    assert_eq!(eval_bool("'abc' === 'abd';"), false);
    assert_eq!(eval_bool("'' === '';"), true);
}
