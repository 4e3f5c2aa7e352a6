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
fn eval_returns_the_last_expression_value() {
    assert_eq!(eval_num("eval('1 + 2');"), 3.0);
    assert_eq!(eval_str("eval('\\'a\\' + \\'b\\'');"), "ab");
    // non-string arguments pass through untouched
    assert_eq!(eval_num("eval(7);"), 7.0);
}

#[test]
fn eval_shares_the_global_environment() {
    assert_eq!(eval_num("var x = 1; eval('x = 41'); x + eval('x') - 40;"), 42.0);
    assert_eq!(eval_num("eval('var introduced = 9'); introduced;"), 9.0);
}

#[test]
fn eval_surfaces_parse_failures_as_syntax_errors() {
    assert_eq!(eval_str("try { eval('var ('); } catch (e) { e.name; }"), "SyntaxError");
}

#[test]
fn parse_float_takes_the_numeric_prefix() {
    assert_eq!(eval_num("parseFloat('3.25px');"), 3.25);
    assert_eq!(eval_num("parseFloat('  -2e2 trailing');"), -200.0);
    assert_eq!(eval_num("parseFloat('Infinity');"), f64::INFINITY);
    assert_eq!(eval_bool("var n = parseFloat('none'); n !== n;"), true);
}

#[test]
fn global_constants_exist() {
    assert_eq!(eval_str("typeof undefined;"), "undefined");
    assert_eq!(eval_bool("Infinity > 1e308;"), true);
    assert_eq!(eval_bool("NaN !== NaN;"), true);
}

#[test]
fn math_surface() {
    assert_eq!(eval_num("Math.floor(3.7);"), 3.0);
    assert_eq!(eval_num("Math.floor(-3.1);"), -4.0);
    assert_eq!(eval_num("Math.pow(2, 10);"), 1024.0);
    assert_eq!(eval_bool("Math.log(Math.pow(2.718281828459045, 2)) > 1.99;"), true);
    assert_eq!(
        eval_bool("var r = Math.random(); r >= 0 && r < 1;"),
        true
    );
    assert_eq!(eval_bool("Math.random() !== Math.random() || Math.random() !== Math.random();"), true);
}

#[test]
fn number_and_boolean_wrappers() {
    assert_eq!(eval_num("new Number(42).valueOf();"), 42.0);
    assert_eq!(eval_num("Number('42');"), 42.0);
    assert_eq!(eval_bool("new Boolean(1).valueOf();"), true);
    assert_eq!(eval_bool("Boolean('');"), false);
    assert_eq!(eval_bool("Boolean('x');"), true);
    assert_eq!(eval_str("typeof new Number(1);"), "object");
    // a wrapper is truthy even around false
    assert_eq!(eval_bool("!!new Boolean(false);"), true);
}

#[test]
fn wrappers_convert_back_through_value_of() {
    assert_eq!(eval_num("new Number(20) + new Number(22);"), 42.0);
    assert_eq!(eval_bool("new Number(5) == 5;"), true);
    assert_eq!(eval_bool("new Number(5) === 5;"), false);
}

#[test]
fn date_get_time_round_trips() {
    assert_eq!(eval_num("new Date(0).getTime();"), 0.0);
    assert_eq!(eval_num("new Date(86400000).getTime();"), 86400000.0);
    assert_eq!(eval_bool("new Date().getTime() > 1000000000000;"), true);
}

#[test]
fn date_to_string_renders_utc() {
    assert_eq!(eval_str("new Date(0).toString();"), "Thu Jan 01 1970 00:00:00 GMT+0000");
    assert_eq!(eval_str("'' + new Date(0);"), "Thu Jan 01 1970 00:00:00 GMT+0000");
}

#[test]
fn date_from_fields_is_utc_midnight() {
    assert_eq!(eval_num("new Date(1970, 0, 2).getTime();"), 86400000.0);
}

#[test]
fn date_called_as_a_function_returns_a_string() {
    assert_eq!(eval_str("typeof Date();"), "string");
}

#[test]
fn date_receiver_mismatch_is_a_type_error() {
    assert_eq!(eval_str("try { Date.prototype.getTime.call({}); } catch (e) { e.name; }"), "TypeError");
}

#[test]
fn error_constructor_sets_message() {
    assert_eq!(eval_str("new Error('oops').message;"), "oops");
    assert_eq!(eval_str("new Error().message;"), "");
    assert_eq!(eval_str("new Error('x').name;"), "Error");
    assert_eq!(eval_bool("new Error('x') instanceof Error;"), true);
}

#[test]
fn shell_extensions_are_installed() {
    assert_eq!(eval_str("typeof print + ',' + typeof load + ',' + typeof read + ',' + typeof quit + ',' + typeof evalcx;"),
        "function,function,function,function,function");
}

#[test]
fn evalcx_runs_in_an_isolated_global() {
    assert_eq!(eval_num("evalcx('1 + 1');"), 2.0);
    // a fresh sandbox does not see our globals
    assert_eq!(eval_str("var mine = 1; evalcx('typeof mine');"), "undefined");
    // an empty source returns the sandbox global for reuse
    assert_eq!(eval_num("var sandbox = evalcx(''); evalcx('var v = 5; v', sandbox) + evalcx('v', sandbox);"), 10.0);
}

#[test]
fn read_of_a_missing_file_throws() {
    assert_eq!(
        eval_str("try { read('/definitely/not/a/file'); } catch (e) { e.message; }"),
        "File error"
    );
}
