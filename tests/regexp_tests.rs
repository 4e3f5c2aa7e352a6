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
fn literal_carries_source_and_flags() {
    assert_eq!(eval_str("/ab+c/gi.source;"), "ab+c");
    assert_eq!(eval_bool("/x/g.global;"), true);
    assert_eq!(eval_bool("/x/.global;"), false);
    assert_eq!(eval_bool("/x/i.ignoreCase;"), true);
    assert_eq!(eval_bool("/x/m.multiline;"), true);
    assert_eq!(eval_num("/x/.lastIndex;"), 0.0);
}

#[test]
fn exec_returns_a_match_array() {
    assert_eq!(eval_str("/b(c)/.exec('abcd')[0];"), "bc");
    assert_eq!(eval_str("/b(c)/.exec('abcd')[1];"), "c");
    assert_eq!(eval_num("/b(c)/.exec('abcd').index;"), 1.0);
    assert_eq!(eval_str("/b/.exec('abc').input;"), "abc");
    assert_eq!(eval_num("/a(b)(c)/.exec('abc').length;"), 3.0);
}

#[test]
fn exec_without_a_match_returns_null() {
    assert_eq!(eval_bool("/z/.exec('abc') === null;"), true);
}

#[test]
fn exec_starts_at_last_index() {
    assert_eq!(eval_num("var re = /a/; re.lastIndex = 2; re.exec('aaa').index;"), 2.0);
    assert_eq!(eval_bool("var re = /a/; re.lastIndex = 5; re.exec('aaa') === null;"), true);
}

#[test]
fn constructor_compiles_patterns() {
    assert_eq!(eval_str("new RegExp('a+').source;"), "a+");
    assert_eq!(eval_bool("new RegExp('a', 'g').global;"), true);
    assert_eq!(eval_str("new RegExp('\\\\d+').exec('x123')[0];"), "123");
}

#[test]
fn constructor_passes_an_existing_regexp_through() {
    assert_eq!(eval_bool("var re = /a/; RegExp(re) === re;"), true);
}

#[test]
fn case_insensitive_matching() {
    assert_eq!(eval_str("/hello/i.exec('saying HELLO there')[0];"), "HELLO");
}

#[test]
fn invalid_flags_are_syntax_errors() {
    assert_eq!(eval_str("try { new RegExp('a', 'q'); } catch (e) { e.name; }"), "SyntaxError");
    assert_eq!(eval_str("try { new RegExp('a', 'gg'); } catch (e) { e.name; }"), "SyntaxError");
}

#[test]
fn invalid_patterns_are_type_errors() {
    assert_eq!(eval_str("try { new RegExp('('); } catch (e) { e.name; }"), "TypeError");
}

#[test]
fn character_classes_and_quantifiers() {
    assert_eq!(eval_str("/[a-c]+/.exec('zzabcz')[0];"), "abc");
    assert_eq!(eval_num("/\\s/.exec('ab cd').index;"), 2.0);
}
