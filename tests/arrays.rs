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
fn appending_grows_length() {
    assert_eq!(
        eval_num("var a = [1, 2, 3]; a.push ? a.push(4) : a[a.length] = 4; a.length;"),
        4.0
    );
    assert_eq!(eval_num("var a = []; a[0] = 'x'; a[1] = 'y'; a.length;"), 2.0);
}

#[test]
fn literal_length_counts_elements() {
    assert_eq!(eval_num("[10, 20, 30].length;"), 3.0);
    assert_eq!(eval_num("[].length;"), 0.0);
}

#[test]
fn constructor_length_form_creates_no_elements() {
    assert_eq!(eval_num("new Array(5).length;"), 5.0);
    assert_eq!(eval_str("typeof new Array(5)[0];"), "undefined");
    assert_eq!(eval_bool("new Array(5).hasOwnProperty('0');"), false);
    assert_eq!(eval_num("new Array('a', 'b').length;"), 2.0);
}

#[test]
fn sparse_index_write_promotes_length() {
    assert_eq!(eval_num("var a = []; a[9] = 1; a.length;"), 10.0);
    // non-canonical numeric strings are plain properties
    assert_eq!(eval_num("var a = []; a['01'] = 1; a.length;"), 0.0);
}

#[test]
fn shrinking_length_truncates_elements() {
    assert_eq!(eval_str("var a = [1, 2, 3, 4]; a.length = 2; typeof a[2];"), "undefined");
    assert_eq!(eval_num("var a = [1, 2, 3, 4]; a.length = 2; a.length;"), 2.0);
    assert_eq!(eval_bool("var a = [1, 2, 3]; a.length = 1; a.hasOwnProperty('2');"), false);
}

#[test]
fn invalid_length_write_is_a_type_error() {
    assert_eq!(eval_str("try { var a = []; a.length = 1.5; } catch (e) { e.name; }"), "TypeError");
    assert_eq!(eval_str("try { var a = []; a.length = -1; } catch (e) { e.name; }"), "TypeError");
}

#[test]
fn is_array_distinguishes_arrays() {
    assert_eq!(eval_bool("Array.isArray([]);"), true);
    assert_eq!(eval_bool("Array.isArray({ length: 0 });"), false);
    assert_eq!(eval_bool("Array.isArray('abc');"), false);
}

#[test]
fn push_returns_the_new_length() {
    assert_eq!(eval_num("var a = [1]; a.push(2, 3);"), 3.0);
    assert_eq!(eval_num("var a = []; a.push('x'); a[0] === 'x' ? a.length : -1;"), 1.0);
}

#[test]
fn pop_removes_and_returns_the_last_element() {
    assert_eq!(eval_num("var a = [1, 2, 3]; var v = a.pop(); v * 10 + a.length;"), 32.0);
    assert_eq!(eval_str("typeof [].pop();"), "undefined");
    assert_eq!(eval_bool("var a = [1, 2]; a.pop(); a.hasOwnProperty('1');"), false);
}

#[test]
fn concat_flattens_array_arguments_one_level() {
    assert_eq!(
        eval_str("var a = [1].concat([2, 3], 4); a.length + ':' + a[0] + a[1] + a[2] + a[3];"),
        "4:1234"
    );
}

#[test]
fn for_each_visits_elements_with_index_and_array() {
    assert_eq!(
        eval_str("var s = ''; ['a', 'b'].forEach(function (v, i, arr) { s += v + i + arr.length; }); s;"),
        "a02b12"
    );
}

#[test]
fn for_each_skips_holes() {
    assert_eq!(eval_num("var n = 0; var a = [1, 2]; a[5] = 3; a.forEach(function () { n++; }); n;"), 3.0);
}

#[test]
fn for_each_requires_a_callable() {
    assert_eq!(eval_str("try { [1].forEach(5); } catch (e) { e.name; }"), "TypeError");
}

#[test]
fn splice_removes_and_returns_the_cut() {
    assert_eq!(
        eval_str("var a = [1, 2, 3, 4, 5]; var r = a.splice(1, 2); r.length + ':' + r[0] + r[1] + ':' + a.length;"),
        "2:23:3"
    );
    assert_eq!(eval_num("var a = [1, 2, 3, 4, 5]; a.splice(1, 2); a[1];"), 4.0);
}

#[test]
fn splice_inserts_in_place() {
    assert_eq!(
        eval_str("var a = [1, 4]; a.splice(1, 0, 2, 3); '' + a[0] + a[1] + a[2] + a[3] + ':' + a.length;"),
        "1234:4"
    );
}

#[test]
fn splice_replaces_with_fewer_items() {
    assert_eq!(
        eval_str("var a = [1, 2, 3, 4]; a.splice(1, 2, 'x'); '' + a[0] + a[1] + a[2] + ':' + a.length;"),
        "1x4:3"
    );
}

#[test]
fn splice_negative_start_counts_from_the_end() {
    assert_eq!(eval_num("var a = [1, 2, 3, 4]; a.splice(-2, 1); a.length;"), 3.0);
    assert_eq!(eval_num("var a = [1, 2, 3, 4]; a.splice(-2, 1); a[2];"), 4.0);
}

#[test]
fn splice_on_empty_targets_is_a_no_op() {
    assert_eq!(eval_num("var a = []; a.splice(0, 0); a.length;"), 0.0);
    assert_eq!(eval_num("var a = []; a.splice(0, 1); a.length;"), 0.0);
    assert_eq!(eval_str("var a = []; a.splice(0, 0, 'x'); a[0] + ':' + a.length;"), "x:1");
}

#[test]
fn length_is_not_enumerable() {
    assert_eq!(eval_str("var r = ''; for (var k in [7, 8]) r += k; r;"), "01");
}

#[test]
fn elisions_leave_holes_but_count_toward_length() {
    assert_eq!(eval_num("[1, , 3].length;"), 3.0);
    assert_eq!(eval_bool("[1, , 3].hasOwnProperty('1');"), false);
}
