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
fn property_lookup_walks_the_prototype_chain() {
    assert_eq!(
        eval_num(
            "function Base() {}
             Base.prototype.shared = 40;
             var o = new Base();
             o.own = 2;
             o.shared + o.own;"
        ),
        42.0
    );
}

#[test]
fn own_properties_shadow_inherited_ones() {
    assert_eq!(
        eval_num(
            "function Base() {}
             Base.prototype.v = 1;
             var o = new Base();
             o.v = 2;
             var p = new Base();
             o.v + p.v;"
        ),
        3.0
    );
}

#[test]
fn missing_properties_read_as_undefined() {
    assert_eq!(eval_str("var o = {}; typeof o.missing;"), "undefined");
}

#[test]
fn duplicate_literal_keys_collapse_to_the_last_writer() {
    assert_eq!(eval_num("({ a: 1, a: 2 }).a;"), 2.0);
}

#[test]
fn getters_and_setters_in_object_literals() {
    assert_eq!(
        eval_num(
            "var o = {
                 _x: 1,
                 get x() { return this._x; },
                 set x(v) { this._x = v * 2; }
             };
             o.x = 5;
             o.x;"
        ),
        10.0
    );
}

#[test]
fn getter_only_accessor_ignores_writes() {
    assert_eq!(eval_num("var o = { get x() { return 3; } }; o.x = 9; o.x;"), 3.0);
}

#[test]
fn inherited_setter_runs_on_the_receiver() {
    assert_eq!(
        eval_num(
            "function T() {}
             T.prototype = { set x(v) { this.stored = v; } };
             var o = new T();
             o.x = 5;
             o.stored;"
        ),
        5.0
    );
}

#[test]
fn has_own_property_matches_descriptor_presence() {
    assert_eq!(
        eval_bool(
            "var o = { here: 1 };
             var ownAgrees = o.hasOwnProperty('here') === (Object.getOwnPropertyDescriptor(o, 'here') !== undefined);
             var missingAgrees = o.hasOwnProperty('gone') === (Object.getOwnPropertyDescriptor(o, 'gone') !== undefined);
             ownAgrees && missingAgrees;"
        ),
        true
    );
    assert_eq!(eval_bool("({ x: 1 }).hasOwnProperty('x');"), true);
    assert_eq!(
        eval_bool("function B() {} B.prototype.p = 1; new B().hasOwnProperty('p');"),
        false
    );
}

#[test]
fn object_keys_reports_insertion_order() {
    assert_eq!(
        eval_str("var o = { b: 1 }; o.a = 2; o.c = 3; var k = Object.keys(o); k[0] + k[1] + k[2];"),
        "bac"
    );
    assert_eq!(eval_num("Object.keys({ a: 1, b: 2 }).length;"), 2.0);
}

#[test]
fn object_create_inherits_from_the_argument() {
    assert_eq!(eval_num("var base = { v: 9 }; var o = Object.create(base); o.v;"), 9.0);
    assert_eq!(
        eval_bool("var base = {}; Object.getPrototypeOf(Object.create(base)) === base;"),
        true
    );
}

#[test]
fn object_create_applies_property_descriptors() {
    assert_eq!(
        eval_num("var o = Object.create({}, { x: { value: 4 }, y: { get: function () { return 5; } } }); o.x + o.y;"),
        9.0
    );
}

#[test]
fn define_property_defaults_to_non_writable() {
    assert_eq!(
        eval_num("var o = {}; Object.defineProperty(o, 'x', { value: 1 }); o.x = 2; o.x;"),
        1.0
    );
    assert_eq!(
        eval_num("var o = {}; Object.defineProperty(o, 'x', { value: 1, writable: true }); o.x = 2; o.x;"),
        2.0
    );
}

#[test]
fn define_property_accessors_are_live() {
    assert_eq!(
        eval_num(
            "var o = { backing: 1 };
             Object.defineProperty(o, 'x', {
                 get: function () { return this.backing; },
                 set: function (v) { this.backing = v; }
             });
             o.x = 21;
             o.x * 2;"
        ),
        42.0
    );
}

#[test]
fn descriptor_shape_reflects_the_property() {
    assert_eq!(
        eval_str("var d = Object.getOwnPropertyDescriptor({ n: 3 }, 'n'); '' + d.value + d.writable + d.enumerable + d.configurable;"),
        "3truetruetrue"
    );
    assert_eq!(
        eval_str("var o = { get g() { return 1; } }; typeof Object.getOwnPropertyDescriptor(o, 'g').get;"),
        "function"
    );
}

#[test]
fn get_prototype_of_reaches_object_prototype() {
    assert_eq!(eval_bool("Object.getPrototypeOf({}) === Object.prototype;"), true);
    assert_eq!(eval_bool("Object.getPrototypeOf([]) === Array.prototype;"), true);
}

#[test]
fn delete_removes_configurable_own_properties() {
    assert_eq!(eval_bool("var o = { x: 1 }; delete o.x;"), true);
    assert_eq!(eval_str("var o = { x: 1 }; delete o.x; typeof o.x;"), "undefined");
    // deleting a missing property succeeds
    assert_eq!(eval_bool("delete ({}).nothing;"), true);
}

#[test]
fn delete_respects_non_configurable_properties() {
    assert_eq!(eval_bool("var a = [1]; delete a.length;"), false);
}

#[test]
fn in_operator_sees_inherited_properties() {
    assert_eq!(eval_bool("function B() {} B.prototype.p = 1; 'p' in new B();"), true);
    assert_eq!(eval_bool("'q' in { p: 1 };"), false);
    assert_eq!(eval_str("try { 'x' in 5; } catch (e) { e.name; }"), "TypeError");
}

#[test]
fn instanceof_walks_the_prototype_chain() {
    assert_eq!(eval_bool("({}) instanceof Object;"), true);
    assert_eq!(eval_bool("[] instanceof Array && [] instanceof Object;"), true);
    assert_eq!(
        eval_bool("function A() {} function B() {} B.prototype = new A(); new B() instanceof A;"),
        true
    );
    assert_eq!(eval_bool("({}) instanceof Array;"), false);
}

#[test]
fn object_prototype_to_string_reports_the_class() {
    assert_eq!(eval_str("Object.prototype.toString.call([]);"), "[object Array]");
    assert_eq!(eval_str("Object.prototype.toString.call({});"), "[object Object]");
    assert_eq!(eval_str("Object.prototype.toString.call('s');"), "[object String]");
    assert_eq!(eval_str("Object.prototype.toString.call(5);"), "[object Number]");
    assert_eq!(eval_str("({}).toString();"), "[object Object]");
}

#[test]
fn assignment_to_string_wrapper_length_is_ignored() {
    assert_eq!(eval_num("var s = 'abc'; s.length = 10; s.length;"), 3.0);
}

#[test]
fn string_exotic_indexing_reads_characters() {
    assert_eq!(eval_str("'abc'[1];"), "b");
    assert_eq!(eval_str("typeof 'abc'[9];"), "undefined");
}
