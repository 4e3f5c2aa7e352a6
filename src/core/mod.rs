use std::rc::{Rc, Weak};

use crate::JSError;
use crate::js_error::{throw_syntax_error, throw_type_error};

pub(crate) mod ast;
mod convert;
mod env;
mod eval;
mod heap;
mod object;
mod parser;
mod string;
mod token;
mod value;

pub use convert::*;
pub use env::*;
pub use eval::*;
pub use heap::{MemInfo, gc, init, live_objects, meminfo};
pub use object::*;
pub use parser::{ParsedProgram, parse_program};
pub use string::{JSString, intern_live_count};
pub use token::{Punct, Token, TokenKind, tokenize};
pub use value::*;

/// A parsed program together with the string table its AST nodes index.
pub struct Script {
    pub name: JSString,
    pub program: ast::Program,
    pub strings: Vec<JSString>,
}

pub fn parse_script(source: &str, name: &str) -> Result<Rc<Script>, JSError> {
    let parsed = parse_program(source, name)?;
    let strings = parsed.strings.iter().map(|s| JSString::intern(s)).collect();
    Ok(Rc::new(Script {
        name: JSString::intern(name),
        program: parsed.program,
        strings,
    }))
}

/// An isolated global object plus its intrinsic prototypes. Cloning is
/// cheap; all clones share one realm.
#[derive(Clone)]
pub struct Context {
    inner: Rc<ContextInner>,
}

pub struct ContextInner {
    global: JSObjectPtr,
    object_proto: JSObjectPtr,
    function_proto: JSObjectPtr,
    array_proto: JSObjectPtr,
    string_proto: JSObjectPtr,
    boolean_proto: JSObjectPtr,
    number_proto: JSObjectPtr,
    date_proto: JSObjectPtr,
    regexp_proto: JSObjectPtr,
    error_proto: JSObjectPtr,
    /// Realms created by `evalcx`; they live as long as their creator so
    /// that sandbox globals handed back to scripts stay usable.
    children: std::cell::RefCell<Vec<Rc<ContextInner>>>,
}

impl Drop for ContextInner {
    fn drop(&mut self) {
        // The realm is full of intentional cycles (constructor ↔ prototype,
        // global ↔ builtins). Clearing the roots lets refcounts collapse.
        for obj in [
            &self.global,
            &self.object_proto,
            &self.function_proto,
            &self.array_proto,
            &self.string_proto,
            &self.boolean_proto,
            &self.number_proto,
            &self.date_proto,
            &self.regexp_proto,
            &self.error_proto,
        ] {
            obj.borrow_mut().props.clear();
        }
    }
}

impl Context {
    /// Creates a fresh realm with the standard built-ins installed.
    /// `extensions` additionally installs the shell globals (`print`,
    /// `load`, `read`, `quit`, `evalcx`).
    pub fn new(extensions: bool) -> Context {
        heap::init();

        let object_proto = new_object(None);
        let function_proto = new_object(Some(object_proto.clone()));

        let string_proto = new_object(Some(object_proto.clone()));
        string_proto.borrow_mut().data = ObjectData::StringWrap(JSString::empty());
        define_data_property(&string_proto, &JSString::intern("length"), Value::Integer(0), false, false, false);

        let array_proto = new_object(Some(object_proto.clone()));
        array_proto.borrow_mut().data = ObjectData::Array { length: 0 };
        define_data_property(&array_proto, &JSString::intern("length"), Value::Integer(0), true, false, false);

        let boolean_proto = new_object(Some(object_proto.clone()));
        let number_proto = new_object(Some(object_proto.clone()));
        let date_proto = new_object(Some(object_proto.clone()));
        let regexp_proto = new_object(Some(object_proto.clone()));
        let error_proto = new_object(Some(object_proto.clone()));

        let global = new_object(Some(object_proto.clone()));
        let inner = Rc::new_cyclic(|weak: &Weak<ContextInner>| {
            global.borrow_mut().data = ObjectData::Context(weak.clone());
            ContextInner {
                global: global.clone(),
                object_proto,
                function_proto,
                array_proto,
                string_proto,
                boolean_proto,
                number_proto,
                date_proto,
                regexp_proto,
                error_proto,
                children: std::cell::RefCell::new(Vec::new()),
            }
        });
        let ctx = Context { inner };

        crate::js_object::init(&ctx);
        crate::js_function::init(&ctx);
        crate::js_boolean::init(&ctx);
        crate::js_number::init(&ctx);
        crate::js_string::init(&ctx);
        crate::js_array::init(&ctx);
        crate::js_math::init(&ctx);
        crate::js_date::init(&ctx);
        crate::js_regexp::init(&ctx);
        crate::js_error::init(&ctx);
        install_global_values(&ctx);
        if extensions {
            crate::js_std::init(&ctx);
        }
        log::debug!("context created (extensions: {extensions})");
        ctx
    }

    pub(crate) fn from_inner(inner: Rc<ContextInner>) -> Context {
        Context { inner }
    }

    /// Keeps `child` alive for this context's lifetime.
    pub(crate) fn adopt(&self, child: &Context) {
        self.inner.children.borrow_mut().push(child.inner.clone());
    }

    pub fn global(&self) -> JSObjectPtr {
        self.inner.global.clone()
    }

    pub fn object_proto(&self) -> JSObjectPtr {
        self.inner.object_proto.clone()
    }

    pub fn function_proto(&self) -> JSObjectPtr {
        self.inner.function_proto.clone()
    }

    pub fn array_proto(&self) -> JSObjectPtr {
        self.inner.array_proto.clone()
    }

    pub fn string_proto(&self) -> JSObjectPtr {
        self.inner.string_proto.clone()
    }

    pub fn boolean_proto(&self) -> JSObjectPtr {
        self.inner.boolean_proto.clone()
    }

    pub fn number_proto(&self) -> JSObjectPtr {
        self.inner.number_proto.clone()
    }

    pub fn date_proto(&self) -> JSObjectPtr {
        self.inner.date_proto.clone()
    }

    pub fn regexp_proto(&self) -> JSObjectPtr {
        self.inner.regexp_proto.clone()
    }

    pub fn error_proto(&self) -> JSObjectPtr {
        self.inner.error_proto.clone()
    }

    /// Parses and evaluates `source`; the result is the value of the last
    /// expression statement.
    pub fn eval(&self, source: &str, name: &str) -> Result<Value, JSError> {
        let script = parse_script(source, name)?;
        eval_script(self, &script)
    }

    /// The embedder-boundary form: ToString of the result, or `None` for
    /// an undefined result or any failure.
    pub fn eval_to_string(&self, source: &str, name: &str) -> Option<String> {
        match self.eval(source, name) {
            Ok(Value::Undefined) => None,
            Ok(v) => to_string(self, &v).ok().map(|s| s.to_rust_string()),
            Err(e) => {
                log::debug!("eval failed: {e}");
                None
            }
        }
    }
}

/// One-shot convenience: evaluates `source` in a fresh extended context.
pub fn evaluate_script<S: AsRef<str>>(source: S, path: Option<&std::path::Path>) -> Result<Value, JSError> {
    let ctx = Context::new(true);
    let name = match path {
        Some(p) => p.display().to_string(),
        None => "[eval]".to_string(),
    };
    ctx.eval(source.as_ref(), &name)
}

/// Installs a native function as a non-enumerable property of `target`.
pub(crate) fn install_native(ctx: &Context, target: &JSObjectPtr, name: &str, native: NativeFn) -> JSObjectPtr {
    let func = new_native_function(ctx, name, native);
    define_data_property(target, &JSString::intern(name), Value::Object(func.clone()), true, false, true);
    func
}

/// Wires up a constructor and its prototype: `ctor.prototype` is locked
/// down, `proto.constructor` points back, and the constructor becomes a
/// global.
pub(crate) fn install_constructor(ctx: &Context, name: &str, native: NativeFn, proto: &JSObjectPtr) -> JSObjectPtr {
    let ctor = new_native_function(ctx, name, native);
    define_data_property(&ctor, &JSString::intern("prototype"), Value::Object(proto.clone()), false, false, false);
    define_data_property(proto, &JSString::intern("constructor"), Value::Object(ctor.clone()), true, false, true);
    define_data_property(&ctx.global(), &JSString::intern(name), Value::Object(ctor.clone()), true, false, true);
    ctor
}

fn install_global_values(ctx: &Context) {
    let global = ctx.global();
    define_data_property(&global, &JSString::intern("undefined"), Value::Undefined, false, false, false);
    define_data_property(&global, &JSString::intern("NaN"), Value::Number(f64::NAN), false, false, false);
    define_data_property(
        &global,
        &JSString::intern("Infinity"),
        Value::Number(f64::INFINITY),
        false,
        false,
        false,
    );
    install_native(ctx, &global, "eval", global_eval);
    install_native(ctx, &global, "parseFloat", global_parse_float);
}

// 15.1.2.1 eval: non-string arguments pass through untouched; nested parse
// failures surface as a thrown SyntaxError.
fn global_eval(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    if this.is_none() {
        return Err(throw_type_error(ctx, "eval is not a constructor"));
    }
    let Some(v) = args.first() else {
        return Ok(Value::Undefined);
    };
    let Value::String(s) = v else {
        return Ok(v.clone());
    };
    let source = format!("{};", s.to_rust_string());
    match ctx.eval(&source, "[eval]") {
        Err(JSError::Parse { message, .. }) => Err(throw_syntax_error(ctx, &message)),
        other => other,
    }
}

// 15.1.2.3 parseFloat: parses the longest numeric prefix.
fn global_parse_float(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    if this.is_none() {
        return Err(throw_type_error(ctx, "parseFloat is not a constructor"));
    }
    let Some(arg) = args.first() else {
        return Ok(Value::Integer(0));
    };
    let s = to_string(ctx, arg)?.to_rust_string();
    Ok(Value::int_or_number(parse_float_prefix(&s)))
}

fn parse_float_prefix(s: &str) -> f64 {
    let trimmed = s.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1.0, &trimmed[1..]),
        Some(b'+') => (1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };
    if rest.starts_with("Infinity") {
        return sign * f64::INFINITY;
    }
    let bytes = rest.as_bytes();
    let mut end = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end == 0 || (end == 1 && bytes[0] == b'.') {
        return f64::NAN;
    }
    // exponent only counts when digits follow it
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }
    rest[..end].parse::<f64>().map(|d| sign * d).unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_float_prefixes() {
        assert_eq!(parse_float_prefix("3.5abc"), 3.5);
        assert_eq!(parse_float_prefix("  -2e3xyz"), -2000.0);
        assert_eq!(parse_float_prefix("1e"), 1.0);
        assert_eq!(parse_float_prefix("Infinity and beyond"), f64::INFINITY);
        assert!(parse_float_prefix("px12").is_nan());
        assert!(parse_float_prefix(".").is_nan());
    }

    #[test]
    fn eval_to_string_boundary() {
        let ctx = Context::new(false);
        assert_eq!(ctx.eval_to_string("1 + 2;", "t"), Some("3".to_string()));
        assert_eq!(ctx.eval_to_string("undefined;", "t"), None);
        assert_eq!(ctx.eval_to_string("syntax error(", "t"), None);
    }

    #[test]
    fn contexts_are_isolated() {
        let a = Context::new(false);
        let b = Context::new(false);
        a.eval("var shared = 1;", "t").unwrap();
        assert!(matches!(b.eval("typeof shared;", "t"), Ok(Value::String(s)) if s.to_rust_string() == "undefined"));
    }
}
