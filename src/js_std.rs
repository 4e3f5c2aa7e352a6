use crate::JSError;
use crate::core::{Context, ObjectData, Value, install_native, to_integer, to_object, to_string};
use crate::js_error::{throw_error, throw_type_error};

/// Non-standard shell globals: `print`, `load`, `read`, `quit`, `evalcx`.
/// Installed only when the context is created with extensions.
pub fn init(ctx: &Context) {
    let global = ctx.global();
    install_native(ctx, &global, "print", global_print);
    install_native(ctx, &global, "load", global_load);
    install_native(ctx, &global, "read", global_read);
    install_native(ctx, &global, "quit", global_quit);
    install_native(ctx, &global, "evalcx", global_evalcx);
}

fn require_call(ctx: &Context, this: Option<&Value>) -> Result<(), JSError> {
    if this.is_none() {
        return Err(throw_type_error(ctx, "not a constructor"));
    }
    Ok(())
}

// print(...) writes the arguments' ToString separated by spaces.
fn global_print(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    require_call(ctx, this)?;
    let mut line = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        line.push_str(&to_string(ctx, arg)?.to_rust_string());
    }
    println!("{line}");
    Ok(Value::Undefined)
}

// load(path, ...) evaluates each file in this context; the result is the
// last file's value.
fn global_load(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    require_call(ctx, this)?;
    let mut result = Value::Undefined;
    for arg in args {
        let path = to_string(ctx, arg)?.to_rust_string();
        let source = std::fs::read_to_string(&path).map_err(|_| throw_type_error(ctx, &format!("cannot load '{path}'")))?;
        result = ctx.eval(&source, &path)?;
    }
    Ok(result)
}

// read(path) returns the file's contents as a string.
fn global_read(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    require_call(ctx, this)?;
    let path = match args.first() {
        None => "undefined".to_string(),
        Some(v) => to_string(ctx, v)?.to_rust_string(),
    };
    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(Value::from(contents.as_str())),
        Err(_) => Err(throw_error(ctx, "File error")),
    }
}

// quit([code]) ends the process.
fn global_quit(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    require_call(ctx, this)?;
    let code = match args.first() {
        None => 0,
        Some(v) => to_integer(ctx, v)? as i32,
    };
    log::debug!("quit({code})");
    std::process::exit(code);
}

// evalcx(source [, sandbox]): evaluates in a separate context. With no
// sandbox a fresh bare context is created; an empty source returns its
// global object so later calls can target it.
fn global_evalcx(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    require_call(ctx, this)?;
    let source = match args.first() {
        None => String::new(),
        Some(v) => to_string(ctx, v)?.to_rust_string(),
    };

    let (eval_ctx, sandbox_global) = match args.get(1) {
        None | Some(Value::Undefined) | Some(Value::Null) => {
            let fresh = Context::new(false);
            ctx.adopt(&fresh);
            let global = fresh.global();
            (fresh, global)
        }
        Some(v) => {
            let obj = to_object(ctx, v)?;
            let inner = match &obj.borrow().data {
                ObjectData::Context(weak) => weak.upgrade(),
                _ => None,
            };
            match inner {
                Some(inner) => (Context::from_inner(inner), obj.clone()),
                None => return Err(throw_type_error(ctx, "sandbox is not a context global")),
            }
        }
    };

    if source.is_empty() {
        return Ok(Value::Object(sandbox_global));
    }
    let source = format!("{source};");
    eval_ctx.eval(&source, "[evalcx]")
}
