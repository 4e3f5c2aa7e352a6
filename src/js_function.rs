use crate::JSError;
use crate::core::{
    Context, FunctionKind, JSString, Value, function_data, install_constructor, install_native, is_callable, new_object, obj_call,
    obj_get, to_uint32,
};
use crate::js_error::throw_type_error;

// Argument vectors longer than this are treated as hostile.
const APPLY_ARG_LIMIT: u32 = 1000;

/// 15.3: the Function constructor stub and Function.prototype.
pub fn init(ctx: &Context) {
    let proto = ctx.function_proto();
    install_native(ctx, &proto, "toString", function_prototype_to_string);
    install_native(ctx, &proto, "apply", function_prototype_apply);
    install_native(ctx, &proto, "call", function_prototype_call);
    install_constructor(ctx, "Function", function_construct, &proto);
}

// Compiling function bodies from strings is not supported; the constructor
// yields an inert object rooted at Function.prototype.
fn function_construct(ctx: &Context, this: Option<&Value>, _args: &[Value]) -> Result<Value, JSError> {
    match this {
        Some(Value::Object(o)) => Ok(Value::Object(o.clone())),
        _ => Ok(Value::Object(new_object(Some(ctx.function_proto())))),
    }
}

// 15.3.4.2 Function.prototype.toString ( )
fn function_prototype_to_string(ctx: &Context, this: Option<&Value>, _args: &[Value]) -> Result<Value, JSError> {
    let Some(Value::Object(this_obj)) = this else {
        return Err(throw_type_error(ctx, "Function.prototype.toString called on a non-function"));
    };
    let Some(fd) = function_data(this_obj) else {
        return Err(throw_type_error(ctx, "Function.prototype.toString called on a non-function"));
    };
    let name = fd.name.as_ref().map(|n| n.to_rust_string()).unwrap_or_default();
    let body = match fd.kind {
        FunctionKind::Native(_) => "[native code]",
        FunctionKind::Script(_) => "...",
    };
    Ok(Value::String(JSString::intern(&format!("function {name}() {{ {body} }}"))))
}

fn callable_this(ctx: &Context, this: Option<&Value>) -> Result<crate::core::JSObjectPtr, JSError> {
    match this {
        Some(v @ Value::Object(o)) if is_callable(v) => Ok(o.clone()),
        _ => Err(throw_type_error(ctx, "receiver is not callable")),
    }
}

// 15.3.4.3 Function.prototype.apply (thisArg, argArray)
fn function_prototype_apply(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    let func = callable_this(ctx, this)?;
    let this_arg = args.first().cloned().unwrap_or(Value::Undefined);
    let arg_array = args.get(1).cloned().unwrap_or(Value::Undefined);

    if arg_array.is_nullish() {
        return obj_call(ctx, &func, this_arg, &[]);
    }
    let Value::Object(array_obj) = &arg_array else {
        return Err(throw_type_error(ctx, "argument list must be an object"));
    };
    let len_val = obj_get(ctx, array_obj, &JSString::intern("length"))?;
    let len = to_uint32(ctx, &len_val)?;
    if len > APPLY_ARG_LIMIT {
        return Err(throw_type_error(ctx, "argument list too long"));
    }
    let mut call_args = Vec::with_capacity(len as usize);
    for i in 0..len {
        call_args.push(obj_get(ctx, array_obj, &crate::core::index_string(i))?);
    }
    obj_call(ctx, &func, this_arg, &call_args)
}

// 15.3.4.4 Function.prototype.call (thisArg, ...)
fn function_prototype_call(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    let func = callable_this(ctx, this)?;
    let this_arg = args.first().cloned().unwrap_or(Value::Undefined);
    let rest = if args.is_empty() { &[] } else { &args[1..] };
    obj_call(ctx, &func, this_arg, rest)
}
