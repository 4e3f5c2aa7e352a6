use crate::JSError;
use crate::core::{
    Context, JSString, Value, define_data_property, install_constructor, install_native, new_object, obj_get, to_string,
};

/// 15.11: the Error constructor, its prototype, and the helpers the core
/// uses to raise TypeError / ReferenceError / SyntaxError.
pub fn init(ctx: &Context) {
    let proto = ctx.error_proto();
    define_data_property(&proto, &JSString::intern("name"), Value::from("Error"), true, false, true);
    define_data_property(&proto, &JSString::intern("message"), Value::from(""), true, false, true);
    install_native(ctx, &proto, "toString", error_prototype_to_string);
    install_constructor(ctx, "Error", error_construct, &proto);
}

/// Builds an Error-prototype-rooted object carrying `message` and, for the
/// specific error kinds, an own `name`.
pub fn new_error_object(ctx: &Context, name: Option<&str>, message: &str) -> Value {
    let obj = new_object(Some(ctx.error_proto()));
    define_data_property(&obj, &JSString::intern("message"), Value::from(message), true, false, true);
    if let Some(name) = name {
        define_data_property(&obj, &JSString::intern("name"), Value::from(name), true, false, true);
    }
    Value::Object(obj)
}

pub fn throw_error(ctx: &Context, message: &str) -> JSError {
    JSError::Thrown(new_error_object(ctx, None, message))
}

pub fn throw_type_error(ctx: &Context, message: &str) -> JSError {
    log::trace!("throwing TypeError: {message}");
    JSError::Thrown(new_error_object(ctx, Some("TypeError"), message))
}

pub fn throw_reference_error(ctx: &Context, message: &str) -> JSError {
    log::trace!("throwing ReferenceError: {message}");
    JSError::Thrown(new_error_object(ctx, Some("ReferenceError"), message))
}

pub fn throw_syntax_error(ctx: &Context, message: &str) -> JSError {
    log::trace!("throwing SyntaxError: {message}");
    JSError::Thrown(new_error_object(ctx, Some("SyntaxError"), message))
}

// 15.11.1 / 15.11.2: calling Error as a function behaves like `new Error`.
fn error_construct(ctx: &Context, _this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    let obj = new_object(Some(ctx.error_proto()));
    if let Some(message) = args.first()
        && !message.is_undefined()
    {
        let text = to_string(ctx, message)?;
        define_data_property(&obj, &JSString::intern("message"), Value::String(text), true, false, true);
    }
    Ok(Value::Object(obj))
}

// 15.11.4.4 Error.prototype.toString: "name: message", dropping whichever
// side is empty.
fn error_prototype_to_string(ctx: &Context, this: Option<&Value>, _args: &[Value]) -> Result<Value, JSError> {
    let Some(Value::Object(this_obj)) = this else {
        return Err(throw_type_error(ctx, "Error.prototype.toString called on a non-object"));
    };
    let name_val = obj_get(ctx, this_obj, &JSString::intern("name"))?;
    let name = if name_val.is_undefined() {
        JSString::intern("Error")
    } else {
        to_string(ctx, &name_val)?
    };
    let message_val = obj_get(ctx, this_obj, &JSString::intern("message"))?;
    let message = if message_val.is_undefined() {
        JSString::empty()
    } else {
        to_string(ctx, &message_val)?
    };
    if name.is_empty() {
        return Ok(Value::String(message));
    }
    if message.is_empty() {
        return Ok(Value::String(name));
    }
    Ok(Value::String(name.concat(&JSString::intern(": ")).concat(&message)))
}
