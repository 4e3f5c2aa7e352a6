use crate::JSError;
use crate::core::{Context, ObjectData, Value, install_constructor, install_native, new_boolean_object, to_boolean};
use crate::js_error::throw_type_error;

/// 15.6: the Boolean constructor and Boolean.prototype.
pub fn init(ctx: &Context) {
    let proto = ctx.boolean_proto();
    install_native(ctx, &proto, "valueOf", boolean_prototype_value_of);
    install_constructor(ctx, "Boolean", boolean_construct, &proto);
}

// 15.6.1 / 15.6.2: Boolean(v) coerces, new Boolean(v) wraps.
fn boolean_construct(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    let b = args.first().map(to_boolean).unwrap_or(false);
    match this {
        None => Ok(Value::Object(new_boolean_object(ctx, b))),
        Some(_) => Ok(Value::Boolean(b)),
    }
}

// 15.6.4.3 Boolean.prototype.valueOf ( )
fn boolean_prototype_value_of(ctx: &Context, this: Option<&Value>, _args: &[Value]) -> Result<Value, JSError> {
    match this {
        Some(Value::Boolean(b)) => Ok(Value::Boolean(*b)),
        Some(Value::Object(obj)) => match obj.borrow().data {
            ObjectData::BooleanWrap(b) => Ok(Value::Boolean(b)),
            _ => Err(throw_type_error(ctx, "Boolean.prototype.valueOf called on a non-boolean")),
        },
        _ => Err(throw_type_error(ctx, "Boolean.prototype.valueOf called on a non-boolean")),
    }
}
