use crate::JSError;
use crate::core::{Context, ObjectData, Value, install_constructor, install_native, new_number_object, to_number};
use crate::js_error::throw_type_error;

/// 15.7: the Number constructor and Number.prototype.
pub fn init(ctx: &Context) {
    let proto = ctx.number_proto();
    install_native(ctx, &proto, "valueOf", number_prototype_value_of);
    install_constructor(ctx, "Number", number_construct, &proto);
}

// 15.7.1 / 15.7.2: Number(v) coerces, new Number(v) wraps.
fn number_construct(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    let d = match args.first() {
        None => 0.0,
        Some(v) => to_number(ctx, v)?,
    };
    match this {
        None => Ok(Value::Object(new_number_object(ctx, d))),
        Some(_) => Ok(Value::int_or_number(d)),
    }
}

// 15.7.4.4 Number.prototype.valueOf ( )
fn number_prototype_value_of(ctx: &Context, this: Option<&Value>, _args: &[Value]) -> Result<Value, JSError> {
    match this {
        Some(v @ (Value::Integer(_) | Value::Number(_))) => Ok(v.clone()),
        Some(Value::Object(obj)) => match obj.borrow().data {
            ObjectData::NumberWrap(d) => Ok(Value::int_or_number(d)),
            _ => Err(throw_type_error(ctx, "Number.prototype.valueOf called on a non-number")),
        },
        _ => Err(throw_type_error(ctx, "Number.prototype.valueOf called on a non-number")),
    }
}
