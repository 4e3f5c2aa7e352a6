use crate::JSError;
use crate::core::{
    Context, JSString, ObjectData, Value, array_length, get_property, index_string, install_constructor, install_native, is_callable,
    new_array, obj_call, obj_delete, obj_get, obj_put, to_integer, to_object, to_uint32,
};
use crate::js_error::throw_type_error;

/// 15.4: the Array constructor and Array.prototype.
pub fn init(ctx: &Context) {
    let proto = ctx.array_proto();
    install_native(ctx, &proto, "concat", array_prototype_concat);
    install_native(ctx, &proto, "forEach", array_prototype_for_each);
    install_native(ctx, &proto, "pop", array_prototype_pop);
    install_native(ctx, &proto, "push", array_prototype_push);
    install_native(ctx, &proto, "splice", array_prototype_splice);

    let ctor = install_constructor(ctx, "Array", array_construct, &proto);
    install_native(ctx, &ctor, "isArray", array_is_array);
}

pub fn is_array(v: &Value) -> bool {
    matches!(v, Value::Object(o) if matches!(o.borrow().data, ObjectData::Array { .. }))
}

// 15.4.2: a single numeric argument is a length, anything else is items.
fn array_construct(ctx: &Context, _this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    if args.len() == 1 && args[0].is_number() {
        let len = to_uint32(ctx, &args[0])?;
        let arr = new_array(ctx, &[]);
        obj_put(ctx, &arr, &JSString::intern("length"), Value::int_or_number(len as f64), false)?;
        return Ok(Value::Object(arr));
    }
    Ok(Value::Object(new_array(ctx, args)))
}

// 15.4.3.2 Array.isArray ( arg )
fn array_is_array(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    if this.is_none() {
        return Err(throw_type_error(ctx, "not a constructor"));
    }
    Ok(Value::Boolean(args.first().is_some_and(is_array)))
}

// 15.4.4.4 Array.prototype.concat: arrays flatten one level, everything
// else is appended as-is.
fn array_prototype_concat(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    let Some(this_val) = this else {
        return Err(throw_type_error(ctx, "not a constructor"));
    };
    let result = new_array(ctx, &[]);
    let mut n: u32 = 0;
    let this_obj = Value::Object(to_object(ctx, this_val)?);
    for item in std::iter::once(&this_obj).chain(args.iter()) {
        if is_array(item) {
            let Value::Object(arr) = item else { continue };
            let len = array_length(arr).unwrap_or(0);
            for i in 0..len {
                let v = obj_get(ctx, arr, &index_string(i))?;
                obj_put(ctx, &result, &index_string(n), v, false)?;
                n += 1;
            }
        } else {
            obj_put(ctx, &result, &index_string(n), item.clone(), false)?;
            n += 1;
        }
    }
    Ok(Value::Object(result))
}

// 15.4.4.18 Array.prototype.forEach ( callbackfn [, thisArg] ): holes are
// skipped, the callback sees (value, index, array).
fn array_prototype_for_each(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    let Some(this_val) = this else {
        return Err(throw_type_error(ctx, "not a constructor"));
    };
    let this_obj = to_object(ctx, this_val)?;
    let len_val = obj_get(ctx, &this_obj, &JSString::intern("length"))?;
    let len = to_uint32(ctx, &len_val)?;

    let callback = match args.first() {
        Some(v @ Value::Object(o)) if is_callable(v) => o.clone(),
        _ => return Err(throw_type_error(ctx, "forEach callback is not a function")),
    };
    let this_arg = args.get(1).cloned().unwrap_or(Value::Undefined);

    for i in 0..len {
        let name = index_string(i);
        if get_property(&this_obj, &name).is_none() {
            continue;
        }
        let v = obj_get(ctx, &this_obj, &name)?;
        obj_call(
            ctx,
            &callback,
            this_arg.clone(),
            &[v, Value::int_or_number(i as f64), Value::Object(this_obj.clone())],
        )?;
    }
    Ok(Value::Undefined)
}

// 15.4.4.6 Array.prototype.pop ( )
fn array_prototype_pop(ctx: &Context, this: Option<&Value>, _args: &[Value]) -> Result<Value, JSError> {
    let Some(Value::Object(this_obj)) = this else {
        return Err(throw_type_error(ctx, "pop called on a non-array"));
    };
    let Some(len) = array_length(this_obj) else {
        return Err(throw_type_error(ctx, "pop called on a non-array"));
    };
    if len == 0 {
        return Ok(Value::Undefined);
    }
    let v = obj_get(ctx, this_obj, &index_string(len - 1))?;
    obj_put(
        ctx,
        this_obj,
        &JSString::intern("length"),
        Value::int_or_number((len - 1) as f64),
        true,
    )?;
    Ok(v)
}

// 15.4.4.7 Array.prototype.push ( ... ): generic over any object with a
// length.
fn array_prototype_push(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    let Some(this_val) = this else {
        return Err(throw_type_error(ctx, "not a constructor"));
    };
    let this_obj = to_object(ctx, this_val)?;
    let len_val = obj_get(ctx, &this_obj, &JSString::intern("length"))?;
    let mut n = to_uint32(ctx, &len_val)?;
    for arg in args {
        obj_put(ctx, &this_obj, &index_string(n), arg.clone(), true)?;
        n += 1;
    }
    let new_len = Value::int_or_number(n as f64);
    obj_put(ctx, &this_obj, &JSString::intern("length"), new_len.clone(), true)?;
    Ok(new_len)
}

// 15.4.4.12 Array.prototype.splice ( start, deleteCount, ... )
fn array_prototype_splice(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    let Some(this_val) = this else {
        return Err(throw_type_error(ctx, "not a constructor"));
    };
    let this_obj = to_object(ctx, this_val)?;
    let len_val = obj_get(ctx, &this_obj, &JSString::intern("length"))?;
    let len = to_uint32(ctx, &len_val)?;

    let start = match args.first() {
        None => 0,
        Some(v) => {
            let n = to_integer(ctx, v)? as i64;
            if n < 0 {
                (len as i64 + n).max(0) as u32
            } else {
                (n as u64).min(len as u64) as u32
            }
        }
    };
    let delete_count = match args.get(1) {
        None => 0,
        Some(v) => {
            let n = (to_integer(ctx, v)? as i64).max(0) as u64;
            n.min((len - start) as u64) as u32
        }
    };
    let items = if args.len() > 2 { &args[2..] } else { &[] };
    let insert_count = items.len() as u32;

    let removed = new_array(ctx, &[]);
    for i in 0..delete_count {
        let v = obj_get(ctx, &this_obj, &index_string(start + i))?;
        obj_put(ctx, &removed, &index_string(i), v, true)?;
    }

    if delete_count >= insert_count {
        let diff = delete_count - insert_count;
        for (i, item) in items.iter().enumerate() {
            obj_put(ctx, &this_obj, &index_string(start + i as u32), item.clone(), true)?;
        }
        for i in start + delete_count..len {
            let v = obj_get(ctx, &this_obj, &index_string(i))?;
            obj_put(ctx, &this_obj, &index_string(i - diff), v, true)?;
        }
        for i in len - diff..len {
            obj_delete(ctx, &this_obj, &index_string(i), false)?;
        }
        obj_put(
            ctx,
            &this_obj,
            &JSString::intern("length"),
            Value::int_or_number((len - diff) as f64),
            false,
        )?;
    } else {
        let diff = insert_count - delete_count;
        // Shift the tail upward back-to-front; the range is empty for an
        // empty target, so the indices never underflow.
        for i in (start + insert_count..len + diff).rev() {
            let v = obj_get(ctx, &this_obj, &index_string(i - diff))?;
            obj_put(ctx, &this_obj, &index_string(i), v, false)?;
        }
        for (i, item) in items.iter().enumerate() {
            obj_put(ctx, &this_obj, &index_string(start + i as u32), item.clone(), true)?;
        }
        obj_put(
            ctx,
            &this_obj,
            &JSString::intern("length"),
            Value::int_or_number((len + diff) as f64),
            true,
        )?;
    }
    Ok(Value::Object(removed))
}
