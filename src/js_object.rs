use crate::JSError;
use crate::core::{
    Context, JSString, ObjectData, Property, Value, define_accessor_property, define_data_property, get_property, install_constructor,
    install_native, new_array, new_object, obj_get, obj_put, to_object, to_string,
};
use crate::js_error::throw_type_error;

/// 15.2: the Object constructor, its statics, and Object.prototype.
pub fn init(ctx: &Context) {
    let proto = ctx.object_proto();
    install_native(ctx, &proto, "toString", object_prototype_to_string);
    install_native(ctx, &proto, "valueOf", object_prototype_value_of);
    install_native(ctx, &proto, "hasOwnProperty", object_prototype_has_own_property);

    let ctor = install_constructor(ctx, "Object", object_construct, &proto);
    install_native(ctx, &ctor, "create", object_create);
    install_native(ctx, &ctor, "defineProperty", object_define_property);
    install_native(ctx, &ctor, "getOwnPropertyDescriptor", object_get_own_property_descriptor);
    install_native(ctx, &ctor, "getPrototypeOf", object_get_prototype_of);
    install_native(ctx, &ctor, "keys", object_keys);
}

// 15.2.1 / 15.2.2: Object(v) and new Object(v) both wrap or pass through.
fn object_construct(ctx: &Context, _this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    match args.first() {
        None | Some(Value::Undefined) | Some(Value::Null) => Ok(Value::Object(new_object(Some(ctx.object_proto())))),
        Some(v) => Ok(Value::Object(to_object(ctx, v)?)),
    }
}

// 15.2.3.2 Object.getPrototypeOf ( O )
fn object_get_prototype_of(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    require_this(ctx, this)?;
    let Some(Value::Object(obj)) = args.first() else {
        return Err(throw_type_error(ctx, "Object.getPrototypeOf called on a non-object"));
    };
    Ok(match obj.borrow().proto.clone() {
        Some(proto) => Value::Object(proto),
        None => Value::Null,
    })
}

// 15.2.3.3 Object.getOwnPropertyDescriptor ( O, P )
fn object_get_own_property_descriptor(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    require_this(ctx, this)?;
    let Some(Value::Object(obj)) = args.first() else {
        return Err(throw_type_error(ctx, "Object.getOwnPropertyDescriptor called on a non-object"));
    };
    let name = to_string(ctx, args.get(1).unwrap_or(&Value::Undefined))?;
    let Some(desc) = obj.borrow().props.get(&name).cloned() else {
        return Ok(Value::Undefined);
    };

    let result = new_object(Some(ctx.object_proto()));
    if desc.accessor {
        obj_put(ctx, &result, &JSString::intern("get"), desc.value, false)?;
        obj_put(
            ctx,
            &result,
            &JSString::intern("set"),
            desc.set.unwrap_or(Value::Undefined),
            false,
        )?;
    } else {
        obj_put(ctx, &result, &JSString::intern("value"), desc.value, false)?;
        obj_put(ctx, &result, &JSString::intern("writable"), Value::Boolean(desc.writable), false)?;
    }
    obj_put(ctx, &result, &JSString::intern("enumerable"), Value::Boolean(desc.enumerable), false)?;
    obj_put(
        ctx,
        &result,
        &JSString::intern("configurable"),
        Value::Boolean(desc.configurable),
        false,
    )?;
    Ok(Value::Object(result))
}

// 15.2.3.5 Object.create ( O [, Properties] )
fn object_create(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    require_this(ctx, this)?;
    let result = match args.first() {
        Some(Value::Null) => new_object(Some(ctx.object_proto())),
        Some(Value::Object(proto)) => new_object(Some(proto.clone())),
        _ => return Err(throw_type_error(ctx, "Object.create needs an object or null prototype")),
    };
    if let Some(Value::Object(props_obj)) = args.get(1) {
        let names: Vec<JSString> = props_obj
            .borrow()
            .props
            .iter()
            .filter(|(_, d)| d.enumerable)
            .map(|(k, _)| k.clone())
            .collect();
        for name in names {
            let desc = obj_get(ctx, props_obj, &name)?;
            define_from_descriptor(ctx, &result, &name, &desc)?;
        }
    }
    Ok(Value::Object(result))
}

// 15.2.3.6 Object.defineProperty ( O, P, Attributes )
fn object_define_property(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    require_this(ctx, this)?;
    let Some(Value::Object(obj)) = args.first() else {
        return Err(throw_type_error(ctx, "Object.defineProperty called on a non-object"));
    };
    let name = to_string(ctx, args.get(1).unwrap_or(&Value::Undefined))?;
    let desc = args.get(2).cloned().unwrap_or(Value::Undefined);
    define_from_descriptor(ctx, obj, &name, &desc)?;
    Ok(Value::Object(obj.clone()))
}

/// Reads a property-descriptor object; absent attributes default to false.
fn define_from_descriptor(ctx: &Context, target: &crate::core::JSObjectPtr, name: &JSString, desc: &Value) -> Result<(), JSError> {
    let Value::Object(desc_obj) = desc else {
        return Err(throw_type_error(ctx, "property descriptor must be an object"));
    };
    let has = |field: &str| get_property(desc_obj, &JSString::intern(field)).is_some();
    let read = |field: &str| obj_get(ctx, desc_obj, &JSString::intern(field));

    let enumerable = has("enumerable") && crate::core::to_boolean(&read("enumerable")?);
    let configurable = has("configurable") && crate::core::to_boolean(&read("configurable")?);

    if has("get") || has("set") {
        let getter = if has("get") { Some(read("get")?) } else { None };
        let setter = if has("set") { Some(read("set")?) } else { None };
        define_accessor_property(target, name, getter, setter);
        if let Some(slot) = target.borrow_mut().props.get_mut(name) {
            slot.enumerable = enumerable;
            slot.configurable = configurable;
        }
        return Ok(());
    }

    let value = if has("value") { read("value")? } else { Value::Undefined };
    let writable = has("writable") && crate::core::to_boolean(&read("writable")?);
    target.borrow_mut().props.insert(
        name.clone(),
        Property {
            value,
            set: None,
            accessor: false,
            writable,
            enumerable,
            configurable,
        },
    );
    Ok(())
}

// 15.2.3.14 Object.keys ( O )
fn object_keys(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    require_this(ctx, this)?;
    let Some(Value::Object(obj)) = args.first() else {
        return Err(throw_type_error(ctx, "Object.keys called on a non-object"));
    };
    let names: Vec<Value> = obj
        .borrow()
        .props
        .iter()
        .filter(|(_, d)| d.enumerable)
        .map(|(k, _)| Value::String(k.clone()))
        .collect();
    Ok(Value::Object(new_array(ctx, &names)))
}

// 15.2.4.2 Object.prototype.toString ( )
fn object_prototype_to_string(ctx: &Context, this: Option<&Value>, _args: &[Value]) -> Result<Value, JSError> {
    let class = match this {
        None | Some(Value::Undefined) => "Undefined",
        Some(Value::Null) => "Null",
        Some(v) => {
            let obj = to_object(ctx, v)?;
            let borrowed = obj.borrow();
            match &borrowed.data {
                ObjectData::Function(_) => "Function",
                ObjectData::Array { .. } => "Array",
                ObjectData::RegExp(_) => "RegExp",
                ObjectData::Date { .. } => "Date",
                ObjectData::BooleanWrap(_) => "Boolean",
                ObjectData::NumberWrap(_) => "Number",
                ObjectData::StringWrap(_) => "String",
                ObjectData::Ordinary | ObjectData::Context(_) => "Object",
            }
        }
    };
    Ok(Value::String(JSString::intern(&format!("[object {class}]"))))
}

// 15.2.4.4 Object.prototype.valueOf ( )
fn object_prototype_value_of(ctx: &Context, this: Option<&Value>, _args: &[Value]) -> Result<Value, JSError> {
    let Some(v) = this else {
        return Err(throw_type_error(ctx, "Object.prototype.valueOf called without a receiver"));
    };
    Ok(Value::Object(to_object(ctx, v)?))
}

// 15.2.4.5 Object.prototype.hasOwnProperty ( V )
fn object_prototype_has_own_property(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    let Some(Value::Object(this_obj)) = this else {
        return Err(throw_type_error(ctx, "hasOwnProperty called on a non-object"));
    };
    let name = to_string(ctx, args.first().unwrap_or(&Value::Undefined))?;
    Ok(Value::Boolean(this_obj.borrow().props.contains_key(&name)))
}

fn require_this(ctx: &Context, this: Option<&Value>) -> Result<(), JSError> {
    if this.is_none() {
        return Err(throw_type_error(ctx, "not a constructor"));
    }
    Ok(())
}
