use crate::JSError;
use crate::core::{
    Context, JSString, ObjectData, Value, check_object_coercible, install_constructor, install_native, new_string_object, to_integer,
    to_string, to_uint32,
};
use crate::js_error::throw_type_error;

/// 15.5: the String constructor and String.prototype.
pub fn init(ctx: &Context) {
    let proto = ctx.string_proto();
    install_native(ctx, &proto, "charCodeAt", string_prototype_char_code_at);
    install_native(ctx, &proto, "indexOf", string_prototype_index_of);
    install_native(ctx, &proto, "lastIndexOf", string_prototype_last_index_of);
    install_native(ctx, &proto, "search", string_prototype_search);
    install_native(ctx, &proto, "substring", string_prototype_substring);
    install_native(ctx, &proto, "toLowerCase", string_prototype_to_lower_case);
    install_native(ctx, &proto, "toUpperCase", string_prototype_to_upper_case);
    install_native(ctx, &proto, "toString", string_prototype_to_string);
    install_native(ctx, &proto, "valueOf", string_prototype_value_of);

    let ctor = install_constructor(ctx, "String", string_construct, &proto);
    install_native(ctx, &ctor, "fromCharCode", string_from_char_code);
}

// 15.5.1 / 15.5.2: String(v) coerces, new String(v) wraps.
fn string_construct(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    let s = match args.first() {
        None => JSString::empty(),
        Some(v) => to_string(ctx, v)?,
    };
    match this {
        None => Ok(Value::Object(new_string_object(ctx, s))),
        Some(_) => Ok(Value::String(s)),
    }
}

// 15.5.3.2 String.fromCharCode ( ... ): every argument contributes one
// code unit.
fn string_from_char_code(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    if this.is_none() {
        return Err(throw_type_error(ctx, "not a constructor"));
    }
    let mut units = Vec::with_capacity(args.len());
    for arg in args {
        units.push((to_uint32(ctx, arg)? & 0xffff) as u16);
    }
    Ok(Value::String(JSString::from_units(units)))
}

/// The shared receiver coercion for prototype methods: CheckObjectCoercible
/// then ToString.
fn this_string(ctx: &Context, this: Option<&Value>) -> Result<JSString, JSError> {
    let Some(v) = this else {
        return Err(throw_type_error(ctx, "not a constructor"));
    };
    check_object_coercible(ctx, v)?;
    to_string(ctx, v)
}

// 15.5.4.5 String.prototype.charCodeAt (pos)
fn string_prototype_char_code_at(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    let s = this_string(ctx, this)?;
    let pos = match args.first() {
        None => 0.0,
        Some(v) => to_integer(ctx, v)?,
    };
    if pos < 0.0 || pos >= s.len() as f64 {
        return Ok(Value::Number(f64::NAN));
    }
    match s.char_at(pos as usize) {
        Some(unit) => Ok(Value::Integer(unit as i32)),
        None => Ok(Value::Number(f64::NAN)),
    }
}

fn units_find(haystack: &[u16], needle: &[u16], from: usize) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    let last = haystack.len() - needle.len();
    (from.min(last)..=last).find(|&i| &haystack[i..i + needle.len()] == needle)
}

// 15.5.4.7 String.prototype.indexOf (searchString, position)
fn string_prototype_index_of(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    let s = this_string(ctx, this)?;
    let search = match args.first() {
        None => JSString::intern("undefined"),
        Some(v) => to_string(ctx, v)?,
    };
    let pos = match args.get(1) {
        None => 0.0,
        Some(v) => to_integer(ctx, v)?,
    };
    let from = pos.max(0.0) as usize;
    if from > s.len() {
        return Ok(Value::Integer(-1));
    }
    match units_find(s.units(), search.units(), from) {
        Some(i) if i >= from || search.is_empty() => Ok(Value::int_or_number(i as f64)),
        _ => Ok(Value::Integer(-1)),
    }
}

// 15.5.4.8 String.prototype.lastIndexOf (searchString, position)
fn string_prototype_last_index_of(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    let s = this_string(ctx, this)?;
    let search = match args.first() {
        None => JSString::intern("undefined"),
        Some(v) => to_string(ctx, v)?,
    };
    let pos = match args.get(1) {
        None | Some(Value::Undefined) => s.len() as f64,
        Some(v) => {
            // NaN means "search the whole string", so ToNumber comes first
            let n = crate::core::to_number(ctx, v)?;
            if n.is_nan() { s.len() as f64 } else { n.trunc() }
        }
    };
    if search.len() > s.len() {
        return Ok(Value::Integer(-1));
    }
    let limit = (s.len() - search.len()) as f64;
    let mut start = pos.clamp(0.0, limit) as i64;
    while start >= 0 {
        let i = start as usize;
        if &s.units()[i..i + search.len()] == search.units() {
            return Ok(Value::int_or_number(i as f64));
        }
        start -= 1;
    }
    Ok(Value::Integer(-1))
}

// 15.5.4.12 String.prototype.search (regexp)
fn string_prototype_search(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    let s = this_string(ctx, this)?;
    let subject = s.to_rust_string();

    let found = match args.first() {
        Some(Value::Object(obj)) if matches!(obj.borrow().data, ObjectData::RegExp(_)) => {
            let data = match &obj.borrow().data {
                ObjectData::RegExp(d) => d.clone(),
                _ => return Err(throw_type_error(ctx, "not a regular expression")),
            };
            data.regex.find(&subject).map(|m| m.range.start)
        }
        Some(v) => {
            let pattern = to_string(ctx, v)?.to_rust_string();
            let regex = regress::Regex::new(&pattern).map_err(|e| throw_type_error(ctx, &format!("invalid pattern: {e}")))?;
            regex.find(&subject).map(|m| m.range.start)
        }
        None => subject.find(' '),
    };
    Ok(match found {
        Some(byte_index) => Value::int_or_number(subject[..byte_index].encode_utf16().count() as f64),
        None => Value::Integer(-1),
    })
}

// 15.5.4.15 String.prototype.substring (start, end): clamps to the string
// and swaps reversed bounds.
fn string_prototype_substring(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    let s = this_string(ctx, this)?;
    let len = s.len() as f64;
    let start = match args.first() {
        None => 0.0,
        Some(v) => to_integer(ctx, v)?,
    };
    let end = match args.get(1) {
        None | Some(Value::Undefined) => len,
        Some(v) => to_integer(ctx, v)?,
    };
    let start = start.clamp(0.0, len) as usize;
    let end = end.clamp(0.0, len) as usize;
    let (start, end) = if start > end { (end, start) } else { (start, end) };
    Ok(Value::String(s.substring(start, end)))
}

// 15.5.4.16 / 15.5.4.18: ASCII-only case mapping.
fn map_ascii_case(s: &JSString, to_upper: bool) -> JSString {
    let units: Vec<u16> = s
        .units()
        .iter()
        .map(|&u| {
            if to_upper && (u >= 'a' as u16 && u <= 'z' as u16) {
                u - ('a' as u16 - 'A' as u16)
            } else if !to_upper && (u >= 'A' as u16 && u <= 'Z' as u16) {
                u + ('a' as u16 - 'A' as u16)
            } else {
                u
            }
        })
        .collect();
    JSString::from_units(units)
}

fn string_prototype_to_lower_case(ctx: &Context, this: Option<&Value>, _args: &[Value]) -> Result<Value, JSError> {
    let s = this_string(ctx, this)?;
    Ok(Value::String(map_ascii_case(&s, false)))
}

fn string_prototype_to_upper_case(ctx: &Context, this: Option<&Value>, _args: &[Value]) -> Result<Value, JSError> {
    let s = this_string(ctx, this)?;
    Ok(Value::String(map_ascii_case(&s, true)))
}

// 15.5.4.2 String.prototype.toString ( ): only string values and wrappers
// qualify.
fn string_prototype_to_string(ctx: &Context, this: Option<&Value>, _args: &[Value]) -> Result<Value, JSError> {
    match this {
        Some(Value::String(s)) => Ok(Value::String(s.clone())),
        Some(Value::Object(obj)) => match &obj.borrow().data {
            ObjectData::StringWrap(s) => Ok(Value::String(s.clone())),
            _ => Err(throw_type_error(ctx, "String.prototype.toString called on a non-string")),
        },
        _ => Err(throw_type_error(ctx, "String.prototype.toString called on a non-string")),
    }
}

// 15.5.4.3 String.prototype.valueOf ( )
fn string_prototype_value_of(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    string_prototype_to_string(ctx, this, args)
}
