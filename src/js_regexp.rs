use std::rc::Rc;

use crate::JSError;
use crate::core::{
    Context, JSObjectPtr, JSString, ObjectData, Value, define_data_property, index_string, install_constructor, install_native,
    new_array, new_object, obj_get, obj_put, to_string, to_uint32,
};
use crate::js_error::{throw_syntax_error, throw_type_error};

/// Compiled pattern plus the flag set; lives in the object's host-data
/// slot.
pub struct RegExpData {
    pub source: JSString,
    pub global: bool,
    pub ignore_case: bool,
    pub multiline: bool,
    pub regex: regress::Regex,
}

impl std::fmt::Debug for RegExpData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RegExpData(/{}/)", self.source)
    }
}

/// 15.10: the RegExp constructor and RegExp.prototype.
pub fn init(ctx: &Context) {
    let proto = ctx.regexp_proto();
    install_native(ctx, &proto, "exec", regexp_prototype_exec);
    install_constructor(ctx, "RegExp", regexp_construct, &proto);
}

/// Compiles a pattern/flags pair into a RegExp object with the `source`,
/// `global`, `ignoreCase`, `multiline` and `lastIndex` own properties.
pub fn new_regexp_object(ctx: &Context, pattern: &JSString, flags: &JSString) -> Result<JSObjectPtr, JSError> {
    let mut global = false;
    let mut ignore_case = false;
    let mut multiline = false;
    for unit in flags.units() {
        match *unit {
            u if u == 'g' as u16 => {
                if global {
                    return Err(throw_syntax_error(ctx, "duplicate 'g' flag"));
                }
                global = true;
            }
            u if u == 'i' as u16 => {
                if ignore_case {
                    return Err(throw_syntax_error(ctx, "duplicate 'i' flag"));
                }
                ignore_case = true;
            }
            u if u == 'm' as u16 => {
                if multiline {
                    return Err(throw_syntax_error(ctx, "duplicate 'm' flag"));
                }
                multiline = true;
            }
            _ => return Err(throw_syntax_error(ctx, "unknown regular expression flag")),
        }
    }

    let mut engine_flags = String::new();
    if ignore_case {
        engine_flags.push('i');
    }
    if multiline {
        engine_flags.push('m');
    }
    let regex = regress::Regex::with_flags(&pattern.to_rust_string(), engine_flags.as_str())
        .map_err(|e| throw_type_error(ctx, &format!("invalid regular expression: {e}")))?;

    let obj = new_object(Some(ctx.regexp_proto()));
    obj.borrow_mut().data = ObjectData::RegExp(Rc::new(RegExpData {
        source: pattern.clone(),
        global,
        ignore_case,
        multiline,
        regex,
    }));
    define_data_property(&obj, &JSString::intern("source"), Value::String(pattern.clone()), false, false, false);
    define_data_property(&obj, &JSString::intern("global"), Value::Boolean(global), false, false, false);
    define_data_property(&obj, &JSString::intern("ignoreCase"), Value::Boolean(ignore_case), false, false, false);
    define_data_property(&obj, &JSString::intern("multiline"), Value::Boolean(multiline), false, false, false);
    define_data_property(&obj, &JSString::intern("lastIndex"), Value::Integer(0), true, false, false);
    Ok(obj)
}

fn regexp_data(obj: &JSObjectPtr) -> Option<Rc<RegExpData>> {
    match &obj.borrow().data {
        ObjectData::RegExp(data) => Some(data.clone()),
        _ => None,
    }
}

// 15.10.3 / 15.10.4: RegExp(re) without flags passes the object through,
// everything else compiles a new one.
fn regexp_construct(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    if this.is_some()
        && let Some(Value::Object(obj)) = args.first()
        && regexp_data(obj).is_some()
        && args.get(1).is_none_or(|f| f.is_undefined())
    {
        return Ok(Value::Object(obj.clone()));
    }

    let pattern = match args.first() {
        None | Some(Value::Undefined) => JSString::empty(),
        Some(Value::Object(obj)) if regexp_data(obj).is_some() => match regexp_data(obj) {
            Some(data) => data.source.clone(),
            None => JSString::empty(),
        },
        Some(v) => to_string(ctx, v)?,
    };
    let flags = match args.get(1) {
        None | Some(Value::Undefined) => JSString::empty(),
        Some(v) => to_string(ctx, v)?,
    };
    Ok(Value::Object(new_regexp_object(ctx, &pattern, &flags)?))
}

/// Maps a UTF-16 code-unit index into the UTF-8 projection, and back.
fn utf16_index_to_byte(s: &str, utf16_index: usize) -> Option<usize> {
    let mut units = 0;
    for (byte_index, ch) in s.char_indices() {
        if units >= utf16_index {
            return Some(byte_index);
        }
        units += ch.len_utf16();
    }
    if units >= utf16_index { Some(s.len()) } else { None }
}

fn byte_index_to_utf16(s: &str, byte_index: usize) -> usize {
    s[..byte_index].encode_utf16().count()
}

// 15.10.6.2 RegExp.prototype.exec (string): matches from `lastIndex`,
// returns a match array with `index` and `input`, or null.
fn regexp_prototype_exec(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    let Some(Value::Object(this_obj)) = this else {
        return Err(throw_type_error(ctx, "exec called on a non-RegExp"));
    };
    let Some(data) = regexp_data(this_obj) else {
        return Err(throw_type_error(ctx, "exec called on a non-RegExp"));
    };

    let subject = match args.first() {
        None => JSString::intern("undefined"),
        Some(v) => to_string(ctx, v)?,
    };
    let text = subject.to_rust_string();

    let last_index_val = obj_get(ctx, this_obj, &JSString::intern("lastIndex"))?;
    let last_index = to_uint32(ctx, &last_index_val)? as usize;
    let Some(start_byte) = utf16_index_to_byte(&text, last_index) else {
        return Ok(Value::Null);
    };

    let Some(m) = data.regex.find_from(&text, start_byte).next() else {
        return Ok(Value::Null);
    };

    let result = new_array(ctx, &[]);
    obj_put(
        ctx,
        &result,
        &JSString::intern("index"),
        Value::int_or_number(byte_index_to_utf16(&text, m.range.start) as f64),
        true,
    )?;
    obj_put(ctx, &result, &JSString::intern("input"), Value::String(subject.clone()), true)?;

    obj_put(
        ctx,
        &result,
        &index_string(0),
        Value::String(JSString::intern(&text[m.range.clone()])),
        true,
    )?;
    for (i, capture) in m.captures.iter().enumerate() {
        let v = match capture {
            Some(range) => Value::String(JSString::intern(&text[range.clone()])),
            None => Value::Undefined,
        };
        obj_put(ctx, &result, &index_string(i as u32 + 1), v, true)?;
    }
    Ok(Value::Object(result))
}
