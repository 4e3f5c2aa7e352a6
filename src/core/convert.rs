use crate::JSError;
use crate::core::{
    Context, JSString, ObjectData, Value, new_boolean_object, new_number_object, new_string_object, obj_default_value,
};
use crate::js_error::throw_type_error;

/// ToPrimitive preference. `None` lets the object pick (Date → String,
/// everything else → Number).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Hint {
    None,
    String,
    Number,
}

/// 9.1 ToPrimitive: non-objects pass through, objects defer to
/// [[DefaultValue]].
pub fn to_primitive(ctx: &Context, v: &Value, hint: Hint) -> Result<Value, JSError> {
    match v {
        Value::Object(obj) => obj_default_value(ctx, obj, hint),
        other => Ok(other.clone()),
    }
}

/// 9.2 ToBoolean.
pub fn to_boolean(v: &Value) -> bool {
    match v {
        Value::Undefined | Value::Null => false,
        Value::Boolean(b) => *b,
        Value::Integer(n) => *n != 0,
        Value::Number(d) => !(*d == 0.0 || d.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Object(_) => true,
    }
}

/// 9.3 ToNumber.
pub fn to_number(ctx: &Context, v: &Value) -> Result<f64, JSError> {
    match v {
        Value::Undefined => Ok(f64::NAN),
        Value::Null => Ok(0.0),
        Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Integer(n) => Ok(*n as f64),
        Value::Number(d) => Ok(*d),
        Value::String(s) => Ok(string_to_number(&s.to_rust_string())),
        Value::Object(_) => {
            let prim = to_primitive(ctx, v, Hint::Number)?;
            to_number(ctx, &prim)
        }
    }
}

/// String numeric grammar, strtod-flavored: surrounding whitespace and a
/// sign are accepted, the empty string is 0, `Infinity` and `0x` hex parse,
/// anything else is NaN.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let (sign, rest) = match trimmed.as_bytes()[0] {
        b'-' => (-1.0, &trimmed[1..]),
        b'+' => (1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };
    if rest == "Infinity" {
        return sign * f64::INFINITY;
    }
    if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        return match u64::from_str_radix(hex, 16) {
            Ok(n) => sign * n as f64,
            Err(_) => f64::NAN,
        };
    }
    // Reject Rust-specific spellings ("inf", "nan", leading alphabetics).
    match rest.as_bytes().first() {
        Some(c) if c.is_ascii_digit() || *c == b'.' => rest.parse::<f64>().map(|d| sign * d).unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// ToInteger: truncates toward zero, NaN becomes 0.
pub fn to_integer(ctx: &Context, v: &Value) -> Result<f64, JSError> {
    let d = to_number(ctx, v)?;
    if d.is_nan() {
        return Ok(0.0);
    }
    Ok(d.trunc())
}

/// 9.5 ToInt32 on an already-converted number.
pub fn f64_to_int32(d: f64) -> i32 {
    f64_to_uint32(d) as i32
}

/// 9.6 ToUint32 on an already-converted number.
pub fn f64_to_uint32(d: f64) -> u32 {
    if d.is_nan() || d.is_infinite() || d == 0.0 {
        return 0;
    }
    const TWO_32: f64 = 4_294_967_296.0;
    let mut n = d.trunc() % TWO_32;
    if n < 0.0 {
        n += TWO_32;
    }
    n as u32
}

pub fn to_int32(ctx: &Context, v: &Value) -> Result<i32, JSError> {
    Ok(f64_to_int32(to_number(ctx, v)?))
}

pub fn to_uint32(ctx: &Context, v: &Value) -> Result<u32, JSError> {
    Ok(f64_to_uint32(to_number(ctx, v)?))
}

/// 9.8 ToString.
pub fn to_string(ctx: &Context, v: &Value) -> Result<JSString, JSError> {
    match v {
        Value::Undefined => Ok(JSString::intern("undefined")),
        Value::Null => Ok(JSString::intern("null")),
        Value::Boolean(b) => Ok(JSString::intern(if *b { "true" } else { "false" })),
        Value::Integer(n) => Ok(JSString::intern(&n.to_string())),
        Value::Number(d) => Ok(JSString::intern(&number_to_string(*d))),
        Value::String(s) => Ok(s.clone()),
        Value::Object(_) => {
            let prim = to_primitive(ctx, v, Hint::String)?;
            to_string(ctx, &prim)
        }
    }
}

/// Compact decimal rendering: integers print without a decimal point,
/// non-integers in the shortest form that round-trips.
pub fn number_to_string(d: f64) -> String {
    if d.is_nan() {
        return "NaN".to_string();
    }
    if d.is_infinite() {
        return if d > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if d == 0.0 {
        return "0".to_string();
    }
    if d.fract() == 0.0 && d.abs() < 9.0e18 {
        return (d as i64).to_string();
    }
    format!("{d}")
}

/// 9.9 ToObject: primitives wrap, undefined and null are a TypeError.
pub fn to_object(ctx: &Context, v: &Value) -> Result<crate::core::JSObjectPtr, JSError> {
    match v {
        Value::Undefined | Value::Null => Err(throw_type_error(ctx, "cannot convert undefined or null to object")),
        Value::Boolean(b) => Ok(new_boolean_object(ctx, *b)),
        Value::Integer(n) => Ok(new_number_object(ctx, *n as f64)),
        Value::Number(d) => Ok(new_number_object(ctx, *d)),
        Value::String(s) => Ok(new_string_object(ctx, s.clone())),
        Value::Object(o) => Ok(o.clone()),
    }
}

/// 9.10 CheckObjectCoercible.
pub fn check_object_coercible(ctx: &Context, v: &Value) -> Result<(), JSError> {
    match v {
        Value::Undefined | Value::Null => Err(throw_type_error(ctx, "undefined or null has no properties")),
        _ => Ok(()),
    }
}

/// 11.4.3 typeof.
pub fn type_of(v: &Value) -> &'static str {
    match v {
        Value::Undefined => "undefined",
        Value::Null => "object",
        Value::Boolean(_) => "boolean",
        Value::Integer(_) | Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Object(o) => {
            if matches!(o.borrow().data, ObjectData::Function(_)) {
                "function"
            } else {
                "object"
            }
        }
    }
}

/// 11.9.6 strict equality: same type, same value. NaN is unequal to itself,
/// +0 equals -0, objects compare by identity.
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) => true,
        (Value::Null, Value::Null) => true,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Object(x), Value::Object(y)) => std::rc::Rc::ptr_eq(x, y),
        (x, y) => match (x.as_number(), y.as_number()) {
            (Some(dx), Some(dy)) => dx == dy,
            _ => false,
        },
    }
}

/// 11.9.3 abstract equality: null == undefined, numeric/string coercion,
/// booleans via numbers, objects via ToPrimitive.
pub fn abstract_equals(ctx: &Context, a: &Value, b: &Value) -> Result<bool, JSError> {
    let mut x = a.clone();
    let mut y = b.clone();

    if x.is_object() {
        if y.is_object() {
            return Ok(strict_equals(&x, &y));
        }
        if y.is_nullish() {
            return Ok(false);
        }
        x = to_primitive(ctx, &x, Hint::None)?;
    }
    if y.is_object() {
        if x.is_nullish() {
            return Ok(false);
        }
        y = to_primitive(ctx, &y, Hint::None)?;
    }

    if x.is_nullish() {
        return Ok(y.is_nullish());
    }
    if y.is_nullish() {
        return Ok(false);
    }
    if let Value::Boolean(b) = x {
        x = Value::Integer(if b { 1 } else { 0 });
    }
    if let Value::Boolean(b) = y {
        y = Value::Integer(if b { 1 } else { 0 });
    }
    if let (Value::String(sx), Value::String(sy)) = (&x, &y) {
        return Ok(sx == sy);
    }
    let dx = to_number(ctx, &x)?;
    let dy = to_number(ctx, &y)?;
    Ok(dx == dy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_string_round_trip() {
        for d in [0.1, 1.5, 3.0, -42.0, 1e100, 0.30000000000000004] {
            let s = number_to_string(d);
            assert_eq!(string_to_number(&s), d, "round-trip failed for {d}");
        }
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::INFINITY), "Infinity");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(number_to_string(-0.0), "0");
    }

    #[test]
    fn string_numeric_grammar() {
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("  12  "), 12.0);
        assert_eq!(string_to_number("-3.5"), -3.5);
        assert_eq!(string_to_number("0x10"), 16.0);
        assert_eq!(string_to_number("Infinity"), f64::INFINITY);
        assert_eq!(string_to_number("-Infinity"), f64::NEG_INFINITY);
        assert!(string_to_number("abc").is_nan());
        assert!(string_to_number("inf").is_nan());
        assert!(string_to_number("12px").is_nan());
    }

    #[test]
    fn int32_uint32_wrapping() {
        assert_eq!(f64_to_int32(4294967296.0), 0);
        assert_eq!(f64_to_int32(-1.0), -1);
        assert_eq!(f64_to_uint32(-1.0), 4294967295);
        assert_eq!(f64_to_int32(2147483648.0), -2147483648);
        assert_eq!(f64_to_int32(f64::NAN), 0);
    }

    #[test]
    fn strict_equality_rules() {
        assert!(strict_equals(&Value::Integer(1), &Value::Number(1.0)));
        assert!(!strict_equals(&Value::Number(f64::NAN), &Value::Number(f64::NAN)));
        assert!(strict_equals(&Value::Number(0.0), &Value::Number(-0.0)));
        assert!(!strict_equals(&Value::Integer(0), &Value::Boolean(false)));
        assert!(strict_equals(&Value::from("a"), &Value::from("a")));
    }
}
