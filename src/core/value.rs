use crate::core::{JSObjectPtr, JSString, ObjectData, get_own_property};

/// The seven-variant tagged value. Small integers carry their own variant;
/// everything numeric that does not fit goes through `Number`. Strings and
/// objects are reference-counted handles.
#[derive(Clone, Debug)]
pub enum Value {
    Undefined,
    Null,
    Boolean(bool),
    Integer(i32),
    Number(f64),
    String(JSString),
    Object(JSObjectPtr),
}

impl Value {
    /// Canonical number constructor: integral doubles that fit an `i32`
    /// (and are not negative zero) collapse to the small-int variant.
    pub fn int_or_number(d: f64) -> Value {
        if d.fract() == 0.0
            && d >= i32::MIN as f64
            && d <= i32::MAX as f64
            && !(d == 0.0 && d.is_sign_negative())
            && !d.is_nan()
        {
            Value::Integer(d as i32)
        } else {
            Value::Number(d)
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Value::Boolean(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Number(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Number(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_js_string(&self) -> Option<&JSString> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&JSObjectPtr> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Value {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Value {
        Value::int_or_number(d)
    }
}

impl From<JSString> for Value {
    fn from(s: JSString) -> Value {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::String(JSString::intern(s))
    }
}

/// Data-only rendering for diagnostics and `Display`. Never runs user code:
/// error objects are summarized from their own `name`/`message` data
/// properties, everything else by class.
pub fn value_brief(val: &Value) -> String {
    match val {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(n) => n.to_string(),
        Value::Number(d) => crate::core::number_to_string(*d),
        Value::String(s) => s.to_rust_string(),
        Value::Object(obj) => {
            let data_prop = |name: &str| -> Option<Value> { get_own_property(obj, &JSString::intern(name)).map(|p| p.value) };
            let class = {
                let borrowed = obj.borrow();
                match &borrowed.data {
                    ObjectData::Function(_) => Some("Function"),
                    ObjectData::Array { .. } => Some("Array"),
                    ObjectData::RegExp(_) => Some("RegExp"),
                    ObjectData::Date { .. } => Some("Date"),
                    _ => None,
                }
            };
            if let Some(class) = class {
                return format!("[object {class}]");
            }
            // Error-shaped objects print as "name: message".
            if let Some(Value::String(name)) = data_prop("name") {
                let message = match data_prop("message") {
                    Some(Value::String(m)) => m.to_rust_string(),
                    _ => String::new(),
                };
                if message.is_empty() {
                    return name.to_rust_string();
                }
                return format!("{name}: {message}");
            }
            "[object Object]".to_string()
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", value_brief(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_or_number_canonicalizes() {
        assert!(matches!(Value::int_or_number(3.0), Value::Integer(3)));
        assert!(matches!(Value::int_or_number(2.5), Value::Number(_)));
        assert!(matches!(Value::int_or_number(f64::NAN), Value::Number(_)));
        // negative zero must stay a double so its sign survives
        assert!(matches!(Value::int_or_number(-0.0), Value::Number(_)));
        assert!(matches!(Value::int_or_number(4294967296.0), Value::Number(_)));
    }

    #[test]
    fn brief_rendering() {
        assert_eq!(value_brief(&Value::Undefined), "undefined");
        assert_eq!(value_brief(&Value::Integer(42)), "42");
        assert_eq!(value_brief(&Value::from("hi")), "hi");
    }
}
