use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::{Rc, Weak};

use crate::JSError;
use crate::core::{Context, ContextInner, EnvPtr, Hint, JSString, Script, Value, ast::FunctionNode, heap, to_number};
use crate::js_error::throw_type_error;
use crate::js_regexp::RegExpData;

pub type JSObjectPtr = Rc<RefCell<JSObject>>;

/// Native built-in entry point. `this` is `None` only on construct-entry.
/// User arguments start at `args[0]`.
pub type NativeFn = fn(&Context, Option<&Value>, &[Value]) -> Result<Value, JSError>;

pub struct JSObject {
    pub proto: Option<JSObjectPtr>,
    pub props: IndexMap<JSString, Property>,
    pub extensible: bool,
    pub data: ObjectData,
}

/// The host-data slot discriminating exotic object behaviors.
pub enum ObjectData {
    Ordinary,
    Function(Rc<FunctionData>),
    Array { length: u32 },
    StringWrap(JSString),
    NumberWrap(f64),
    BooleanWrap(bool),
    Date { ms: f64 },
    RegExp(Rc<RegExpData>),
    Context(Weak<ContextInner>),
}

/// One property slot. `value` holds the data value, or the getter when
/// `accessor` is set; `set` is meaningful only for accessors.
#[derive(Clone)]
pub struct Property {
    pub value: Value,
    pub set: Option<Value>,
    pub accessor: bool,
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

impl Property {
    /// Plain data property with default attributes (writable, enumerable,
    /// configurable).
    pub fn data(value: Value) -> Property {
        Property {
            value,
            set: None,
            accessor: false,
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    pub fn with_flags(value: Value, writable: bool, enumerable: bool, configurable: bool) -> Property {
        Property {
            value,
            set: None,
            accessor: false,
            writable,
            enumerable,
            configurable,
        }
    }
}

pub struct FunctionData {
    pub name: Option<JSString>,
    pub kind: FunctionKind,
}

pub enum FunctionKind {
    Native(NativeFn),
    Script(Rc<ScriptFunction>),
}

/// A user function: its AST node, the environment it closed over, and the
/// script that owns the node's string table.
pub struct ScriptFunction {
    pub code: Rc<FunctionNode>,
    pub scope: EnvPtr,
    pub script: Rc<Script>,
    pub strict: bool,
}

impl JSObject {
    fn new(proto: Option<JSObjectPtr>) -> JSObject {
        heap::note_object_created();
        JSObject {
            proto,
            props: IndexMap::new(),
            extensible: true,
            data: ObjectData::Ordinary,
        }
    }
}

impl Drop for JSObject {
    fn drop(&mut self) {
        heap::note_object_dropped();
    }
}

impl std::fmt::Debug for JSObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "JSObject {{ props: {}, proto: {}, data: {} }}",
            self.props.len(),
            self.proto.is_some(),
            match &self.data {
                ObjectData::Ordinary => "ordinary",
                ObjectData::Function(_) => "function",
                ObjectData::Array { .. } => "array",
                ObjectData::StringWrap(_) => "string",
                ObjectData::NumberWrap(_) => "number",
                ObjectData::BooleanWrap(_) => "boolean",
                ObjectData::Date { .. } => "date",
                ObjectData::RegExp(_) => "regexp",
                ObjectData::Context(_) => "context",
            }
        )
    }
}

pub fn new_object(proto: Option<JSObjectPtr>) -> JSObjectPtr {
    Rc::new(RefCell::new(JSObject::new(proto)))
}

/// A property name is an array index iff it is the canonical base-10 form
/// of an integer below 2^32 - 1.
pub fn array_index(name: &JSString) -> Option<u32> {
    let units = name.units();
    if units.is_empty() {
        return None;
    }
    let first = units[0];
    if first == '0' as u16 {
        return if units.len() == 1 { Some(0) } else { None };
    }
    if !(first >= '1' as u16 && first <= '9' as u16) {
        return None;
    }
    let mut index: u64 = (first - '0' as u16) as u64;
    for &ch in &units[1..] {
        if !(ch >= '0' as u16 && ch <= '9' as u16) {
            return None;
        }
        index = index * 10 + (ch - '0' as u16) as u64;
        if index >= u32::MAX as u64 {
            return None;
        }
    }
    Some(index as u32)
}

pub fn index_string(n: u32) -> JSString {
    JSString::intern(&n.to_string())
}

pub fn get_own_property(obj: &JSObjectPtr, name: &JSString) -> Option<Property> {
    obj.borrow().props.get(name).cloned()
}

/// 8.12.2-style lookup: the receiver, then the prototype chain. Guards
/// against prototype cycles.
pub fn get_property(obj: &JSObjectPtr, name: &JSString) -> Option<Property> {
    let mut visited: HashSet<*const RefCell<JSObject>> = HashSet::new();
    let mut current = Some(obj.clone());
    while let Some(cur) = current {
        let ptr = Rc::as_ptr(&cur);
        if !visited.insert(ptr) {
            log::error!("prototype chain cycle detected at {ptr:p}");
            return None;
        }
        if let Some(desc) = cur.borrow().props.get(name) {
            return Some(desc.clone());
        }
        current = cur.borrow().proto.clone();
    }
    None
}

/// 8.12.3 [[Get]], with the string-exotic index path consulted first.
pub fn obj_get(ctx: &Context, obj: &JSObjectPtr, name: &JSString) -> Result<Value, JSError> {
    let wrapped = match &obj.borrow().data {
        ObjectData::StringWrap(s) => Some(s.clone()),
        _ => None,
    };
    if let Some(s) = wrapped
        && let Some(index) = array_index(name)
    {
        return Ok(if (index as usize) < s.len() {
            Value::String(s.substring(index as usize, index as usize + 1))
        } else {
            Value::Undefined
        });
    }

    let Some(desc) = get_property(obj, name) else {
        return Ok(Value::Undefined);
    };
    get_with_descriptor(ctx, obj, &desc)
}

/// Reads through a descriptor; accessor getters run with `this` bound to
/// the original receiver.
pub fn get_with_descriptor(ctx: &Context, receiver: &JSObjectPtr, desc: &Property) -> Result<Value, JSError> {
    if !desc.accessor {
        return Ok(desc.value.clone());
    }
    match &desc.value {
        Value::Object(getter) if is_callable(&desc.value) => obj_call(ctx, getter, Value::Object(receiver.clone()), &[]),
        _ => Ok(Value::Undefined),
    }
}

fn reject_put(ctx: &Context, do_throw: bool, name: &JSString) -> Result<(), JSError> {
    if do_throw {
        Err(throw_type_error(ctx, &format!("cannot assign to property '{name}'")))
    } else {
        Ok(())
    }
}

/// 8.12.4/8.12.5 CanPut/Put: own writable data is overwritten, accessors
/// dispatch to their setter on the receiver, inherited writable data is
/// shadowed, everything else fails (TypeError when `do_throw`).
pub fn obj_put(ctx: &Context, obj: &JSObjectPtr, name: &JSString, v: Value, do_throw: bool) -> Result<(), JSError> {
    let is_array = matches!(obj.borrow().data, ObjectData::Array { .. });

    if let Some(own) = get_own_property(obj, name) {
        if !own.accessor && own.writable {
            if is_array {
                return define_own_array_property(ctx, obj, name, v);
            }
            if let Some(slot) = obj.borrow_mut().props.get_mut(name) {
                slot.value = v;
            }
            return Ok(());
        }
        if own.accessor
            && let Some(Value::Object(setter)) = &own.set
            && matches!(setter.borrow().data, ObjectData::Function(_))
        {
            let setter = setter.clone();
            obj_call(ctx, &setter, Value::Object(obj.clone()), &[v])?;
            return Ok(());
        }
        return reject_put(ctx, do_throw, name);
    }

    let inherited = {
        let proto = obj.borrow().proto.clone();
        match proto {
            Some(p) => get_property(&p, name),
            None => None,
        }
    };

    let creatable = match &inherited {
        None => true,
        Some(d) => !d.accessor && d.writable,
    };
    if creatable {
        if !obj.borrow().extensible {
            return reject_put(ctx, do_throw, name);
        }
        if is_array {
            return define_own_array_property(ctx, obj, name, v);
        }
        obj.borrow_mut().props.insert(name.clone(), Property::data(v));
        return Ok(());
    }

    if let Some(d) = &inherited
        && d.accessor
        && let Some(Value::Object(setter)) = &d.set
        && matches!(setter.borrow().data, ObjectData::Function(_))
    {
        let setter = setter.clone();
        obj_call(ctx, &setter, Value::Object(obj.clone()), &[v])?;
        return Ok(());
    }

    reject_put(ctx, do_throw, name)
}

/// 15.4.5.1 [[DefineOwnProperty]] for array exotics: `length` writes
/// truncate, index writes promote `length` to `max(length, index + 1)`.
pub fn define_own_array_property(ctx: &Context, obj: &JSObjectPtr, name: &JSString, v: Value) -> Result<(), JSError> {
    let length_atom = JSString::intern("length");
    if *name == length_atom {
        let d = to_number(ctx, &v)?;
        let new_len = d as u32;
        if new_len as f64 != d {
            return Err(throw_type_error(ctx, "invalid array length"));
        }
        let old_len = array_length(obj).unwrap_or(0);
        if new_len < old_len {
            let doomed: Vec<JSString> = obj
                .borrow()
                .props
                .keys()
                .filter(|k| array_index(k).is_some_and(|i| i >= new_len))
                .cloned()
                .collect();
            let mut borrowed = obj.borrow_mut();
            for key in doomed {
                borrowed.props.shift_remove(&key);
            }
        }
        set_array_length(obj, new_len);
        return Ok(());
    }

    upsert_data_value(obj, name, v);
    if let Some(index) = array_index(name) {
        let len = array_length(obj).unwrap_or(0);
        if index >= len {
            set_array_length(obj, index + 1);
        }
    }
    Ok(())
}

fn upsert_data_value(obj: &JSObjectPtr, name: &JSString, v: Value) {
    let mut borrowed = obj.borrow_mut();
    borrowed
        .props
        .entry(name.clone())
        .and_modify(|slot| slot.value = v.clone())
        .or_insert_with(|| Property::data(v.clone()));
}

pub fn array_length(obj: &JSObjectPtr) -> Option<u32> {
    match obj.borrow().data {
        ObjectData::Array { length } => Some(length),
        _ => None,
    }
}

fn set_array_length(obj: &JSObjectPtr, new_len: u32) {
    let mut borrowed = obj.borrow_mut();
    borrowed.data = ObjectData::Array { length: new_len };
    let value = Value::int_or_number(new_len as f64);
    borrowed
        .props
        .entry(JSString::intern("length"))
        .and_modify(|slot| slot.value = value.clone())
        .or_insert_with(|| Property::with_flags(value.clone(), true, false, false));
}

/// 8.12.7 [[Delete]]: removes a configurable own property; `delete` on a
/// non-configurable one fails silently or throws per `do_throw`.
pub fn obj_delete(ctx: &Context, obj: &JSObjectPtr, name: &JSString, do_throw: bool) -> Result<bool, JSError> {
    let configurable = match obj.borrow().props.get(name) {
        None => return Ok(true),
        Some(desc) => desc.configurable,
    };
    if !configurable {
        if do_throw {
            return Err(throw_type_error(ctx, &format!("cannot delete property '{name}'")));
        }
        return Ok(false);
    }
    obj.borrow_mut().props.shift_remove(name);
    Ok(true)
}

/// Replaces any existing slot wholesale; no writability checks. Used by the
/// built-in installers and `Object.defineProperty`.
pub fn define_data_property(obj: &JSObjectPtr, name: &JSString, v: Value, writable: bool, enumerable: bool, configurable: bool) {
    obj.borrow_mut()
        .props
        .insert(name.clone(), Property::with_flags(v, writable, enumerable, configurable));
}

/// Installs or merges one half of an accessor pair (object-literal `get` /
/// `set` and `Object.defineProperty` both funnel through here).
pub fn define_accessor_property(obj: &JSObjectPtr, name: &JSString, getter: Option<Value>, setter: Option<Value>) {
    let mut borrowed = obj.borrow_mut();
    let slot = borrowed.props.entry(name.clone()).or_insert(Property {
        value: Value::Undefined,
        set: None,
        accessor: true,
        writable: false,
        enumerable: true,
        configurable: true,
    });
    slot.accessor = true;
    slot.writable = false;
    if let Some(g) = getter {
        slot.value = g;
    }
    if let Some(s) = setter {
        slot.set = Some(s);
    }
}

/// 8.12.8 [[DefaultValue]]: `toString`/`valueOf` in hint order; Date
/// instances default to the String hint. Two object results are a TypeError.
pub fn obj_default_value(ctx: &Context, obj: &JSObjectPtr, hint: Hint) -> Result<Value, JSError> {
    let hint = match hint {
        Hint::None => {
            if matches!(obj.borrow().data, ObjectData::Date { .. }) {
                Hint::String
            } else {
                Hint::Number
            }
        }
        h => h,
    };
    let order: [&str; 2] = match hint {
        Hint::String => ["toString", "valueOf"],
        _ => ["valueOf", "toString"],
    };
    for method in order {
        let func = obj_get(ctx, obj, &JSString::intern(method))?;
        if let Value::Object(fobj) = &func
            && is_callable(&func)
        {
            let result = obj_call(ctx, fobj, Value::Object(obj.clone()), &[])?;
            if !result.is_object() {
                return Ok(result);
            }
        }
    }
    Err(throw_type_error(ctx, "cannot convert object to primitive value"))
}

pub fn is_callable(v: &Value) -> bool {
    match v {
        Value::Object(o) => matches!(o.borrow().data, ObjectData::Function(_)),
        _ => false,
    }
}

pub fn function_data(obj: &JSObjectPtr) -> Option<Rc<FunctionData>> {
    match &obj.borrow().data {
        ObjectData::Function(fd) => Some(fd.clone()),
        _ => None,
    }
}

/// [[Call]]: dispatches to native code or to the evaluator. For non-strict
/// user functions a nullish `this` becomes the global object and primitives
/// are wrapped (10.4.3).
pub fn obj_call(ctx: &Context, func: &JSObjectPtr, this_val: Value, args: &[Value]) -> Result<Value, JSError> {
    let Some(fd) = function_data(func) else {
        return Err(throw_type_error(ctx, "not a function"));
    };
    match &fd.kind {
        FunctionKind::Native(native) => native(ctx, Some(&this_val), args),
        FunctionKind::Script(sf) => {
            let this_val = if sf.strict {
                this_val
            } else {
                match this_val {
                    Value::Undefined | Value::Null => Value::Object(ctx.global()),
                    v => Value::Object(crate::core::to_object(ctx, &v)?),
                }
            };
            crate::core::call_script_function(ctx, sf, this_val, args)
        }
    }
}

/// 13.2.2 [[Construct]]: a fresh object inheriting `callee.prototype` (or
/// `Object.prototype` when that is not an object); an object return value
/// from the body wins over the fresh object.
pub fn obj_construct(ctx: &Context, func: &JSObjectPtr, args: &[Value]) -> Result<Value, JSError> {
    let Some(fd) = function_data(func) else {
        return Err(throw_type_error(ctx, "not a constructor"));
    };
    match &fd.kind {
        FunctionKind::Native(native) => native(ctx, None, args),
        FunctionKind::Script(sf) => {
            let proto_val = obj_get(ctx, func, &JSString::intern("prototype"))?;
            let proto = match proto_val {
                Value::Object(p) => p,
                _ => ctx.object_proto(),
            };
            let this_obj = new_object(Some(proto));
            let result = crate::core::call_script_function(ctx, sf, Value::Object(this_obj.clone()), args)?;
            Ok(match result {
                v @ Value::Object(_) => v,
                _ => Value::Object(this_obj),
            })
        }
    }
}

pub fn new_native_function(ctx: &Context, name: &str, native: NativeFn) -> JSObjectPtr {
    let obj = new_object(Some(ctx.function_proto()));
    obj.borrow_mut().data = ObjectData::Function(Rc::new(FunctionData {
        name: Some(JSString::intern(name)),
        kind: FunctionKind::Native(native),
    }));
    obj
}

pub fn new_array(ctx: &Context, elements: &[Value]) -> JSObjectPtr {
    let obj = new_object(Some(ctx.array_proto()));
    obj.borrow_mut().data = ObjectData::Array { length: 0 };
    set_array_length(&obj, elements.len() as u32);
    for (i, v) in elements.iter().enumerate() {
        obj.borrow_mut().props.insert(index_string(i as u32), Property::data(v.clone()));
    }
    obj
}

pub fn new_string_object(ctx: &Context, s: JSString) -> JSObjectPtr {
    let obj = new_object(Some(ctx.string_proto()));
    let len = s.len();
    obj.borrow_mut().data = ObjectData::StringWrap(s);
    define_data_property(
        &obj,
        &JSString::intern("length"),
        Value::int_or_number(len as f64),
        false,
        false,
        false,
    );
    obj
}

pub fn new_number_object(ctx: &Context, d: f64) -> JSObjectPtr {
    let obj = new_object(Some(ctx.number_proto()));
    obj.borrow_mut().data = ObjectData::NumberWrap(d);
    obj
}

pub fn new_boolean_object(ctx: &Context, b: bool) -> JSObjectPtr {
    let obj = new_object(Some(ctx.boolean_proto()));
    obj.borrow_mut().data = ObjectData::BooleanWrap(b);
    obj
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_index_is_canonical_only() {
        assert_eq!(array_index(&JSString::intern("0")), Some(0));
        assert_eq!(array_index(&JSString::intern("42")), Some(42));
        assert_eq!(array_index(&JSString::intern("01")), None);
        assert_eq!(array_index(&JSString::intern("")), None);
        assert_eq!(array_index(&JSString::intern("1a")), None);
        assert_eq!(array_index(&JSString::intern("-1")), None);
        // 2^32 - 1 is not a valid array index; 2^32 - 2 is
        assert_eq!(array_index(&JSString::intern("4294967295")), None);
        assert_eq!(array_index(&JSString::intern("4294967294")), Some(4294967294));
    }

    #[test]
    fn index_string_round_trips() {
        for n in [0u32, 7, 10, 4096, 4294967294] {
            assert_eq!(array_index(&index_string(n)), Some(n));
        }
    }

    #[test]
    fn property_order_is_insertion_order() {
        let obj = new_object(None);
        for name in ["x", "y", "z"] {
            obj.borrow_mut()
                .props
                .insert(JSString::intern(name), Property::data(Value::Integer(1)));
        }
        let keys: Vec<String> = obj.borrow().props.keys().map(|k| k.to_rust_string()).collect();
        assert_eq!(keys, ["x", "y", "z"]);
    }
}
