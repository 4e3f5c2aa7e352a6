use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

use crate::JSError;
use crate::core::{Context, JSObjectPtr, JSString, Value, get_property, obj_delete, obj_get, obj_put};
use crate::js_error::throw_type_error;

pub type EnvPtr = Rc<RefCell<Environment>>;

/// One lexical frame: either a declarative name → binding map, or a wrapper
/// around a target object whose properties are the bindings.
pub struct Environment {
    pub kind: EnvKind,
    pub outer: Option<EnvPtr>,
}

pub enum EnvKind {
    Declarative(IndexMap<JSString, Binding>),
    Object { bindings: JSObjectPtr, provide_this: bool },
}

pub struct Binding {
    pub value: Value,
    pub immutable: bool,
    pub deletable: bool,
}

pub fn new_declarative_env(outer: Option<EnvPtr>) -> EnvPtr {
    Rc::new(RefCell::new(Environment {
        kind: EnvKind::Declarative(IndexMap::new()),
        outer,
    }))
}

pub fn new_object_env(bindings: JSObjectPtr, provide_this: bool, outer: Option<EnvPtr>) -> EnvPtr {
    Rc::new(RefCell::new(Environment {
        kind: EnvKind::Object { bindings, provide_this },
        outer,
    }))
}

pub fn env_has_binding(env: &EnvPtr, name: &JSString) -> bool {
    match &env.borrow().kind {
        EnvKind::Declarative(bindings) => bindings.contains_key(name),
        EnvKind::Object { bindings, .. } => get_property(bindings, name).is_some(),
    }
}

/// Reads a binding from this single frame; object-backed frames may run
/// getters on the target object.
pub fn env_get_value(ctx: &Context, env: &EnvPtr, name: &JSString) -> Result<Option<Value>, JSError> {
    let target = match &env.borrow().kind {
        EnvKind::Declarative(bindings) => return Ok(bindings.get(name).map(|b| b.value.clone())),
        EnvKind::Object { bindings, .. } => {
            if get_property(bindings, name).is_none() {
                return Ok(None);
            }
            bindings.clone()
        }
    };
    Ok(Some(obj_get(ctx, &target, name)?))
}

/// Writes a binding in this single frame if it exists. Returns whether it
/// was found; writing an immutable binding throws in strict mode and is
/// ignored otherwise.
pub fn env_set_if_found(ctx: &Context, env: &EnvPtr, name: &JSString, v: Value, strict: bool) -> Result<bool, JSError> {
    let target = match &mut env.borrow_mut().kind {
        EnvKind::Declarative(bindings) => match bindings.get_mut(name) {
            None => return Ok(false),
            Some(binding) => {
                if binding.immutable {
                    if strict {
                        return Err(throw_type_error(ctx, &format!("assignment to constant '{name}'")));
                    }
                } else {
                    binding.value = v;
                }
                return Ok(true);
            }
        },
        EnvKind::Object { bindings, .. } => {
            if get_property(bindings, name).is_none() {
                return Ok(false);
            }
            bindings.clone()
        }
    };
    obj_put(ctx, &target, name, v, strict)?;
    Ok(true)
}

/// Creates a binding in this frame; a no-op when one already exists.
/// Object-backed frames delegate to the target object's property API.
pub fn env_create_binding(
    ctx: &Context,
    env: &EnvPtr,
    name: &JSString,
    v: Value,
    immutable: bool,
    deletable: bool,
) -> Result<(), JSError> {
    let target = match &mut env.borrow_mut().kind {
        EnvKind::Declarative(bindings) => {
            if !bindings.contains_key(name) {
                bindings.insert(
                    name.clone(),
                    Binding {
                        value: v,
                        immutable,
                        deletable,
                    },
                );
            }
            return Ok(());
        }
        EnvKind::Object { bindings, .. } => bindings.clone(),
    };
    obj_put(ctx, &target, name, v, false)
}

/// Removes a deletable binding from this frame; absent bindings delete
/// successfully, non-deletable ones do not.
pub fn env_delete_binding(ctx: &Context, env: &EnvPtr, name: &JSString) -> Result<bool, JSError> {
    let target = match &mut env.borrow_mut().kind {
        EnvKind::Declarative(bindings) => {
            return match bindings.get(name) {
                None => Ok(true),
                Some(b) if !b.deletable => Ok(false),
                Some(_) => {
                    bindings.shift_remove(name);
                    Ok(true)
                }
            };
        }
        EnvKind::Object { bindings, .. } => bindings.clone(),
    };
    obj_delete(ctx, &target, name, false)
}
