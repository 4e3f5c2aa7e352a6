//! A small tree-walking interpreter for a subset of third-edition
//! ECMAScript: parser, object model, evaluator and the standard built-ins.

pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod js_array;
pub(crate) mod js_boolean;
pub(crate) mod js_date;
pub(crate) mod js_error;
pub(crate) mod js_function;
pub(crate) mod js_math;
pub(crate) mod js_number;
pub(crate) mod js_object;
pub(crate) mod js_regexp;
pub(crate) mod js_std;
pub(crate) mod js_string;
pub(crate) mod repl;

pub use core::{
    Context, JSObject, JSObjectPtr, JSString, MemInfo, ObjectData, Property, Script, Value, evaluate_script, gc, init, meminfo,
    parse_script,
};
pub use error::JSError;
pub use repl::Repl;
