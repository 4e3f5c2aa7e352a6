use std::cell::Cell;

use crate::JSError;
use crate::core::{Context, JSString, Value, define_data_property, install_native, new_object, to_number};
use crate::js_error::throw_type_error;

/// 15.8: the Math object.
pub fn init(ctx: &Context) {
    let math = new_object(Some(ctx.object_proto()));
    install_native(ctx, &math, "floor", math_floor);
    install_native(ctx, &math, "log", math_log);
    install_native(ctx, &math, "pow", math_pow);
    install_native(ctx, &math, "random", math_random);
    define_data_property(&ctx.global(), &JSString::intern("Math"), Value::Object(math), true, false, true);
}

fn arg_number(ctx: &Context, args: &[Value], index: usize) -> Result<f64, JSError> {
    to_number(ctx, args.get(index).unwrap_or(&Value::Undefined))
}

fn require_call(ctx: &Context, this: Option<&Value>) -> Result<(), JSError> {
    if this.is_none() {
        return Err(throw_type_error(ctx, "not a constructor"));
    }
    Ok(())
}

// 15.8.2.9 Math.floor (x): small ints are already their own floor.
fn math_floor(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    require_call(ctx, this)?;
    if let Some(Value::Integer(n)) = args.first() {
        return Ok(Value::Integer(*n));
    }
    Ok(Value::int_or_number(arg_number(ctx, args, 0)?.floor()))
}

// 15.8.2.10 Math.log (x)
fn math_log(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    require_call(ctx, this)?;
    Ok(Value::Number(arg_number(ctx, args, 0)?.ln()))
}

// 15.8.2.13 Math.pow (x, y)
fn math_pow(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    require_call(ctx, this)?;
    let x = arg_number(ctx, args, 0)?;
    let y = arg_number(ctx, args, 1)?;
    Ok(Value::int_or_number(x.powf(y)))
}

thread_local! {
    static RANDOM_STATE: Cell<u64> = const { Cell::new(0) };
}

// 15.8.2.14 Math.random ( ): xorshift64*, seeded lazily from the clock.
fn math_random(ctx: &Context, this: Option<&Value>, _args: &[Value]) -> Result<Value, JSError> {
    require_call(ctx, this)?;
    let bits = RANDOM_STATE.with(|state| {
        let mut x = state.get();
        if x == 0 {
            x = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0x9e3779b97f4a7c15)
                | 1;
        }
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        state.set(x);
        x
    });
    Ok(Value::Number((bits >> 11) as f64 / (1u64 << 53) as f64))
}
