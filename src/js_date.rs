use chrono::{DateTime, TimeZone, Utc};

use crate::JSError;
use crate::core::{
    Context, Hint, JSString, ObjectData, Value, install_constructor, install_native, new_object, to_number, to_primitive,
};
use crate::js_error::throw_type_error;

/// 15.9: the Date constructor and Date.prototype. Time values are
/// milliseconds since the epoch, UTC only.
pub fn init(ctx: &Context) {
    let proto = ctx.date_proto();
    install_native(ctx, &proto, "getTime", date_prototype_get_time);
    install_native(ctx, &proto, "toString", date_prototype_to_string);
    install_constructor(ctx, "Date", date_construct, &proto);
}

fn now_ms() -> f64 {
    Utc::now().timestamp_millis() as f64
}

fn new_date_object(ctx: &Context, ms: f64) -> Value {
    let obj = new_object(Some(ctx.date_proto()));
    obj.borrow_mut().data = ObjectData::Date { ms };
    Value::Object(obj)
}

fn render(ms: f64) -> String {
    if ms.is_nan() {
        return "Invalid Date".to_string();
    }
    match Utc.timestamp_millis_opt(ms as i64).single() {
        Some(dt) => dt.format("%a %b %d %Y %H:%M:%S GMT+0000").to_string(),
        None => "Invalid Date".to_string(),
    }
}

// 15.9.2 / 15.9.3: as a function Date ignores its arguments and renders
// the current time; as a constructor it accepts nothing (now), one value
// (milliseconds or a parseable string), or year/month/day... fields.
fn date_construct(ctx: &Context, this: Option<&Value>, args: &[Value]) -> Result<Value, JSError> {
    if this.is_some() {
        return Ok(Value::String(JSString::intern(&render(now_ms()))));
    }
    let ms = match args.len() {
        0 => now_ms(),
        1 => {
            let prim = to_primitive(ctx, &args[0], Hint::None)?;
            if let Value::String(s) = &prim {
                parse_date_string(&s.to_rust_string())
            } else {
                to_number(ctx, &prim)?
            }
        }
        _ => fields_to_ms(ctx, args)?,
    };
    Ok(new_date_object(ctx, ms))
}

fn parse_date_string(s: &str) -> f64 {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.timestamp_millis() as f64;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return dt.timestamp_millis() as f64;
    }
    f64::NAN
}

// 15.9.3.1 new Date (year, month [, date [, hours [, minutes [, seconds
// [, ms ]]]]])
fn fields_to_ms(ctx: &Context, args: &[Value]) -> Result<f64, JSError> {
    let mut fields = [0.0f64; 7];
    fields[2] = 1.0; // day of month defaults to 1
    for (i, slot) in fields.iter_mut().enumerate() {
        if let Some(arg) = args.get(i)
            && !arg.is_undefined()
        {
            *slot = to_number(ctx, arg)?;
        }
    }
    if fields.iter().any(|f| !f.is_finite()) {
        return Ok(f64::NAN);
    }
    let year = fields[0] as i32;
    let month = fields[1] as u32;
    let result = Utc
        .with_ymd_and_hms(
            year + if month >= 12 { (month / 12) as i32 } else { 0 },
            (month % 12) + 1,
            fields[2] as u32,
            fields[3] as u32,
            fields[4] as u32,
            fields[5] as u32,
        )
        .single();
    Ok(match result {
        Some(dt) => dt.timestamp_millis() as f64 + fields[6],
        None => f64::NAN,
    })
}

fn this_date_ms(ctx: &Context, this: Option<&Value>) -> Result<f64, JSError> {
    if let Some(Value::Object(obj)) = this
        && let ObjectData::Date { ms } = obj.borrow().data
    {
        return Ok(ms);
    }
    Err(throw_type_error(ctx, "receiver is not a Date"))
}

// 15.9.5.9 Date.prototype.getTime ( )
fn date_prototype_get_time(ctx: &Context, this: Option<&Value>, _args: &[Value]) -> Result<Value, JSError> {
    Ok(Value::int_or_number(this_date_ms(ctx, this)?))
}

// 15.9.5.2 Date.prototype.toString ( )
fn date_prototype_to_string(ctx: &Context, this: Option<&Value>, _args: &[Value]) -> Result<Value, JSError> {
    let ms = this_date_ms(ctx, this)?;
    Ok(Value::String(JSString::intern(&render(ms))))
}
