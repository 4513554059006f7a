use rand::Rng;

use crate::{
    diagnostics::{Result, SkribeError},
    registry::{Parameter, Registry, TypeDef},
    value::{Value, ValueKind},
};

pub fn install_types(registry: &Registry) {
    registry.register_type(TypeDef::new("object", |value| Ok(value.clone())));
    registry.register_type(TypeDef::new("number", to_number));
    registry.register_type(TypeDef::new("text", to_text));
    registry.register_type(TypeDef::new("boolean", to_boolean));
    registry.register_type(TypeDef::new("list", to_list));
}

pub fn install_functions(registry: &Registry) {
    registry.register_function(
        "print",
        vec![Parameter::required("message", "text")],
        builtin_print,
    );
    registry.register_function(
        "random",
        vec![
            Parameter::required("min", "number"),
            Parameter::required("max", "number"),
        ],
        builtin_random,
    );
}

fn builtin_print(registry: &Registry, args: &[Value]) -> Result<Value> {
    let message = match args.first() {
        Some(value) if !value.is_null() => value.to_string(),
        _ => String::new(),
    };
    registry.logger().info(&message);
    Ok(Value::null())
}

fn builtin_random(_registry: &Registry, args: &[Value]) -> Result<Value> {
    let (min, max) = match args {
        [min, max] => (min.as_number(), max.as_number()),
        _ => (None, None),
    };
    let (Some(min), Some(max)) = (min, max) else {
        return Err(SkribeError::native("random", "expected two numbers"));
    };
    if min.is_nan() || max.is_nan() {
        return Err(SkribeError::native("random", "bounds must not be NaN"));
    }
    // A reversed range is swapped; an empty one yields its bound.
    let (low, high) = if min <= max { (min, max) } else { (max, min) };
    if low == high {
        return Ok(Value::number(low));
    }
    Ok(Value::number(rand::thread_rng().gen_range(low..high)))
}

fn to_number(value: &Value) -> std::result::Result<Value, String> {
    match value.kind() {
        ValueKind::Number(_) => Ok(value.clone()),
        ValueKind::Text(text) => text
            .trim()
            .parse::<f64>()
            .map(Value::number)
            .map_err(|err| format!("`{text}` is not a number ({err})")),
        ValueKind::Boolean(b) => Ok(Value::number(if *b { 1.0 } else { 0.0 })),
        _ => Err(format!("{} cannot be used as a number", value.type_name())),
    }
}

fn to_text(value: &Value) -> std::result::Result<Value, String> {
    match value.kind() {
        ValueKind::Text(_) => Ok(value.clone()),
        ValueKind::Number(_) | ValueKind::Boolean(_) => Ok(Value::text(value.to_string())),
        _ => Err(format!("{} cannot be used as text", value.type_name())),
    }
}

fn to_boolean(value: &Value) -> std::result::Result<Value, String> {
    match value.kind() {
        ValueKind::Boolean(_) => Ok(value.clone()),
        ValueKind::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Value::bool(true)),
            "false" => Ok(Value::bool(false)),
            _ => Err(format!("`{text}` is not a boolean")),
        },
        ValueKind::Number(n) => Ok(Value::bool(*n != 0.0)),
        _ => Err(format!("{} cannot be used as a boolean", value.type_name())),
    }
}

fn to_list(value: &Value) -> std::result::Result<Value, String> {
    match value.kind() {
        ValueKind::List(_) => Ok(value.clone()),
        _ => Err(format!("{} is not a list", value.type_name())),
    }
}
