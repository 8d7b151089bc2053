use crate::builtins::datetime;
use crate::evaluator::{
    ExpressionEvaluator, ReturnType, apply, apply_with_error, apply_with_options_and_error,
    type_name, validate_any, validate_arity, verify_string,
};
use crate::registry::FunctionRegistry;
use crate::value::Value;

/// One-argument type test, total over every input.
fn type_predicate(name: &str, test: fn(&Value) -> bool) -> ExpressionEvaluator {
    ExpressionEvaluator::new(
        name,
        apply(move |args| Value::Boolean(test(&args[0])), None),
        ReturnType::BOOLEAN,
        validate_arity(1, Some(1)),
    )
}

pub fn register(registry: &mut FunctionRegistry) {
    // ========================================
    // Conversions
    // ========================================

    registry.register(ExpressionEvaluator::new(
        "string",
        apply_with_options_and_error(
            |args, options| {
                let rendered = match &args[0] {
                    Value::Null => String::new(),
                    Value::Array(items) => items
                        .iter()
                        .map(|v| v.as_string())
                        .collect::<Vec<_>>()
                        .join(&options.list_separator),
                    other => other.as_string(),
                };
                Ok(Value::String(rendered))
            },
            None,
        ),
        ReturnType::STRING,
        validate_arity(1, Some(1)),
    ));
    registry.register(ExpressionEvaluator::new(
        "int",
        apply_with_error(
            |args| match &args[0] {
                Value::Integer(n) => Ok(Value::Integer(*n)),
                Value::Float(f) => Ok(Value::Integer(*f as i64)),
                Value::String(s) => {
                    let trimmed = s.trim();
                    if let Ok(n) = trimmed.parse::<i64>() {
                        Ok(Value::Integer(n))
                    } else if let Ok(f) = trimmed.parse::<f64>() {
                        Ok(Value::Integer(f as i64))
                    } else {
                        Err(format!("'{}' cannot be converted to an integer", s))
                    }
                }
                other => Err(format!("Cannot convert {} to an integer", type_name(other))),
            },
            None,
        ),
        ReturnType::NUMBER,
        validate_arity(1, Some(1)),
    ));
    registry.register(ExpressionEvaluator::new(
        "float",
        apply_with_error(
            |args| match &args[0] {
                Value::Integer(n) => Ok(Value::Float(*n as f64)),
                Value::Float(f) => Ok(Value::Float(*f)),
                Value::String(s) => match s.trim().parse::<f64>() {
                    Ok(f) => Ok(Value::Float(f)),
                    Err(_) => Err(format!("'{}' cannot be converted to a number", s)),
                },
                other => Err(format!("Cannot convert {} to a number", type_name(other))),
            },
            None,
        ),
        ReturnType::NUMBER,
        validate_arity(1, Some(1)),
    ));
    registry.register(ExpressionEvaluator::new(
        "bool",
        apply_with_error(
            |args| match &args[0] {
                Value::Null => Ok(Value::Boolean(false)),
                Value::Boolean(b) => Ok(Value::Boolean(*b)),
                Value::Integer(n) => Ok(Value::Boolean(*n != 0)),
                Value::Float(f) => Ok(Value::Boolean(*f != 0.0)),
                Value::String(s) => match s.to_lowercase().as_str() {
                    "true" => Ok(Value::Boolean(true)),
                    "false" => Ok(Value::Boolean(false)),
                    _ => Err(format!("'{}' cannot be converted to a boolean", s)),
                },
                other => Err(format!("Cannot convert {} to a boolean", type_name(other))),
            },
            None,
        ),
        ReturnType::BOOLEAN,
        validate_arity(1, Some(1)),
    ));
    registry.register(ExpressionEvaluator::new(
        "json",
        apply_with_error(
            |args| match &args[0] {
                Value::String(text) => {
                    let parsed: serde_json::Value = serde_json::from_str(text)
                        .map_err(|e| format!("invalid json: {}", e))?;
                    Ok(Value::from(parsed))
                }
                _ => Err("json requires a string".to_string()),
            },
            Some(verify_string),
        ),
        ReturnType::ANY,
        validate_arity(1, Some(1)),
    ));
    registry.register(ExpressionEvaluator::new(
        "createArray",
        apply(|args| Value::Array(args.to_vec()), None),
        ReturnType::ARRAY,
        validate_any(),
    ));

    // ========================================
    // Type tests
    // ========================================

    registry.register(type_predicate("isString", |v| matches!(v, Value::String(_))));
    registry.register(type_predicate("isBoolean", |v| matches!(v, Value::Boolean(_))));
    registry.register(type_predicate("isInteger", |v| matches!(v, Value::Integer(_))));
    registry.register(type_predicate("isFloat", |v| matches!(v, Value::Float(_))));
    registry.register(type_predicate("isArray", |v| matches!(v, Value::Array(_))));
    registry.register(type_predicate("isObject", |v| matches!(v, Value::Object(_))));
    registry.register(ExpressionEvaluator::new(
        "isDateTime",
        apply(
            |args| match &args[0] {
                Value::String(s) => Value::Boolean(datetime::parse_iso_timestamp(s).is_ok()),
                _ => Value::Boolean(false),
            },
            None,
        ),
        ReturnType::BOOLEAN,
        validate_arity(1, Some(1)),
    ));
}
