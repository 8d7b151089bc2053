use crate::evaluator::{
    ExpressionEvaluator, ReturnType, apply, apply_with_error, apply_with_options_and_error,
    validate_arity, validate_order, verify_string,
};
use crate::registry::FunctionRegistry;
use crate::value::Value;

/// Rendering rule for concatenation: nothing for null, plain text otherwise.
fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => other.as_string(),
    }
}

/// Character-based index of a substring, -1 when absent.
fn char_index_of(text: &str, search: &str) -> i64 {
    match text.find(search) {
        Some(byte) => text[..byte].chars().count() as i64,
        None => -1,
    }
}

fn char_last_index_of(text: &str, search: &str) -> i64 {
    match text.rfind(search) {
        Some(byte) => text[..byte].chars().count() as i64,
        None => -1,
    }
}

/// Case-insensitive replace, comparing characters under Unicode lowercasing.
fn replace_ignore_case(text: &str, from: &str, to: &str) -> String {
    let text_chars: Vec<char> = text.chars().collect();
    let from_chars: Vec<char> = from.chars().collect();
    let mut result = String::new();
    let mut i = 0;
    while i < text_chars.len() {
        let matched = i + from_chars.len() <= text_chars.len()
            && text_chars[i..i + from_chars.len()]
                .iter()
                .zip(from_chars.iter())
                .all(|(a, b)| a.to_lowercase().eq(b.to_lowercase()));
        if matched {
            result.push_str(to);
            i += from_chars.len();
        } else {
            result.push(text_chars[i]);
            i += 1;
        }
    }
    result
}

fn replace_body(args: &[Value], ignore_case: bool) -> Result<Value, String> {
    match (&args[0], &args[1], &args[2]) {
        (Value::String(text), Value::String(from), Value::String(to)) => {
            if from.is_empty() {
                return Err("replace requires a non-empty search string".to_string());
            }
            let replaced = if ignore_case {
                replace_ignore_case(text, from, to)
            } else {
                text.replace(from.as_str(), to)
            };
            Ok(Value::String(replaced))
        }
        _ => Err("replace requires string arguments".to_string()),
    }
}

pub fn register(registry: &mut FunctionRegistry) {
    // ========================================
    // Building strings
    // ========================================

    registry.register(ExpressionEvaluator::new(
        "concat",
        apply(
            |args| Value::String(args.iter().map(stringify).collect()),
            None,
        ),
        ReturnType::STRING,
        validate_arity(1, None),
    ));
    registry.register(ExpressionEvaluator::new(
        "join",
        apply_with_options_and_error(
            |args, options| {
                let Value::Array(items) = &args[0] else {
                    return Err("join requires a list".to_string());
                };
                let separator = match args.get(1) {
                    Some(Value::String(s)) => s.clone(),
                    Some(_) => return Err("join requires a string separator".to_string()),
                    None => options.list_separator.clone(),
                };
                let rendered: Vec<String> = items.iter().map(|v| v.as_string()).collect();
                match args.get(2) {
                    Some(Value::String(last_separator)) => {
                        if rendered.len() <= 1 {
                            return Ok(Value::String(rendered.concat()));
                        }
                        let head = rendered[..rendered.len() - 1].join(&separator);
                        Ok(Value::String(format!(
                            "{}{}{}",
                            head,
                            last_separator,
                            rendered[rendered.len() - 1]
                        )))
                    }
                    Some(_) => Err("join requires a string separator".to_string()),
                    None => Ok(Value::String(rendered.join(&separator))),
                }
            },
            None,
        ),
        ReturnType::STRING,
        validate_order(
            &[ReturnType::STRING, ReturnType::STRING],
            &[ReturnType::ARRAY],
        ),
    ));
    registry.register(ExpressionEvaluator::new(
        "newline",
        apply(|_| Value::String("\n".to_string()), None),
        ReturnType::STRING,
        validate_arity(0, Some(0)),
    ));

    // ========================================
    // Transformations
    // ========================================

    registry.register(ExpressionEvaluator::new(
        "toUpper",
        apply(
            |args| match &args[0] {
                Value::String(s) => Value::String(s.to_uppercase()),
                _ => Value::Null,
            },
            Some(verify_string),
        ),
        ReturnType::STRING,
        validate_arity(1, Some(1)),
    ));
    registry.register(ExpressionEvaluator::new(
        "toLower",
        apply(
            |args| match &args[0] {
                Value::String(s) => Value::String(s.to_lowercase()),
                _ => Value::Null,
            },
            Some(verify_string),
        ),
        ReturnType::STRING,
        validate_arity(1, Some(1)),
    ));
    registry.register(ExpressionEvaluator::new(
        "trim",
        apply(
            |args| match &args[0] {
                Value::String(s) => Value::String(s.trim().to_string()),
                _ => Value::Null,
            },
            Some(verify_string),
        ),
        ReturnType::STRING,
        validate_arity(1, Some(1)),
    ));
    registry.register(ExpressionEvaluator::new(
        "replace",
        apply_with_error(|args| replace_body(args, false), Some(verify_string)),
        ReturnType::STRING,
        validate_arity(3, Some(3)),
    ));
    registry.register(ExpressionEvaluator::new(
        "replaceIgnoreCase",
        apply_with_error(|args| replace_body(args, true), Some(verify_string)),
        ReturnType::STRING,
        validate_arity(3, Some(3)),
    ));
    registry.register(ExpressionEvaluator::new(
        "substring",
        apply_with_error(
            |args| {
                let Value::String(text) = &args[0] else {
                    return Err("substring requires a string".to_string());
                };
                let chars: Vec<char> = text.chars().collect();
                let Value::Integer(start) = &args[1] else {
                    return Err("substring requires integer indices".to_string());
                };
                if *start < 0 || *start as usize > chars.len() {
                    return Err("substring start index is out of range".to_string());
                }
                let start = *start as usize;
                let length = match args.get(2) {
                    Some(Value::Integer(n)) => *n,
                    Some(_) => return Err("substring requires integer indices".to_string()),
                    None => (chars.len() - start) as i64,
                };
                if length < 0 || start + length as usize > chars.len() {
                    return Err("substring length is out of range".to_string());
                }
                Ok(Value::String(
                    chars[start..start + length as usize].iter().collect(),
                ))
            },
            None,
        ),
        ReturnType::STRING,
        validate_order(
            &[ReturnType::NUMBER],
            &[ReturnType::STRING, ReturnType::NUMBER],
        ),
    ));
    registry.register(ExpressionEvaluator::new(
        "split",
        apply(
            |args| {
                let Value::String(text) = &args[0] else {
                    return Value::Null;
                };
                let parts: Vec<Value> = match args.get(1) {
                    Some(Value::String(sep)) if !sep.is_empty() => text
                        .split(sep.as_str())
                        .map(|p| Value::String(p.to_string()))
                        .collect(),
                    _ => text.chars().map(|c| Value::String(c.to_string())).collect(),
                };
                Value::Array(parts)
            },
            Some(verify_string),
        ),
        ReturnType::ARRAY,
        validate_order(&[ReturnType::STRING], &[ReturnType::STRING]),
    ));

    // ========================================
    // Search
    // ========================================

    registry.register(ExpressionEvaluator::new(
        "length",
        apply(
            |args| match &args[0] {
                Value::String(s) => Value::Integer(s.chars().count() as i64),
                _ => Value::Null,
            },
            Some(verify_string),
        ),
        ReturnType::NUMBER,
        validate_arity(1, Some(1)),
    ));
    registry.register(ExpressionEvaluator::new(
        "startsWith",
        apply(
            |args| match (&args[0], &args[1]) {
                (Value::String(s), Value::String(prefix)) => {
                    Value::Boolean(s.starts_with(prefix.as_str()))
                }
                _ => Value::Boolean(false),
            },
            Some(verify_string),
        ),
        ReturnType::BOOLEAN,
        validate_arity(2, Some(2)),
    ));
    registry.register(ExpressionEvaluator::new(
        "endsWith",
        apply(
            |args| match (&args[0], &args[1]) {
                (Value::String(s), Value::String(suffix)) => {
                    Value::Boolean(s.ends_with(suffix.as_str()))
                }
                _ => Value::Boolean(false),
            },
            Some(verify_string),
        ),
        ReturnType::BOOLEAN,
        validate_arity(2, Some(2)),
    ));
    registry.register(ExpressionEvaluator::new(
        "indexOf",
        apply_with_error(
            |args| match &args[0] {
                Value::String(text) => match &args[1] {
                    Value::String(search) => Ok(Value::Integer(char_index_of(text, search))),
                    _ => Err("indexOf requires a string to search for".to_string()),
                },
                Value::Array(items) => Ok(Value::Integer(
                    items
                        .iter()
                        .position(|v| v.equals(&args[1]))
                        .map(|i| i as i64)
                        .unwrap_or(-1),
                )),
                _ => Err("indexOf requires a list or string".to_string()),
            },
            None,
        ),
        ReturnType::NUMBER,
        validate_arity(2, Some(2)),
    ));
    registry.register(ExpressionEvaluator::new(
        "lastIndexOf",
        apply_with_error(
            |args| match &args[0] {
                Value::String(text) => match &args[1] {
                    Value::String(search) => Ok(Value::Integer(char_last_index_of(text, search))),
                    _ => Err("lastIndexOf requires a string to search for".to_string()),
                },
                Value::Array(items) => Ok(Value::Integer(
                    items
                        .iter()
                        .rposition(|v| v.equals(&args[1]))
                        .map(|i| i as i64)
                        .unwrap_or(-1),
                )),
                _ => Err("lastIndexOf requires a list or string".to_string()),
            },
            None,
        ),
        ReturnType::NUMBER,
        validate_arity(2, Some(2)),
    ));
    registry.register(ExpressionEvaluator::new(
        "isMatch",
        apply_with_error(
            |args| match (&args[0], &args[1]) {
                (Value::String(text), Value::String(pattern)) => {
                    let re = regex::Regex::new(pattern)
                        .map_err(|e| format!("invalid regex: {e}"))?;
                    Ok(Value::Boolean(re.is_match(text)))
                }
                _ => Err("isMatch requires string arguments".to_string()),
            },
            Some(verify_string),
        ),
        ReturnType::BOOLEAN,
        validate_arity(2, Some(2)),
    ));
}
