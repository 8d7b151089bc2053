use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::Expression;
use crate::evaluator::{
    EvaluateExpressionDelegate, ExpressionEvaluator, ReturnType, ValidateExpressionDelegate, apply,
    apply_with_error, validate_arity, validate_order, verify_list, verify_list_or_string,
};
use crate::memory::ScopedMemory;
use crate::registry::FunctionRegistry;
use crate::value::Value;

// ============================================================================
// Iteration plumbing
// ============================================================================

/// What an iterating function walks over: the element values, paired with the
/// object key when the source is an object.
fn iteration_items(source: &Value) -> Option<Vec<(Option<String>, Value)>> {
    match source {
        Value::Array(items) => Some(items.iter().map(|v| (None, v.clone())).collect()),
        Value::Object(obj) => {
            // Sorted keys keep object iteration deterministic.
            let mut keys: Vec<&String> = obj.keys().collect();
            keys.sort();
            Some(
                keys.into_iter()
                    .map(|k| (Some(k.clone()), obj[k].clone()))
                    .collect(),
            )
        }
        _ => None,
    }
}

/// Object elements are exposed to the lambda as `{key, value}` pairs.
fn pair_object(key: &str, value: Value) -> Value {
    let mut pair = HashMap::new();
    pair.insert("key".to_string(), Value::String(key.to_string()));
    pair.insert("value".to_string(), value);
    Value::Object(pair)
}

/// The iterator binding must be a bare name: an `Accessor` with no parent.
fn iterator_name(expr: &Expression) -> Option<&str> {
    let binding = expr.children.get(1)?;
    if binding.expr_type() != "Accessor" || binding.children.len() != 1 {
        return None;
    }
    match binding.children[0].constant_value() {
        Some(Value::String(name)) => Some(name),
        _ => None,
    }
}

fn iterator_validator() -> ValidateExpressionDelegate {
    Arc::new(|expr| {
        if expr.children.len() != 3 {
            return Err(format!(
                "{} requires 3 arguments, got {}",
                expr.expr_type(),
                expr.children.len()
            ));
        }
        if iterator_name(expr).is_none() {
            return Err(format!(
                "argument 2 of {} should be a bare iterator name",
                expr.expr_type()
            ));
        }
        Ok(())
    })
}

fn foreach_delegate() -> EvaluateExpressionDelegate {
    Arc::new(|expr, memory, options| {
        let Some(name) = iterator_name(expr) else {
            return (
                None,
                Some(format!(
                    "{} requires a bare iterator name",
                    expr.expr_type()
                )),
            );
        };
        let (source, error) = expr.children[0].try_evaluate(memory, options);
        if let Some(error) = error {
            return (None, Some(error));
        }
        let source = source.unwrap_or(Value::Null);
        let Some(items) = iteration_items(&source) else {
            return (None, Some(format!("{} is not a collection", expr.children[0])));
        };

        let mut results = Vec::with_capacity(items.len());
        for (key, value) in items {
            let element = match key {
                Some(key) => pair_object(&key, value),
                None => value,
            };
            let scoped = ScopedMemory::new(memory, name, element);
            let (mapped, error) = expr.children[2].try_evaluate(&scoped, options);
            if let Some(error) = error {
                return (None, Some(error));
            }
            results.push(mapped.unwrap_or(Value::Null));
        }
        (Some(Value::Array(results)), None)
    })
}

fn where_delegate() -> EvaluateExpressionDelegate {
    Arc::new(|expr, memory, options| {
        let Some(name) = iterator_name(expr) else {
            return (
                None,
                Some(format!(
                    "{} requires a bare iterator name",
                    expr.expr_type()
                )),
            );
        };
        let (source, error) = expr.children[0].try_evaluate(memory, options);
        if let Some(error) = error {
            return (None, Some(error));
        }
        let source = source.unwrap_or(Value::Null);
        let Some(items) = iteration_items(&source) else {
            return (None, Some(format!("{} is not a collection", expr.children[0])));
        };
        let from_object = matches!(source, Value::Object(_));

        let mut kept_list = Vec::new();
        let mut kept_object = HashMap::new();
        for (key, value) in items {
            let element = match &key {
                Some(key) => pair_object(key, value.clone()),
                None => value.clone(),
            };
            let scoped = ScopedMemory::new(memory, name, element);
            let (keep, error) = expr.children[2].try_evaluate(&scoped, options);
            if let Some(error) = error {
                return (None, Some(error));
            }
            if keep.map(|v| v.is_truthy()).unwrap_or(false) {
                match key {
                    Some(key) => {
                        kept_object.insert(key, value);
                    }
                    None => kept_list.push(value),
                }
            }
        }
        if from_object {
            (Some(Value::Object(kept_object)), None)
        } else {
            (Some(Value::Array(kept_list)), None)
        }
    })
}

// ============================================================================
// Sorting
// ============================================================================

/// Cross-type ordering for sorts: nulls, then booleans, then numbers, then
/// strings, then nested collections.
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Boolean(_) => 1,
        Value::Integer(_) | Value::Float(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn sort_compare(a: &Value, b: &Value) -> Ordering {
    let (rank_a, rank_b) = (type_rank(a), type_rank(b));
    if rank_a != rank_b {
        return rank_a.cmp(&rank_b);
    }
    match (a, b) {
        (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ if rank_a == 2 => {
            let x = a.as_float().unwrap_or(f64::NAN);
            let y = b.as_float().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        _ => Ordering::Equal,
    }
}

fn sort_key<'v>(value: &'v Value, property: Option<&str>) -> &'v Value {
    match property {
        Some(name) => match value {
            Value::Object(obj) => obj.get(name).unwrap_or(&Value::Null),
            _ => &Value::Null,
        },
        None => value,
    }
}

fn sort_body(args: &[Value], name: &str, descending: bool) -> Result<Value, String> {
    let Value::Array(items) = &args[0] else {
        return Err(format!("{} requires a list", name));
    };
    let property = match args.get(1) {
        Some(Value::String(p)) => Some(p.clone()),
        Some(_) => return Err(format!("{} requires a string property name", name)),
        None => None,
    };
    let mut sorted = items.clone();
    sorted.sort_by(|a, b| {
        let ordering = sort_compare(
            sort_key(a, property.as_deref()),
            sort_key(b, property.as_deref()),
        );
        if descending { ordering.reverse() } else { ordering }
    });
    Ok(Value::Array(sorted))
}

// ============================================================================
// Flattening
// ============================================================================

fn flatten_into(items: &[Value], depth: i64, out: &mut Vec<Value>) {
    for item in items {
        match item {
            Value::Array(inner) if depth > 0 => flatten_into(inner, depth - 1, out),
            other => out.push(other.clone()),
        }
    }
}

// ============================================================================
// Registration
// ============================================================================

pub fn register(registry: &mut FunctionRegistry) {
    // ========================================
    // Size and membership
    // ========================================

    registry.register(ExpressionEvaluator::new(
        "count",
        apply(
            |args| match &args[0] {
                Value::Array(items) => Value::Integer(items.len() as i64),
                Value::String(s) => Value::Integer(s.chars().count() as i64),
                _ => Value::Null,
            },
            Some(verify_list_or_string),
        ),
        ReturnType::NUMBER,
        validate_arity(1, Some(1)),
    ));
    registry.register(ExpressionEvaluator::new(
        "contains",
        apply(
            |args| {
                let found = match (&args[0], &args[1]) {
                    (Value::String(s), Value::String(sub)) => s.contains(sub.as_str()),
                    (Value::Array(items), needle) => items.iter().any(|v| v.equals(needle)),
                    (Value::Object(obj), Value::String(key)) => obj.contains_key(key),
                    _ => false,
                };
                Value::Boolean(found)
            },
            None,
        ),
        ReturnType::BOOLEAN,
        validate_arity(2, Some(2)),
    ));
    registry.register(ExpressionEvaluator::new(
        "empty",
        apply(
            |args| {
                let empty = match &args[0] {
                    Value::Null => true,
                    Value::String(s) => s.is_empty(),
                    Value::Array(items) => items.is_empty(),
                    Value::Object(obj) => obj.is_empty(),
                    _ => false,
                };
                Value::Boolean(empty)
            },
            None,
        ),
        ReturnType::BOOLEAN,
        validate_arity(1, Some(1)),
    ));

    // ========================================
    // Element access
    // ========================================

    registry.register(ExpressionEvaluator::new(
        "first",
        apply(
            |args| match &args[0] {
                Value::Array(items) => items.first().cloned().unwrap_or(Value::Null),
                Value::String(s) => s
                    .chars()
                    .next()
                    .map(|c| Value::String(c.to_string()))
                    .unwrap_or(Value::Null),
                _ => Value::Null,
            },
            Some(verify_list_or_string),
        ),
        ReturnType::ANY,
        validate_arity(1, Some(1)),
    ));
    registry.register(ExpressionEvaluator::new(
        "last",
        apply(
            |args| match &args[0] {
                Value::Array(items) => items.last().cloned().unwrap_or(Value::Null),
                Value::String(s) => s
                    .chars()
                    .next_back()
                    .map(|c| Value::String(c.to_string()))
                    .unwrap_or(Value::Null),
                _ => Value::Null,
            },
            Some(verify_list_or_string),
        ),
        ReturnType::ANY,
        validate_arity(1, Some(1)),
    ));

    // ========================================
    // Set operations
    // ========================================

    registry.register(ExpressionEvaluator::new(
        "union",
        apply(
            |args| {
                let mut result: Vec<Value> = Vec::new();
                for arg in args {
                    if let Value::Array(items) = arg {
                        for item in items {
                            if !result.iter().any(|v| v.equals(item)) {
                                result.push(item.clone());
                            }
                        }
                    }
                }
                Value::Array(result)
            },
            Some(verify_list),
        ),
        ReturnType::ARRAY,
        validate_arity(2, None),
    ));
    registry.register(ExpressionEvaluator::new(
        "intersection",
        apply(
            |args| {
                let mut result: Vec<Value> = Vec::new();
                if let Value::Array(items) = &args[0] {
                    for item in items {
                        if !result.iter().any(|v| v.equals(item)) {
                            result.push(item.clone());
                        }
                    }
                }
                for arg in &args[1..] {
                    if let Value::Array(items) = arg {
                        result.retain(|v| items.iter().any(|item| item.equals(v)));
                    }
                }
                Value::Array(result)
            },
            Some(verify_list),
        ),
        ReturnType::ARRAY,
        validate_arity(2, None),
    ));

    // ========================================
    // Slicing and reshaping
    // ========================================

    registry.register(ExpressionEvaluator::new(
        "skip",
        apply_with_error(
            |args| {
                let Value::Array(items) = &args[0] else {
                    return Err("skip requires a list".to_string());
                };
                let Value::Integer(count) = &args[1] else {
                    return Err("skip requires an integer count".to_string());
                };
                if *count < 0 {
                    return Err(format!("skip requires a non-negative count, got {}", count));
                }
                let start = (*count as usize).min(items.len());
                Ok(Value::Array(items[start..].to_vec()))
            },
            None,
        ),
        ReturnType::ARRAY,
        validate_order(&[], &[ReturnType::ARRAY, ReturnType::NUMBER]),
    ));
    registry.register(ExpressionEvaluator::new(
        "take",
        apply_with_error(
            |args| {
                let Value::Integer(count) = &args[1] else {
                    return Err("take requires an integer count".to_string());
                };
                if *count < 0 {
                    return Err(format!("take requires a non-negative count, got {}", count));
                }
                match &args[0] {
                    Value::Array(items) => {
                        let end = (*count as usize).min(items.len());
                        Ok(Value::Array(items[..end].to_vec()))
                    }
                    Value::String(s) => {
                        Ok(Value::String(s.chars().take(*count as usize).collect()))
                    }
                    _ => Err("take requires a list or string".to_string()),
                }
            },
            None,
        ),
        ReturnType::ARRAY | ReturnType::STRING,
        validate_order(
            &[],
            &[ReturnType::ARRAY | ReturnType::STRING, ReturnType::NUMBER],
        ),
    ));
    registry.register(ExpressionEvaluator::new(
        "reverse",
        apply(
            |args| match &args[0] {
                Value::Array(items) => Value::Array(items.iter().rev().cloned().collect()),
                Value::String(s) => Value::String(s.chars().rev().collect()),
                _ => Value::Null,
            },
            Some(verify_list_or_string),
        ),
        ReturnType::ARRAY | ReturnType::STRING,
        validate_arity(1, Some(1)),
    ));
    registry.register(ExpressionEvaluator::new(
        "flatten",
        apply_with_error(
            |args| {
                let Value::Array(items) = &args[0] else {
                    return Err("flatten requires a list".to_string());
                };
                let depth = match args.get(1) {
                    Some(Value::Integer(d)) => *d,
                    Some(_) => return Err("flatten requires an integer depth".to_string()),
                    // No depth means flatten all the way down.
                    None => 100,
                };
                let mut out = Vec::new();
                flatten_into(items, depth, &mut out);
                Ok(Value::Array(out))
            },
            None,
        ),
        ReturnType::ARRAY,
        validate_order(&[ReturnType::NUMBER], &[ReturnType::ARRAY]),
    ));
    registry.register(ExpressionEvaluator::new(
        "sortBy",
        apply_with_error(|args| sort_body(args, "sortBy", false), None),
        ReturnType::ARRAY,
        validate_order(&[ReturnType::STRING], &[ReturnType::ARRAY]),
    ));
    registry.register(ExpressionEvaluator::new(
        "sortByDescending",
        apply_with_error(|args| sort_body(args, "sortByDescending", true), None),
        ReturnType::ARRAY,
        validate_order(&[ReturnType::STRING], &[ReturnType::ARRAY]),
    ));
    registry.register(ExpressionEvaluator::new(
        "indicesAndValues",
        apply_with_error(
            |args| match &args[0] {
                Value::Array(items) => {
                    let pairs = items
                        .iter()
                        .enumerate()
                        .map(|(i, v)| {
                            let mut pair = HashMap::new();
                            pair.insert("index".to_string(), Value::Integer(i as i64));
                            pair.insert("value".to_string(), v.clone());
                            Value::Object(pair)
                        })
                        .collect();
                    Ok(Value::Array(pairs))
                }
                Value::Object(obj) => {
                    let mut keys: Vec<&String> = obj.keys().collect();
                    keys.sort();
                    let pairs = keys
                        .into_iter()
                        .map(|k| {
                            let mut pair = HashMap::new();
                            pair.insert("index".to_string(), Value::String(k.clone()));
                            pair.insert("value".to_string(), obj[k].clone());
                            Value::Object(pair)
                        })
                        .collect();
                    Ok(Value::Array(pairs))
                }
                _ => Err("indicesAndValues requires a list or object".to_string()),
            },
            None,
        ),
        ReturnType::ARRAY,
        validate_arity(1, Some(1)),
    ));

    // ========================================
    // Iterating functions
    // ========================================

    registry.register(ExpressionEvaluator::new(
        "foreach",
        foreach_delegate(),
        ReturnType::ARRAY,
        iterator_validator(),
    ));
    registry.register(ExpressionEvaluator::new(
        "where",
        where_delegate(),
        ReturnType::ARRAY | ReturnType::OBJECT,
        iterator_validator(),
    ));
    registry.register_alias("select", "foreach");
}
