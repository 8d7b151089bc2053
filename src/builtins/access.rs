//! Property and element access.
//!
//! `Accessor` and `Element` are the structural node types the parser emits
//! for `a.b` and `a[i]`. Their evaluators first try to fold the whole chain
//! into a single path string (`user.items[2].name`) so memory sees one
//! resolve call and can apply its own lookup strategy; chains with computed
//! parts fall back to evaluating the parent and indexing locally.

use std::sync::Arc;

use crate::ast::Expression;
use crate::evaluator::{
    EvaluateExpressionDelegate, ExpressionEvaluator, ReturnType, ValidateExpressionDelegate,
    apply_with_error, type_name, validate_arity,
};
use crate::memory::Memory;
use crate::options::Options;
use crate::registry::FunctionRegistry;
use crate::value::Value;

// ============================================================================
// Path accumulation
// ============================================================================

/// Fold a fully-constant accessor chain into a path string.
///
/// Returns `None` as soon as any part is computed; the caller then resolves
/// step by step instead.
pub(crate) fn try_accumulate_path(expr: &Expression) -> Option<String> {
    match expr.expr_type() {
        "Accessor" => {
            let Some(Value::String(name)) = expr.children[0].constant_value() else {
                return None;
            };
            match expr.children.get(1) {
                Some(parent) => Some(format!("{}.{}", try_accumulate_path(parent)?, name)),
                None => Some(name.clone()),
            }
        }
        "Element" => {
            let base = try_accumulate_path(&expr.children[0])?;
            match expr.children[1].constant_value() {
                Some(Value::Integer(i)) => Some(format!("{}[{}]", base, i)),
                Some(Value::String(s)) => Some(format!("{}['{}']", base, s)),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Fold an accessor chain into a path, evaluating computed element indices.
///
/// Used for writes, where there is no fallback navigation: the whole target
/// must reduce to a path the memory can address.
fn accumulate_path_evaluated(
    expr: &Expression,
    memory: &dyn Memory,
    options: &Options,
) -> Result<String, String> {
    match expr.expr_type() {
        "Accessor" => {
            let Some(Value::String(name)) = expr.children[0].constant_value() else {
                return Err(format!("{} is not a valid path", expr));
            };
            match expr.children.get(1) {
                Some(parent) => Ok(format!(
                    "{}.{}",
                    accumulate_path_evaluated(parent, memory, options)?,
                    name
                )),
                None => Ok(name.clone()),
            }
        }
        "Element" => {
            let base = accumulate_path_evaluated(&expr.children[0], memory, options)?;
            let (index, error) = expr.children[1].try_evaluate(memory, options);
            if let Some(error) = error {
                return Err(error);
            }
            match index.unwrap_or(Value::Null) {
                Value::Integer(i) => Ok(format!("{}[{}]", base, i)),
                Value::String(s) => Ok(format!("{}['{}']", base, s)),
                other => Err(format!("Cannot use {} as a path index", type_name(&other))),
            }
        }
        _ => Err(format!("{} is not a valid path", expr)),
    }
}

// ============================================================================
// Structural evaluators
// ============================================================================

fn accessor_delegate() -> EvaluateExpressionDelegate {
    Arc::new(|expr, memory, options| {
        if let Some(path) = try_accumulate_path(expr) {
            return (memory.resolve(&path), None);
        }
        let Some(Value::String(name)) = expr.children[0].constant_value() else {
            return (None, Some(format!("{} is not a valid accessor", expr)));
        };
        match expr.children.get(1) {
            Some(parent) => {
                let (value, error) = parent.try_evaluate(memory, options);
                if let Some(error) = error {
                    return (None, Some(error));
                }
                match value {
                    Some(Value::Object(obj)) => (obj.get(name).cloned(), None),
                    // A missing property is no value, not an error.
                    _ => (None, None),
                }
            }
            None => (memory.resolve(name), None),
        }
    })
}

fn element_delegate() -> EvaluateExpressionDelegate {
    Arc::new(|expr, memory, options| {
        if let Some(path) = try_accumulate_path(expr) {
            return (memory.resolve(&path), None);
        }
        let (parent, error) = expr.children[0].try_evaluate(memory, options);
        if let Some(error) = error {
            return (None, Some(error));
        }
        let (index, error) = expr.children[1].try_evaluate(memory, options);
        if let Some(error) = error {
            return (None, Some(error));
        }
        let parent = parent.unwrap_or(Value::Null);
        let index = index.unwrap_or(Value::Null);
        match (&parent, &index) {
            (Value::Array(items), Value::Integer(i)) => {
                let len = items.len() as i64;
                let actual = if *i < 0 { len + i } else { *i };
                if actual < 0 || actual >= len {
                    (None, None)
                } else {
                    (Some(items[actual as usize].clone()), None)
                }
            }
            (Value::Object(obj), Value::String(key)) => (obj.get(key).cloned(), None),
            _ => (
                None,
                Some(format!(
                    "Cannot index {} with {}",
                    type_name(&parent),
                    type_name(&index)
                )),
            ),
        }
    })
}

fn accessor_validator() -> ValidateExpressionDelegate {
    Arc::new(|expr| {
        if expr.children.is_empty() || expr.children.len() > 2 {
            return Err(format!(
                "Accessor requires 1 or 2 arguments, got {}",
                expr.children.len()
            ));
        }
        match expr.children[0].constant_value() {
            Some(Value::String(_)) => Ok(()),
            _ => Err("Accessor requires a constant property name".to_string()),
        }
    })
}

/// The node types every registry carries, standard or not.
pub(crate) fn register_structural(registry: &mut FunctionRegistry) {
    registry.register(ExpressionEvaluator::new(
        "Accessor",
        accessor_delegate(),
        ReturnType::ANY,
        accessor_validator(),
    ));
    registry.register(ExpressionEvaluator::new(
        "Element",
        element_delegate(),
        ReturnType::ANY,
        validate_arity(2, Some(2)),
    ));
}

// ============================================================================
// Callable access functions
// ============================================================================

fn get_property_delegate() -> EvaluateExpressionDelegate {
    Arc::new(|expr, memory, options| {
        let (first, error) = expr.children[0].try_evaluate(memory, options);
        if let Some(error) = error {
            return (None, Some(error));
        }
        let first = first.unwrap_or(Value::Null);
        if expr.children.len() == 1 {
            // Single-argument form looks the name up in memory.
            let Value::String(name) = &first else {
                return (None, Some(format!("{} is not a string", expr.children[0])));
            };
            return (memory.resolve(name), None);
        }
        let (property, error) = expr.children[1].try_evaluate(memory, options);
        if let Some(error) = error {
            return (None, Some(error));
        }
        match (&first, property.unwrap_or(Value::Null)) {
            (Value::Object(obj), Value::String(name)) => (obj.get(&name).cloned(), None),
            (_, Value::String(_)) => (None, None),
            (_, other) => (
                None,
                Some(format!("Cannot use {} as a property name", type_name(&other))),
            ),
        }
    })
}

fn set_path_delegate() -> EvaluateExpressionDelegate {
    Arc::new(|expr, memory, options| {
        let path = match accumulate_path_evaluated(&expr.children[0], memory, options) {
            Ok(path) => path,
            Err(error) => return (None, Some(error)),
        };
        let (value, error) = expr.children[1].try_evaluate(memory, options);
        if let Some(error) = error {
            return (None, Some(error));
        }
        let value = value.unwrap_or(Value::Null);
        if memory.set_value(&path, value.clone()) {
            (Some(value), None)
        } else {
            (None, Some(format!("Cannot set value at {}", path)))
        }
    })
}

fn set_path_validator() -> ValidateExpressionDelegate {
    Arc::new(|expr| {
        if expr.children.len() != 2 {
            return Err(format!(
                "setPathToValue requires 2 arguments, got {}",
                expr.children.len()
            ));
        }
        match expr.children[0].expr_type() {
            "Accessor" | "Element" => Ok(()),
            _ => Err("setPathToValue requires a path as its first argument".to_string()),
        }
    })
}

pub fn register(registry: &mut FunctionRegistry) {
    registry.register(ExpressionEvaluator::new(
        "getProperty",
        get_property_delegate(),
        ReturnType::ANY,
        validate_arity(1, Some(2)),
    ));
    registry.register(ExpressionEvaluator::new(
        "setProperty",
        apply_with_error(
            |args| match (&args[0], &args[1]) {
                (Value::Object(obj), Value::String(name)) => {
                    let mut copy = obj.clone();
                    copy.insert(name.clone(), args[2].clone());
                    Ok(Value::Object(copy))
                }
                (Value::Object(_), other) => Err(format!(
                    "Cannot use {} as a property name",
                    type_name(other)
                )),
                (other, _) => Err(format!("Cannot set a property on {}", type_name(other))),
            },
            None,
        ),
        ReturnType::OBJECT,
        validate_arity(3, Some(3)),
    ));
    registry.register(ExpressionEvaluator::new(
        "removeProperty",
        apply_with_error(
            |args| match (&args[0], &args[1]) {
                (Value::Object(obj), Value::String(name)) => {
                    let mut copy = obj.clone();
                    copy.remove(name);
                    Ok(Value::Object(copy))
                }
                (Value::Object(_), other) => Err(format!(
                    "Cannot use {} as a property name",
                    type_name(other)
                )),
                (other, _) => Err(format!(
                    "Cannot remove a property from {}",
                    type_name(other)
                )),
            },
            None,
        ),
        ReturnType::OBJECT,
        validate_arity(2, Some(2)),
    ));
    registry.register(ExpressionEvaluator::new(
        "setPathToValue",
        set_path_delegate(),
        ReturnType::ANY,
        set_path_validator(),
    ));
}
