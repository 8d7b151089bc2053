use std::sync::Arc;

use crate::evaluator::{
    EvaluateExpressionDelegate, ExpressionEvaluator, ReturnType, apply, validate_arity,
};
use crate::registry::FunctionRegistry;
use crate::value::Value;

/// Short-circuiting AND. Children evaluate left to right; the first falsy
/// child yields false without touching the rest, and the first child error
/// wins over everything.
fn and_delegate() -> EvaluateExpressionDelegate {
    Arc::new(|expr, memory, options| {
        for child in &expr.children {
            let (value, error) = child.try_evaluate(memory, options);
            if let Some(error) = error {
                return (None, Some(error));
            }
            if !value.map(|v| v.is_truthy()).unwrap_or(false) {
                return (Some(Value::Boolean(false)), None);
            }
        }
        (Some(Value::Boolean(true)), None)
    })
}

/// Short-circuiting OR: first truthy child yields true.
fn or_delegate() -> EvaluateExpressionDelegate {
    Arc::new(|expr, memory, options| {
        for child in &expr.children {
            let (value, error) = child.try_evaluate(memory, options);
            if let Some(error) = error {
                return (None, Some(error));
            }
            if value.map(|v| v.is_truthy()).unwrap_or(false) {
                return (Some(Value::Boolean(true)), None);
            }
        }
        (Some(Value::Boolean(false)), None)
    })
}

/// Lazy conditional: exactly one branch is evaluated.
fn if_delegate() -> EvaluateExpressionDelegate {
    Arc::new(|expr, memory, options| {
        let (condition, error) = expr.children[0].try_evaluate(memory, options);
        if let Some(error) = error {
            return (None, Some(error));
        }
        let branch = if condition.map(|v| v.is_truthy()).unwrap_or(false) {
            &expr.children[1]
        } else {
            &expr.children[2]
        };
        branch.try_evaluate(memory, options)
    })
}

/// First child that resolves to something non-null wins; later children are
/// not evaluated at all.
fn coalesce_delegate() -> EvaluateExpressionDelegate {
    Arc::new(|expr, memory, options| {
        for child in &expr.children {
            let (value, error) = child.try_evaluate(memory, options);
            if let Some(error) = error {
                return (None, Some(error));
            }
            if let Some(value) = value {
                if !matches!(value, Value::Null) {
                    return (Some(value), None);
                }
            }
        }
        (Some(Value::Null), None)
    })
}

pub fn register(registry: &mut FunctionRegistry) {
    registry.register(ExpressionEvaluator::new(
        "&&",
        and_delegate(),
        ReturnType::BOOLEAN,
        validate_arity(2, None),
    ));
    registry.register(ExpressionEvaluator::new(
        "||",
        or_delegate(),
        ReturnType::BOOLEAN,
        validate_arity(2, None),
    ));
    registry.register(ExpressionEvaluator::new(
        "!",
        apply(|args| Value::Boolean(!args[0].is_truthy()), None),
        ReturnType::BOOLEAN,
        validate_arity(1, Some(1)),
    ));
    registry.register(ExpressionEvaluator::new(
        "if",
        if_delegate(),
        ReturnType::ANY,
        validate_arity(3, Some(3)),
    ));
    registry.register(ExpressionEvaluator::new(
        "coalesce",
        coalesce_delegate(),
        ReturnType::ANY,
        validate_arity(1, None),
    ));
    registry.register_alias("and", "&&");
    registry.register_alias("or", "||");
    registry.register_alias("not", "!");
}
