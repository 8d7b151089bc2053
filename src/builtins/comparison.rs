use std::cmp::Ordering;

use crate::evaluator::{
    ExpressionEvaluator, ReturnType, apply, apply_with_error, type_name, validate_arity,
};
use crate::registry::FunctionRegistry;
use crate::value::Value;

/// Ordering across numbers (Integer/Float coerce) and strings.
///
/// Anything else is not ordered and produces an evaluation error rather
/// than a silent verdict.
fn order_compare(a: &Value, b: &Value) -> Result<Ordering, String> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        _ => match (a.as_float(), b.as_float()) {
            (Some(x), Some(y)) => Ok(x.partial_cmp(&y).unwrap_or(Ordering::Equal)),
            _ => Err(format!(
                "Cannot compare {} and {}",
                type_name(a),
                type_name(b)
            )),
        },
    }
}

fn ordering_op(accept: fn(Ordering) -> bool) -> impl Fn(&[Value]) -> Result<Value, String> {
    move |args| {
        let ordering = order_compare(&args[0], &args[1])?;
        Ok(Value::Boolean(accept(ordering)))
    }
}

pub fn register(registry: &mut FunctionRegistry) {
    // Equality is total: mismatched shapes are unequal, never an error
    registry.register(ExpressionEvaluator::new(
        "==",
        apply(|args| Value::Boolean(args[0].equals(&args[1])), None),
        ReturnType::BOOLEAN,
        validate_arity(2, Some(2)),
    ));
    registry.register(ExpressionEvaluator::new(
        "!=",
        apply(|args| Value::Boolean(!args[0].equals(&args[1])), None),
        ReturnType::BOOLEAN,
        validate_arity(2, Some(2)),
    ));
    registry.register_alias("equals", "==");

    registry.register(ExpressionEvaluator::new(
        "<",
        apply_with_error(ordering_op(|o| o == Ordering::Less), None),
        ReturnType::BOOLEAN,
        validate_arity(2, Some(2)),
    ));
    registry.register(ExpressionEvaluator::new(
        "<=",
        apply_with_error(ordering_op(|o| o != Ordering::Greater), None),
        ReturnType::BOOLEAN,
        validate_arity(2, Some(2)),
    ));
    registry.register(ExpressionEvaluator::new(
        ">",
        apply_with_error(ordering_op(|o| o == Ordering::Greater), None),
        ReturnType::BOOLEAN,
        validate_arity(2, Some(2)),
    ));
    registry.register(ExpressionEvaluator::new(
        ">=",
        apply_with_error(ordering_op(|o| o != Ordering::Less), None),
        ReturnType::BOOLEAN,
        validate_arity(2, Some(2)),
    ));

    // True when the child resolves to something other than null
    registry.register(ExpressionEvaluator::new(
        "exists",
        apply(
            |args| Value::Boolean(!matches!(&args[0], Value::Null)),
            None,
        ),
        ReturnType::BOOLEAN,
        validate_arity(1, Some(1)),
    ));
}
