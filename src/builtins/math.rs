use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::evaluator::{
    ExpressionEvaluator, ReturnType, apply, apply_with_error, validate_arity, validate_order,
    verify_integer, verify_number, verify_number_or_numeric_list, verify_number_or_string,
    verify_numeric_list,
};
use crate::registry::FunctionRegistry;
use crate::value::Value;

fn float_of(v: &Value) -> f64 {
    v.as_float().unwrap_or(f64::NAN)
}

fn decimal_pair(a: &Value, b: &Value) -> Option<(Decimal, Decimal)> {
    let to_decimal = |v: &Value| match v {
        Value::Integer(n) => Decimal::from_i64(*n),
        Value::Float(n) => Decimal::from_f64(*n),
        _ => None,
    };
    Some((to_decimal(a)?, to_decimal(b)?))
}

/// Mixed integer/float arithmetic through exact decimals, narrowing back to
/// an integer whenever the result is whole.
fn decimal_mixed(
    a: &Value,
    b: &Value,
    op: fn(Decimal, Decimal) -> Decimal,
    fallback: fn(f64, f64) -> f64,
) -> Value {
    if let Some((ad, bd)) = decimal_pair(a, b) {
        let rd = op(ad, bd);
        if rd.is_integer()
            && let Some(r) = rd.to_i64()
        {
            return Value::Integer(r);
        }
        if let Some(r) = rd.to_f64() {
            return Value::Float(r);
        }
    }
    Value::Float(fallback(float_of(a), float_of(b)))
}

/// Fold a variadic argument list through a binary operation, left to right.
fn fold_binary(
    args: &[Value],
    op: fn(&Value, &Value) -> Result<Value, String>,
) -> Result<Value, String> {
    let mut result = args[0].clone();
    for value in &args[1..] {
        result = op(&result, value)?;
    }
    Ok(result)
}

pub(crate) fn add_values(a: &Value, b: &Value) -> Result<Value, String> {
    match (a, b) {
        (Value::String(_), _) | (_, Value::String(_)) => Ok(Value::String(format!(
            "{}{}",
            a.as_string(),
            b.as_string()
        ))),
        (Value::Integer(x), Value::Integer(y)) => match x.checked_add(*y) {
            Some(n) => Ok(Value::Integer(n)),
            None => Ok(Value::Float(*x as f64 + *y as f64)),
        },
        (Value::Float(x), Value::Float(y)) => Ok(Value::Float(x + y)),
        (Value::Integer(_), Value::Float(_)) | (Value::Float(_), Value::Integer(_)) => {
            Ok(decimal_mixed(a, b, |x, y| x + y, |x, y| x + y))
        }
        (x, y) => Err(format!(
            "Cannot add {} and {}",
            crate::evaluator::type_name(x),
            crate::evaluator::type_name(y)
        )),
    }
}

fn subtract_values(a: &Value, b: &Value) -> Result<Value, String> {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => match x.checked_sub(*y) {
            Some(n) => Ok(Value::Integer(n)),
            None => Ok(Value::Float(*x as f64 - *y as f64)),
        },
        (Value::Float(x), Value::Float(y)) => Ok(Value::Float(x - y)),
        (Value::Integer(_), Value::Float(_)) | (Value::Float(_), Value::Integer(_)) => {
            Ok(decimal_mixed(a, b, |x, y| x - y, |x, y| x - y))
        }
        (x, y) => Err(format!(
            "Cannot subtract {} from {}",
            crate::evaluator::type_name(y),
            crate::evaluator::type_name(x)
        )),
    }
}

fn multiply_values(a: &Value, b: &Value) -> Result<Value, String> {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => match x.checked_mul(*y) {
            Some(n) => Ok(Value::Integer(n)),
            None => Ok(Value::Float(*x as f64 * *y as f64)),
        },
        (Value::Float(x), Value::Float(y)) => Ok(Value::Float(x * y)),
        (Value::Integer(_), Value::Float(_)) | (Value::Float(_), Value::Integer(_)) => {
            Ok(decimal_mixed(a, b, |x, y| x * y, |x, y| x * y))
        }
        (x, y) => Err(format!(
            "Cannot multiply {} by {}",
            crate::evaluator::type_name(x),
            crate::evaluator::type_name(y)
        )),
    }
}

fn is_zero(v: &Value) -> bool {
    matches!(v, Value::Integer(0)) || matches!(v, Value::Float(f) if *f == 0.0)
}

fn divide_values(a: &Value, b: &Value) -> Result<Value, String> {
    if is_zero(b) {
        return Err("Cannot divide by zero".to_string());
    }
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => {
            // Exact division stays an integer
            match (x.checked_rem(*y), x.checked_div(*y)) {
                (Some(0), Some(q)) => Ok(Value::Integer(q)),
                _ => Ok(Value::Float(*x as f64 / *y as f64)),
            }
        }
        (Value::Float(x), Value::Float(y)) => Ok(Value::Float(x / y)),
        (Value::Integer(_), Value::Float(_)) | (Value::Float(_), Value::Integer(_)) => {
            Ok(decimal_mixed(a, b, |x, y| x / y, |x, y| x / y))
        }
        (x, y) => Err(format!(
            "Cannot divide {} by {}",
            crate::evaluator::type_name(x),
            crate::evaluator::type_name(y)
        )),
    }
}

fn modulo_values(a: &Value, b: &Value) -> Result<Value, String> {
    if is_zero(b) {
        return Err("Cannot modulo by zero".to_string());
    }
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => match x.checked_rem(*y) {
            Some(r) => Ok(Value::Integer(r)),
            None => Ok(Value::Float(*x as f64 % *y as f64)),
        },
        (Value::Float(x), Value::Float(y)) => Ok(Value::Float(x % y)),
        (Value::Integer(_), Value::Float(_)) | (Value::Float(_), Value::Integer(_)) => {
            Ok(decimal_mixed(a, b, |x, y| x % y, |x, y| x % y))
        }
        (x, y) => Err(format!(
            "Cannot compute modulo of {} by {}",
            crate::evaluator::type_name(x),
            crate::evaluator::type_name(y)
        )),
    }
}

/// Integer-preserving sum over a verified numeric list.
fn sum_list(items: &[Value]) -> Value {
    let mut sum_int: i64 = 0;
    let mut sum_float: f64 = 0.0;
    let mut has_float = false;

    for item in items {
        match item {
            Value::Integer(n) => {
                if has_float {
                    sum_float += *n as f64;
                } else if let Some(next) = sum_int.checked_add(*n) {
                    sum_int = next;
                } else {
                    sum_float = sum_int as f64 + *n as f64;
                    has_float = true;
                }
            }
            Value::Float(n) => {
                if !has_float {
                    sum_float = sum_int as f64;
                    has_float = true;
                }
                sum_float += n;
            }
            _ => {}
        }
    }

    if has_float {
        Value::Float(sum_float)
    } else {
        Value::Integer(sum_int)
    }
}

/// Pick an extreme over numbers and numeric lists, keeping the original
/// Integer/Float representation of the winner.
fn extreme(args: &[Value], keep_current: fn(f64, f64) -> bool) -> Value {
    let mut best: Option<Value> = None;
    let mut candidates = Vec::new();
    for arg in args {
        match arg {
            Value::Array(items) => candidates.extend(items.iter()),
            other => candidates.push(other),
        }
    }
    for candidate in candidates {
        let Some(n) = candidate.as_float() else {
            continue;
        };
        match &best {
            Some(current) if keep_current(float_of(current), n) => {}
            _ => best = Some(candidate.clone()),
        }
    }
    best.unwrap_or(Value::Null)
}

pub fn register(registry: &mut FunctionRegistry) {
    // ========================================
    // Arithmetic operators
    // ========================================

    registry.register(ExpressionEvaluator::new(
        "+",
        apply_with_error(
            |args| fold_binary(args, add_values),
            Some(verify_number_or_string),
        ),
        ReturnType::NUMBER | ReturnType::STRING,
        validate_arity(2, None),
    ));
    registry.register(ExpressionEvaluator::new(
        "-",
        apply_with_error(|args| fold_binary(args, subtract_values), Some(verify_number)),
        ReturnType::NUMBER,
        validate_arity(2, None),
    ));
    registry.register(ExpressionEvaluator::new(
        "*",
        apply_with_error(|args| fold_binary(args, multiply_values), Some(verify_number)),
        ReturnType::NUMBER,
        validate_arity(2, None),
    ));
    registry.register(ExpressionEvaluator::new(
        "/",
        apply_with_error(|args| fold_binary(args, divide_values), Some(verify_number)),
        ReturnType::NUMBER,
        validate_arity(2, None),
    ));
    registry.register(ExpressionEvaluator::new(
        "%",
        apply_with_error(|args| modulo_values(&args[0], &args[1]), Some(verify_number)),
        ReturnType::NUMBER,
        validate_arity(2, Some(2)),
    ));
    registry.register_alias("add", "+");
    registry.register_alias("sub", "-");
    registry.register_alias("mul", "*");
    registry.register_alias("div", "/");
    registry.register_alias("mod", "%");

    // ========================================
    // Aggregation
    // ========================================

    registry.register(ExpressionEvaluator::new(
        "min",
        apply(
            |args| extreme(args, |current, candidate| current <= candidate),
            Some(verify_number_or_numeric_list),
        ),
        ReturnType::NUMBER,
        validate_arity(1, None),
    ));
    registry.register(ExpressionEvaluator::new(
        "max",
        apply(
            |args| extreme(args, |current, candidate| current >= candidate),
            Some(verify_number_or_numeric_list),
        ),
        ReturnType::NUMBER,
        validate_arity(1, None),
    ));
    registry.register(ExpressionEvaluator::new(
        "sum",
        apply(
            |args| match &args[0] {
                Value::Array(items) => sum_list(items),
                _ => Value::Null,
            },
            Some(verify_numeric_list),
        ),
        ReturnType::NUMBER,
        validate_arity(1, Some(1)),
    ));
    registry.register(ExpressionEvaluator::new(
        "average",
        apply_with_error(
            |args| match &args[0] {
                Value::Array(items) if items.is_empty() => {
                    Err("average requires a non-empty list".to_string())
                }
                Value::Array(items) => {
                    let total = float_of(&sum_list(items));
                    Ok(Value::Float(total / items.len() as f64))
                }
                _ => Err("average requires a list".to_string()),
            },
            Some(verify_numeric_list),
        ),
        ReturnType::NUMBER,
        validate_arity(1, Some(1)),
    ));

    // ========================================
    // Rounding and roots
    // ========================================

    registry.register(ExpressionEvaluator::new(
        "abs",
        apply(
            |args| match &args[0] {
                Value::Integer(n) => match n.checked_abs() {
                    Some(a) => Value::Integer(a),
                    None => Value::Float((*n as f64).abs()),
                },
                Value::Float(n) => Value::Float(n.abs()),
                _ => Value::Null,
            },
            Some(verify_number),
        ),
        ReturnType::NUMBER,
        validate_arity(1, Some(1)),
    ));
    registry.register(ExpressionEvaluator::new(
        "sqrt",
        apply_with_error(
            |args| {
                let n = float_of(&args[0]);
                if n < 0.0 {
                    return Err("Cannot take the square root of a negative number".to_string());
                }
                Ok(Value::Float(n.sqrt()))
            },
            Some(verify_number),
        ),
        ReturnType::NUMBER,
        validate_arity(1, Some(1)),
    ));
    registry.register(ExpressionEvaluator::new(
        "floor",
        apply(
            |args| match &args[0] {
                Value::Integer(n) => Value::Integer(*n),
                Value::Float(n) => Value::Integer(n.floor() as i64),
                _ => Value::Null,
            },
            Some(verify_number),
        ),
        ReturnType::NUMBER,
        validate_arity(1, Some(1)),
    ));
    registry.register(ExpressionEvaluator::new(
        "ceiling",
        apply(
            |args| match &args[0] {
                Value::Integer(n) => Value::Integer(*n),
                Value::Float(n) => Value::Integer(n.ceil() as i64),
                _ => Value::Null,
            },
            Some(verify_number),
        ),
        ReturnType::NUMBER,
        validate_arity(1, Some(1)),
    ));
    registry.register(ExpressionEvaluator::new(
        "round",
        apply_with_error(
            |args| {
                let digits = match args.get(1) {
                    Some(Value::Integer(d)) => *d,
                    Some(Value::Float(d)) if d.fract() == 0.0 => *d as i64,
                    Some(_) => return Err("round requires an integer digit count".to_string()),
                    None => 0,
                };
                if !(0..=15).contains(&digits) {
                    return Err("round requires a digit count between 0 and 15".to_string());
                }
                let n = match &args[0] {
                    Value::Integer(n) => return Ok(Value::Integer(*n)),
                    Value::Float(n) => *n,
                    _ => return Err("round requires a number".to_string()),
                };
                if digits == 0 {
                    Ok(Value::Integer(n.round() as i64))
                } else {
                    let factor = 10f64.powi(digits as i32);
                    Ok(Value::Float((n * factor).round() / factor))
                }
            },
            Some(verify_number),
        ),
        ReturnType::NUMBER,
        validate_order(&[ReturnType::NUMBER], &[ReturnType::NUMBER]),
    ));

    // ========================================
    // Sequences
    // ========================================

    registry.register(ExpressionEvaluator::new(
        "range",
        apply_with_error(
            |args| match (&args[0], &args[1]) {
                (Value::Integer(start), Value::Integer(count)) => {
                    if *count < 1 {
                        return Err("range requires a count greater than zero".to_string());
                    }
                    Ok(Value::Array(
                        (0..*count)
                            .map(|i| Value::Integer(start.wrapping_add(i)))
                            .collect(),
                    ))
                }
                _ => Err("range requires integer arguments".to_string()),
            },
            Some(verify_integer),
        ),
        ReturnType::ARRAY,
        validate_arity(2, Some(2)),
    ));
}
