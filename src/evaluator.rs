use std::sync::{Arc, LazyLock};

use crate::{ast::Expression, memory::Memory, options::Options, value::Value};

/// Outcome of evaluating an expression: `(value, error)`.
///
/// At most one side is set. `(None, None)` means the expression resolved to
/// nothing (an unbound memory path), which is not an error. When the error
/// side is set the value side must be ignored.
pub type EvalResult = (Option<Value>, Option<String>);

/// Implements the behavior of one registered expression type.
///
/// The delegate receives the node itself, so lazy operators can decide which
/// children to evaluate. Delegates never panic for domain failures; they put
/// the message in the error slot instead.
pub type EvaluateExpressionDelegate =
    Arc<dyn Fn(&Expression, &dyn Memory, &Options) -> EvalResult + Send + Sync>;

/// Parse-time structural check, run once per node when the tree is built.
pub type ValidateExpressionDelegate = Arc<dyn Fn(&Expression) -> Result<(), String> + Send + Sync>;

/// Runtime shape check for one evaluated argument.
///
/// Receives the value, the child expression it came from (for the message),
/// and the child's position. Returns an error message on rejection.
pub type VerifyExpression = fn(&Value, &Expression, usize) -> Option<String>;

/// Returns a human-readable type name for a Value
pub fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Boolean(_) => "boolean",
        Value::Integer(_) => "integer",
        Value::Float(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Return types
// ============================================================================

/// Best-effort static type hint, used only by parse-time validators.
///
/// A bitset so an evaluator can declare several possible results
/// (`ReturnType::NUMBER | ReturnType::STRING`). `OBJECT` doubles as the
/// dynamic wildcard: either side of a check being `OBJECT` passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnType(u8);

impl ReturnType {
    pub const BOOLEAN: ReturnType = ReturnType(1);
    pub const NUMBER: ReturnType = ReturnType(2);
    pub const OBJECT: ReturnType = ReturnType(4);
    pub const STRING: ReturnType = ReturnType(8);
    pub const ARRAY: ReturnType = ReturnType(16);
    pub const ANY: ReturnType = ReturnType(31);

    /// True when the two sets share a bit or either side is dynamic.
    pub fn accepts(self, other: ReturnType) -> bool {
        self.0 & other.0 != 0
            || self.0 & ReturnType::OBJECT.0 != 0
            || other.0 & ReturnType::OBJECT.0 != 0
    }
}

impl std::ops::BitOr for ReturnType {
    type Output = ReturnType;

    fn bitor(self, rhs: ReturnType) -> ReturnType {
        ReturnType(self.0 | rhs.0)
    }
}

impl std::fmt::Display for ReturnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = [
            (ReturnType::BOOLEAN, "boolean"),
            (ReturnType::NUMBER, "number"),
            (ReturnType::OBJECT, "object"),
            (ReturnType::STRING, "string"),
            (ReturnType::ARRAY, "array"),
        ];
        let mut first = true;
        for (bit, name) in names {
            if self.0 & bit.0 != 0 {
                if !first {
                    write!(f, " or ")?;
                }
                write!(f, "{}", name)?;
                first = false;
            }
        }
        if first {
            write!(f, "nothing")?;
        }
        Ok(())
    }
}

// ============================================================================
// Evaluator descriptor
// ============================================================================

/// The registered implementation of one expression type.
///
/// Owned by a [`FunctionRegistry`](crate::registry::FunctionRegistry) and
/// shared into every parsed node of that type through an `Arc`, so a cached
/// tree keeps working even if the registry is dropped.
pub struct ExpressionEvaluator {
    /// Name this evaluator is registered under (`"+"`, `"average"`, ...)
    pub expr_type: String,

    /// Evaluation behavior
    pub evaluate: EvaluateExpressionDelegate,

    /// Static hint for the value this evaluator produces
    pub return_type: ReturnType,

    /// Structural check run at parse time; rejection is a parse error
    pub validate: ValidateExpressionDelegate,
}

impl ExpressionEvaluator {
    pub fn new(
        expr_type: &str,
        evaluate: EvaluateExpressionDelegate,
        return_type: ReturnType,
        validate: ValidateExpressionDelegate,
    ) -> Self {
        ExpressionEvaluator {
            expr_type: expr_type.to_string(),
            evaluate,
            return_type,
            validate,
        }
    }
}

impl std::fmt::Debug for ExpressionEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionEvaluator")
            .field("expr_type", &self.expr_type)
            .field("return_type", &self.return_type)
            .finish()
    }
}

static CONSTANT: LazyLock<Arc<ExpressionEvaluator>> = LazyLock::new(|| {
    Arc::new(ExpressionEvaluator::new(
        "Constant",
        Arc::new(|expr, _, _| (expr.constant_value().cloned(), None)),
        ReturnType::ANY,
        validate_any(),
    ))
});

/// The shared descriptor behind every constant leaf.
pub fn constant_evaluator() -> Arc<ExpressionEvaluator> {
    CONSTANT.clone()
}

// ============================================================================
// Apply combinators
// ============================================================================

/// Evaluate all children left to right, stopping at the first error.
///
/// A child that resolves to nothing materializes as `Value::Null`; the
/// optional verifier then shape-checks each value before the caller's body
/// ever runs.
pub fn evaluate_children(
    expr: &Expression,
    memory: &dyn Memory,
    options: &Options,
    verify: Option<VerifyExpression>,
) -> Result<Vec<Value>, String> {
    let mut args = Vec::with_capacity(expr.children.len());
    for (i, child) in expr.children.iter().enumerate() {
        let (value, error) = child.try_evaluate(memory, options);
        if let Some(error) = error {
            return Err(error);
        }
        let value = value.unwrap_or(Value::Null);
        if let Some(verify) = verify {
            if let Some(error) = verify(&value, child, i) {
                return Err(error);
            }
        }
        args.push(value);
    }
    Ok(args)
}

/// Wrap an infallible body: children are evaluated and verified first, so
/// the body only ever sees values that passed the shape check.
pub fn apply(
    func: impl Fn(&[Value]) -> Value + Send + Sync + 'static,
    verify: Option<VerifyExpression>,
) -> EvaluateExpressionDelegate {
    Arc::new(move |expr, memory, options| {
        match evaluate_children(expr, memory, options, verify) {
            Ok(args) => (Some(func(&args)), None),
            Err(error) => (None, Some(error)),
        }
    })
}

/// Like [`apply`], for bodies with domain failures of their own
/// (division by zero, malformed timestamps, ...).
pub fn apply_with_error(
    func: impl Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    verify: Option<VerifyExpression>,
) -> EvaluateExpressionDelegate {
    Arc::new(move |expr, memory, options| {
        match evaluate_children(expr, memory, options, verify) {
            Ok(args) => match func(&args) {
                Ok(value) => (Some(value), None),
                Err(error) => (None, Some(error)),
            },
            Err(error) => (None, Some(error)),
        }
    })
}

/// Like [`apply_with_error`], for bodies that also read evaluation options
/// (locale, list separator).
pub fn apply_with_options_and_error(
    func: impl Fn(&[Value], &Options) -> Result<Value, String> + Send + Sync + 'static,
    verify: Option<VerifyExpression>,
) -> EvaluateExpressionDelegate {
    Arc::new(move |expr, memory, options| {
        match evaluate_children(expr, memory, options, verify) {
            Ok(args) => match func(&args, options) {
                Ok(value) => (Some(value), None),
                Err(error) => (None, Some(error)),
            },
            Err(error) => (None, Some(error)),
        }
    })
}

// ============================================================================
// Runtime verifiers
// ============================================================================

pub fn verify_number(value: &Value, expr: &Expression, _: usize) -> Option<String> {
    match value {
        Value::Integer(_) | Value::Float(_) => None,
        _ => Some(format!("{} is not a number", expr)),
    }
}

pub fn verify_integer(value: &Value, expr: &Expression, _: usize) -> Option<String> {
    match value {
        Value::Integer(_) => None,
        _ => Some(format!("{} is not an integer", expr)),
    }
}

pub fn verify_string(value: &Value, expr: &Expression, _: usize) -> Option<String> {
    match value {
        Value::String(_) => None,
        _ => Some(format!("{} is not a string", expr)),
    }
}

pub fn verify_number_or_string(value: &Value, expr: &Expression, _: usize) -> Option<String> {
    match value {
        Value::Integer(_) | Value::Float(_) | Value::String(_) => None,
        _ => Some(format!("{} is not a number or string", expr)),
    }
}

pub fn verify_list(value: &Value, expr: &Expression, _: usize) -> Option<String> {
    match value {
        Value::Array(_) => None,
        _ => Some(format!("{} is not a list", expr)),
    }
}

pub fn verify_numeric_list(value: &Value, expr: &Expression, _: usize) -> Option<String> {
    match value {
        Value::Array(items) => {
            if items
                .iter()
                .any(|v| !matches!(v, Value::Integer(_) | Value::Float(_)))
            {
                Some(format!("{} is not a list of numbers", expr))
            } else {
                None
            }
        }
        _ => Some(format!("{} is not a list", expr)),
    }
}

pub fn verify_list_or_string(value: &Value, expr: &Expression, _: usize) -> Option<String> {
    match value {
        Value::Array(_) | Value::String(_) => None,
        _ => Some(format!("{} is not a list or string", expr)),
    }
}

pub fn verify_number_or_numeric_list(value: &Value, expr: &Expression, _: usize) -> Option<String> {
    match value {
        Value::Integer(_) | Value::Float(_) => None,
        Value::Array(items)
            if items
                .iter()
                .all(|v| matches!(v, Value::Integer(_) | Value::Float(_))) =>
        {
            None
        }
        _ => Some(format!("{} is not a number or list of numbers", expr)),
    }
}

// ============================================================================
// Parse-time validators
// ============================================================================

/// No structural requirements.
pub fn validate_any() -> ValidateExpressionDelegate {
    Arc::new(|_| Ok(()))
}

/// Between `min` and `max` children, any type.
pub fn validate_arity(min: usize, max: Option<usize>) -> ValidateExpressionDelegate {
    Arc::new(move |expr| {
        let count = expr.children.len();
        if count < min {
            return Err(match max {
                Some(max) if max == min => {
                    format!("{} requires {} arguments, got {}", expr.expr_type(), min, count)
                }
                _ => format!(
                    "{} requires at least {} arguments, got {}",
                    expr.expr_type(),
                    min,
                    count
                ),
            });
        }
        if let Some(max) = max {
            if count > max {
                return Err(format!(
                    "{} accepts at most {} arguments, got {}",
                    expr.expr_type(),
                    max,
                    count
                ));
            }
        }
        Ok(())
    })
}

/// Exactly `required` children of the given static types, optionally
/// followed by `optional` ones. `OBJECT` on either side is a wildcard.
pub fn validate_order(
    optional: &[ReturnType],
    required: &[ReturnType],
) -> ValidateExpressionDelegate {
    let optional = optional.to_vec();
    let required = required.to_vec();
    Arc::new(move |expr| {
        let count = expr.children.len();
        if count < required.len() || count > required.len() + optional.len() {
            if optional.is_empty() {
                return Err(format!(
                    "{} requires {} arguments, got {}",
                    expr.expr_type(),
                    required.len(),
                    count
                ));
            }
            return Err(format!(
                "{} requires between {} and {} arguments, got {}",
                expr.expr_type(),
                required.len(),
                required.len() + optional.len(),
                count
            ));
        }
        for (i, child) in expr.children.iter().enumerate() {
            let expected = if i < required.len() {
                required[i]
            } else {
                optional[i - required.len()]
            };
            if !expected.accepts(child.return_type()) {
                return Err(format!(
                    "argument {} of {} should be a {}",
                    i + 1,
                    expr.expr_type(),
                    expected
                ));
            }
        }
        Ok(())
    })
}
