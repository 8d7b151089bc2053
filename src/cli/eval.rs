//! Evaluate expressions against JSON state

use std::collections::HashMap;

use super::CliError;
use crate::{Options, SimpleObjectMemory, Value, parse, standard_functions};

/// Options for the eval command
#[derive(Debug, Clone, Default)]
pub struct EvalOptions {
    /// The expression to evaluate
    pub expression: String,
    /// JSON state string
    pub input: Option<String>,
    /// Pretty-print the output
    pub pretty: bool,
}

/// Parse and evaluate an expression, rendering the result as JSON.
///
/// Without input the expression runs against empty state, so pure
/// expressions (`add(1, 2)`, `utcNow()`) work with no document at hand.
/// An expression that resolves to nothing renders as JSON `null`.
pub fn execute_eval(options: &EvalOptions) -> Result<serde_json::Value, CliError> {
    let expr = parse(&options.expression)?;

    let memory = match options.input.as_deref() {
        Some(text) => {
            let json: serde_json::Value = serde_json::from_str(text).map_err(CliError::Json)?;
            SimpleObjectMemory::from_json(json)
        }
        None => SimpleObjectMemory::new(Value::Object(HashMap::new())),
    };

    let (value, error) = expr.try_evaluate(&memory, &Options::default());
    if let Some(error) = error {
        return Err(CliError::Eval(error));
    }
    Ok(serde_json::Value::from(value.unwrap_or(Value::Null)))
}

/// Parse an expression without evaluating it.
pub fn execute_check(expression: &str) -> Result<(), CliError> {
    parse(expression).map(|_| ()).map_err(CliError::Parse)
}

/// Names of every function in the standard registry, sorted.
pub fn function_names() -> Vec<String> {
    standard_functions().names()
}
