use std::fmt;
use std::sync::Arc;

use crate::evaluator::{EvalResult, ExpressionEvaluator, ReturnType};
use crate::memory::Memory;
use crate::options::Options;
use crate::value::Value;

/// A parsed expression: an evaluator descriptor plus child expressions.
///
/// Every construct in the language is this one shape. `1 + 2` is the node
/// for the registered `+` evaluator with two constant children;
/// `toUpper(user.name)` is the `toUpper` evaluator over an accessor chain.
/// The descriptor is shared with the registry through an `Arc`, so trees are
/// cheap to hand out from the parse cache and safe to evaluate from several
/// threads at once against different memories.
///
/// # Examples
///
/// ```
/// use nutmeg_lang::{parse, Options, SimpleObjectMemory, Value};
///
/// let expr = parse("2 + 3").unwrap();
/// let memory = SimpleObjectMemory::new(Value::Object(Default::default()));
/// let (value, error) = expr.try_evaluate(&memory, &Options::default());
/// assert_eq!(error, None);
/// assert_eq!(value, Some(Value::Integer(5)));
/// ```
#[derive(Clone)]
pub struct Expression {
    /// Descriptor implementing this node's behavior, shared with the registry
    pub evaluator: Arc<ExpressionEvaluator>,

    /// Child expressions, exclusively owned by this node
    pub children: Vec<Expression>,

    /// Captured literal, present only on constant nodes
    value: Option<Value>,
}

impl Expression {
    /// Build a node from a descriptor and its children.
    pub fn new(evaluator: Arc<ExpressionEvaluator>, children: Vec<Expression>) -> Self {
        Expression {
            evaluator,
            children,
            value: None,
        }
    }

    /// Build a constant leaf capturing a literal value.
    pub fn constant(value: Value) -> Self {
        Expression {
            evaluator: crate::evaluator::constant_evaluator(),
            children: Vec::new(),
            value: Some(value),
        }
    }

    /// The registered name this node was built from (`"+"`, `"average"`, ...).
    pub fn expr_type(&self) -> &str {
        &self.evaluator.expr_type
    }

    /// Best-effort static type of the value this node produces.
    ///
    /// Constants report the type of their captured value, so order
    /// validators can reject literal arguments of the wrong type at parse
    /// time. `null` stays dynamic.
    pub fn return_type(&self) -> ReturnType {
        match &self.value {
            Some(Value::Boolean(_)) => ReturnType::BOOLEAN,
            Some(Value::Integer(_)) | Some(Value::Float(_)) => ReturnType::NUMBER,
            Some(Value::String(_)) => ReturnType::STRING,
            Some(Value::Array(_)) => ReturnType::ARRAY,
            Some(Value::Null) | Some(Value::Object(_)) => ReturnType::OBJECT,
            None => self.evaluator.return_type,
        }
    }

    /// The captured literal for constant nodes, `None` otherwise.
    pub fn constant_value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Evaluate against a memory.
    ///
    /// Returns the `(value, error)` pair: at most one side is set, and a
    /// `(None, None)` result means the expression resolved to nothing (an
    /// unbound path), which is not an error.
    pub fn try_evaluate(&self, memory: &dyn Memory, options: &Options) -> EvalResult {
        (self.evaluator.evaluate)(self, memory, options)
    }

    /// Run this node's parse-time validator.
    pub fn validate(&self) -> Result<(), String> {
        (self.evaluator.validate)(self)
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

const BINARY_SYMBOLS: &[&str] = &[
    "+", "-", "*", "/", "%", "==", "!=", "<", "<=", ">", ">=", "&&", "||", "??",
];

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expr_type() {
            "Constant" => match self.constant_value() {
                Some(value) => fmt_constant(f, value),
                None => write!(f, "null"),
            },
            "Accessor" => {
                let name = match self.children.first().and_then(|c| c.constant_value()) {
                    Some(Value::String(s)) => s.as_str(),
                    _ => "?",
                };
                match self.children.get(1) {
                    Some(parent) => write!(f, "{}.{}", parent, name),
                    None => write!(f, "{}", name),
                }
            }
            "Element" => write!(f, "{}[{}]", self.children[0], self.children[1]),
            "!" => write!(f, "!{}", self.children[0]),
            op if BINARY_SYMBOLS.contains(&op) && self.children.len() == 2 => {
                write!(f, "({} {} {})", self.children[0], op, self.children[1])
            }
            name => {
                write!(f, "{}(", name)?;
                for (i, child) in self.children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
        }
    }
}

fn fmt_constant(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::String(s) => write!(f, "'{}'", s),
        Value::Array(arr) => {
            write!(f, "[")?;
            for (i, item) in arr.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                fmt_constant(f, item)?;
            }
            write!(f, "]")
        }
        other => write!(f, "{}", other.as_string()),
    }
}
