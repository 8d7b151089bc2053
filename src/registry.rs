use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use crate::builtins;
use crate::evaluator::{
    ExpressionEvaluator, ReturnType, apply_with_error, validate_arity,
};
use crate::value::Value;

/// The table of evaluators a parser resolves names against.
///
/// Parsing binds each node to its evaluator by `Arc`, so a registry can be
/// mutated or dropped after parsing without affecting existing trees.
/// Mutation is configuration-time only: re-registering a name does not
/// change expressions already parsed against it.
pub struct FunctionRegistry {
    evaluators: HashMap<String, Arc<ExpressionEvaluator>>,
    constants: HashMap<String, Value>,
}

impl FunctionRegistry {
    /// An almost-empty registry: only the structural accessor machinery
    /// (`Accessor`, `Element`) every parse needs.
    pub fn new() -> Self {
        let mut registry = FunctionRegistry {
            evaluators: HashMap::new(),
            constants: HashMap::new(),
        };
        builtins::access::register_structural(&mut registry);
        registry
    }

    /// A registry seeded with every built-in function.
    pub fn standard() -> Self {
        let mut registry = FunctionRegistry::new();
        builtins::register_all(&mut registry);
        registry
    }

    /// Find the evaluator registered under a name.
    pub fn lookup(&self, name: &str) -> Option<Arc<ExpressionEvaluator>> {
        self.evaluators.get(name).cloned()
    }

    /// The value of a registered named constant.
    pub fn constant(&self, name: &str) -> Option<Value> {
        self.constants.get(name).cloned()
    }

    /// Add or overwrite an evaluator.
    pub fn register(&mut self, evaluator: ExpressionEvaluator) {
        self.evaluators
            .insert(evaluator.expr_type.clone(), Arc::new(evaluator));
    }

    /// Register an additional name for an already-registered evaluator.
    pub fn register_alias(&mut self, alias: &str, name: &str) {
        if let Some(evaluator) = self.evaluators.get(name).cloned() {
            self.evaluators.insert(alias.to_string(), evaluator);
        }
    }

    /// Convenience for hosts: an arity-checked function over evaluated
    /// arguments, with domain failures reported through `Err`.
    pub fn register_function(
        &mut self,
        name: &str,
        min_args: usize,
        max_args: Option<usize>,
        func: impl Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    ) {
        self.register(ExpressionEvaluator::new(
            name,
            apply_with_error(func, None),
            ReturnType::ANY,
            validate_arity(min_args, max_args),
        ));
    }

    /// Bind a bare name to a fixed value at parse time.
    pub fn register_constant(&mut self, name: &str, value: Value) {
        self.constants.insert(name.to_string(), value);
    }

    /// All registered function names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.evaluators.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        FunctionRegistry::standard()
    }
}

static STANDARD: LazyLock<FunctionRegistry> = LazyLock::new(FunctionRegistry::standard);

/// The process-wide shared standard registry.
///
/// Built once on first use and never mutated afterwards; callers wanting a
/// custom table construct their own [`FunctionRegistry`].
pub fn standard_functions() -> &'static FunctionRegistry {
    &STANDARD
}
