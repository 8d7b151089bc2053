// tests/engine_tests.rs

use std::sync::Arc;

use serde_json::json;

use nutmeg_lang::cache::ParseCache;
use nutmeg_lang::memory::SimpleObjectMemory;
use nutmeg_lang::options::Options;
use nutmeg_lang::parser::{parse, parse_with};
use nutmeg_lang::registry::{FunctionRegistry, standard_functions};
use nutmeg_lang::value::Value;

fn eval_with(expr: &nutmeg_lang::ast::Expression, memory: &SimpleObjectMemory) -> Option<Value> {
    let (value, error) = expr.try_evaluate(memory, &Options::default());
    assert_eq!(error, None);
    value
}

// ============================================================================
// Custom registries
// ============================================================================

#[test]
fn test_custom_functions_are_scoped_to_their_registry() {
    let mut registry = FunctionRegistry::standard();
    registry.register_function("double", 1, Some(1), |args| match &args[0] {
        Value::Integer(n) => Ok(Value::Integer(n * 2)),
        _ => Err("double requires an integer".to_string()),
    });

    let expr = parse_with("double(21)", &registry).unwrap();
    let memory = SimpleObjectMemory::from_json(json!({}));
    assert_eq!(eval_with(&expr, &memory), Some(Value::Integer(42)));

    // The standard registry has never heard of it
    let result = parse("double(21)");
    assert!(result.is_err());
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("does not have an evaluator")
    );
}

#[test]
fn test_custom_function_errors_propagate() {
    let mut registry = FunctionRegistry::standard();
    registry.register_function("double", 1, Some(1), |args| match &args[0] {
        Value::Integer(n) => Ok(Value::Integer(n * 2)),
        _ => Err("double requires an integer".to_string()),
    });

    let expr = parse_with("double('x')", &registry).unwrap();
    let memory = SimpleObjectMemory::from_json(json!({}));
    let (value, error) = expr.try_evaluate(&memory, &Options::default());
    assert_eq!(value, None);
    assert_eq!(error, Some("double requires an integer".to_string()));
}

#[test]
fn test_custom_function_arity_is_checked_at_parse_time() {
    let mut registry = FunctionRegistry::standard();
    registry.register_function("double", 1, Some(1), |args| Ok(args[0].clone()));

    let result = parse_with("double(1, 2)", &registry);
    assert!(result.is_err());
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("double requires 1 arguments, got 2")
    );
}

#[test]
fn test_registered_constants_bind_at_parse_time() {
    let mut registry = FunctionRegistry::standard();
    registry.register_constant("answer", Value::Integer(42));

    let expr = parse_with("answer", &registry).unwrap();
    assert_eq!(expr.constant_value(), Some(&Value::Integer(42)));

    let expr = parse_with("answer + 1", &registry).unwrap();
    let memory = SimpleObjectMemory::from_json(json!({}));
    assert_eq!(eval_with(&expr, &memory), Some(Value::Integer(43)));

    // Without the registration the same name is a memory lookup
    let expr = parse("answer").unwrap();
    assert_eq!(expr.constant_value(), None);
    assert_eq!(expr.expr_type(), "Accessor");
}

#[test]
fn test_reregistering_does_not_affect_parsed_trees() {
    let mut registry = FunctionRegistry::standard();
    registry.register_function("answer", 0, Some(0), |_| Ok(Value::Integer(42)));
    let expr = parse_with("answer()", &registry).unwrap();

    // Overwrite the name; the existing tree keeps its evaluator
    registry.register_function("answer", 0, Some(0), |_| Ok(Value::Integer(0)));
    let rebound = parse_with("answer()", &registry).unwrap();

    let memory = SimpleObjectMemory::from_json(json!({}));
    assert_eq!(eval_with(&expr, &memory), Some(Value::Integer(42)));
    assert_eq!(eval_with(&rebound, &memory), Some(Value::Integer(0)));
}

#[test]
fn test_standard_registry_is_shared_and_aliased() {
    let registry = standard_functions();
    assert!(registry.lookup("+").is_some());
    assert!(registry.lookup("foreach").is_some());

    // Aliases resolve to the very same evaluator
    let plus = registry.lookup("+").unwrap();
    let add = registry.lookup("add").unwrap();
    assert!(Arc::ptr_eq(&plus, &add));

    let names = registry.names();
    assert!(names.contains(&"formatDateTime".to_string()));
    assert!(names.contains(&"where".to_string()));
}

// ============================================================================
// Parse cache
// ============================================================================

#[test]
fn test_cache_hits_return_the_same_tree() {
    let cache = ParseCache::new(8);
    let registry = standard_functions();

    let first = cache.get_or_parse("user.name", registry).unwrap();
    let second = cache.get_or_parse("user.name", registry).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);

    // Different text is a different entry
    let other = cache.get_or_parse("user.email", registry).unwrap();
    assert!(!Arc::ptr_eq(&first, &other));
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_cache_evicts_least_recently_used() {
    let cache = ParseCache::new(2);
    let registry = standard_functions();

    let one = cache.get_or_parse("1", registry).unwrap();
    let two = cache.get_or_parse("2", registry).unwrap();
    // Touch "1" so "2" becomes the eviction candidate
    assert!(Arc::ptr_eq(&one, &cache.get_or_parse("1", registry).unwrap()));

    cache.get_or_parse("3", registry).unwrap();
    assert_eq!(cache.len(), 2);

    assert!(Arc::ptr_eq(&one, &cache.get_or_parse("1", registry).unwrap()));
    // "2" was dropped and re-parses fresh
    assert!(!Arc::ptr_eq(&two, &cache.get_or_parse("2", registry).unwrap()));
}

#[test]
fn test_cache_does_not_store_failures() {
    let cache = ParseCache::new(4);
    let registry = standard_functions();

    assert!(cache.get_or_parse("definitelyNot(", registry).is_err());
    assert!(cache.is_empty());
}

#[test]
fn test_cache_clear() {
    let cache = ParseCache::new(4);
    let registry = standard_functions();

    cache.get_or_parse("1 + 1", registry).unwrap();
    assert_eq!(cache.len(), 1);
    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn test_cached_trees_evaluate_like_fresh_ones() {
    let cache = ParseCache::new(4);
    let memory = SimpleObjectMemory::from_json(json!({"user": {"name": "Ada"}, "total": 3}));

    let expr = cache
        .get_or_parse("`${user.name} owes ${total}`", standard_functions())
        .unwrap();
    let (value, error) = expr.try_evaluate(&memory, &Options::default());
    assert_eq!(error, None);
    assert_eq!(value, Some(Value::String("Ada owes 3".into())));
}

// ============================================================================
// Determinism and sharing
// ============================================================================

#[test]
fn test_evaluation_is_deterministic() {
    let memory = SimpleObjectMemory::from_json(json!({"user": {"b": 1, "a": 2, "c": 3}}));
    let expr = parse("foreach(user, p, p.key)").unwrap();

    let first = expr.try_evaluate(&memory, &Options::default());
    let second = expr.try_evaluate(&memory, &Options::default());
    assert_eq!(first, second);
    assert_eq!(first.0, Some(Value::from(json!(["a", "b", "c"]))));
}

#[test]
fn test_one_tree_evaluates_against_many_memories() {
    let expr = parse("price * quantity").unwrap();

    let small = SimpleObjectMemory::from_json(json!({"price": 2, "quantity": 3}));
    let large = SimpleObjectMemory::from_json(json!({"price": 100, "quantity": 7}));
    assert_eq!(eval_with(&expr, &small), Some(Value::Integer(6)));
    assert_eq!(eval_with(&expr, &large), Some(Value::Integer(700)));
}

#[test]
fn test_parsed_trees_are_shared_across_threads() {
    let expr = Arc::new(parse("price * quantity").unwrap());

    let mut handles = Vec::new();
    for i in 1..=4i64 {
        let expr = Arc::clone(&expr);
        handles.push(std::thread::spawn(move || {
            let memory = SimpleObjectMemory::from_json(json!({"price": i, "quantity": 10}));
            let (value, error) = expr.try_evaluate(&memory, &Options::default());
            assert_eq!(error, None);
            assert_eq!(value, Some(Value::Integer(i * 10)));
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_cache_is_shared_across_threads() {
    let cache = Arc::new(ParseCache::new(16));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let cache = Arc::clone(&cache);
        handles.push(std::thread::spawn(move || {
            let expr = cache.get_or_parse("1 + 1", standard_functions()).unwrap();
            let memory = SimpleObjectMemory::from_json(json!({}));
            let (value, error) = expr.try_evaluate(&memory, &Options::default());
            assert_eq!(error, None);
            assert_eq!(value, Some(Value::Integer(2)));
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(cache.len(), 1);
}
