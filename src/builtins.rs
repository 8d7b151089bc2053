//! # Nutmeg Built-in Functions
//!
//! Every built-in is an [`ExpressionEvaluator`](crate::evaluator::ExpressionEvaluator)
//! registered under its expression-text name. Most are built from the
//! [`apply`](crate::evaluator::apply) combinators, which evaluate and
//! shape-check arguments before the domain body runs; only operators that
//! need laziness (`&&`, `||`, `if`, `coalesce`) or the raw node (accessors,
//! `setPathToValue`) install their own delegates.
//!
//! Grouped by domain:
//!
//! - **[math]** - arithmetic operators, aggregation, rounding, `range`
//! - **[comparison]** - equality and ordering operators, `exists`
//! - **[logic]** - short-circuiting `&&` / `||` / `if` / `coalesce`, `!`
//! - **[string]** - concatenation, casing, search, `split`, `isMatch`
//! - **[collection]** - counting, slicing, set operations, `foreach`/`where`
//! - **[datetime]** - timestamp parsing and formatting, tick conversion
//! - **[conversion]** - type conversions, `json`, type tests
//! - **[access]** - accessor machinery and memory read/write functions

pub mod access;
pub mod collection;
pub mod comparison;
pub mod conversion;
pub mod datetime;
pub mod logic;
pub mod math;
pub mod string;

use crate::registry::FunctionRegistry;

/// Seed a registry with the whole standard table.
pub(crate) fn register_all(registry: &mut FunctionRegistry) {
    math::register(registry);
    comparison::register(registry);
    logic::register(registry);
    string::register(registry);
    collection::register(registry);
    datetime::register(registry);
    conversion::register(registry);
    access::register(registry);
}
