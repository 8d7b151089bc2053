//! # Nutmeg Expression Language - Abstract Syntax Tree
//!
//! This module defines the syntax tree for the Nutmeg expression language,
//! a small formula language evaluated against external state ("memory").
//!
//! ## Architecture Overview
//!
//! The AST module is organized into focused submodules:
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expression]** - The expression node: an evaluator descriptor plus children
//!
//! ## Quick Start
//!
//! ```text
//! user.age >= 18 && user.verified
//! ```
//!
//! This expression reads two paths from memory and combines them with
//! short-circuiting logic.
//!
//! ## Core Concepts
//!
//! ### One node shape
//!
//! Every construct the parser produces is the same node: a reference to a
//! registered evaluator plus child expressions. `1 + 2` is the `+` evaluator
//! with two constant children; `toUpper(name)` is the `toUpper` evaluator
//! with one accessor child. There is no fixed operator enum, so hosts can
//! register new functions without touching the tree.
//!
//! ### Accessors
//!
//! - `user.name` - property access, built from `Accessor` nodes
//! - `items[0]` - index access, built from `Element` nodes (negative indices
//!   count from the end)
//! - Constant accessor chains are collapsed into a single path string and
//!   handed to memory in one call
//!
//! ### Type System
//!
//! Values support all JSON types (null, boolean, integer, float, string,
//! array, object) with intelligent arithmetic that preserves integer types
//! when results are whole numbers. A path that resolves to nothing produces
//! no value and no error.
//!
//! ## Examples
//!
//! ### String interpolation
//!
//! ```text
//! `Hello ${user.name}, you have ${count} items`
//! ```
//!
//! ### Collection functions
//!
//! ```text
//! where(items, x, x.price > 100)
//! ```
//!
//! ### Null coalescing
//!
//! ```text
//! user.nickname ?? user.name ?? "anonymous"
//! ```
pub mod expression;
pub mod tokens;

pub use expression::Expression;
pub use tokens::{Position, Token};
