pub mod ast;
pub mod builtins;
pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod evaluator;
pub mod lexer;
pub mod memory;
pub mod options;
pub mod parser;
pub mod registry;
pub mod value;

pub use ast::{Expression, Position, Token};
pub use cache::ParseCache;
pub use evaluator::{
    EvalResult, EvaluateExpressionDelegate, ExpressionEvaluator, ReturnType,
    ValidateExpressionDelegate, VerifyExpression,
};
pub use lexer::Lexer;
pub use memory::{Memory, ScopedMemory, SimpleObjectMemory};
pub use options::Options;
pub use parser::{ParseError, Parser, parse, parse_with};
pub use registry::{FunctionRegistry, standard_functions};
pub use value::Value;
