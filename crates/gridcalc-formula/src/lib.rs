//! # gridcalc-formula
//!
//! Formula engine for gridcalc.
//!
//! This crate provides:
//! - Tokenizing and parsing (text → AST)
//! - Evaluation with two-phase cycle detection (AST → value)
//! - Eager and lazy functions, with a small standard set
//! - A dependency-tracked [`Environment`] that parses and evaluates cells on demand and
//!   invalidates only what an edit can affect
//!
//! ## Example
//!
//! ```rust
//! use gridcalc_formula::{Environment, EnvironmentConfig, FormulaValue};
//!
//! let env = Environment::new(
//!     EnvironmentConfig::default()
//!         .cell("A1", "2")
//!         .cell("A2", "3")
//!         .cell("A3", "=SUM(A1:A2) * 10"),
//! );
//! assert_eq!(env.get_value(&"A3".into()).unwrap(), FormulaValue::Number(50.0));
//! assert_eq!(env.evaluate_query("=A3 > 40").unwrap(), FormulaValue::Boolean(true));
//! ```

pub mod ast;
pub mod cache;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod references;
pub mod stream;
pub mod tokenizer;
pub mod value;

pub use ast::{BinaryOperator, Expression, UnaryOperator};
pub use environment::{CalculationStats, ChangeCallback, Environment, EnvironmentConfig};
pub use error::{CycleSignal, EvalFailure, EvalResult, FormulaError, FormulaResult};
pub use evaluator::{evaluate_cell_at, evaluate_query, CellLookup, EvalContext, LazyArg};
pub use functions::{FunctionDescriptor, FunctionRegistry};
pub use parser::{parse_cell, parse_formula, parse_text, ParsedCell};
pub use references::ReferencesMap;
pub use value::FormulaValue;
