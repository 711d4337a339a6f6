//! Function registry and the standard function set
//!
//! A function is either eager, receiving fully evaluated arguments, or lazy, receiving one
//! [`LazyArg`] per argument and evaluating only what it needs.

pub mod logical;
pub mod math;
pub mod text;

use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::LazyArg;
use crate::value::FormulaValue;
use ahash::AHashMap;
use std::fmt;
use std::rc::Rc;

/// Eager function signature
pub type EagerFn = dyn Fn(&[FormulaValue]) -> FormulaResult<FormulaValue>;

/// Lazy function signature
pub type LazyFn = dyn for<'a> Fn(&[LazyArg<'a>]) -> FormulaResult<FormulaValue>;

/// A callable registered under a function name
#[derive(Clone)]
pub enum FunctionDescriptor {
    /// Called with every argument already evaluated
    Eager(Rc<EagerFn>),
    /// Called with on-demand argument accessors
    Lazy(Rc<LazyFn>),
}

impl FunctionDescriptor {
    /// Wrap an eager function
    pub fn eager<F>(f: F) -> Self
    where
        F: Fn(&[FormulaValue]) -> FormulaResult<FormulaValue> + 'static,
    {
        FunctionDescriptor::Eager(Rc::new(f))
    }

    /// Wrap a lazy function
    pub fn lazy<F>(f: F) -> Self
    where
        F: for<'a> Fn(&[LazyArg<'a>]) -> FormulaResult<FormulaValue> + 'static,
    {
        FunctionDescriptor::Lazy(Rc::new(f))
    }

    /// Check if arguments are evaluated on demand
    pub fn is_lazy(&self) -> bool {
        matches!(self, FunctionDescriptor::Lazy(_))
    }
}

impl<F> From<F> for FunctionDescriptor
where
    F: Fn(&[FormulaValue]) -> FormulaResult<FormulaValue> + 'static,
{
    fn from(f: F) -> Self {
        FunctionDescriptor::eager(f)
    }
}

impl fmt::Debug for FunctionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionDescriptor::Eager(_) => f.write_str("FunctionDescriptor::Eager"),
            FunctionDescriptor::Lazy(_) => f.write_str("FunctionDescriptor::Lazy"),
        }
    }
}

/// Function registry
///
/// Names are matched case-insensitively.
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: AHashMap<String, FunctionDescriptor>,
}

impl FunctionRegistry {
    /// Create a registry with no functions
    pub fn empty() -> Self {
        Self {
            functions: AHashMap::new(),
        }
    }

    /// Create a registry with the standard function set
    pub fn standard() -> Self {
        let mut registry = Self::empty();

        registry.register_math_functions();
        registry.register_logical_functions();
        registry.register_text_functions();

        registry
    }

    /// Register a function, replacing any existing one with the same name
    pub fn register(&mut self, name: &str, function: impl Into<FunctionDescriptor>) {
        self.functions.insert(name.to_uppercase(), function.into());
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions.get(&name.to_uppercase())
    }

    /// Check if a function is registered
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn register_math_functions(&mut self) {
        self.register("SUM", math::fn_sum);
        self.register("AVERAGE", math::fn_average);
        self.register("MIN", math::fn_min);
        self.register("MAX", math::fn_max);
        self.register("COUNT", math::fn_count);
        self.register("ABS", math::fn_abs);
    }

    fn register_logical_functions(&mut self) {
        self.register("IF", FunctionDescriptor::lazy(logical::fn_if));
        self.register("AND", FunctionDescriptor::lazy(logical::fn_and));
        self.register("OR", FunctionDescriptor::lazy(logical::fn_or));
        self.register("NOT", logical::fn_not);
    }

    fn register_text_functions(&mut self) {
        self.register("CONCAT", text::fn_concat);
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Fail with an argument error unless `count` lies in `min..=max`
pub fn check_arity(
    name: &str,
    count: usize,
    min: usize,
    max: Option<usize>,
) -> FormulaResult<()> {
    if count < min {
        return Err(FormulaError::argument(format!(
            "{} requires at least {} argument{}, got {}",
            name,
            min,
            if min == 1 { "" } else { "s" },
            count
        )));
    }
    if let Some(max) = max {
        if count > max {
            return Err(FormulaError::argument(format!(
                "{} accepts at most {} argument{}, got {}",
                name,
                max,
                if max == 1 { "" } else { "s" },
                count
            )));
        }
    }
    Ok(())
}
