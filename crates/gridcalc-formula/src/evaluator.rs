//! Formula evaluator
//!
//! Walks an [`Expression`] tree and produces a [`FormulaValue`]. Cell values and
//! functions come from a [`CellLookup`], usually the
//! [`Environment`](crate::environment::Environment).
//!
//! Cycle detection is two-phase. Entering a position that is already in progress raises a
//! [`CycleSignal`]; the signal unwinds through every frame untouched until it reaches the
//! frame evaluating the position it names, which turns it into
//! [`FormulaError::CircularReference`].

use crate::ast::{BinaryOperator, Expression, UnaryOperator};
use crate::error::{CycleSignal, EvalFailure, EvalResult, FormulaError, FormulaResult};
use crate::functions::FunctionDescriptor;
use crate::value::FormulaValue;
use gridcalc_core::{CellPosition, CellRange};
use std::cell::RefCell;

/// Source of cell values and functions during evaluation
pub trait CellLookup {
    /// Value of the cell at `position`, evaluated within `ctx`
    fn cell_value(&self, position: &CellPosition, ctx: &EvalContext) -> EvalResult<FormulaValue>;

    /// Function registered under `name` (case-insensitive)
    fn function(&self, name: &str) -> FormulaResult<FunctionDescriptor>;
}

/// Positions currently being evaluated, innermost last
///
/// One context lives for one outer evaluation and is threaded through every recursive
/// call, including calls made by lazy function arguments.
#[derive(Debug, Default)]
pub struct EvalContext {
    in_progress: RefCell<Vec<CellPosition>>,
}

impl EvalContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `position`, or raise a cycle signal if it is already in progress
    fn enter(&self, position: &CellPosition) -> Result<(), CycleSignal> {
        let mut stack = self.in_progress.borrow_mut();
        if stack.contains(position) {
            let mut path = stack.clone();
            path.push(position.clone());
            return Err(CycleSignal {
                origin: position.clone(),
                path,
            });
        }
        stack.push(position.clone());
        Ok(())
    }

    fn leave(&self) {
        self.in_progress.borrow_mut().pop();
    }

    /// Snapshot of the in-progress positions, outermost first
    pub fn in_progress(&self) -> Vec<CellPosition> {
        self.in_progress.borrow().clone()
    }
}

/// Evaluate an ad hoc expression
///
/// Runs in a fresh context that is not tied to any cell, so the query itself can never
/// close a cycle.
pub fn evaluate_query(expr: &Expression, env: &dyn CellLookup) -> FormulaResult<FormulaValue> {
    let ctx = EvalContext::new();
    evaluate(expr, env, &ctx).map_err(EvalFailure::into_error)
}

/// Evaluate the expression stored at `position`
///
/// A cycle signal naming `position` is converted here into a circular-reference error;
/// any other failure is passed on unchanged.
pub fn evaluate_cell_at(
    position: &CellPosition,
    expr: &Expression,
    env: &dyn CellLookup,
    ctx: &EvalContext,
) -> EvalResult<FormulaValue> {
    ctx.enter(position).map_err(EvalFailure::Cycle)?;
    let result = evaluate(expr, env, ctx);
    ctx.leave();

    match result {
        Err(EvalFailure::Cycle(signal)) if &signal.origin == position => {
            tracing::trace!(cell = %position, len = signal.path.len(), "cycle closed");
            Err(FormulaError::CircularReference(signal.path).into())
        }
        other => other,
    }
}

fn evaluate(
    expr: &Expression,
    env: &dyn CellLookup,
    ctx: &EvalContext,
) -> EvalResult<FormulaValue> {
    match expr {
        Expression::Value(value) => Ok(value.clone()),

        Expression::Reference(position) => lookup(position, env, ctx),

        Expression::UnaryOp { op, operand } => {
            let value = evaluate(operand, env, ctx)?;
            Ok(evaluate_unary_op(*op, value)?)
        }

        Expression::BinaryOp { op, left, right } => {
            let left = evaluate(left, env, ctx)?;
            let right = evaluate(right, env, ctx)?;
            Ok(evaluate_binary_op(*op, left, right)?)
        }

        Expression::FunctionCall { name, args } => evaluate_function(name, args, env, ctx),

        Expression::Range { .. } => Err(FormulaError::RangeNotAllowed.into()),
    }
}

/// Value of a referenced cell
///
/// The referenced cell's own syntax or runtime error is reported as a
/// [`FormulaError::ReferencedCell`] naming only the position.
fn lookup(
    position: &CellPosition,
    env: &dyn CellLookup,
    ctx: &EvalContext,
) -> EvalResult<FormulaValue> {
    match env.cell_value(position, ctx) {
        Err(EvalFailure::Error(e)) if e.is_syntax() || e.is_runtime() => {
            Err(FormulaError::ReferencedCell(position.clone()).into())
        }
        other => other,
    }
}

/// Evaluate a function argument, expanding a range into a row-major list
fn evaluate_argument(
    expr: &Expression,
    env: &dyn CellLookup,
    ctx: &EvalContext,
) -> EvalResult<FormulaValue> {
    match expr {
        Expression::Range { start, end } => {
            let range =
                CellRange::new(start, end).map_err(|e| FormulaError::syntax(e.to_string()))?;
            let values = range
                .cells()
                .map(|position| lookup(&position, env, ctx))
                .collect::<EvalResult<Vec<_>>>()?;
            Ok(FormulaValue::List(values))
        }
        other => evaluate(other, env, ctx),
    }
}

fn evaluate_unary_op(op: UnaryOperator, value: FormulaValue) -> FormulaResult<FormulaValue> {
    let n = value.as_number().ok_or_else(|| FormulaError::Type {
        operator: op.symbol(),
        expected: "a number",
        actual: value.type_name().to_string(),
    })?;

    Ok(FormulaValue::Number(match op {
        UnaryOperator::Plus => n,
        UnaryOperator::Negate => -n,
    }))
}

fn evaluate_binary_op(
    op: BinaryOperator,
    left: FormulaValue,
    right: FormulaValue,
) -> FormulaResult<FormulaValue> {
    use FormulaValue::{Boolean, Number, String};

    let result = match (op, &left, &right) {
        (BinaryOperator::Equal, l, r) => Boolean(l.strict_eq(r)),
        (BinaryOperator::NotEqual, l, r) => Boolean(!l.strict_eq(r)),

        (BinaryOperator::Add, String(l), String(r)) => String(format!("{}{}", l, r)),

        (BinaryOperator::Add, Number(l), Number(r)) => Number(l + r),
        (BinaryOperator::Subtract, Number(l), Number(r)) => Number(l - r),
        (BinaryOperator::Multiply, Number(l), Number(r)) => Number(l * r),
        (BinaryOperator::Divide, Number(l), Number(r)) => Number(l / r),
        (BinaryOperator::GreaterThan, Number(l), Number(r)) => Boolean(l > r),
        (BinaryOperator::LessThan, Number(l), Number(r)) => Boolean(l < r),
        (BinaryOperator::GreaterEqual, Number(l), Number(r)) => Boolean(l >= r),
        (BinaryOperator::LessEqual, Number(l), Number(r)) => Boolean(l <= r),

        (op, l, r) => {
            return Err(FormulaError::Type {
                operator: op.symbol(),
                expected: if op == BinaryOperator::Add {
                    "two numbers or two strings"
                } else {
                    "two numbers"
                },
                actual: format!("{} and {}", l.type_name(), r.type_name()),
            })
        }
    };

    Ok(result)
}

fn evaluate_function(
    name: &str,
    args: &[Expression],
    env: &dyn CellLookup,
    ctx: &EvalContext,
) -> EvalResult<FormulaValue> {
    match env.function(name)? {
        FunctionDescriptor::Eager(func) => {
            let values = args
                .iter()
                .map(|arg| evaluate_argument(arg, env, ctx))
                .collect::<EvalResult<Vec<_>>>()?;

            func(&values).map_err(|cause| wrap_function_error(name, cause).into())
        }

        FunctionDescriptor::Lazy(func) => {
            let failures = ArgFailures::default();
            let lazy_args: Vec<LazyArg<'_>> = args
                .iter()
                .map(|expr| LazyArg {
                    expr,
                    env,
                    ctx,
                    failures: &failures,
                })
                .collect();

            let result = func(&lazy_args);
            drop(lazy_args);

            result.map_err(|cause| failures.resolve(name, cause))
        }
    }
}

fn wrap_function_error(name: &str, cause: FormulaError) -> FormulaError {
    FormulaError::FunctionEvaluation {
        function: name.to_string(),
        cause: Box::new(cause),
    }
}

/// Failures raised by lazy arguments during one function call
#[derive(Default)]
struct ArgFailures {
    cycle: RefCell<Option<CycleSignal>>,
    errors: RefCell<Vec<FormulaError>>,
}

impl ArgFailures {
    fn record(&self, failure: EvalFailure) -> FormulaError {
        match failure {
            EvalFailure::Cycle(signal) => {
                let error = FormulaError::CircularReference(signal.path.clone());
                self.cycle.borrow_mut().get_or_insert(signal);
                error
            }
            EvalFailure::Error(e) => {
                if e.is_runtime() {
                    self.errors.borrow_mut().push(e.clone());
                }
                e
            }
        }
    }

    /// Decide what a failed lazy call reports
    ///
    /// A cycle raised by any argument keeps unwinding. A runtime error that came straight
    /// from an argument passes through unwrapped. Anything else the body produced is a
    /// function-evaluation error.
    fn resolve(self, name: &str, cause: FormulaError) -> EvalFailure {
        if let Some(signal) = self.cycle.into_inner() {
            return EvalFailure::Cycle(signal);
        }
        if self.errors.into_inner().contains(&cause) {
            return EvalFailure::Error(cause);
        }
        wrap_function_error(name, cause).into()
    }
}

/// An unevaluated argument handed to a lazy function
///
/// Nothing is evaluated until [`LazyArg::value`] is called, and each call evaluates the
/// argument again.
pub struct LazyArg<'a> {
    expr: &'a Expression,
    env: &'a dyn CellLookup,
    ctx: &'a EvalContext,
    failures: &'a ArgFailures,
}

impl<'a> LazyArg<'a> {
    /// Evaluate the argument
    ///
    /// A range argument evaluates to a row-major [`FormulaValue::List`].
    pub fn value(&self) -> FormulaResult<FormulaValue> {
        evaluate_argument(self.expr, self.env, self.ctx).map_err(|f| self.failures.record(f))
    }

    /// The argument's expression
    pub fn expression(&self) -> &Expression {
        self.expr
    }
}

impl std::fmt::Debug for LazyArg<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyArg").field("expr", self.expr).finish()
    }
}
