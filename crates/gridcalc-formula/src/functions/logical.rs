//! Logical functions
//!
//! `IF`, `AND` and `OR` are lazy so they can stop evaluating arguments as soon as the
//! result is known.

use super::check_arity;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::LazyArg;
use crate::value::FormulaValue;

/// Read a value as a condition
///
/// Booleans are themselves, numbers are true when non-zero, and empty is false.
fn truth(name: &str, value: &FormulaValue) -> FormulaResult<bool> {
    match value {
        FormulaValue::Boolean(b) => Ok(*b),
        FormulaValue::Number(n) => Ok(*n != 0.0),
        FormulaValue::Empty => Ok(false),
        other => Err(FormulaError::argument(format!(
            "{} expects a logical value, got {}",
            name,
            other.type_name()
        ))),
    }
}

/// Truth values of one argument; lists skip their empty and text entries
fn truths(name: &str, value: &FormulaValue) -> FormulaResult<Vec<bool>> {
    match value {
        FormulaValue::List(items) => items
            .iter()
            .filter(|v| !matches!(v, FormulaValue::Empty | FormulaValue::String(_)))
            .map(|v| truth(name, v))
            .collect(),
        other => Ok(vec![truth(name, other)?]),
    }
}

/// IF function
///
/// Only the branch selected by the condition is evaluated. A false condition without an
/// else branch yields FALSE.
pub fn fn_if(args: &[LazyArg<'_>]) -> FormulaResult<FormulaValue> {
    check_arity("IF", args.len(), 2, Some(3))?;

    if truth("IF", &args[0].value()?)? {
        args[1].value()
    } else {
        match args.get(2) {
            Some(if_false) => if_false.value(),
            None => Ok(FormulaValue::Boolean(false)),
        }
    }
}

/// AND function, stops at the first false argument
pub fn fn_and(args: &[LazyArg<'_>]) -> FormulaResult<FormulaValue> {
    check_arity("AND", args.len(), 1, None)?;

    for arg in args {
        if truths("AND", &arg.value()?)?.contains(&false) {
            return Ok(FormulaValue::Boolean(false));
        }
    }

    Ok(FormulaValue::Boolean(true))
}

/// OR function, stops at the first true argument
pub fn fn_or(args: &[LazyArg<'_>]) -> FormulaResult<FormulaValue> {
    check_arity("OR", args.len(), 1, None)?;

    for arg in args {
        if truths("OR", &arg.value()?)?.contains(&true) {
            return Ok(FormulaValue::Boolean(true));
        }
    }

    Ok(FormulaValue::Boolean(false))
}

/// NOT function
pub fn fn_not(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    check_arity("NOT", args.len(), 1, Some(1))?;
    Ok(FormulaValue::Boolean(!truth("NOT", &args[0])?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{Environment, EnvironmentConfig};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Environment with a THROW function that counts its calls and always fails
    fn env_with_throw() -> (Environment, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let throw = move |_: &[FormulaValue]| -> FormulaResult<FormulaValue> {
            counter.set(counter.get() + 1);
            Err(FormulaError::argument("thrown"))
        };
        let config = EnvironmentConfig::default().function("THROW", throw);
        (Environment::new(config), calls)
    }

    #[test]
    fn test_if() {
        let (env, _) = env_with_throw();
        assert_eq!(env.evaluate_query("=IF(TRUE, 1, 2)").unwrap(), FormulaValue::Number(1.0));
        assert_eq!(env.evaluate_query("=IF(0, 1, 2)").unwrap(), FormulaValue::Number(2.0));
        assert_eq!(env.evaluate_query("=IF(FALSE, 1)").unwrap(), FormulaValue::Boolean(false));
        assert!(env.evaluate_query("=IF(TRUE)").is_err());
        assert!(env.evaluate_query("=IF(\"yes\", 1, 2)").is_err());
    }

    #[test]
    fn test_if_skips_unselected_branch() {
        let (env, calls) = env_with_throw();
        assert_eq!(env.evaluate_query("=IF(1, 2, THROW())").unwrap(), FormulaValue::Number(2.0));
        assert_eq!(env.evaluate_query("=IF(0, THROW(), 3)").unwrap(), FormulaValue::Number(3.0));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_and_short_circuits() {
        let (env, calls) = env_with_throw();
        assert_eq!(
            env.evaluate_query("=AND(FALSE, THROW())").unwrap(),
            FormulaValue::Boolean(false)
        );
        assert_eq!(calls.get(), 0);

        let err = env.evaluate_query("=AND(TRUE, THROW())").unwrap_err();
        assert_eq!(
            err,
            FormulaError::FunctionEvaluation {
                function: "THROW".into(),
                cause: Box::new(FormulaError::argument("thrown")),
            }
        );
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_or_short_circuits() {
        let (env, calls) = env_with_throw();
        assert_eq!(env.evaluate_query("=OR(1, THROW())").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(env.evaluate_query("=OR(FALSE, 0)").unwrap(), FormulaValue::Boolean(false));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_body_error_is_wrapped() {
        let (env, _) = env_with_throw();
        assert!(matches!(
            env.evaluate_query("=AND(\"x\")").unwrap_err(),
            FormulaError::FunctionEvaluation { ref function, .. } if function == "AND"
        ));
    }

    #[test]
    fn test_lists_skip_text_and_empty() {
        let list = FormulaValue::List(vec![
            true.into(),
            FormulaValue::Empty,
            "text".into(),
            1.0.into(),
        ]);
        assert_eq!(truths("AND", &list).unwrap(), vec![true, true]);
        assert!(truths("AND", &FormulaValue::List(vec![FormulaValue::List(vec![])])).is_err());
    }

    #[test]
    fn test_not() {
        assert_eq!(fn_not(&[true.into()]).unwrap(), FormulaValue::Boolean(false));
        assert_eq!(fn_not(&[FormulaValue::Empty]).unwrap(), FormulaValue::Boolean(true));
        assert!(fn_not(&["a".into()]).is_err());
        assert!(fn_not(&[]).is_err());
    }
}
