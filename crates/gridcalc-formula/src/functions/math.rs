//! Math functions

use super::check_arity;
use crate::error::{FormulaError, FormulaResult};
use crate::value::FormulaValue;

/// Collect the numbers an aggregate works on
///
/// List arguments contribute their numbers and silently skip everything else. A direct
/// argument that is not a number is an error.
fn numbers(name: &str, args: &[FormulaValue]) -> FormulaResult<Vec<f64>> {
    let mut out = Vec::new();

    for arg in args {
        match arg {
            FormulaValue::Number(n) => out.push(*n),
            FormulaValue::List(items) => {
                out.extend(items.iter().filter_map(FormulaValue::as_number));
            }
            other => {
                return Err(FormulaError::argument(format!(
                    "{} expects numbers, got {}",
                    name,
                    other.type_name()
                )))
            }
        }
    }

    Ok(out)
}

/// Sum starting from positive zero
fn total(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |acc, n| acc + n)
}

/// SUM function
pub fn fn_sum(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Number(total(&numbers("SUM", args)?)))
}

/// AVERAGE function
pub fn fn_average(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let values = numbers("AVERAGE", args)?;

    if values.is_empty() {
        return Err(FormulaError::argument("AVERAGE has no numbers to average"));
    }

    Ok(FormulaValue::Number(total(&values) / values.len() as f64))
}

/// MIN function, 0 when there is nothing to compare
pub fn fn_min(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let min = numbers("MIN", args)?.into_iter().reduce(f64::min);
    Ok(FormulaValue::Number(min.unwrap_or(0.0)))
}

/// MAX function, 0 when there is nothing to compare
pub fn fn_max(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let max = numbers("MAX", args)?.into_iter().reduce(f64::max);
    Ok(FormulaValue::Number(max.unwrap_or(0.0)))
}

/// COUNT function
///
/// Counts numbers, both direct and inside lists. Never fails on other types.
pub fn fn_count(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let count = args
        .iter()
        .map(|arg| match arg {
            FormulaValue::Number(_) => 1,
            FormulaValue::List(items) => {
                items.iter().filter(|v| v.as_number().is_some()).count()
            }
            _ => 0,
        })
        .sum::<usize>();

    Ok(FormulaValue::Number(count as f64))
}

/// ABS function
pub fn fn_abs(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    check_arity("ABS", args.len(), 1, Some(1))?;

    match &args[0] {
        FormulaValue::Number(n) => Ok(FormulaValue::Number(n.abs())),
        other => Err(FormulaError::argument(format!(
            "ABS expects a number, got {}",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn list(items: Vec<FormulaValue>) -> FormulaValue {
        FormulaValue::List(items)
    }

    #[test]
    fn test_sum() {
        let args = [
            FormulaValue::Number(1.0),
            list(vec![2.0.into(), "skip".into(), FormulaValue::Empty, 3.0.into()]),
        ];
        assert_eq!(fn_sum(&args).unwrap(), FormulaValue::Number(6.0));
        assert_eq!(fn_sum(&[]).unwrap(), FormulaValue::Number(0.0));
    }

    #[test]
    fn test_empty_sum_is_positive_zero() {
        for args in [vec![], vec![list(vec![FormulaValue::Empty, "x".into()])]] {
            match fn_sum(&args).unwrap() {
                FormulaValue::Number(n) => assert!(n == 0.0 && n.is_sign_positive()),
                other => panic!("expected a number, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_direct_non_number_rejected() {
        assert_eq!(
            fn_sum(&["1".into()]).unwrap_err(),
            FormulaError::argument("SUM expects numbers, got string")
        );
        assert!(fn_max(&[FormulaValue::Boolean(true)]).is_err());
    }

    #[test]
    fn test_average() {
        let args = [list(vec![2.0.into(), 4.0.into(), "x".into()])];
        assert_eq!(fn_average(&args).unwrap(), FormulaValue::Number(3.0));
        assert!(fn_average(&[list(vec!["x".into()])]).is_err());
    }

    #[test]
    fn test_min_max() {
        let args = [3.0.into(), list(vec![(-1.0).into(), 7.0.into()])];
        assert_eq!(fn_min(&args).unwrap(), FormulaValue::Number(-1.0));
        assert_eq!(fn_max(&args).unwrap(), FormulaValue::Number(7.0));
        assert_eq!(fn_max(&[]).unwrap(), FormulaValue::Number(0.0));
    }

    #[test]
    fn test_count() {
        let args = [
            "a".into(),
            1.0.into(),
            list(vec![2.0.into(), FormulaValue::Empty, true.into()]),
        ];
        assert_eq!(fn_count(&args).unwrap(), FormulaValue::Number(2.0));
    }

    #[test]
    fn test_abs() {
        assert_eq!(fn_abs(&[(-2.5).into()]).unwrap(), FormulaValue::Number(2.5));
        assert!(fn_abs(&[]).is_err());
        assert!(fn_abs(&[1.0.into(), 2.0.into()]).is_err());
    }
}
