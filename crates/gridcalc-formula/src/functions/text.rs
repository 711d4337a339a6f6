//! Text functions

use crate::error::FormulaResult;
use crate::value::FormulaValue;

/// CONCAT function
///
/// Joins the display form of every argument, list entries included, with no separator.
pub fn fn_concat(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let mut result = String::new();

    for arg in args {
        match arg {
            FormulaValue::List(items) => {
                for item in items {
                    result.push_str(&item.to_string());
                }
            }
            other => result.push_str(&other.to_string()),
        }
    }

    Ok(FormulaValue::String(result))
}
