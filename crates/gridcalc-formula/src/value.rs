//! Runtime values

use gridcalc_core::{format_number, CellContent, OpaqueValue};
use std::fmt;

/// Value types during formula evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    String(String),
    Boolean(bool),
    Empty,
    /// Ordered values of an expanded range
    List(Vec<FormulaValue>),
    Opaque(OpaqueValue),
}

impl FormulaValue {
    /// Name of the value's type, as used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FormulaValue::Number(_) => "number",
            FormulaValue::String(_) => "string",
            FormulaValue::Boolean(_) => "boolean",
            FormulaValue::Empty => "empty",
            FormulaValue::List(_) => "list",
            FormulaValue::Opaque(_) => "opaque",
        }
    }

    /// Get the number, if this is one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the string, if this is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FormulaValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the boolean, if this is one
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FormulaValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Check if this is a list
    pub fn is_list(&self) -> bool {
        matches!(self, FormulaValue::List(_))
    }

    /// Strict equality used by the `=` operator
    ///
    /// Values of different types are never equal. If either side is a list, both must be
    /// lists of the same length whose elements are pairwise strictly equal.
    pub fn strict_eq(&self, other: &FormulaValue) -> bool {
        match (self, other) {
            (FormulaValue::List(l), FormulaValue::List(r)) => {
                l.len() == r.len() && l.iter().zip(r).all(|(a, b)| a.strict_eq(b))
            }
            (FormulaValue::List(_), _) | (_, FormulaValue::List(_)) => false,
            _ => self == other,
        }
    }
}

impl fmt::Display for FormulaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaValue::Number(n) => f.write_str(&format_number(*n)),
            FormulaValue::String(s) => f.write_str(s),
            FormulaValue::Boolean(true) => f.write_str("TRUE"),
            FormulaValue::Boolean(false) => f.write_str("FALSE"),
            FormulaValue::Empty => Ok(()),
            FormulaValue::List(items) => {
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("}")
            }
            FormulaValue::Opaque(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<f64> for FormulaValue {
    fn from(n: f64) -> Self {
        FormulaValue::Number(n)
    }
}

impl From<bool> for FormulaValue {
    fn from(b: bool) -> Self {
        FormulaValue::Boolean(b)
    }
}

impl From<&str> for FormulaValue {
    fn from(s: &str) -> Self {
        FormulaValue::String(s.to_string())
    }
}

impl From<String> for FormulaValue {
    fn from(s: String) -> Self {
        FormulaValue::String(s)
    }
}

/// Convert content that bypasses parsing
///
/// Returns `None` for [`CellContent::Text`], which must go through the parser.
pub fn passthrough_value(content: &CellContent) -> Option<FormulaValue> {
    match content {
        CellContent::Empty => Some(FormulaValue::Empty),
        CellContent::Number(n) => Some(FormulaValue::Number(*n)),
        CellContent::Boolean(b) => Some(FormulaValue::Boolean(*b)),
        CellContent::Opaque(v) => Some(FormulaValue::Opaque(v.clone())),
        CellContent::Text(_) => None,
    }
}
