//! Cell content types

use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// The raw content stored in a cell
///
/// Only [`CellContent::Text`] is ever parsed: text starting with `=` is a formula, text that
/// looks like a number becomes a number, anything else stays text. Every other variant is
/// passed through to evaluation unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellContent {
    /// Empty cell (no content)
    #[default]
    Empty,

    /// Numeric value
    Number(f64),

    /// Boolean value
    Boolean(bool),

    /// Text as typed by the user, including formulas
    Text(String),

    /// Host value passed through unparsed
    Opaque(OpaqueValue),
}

impl CellContent {
    /// Create a new text content
    pub fn text<S: Into<String>>(s: S) -> Self {
        CellContent::Text(s.into())
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellContent::Empty)
    }

    /// Check if the content is formula text
    pub fn is_formula(&self) -> bool {
        matches!(self, CellContent::Text(t) if t.starts_with('='))
    }

    /// The text shown for this content in an editor
    pub fn display_text(&self) -> String {
        match self {
            CellContent::Empty => String::new(),
            CellContent::Number(n) => format_number(*n),
            CellContent::Boolean(true) => "TRUE".to_string(),
            CellContent::Boolean(false) => "FALSE".to_string(),
            CellContent::Text(t) => t.clone(),
            CellContent::Opaque(v) => format!("{:?}", v),
        }
    }
}

impl fmt::Display for CellContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}

impl From<&str> for CellContent {
    fn from(s: &str) -> Self {
        CellContent::Text(s.to_string())
    }
}

impl From<String> for CellContent {
    fn from(s: String) -> Self {
        CellContent::Text(s)
    }
}

impl From<f64> for CellContent {
    fn from(n: f64) -> Self {
        CellContent::Number(n)
    }
}

impl From<i32> for CellContent {
    fn from(n: i32) -> Self {
        CellContent::Number(n as f64)
    }
}

impl From<bool> for CellContent {
    fn from(b: bool) -> Self {
        CellContent::Boolean(b)
    }
}

impl From<OpaqueValue> for CellContent {
    fn from(v: OpaqueValue) -> Self {
        CellContent::Opaque(v)
    }
}

impl<T: Into<CellContent>> From<Option<T>> for CellContent {
    fn from(v: Option<T>) -> Self {
        v.map_or(CellContent::Empty, Into::into)
    }
}

/// Format a number the way cells display it
///
/// Integers print without a fractional part, and magnitudes of 1e21 or more use exponent
/// form.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else if n.is_finite() && n.abs() >= 1e21 {
        format!("{:e}", n)
    } else {
        format!("{}", n)
    }
}

trait Payload: fmt::Debug {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug> Payload for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An arbitrary host value stored in a cell
///
/// Cloning shares the payload. Two opaque values are equal only when they share the
/// same payload.
#[derive(Clone)]
pub struct OpaqueValue(Rc<dyn Payload>);

impl OpaqueValue {
    /// Wrap a host value
    pub fn new<T: Any + fmt::Debug>(value: T) -> Self {
        Self(Rc::new(value))
    }

    /// Borrow the payload as `T`, if that is its type
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.0).as_any().downcast_ref()
    }
}

impl PartialEq for OpaqueValue {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}
