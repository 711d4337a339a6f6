//! Formula error types

use gridcalc_core::CellPosition;
use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Result type used inside evaluation, where a cycle may still be unwinding
pub type EvalResult<T> = std::result::Result<T, EvalFailure>;

/// Errors that can occur during formula parsing or evaluation
///
/// Everything except [`FormulaError::Internal`] is an expected, data-driven failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Malformed formula text
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// Function name absent from the registry
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// A referenced cell failed to evaluate
    #[error("Error in referenced cell {0}")]
    ReferencedCell(CellPosition),

    /// A dependency cycle closes on the cell being evaluated
    #[error("Circular reference: {}", display_path(.0))]
    CircularReference(Vec<CellPosition>),

    /// A range was used somewhere other than directly as a function argument
    #[error("Ranges are only allowed as function arguments")]
    RangeNotAllowed,

    /// Operator received an unsupported operand type combination
    #[error("Type error in '{operator}': expected {expected}, got {actual}")]
    Type {
        operator: &'static str,
        expected: &'static str,
        actual: String,
    },

    /// A function body failed
    #[error("Error evaluating {function}: {cause}")]
    FunctionEvaluation {
        function: String,
        #[source]
        cause: Box<FormulaError>,
    },

    /// Invalid argument passed to a function
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// Engine defect
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FormulaError {
    /// Create a syntax error
    pub fn syntax<S: Into<String>>(msg: S) -> Self {
        FormulaError::Syntax(msg.into())
    }

    /// Create an argument error
    pub fn argument<S: Into<String>>(msg: S) -> Self {
        FormulaError::Argument(msg.into())
    }

    /// Check if this error was raised while parsing
    pub fn is_syntax(&self) -> bool {
        matches!(self, FormulaError::Syntax(_))
    }

    /// Check if this error was raised by the evaluator and belongs in the value cache
    pub fn is_runtime(&self) -> bool {
        matches!(
            self,
            FormulaError::UnknownFunction(_)
                | FormulaError::ReferencedCell(_)
                | FormulaError::CircularReference(_)
                | FormulaError::RangeNotAllowed
                | FormulaError::Type { .. }
                | FormulaError::FunctionEvaluation { .. }
        )
    }

    /// Check if this error is an engine defect rather than a problem with the data
    pub fn is_internal(&self) -> bool {
        matches!(self, FormulaError::Internal(_))
    }
}

fn display_path(path: &[CellPosition]) -> String {
    path.iter()
        .map(CellPosition::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// A dependency cycle on its way back to the cell that closes it
///
/// Raised when evaluation re-enters a position that is still in progress. It passes
/// through every intermediate frame untouched and only becomes a
/// [`FormulaError::CircularReference`] at the frame evaluating `origin`.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleSignal {
    /// The position that was re-entered
    pub origin: CellPosition,
    /// In-progress positions at the time of re-entry, followed by `origin`
    pub path: Vec<CellPosition>,
}

/// Why an evaluation step did not produce a value
#[derive(Debug, Clone, PartialEq)]
pub enum EvalFailure {
    /// An ordinary error
    Error(FormulaError),
    /// A cycle signal still unwinding towards its origin
    Cycle(CycleSignal),
}

impl EvalFailure {
    /// Convert into a public error once evaluation has fully unwound
    ///
    /// A cycle signal can only reach this point if no frame for its origin was on the
    /// stack, which is an engine defect.
    pub fn into_error(self) -> FormulaError {
        match self {
            EvalFailure::Error(e) => e,
            EvalFailure::Cycle(signal) => FormulaError::Internal(format!(
                "cycle signal for {} escaped evaluation",
                signal.origin
            )),
        }
    }
}

impl From<FormulaError> for EvalFailure {
    fn from(e: FormulaError) -> Self {
        EvalFailure::Error(e)
    }
}
